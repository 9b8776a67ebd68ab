//! Colored output helpers for the CLI.

use owo_colors::OwoColorize;

/// Output style configuration.
pub struct Output {
    /// Whether to use colored output.
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled.
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled.
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the startup banner.
    pub fn banner(&self) {
        if self.colored {
            println!(
                r#"
   {}
   {}
   {}
"#,
                "  ___  _   _  ___  ___  ___ _____ ___  ___ ".bright_cyan().bold(),
                " / _ \\| | | |/ _ \\| __|/ __|_   _/ _ \\| _ \\".cyan().bold(),
                " \\_\\_\\|___|_|\\___/|___|\\___/ |_| \\___/|_|_\\".blue().bold(),
            );
            println!(
                "   {} {}\n",
                "Autonomous Research Agent Server".bright_white().bold(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
            );
        } else {
            println!(
                r#"
  ___  _   _  ___  ___  ___ _____ ___  ___
 / _ \| | | |/ _ \| __|/ __|_   _/ _ \| _ \
 \_\_\|___|_|\___/|___|\___/ |_| \___/|_|_\
"#
            );
            println!(
                "   Autonomous Research Agent Server v{}\n",
                env!("CARGO_PKG_VERSION")
            );
        }
    }

    /// Print the listening address and model once the server is up.
    pub fn listening(&self, addr: &str, model: &str) {
        if self.colored {
            println!(
                "   {} {}",
                "listening on".bright_white(),
                format!("http://{addr}").bright_green().bold()
            );
            println!("   {} {}\n", "model".bright_white(), model.dimmed());
        } else {
            println!("   listening on http://{addr}");
            println!("   model {model}\n");
        }
    }
}
