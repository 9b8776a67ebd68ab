//! Markdown report rendering to PDF.
//!
//! Uses genpdf with whatever system font family is available. Rendering
//! never errors out of this module: failures come back inside the
//! [`PdfArtifact`] so the research outcome stays deliverable.

use crate::types::{PdfArtifact, Report};
use genpdf::elements::{Break, Paragraph};
use genpdf::{Document, SimplePageDecorator};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Render a report's Markdown to a PDF under `out_dir`.
pub async fn render_report(report: &Report, out_dir: &Path) -> PdfArtifact {
    let markdown = report.markdown.clone();
    let out_dir = out_dir.to_path_buf();

    // genpdf rendering is synchronous file/CPU work.
    let rendered =
        tokio::task::spawn_blocking(move || render_markdown(&markdown, &out_dir)).await;

    match rendered {
        Ok(Ok((path, size_bytes))) => PdfArtifact {
            success: true,
            path: Some(path.display().to_string()),
            size_bytes,
            error: None,
        },
        Ok(Err(message)) => {
            tracing::warn!("PDF rendering failed: {message}");
            PdfArtifact {
                success: false,
                path: None,
                size_bytes: 0,
                error: Some(message),
            }
        }
        Err(e) => PdfArtifact {
            success: false,
            path: None,
            size_bytes: 0,
            error: Some(format!("PDF rendering panicked: {e}")),
        },
    }
}

fn render_markdown(markdown: &str, out_dir: &Path) -> std::result::Result<(PathBuf, u64), String> {
    let font_family = load_font_family()?;

    let mut doc = Document::new(font_family);
    doc.set_title("Research Report");

    let mut decorator = SimplePageDecorator::new();
    decorator.set_margins(30);
    doc.set_page_decorator(decorator);

    for block in markdown.split("\n\n") {
        for line in block.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(heading) = trimmed.strip_prefix("# ") {
                let style = genpdf::style::Style::new().bold().with_font_size(20);
                doc.push(Paragraph::new(genpdf::style::StyledString::new(
                    heading.to_string(),
                    style,
                )));
                doc.push(Break::new(1));
            } else if let Some(heading) = trimmed.strip_prefix("## ") {
                let style = genpdf::style::Style::new().bold().with_font_size(16);
                doc.push(Paragraph::new(genpdf::style::StyledString::new(
                    heading.to_string(),
                    style,
                )));
                doc.push(Break::new(0.5));
            } else {
                doc.push(Paragraph::new(trimmed.to_string()));
            }
        }
        doc.push(Break::new(0.5));
    }

    std::fs::create_dir_all(out_dir)
        .map_err(|e| format!("Failed to create output directory: {e}"))?;

    let mut hasher = Sha256::new();
    hasher.update(markdown.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    let output_path = out_dir.join(format!("report_{}.pdf", &digest[..8]));

    doc.render_to_file(&output_path)
        .map_err(|e| format!("Failed to render PDF: {e}"))?;

    let size = std::fs::metadata(&output_path).map(|m| m.len()).unwrap_or(0);
    Ok((output_path, size))
}

/// Probe a few common system locations for a usable TTF family.
fn load_font_family() -> std::result::Result<genpdf::fonts::FontFamily<genpdf::fonts::FontData>, String> {
    let candidates = [
        ("/usr/share/fonts/truetype/liberation", "LiberationSans"),
        ("/usr/share/fonts/liberation", "LiberationSans"),
        ("/usr/share/fonts/truetype/dejavu", "DejaVuSans"),
        ("/System/Library/Fonts", "Helvetica"),
        ("/Library/Fonts", "Arial"),
    ];

    for (dir, name) in candidates {
        if let Ok(family) = genpdf::fonts::from_files(dir, name, None) {
            return Ok(family);
        }
    }

    Err("No suitable font family found on this system".to_string())
}
