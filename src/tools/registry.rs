//! Tool trait and registry.
//!
//! The registry's [`ToolRegistry::invoke`] method is the pipeline's sole
//! failure-isolation boundary: it never returns an error. Unknown tool
//! names and tool execution failures both become failed
//! [`ToolInvocation`]s, so one broken stage cannot abort a run.

use crate::types::{Result, ToolInvocation};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A single named capability the pipeline can dispatch.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    async fn execute(&self, args: Value) -> Result<Value>;
}

/// Name-indexed collection of tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Invoke a tool by name, converting every failure into a failed
    /// invocation record. Never returns an error.
    pub async fn invoke(&self, name: &str, args: Value) -> ToolInvocation {
        let Some(tool) = self.tools.get(name) else {
            return ToolInvocation::failed(name, format!("Unknown tool: {name}"));
        };

        match tool.execute(args).await {
            Ok(value) => ToolInvocation::succeeded(name, value),
            Err(e) => {
                tracing::debug!(tool = name, "tool execution failed: {e}");
                ToolInvocation::failed(name, e.to_string())
            }
        }
    }

    /// Names of all registered tools.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Whether a tool is registered under `name`.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AppError;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo the arguments back"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, args: Value) -> Result<Value> {
            Ok(args)
        }
    }

    struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, _args: Value) -> Result<Value> {
            Err(AppError::Tool("deliberate failure".to_string()))
        }
    }

    #[test]
    fn registry_starts_empty() {
        let registry = ToolRegistry::new();
        assert!(registry.tool_names().is_empty());
        assert!(!registry.has_tool("echo"));
    }

    #[tokio::test]
    async fn invoke_unknown_tool_mentions_the_name() {
        let registry = ToolRegistry::new();
        let inv = registry.invoke("nonexistent_tool", json!({})).await;
        assert!(!inv.success);
        assert!(inv.error.as_deref().unwrap().contains("nonexistent_tool"));
        assert!(inv.error.as_deref().unwrap().starts_with("Unknown tool:"));
    }

    #[tokio::test]
    async fn invoke_passes_arguments_through() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let inv = registry.invoke("echo", json!({"k": "v"})).await;
        assert!(inv.success);
        assert_eq!(inv.result.unwrap()["k"], "v");
    }

    #[tokio::test]
    async fn invoke_converts_tool_errors_into_failed_invocations() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(BrokenTool));

        let inv = registry.invoke("broken", json!({})).await;
        assert!(!inv.success);
        assert!(inv.error.as_deref().unwrap().contains("deliberate failure"));
        assert!(inv.result.is_none());
    }
}
