//! Tool registry
//!
//! Maps tool names to implementations and renders the declaration set
//! handed to the agent at session setup.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::schema::{function_declarations, Tool, ToolError, ToolOutput, ToolSchema};

/// Registry of tools available to the live agent
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its own name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Schemas of all registered tools
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    /// Declarations in the live session's setup wire shape
    pub fn declarations(&self) -> Value {
        function_declarations(&self.schemas())
    }

    /// Validate and execute a tool call
    pub async fn execute(&self, name: &str, args: Value) -> Result<ToolOutput, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::not_found(format!("Unknown tool: {}", name)))?;
        tool.validate(&args)?;
        tool.execute(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::ConfirmBookingTool;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(ConfirmBookingTool::new(Arc::new(
            |_: &str, _: &str| {},
        ))));
        registry
    }

    #[tokio::test]
    async fn test_execute_known_tool() {
        let registry = registry();
        let output = registry
            .execute(
                ConfirmBookingTool::NAME,
                json!({ "date": "2024-06-01", "time": "09:00 AM - 11:00 AM" }),
            )
            .await
            .unwrap();
        assert_eq!(output.response["result"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_found() {
        let registry = registry();
        let err = registry.execute("cancelBooking", json!({})).await.unwrap_err();
        assert_eq!(err.code, crate::schema::ErrorCode::MethodNotFound);
    }

    #[tokio::test]
    async fn test_validation_runs_before_execute() {
        let registry = registry();
        let err = registry
            .execute(ConfirmBookingTool::NAME, json!({ "date": "2024-06-01" }))
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::schema::ErrorCode::InvalidParams);
    }

    #[test]
    fn test_declarations_cover_registered_tools() {
        let registry = registry();
        let declarations = registry.declarations();
        assert_eq!(declarations.as_array().unwrap().len(), 1);
        assert_eq!(declarations[0]["name"], ConfirmBookingTool::NAME);
    }
}
