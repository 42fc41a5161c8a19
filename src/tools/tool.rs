//! Tool trait definition
//!
//! All tools implement this trait to provide a consistent interface.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A pending tool call: which tool, with what input
///
/// Hooks may rewrite `input` during PreToolUse; the rewritten invocation is
/// the one that gets executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Unique id for this call
    pub id: String,
    /// Tool identifier, e.g. "Bash"
    pub tool_name: String,
    /// Tool-specific input record
    pub input: Value,
}

impl ToolInvocation {
    /// Create an invocation with a fresh id
    pub fn new(tool_name: impl Into<String>, input: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tool_name: tool_name.into(),
            input,
        }
    }

    /// Create an invocation with a caller-supplied id
    pub fn with_id(id: impl Into<String>, tool_name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            input,
        }
    }
}

/// Result of executing a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The output of the tool
    pub output: String,
    /// Whether the tool execution resulted in an error
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    /// Create an error tool result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            output: message.into(),
            is_error: true,
        }
    }
}

/// Information about a tool invocation, for logs and prompts
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool
    pub name: String,
    /// Human-readable description of what this invocation will do
    pub action_description: String,
    /// Additional details about the action (e.g., command to run)
    pub details: Option<String>,
}

/// Trait for tools that the agent can use
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the name of this tool
    fn name(&self) -> &str;

    /// Get a description of this tool
    fn description(&self) -> &str;

    /// Get information about what this tool invocation will do
    fn get_info(&self, input: &Value) -> ToolInfo;

    /// Execute the tool with the given input
    ///
    /// The input is a JSON value that matches the tool's input schema.
    async fn execute(&self, input: &Value) -> Result<ToolResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::success("output");
        assert_eq!(result.output, "output");
        assert!(!result.is_error);
    }

    #[test]
    fn test_tool_result_error() {
        let result = ToolResult::error("error message");
        assert_eq!(result.output, "error message");
        assert!(result.is_error);
    }

    #[test]
    fn test_invocations_get_distinct_ids() {
        let a = ToolInvocation::new("Bash", json!({"command": "ls"}));
        let b = ToolInvocation::new("Bash", json!({"command": "ls"}));
        assert_ne!(a.id, b.id);

        let c = ToolInvocation::with_id("toolu_1", "Read", json!({}));
        assert_eq!(c.id, "toolu_1");
        assert_eq!(c.tool_name, "Read");
    }
}
