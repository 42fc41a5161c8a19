//! Tool system
//!
//! This module provides:
//! - `ToolInvocation` - A pending (tool name, tool input) pair
//! - `Tool` trait - Interface for implementing tools
//! - `ToolResult` - Result type for tool execution
//! - `ToolRegistry` - Registry for managing available tools
//! - `common` - Built-in tools (Bash)

mod registry;
mod tool;

/// Common/built-in tools
pub mod common;

pub use registry::ToolRegistry;
pub use tool::{Tool, ToolInfo, ToolInvocation, ToolResult};

pub use common::{BashTool, BASH_TOOL_NAME};
