//! Common/built-in tools
//!
//! - `BashTool` - Execute shell commands

pub mod bash;

pub use bash::{BashTool, BASH_TOOL_NAME};
