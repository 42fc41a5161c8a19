//! Hooks Module
//!
//! Intercept and control tool execution at key points.
//!
//! # Overview
//!
//! Hooks let you:
//! - Block dangerous operations before they execute
//! - Rewrite tool arguments (e.g., prefix shell commands with an `unset` clause)
//! - Log and audit tool calls
//!
//! # Example
//!
//! ```ignore
//! use shadow_env_guard::hooks::{HookContext, HookEvent, HookRegistry, HookResult};
//!
//! let hooks = HookRegistry::new();
//!
//! hooks.add_with_pattern(HookEvent::PreToolUse, "^Bash$", |ctx: &mut HookContext| {
//!     let cmd = ctx.input_str("command").unwrap_or("");
//!     if cmd.contains("rm -rf") {
//!         Ok(HookResult::deny("Dangerous command blocked"))
//!     } else {
//!         Ok(HookResult::none())
//!     }
//! })?;
//! ```
//!
//! # Hook Events
//!
//! | Event | When | Can modify |
//! |-------|------|------------|
//! | `PreToolUse` | Before tool executes | `tool_input`, permission |
//! | `PostToolUse` | After tool succeeds | nothing (observation) |
//! | `PostToolUseFailure` | After tool fails | nothing (observation) |
//! | `UserPromptSubmit` | When user sends prompt | `user_prompt` |
//! | `PreCompact` | Before history compaction | metadata |
//!
//! # Failure
//!
//! A hook that returns `Err` or panics aborts the dispatch. Callers must treat
//! that as "do not execute the tool".

mod registry;
mod types;

pub use registry::{ArcHook, Dispatched, Hook, HookMatcher, HookRegistry};
pub use types::{HookContext, HookEvent, HookResult, PermissionDecision};
