//! Hook Types
//!
//! Core types for the hooks system:
//! - `HookEvent` - The type of hook event
//! - `HookContext` - Mutable context passed to hooks
//! - `HookResult` - Result returned from hooks
//! - `PermissionDecision` - Permission decision for PreToolUse hooks

use std::collections::HashMap;

use serde_json::Value;

use crate::tools::{ToolInvocation, ToolResult};

/// Hook event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// Before a tool is executed - can block, allow, or rewrite its input
    PreToolUse,
    /// After a tool successfully executes
    PostToolUse,
    /// After a tool fails
    PostToolUseFailure,
    /// When user submits a prompt
    UserPromptSubmit,
    /// Before conversation history is compacted
    PreCompact,
}

impl HookEvent {
    /// Whether hooks for this event are filtered by tool name
    pub fn is_tool_event(&self) -> bool {
        matches!(
            self,
            HookEvent::PreToolUse | HookEvent::PostToolUse | HookEvent::PostToolUseFailure
        )
    }
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookEvent::PreToolUse => write!(f, "PreToolUse"),
            HookEvent::PostToolUse => write!(f, "PostToolUse"),
            HookEvent::PostToolUseFailure => write!(f, "PostToolUseFailure"),
            HookEvent::UserPromptSubmit => write!(f, "UserPromptSubmit"),
            HookEvent::PreCompact => write!(f, "PreCompact"),
        }
    }
}

/// Mutable context passed to hooks
///
/// Hooks can read and modify anything here. A PreToolUse hook may rewrite
/// `tool_input` in place or return `HookResult::update_input`; either way the
/// next hook sees the rewritten input.
#[derive(Debug, Clone)]
pub struct HookContext {
    /// The hook event type
    pub event: HookEvent,

    // === Tool-specific (populated for tool hooks) ===
    /// Tool name being called
    pub tool_name: Option<String>,

    /// Tool input - can be modified by hook
    pub tool_input: Option<Value>,

    /// Tool use ID
    pub tool_use_id: Option<String>,

    // === Results (for post hooks) ===
    /// Tool result (for PostToolUse)
    pub tool_result: Option<ToolResult>,

    /// Error message (for PostToolUseFailure)
    pub error: Option<String>,

    // === User input (for UserPromptSubmit) ===
    /// User prompt - can be modified by hook
    pub user_prompt: Option<String>,

    /// What triggered compaction (for PreCompact), e.g. "manual" or "auto"
    pub trigger: Option<String>,

    /// Scratch space shared by hooks within one dispatch
    pub metadata: HashMap<String, Value>,
}

impl HookContext {
    fn empty(event: HookEvent) -> Self {
        Self {
            event,
            tool_name: None,
            tool_input: None,
            tool_use_id: None,
            tool_result: None,
            error: None,
            user_prompt: None,
            trigger: None,
            metadata: HashMap::new(),
        }
    }

    /// Create context for a tool event from an invocation
    pub fn for_tool(event: HookEvent, invocation: &ToolInvocation) -> Self {
        Self {
            tool_name: Some(invocation.tool_name.clone()),
            tool_input: Some(invocation.input.clone()),
            tool_use_id: Some(invocation.id.clone()),
            ..Self::empty(event)
        }
    }

    /// Create context for PreToolUse hook
    pub fn pre_tool_use(invocation: &ToolInvocation) -> Self {
        Self::for_tool(HookEvent::PreToolUse, invocation)
    }

    /// Create context for PostToolUse hook
    pub fn post_tool_use(invocation: &ToolInvocation, result: &ToolResult) -> Self {
        Self {
            tool_result: Some(result.clone()),
            ..Self::for_tool(HookEvent::PostToolUse, invocation)
        }
    }

    /// Create context for PostToolUseFailure hook
    pub fn post_tool_use_failure(invocation: &ToolInvocation, error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::for_tool(HookEvent::PostToolUseFailure, invocation)
        }
    }

    /// Create context for UserPromptSubmit hook
    pub fn user_prompt_submit(prompt: &str) -> Self {
        Self {
            user_prompt: Some(prompt.to_string()),
            ..Self::empty(HookEvent::UserPromptSubmit)
        }
    }

    /// Create context for PreCompact hook
    pub fn pre_compact(trigger: &str) -> Self {
        Self {
            trigger: Some(trigger.to_string()),
            ..Self::empty(HookEvent::PreCompact)
        }
    }

    /// Get a string field from the tool input
    pub fn input_str(&self, field: &str) -> Option<&str> {
        self.tool_input
            .as_ref()
            .and_then(|v| v.get(field))
            .and_then(|v| v.as_str())
    }

    /// Get metadata value
    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Set metadata value
    pub fn set_metadata(&mut self, key: &str, value: Value) {
        self.metadata.insert(key.to_string(), value);
    }
}

/// Permission decision for PreToolUse hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionDecision {
    /// Allow the tool call
    Allow,
    /// Deny the tool call, return error to the caller
    Deny,
    /// Use normal permission flow
    Ask,
}

/// Result returned from a hook
///
/// For most hooks, just return `HookResult::none()`.
/// Hooks that rewrite tool input return `HookResult::update_input(new_input)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookResult {
    /// Permission decision (mainly for PreToolUse)
    pub decision: Option<PermissionDecision>,

    /// Reason for the decision (shown in error message if denied)
    pub reason: Option<String>,

    /// Replacement for the whole tool input record (None = no change)
    pub updated_input: Option<Value>,
}

impl HookResult {
    /// Allow the operation (skip permission check)
    pub fn allow() -> Self {
        Self {
            decision: Some(PermissionDecision::Allow),
            ..Self::default()
        }
    }

    /// Deny the operation with a reason
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            decision: Some(PermissionDecision::Deny),
            reason: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Use normal permission flow
    pub fn ask() -> Self {
        Self {
            decision: Some(PermissionDecision::Ask),
            ..Self::default()
        }
    }

    /// No decision, no change - continue with default behavior
    pub fn none() -> Self {
        Self::default()
    }

    /// Replace the tool input without making a permission decision
    pub fn update_input(input: Value) -> Self {
        Self {
            updated_input: Some(input),
            ..Self::default()
        }
    }

    /// Add a reason to an existing result
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attach a replacement tool input to an existing result
    pub fn with_updated_input(mut self, input: Value) -> Self {
        self.updated_input = Some(input);
        self
    }

    /// Whether this result changes nothing
    pub fn is_none(&self) -> bool {
        self.decision.is_none() && self.updated_input.is_none()
    }
}
