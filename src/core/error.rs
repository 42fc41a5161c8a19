//! Guard error types

use thiserror::Error;

use crate::hooks::HookEvent;

/// Errors that can occur while intercepting and executing tools
#[derive(Error, Debug)]
pub enum GuardError {
    /// A hook callback failed; the tool call must not run
    #[error("Hook '{hook}' failed during {event} for tool {tool}: {reason}")]
    HookFailed {
        hook: String,
        event: HookEvent,
        tool: String,
        reason: String,
    },

    /// The hook table lock was poisoned by a panicking writer
    #[error("Hook registry lock poisoned")]
    RegistryPoisoned,

    /// A secret name is not a valid shell identifier
    #[error("Invalid secret variable name: {0:?}")]
    InvalidSecretName(String),

    /// A secret name was listed twice
    #[error("Duplicate secret variable name: {0}")]
    DuplicateSecretName(String),

    /// Tool input does not have the expected shape
    #[error("Invalid tool input for {tool}: {reason}")]
    InvalidToolInput { tool: String, reason: String },

    /// No tool registered under this name
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// A hook matcher pattern failed to compile
    #[error("Invalid hook pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

}

impl GuardError {
    /// Create an invalid tool input error
    pub fn invalid_input(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        GuardError::InvalidToolInput {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GuardError::InvalidSecretName("A-B".into());
        assert_eq!(err.to_string(), "Invalid secret variable name: \"A-B\"");

        let err = GuardError::RegistryPoisoned;
        assert_eq!(err.to_string(), "Hook registry lock poisoned");

        let err = GuardError::HookFailed {
            hook: "sanitize".into(),
            event: HookEvent::PreToolUse,
            tool: "Bash".into(),
            reason: "boom".into(),
        };
        assert_eq!(
            err.to_string(),
            "Hook 'sanitize' failed during PreToolUse for tool Bash: boom"
        );
    }

    #[test]
    fn test_error_from_pattern() {
        let err: GuardError = regex::Regex::new("(").unwrap_err().into();
        assert!(matches!(err, GuardError::InvalidPattern(_)));

        let err = GuardError::invalid_input("Bash", "missing command");
        assert_eq!(err.to_string(), "Invalid tool input for Bash: missing command");
    }
}
