//! Sanitizing Interceptor
//!
//! A PreToolUse hook bound to the shell tool. It prefixes every non-empty
//! command with `unset <names> 2>/dev/null; `, so the secrets are gone from
//! the spawned shell (and everything it forks) before any of the original
//! command runs. The parent environment is never touched.
//!
//! The hook is pinned behind every other PreToolUse hook, and the executor
//! re-checks the final command with `verify` before spawning anything.

use serde_json::Value;

use super::secrets::SecretSet;
use crate::core::{GuardError, GuardResult};
use crate::hooks::{Hook, HookContext, HookEvent, HookMatcher, HookRegistry, HookResult};
use crate::tools::BASH_TOOL_NAME;

/// Name the interceptor registers under
pub const SANITIZER_HOOK_NAME: &str = "secret-env-sanitizer";

/// Tool pattern the interceptor is matched against
pub const SHELL_TOOL_PATTERN: &str = "^Bash$";

/// Rewrites shell commands so the secret names are unset first
///
/// Holds nothing but the immutable `SecretSet`, so one instance serves any
/// number of concurrent invocations.
#[derive(Debug, Clone)]
pub struct SanitizingInterceptor {
    secrets: SecretSet,
}

impl SanitizingInterceptor {
    pub fn new(secrets: SecretSet) -> Self {
        Self { secrets }
    }

    pub fn secrets(&self) -> &SecretSet {
        &self.secrets
    }

    /// Prefix a command with the unset clause
    pub fn rewrite_command(&self, command: &str) -> String {
        let mut rewritten = self.secrets.unset_clause();
        rewritten.push_str(command);
        rewritten
    }

    /// Compute the replacement input for a shell invocation
    ///
    /// Returns `Ok(None)` when there is nothing to do: no `command` field,
    /// a null or empty command, or an empty secret set. Every other field of
    /// the input is carried over unchanged.
    pub fn sanitize(&self, tool_name: &str, input: &Value) -> GuardResult<Option<Value>> {
        let Some(fields) = input.as_object() else {
            return Err(GuardError::invalid_input(tool_name, "tool input is not an object"));
        };

        let command = match fields.get("command") {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(command)) => command,
            Some(other) => {
                return Err(GuardError::invalid_input(
                    tool_name,
                    format!("command must be a string, got {}", json_kind(other)),
                ))
            }
        };

        if command.is_empty() || self.secrets.is_empty() {
            return Ok(None);
        }

        let mut updated = fields.clone();
        updated.insert(
            "command".to_string(),
            Value::String(self.rewrite_command(command)),
        );
        Ok(Some(Value::Object(updated)))
    }

    /// Check that a final shell input is safe to execute
    ///
    /// Accepts exactly the inputs `sanitize` leaves alone or produces: no
    /// command, an empty command, or a command that starts with the unset
    /// clause. Anything else was rewritten after sanitization.
    pub fn verify(&self, tool_name: &str, input: &Value) -> GuardResult<()> {
        let Some(fields) = input.as_object() else {
            return Err(GuardError::invalid_input(tool_name, "tool input is not an object"));
        };

        match fields.get("command") {
            None | Some(Value::Null) => Ok(()),
            Some(Value::String(command)) => {
                let clause = self.secrets.unset_clause();
                if command.is_empty() || command.starts_with(&clause) {
                    Ok(())
                } else {
                    Err(GuardError::invalid_input(
                        tool_name,
                        "command does not start with the secret unset clause",
                    ))
                }
            }
            Some(other) => Err(GuardError::invalid_input(
                tool_name,
                format!("command must be a string, got {}", json_kind(other)),
            )),
        }
    }

    /// Whether the executor should `verify` invocations of this tool
    pub fn guards(&self, tool_name: &str) -> bool {
        tool_name == BASH_TOOL_NAME
    }

    /// Wrap this interceptor in a matcher bound to the shell tool
    pub fn into_matcher(self) -> GuardResult<HookMatcher> {
        Ok(HookMatcher::with_pattern(SHELL_TOOL_PATTERN, self)?)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Hook for SanitizingInterceptor {
    fn name(&self) -> &str {
        SANITIZER_HOOK_NAME
    }

    fn call(&self, ctx: &mut HookContext) -> anyhow::Result<HookResult> {
        let tool_name = ctx.tool_name.as_deref().unwrap_or(BASH_TOOL_NAME);
        let Some(input) = ctx.tool_input.as_ref() else {
            return Err(GuardError::invalid_input(tool_name, "tool input is missing").into());
        };

        match self.sanitize(tool_name, input)? {
            Some(updated) => {
                tracing::debug!(
                    "[Sanitizer] Prefixed {} command with unset of {} name(s)",
                    tool_name,
                    self.secrets.len()
                );
                Ok(HookResult::update_input(updated))
            }
            None => Ok(HookResult::none()),
        }
    }
}

/// Register the interceptor on PreToolUse for the shell tool
///
/// The matcher is pinned, so it runs after every ordinary PreToolUse hook,
/// including hooks added later. Call this once at startup. Returns a copy of
/// the interceptor for `ToolExecutor::with_guard`.
pub fn install(hooks: &HookRegistry, secrets: SecretSet) -> GuardResult<SanitizingInterceptor> {
    if secrets.is_empty() {
        tracing::warn!("[Sanitizer] Secret set is empty; shell commands will not be rewritten");
    }
    tracing::info!("[Sanitizer] Installing for {} secret name(s)", secrets.len());
    tracing::debug!("[Sanitizer] Secret names: {:?}", secrets.names());

    let interceptor = SanitizingInterceptor::new(secrets);
    hooks.add_pinned(HookEvent::PreToolUse, interceptor.clone().into_matcher()?)?;
    Ok(interceptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolInvocation;
    use serde_json::json;

    fn interceptor() -> SanitizingInterceptor {
        SanitizingInterceptor::new(SecretSet::new(["A", "B"]).unwrap())
    }

    #[test]
    fn test_prefixes_command_and_keeps_other_fields() {
        let input = json!({"command": "env", "timeout": 1000, "description": "dump env"});
        let updated = interceptor().sanitize("Bash", &input).unwrap().unwrap();

        assert_eq!(
            updated,
            json!({
                "command": "unset A B 2>/dev/null; env",
                "timeout": 1000,
                "description": "dump env"
            })
        );
    }

    #[test]
    fn test_original_command_kept_verbatim() {
        let command = "echo $A; export A=fake && echo \"$B\" | tr a-z A-Z # trailing";
        let updated = interceptor()
            .sanitize("Bash", &json!({ "command": command }))
            .unwrap()
            .unwrap();
        let rewritten = updated["command"].as_str().unwrap();

        assert_eq!(rewritten.strip_prefix("unset A B 2>/dev/null; "), Some(command));
    }

    #[test]
    fn test_no_change_without_command() {
        let i = interceptor();
        assert_eq!(i.sanitize("Bash", &json!({"command": ""})).unwrap(), None);
        assert_eq!(i.sanitize("Bash", &json!({"command": null})).unwrap(), None);
        assert_eq!(i.sanitize("Bash", &json!({"timeout": 5})).unwrap(), None);
    }

    #[test]
    fn test_whitespace_command_is_still_prefixed() {
        let updated = interceptor().sanitize("Bash", &json!({"command": " "})).unwrap().unwrap();
        assert_eq!(updated["command"], "unset A B 2>/dev/null;  ");
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        let i = interceptor();
        let err = i.sanitize("Bash", &json!({"command": 42})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid tool input for Bash: command must be a string, got number"
        );
        assert!(i.sanitize("Bash", &json!("env")).is_err());
    }

    #[test]
    fn test_empty_secret_set_is_a_no_op() {
        let i = SanitizingInterceptor::new(SecretSet::new(Vec::<String>::new()).unwrap());
        assert_eq!(i.sanitize("Bash", &json!({"command": "env"})).unwrap(), None);
    }

    #[test]
    fn test_install_matches_only_the_shell_tool() {
        let hooks = HookRegistry::new();
        install(&hooks, SecretSet::new(["A", "B"]).unwrap()).unwrap();
        assert_eq!(hooks.hook_count(HookEvent::PreToolUse), 1);

        let bash = ToolInvocation::new("Bash", json!({"command": "echo $A"}));
        let dispatched = hooks.dispatch(HookEvent::PreToolUse, bash).unwrap();
        assert_eq!(dispatched.invocation.input["command"], "unset A B 2>/dev/null; echo $A");

        for name in ["Read", "BashOutput", "bash"] {
            let input = json!({"command": "echo $A"});
            let other = ToolInvocation::new(name, input.clone());
            let dispatched = hooks.dispatch(HookEvent::PreToolUse, other).unwrap();
            assert_eq!(dispatched.invocation.input, input, "{name}");
        }
    }

    #[test]
    fn test_malformed_input_fails_dispatch() {
        let hooks = HookRegistry::new();
        install(&hooks, SecretSet::new(["A"]).unwrap()).unwrap();

        let bash = ToolInvocation::new("Bash", json!({"command": ["env"]}));
        let err = hooks.dispatch(HookEvent::PreToolUse, bash).unwrap_err();
        assert!(matches!(
            err,
            GuardError::HookFailed { ref hook, .. } if hook == SANITIZER_HOOK_NAME
        ));
    }

    #[test]
    fn test_sees_rewrites_from_earlier_hooks() {
        let hooks = HookRegistry::new();
        let change_dir = |ctx: &mut HookContext| -> anyhow::Result<HookResult> {
            let mut input = ctx.tool_input.clone().unwrap_or_default();
            input["command"] = json!("cd /tmp && env");
            Ok(HookResult::update_input(input))
        };
        hooks
            .add_with_pattern(HookEvent::PreToolUse, "^Bash$", change_dir)
            .unwrap();
        install(&hooks, SecretSet::new(["A"]).unwrap()).unwrap();

        let bash = ToolInvocation::new("Bash", json!({"command": "env"}));
        let dispatched = hooks.dispatch(HookEvent::PreToolUse, bash).unwrap();
        assert_eq!(
            dispatched.invocation.input["command"],
            "unset A 2>/dev/null; cd /tmp && env"
        );
    }

    #[test]
    fn test_stays_last_when_hooks_are_added_later() {
        let hooks = HookRegistry::new();
        install(&hooks, SecretSet::new(["A"]).unwrap()).unwrap();
        let replace = |_ctx: &mut HookContext| -> anyhow::Result<HookResult> {
            Ok(HookResult::update_input(json!({"command": "echo $A"})))
        };
        hooks
            .add_with_pattern(HookEvent::PreToolUse, "^Bash$", replace)
            .unwrap();

        let bash = ToolInvocation::new("Bash", json!({"command": "echo hi"}));
        let dispatched = hooks.dispatch(HookEvent::PreToolUse, bash).unwrap();
        assert_eq!(
            dispatched.invocation.input["command"],
            "unset A 2>/dev/null; echo $A"
        );
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let mut ctx = HookContext::pre_tool_use(&ToolInvocation::new("Bash", json!({})));
        ctx.tool_input = None;

        let err = interceptor().call(&mut ctx).unwrap_err();
        assert_eq!(err.to_string(), "Invalid tool input for Bash: tool input is missing");
    }

    #[test]
    fn test_verify() {
        let i = interceptor();
        assert!(i.verify("Bash", &json!({"command": "unset A B 2>/dev/null; env"})).is_ok());
        assert!(i.verify("Bash", &json!({"command": ""})).is_ok());
        assert!(i.verify("Bash", &json!({"timeout": 5})).is_ok());

        let err = i.verify("Bash", &json!({"command": "env"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid tool input for Bash: command does not start with the secret unset clause"
        );
        assert!(i.verify("Bash", &json!({"command": "unset A 2>/dev/null; env"})).is_err());
        assert!(i.verify("Bash", &json!({"command": 1})).is_err());

        assert!(i.guards("Bash"));
        assert!(!i.guards("Read"));
    }
}
