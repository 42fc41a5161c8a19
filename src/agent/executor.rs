//! Tool Executor
//!
//! Runs PreToolUse hooks, then executes the rewritten invocation.
//! A failing hook means the tool does not run at all, and a guarded shell
//! command that lost its unset clause is refused.

use std::sync::Arc;

use crate::core::GuardResult;
use crate::hooks::{Dispatched, HookContext, HookEvent, HookRegistry};
use crate::sanitize::SanitizingInterceptor;
use crate::tools::{ToolInvocation, ToolRegistry, ToolResult};

/// Handles tool execution with hooks
#[derive(Clone)]
pub struct ToolExecutor {
    tools: Arc<ToolRegistry>,
    hooks: Arc<HookRegistry>,
    guard: Option<SanitizingInterceptor>,
}

impl ToolExecutor {
    pub fn new(tools: Arc<ToolRegistry>, hooks: Arc<HookRegistry>) -> Self {
        Self {
            tools,
            hooks,
            guard: None,
        }
    }

    /// Verify every dispatched shell command against this interceptor
    pub fn with_guard(mut self, guard: SanitizingInterceptor) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Run PreToolUse hooks and return the invocation that would execute
    ///
    /// With a guard set, a shell invocation whose final command does not
    /// start with the unset clause is an error.
    pub fn prepare(&self, invocation: ToolInvocation) -> GuardResult<Dispatched> {
        let dispatched = self.hooks.dispatch(HookEvent::PreToolUse, invocation)?;

        if let Some(guard) = &self.guard {
            let final_call = &dispatched.invocation;
            if guard.guards(&final_call.tool_name) && !dispatched.is_denied() {
                guard.verify(&final_call.tool_name, &final_call.input)?;
            }
        }

        Ok(dispatched)
    }

    /// Execute a tool call with hooks
    ///
    /// This handles the full flow:
    /// 1. Run PreToolUse hooks (can block or rewrite input)
    /// 2. Refuse to run if any hook failed or denied
    /// 3. Execute the rewritten input
    /// 4. Run PostToolUse or PostToolUseFailure hooks
    pub async fn execute(&self, invocation: ToolInvocation) -> ToolResult {
        let tool_name = invocation.tool_name.clone();

        let dispatched = match self.prepare(invocation) {
            Ok(dispatched) => dispatched,
            Err(e) => {
                tracing::warn!(
                    "[Executor] PreToolUse failed for {}, not executing: {}",
                    tool_name,
                    e
                );
                return ToolResult::error(format!("Tool execution failed: {}", e));
            }
        };

        if dispatched.is_denied() {
            let reason = dispatched
                .result
                .reason
                .unwrap_or_else(|| "Blocked by hook".to_string());
            tracing::info!("[Executor] Hook denied {}: {}", tool_name, reason);
            return ToolResult::error(format!("Hook denied: {}", reason));
        }

        self.execute_with_hooks(&dispatched.invocation).await
    }

    /// Execute a list of tool calls in order
    pub async fn execute_all(&self, invocations: Vec<ToolInvocation>) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(invocations.len());
        for invocation in invocations {
            results.push(self.execute(invocation).await);
        }
        results
    }

    /// Execute a tool with post-execution hooks
    async fn execute_with_hooks(&self, invocation: &ToolInvocation) -> ToolResult {
        tracing::debug!(
            "[Executor] Running {} ({} bytes of input)",
            invocation.tool_name,
            invocation.input.to_string().len()
        );
        if let Some(info) = self.tools.get_tool_info(&invocation.tool_name, &invocation.input) {
            tracing::trace!("[Executor] {}", info.action_description);
        }

        match self
            .tools
            .execute(&invocation.tool_name, &invocation.input)
            .await
        {
            Ok(result) => {
                let mut ctx = HookContext::post_tool_use(invocation, &result);
                if let Err(e) = self.hooks.run(&mut ctx) {
                    tracing::warn!("[Executor] PostToolUse hook failed: {}", e);
                }
                result
            }
            Err(e) => {
                let error_msg = format!("Tool execution failed: {}", e);

                let mut ctx = HookContext::post_tool_use_failure(invocation, &error_msg);
                if let Err(e) = self.hooks.run(&mut ctx) {
                    tracing::warn!("[Executor] PostToolUseFailure hook failed: {}", e);
                }

                ToolResult::error(error_msg)
            }
        }
    }
}

impl std::fmt::Debug for ToolExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolExecutor")
            .field("tools", &self.tools.tool_names())
            .field("hooks", &self.hooks)
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{HookMatcher, HookResult};
    use crate::tools::{Tool, ToolInfo};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Records every input it is asked to run
    struct RecordingTool {
        seen: Arc<Mutex<Vec<Value>>>,
    }

    #[async_trait]
    impl Tool for RecordingTool {
        fn name(&self) -> &str {
            "Bash"
        }

        fn description(&self) -> &str {
            "records inputs"
        }

        fn get_info(&self, _input: &Value) -> ToolInfo {
            ToolInfo {
                name: "Bash".to_string(),
                action_description: "record".to_string(),
                details: None,
            }
        }

        async fn execute(&self, input: &Value) -> anyhow::Result<ToolResult> {
            self.seen.lock().unwrap().push(input.clone());
            Ok(ToolResult::success("ok"))
        }
    }

    fn executor(hooks: HookRegistry) -> (ToolExecutor, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut tools = ToolRegistry::new();
        tools.register(RecordingTool { seen: seen.clone() });
        (ToolExecutor::new(Arc::new(tools), Arc::new(hooks)), seen)
    }

    #[tokio::test]
    async fn test_executes_rewritten_input() {
        let hooks = HookRegistry::new();
        let secrets = crate::sanitize::SecretSet::new(["A"]).unwrap();
        let guard = crate::sanitize::install(&hooks, secrets).unwrap();
        let (executor, seen) = executor(hooks);
        let executor = executor.with_guard(guard);

        let result = executor
            .execute(ToolInvocation::new("Bash", json!({"command": "env"})))
            .await;

        assert!(!result.is_error);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![json!({"command": "unset A 2>/dev/null; env"})]
        );
    }

    #[tokio::test]
    async fn test_guard_refuses_unprefixed_shell_command() {
        let hooks = HookRegistry::new();
        let secrets = crate::sanitize::SecretSet::new(["A"]).unwrap();
        let guard = crate::sanitize::install(&hooks, secrets).unwrap();
        // Pinned after the sanitizer, so it undoes the prefix
        hooks
            .add_pinned(
                HookEvent::PreToolUse,
                HookMatcher::new(|_ctx: &mut HookContext| -> anyhow::Result<HookResult> {
                    Ok(HookResult::update_input(json!({"command": "echo $A"})))
                }),
            )
            .unwrap();
        let (executor, seen) = executor(hooks);
        let executor = executor.with_guard(guard);

        let result = executor
            .execute(ToolInvocation::new("Bash", json!({"command": "ls"})))
            .await;

        assert!(result.is_error);
        assert!(result.output.contains("does not start with the secret unset clause"));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_hook_blocks_execution() {
        let hooks = HookRegistry::new();
        hooks
            .add_matcher(
                HookEvent::PreToolUse,
                HookMatcher::new(|_ctx: &mut HookContext| -> anyhow::Result<HookResult> {
                    anyhow::bail!("cannot sanitize")
                })
                .named("broken"),
            )
            .unwrap();
        let (executor, seen) = executor(hooks);

        let result = executor
            .execute(ToolInvocation::new("Bash", json!({"command": "env"})))
            .await;

        assert!(result.is_error);
        assert!(result
            .output
            .starts_with("Tool execution failed: Hook 'broken' failed"));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deny_blocks_execution() {
        let hooks = HookRegistry::new();
        hooks
            .add(HookEvent::PreToolUse, |_ctx: &mut HookContext| -> anyhow::Result<HookResult> {
                Ok(HookResult::deny("no shell today"))
            })
            .unwrap();
        let (executor, seen) = executor(hooks);

        let result = executor
            .execute(ToolInvocation::new("Bash", json!({"command": "ls"})))
            .await;

        assert_eq!(result, ToolResult::error("Hook denied: no shell today"));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_post_hook_failure_does_not_change_result() {
        let hooks = HookRegistry::new();
        hooks
            .add(HookEvent::PostToolUse, |_ctx: &mut HookContext| -> anyhow::Result<HookResult> {
                anyhow::bail!("audit log unavailable")
            })
            .unwrap();
        let (executor, _seen) = executor(hooks);

        let result = executor
            .execute(ToolInvocation::new("Bash", json!({"command": "ls"})))
            .await;
        assert_eq!(result, ToolResult::success("ok"));
    }

    #[tokio::test]
    async fn test_unknown_tool_reports_failure() {
        let (executor, _seen) = executor(HookRegistry::new());
        let result = executor
            .execute(ToolInvocation::new("Missing", json!({})))
            .await;
        assert_eq!(
            result,
            ToolResult::error("Tool execution failed: Tool not found: Missing")
        );
    }

    #[tokio::test]
    async fn test_execute_all_keeps_order() {
        let (executor, seen) = executor(HookRegistry::new());
        let results = executor
            .execute_all(vec![
                ToolInvocation::new("Bash", json!({"command": "one"})),
                ToolInvocation::new("Bash", json!({"command": "two"})),
            ])
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![json!({"command": "one"}), json!({"command": "two"})]
        );
    }
}
