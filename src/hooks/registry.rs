//! Hook Registry
//!
//! Contains:
//! - `Hook` trait - for implementing hooks
//! - `HookMatcher` - matches tools by regex pattern
//! - `HookRegistry` - stores and runs hooks

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use anyhow::anyhow;
use regex::Regex;

use super::types::{HookContext, HookEvent, HookResult, PermissionDecision};
use crate::core::{GuardError, GuardResult};
use crate::tools::ToolInvocation;

/// Trait for hook implementations
///
/// Hooks are synchronous and must not block. Returning `Err` (or panicking)
/// aborts the dispatch, and the tool call it was guarding is not executed.
pub trait Hook: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Execute the hook with the given context
    fn call(&self, ctx: &mut HookContext) -> anyhow::Result<HookResult>;
}

/// Implement Hook for closures
impl<F> Hook for F
where
    F: Fn(&mut HookContext) -> anyhow::Result<HookResult> + Send + Sync,
{
    fn call(&self, ctx: &mut HookContext) -> anyhow::Result<HookResult> {
        (self)(ctx)
    }
}

/// Type alias for stored hooks
pub type ArcHook = Arc<dyn Hook>;

/// Matches tools by name pattern and executes a hook
pub struct HookMatcher {
    /// Regex pattern to match tool names (None = match all)
    pattern: Option<Regex>,

    /// Display name, defaults to the hook's own name
    name: String,

    /// The hook to execute
    hook: ArcHook,
}

impl HookMatcher {
    /// Create a matcher that matches all tools
    pub fn new<H: Hook + 'static>(hook: H) -> Self {
        Self {
            pattern: None,
            name: hook.name().to_string(),
            hook: Arc::new(hook),
        }
    }

    /// Create a matcher with a regex pattern
    ///
    /// Pattern examples:
    /// - `"^Bash$"` - match only the Bash tool
    /// - `"Read|Write|Edit"` - match file tools
    /// - `"^mcp__"` - match all MCP tools
    pub fn with_pattern<H: Hook + 'static>(
        pattern: &str,
        hook: H,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Some(Regex::new(pattern)?),
            name: hook.name().to_string(),
            hook: Arc::new(hook),
        })
    }

    /// Override the name shown in logs and errors
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Name of this matcher's hook
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if this matcher applies to a tool name
    pub fn matches(&self, tool_name: &str) -> bool {
        match &self.pattern {
            Some(regex) => regex.is_match(tool_name),
            None => true,
        }
    }

    /// Run the hook with the given context
    ///
    /// A panic inside the hook is turned into an error.
    pub fn run(&self, ctx: &mut HookContext) -> anyhow::Result<HookResult> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.hook.call(ctx))) {
            Ok(result) => result,
            Err(payload) => Err(anyhow!(
                "hook panicked: {}",
                panic_message(payload.as_ref())
            )),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl std::fmt::Debug for HookMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookMatcher")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_ref().map(|r| r.as_str()))
            .finish()
    }
}

/// A tool invocation after PreToolUse hooks have run
#[derive(Debug, Clone)]
pub struct Dispatched {
    /// The invocation to execute, with every hook rewrite applied
    pub invocation: ToolInvocation,

    /// Combined permission decision of all matched hooks
    pub result: HookResult,
}

impl Dispatched {
    /// Whether a hook denied the invocation
    pub fn is_denied(&self) -> bool {
        self.result.decision == Some(PermissionDecision::Deny)
    }
}

/// Registered matchers, split into the ordinary list and the pinned tail
#[derive(Default)]
struct HookTable {
    regular: HashMap<HookEvent, Vec<Arc<HookMatcher>>>,
    pinned: HashMap<HookEvent, Vec<Arc<HookMatcher>>>,
}

/// Central registry for all hooks
///
/// Registration takes `&self`, so a registry shared as `Arc<HookRegistry>` can
/// still gain hooks at runtime. Each run works on a snapshot of the matchers
/// taken under the read lock.
///
/// Pinned hooks (`add_pinned`) always run after every ordinary hook of the
/// same event, however late the ordinary hook was added.
///
/// # Example
///
/// ```ignore
/// let hooks = HookRegistry::new();
///
/// hooks.add_with_pattern(HookEvent::PreToolUse, "^Bash$", |ctx: &mut HookContext| {
///     if ctx.input_str("command").unwrap_or("").contains("rm -rf") {
///         Ok(HookResult::deny("Dangerous command blocked"))
///     } else {
///         Ok(HookResult::none())
///     }
/// })?;
/// ```
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<HookTable>,

    /// Stop running hooks after the first Deny
    short_circuit_on_deny: bool,
}

impl HookRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop at the first Deny instead of running every matched hook
    pub fn with_short_circuit_on_deny(mut self, enabled: bool) -> Self {
        self.short_circuit_on_deny = enabled;
        self
    }

    /// Add a hook that matches all tools
    pub fn add<H: Hook + 'static>(&self, event: HookEvent, hook: H) -> GuardResult<&Self> {
        self.add_matcher(event, HookMatcher::new(hook))
    }

    /// Add a hook with a tool name pattern
    pub fn add_with_pattern<H: Hook + 'static>(
        &self,
        event: HookEvent,
        pattern: &str,
        hook: H,
    ) -> GuardResult<&Self> {
        self.add_matcher(event, HookMatcher::with_pattern(pattern, hook)?)
    }

    /// Add a pre-built matcher
    pub fn add_matcher(&self, event: HookEvent, matcher: HookMatcher) -> GuardResult<&Self> {
        tracing::debug!("[HookRegistry] Registering {:?} for {}", matcher, event);
        self.hooks
            .write()
            .map_err(|_| GuardError::RegistryPoisoned)?
            .regular
            .entry(event)
            .or_default()
            .push(Arc::new(matcher));
        Ok(self)
    }

    /// Add a matcher that runs after all ordinary hooks of `event`
    ///
    /// Pinned matchers run in the order they were pinned.
    pub fn add_pinned(&self, event: HookEvent, matcher: HookMatcher) -> GuardResult<&Self> {
        tracing::debug!("[HookRegistry] Pinning {:?} for {}", matcher, event);
        self.hooks
            .write()
            .map_err(|_| GuardError::RegistryPoisoned)?
            .pinned
            .entry(event)
            .or_default()
            .push(Arc::new(matcher));
        Ok(self)
    }

    /// Check if there are any hooks for an event
    pub fn has_hooks(&self, event: HookEvent) -> bool {
        self.hook_count(event) > 0
    }

    /// Get the number of hooks for an event
    pub fn hook_count(&self, event: HookEvent) -> usize {
        self.hooks
            .read()
            .map(|table| {
                let regular = table.regular.get(&event).map(|v| v.len()).unwrap_or(0);
                let pinned = table.pinned.get(&event).map(|v| v.len()).unwrap_or(0);
                regular + pinned
            })
            .unwrap_or(0)
    }

    fn snapshot(&self, ctx: &HookContext) -> GuardResult<Vec<Arc<HookMatcher>>> {
        let table = self.hooks.read().map_err(|_| GuardError::RegistryPoisoned)?;
        let regular = table.regular.get(&ctx.event).into_iter().flatten();
        let pinned = table.pinned.get(&ctx.event).into_iter().flatten();

        Ok(regular
            .chain(pinned)
            .filter(|matcher| match (&ctx.tool_name, ctx.event.is_tool_event()) {
                (Some(name), true) => matcher.matches(name),
                _ => true,
            })
            .cloned()
            .collect())
    }

    /// Run all matching hooks for an event
    ///
    /// For tool hooks, filters by tool name.
    /// For non-tool hooks (like UserPromptSubmit), runs all hooks.
    ///
    /// Hooks run in registration order, pinned hooks last. A returned `updated_input` replaces
    /// `ctx.tool_input` before the next hook runs, so rewrites compose.
    ///
    /// Permission decisions are combined with priority:
    /// - If ANY hook said Deny → DENY (most restrictive wins)
    /// - Else if ANY hook said Allow → ALLOW
    /// - Else if ANY hook said Ask → ASK
    /// - Else (all said None) → NONE (continue normal flow)
    ///
    /// A hook error or panic stops the run and is returned as
    /// `GuardError::HookFailed`.
    pub fn run(&self, ctx: &mut HookContext) -> GuardResult<HookResult> {
        let matchers = self.snapshot(ctx)?;
        let mut combined = HookResult::none();

        for matcher in &matchers {
            let mut result = matcher.run(ctx).map_err(|e| {
                tracing::warn!(
                    "[HookRegistry] Hook '{}' failed during {}: {:#}",
                    matcher.name(),
                    ctx.event,
                    e
                );
                GuardError::HookFailed {
                    hook: matcher.name().to_string(),
                    event: ctx.event,
                    tool: ctx.tool_name.clone().unwrap_or_else(|| "-".to_string()),
                    reason: format!("{:#}", e),
                }
            })?;

            if let Some(updated) = result.updated_input.take() {
                tracing::debug!(
                    "[HookRegistry] Hook '{}' rewrote tool input",
                    matcher.name()
                );
                ctx.tool_input = Some(updated);
            }

            combined = combine_results(combined, result);

            if self.short_circuit_on_deny && combined.decision == Some(PermissionDecision::Deny) {
                tracing::debug!(
                    "[HookRegistry] Short-circuiting on Deny (remaining hooks skipped)"
                );
                break;
            }
        }

        Ok(combined)
    }

    /// Run the hooks for a tool event and return the invocation to execute
    ///
    /// The returned invocation carries every rewrite; the original is never
    /// used in its place. A hook that leaves no tool input behind is an
    /// error, as is any hook failure. Any error means the tool must not run.
    pub fn dispatch(
        &self,
        event: HookEvent,
        invocation: ToolInvocation,
    ) -> GuardResult<Dispatched> {
        let mut ctx = HookContext::for_tool(event, &invocation);
        let result = self.run(&mut ctx)?;

        let Some(input) = ctx.tool_input else {
            tracing::warn!(
                "[HookRegistry] {} hooks removed the input of {}",
                event,
                invocation.tool_name
            );
            return Err(GuardError::invalid_input(
                invocation.tool_name,
                "tool input was removed by a hook",
            ));
        };

        Ok(Dispatched {
            invocation: ToolInvocation { input, ..invocation },
            result,
        })
    }
}

/// Combine two hook results
///
/// Priority: Deny > Allow > Ask > None
fn combine_results(a: HookResult, b: HookResult) -> HookResult {
    match (a.decision, b.decision) {
        (Some(PermissionDecision::Deny), _) => a,
        (_, Some(PermissionDecision::Deny)) => b,

        (Some(PermissionDecision::Allow), _) => a,
        (_, Some(PermissionDecision::Allow)) => b,

        (Some(PermissionDecision::Ask), _) => a,
        (_, Some(PermissionDecision::Ask)) => b,

        _ => HookResult::none(),
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        if let Ok(table) = self.hooks.read() {
            for (event, matchers) in table.regular.iter() {
                let pinned = table.pinned.get(event).map(|v| v.len()).unwrap_or(0);
                map.entry(event, &(matchers.len() + pinned));
            }
            for (event, matchers) in table.pinned.iter() {
                if !table.regular.contains_key(event) {
                    map.entry(event, &matchers.len());
                }
            }
        }
        map.finish()
    }
}
