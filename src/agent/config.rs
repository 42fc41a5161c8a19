//! Agent Configuration
//!
//! Wires the tool registry, the hook registry and the secret set together.

use std::sync::Arc;

use crate::core::GuardResult;
use crate::hooks::HookRegistry;
use crate::sanitize::{self, SecretSet};
use crate::tools::{BashTool, ToolRegistry};

use super::executor::ToolExecutor;

/// Environment variable listing the secret names (comma-separated)
pub const SECRETS_ENV_VAR: &str = "SHADOW_GUARD_SECRETS";

/// Secret names used when `SHADOW_GUARD_SECRETS` is not set
pub const DEFAULT_SECRET_NAMES: &[&str] = &["ANTHROPIC_API_KEY", "GEMINI_API_KEY"];

/// Which variable names the sanitizer keeps out of spawned shells
#[derive(Debug, Clone)]
pub struct SanitizerConfig {
    pub secrets: SecretSet,
}

impl SanitizerConfig {
    /// Read `SHADOW_GUARD_SECRETS`, falling back to the default names
    pub fn from_env() -> GuardResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, with a custom variable lookup
    pub fn from_lookup<F>(lookup: F) -> GuardResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secrets = match lookup(SECRETS_ENV_VAR) {
            Some(list) => SecretSet::parse_list(&list)?,
            None => SecretSet::new(DEFAULT_SECRET_NAMES.iter().copied())?,
        };
        Ok(Self { secrets })
    }
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            secrets: SecretSet::new(DEFAULT_SECRET_NAMES.iter().copied())
                .unwrap_or_else(|_| unreachable!("default secret names are valid identifiers")),
        }
    }
}

/// Configuration for the guarded tool runtime
///
/// Use the builder pattern:
///
/// ```ignore
/// let executor = AgentConfig::new()
///     .with_secrets(SecretSet::new(["ANTHROPIC_API_KEY"])?)
///     .with_working_dir("/workspace")
///     .build()?;
/// ```
pub struct AgentConfig {
    /// Tool registry (defaults to just the Bash tool)
    pub tools: Option<ToolRegistry>,

    /// Hooks for intercepting tool calls; the sanitizer is added on `build`
    pub hooks: HookRegistry,

    /// Names to keep out of spawned shells
    pub secrets: SecretSet,

    /// Working directory for the default Bash tool
    pub working_dir: Option<String>,
}

impl AgentConfig {
    /// Create a configuration with the default secret names
    pub fn new() -> Self {
        Self {
            tools: None,
            hooks: HookRegistry::new(),
            secrets: SanitizerConfig::default().secrets,
            working_dir: None,
        }
    }

    /// Create a configuration from `SHADOW_GUARD_SECRETS`
    pub fn from_env() -> GuardResult<Self> {
        Ok(Self::new().with_secrets(SanitizerConfig::from_env()?.secrets))
    }

    /// Set the tool registry
    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set the hook registry
    ///
    /// Hooks registered here, or added to the executor's registry later, run
    /// before the sanitizer, which `build` pins as the last PreToolUse stage.
    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    /// Set the secret names
    pub fn with_secrets(mut self, secrets: SecretSet) -> Self {
        self.secrets = secrets;
        self
    }

    /// Set the working directory for the default Bash tool
    pub fn with_working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Install the sanitizer and produce an executor
    pub fn build(self) -> GuardResult<ToolExecutor> {
        let guard = sanitize::install(&self.hooks, self.secrets)?;

        let tools = match self.tools {
            Some(tools) => tools,
            None => {
                let mut tools = ToolRegistry::new();
                match self.working_dir {
                    Some(dir) => tools.register(BashTool::with_working_dir(dir)),
                    None => tools.register(BashTool::new().map_err(|e| {
                        crate::core::GuardError::InvalidConfig(format!(
                            "cannot resolve working directory: {}",
                            e
                        ))
                    })?),
                }
                tools
            }
        };

        tracing::info!("Registered {} tools", tools.len());

        Ok(ToolExecutor::new(Arc::new(tools), Arc::new(self.hooks)).with_guard(guard))
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("tools", &self.tools.as_ref().map(|t| t.tool_names()))
            .field("hooks", &self.hooks)
            .field("secrets", &self.secrets.len())
            .field("working_dir", &self.working_dir)
            .finish()
    }
}
