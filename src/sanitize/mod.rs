//! Secret environment sanitization
//!
//! Keeps a fixed set of secret variables out of every shell the agent spawns
//! while leaving them set in the parent process.
//!
//! ```ignore
//! use shadow_env_guard::hooks::HookRegistry;
//! use shadow_env_guard::sanitize::{self, SecretSet};
//!
//! let secrets = SecretSet::new(["ANTHROPIC_API_KEY", "GEMINI_API_KEY"])?;
//! let credentials = secrets.capture_from_env(); // parent keeps using these
//!
//! let hooks = HookRegistry::new();
//! sanitize::install(&hooks, secrets)?;
//! ```

mod interceptor;
mod secrets;

pub use interceptor::{install, SanitizingInterceptor, SANITIZER_HOOK_NAME, SHELL_TOOL_PATTERN};
pub use secrets::{ParentCredentials, SecretSet};
