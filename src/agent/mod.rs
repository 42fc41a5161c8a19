pub mod config;
pub mod executor;

pub use config::{AgentConfig, SanitizerConfig, DEFAULT_SECRET_NAMES, SECRETS_ENV_VAR};
pub use executor::ToolExecutor;
