use colored::Colorize;
use serde_json::json;

use shadow_env_guard::agent::AgentConfig;
use shadow_env_guard::logging::{self, LogConfig};
use shadow_env_guard::tools::{ToolInvocation, BASH_TOOL_NAME};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = logging::init_logging(&LogConfig::from_env())?;

    let command = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if command.is_empty() {
        eprintln!("usage: shadow-guard <command>...");
        std::process::exit(2);
    }

    tracing::info!("=== Shadow Guard Starting ===");

    let config = AgentConfig::from_env()?;

    // The parent keeps its copy for outbound auth; only children lose it.
    let credentials = config.secrets.capture_from_env();
    let missing = credentials.missing(&config.secrets);
    if !missing.is_empty() {
        tracing::warn!("Secrets not set in parent environment: {:?}", missing);
    }
    tracing::info!(
        "Parent holds {} of {} secret(s)",
        credentials.len(),
        config.secrets.len()
    );

    let executor = config.build()?;
    let result = executor
        .execute(ToolInvocation::new(BASH_TOOL_NAME, json!({ "command": command })))
        .await;

    if result.is_error {
        eprintln!("{}", result.output.red());
        std::process::exit(1);
    }
    print!("{}", result.output);

    tracing::info!("=== Shadow Guard Shutting Down ===");
    Ok(())
}
