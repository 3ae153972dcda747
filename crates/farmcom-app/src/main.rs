mod chat;
mod cli;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use farmcom_ai::{ControllerSettings, SessionFactory, TranscriptController};
use farmcom_common::FarmcomError;
use farmcom_config::FarmcomConfig;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_DIRECTIVE: &str = "farmcom=info";

/// Load environment variables from a .env file (KEY=VALUE lines).
///
/// Variables already present in the environment are left alone.
fn load_dotenv() {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let candidates = [
        PathBuf::from(".env"),
        // Workspace root, two levels up from crates/farmcom-app/
        manifest_dir.join("..").join("..").join(".env"),
    ];

    for path in &candidates {
        if let Ok(contents) = std::fs::read_to_string(path) {
            for (key, value) in parse_dotenv(&contents) {
                if std::env::var(key).is_err() {
                    std::env::set_var(key, value);
                }
            }
            return;
        }
    }
}

fn parse_dotenv(contents: &str) -> Vec<(&str, &str)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim(), value)
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// `--log-level` wins; otherwise the config level applies to our crates.
fn log_directive(flag: Option<&str>, config: Option<&FarmcomConfig>) -> String {
    match (flag, config) {
        (Some(flag), _) => flag.to_string(),
        (None, Some(config)) => format!("farmcom={}", config.logging.level.as_str()),
        (None, None) => DEFAULT_LOG_DIRECTIVE.to_string(),
    }
}

fn init_logging(directive: &str) {
    let directive = directive.parse().unwrap_or_else(|_| {
        DEFAULT_LOG_DIRECTIVE
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::INFO.into())
    });
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .init();
}

fn session_factory(config: &FarmcomConfig) -> SessionFactory {
    SessionFactory::new()
        .with_api_key_env(&config.model.api_key_env)
        .with_base_url(&config.model.base_url)
        .with_max_output_tokens(config.model.max_output_tokens)
        .with_temperature(config.model.temperature)
        .with_timeouts(
            Duration::from_secs(config.model.connect_timeout_secs),
            Duration::from_secs(config.model.request_timeout_secs),
        )
}

fn controller_settings(config: &FarmcomConfig) -> ControllerSettings {
    ControllerSettings {
        greeting: config.assistant.greeting.clone(),
        error_message: config.assistant.error_message.clone(),
    }
}

fn run(args: cli::Args, config: FarmcomConfig) -> farmcom_common::Result<()> {
    let model_id = args.model.as_deref().unwrap_or(&config.model.id);
    let session = session_factory(&config)
        .create_session(&config.assistant.system_instruction, model_id)
        .map_err(|e| FarmcomError::Session(e.to_string()))?;

    let controller = Arc::new(TranscriptController::new(controller_settings(&config)));
    let events = controller.subscribe();
    controller.initialize(Arc::new(session));

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(chat::run(controller, events))?;
    Ok(())
}

fn main() -> ExitCode {
    // Load .env file before anything else
    load_dotenv();

    let args = cli::parse();

    let config = farmcom_config::load_config(args.config.as_deref());
    init_logging(&log_directive(
        args.log_level.as_deref(),
        config.as_ref().ok(),
    ));
    tracing::info!("FarmCom chat v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Config load failed: {e}");
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(model = %config.model.id, "Config loaded");

    match run(args, config) {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
