use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};

use dailymark_infrastructure::logging::init_logger;
use dailymark_lib::application::config::AppSettings;
use dailymark_lib::presentation::bootstrap::build_app_state;
use dailymark_lib::presentation::cli::Cli;
use dailymark_lib::presentation::commands::execute;
use dailymark_lib::presentation::error::CommandError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let loaded = AppSettings::load(cli.config.as_deref());
    let settings = loaded.settings;

    let console = cli.verbose || cfg!(debug_assertions);
    if let Err(e) = init_logger(&settings.log_dir, settings.log_level.as_str(), console) {
        eprintln!("Failed to initialize logger: {}", e);
    }
    for warning in &loaded.warnings {
        warn!("{}", warning);
    }
    if let Some(source) = &loaded.source {
        info!(path = %source.display(), "settings loaded");
    }

    let state = match build_app_state(settings).await {
        Ok(state) => state,
        Err(e) => return report(CommandError::from(e)),
    };

    match execute(&state, cli.command).await {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(output) => {
                println!("{}", output);
                ExitCode::SUCCESS
            }
            Err(e) => report(e.into()),
        },
        Err(e) => report(e),
    }
}

fn report(err: CommandError) -> ExitCode {
    error!(code = err.code, recoverable = err.recoverable, "{}", err.message);
    eprintln!(
        "{}",
        serde_json::to_string(&err).unwrap_or_else(|_| err.to_string())
    );
    ExitCode::FAILURE
}
