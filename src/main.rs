//! LoanRisk: Loan default risk assessment
//!
//! Main entry point for the terminal application.

use anyhow::Result;
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use loanrisk::config::{AppConfig, LogMode};
use loanrisk::tui::App;

fn main() -> Result<()> {
    let config = AppConfig::from_env();

    // Terminal output would corrupt the alternate screen: log to a file when
    // interactive, to stdout otherwise.
    let use_file = match config.log_mode {
        LogMode::File => true,
        LogMode::Stdout => false,
        LogMode::Auto => std::io::stdout().is_terminal(),
    };

    let (writer, _guard) = if use_file {
        if let Some(parent) = config.log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            let _ = std::fs::create_dir_all(parent);
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    tracing::info!(
        "Starting LoanRisk (artifacts={:?}, require_manifest={})",
        config.artifact_dir,
        config.require_manifest
    );

    let mut app = App::new(&config);
    app.run()?;

    tracing::info!("LoanRisk shutdown complete.");
    Ok(())
}
