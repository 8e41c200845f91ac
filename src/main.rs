//! speedview - network path measurement CLI
//!
//! Thin presentation adapter over the measurement engine: it issues a
//! single start command, observes read-only session snapshots, and renders
//! progress and the final report. No measurement logic lives here.

use clap::Parser;
use speedview::{
    cli::Cli,
    config::{display_config_summary, load_config, validate_config},
    engine::{Engine, EngineSettings},
    error::{AppError, Result},
    logging::{LogLevel, Logger},
    models::SessionReport,
    output,
    types::Status,
    HttpTransport, PKG_NAME, VERSION,
};
use std::process;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(1);
    }));

    // Pick up SPEEDVIEW_* overrides from a local .env, if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run_application(cli).await {
        eprintln!("{}", e.format_for_console(true));
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    if !config.enable_color {
        colored::control::set_override(false);
    }

    let warnings = validate_config(&config)?;
    for warning in &warnings {
        eprintln!("{}", warning.format(config.enable_color));
    }

    if config.debug {
        eprintln!("{} v{}", PKG_NAME, VERSION);
        eprintln!("Configuration:");
        eprintln!("{}", display_config_summary(&config));
    }

    let log_level = if config.debug {
        LogLevel::Debug
    } else if config.verbose {
        LogLevel::Info
    } else {
        LogLevel::Error
    };
    let logger = Logger::new(log_level, config.enable_color);

    let transport = Arc::new(HttpTransport::new(&config.endpoint)?);
    let engine = Arc::new(Engine::with_settings(
        transport,
        EngineSettings::default(),
        logger,
    ));

    // Ctrl-C cancels the session; metrics committed so far survive and
    // the partial report is still printed.
    {
        let engine = engine.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                engine.cancel();
            }
        });
    }

    let started_at = chrono::Utc::now();
    let runner = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.start().await })
    };

    watch_session(&engine, !config.json, config.enable_color).await;

    runner
        .await
        .map_err(|e| AppError::internal(format!("session task failed: {}", e)))?;

    let snapshot = engine.snapshot();
    let report = SessionReport::new(config.endpoint.clone(), snapshot.metrics, started_at);

    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let formatter = output::create_formatter(config.enable_color);
        println!("{}", formatter.format_report(&report));
    }

    if report.metrics.ping_ms.is_none() && report.metrics.download_mbps.unwrap_or(0.0) == 0.0 {
        return Err(AppError::network(
            "no measurements could be obtained - check connectivity to the endpoint",
        ));
    }

    Ok(())
}

/// Render live progress until the session reaches Completed
async fn watch_session(engine: &Engine, show_progress: bool, use_color: bool) {
    let mut updates = engine.subscribe();
    let mut ticker = tokio::time::interval(Duration::from_millis(200));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = updates.borrow().clone();
                if snapshot.status == Status::Completed {
                    break;
                }
                if show_progress && !snapshot.status.is_startable() {
                    eprint!("\r{}", output::render_progress_line(&snapshot, use_color));
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = updates.borrow_and_update().status;
                if status == Status::Completed {
                    break;
                }
            }
        }
    }

    if show_progress {
        eprintln!();
    }
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) | AppError::Validation(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Endpoint URLs must start with http:// or https://");
            eprintln!("  - Use --endpoint or SPEEDVIEW_ENDPOINT to override the default");
        }
        AppError::Network(_) | AppError::HttpRequest(_) | AppError::Transfer(_) => {
            eprintln!();
            eprintln!("Network troubleshooting:");
            eprintln!("  - Check your internet connection");
            eprintln!("  - Verify firewall settings");
            eprintln!("  - Try a different measurement endpoint with --endpoint");
        }
        _ => {}
    }
}
