//! Configuration management: CLI and environment merging

use crate::cli::Cli;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable overriding the measurement endpoint
pub const ENDPOINT_ENV: &str = "SPEEDVIEW_ENDPOINT";

/// Resolved adapter configuration.
///
/// Engine tuning (window, probe count, block size, warm-up) is not here on
/// purpose; those are compile-time defaults in
/// [`EngineSettings`](crate::engine::EngineSettings).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the measurement endpoint
    pub endpoint: String,
    /// Colored console output
    pub enable_color: bool,
    /// Verbose progress and engine logging
    pub verbose: bool,
    /// Debug diagnostics
    pub debug: bool,
    /// Emit the final report as JSON instead of formatted text
    pub json: bool,
}

/// Non-fatal configuration findings surfaced to the user
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
}

impl ConfigWarning {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn format(&self, use_color: bool) -> String {
        if use_color {
            use colored::Colorize;
            format!("{} {}", "warning:".yellow().bold(), self.message)
        } else {
            format!("warning: {}", self.message)
        }
    }
}

/// Build the configuration from CLI arguments and environment variables.
/// Precedence: CLI flag, then environment, then built-in default.
pub fn load_config(cli: &Cli) -> Result<Config> {
    cli.validate().map_err(AppError::config)?;

    let endpoint = cli
        .endpoint
        .clone()
        .or_else(|| std::env::var(ENDPOINT_ENV).ok())
        .unwrap_or_else(|| crate::defaults::DEFAULT_ENDPOINT.to_string());

    let enable_color = if cli.no_color {
        false
    } else if cli.color {
        true
    } else {
        crate::defaults::DEFAULT_ENABLE_COLOR
    };

    Ok(Config {
        endpoint,
        enable_color,
        verbose: cli.verbose,
        debug: cli.debug,
        json: cli.json,
    })
}

/// Validate a loaded configuration, returning non-fatal warnings
pub fn validate_config(config: &Config) -> Result<Vec<ConfigWarning>> {
    let mut warnings = Vec::new();

    let url = Url::parse(&config.endpoint)
        .map_err(|e| AppError::config(format!("invalid endpoint URL '{}': {}", config.endpoint, e)))?;

    match url.scheme() {
        "https" => {}
        "http" => warnings.push(ConfigWarning::new(
            "endpoint uses plain http; an intermediary proxy may skew measurements",
        )),
        other => {
            return Err(AppError::config(format!(
                "endpoint scheme '{}' is not supported (use http or https)",
                other
            )))
        }
    }

    if url.host_str().is_none() {
        return Err(AppError::config("endpoint URL must have a host"));
    }

    if config.json && config.verbose {
        warnings.push(ConfigWarning::new(
            "--verbose progress goes to stderr while --json output goes to stdout",
        ));
    }

    Ok(warnings)
}

/// One-line-per-field summary shown in debug mode
pub fn display_config_summary(config: &Config) -> String {
    format!(
        "  Endpoint: {}\n  Color: {}\n  Verbose: {}\n  JSON: {}",
        config.endpoint, config.enable_color, config.verbose, config.json
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("spv").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults_applied() {
        let config = load_config(&cli(&[])).unwrap();
        assert_eq!(config.endpoint, crate::defaults::DEFAULT_ENDPOINT);
        assert!(config.enable_color);
        assert!(!config.verbose);
        assert!(!config.json);
    }

    #[test]
    fn test_cli_endpoint_wins() {
        let config = load_config(&cli(&["--endpoint", "https://probe.example.net"])).unwrap();
        assert_eq!(config.endpoint, "https://probe.example.net");
    }

    #[test]
    fn test_color_flags() {
        assert!(!load_config(&cli(&["--no-color"])).unwrap().enable_color);
        assert!(load_config(&cli(&["--color"])).unwrap().enable_color);
    }

    #[test]
    fn test_conflicting_color_flags_rejected() {
        assert!(load_config(&cli(&["--color", "--no-color"])).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let mut config = load_config(&cli(&[])).unwrap();
        config.endpoint = "ftp://example.net".into();
        assert!(validate_config(&config).is_err());

        config.endpoint = "not a url".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_warns_on_http() {
        let mut config = load_config(&cli(&[])).unwrap();
        config.endpoint = "http://127.0.0.1:8080".into();
        let warnings = validate_config(&config).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].format(false).contains("plain http"));
    }

    #[test]
    fn test_summary_mentions_endpoint() {
        let config = load_config(&cli(&[])).unwrap();
        assert!(display_config_summary(&config).contains(&config.endpoint));
    }
}
