//! Command-line interface definition

use clap::Parser;

/// speedview - measure latency, jitter and throughput of a network path
#[derive(Parser, Debug, Clone)]
#[command(name = "spv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Measurement endpoint base URL (defaults to the public endpoint,
    /// or SPEEDVIEW_ENDPOINT when set)
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Show live per-phase progress and engine log lines
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }
        Ok(())
    }
}
