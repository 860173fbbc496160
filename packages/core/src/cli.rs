use std::net::SocketAddr;

use clap::Parser;

/// Hospital resource tracker CLI arguments. Flags override the environment.
#[derive(Debug, Parser)]
#[command(
    name = "hospital-resource-tracker",
    version,
    about = "In-memory tracking of patients, beds and sanitation alerts"
)]
pub struct Cli {
    /// Address the HTTP API listens on
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Seconds between sanitation checks
    #[arg(long)]
    pub sanitation_interval: Option<u64>,

    /// Start with an empty store instead of the demo ward
    #[arg(long)]
    pub no_seed: bool,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
