use std::env;
use std::net::SocketAddr;

use crate::cli::Cli;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SANITATION_CHECK_INTERVAL_SECONDS: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub sanitation_check_interval_seconds: u64,
    pub seed_sample_data: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. Every key is optional.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|_| "BIND_ADDR must be a socket address like 0.0.0.0:8080")?;

        let sanitation_check_interval_seconds = match lookup("SANITATION_CHECK_INTERVAL_SECONDS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| "SANITATION_CHECK_INTERVAL_SECONDS must be a valid number")?,
            None => DEFAULT_SANITATION_CHECK_INTERVAL_SECONDS,
        };
        if sanitation_check_interval_seconds == 0 {
            return Err("SANITATION_CHECK_INTERVAL_SECONDS must be greater than zero".to_string());
        }

        let seed_sample_data = match lookup("SEED_SAMPLE_DATA").as_deref() {
            None | Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            Some(other) => return Err(format!("Invalid SEED_SAMPLE_DATA: {}", other)),
        };

        Ok(Self {
            bind_addr,
            sanitation_check_interval_seconds,
            seed_sample_data,
        })
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_cli(mut self, cli: &Cli) -> Result<Self, String> {
        if let Some(bind) = cli.bind {
            self.bind_addr = bind;
        }
        if let Some(interval) = cli.sanitation_interval {
            if interval == 0 {
                return Err("--sanitation-interval must be greater than zero".to_string());
            }
            self.sanitation_check_interval_seconds = interval;
        }
        if cli.no_seed {
            self.seed_sample_data = false;
        }
        Ok(self)
    }
}
