use thiserror::Error;

/// Unified application error.
///
/// Covers the failures that can stop the service from starting or serving:
/// configuration, socket I/O and metrics registration.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}
