//! In-memory tracking of patients, beds and alerts for a hospital ward,
//! served over a JSON HTTP API. The binary in `src/main.rs` wires these
//! modules together; integration tests in `tests/` drive the same router.

pub mod allocation;
pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod monitor;
pub mod seed;
pub mod store;
pub mod vitals;
