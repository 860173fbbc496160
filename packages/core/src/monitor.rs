//! Sanitation monitor.
//!
//! A background Tokio task that checks every bed once at start-up and then
//! on a fixed interval, raising a `SanitationOverdue` alert for each bed
//! past its sanitation window. Beds that stay overdue are alerted again on
//! every run.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::metrics::AppMetrics;
use crate::store::HospitalData;

/// Interval between runs when none is configured.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Handle to a running monitor. Dropping it also stops the task.
pub struct SanitationMonitor {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SanitationMonitor {
    /// Spawn the monitor on the current Tokio runtime. The first check runs
    /// immediately.
    pub fn start(
        hospital: Arc<HospitalData>,
        metrics: Arc<AppMetrics>,
        check_interval: Duration,
    ) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_sanitation_checks(
            hospital,
            metrics,
            check_interval,
            shutdown_rx,
        ));
        Self { shutdown, task }
    }

    /// Signal the task to stop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            tracing::error!("Sanitation monitor task ended abnormally: {}", err);
        }
    }
}

async fn run_sanitation_checks(
    hospital: Arc<HospitalData>,
    metrics: Arc<AppMetrics>,
    check_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = time::interval(check_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        "Sanitation monitor started (interval: {}s)",
        check_interval.as_secs()
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                check_once(&hospital, &metrics);
            }

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("Sanitation monitor stopped");
}

/// Execute a single sanitation sweep. Extracted for testability.
///
/// The whole sweep (raising alerts, then refreshing the census gauges) runs
/// under `catch_unwind`: a panicking sweep is logged, counted and swallowed
/// so the schedule keeps running. Returns the number of alerts raised, or
/// `None` if the sweep failed.
pub fn check_once(hospital: &HospitalData, metrics: &AppMetrics) -> Option<usize> {
    let sweep = panic::catch_unwind(AssertUnwindSafe(|| {
        let raised = hospital.raise_sanitation_alerts();
        metrics.observe(hospital);
        raised
    }));

    match sweep {
        Ok(raised) => {
            metrics.sanitation_checks_total.inc();
            metrics.sanitation_alerts_total.inc_by(raised as f64);
            if raised > 0 {
                tracing::warn!("{} bed(s) overdue for sanitation", raised);
            } else {
                tracing::debug!("Sanitation check: all beds within window");
            }
            Some(raised)
        }
        Err(_) => {
            metrics.sanitation_check_failures_total.inc();
            tracing::error!("Sanitation check failed; skipping this run");
            None
        }
    }
}
