//! Prometheus metrics registry for the hospital tracker.
//!
//! [`AppMetrics`] owns all registered metrics and the [`Registry`] they
//! belong to. Construct it once at startup, wrap in `Arc`, and pass it to the
//! sanitation monitor and the HTTP layer.
//!
//! Exposed at `GET /metrics` in Prometheus text exposition format
//! (`text/plain; version=0.0.4`).

use prometheus::{Counter, CounterVec, Gauge, Opts, Registry};

use crate::store::HospitalData;

/// All application-level Prometheus metrics.
pub struct AppMetrics {
    /// Patients currently held in the store.
    pub patients: Gauge,
    /// Patients whose oxygen saturation marks them critical.
    pub critical_patients: Gauge,
    /// Beds that are empty and within the sanitation window.
    pub available_beds: Gauge,
    /// Beds past the sanitation window.
    pub overdue_beds: Gauge,
    /// Alerts not yet marked as read.
    pub unread_alerts: Gauge,
    /// Allocation attempts, labelled by outcome (`success` / `rejected`).
    pub allocations_total: CounterVec,
    /// Completed sanitation monitor runs.
    pub sanitation_checks_total: Counter,
    /// Sanitation monitor runs that failed and were skipped.
    pub sanitation_check_failures_total: Counter,
    /// `SanitationOverdue` alerts raised by the monitor.
    pub sanitation_alerts_total: Counter,
    /// The registry that owns all of the above metrics.
    pub registry: Registry,
}

impl AppMetrics {
    /// Create and register all metrics. Returns an error if any metric
    /// name is invalid or duplicated (should not happen in practice).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let patients = Gauge::with_opts(Opts::new(
            "hospital_patients",
            "Patients currently admitted",
        ))?;

        let critical_patients = Gauge::with_opts(Opts::new(
            "hospital_critical_patients",
            "Admitted patients with critical oxygen saturation",
        ))?;

        let available_beds = Gauge::with_opts(Opts::new(
            "hospital_available_beds",
            "Unoccupied beds within the sanitation window",
        ))?;

        let overdue_beds = Gauge::with_opts(Opts::new(
            "hospital_sanitation_overdue_beds",
            "Beds past the sanitation window",
        ))?;

        let unread_alerts = Gauge::with_opts(Opts::new(
            "hospital_unread_alerts",
            "Alerts not yet marked as read",
        ))?;

        let allocations_total = CounterVec::new(
            Opts::new(
                "hospital_allocations_total",
                "Bed allocation attempts by outcome",
            ),
            &["outcome"],
        )?;

        let sanitation_checks_total = Counter::with_opts(Opts::new(
            "hospital_sanitation_checks_total",
            "Completed sanitation monitor runs",
        ))?;

        let sanitation_check_failures_total = Counter::with_opts(Opts::new(
            "hospital_sanitation_check_failures_total",
            "Sanitation monitor runs that failed",
        ))?;

        let sanitation_alerts_total = Counter::with_opts(Opts::new(
            "hospital_sanitation_alerts_total",
            "Sanitation overdue alerts raised by the monitor",
        ))?;

        registry.register(Box::new(patients.clone()))?;
        registry.register(Box::new(critical_patients.clone()))?;
        registry.register(Box::new(available_beds.clone()))?;
        registry.register(Box::new(overdue_beds.clone()))?;
        registry.register(Box::new(unread_alerts.clone()))?;
        registry.register(Box::new(allocations_total.clone()))?;
        registry.register(Box::new(sanitation_checks_total.clone()))?;
        registry.register(Box::new(sanitation_check_failures_total.clone()))?;
        registry.register(Box::new(sanitation_alerts_total.clone()))?;

        Ok(Self {
            patients,
            critical_patients,
            available_beds,
            overdue_beds,
            unread_alerts,
            allocations_total,
            sanitation_checks_total,
            sanitation_check_failures_total,
            sanitation_alerts_total,
            registry,
        })
    }

    /// Copy the store's current census into the gauges.
    pub fn observe(&self, hospital: &HospitalData) {
        let census = hospital.census();
        self.patients.set(census.total_patients as f64);
        self.critical_patients.set(census.critical_patients as f64);
        self.available_beds.set(census.available_beds as f64);
        self.overdue_beds.set(census.overdue_beds as f64);
        self.unread_alerts.set(census.unread_alerts as f64);
    }

    pub fn record_allocation(&self, succeeded: bool) {
        let outcome = if succeeded { "success" } else { "rejected" };
        self.allocations_total.with_label_values(&[outcome]).inc();
    }

    /// Render all metrics as Prometheus text format (for the `/metrics` endpoint).
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}
