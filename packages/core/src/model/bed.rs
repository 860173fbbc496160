use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A bed must be re-sanitized once this many hours have passed.
pub const SANITATION_WINDOW_HOURS: i64 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BedType {
    General,
    #[serde(rename = "ICU")]
    Icu,
}

impl fmt::Display for BedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BedType::General => write!(f, "General"),
            BedType::Icu => write!(f, "ICU"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SanitationStatus {
    Ok,
    Overdue,
}

impl fmt::Display for SanitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SanitationStatus::Ok => write!(f, "OK"),
            SanitationStatus::Overdue => write!(f, "OVERDUE"),
        }
    }
}

/// A physical bed in a ward.
///
/// Availability and sanitation status are never stored: they are projections
/// of `last_sanitized` against a caller-supplied `now`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bed {
    pub id: String,
    pub ward_name: String,
    pub bed_type: BedType,
    /// Owned by the allocation engine.
    pub is_occupied: bool,
    pub last_sanitized: DateTime<Utc>,
    /// Owned by the allocation engine.
    pub patient_id: Option<String>,
}

impl Bed {
    pub fn new(ward_name: impl Into<String>, bed_type: BedType, last_sanitized: DateTime<Utc>) -> Self {
        Self {
            id: super::new_id(),
            ward_name: ward_name.into(),
            bed_type,
            is_occupied: false,
            last_sanitized,
            patient_id: None,
        }
    }

    pub fn elapsed_since_sanitized(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_sanitized
    }

    /// Strictly more than the sanitation window has passed.
    pub fn needs_sanitation(&self, now: DateTime<Utc>) -> bool {
        self.elapsed_since_sanitized(now) > Duration::hours(SANITATION_WINDOW_HOURS)
    }

    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        !self.is_occupied && !self.needs_sanitation(now)
    }

    pub fn sanitation_status(&self, now: DateTime<Utc>) -> SanitationStatus {
        if self.needs_sanitation(now) {
            SanitationStatus::Overdue
        } else {
            SanitationStatus::Ok
        }
    }

    /// Snapshot text used on alerts, e.g. `"Emergency - ICU"`.
    pub fn description(&self) -> String {
        format!("{} - {}", self.ward_name, self.bed_type)
    }
}
