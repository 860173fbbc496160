use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::vitals::VitalSigns;

/// An admitted patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub disease_category: String,
    pub vitals: VitalSigns,
    /// Derived from `vitals`; the store overwrites whatever the caller set.
    pub is_critical: bool,
    /// Owned by the allocation engine.
    pub assigned_bed_id: Option<String>,
    pub admission_date: DateTime<Utc>,
}

impl Patient {
    pub fn new(
        name: impl Into<String>,
        age: u32,
        disease_category: impl Into<String>,
        vitals: VitalSigns,
        admission_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: super::new_id(),
            name: name.into(),
            age,
            disease_category: disease_category.into(),
            is_critical: vitals.is_critical(),
            vitals,
            assigned_bed_id: None,
            admission_date,
        }
    }

    /// Re-derive `is_critical` from the current vitals.
    pub fn refresh_critical(&mut self) {
        self.is_critical = self.vitals.is_critical();
    }

    /// `true` when no bed is linked. A blank reference counts as none.
    pub fn is_unassigned(&self) -> bool {
        self.assigned_bed_id
            .as_deref()
            .map_or(true, |id| id.trim().is_empty())
    }
}
