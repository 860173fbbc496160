use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertType {
    CriticalVital,
    BedAllocationSuccess,
    BedAllocationFailure,
    SanitationOverdue,
    Emergency,
}

/// A notification raised by the store.
///
/// `patient_name` and `bed_info` are snapshots taken when the alert was
/// raised; they stay valid after the entities change or disappear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub alert_type: AlertType,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub patient_name: Option<String>,
    pub bed_info: Option<String>,
}

impl Alert {
    pub fn new(alert_type: AlertType, message: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: super::new_id(),
            alert_type,
            message: message.into(),
            created_at,
            is_read: false,
            patient_name: None,
            bed_info: None,
        }
    }

    pub fn with_patient(mut self, name: impl Into<String>) -> Self {
        self.patient_name = Some(name.into());
        self
    }

    pub fn with_bed(mut self, info: impl Into<String>) -> Self {
        self.bed_info = Some(info.into());
        self
    }
}
