//! Entity model: patients, beds and alerts.
//!
//! All three are plain values. The store clones them in and out; nothing
//! outside the store holds a live handle into its collections.

pub mod alert;
pub mod bed;
pub mod patient;

pub use alert::{Alert, AlertType};
pub use bed::{Bed, BedType, SanitationStatus, SANITATION_WINDOW_HOURS};
pub use patient::Patient;

/// Fresh opaque identifier for a new entity.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
