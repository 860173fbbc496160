//! Bed allocation engine.
//!
//! A patient may only take a bed that is clean, empty and of the right
//! acuity: critical patients go to ICU beds and everyone else to General
//! beds. The checks run in a fixed order and the first failing rule is the
//! one reported, both in the returned error and in the
//! `BedAllocationFailure` alert.
//!
//! Allocation, deallocation, sanitation and bed deletion all run under the
//! store's allocation guard, so two callers racing for the same bed cannot
//! both win.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{AlertType, Bed, BedType, Patient};
use crate::store::HospitalData;

/// Why a bed could not be given to a patient.
///
/// The `Display` text of the rejection variants is the message recorded on
/// the failure alert.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    #[error("Bed not found: {0}")]
    BedNotFound(String),

    #[error("Bed needs sanitation (last: {})", .last_sanitized.format("%m/%d %H:%M"))]
    NeedsSanitation { last_sanitized: DateTime<Utc> },

    #[error("Bed is already occupied")]
    AlreadyOccupied,

    #[error("ICU bed only for critical patients")]
    IcuReservedForCritical,

    #[error("Critical patients need ICU beds")]
    CriticalNeedsIcu,
}

impl AllocationError {
    /// `true` for the rule violations that raise a failure alert.
    pub fn is_rule_violation(&self) -> bool {
        !matches!(
            self,
            AllocationError::PatientNotFound(_) | AllocationError::BedNotFound(_)
        )
    }
}

/// Apply the allocation rules in order, without touching any state.
pub fn check_allocation(patient: &Patient, bed: &Bed, now: DateTime<Utc>) -> Result<(), AllocationError> {
    if bed.needs_sanitation(now) {
        return Err(AllocationError::NeedsSanitation {
            last_sanitized: bed.last_sanitized,
        });
    }
    if bed.is_occupied {
        return Err(AllocationError::AlreadyOccupied);
    }
    if bed.bed_type == BedType::Icu && !patient.is_critical {
        return Err(AllocationError::IcuReservedForCritical);
    }
    if bed.bed_type == BedType::General && patient.is_critical {
        return Err(AllocationError::CriticalNeedsIcu);
    }
    Ok(())
}

impl HospitalData {
    /// Assign `bed_id` to `patient_id`. See [`try_allocate_bed_to_patient`]
    /// for the reason behind a `false`.
    ///
    /// [`try_allocate_bed_to_patient`]: Self::try_allocate_bed_to_patient
    pub fn allocate_bed_to_patient(&self, patient_id: &str, bed_id: &str) -> bool {
        self.try_allocate_bed_to_patient(patient_id, bed_id).is_ok()
    }

    /// Assign a bed, returning the updated `(patient, bed)` pair.
    ///
    /// Unknown IDs fail silently. A rule violation raises exactly one
    /// `BedAllocationFailure` alert and leaves both entities untouched; a
    /// success raises one `BedAllocationSuccess` alert.
    pub fn try_allocate_bed_to_patient(
        &self,
        patient_id: &str,
        bed_id: &str,
    ) -> Result<(Patient, Bed), AllocationError> {
        let _guard = self.allocation_guard();

        let mut patient = self
            .get_patient(patient_id)
            .ok_or_else(|| AllocationError::PatientNotFound(patient_id.to_string()))?;
        let mut bed = self
            .get_bed(bed_id)
            .ok_or_else(|| AllocationError::BedNotFound(bed_id.to_string()))?;

        if let Err(rejection) = check_allocation(&patient, &bed, self.now()) {
            tracing::info!(
                "Allocation of {} to {} rejected: {}",
                bed.description(),
                patient.name,
                rejection
            );
            self.add_alert(
                self.stamped_alert(AlertType::BedAllocationFailure, rejection.to_string())
                    .with_patient(patient.name.clone())
                    .with_bed(bed.description()),
            );
            return Err(rejection);
        }

        if let Some(mut slot) = self.beds.get_mut(bed_id) {
            slot.is_occupied = true;
            slot.patient_id = Some(patient_id.to_string());
        }
        if let Some(mut slot) = self.patients.get_mut(patient_id) {
            slot.assigned_bed_id = Some(bed_id.to_string());
        }
        bed.is_occupied = true;
        bed.patient_id = Some(patient_id.to_string());
        patient.assigned_bed_id = Some(bed_id.to_string());

        tracing::info!("Allocated {} to {}", bed.description(), patient.name);
        self.add_alert(
            self.stamped_alert(
                AlertType::BedAllocationSuccess,
                format!("Bed allocated to {}", patient.name),
            )
            .with_patient(patient.name.clone())
            .with_bed(bed.description()),
        );

        Ok((patient, bed))
    }

    /// Vacate an occupied bed.
    ///
    /// Clears the occupant's assignment, empties the bed and restarts its
    /// sanitation window. Returns `false` if the bed is missing or empty.
    pub fn deallocate_bed(&self, bed_id: &str) -> bool {
        let _guard = self.allocation_guard();

        match self.get_bed(bed_id) {
            Some(bed) if bed.is_occupied => {}
            _ => return false,
        }

        let occupant = self
            .patients
            .iter()
            .find(|entry| entry.assigned_bed_id.as_deref() == Some(bed_id))
            .map(|entry| entry.key().clone());
        if let Some(patient_id) = occupant {
            if let Some(mut slot) = self.patients.get_mut(&patient_id) {
                slot.assigned_bed_id = None;
            }
        }

        let now = self.now();
        if let Some(mut slot) = self.beds.get_mut(bed_id) {
            slot.is_occupied = false;
            slot.patient_id = None;
            slot.last_sanitized = now;
            tracing::info!("Deallocated {}", slot.description());
        }
        true
    }

    /// Mark a bed as sanitized now. Returns `false` if the bed is missing.
    pub fn sanitize_bed(&self, bed_id: &str) -> bool {
        if bed_id.trim().is_empty() {
            return false;
        }
        let _guard = self.allocation_guard();

        let now = self.now();
        match self.beds.get_mut(bed_id) {
            Some(mut slot) => {
                slot.last_sanitized = now;
                tracing::info!("Sanitized {}", slot.description());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::clock::ManualClock;
    use crate::model::SanitationStatus;
    use crate::vitals::VitalSigns;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap()
    }

    fn make_store() -> (HospitalData, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        (HospitalData::new(clock.clone()), clock)
    }

    /// Adds a patient and returns its ID. Clears the vitals alerts so tests
    /// only see allocation alerts.
    fn admit(store: &HospitalData, critical: bool) -> String {
        let oxygen = if critical { 88.0 } else { 97.0 };
        let p = Patient::new("Jane Doe", 50, "Pneumonia", VitalSigns::new(37.0, 80, oxygen), start());
        let id = p.id.clone();
        store.add_patient(p);
        for alert in store.get_all_alerts() {
            store.mark_alert_as_read(&alert.id);
        }
        id
    }

    fn install_bed(store: &HospitalData, bed_type: BedType, hours_since_sanitized: i64) -> String {
        let bed = Bed::new("Ward 3", bed_type, start() - Duration::hours(hours_since_sanitized));
        let id = bed.id.clone();
        store.add_bed(bed);
        id
    }

    fn unread_of(store: &HospitalData, kind: AlertType) -> Vec<crate::model::Alert> {
        store
            .get_unread_alerts()
            .into_iter()
            .filter(|a| a.alert_type == kind)
            .collect()
    }

    #[test]
    fn stable_patient_gets_clean_general_bed() {
        let (store, _) = make_store();
        let patient_id = admit(&store, false);
        let bed_id = install_bed(&store, BedType::General, 2);

        assert!(store.allocate_bed_to_patient(&patient_id, &bed_id));

        let bed = store.get_bed(&bed_id).unwrap();
        let patient = store.get_patient(&patient_id).unwrap();
        assert!(bed.is_occupied);
        assert_eq!(bed.patient_id.as_deref(), Some(patient_id.as_str()));
        assert_eq!(patient.assigned_bed_id.as_deref(), Some(bed_id.as_str()));

        let success = unread_of(&store, AlertType::BedAllocationSuccess);
        assert_eq!(success.len(), 1);
        assert_eq!(success[0].message, "Bed allocated to Jane Doe");
        assert_eq!(success[0].bed_info.as_deref(), Some("Ward 3 - General"));
        assert_eq!(store.get_unread_alerts().len(), 1);
    }

    #[test]
    fn critical_patient_gets_clean_icu_bed() {
        let (store, _) = make_store();
        let patient_id = admit(&store, true);
        let bed_id = install_bed(&store, BedType::Icu, 0);

        assert!(store.allocate_bed_to_patient(&patient_id, &bed_id));
        assert!(store.get_patients_requiring_icu().is_empty());
    }

    #[test]
    fn bed_past_sanitation_window_is_rejected_first() {
        let (store, _) = make_store();
        let patient_id = admit(&store, false);
        let bed_id = install_bed(&store, BedType::General, 50);

        let err = store
            .try_allocate_bed_to_patient(&patient_id, &bed_id)
            .unwrap_err();

        assert!(matches!(err, AllocationError::NeedsSanitation { .. }));
        let failures = unread_of(&store, AlertType::BedAllocationFailure);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].message, "Bed needs sanitation (last: 05/08 07:00)");
        assert!(!store.get_bed(&bed_id).unwrap().is_occupied);
    }

    #[test]
    fn overdue_bed_can_be_allocated_after_sanitizing() {
        let (store, _) = make_store();
        let patient_id = admit(&store, false);
        let bed_id = install_bed(&store, BedType::General, 50);
        assert!(!store.allocate_bed_to_patient(&patient_id, &bed_id));

        assert!(store.sanitize_bed(&bed_id));

        assert!(store.allocate_bed_to_patient(&patient_id, &bed_id));
    }

    #[test]
    fn occupied_bed_is_rejected() {
        let (store, _) = make_store();
        let first = admit(&store, false);
        let second = admit(&store, false);
        let bed_id = install_bed(&store, BedType::General, 1);
        assert!(store.allocate_bed_to_patient(&first, &bed_id));

        let err = store.try_allocate_bed_to_patient(&second, &bed_id).unwrap_err();

        assert_eq!(err, AllocationError::AlreadyOccupied);
        assert_eq!(
            unread_of(&store, AlertType::BedAllocationFailure)[0].message,
            "Bed is already occupied"
        );
        assert!(store.get_patient(&second).unwrap().is_unassigned());
        assert_eq!(
            store.get_bed(&bed_id).unwrap().patient_id.as_deref(),
            Some(first.as_str())
        );
    }

    #[test]
    fn icu_bed_is_rejected_for_stable_patient() {
        let (store, _) = make_store();
        let patient_id = admit(&store, false);
        let bed_id = install_bed(&store, BedType::Icu, 1);

        assert!(!store.allocate_bed_to_patient(&patient_id, &bed_id));

        let failures = unread_of(&store, AlertType::BedAllocationFailure);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].message, "ICU bed only for critical patients");
        assert_eq!(failures[0].patient_name.as_deref(), Some("Jane Doe"));
        assert!(unread_of(&store, AlertType::BedAllocationSuccess).is_empty());
    }

    #[test]
    fn general_bed_is_rejected_for_critical_patient() {
        let (store, _) = make_store();
        let patient_id = admit(&store, true);
        let bed_id = install_bed(&store, BedType::General, 1);

        let err = store.try_allocate_bed_to_patient(&patient_id, &bed_id).unwrap_err();

        assert_eq!(err, AllocationError::CriticalNeedsIcu);
        assert_eq!(err.to_string(), "Critical patients need ICU beds");
    }

    #[test]
    fn sanitation_rule_wins_over_occupancy_and_acuity() {
        let (store, clock) = make_store();
        let occupant = admit(&store, true);
        let bed_id = install_bed(&store, BedType::Icu, 40);
        assert!(store.allocate_bed_to_patient(&occupant, &bed_id));

        clock.advance(Duration::hours(10));
        let stable = admit(&store, false);
        let err = store.try_allocate_bed_to_patient(&stable, &bed_id).unwrap_err();

        assert!(matches!(err, AllocationError::NeedsSanitation { .. }));
    }

    #[test]
    fn unknown_ids_fail_without_alert() {
        let (store, _) = make_store();
        let patient_id = admit(&store, false);
        let bed_id = install_bed(&store, BedType::General, 1);

        assert!(!store.allocate_bed_to_patient("missing", &bed_id));
        assert!(!store.allocate_bed_to_patient(&patient_id, "missing"));
        assert!(!store.allocate_bed_to_patient("", ""));

        assert!(store.get_unread_alerts().is_empty());
        assert!(!AllocationError::BedNotFound("x".into()).is_rule_violation());
        assert!(AllocationError::AlreadyOccupied.is_rule_violation());
    }

    #[test]
    fn deallocate_clears_both_sides_and_resets_sanitation() {
        let (store, clock) = make_store();
        let patient_id = admit(&store, false);
        let bed_id = install_bed(&store, BedType::General, 47);
        assert!(store.allocate_bed_to_patient(&patient_id, &bed_id));

        clock.advance(Duration::hours(5));
        assert!(store.get_sanitation_overdue_beds().iter().any(|b| b.id == bed_id));
        assert!(store.deallocate_bed(&bed_id));

        let bed = store.get_bed(&bed_id).unwrap();
        assert!(!bed.is_occupied);
        assert!(bed.patient_id.is_none());
        assert_eq!(bed.last_sanitized, store.now());
        assert_eq!(bed.sanitation_status(store.now()), SanitationStatus::Ok);
        assert!(store.get_patient(&patient_id).unwrap().is_unassigned());

        assert!(store.allocate_bed_to_patient(&patient_id, &bed_id));
    }

    #[test]
    fn deallocate_raises_no_alert() {
        let (store, _) = make_store();
        let patient_id = admit(&store, false);
        let bed_id = install_bed(&store, BedType::General, 1);
        store.allocate_bed_to_patient(&patient_id, &bed_id);
        let before = store.get_all_alerts().len();

        assert!(store.deallocate_bed(&bed_id));
        assert_eq!(store.get_all_alerts().len(), before);
    }

    #[test]
    fn deallocate_fails_for_missing_or_empty_bed() {
        let (store, _) = make_store();
        let bed_id = install_bed(&store, BedType::General, 1);

        assert!(!store.deallocate_bed(&bed_id));
        assert!(!store.deallocate_bed("missing"));
    }

    #[test]
    fn deallocate_succeeds_after_occupant_was_deleted() {
        let (store, _) = make_store();
        let patient_id = admit(&store, false);
        let bed_id = install_bed(&store, BedType::General, 1);
        store.allocate_bed_to_patient(&patient_id, &bed_id);
        assert!(store.delete_patient(&patient_id));

        assert!(store.deallocate_bed(&bed_id));
        assert!(!store.get_bed(&bed_id).unwrap().is_occupied);
    }

    #[test]
    fn occupied_bed_cannot_be_deleted() {
        let (store, _) = make_store();
        let patient_id = admit(&store, false);
        let bed_id = install_bed(&store, BedType::General, 1);
        store.allocate_bed_to_patient(&patient_id, &bed_id);

        assert!(!store.delete_bed(&bed_id));
        assert!(store.get_bed(&bed_id).unwrap().is_occupied);
    }

    #[test]
    fn updates_do_not_break_allocation_links() {
        let (store, _) = make_store();
        let patient_id = admit(&store, false);
        let bed_id = install_bed(&store, BedType::General, 1);
        store.allocate_bed_to_patient(&patient_id, &bed_id);

        let mut bed = store.get_bed(&bed_id).unwrap();
        bed.is_occupied = false;
        bed.patient_id = None;
        bed.ward_name = "Ward 4".to_string();
        store.update_bed(bed);

        let mut patient = store.get_patient(&patient_id).unwrap();
        patient.assigned_bed_id = None;
        store.update_patient(patient);

        let bed = store.get_bed(&bed_id).unwrap();
        assert_eq!(bed.ward_name, "Ward 4");
        assert!(bed.is_occupied);
        assert_eq!(
            store.get_patient(&patient_id).unwrap().assigned_bed_id.as_deref(),
            Some(bed_id.as_str())
        );
    }

    #[test]
    fn sanitize_restores_ok_status() {
        let (store, _) = make_store();
        let bed_id = install_bed(&store, BedType::Icu, 60);
        let before = store.get_bed(&bed_id).unwrap();
        assert_eq!(before.sanitation_status(store.now()), SanitationStatus::Overdue);

        assert!(store.sanitize_bed(&bed_id));

        let after = store.get_bed(&bed_id).unwrap();
        assert!(after.last_sanitized > before.last_sanitized);
        assert_eq!(after.sanitation_status(store.now()), SanitationStatus::Ok);
        assert!(!store.sanitize_bed("missing"));
        assert!(!store.sanitize_bed(""));
    }

    #[test]
    fn concurrent_allocations_to_one_bed_have_a_single_winner() {
        let (store, _) = make_store();
        let store = Arc::new(store);
        let bed_id = install_bed(&store, BedType::General, 1);
        let patients: Vec<String> = (0..16).map(|_| admit(&store, false)).collect();

        let handles: Vec<_> = patients
            .into_iter()
            .map(|patient_id| {
                let store = store.clone();
                let bed_id = bed_id.clone();
                std::thread::spawn(move || store.allocate_bed_to_patient(&patient_id, &bed_id))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(
            store
                .get_all_patients()
                .iter()
                .filter(|p| !p.is_unassigned())
                .count(),
            1
        );
    }
}
