//! Demo ward loaded at startup.
//!
//! Records are written straight into the collections: the vitals evaluator
//! does not run, and the two sample alerts stand in for what it would have
//! raised.

use chrono::Duration;

use crate::model::{Alert, AlertType, Bed, BedType, Patient};
use crate::store::HospitalData;
use crate::vitals::VitalSigns;

/// Populate an empty store with five beds, four patients, one allocation and
/// two alerts.
pub fn seed_sample_data(store: &HospitalData) {
    let now = store.now();

    let mut beds = vec![
        Bed::new("Emergency", BedType::Icu, now - Duration::hours(24)),
        Bed::new("Emergency", BedType::Icu, now - Duration::hours(12)),
        Bed::new("General", BedType::General, now - Duration::hours(36)),
        Bed::new("General", BedType::General, now - Duration::hours(48)),
        Bed::new("ICU", BedType::Icu, now - Duration::hours(6)),
    ];

    let mut patients = vec![
        Patient::new("John Smith", 45, "Pneumonia", VitalSigns::new(38.5, 95, 91.0), now),
        Patient::new("Mary Johnson", 62, "Heart Condition", VitalSigns::new(37.2, 85, 96.0), now),
        Patient::new("Robert Brown", 33, "COVID-19", VitalSigns::new(39.1, 110, 88.0), now),
        Patient::new("Sarah Wilson", 28, "Broken Arm", VitalSigns::new(36.8, 72, 98.0), now),
    ];

    // Robert Brown already occupies the ICU ward bed.
    let occupied_bed = &mut beds[4];
    let occupant = &mut patients[2];
    occupied_bed.is_occupied = true;
    occupied_bed.patient_id = Some(occupant.id.clone());
    occupant.assigned_bed_id = Some(occupied_bed.id.clone());

    for bed in beds {
        store.beds.insert(bed.id.clone(), bed);
    }
    for mut patient in patients {
        patient.refresh_critical();
        store.patients.insert(patient.id.clone(), patient);
    }

    store.add_alert(
        Alert::new(
            AlertType::CriticalVital,
            "Patient Robert Brown has critical oxygen level: 88%",
            now,
        )
        .with_patient("Robert Brown"),
    );
    store.add_alert(
        Alert::new(
            AlertType::BedAllocationSuccess,
            "ICU bed allocated to patient Robert Brown",
            now,
        )
        .with_patient("Robert Brown")
        .with_bed("ICU - ICU"),
    );

    tracing::info!("Seeded sample data: 5 beds, 4 patients");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::ManualClock;

    fn seeded() -> (HospitalData, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let store = HospitalData::new(clock.clone());
        seed_sample_data(&store);
        (store, clock)
    }

    #[test]
    fn seed_loads_expected_records() {
        let (store, _) = seeded();
        assert_eq!(store.get_all_beds().len(), 5);
        assert_eq!(store.get_all_patients().len(), 4);
        assert_eq!(store.get_all_alerts().len(), 2);
        assert_eq!(store.get_critical_patients().len(), 2);
    }

    #[test]
    fn seeded_allocation_is_linked_both_ways() {
        let (store, _) = seeded();
        let robert = store
            .get_all_patients()
            .into_iter()
            .find(|p| p.name == "Robert Brown")
            .unwrap();
        let bed_id = robert.assigned_bed_id.clone().unwrap();
        let bed = store.get_bed(&bed_id).unwrap();

        assert!(bed.is_occupied);
        assert_eq!(bed.patient_id.as_deref(), Some(robert.id.as_str()));
        assert_eq!(bed.description(), "ICU - ICU");
    }

    #[test]
    fn seeded_general_bed_tips_overdue_after_the_boundary() {
        let (store, clock) = seeded();
        assert!(store.get_sanitation_overdue_beds().is_empty());
        assert_eq!(store.get_available_beds().len(), 4);

        clock.advance(Duration::seconds(1));
        let overdue = store.get_sanitation_overdue_beds();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].ward_name, "General");
    }

    #[test]
    fn only_john_smith_needs_an_icu_bed() {
        let (store, _) = seeded();
        let waiting = store.get_patients_requiring_icu();
        assert_eq!(waiting.len(), 1);
        assert_eq!(waiting[0].name, "John Smith");
        assert_eq!(store.get_unallocated_patients().len(), 3);
    }
}
