//! Vital-sign rules.
//!
//! Criticality is derived from oxygen saturation alone. The three threshold
//! checks are independent: a single reading can produce zero to three
//! findings, and none of them ever blocks a patient update.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Oxygen saturation (%) strictly below this marks a patient critical.
pub const CRITICAL_OXYGEN_THRESHOLD: f64 = 92.0;

/// Body temperature (°C) outside this range is abnormal.
pub const NORMAL_TEMPERATURE: RangeInclusive<f64> = 35.0..=42.0;

/// Pulse rate (bpm) outside this range is abnormal.
pub const NORMAL_PULSE: RangeInclusive<u32> = 60..=100;

/// The three vitals recorded for every patient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Beats per minute.
    pub pulse_rate: u32,
    /// Oxygen saturation, percent.
    pub oxygen_level: f64,
}

impl VitalSigns {
    pub fn new(temperature: f64, pulse_rate: u32, oxygen_level: f64) -> Self {
        Self {
            temperature,
            pulse_rate,
            oxygen_level,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.oxygen_level < CRITICAL_OXYGEN_THRESHOLD
    }
}

/// A single out-of-range reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VitalFinding {
    LowOxygen(f64),
    AbnormalTemperature(f64),
    AbnormalPulse(u32),
}

impl fmt::Display for VitalFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VitalFinding::LowOxygen(v) => write!(f, "Critical oxygen: {}%", v),
            VitalFinding::AbnormalTemperature(v) => write!(f, "Abnormal temperature: {}°C", v),
            VitalFinding::AbnormalPulse(v) => write!(f, "Abnormal pulse: {} bpm", v),
        }
    }
}

/// Check every threshold and return one finding per violation, in the order
/// oxygen, temperature, pulse.
pub fn evaluate(vitals: &VitalSigns) -> Vec<VitalFinding> {
    let mut findings = Vec::new();

    if vitals.is_critical() {
        findings.push(VitalFinding::LowOxygen(vitals.oxygen_level));
    }
    if !NORMAL_TEMPERATURE.contains(&vitals.temperature) {
        findings.push(VitalFinding::AbnormalTemperature(vitals.temperature));
    }
    if !NORMAL_PULSE.contains(&vitals.pulse_rate) {
        findings.push(VitalFinding::AbnormalPulse(vitals.pulse_rate));
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_vitals_produce_no_findings() {
        let vitals = VitalSigns::new(36.8, 72, 98.0);
        assert!(evaluate(&vitals).is_empty());
        assert!(!vitals.is_critical());
    }

    #[test]
    fn low_oxygen_only_yields_single_finding() {
        let vitals = VitalSigns::new(38.0, 95, 88.0);
        let findings = evaluate(&vitals);
        assert_eq!(findings, vec![VitalFinding::LowOxygen(88.0)]);
        assert!(vitals.is_critical());
    }

    #[test]
    fn all_three_thresholds_can_fire_together() {
        let vitals = VitalSigns::new(43.5, 130, 80.0);
        let findings = evaluate(&vitals);
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[1], VitalFinding::AbnormalTemperature(43.5));
        assert_eq!(findings[2], VitalFinding::AbnormalPulse(130));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        assert!(evaluate(&VitalSigns::new(35.0, 60, 92.0)).is_empty());
        assert!(evaluate(&VitalSigns::new(42.0, 100, 92.0)).is_empty());
    }

    #[test]
    fn oxygen_just_below_threshold_is_critical() {
        assert!(VitalSigns::new(37.0, 80, 91.9).is_critical());
        assert!(!VitalSigns::new(37.0, 80, 92.0).is_critical());
    }

    #[test]
    fn findings_embed_the_offending_value() {
        assert_eq!(VitalFinding::LowOxygen(88.0).to_string(), "Critical oxygen: 88%");
        assert_eq!(
            VitalFinding::AbnormalTemperature(34.2).to_string(),
            "Abnormal temperature: 34.2°C"
        );
        assert_eq!(VitalFinding::AbnormalPulse(45).to_string(), "Abnormal pulse: 45 bpm");
    }
}
