//! Task descriptions: the declarative input of the pipeline.
//!
//! A [`TaskSpec`] is plain data. Everything that can go wrong with user input
//! is dealt with once, at the boundary, when a [`RawTaskSpec`] (the serde
//! form, which accepts both historical measurement encodings) is converted.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::errors::{Degeneracy, SpecError};
use crate::types::{Angle, Length};

/// Unit suffix used when a task does not name one
pub const DEFAULT_UNIT: &str = "cm";

/// Symbol given to the slot selected by `unknown_index`
pub const DEFAULT_UNKNOWN_SYMBOL: char = 'x';

/// Characters that are not portable in file names
const FORBIDDEN_IN_STEM: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Whether `name` can name an artifact inside the output directory
pub fn is_file_stem(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.chars().any(|c| c.is_control() || FORBIDDEN_IN_STEM.contains(&c))
}

/// One of the two rays leaving the apex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ray {
    A,
    B,
}

/// Named points of the construction, in label order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PointRole {
    Apex,
    FirstA,
    FirstB,
    SecondA,
    SecondB,
    EndA,
    EndB,
}

impl PointRole {
    pub const ALL: [PointRole; 7] = [
        PointRole::Apex,
        PointRole::FirstA,
        PointRole::FirstB,
        PointRole::SecondA,
        PointRole::SecondB,
        PointRole::EndA,
        PointRole::EndB,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The ray this point lies on; the apex lies on both
    pub fn ray(self) -> Option<Ray> {
        match self {
            PointRole::Apex => None,
            PointRole::FirstA | PointRole::SecondA | PointRole::EndA => Some(Ray::A),
            PointRole::FirstB | PointRole::SecondB | PointRole::EndB => Some(Ray::B),
        }
    }

    pub fn is_transversal(self) -> bool {
        matches!(
            self,
            PointRole::FirstA | PointRole::FirstB | PointRole::SecondA | PointRole::SecondB
        )
    }
}

impl fmt::Display for PointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PointRole::Apex => "apex",
            PointRole::FirstA => "first transversal on ray A",
            PointRole::FirstB => "first transversal on ray B",
            PointRole::SecondA => "second transversal on ray A",
            PointRole::SecondB => "second transversal on ray B",
            PointRole::EndA => "end of ray A",
            PointRole::EndB => "end of ray B",
        };
        f.write_str(name)
    }
}

/// The six measurable segments, three per ray, apex outwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SegmentSlot {
    ApexFirstA,
    FirstSecondA,
    SecondEndA,
    ApexFirstB,
    FirstSecondB,
    SecondEndB,
}

impl SegmentSlot {
    pub const ALL: [SegmentSlot; 6] = [
        SegmentSlot::ApexFirstA,
        SegmentSlot::FirstSecondA,
        SegmentSlot::SecondEndA,
        SegmentSlot::ApexFirstB,
        SegmentSlot::FirstSecondB,
        SegmentSlot::SecondEndB,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<SegmentSlot> {
        Self::ALL.get(index).copied()
    }

    pub fn ray(self) -> Ray {
        if self.index() < 3 { Ray::A } else { Ray::B }
    }

    /// Points bounding this segment, apex side first
    pub fn endpoints(self) -> (PointRole, PointRole) {
        match self {
            SegmentSlot::ApexFirstA => (PointRole::Apex, PointRole::FirstA),
            SegmentSlot::FirstSecondA => (PointRole::FirstA, PointRole::SecondA),
            SegmentSlot::SecondEndA => (PointRole::SecondA, PointRole::EndA),
            SegmentSlot::ApexFirstB => (PointRole::Apex, PointRole::FirstB),
            SegmentSlot::FirstSecondB => (PointRole::FirstB, PointRole::SecondB),
            SegmentSlot::SecondEndB => (PointRole::SecondB, PointRole::EndB),
        }
    }

    /// Key used by the keyed measurement form in task files
    pub fn key(self) -> &'static str {
        match self {
            SegmentSlot::ApexFirstA => "ZA",
            SegmentSlot::FirstSecondA => "AB",
            SegmentSlot::SecondEndA => "BP",
            SegmentSlot::ApexFirstB => "ZA_strich",
            SegmentSlot::FirstSecondB => "AB_strich",
            SegmentSlot::SecondEndB => "BP_strich",
        }
    }

    pub fn from_key(key: &str) -> Option<SegmentSlot> {
        Self::ALL.into_iter().find(|slot| slot.key() == key)
    }
}

impl fmt::Display for SegmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.index(), self.key())
    }
}

/// Names printed next to the seven points, indexed by [`PointRole`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointLabels([String; 7]);

impl PointLabels {
    pub fn name(&self, role: PointRole) -> &str {
        &self.0[role.index()]
    }
}

impl Default for PointLabels {
    fn default() -> Self {
        PointLabels(["Z", "A", "A'", "B", "B'", "P1", "P2"].map(String::from))
    }
}

impl TryFrom<Vec<String>> for PointLabels {
    type Error = SpecError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        let count = names.len();
        let names: [String; 7] = names
            .try_into()
            .map_err(|_| SpecError::WrongLabelCount { count })?;
        Ok(PointLabels(names))
    }
}

/// The canonical value of one segment slot
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    Known { value: f64, unit: String },
    Unknown { symbol: char },
}

impl SlotValue {
    pub fn known(value: f64, unit: impl Into<String>) -> Self {
        SlotValue::Known { value, unit: unit.into() }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, SlotValue::Unknown { .. })
    }
}

/// One exercise.
///
/// Built once by a catalogue, a test fixture or a task file and never
/// mutated afterwards; the builder methods consume `self`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    pub name: Option<String>,
    pub title: Option<String>,
    pub apex_angle_a: Angle,
    pub apex_angle_b: Angle,
    pub ray_length: Length,
    pub t1: f64,
    pub t2: f64,
    pub labels: PointLabels,
    pub measurements: [Option<SlotValue>; 6],
}

impl TaskSpec {
    /// A task without measurements and with the default point names
    pub fn new(apex_angle_a: f64, apex_angle_b: f64, ray_length: f64, t1: f64, t2: f64) -> Self {
        TaskSpec {
            name: None,
            title: None,
            apex_angle_a: Angle(apex_angle_a),
            apex_angle_b: Angle(apex_angle_b),
            ray_length: Length(ray_length),
            t1,
            t2,
            labels: PointLabels::default(),
            measurements: Default::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_labels(mut self, labels: PointLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn known(mut self, slot: SegmentSlot, value: f64, unit: &str) -> Self {
        self.measurements[slot.index()] = Some(SlotValue::known(value, unit));
        self
    }

    pub fn unknown(mut self, slot: SegmentSlot, symbol: char) -> Self {
        self.measurements[slot.index()] = Some(SlotValue::Unknown { symbol });
        self
    }

    pub fn measurement(&self, slot: SegmentSlot) -> Option<&SlotValue> {
        self.measurements[slot.index()].as_ref()
    }

    /// Slots the learner has to compute
    pub fn unknown_slots(&self) -> Vec<SegmentSlot> {
        SegmentSlot::ALL
            .into_iter()
            .filter(|slot| self.measurement(*slot).is_some_and(SlotValue::is_unknown))
            .collect()
    }

    /// File stem for the artifact of the `number`-th task (1-based).
    ///
    /// A name that is not a plain file stem is ignored.
    pub fn stem(&self, number: usize) -> String {
        match &self.name {
            Some(name) if is_file_stem(name) => name.clone(),
            _ => format!("aufgabe{number}"),
        }
    }

    pub fn display_title(&self, number: usize) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| format!("Strahlensatz Aufgabe {number}"))
    }

    /// Optional pre-check for degenerate constructions.
    ///
    /// The geometry engine never calls this: degenerate tasks still render.
    pub fn degeneracies(&self) -> Vec<Degeneracy> {
        let mut found = Vec::new();

        let scalars = [
            ("apex_angle_a", self.apex_angle_a.degrees()),
            ("apex_angle_b", self.apex_angle_b.degrees()),
            ("ray_length", self.ray_length.raw()),
            ("t1", self.t1),
            ("t2", self.t2),
        ];
        for (which, value) in scalars {
            if !value.is_finite() {
                found.push(Degeneracy::NonFinite { which });
            }
        }
        if !found.is_empty() {
            return found;
        }

        if self.ray_length.raw() <= 0.0 {
            found.push(Degeneracy::NonPositiveRayLength(self.ray_length.raw()));
        }
        for (which, value) in [("t1", self.t1), ("t2", self.t2)] {
            if value <= 0.0 || value >= 1.0 {
                found.push(Degeneracy::FractionOutOfRange { which, value });
            }
        }
        if self.t1 >= self.t2 {
            found.push(Degeneracy::FractionsNotIncreasing { t1: self.t1, t2: self.t2 });
        }

        let a = self.apex_angle_a.direction();
        let b = self.apex_angle_b.direction();
        if a.dot(b) > 1.0 - 1e-12 {
            found.push(Degeneracy::CoincidentRays(self.apex_angle_a, self.apex_angle_b));
        }

        found
    }
}

// ============================================================================
// Raw (serde) form
// ============================================================================

/// A single measurement as written in a task file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawMeasurement {
    Number(f64),
    Text(String),
}

/// Measurements either positionally (slot order) or keyed by segment name
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawMeasurements {
    List(Vec<Option<RawMeasurement>>),
    Keyed(BTreeMap<String, RawMeasurement>),
}

impl Default for RawMeasurements {
    fn default() -> Self {
        RawMeasurements::List(Vec::new())
    }
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

/// Task as accepted from JSON, before normalisation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTaskSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(alias = "apexAngleA", alias = "ray1_angle")]
    pub apex_angle_a: f64,
    #[serde(alias = "apexAngleB", alias = "ray2_angle")]
    pub apex_angle_b: f64,
    #[serde(alias = "rayLength")]
    pub ray_length: f64,
    #[serde(alias = "parallel1_t")]
    pub t1: f64,
    #[serde(alias = "parallel2_t")]
    pub t2: f64,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub measurements: RawMeasurements,
    #[serde(default, alias = "unknownIndex")]
    pub unknown_index: Option<usize>,
    #[serde(default = "default_unit")]
    pub unit: String,
}

impl RawMeasurement {
    fn normalize(&self, slot: SegmentSlot, unit: &str) -> Result<SlotValue, SpecError> {
        match self {
            RawMeasurement::Number(value) => Ok(SlotValue::known(*value, unit)),
            RawMeasurement::Text(text) => {
                let trimmed = text.trim();
                if let Ok(value) = trimmed.replace(',', ".").parse::<f64>() {
                    return Ok(SlotValue::known(value, unit));
                }
                let mut chars = trimmed.chars();
                match (chars.next(), chars.next()) {
                    (Some(symbol), None) if symbol.is_alphabetic() => {
                        Ok(SlotValue::Unknown { symbol })
                    }
                    _ => Err(SpecError::InvalidMeasurement { slot, value: text.clone() }),
                }
            }
        }
    }
}

impl TryFrom<RawTaskSpec> for TaskSpec {
    type Error = SpecError;

    fn try_from(raw: RawTaskSpec) -> Result<Self, Self::Error> {
        let mut measurements: [Option<SlotValue>; 6] = Default::default();

        match &raw.measurements {
            RawMeasurements::List(values) => {
                if values.len() > SegmentSlot::ALL.len() {
                    return Err(SpecError::TooManyMeasurements { count: values.len() });
                }
                for (slot, value) in SegmentSlot::ALL.into_iter().zip(values) {
                    if let Some(value) = value {
                        measurements[slot.index()] = Some(value.normalize(slot, &raw.unit)?);
                    }
                }
            }
            RawMeasurements::Keyed(values) => {
                for (key, value) in values {
                    let slot = SegmentSlot::from_key(key)
                        .ok_or_else(|| SpecError::UnknownSegmentKey { key: key.clone() })?;
                    measurements[slot.index()] = Some(value.normalize(slot, &raw.unit)?);
                }
            }
        }

        if let Some(index) = raw.unknown_index {
            let unknown = SegmentSlot::from_index(index)
                .ok_or(SpecError::UnknownSlotOutOfRange { index })?;
            for slot in SegmentSlot::ALL {
                let marked = measurements[slot.index()]
                    .as_ref()
                    .is_some_and(SlotValue::is_unknown);
                if slot != unknown && marked {
                    return Err(SpecError::ConflictingUnknowns { index: unknown, marked: slot });
                }
            }
            let entry = &mut measurements[unknown.index()];
            if !entry.as_ref().is_some_and(SlotValue::is_unknown) {
                *entry = Some(SlotValue::Unknown { symbol: DEFAULT_UNKNOWN_SYMBOL });
            }
        }

        if let Some(name) = raw.name.as_ref().filter(|name| !is_file_stem(name)) {
            return Err(SpecError::InvalidTaskName { name: name.clone() });
        }

        let labels = match raw.labels {
            Some(names) => PointLabels::try_from(names)?,
            None => PointLabels::default(),
        };

        Ok(TaskSpec {
            name: raw.name,
            title: raw.title,
            apex_angle_a: Angle(raw.apex_angle_a),
            apex_angle_b: Angle(raw.apex_angle_b),
            ray_length: Length(raw.ray_length),
            t1: raw.t1,
            t2: raw.t2,
            labels,
            measurements,
        })
    }
}

/// Parse a JSON array of tasks and normalise each one
pub fn tasks_from_json(json: &str) -> Result<Vec<TaskSpec>, SpecError> {
    let raw: Vec<RawTaskSpec> = serde_json::from_str(json)?;
    raw.into_iter().map(TaskSpec::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawTaskSpec {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn slot_order_matches_rays() {
        for slot in SegmentSlot::ALL {
            let (from, to) = slot.endpoints();
            assert_eq!(to.ray(), Some(slot.ray()));
            assert!(from == PointRole::Apex || from.ray() == Some(slot.ray()));
            assert_eq!(SegmentSlot::from_index(slot.index()), Some(slot));
            assert_eq!(SegmentSlot::from_key(slot.key()), Some(slot));
        }
        assert_eq!(SegmentSlot::from_index(6), None);
    }

    #[test]
    fn legacy_markers_become_unknowns() {
        let spec = TaskSpec::try_from(raw(
            r#"{"ray1_angle": 62, "ray2_angle": 22, "ray_length": 15,
                "parallel1_t": 0.35, "parallel2_t": 0.70,
                "measurements": {"ZA": 21, "AB": 21, "ZA_strich": "y", "AB_strich": "x"}}"#,
        ))
        .unwrap();

        assert_eq!(
            spec.unknown_slots(),
            vec![SegmentSlot::ApexFirstB, SegmentSlot::FirstSecondB]
        );
        assert_eq!(
            spec.measurement(SegmentSlot::ApexFirstB),
            Some(&SlotValue::Unknown { symbol: 'y' })
        );
        assert_eq!(
            spec.measurement(SegmentSlot::ApexFirstA),
            Some(&SlotValue::known(21.0, "cm"))
        );
        assert_eq!(spec.measurement(SegmentSlot::SecondEndA), None);
    }

    #[test]
    fn unknown_index_selects_exactly_one_slot() {
        let spec = TaskSpec::try_from(raw(
            r#"{"apexAngleA": 60, "apexAngleB": 25, "rayLength": 15, "t1": 0.35, "t2": 0.7,
                "measurements": [15, 20, 25, 12, 16, 20], "unknownIndex": 4, "unit": "m"}"#,
        ))
        .unwrap();

        assert_eq!(spec.unknown_slots(), vec![SegmentSlot::FirstSecondB]);
        assert_eq!(
            spec.measurement(SegmentSlot::FirstSecondB),
            Some(&SlotValue::Unknown { symbol: 'x' })
        );
        assert_eq!(
            spec.measurement(SegmentSlot::SecondEndB),
            Some(&SlotValue::known(20.0, "m"))
        );
    }

    #[test]
    fn unknown_index_out_of_range_is_rejected() {
        let err = TaskSpec::try_from(raw(
            r#"{"apex_angle_a": 60, "apex_angle_b": 25, "ray_length": 15, "t1": 0.35, "t2": 0.7,
                "unknown_index": 6}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, SpecError::UnknownSlotOutOfRange { index: 6 }));
    }

    #[test]
    fn unknown_index_conflicts_with_other_markers() {
        let err = TaskSpec::try_from(raw(
            r#"{"apex_angle_a": 60, "apex_angle_b": 25, "ray_length": 15, "t1": 0.35, "t2": 0.7,
                "measurements": ["y", 20, 25, 12, 16, 20], "unknown_index": 4}"#,
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            SpecError::ConflictingUnknowns {
                index: SegmentSlot::FirstSecondB,
                marked: SegmentSlot::ApexFirstA
            }
        ));
    }

    #[test]
    fn numeric_strings_are_known_values() {
        let spec = TaskSpec::try_from(raw(
            r#"{"apex_angle_a": 60, "apex_angle_b": 25, "ray_length": 15, "t1": 0.35, "t2": 0.7,
                "measurements": ["12,5", null, " 7 "]}"#,
        ))
        .unwrap();
        assert_eq!(
            spec.measurement(SegmentSlot::ApexFirstA),
            Some(&SlotValue::known(12.5, "cm"))
        );
        assert_eq!(spec.measurement(SegmentSlot::FirstSecondA), None);
        assert_eq!(
            spec.measurement(SegmentSlot::SecondEndA),
            Some(&SlotValue::known(7.0, "cm"))
        );
    }

    #[test]
    fn garbage_measurement_is_rejected() {
        let err = TaskSpec::try_from(raw(
            r#"{"apex_angle_a": 60, "apex_angle_b": 25, "ray_length": 15, "t1": 0.35, "t2": 0.7,
                "measurements": [1, "about ten"]}"#,
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            SpecError::InvalidMeasurement { slot: SegmentSlot::FirstSecondA, .. }
        ));
    }

    #[test]
    fn too_many_measurements_is_rejected() {
        let err = TaskSpec::try_from(raw(
            r#"{"apex_angle_a": 60, "apex_angle_b": 25, "ray_length": 15, "t1": 0.35, "t2": 0.7,
                "measurements": [1, 2, 3, 4, 5, 6, 7]}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, SpecError::TooManyMeasurements { count: 7 }));
    }

    #[test]
    fn labels_must_have_seven_names() {
        let err = TaskSpec::try_from(raw(
            r#"{"apex_angle_a": 60, "apex_angle_b": 25, "ray_length": 15, "t1": 0.35, "t2": 0.7,
                "labels": ["S", "C", "D"]}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, SpecError::WrongLabelCount { count: 3 }));
    }

    #[test]
    fn valid_task_has_no_degeneracies() {
        assert!(TaskSpec::new(60.0, 25.0, 15.0, 0.35, 0.7).degeneracies().is_empty());
    }

    #[test]
    fn degeneracies_are_reported_not_fixed() {
        let spec = TaskSpec::new(40.0, 40.0, -2.0, 0.5, 0.5);
        let found = spec.degeneracies();
        assert!(found.contains(&Degeneracy::NonPositiveRayLength(-2.0)));
        assert!(found.contains(&Degeneracy::FractionsNotIncreasing { t1: 0.5, t2: 0.5 }));
        assert!(found.contains(&Degeneracy::CoincidentRays(Angle(40.0), Angle(40.0))));
        assert_eq!(spec.t1, 0.5);
    }

    #[test]
    fn non_finite_parameters_short_circuit() {
        let spec = TaskSpec::new(f64::NAN, 25.0, 15.0, 1.5, 0.7);
        assert_eq!(
            spec.degeneracies(),
            vec![Degeneracy::NonFinite { which: "apex_angle_a" }]
        );
    }

    #[test]
    fn names_must_be_plain_file_stems() {
        for bad in ["../escape", "/tmp/abs", "a/b", "a\\b", "..", ".", "", "  ", "C:evil", "a\nb"] {
            let json = format!(
                r#"{{"name": {}, "apex_angle_a": 60, "apex_angle_b": 25, "ray_length": 15, "t1": 0.35, "t2": 0.7}}"#,
                serde_json::Value::from(bad)
            );
            let err = TaskSpec::try_from(raw(&json)).unwrap_err();
            assert!(matches!(err, SpecError::InvalidTaskName { .. }), "{bad:?} accepted");
        }
        for good in ["leiter", "aufgabe-7", "Baum .v2", "Übung_3"] {
            assert!(is_file_stem(good), "{good:?} rejected");
        }
    }

    #[test]
    fn unusable_names_fall_back_to_position() {
        let spec = TaskSpec::new(60.0, 25.0, 15.0, 0.35, 0.7).named("../../etc/passwd");
        assert_eq!(spec.stem(2), "aufgabe2");
    }

    #[test]
    fn stem_and_title_fall_back_to_position() {
        let spec = TaskSpec::new(60.0, 25.0, 15.0, 0.35, 0.7);
        assert_eq!(spec.stem(3), "aufgabe3");
        assert_eq!(spec.display_title(3), "Strahlensatz Aufgabe 3");
        let spec = spec.named("leiter").titled("Die Leiter");
        assert_eq!(spec.stem(3), "leiter");
        assert_eq!(spec.display_title(3), "Die Leiter");
    }
}
