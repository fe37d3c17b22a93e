//! Label placement.
//!
//! Every label hangs off a base point on the geometry (a segment midpoint or
//! the point itself) and is pushed away from it along a direction that leaves
//! the drawing. The anchor is that push at a gap proportional to the ray
//! length; backends that know their box sizes push further in pixels, see
//! `render::layout`.

use std::fmt;

use crate::geometry::GeometricModel;
use crate::render::defaults;
use crate::render::svg::fmt_num;
use crate::task::{PointRole, Ray, SegmentSlot, SlotValue, TaskSpec};
use crate::types::{Length, PtU, UnitVec};

/// What a label annotates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelTarget {
    Segment(SegmentSlot),
    Point(PointRole),
}

impl fmt::Display for LabelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelTarget::Segment(slot) => write!(f, "segment {slot}"),
            LabelTarget::Point(role) => write!(f, "point {role}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelStyle {
    Known,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub target: LabelTarget,
    /// Reference position in construction units
    pub anchor: PtU,
    /// Side of the base point the label sits on
    pub direction: UnitVec,
    pub text: String,
    pub style: LabelStyle,
}

impl Label {
    pub fn is_unknown(&self) -> bool {
        self.style == LabelStyle::Unknown
    }
}

/// Every label of one construction
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelPlan {
    /// One per present measurement, in slot order
    pub segments: Vec<Label>,
    /// One per point, in [`PointRole::ALL`] order
    pub points: Vec<Label>,
}

impl LabelPlan {
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.segments.iter().chain(self.points.iter())
    }

    pub fn unknown_segments(&self) -> impl Iterator<Item = &Label> {
        self.segments.iter().filter(|label| label.is_unknown())
    }
}

/// Text shown for a segment value
pub fn value_text(value: &SlotValue) -> String {
    match value {
        SlotValue::Known { value, unit } if unit.is_empty() => fmt_num(*value),
        SlotValue::Known { value, unit } => format!("{} {}", fmt_num(*value), unit),
        SlotValue::Unknown { symbol } => symbol.to_string(),
    }
}

/// Outward normals of both rays: each points away from the other ray
fn outward_normals(dir_a: UnitVec, dir_b: UnitVec) -> (UnitVec, UnitVec) {
    let left_of_a = dir_a.perp();
    let side = left_of_a.dot(dir_b);
    if side.abs() < 1e-9 {
        // Rays on one line: there is no "other side", split left and right of A
        return (left_of_a, -left_of_a);
    }
    let normal_a = if side > 0.0 { -left_of_a } else { left_of_a };
    let left_of_b = dir_b.perp();
    let normal_b = if left_of_b.dot(dir_a) > 0.0 { -left_of_b } else { left_of_b };
    (normal_a, normal_b)
}

/// Point on the geometry a label belongs to
pub fn base_point(model: &GeometricModel, target: LabelTarget) -> PtU {
    match target {
        LabelTarget::Segment(slot) => {
            let (from, to) = model.segment(slot);
            from.midpoint(to)
        }
        LabelTarget::Point(role) => model.point(role),
    }
}

/// Place every label of `spec` on `model`.
///
/// Infallible; degenerate constructions still get a complete plan.
pub fn plan(spec: &TaskSpec, model: &GeometricModel) -> LabelPlan {
    let dir_a = spec.apex_angle_a.direction();
    let dir_b = spec.apex_angle_b.direction();
    let (normal_a, normal_b) = outward_normals(dir_a, dir_b);

    let reach = spec.ray_length.abs().raw();
    let segment_gap = Length((reach * defaults::SEGMENT_GAP_FRACTION).max(defaults::MIN_GAP));
    let point_gap = Length((reach * defaults::POINT_GAP_FRACTION).max(defaults::MIN_GAP * 0.5));

    let mut segments = Vec::new();
    for slot in SegmentSlot::ALL {
        let Some(value) = spec.measurement(slot) else {
            continue;
        };
        let normal = match slot.ray() {
            Ray::A => normal_a,
            Ray::B => normal_b,
        };
        let target = LabelTarget::Segment(slot);
        segments.push(Label {
            target,
            anchor: base_point(model, target) + normal * segment_gap,
            direction: normal,
            text: value_text(value),
            style: if value.is_unknown() { LabelStyle::Unknown } else { LabelStyle::Known },
        });
    }

    let away_from_apex = dir_a.halfway(dir_b).map(|bisector| -bisector).unwrap_or(normal_a);
    // A transversal point label bisects the wider of the two outer corners
    // between its ray and its transversal
    let across = |at: PtU, partner: PtU, along: UnitVec, normal: UnitVec| {
        (at - partner)
            .direction()
            .and_then(|out| {
                let side = if out.dot(along) < 0.0 { along } else { -along };
                out.halfway(side)
            })
            .unwrap_or(normal)
    };

    let points = PointRole::ALL
        .into_iter()
        .map(|role| {
            let direction = match role {
                PointRole::Apex => away_from_apex,
                PointRole::FirstA => across(model.first_a, model.first_b, dir_a, normal_a),
                PointRole::SecondA => across(model.second_a, model.second_b, dir_a, normal_a),
                PointRole::FirstB => across(model.first_b, model.first_a, dir_b, normal_b),
                PointRole::SecondB => across(model.second_b, model.second_a, dir_b, normal_b),
                PointRole::EndA => dir_a.halfway(normal_a).unwrap_or(dir_a),
                PointRole::EndB => dir_b.halfway(normal_b).unwrap_or(dir_b),
            };
            let gap = if role == PointRole::Apex { point_gap * 1.5 } else { point_gap };
            let target = LabelTarget::Point(role);
            Label {
                target,
                anchor: base_point(model, target) + direction * gap,
                direction,
                text: spec.labels.name(role).to_string(),
                style: LabelStyle::Known,
            }
        })
        .collect();

    LabelPlan { segments, points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::compute;
    use crate::task::RawTaskSpec;

    fn distance_to_line(p: PtU, a: PtU, b: PtU) -> f64 {
        let ab = b - a;
        let ap = p - a;
        let cross = ab.dx.raw() * ap.dy.raw() - ab.dy.raw() * ap.dx.raw();
        cross.abs() / ab.length().raw()
    }

    fn full_task() -> TaskSpec {
        let raw: RawTaskSpec = serde_json::from_str(
            r#"{"apex_angle_a": 60, "apex_angle_b": 25, "ray_length": 15, "t1": 0.35, "t2": 0.7,
                "measurements": [15, 20, 12.5, 12, 16, 10], "unknown_index": 4}"#,
        )
        .unwrap();
        TaskSpec::try_from(raw).unwrap()
    }

    #[test]
    fn exactly_one_unknown_with_unknown_index() {
        let spec = full_task();
        let plan = plan(&spec, &compute(&spec));
        assert_eq!(plan.segments.len(), 6);
        assert_eq!(plan.points.len(), 7);
        let unknown: Vec<_> = plan.unknown_segments().collect();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].target, LabelTarget::Segment(SegmentSlot::FirstSecondB));
        assert_eq!(unknown[0].text, "x");
    }

    #[test]
    fn known_text_is_value_and_unit() {
        let spec = full_task();
        let plan = plan(&spec, &compute(&spec));
        let texts: Vec<&str> = plan.segments.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["15 cm", "20 cm", "12.5 cm", "12 cm", "x", "10 cm"]);
    }

    #[test]
    fn missing_slots_get_no_label() {
        let spec = TaskSpec::new(60.0, 25.0, 15.0, 0.35, 0.7)
            .known(SegmentSlot::ApexFirstA, 3.0, "m")
            .unknown(SegmentSlot::ApexFirstB, 'y');
        let plan = plan(&spec, &compute(&spec));
        let targets: Vec<_> = plan.segments.iter().map(|l| l.target).collect();
        assert_eq!(
            targets,
            [
                LabelTarget::Segment(SegmentSlot::ApexFirstA),
                LabelTarget::Segment(SegmentSlot::ApexFirstB)
            ]
        );
    }

    #[test]
    fn anchors_are_distinct() {
        for spec in crate::catalog::tasks().into_iter().chain([full_task()]) {
            let plan = plan(&spec, &compute(&spec));
            let anchors: Vec<PtU> = plan.labels().map(|l| l.anchor).collect();
            for (i, a) in anchors.iter().enumerate() {
                for b in &anchors[i + 1..] {
                    assert!(a.distance(*b).raw() > 0.1, "anchors {a:?} and {b:?} collide");
                }
            }
        }
    }

    #[test]
    fn segment_labels_sit_off_their_line_and_outside() {
        let spec = full_task();
        let model = compute(&spec);
        let plan = plan(&spec, &model);
        for label in &plan.segments {
            let LabelTarget::Segment(slot) = label.target else {
                unreachable!()
            };
            let (other_end, line_end) = match slot.ray() {
                Ray::A => (model.end_b, model.end_a),
                Ray::B => (model.end_a, model.end_b),
            };
            let d = distance_to_line(label.anchor, model.apex, line_end);
            assert!(d > 0.3, "{} sits on its ray", label.target);
            // Same side test: anchor and the other ray lie on opposite sides
            let side = |p: PtU| {
                let ab = line_end - model.apex;
                let ap = p - model.apex;
                ab.dx.raw() * ap.dy.raw() - ab.dy.raw() * ap.dx.raw()
            };
            assert!(side(label.anchor) * side(other_end) < 0.0);
        }
    }

    #[test]
    fn transversal_point_labels_leave_both_lines() {
        let spec = full_task();
        let model = compute(&spec);
        let plan = plan(&spec, &model);
        let pairs = [
            (PointRole::FirstA, model.first_b, model.end_a),
            (PointRole::SecondA, model.second_b, model.end_a),
            (PointRole::FirstB, model.first_a, model.end_b),
            (PointRole::SecondB, model.second_a, model.end_b),
        ];
        for (role, partner, ray_end) in pairs {
            let label = &plan.points[role.index()];
            let at = model.point(role);
            assert!(distance_to_line(label.anchor, at, partner) > 0.1, "{role} sits on its transversal");
            assert!(distance_to_line(label.anchor, model.apex, ray_end) > 0.1, "{role} sits on its ray");
            // Pushed away from the partner point, not towards the inside
            assert!(label.direction.dot((partner - at).direction().unwrap()) < 0.0);
        }
    }

    #[test]
    fn anchor_is_base_plus_direction() {
        let spec = full_task();
        let model = compute(&spec);
        for label in plan(&spec, &model).labels() {
            let d = label.anchor - base_point(&model, label.target);
            let along = d.direction().unwrap();
            assert!((along.dot(label.direction) - 1.0).abs() < 1e-9, "{}", label.target);
        }
    }

    #[test]
    fn point_labels_use_point_names() {
        let spec = full_task();
        let plan = plan(&spec, &compute(&spec));
        let names: Vec<&str> = plan.points.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(names, ["Z", "A", "A'", "B", "B'", "P1", "P2"]);
        assert!(plan.points.iter().all(|l| l.style == LabelStyle::Known));
    }

    #[test]
    fn collinear_rays_fall_back_to_opposite_sides() {
        let spec = TaskSpec::new(30.0, 210.0, 10.0, 0.3, 0.6)
            .known(SegmentSlot::ApexFirstA, 3.0, "cm")
            .known(SegmentSlot::ApexFirstB, 3.0, "cm");
        let model = compute(&spec);
        let plan = plan(&spec, &model);
        let a = plan.segments[0].anchor;
        let b = plan.segments[1].anchor;
        assert!(a.distance(b).raw() > 0.1);
        assert!(plan.labels().all(|l| l.anchor.is_finite()));
    }

    #[test]
    fn degenerate_fractions_still_plan_everything() {
        let spec = TaskSpec::new(60.0, 25.0, 15.0, 0.5, 0.5)
            .known(SegmentSlot::FirstSecondA, 0.0, "cm");
        let plan = plan(&spec, &compute(&spec));
        assert_eq!(plan.points.len(), 7);
        assert_eq!(plan.segments[0].text, "0 cm");
    }
}
