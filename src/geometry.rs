//! Construction of the two rays and their transversal points.

use crate::log::debug;
use crate::task::{PointRole, SegmentSlot, TaskSpec};
use crate::types::{BoxU, PtU};

/// Apex position used by [`compute`]
pub const DEFAULT_APEX: (f64, f64) = (2.0, 15.0);

/// The seven points of one construction, in construction units (Y up)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricModel {
    pub apex: PtU,
    pub first_a: PtU,
    pub second_a: PtU,
    pub end_a: PtU,
    pub first_b: PtU,
    pub second_b: PtU,
    pub end_b: PtU,
}

impl GeometricModel {
    pub fn point(&self, role: PointRole) -> PtU {
        match role {
            PointRole::Apex => self.apex,
            PointRole::FirstA => self.first_a,
            PointRole::FirstB => self.first_b,
            PointRole::SecondA => self.second_a,
            PointRole::SecondB => self.second_b,
            PointRole::EndA => self.end_a,
            PointRole::EndB => self.end_b,
        }
    }

    /// All points in [`PointRole::ALL`] order
    pub fn points(&self) -> [(PointRole, PtU); 7] {
        PointRole::ALL.map(|role| (role, self.point(role)))
    }

    pub fn segment(&self, slot: SegmentSlot) -> (PtU, PtU) {
        let (from, to) = slot.endpoints();
        (self.point(from), self.point(to))
    }

    pub fn bounds(&self) -> BoxU {
        let mut bounds = BoxU::new();
        for (_, p) in self.points() {
            bounds.expand_point(p);
        }
        bounds
    }
}

/// Compute the construction with the apex at [`DEFAULT_APEX`]
pub fn compute(spec: &TaskSpec) -> GeometricModel {
    compute_at(spec, PtU::units(DEFAULT_APEX.0, DEFAULT_APEX.1))
}

/// Compute the construction with the apex at `apex`.
///
/// Never fails: out-of-range fractions, `t1 >= t2` or a non-positive ray
/// length give degenerate but well-defined points.
pub fn compute_at(spec: &TaskSpec, apex: PtU) -> GeometricModel {
    let end_a = apex + spec.apex_angle_a.direction() * spec.ray_length;
    let end_b = apex + spec.apex_angle_b.direction() * spec.ray_length;

    let model = GeometricModel {
        apex,
        first_a: apex.lerp(end_a, spec.t1),
        second_a: apex.lerp(end_a, spec.t2),
        end_a,
        first_b: apex.lerp(end_b, spec.t1),
        second_b: apex.lerp(end_b, spec.t2),
        end_b,
    };
    debug!(?model, "computed construction");
    model
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_a() -> TaskSpec {
        TaskSpec::new(60.0, 25.0, 15.0, 0.35, 0.70)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn scenario_a_points() {
        let model = compute(&scenario_a());
        assert_eq!(model.apex, PtU::units(2.0, 15.0));
        assert!(close(model.end_a.x.raw(), 9.5));
        assert!(close(model.end_a.y.raw(), 15.0 + 15.0 * 3f64.sqrt() / 2.0));
        assert!((model.end_a.y.raw() - 27.99).abs() < 0.01);
        assert!(close(model.first_a.x.raw(), 2.0 + 0.35 * 7.5));
        assert!(close(model.first_a.y.raw(), 15.0 + 0.35 * 12.990381056766578));
    }

    #[test]
    fn proportionality_holds_on_both_rays() {
        for spec in crate::catalog::tasks() {
            let m = compute(&spec);
            for (t, a, b) in [(spec.t1, m.first_a, m.first_b), (spec.t2, m.second_a, m.second_b)] {
                let ratio_a = m.apex.distance(a).raw() / m.apex.distance(m.end_a).raw();
                let ratio_b = m.apex.distance(b).raw() / m.apex.distance(m.end_b).raw();
                assert!(close(ratio_a, t), "ray A ratio {ratio_a} != {t}");
                assert!(close(ratio_b, t), "ray B ratio {ratio_b} != {t}");
            }
        }
    }

    #[test]
    fn compute_is_deterministic() {
        let spec = scenario_a();
        let first = compute(&spec);
        for _ in 0..10 {
            let again = compute(&spec);
            for ((_, p), (_, q)) in first.points().iter().zip(again.points().iter()) {
                assert_eq!(p.x.raw().to_bits(), q.x.raw().to_bits());
                assert_eq!(p.y.raw().to_bits(), q.y.raw().to_bits());
            }
        }
    }

    #[test]
    fn equal_fractions_collapse_transversals() {
        let model = compute(&TaskSpec::new(60.0, 25.0, 15.0, 0.5, 0.5));
        assert_eq!(model.first_a, model.second_a);
        assert_eq!(model.first_b, model.second_b);
        assert_ne!(model.first_a, model.first_b);
    }

    #[test]
    fn out_of_range_inputs_still_produce_points() {
        let model = compute(&TaskSpec::new(60.0, 25.0, -4.0, 1.4, -0.2));
        assert!(model.points().iter().all(|(_, p)| p.is_finite()));
    }

    #[test]
    fn custom_apex_translates_everything() {
        let spec = scenario_a();
        let base = compute(&spec);
        let moved = compute_at(&spec, PtU::units(12.0, 5.0));
        for ((_, p), (_, q)) in base.points().iter().zip(moved.points().iter()) {
            assert!(close(q.x.raw() - p.x.raw(), 10.0));
            assert!(close(q.y.raw() - p.y.raw(), -10.0));
        }
    }

    #[test]
    fn segments_follow_slot_endpoints() {
        let model = compute(&scenario_a());
        assert_eq!(model.segment(SegmentSlot::ApexFirstA), (model.apex, model.first_a));
        assert_eq!(model.segment(SegmentSlot::SecondEndB), (model.second_b, model.end_b));
        let bounds = model.bounds();
        assert!(!bounds.is_empty());
        assert_eq!(bounds.min.x, model.apex.x);
    }
}
