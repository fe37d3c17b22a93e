//! Pixel placement of label boxes.
//!
//! The label plan fixes where a label hangs (its base point) and which way it
//! leaves the drawing. How far it has to go depends on the size of the box a
//! backend draws, which is only known in pixels. Each box is pushed along its
//! direction until it clears its base point and every line through it, then
//! the viewport is refitted so the pushed boxes stay on the canvas.

use glam::{DVec2, dvec2};

use super::viewport::Viewport;
use super::{RenderMeta, Scene, text_width};
use crate::errors::RenderError;
use crate::geometry::GeometricModel;
use crate::labels::{Label, LabelTarget, base_point};
use crate::task::{PointRole, Ray};
use crate::types::{PtU, UnitVec};

/// Below this a push direction counts as parallel to a line and cannot clear it
const MIN_RATE: f64 = 0.05;

/// Refits after adding the label boxes; box sizes in units shrink with the
/// scale, so this settles quickly
const FIT_PASSES: usize = 4;

/// Box sizes and spacing of one backend's labels, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LabelMetrics {
    pub font_size: f64,
    pub point_font_size: f64,
    /// Space between text and box edge, as a fraction of the font size
    pub padding: f64,
    /// Gap kept between a box and the lines it annotates
    pub clearance: f64,
}

impl LabelMetrics {
    pub fn font_size(&self, label: &Label) -> f64 {
        match label.target {
            LabelTarget::Point(_) => self.point_font_size,
            LabelTarget::Segment(_) => self.font_size,
        }
    }

    /// Half width and half height of the box around the label's text
    pub fn half_extent(&self, label: &Label) -> DVec2 {
        let font_size = self.font_size(label);
        let pad = font_size * self.padding;
        dvec2(text_width(&label.text, font_size) / 2.0 + pad, font_size * 0.7)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlacedLabel<'a> {
    pub label: &'a Label,
    /// Box centre in canvas pixels
    pub center: DVec2,
    pub half: DVec2,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Layout<'a> {
    pub viewport: Viewport,
    pub labels: Vec<PlacedLabel<'a>>,
}

/// Drawn lines passing through the base point of a label.
///
/// The apex label has none: both rays start at the apex and leave it on the
/// side opposite to the label, so clearing the base point clears them too.
pub(crate) fn clearance_lines(model: &GeometricModel, target: LabelTarget) -> Vec<(PtU, PtU)> {
    let ray = |ray: Ray| match ray {
        Ray::A => (model.apex, model.end_a),
        Ray::B => (model.apex, model.end_b),
    };
    match target {
        LabelTarget::Segment(slot) => vec![ray(slot.ray())],
        LabelTarget::Point(PointRole::Apex) => Vec::new(),
        LabelTarget::Point(role) => {
            let mut lines: Vec<_> = role.ray().map(ray).into_iter().collect();
            match role {
                PointRole::FirstA | PointRole::FirstB => lines.push((model.first_a, model.first_b)),
                PointRole::SecondA | PointRole::SecondB => lines.push((model.second_a, model.second_b)),
                _ => {}
            }
            lines
        }
    }
}

/// Pixel offset from the base point for a box of half size `half`.
///
/// Every line in `lines` passes through the base point, so the distance from
/// the box centre to a line grows linearly with the push and the result does
/// not depend on the viewport scale.
pub(crate) fn push_offset(direction: UnitVec, half: DVec2, lines: &[(PtU, PtU)], clearance: f64) -> DVec2 {
    // Canvas Y points down
    let u = dvec2(direction.dx(), -direction.dy());

    // The whole box beyond the base point
    let mut reach = half.x * u.x.abs() + half.y * u.y.abs() + clearance;

    for &(a, b) in lines {
        let Some(along) = (b - a).direction() else {
            continue;
        };
        let normal = dvec2(along.dy(), along.dx());
        let rate = u.dot(normal).abs();
        if rate < MIN_RATE {
            continue;
        }
        let support = half.x * normal.x.abs() + half.y * normal.y.abs();
        reach = reach.max((support + clearance) / rate);
    }

    u * reach
}

/// Place every label of `scene` and fit drawing plus boxes into the canvas
pub(crate) fn layout<'a>(
    scene: &Scene<'a>,
    meta: &RenderMeta,
    width: f64,
    height: f64,
    margin: f64,
    metrics: &LabelMetrics,
) -> Result<Layout<'a>, RenderError> {
    let model = scene.model();
    let pushed: Vec<(&'a Label, PtU, DVec2, DVec2)> = scene
        .labels()
        .map(|label| {
            let half = metrics.half_extent(label);
            let lines = clearance_lines(model, label.target);
            let offset = push_offset(label.direction, half, &lines, metrics.clearance);
            (label, base_point(model, label.target), offset, half)
        })
        .collect();

    let drawing = scene.bounds(meta);
    let mut viewport = Viewport::fit(drawing, width, height, margin)?;
    for _ in 0..FIT_PASSES {
        let k = viewport.scale();
        let mut bounds = drawing;
        for (_, base, offset, half) in &pushed {
            for corner in [*offset - *half, *offset + *half] {
                bounds.expand_point(PtU::units(base.x.raw() + corner.x / k, base.y.raw() - corner.y / k));
            }
        }
        viewport = Viewport::fit(bounds, width, height, margin)?;
    }

    let labels = pushed
        .into_iter()
        .map(|(label, base, offset, half)| PlacedLabel {
            label,
            center: viewport.to_px(base) + offset,
            half,
        })
        .collect::<Vec<_>>();

    crate::log::debug!(labels = labels.len(), scale = viewport.scale(), "labels placed");
    Ok(Layout { viewport, labels })
}
