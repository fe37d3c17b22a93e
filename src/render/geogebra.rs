//! Object model shared by the applet page and the `.ggb` archive.
//!
//! Both backends describe the same GeoGebra construction: seven free points,
//! two ray segments, two transversal lines and one text per label. They only
//! differ in how that description is delivered.

use super::layout::{LabelMetrics, layout};
use super::{RenderMeta, Scene, defaults, text_width};
use crate::errors::RenderError;
use crate::labels::{LabelStyle, LabelTarget};
use crate::task::PointRole;
use crate::types::PtU;

/// Names GeoGebra reserves for its own functions and constants
const RESERVED: [&str; 6] = ["x", "y", "z", "e", "i", "pi"];

/// Names the construction gives its own lines
const LINE_NAMES: [&str; 4] = ["rayA", "rayB", "parallel1", "parallel2"];

const METRICS: LabelMetrics = LabelMetrics {
    font_size: defaults::GGB_FONT_SIZE,
    point_font_size: defaults::GGB_FONT_SIZE,
    padding: defaults::TEXT_PADDING,
    clearance: defaults::GGB_LABEL_CLEARANCE,
};

/// A usable GeoGebra object name: a letter, then letters, digits or `_`, then primes
pub(crate) fn is_object_name(name: &str) -> bool {
    let core = name.trim_end_matches('\'');
    let mut chars = core.chars();
    let starts_with_letter = chars.next().is_some_and(char::is_alphabetic);
    starts_with_letter
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && !RESERVED.contains(&core)
}

/// Taken by the lines and texts of the construction itself
fn is_construction_name(name: &str) -> bool {
    LINE_NAMES.contains(&name)
        || name
            .strip_prefix("text")
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// GeoGebra string expression showing `text`.
///
/// A GeoGebra literal has no escape for `"`, so quotes are spliced in as
/// `UnicodeToLetter(34)`; every other character stands for itself.
pub(crate) fn ggb_string(text: &str) -> String {
    text.split('"')
        .map(|part| format!("\"{part}\""))
        .collect::<Vec<_>>()
        .join(" + UnicodeToLetter(34) + ")
}

/// Pixel placement of the construction in the GeoGebra graphics view
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CoordSystem {
    /// Screen position of the origin
    pub x_zero: f64,
    pub y_zero: f64,
    /// Pixels per unit, same on both axes
    pub scale: f64,
    pub width: f64,
    pub height: f64,
}

impl CoordSystem {
    pub fn x_min(&self) -> f64 {
        -self.x_zero / self.scale
    }

    pub fn x_max(&self) -> f64 {
        (self.width - self.x_zero) / self.scale
    }

    pub fn y_min(&self) -> f64 {
        (self.y_zero - self.height) / self.scale
    }

    pub fn y_max(&self) -> f64 {
        self.y_zero / self.scale
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GgbPoint {
    pub name: String,
    pub at: PtU,
    pub color: (u8, u8, u8),
}

/// A segment or line through two named points
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GgbLink {
    pub name: &'static str,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GgbText {
    pub name: String,
    pub text: String,
    /// Lower-left corner, chosen so the text is centred on its placed box
    pub start: PtU,
    pub color: (u8, u8, u8),
    pub unknown: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GgbConstruction {
    pub coords: CoordSystem,
    pub points: Vec<GgbPoint>,
    pub rays: [GgbLink; 2],
    pub transversals: [GgbLink; 2],
    pub texts: Vec<GgbText>,
}

impl GgbConstruction {
    pub fn build(scene: &Scene<'_>, meta: &RenderMeta, width: u32, height: u32) -> Result<Self, RenderError> {
        let layout = layout(scene, meta, width as f64, height as f64, defaults::GGB_MARGIN, &METRICS)?;
        let viewport = layout.viewport;
        let origin = viewport.to_px(PtU::units(0.0, 0.0));
        let coords = CoordSystem {
            x_zero: origin.x,
            y_zero: origin.y,
            scale: viewport.scale(),
            width: width as f64,
            height: height as f64,
        };

        let mut names: Vec<String> = Vec::with_capacity(PointRole::ALL.len());
        for role in PointRole::ALL {
            let label = scene.point_label(role).map(|l| l.text.as_str()).unwrap_or_default();
            let usable = is_object_name(label) && !is_construction_name(label);
            let mut name = if usable && !names.iter().any(|n| n == label) {
                label.to_string()
            } else {
                format!("Pt_{}", role.index() + 1)
            };
            while names.contains(&name) {
                name.push('_');
            }
            names.push(name);
        }
        let name = |role: PointRole| names[role.index()].clone();

        let model = scene.model();
        let points = PointRole::ALL
            .into_iter()
            .map(|role| GgbPoint {
                name: name(role),
                at: model.point(role),
                color: if role.is_transversal() {
                    defaults::TRANSVERSAL_POINT_COLOR
                } else {
                    defaults::POINT_COLOR
                },
            })
            .collect();

        let rays = [
            GgbLink { name: "rayA", from: name(PointRole::Apex), to: name(PointRole::EndA) },
            GgbLink { name: "rayB", from: name(PointRole::Apex), to: name(PointRole::EndB) },
        ];
        let transversals = [
            GgbLink { name: "parallel1", from: name(PointRole::FirstA), to: name(PointRole::FirstB) },
            GgbLink { name: "parallel2", from: name(PointRole::SecondA), to: name(PointRole::SecondB) },
        ];

        let half_height = defaults::GGB_FONT_SIZE * 0.35 / coords.scale;
        let texts = layout
            .labels
            .iter()
            .enumerate()
            .map(|(i, placed)| {
                let label = placed.label;
                let half_width = text_width(&label.text, defaults::GGB_FONT_SIZE) / 2.0 / coords.scale;
                let center = viewport.to_units(placed.center);
                let color = match (label.target, label.style) {
                    (LabelTarget::Point(role), _) if role.is_transversal() => {
                        defaults::TRANSVERSAL_POINT_COLOR
                    }
                    (LabelTarget::Point(_), _) => defaults::POINT_COLOR,
                    (_, LabelStyle::Known) => defaults::KNOWN_COLOR,
                    (_, LabelStyle::Unknown) => defaults::UNKNOWN_COLOR,
                };
                GgbText {
                    name: format!("text{}", i + 1),
                    text: label.text.clone(),
                    start: PtU::units(center.x.raw() - half_width, center.y.raw() - half_height),
                    color,
                    unknown: label.is_unknown(),
                }
            })
            .collect();

        Ok(GgbConstruction { coords, points, rays, transversals, texts })
    }
}
