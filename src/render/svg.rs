//! SVG generation
//!
//! A small SVG DOM serialized with quick-xml, and the drawing of a [`Scene`]
//! into it. The vector page embeds the result directly; the raster backend
//! feeds it to resvg.

use serde::{Serialize, Serializer};

use super::layout::{LabelMetrics, PlacedLabel, layout};
use super::{BackgroundStyle, RenderMeta, Scene, defaults};
use crate::errors::RenderError;
use crate::labels::{LabelStyle, LabelTarget};

// ============================================================================
// DOM
// ============================================================================

pub(crate) fn num<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&fmt_num(*value))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename = "svg")]
pub struct Svg {
    #[serde(rename = "@xmlns")]
    pub xmlns: &'static str,
    #[serde(rename = "@width", skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(rename = "@height", skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(rename = "@viewBox")]
    pub view_box: String,
    #[serde(rename = "@class", skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(rename = "$value")]
    pub children: Vec<SvgNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SvgNode {
    #[serde(rename = "defs")]
    Defs(Defs),
    #[serde(rename = "rect")]
    Rect(Rect),
    #[serde(rename = "line")]
    Line(Line),
    #[serde(rename = "circle")]
    Circle(Circle),
    #[serde(rename = "text")]
    Text(Text),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Defs {
    #[serde(rename = "pattern")]
    pub pattern: Pattern,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@width", serialize_with = "num")]
    pub width: f64,
    #[serde(rename = "@height", serialize_with = "num")]
    pub height: f64,
    #[serde(rename = "@patternUnits")]
    pub pattern_units: &'static str,
    #[serde(rename = "path")]
    pub path: Path,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Path {
    #[serde(rename = "@d")]
    pub d: String,
    #[serde(rename = "@fill")]
    pub fill: &'static str,
    #[serde(rename = "@stroke")]
    pub stroke: String,
    #[serde(rename = "@stroke-width", serialize_with = "num")]
    pub stroke_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rect {
    #[serde(rename = "@x", serialize_with = "num")]
    pub x: f64,
    #[serde(rename = "@y", serialize_with = "num")]
    pub y: f64,
    #[serde(rename = "@width", serialize_with = "num")]
    pub width: f64,
    #[serde(rename = "@height", serialize_with = "num")]
    pub height: f64,
    #[serde(rename = "@rx", serialize_with = "num")]
    pub rx: f64,
    #[serde(rename = "@class", skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(rename = "@fill")]
    pub fill: String,
    #[serde(rename = "@stroke", skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(rename = "@stroke-width", serialize_with = "num")]
    pub stroke_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    #[serde(rename = "@x1", serialize_with = "num")]
    pub x1: f64,
    #[serde(rename = "@y1", serialize_with = "num")]
    pub y1: f64,
    #[serde(rename = "@x2", serialize_with = "num")]
    pub x2: f64,
    #[serde(rename = "@y2", serialize_with = "num")]
    pub y2: f64,
    #[serde(rename = "@class", skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(rename = "@stroke")]
    pub stroke: String,
    #[serde(rename = "@stroke-width", serialize_with = "num")]
    pub stroke_width: f64,
    #[serde(rename = "@stroke-opacity", skip_serializing_if = "Option::is_none")]
    pub stroke_opacity: Option<String>,
    #[serde(rename = "@stroke-dasharray", skip_serializing_if = "Option::is_none")]
    pub stroke_dasharray: Option<&'static str>,
    #[serde(rename = "@stroke-linecap")]
    pub stroke_linecap: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Circle {
    #[serde(rename = "@cx", serialize_with = "num")]
    pub cx: f64,
    #[serde(rename = "@cy", serialize_with = "num")]
    pub cy: f64,
    #[serde(rename = "@r", serialize_with = "num")]
    pub r: f64,
    #[serde(rename = "@class", skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(rename = "@fill")]
    pub fill: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    #[serde(rename = "@x", serialize_with = "num")]
    pub x: f64,
    #[serde(rename = "@y", serialize_with = "num")]
    pub y: f64,
    #[serde(rename = "@class", skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(rename = "@fill")]
    pub fill: String,
    #[serde(rename = "@font-family")]
    pub font_family: &'static str,
    #[serde(rename = "@font-size", serialize_with = "num")]
    pub font_size: f64,
    #[serde(rename = "@font-weight", skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<&'static str>,
    #[serde(rename = "@text-anchor")]
    pub text_anchor: &'static str,
    #[serde(rename = "@dominant-baseline")]
    pub dominant_baseline: &'static str,
    #[serde(rename = "$text")]
    pub content: String,
}

/// Serialize an SVG document (no XML declaration)
pub fn to_markup(svg: &Svg) -> Result<String, RenderError> {
    quick_xml::se::to_string(svg).map_err(|e| RenderError::Markup(e.to_string()))
}

/// `rgb(r,g,b)` form used in every attribute
pub fn rgb((r, g, b): (u8, u8, u8)) -> String {
    format!("rgb({r},{g},{b})")
}

// ============================================================================
// Drawing a scene
// ============================================================================

const FONT_FAMILY: &str = "DejaVu Sans, Arial, Helvetica, sans-serif";

/// Backend-specific look of the same drawing
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Theme {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub ray_width: f64,
    pub transversal_width: f64,
    pub transversal_opacity: Option<f64>,
    pub transversal_dash: Option<&'static str>,
    pub point_radius: f64,
    pub labels: LabelMetrics,
    /// Draw segment labels on a framed box instead of bare text
    pub boxed_labels: bool,
    /// Emit CSS classes so the surrounding page can style the drawing
    pub css_classes: bool,
    pub grid_step: f64,
}

impl Theme {
    fn class(&self, name: &str) -> Option<String> {
        self.css_classes.then(|| name.to_string())
    }
}

/// Lay out `scene` on a canvas of the theme's size
pub(crate) fn draw_scene(scene: &Scene<'_>, meta: &RenderMeta, theme: &Theme) -> Result<Svg, RenderError> {
    let layout = layout(scene, meta, theme.width, theme.height, theme.margin, &theme.labels)?;
    let viewport = layout.viewport;
    let model = scene.model();
    let mut children = Vec::new();

    if meta.background == BackgroundStyle::Grid {
        let step = theme.grid_step;
        children.push(SvgNode::Defs(Defs {
            pattern: Pattern {
                id: "grid".to_string(),
                width: step,
                height: step,
                pattern_units: "userSpaceOnUse",
                path: Path {
                    d: format!("M {s} 0 L 0 0 0 {s}", s = fmt_num(step)),
                    fill: "none",
                    stroke: rgb(defaults::GRID_COLOR),
                    stroke_width: 1.0,
                },
            },
        }));
        children.push(SvgNode::Rect(Rect {
            x: 0.0,
            y: 0.0,
            width: theme.width,
            height: theme.height,
            rx: 0.0,
            class: theme.class("grid"),
            fill: "url(#grid)".to_string(),
            stroke: None,
            stroke_width: 0.0,
        }));
    }

    for (a, b) in scene.transversals(meta.transversal_overhang) {
        let (p, q) = (viewport.to_px(a), viewport.to_px(b));
        children.push(SvgNode::Line(Line {
            x1: p.x,
            y1: p.y,
            x2: q.x,
            y2: q.y,
            class: theme.class("transversal"),
            stroke: rgb(defaults::TRANSVERSAL_COLOR),
            stroke_width: theme.transversal_width,
            stroke_opacity: theme.transversal_opacity.map(fmt_num),
            stroke_dasharray: theme.transversal_dash,
            stroke_linecap: "butt",
        }));
    }

    for end in [model.end_a, model.end_b] {
        let (p, q) = (viewport.to_px(model.apex), viewport.to_px(end));
        children.push(SvgNode::Line(Line {
            x1: p.x,
            y1: p.y,
            x2: q.x,
            y2: q.y,
            class: theme.class("ray"),
            stroke: rgb(defaults::RAY_COLOR),
            stroke_width: theme.ray_width,
            stroke_opacity: None,
            stroke_dasharray: None,
            stroke_linecap: "round",
        }));
    }

    for (role, at) in model.points() {
        let c = viewport.to_px(at);
        let color = if role.is_transversal() {
            defaults::TRANSVERSAL_POINT_COLOR
        } else {
            defaults::POINT_COLOR
        };
        children.push(SvgNode::Circle(Circle {
            cx: c.x,
            cy: c.y,
            r: theme.point_radius,
            class: theme.class("point"),
            fill: rgb(color),
        }));
    }

    for placed in &layout.labels {
        push_label(&mut children, placed, theme);
    }

    Ok(Svg {
        xmlns: "http://www.w3.org/2000/svg",
        width: Some(fmt_num(theme.width)),
        height: Some(fmt_num(theme.height)),
        view_box: format!("0 0 {} {}", fmt_num(theme.width), fmt_num(theme.height)),
        class: theme.class("strahlensatz"),
        children,
    })
}

fn push_label(children: &mut Vec<SvgNode>, placed: &PlacedLabel<'_>, theme: &Theme) {
    let (label, at) = (placed.label, placed.center);
    let is_point = matches!(label.target, LabelTarget::Point(_));
    let font_size = theme.labels.font_size(label);
    let (class, color, weight) = match (is_point, label.style) {
        (true, _) => ("point-label", defaults::POINT_COLOR, Some("bold")),
        (false, LabelStyle::Known) => ("known", defaults::KNOWN_COLOR, None),
        (false, LabelStyle::Unknown) => ("unknown", defaults::UNKNOWN_COLOR, Some("bold")),
    };
    let color = match label.target {
        LabelTarget::Point(role) if role.is_transversal() => defaults::TRANSVERSAL_POINT_COLOR,
        _ => color,
    };

    if theme.boxed_labels && !is_point {
        let (w, h) = (placed.half.x * 2.0, placed.half.y * 2.0);
        let (fill, stroke, stroke_width) = match label.style {
            LabelStyle::Known => ("rgb(255,255,255)".to_string(), defaults::KNOWN_BORDER, 1.5),
            LabelStyle::Unknown => (rgb(defaults::UNKNOWN_FILL), defaults::UNKNOWN_COLOR, 4.0),
        };
        children.push(SvgNode::Rect(Rect {
            x: at.x - w / 2.0,
            y: at.y - h / 2.0,
            width: w,
            height: h,
            rx: font_size * 0.2,
            class: theme.class(&format!("{class}-box")),
            fill,
            stroke: Some(rgb(stroke)),
            stroke_width,
        }));
    }

    children.push(SvgNode::Text(Text {
        x: at.x,
        y: at.y,
        class: theme.class(class),
        fill: rgb(color),
        font_family: FONT_FAMILY,
        font_size,
        font_weight: weight,
        text_anchor: "middle",
        dominant_baseline: "central",
        content: label.text.clone(),
    }));
}

// ============================================================================
// Number formatting
// ============================================================================

/// Format a number with 6 significant figures, trailing zeros trimmed.
pub(crate) fn fmt_num(value: f64) -> String {
    fmt_num_precision(value, 6)
}

/// Format a number with specified significant figures, trailing zeros trimmed.
fn fmt_num_precision(value: f64, sig_figs: i32) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    // Round to specified significant figures
    let abs_val = value.abs();
    let magnitude = abs_val.log10().floor() as i32;
    let scale = 10_f64.powi(sig_figs - 1 - magnitude);
    let rounded = (value * scale).round() / scale;

    // Format with enough decimal places, then trim
    let decimals = (sig_figs - 1 - magnitude).max(0) as usize;
    let s = format!("{:.prec$}", rounded, prec = decimals);
    let s = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s.as_str()
    };
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_num_trims_trailing_zeros() {
        assert_eq!(fmt_num(12.5), "12.5");
        assert_eq!(fmt_num(15.0), "15");
        assert_eq!(fmt_num(0.0), "0");
        assert_eq!(fmt_num(1800.0), "1800");
        assert_eq!(fmt_num(2.0 / 3.0), "0.666667");
        assert_eq!(fmt_num(-0.0000001), "-0.0000001");
        assert_eq!(fmt_num(123456.7), "123457");
    }

    #[test]
    fn dom_serializes_attributes_and_text() {
        let svg = Svg {
            xmlns: "http://www.w3.org/2000/svg",
            width: None,
            height: None,
            view_box: "0 0 10 10".to_string(),
            class: None,
            children: vec![
                SvgNode::Line(Line {
                    x1: 0.0,
                    y1: 1.5,
                    x2: 10.0,
                    y2: 2.0,
                    class: Some("ray".to_string()),
                    stroke: rgb((0, 0, 0)),
                    stroke_width: 2.0,
                    stroke_opacity: None,
                    stroke_dasharray: Some("6 4"),
                    stroke_linecap: "round",
                }),
                SvgNode::Text(Text {
                    x: 5.0,
                    y: 5.0,
                    class: None,
                    fill: rgb((255, 0, 0)),
                    font_family: FONT_FAMILY,
                    font_size: 12.0,
                    font_weight: Some("bold"),
                    text_anchor: "middle",
                    dominant_baseline: "central",
                    content: "a < b".to_string(),
                }),
            ],
        };
        let markup = to_markup(&svg).unwrap();
        assert!(markup.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 10 10\">"));
        assert!(markup.contains("<line x1=\"0\" y1=\"1.5\" x2=\"10\" y2=\"2\" class=\"ray\""));
        assert!(markup.contains("stroke-dasharray=\"6 4\""));
        assert!(!markup.contains("stroke-opacity"));
        assert!(markup.contains(">a &lt; b</text>"));
        assert!(markup.ends_with("</svg>"));
    }
}
