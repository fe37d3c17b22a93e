//! Self-contained HTML page with the construction as inline SVG

use quick_xml::escape::escape;

use super::layout::LabelMetrics;
use super::svg::{Theme, draw_scene, rgb, to_markup};
use super::{BackendKind, Render, RenderMeta, Scene, defaults};
use crate::errors::RenderError;

#[derive(Debug, Clone, PartialEq)]
pub struct VectorPageBackend {
    /// Width and height of the square viewBox
    pub size: u32,
    pub margin: f64,
}

impl Default for VectorPageBackend {
    fn default() -> Self {
        VectorPageBackend { size: defaults::PAGE_SIZE, margin: defaults::PAGE_MARGIN }
    }
}

impl VectorPageBackend {
    fn theme(&self) -> Theme {
        Theme {
            width: self.size as f64,
            height: self.size as f64,
            margin: self.margin,
            ray_width: defaults::PAGE_RAY_WIDTH,
            transversal_width: defaults::PAGE_TRANSVERSAL_WIDTH,
            transversal_opacity: None,
            transversal_dash: Some(defaults::PAGE_DASH),
            point_radius: defaults::PAGE_POINT_RADIUS,
            labels: LabelMetrics {
                font_size: defaults::PAGE_FONT_SIZE,
                point_font_size: defaults::PAGE_FONT_SIZE,
                padding: defaults::TEXT_PADDING,
                clearance: defaults::PAGE_LABEL_CLEARANCE,
            },
            boxed_labels: false,
            css_classes: true,
            grid_step: defaults::PAGE_GRID_STEP,
        }
    }
}

fn stylesheet() -> String {
    format!(
        "body {{ font-family: sans-serif; margin: 2em; }}\n\
         svg.strahlensatz {{ max-width: 100%; height: auto; border: 1px solid #ddd; }}\n\
         text {{ user-select: text; }}\n\
         text.known {{ fill: {known}; }}\n\
         text.unknown {{ fill: {unknown}; font-weight: bold; }}\n\
         line.transversal {{ stroke: {transversal}; }}\n",
        known = rgb(defaults::KNOWN_COLOR),
        unknown = rgb(defaults::UNKNOWN_COLOR),
        transversal = rgb(defaults::TRANSVERSAL_COLOR),
    )
}

impl Render for VectorPageBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::VectorPage
    }

    fn render(&self, scene: &Scene<'_>, meta: &RenderMeta) -> Result<Vec<u8>, RenderError> {
        let svg = to_markup(&draw_scene(scene, meta, &self.theme())?)?;
        let title = escape(meta.title.as_str());
        let html = format!(
            "<!DOCTYPE html>\n<html lang=\"de\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{title}</title>\n<style>\n{style}</style>\n</head>\n<body>\n\
             <h1>{title}</h1>\n{svg}\n</body>\n</html>\n",
            style = stylesheet(),
        );
        Ok(html.into_bytes())
    }
}
