//! Mapping from construction units (Y up) to pixels (Y down)

use glam::{DVec2, dvec2};

use crate::errors::RenderError;
use crate::types::{BoxU, Length, PtU, Scaler};

/// Uniform fit of a bounding box into a pixel canvas, centred, with a margin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    scaler: Scaler,
    min_x: Length,
    max_y: Length,
    offset: DVec2,
}

impl Viewport {
    pub fn fit(bounds: BoxU, width: f64, height: f64, margin: f64) -> Result<Viewport, RenderError> {
        if bounds.is_empty() || !bounds.is_finite() {
            return Err(RenderError::InvalidBounds { what: "construction bounds".to_string() });
        }

        // Thin or point-like constructions still get a usable scale
        let min_dim = Length(0.01);
        let content_w = bounds.width().max(min_dim);
        let content_h = bounds.height().max(min_dim);

        let avail_w = (width - 2.0 * margin).max(1.0);
        let avail_h = (height - 2.0 * margin).max(1.0);
        let r_scale = (avail_w / content_w.raw()).min(avail_h / content_h.raw());
        let scaler = Scaler::new(r_scale).ok_or_else(|| RenderError::InvalidBounds {
            what: format!("viewport scale {r_scale}"),
        })?;

        // Centre the drawing in the leftover space
        let offset = dvec2(
            (width - scaler.px(bounds.width())) / 2.0,
            (height - scaler.px(bounds.height())) / 2.0,
        );

        crate::log::debug!(
            bounds_min_x = bounds.min.x.0,
            bounds_min_y = bounds.min.y.0,
            bounds_max_x = bounds.max.x.0,
            bounds_max_y = bounds.max.y.0,
            r_scale,
            "viewport fit"
        );

        Ok(Viewport {
            scaler,
            min_x: bounds.min.x,
            max_y: bounds.max.y,
            offset,
        })
    }

    /// Pixel position of a construction point
    pub fn to_px(&self, p: PtU) -> DVec2 {
        self.offset + dvec2(self.scaler.px(p.x - self.min_x), self.scaler.px(self.max_y - p.y))
    }

    /// Pixels per construction unit
    pub fn scale(&self) -> f64 {
        self.scaler.r_scale
    }

    /// Construction point shown at pixel `px`
    pub fn to_units(&self, px: DVec2) -> PtU {
        let d = px - self.offset;
        PtU {
            x: self.min_x + Length(d.x / self.scaler.r_scale),
            y: self.max_y - Length(d.y / self.scaler.r_scale),
        }
    }
}
