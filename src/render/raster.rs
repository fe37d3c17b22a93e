//! PNG output: the boxed-label drawing rasterized with resvg

use std::sync::{Arc, OnceLock};

use usvg::fontdb;

use super::layout::LabelMetrics;
use super::svg::{Theme, draw_scene, to_markup};
use super::{BackendKind, Render, RenderMeta, Scene, defaults};
use crate::errors::RenderError;

#[derive(Debug, Clone, PartialEq)]
pub struct RasterBackend {
    pub width: u32,
    pub height: u32,
    pub margin: f64,
}

impl Default for RasterBackend {
    fn default() -> Self {
        RasterBackend {
            width: defaults::RASTER_WIDTH,
            height: defaults::RASTER_HEIGHT,
            margin: defaults::RASTER_MARGIN,
        }
    }
}

impl RasterBackend {
    fn theme(&self) -> Theme {
        Theme {
            width: self.width as f64,
            height: self.height as f64,
            margin: self.margin,
            ray_width: defaults::RASTER_RAY_WIDTH,
            transversal_width: defaults::RASTER_TRANSVERSAL_WIDTH,
            transversal_opacity: Some(defaults::RASTER_TRANSVERSAL_OPACITY),
            transversal_dash: None,
            point_radius: defaults::RASTER_POINT_RADIUS,
            labels: LabelMetrics {
                font_size: defaults::RASTER_FONT_SIZE,
                point_font_size: defaults::RASTER_POINT_FONT_SIZE,
                padding: defaults::BOX_PADDING,
                clearance: defaults::RASTER_LABEL_CLEARANCE,
            },
            boxed_labels: true,
            css_classes: false,
            grid_step: self.width as f64 / 36.0,
        }
    }
}

/// DejaVu Sans, so label text looks the same on every host
static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Font database shared by every raster render of the process
fn fonts() -> Arc<fontdb::Database> {
    static FONTS: OnceLock<Arc<fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = fontdb::Database::new();
            db.load_font_data(BUNDLED_FONT.to_vec());
            // Generic `sans-serif` resolves to the bundled face
            let family = db
                .faces()
                .next()
                .and_then(|face| face.families.first().map(|(name, _)| name.clone()));
            if let Some(family) = family {
                db.set_sans_serif_family(family);
            }
            crate::log::debug!(faces = db.len(), "font database loaded");
            Arc::new(db)
        })
        .clone()
}

fn svg_to_png(svg: &str, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
    svg_to_png_with(svg, width, height, fonts())
}

fn svg_to_png_with(
    svg: &str,
    width: u32,
    height: u32,
    fonts: Arc<fontdb::Database>,
) -> Result<Vec<u8>, RenderError> {
    // Without a face resvg drops every text node and the labels vanish silently
    if fonts.is_empty() {
        return Err(RenderError::Raster("no font face available for label text".to_string()));
    }
    let options = usvg::Options { fontdb: fonts, ..usvg::Options::default() };
    let tree = usvg::Tree::from_str(svg, &options).map_err(|e| RenderError::Raster(e.to_string()))?;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| RenderError::Raster(format!("cannot allocate a {width}x{height} pixmap")))?;
    pixmap.fill(tiny_skia::Color::WHITE);

    // The SVG is laid out at the pixmap size, so no scaling is needed
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

    pixmap.encode_png().map_err(|e| RenderError::Raster(e.to_string()))
}

impl Render for RasterBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Raster
    }

    fn render(&self, scene: &Scene<'_>, meta: &RenderMeta) -> Result<Vec<u8>, RenderError> {
        let svg = to_markup(&draw_scene(scene, meta, &self.theme())?)?;
        let png = svg_to_png(&svg, self.width, self.height)?;
        crate::log::debug!(width = self.width, height = self.height, bytes = png.len(), "rasterized");
        Ok(png)
    }
}
