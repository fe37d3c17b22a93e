//! Default sizes, colours and settings shared by the backends

// Label layout (construction units, relative to ray length)
pub const SEGMENT_GAP_FRACTION: f64 = 0.055;
pub const POINT_GAP_FRACTION: f64 = 0.04;
pub const MIN_GAP: f64 = 0.5;

// Label boxes (fractions of the font size)
pub const BOX_PADDING: f64 = 0.35;
pub const TEXT_PADDING: f64 = 0.15;

// Colours as (r, g, b)
pub const RAY_COLOR: (u8, u8, u8) = (0, 0, 0);
pub const TRANSVERSAL_COLOR: (u8, u8, u8) = (0, 0, 255);
pub const POINT_COLOR: (u8, u8, u8) = (0, 0, 0);
pub const TRANSVERSAL_POINT_COLOR: (u8, u8, u8) = (0, 0, 139);
pub const KNOWN_COLOR: (u8, u8, u8) = (0, 100, 0);
pub const UNKNOWN_COLOR: (u8, u8, u8) = (255, 0, 0);
pub const UNKNOWN_FILL: (u8, u8, u8) = (255, 228, 225);
pub const KNOWN_BORDER: (u8, u8, u8) = (160, 160, 160);
pub const GRID_COLOR: (u8, u8, u8) = (225, 225, 225);

/// Extension of each transversal beyond its two points, in construction units
pub const TRANSVERSAL_OVERHANG: f64 = 1.5;

// Raster backend (pixels)
pub const RASTER_WIDTH: u32 = 1800;
pub const RASTER_HEIGHT: u32 = 1200;
pub const RASTER_MARGIN: f64 = 110.0;
pub const RASTER_RAY_WIDTH: f64 = 6.0;
pub const RASTER_TRANSVERSAL_WIDTH: f64 = 5.0;
pub const RASTER_TRANSVERSAL_OPACITY: f64 = 0.55;
pub const RASTER_POINT_RADIUS: f64 = 9.0;
pub const RASTER_FONT_SIZE: f64 = 34.0;
pub const RASTER_POINT_FONT_SIZE: f64 = 30.0;
pub const RASTER_LABEL_CLEARANCE: f64 = 12.0;

// Vector page backend (viewBox units)
pub const PAGE_SIZE: u32 = 600;
pub const PAGE_MARGIN: f64 = 48.0;
pub const PAGE_RAY_WIDTH: f64 = 2.0;
pub const PAGE_TRANSVERSAL_WIDTH: f64 = 1.5;
pub const PAGE_DASH: &str = "6 4";
pub const PAGE_POINT_RADIUS: f64 = 3.5;
pub const PAGE_FONT_SIZE: f64 = 15.0;
pub const PAGE_LABEL_CLEARANCE: f64 = 5.0;
pub const PAGE_GRID_STEP: f64 = 20.0;

// GeoGebra backends (pixels of the applet view)
pub const GGB_WIDTH: u32 = 800;
pub const GGB_HEIGHT: u32 = 600;
pub const GGB_MARGIN: f64 = 60.0;
pub const GGB_RAY_THICKNESS: u32 = 5;
pub const GGB_TRANSVERSAL_THICKNESS: u32 = 3;
/// Dashed line style in `geogebra.xml`
pub const GGB_DASHED: u32 = 15;
/// Dashed line style as numbered by the applet API
pub const GGB_API_DASHED: u32 = 1;
pub const GGB_POINT_SIZE: u32 = 4;
pub const GGB_FONT_SIZE: f64 = 16.0;
pub const GGB_LABEL_CLEARANCE: f64 = 6.0;
pub const GGB_SCRIPT_URL: &str = "https://www.geogebra.org/apps/deployggb.js";

/// Average character width relative to the font size (0.08in at a 0.14in font)
pub const CHARWID: f64 = 0.08 / 0.14;
