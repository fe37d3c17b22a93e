//! GeoGebra `.ggb` archive: `geogebra.xml` plus an init script in a zip container

use std::io::{Cursor, Write};

use serde::Serialize;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::geogebra::{GgbConstruction, GgbLink, ggb_string};
use super::{BackendKind, BackgroundStyle, Render, RenderMeta, Scene, defaults};
use crate::errors::RenderError;
use crate::types::PtU;

#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveBackend {
    pub width: u32,
    pub height: u32,
}

impl Default for ArchiveBackend {
    fn default() -> Self {
        ArchiveBackend { width: defaults::GGB_WIDTH, height: defaults::GGB_HEIGHT }
    }
}

// ============================================================================
// geogebra.xml DOM
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename = "geogebra")]
struct GeogebraXml {
    #[serde(rename = "@format")]
    format: &'static str,
    #[serde(rename = "@version")]
    version: &'static str,
    #[serde(rename = "@app")]
    app: &'static str,
    #[serde(rename = "euclidianView")]
    euclidian_view: EuclidianView,
    construction: Construction,
}

#[derive(Debug, Serialize)]
struct EuclidianView {
    size: Size,
    #[serde(rename = "coordSystem")]
    coord_system: CoordSystemXml,
    #[serde(rename = "evSettings")]
    ev_settings: EvSettings,
}

#[derive(Debug, Serialize)]
struct Size {
    #[serde(rename = "@width")]
    width: u32,
    #[serde(rename = "@height")]
    height: u32,
}

#[derive(Debug, Serialize)]
struct CoordSystemXml {
    #[serde(rename = "@xZero", serialize_with = "super::svg::num")]
    x_zero: f64,
    #[serde(rename = "@yZero", serialize_with = "super::svg::num")]
    y_zero: f64,
    #[serde(rename = "@scale", serialize_with = "super::svg::num")]
    scale: f64,
    #[serde(rename = "@yscale", serialize_with = "super::svg::num")]
    yscale: f64,
}

#[derive(Debug, Serialize)]
struct EvSettings {
    #[serde(rename = "@axes")]
    axes: bool,
    #[serde(rename = "@grid")]
    grid: bool,
    #[serde(rename = "@gridIsBold")]
    grid_is_bold: bool,
    #[serde(rename = "@pointCapturing")]
    point_capturing: u32,
    #[serde(rename = "@gridType")]
    grid_type: u32,
}

#[derive(Debug, Serialize)]
struct Construction {
    #[serde(rename = "@title")]
    title: String,
    #[serde(rename = "$value")]
    items: Vec<ConstructionItem>,
}

#[derive(Debug, Serialize)]
enum ConstructionItem {
    #[serde(rename = "element")]
    Element(Element),
    #[serde(rename = "command")]
    Command(Command),
    #[serde(rename = "expression")]
    Expression(Expression),
}

#[derive(Debug, Serialize)]
struct Command {
    #[serde(rename = "@name")]
    name: &'static str,
    input: Args,
    output: Output,
}

#[derive(Debug, Serialize)]
struct Args {
    #[serde(rename = "@a0")]
    a0: String,
    #[serde(rename = "@a1")]
    a1: String,
}

#[derive(Debug, Serialize)]
struct Output {
    #[serde(rename = "@a0")]
    a0: String,
}

#[derive(Debug, Serialize)]
struct Expression {
    #[serde(rename = "@label")]
    label: String,
    #[serde(rename = "@exp")]
    exp: String,
}

#[derive(Debug, Default, Serialize)]
struct Element {
    #[serde(rename = "@type")]
    kind: &'static str,
    #[serde(rename = "@label")]
    label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    show: Option<Show>,
    #[serde(rename = "objColor", skip_serializing_if = "Option::is_none")]
    obj_color: Option<Color>,
    #[serde(rename = "bgColor", skip_serializing_if = "Option::is_none")]
    bg_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fixed: Option<Val<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    coords: Option<Coords>,
    #[serde(rename = "lineStyle", skip_serializing_if = "Option::is_none")]
    line_style: Option<LineStyle>,
    #[serde(rename = "pointSize", skip_serializing_if = "Option::is_none")]
    point_size: Option<Val<u32>>,
    #[serde(rename = "labelOffset", skip_serializing_if = "Option::is_none")]
    label_offset: Option<LabelOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    font: Option<Font>,
    #[serde(rename = "startPoint", skip_serializing_if = "Option::is_none")]
    start_point: Option<Coords>,
}

#[derive(Debug, Serialize)]
struct Show {
    #[serde(rename = "@object")]
    object: bool,
    #[serde(rename = "@label")]
    label: bool,
}

#[derive(Debug, Serialize)]
struct Color {
    #[serde(rename = "@r")]
    r: u8,
    #[serde(rename = "@g")]
    g: u8,
    #[serde(rename = "@b")]
    b: u8,
    #[serde(rename = "@alpha")]
    alpha: u8,
}

impl Color {
    fn rgb((r, g, b): (u8, u8, u8)) -> Self {
        Color { r, g, b, alpha: 0 }
    }

    fn opaque((r, g, b): (u8, u8, u8)) -> Self {
        Color { r, g, b, alpha: 255 }
    }
}

#[derive(Debug, Serialize)]
struct Val<T> {
    #[serde(rename = "@val")]
    val: T,
}

/// Homogeneous coordinates; for lines the coefficients of `x*X + y*Y + z = 0`
#[derive(Debug, Serialize)]
struct Coords {
    #[serde(rename = "@x", serialize_with = "super::svg::num")]
    x: f64,
    #[serde(rename = "@y", serialize_with = "super::svg::num")]
    y: f64,
    #[serde(rename = "@z", serialize_with = "super::svg::num")]
    z: f64,
}

impl Coords {
    fn point(p: PtU) -> Self {
        Coords { x: p.x.raw(), y: p.y.raw(), z: 1.0 }
    }

    fn line_through(p: PtU, q: PtU) -> Self {
        let (px, py, qx, qy) = (p.x.raw(), p.y.raw(), q.x.raw(), q.y.raw());
        Coords { x: py - qy, y: qx - px, z: px * qy - py * qx }
    }
}

#[derive(Debug, Serialize)]
struct LineStyle {
    #[serde(rename = "@thickness")]
    thickness: u32,
    #[serde(rename = "@type")]
    kind: u32,
    #[serde(rename = "@typeHidden")]
    type_hidden: u32,
}

#[derive(Debug, Serialize)]
struct LabelOffset {
    #[serde(rename = "@x")]
    x: i32,
    #[serde(rename = "@y")]
    y: i32,
}

#[derive(Debug, Serialize)]
struct Font {
    #[serde(rename = "@serif")]
    serif: bool,
    #[serde(rename = "@sizeM", serialize_with = "super::svg::num")]
    size_m: f64,
    #[serde(rename = "@size", serialize_with = "super::svg::num")]
    size: f64,
    /// 0 plain, 1 bold
    #[serde(rename = "@style")]
    style: u32,
}

fn link_items(
    command: &'static str,
    element: &'static str,
    link: &GgbLink,
    ends: (PtU, PtU),
    color: (u8, u8, u8),
    line_style: LineStyle,
) -> [ConstructionItem; 2] {
    [
        ConstructionItem::Command(Command {
            name: command,
            input: Args { a0: link.from.clone(), a1: link.to.clone() },
            output: Output { a0: link.name.to_string() },
        }),
        ConstructionItem::Element(Element {
            kind: element,
            label: link.name.to_string(),
            show: Some(Show { object: true, label: false }),
            obj_color: Some(Color::rgb(color)),
            fixed: Some(Val { val: true }),
            coords: Some(Coords::line_through(ends.0, ends.1)),
            line_style: Some(line_style),
            ..Element::default()
        }),
    ]
}

fn geogebra_xml(ggb: &GgbConstruction, scene: &Scene<'_>, meta: &RenderMeta) -> Result<String, RenderError> {
    let model = scene.model();
    let mut items = Vec::new();

    for p in &ggb.points {
        items.push(ConstructionItem::Element(Element {
            kind: "point",
            label: p.name.clone(),
            show: Some(Show { object: true, label: false }),
            obj_color: Some(Color::rgb(p.color)),
            fixed: Some(Val { val: true }),
            coords: Some(Coords::point(p.at)),
            point_size: Some(Val { val: defaults::GGB_POINT_SIZE }),
            label_offset: Some(LabelOffset { x: 0, y: 0 }),
            ..Element::default()
        }));
    }

    let ray_ends = [(model.apex, model.end_a), (model.apex, model.end_b)];
    for (ray, ends) in ggb.rays.iter().zip(ray_ends) {
        items.extend(link_items(
            "Segment",
            "segment",
            ray,
            ends,
            defaults::RAY_COLOR,
            LineStyle { thickness: defaults::GGB_RAY_THICKNESS, kind: 0, type_hidden: 1 },
        ));
    }

    let transversal_ends = [(model.first_a, model.first_b), (model.second_a, model.second_b)];
    for (line, ends) in ggb.transversals.iter().zip(transversal_ends) {
        items.extend(link_items(
            "Line",
            "line",
            line,
            ends,
            defaults::TRANSVERSAL_COLOR,
            LineStyle {
                thickness: defaults::GGB_TRANSVERSAL_THICKNESS,
                kind: defaults::GGB_DASHED,
                type_hidden: 1,
            },
        ));
    }

    for text in &ggb.texts {
        let literal = ggb_string(&text.text);
        items.push(ConstructionItem::Expression(Expression {
            label: text.name.clone(),
            exp: literal,
        }));
        items.push(ConstructionItem::Element(Element {
            kind: "text",
            label: text.name.clone(),
            show: Some(Show { object: true, label: true }),
            obj_color: Some(Color::rgb(text.color)),
            bg_color: text.unknown.then(|| Color::opaque(defaults::UNKNOWN_FILL)),
            fixed: Some(Val { val: true }),
            font: Some(Font {
                serif: false,
                size_m: 1.0,
                size: defaults::GGB_FONT_SIZE,
                style: u32::from(text.unknown),
            }),
            start_point: Some(Coords::point(text.start)),
            ..Element::default()
        }));
    }

    let doc = GeogebraXml {
        format: "5.0",
        version: "5.0",
        app: "classic",
        euclidian_view: EuclidianView {
            size: Size { width: ggb.coords.width as u32, height: ggb.coords.height as u32 },
            coord_system: CoordSystemXml {
                x_zero: ggb.coords.x_zero,
                y_zero: ggb.coords.y_zero,
                scale: ggb.coords.scale,
                yscale: ggb.coords.scale,
            },
            ev_settings: EvSettings {
                axes: false,
                grid: meta.background == BackgroundStyle::Grid,
                grid_is_bold: false,
                point_capturing: 3,
                grid_type: 3,
            },
        },
        construction: Construction { title: meta.title.clone(), items },
    };

    let body = quick_xml::se::to_string(&doc).map_err(|e| RenderError::Markup(e.to_string()))?;
    Ok(format!("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n{body}"))
}

const INIT_SCRIPT: &str = "function ggbOnInit() {}";

/// Zip the two entries with fixed timestamps so equal input gives equal bytes
fn package(xml: &str) -> Result<Vec<u8>, RenderError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    for (name, contents) in [("geogebra_javascript.js", INIT_SCRIPT), ("geogebra.xml", xml)] {
        zip.start_file(name, options)?;
        zip.write_all(contents.as_bytes())
            .map_err(|e| RenderError::Archive(zip::result::ZipError::Io(e)))?;
    }
    Ok(zip.finish()?.into_inner())
}

impl Render for ArchiveBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Archive
    }

    fn render(&self, scene: &Scene<'_>, meta: &RenderMeta) -> Result<Vec<u8>, RenderError> {
        let ggb = GgbConstruction::build(scene, meta, self.width, self.height)?;
        let xml = geogebra_xml(&ggb, scene, meta)?;
        crate::log::debug!(xml_bytes = xml.len(), "built geogebra.xml");
        package(&xml)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::geometry::compute;
    use crate::labels::plan;

    fn render_first(meta: &RenderMeta) -> Vec<u8> {
        let spec = crate::catalog::tasks().remove(0);
        let model = compute(&spec);
        let plan = plan(&spec, &model);
        let scene = Scene::new(&model, &plan).unwrap();
        ArchiveBackend::default().render(&scene, meta).unwrap()
    }

    fn entry(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn archive_holds_xml_and_script() {
        let bytes = render_first(&RenderMeta::new("Aufgabe 1"));
        let xml = entry(&bytes, "geogebra.xml");
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<geogebra format=\"5.0\""));
        assert_eq!(entry(&bytes, "geogebra_javascript.js"), INIT_SCRIPT);
        assert!(xml.contains("<construction title=\"Aufgabe 1\">"));
    }

    #[test]
    fn construction_vocabulary() {
        let xml = entry(&render_first(&RenderMeta::new("t")), "geogebra.xml");
        assert_eq!(xml.matches("<element type=\"point\"").count(), 7);
        assert_eq!(xml.matches("<command name=\"Segment\">").count(), 2);
        assert_eq!(xml.matches("<command name=\"Line\">").count(), 2);
        assert_eq!(xml.matches("<element type=\"text\"").count(), 11);
        assert!(xml.contains("<input a0=\"Z\" a1=\"P1\"/>"));
        assert!(xml.contains("<coords x=\"2\" y=\"15\" z=\"1\"/>"));
        assert!(xml.contains("type=\"15\""));
        assert_eq!(xml.matches("<bgColor").count(), 1);
        assert!(xml.contains("<evSettings axes=\"false\" grid=\"false\""));
    }

    #[test]
    fn archives_are_reproducible() {
        let meta = RenderMeta::new("t").with_background(BackgroundStyle::Grid);
        assert_eq!(render_first(&meta), render_first(&meta));
        let xml = entry(&render_first(&meta), "geogebra.xml");
        assert!(xml.contains("grid=\"true\""));
    }

    #[test]
    fn line_coefficients_pass_through_both_points() {
        let (p, q) = (PtU::units(1.0, 2.0), PtU::units(4.0, -3.0));
        let c = Coords::line_through(p, q);
        for r in [p, q] {
            assert!((c.x * r.x.raw() + c.y * r.y.raw() + c.z).abs() < 1e-12);
        }
    }
}
