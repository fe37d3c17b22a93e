//! HTML page that builds the construction through the GeoGebra applet API

use std::fmt::Write as _;

use quick_xml::escape::escape;
use serde_json::json;

use super::geogebra::{GgbConstruction, ggb_string};
use super::svg::fmt_num;
use super::{BackendKind, BackgroundStyle, Render, RenderMeta, Scene, defaults};
use crate::errors::RenderError;

#[derive(Debug, Clone, PartialEq)]
pub struct AppletBackend {
    pub width: u32,
    pub height: u32,
    /// Location of `deployggb.js`
    pub script_url: String,
}

impl Default for AppletBackend {
    fn default() -> Self {
        AppletBackend {
            width: defaults::GGB_WIDTH,
            height: defaults::GGB_HEIGHT,
            script_url: defaults::GGB_SCRIPT_URL.to_string(),
        }
    }
}

/// A JavaScript string literal
fn js(s: &str) -> String {
    // serde_json output is a valid JS literal; only `</` must not close the script tag
    serde_json::Value::from(s).to_string().replace("</", "<\\/")
}

/// The `evalCommand` strings and the styling calls that follow them
fn script(ggb: &GgbConstruction, meta: &RenderMeta) -> String {
    let mut out = String::new();
    let mut command = |cmd: String| {
        let _ = writeln!(out, "      api.evalCommand({});", js(&cmd));
    };

    for p in &ggb.points {
        command(format!("{} = ({}, {})", p.name, fmt_num(p.at.x.raw()), fmt_num(p.at.y.raw())));
    }
    for ray in &ggb.rays {
        command(format!("{} = Segment({}, {})", ray.name, ray.from, ray.to));
    }
    for line in &ggb.transversals {
        command(format!("{} = Line({}, {})", line.name, line.from, line.to));
    }
    for text in &ggb.texts {
        let literal = ggb_string(&text.text);
        command(format!(
            "{} = Text({}, ({}, {}))",
            text.name,
            literal,
            fmt_num(text.start.x.raw()),
            fmt_num(text.start.y.raw())
        ));
    }

    let mut style = String::new();
    let mut call = |method: &str, name: &str, args: &str| {
        let _ = writeln!(style, "      api.{method}({}{args});", js(name));
    };
    for p in &ggb.points {
        let (r, g, b) = p.color;
        call("setColor", &p.name, &format!(", {r}, {g}, {b}"));
        call("setPointSize", &p.name, &format!(", {}", defaults::GGB_POINT_SIZE));
        call("setLabelVisible", &p.name, ", false");
        call("setFixed", &p.name, ", true");
    }
    for ray in &ggb.rays {
        let (r, g, b) = defaults::RAY_COLOR;
        call("setColor", ray.name, &format!(", {r}, {g}, {b}"));
        call("setLineThickness", ray.name, &format!(", {}", defaults::GGB_RAY_THICKNESS));
        call("setLabelVisible", ray.name, ", false");
        call("setFixed", ray.name, ", true");
    }
    for line in &ggb.transversals {
        let (r, g, b) = defaults::TRANSVERSAL_COLOR;
        call("setColor", line.name, &format!(", {r}, {g}, {b}"));
        call("setLineThickness", line.name, &format!(", {}", defaults::GGB_TRANSVERSAL_THICKNESS));
        call("setLineStyle", line.name, &format!(", {}", defaults::GGB_API_DASHED));
        call("setLabelVisible", line.name, ", false");
        call("setFixed", line.name, ", true");
    }
    for text in &ggb.texts {
        let (r, g, b) = text.color;
        call("setColor", &text.name, &format!(", {r}, {g}, {b}"));
        call("setFixed", &text.name, ", true");
    }

    let c = &ggb.coords;
    let _ = writeln!(
        out,
        "      api.setCoordSystem({}, {}, {}, {});",
        fmt_num(c.x_min()),
        fmt_num(c.x_max()),
        fmt_num(c.y_min()),
        fmt_num(c.y_max())
    );
    let grid = meta.background == BackgroundStyle::Grid;
    let _ = writeln!(out, "      api.setGridVisible({grid});");
    let _ = writeln!(out, "      api.setAxesVisible(false, false);");
    out + &style
}

impl Render for AppletBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Applet
    }

    fn render(&self, scene: &Scene<'_>, meta: &RenderMeta) -> Result<Vec<u8>, RenderError> {
        let ggb = GgbConstruction::build(scene, meta, self.width, self.height)?;
        let params = json!({
            "appName": "classic",
            "width": self.width,
            "height": self.height,
            "showToolBar": false,
            "showAlgebraInput": false,
            "showMenuBar": false,
            "enableRightClick": false,
            "enableShiftDragZoom": true,
            "showResetIcon": true,
        });
        let params = params.to_string().replace("</", "<\\/");
        let title = escape(meta.title.as_str());

        let html = format!(
            "<!DOCTYPE html>\n<html lang=\"de\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{title}</title>\n<script src=\"{src}\"></script>\n</head>\n<body>\n\
             <h1>{title}</h1>\n<div id=\"ggb-element\"></div>\n<script>\n\
             const params = {params};\n\
             params.appletOnLoad = function (api) {{\n{commands}    }};\n\
             const applet = new GGBApplet(params, true);\n\
             window.addEventListener(\"load\", function () {{\n\
             applet.inject(\"ggb-element\");\n\
             }});\n</script>\n</body>\n</html>\n",
            src = escape(self.script_url.as_str()),
            commands = script(&ggb, meta),
        );
        Ok(html.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::compute;
    use crate::labels::plan;

    fn render_first() -> String {
        let spec = crate::catalog::tasks().remove(0);
        let model = compute(&spec);
        let plan = plan(&spec, &model);
        let scene = Scene::new(&model, &plan).unwrap();
        let bytes = AppletBackend::default().render(&scene, &RenderMeta::new("Aufgabe 1")).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn page_loads_the_applet() {
        let html = render_first();
        assert!(html.contains("<script src=\"https://www.geogebra.org/apps/deployggb.js\"></script>"));
        assert!(html.contains("new GGBApplet(params, true)"));
        assert!(html.contains("applet.inject(\"ggb-element\")"));
        assert!(html.contains("\"width\":800"));
    }

    #[test]
    fn commands_build_the_construction() {
        let html = render_first();
        assert!(html.contains("api.evalCommand(\"Z = (2, 15)\");"));
        assert!(html.contains("api.evalCommand(\"rayA = Segment(Z, P1)\");"));
        assert!(html.contains("api.evalCommand(\"parallel1 = Line(A, A')\");"));
        assert_eq!(html.matches("= Text(").count(), 4 + 7);
        assert!(html.contains("Text(\\\"x\\\", ("));
        assert!(html.contains("api.setLineStyle(\"parallel1\", 1);"));
    }

    #[test]
    fn unknown_text_is_red() {
        let html = render_first();
        let unknown = html
            .lines()
            .find(|l| l.contains("Text(\\\"x\\\""))
            .and_then(|l| l.split_once(" = "))
            .map(|(lhs, _)| lhs.trim().trim_start_matches("api.evalCommand(\"").to_string())
            .unwrap();
        assert!(html.contains(&format!("api.setColor(\"{unknown}\", 255, 0, 0);")));
    }

    #[test]
    fn script_literals_cannot_close_the_tag() {
        assert_eq!(js("a</script>"), "\"a<\\/script>\"");
    }
}
