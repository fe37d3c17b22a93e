use camino::Utf8Path;
use regex_lite::Regex;
use std::io::{Cursor, Read};
use strahlensatz::{Backend, BackendKind, TaskSpec, geometry, labels, render_task, tasks_from_json};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

type TestResult<T = ()> = datatest_stable::Result<T>;

// =============================================================================
// Label text extraction, one per backend
// =============================================================================

/// Texts of all `<text>` elements in an SVG page
fn page_texts(html: &str) -> TestResult<Vec<String>> {
    let re = Regex::new(r"<text[^>]*>([^<]*)</text>")?;
    re.captures_iter(html)
        .map(|caps| -> TestResult<String> {
            Ok(quick_xml::escape::unescape(&caps[1])?.into_owned())
        })
        .collect()
}

/// Text shown by a GeoGebra string expression: quoted parts joined by quote characters
fn ggb_text(expr: &str) -> TestResult<String> {
    let parts = expr
        .split(" + UnicodeToLetter(34) + ")
        .map(|part| {
            part.strip_prefix('"')
                .and_then(|p| p.strip_suffix('"'))
                .ok_or_else(|| format!("not a string literal: {part}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join("\""))
}

/// Texts created by `Text(...)` commands in an applet page
fn applet_texts(html: &str) -> TestResult<Vec<String>> {
    let call = Regex::new(r#"api\.evalCommand\((".*")\);"#)?;
    let text = Regex::new(r#"^\w+ = Text\((".*"), \([^()]*\)\)$"#)?;
    let mut texts: Vec<String> = Vec::new();
    for caps in call.captures_iter(html) {
        let command: String = serde_json::from_str(&caps[1].replace("<\\/", "</"))?;
        if let Some(inner) = text.captures(&command) {
            texts.push(ggb_text(&inner[1])?);
        }
    }
    Ok(texts)
}

/// Construction XML from a .ggb archive
fn archive_xml(bytes: &[u8]) -> TestResult<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name("geogebra.xml")?.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Texts defined by `<expression>` elements in geogebra.xml
fn archive_texts(xml: &str) -> TestResult<Vec<String>> {
    let re = Regex::new(r#"<expression label="[^"]*" exp="([^"]*)""#)?;
    re.captures_iter(xml)
        .map(|caps| -> TestResult<String> {
            ggb_text(&quick_xml::escape::unescape(&caps[1])?)
        })
        .collect()
}

fn sorted(mut texts: Vec<String>) -> Vec<String> {
    texts.sort();
    texts
}

// =============================================================================
// Fixture driver
// =============================================================================

fn check_task(spec: &TaskSpec, number: usize) -> TestResult {
    let model = geometry::compute(spec);
    let plan = labels::plan(spec, &model);
    let expected = sorted(plan.labels().map(|l| l.text.clone()).collect());
    let unknowns = plan.unknown_segments().count();

    for kind in BackendKind::ALL {
        let bytes = render_task(spec, number, &Backend::for_kind(kind))?;
        if bytes.is_empty() {
            return Err(format!("{} produced no output", kind.name()).into());
        }

        let found = match kind {
            BackendKind::Raster => {
                if !bytes.starts_with(PNG_MAGIC) {
                    return Err("raster output is not a PNG".into());
                }
                continue;
            }
            BackendKind::VectorPage => {
                let html = String::from_utf8(bytes)?;
                let circles = html.matches("<circle").count();
                if circles != 7 {
                    return Err(format!("page has {circles} points, expected 7").into());
                }
                let marked = html.matches("class=\"unknown\"").count();
                if marked != unknowns {
                    return Err(format!("page marks {marked} unknowns, expected {unknowns}").into());
                }
                page_texts(&html)?
            }
            BackendKind::Applet => applet_texts(&String::from_utf8(bytes)?)?,
            BackendKind::Archive => {
                let xml = archive_xml(&bytes)?;
                let points = xml.matches("<element type=\"point\"").count();
                if points != 7 {
                    return Err(format!("archive has {points} points, expected 7").into());
                }
                archive_texts(&xml)?
            }
        };

        let found = sorted(found);
        if found != expected {
            return Err(format!(
                "{} labels differ from the plan\n  expected: {expected:?}\n  found:    {found:?}",
                kind.name()
            )
            .into());
        }
    }
    Ok(())
}

fn test_fixture(path: &Utf8Path) -> datatest_stable::Result<()> {
    let json = std::fs::read_to_string(path)?;
    let specs = tasks_from_json(&json)?;
    if specs.is_empty() {
        return Err(format!("{path} contains no tasks").into());
    }
    for (i, spec) in specs.iter().enumerate() {
        check_task(spec, i + 1).map_err(|e| format!("{path} task {}: {e}", i + 1))?;
    }
    Ok(())
}

datatest_stable::harness! {
    { test = test_fixture, root = "tests/fixtures", pattern = r"\.json$" },
}
