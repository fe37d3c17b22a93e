//! Output backends for a computed construction
//!
//! This module is organized into submodules:
//! - `defaults`: Default sizes, colours and settings
//! - `viewport`: Construction units to pixels
//! - `layout`: Label boxes pushed clear of their lines, in pixels
//! - `svg`: SVG DOM, scene drawing and number formatting
//! - `geogebra`: Construction description shared by the GeoGebra backends
//! - `raster`, `page`, `applet`, `archive`: the four backends

pub mod applet;
pub mod archive;
pub mod defaults;
mod geogebra;
pub(crate) mod layout;
pub mod page;
pub mod raster;
pub mod svg;
pub mod viewport;

use std::collections::HashSet;
use std::path::Path;

use enum_dispatch::enum_dispatch;

pub use applet::AppletBackend;
pub use archive::ArchiveBackend;
pub use page::VectorPageBackend;
pub use raster::RasterBackend;
pub use viewport::Viewport;

use crate::errors::RenderError;
use crate::geometry::GeometricModel;
use crate::labels::{Label, LabelPlan, LabelTarget};
use crate::task::PointRole;
use crate::types::{BoxU, Length, PtU, UnitVec};

/// Proportional widths of printable ASCII, in hundredths of an average character.
#[rustfmt::skip]
pub const AW_CHAR: [u8; 95] = [
    45,  55,  62, 115,  90, 132, 125,  40,
    55,  55,  71, 115,  45,  48,  45,  50,
    91,  91,  91,  91,  91,  91,  91,  91,
    91,  91,  50,  50, 120, 120, 120,  78,
   142, 102, 105, 110, 115, 105,  98, 105,
   125,  58,  58, 107,  95, 145, 125, 115,
    95, 115, 107,  95,  97, 118, 102, 150,
   100,  93, 100,  58,  50,  58, 119,  72,
    72,  86,  92,  80,  92,  85,  52,  92,
    92,  47,  47,  88,  48, 135,  92,  86,
    92,  92,  69,  75,  58,  92,  80, 121,
    81,  80,  76,  91,  49,  91, 118,
];

/// Text length in hundredths of an average character.
pub fn text_length(text: &str) -> u32 {
    text.chars()
        .map(|c| {
            if (' '..='~').contains(&c) {
                AW_CHAR[(c as usize) - 0x20] as u32
            } else {
                100
            }
        })
        .sum()
}

/// Estimated rendered width of `text` at `font_size` (same unit as the result)
pub fn text_width(text: &str, font_size: f64) -> f64 {
    text_length(text) as f64 * 0.01 * defaults::CHARWID * font_size
}

// ============================================================================
// Backend selection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Raster,
    VectorPage,
    Applet,
    Archive,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Raster,
        BackendKind::VectorPage,
        BackendKind::Applet,
        BackendKind::Archive,
    ];

    /// File name suffix, including the dot
    pub fn extension(self) -> &'static str {
        match self {
            BackendKind::Raster => ".png",
            BackendKind::VectorPage => ".html",
            BackendKind::Applet => ".applet.html",
            BackendKind::Archive => ".ggb",
        }
    }

    /// Short name used on the command line
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Raster => "raster",
            BackendKind::VectorPage => "page",
            BackendKind::Applet => "applet",
            BackendKind::Archive => "archive",
        }
    }

    pub fn from_name(name: &str) -> Option<BackendKind> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// Common interface of all output backends
#[enum_dispatch]
pub trait Render {
    fn kind(&self) -> BackendKind;

    /// Produce the complete artifact in memory
    fn render(&self, scene: &Scene<'_>, meta: &RenderMeta) -> Result<Vec<u8>, RenderError>;
}

/// A configured backend, chosen at call time
#[enum_dispatch(Render)]
#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    Raster(RasterBackend),
    VectorPage(VectorPageBackend),
    Applet(AppletBackend),
    Archive(ArchiveBackend),
}

impl Backend {
    /// The backend of `kind` with its default settings
    pub fn for_kind(kind: BackendKind) -> Backend {
        match kind {
            BackendKind::Raster => RasterBackend::default().into(),
            BackendKind::VectorPage => VectorPageBackend::default().into(),
            BackendKind::Applet => AppletBackend::default().into(),
            BackendKind::Archive => ArchiveBackend::default().into(),
        }
    }

    pub fn extension(&self) -> &'static str {
        self.kind().extension()
    }
}

// ============================================================================
// Per-render settings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundStyle {
    #[default]
    Plain,
    Grid,
}

/// Choices that apply to one rendered artifact
#[derive(Debug, Clone, PartialEq)]
pub struct RenderMeta {
    pub title: String,
    pub background: BackgroundStyle,
    /// How far each transversal extends past its points, in construction units
    pub transversal_overhang: f64,
}

impl RenderMeta {
    pub fn new(title: impl Into<String>) -> Self {
        RenderMeta {
            title: title.into(),
            background: BackgroundStyle::Plain,
            transversal_overhang: defaults::TRANSVERSAL_OVERHANG,
        }
    }

    pub fn with_background(mut self, background: BackgroundStyle) -> Self {
        self.background = background;
        self
    }
}

// ============================================================================
// Scene
// ============================================================================

/// A model and a plan known to belong together.
///
/// This is the only input a backend sees.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    model: &'a GeometricModel,
    plan: &'a LabelPlan,
}

impl<'a> Scene<'a> {
    /// Check that `plan` labels `model` completely and that every coordinate is finite
    pub fn new(model: &'a GeometricModel, plan: &'a LabelPlan) -> Result<Self, RenderError> {
        let mut seen = HashSet::new();
        for label in plan.labels() {
            if !seen.insert(label.target) {
                return Err(RenderError::DuplicateLabel { target: label.target });
            }
        }
        let points = plan
            .points
            .iter()
            .filter(|label| matches!(label.target, LabelTarget::Point(_)))
            .count();
        if points != PointRole::ALL.len() || plan.points.len() != points {
            return Err(RenderError::MismatchedPlan {
                expected: PointRole::ALL.len(),
                found: plan.points.len(),
            });
        }

        for (role, p) in model.points() {
            if !p.is_finite() {
                return Err(RenderError::InvalidBounds { what: format!("point {role}") });
            }
        }
        for label in plan.labels() {
            if !label.anchor.is_finite() {
                return Err(RenderError::InvalidBounds { what: format!("label for {}", label.target) });
            }
        }

        Ok(Scene { model, plan })
    }

    pub fn model(&self) -> &'a GeometricModel {
        self.model
    }

    pub fn plan(&self) -> &'a LabelPlan {
        self.plan
    }

    pub fn labels(&self) -> impl Iterator<Item = &'a Label> {
        self.plan.labels()
    }

    /// Label of a point; present for every role once the scene is built
    pub fn point_label(&self, role: PointRole) -> Option<&'a Label> {
        self.plan
            .points
            .iter()
            .find(|label| label.target == LabelTarget::Point(role))
    }

    /// The two transversals, each extended by `overhang` at both ends
    pub fn transversals(&self, overhang: f64) -> [(PtU, PtU); 2] {
        let m = self.model;
        [(m.first_a, m.first_b), (m.second_a, m.second_b)].map(|(a, b)| {
            let d = b - a;
            match UnitVec::normalized(d.dx.raw(), d.dy.raw()) {
                Some(dir) => (a + (-dir) * Length(overhang), b + dir * Length(overhang)),
                None => (a, b),
            }
        })
    }

    /// Points and lines that get drawn, in construction units.
    ///
    /// Label boxes are sized in pixels and added by the layout step.
    pub fn bounds(&self, meta: &RenderMeta) -> BoxU {
        let mut bounds = self.model.bounds();
        for (a, b) in self.transversals(meta.transversal_overhang) {
            bounds.expand_point(a);
            bounds.expand_point(b);
        }
        bounds
    }
}

/// Render one artifact and write it to `dest`. Returns the number of bytes written.
pub fn render_to(
    backend: &Backend,
    model: &GeometricModel,
    plan: &LabelPlan,
    meta: &RenderMeta,
    dest: &Path,
) -> Result<usize, RenderError> {
    let scene = Scene::new(model, plan)?;
    let bytes = backend.render(&scene, meta)?;
    std::fs::write(dest, &bytes).map_err(|source| RenderError::ArtifactWrite {
        path: dest.to_path_buf(),
        source,
    })?;
    crate::log::debug!(path = %dest.display(), bytes = bytes.len(), "wrote artifact");
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::compute;
    use crate::labels::plan;
    use crate::task::TaskSpec;

    fn sample() -> (GeometricModel, LabelPlan) {
        let spec = crate::catalog::tasks().remove(0);
        let model = compute(&spec);
        let plan = plan(&spec, &model);
        (model, plan)
    }

    #[test]
    fn text_width_grows_with_text() {
        assert!(text_width("15 cm", 20.0) > text_width("x", 20.0));
        assert_eq!(text_length("0"), 91);
        assert_eq!(text_length("ä"), 100);
    }

    #[test]
    fn extensions_do_not_collide() {
        let exts: HashSet<_> = BackendKind::ALL.iter().map(|k| k.extension()).collect();
        assert_eq!(exts.len(), 4);
        for kind in BackendKind::ALL {
            assert_eq!(BackendKind::from_name(kind.name()), Some(kind));
            assert_eq!(Backend::for_kind(kind).kind(), kind);
        }
    }

    #[test]
    fn scene_accepts_a_matching_plan() {
        let (model, plan) = sample();
        let scene = Scene::new(&model, &plan).unwrap();
        assert!(scene.point_label(PointRole::Apex).is_some());
        assert_eq!(scene.labels().count(), plan.segments.len() + 7);
    }

    #[test]
    fn scene_rejects_missing_point_labels() {
        let (model, mut plan) = sample();
        plan.points.pop();
        let err = Scene::new(&model, &plan).unwrap_err();
        assert!(matches!(err, RenderError::MismatchedPlan { expected: 7, found: 6 }));
    }

    #[test]
    fn scene_rejects_duplicate_labels() {
        let (model, mut plan) = sample();
        let dup = plan.segments[0].clone();
        plan.segments.push(dup);
        let err = Scene::new(&model, &plan).unwrap_err();
        assert!(matches!(err, RenderError::DuplicateLabel { .. }));
    }

    #[test]
    fn scene_rejects_non_finite_points() {
        let spec = TaskSpec::new(f64::NAN, 25.0, 15.0, 0.35, 0.7);
        let model = compute(&spec);
        let plan = plan(&spec, &model);
        let err = Scene::new(&model, &plan).unwrap_err();
        assert!(matches!(err, RenderError::InvalidBounds { .. }));
    }

    #[test]
    fn transversals_are_extended() {
        let (model, plan) = sample();
        let scene = Scene::new(&model, &plan).unwrap();
        let [(a, b), _] = scene.transversals(1.0);
        let plain = model.first_a.distance(model.first_b).raw();
        assert!((a.distance(b).raw() - plain - 2.0).abs() < 1e-9);
    }

    #[test]
    fn render_to_reports_unwritable_destination() {
        let (model, plan) = sample();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing").join("out.html");
        let backend = Backend::for_kind(BackendKind::VectorPage);
        let err = render_to(&backend, &model, &plan, &RenderMeta::new("t"), &dest).unwrap_err();
        assert!(err.is_write_failure());
    }
}
