//! Error types with diagnostics using miette
//!
//! Three families, matching where things can go wrong:
//! - [`SpecError`]: a task description could not be normalised
//! - [`Degeneracy`]: a task is well-formed but geometrically degenerate (warning only)
//! - [`RenderError`]: a backend could not produce or write its artifact

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::labels::LabelTarget;
use crate::task::SegmentSlot;
use crate::types::Angle;

// ============================================================================
// Task Errors
// ============================================================================

/// Errors that occur while normalising raw task input
#[derive(Error, Diagnostic, Debug)]
pub enum SpecError {
    #[error("invalid measurement {value:?} for segment {slot}")]
    #[diagnostic(
        code(strahlensatz::spec::invalid_measurement),
        help("use a number, a numeric string, or a single-letter unknown marker such as \"x\"")
    )]
    InvalidMeasurement { slot: SegmentSlot, value: String },

    #[error("unknown slot index {index} is out of range")]
    #[diagnostic(
        code(strahlensatz::spec::unknown_slot_out_of_range),
        help("segment slots are numbered 0 to 5")
    )]
    UnknownSlotOutOfRange { index: usize },

    #[error("unknown_index selects segment {index}, but segment {marked} also carries an unknown marker")]
    #[diagnostic(
        code(strahlensatz::spec::conflicting_unknowns),
        help("with unknown_index every other segment must be a known value")
    )]
    ConflictingUnknowns { index: SegmentSlot, marked: SegmentSlot },

    #[error("unknown segment key {key:?}")]
    #[diagnostic(
        code(strahlensatz::spec::unknown_segment_key),
        help("keys are ZA, AB, BP, ZA_strich, AB_strich and BP_strich")
    )]
    UnknownSegmentKey { key: String },

    #[error("a task has six segments, got {count} measurements")]
    #[diagnostic(code(strahlensatz::spec::too_many_measurements))]
    TooManyMeasurements { count: usize },

    #[error("expected seven point labels, got {count}")]
    #[diagnostic(
        code(strahlensatz::spec::wrong_label_count),
        help("order: apex, first on A, first on B, second on A, second on B, end of A, end of B")
    )]
    WrongLabelCount { count: usize },

    #[error("task name {name:?} cannot be used as a file name")]
    #[diagnostic(
        code(strahlensatz::spec::invalid_task_name),
        help("use a plain file stem without path separators, such as \"leiter\"")
    )]
    InvalidTaskName { name: String },

    #[error("invalid task file")]
    #[diagnostic(code(strahlensatz::spec::json))]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Construction Warnings
// ============================================================================

/// A well-formed task whose construction is degenerate.
///
/// The geometry engine still produces points for these; they are reported so
/// a caller can decide whether to publish the exercise.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum Degeneracy {
    #[error("{which} = {value} lies outside (0, 1)")]
    #[diagnostic(code(strahlensatz::construction::fraction_out_of_range), severity(Warning))]
    FractionOutOfRange { which: &'static str, value: f64 },

    #[error("t1 = {t1} is not below t2 = {t2}")]
    #[diagnostic(
        code(strahlensatz::construction::fractions_not_increasing),
        severity(Warning),
        help("the transversals coincide or swap places")
    )]
    FractionsNotIncreasing { t1: f64, t2: f64 },

    #[error("ray length {0} is not positive")]
    #[diagnostic(code(strahlensatz::construction::non_positive_ray_length), severity(Warning))]
    NonPositiveRayLength(f64),

    #[error("both rays point the same way ({0} and {1})")]
    #[diagnostic(code(strahlensatz::construction::coincident_rays), severity(Warning))]
    CoincidentRays(Angle, Angle),

    #[error("{which} is not a finite number")]
    #[diagnostic(code(strahlensatz::construction::non_finite), severity(Warning))]
    NonFinite { which: &'static str },
}

// ============================================================================
// Render Errors
// ============================================================================

/// Errors that occur during rendering or while writing an artifact
#[derive(Error, Diagnostic, Debug)]
pub enum RenderError {
    #[error("failed to write {}", .path.display())]
    #[diagnostic(code(strahlensatz::render::artifact_write))]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("label plan does not match the model: expected {expected} point labels, found {found}")]
    #[diagnostic(
        code(strahlensatz::render::mismatched_plan),
        help("build the plan with labels::plan from the same task and model")
    )]
    MismatchedPlan { expected: usize, found: usize },

    #[error("label plan contains more than one label for {target}")]
    #[diagnostic(code(strahlensatz::render::duplicate_label))]
    DuplicateLabel { target: LabelTarget },

    #[error("infinite or NaN coordinate in {what}")]
    #[diagnostic(code(strahlensatz::render::invalid_bounds))]
    InvalidBounds { what: String },

    #[error("markup serialization error: {0}")]
    #[diagnostic(code(strahlensatz::render::markup))]
    Markup(String),

    #[error("rasterization failed: {0}")]
    #[diagnostic(code(strahlensatz::render::raster))]
    Raster(String),

    #[error("archive packaging failed")]
    #[diagnostic(code(strahlensatz::render::archive))]
    Archive(#[from] zip::result::ZipError),
}

impl RenderError {
    /// Whether this failure happened while writing to the destination
    pub fn is_write_failure(&self) -> bool {
        matches!(self, RenderError::ArtifactWrite { .. })
    }
}
