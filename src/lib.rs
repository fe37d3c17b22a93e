//! Intercept-theorem (Strahlensatz) exercise renderer.
//!
//! A [`TaskSpec`] describes two rays from a common apex, cut by two parallel
//! transversals, plus the segment lengths shown to the learner. The pipeline
//! computes the construction, places the labels and hands both to one of four
//! backends:
//!
//! ```text
//! TaskSpec -> geometry::compute -> labels::plan -> Scene -> Backend -> bytes
//! ```
//!
//! [`batch::run_all`] drives the pipeline over a list of tasks and writes one
//! file per task.

pub mod batch;
pub mod catalog;
pub mod errors;
pub mod geometry;
pub mod labels;
pub mod log;
pub mod render;
pub mod task;
pub mod types;

pub use batch::{BatchOptions, BatchReport, TaskFailure, run_all};
pub use errors::{Degeneracy, RenderError, SpecError};
pub use geometry::{GeometricModel, compute};
pub use labels::{Label, LabelPlan, LabelStyle, LabelTarget, plan};
pub use render::{Backend, BackendKind, BackgroundStyle, Render, RenderMeta, Scene, render_to};
pub use task::{PointLabels, PointRole, RawTaskSpec, SegmentSlot, SlotValue, TaskSpec, tasks_from_json};

/// Render a single task in memory with `backend`.
pub fn render_task(spec: &TaskSpec, number: usize, backend: &Backend) -> Result<Vec<u8>, RenderError> {
    let model = geometry::compute(spec);
    let plan = labels::plan(spec, &model);
    let scene = Scene::new(&model, &plan)?;
    backend.render(&scene, &RenderMeta::new(spec.display_title(number)))
}
