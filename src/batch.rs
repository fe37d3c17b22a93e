//! Rendering a list of tasks with one backend.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::errors::RenderError;
use crate::geometry;
use crate::labels;
use crate::log::{info, warn};
use crate::render::{Backend, BackgroundStyle, Render, RenderMeta, defaults, render_to};
use crate::task::{TaskSpec, is_file_stem};

/// Per-run rendering choices applied to every task
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    pub background: BackgroundStyle,
    pub transversal_overhang: f64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            background: BackgroundStyle::Plain,
            transversal_overhang: defaults::TRANSVERSAL_OVERHANG,
        }
    }
}

/// A task that produced no artifact
#[derive(Debug)]
pub struct TaskFailure {
    /// 1-based position in the batch
    pub number: usize,
    pub stem: String,
    pub error: RenderError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<PathBuf>,
    pub failures: Vec<TaskFailure>,
}

impl BatchReport {
    /// Number of artifacts written
    pub fn count(&self) -> usize {
        self.written.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// `stem`, or `stem-N` when an earlier task of the batch already took it.
///
/// Compared without case, since some file systems do.
fn claim_stem(stem: String, number: usize, taken: &mut HashSet<String>) -> String {
    let mut candidate = stem.clone();
    let mut n = number;
    while !taken.insert(candidate.to_lowercase()) {
        candidate = format!("{stem}-{n}");
        n += 1;
    }
    candidate
}

/// Render every task in order into `out_dir`.
///
/// A failing task is recorded and skipped; the others are still rendered.
/// Every task gets its own file, even when names repeat.
pub fn run_all(
    specs: &[TaskSpec],
    backend: &Backend,
    out_dir: &Path,
    options: &BatchOptions,
) -> BatchReport {
    if let Err(e) = std::fs::create_dir_all(out_dir) {
        warn!(dir = %out_dir.display(), error = %e, "cannot create output directory");
    }

    let mut report = BatchReport::default();
    let mut taken = HashSet::new();
    for (i, spec) in specs.iter().enumerate() {
        let number = i + 1;
        if let Some(name) = spec.name.as_deref().filter(|name| !is_file_stem(name)) {
            warn!(task = number, name, "name is not a file stem, numbering instead");
        }
        let stem = claim_stem(spec.stem(number), number, &mut taken);

        for degeneracy in spec.degeneracies() {
            warn!(task = %stem, %degeneracy, "degenerate construction");
        }

        let model = geometry::compute(spec);
        let plan = labels::plan(spec, &model);
        let meta = RenderMeta {
            title: spec.display_title(number),
            background: options.background,
            transversal_overhang: options.transversal_overhang,
        };
        let dest = out_dir.join(format!("{stem}{}", backend.extension()));

        match render_to(backend, &model, &plan, &meta, &dest) {
            Ok(_) => report.written.push(dest),
            Err(error) => {
                warn!(task = %stem, %error, "task failed");
                report.failures.push(TaskFailure { number, stem, error });
            }
        }
    }

    info!(
        backend = backend.kind().name(),
        written = report.count(),
        failed = report.failures.len(),
        "batch finished"
    );
    report
}
