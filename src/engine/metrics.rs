//! Generator run metrics.
//!
//! `ModelGenerator::run` always collects these; they are cheap (a few
//! `Instant`s and counters). The library's plain `compile_with` drops them,
//! `compile_verbose_with` and the CLI report surface them.

use std::fmt;
use std::time::Duration;

use crate::config::Config;
use crate::document::OutputDocument;

/// Which of the two mutually exclusive transform paths a run took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformMode {
    /// Factors derived from perturbed meshes.
    Dynamic,
    /// Property bags from `config.json` rules.
    #[default]
    Declarative,
}

impl fmt::Display for TransformMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransformMode::Dynamic => "dynamic",
            TransformMode::Declarative => "declarative",
        })
    }
}

// --- Metrics -----------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct RunMetrics {
    /// Total elapsed time for the run.
    pub total: Duration,
    /// Reading, decoding and parsing the config and every perturbed mesh.
    pub read: Duration,
    /// Parsing the baseline mesh and attaching transforms.
    pub transform: Duration,
    /// Items in the output document.
    pub items: usize,
    /// Vertex items among them.
    pub vertices: usize,
    /// Vertices carrying at least one transform.
    pub transformed: usize,
    pub mode: TransformMode,
    /// Parameters with a perturbed mesh (dynamic mode) or rule names
    /// (declarative mode).
    pub sources: Vec<String>,
}

/// Generator output bundled with timing information.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub document: OutputDocument,
    /// The parsed `config.json`, returned for the sink.
    pub config: Config,
    pub metrics: RunMetrics,
}
