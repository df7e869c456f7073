use crate::config::Config;
use crate::document::OutputDocument;
use crate::engine::{self, Encoding, RunMetrics};
use crate::error::Result;
use crate::units::LengthUnit;
use std::path::Path;

/// Options that affect how a target directory is compiled.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Unit of parameter values that do not declare their own `units`.
    pub model_units: LengthUnit,
    /// Unit the exported mesh coordinates are in.
    pub geometry_units: LengthUnit,
    /// Mesh format to use (`"obj"`, `"stl"`); detected when `None`.
    pub format: Option<String>,
    /// Byte encoding of the mesh files. `config.json` is always UTF-8.
    pub encoding: Encoding,
}

/// Result from [`compile`] and [`compile_with`].
#[derive(Debug, Clone)]
pub struct Compilation {
    pub document: OutputDocument,
    /// The config the document was compiled with, for the sink.
    pub config: Config,
}

/// Result from [`compile_verbose_with`].
#[derive(Debug, Clone)]
pub struct CompilationVerbose {
    pub document: OutputDocument,
    pub config: Config,
    pub details: RunMetrics,
}

/// Compile `target_dir` with default [`Options`] (centimeters, detected format,
/// Latin-1 meshes).
///
/// # Example
/// ```no_run
/// use paramesh::compile;
///
/// let out = compile("exports/table").unwrap();
/// println!("{} items", out.document.data.len());
/// ```
pub fn compile(target_dir: impl AsRef<Path>) -> Result<Compilation> {
    compile_with(target_dir, &Options::default())
}

/// Compile `target_dir` with the provided `options`.
pub fn compile_with(target_dir: impl AsRef<Path>, options: &Options) -> Result<Compilation> {
    let run = engine::ModelGenerator::new(target_dir.as_ref(), options)?.run()?;
    Ok(Compilation { document: run.document, config: run.config })
}

/// Like [`compile_with`], also returning timings and counters for the run.
pub fn compile_verbose_with(target_dir: impl AsRef<Path>, options: &Options) -> Result<CompilationVerbose> {
    let run = engine::ModelGenerator::new(target_dir.as_ref(), options)?.run()?;
    Ok(CompilationVerbose { document: run.document, config: run.config, details: run.metrics })
}
