//! Compilation of one target directory.
//!
//! ```text
//! <target_dir>/
//!   config.json       parameters + declarative rules (UTF-8)
//!   source.<ext>      baseline mesh
//!   <param>.<ext>     perturbed mesh per parameter (optional)
//! ```
//!
//! If at least one parameter has a perturbed mesh the run is *dynamic*: the
//! baseline is annotated by [`TransformDeriver`] using every parameter that has
//! one. Otherwise it is *declarative* and [`RuleTransformer`] applies the
//! config's rules. The two never mix within a document.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use super::derive::{PerturbedSample, TransformDeriver};
use super::formats::{MeshFormat, RecordKind, format_ids, registry, resolve_format};
use super::lexer::{Encoding, decode, produce_lines};
use super::metrics::{RunMetrics, RunResult, TransformMode};
use super::parser::{MeshParser, parse_text};
use super::rules::RuleTransformer;
use crate::api::Options;
use crate::config::Config;
use crate::document::OutputDocument;
use crate::error::{CompileError, Result};
use crate::units::LengthUnit;

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone)]
pub struct ModelGenerator {
    target_dir: PathBuf,
    format: &'static MeshFormat,
    model_units: LengthUnit,
    geometry_units: LengthUnit,
    encoding: Encoding,
}

impl ModelGenerator {
    /// Resolve the mesh format for `target_dir`.
    ///
    /// With a format hint, `source.<hint>` must exist. Without one, the first
    /// registered format whose `source.<ext>` exists is used.
    pub fn new(target_dir: impl Into<PathBuf>, options: &Options) -> Result<Self> {
        let target_dir = target_dir.into();
        let format = locate_format(&target_dir, options.format.as_deref())?;
        debug!(dir = %target_dir.display(), format = format.id, "source located");
        Ok(ModelGenerator {
            target_dir,
            format,
            model_units: options.model_units,
            geometry_units: options.geometry_units,
            encoding: options.encoding,
        })
    }

    pub fn format(&self) -> &'static MeshFormat {
        self.format
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    #[instrument(skip(self), fields(dir = %self.target_dir.display(), format = self.format.id))]
    pub fn run(&self) -> Result<RunResult> {
        let started = Instant::now();

        let config = self.read_config()?;
        let samples = self.read_samples(&config)?;
        let read = started.elapsed();

        let transform_started = Instant::now();
        let source_name = self.format.source_file_name();
        let text = self.read_mesh(&self.target_dir.join(&source_name))?;
        let items = MeshParser::new(produce_lines(&text), self.format, source_name);

        let (mode, sources, data) = if samples.is_empty() {
            let rules = RuleTransformer::new(&config.transformations)?;
            if rules.is_empty() {
                debug!("no perturbed meshes and no rules");
            } else if rules.matches_layers() && !self.format.supports(RecordKind::Layer) {
                warn!(format = self.format.id, "format has no layer records; layer rules will not match");
            }
            let sources = config.transformations.iter().map(|(key, _)| key.clone()).collect();
            let data = rules.apply(items).collect::<Result<Vec<_>>>()?;
            (TransformMode::Declarative, sources, data)
        } else {
            let deriver = TransformDeriver::new(samples);
            let sources = deriver.params().map(str::to_string).collect();
            let data = deriver.derive(items).collect::<Result<Vec<_>>>()?;
            (TransformMode::Dynamic, sources, data)
        };
        let transform = transform_started.elapsed();

        let document = OutputDocument::new(data, self.format.id);
        let vertices = document.vertices().count();
        let transformed = document.vertices().filter(|v| !v.transformations.is_empty()).count();

        let metrics = RunMetrics {
            total: started.elapsed(),
            read,
            transform,
            items: document.data.len(),
            vertices,
            transformed,
            mode,
            sources,
        };

        info!(
            mode = %metrics.mode,
            items = metrics.items,
            vertices = metrics.vertices,
            transformed = metrics.transformed,
            elapsed_ms = metrics.total.as_millis() as u64,
            "model compiled"
        );

        Ok(RunResult { document, config, metrics })
    }

    fn read_config(&self) -> Result<Config> {
        let path = self.target_dir.join(CONFIG_FILE);
        let bytes = fs::read(&path).map_err(|e| CompileError::io(&path, e))?;
        let json = decode(&bytes, Encoding::Utf8, &path)?;
        Config::from_json(&json).map_err(|e| CompileError::Config { path, reason: e.to_string() })
    }

    fn read_mesh(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|e| CompileError::io(path, e))?;
        decode(&bytes, self.encoding, path)
    }

    /// Load the perturbed mesh of every parameter that has one.
    fn read_samples(&self, config: &Config) -> Result<Vec<PerturbedSample>> {
        let mut samples = Vec::new();

        for (key, param) in &config.parameters {
            let file_name = self.format.param_file_name(key);
            let path = self.target_dir.join(&file_name);
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(param = %key, file = %file_name, "no perturbed mesh");
                    continue;
                }
                Err(e) => return Err(CompileError::io(&path, e)),
            };

            param.validate(key)?;
            let delta = param.delta(key, self.model_units, self.geometry_units)?;
            let text = decode(&bytes, self.encoding, &path)?;
            let items = parse_text(&text, self.format, &file_name)?;
            debug!(param = %key, delta, items = items.len(), "perturbed mesh loaded");

            samples.push(PerturbedSample { key: key.clone(), delta, items });
        }

        Ok(samples)
    }
}

fn locate_format(dir: &Path, hint: Option<&str>) -> Result<&'static MeshFormat> {
    if let Some(hint) = hint {
        let id = hint.trim().trim_start_matches('.').to_ascii_lowercase();
        return match resolve_format(&id) {
            Some(format) if dir.join(format.source_file_name()).is_file() => Ok(format),
            _ => Err(CompileError::NoSourceFile { dir: dir.to_path_buf(), tried: vec![id] }),
        };
    }

    registry().iter().find(|format| dir.join(format.source_file_name()).is_file()).ok_or_else(|| {
        CompileError::NoSourceFile {
            dir: dir.to_path_buf(),
            tried: format_ids().into_iter().map(str::to_string).collect(),
        }
    })
}
