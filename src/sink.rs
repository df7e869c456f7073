//! Persisting compiled documents.
//!
//! ```text
//! <output_dir>/
//!   <name>/
//!     obj.json      compiled document
//!     config.json   the config it was compiled with
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Config;
use crate::document::OutputDocument;
use crate::error::{CompileError, Result};

/// Environment variable naming the default output directory.
pub const OUTPUT_DIR_ENV: &str = "PARAMESH_OUTPUT_DIR";

const DEFAULT_OUTPUT_DIR: &str = ".build";

/// Where compiled models end up.
pub trait Sink {
    /// Store `document` and `config` under `name`; returns the location.
    fn persist(&self, name: &str, document: &OutputDocument, config: &Config) -> Result<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct FilesystemSink {
    output_dir: PathBuf,
}

impl FilesystemSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        FilesystemSink { output_dir: output_dir.into() }
    }

    /// `$PARAMESH_OUTPUT_DIR`, else `./.build`.
    pub fn from_env() -> Self {
        match std::env::var_os(OUTPUT_DIR_ENV) {
            Some(dir) if !dir.is_empty() => FilesystemSink::new(dir),
            _ => FilesystemSink::new(DEFAULT_OUTPUT_DIR),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl Sink for FilesystemSink {
    fn persist(&self, name: &str, document: &OutputDocument, config: &Config) -> Result<PathBuf> {
        let model_dir = self.output_dir.join(name);
        fs::create_dir_all(&model_dir).map_err(|e| CompileError::io(&model_dir, e))?;

        let config_json = config
            .to_json_value()
            .and_then(|value| serde_json::to_string_pretty(&value))
            .map_err(|e| CompileError::Serialize(e.to_string()))?;
        write(&model_dir.join("obj.json"), &document.to_json()?)?;
        write(&model_dir.join("config.json"), &config_json)?;

        info!(path = %model_dir.display(), items = document.data.len(), "model persisted");
        Ok(model_dir)
    }
}

fn write(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| CompileError::io(path, e))
}
