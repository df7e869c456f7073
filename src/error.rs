use std::path::PathBuf;

/// Everything that can abort a compilation.
///
/// A compilation is all-or-nothing: any of these stops the run for the whole
/// target directory and no document is produced.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("invalid config {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    #[error("malformed record in {file} at line {line} (`{text}`): {reason}")]
    MalformedRecord { file: String, line: usize, text: String, reason: String },

    #[error("no file matching `source.$ext` in {} where `$ext` is in {tried:?}", .dir.display())]
    NoSourceFile { dir: PathBuf, tried: Vec<String> },

    #[error("perturbed mesh for `{param}` does not line up with the baseline at line {line}: {reason}")]
    PerturbedMismatch { param: String, line: usize, reason: String },

    #[error("parameter `{param}` has comparison_value == initial_value ({value}); its transform factor is undefined")]
    ZeroParameterDelta { param: String, value: f64 },

    #[error("parameter `{param}` gives a non-finite {} factor at line {line}", .axis.as_str())]
    NonFiniteFactor { param: String, line: usize, axis: crate::Axis },

    #[error("unsupported unit `{0}` (expected mm, cm or in)")]
    UnsupportedUnit(String),

    #[error("parameter `{param}` has unsupported value type `{kind}`")]
    UnsupportedValueType { param: String, kind: String },

    #[error("failed to serialize output: {0}")]
    Serialize(String),
}

pub type Result<T> = std::result::Result<T, CompileError>;

impl CompileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CompileError::Io { path: path.into(), source }
    }
}
