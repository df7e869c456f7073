//! Mesh format registry.
//!
//! A format is an identifier (also the file extension) plus an ordered list of
//! record matchers. The parser asks a format to classify each logical line;
//! the first matcher that matches wins, anything else is passed through.
//!
//! ## Invariants
//!
//! - Registry order is the lookup order used when no format is requested.
//! - Matcher order within a format is the classification order.
//! - `MeshFormat::records` is derived from `matchers` and must stay in sync;
//!   construct formats through `MeshFormat::new`.

use once_cell::sync::Lazy;
use regex::Regex;

bitflags::bitflags! {
    /// Record kinds a format can recognize.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RecordMask: u8 {
        const VERTEX = 1 << 0;
        const LAYER  = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Vertex,
    Layer,
}

impl RecordKind {
    pub fn mask(self) -> RecordMask {
        match self {
            RecordKind::Vertex => RecordMask::VERTEX,
            RecordKind::Layer => RecordMask::LAYER,
        }
    }
}

#[derive(Debug)]
pub struct Matcher {
    pub kind: RecordKind,
    pub regex: &'static Regex,
}

#[derive(Debug)]
pub struct MeshFormat {
    pub id: &'static str,
    pub matchers: Vec<Matcher>,
    pub records: RecordMask,
}

impl MeshFormat {
    pub fn new(id: &'static str, matchers: Vec<Matcher>) -> Self {
        let records = matchers.iter().fold(RecordMask::empty(), |acc, m| acc | m.kind.mask());
        MeshFormat { id, matchers, records }
    }

    /// File name of the baseline mesh for this format.
    pub fn source_file_name(&self) -> String {
        format!("source.{}", self.id)
    }

    /// File name of the perturbed mesh exported for parameter `key`.
    pub fn param_file_name(&self, key: &str) -> String {
        format!("{}.{}", key, self.id)
    }

    pub fn supports(&self, kind: RecordKind) -> bool {
        self.records.contains(kind.mask())
    }

    /// Classify a logical line; `None` means pass-through.
    pub fn classify(&self, line: &str) -> Option<RecordKind> {
        self.matchers.iter().find(|m| m.regex.is_match(line)).map(|m| m.kind)
    }
}

static REGISTRY: Lazy<Vec<MeshFormat>> = Lazy::new(|| {
    vec![
        MeshFormat::new("stl", vec![matcher!(Vertex, r"^vertex ")]),
        MeshFormat::new("obj", vec![matcher!(Layer, r"^g "), matcher!(Vertex, r"^v ")]),
    ]
});

/// All registered formats, in lookup order.
pub fn registry() -> &'static [MeshFormat] {
    &REGISTRY
}

pub fn resolve_format(id: &str) -> Option<&'static MeshFormat> {
    registry().iter().find(|f| f.id == id)
}

pub fn format_ids() -> Vec<&'static str> {
    registry().iter().map(|f| f.id).collect()
}
