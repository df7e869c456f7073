//! The compiled artifact: `{ "data": [items...], "meta": { format, version } }`.

use serde::Serialize;

use crate::MeshItem;
use crate::error::{CompileError, Result};

/// Schema version of the output document. Bump on any breaking change to the
/// item shapes or to `AxisOp` semantics.
pub const VERSION: &str = "0.1.0";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meta {
    pub format: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDocument {
    pub data: Vec<MeshItem>,
    pub meta: Meta,
}

impl OutputDocument {
    pub fn new(data: Vec<MeshItem>, format: &str) -> Self {
        OutputDocument { data, meta: Meta { format: format.to_string(), version: VERSION.to_string() } }
    }

    /// Pretty JSON, 2-space indent.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CompileError::Serialize(e.to_string()))
    }

    pub fn vertices(&self) -> impl Iterator<Item = &crate::Vertex> {
        self.data.iter().filter_map(MeshItem::as_vertex)
    }
}
