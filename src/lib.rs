use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

#[macro_use]
mod macros;
mod api;
pub mod config;
pub mod document;
mod engine;
pub mod error;
pub mod logging;
pub mod sink;
pub mod units;

pub use api::{Compilation, CompilationVerbose, Options, compile, compile_verbose_with, compile_with};
pub use config::{Config, ParamValue, Parameter, RuleMatch, TransformRule, ValueKind};
pub use document::{Meta, OutputDocument, VERSION};
pub use engine::{
    Derivation, Encoding, LogicalLines, Matcher, MeshFormat, MeshParser, ModelGenerator, PerturbedSample, RecordKind,
    RecordMask, RuleTransformer, RunMetrics, RunResult, TransformDeriver, TransformMode, decode, format_ids, parse_text,
    produce_lines, registry, resolve_format,
};
pub use error::{CompileError, Result};
pub use sink::{FilesystemSink, Sink};
pub use units::{LengthUnit, convert, convert_str};

// --- Mesh items --------------------------------------------------------------

/// Cartesian axis of a vertex coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Axes in the order they are compared and bounds-checked.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn as_str(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Geometry {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Geometry { x, y, z }
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

/// One parsed record of a mesh file.
///
/// Every logical line of the input produces exactly one item, so an item's
/// position in the sequence is also its logical line index. The transform
/// deriver relies on that to pair baseline and perturbed vertices.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MeshItem {
    /// A line no matcher recognized, kept verbatim (already stripped).
    Pass { line: String },
    /// A layer/group declaration (`g <name>` in OBJ).
    Layer { name: String, line: String },
    /// A vertex record.
    Vertex(Vertex),
}

impl MeshItem {
    pub fn as_vertex(&self) -> Option<&Vertex> {
        match self {
            MeshItem::Vertex(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_vertex(&self) -> bool {
        matches!(self, MeshItem::Vertex(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vertex {
    pub geometry: Geometry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub transformations: BTreeMap<String, Transformation>,
}

impl Vertex {
    pub fn new(geometry: Geometry, layer: Option<String>) -> Self {
        Vertex { geometry, layer, transformations: BTreeMap::new() }
    }
}

// --- Transformations ---------------------------------------------------------

/// A transform attached to a vertex.
///
/// Derived transforms are [`AxisOp`]s keyed `"<axis>_by_<param>"`; rule-based
/// transforms are the rule's property bag keyed by the rule name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Transformation {
    Axis(AxisOp),
    Properties(Map<String, Value>),
}

/// "The rendered coordinate on `axis` is the stored base coordinate plus
/// `factor * $param`."
///
/// Serializes as `{"<axis>": {"use": "add", "args": ["@", "$<param>", factor]}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisOp {
    pub axis: Axis,
    pub param: String,
    pub factor: f64,
}

impl AxisOp {
    /// Key under which this op is stored in a vertex's `transformations`.
    pub fn key(&self) -> String {
        format!("{}_by_{}", self.axis.as_str(), self.param)
    }
}

impl Serialize for AxisOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Instruction<'a> {
            #[serde(rename = "use")]
            op: &'a str,
            args: (&'a str, String, f64),
        }

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(
            self.axis.as_str(),
            &Instruction { op: "add", args: ("@", format!("${}", self.param), self.factor) },
        )?;
        map.end()
    }
}
