//! Mesh compilation engine.
//!
//! The engine turns a folder of exported meshes into an annotated item
//! sequence. It is split into focused submodules under `src/engine/`.
//!
//! ## How the parts work together
//!
//! ```text
//! target dir ── ModelGenerator::new          (generator.rs)
//!                 - pick format: hint, else first `source.<ext>` found
//!                               │
//! raw bytes ── decode + produce_lines        (lexer.rs)
//!                 - Latin-1 / UTF-8 decode, continuation joins
//!                               │
//!                               v
//!              MeshParser                    (parser.rs)
//!                 - classify each line via the format's matchers
//!                   (formats.rs), one MeshItem per logical line
//!                               │
//!              ┌────────────────┴────────────────┐
//!              v                                 v
//!   TransformDeriver (derive.rs)       RuleTransformer (rules.rs)
//!   perturbed files present:           no perturbed files:
//!   diff baseline vs perturbed         bounds + layer-glob rules
//!   item i, per axis                   from config.json
//!              └────────────────┬────────────────┘
//!                               v
//!                 OutputDocument {data, meta} + Config
//! ```
//!
//! Everything is synchronous and single-pass. The baseline mesh streams
//! through the parser; each perturbed mesh is parsed up front into a `Vec`
//! because items are correlated by position, so memory is
//! O(vertices x parameters with perturbed files).
//!
//! ## Responsibilities by module
//!
//! - `lexer.rs`: byte decoding and logical line production.
//! - `formats.rs`: the format registry (`MeshFormat`, `Matcher`, `RecordMask`).
//! - `parser.rs`: `MeshParser`, a fallible iterator of `MeshItem`s.
//! - `derive.rs`: `TransformDeriver` and `PerturbedSample`.
//! - `rules.rs`: `RuleTransformer`, compiled from `config.json` rules.
//! - `generator.rs`: `ModelGenerator`, which wires the above to the filesystem.
//! - `metrics.rs`: per-run timing and counters.
//!
//! ## Adding a mesh format
//!
//! Add one `MeshFormat` entry to the registry in `formats.rs`. Nothing else
//! changes: the generator looks for `source.<id>` for every registered format and
//! the parser only ever talks to a format through its matchers.

#[path = "engine/derive.rs"]
mod derive;
#[path = "engine/formats.rs"]
mod formats;
#[path = "engine/generator.rs"]
mod generator;
#[path = "engine/lexer.rs"]
mod lexer;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/parser.rs"]
mod parser;
#[path = "engine/rules.rs"]
mod rules;

#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;

pub use derive::{Derivation, PerturbedSample, TransformDeriver};
pub use formats::{Matcher, MeshFormat, RecordKind, RecordMask, format_ids, registry, resolve_format};
pub use generator::ModelGenerator;
pub use lexer::{Encoding, LogicalLines, decode, produce_lines};
pub use metrics::{RunMetrics, RunResult, TransformMode};
pub use parser::{MeshParser, parse_text};
pub use rules::RuleTransformer;
