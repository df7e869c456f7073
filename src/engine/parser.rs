//! Line-oriented mesh parser.
//!
//! `MeshParser` consumes logical lines (see `lexer.rs`) and yields exactly one
//! `MeshItem` per line:
//!
//! ```text
//! "g legs"        -> Layer  { name: "legs" }       (cursor := "legs")
//! "v 1.0 2.0 3.0" -> Vertex { 1, 2, 3, layer: "legs" }
//! "f 1 2 3"       -> Pass   { line: "f 1 2 3" }
//! ```
//!
//! A vertex record that does not carry three finite numbers after its keyword
//! aborts the parse: the iterator yields the error and then stops. Skipping
//! the line instead would shift every later vertex and break the positional
//! pairing with perturbed meshes.

use super::formats::{MeshFormat, RecordKind};
use super::lexer::produce_lines;
use crate::error::{CompileError, Result};
use crate::{Geometry, MeshItem, Vertex};

#[derive(Debug)]
pub struct MeshParser<I> {
    lines: I,
    format: &'static MeshFormat,
    /// Name used in error messages, usually the file name.
    source: String,
    /// Layer declared by the most recent layer record.
    layer: Option<String>,
    /// Logical line number of the last line read (1-based).
    line_no: usize,
    done: bool,
}

impl<I: Iterator<Item = String>> MeshParser<I> {
    pub fn new(lines: I, format: &'static MeshFormat, source: impl Into<String>) -> Self {
        MeshParser { lines, format, source: source.into(), layer: None, line_no: 0, done: false }
    }

    pub fn format(&self) -> &'static MeshFormat {
        self.format
    }

    fn parse_line(&mut self, line: String) -> Result<MeshItem> {
        match self.format.classify(&line) {
            Some(RecordKind::Layer) => {
                let name = record_body(&line).to_string();
                self.layer = Some(name.clone());
                Ok(MeshItem::Layer { name, line })
            }
            Some(RecordKind::Vertex) => {
                let geometry = parse_coordinates(&line).map_err(|reason| CompileError::MalformedRecord {
                    file: self.source.clone(),
                    line: self.line_no,
                    text: line.clone(),
                    reason,
                })?;
                Ok(MeshItem::Vertex(Vertex::new(geometry, self.layer.clone())))
            }
            None => Ok(MeshItem::Pass { line }),
        }
    }
}

impl<I: Iterator<Item = String>> Iterator for MeshParser<I> {
    type Item = Result<MeshItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let line = self.lines.next()?;
        self.line_no += 1;
        let item = self.parse_line(line);
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

/// Parse a whole decoded mesh into items.
pub fn parse_text(text: &str, format: &'static MeshFormat, source: &str) -> Result<Vec<MeshItem>> {
    MeshParser::new(produce_lines(text), format, source).collect()
}

/// Everything after the record keyword.
fn record_body(line: &str) -> &str {
    line.split_once(char::is_whitespace).map(|(_, rest)| rest.trim()).unwrap_or("")
}

/// Read `x y z` from the tokens following the keyword. Extra tokens (such as
/// an OBJ `w` component) are ignored.
pub(crate) fn parse_coordinates(line: &str) -> std::result::Result<Geometry, String> {
    let mut values = [0.0f64; 3];
    let mut tokens = line.split_whitespace().skip(1);
    for (slot, axis) in values.iter_mut().zip(["x", "y", "z"]) {
        let token = tokens.next().ok_or_else(|| format!("missing {axis} coordinate"))?;
        let value: f64 = token.parse().map_err(|_| format!("{axis} coordinate `{token}` is not a number"))?;
        if !value.is_finite() {
            return Err(format!("{axis} coordinate `{token}` is not finite"));
        }
        *slot = value;
    }
    Ok(Geometry::new(values[0], values[1], values[2]))
}
