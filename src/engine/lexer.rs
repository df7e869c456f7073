//! Byte decoding and logical line production.
//!
//! Some exporters wrap long records by ending a line with a backslash and
//! indenting the continuation by one space. A logical line is the physical
//! line with every such `\` + newline + space sequence removed, then stripped
//! of surrounding whitespace. Empty logical lines are dropped.
//!
//! ```text
//! "f 1 2\\\n 3 4\n\n  # done  \n"  ->  ["f 1 23 4", "# done"]
//! ```

use std::iter::Peekable;
use std::path::Path;
use std::str::{FromStr, Split};

use crate::error::{CompileError, Result};

/// Byte encoding of a mesh file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Single-byte; every byte maps to the code point of the same value.
    #[default]
    Latin1,
    Utf8,
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "latin1" | "iso88591" => Ok(Encoding::Latin1),
            "utf8" => Ok(Encoding::Utf8),
            _ => Err(format!("unknown encoding '{s}' (expected latin1 or utf8)")),
        }
    }
}

/// Decode the whole file up front. A file that does not decode is rejected
/// before any item is produced.
pub fn decode(bytes: &[u8], encoding: Encoding, path: &Path) -> Result<String> {
    match encoding {
        Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        Encoding::Utf8 => std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| CompileError::Decode { path: path.to_path_buf(), reason: e.to_string() }),
    }
}

/// Lazy, finite iterator over the logical lines of `text`.
pub fn produce_lines(text: &str) -> LogicalLines<'_> {
    LogicalLines { physical: text.split('\n').peekable() }
}

#[derive(Debug, Clone)]
pub struct LogicalLines<'a> {
    physical: Peekable<Split<'a, char>>,
}

impl Iterator for LogicalLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let mut line = without_cr(self.physical.next()?).to_string();

            while line.ends_with('\\') {
                match self.physical.peek() {
                    Some(next) if next.starts_with(' ') => {
                        let next = without_cr(self.physical.next()?);
                        line.pop();
                        line.push_str(&next[1..]);
                    }
                    _ => break,
                }
            }

            let stripped = line.trim();
            if !stripped.is_empty() {
                return Some(stripped.to_string());
            }
        }
    }
}

fn without_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        produce_lines(text).collect()
    }

    #[test]
    fn strips_and_drops_empty_lines() {
        assert_eq!(lines("  v 1 2 3  \n\n\t\n# end\n"), vec!["v 1 2 3", "# end"]);
    }

    #[test]
    fn joins_backslash_continuations() {
        assert_eq!(lines("f 1 2\\\n 3 4\nv 0 0 0"), vec!["f 1 23 4", "v 0 0 0"]);
        assert_eq!(lines("a\\\n b\\\n c"), vec!["abc"]);
    }

    #[test]
    fn backslash_without_indented_continuation_is_kept() {
        assert_eq!(lines("a\\\nb"), vec!["a\\", "b"]);
        assert_eq!(lines("a\\"), vec!["a\\"]);
    }

    #[test]
    fn handles_crlf() {
        assert_eq!(lines("v 1 2 3\r\nv 4 5 6\r\n"), vec!["v 1 2 3", "v 4 5 6"]);
        assert_eq!(lines("a\\\r\n b\r\n"), vec!["ab"]);
    }

    #[test]
    fn latin1_never_fails() {
        let text = decode(&[0x76, 0x20, 0xe9], Encoding::Latin1, Path::new("m.obj")).unwrap();
        assert_eq!(text, "v é");
    }

    #[test]
    fn invalid_utf8_is_a_decode_error() {
        let err = decode(&[0x76, 0x20, 0xff], Encoding::Utf8, Path::new("m.obj")).unwrap_err();
        assert!(matches!(err, CompileError::Decode { .. }));
    }

    #[test]
    fn encoding_names() {
        assert_eq!("ISO-8859-1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert_eq!("utf-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert!("ebcdic".parse::<Encoding>().is_err());
    }
}
