//! JSON output for the command-line tools.
//!
//! Results are written as a single line in the conventional "default encoder"
//! layout: `", "` between elements, `": "` after keys, and every non-ASCII
//! character escaped as `\uXXXX`.

use crate::error::{ScholarError, Result};
use serde::Serialize;
use serde_json::ser::Formatter;
use std::io::{self, Write};

/// serde_json formatter producing spaced separators and ASCII-only strings
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiSpacedFormatter;

impl Formatter for AsciiSpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let bytes = fragment.as_bytes();
        let mut start = 0;

        for (i, ch) in fragment.char_indices() {
            // DEL is ASCII but outside the printable range
            if ch.is_ascii() && ch != '\u{7f}' {
                continue;
            }
            writer.write_all(&bytes[start..i])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + ch.len_utf8();
        }

        writer.write_all(&bytes[start..])
    }
}

/// Serialize a value to the output layout
pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, AsciiSpacedFormatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| ScholarError::Parse(e.to_string()))
}

/// Write a value followed by a newline and flush.
///
/// The value is fully serialized before anything reaches `writer`.
pub fn write_json<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> Result<()> {
    let json = to_json_string(value)?;
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_array() {
        let empty: Vec<serde_json::Value> = Vec::new();
        assert_eq!(to_json_string(&empty).expect("serializes"), "[]");
    }

    #[test]
    fn test_separators() {
        let value = json!([{"a": [1, 2]}, {"b": null}]);
        assert_eq!(
            to_json_string(&value).expect("serializes"),
            r#"[{"a": [1, 2]}, {"b": null}]"#
        );
    }

    #[test]
    fn test_non_ascii_escaped() {
        let value = json!(["Universit\u{e9} de Montr\u{e9}al", "\u{1f600}", "tab\there", "\u{7f}"]);
        assert_eq!(
            to_json_string(&value).expect("serializes"),
            r#"["Universit\u00e9 de Montr\u00e9al", "\ud83d\ude00", "tab\there", "\u007f"]"#
        );
    }

    #[test]
    fn test_write_json_appends_newline() {
        let mut out = Vec::new();
        write_json(&mut out, &json!([])).expect("writes");
        assert_eq!(out, b"[]\n");
    }
}
