//! Line-oriented reader for point-of-sale exports.
//!
//! Loads the whole source into memory, decodes it with encoding
//! auto-detection and splits every line into raw fields. No
//! point-of-sale semantics here.

use std::io::Read;
use std::path::Path;

use crate::error::{InputError, InputResult};

/// One source line split into fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the source file
    pub line: usize,
    pub fields: Vec<String>,
}

/// A fully loaded source file.
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Header cells from the first line
    pub header: Vec<String>,
    /// Data rows, empty lines excluded
    pub rows: Vec<RawRow>,
    /// Detected or used encoding
    pub encoding: String,
    pub delimiter: char,
}

/// Split a line into fields on every occurrence of `delimiter`.
///
/// Quotes are not interpreted. A trailing empty field after the final
/// delimiter is dropped: `"a,b,"` yields `["a", "b"]`.
pub fn tokenize(line: &str, delimiter: char) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut token = String::new();

    for c in line.chars() {
        if c == delimiter {
            tokens.push(std::mem::take(&mut token));
        } else {
            token.push(c);
        }
    }

    if !token.is_empty() {
        tokens.push(token);
    }

    tokens
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the specified encoding.
///
/// Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

/// Read a stream to exhaustion and split it into a table.
pub fn read_table<R: Read>(mut reader: R, delimiter: char) -> InputResult<RawTable> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_bytes(&bytes, delimiter)
}

/// Open, read and close a source file.
pub fn read_table_file<P: AsRef<Path>>(path: P, delimiter: char) -> InputResult<RawTable> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| InputError::MissingInput {
        path: path.display().to_string(),
        source,
    })?;
    read_table(file, delimiter)
}

/// Decode raw bytes with auto-detected encoding and split them into a table.
pub fn parse_bytes(bytes: &[u8], delimiter: char) -> InputResult<RawTable> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    parse_str(&content, delimiter, encoding)
}

/// Split decoded text into a header and data rows.
pub fn parse_str(content: &str, delimiter: char, encoding: String) -> InputResult<RawTable> {
    let mut lines = content.lines();

    let header_line = lines.next().ok_or(InputError::Empty)?;
    let header = tokenize(header_line, delimiter);
    if header.is_empty() {
        return Err(InputError::Empty);
    }

    let mut rows = Vec::new();
    for (idx, line) in lines.enumerate() {
        // Whitespace-only lines are data and reach the projector.
        if line.is_empty() {
            continue;
        }
        rows.push(RawRow {
            line: idx + 2,
            fields: tokenize(line, delimiter),
        });
    }

    Ok(RawTable {
        header,
        rows,
        encoding,
        delimiter,
    })
}
