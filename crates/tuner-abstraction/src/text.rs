//! Decoding and line splitting for the text files every stage reads.
//!
//! Line ends are `\n`, `\r\n` and a lone `\r`. A final line end does not start
//! another line.

use thiserror::Error;

/// The bytes are not UTF-8; `line` is the 1-based line holding the first bad byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid UTF-8 on line {line}")]
pub struct InvalidUtf8 {
    pub line: usize,
}

pub fn decode_utf8(bytes: &[u8]) -> Result<&str, InvalidUtf8> {
    std::str::from_utf8(bytes).map_err(|e| InvalidUtf8 { line: count_line_ends(&bytes[..e.valid_up_to()]) + 1 })
}

/// Lines of `text` without their terminators.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while let Some(end) = rest.find(['\n', '\r']) {
        lines.push(&rest[..end]);
        let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
        rest = &rest[end + terminator..];
    }
    if !rest.is_empty() {
        lines.push(rest);
    }
    lines
}

fn count_line_ends(bytes: &[u8]) -> usize {
    let mut count = 0;
    let mut iter = bytes.iter().peekable();
    while let Some(&byte) = iter.next() {
        match byte {
            b'\n' => count += 1,
            b'\r' => {
                count += 1;
                iter.next_if_eq(&&b'\n');
            }
            _ => {}
        }
    }
    count
}
