//! Malicious payload scanning
//!
//! Two passes with deliberately different reach:
//! - text patterns (script tags, server-side templates, JS handlers) are only
//!   looked for in the leading window of the buffer, decoded lossily as UTF-8;
//! - binary signatures (shell shebangs, PE and ZIP headers) are searched across
//!   the whole buffer.
//!
//! Payloads past the text window are NOT detected. Polyglot files that hide
//! markup after the first few KiB get through this check and must be
//! neutralised by re-encoding, which the transcoder always does.
//!
//! The executable and archive checks do not match the bare two-byte `MZ` and
//! `PK` magics: both turn up by chance in compressed image data often enough
//! to reject ordinary multi-megabyte photos. A ZIP needs the full local-file
//! header `PK\x03\x04`. A DOS/PE image needs `MZ` followed either by the
//! standard stub bytes `\x90\x00` or by an `e_lfanew` field (offset 0x3C)
//! that points at a `PE\0\0` signature. A stripped `MZ` stub with neither
//! shape is not reported.

use regex::bytes::RegexSet as BytesRegexSet;
use regex::RegexSet;
use std::sync::OnceLock;

/// (label, pattern) pairs for the text scan
const TEXT_PATTERNS: &[(&str, &str)] = &[
    ("script tag", r"(?i)<script[^>]*>"),
    ("php open tag", r"(?i)<\?php"),
    ("server template tag", r"<%.*?%>"),
    ("javascript uri", r"(?i)javascript:"),
    ("vbscript uri", r"(?i)vbscript:"),
    ("onload handler", r"(?i)onload\s*="),
    ("onerror handler", r"(?i)onerror\s*="),
    ("eval call", r"(?i)eval\s*\("),
    ("document.write", r"(?i)document\.write"),
];

/// (label, pattern) pairs for the binary scan. `(?-u)` makes `\xNN` match raw bytes.
const BINARY_PATTERNS: &[(&str, &str)] = &[
    ("sh shebang", r"(?-u)#!/bin/sh"),
    ("bash shebang", r"(?-u)#!/bin/bash"),
    ("ZIP archive header", r"(?-u)PK\x03\x04"),
];

const PE_LABEL: &str = "PE executable header";

/// Offset of the `e_lfanew` field inside a DOS header
const E_LFANEW_OFFSET: usize = 0x3C;

static TEXT_SET: OnceLock<RegexSet> = OnceLock::new();
static BINARY_SET: OnceLock<BytesRegexSet> = OnceLock::new();

fn text_set() -> &'static RegexSet {
    TEXT_SET.get_or_init(|| {
        RegexSet::new(TEXT_PATTERNS.iter().map(|(_, pattern)| *pattern))
            .expect("text scan patterns are valid regexes")
    })
}

fn binary_set() -> &'static BytesRegexSet {
    BINARY_SET.get_or_init(|| {
        BytesRegexSet::new(BINARY_PATTERNS.iter().map(|(_, pattern)| *pattern))
            .expect("binary scan patterns are valid regexes")
    })
}

/// Scan the first `window` bytes for script/markup patterns.
///
/// Returns the label of the first matching pattern.
pub fn scan_text(data: &[u8], window: usize) -> Option<&'static str> {
    let head = &data[..data.len().min(window)];
    let text = String::from_utf8_lossy(head);
    text_set()
        .matches(&text)
        .iter()
        .next()
        .map(|index| TEXT_PATTERNS[index].0)
}

/// Scan the entire buffer for embedded executable/archive signatures.
pub fn scan_binary(data: &[u8]) -> Option<&'static str> {
    binary_set()
        .matches(data)
        .iter()
        .next()
        .map(|index| BINARY_PATTERNS[index].0)
        .or_else(|| has_pe_header(data).then_some(PE_LABEL))
}

fn has_pe_header(data: &[u8]) -> bool {
    data.windows(2)
        .enumerate()
        .filter(|(_, magic)| *magic == b"MZ")
        .any(|(start, _)| is_dos_header(&data[start..]))
}

/// `header` starts with `MZ`
fn is_dos_header(header: &[u8]) -> bool {
    if header.get(2..4) == Some(&[0x90, 0x00][..]) {
        return true;
    }

    let Some(field) = header.get(E_LFANEW_OFFSET..E_LFANEW_OFFSET + 4) else {
        return false;
    };
    let e_lfanew = u32::from_le_bytes([field[0], field[1], field[2], field[3]]) as usize;
    if e_lfanew < E_LFANEW_OFFSET + 4 {
        return false;
    }

    match e_lfanew.checked_add(4) {
        Some(end) => header.get(e_lfanew..end) == Some(&b"PE\0\0"[..]),
        None => false,
    }
}
