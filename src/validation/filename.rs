//! Filename safety checks
//!
//! Declared filenames come straight from the client and are never used to
//! build a path, but they are still screened: a hostile name is a strong
//! signal that the rest of the upload is hostile too.

use std::fmt;
use std::path::Path;

/// Characters rejected anywhere in a filename
const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Device names reserved by Windows, compared case-insensitively on the stem
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

const EXECUTABLE_EXTENSIONS: &[&str] = &[
    "exe", "bat", "cmd", "com", "pif", "scr", "vbs", "js", "jar", "sh", "php", "pl", "py", "rb",
];

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Longest caller-supplied output base name
const MAX_BASE_NAME_LENGTH: usize = 128;

/// Why a filename was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilenameIssue {
    Empty,
    Traversal,
    ForbiddenCharacter(char),
    PathSeparator,
    ControlCharacter,
    ReservedName,
    Hidden,
    ExecutableExtension,
    TooLong { length: usize, max: usize },
    DisallowedExtension,
}

impl fmt::Display for FilenameIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilenameIssue::Empty => write!(f, "filename is empty"),
            FilenameIssue::Traversal => write!(f, "filename contains '..'"),
            FilenameIssue::ForbiddenCharacter(c) => {
                write!(f, "filename contains forbidden character '{}'", c)
            }
            FilenameIssue::PathSeparator => write!(f, "filename contains a path separator"),
            FilenameIssue::ControlCharacter => write!(f, "filename contains a control character"),
            FilenameIssue::ReservedName => write!(f, "filename is a reserved device name"),
            FilenameIssue::Hidden => write!(f, "filename must not start with '.'"),
            FilenameIssue::ExecutableExtension => {
                write!(f, "filename has an executable extension")
            }
            FilenameIssue::TooLong { length, max } => {
                write!(f, "filename is {} characters long (max {})", length, max)
            }
            FilenameIssue::DisallowedExtension => write!(
                f,
                "filename extension must be one of .jpg, .jpeg, .png, .gif, .webp"
            ),
        }
    }
}

/// Screen a client-declared filename.
///
/// Checks run in a fixed order and the first failure wins, so the reported
/// issue is stable for a given input.
pub fn check_filename(name: &str, max_length: usize) -> Result<(), FilenameIssue> {
    if name.is_empty() {
        return Err(FilenameIssue::Empty);
    }

    if name.contains("..") {
        return Err(FilenameIssue::Traversal);
    }

    if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(FilenameIssue::ForbiddenCharacter(c));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(FilenameIssue::PathSeparator);
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(FilenameIssue::ControlCharacter);
    }

    if is_reserved_name(name) {
        return Err(FilenameIssue::ReservedName);
    }

    if name.starts_with('.') {
        return Err(FilenameIssue::Hidden);
    }

    let extension = extension_of(name);

    if let Some(ext) = &extension {
        if EXECUTABLE_EXTENSIONS.contains(&ext.as_str()) {
            return Err(FilenameIssue::ExecutableExtension);
        }
    }

    let length = name.chars().count();
    if length > max_length {
        return Err(FilenameIssue::TooLong {
            length,
            max: max_length,
        });
    }

    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(FilenameIssue::DisallowedExtension),
    }
}

/// Validate a caller-chosen output base name (no extension).
///
/// Only ASCII alphanumerics, `-` and `_` are allowed; the name ends up
/// verbatim in a public URL and on disk.
pub fn check_base_name(name: &str) -> Result<(), FilenameIssue> {
    if name.is_empty() {
        return Err(FilenameIssue::Empty);
    }

    let length = name.chars().count();
    if length > MAX_BASE_NAME_LENGTH {
        return Err(FilenameIssue::TooLong {
            length,
            max: MAX_BASE_NAME_LENGTH,
        });
    }

    match name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        Some('/') | Some('\\') => Err(FilenameIssue::PathSeparator),
        Some('.') => Err(FilenameIssue::Traversal),
        Some(c) if c.is_control() => Err(FilenameIssue::ControlCharacter),
        Some(c) => Err(FilenameIssue::ForbiddenCharacter(c)),
        None => Ok(()),
    }
}

/// Check that a stored asset name can be joined onto a storage directory
/// without escaping it
pub fn check_stored_name(name: &str) -> Result<(), FilenameIssue> {
    if name.is_empty() {
        return Err(FilenameIssue::Empty);
    }
    if name.contains("..") {
        return Err(FilenameIssue::Traversal);
    }
    if name.contains('/') || name.contains('\\') {
        return Err(FilenameIssue::PathSeparator);
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(FilenameIssue::ControlCharacter);
    }
    if name.starts_with('.') {
        return Err(FilenameIssue::Hidden);
    }
    Ok(())
}

/// Lower-cased extension without the dot
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn is_reserved_name(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or_default().trim_end();
    RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
}
