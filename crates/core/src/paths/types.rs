//! Identifier and folder-kind types for the case folder layout.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::PathError;

/// Runs of whitespace inside a component collapse to one space.
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Invisible characters that commonly leak in from copy-pasted identifiers.
const INVISIBLE: [char; 6] = [
    '\u{00A0}', '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}',
];

/// Characters rejected by common filesystems.
const ILLEGAL: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Cleans a raw string so it can be used as a single path component.
///
/// Removes control, invisible and filesystem-illegal characters, strips any
/// trailing dots and whitespace, trims, and collapses internal whitespace.
fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control() && !INVISIBLE.contains(c) && !ILLEGAL.contains(c))
        .collect();

    let trimmed = cleaned
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
        .trim_start();

    WHITESPACE_RUN.replace_all(trimmed, " ").into_owned()
}

/// Sanitizes a remote display name for use as a local file name.
///
/// Returns `None` when nothing usable is left.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let name = sanitize_component(raw);
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name)
    }
}

/// A case (or redesign) identifier that is safe to use in paths.
///
/// Only constructible through [`CaseId::sanitize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    /// Sanitizes a raw identifier. Returns `None` if it sanitizes to nothing.
    pub fn sanitize(raw: &str) -> Option<Self> {
        let id = sanitize_component(raw);
        if id.is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First two characters, used as the lab partition directory.
    ///
    /// Identifiers shorter than two characters yield a shorter token.
    pub fn lab_token(&self) -> String {
        self.0.chars().take(2).collect()
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CaseId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Per-case working folder kinds under a lab root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FolderKind {
    #[serde(rename = "IMPORT")]
    Import,
    #[serde(rename = "EXPORT - Internal")]
    ExportInternal,
    #[serde(rename = "EXPORT - External")]
    ExportExternal,
    #[serde(rename = "Uploads")]
    Uploads,
}

impl FolderKind {
    /// All kinds, in the order lab roots create them.
    pub const ALL: [FolderKind; 4] = [
        FolderKind::Import,
        FolderKind::ExportInternal,
        FolderKind::ExportExternal,
        FolderKind::Uploads,
    ];

    /// Directory name on disk.
    pub fn as_str(&self) -> &'static str {
        match self {
            FolderKind::Import => "IMPORT",
            FolderKind::ExportInternal => "EXPORT - Internal",
            FolderKind::ExportExternal => "EXPORT - External",
            FolderKind::Uploads => "Uploads",
        }
    }
}

impl fmt::Display for FolderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FolderKind {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FolderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| PathError::InvalidFolderKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_clean(id: &str) {
        assert!(!id.chars().any(|c| c.is_control()), "control char in {:?}", id);
        assert!(!id.chars().any(|c| INVISIBLE.contains(&c)), "invisible char in {:?}", id);
        assert!(!id.chars().any(|c| ILLEGAL.contains(&c)), "illegal char in {:?}", id);
        assert!(!id.ends_with('.'), "trailing dot in {:?}", id);
        assert_eq!(id, id.trim());
    }

    #[test]
    fn test_sanitize_plain_id_unchanged() {
        let id = CaseId::sanitize("AB-123").unwrap();
        assert_eq!(id.as_str(), "AB-123");
        assert_eq!(id.lab_token(), "AB");
    }

    #[test]
    fn test_sanitize_strips_invisible_and_illegal() {
        let id = CaseId::sanitize("\u{200B}AB\t-1<2>3\u{00A0}\r\n").unwrap();
        assert_eq!(id.as_str(), "AB-123");
    }

    #[test]
    fn test_sanitize_strips_trailing_dots_and_spaces() {
        assert_eq!(CaseId::sanitize("AB-123...").unwrap().as_str(), "AB-123");
        assert_eq!(CaseId::sanitize("AB-123. . ").unwrap().as_str(), "AB-123");
        assert_eq!(CaseId::sanitize("AB-123.\u{3000}").unwrap().as_str(), "AB-123");
    }

    #[test]
    fn test_sanitize_collapses_internal_whitespace() {
        let id = CaseId::sanitize("  AB   123  ").unwrap();
        assert_eq!(id.as_str(), "AB 123");
    }

    #[test]
    fn test_sanitize_empty_result_is_rejected() {
        assert!(CaseId::sanitize("").is_none());
        assert!(CaseId::sanitize("...").is_none());
        assert!(CaseId::sanitize("<>:\"/\\|?*\u{200B}").is_none());
    }

    #[test]
    fn test_sanitize_invariants_hold_for_hostile_inputs() {
        let inputs = [
            "AB-123",
            "a/b\\c",
            "x\u{0000}y\u{001F}z",
            "trailing. .. . ",
            "\u{FEFF}bom-prefixed",
            "del\u{007F}char",
            "c1\u{0085}ctrl",
            "dots......in.....middle...",
            "   ",
            "é-ünicode ✓.",
        ];
        for raw in inputs {
            if let Some(id) = CaseId::sanitize(raw) {
                assert_clean(id.as_str());
            }
        }
    }

    #[test]
    fn test_short_id_gives_short_lab_token() {
        let id = CaseId::sanitize("A.").unwrap();
        assert_eq!(id.as_str(), "A");
        assert_eq!(id.lab_token(), "A");
    }

    #[test]
    fn test_lab_token_counts_characters_not_bytes() {
        let id = CaseId::sanitize("ÉÜ-9").unwrap();
        assert_eq!(id.lab_token(), "ÉÜ");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("scan 1.stl").as_deref(), Some("scan 1.stl"));
        assert_eq!(
            sanitize_file_name("../../etc/passwd").as_deref(),
            Some("....etcpasswd")
        );
        assert!(sanitize_file_name("..").is_none());
        assert!(sanitize_file_name("///").is_none());
    }

    #[test]
    fn test_folder_kind_round_trip_names() {
        for kind in FolderKind::ALL {
            assert_eq!(kind.as_str().parse::<FolderKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_folder_kind_rejects_unknown() {
        let err = "REDESIGN".parse::<FolderKind>().unwrap_err();
        assert!(matches!(err, PathError::InvalidFolderKind(ref k) if k == "REDESIGN"));
        assert!("import".parse::<FolderKind>().is_err());
    }
}
