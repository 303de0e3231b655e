//! File-name canonicalization.
//!
//! Source files usually carry a date prefix and a real extension
//! (`"20230612 Smith_DL.jpeg"`); the destination lists the same document
//! with an enumeration and a bracketed type tag (`"2. Smith_DL [IMG]"`).
//! [`normalize`] reduces both to a comparable [`NormalizedFile`].

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Type tags
// ---------------------------------------------------------------------------

/// Standard document type derived from an extension or a bracket suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeTag {
    #[serde(rename = "PDF")]
    Pdf,
    #[serde(rename = "DOC")]
    Doc,
    #[serde(rename = "XLS")]
    Xls,
    #[serde(rename = "TXT")]
    Txt,
    #[serde(rename = "IMG")]
    Img,
    Unknown,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Doc => "DOC",
            Self::Xls => "XLS",
            Self::Txt => "TXT",
            Self::Img => "IMG",
            Self::Unknown => "Unknown",
        }
    }

    /// Map a bare extension (no dot, any case).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "doc" | "docx" => Self::Doc,
            "xls" | "xlsx" => Self::Xls,
            "txt" => Self::Txt,
            "jpg" | "jpeg" | "png" => Self::Img,
            _ => Self::Unknown,
        }
    }

    /// Map the text inside a `[TAG]` suffix.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_uppercase().as_str() {
            "PDF" => Self::Pdf,
            "DOC" => Self::Doc,
            "XLS" => Self::Xls,
            "TXT" => Self::Txt,
            "IMG" => Self::Img,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

fn long_date_with_time() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:19|20)[0-9]{6}[\s_]+[0-9]{6}").unwrap())
}

fn long_date() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:19|20)[0-9]{6}").unwrap())
}

fn short_date() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9]{2}(?:0[1-9]|1[0-2])(?:0[1-9]|[12][0-9]|3[01])").unwrap()
    })
}

fn enumeration() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{1,3}\.\s+").unwrap())
}

fn bracket_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\[([A-Za-z]+)\]\s*$").unwrap())
}

fn extension() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.([A-Za-z0-9]{1,5})$").unwrap())
}

// ---------------------------------------------------------------------------
// Date prefix
// ---------------------------------------------------------------------------

/// Byte length of the date token at the start of `name`, if any.
/// A token must not run straight into another digit.
fn date_token_len(name: &str) -> Option<usize> {
    let ends_cleanly = |len: usize| {
        !name[len..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    };

    for re in [long_date_with_time(), long_date(), short_date()] {
        if let Some(m) = re.find(name) {
            if ends_cleanly(m.end()) {
                return Some(m.end());
            }
        }
    }
    None
}

/// `YYYYMMDD`, `YYYYMMDD hhmmss`, `YYYYMMDD_hhmmss` or `YYMMDD` at the start.
pub fn has_date_prefix(name: &str) -> bool {
    date_token_len(name).is_some()
}

/// Remove every leading date token and the separators after it.
pub fn strip_date_prefix(name: &str) -> &str {
    let mut rest = name;
    while let Some(len) = date_token_len(rest) {
        rest = rest[len..].trim_start_matches(|c: char| c.is_whitespace() || c == '_' || c == '-');
    }
    rest
}

/// Remove the destination's display enumeration (`"2. "`).
pub fn strip_enumeration(name: &str) -> &str {
    match enumeration().find(name) {
        Some(m) => &name[m.end()..],
        None => name,
    }
}

/// Bracket suffix first, then extension, else `Unknown`.
pub fn type_tag(name: &str) -> TypeTag {
    let name = name.trim();
    if let Some(caps) = bracket_suffix().captures(name) {
        return TypeTag::from_tag(&caps[1]);
    }
    match extension().captures(name) {
        Some(caps) => TypeTag::from_extension(&caps[1]),
        None => TypeTag::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Normalized form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedFile {
    pub raw_name: String,
    pub base_name: String,
    pub type_tag: TypeTag,
}

impl NormalizedFile {
    /// `base.tag`, e.g. `smith_dl.img`.
    pub fn typed_name(&self) -> String {
        format!("{}.{}", self.base_name, self.type_tag.as_str().to_lowercase())
    }
}

/// Canonical comparison form of a source or destination file name.
pub fn normalize(raw: &str) -> NormalizedFile {
    let type_tag = type_tag(raw);

    let name = raw.trim();
    let name = strip_enumeration(name);
    let name = strip_date_prefix(name);

    let name = match bracket_suffix().find(name) {
        Some(m) => &name[..m.start()],
        None => match extension().find(name) {
            Some(m) => &name[..m.start()],
            None => name,
        },
    };

    let base_name = name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();

    NormalizedFile {
        raw_name: raw.to_string(),
        base_name,
        type_tag,
    }
}
