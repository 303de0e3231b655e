//! Account identity parsing.
//!
//! Source folders name an account with free text: `"Andrews, Kathleen"`,
//! `"John Michael Smith"`, `"Smith, John (Trust)"`, `"John & Jane Doe"`.
//! [`parse`] turns that into a [`ParsedIdentity`] with a fixed rule
//! precedence. Case is preserved; comparison helpers fold case themselves.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Structured decomposition of a raw account name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedIdentity {
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub extra_info: String,
    /// Destination names listed for a configured special case.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expected_matches: Vec<String>,
}

impl ParsedIdentity {
    /// True when nothing usable could be derived (blank identifier).
    pub fn is_blank(&self) -> bool {
        self.last_name.is_empty() && self.expected_matches.is_empty()
    }

    pub fn is_special_case(&self) -> bool {
        !self.expected_matches.is_empty()
    }

    /// `"{first} {last}"`, or `None` without a first name.
    pub fn full_name(&self) -> Option<String> {
        if self.first_name.is_empty() || self.last_name.is_empty() {
            return None;
        }
        Some(format!("{} {}", self.first_name, self.last_name))
    }

    /// Case-folded spellings under which the destination may list this
    /// account. Empty when there is no first name.
    pub fn variants(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let (first, middle, last) = (&self.first_name, &self.middle_name, &self.last_name);
        if first.is_empty() || last.is_empty() {
            return out;
        }

        let mut push = |s: String| {
            let s = s.to_lowercase();
            if !out.contains(&s) {
                out.push(s);
            }
        };

        push(format!("{first} {last}"));
        push(format!("{last}, {first}"));
        push(format!("{last},{first}"));
        if !middle.is_empty() {
            push(format!("{first} {middle} {last}"));
            push(format!("{last}, {first} {middle}"));
        }
        out
    }

    /// Whether `candidate` is one of this identity's spellings.
    pub fn is_variant(&self, candidate: &str) -> bool {
        let folded = collapse_whitespace(candidate).to_lowercase();
        self.variants().iter().any(|v| *v == folded)
    }
}

/// A folder whose destination records are known up front.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SpecialCase {
    pub folder_name: String,
    pub last_name: String,
    pub expected_matches: Vec<String>,
}

/// Lookup table of special cases keyed by exact folder name.
#[derive(Debug, Clone, Default)]
pub struct SpecialCases {
    by_folder: HashMap<String, SpecialCase>,
}

impl SpecialCases {
    pub fn new(cases: impl IntoIterator<Item = SpecialCase>) -> Self {
        Self {
            by_folder: cases
                .into_iter()
                .map(|c| (c.folder_name.clone(), c))
                .collect(),
        }
    }

    pub fn get(&self, folder_name: &str) -> Option<&SpecialCase> {
        self.by_folder.get(folder_name)
    }

    pub fn len(&self) -> usize {
        self.by_folder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_folder.is_empty()
    }
}

/// Parse a raw account name. Total: never fails, never panics.
pub fn parse(raw: &str) -> ParsedIdentity {
    // Extra info in parentheses: "Smith, John (Trust)"
    let (main, extra) = match raw.find('(') {
        Some(open) => {
            let after = &raw[open + 1..];
            let after = after.trim_end();
            let after = after.strip_suffix(')').unwrap_or(after);
            (&raw[..open], after.trim())
        }
        None => (raw, ""),
    };

    let mut id = ParsedIdentity {
        extra_info: extra.to_string(),
        ..Default::default()
    };

    if let Some(comma) = main.find(',') {
        id.last_name = main[..comma].trim().to_string();
        let mut rest = main[comma + 1..].split_whitespace();
        id.first_name = rest.next().unwrap_or_default().to_string();
        id.middle_name = rest.collect::<Vec<_>>().join(" ");
    } else {
        // Joint names keep only the part before '&'.
        let main = match main.find('&') {
            Some(amp) => &main[..amp],
            None => main,
        };
        let tokens: Vec<&str> = main.split_whitespace().collect();
        match tokens.as_slice() {
            [] => {}
            [only] => id.last_name = (*only).to_string(),
            [first, middle @ .., last] => {
                id.first_name = (*first).to_string();
                id.middle_name = middle.join(" ");
                id.last_name = (*last).to_string();
            }
        }
    }

    if id.last_name.is_empty() {
        // Degenerate shapes like ", John" or "(Trust)": search on the whole name.
        id.last_name = raw.trim().to_string();
    }

    id
}

/// Parse, honouring the special-case table first.
pub fn parse_with(raw: &str, special: &SpecialCases) -> ParsedIdentity {
    match special.get(raw) {
        Some(case) => {
            log::info!("special case for folder '{raw}': {:?}", case.expected_matches);
            ParsedIdentity {
                last_name: case.last_name.clone(),
                expected_matches: case.expected_matches.clone(),
                ..Default::default()
            }
        }
        None => parse(raw),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
