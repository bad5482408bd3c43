//! Keyword Registry.
//!
//! The authoritative, process-wide immutable catalog of valid block
//! keywords, their attribute schemas, and their HTML mapping. Loaded once
//! behind a `OnceLock` and read concurrently by every other component
//! without synchronization.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// What a keyword decorates, used to disambiguate marker parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeywordCategory {
    Heading,
    Decoration,
    Container,
    Collapsible,
    SpecialToc,
    SpecialImage,
}

/// An attribute a keyword recognizes, and how its value is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrKind {
    /// A CSS color literal (`#RRGGBB` or a small named-color allow-list).
    Color,
    /// Free-form text, used verbatim.
    Text,
}

/// Immutable descriptor for one keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub name: &'static str,
    pub html_tag: &'static str,
    pub css_class: Option<&'static str>,
    pub attrs: &'static [(&'static str, AttrKind)],
    pub category: KeywordCategory,
    /// Lower ranks wrap higher ranks when composed into a single block.
    pub nesting_order_rank: u8,
}

impl Keyword {
    pub fn attr_kind(&self, attr_name: &str) -> Option<AttrKind> {
        self.attrs
            .iter()
            .find(|(name, _)| *name == attr_name)
            .map(|(_, kind)| *kind)
    }
}

macro_rules! heading_keyword {
    ($name:expr, $level:expr, $rank:expr) => {
        Keyword {
            name: $name,
            html_tag: concat!("h", $level),
            css_class: None,
            attrs: &[],
            category: KeywordCategory::Heading,
            nesting_order_rank: $rank,
        }
    };
}

/// CSS named colors accepted in addition to `#RRGGBB`.
pub const NAMED_COLORS: &[&str] = &[
    "red", "green", "blue", "yellow", "orange", "purple", "black", "white", "gray", "pink",
];

static KEYWORDS: &[Keyword] = &[
    heading_keyword!("見出し1", 1, 10),
    heading_keyword!("見出し2", 2, 11),
    heading_keyword!("見出し3", 3, 12),
    heading_keyword!("見出し4", 4, 13),
    heading_keyword!("見出し5", 5, 14),
    Keyword {
        name: "太字",
        html_tag: "strong",
        css_class: None,
        attrs: &[],
        category: KeywordCategory::Decoration,
        nesting_order_rank: 30,
    },
    Keyword {
        name: "イタリック",
        html_tag: "em",
        css_class: None,
        attrs: &[],
        category: KeywordCategory::Decoration,
        nesting_order_rank: 31,
    },
    Keyword {
        name: "枠線",
        html_tag: "div",
        css_class: Some("box"),
        attrs: &[],
        category: KeywordCategory::Container,
        nesting_order_rank: 5,
    },
    Keyword {
        name: "ハイライト",
        html_tag: "div",
        css_class: Some("highlight"),
        attrs: &[("color", AttrKind::Color)],
        category: KeywordCategory::Container,
        nesting_order_rank: 6,
    },
    Keyword {
        name: "折りたたみ",
        html_tag: "details",
        css_class: None,
        attrs: &[],
        category: KeywordCategory::Collapsible,
        nesting_order_rank: 1,
    },
    Keyword {
        name: "ネタバレ",
        html_tag: "details",
        css_class: Some("spoiler"),
        attrs: &[],
        category: KeywordCategory::Collapsible,
        nesting_order_rank: 1,
    },
    Keyword {
        name: "目次",
        html_tag: "div",
        css_class: Some("toc"),
        attrs: &[],
        category: KeywordCategory::SpecialToc,
        nesting_order_rank: 0,
    },
    Keyword {
        name: "画像",
        html_tag: "img",
        css_class: None,
        attrs: &[("alt", AttrKind::Text)],
        category: KeywordCategory::SpecialImage,
        nesting_order_rank: 0,
    },
];

fn build_index() -> HashMap<&'static str, &'static Keyword> {
    KEYWORDS.iter().map(|k| (k.name, k)).collect()
}

fn index() -> &'static HashMap<&'static str, &'static Keyword> {
    static INDEX: OnceLock<HashMap<&'static str, &'static Keyword>> = OnceLock::new();
    INDEX.get_or_init(build_index)
}

/// `lookup(name) -> Keyword?`: exact match against the canonical name.
pub fn lookup(name: &str) -> Option<&'static Keyword> {
    index().get(name).copied()
}

/// `suggest(unknown_name, limit) -> [Keyword]`, ranked by Levenshtein
/// distance, ties broken lexicographically on the canonical name.
pub fn suggest(unknown_name: &str, limit: usize) -> Vec<&'static Keyword> {
    let mut ranked: Vec<(usize, &'static Keyword)> = KEYWORDS
        .iter()
        .map(|k| (levenshtein(unknown_name, k.name), k))
        .collect();
    ranked.sort_by(|(da, ka), (db, kb)| da.cmp(db).then_with(|| ka.name.cmp(kb.name)));
    ranked.into_iter().take(limit).map(|(_, k)| k).collect()
}

/// All registered keywords, in declaration order. Used by tests and by
/// `suggest`'s exhaustive scan.
pub fn all() -> &'static [Keyword] {
    KEYWORDS
}

/// Levenshtein edit distance over `char`s (Japanese keywords are short, so
/// an O(nm) DP table is more than fast enough and needs no external crate).
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());

    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr = vec![0usize; m + 1];

    for i in 1..=n {
        curr[0] = i;
        for j in 1..=m {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[m]
}

/// Error produced while parsing a marker header's keywords or attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum KeywordError {
    UnknownKeyword(String),
    InvalidAttribute { attr: String, value: String },
    InvalidColor(String),
}

/// `parse_composite(marker_text) -> [Keyword] | Error`.
///
/// The full header text looks like `ハイライト color=#ffffcc` or
/// `見出し2+太字`: the keyword specification is always the first
/// whitespace-delimited token, `+`-joined; everything after the first
/// token is attributes, handled separately by `parse_attributes`.
pub fn parse_composite(marker_text: &str) -> Result<Vec<&'static Keyword>, KeywordError> {
    let keyword_part = marker_text.split_whitespace().next().unwrap_or("");
    let mut seen = std::collections::HashSet::new();
    let mut keywords = Vec::new();
    for token in keyword_part.split('+') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let kw = lookup(token).ok_or_else(|| KeywordError::UnknownKeyword(token.to_string()))?;
        if seen.insert(kw.name) {
            keywords.push(kw);
        }
    }
    keywords.sort_by_key(|k| k.nesting_order_rank);
    Ok(keywords)
}

/// `parse_attributes(marker_text) -> map<str,str> | Error`.
///
/// Extracts `key=value` pairs that follow the keyword specification
/// (the header's first token); values may be bare or double-quoted.
/// `color` attributes are validated immediately since the registry is the
/// only place that knows the color grammar.
pub fn parse_attributes(
    marker_text: &str,
) -> Result<std::collections::HashMap<String, String>, KeywordError> {
    let mut attrs = std::collections::HashMap::new();
    for token in marker_text.split_whitespace().skip(1) {
        let Some((key, raw_value)) = token.split_once('=') else {
            continue;
        };
        let value = raw_value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(raw_value)
            .to_string();
        if key == "color" && !is_valid_color(&value) {
            return Err(KeywordError::InvalidColor(value));
        }
        attrs.insert(key.to_string(), value);
    }
    Ok(attrs)
}

/// Validate a color attribute value against `#RRGGBB` or `NAMED_COLORS`.
pub fn is_valid_color(value: &str) -> bool {
    if let Some(hex) = value.strip_prefix('#') {
        return hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    NAMED_COLORS.contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_canonical_keywords() {
        assert_eq!(lookup("太字").unwrap().html_tag, "strong");
        assert_eq!(lookup("見出し1").unwrap().html_tag, "h1");
        assert!(lookup("nonexistent").is_none());
    }

    #[test]
    fn suggest_ranks_by_edit_distance_then_name() {
        let suggestions = suggest("太子", 3);
        assert_eq!(suggestions[0].name, "太字");
    }

    #[test]
    fn color_validation_accepts_hex_and_named() {
        assert!(is_valid_color("#ffffcc"));
        assert!(is_valid_color("red"));
        assert!(!is_valid_color("#zzzzzz"));
        assert!(!is_valid_color("chartreuse"));
    }

    #[test]
    fn nesting_rank_orders_container_below_decoration() {
        let box_kw = lookup("枠線").unwrap();
        let strong_kw = lookup("太字").unwrap();
        assert!(box_kw.nesting_order_rank < strong_kw.nesting_order_rank);
    }
}
