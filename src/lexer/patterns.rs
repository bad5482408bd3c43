//! Line-kind matchers shared by `lex`.

use super::LineKind;

/// Matches a line starting with `#<header>#<rest>`. Returns `(header, rest)`
/// on success. The caller decides whether `rest` makes this a `MarkerOpen`
/// (rest is empty) or a `MarkerInline` (rest ends with `##`).
///
/// A line ending in `##` is the inline form `#header# content ##`, whose
/// header never embeds a literal `#`, so its closing `#` is the *first* one
/// after the opening `#`. Any other line is the open form `#header#`, whose
/// header may itself embed a `#` — e.g. a `color=#RRGGBB` attribute — so its
/// closing `#` is the *last* one on the line.
pub fn match_marker_open(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('#')?;
    // `###...` is the escape form and is handled before this is called, but
    // guard anyway so this function stays correct if called standalone.
    if rest.starts_with('#') {
        return None;
    }
    if rest.is_empty() {
        return None;
    }

    let close_idx = if line.ends_with("##") {
        rest.find('#')?
    } else {
        rest.rfind('#')?
    };
    let header = &rest[..close_idx];
    if header.is_empty() {
        return None;
    }
    let after = &rest[close_idx + 1..];
    Some((header, after))
}

/// Matches `- content` or `N. content`, returning indent (count of leading
/// space characters, expected in multiples of 2).
pub fn match_list_item(line: &str) -> Option<LineKind> {
    let indent_chars = line.len() - line.trim_start_matches(' ').len();
    let rest = &line[indent_chars..];

    if let Some(content) = rest.strip_prefix("- ") {
        return Some(LineKind::ListItem {
            indent_chars,
            ordered: false,
            marker_suffix: "-".to_string(),
            content: content.to_string(),
        });
    }

    let digits_len = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits_len > 0 {
        let after_digits = &rest[digits_len..];
        if let Some(content) = after_digits.strip_prefix(". ") {
            return Some(LineKind::ListItem {
                indent_chars,
                ordered: true,
                marker_suffix: format!("{}.", &rest[..digits_len]),
                content: content.to_string(),
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_open_rejects_escape_form() {
        assert!(match_marker_open("###escaped").is_none());
    }

    #[test]
    fn marker_open_finds_header_and_rest() {
        assert_eq!(match_marker_open("#太字# hi ##"), Some(("太字", " hi ##")));
    }

    #[test]
    fn marker_open_header_may_embed_hash_in_open_form() {
        assert_eq!(
            match_marker_open("#ハイライト color=#ffffcc#"),
            Some(("ハイライト color=#ffffcc", ""))
        );
    }

    #[test]
    fn list_item_nested_indent_is_counted() {
        match match_list_item("  - nested") {
            Some(LineKind::ListItem { indent_chars, .. }) => assert_eq!(indent_chars, 2),
            other => panic!("expected list item, got {:?}", other),
        }
    }

    #[test]
    fn ordered_list_item_parses_suffix() {
        match match_list_item("12. content") {
            Some(LineKind::ListItem {
                ordered,
                marker_suffix,
                content,
                ..
            }) => {
                assert!(ordered);
                assert_eq!(marker_suffix, "12.");
                assert_eq!(content, "content");
            }
            other => panic!("expected ordered list item, got {:?}", other),
        }
    }
}
