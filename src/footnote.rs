//! Footnote Resolver.
//!
//! Kumihan footnotes are written inline (`((text))`) with no separate
//! definition syntax, so the reference and its body are created together by
//! the Inline Parser at the moment it sees the opening `((` — there is no
//! cross-document linking pass to run. What this component owns is
//! everything downstream of that: the `fn-N`/`fnref-N` id scheme and
//! rendering the footnotes section appended at document end.

use crate::ast::Document;
use crate::render::escape::escape;
use crate::render::render_inline;

/// Parse the numeric suffix out of a `fn-N` id, used to derive the matching
/// `fnref-N` backlink id when rendering an inline reference.
pub fn footnote_number(id: &str) -> Option<&str> {
    id.strip_prefix("fn-")
}

/// Render one inline footnote reference: `<sup id="fnref-N"><a href="#fn-N">N</a></sup>`.
/// Falls back to literal escaped text if `id` doesn't resolve to a `fn-N`
/// shape — this should not occur once the inline parser has run, kept as a
/// defensive degrade rather than a panic since this AST may in principle be
/// constructed by hand (e.g. in tests) with a dangling id.
pub fn render_footnote_ref(id: &str) -> String {
    match footnote_number(id) {
        Some(n) => format!(
            "<sup id=\"fnref-{n}\"><a href=\"#fn-{n}\">{n}</a></sup>",
            n = n
        ),
        None => escape(id),
    }
}

/// Render the footnotes section appended at document end, or `None` when
/// the document has no footnotes.
pub fn render_footnotes_section(doc: &Document) -> Option<String> {
    if doc.footnotes.is_empty() {
        return None;
    }
    let mut out = String::from("<div class=\"footnotes\"><ol>");
    for footnote in &doc.footnotes {
        let n = footnote_number(&footnote.id).unwrap_or(&footnote.id);
        out.push_str(&format!("<li id=\"fn-{n}\">", n = n));
        out.push_str(&render_inline(&footnote.body));
        out.push_str(&format!(
            " <a href=\"#fnref-{n}\">\u{21a9}</a></li>",
            n = n
        ));
    }
    out.push_str("</ol></div>");
    Some(out)
}

/// Footnote ids are contiguous `fn-1..fn-N` in document order — checked
/// defensively since the renderer's backlink math assumes it.
pub fn ids_are_contiguous(doc: &Document) -> bool {
    doc.footnotes
        .iter()
        .enumerate()
        .all(|(i, f)| f.id == format!("fn-{}", i + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footnote_ref_renders_sup_and_link() {
        assert_eq!(
            render_footnote_ref("fn-1"),
            "<sup id=\"fnref-1\"><a href=\"#fn-1\">1</a></sup>"
        );
    }

    #[test]
    fn section_is_none_when_no_footnotes() {
        let doc = crate::parser::parse("本文です。\n");
        assert!(render_footnotes_section(&doc).is_none());
    }

    #[test]
    fn section_lists_body_and_backlink() {
        let doc = crate::parser::parse("本文((注記))続き。\n");
        let section = render_footnotes_section(&doc).unwrap();
        assert!(section.contains("<li id=\"fn-1\">"));
        assert!(section.contains("注記"));
        assert!(section.contains("href=\"#fnref-1\""));
    }

    #[test]
    fn ids_contiguous_over_multiple_footnotes() {
        let doc = crate::parser::parse("一((甲))二((乙))三\n");
        assert!(ids_are_contiguous(&doc));
    }
}
