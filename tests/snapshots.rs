//! Structural tests covering documents that combine several features at once
//! (composite decorations, nested lists, TOC, and footnotes together).
//!
//! Assertions target substrings and relative ordering rather than a
//! byte-exact captured snapshot: the fixture composes enough moving parts
//! (TOC nesting, footnote numbering, decoration nesting, list sublists)
//! that a full-document snapshot would need the toolchain to regenerate
//! safely after any touch-up.

use kumihan_formatter::{convert_str, ConvertOptions};

const COMPOSITE_SOURCE: &str = "\
#目次#
##

#見出し1#
概要
##

#枠線+太字#
注意事項です((補足説明))。
##

- 項目一
  - 項目一の子
- #太字# 強調された項目 ##

#見出し2#
詳細
##
";

#[test]
fn composite_document_assembles_toc_decorations_lists_and_footnotes() {
    let outcome = convert_str(COMPOSITE_SOURCE, &ConvertOptions::default()).unwrap();
    let html = &outcome.html;

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>概要</title>"), "first 見出し1 becomes the title");

    // TOC: heading-2 nested under heading-1, inside a <nav>.
    let nav_start = html.find("<nav class=\"toc\">").expect("toc nav present");
    let nav_end = html.find("</nav>").expect("toc nav closes");
    let nav = &html[nav_start..nav_end];
    assert!(nav.contains("href=\"#heading-1\">概要"));
    assert!(nav.contains("href=\"#heading-2\">詳細"));
    assert!(nav.find("heading-1").unwrap() < nav.find("heading-2").unwrap());

    // Both headings render in the body in document order.
    assert!(html.contains("<h1 id=\"heading-1\">概要</h1>"));
    assert!(html.contains("<h2 id=\"heading-2\">詳細</h2>"));
    assert!(html.find("<h1 id=\"heading-1\">").unwrap() < html.find("<h2 id=\"heading-2\">").unwrap());

    // Composite decoration nests 枠線 (rank 5) outside 太字 (rank 30); a
    // decorated block whose only content is one paragraph renders that
    // paragraph's inline content directly, with no nested <p> (see S3).
    assert!(html.contains(
        "<div class=\"box\"><strong>注意事項です<sup id=\"fnref-1\"><a href=\"#fn-1\">1</a></sup>。</strong></div>"
    ));

    // The list: a sublist under the first item, and a decorated second item.
    assert!(html.contains("<li>項目一<ul><li>項目一の子</li></ul></li>"));
    assert!(html.contains("<li><strong>強調された項目</strong></li>"));

    // Footnote numbering and the appended footnotes section.
    assert!(html.contains("<li id=\"fn-1\">補足説明 <a href=\"#fnref-1\">↩</a></li>"));

    assert!(outcome.get_diagnostics().is_empty());
}

#[test]
fn diagnostics_json_reports_mixed_errors_independently_of_html() {
    let source = "#太子#\nx\n##\n\n#枠線#\n##\n";
    let outcome = convert_str(source, &ConvertOptions::default()).unwrap();

    let diags = outcome.get_diagnostics();
    assert_eq!(diags.len(), 2);
    assert!(diags
        .iter()
        .any(|d| d.kind == kumihan_formatter::diagnostics::ErrorKind::UnknownKeyword));
    assert!(diags
        .iter()
        .any(|d| d.kind == kumihan_formatter::diagnostics::ErrorKind::EmptyBlock));

    let json = outcome.diagnostics_json().unwrap();
    assert!(json.contains("\"UnknownKeyword\""));
    assert!(json.contains("\"EmptyBlock\""));
    assert!(json.contains("太字"), "suggestion for the unknown keyword is present");

    // The HTML still renders visible error markers for both failures.
    assert_eq!(outcome.html.matches("error-marker").count(), 2);
}
