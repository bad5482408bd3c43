//! End-to-end scenario tests against the public `convert_str` API.

use kumihan_formatter::{convert_str, ConvertOptions, ErrorLevel};
use rstest::rstest;

fn convert(source: &str) -> String {
    convert_str(source, &ConvertOptions::default()).unwrap().html
}

#[test]
fn heading_and_paragraph_render_in_order() {
    let html = convert("#見出し1#\nタイトル\n##\n\n本文です。\n");
    assert!(html.contains("<h1 id=\"heading-1\">タイトル</h1>"));
    assert!(html.contains("<p>本文です。</p>"));
    assert!(html.find("heading-1").unwrap() < html.find("本文です").unwrap());
}

#[test]
fn composite_decoration_wraps_heading_in_emphasis() {
    let html = convert("#見出し2+太字#\n重要\n##\n");
    assert!(html.contains("<h2 id=\"heading-1\"><strong>重要</strong></h2>"));
}

#[test]
fn highlight_with_color_attribute_emits_inline_style() {
    let html = convert("#ハイライト color=#ffffcc#\n注目\n##\n");
    assert!(html.contains("<div class=\"highlight\" style=\"background-color:#ffffcc\">注目</div>"));
}

#[test]
fn unknown_keyword_produces_diagnostic_with_top_suggestion() {
    let outcome = convert_str("#太子#\nx\n##\n", &ConvertOptions::default()).unwrap();
    let diags = outcome.get_diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].suggestions[0], "太字");
    assert!(outcome.html.contains("太子"));
    assert!(outcome.html.contains("太字"));
}

#[test]
fn toc_placeholder_is_replaced_with_nested_heading_outline() {
    let html = convert("#目次#\n##\n\n#見出し1#\nA\n##\n\n#見出し2#\nB\n##\n");
    let toc_start = html.find("<ul>").expect("toc list present");
    let toc_end = html[toc_start..].find("heading-2").unwrap() + toc_start;
    assert!(html[toc_start..toc_end].contains("heading-1"));
    assert!(html.contains("<h1 id=\"heading-1\">A</h1>"));
    assert!(html.contains("<h2 id=\"heading-2\">B</h2>"));
}

#[test]
fn inline_footnote_renders_reference_and_section() {
    let html = convert("本文((注記))続き。\n");
    assert!(html.contains("本文<sup id=\"fnref-1\"><a href=\"#fn-1\">1</a></sup>続き。"));
    assert!(html.contains("<li id=\"fn-1\">注記 <a href=\"#fnref-1\">↩</a></li>"));
}

#[rstest]
#[case(ErrorLevel::Strict, true)]
#[case(ErrorLevel::Normal, false)]
#[case(ErrorLevel::Lenient, false)]
fn error_level_governs_unknown_keyword_handling(#[case] level: ErrorLevel, #[case] should_abort: bool) {
    let options = ConvertOptions {
        error_level: level,
        ..ConvertOptions::default()
    };
    let result = convert_str("#太子#\nx\n##\n", &options);
    assert_eq!(result.is_err(), should_abort);
}

#[test]
fn lenient_mode_renders_error_marker_as_literal_text() {
    let options = ConvertOptions {
        error_level: ErrorLevel::Lenient,
        ..ConvertOptions::default()
    };
    let html = convert_str("#太子#\nx\n##\n", &options).unwrap().html;
    assert!(!html.contains("error-marker"));
}

#[test]
fn include_source_view_embeds_raw_source() {
    let options = ConvertOptions {
        include_source_view: true,
        ..ConvertOptions::default()
    };
    let html = convert_str("本文\n", &options).unwrap().html;
    assert!(html.contains("<pre class=\"source\">本文"));
}

#[test]
fn cancellation_token_aborts_a_streaming_run() {
    let token = kumihan_formatter::CancellationToken::new();
    token.cancel();
    let mut source = String::new();
    for i in 0..20 {
        source.push_str(&format!("段落{}\n\n", i));
    }
    let options = ConvertOptions {
        chunk_threshold_lines: 2,
        cancellation_token: Some(token),
        ..ConvertOptions::default()
    };
    assert!(convert_str(&source, &options).is_err());
}
