//! Inline Parser.
//!
//! Processes a single text run (already isolated by the Block Parser) into
//! an `InlineSeq`. The grammar is unambiguous left-to-right: escape, ruby,
//! footnote, inline marker, else plain text.

use crate::ast::inline::{EmphasisKind, InlineNode, InlineSeq};
use crate::diagnostics::{Diagnostic, ErrorKind};
use crate::keyword::{self, KeywordError};
use crate::span::Span;

/// Mutable state threaded through a single parse pass so that footnote ids
/// stay monotonic and contiguous across the whole document — the inline
/// parser runs in source order as the block parser descends, so a
/// document-order counter here is equivalent to (and simpler than) a
/// post-hoc traversal pass.
pub struct InlineContext<'a> {
    pub footnote_counter: &'a mut u32,
    pub diagnostics: &'a mut Vec<Diagnostic>,
    pub footnotes: &'a mut Vec<crate::ast::FootnoteDef>,
    pub span: Span,
}

pub fn parse_inline(content: &str, ctx: &mut InlineContext) -> InlineSeq {
    let chars: Vec<char> = content.chars().collect();
    let mut nodes = Vec::new();
    let mut buf = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' && i + 1 < chars.len() {
            flush_text(&mut buf, &mut nodes);
            nodes.push(InlineNode::RawEscape {
                value: chars[i + 1].to_string(),
            });
            i += 2;
            continue;
        }

        if c == '｜' {
            if let Some((base, reading, consumed)) = try_parse_ruby(&chars[i..]) {
                flush_text(&mut buf, &mut nodes);
                nodes.push(InlineNode::Ruby { base, reading });
                i += consumed;
                continue;
            }
        }

        if c == '(' && chars.get(i + 1) == Some(&'(') {
            if let Some((text, consumed)) = try_parse_footnote(&chars[i..]) {
                flush_text(&mut buf, &mut nodes);
                *ctx.footnote_counter += 1;
                let id = format!("fn-{}", ctx.footnote_counter);
                let mut inner = InlineContext {
                    footnote_counter: ctx.footnote_counter,
                    diagnostics: ctx.diagnostics,
                    footnotes: ctx.footnotes,
                    span: ctx.span,
                };
                let body = parse_inline(&text, &mut inner);
                ctx.footnotes.push(crate::ast::FootnoteDef {
                    id: id.clone(),
                    body,
                    span: ctx.span,
                });
                nodes.push(InlineNode::FootnoteRef { id });
                i += consumed;
                continue;
            }
            // Unclosed `((`: literal text plus a diagnostic.
            ctx.diagnostics.push(Diagnostic::warning(
                ErrorKind::UnresolvedFootnote,
                ctx.span,
                "unclosed footnote marker '((' — emitted as literal text",
            ));
        }

        if c == '#' {
            if let Some((node, consumed)) = try_parse_inline_marker(&chars[i..], ctx) {
                flush_text(&mut buf, &mut nodes);
                nodes.push(node);
                i += consumed;
                continue;
            }
        }

        if c == '`' {
            if let Some((value, consumed)) = try_parse_inline_code(&chars[i..]) {
                flush_text(&mut buf, &mut nodes);
                nodes.push(InlineNode::InlineCode { value });
                i += consumed;
                continue;
            }
        }

        buf.push(c);
        i += 1;
    }

    flush_text(&mut buf, &mut nodes);
    nodes
}

fn flush_text(buf: &mut String, nodes: &mut InlineSeq) {
    if !buf.is_empty() {
        nodes.push(InlineNode::text(std::mem::take(buf)));
    }
}

/// `｜<base>《<reading>》`: `base` is any non-`《` text, `reading` is any
/// non-`》` text ending at `》`.
fn try_parse_ruby(chars: &[char]) -> Option<(String, String, usize)> {
    debug_assert_eq!(chars[0], '｜');
    let open_idx = chars.iter().position(|&c| c == '《')?;
    if open_idx == 0 {
        return None;
    }
    let close_idx = chars[open_idx + 1..].iter().position(|&c| c == '》')? + open_idx + 1;
    let base: String = chars[1..open_idx].iter().collect();
    let reading: String = chars[open_idx + 1..close_idx].iter().collect();
    Some((base, reading, close_idx + 1))
}

/// `` `<code>` ``: a single backtick-delimited run with no nested markup.
/// An unclosed backtick falls through to plain text (no diagnostic — unlike
/// the footnote and ruby forms, a bare backtick is common prose punctuation
/// in Japanese text and shouldn't warn on every occurrence).
fn try_parse_inline_code(chars: &[char]) -> Option<(String, usize)> {
    debug_assert_eq!(chars[0], '`');
    let close_idx = chars[1..].iter().position(|&c| c == '`')? + 1;
    if close_idx == 1 {
        return None;
    }
    let value: String = chars[1..close_idx].iter().collect();
    Some((value, close_idx + 1))
}

/// `((<text>))`.
fn try_parse_footnote(chars: &[char]) -> Option<(String, usize)> {
    debug_assert_eq!(&chars[0..2], &['(', '(']);
    let mut i = 2;
    while i + 1 < chars.len() {
        if chars[i] == ')' && chars[i + 1] == ')' {
            let text: String = chars[2..i].iter().collect();
            return Some((text, i + 2));
        }
        i += 1;
    }
    None
}

/// `#<keywords># <content> ##`. Returns the built
/// `Emphasis` (or literal-text fallback on a mixed-keyword diagnostic) plus
/// how many chars were consumed, or `None` if this isn't a well-formed
/// inline marker at all (falls through to plain text).
fn try_parse_inline_marker(chars: &[char], ctx: &mut InlineContext) -> Option<(InlineNode, usize)> {
    if chars.get(1) == Some(&'#') {
        return None; // `##` — not a marker open.
    }
    let header_end = chars[1..].iter().position(|&c| c == '#')? + 1;
    let header: String = chars[1..header_end].iter().collect();
    if header.is_empty() {
        return None;
    }
    let content_start = header_end + 1;
    let closer_at = find_marker_close(chars, content_start)?;
    let content: String = chars[content_start..closer_at].iter().collect();
    let total_consumed = closer_at + 2;

    let node = build_marker_node(&header, content.trim(), ctx);
    Some((node, total_consumed))
}

/// Finds the index of the `##` that closes the marker opened just before
/// `start`, accounting for nested `#...#...##` inline markers inside the
/// content — nested inline markers are permitted.
pub(crate) fn find_marker_close(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start;
    let mut depth: i32 = 1;
    while i < chars.len() {
        if chars[i] == '#' && chars.get(i + 1) == Some(&'#') {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
            i += 2;
            continue;
        }
        if chars[i] == '#' {
            if let Some(rel) = chars[i + 1..].iter().position(|&c| c == '#') {
                depth += 1;
                i += rel + 2;
                continue;
            }
        }
        i += 1;
    }
    None
}

fn build_marker_node(header: &str, content: &str, ctx: &mut InlineContext) -> InlineNode {
    match keyword::parse_composite(header) {
        Ok(keywords) => {
            let all_inline = keywords
                .iter()
                .all(|k| k.html_tag == "strong" || k.html_tag == "em");
            if !all_inline || keywords.is_empty() {
                ctx.diagnostics.push(Diagnostic::warning(
                    ErrorKind::MixedInlineBlock,
                    ctx.span,
                    format!("'{}' mixes inline and block-only keywords on one line", header),
                ));
                return InlineNode::text(format!("#{}# {} ##", header, content));
            }
            let mut inner = parse_inline(content, ctx);
            for kw in keywords.iter().rev() {
                let kind = if kw.html_tag == "strong" {
                    EmphasisKind::Bold
                } else {
                    EmphasisKind::Italic
                };
                inner = vec![InlineNode::Emphasis { kind, children: inner }];
            }
            inner.into_iter().next().unwrap_or(InlineNode::text(""))
        }
        Err(KeywordError::UnknownKeyword(unknown)) => {
            ctx.diagnostics.push(
                Diagnostic::error(
                    ErrorKind::UnknownKeyword,
                    ctx.span,
                    format!("unknown keyword '{}'", unknown),
                )
                .with_keyword_suggestions(&unknown),
            );
            InlineNode::text(format!("#{}# {} ##", header, content))
        }
        Err(other) => {
            ctx.diagnostics.push(Diagnostic::error(
                ErrorKind::InvalidAttribute,
                ctx.span,
                format!("{:?}", other),
            ));
            InlineNode::text(format!("#{}# {} ##", header, content))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Position;

    fn ctx<'a>(
        counter: &'a mut u32,
        diags: &'a mut Vec<Diagnostic>,
        footnotes: &'a mut Vec<crate::ast::FootnoteDef>,
    ) -> InlineContext<'a> {
        InlineContext {
            footnote_counter: counter,
            diagnostics: diags,
            footnotes,
            span: Span::point(Position::start()),
        }
    }

    #[test]
    fn plain_text_round_trips() {
        let mut c = 0;
        let mut d = Vec::new();
        let mut f = Vec::new();
        let seq = parse_inline("hello world", &mut ctx(&mut c, &mut d, &mut f));
        assert_eq!(seq, vec![InlineNode::text("hello world")]);
    }

    #[test]
    fn ruby_is_parsed() {
        let mut c = 0;
        let mut d = Vec::new();
        let mut f = Vec::new();
        let seq = parse_inline("｜漢字《かんじ》", &mut ctx(&mut c, &mut d, &mut f));
        assert_eq!(
            seq,
            vec![InlineNode::Ruby {
                base: "漢字".to_string(),
                reading: "かんじ".to_string()
            }]
        );
    }

    #[test]
    fn footnote_generates_sequential_id() {
        let mut c = 0;
        let mut d = Vec::new();
        let mut f = Vec::new();
        let seq = parse_inline("本文((注記))続き。", &mut ctx(&mut c, &mut d, &mut f));
        assert_eq!(
            seq,
            vec![
                InlineNode::text("本文"),
                InlineNode::FootnoteRef { id: "fn-1".to_string() },
                InlineNode::text("続き。"),
            ]
        );
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].id, "fn-1");
    }

    #[test]
    fn inline_marker_wraps_emphasis() {
        let mut c = 0;
        let mut d = Vec::new();
        let mut f = Vec::new();
        let seq = parse_inline("#太字# bold text ##", &mut ctx(&mut c, &mut d, &mut f));
        assert_eq!(
            seq,
            vec![InlineNode::Emphasis {
                kind: EmphasisKind::Bold,
                children: vec![InlineNode::text("bold text")]
            }]
        );
    }

    #[test]
    fn unclosed_footnote_is_literal_with_diagnostic() {
        let mut c = 0;
        let mut d = Vec::new();
        let mut f = Vec::new();
        let seq = parse_inline("open ((never closes", &mut ctx(&mut c, &mut d, &mut f));
        assert!(matches!(&seq[0], InlineNode::Text { value } if value.contains("open")));
        assert!(!d.is_empty());
    }

    #[test]
    fn backtick_span_becomes_inline_code() {
        let mut c = 0;
        let mut d = Vec::new();
        let mut f = Vec::new();
        let seq = parse_inline("run `cargo build` now", &mut ctx(&mut c, &mut d, &mut f));
        assert_eq!(
            seq,
            vec![
                InlineNode::text("run "),
                InlineNode::InlineCode { value: "cargo build".to_string() },
                InlineNode::text(" now"),
            ]
        );
    }

    #[test]
    fn unclosed_backtick_falls_through_to_text() {
        let mut c = 0;
        let mut d = Vec::new();
        let mut f = Vec::new();
        let seq = parse_inline("a `b", &mut ctx(&mut c, &mut d, &mut f));
        assert_eq!(seq, vec![InlineNode::text("a `b")]);
    }

    #[test]
    fn escape_emits_literal_char() {
        let mut c = 0;
        let mut d = Vec::new();
        let mut f = Vec::new();
        let seq = parse_inline("\\#not a marker", &mut ctx(&mut c, &mut d, &mut f));
        assert_eq!(seq[0], InlineNode::RawEscape { value: "#".to_string() });
    }
}
