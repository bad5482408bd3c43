//! HTML text/attribute escaping.
//!
//! `&`, `<`, `>` are delegated to the `htmlescape` crate; `"` and `'` are
//! substituted directly afterwards so the five-entity output
//! (`&amp; &lt; &gt; &quot; &#39;`) is bit-exact regardless of what
//! `htmlescape`'s own attribute-escaping variant happens to emit for quotes.

/// Escape a string for use as HTML text content or an attribute value.
pub fn escape(input: &str) -> String {
    let partial = htmlescape::encode_minimal(input);
    partial.replace('"', "&quot;").replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_five_entities() {
        assert_eq!(
            escape(r#"a & b < c > d " e ' f"#),
            "a &amp; b &lt; c &gt; d &quot; e &#39; f"
        );
    }

    #[test]
    fn leaves_plain_text_untouched() {
        assert_eq!(escape("タイトル"), "タイトル");
    }
}
