//! Input normalization: BOM stripping and CRLF/CR → LF.

/// Strip a UTF-8 BOM if present, and normalize CRLF and bare CR to LF.
pub fn normalize_source(source: &str) -> String {
    let without_bom = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut out = String::with_capacity(without_bom.len());
    let mut chars = without_bom.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bom() {
        assert_eq!(normalize_source("\u{feff}hello"), "hello");
    }

    #[test]
    fn normalizes_crlf_and_cr() {
        assert_eq!(normalize_source("a\r\nb\rc\n"), "a\nb\nc\n");
    }
}
