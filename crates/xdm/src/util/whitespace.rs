//! XML whitespace handling (`#x20 | #x9 | #xD | #xA`), as used by the
//! `whiteSpace="collapse"` facet shared by every non-string atomic type.

#[inline]
pub fn is_xml_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Strips leading and trailing XML whitespace only.
pub fn trim_xml_whitespace(s: &str) -> &str {
    s.trim_matches(is_xml_whitespace)
}

/// Collapses internal runs of XML whitespace to a single space and trims.
pub fn collapse_xml_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for ch in s.chars() {
        if is_xml_whitespace(ch) {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }
    out
}

/// True if the value contains any XML whitespace character.
pub fn contains_xml_whitespace(s: &str) -> bool {
    s.chars().any(is_xml_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_joins_runs_and_trims() {
        assert_eq!(collapse_xml_whitespace("  a \t\n b  "), "a b");
        assert_eq!(collapse_xml_whitespace("\n\n"), "");
    }

    #[test]
    fn trim_keeps_non_xml_whitespace() {
        assert_eq!(trim_xml_whitespace("\u{a0}x "), "\u{a0}x");
    }
}
