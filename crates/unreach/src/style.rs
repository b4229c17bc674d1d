//! Style-Sheet Parser (C2).
//!
//! Regex-grade extraction of class selectors; a full CSS parser is
//! unwarranted for this.
use ahashmap::AHashSet;
use regex::Regex;
use std::sync::OnceLock;

fn selector_class_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The trailing `\)?` lets a pseudo-class argument like `:not(.bar)` be
    // captured whole (`bar)`) so the `(`/`)` filter below can reject it.
    RE.get_or_init(|| Regex::new(r"\.([A-Za-z_-][A-Za-z0-9_-]*\)?)").unwrap())
}

fn apply_directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@apply\s+([^;]+);").unwrap())
}

/// Extracts every class name defined by a style-sheet's content.
pub fn extract_classes(content: &str) -> AHashSet<String> {
    let mut classes = AHashSet::default();

    for cap in selector_class_regex().captures_iter(content) {
        let name = &cap[1];
        if name.contains('(') || name.contains(')') {
            continue;
        }
        classes.insert(name.to_string());
    }

    for directive in apply_directive_regex().captures_iter(content) {
        for token in directive[1].split_whitespace() {
            if token.starts_with('!') || token.is_empty() {
                continue;
            }
            classes.insert(token.to_string());
        }
    }

    classes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_simple_selector_classes() {
        let classes = extract_classes(".a{} .b{} .c{}");
        assert!(classes.contains("a"));
        assert!(classes.contains("b"));
        assert!(classes.contains("c"));
        assert_eq!(classes.len(), 3);
    }

    #[test]
    fn skips_pseudo_class_arguments() {
        let classes = extract_classes(".foo:not(.bar) { color: red; }");
        assert!(classes.contains("foo"));
        assert!(!classes.contains("bar"));
    }

    #[test]
    fn extracts_apply_directive_tokens() {
        let classes = extract_classes("@apply flex items-center !important;");
        assert!(classes.contains("flex"));
        assert!(classes.contains("items-center"));
        assert!(!classes.contains("!important"));
    }
}
