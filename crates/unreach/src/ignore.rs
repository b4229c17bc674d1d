//! Ignore Filter (C10): per-kind glob suppression of finder output.
//!
//! The glob dialect here is deliberately narrower than `globset`'s shell-glob
//! semantics (no `**`, no bracket classes) -- just the two-wildcard dialect
//! (`*`, `?`) -- so it is hand-rolled over `regex` rather than routed through
//! `globset`. Nine independently configured pattern lists (files, packages,
//! exports, functions, variables, imports, types, CSS classes, assets) are
//! each compiled and applied the same way.
use regex::Regex;

use crate::error::ConfigError;

/// Compiles one glob pattern into the case-insensitive, fully-anchored regex
/// the ignore filter matches with: `*` -> `.*`, `?` -> `.`, everything else
/// escaped.
pub fn compile_ignore_pattern(field: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    let mut re = String::from("(?i)^");
    for ch in pattern.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|source| ConfigError::InvalidGlob {
        field,
        pattern: pattern.to_string(),
        message: source.to_string(),
    })
}

/// The nine compiled pattern lists, one per finder output kind.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    pub files: Vec<Regex>,
    pub packages: Vec<Regex>,
    pub exports: Vec<Regex>,
    pub functions: Vec<Regex>,
    pub variables: Vec<Regex>,
    pub imports: Vec<Regex>,
    pub types: Vec<Regex>,
    pub css_classes: Vec<Regex>,
    pub assets: Vec<Regex>,
}

/// Retains only the entries whose identifying field matches none of `patterns`.
pub fn filter_by<T>(patterns: &[Regex], items: Vec<T>, field: impl Fn(&T) -> &str) -> Vec<T> {
    if patterns.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| !patterns.iter().any(|p| p.is_match(field(item))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_anything() {
        let re = compile_ignore_pattern("files", "*.generated.ts").unwrap();
        assert!(re.is_match("foo.generated.ts"));
        assert!(!re.is_match("foo.generated.ts.bak"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        let re = compile_ignore_pattern("files", "a?c").unwrap();
        assert!(re.is_match("abc"));
        assert!(!re.is_match("abbc"));
    }

    #[test]
    fn special_characters_are_escaped() {
        let re = compile_ignore_pattern("files", "src/(legacy).ts").unwrap();
        assert!(re.is_match("src/(legacy).ts"));
        assert!(!re.is_match("src/Xlegacy.ts"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let re = compile_ignore_pattern("files", "README.md").unwrap();
        assert!(re.is_match("readme.md"));
    }

    #[test]
    fn filter_by_removes_matching_entries() {
        let patterns = vec![compile_ignore_pattern("files", "*.test.ts").unwrap()];
        let items = vec!["a.ts".to_string(), "a.test.ts".to_string()];
        let filtered = filter_by(&patterns, items, |s| s.as_str());
        assert_eq!(filtered, vec!["a.ts".to_string()]);
    }
}
