//! Build-Tool Seeder (C7).
//!
//! Uses the same whole-word tool-name matching idiom as `entrypoints.rs`.
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ahashmap::AHashSet;
use regex::Regex;

const TOOLS: &[&str] = &[
    "tsup", "vite", "webpack", "rollup", "esbuild", "prettier", "eslint", "jest", "vitest",
    "vitepress", "tsx", "terser",
];

fn config_files_for_tool(tool: &str) -> &'static [&'static str] {
    match tool {
        "tsup" => &["tsup.config.ts", "tsup.config.js"],
        "vite" => &["vite.config.ts", "vite.config.js"],
        "webpack" => &["webpack.config.js", "webpack.config.ts"],
        "rollup" => &["rollup.config.js", "rollup.config.ts", "rollup.config.mjs"],
        "esbuild" => &["esbuild.config.js"],
        "prettier" => &[".prettierrc", ".prettierrc.json", ".prettierrc.js", "prettier.config.js"],
        "eslint" => &[".eslintrc", ".eslintrc.json", ".eslintrc.js", "eslint.config.js"],
        "jest" => &["jest.config.js", "jest.config.ts"],
        "vitest" => &["vitest.config.ts", "vitest.config.js"],
        "vitepress" => &[".vitepress/config.js", ".vitepress/config.ts"],
        "tsx" => &[],
        "terser" => &[],
        _ => &[],
    }
}

fn word_boundary_regex(word: &str) -> Regex {
    Regex::new(&format!(r"\b{}\b", regex::escape(word))).unwrap()
}

fn mentions_whole_word(haystack: &str, word: &str) -> bool {
    word_boundary_regex(word).is_match(haystack)
}

fn tsc_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(tsc|typescript)\b").unwrap())
}

pub struct SeedResult {
    pub used_packages: AHashSet<String>,
    pub reachable_config_files: Vec<PathBuf>,
}

/// Reads `package.json`'s `scripts`, concatenates every command, and seeds
/// used packages / reachable config files from the fixed tool table.
pub fn seed_from_scripts(project_root: &Path, scripts: &ahashmap::AHashMap<String, String>) -> SeedResult {
    let combined: String = scripts.values().cloned().collect::<Vec<_>>().join(" ");

    let mut used_packages = AHashSet::default();
    let mut reachable_config_files = Vec::new();

    for tool in TOOLS {
        if mentions_whole_word(&combined, tool) {
            used_packages.insert(tool.to_string());
            for config in config_files_for_tool(tool) {
                let path = project_root.join(config);
                if path.exists() {
                    reachable_config_files.push(path);
                }
            }
        }
    }

    if tsc_regex().is_match(&combined) {
        used_packages.insert("typescript".to_string());
        let tsconfig_path = project_root.join("tsconfig.json");
        if tsconfig_path.exists() {
            reachable_config_files.push(tsconfig_path);
        }
    }

    if mentions_whole_word(&combined, "tsup") {
        used_packages.insert("typescript".to_string());
        if let Some(tsup_config) = read_first_existing(
            project_root,
            &["tsup.config.ts", "tsup.config.js"],
        ) {
            if mentions_whole_word(&tsup_config, "terser") || mentions_whole_word(&tsup_config, "minify") {
                used_packages.insert("terser".to_string());
            }
        }
    }

    SeedResult {
        used_packages,
        reachable_config_files,
    }
}

fn read_first_existing(project_root: &Path, names: &[&str]) -> Option<String> {
    for name in names {
        if let Ok(content) = std::fs::read_to_string(project_root.join(name)) {
            return Some(content);
        }
    }
    None
}

/// Used by `UnusedScripts` to decide whether a script's command
/// mentions a recognized tool -- sharing the word-boundary matching used
/// above, per the documented open question that both checks are seeded
/// from the same pattern set.
pub fn mentions_recognized_tool(command: &str) -> bool {
    TOOLS.iter().any(|t| mentions_whole_word(command, t)) || tsc_regex().is_match(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_tmpdir::test_tmpdir;

    #[test]
    fn prettier_script_seeds_package_and_config() {
        let tmpdir = test_tmpdir!(".prettierrc" => "{}");
        let mut scripts = ahashmap::AHashMap::default();
        scripts.insert("fmt".to_string(), "prettier .".to_string());
        let result = seed_from_scripts(tmpdir.root(), &scripts);
        assert!(result.used_packages.contains("prettier"));
        assert!(result
            .reachable_config_files
            .contains(&tmpdir.root().join(".prettierrc")));
    }

    #[test]
    fn tsc_mention_seeds_typescript_and_tsconfig() {
        let tmpdir = test_tmpdir!("tsconfig.json" => "{}");
        let mut scripts = ahashmap::AHashMap::default();
        scripts.insert("build".to_string(), "tsc --build".to_string());
        let result = seed_from_scripts(tmpdir.root(), &scripts);
        assert!(result.used_packages.contains("typescript"));
    }

    #[test]
    fn substring_match_is_not_a_whole_word() {
        assert!(!mentions_whole_word("mytsccommand", "tsc"));
        assert!(mentions_whole_word("run tsc now", "tsc"));
    }
}
