//! File Scanner (C1): enumerate candidate source and style-sheet files.
//!
//! Builds an `ignore::WalkBuilder` with an inverted-ignore `OverrideBuilder`.
//! Parallelism is confined to parse time (C3), so the scan itself runs on one
//! thread and returns a plain `Vec`.
use std::path::{Path, PathBuf};

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;

const FIXED_IGNORES: &[&str] = &["node_modules", ".git", ".svn", ".hg"];

const BUILD_DIR_NAMES: &[&str] = &[
    "dist", "build", "out", "output", ".next", ".nuxt", ".output", "bundle", "compiled",
    "coverage", "reports",
];

const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];
const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less", "styl"];

pub struct ScanResult {
    pub source_files: Vec<PathBuf>,
    pub style_files: Vec<PathBuf>,
}

/// Returns the project root's immediate child directories whose name is a
/// recognized build-output directory.
pub fn detect_build_dirs(project_root: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let Ok(entries) = std::fs::read_dir(project_root) else {
        return dirs;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if BUILD_DIR_NAMES.contains(&name) {
                dirs.push(path);
            }
        }
    }
    dirs
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Walks `project_root`, applying the fixed ignores, detected build
/// directories, and user exclude patterns. Test-file patterns are
/// applied by the caller, since whether they're excluded depends on whether
/// test-file detection is enabled for the running rule.
pub fn scan(
    project_root: &Path,
    exclude_patterns: &[String],
) -> Result<ScanResult, anyhow::Error> {
    let build_dirs = detect_build_dirs(project_root);

    let mut override_builder = OverrideBuilder::new(project_root);
    override_builder.add("*")?;
    for name in FIXED_IGNORES {
        override_builder.add(&format!("!{name}"))?;
    }
    for dir in &build_dirs {
        if let Some(name) = dir.file_name().and_then(|n| n.to_str()) {
            override_builder.add(&format!("!{name}"))?;
        }
    }
    for pattern in exclude_patterns {
        let inverted = if let Some(stripped) = pattern.strip_prefix('!') {
            stripped.to_string()
        } else {
            format!("!{pattern}")
        };
        override_builder.add(&inverted)?;
    }

    let overrides = override_builder.build()?;

    let mut walk_builder = WalkBuilder::new(project_root);
    walk_builder
        .standard_filters(false)
        .hidden(false)
        .follow_links(false);
    if !overrides.is_empty() {
        walk_builder.overrides(overrides);
    }

    let mut source_files = Vec::new();
    let mut style_files = Vec::new();

    for entry in walk_builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if has_extension(path, SOURCE_EXTENSIONS) {
            source_files.push(path.to_path_buf());
        } else if has_extension(path, STYLE_EXTENSIONS) {
            style_files.push(path.to_path_buf());
        }
    }

    Ok(ScanResult {
        source_files,
        style_files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_tmpdir::test_tmpdir;

    #[test]
    fn scan_finds_source_and_style_files() {
        let tmpdir = test_tmpdir!(
            "src/index.ts" => "export const x = 1;",
            "src/style.css" => ".a{}",
            "node_modules/dep/index.js" => "module.exports = {};",
            "dist/bundle.js" => "// built"
        );
        let result = scan(tmpdir.root(), &[]).unwrap();
        assert_eq!(result.source_files.len(), 1);
        assert_eq!(result.style_files.len(), 1);
    }

    #[test]
    fn scan_honors_user_exclude_patterns() {
        let tmpdir = test_tmpdir!(
            "src/index.ts" => "export const x = 1;",
            "src/skip_me.ts" => "export const y = 1;"
        );
        let result = scan(tmpdir.root(), &["**/skip_me.ts".to_string()]).unwrap();
        assert_eq!(result.source_files.len(), 1);
    }

    #[test]
    fn detect_build_dirs_matches_known_names() {
        let tmpdir = test_tmpdir!(
            "dist/x.js" => "",
            "src/x.ts" => ""
        );
        let dirs = detect_build_dirs(tmpdir.root());
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].file_name().unwrap(), "dist");
    }
}
