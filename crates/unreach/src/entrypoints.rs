//! Entry-Point Detector (C6).
//!
//! Resolves the entry-point set from configured paths, `package.json` entry
//! fields, `tsconfig.json` `files`/`include`, and framework build-directory
//! conventions, applying the same "does this word appear as a whole word"
//! test used elsewhere for matching tool names against resolved file paths.
use std::path::{Path, PathBuf};

use ahashmap::AHashSet;
use globset::{Glob, GlobSetBuilder};
use path_clean::PathClean;
use packagejson::PackageJson;
use tsconfig::TsConfigJson;

const SOURCE_DIR_NAMES: &[&str] = &["src", "source", "lib", "app", "packages", "modules"];
const COMMON_ENTRY_STEMS: &[&str] = &["index", "main", "app", "server", "client", "entry", "start"];
const COMMON_ENTRY_EXTS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

const MAX_INCLUDE_MATCHES: usize = 5;
const MAX_FRAMEWORK_MATCHES: usize = 10;

struct FrameworkPattern {
    glob: &'static str,
}

const FRAMEWORK_PATTERNS: &[FrameworkPattern] = &[
    FrameworkPattern { glob: "pages/**" },
    FrameworkPattern { glob: "app/**" },
    FrameworkPattern { glob: "nuxt.config.*" },
    FrameworkPattern { glob: "src/routes/**" },
    FrameworkPattern { glob: "src/pages/**.astro" },
    FrameworkPattern { glob: "app/routes/**" },
    FrameworkPattern { glob: "src/main.*" },
    FrameworkPattern { glob: "src/main.ts" },
    FrameworkPattern { glob: "src/app/**" },
];

fn walk_all_files(project_root: &Path) -> Vec<PathBuf> {
    ignore::WalkBuilder::new(project_root)
        .standard_filters(false)
        .build()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file())
        .collect()
}

fn build_dir_rewrite_extensions(ext: &str) -> &'static [&'static str] {
    match ext {
        "js" => &["tsx", "ts", "jsx", "js"],
        "jsx" => &["tsx", "jsx"],
        "mjs" => &["mts", "mjs"],
        "cjs" => &["cts", "cjs"],
        _ => &[],
    }
}

/// Attempts the source-path rewrite: replace a
/// build-directory path segment with each candidate source directory and
/// vary the extension, returning the first candidate that exists on disk.
fn rewrite_build_path(
    project_root: &Path,
    resolved: &Path,
    build_dirs: &[PathBuf],
) -> Option<PathBuf> {
    let rel = resolved.strip_prefix(project_root).ok()?;
    let mut components = rel.components();
    let first = components.next()?;
    let first_str = first.as_os_str().to_str()?;

    let is_build_dir = build_dirs
        .iter()
        .any(|d| d.file_name().and_then(|n| n.to_str()) == Some(first_str));
    if !is_build_dir {
        return None;
    }

    let rest: PathBuf = components.as_path().to_path_buf();
    let ext = resolved.extension()?.to_str()?;
    let candidate_exts = build_dir_rewrite_extensions(ext);
    if candidate_exts.is_empty() {
        return None;
    }

    for source_dir in SOURCE_DIR_NAMES {
        for candidate_ext in candidate_exts {
            let mut candidate = project_root.join(source_dir).join(&rest);
            candidate.set_extension(candidate_ext);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Computes the initial seed set in priority order, deduplicating
/// as each source contributes entries.
pub fn detect_entry_points(
    project_root: &Path,
    configured_entries: &[PathBuf],
    package_json: Option<&PackageJson>,
    tsconfig: Option<&TsConfigJson>,
    build_dirs: &[PathBuf],
    test_file_matcher: &globset::GlobSet,
    test_file_detection_enabled: bool,
) -> Vec<PathBuf> {
    let mut seen = AHashSet::default();
    let mut entries = Vec::new();
    let mut push = |p: PathBuf, seen: &mut AHashSet<PathBuf>, entries: &mut Vec<PathBuf>| {
        let cleaned = p.clean();
        if seen.insert(cleaned.clone()) {
            entries.push(cleaned);
        }
    };

    if !configured_entries.is_empty() {
        for entry in configured_entries {
            push(entry.clone(), &mut seen, &mut entries);
        }
        return entries;
    }

    if let Some(pkg) = package_json {
        for raw in pkg.entry_point_strings() {
            let resolved = project_root.join(&raw).clean();
            let final_path = rewrite_build_path(project_root, &resolved, build_dirs).unwrap_or(resolved);
            push(final_path, &mut seen, &mut entries);
        }
    }

    if let Some(ts) = tsconfig {
        if let Some(files) = &ts.files {
            for f in files {
                push(project_root.join(f), &mut seen, &mut entries);
            }
        }
        if let Some(include) = &ts.include {
            for pattern in include {
                let Ok(glob) = Glob::new(pattern) else { continue };
                let mut builder = GlobSetBuilder::new();
                builder.add(glob);
                let Ok(set) = builder.build() else { continue };
                let mut count = 0;
                for path in walk_all_files(project_root) {
                    if count >= MAX_INCLUDE_MATCHES {
                        break;
                    }
                    if let Ok(rel) = path.strip_prefix(project_root) {
                        if set.is_match(rel) {
                            push(path.clone(), &mut seen, &mut entries);
                            count += 1;
                        }
                    }
                }
            }
        }
    }

    let mut source_dirs: Vec<PathBuf> = SOURCE_DIR_NAMES
        .iter()
        .map(|d| project_root.join(d))
        .filter(|d| d.is_dir())
        .collect();
    source_dirs.push(project_root.to_path_buf());

    for dir in &source_dirs {
        let mut hit = false;
        for stem in COMMON_ENTRY_STEMS {
            if hit {
                break;
            }
            for ext in COMMON_ENTRY_EXTS {
                let candidate = dir.join(format!("{stem}.{ext}"));
                if candidate.is_file() {
                    push(candidate, &mut seen, &mut entries);
                    hit = true;
                    break;
                }
                let nested = dir.join(stem).join(format!("index.{ext}"));
                if nested.is_file() {
                    push(nested, &mut seen, &mut entries);
                    hit = true;
                    break;
                }
            }
        }
    }

    for pattern in FRAMEWORK_PATTERNS {
        let Ok(glob) = Glob::new(pattern.glob) else { continue };
        let mut builder = GlobSetBuilder::new();
        builder.add(glob);
        let Ok(set) = builder.build() else { continue };
        let mut count = 0;
        for path in walk_all_files(project_root) {
            if count >= MAX_FRAMEWORK_MATCHES {
                break;
            }
            if let Ok(rel) = path.strip_prefix(project_root) {
                if set.is_match(rel) {
                    push(path.clone(), &mut seen, &mut entries);
                    count += 1;
                }
            }
        }
    }

    if test_file_detection_enabled {
        for path in walk_all_files(project_root) {
            if let Ok(rel) = path.strip_prefix(project_root) {
                if let Some(rel_str) = rel.to_str() {
                    if test_file_matcher.is_match(rel_str) {
                        push(path.clone(), &mut seen, &mut entries);
                    }
                }
            }
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_tmpdir::test_tmpdir;

    #[test]
    fn configured_entries_short_circuit_auto_detection() {
        let tmpdir = test_tmpdir!("src/index.ts" => "export const x = 1;");
        let configured = vec![tmpdir.root().join("src/index.ts")];
        let entries = detect_entry_points(
            tmpdir.root(),
            &configured,
            None,
            None,
            &[],
            &globset::GlobSetBuilder::new().build().unwrap(),
            false,
        );
        assert_eq!(entries, vec![tmpdir.root().join("src/index.ts").clean()]);
    }

    #[test]
    fn common_entry_pattern_is_found_under_src() {
        let tmpdir = test_tmpdir!("src/index.ts" => "export const x = 1;");
        let entries = detect_entry_points(
            tmpdir.root(),
            &[],
            None,
            None,
            &[],
            &globset::GlobSetBuilder::new().build().unwrap(),
            false,
        );
        assert!(entries.contains(&tmpdir.root().join("src/index.ts").clean()));
    }
}
