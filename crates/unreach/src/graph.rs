//! Dependency Graph (C5).
//!
//! An append-only node table (`path_to_id` + parallel `Vec`s of paths and
//! summaries) plus a memoized relative-specifier resolver. The resolver only
//! handles extension/index resolution; `package.json` `exports` conditions
//! and `tsconfig.json` `paths` remapping are out of scope.
use std::path::{Path, PathBuf};

use ahashmap::{AHashMap, AHashSet};
use parking_lot::Mutex;
use path_clean::PathClean;
use rayon::prelude::*;

use crate::cache::{AnalysisCache, FileMetadata};
use crate::config::UnreachConfig;
use crate::error::Warning;
use crate::parse::{self, FileSummary};
use crate::scan;
use crate::style;

const RESOLVE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", ""];

pub struct DependencyGraph {
    pub path_to_id: AHashMap<PathBuf, usize>,
    pub nodes: Vec<FileSummary>,
    pub paths: Vec<PathBuf>,
    pub style_classes: AHashMap<PathBuf, AHashSet<String>>,
    resolution_cache: Mutex<AHashMap<(PathBuf, String), Option<PathBuf>>>,
}

impl DependencyGraph {
    pub(crate) fn empty() -> Self {
        Self {
            path_to_id: AHashMap::default(),
            nodes: Vec::new(),
            paths: Vec::new(),
            style_classes: AHashMap::default(),
            resolution_cache: Mutex::new(AHashMap::default()),
        }
    }

    pub fn get(&self, path: &Path) -> Option<&FileSummary> {
        self.path_to_id.get(path).map(|&id| &self.nodes[id])
    }

    pub fn get_by_id(&self, id: usize) -> &FileSummary {
        &self.nodes[id]
    }

    pub fn id_of(&self, path: &Path) -> Option<usize> {
        self.path_to_id.get(path).copied()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.path_to_id.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &FileSummary)> {
        self.paths.iter().zip(self.nodes.iter())
    }

    pub(crate) fn insert(&mut self, path: PathBuf, summary: FileSummary) -> usize {
        if let Some(&id) = self.path_to_id.get(&path) {
            self.nodes[id] = summary;
            return id;
        }
        let id = self.nodes.len();
        self.path_to_id.insert(path.clone(), id);
        self.paths.push(path);
        self.nodes.push(summary);
        id
    }

    pub fn set_entry_point(&mut self, path: &Path) {
        if let Some(&id) = self.path_to_id.get(path) {
            self.nodes[id].is_entry_point = true;
        }
    }

    /// Resolves a relative specifier against the graph; bare specifiers
    /// are never resolved here.
    pub fn resolve(&self, from_file: &Path, specifier: &str) -> Option<PathBuf> {
        if !is_relative(specifier) {
            return None;
        }
        let key = (from_file.to_path_buf(), specifier.to_string());
        if let Some(cached) = self.resolution_cache.lock().get(&key) {
            return cached.clone();
        }

        let stripped = specifier
            .strip_suffix(".js")
            .or_else(|| specifier.strip_suffix(".jsx"))
            .unwrap_or(specifier);

        let from_dir = from_file.parent().unwrap_or_else(|| Path::new(""));
        let base = from_dir.join(stripped);

        let mut result = None;
        'outer: for ext in RESOLVE_EXTENSIONS {
            for candidate in [with_ext(&base, ext), with_ext(&base.join("index"), ext)] {
                let cleaned = candidate.clean();
                if self.path_to_id.contains_key(&cleaned) {
                    result = Some(cleaned);
                    break 'outer;
                }
            }
        }

        if result.is_none() {
            let fallback = from_dir.join(specifier).clean();
            if self.path_to_id.contains_key(&fallback) {
                result = Some(fallback);
            }
        }

        self.resolution_cache.lock().insert(key, result.clone());
        result
    }
}

fn with_ext(base: &Path, ext: &str) -> PathBuf {
    if ext.is_empty() {
        base.to_path_buf()
    } else {
        let mut s = base.as_os_str().to_os_string();
        s.push(".");
        s.push(ext);
        PathBuf::from(s)
    }
}

pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with('.') || specifier.starts_with("..")
}

/// Extracts the package name from a bare specifier: the first segment, or
/// the first two for a scoped package (`@scope/name`).
pub fn package_name_from_specifier(specifier: &str) -> Option<&str> {
    if is_relative(specifier) || specifier.is_empty() {
        return None;
    }
    let mut parts = specifier.splitn(3, '/');
    let first = parts.next()?;
    if first.starts_with('@') {
        let second = parts.next()?;
        let end = first.len() + 1 + second.len();
        Some(&specifier[..end])
    } else {
        Some(first)
    }
}

pub struct BuildOutcome {
    pub graph: DependencyGraph,
    pub warnings: Vec<Warning>,
}

/// Runs the full construction sequence: scan, classify against the
/// manifest, parse changed/new files with bounded concurrency, drop deleted
/// entries, save the manifest, parse style files, and stamp entry points.
pub fn build(
    project_root: &Path,
    config: &UnreachConfig,
    cache: &AnalysisCache,
    entry_points: &[PathBuf],
    incremental: bool,
    progress: &dyn crate::ProgressSink,
) -> Result<BuildOutcome, anyhow::Error> {
    let scanned = scan::scan(project_root, &config.exclude_patterns)?;
    let mut warnings = Vec::new();

    let old_manifest = if incremental {
        cache.load_manifest()
    } else {
        AHashMap::default()
    };

    let mut current_metadata: AHashMap<PathBuf, FileMetadata> = AHashMap::default();
    let mut readable_files = Vec::new();
    for path in &scanned.source_files {
        let Ok(content) = std::fs::read_to_string(path) else {
            continue;
        };
        if let Ok(meta) = AnalysisCache::metadata(path, &content) {
            current_metadata.insert(path.clone(), meta);
            readable_files.push(path.clone());
        }
    }

    let classification = cache.classify(&readable_files, &current_metadata, &old_manifest);

    let mut graph = DependencyGraph::empty();

    for path in &classification.unchanged {
        let hash = &current_metadata[path].hash;
        match cache.load_ast(path, hash) {
            Some(summary) => {
                graph.insert(path.clone(), summary);
            }
            None => {
                progress.file_started(path);
                match parse::parse_source(path, config.max_file_size) {
                    Ok(parsed) => {
                        cache.save_ast(path, &parsed.summary, &parsed.content_hash).ok();
                        graph.insert(path.clone(), parsed.summary);
                        progress.file_finished(path, None);
                    }
                    Err(err) => progress.file_finished(path, Some(&err.to_string())),
                }
            }
        }
    }

    let to_parse: Vec<PathBuf> = classification
        .changed
        .iter()
        .chain(classification.new.iter())
        .cloned()
        .collect();

    for path in &to_parse {
        progress.file_started(path);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get().min(8))
        .build()?;

    let parsed_results: Vec<(PathBuf, Result<parse::ParsedFile, parse::ParseError>)> =
        pool.install(|| {
            to_parse
                .par_iter()
                .map(|path| (path.clone(), parse::parse_source(path, config.max_file_size)))
                .collect()
        });

    for (path, result) in parsed_results {
        match result {
            Ok(parsed) => {
                cache.save_ast(&path, &parsed.summary, &parsed.content_hash).ok();
                graph.insert(path.clone(), parsed.summary);
                progress.file_finished(&path, None);
            }
            Err(err) => {
                progress.file_finished(&path, Some(&err.to_string()));
                warnings.push(Warning::ParseFailure {
                    path: path.clone(),
                    message: err.to_string(),
                });
            }
        }
    }

    let mut new_manifest = current_metadata;
    new_manifest.retain(|path, _| graph.contains(path));
    cache.save_manifest(&new_manifest).ok();
    cache.ensure_gitignore(project_root);

    for path in &scanned.style_files {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let classes = style::extract_classes(&content);
                graph.style_classes.insert(path.clone(), classes);
            }
            Err(err) => {
                warnings.push(Warning::StyleParseFailure {
                    path: path.clone(),
                    message: err.to_string(),
                });
            }
        }
    }

    for entry in entry_points {
        if !graph.contains(entry) {
            if let Ok(parsed) = parse::parse_source(entry, config.max_file_size) {
                graph.insert(entry.clone(), parsed.summary);
            }
        }
        graph.set_entry_point(entry);
    }

    Ok(BuildOutcome { graph, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_name_handles_scoped_packages() {
        assert_eq!(package_name_from_specifier("@scope/name/sub"), Some("@scope/name"));
        assert_eq!(package_name_from_specifier("lodash/fp"), Some("lodash"));
        assert_eq!(package_name_from_specifier("./local"), None);
    }

    #[test]
    fn resolve_prefers_ts_over_js_extension() {
        let mut graph = DependencyGraph::empty();
        graph.insert(PathBuf::from("/proj/src/lib.ts"), FileSummary::default());
        let resolved = graph.resolve(Path::new("/proj/src/index.ts"), "./lib.js");
        assert_eq!(resolved, Some(PathBuf::from("/proj/src/lib.ts")));
    }

    #[test]
    fn resolve_falls_back_to_index() {
        let mut graph = DependencyGraph::empty();
        graph.insert(PathBuf::from("/proj/src/util/index.ts"), FileSummary::default());
        let resolved = graph.resolve(Path::new("/proj/src/main.ts"), "./util");
        assert_eq!(resolved, Some(PathBuf::from("/proj/src/util/index.ts")));
    }

    #[test]
    fn resolve_returns_none_for_bare_specifier() {
        let graph = DependencyGraph::empty();
        assert_eq!(graph.resolve(Path::new("/proj/src/main.ts"), "lodash"), None);
    }
}
