//! Reachability Engine (C8).
//!
//! A recursive `markReachable` DFS with memoization over the reachable-files
//! set. Per-file reachable name sets (exports, functions, variables, types)
//! are plain `AHashSet<String>`s rather than a fixed small set of provenance
//! tags, since this engine needs per-name reachability, not just a handful
//! of "why is this file reachable" bits.
use std::path::{Path, PathBuf};

use ahashmap::{AHashMap, AHashSet};
use path_clean::PathClean;

use crate::graph::{self, DependencyGraph};
use crate::parse::{ExportKind, FileSummary};

const ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "woff", "woff2", "ttf", "eot", "otf",
];
const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less", "styl"];

#[derive(Debug, Default)]
pub struct ReachabilityState {
    pub reachable_files: AHashSet<PathBuf>,
    pub reachable_exports: AHashMap<PathBuf, AHashSet<String>>,
    pub reachable_functions: AHashMap<PathBuf, AHashSet<String>>,
    pub reachable_variables: AHashMap<PathBuf, AHashSet<String>>,
    pub used_imports: AHashMap<PathBuf, AHashSet<String>>,
    pub imported_symbols: AHashMap<PathBuf, AHashSet<String>>,
    pub used_types: AHashMap<PathBuf, AHashSet<String>>,
    pub used_packages: AHashSet<String>,
    pub used_css_classes: AHashSet<String>,
    pub used_assets: AHashSet<PathBuf>,
}

impl ReachabilityState {
    /// Drops the large per-file maps the caller no longer needs once finders
    /// are done.
    pub fn release_transient(&mut self) {
        self.imported_symbols.clear();
        self.used_imports.clear();
    }
}

fn extension_lower(specifier: &str) -> Option<String> {
    Path::new(specifier)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn is_asset_specifier(specifier: &str) -> bool {
    extension_lower(specifier)
        .map(|ext| ASSET_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn is_style_specifier(specifier: &str) -> bool {
    extension_lower(specifier)
        .map(|ext| STYLE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Shared with the finders' asset lookups so both sides resolve
/// a relative specifier against the filesystem identically.
pub fn resolve_on_disk(from_file: &Path, specifier: &str) -> PathBuf {
    let dir = from_file.parent().unwrap_or_else(|| Path::new(""));
    dir.join(specifier).clean()
}

pub struct Engine<'g> {
    graph: &'g DependencyGraph,
    pub state: ReachabilityState,
}

impl<'g> Engine<'g> {
    pub fn new(graph: &'g DependencyGraph) -> Self {
        Self {
            graph,
            state: ReachabilityState::default(),
        }
    }

    pub fn run(mut self, entry_points: &[PathBuf]) -> ReachabilityState {
        for entry in entry_points {
            self.mark_reachable(entry);
        }
        self.state
    }

    fn exports_set(&mut self, path: &Path) -> &mut AHashSet<String> {
        self.state.reachable_exports.entry(path.to_path_buf()).or_default()
    }
    fn functions_set(&mut self, path: &Path) -> &mut AHashSet<String> {
        self.state.reachable_functions.entry(path.to_path_buf()).or_default()
    }
    fn types_set(&mut self, path: &Path) -> &mut AHashSet<String> {
        self.state.used_types.entry(path.to_path_buf()).or_default()
    }
    fn variables_set(&mut self, path: &Path) -> &mut AHashSet<String> {
        self.state.reachable_variables.entry(path.to_path_buf()).or_default()
    }

    /// Idempotent: returns immediately if `path` is already reachable.
    /// Symbol-level sets are still merged on every arrival at a node, since
    /// a later import can reach names an earlier one didn't, even though
    /// the traversal itself only recurses on the first arrival.
    pub fn mark_reachable(&mut self, path: &Path) {
        if self.state.reachable_files.contains(path) {
            return;
        }
        self.state.reachable_files.insert(path.to_path_buf());

        let Some(summary) = self.graph.get(path).cloned() else {
            return;
        };

        for class in &summary.css_classes {
            self.state.used_css_classes.insert(class.clone());
        }

        for specifier in summary.import_details.keys() {
            self.process_static_import(path, &summary, specifier);
        }

        if summary.is_entry_point {
            let fn_names: Vec<String> = summary.functions.keys().cloned().collect();
            self.functions_set(path).extend(fn_names);
        }

        for call in &summary.function_calls {
            if summary.functions.contains_key(call) {
                self.functions_set(path).insert(call.clone());
            } else if let Some(detail) = find_detail_for_local(&summary, call) {
                self.repropagate_specifier(path, &summary, detail);
            }
        }

        for jsx in &summary.jsx_elements {
            if summary.functions.contains_key(jsx) {
                self.functions_set(path).insert(jsx.clone());
            } else if let Some(detail) = find_detail_for_local(&summary, jsx) {
                self.repropagate_specifier(path, &summary, detail);
            }
        }

        for reference in &summary.variable_references {
            if let Some(detail) = find_detail_for_local(&summary, reference) {
                self.repropagate_specifier(path, &summary, detail);
            }
        }

        let refs: Vec<String> = summary.variable_references.iter().cloned().collect();
        self.variables_set(path).extend(refs);

        self.process_dynamic_imports(path, &summary);
    }

    fn repropagate_specifier(&mut self, from: &Path, summary: &FileSummary, specifier: &str) {
        let Some(resolved) = self.graph.resolve(from, specifier) else {
            return;
        };
        self.mark_reachable(&resolved);
        let Some(detail) = summary.import_details.get(specifier) else {
            return;
        };
        self.propagate_named(&resolved, &detail.specifiers, false);
        self.propagate_named(&resolved, &detail.type_specifiers, true);
    }

    fn process_static_import(&mut self, from: &Path, summary: &FileSummary, specifier: &str) {
        if graph::is_relative(specifier) {
            if is_asset_specifier(specifier) {
                let resolved = resolve_on_disk(from, specifier);
                if resolved.exists() {
                    self.state.used_assets.insert(resolved);
                }
                return;
            }
            if is_style_specifier(specifier) {
                let resolved = resolve_on_disk(from, specifier);
                if resolved.exists() {
                    self.state
                        .used_imports
                        .entry(from.to_path_buf())
                        .or_default()
                        .insert(specifier.to_string());
                    return;
                }
                // falls through: missing style file behaves as a normal
                // specifier, which will fail to resolve.
            }

            let Some(resolved) = self.graph.resolve(from, specifier) else {
                return;
            };
            self.state
                .used_imports
                .entry(from.to_path_buf())
                .or_default()
                .insert(specifier.to_string());
            self.mark_reachable(&resolved);

            let detail = &summary.import_details[specifier];
            if detail.is_namespace {
                self.propagate_namespace(&resolved);
            } else if detail.is_default {
                self.propagate_default(&resolved);
            } else {
                self.propagate_named(&resolved, &detail.specifiers, false);
                self.propagate_named(&resolved, &detail.type_specifiers, true);
            }

            self.state
                .imported_symbols
                .entry(from.to_path_buf())
                .or_default()
                .extend(detail.specifiers.iter().cloned());
        } else if let Some(pkg) = graph::package_name_from_specifier(specifier) {
            self.state.used_packages.insert(pkg.to_string());
        }
    }

    fn process_dynamic_imports(&mut self, from: &Path, summary: &FileSummary) {
        let dynamic = summary.dynamic_imports.clone();
        for dyn_import in &dynamic {
            if dyn_import.is_template_literal {
                if let Some(pkg) = graph::package_name_from_specifier(&dyn_import.path) {
                    self.state.used_packages.insert(pkg.to_string());
                }
                continue;
            }

            if let Some(rest) = dyn_import
                .path
                .strip_prefix("__dirname")
                .or_else(|| dyn_import.path.strip_prefix("__filename"))
            {
                let trimmed = rest.trim_start_matches('/');
                let pseudo = format!("./{trimmed}");
                if let Some(resolved) = self.graph.resolve(from, &pseudo) {
                    self.mark_reachable(&resolved);
                    self.state
                        .used_imports
                        .entry(from.to_path_buf())
                        .or_default()
                        .insert(pseudo);
                }
                continue;
            }

            if graph::is_relative(&dyn_import.path) {
                if let Some(resolved) = self.graph.resolve(from, &dyn_import.path) {
                    self.mark_reachable(&resolved);
                    self.state
                        .used_imports
                        .entry(from.to_path_buf())
                        .or_default()
                        .insert(dyn_import.path.clone());
                }
            } else if let Some(pkg) = graph::package_name_from_specifier(&dyn_import.path) {
                self.state.used_packages.insert(pkg.to_string());
            }
        }
    }

    fn propagate_namespace(&mut self, g: &Path) {
        let mut visited = AHashSet::default();
        self.propagate_namespace_visited(g, &mut visited);
    }

    /// Namespace propagation recurses into every `export *` target it finds,
    /// which can cycle back to a file already on the current chain (`a.ts:
    /// export * from "./b"` / `b.ts: export * from "./a"`). `visited` bounds
    /// the recursion to one visit per file so such cycles terminate instead
    /// of overflowing the stack, while still fully chasing acyclic chains.
    fn propagate_namespace_visited(&mut self, g: &Path, visited: &mut AHashSet<PathBuf>) {
        if !visited.insert(g.to_path_buf()) {
            return;
        }
        let Some(summary) = self.graph.get(g).cloned() else {
            return;
        };
        for name in summary.exports.keys() {
            self.exports_set(g).insert(name.clone());
            if summary.functions.contains_key(name) {
                self.functions_set(g).insert(name.clone());
            }
        }
        for (exported_name, re_export) in &summary.re_exports {
            if exported_name == crate::parse::EXPORT_STAR_KEY {
                let Some(resolved) = self.graph.resolve(g, &re_export.source_file) else {
                    continue;
                };
                self.mark_reachable(&resolved);
                self.propagate_namespace_visited(&resolved, visited);
            } else {
                self.chase_reexport(g, &summary, exported_name, &mut AHashSet::default());
            }
        }
    }

    fn propagate_default(&mut self, g: &Path) {
        let Some(summary) = self.graph.get(g).cloned() else {
            return;
        };
        self.exports_set(g).insert("default".to_string());
        for (name, info) in &summary.exports {
            if info.kind == ExportKind::Default {
                self.exports_set(g).insert(name.clone());
            }
        }
    }

    fn propagate_named(&mut self, g: &Path, names: &AHashSet<String>, type_only: bool) {
        let mut visited = AHashSet::default();
        self.propagate_named_visited(g, names, type_only, &mut visited);
    }

    /// As with [`Self::propagate_namespace_visited`], a named re-export chain
    /// can cycle back to a `(file, name)` pair already on the current chain
    /// (`a.ts: export { x } from "./b"` / `b.ts: export { x } from "./a"`);
    /// `visited` bounds each pair to one visit.
    fn propagate_named_visited(
        &mut self,
        g: &Path,
        names: &AHashSet<String>,
        type_only: bool,
        visited: &mut AHashSet<(PathBuf, String)>,
    ) {
        let Some(summary) = self.graph.get(g).cloned() else {
            return;
        };

        for name in names {
            if !visited.insert((g.to_path_buf(), name.clone())) {
                continue;
            }
            if summary.exports.contains_key(name) {
                self.exports_set(g).insert(name.clone());
            }
            if !type_only && summary.functions.contains_key(name) {
                self.functions_set(g).insert(name.clone());
            }
            if summary.types.contains_key(name) {
                self.types_set(g).insert(name.clone());
            }
            if type_only {
                self.types_set(g).insert(name.clone());
            }
            if summary.re_exports.contains_key(name) {
                self.chase_reexport(g, &summary, name, visited);
            } else if summary.re_exports.contains_key(crate::parse::EXPORT_STAR_KEY) {
                self.chase_export_star(g, &summary, name, type_only);
            }
        }

        if summary.exports.contains_key("default") {
            self.exports_set(g).insert("default".to_string());
        }
    }

    fn chase_reexport(
        &mut self,
        g: &Path,
        summary: &FileSummary,
        exported_name: &str,
        visited: &mut AHashSet<(PathBuf, String)>,
    ) {
        let Some(re_export) = summary.re_exports.get(exported_name) else {
            return;
        };
        let Some(resolved) = self.graph.resolve(g, &re_export.source_file) else {
            return;
        };
        self.mark_reachable(&resolved);
        let mut names = AHashSet::default();
        names.insert(re_export.exported_name.clone());
        self.propagate_named_visited(&resolved, &names, false, visited);
    }

    /// One-hop `export *` scan: for each of `G`'s relative imports, if the
    /// resolved file defines `name`, mark it reachable there without
    /// recursing through further export stars.
    fn chase_export_star(&mut self, g: &Path, summary: &FileSummary, name: &str, type_only: bool) {
        let specifiers: Vec<String> = summary.import_details.keys().cloned().collect();
        for specifier in specifiers {
            if !graph::is_relative(&specifier) {
                continue;
            }
            let Some(resolved) = self.graph.resolve(g, &specifier) else {
                continue;
            };
            let Some(candidate) = self.graph.get(&resolved) else {
                continue;
            };
            let defines = candidate.exports.contains_key(name) || candidate.functions.contains_key(name);
            if !defines {
                continue;
            }
            self.mark_reachable(&resolved);
            self.exports_set(&resolved).insert(name.to_string());
            if !type_only && candidate.functions.contains_key(name) {
                self.functions_set(&resolved).insert(name.to_string());
            }
        }
    }
}

/// Best-effort local-name-to-specifier match for the "second propagation
/// pass": the parser records the *imported* name, not a local alias, so
/// this assumes the common case where an alias was not introduced.
fn find_detail_for_local<'a>(summary: &'a FileSummary, local_name: &str) -> Option<&'a str> {
    for (specifier, detail) in &summary.import_details {
        if detail.specifiers.contains(local_name) || detail.type_specifiers.contains(local_name) {
            return Some(specifier.as_str());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_str;
    use std::path::PathBuf;

    fn graph_from(files: &[(&str, &str)]) -> DependencyGraph {
        let mut graph = DependencyGraph::empty();
        for (path, src) in files {
            let summary = parse_str(Path::new(path), src).unwrap();
            graph.insert(PathBuf::from(path), summary);
        }
        graph
    }

    #[test]
    fn direct_import_marks_used_export_reachable_but_not_unused() {
        let graph = graph_from(&[
            ("/p/src/index.ts", r#"import { used } from "./lib";"#),
            (
                "/p/src/lib.ts",
                "export const used = 1;\nexport const unused = 2;",
            ),
        ]);
        let mut graph = graph;
        graph.set_entry_point(Path::new("/p/src/index.ts"));
        let state = Engine::new(&graph).run(&[PathBuf::from("/p/src/index.ts")]);

        assert!(state.reachable_files.contains(Path::new("/p/src/lib.ts")));
        let exports = &state.reachable_exports[Path::new("/p/src/lib.ts")];
        assert!(exports.contains("used"));
        assert!(!exports.contains("unused"));
    }

    #[test]
    fn reexport_chain_propagates_to_defining_file() {
        let graph = graph_from(&[
            ("/p/src/index.ts", r#"import { foo } from "./re";"#),
            ("/p/src/re.ts", r#"export { foo } from "./impl";"#),
            (
                "/p/src/impl.ts",
                "export const foo = 1;\nexport const bar = 2;",
            ),
        ]);
        let mut graph = graph;
        graph.set_entry_point(Path::new("/p/src/index.ts"));
        let state = Engine::new(&graph).run(&[PathBuf::from("/p/src/index.ts")]);

        let exports = &state.reachable_exports[Path::new("/p/src/impl.ts")];
        assert!(exports.contains("foo"));
        assert!(!exports.contains("bar"));
    }

    #[test]
    fn namespace_star_reexport_propagates_through_export_star() {
        let graph = graph_from(&[
            ("/p/src/index.ts", r#"import { a } from "./ns";"#),
            ("/p/src/ns.ts", r#"export * from "./leaf";"#),
            (
                "/p/src/leaf.ts",
                "export const a = 1;\nexport const b = 2;",
            ),
        ]);
        let mut graph = graph;
        graph.set_entry_point(Path::new("/p/src/index.ts"));
        let state = Engine::new(&graph).run(&[PathBuf::from("/p/src/index.ts")]);

        let exports = &state.reachable_exports[Path::new("/p/src/leaf.ts")];
        assert!(exports.contains("a"));
        assert!(!exports.contains("b"));
    }

    #[test]
    fn cyclic_export_star_through_namespace_import_terminates() {
        let graph = graph_from(&[
            ("/p/src/index.ts", r#"import * as ns from "./a";"#),
            ("/p/src/a.ts", r#"export * from "./b";"#),
            ("/p/src/b.ts", r#"export * from "./a";
export const leaf = 1;"#),
        ]);
        let mut graph = graph;
        graph.set_entry_point(Path::new("/p/src/index.ts"));
        let state = Engine::new(&graph).run(&[PathBuf::from("/p/src/index.ts")]);

        assert!(state.reachable_files.contains(Path::new("/p/src/a.ts")));
        assert!(state.reachable_files.contains(Path::new("/p/src/b.ts")));
        let exports = &state.reachable_exports[Path::new("/p/src/b.ts")];
        assert!(exports.contains("leaf"));
    }

    #[test]
    fn bare_specifier_is_recorded_as_used_package() {
        let graph = graph_from(&[("/p/src/index.ts", r#"import { z } from "lodash";"#)]);
        let mut graph = graph;
        graph.set_entry_point(Path::new("/p/src/index.ts"));
        let state = Engine::new(&graph).run(&[PathBuf::from("/p/src/index.ts")]);
        assert!(state.used_packages.contains("lodash"));
    }
}
