//! Finders (C9).
//!
//! Represented as a fixed set of tagged variants rather than polymorphic
//! objects, each reading specific slices of `ReachabilityState` and the
//! graph. Each finder collects per-file over a `rayon` iterator of graph
//! files, then flattens; specialized per finder rather than kept generic,
//! since each finder reads a different slice of state.
use std::path::{Path, PathBuf};

use ahashmap::AHashSet;
use rayon::prelude::*;
use regex::Regex;
use std::sync::OnceLock;

use packagejson::{PackageJson, METADATA_FIELDS};
use tsconfig::TsConfigJson;

use crate::config::UnreachConfig;
use crate::graph::{self, DependencyGraph};
use crate::reachability::ReachabilityState;
use crate::seeder;

const ASSET_EXTENSIONS_IMAGE: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "ico"];
const ASSET_EXTENSIONS_FONT: &[&str] = &["woff", "woff2", "ttf", "eot", "otf"];

const FIXED_UNUSED_FILE_EXCLUSIONS: &[&str] =
    &["tsconfig.json", "package.json", ".gitignore", ".npmignore", "README.md", "LICENSE"];

const COMMON_SCRIPT_NAMES: &[&str] = &[
    "start", "build", "dev", "test", "lint", "format", "clean", "watch", "typecheck",
    "prepare", "preinstall", "postinstall", "prepublish", "prepublishOnly", "release",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedPackage {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedImport {
    pub file: PathBuf,
    pub specifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedExport {
    pub file: PathBuf,
    pub export_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedFunction {
    pub file: PathBuf,
    pub function_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedVariable {
    pub file: PathBuf,
    pub variable_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedFile {
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedType {
    pub file: PathBuf,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedCssClass {
    pub file: PathBuf,
    pub class_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Font,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedAsset {
    pub path: PathBuf,
    pub kind: AssetKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedConfig {
    pub file: PathBuf,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedScript {
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub unused_packages: Vec<UnusedPackage>,
    pub unused_imports: Vec<UnusedImport>,
    pub unused_exports: Vec<UnusedExport>,
    pub unused_functions: Vec<UnusedFunction>,
    pub unused_variables: Vec<UnusedVariable>,
    pub unused_files: Vec<UnusedFile>,
    pub unused_types: Vec<UnusedType>,
    pub unused_css_classes: Vec<UnusedCssClass>,
    pub unused_assets: Vec<UnusedAsset>,
    pub unused_configs: Vec<UnusedConfig>,
    pub unused_scripts: Vec<UnusedScript>,
}

impl std::fmt::Display for ScanResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut files: Vec<&Path> = self.unused_files.iter().map(|u| u.file.as_path()).collect();
        files.sort();
        for file in &files {
            writeln!(f, "{} is completely unused", file.display())?;
        }

        writeln!(f, "unused packages ({}):", self.unused_packages.len())?;
        for pkg in &self.unused_packages {
            writeln!(f, "  - {}", pkg.name)?;
        }

        writeln!(f, "unused exports ({}):", self.unused_exports.len())?;
        for export in &self.unused_exports {
            writeln!(f, "  - {}: {}", export.file.display(), export.export_name)?;
        }

        writeln!(f, "unused imports ({}):", self.unused_imports.len())?;
        for import in &self.unused_imports {
            writeln!(f, "  - {}: {}", import.file.display(), import.specifier)?;
        }

        writeln!(f, "unused functions ({}):", self.unused_functions.len())?;
        for function in &self.unused_functions {
            writeln!(f, "  - {}: {}", function.file.display(), function.function_name)?;
        }

        writeln!(f, "unused variables ({}):", self.unused_variables.len())?;
        for variable in &self.unused_variables {
            writeln!(f, "  - {}: {}", variable.file.display(), variable.variable_name)?;
        }

        writeln!(f, "unused types ({}):", self.unused_types.len())?;
        for ty in &self.unused_types {
            writeln!(f, "  - {}: {}", ty.file.display(), ty.type_name)?;
        }

        writeln!(f, "unused css classes ({}):", self.unused_css_classes.len())?;
        for class in &self.unused_css_classes {
            writeln!(f, "  - {}: {}", class.file.display(), class.class_name)?;
        }

        writeln!(f, "unused assets ({}):", self.unused_assets.len())?;
        for asset in &self.unused_assets {
            writeln!(f, "  - {}", asset.path.display())?;
        }

        writeln!(f, "unused configs ({}):", self.unused_configs.len())?;
        for config in &self.unused_configs {
            writeln!(f, "  - {}: {}", config.file.display(), config.key)?;
        }

        write!(f, "unused scripts ({}):", self.unused_scripts.len())?;
        for script in &self.unused_scripts {
            write!(f, "\n  - {}", script.name)?;
        }

        Ok(())
    }
}

fn asset_kind(path: &Path) -> AssetKind {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if ASSET_EXTENSIONS_IMAGE.contains(&ext.as_str()) {
        AssetKind::Image
    } else if ASSET_EXTENSIONS_FONT.contains(&ext.as_str()) {
        AssetKind::Font
    } else {
        AssetKind::Other
    }
}

fn is_config_file_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.contains(".config."))
        .unwrap_or(false)
}

fn is_under_vitepress_theme(path: &Path) -> bool {
    path.components()
        .collect::<Vec<_>>()
        .windows(2)
        .any(|w| {
            w[0].as_os_str().to_str() == Some(".vitepress") && w[1].as_os_str().to_str() == Some("theme")
        })
}

fn is_convention_excluded_file(project_root: &Path, path: &Path) -> bool {
    let Ok(rel) = path.strip_prefix(project_root) else {
        return false;
    };
    if let Some(name) = rel.file_name().and_then(|n| n.to_str()) {
        if FIXED_UNUSED_FILE_EXCLUSIONS.contains(&name) {
            return true;
        }
    }
    let rel_str = path_utils::as_relative_slash_path(rel)
        .map(|p| p.to_string())
        .unwrap_or_else(|_| rel.to_string_lossy().replace('\\', "/"));
    if rel_str.starts_with(".vitepress/theme/index.") {
        return true;
    }
    if rel_str.starts_with("app/") {
        if let Some(stem) = Path::new(&rel_str).file_stem().and_then(|s| s.to_str()) {
            if ["layout", "page", "loading", "error", "not-found"].contains(&stem) {
                return true;
            }
        }
    }
    if rel_str.contains("routes/") {
        let ext = Path::new(&rel_str).extension().and_then(|e| e.to_str());
        if matches!(ext, Some("tsx") | Some("ts") | Some("jsx") | Some("js")) {
            return true;
        }
    }
    false
}

pub fn unused_packages(package_json: Option<&PackageJson>, state: &ReachabilityState) -> Vec<UnusedPackage> {
    let Some(pkg) = package_json else {
        return Vec::new();
    };
    let typescript_in_use = state.used_packages.contains("typescript") || pkg.is_typescript_declared();

    let mut all_deps: Vec<&String> = pkg
        .dependencies
        .keys()
        .chain(pkg.dev_dependencies.keys())
        .chain(pkg.peer_dependencies.keys())
        .collect();
    all_deps.sort();
    all_deps.dedup();

    all_deps
        .into_iter()
        .filter(|name| !state.used_packages.contains(name.as_str()))
        .filter(|name| !(name.starts_with("@types/") && typescript_in_use))
        .map(|name| UnusedPackage { name: name.clone() })
        .collect()
}

pub fn unused_imports(graph: &DependencyGraph, state: &ReachabilityState) -> Vec<UnusedImport> {
    graph
        .iter()
        .par_bridge()
        .flat_map(|(path, summary)| {
            summary
                .import_details
                .keys()
                .filter_map(|specifier| {
                    if !graph::is_relative(specifier) {
                        return None;
                    }
                    if crate::reachability::is_asset_specifier(specifier)
                        && crate::reachability::resolve_on_disk(path, specifier).exists()
                    {
                        return None;
                    }
                    let used = state
                        .used_imports
                        .get(path)
                        .is_some_and(|s| s.contains(specifier));
                    let resolved_outside = match graph.resolve(path, specifier) {
                        Some(g) => !state.reachable_files.contains(&g),
                        None => false,
                    };
                    if !used || resolved_outside {
                        Some(UnusedImport {
                            file: path.clone(),
                            specifier: specifier.clone(),
                        })
                    } else {
                        None
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn unused_exports(graph: &DependencyGraph, state: &ReachabilityState) -> Vec<UnusedExport> {
    graph
        .iter()
        .par_bridge()
        .flat_map(|(path, summary)| {
            if summary.is_entry_point || is_config_file_name(path) || is_under_vitepress_theme(path) {
                return Vec::new();
            }
            let reachable = state.reachable_exports.get(path);
            summary
                .exports
                .keys()
                .filter_map(|name| {
                    if name == crate::parse::EXPORT_STAR_KEY {
                        return None;
                    }
                    if name.chars().next().is_some_and(|c| c.is_uppercase()) {
                        return None;
                    }
                    if reachable.is_some_and(|s| s.contains(name)) {
                        return None;
                    }
                    Some(UnusedExport {
                        file: path.clone(),
                        export_name: name.clone(),
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn unused_functions(graph: &DependencyGraph, state: &ReachabilityState) -> Vec<UnusedFunction> {
    graph
        .iter()
        .par_bridge()
        .flat_map(|(path, summary)| {
            if summary.is_entry_point {
                return Vec::new();
            }
            let reachable_fns = state.reachable_functions.get(path);
            let reachable_exports = state.reachable_exports.get(path);
            summary
                .functions
                .iter()
                .filter_map(|(name, decl)| {
                    if reachable_fns.is_some_and(|s| s.contains(name)) {
                        return None;
                    }
                    if decl.is_exported && reachable_exports.is_some_and(|s| s.contains(name)) {
                        return None;
                    }
                    if summary.function_calls.contains(name)
                        || summary.variable_references.contains(name)
                        || summary.jsx_elements.contains(name)
                    {
                        return None;
                    }
                    Some(UnusedFunction {
                        file: path.clone(),
                        function_name: name.clone(),
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn unused_variables(graph: &DependencyGraph, state: &ReachabilityState) -> Vec<UnusedVariable> {
    graph
        .iter()
        .par_bridge()
        .flat_map(|(path, summary)| {
            if !state.reachable_files.contains(path) {
                return Vec::new();
            }
            let reachable_vars = state.reachable_variables.get(path);
            summary
                .variables
                .iter()
                .filter_map(|(name, decl)| {
                    if decl.is_exported {
                        return None;
                    }
                    if reachable_vars.is_some_and(|s| s.contains(name)) {
                        return None;
                    }
                    if summary.variable_references.contains(name) {
                        return None;
                    }
                    Some(UnusedVariable {
                        file: path.clone(),
                        variable_name: name.clone(),
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn unused_files(project_root: &Path, graph: &DependencyGraph, state: &ReachabilityState) -> Vec<UnusedFile> {
    let mut out = Vec::new();
    for (path, _) in graph.iter() {
        if state.reachable_files.contains(path) {
            continue;
        }
        if is_convention_excluded_file(project_root, path) {
            continue;
        }
        out.push(UnusedFile { file: path.clone() });
    }
    out
}

pub fn unused_types(graph: &DependencyGraph, state: &ReachabilityState) -> Vec<UnusedType> {
    graph
        .iter()
        .par_bridge()
        .flat_map(|(path, summary)| {
            if !state.reachable_files.contains(path) || summary.is_entry_point {
                return Vec::new();
            }
            let used_types = state.used_types.get(path);
            let reachable_exports = state.reachable_exports.get(path);
            summary
                .types
                .iter()
                .filter_map(|(name, decl)| {
                    if used_types.is_some_and(|s| s.contains(name)) {
                        return None;
                    }
                    if decl.is_exported && reachable_exports.is_some_and(|s| s.contains(name)) {
                        return None;
                    }
                    if summary.variable_references.contains(name) || summary.function_calls.contains(name) {
                        return None;
                    }
                    Some(UnusedType {
                        file: path.clone(),
                        type_name: name.clone(),
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn unused_css_classes(graph: &DependencyGraph, state: &ReachabilityState) -> Vec<UnusedCssClass> {
    graph
        .style_classes
        .iter()
        .flat_map(|(path, classes)| {
            classes
                .iter()
                .filter(|class| !state.used_css_classes.contains(class.as_str()))
                .map(|class| UnusedCssClass {
                    file: path.clone(),
                    class_name: class.clone(),
                })
        })
        .collect()
}

pub fn unused_assets(graph: &DependencyGraph, state: &ReachabilityState) -> Vec<UnusedAsset> {
    let mut seen = AHashSet::default();
    let mut out = Vec::new();
    for (path, summary) in graph.iter() {
        for specifier in summary.import_details.keys() {
            if !graph::is_relative(specifier) {
                continue;
            }
            if !crate::reachability::is_asset_specifier(specifier) {
                continue;
            }
            let resolved = crate::reachability::resolve_on_disk(path, specifier);
            if !resolved.exists() || state.used_assets.contains(&resolved) {
                continue;
            }
            if seen.insert(resolved.clone()) {
                out.push(UnusedAsset {
                    kind: asset_kind(&resolved),
                    path: resolved,
                });
            }
        }
    }
    out
}

fn decorator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s@\w+\s*\(?").unwrap())
}

fn any_reachable_file_has_decorator(project_root: &Path, state: &ReachabilityState) -> bool {
    state.reachable_files.iter().any(|path| {
        std::fs::read_to_string(project_root.join(path)).is_ok_and(|content| decorator_regex().is_match(&content))
            || std::fs::read_to_string(path).is_ok_and(|content| decorator_regex().is_match(&content))
    })
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
    }
}

fn non_empty_value(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
        _ => true,
    }
}

/// The package-manifest taxonomy: `package.json` keys grouped into
/// always-used, metadata, conditional, and standard-npm buckets.
pub fn unused_package_json_configs(package_json_path: &Path, pkg: &PackageJson) -> Vec<UnusedConfig> {
    let mut out = Vec::new();
    let published = pkg.is_published();
    let mut unused = |key: &str| {
        out.push(UnusedConfig {
            file: package_json_path.to_path_buf(),
            key: key.to_string(),
        })
    };

    for field in METADATA_FIELDS {
        let value = match *field {
            "description" => pkg.description.as_ref().map(|s| serde_json::Value::String(s.clone())),
            "keywords" => pkg
                .keywords
                .as_ref()
                .map(|k| serde_json::Value::Array(k.iter().cloned().map(serde_json::Value::String).collect())),
            "author" => pkg.author.clone(),
            "license" => pkg.license.as_ref().map(|s| serde_json::Value::String(s.clone())),
            "repository" => pkg.repository.clone(),
            "homepage" => pkg.homepage.as_ref().map(|s| serde_json::Value::String(s.clone())),
            "bugs" => pkg.bugs.clone(),
            "funding" => pkg.funding.clone(),
            _ => None,
        };
        if let Some(v) = value {
            if !(published || non_empty_value(&v)) {
                unused(field);
            }
        }
    }

    if let Some(exports) = &pkg.exports {
        let used = pkg.package_type.as_deref() == Some("module") || is_truthy(exports);
        if !used {
            unused("exports");
        }
    }

    if let Some(files) = &pkg.files {
        if !(published || !files.is_empty()) {
            unused("files");
        }
    }

    if let Some(engines) = &pkg.engines {
        if engines.is_empty() {
            unused("engines");
        }
    }
    if let Some(os) = &pkg.os {
        if os.is_empty() {
            unused("os");
        }
    }
    if let Some(cpu) = &pkg.cpu {
        if cpu.is_empty() {
            unused("cpu");
        }
    }

    for field in [("workspaces", &pkg.workspaces), ("workspace", &pkg.workspace)] {
        if let Some(v) = field.1 {
            if !is_truthy(v) {
                unused(field.0);
            }
        }
    }

    for key in pkg.extra.keys() {
        unused(key);
    }

    out
}

/// The tsconfig taxonomy: compiler options and top-level keys grouped
/// into always-used, conditional, and reported-unused buckets.
pub fn unused_tsconfig_configs(
    tsconfig_path: &Path,
    tsconfig_raw: &serde_json::Value,
    tsconfig: &TsConfigJson,
    project_root: &Path,
    state: &ReachabilityState,
) -> Vec<UnusedConfig> {
    let mut out = Vec::new();
    let opts = &tsconfig.compiler_options;
    let mut unused = |key: &str| {
        out.push(UnusedConfig {
            file: tsconfig_path.to_path_buf(),
            key: key.to_string(),
        })
    };

    if let Some(base_url) = &opts.base_url {
        if base_url.is_empty() {
            unused("baseUrl");
        }
    }

    if let Some(paths_present) = tsconfig_raw
        .get("compilerOptions")
        .and_then(|c| c.get("paths"))
    {
        if opts.paths.is_empty() && paths_present.is_object() {
            unused("paths");
        }
    }

    if opts.types.is_some() && !tsconfig.types_is_used() {
        unused("types");
    }

    if let Some(type_roots) = &opts.type_roots {
        if type_roots.is_empty() {
            unused("typeRoots");
        }
    }

    let has_decorator_usage = || any_reachable_file_has_decorator(project_root, state);
    if opts.experimental_decorators == Some(true) && !has_decorator_usage() {
        unused("experimentalDecorators");
    }
    if opts.emit_decorator_metadata == Some(true) && !has_decorator_usage() {
        unused("emitDecoratorMetadata");
    }

    if tsconfig.include.is_some() && tsconfig.include_is_unused() {
        unused("include");
    }
    if tsconfig.exclude.is_some() && tsconfig.exclude_is_unused() {
        unused("exclude");
    }

    for key in opts.extra.keys() {
        unused(key);
    }

    out
}

pub fn unused_configs(
    project_root: &Path,
    package_json: Option<&PackageJson>,
    tsconfig: Option<&TsConfigJson>,
    state: &ReachabilityState,
) -> Vec<UnusedConfig> {
    let mut out = Vec::new();
    if let Some(pkg) = package_json {
        out.extend(unused_package_json_configs(&project_root.join("package.json"), pkg));
    }
    if let Some(ts) = tsconfig {
        let tsconfig_path = project_root.join("tsconfig.json");
        if let Ok(text) = std::fs::read_to_string(&tsconfig_path) {
            if let Ok(raw) = serde_json::from_str::<serde_json::Value>(&text) {
                out.extend(unused_tsconfig_configs(&tsconfig_path, &raw, ts, project_root, state));
            }
        }
    }

    if let Some(pkg) = package_json {
        for (tool, config_names) in [
            ("prettier", [".prettierrc", ".prettierrc.json"]),
            ("eslint", [".eslintrc", ".eslintrc.json"]),
        ] {
            if state.used_packages.contains(tool) {
                continue;
            }
            if pkg.dependencies.contains_key(tool) || pkg.dev_dependencies.contains_key(tool) {
                continue;
            }
            for name in config_names {
                let path = project_root.join(name);
                if path.exists() {
                    out.push(UnusedConfig {
                        file: path,
                        key: tool.to_string(),
                    });
                }
            }
        }
    }

    out
}

fn bin_names(pkg: &PackageJson) -> Vec<String> {
    match &pkg.bin {
        Some(serde_json::Value::String(_)) => pkg.name.clone().into_iter().collect(),
        Some(serde_json::Value::Object(map)) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

fn script_runner_regex(name: &str) -> Regex {
    Regex::new(&format!(
        r"\b(?:npm|yarn|pnpm|bun)\s+(?:run\s+)?{}\b",
        regex::escape(name)
    ))
    .unwrap()
}

pub fn unused_scripts(package_json: Option<&PackageJson>) -> Vec<UnusedScript> {
    let Some(pkg) = package_json else {
        return Vec::new();
    };
    let bins = bin_names(pkg);

    pkg.scripts
        .keys()
        .filter(|name| !COMMON_SCRIPT_NAMES.contains(&name.as_str()))
        .filter(|name| !bins.contains(name))
        .filter(|name| {
            let re = script_runner_regex(name);
            !pkg.scripts
                .iter()
                .any(|(other_name, command)| other_name != *name && re.is_match(command))
        })
        .filter(|name| !seeder::mentions_recognized_tool(&pkg.scripts[*name]))
        .map(|name| UnusedScript { name: name.clone() })
        .collect()
}

/// Gates every finder behind its `rules` flag and filters through the
/// configured ignore lists.
pub fn run_all(
    project_root: &Path,
    config: &UnreachConfig,
    graph: &DependencyGraph,
    state: &ReachabilityState,
    package_json: Option<&PackageJson>,
    tsconfig: Option<&TsConfigJson>,
) -> ScanResult {
    let ignore = &config.ignore;
    let rules = &config.rules;

    let unused_packages = if rules.unused_packages {
        crate::ignore::filter_by(&ignore.packages, unused_packages(package_json, state), |p| &p.name)
    } else {
        Vec::new()
    };

    let unused_imports = if rules.unused_imports {
        crate::ignore::filter_by(&ignore.imports, unused_imports(graph, state), |i| &i.specifier)
    } else {
        Vec::new()
    };

    let unused_exports = if rules.unused_exports {
        crate::ignore::filter_by(&ignore.exports, unused_exports(graph, state), |e| &e.export_name)
    } else {
        Vec::new()
    };

    let unused_functions = if rules.unused_functions {
        crate::ignore::filter_by(&ignore.functions, unused_functions(graph, state), |f| {
            &f.function_name
        })
    } else {
        Vec::new()
    };

    let unused_variables = if rules.unused_variables {
        crate::ignore::filter_by(&ignore.variables, unused_variables(graph, state), |v| {
            &v.variable_name
        })
    } else {
        Vec::new()
    };

    let unused_files = if rules.unused_files {
        let items = unused_files(project_root, graph, state)
            .into_iter()
            .map(|u| (u.file.to_string_lossy().to_string(), u))
            .collect::<Vec<_>>();
        crate::ignore::filter_by(&ignore.files, items, |(s, _)| s.as_str())
            .into_iter()
            .map(|(_, u)| u)
            .collect()
    } else {
        Vec::new()
    };

    let unused_types = if rules.unused_types {
        crate::ignore::filter_by(&ignore.types, unused_types(graph, state), |t| &t.type_name)
    } else {
        Vec::new()
    };

    let unused_css_classes = if rules.unused_css_classes {
        crate::ignore::filter_by(&ignore.css_classes, unused_css_classes(graph, state), |c| {
            &c.class_name
        })
    } else {
        Vec::new()
    };

    let unused_assets = if rules.unused_assets {
        let items = unused_assets(graph, state)
            .into_iter()
            .map(|u| (u.path.to_string_lossy().to_string(), u))
            .collect::<Vec<_>>();
        crate::ignore::filter_by(&ignore.assets, items, |(s, _)| s.as_str())
            .into_iter()
            .map(|(_, u)| u)
            .collect()
    } else {
        Vec::new()
    };

    let unused_configs = if rules.unused_configs {
        unused_configs(project_root, package_json, tsconfig, state)
    } else {
        Vec::new()
    };

    let unused_scripts = if rules.unused_scripts {
        unused_scripts(package_json)
    } else {
        Vec::new()
    };

    ScanResult {
        unused_packages,
        unused_imports,
        unused_exports,
        unused_functions,
        unused_variables,
        unused_files,
        unused_types,
        unused_css_classes,
        unused_assets,
        unused_configs,
        unused_scripts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn graph_with(files: &[(&str, &str)]) -> DependencyGraph {
        let mut graph = DependencyGraph::empty();
        for (path, src) in files {
            let summary = crate::parse::parse_str(Path::new(path), src).unwrap();
            graph.insert(PathBuf::from(path), summary);
        }
        graph
    }

    #[test]
    fn unused_package_excludes_used_and_types_when_typescript_in_use() {
        let mut pkg = PackageJson::default();
        pkg.dependencies.insert("lodash".to_string(), "4".to_string());
        pkg.dev_dependencies.insert("typescript".to_string(), "5".to_string());
        pkg.dev_dependencies.insert("@types/node".to_string(), "20".to_string());

        let mut state = ReachabilityState::default();
        state.used_packages.insert("typescript".to_string());

        let result = unused_packages(Some(&pkg), &state);
        let names: Vec<&str> = result.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"lodash"));
        assert!(!names.contains(&"@types/node"));
    }

    #[test]
    fn unused_exports_skips_entry_points_and_uppercase_names() {
        let mut graph = graph_with(&[(
            "/p/src/lib.ts",
            "export const used = 1;\nexport const unused = 2;\nexport const Type = 3;",
        )]);
        graph.set_entry_point(Path::new("/does/not/exist"));
        let mut state = ReachabilityState::default();
        state
            .reachable_exports
            .entry(PathBuf::from("/p/src/lib.ts"))
            .or_default()
            .insert("used".to_string());

        let found = unused_exports(&graph, &state);
        let names: Vec<&str> = found.iter().map(|e| e.export_name.as_str()).collect();
        assert!(names.contains(&"unused"));
        assert!(!names.contains(&"used"));
        assert!(!names.contains(&"Type"));
    }

    #[test]
    fn unused_files_excludes_fixed_names_and_conventions() {
        let graph = graph_with(&[
            ("/p/package.json", "export const x = 1;"),
            ("/p/src/orphan.ts", "export const y = 1;"),
            ("/p/app/page.tsx", "export default () => null;"),
        ]);
        let state = ReachabilityState::default();
        let found = unused_files(Path::new("/p"), &graph, &state);
        let paths: Vec<&PathBuf> = found.iter().map(|f| &f.file).collect();
        assert!(paths.contains(&&PathBuf::from("/p/src/orphan.ts")));
        assert!(!paths.contains(&&PathBuf::from("/p/package.json")));
        assert!(!paths.contains(&&PathBuf::from("/p/app/page.tsx")));
    }
}
