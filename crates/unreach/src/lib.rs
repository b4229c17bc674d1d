//! Whole-project dead-code reachability analysis for JavaScript/TypeScript.
//! This crate implements only the core pipeline: the file scanner,
//! AST parser, on-disk cache, dependency graph, entry-point detector,
//! build-tool seeder, reachability engine, finders, and ignore filter.
//! Everything else (CLI, exporters, the HTML graph view, the watch loop,
//! the update check) is an external collaborator of [`analyze`].
//!
//! [`analyze`] assembles these collaborators behind a single call: read
//! config, walk the tree, build a graph, derive a report. Each collaborator
//! is documented independently in its own module.
pub mod cache;
pub mod config;
pub mod entrypoints;
pub mod error;
pub mod finders;
pub mod graph;
pub mod ignore;
pub mod parse;
pub mod reachability;
pub mod scan;
pub mod seeder;
pub mod style;

use std::path::{Path, PathBuf};

use cache::AnalysisCache;
pub use config::{FixConfig, Rules, TestFileDetection, UnreachConfig, UnreachJsonConfig};
pub use error::{ConfigError, UnreachError, Warning};
pub use finders::ScanResult;
use packagejson::PackageJson;
use tsconfig::TsConfigJson;

/// Progress and warning callbacks a caller may supply to [`analyze`]:
/// `file-started`/`file-finished(error?)` fire around each file actually
/// parsed (cache hits fire neither), and `warning` fires once per non-fatal
/// condition. The default, empty-bodied methods let a caller implement only
/// the ones it needs.
pub trait ProgressSink: Sync {
    fn file_started(&self, _path: &Path) {}
    fn file_finished(&self, _path: &Path, _error: Option<&str>) {}
    fn warning(&self, _warning: &Warning) {}
}

/// A [`ProgressSink`] that discards every event; the default for callers
/// that don't need progress or warning reporting.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;
impl ProgressSink for NoopProgress {}

fn resolve_entry(project_root: &Path, entry: &Path) -> PathBuf {
    abspath::join_abspath(project_root, entry).unwrap_or_else(|_| project_root.join(entry))
}

/// Runs the full reachability pipeline (scan -> parse via cache -> build
/// graph -> detect entry points -> seed from scripts -> mark reachability
/// -> run finders) and returns the [`ScanResult`] plus every warning
/// collected along the way.
///
/// `config` is the already-validated, already-merged configuration;
/// resolving `unreach.config.{js,ts}` to that shape is the caller's job,
/// since evaluating a JS/TS module is outside this crate's scope.
pub fn analyze(
    project_root: &Path,
    config: &UnreachConfig,
    incremental: bool,
    progress: &dyn ProgressSink,
) -> Result<ScanResult, UnreachError> {
    if !project_root.exists() {
        return Err(UnreachError::DirectoryNotFound(project_root.to_path_buf()));
    }
    if !project_root.is_dir() {
        return Err(UnreachError::NotADirectory(project_root.to_path_buf()));
    }

    let configured_entries: Vec<PathBuf> = config
        .entry_points
        .iter()
        .map(|e| resolve_entry(project_root, e))
        .collect();
    for entry in &configured_entries {
        if !entry.exists() {
            return Err(UnreachError::EntryPointNotFound(entry.clone()));
        }
    }

    // Malformed or missing manifests degrade silently, same as the cache:
    // an unreadable `package.json`/`tsconfig.json` just means the
    // entry-point detector, seeder, and config finder run with less to go on.
    let package_json = PackageJson::read(&project_root.join("package.json")).unwrap_or_default();
    let tsconfig = TsConfigJson::from_path(&project_root.join("tsconfig.json")).ok();

    let build_dirs = scan::detect_build_dirs(project_root);

    let entry_points = entrypoints::detect_entry_points(
        project_root,
        &configured_entries,
        package_json.as_ref(),
        tsconfig.as_ref(),
        &build_dirs,
        &config.test_file_detection.matcher,
        config.test_file_detection.enabled,
    );

    let cache = AnalysisCache::new(project_root);
    let build_outcome = graph::build(project_root, config, &cache, &entry_points, incremental, progress)
        .map_err(UnreachError::Analysis)?;

    for warning in &build_outcome.warnings {
        progress.warning(warning);
    }

    let mut engine = reachability::Engine::new(&build_outcome.graph);
    if let Some(pkg) = &package_json {
        let seeded = seeder::seed_from_scripts(project_root, &pkg.scripts);
        engine.state.used_packages.extend(seeded.used_packages);
        for config_file in &seeded.reachable_config_files {
            engine.mark_reachable(config_file);
        }
    }

    let mut state = engine.run(&entry_points);

    let result = finders::run_all(
        project_root,
        config,
        &build_outcome.graph,
        &state,
        package_json.as_ref(),
        tsconfig.as_ref(),
    );

    // The caller only ever needed the finder output.
    state.release_transient();

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_tmpdir::test_tmpdir;

    /// A direct import leaves the used export reachable and the
    /// unused one reported, with no unused files.
    #[test]
    fn direct_import_scenario() {
        let tmpdir = test_tmpdir!(
            "src/index.ts" => r#"import { used } from "./lib";"#,
            "src/lib.ts" => "export const used = 1;\nexport const unused = 2;"
        );
        let config = UnreachConfig::default();
        let result = analyze(tmpdir.root(), &config, false, &NoopProgress).unwrap();

        assert!(result
            .unused_exports
            .iter()
            .any(|e| e.file.ends_with("lib.ts") && e.export_name == "unused"));
        assert!(!result
            .unused_exports
            .iter()
            .any(|e| e.export_name == "used"));
        assert!(result.unused_files.is_empty());
    }

    /// A re-export chain propagates reachability to the defining file.
    #[test]
    fn reexport_chain_scenario() {
        let tmpdir = test_tmpdir!(
            "src/index.ts" => r#"import { foo } from "./re";"#,
            "src/re.ts" => r#"export { foo } from "./impl";"#,
            "src/impl.ts" => "export const foo = 1;\nexport const bar = 2;"
        );
        let config = UnreachConfig::default();
        let result = analyze(tmpdir.root(), &config, false, &NoopProgress).unwrap();

        assert!(result
            .unused_exports
            .iter()
            .any(|e| e.file.ends_with("impl.ts") && e.export_name == "bar"));
        assert!(!result.unused_exports.iter().any(|e| e.export_name == "foo"));
        assert!(result.unused_files.is_empty());
    }

    /// An unused package is reported, but a devDependency invoked
    /// from a script is not, and that script itself is not reported unused.
    #[test]
    fn unused_package_and_script_seeded_devdep_scenario() {
        let tmpdir = test_tmpdir!(
            "package.json" => r#"{"dependencies":{"lodash":"4"},"devDependencies":{"prettier":"3"},"scripts":{"fmt":"prettier ."}}"#,
            "src/index.ts" => "export const x = 1;"
        );
        let config = UnreachConfig::default();
        let result = analyze(tmpdir.root(), &config, false, &NoopProgress).unwrap();

        assert!(result.unused_packages.iter().any(|p| p.name == "lodash"));
        assert!(!result.unused_packages.iter().any(|p| p.name == "prettier"));
        assert!(!result.unused_scripts.iter().any(|s| s.name == "fmt"));
    }

    /// A CSS import is reachable; only the unreferenced class is
    /// reported unused, and the stylesheet import itself is not unused.
    #[test]
    fn asset_and_css_scenario() {
        let tmpdir = test_tmpdir!(
            "src/main.tsx" => r#"import "./style.css";
export default () => <div className="a b" />;"#,
            "src/style.css" => ".a{} .b{} .c{}"
        );
        let config = UnreachConfig::default();
        let result = analyze(tmpdir.root(), &config, false, &NoopProgress).unwrap();

        assert!(result
            .unused_css_classes
            .iter()
            .any(|c| c.class_name == "c"));
        assert!(!result.unused_css_classes.iter().any(|c| c.class_name == "a"));
        assert!(!result.unused_css_classes.iter().any(|c| c.class_name == "b"));
        assert!(!result
            .unused_imports
            .iter()
            .any(|i| i.specifier == "./style.css"));
    }

    #[test]
    fn nonexistent_project_root_is_reported() {
        let config = UnreachConfig::default();
        let err = analyze(Path::new("/does/not/exist/at/all"), &config, false, &NoopProgress)
            .unwrap_err();
        assert!(matches!(err, UnreachError::DirectoryNotFound(_)));
    }

    #[test]
    fn configured_entry_point_missing_on_disk_is_reported() {
        let tmpdir = test_tmpdir!("src/index.ts" => "export const x = 1;");
        let mut json = UnreachJsonConfig::default();
        json.entry_points = Some(vec!["src/missing.ts".to_string()]);
        let config = UnreachConfig::try_from(json).unwrap();
        let err = analyze(tmpdir.root(), &config, false, &NoopProgress).unwrap_err();
        assert!(matches!(err, UnreachError::EntryPointNotFound(_)));
    }

    /// Re-running with identical inputs and no filesystem
    /// changes produces an equal `ScanResult`.
    #[test]
    fn idempotent_across_two_runs() {
        let tmpdir = test_tmpdir!(
            "src/index.ts" => r#"import { used } from "./lib";"#,
            "src/lib.ts" => "export const used = 1;\nexport const unused = 2;"
        );
        let config = UnreachConfig::default();
        let first = analyze(tmpdir.root(), &config, true, &NoopProgress).unwrap();
        let second = analyze(tmpdir.root(), &config, true, &NoopProgress).unwrap();

        let names = |r: &ScanResult| -> Vec<String> {
            r.unused_exports
                .iter()
                .map(|e| format!("{}:{}", e.file.display(), e.export_name))
                .collect()
        };
        assert_eq!(names(&first), names(&second));
    }

    /// Editing a file after a first run and re-running incrementally
    /// reflects the edit, relying on cache classification to re-parse only
    /// the touched file.
    #[test]
    fn incremental_edit_is_reflected_on_rerun() {
        let tmpdir = test_tmpdir!(
            "src/index.ts" => r#"import { used } from "./lib";"#,
            "src/lib.ts" => "export const used = 1;\nexport const unused = 2;"
        );
        let config = UnreachConfig::default();
        let first = analyze(tmpdir.root(), &config, true, &NoopProgress).unwrap();
        assert!(first
            .unused_exports
            .iter()
            .any(|e| e.file.ends_with("lib.ts") && e.export_name == "unused"));

        tmpdir
            .write_batch(&std::collections::HashMap::from([(
                "src/lib.ts".to_string(),
                "export const used = 1;",
            )]))
            .unwrap();
        let second = analyze(tmpdir.root(), &config, true, &NoopProgress).unwrap();
        assert!(!second
            .unused_exports
            .iter()
            .any(|e| e.file.ends_with("lib.ts")));
    }

    /// An incremental run over unchanged inputs agrees with
    /// a from-scratch run with no cache at all.
    #[test]
    fn incremental_run_agrees_with_from_scratch_run() {
        let tmpdir = test_tmpdir!(
            "src/index.ts" => r#"import { foo } from "./re";"#,
            "src/re.ts" => r#"export { foo } from "./impl";"#,
            "src/impl.ts" => "export const foo = 1;\nexport const bar = 2;"
        );
        let config = UnreachConfig::default();

        // Warm the on-disk cache with a first incremental run.
        analyze(tmpdir.root(), &config, true, &NoopProgress).unwrap();
        let incremental = analyze(tmpdir.root(), &config, true, &NoopProgress).unwrap();
        let from_scratch = analyze(tmpdir.root(), &config, false, &NoopProgress).unwrap();

        let names = |r: &ScanResult| -> Vec<String> {
            r.unused_exports
                .iter()
                .map(|e| format!("{}:{}", e.file.display(), e.export_name))
                .collect()
        };
        assert_eq!(names(&incremental), names(&from_scratch));
    }
}
