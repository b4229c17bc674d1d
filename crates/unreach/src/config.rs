//! Configuration Loader (C11).
use std::path::PathBuf;

use globset::{Glob, GlobSet, GlobSetBuilder};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::ignore::{compile_ignore_pattern, IgnoreRules};

const DEFAULT_TEST_PATTERNS: &[&str] = &[
    "**/*.test.*",
    "**/*.spec.*",
    "**/__tests__/**",
    "**/test/**",
    "**/tests/**",
];

const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_WATCH_RATE_LIMIT: f64 = 1.0;

/// The wire format of `unreach.config.{js,ts}`. Embedded JS/TS config
/// files are not evaluated by this crate (that would require a JS evaluator,
/// itself out of scope); callers resolve the `.js`/`.ts` module to a plain
/// JSON value upstream and pass it here.
#[derive(Debug, Deserialize, Default, Clone, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UnreachJsonConfig {
    #[serde(default)]
    pub ignore: Option<IgnoreListsJson>,
    #[serde(default)]
    pub entry_points: Option<Vec<String>>,
    #[serde(default)]
    pub exclude_patterns: Option<Vec<String>>,
    #[serde(default)]
    pub rules: Option<RulesJson>,
    #[serde(default)]
    pub fix: Option<FixJson>,
    #[serde(default)]
    pub test_file_detection: Option<TestFileDetectionJson>,
    #[serde(default)]
    pub max_file_size: Option<f64>,
    #[serde(default)]
    pub watch_rate_limit: Option<f64>,
}

#[derive(Debug, Deserialize, Default, Clone, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IgnoreListsJson {
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub packages: Vec<String>,
    #[serde(default)]
    pub exports: Vec<String>,
    #[serde(default)]
    pub functions: Vec<String>,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub css_classes: Vec<String>,
    #[serde(default)]
    pub assets: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RulesJson {
    pub unused_packages: Option<bool>,
    pub unused_imports: Option<bool>,
    pub unused_exports: Option<bool>,
    pub unused_functions: Option<bool>,
    pub unused_variables: Option<bool>,
    pub unused_files: Option<bool>,
    pub unused_configs: Option<bool>,
    pub unused_scripts: Option<bool>,
    pub unused_types: Option<bool>,
    pub unused_css_classes: Option<bool>,
    pub unused_assets: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FixJson {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub backup: Option<bool>,
    #[serde(default)]
    pub interactive: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TestFileDetectionJson {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub patterns: Option<Vec<String>>,
}

/// All eleven "unused X" rules, each gating a finder: a rule set to
/// `false` causes the corresponding finder to return an empty list untouched.
#[derive(Debug, Clone, Copy)]
pub struct Rules {
    pub unused_packages: bool,
    pub unused_imports: bool,
    pub unused_exports: bool,
    pub unused_functions: bool,
    pub unused_variables: bool,
    pub unused_files: bool,
    pub unused_configs: bool,
    pub unused_scripts: bool,
    pub unused_types: bool,
    pub unused_css_classes: bool,
    pub unused_assets: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            unused_packages: true,
            unused_imports: true,
            unused_exports: true,
            unused_functions: true,
            unused_variables: true,
            unused_files: true,
            unused_configs: true,
            unused_scripts: true,
            unused_types: true,
            unused_css_classes: true,
            unused_assets: true,
        }
    }
}

impl From<RulesJson> for Rules {
    fn from(j: RulesJson) -> Self {
        let d = Rules::default();
        Rules {
            unused_packages: j.unused_packages.unwrap_or(d.unused_packages),
            unused_imports: j.unused_imports.unwrap_or(d.unused_imports),
            unused_exports: j.unused_exports.unwrap_or(d.unused_exports),
            unused_functions: j.unused_functions.unwrap_or(d.unused_functions),
            unused_variables: j.unused_variables.unwrap_or(d.unused_variables),
            unused_files: j.unused_files.unwrap_or(d.unused_files),
            unused_configs: j.unused_configs.unwrap_or(d.unused_configs),
            unused_scripts: j.unused_scripts.unwrap_or(d.unused_scripts),
            unused_types: j.unused_types.unwrap_or(d.unused_types),
            unused_css_classes: j.unused_css_classes.unwrap_or(d.unused_css_classes),
            unused_assets: j.unused_assets.unwrap_or(d.unused_assets),
        }
    }
}

/// Recorded but never acted on: the "auto-fix" placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixConfig {
    pub enabled: bool,
    pub backup: bool,
    pub interactive: bool,
}

#[derive(Debug, Clone)]
pub struct TestFileDetection {
    pub enabled: bool,
    pub patterns: Vec<String>,
    pub matcher: GlobSet,
}

impl TestFileDetection {
    pub fn is_test_path(&self, relative_slash_path: &str) -> bool {
        self.enabled && self.matcher.is_match(relative_slash_path)
    }
}

/// The validated, compiled configuration the pipeline runs with.
#[derive(Debug, Clone)]
pub struct UnreachConfig {
    pub entry_points: Vec<PathBuf>,
    pub exclude_patterns: Vec<String>,
    pub exclude_matcher: GlobSet,
    pub rules: Rules,
    pub ignore: IgnoreRules,
    pub fix: FixConfig,
    pub test_file_detection: TestFileDetection,
    pub max_file_size: u64,
    pub watch_rate_limit: f64,
}

impl Default for UnreachConfig {
    fn default() -> Self {
        UnreachConfig::try_from(UnreachJsonConfig::default()).expect("defaults are always valid")
    }
}

fn build_globset(field: &'static str, patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ConfigError::InvalidGlobSet {
            field,
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::InvalidGlobSet {
        field,
        pattern: patterns.join(","),
        source,
    })
}

fn compile_ignore_list(field: &'static str, patterns: &[String]) -> Result<Vec<regex::Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| compile_ignore_pattern(field, p))
        .collect()
}

impl TryFrom<UnreachJsonConfig> for UnreachConfig {
    type Error = ConfigError;

    fn try_from(json: UnreachJsonConfig) -> Result<Self, ConfigError> {
        let ignore_json = json.ignore.unwrap_or_default();
        let ignore = IgnoreRules {
            files: compile_ignore_list("ignore.files", &ignore_json.files)?,
            packages: compile_ignore_list("ignore.packages", &ignore_json.packages)?,
            exports: compile_ignore_list("ignore.exports", &ignore_json.exports)?,
            functions: compile_ignore_list("ignore.functions", &ignore_json.functions)?,
            variables: compile_ignore_list("ignore.variables", &ignore_json.variables)?,
            imports: compile_ignore_list("ignore.imports", &ignore_json.imports)?,
            types: compile_ignore_list("ignore.types", &ignore_json.types)?,
            css_classes: compile_ignore_list("ignore.cssClasses", &ignore_json.css_classes)?,
            assets: compile_ignore_list("ignore.assets", &ignore_json.assets)?,
        };

        let entry_points = json
            .entry_points
            .unwrap_or_default()
            .into_iter()
            .map(PathBuf::from)
            .collect();

        let exclude_patterns = json.exclude_patterns.unwrap_or_default();
        let exclude_matcher = build_globset("excludePatterns", &exclude_patterns)?;

        let rules = json.rules.map(Rules::from).unwrap_or_default();
        let fix = json
            .fix
            .map(|f| FixConfig {
                enabled: f.enabled.unwrap_or(false),
                backup: f.backup.unwrap_or(true),
                interactive: f.interactive.unwrap_or(false),
            })
            .unwrap_or_default();

        let tfd_json = json.test_file_detection.unwrap_or_default();
        let patterns = tfd_json
            .patterns
            .unwrap_or_else(|| DEFAULT_TEST_PATTERNS.iter().map(|s| s.to_string()).collect());
        let matcher = build_globset("testFileDetection.patterns", &patterns)?;
        let test_file_detection = TestFileDetection {
            enabled: tfd_json.enabled.unwrap_or(true),
            patterns,
            matcher,
        };

        let max_file_size = match json.max_file_size {
            Some(v) if v > 0.0 => v as u64,
            Some(v) => {
                return Err(ConfigError::NotPositive {
                    field: "maxFileSize",
                    value: v,
                })
            }
            None => DEFAULT_MAX_FILE_SIZE,
        };

        let watch_rate_limit = match json.watch_rate_limit {
            Some(v) if v > 0.0 => v,
            Some(v) => {
                return Err(ConfigError::NotPositive {
                    field: "watchRateLimit",
                    value: v,
                })
            }
            None => DEFAULT_WATCH_RATE_LIMIT,
        };

        Ok(UnreachConfig {
            entry_points,
            exclude_patterns,
            exclude_matcher,
            rules,
            ignore,
            fix,
            test_file_detection,
            max_file_size,
            watch_rate_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_every_rule() {
        let cfg = UnreachConfig::default();
        assert!(cfg.rules.unused_packages);
        assert!(cfg.rules.unused_assets);
        assert_eq!(cfg.max_file_size, DEFAULT_MAX_FILE_SIZE);
    }

    #[test]
    fn rejects_non_positive_max_file_size() {
        let json = UnreachJsonConfig {
            max_file_size: Some(0.0),
            ..Default::default()
        };
        let err = UnreachConfig::try_from(json).unwrap_err();
        assert!(matches!(err, ConfigError::NotPositive { field: "maxFileSize", .. }));
    }

    #[test]
    fn a_false_rule_is_preserved_through_merge() {
        let json = UnreachJsonConfig {
            rules: Some(RulesJson {
                unused_packages: Some(false),
                unused_imports: None,
                unused_exports: None,
                unused_functions: None,
                unused_variables: None,
                unused_files: None,
                unused_configs: None,
                unused_scripts: None,
                unused_types: None,
                unused_css_classes: None,
                unused_assets: None,
            }),
            ..Default::default()
        };
        let cfg = UnreachConfig::try_from(json).unwrap();
        assert!(!cfg.rules.unused_packages);
        assert!(cfg.rules.unused_imports);
    }

    #[test]
    fn rejects_malformed_json_shape() {
        let err = serde_json::from_str::<UnreachJsonConfig>(r#"{"notAField": true}"#).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }
}
