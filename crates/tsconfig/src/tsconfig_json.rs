use ahashmap::AHashMap;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;

use crate::error::OpenTsConfigError;

/// A parsed `tsconfig.json`, typed for both entry-point detection
/// (`files`/`include`) and the unused-config taxonomy.
#[derive(Debug, Deserialize, PartialEq, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TsConfigJson {
    #[serde(default)]
    pub compiler_options: CompilerOptions,
    #[serde(default)]
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub include: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, PartialEq, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    // always-used options -- presence/value is never examined for the
    // taxonomy, only that the key itself is a recognized compiler option.
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub lib: Option<Vec<String>>,
    #[serde(default)]
    pub module_resolution: Option<String>,
    #[serde(default)]
    pub strict: Option<bool>,
    #[serde(default)]
    pub es_module_interop: Option<bool>,
    #[serde(default)]
    pub skip_lib_check: Option<bool>,
    #[serde(default)]
    pub force_consistent_casing_in_file_names: Option<bool>,
    #[serde(default)]
    pub out_dir: Option<String>,
    #[serde(default)]
    pub root_dir: Option<String>,
    #[serde(default)]
    pub declaration: Option<bool>,
    #[serde(default)]
    pub declaration_map: Option<bool>,
    #[serde(default)]
    pub source_map: Option<bool>,
    #[serde(default)]
    pub jsx: Option<String>,
    #[serde(default)]
    pub jsx_factory: Option<String>,
    #[serde(default)]
    pub jsx_fragment_factory: Option<String>,

    // conditional options
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub paths: AHashMap<String, Vec<String>>,
    #[serde(default)]
    pub types: Option<serde_json::Value>,
    #[serde(default)]
    pub type_roots: Option<Vec<String>>,
    #[serde(default)]
    pub experimental_decorators: Option<bool>,
    #[serde(default)]
    pub emit_decorator_metadata: Option<bool>,

    /// Any other compiler option: always used, per the taxonomy; kept only so
    /// the config finder can enumerate which keys were present at all.
    #[serde(flatten)]
    pub extra: AHashMap<String, serde_json::Value>,
}

impl TsConfigJson {
    pub fn from_path(tsconfig_path: &std::path::Path) -> Result<Self, OpenTsConfigError> {
        let file = File::open(tsconfig_path).map_err(OpenTsConfigError::IOError)?;
        let buf_reader = BufReader::new(file);
        serde_json::from_reader(buf_reader).map_err(OpenTsConfigError::SerdeError)
    }

    pub fn types_is_used(&self) -> bool {
        match &self.compiler_options.types {
            Some(serde_json::Value::Array(v)) => !v.is_empty(),
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            _ => false,
        }
    }

    pub fn include_is_unused(&self) -> bool {
        match &self.include {
            None => true,
            Some(v) => v.is_empty() || v.as_slice() == ["**/*"],
        }
    }

    pub fn exclude_is_unused(&self) -> bool {
        match &self.exclude {
            None => true,
            Some(v) => v.as_slice() == ["node_modules"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_base_url_and_paths() {
        let json = r#"{
            "compilerOptions": {
                "baseUrl": ".",
                "paths": { "@app/*": ["src/*"] }
            }
        }"#;
        let parsed: TsConfigJson = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.compiler_options.base_url.as_deref(), Some("."));
        assert_eq!(
            parsed.compiler_options.paths.get("@app/*").unwrap(),
            &vec!["src/*".to_string()]
        );
    }

    #[test]
    fn include_default_is_unused() {
        let parsed: TsConfigJson = serde_json::from_str("{}").unwrap();
        assert!(parsed.include_is_unused());
    }

    #[test]
    fn include_with_catch_all_glob_is_unused() {
        let parsed: TsConfigJson =
            serde_json::from_str(r#"{"include": ["**/*"]}"#).unwrap();
        assert!(parsed.include_is_unused());
    }

    #[test]
    fn include_with_specific_globs_is_used() {
        let parsed: TsConfigJson =
            serde_json::from_str(r#"{"include": ["src/**/*.ts"]}"#).unwrap();
        assert!(!parsed.include_is_unused());
    }

    #[test]
    fn exclude_default_node_modules_is_unused() {
        let parsed: TsConfigJson =
            serde_json::from_str(r#"{"exclude": ["node_modules"]}"#).unwrap();
        assert!(parsed.exclude_is_unused());
    }
}
