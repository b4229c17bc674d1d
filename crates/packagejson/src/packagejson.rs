use ahashmap::AHashMap;
use serde::Deserialize;

/// Either a json string or a boolean.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum StringOrBool {
    Str(String),
    Bool(bool),
}

/// A parsed `package.json`.
///
/// Every field the reachability pipeline needs is typed explicitly (entry-point
/// fields, dependency maps, and every key named in the unused-config taxonomy);
/// anything else lands in `extra` so the config finder can report it.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct PackageJson {
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(rename = "type")]
    pub package_type: Option<String>,

    // entry-point bearing fields
    #[serde(default)]
    pub main: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub browser: Option<serde_json::Value>,
    #[serde(default)]
    pub bin: Option<serde_json::Value>,
    #[serde(default)]
    pub exports: Option<serde_json::Value>,
    #[serde(default)]
    pub types: Option<String>,
    #[serde(default)]
    pub typings: Option<String>,

    // scripts / dependencies (read by the finders)
    #[serde(default)]
    pub scripts: AHashMap<String, String>,
    #[serde(default)]
    pub dependencies: AHashMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: AHashMap<String, String>,
    #[serde(default, rename = "peerDependencies")]
    pub peer_dependencies: AHashMap<String, String>,

    // metadata fields (unused-config taxonomy)
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub author: Option<serde_json::Value>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub repository: Option<serde_json::Value>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub bugs: Option<serde_json::Value>,
    #[serde(default)]
    pub funding: Option<serde_json::Value>,

    // conditional fields (unused-config taxonomy)
    #[serde(default)]
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub engines: Option<AHashMap<String, String>>,
    #[serde(default)]
    pub os: Option<Vec<String>>,
    #[serde(default)]
    pub cpu: Option<Vec<String>>,
    #[serde(default)]
    pub private: Option<bool>,
    #[serde(default)]
    pub workspaces: Option<serde_json::Value>,
    #[serde(default)]
    pub workspace: Option<serde_json::Value>,

    // standard npm fields, always used
    #[serde(default, rename = "publishConfig")]
    pub publish_config: Option<serde_json::Value>,
    #[serde(default, rename = "preferGlobal")]
    pub prefer_global: Option<serde_json::Value>,
    #[serde(default, rename = "bundleDependencies")]
    pub bundle_dependencies: Option<serde_json::Value>,
    #[serde(default, rename = "bundledDependencies")]
    pub bundled_dependencies: Option<serde_json::Value>,
    #[serde(default, rename = "optionalDependencies")]
    pub optional_dependencies: Option<serde_json::Value>,
    #[serde(default, rename = "peerDependenciesMeta")]
    pub peer_dependencies_meta: Option<serde_json::Value>,
    #[serde(default)]
    pub overrides: Option<serde_json::Value>,
    #[serde(default)]
    pub resolutions: Option<serde_json::Value>,

    /// Anything not named above: the "reported unused" branch of the taxonomy.
    #[serde(flatten)]
    pub extra: AHashMap<String, serde_json::Value>,
}

pub const METADATA_FIELDS: &[&str] = &[
    "description",
    "keywords",
    "author",
    "license",
    "repository",
    "homepage",
    "bugs",
    "funding",
];

impl PackageJson {
    pub fn read(path: &std::path::Path) -> anyhow::Result<Option<Self>> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    pub fn is_published(&self) -> bool {
        self.publish_config.is_some() || self.repository.is_some()
    }

    pub fn is_typescript_declared(&self) -> bool {
        self.dependencies.contains_key("typescript") || self.dev_dependencies.contains_key("typescript")
    }

    /// Every string value reachable under the entry-point-bearing fields,
    /// recursing into arrays and objects.
    pub fn entry_point_strings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(m) = &self.main {
            out.push(m.clone());
        }
        if let Some(m) = &self.module {
            out.push(m.clone());
        }
        if let Some(t) = &self.types {
            out.push(t.clone());
        }
        if let Some(t) = &self.typings {
            out.push(t.clone());
        }
        for field in [&self.bin, &self.browser, &self.exports] {
            if let Some(v) = field {
                collect_strings(v, &mut out);
            }
        }
        out
    }
}

fn collect_strings(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => out.push(s.clone()),
        serde_json::Value::Array(items) => {
            for item in items {
                collect_strings(item, out);
            }
        }
        serde_json::Value::Object(map) => {
            for v in map.values() {
                collect_strings(v, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_manifest() {
        let json = r#"{"name": "pkg", "main": "./dist/index.js"}"#;
        let parsed: PackageJson = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("pkg"));
        assert_eq!(parsed.main.as_deref(), Some("./dist/index.js"));
        assert!(parsed.extra.is_empty());
    }

    #[test]
    fn captures_unknown_keys_in_extra() {
        let json = r#"{"name": "pkg", "sideEffects": false, "customField": "x"}"#;
        let parsed: PackageJson = serde_json::from_str(json).unwrap();
        assert!(parsed.extra.contains_key("sideEffects"));
        assert!(parsed.extra.contains_key("customField"));
    }

    #[test]
    fn collects_nested_entry_point_strings() {
        let json = r#"{
            "main": "./index.js",
            "exports": {
                ".": { "import": "./esm/index.js", "require": "./cjs/index.js" },
                "./sub": "./sub.js"
            }
        }"#;
        let parsed: PackageJson = serde_json::from_str(json).unwrap();
        let strings = parsed.entry_point_strings();
        assert!(strings.contains(&"./index.js".to_string()));
        assert!(strings.contains(&"./esm/index.js".to_string()));
        assert!(strings.contains(&"./cjs/index.js".to_string()));
        assert!(strings.contains(&"./sub.js".to_string()));
    }

    #[test]
    fn is_published_detects_repository() {
        let json = r#"{"repository": "github:foo/bar"}"#;
        let parsed: PackageJson = serde_json::from_str(json).unwrap();
        assert!(parsed.is_published());
    }
}
