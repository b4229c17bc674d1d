//! The `FileSummary` data model: the parsed view of one source file.
use ahashmap::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

/// A canonical absolute file path; the unique identity of a graph node.
pub type ModulePath = std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportDetail {
    pub specifiers: AHashSet<String>,
    pub type_specifiers: AHashSet<String>,
    pub is_default: bool,
    pub is_namespace: bool,
    pub is_type_only: bool,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DynamicImport {
    pub path: String,
    pub is_template_literal: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Named,
    Default,
    Namespace,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportInfo {
    #[serde(rename = "type")]
    pub kind: ExportKind,
    pub line: u32,
    pub column: u32,
}

/// A re-export entry; `export * from "X"` is recorded under the single key `*`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReExportInfo {
    pub source_file: String,
    pub exported_name: String,
}

pub const EXPORT_STAR_KEY: &str = "*";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeclInfo {
    pub line: u32,
    pub column: u32,
    pub is_exported: bool,
    #[serde(default)]
    pub kind: Option<String>,
}

/// The parsed view of one source file. The graph owns exactly one of
/// these per in-project file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub imports: Vec<String>,
    pub import_details: AHashMap<String, ImportDetail>,
    pub dynamic_imports: Vec<DynamicImport>,
    pub exports: AHashMap<String, ExportInfo>,
    pub re_exports: AHashMap<String, ReExportInfo>,
    pub functions: AHashMap<String, DeclInfo>,
    pub classes: AHashMap<String, DeclInfo>,
    pub variables: AHashMap<String, DeclInfo>,
    pub types: AHashMap<String, DeclInfo>,
    pub variable_references: AHashSet<String>,
    pub function_calls: AHashSet<String>,
    pub jsx_elements: AHashSet<String>,
    pub css_classes: AHashSet<String>,
    pub is_entry_point: bool,
}

impl FileSummary {
    /// Merges a newly-seen import occurrence of the same specifier into an
    /// existing `ImportDetail`: multiple imports of the same specifier
    /// within one file are merged.
    pub fn add_import(&mut self, specifier: String, detail: ImportDetail) {
        self.imports.push(specifier.clone());
        use std::collections::hash_map::Entry;
        match self.import_details.entry(specifier) {
            Entry::Occupied(mut o) => {
                let existing = o.get_mut();
                existing.specifiers.extend(detail.specifiers);
                existing.type_specifiers.extend(detail.type_specifiers);
                existing.is_default |= detail.is_default;
                existing.is_namespace |= detail.is_namespace;
                existing.is_type_only |= detail.is_type_only;
            }
            Entry::Vacant(v) => {
                v.insert(detail);
            }
        }
    }

    /// Post-processing pass: mark `isExported` on every declaration
    /// whose name also appears as a key in `exports`.
    pub fn finalize_exported_flags(&mut self) {
        for map in [
            &mut self.functions,
            &mut self.classes,
            &mut self.variables,
            &mut self.types,
        ] {
            for (name, decl) in map.iter_mut() {
                if self.exports.contains_key(name) {
                    decl.is_exported = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_import_merges_repeated_specifiers() {
        let mut summary = FileSummary::default();
        summary.add_import(
            "./lib".to_string(),
            ImportDetail {
                specifiers: ["a".to_string()].into_iter().collect(),
                ..Default::default()
            },
        );
        summary.add_import(
            "./lib".to_string(),
            ImportDetail {
                specifiers: ["b".to_string()].into_iter().collect(),
                ..Default::default()
            },
        );
        assert_eq!(summary.imports.len(), 2);
        assert_eq!(summary.import_details.len(), 1);
        let merged = &summary.import_details["./lib"];
        assert!(merged.specifiers.contains("a"));
        assert!(merged.specifiers.contains("b"));
    }

    #[test]
    fn finalize_exported_flags_marks_matching_declarations() {
        let mut summary = FileSummary::default();
        summary.functions.insert(
            "foo".to_string(),
            DeclInfo {
                line: 1,
                column: 0,
                is_exported: false,
                kind: None,
            },
        );
        summary.exports.insert(
            "foo".to_string(),
            ExportInfo {
                kind: ExportKind::Named,
                line: 1,
                column: 0,
            },
        );
        summary.finalize_exported_flags();
        assert!(summary.functions["foo"].is_exported);
    }
}
