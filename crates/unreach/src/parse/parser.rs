//! Source-to-`FileSummary` entry point.
//!
//! Reads the file from disk, enforces the size gate, hashes the content, and
//! builds an SWC lexer/parser over it, threading parse failures back as
//! warnings rather than panics.
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use swc_common::errors::{ColorConfig, Handler};
use swc_common::sync::Lrc;
use swc_common::{FileName, SourceMap};
use swc_ecma_parser::{lexer::Lexer, Capturing, Parser, StringInput, Syntax, TsSyntax};
use swc_ecma_visit::VisitWith;
use thiserror::Error;

use super::summary::FileSummary;
use super::visitor::SummaryVisitor;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{path}: could not be read: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: exceeds max file size ({size} > {max})")]
    TooLarge { path: String, size: u64, max: u64 },
    #[error("{path}: syntax error: {message}")]
    Syntax { path: String, message: String },
}

/// Result of a successful parse: the derived [`FileSummary`] plus the
/// content hash it was computed from, used by the cache as the key.
pub struct ParsedFile {
    pub summary: FileSummary,
    pub content_hash: String,
}

pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Parses a single source file on disk into a [`FileSummary`].
///
/// `max_file_size` enforces the cap from `UnreachConfig`; files over the cap
/// are rejected before their bytes are even decoded as UTF-8.
pub fn parse_source(path: &Path, max_file_size: u64) -> Result<ParsedFile, ParseError> {
    let metadata = fs::metadata(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if metadata.len() > max_file_size {
        return Err(ParseError::TooLarge {
            path: path.display().to_string(),
            size: metadata.len(),
            max: max_file_size,
        });
    }

    let content = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let hash = content_hash(&content);
    let summary = parse_str(path, &content)?;

    Ok(ParsedFile {
        summary,
        content_hash: hash,
    })
}

/// Parses already-loaded source text, independent of the filesystem. Exposed
/// separately so tests and the cache layer can re-parse cached content
/// without a disk round-trip.
pub fn parse_str(path: &Path, content: &str) -> Result<FileSummary, ParseError> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        Lrc::new(FileName::Real(path.to_path_buf())),
        content.to_string(),
    );

    // Produce a JavaScript/TypeScript syntax tree with JSX enabled,
    // unconditionally, independent of the file's extension.
    let syntax = Syntax::Typescript(TsSyntax {
        tsx: true,
        decorators: true,
        ..Default::default()
    });

    let lexer = Lexer::new(syntax, Default::default(), StringInput::from(&*fm), None);
    let capturing = Capturing::new(lexer);
    let mut parser = Parser::new_from(capturing);

    let handler = Handler::with_tty_emitter(ColorConfig::Never, false, false, Some(cm.clone()));
    let module = parser.parse_typescript_module().map_err(|err| {
        let mut diagnostic = err.into_diagnostic(&handler);
        let message = diagnostic.message();
        diagnostic.cancel();
        ParseError::Syntax {
            path: path.display().to_string(),
            message,
        }
    })?;

    let mut visitor = SummaryVisitor::new(&cm);
    module.visit_with(&mut visitor);
    visitor.summary.finalize_exported_flags();

    Ok(visitor.summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(src: &str) -> FileSummary {
        parse_str(&PathBuf::from("test.ts"), src).expect("valid source")
    }

    #[test]
    fn named_import_is_recorded() {
        let summary = parse(r#"import { foo, bar } from "./lib";"#);
        assert_eq!(summary.imports, vec!["./lib".to_string()]);
        let detail = &summary.import_details["./lib"];
        assert!(detail.specifiers.contains("foo"));
        assert!(detail.specifiers.contains("bar"));
        assert!(!detail.is_default);
        assert!(!detail.is_namespace);
    }

    #[test]
    fn default_and_namespace_imports_are_flagged() {
        let summary = parse(r#"import Foo, * as NS from "./mod";"#);
        let detail = &summary.import_details["./mod"];
        assert!(detail.is_default);
        assert!(detail.is_namespace);
    }

    #[test]
    fn type_only_import_is_segregated() {
        let summary = parse(r#"import type { Thing } from "./types";"#);
        let detail = &summary.import_details["./types"];
        assert!(detail.is_type_only);
        assert!(detail.type_specifiers.contains("Thing"));
        assert!(detail.specifiers.is_empty());
    }

    #[test]
    fn exported_function_declaration_is_recorded() {
        let summary = parse("export function doThing() {}");
        assert!(summary.functions.contains_key("doThing"));
        assert!(summary.functions["doThing"].is_exported);
        assert_eq!(summary.exports["doThing"].kind, ExportKind::Named);
    }

    #[test]
    fn default_export_expression_is_recorded() {
        let summary = parse("const x = 1;\nexport default x;");
        assert_eq!(summary.exports["default"].kind, ExportKind::Default);
        assert!(summary.variable_references.contains("x"));
    }

    #[test]
    fn re_export_named_from_source_is_recorded() {
        let summary = parse(r#"export { foo as bar } from "./other";"#);
        let re = &summary.re_exports["bar"];
        assert_eq!(re.source_file, "./other");
        assert_eq!(re.exported_name, "foo");
    }

    #[test]
    fn export_star_uses_sentinel_key() {
        let summary = parse(r#"export * from "./other";"#);
        let re = &summary.re_exports[EXPORT_STAR_KEY];
        assert_eq!(re.source_file, "./other");
    }

    #[test]
    fn destructured_variable_declaration_binds_each_name() {
        let summary = parse("const { a, b: renamed } = obj;");
        assert!(summary.variables.contains_key("a"));
        assert!(summary.variables.contains_key("renamed"));
        assert!(summary.variable_references.contains("obj"));
    }

    #[test]
    fn function_parameters_do_not_register_as_references() {
        let summary = parse("function f(x) { return x + 1; }");
        // `x` is used once as a reference inside the body, but the
        // parameter binding itself must not create a spurious reference.
        assert!(summary.variable_references.contains("x"));
        assert!(!summary.functions["f"].is_exported);
    }

    #[test]
    fn object_property_keys_are_not_references() {
        let summary = parse("const o = { foo: 1, bar: 2 };");
        assert!(!summary.variable_references.contains("foo"));
        assert!(!summary.variable_references.contains("bar"));
    }

    #[test]
    fn dynamic_import_with_string_literal_is_recorded() {
        let summary = parse(r#"const m = import("./lazy");"#);
        assert_eq!(summary.dynamic_imports.len(), 1);
        assert_eq!(summary.dynamic_imports[0].path, "./lazy");
        assert!(!summary.dynamic_imports[0].is_template_literal);
    }

    #[test]
    fn dynamic_import_with_template_literal_is_flagged() {
        let summary = parse(r#"const m = import(`./lazy/${name}`);"#);
        assert!(summary.dynamic_imports[0].is_template_literal);
    }

    #[test]
    fn jsx_element_and_class_name_are_collected() {
        let summary = parse(r#"const el = <Button className="btn primary" />;"#);
        assert!(summary.jsx_elements.contains("Button"));
        assert!(summary.css_classes.contains("btn"));
        assert!(summary.css_classes.contains("primary"));
    }

    #[test]
    fn function_call_target_is_recorded() {
        let summary = parse("doSomething(); obj.method();");
        assert!(summary.function_calls.contains("doSomething"));
        assert!(summary.function_calls.contains("method"));
    }

    #[test]
    fn rejects_invalid_syntax() {
        let err = parse_str(&PathBuf::from("bad.ts"), "const = ;");
        assert!(err.is_err());
    }
}
