//! Single-pass `Visit` implementation that builds a [`FileSummary`].
//!
//! Collects imports, exports, re-exports, declarations, references, calls,
//! and JSX in one walk. Binding occurrences (declarator names, import
//! specifiers, property keys) are distinguished from reads purely
//! syntactically -- "is this identifier's immediate parent a binding site" --
//! with no scope resolution, so shadowing is not tracked.
use swc_common::{SourceMap, Span, Spanned};
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

use super::summary::*;

pub struct SummaryVisitor<'a> {
    cm: &'a SourceMap,
    pub summary: FileSummary,
}

impl<'a> SummaryVisitor<'a> {
    pub fn new(cm: &'a SourceMap) -> Self {
        Self {
            cm,
            summary: FileSummary::default(),
        }
    }

    fn loc(&self, span: Span) -> (u32, u32) {
        let loc = self.cm.lookup_char_pos(span.lo());
        (loc.line as u32, loc.col.0 as u32)
    }

    fn decl_info(&self, span: Span) -> DeclInfo {
        let (line, column) = self.loc(span);
        DeclInfo {
            line,
            column,
            is_exported: false,
            kind: None,
        }
    }

    fn record_reference(&mut self, name: &str) {
        self.summary.variable_references.insert(name.to_string());
    }

    /// Binds every identifier in a (possibly destructured) pattern as a
    /// declaration of `kind` into `variables`: destructuring patterns yield
    /// one entry per bound identifier.
    fn bind_pattern(&mut self, pat: &Pat, is_exported: bool) {
        match pat {
            Pat::Ident(ident) => {
                let (line, column) = self.loc(ident.id.span);
                self.summary.variables.insert(
                    ident.id.sym.to_string(),
                    DeclInfo {
                        line,
                        column,
                        is_exported,
                        kind: Some("variable".to_string()),
                    },
                );
            }
            Pat::Array(arr) => {
                for elem in arr.elems.iter().flatten() {
                    self.bind_pattern(elem, is_exported);
                }
            }
            Pat::Object(obj) => {
                for prop in &obj.props {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => self.bind_pattern(&kv.value, is_exported),
                        ObjectPatProp::Assign(assign) => {
                            let (line, column) = self.loc(assign.key.id.span);
                            self.summary.variables.insert(
                                assign.key.id.sym.to_string(),
                                DeclInfo {
                                    line,
                                    column,
                                    is_exported,
                                    kind: Some("variable".to_string()),
                                },
                            );
                            if let Some(default) = &assign.value {
                                default.visit_with(self);
                            }
                        }
                        ObjectPatProp::Rest(rest) => self.bind_pattern(&rest.arg, is_exported),
                    }
                }
            }
            Pat::Rest(rest) => self.bind_pattern(&rest.arg, is_exported),
            Pat::Assign(assign) => {
                self.bind_pattern(&assign.left, is_exported);
                assign.right.visit_with(self);
            }
            Pat::Invalid(_) | Pat::Expr(_) => {}
        }
    }

    fn record_named_export(&mut self, name: &str, span: Span) {
        let (line, column) = self.loc(span);
        self.summary.exports.insert(
            name.to_string(),
            ExportInfo {
                kind: ExportKind::Named,
                line,
                column,
            },
        );
    }

    fn record_default_export(&mut self, span: Span) {
        let (line, column) = self.loc(span);
        self.summary.exports.insert(
            "default".to_string(),
            ExportInfo {
                kind: ExportKind::Default,
                line,
                column,
            },
        );
    }

    /// Handles a `Decl` found directly under `export ...`, with
    /// `isExported` forced true.
    fn visit_exported_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Class(class_decl) => {
                self.record_named_export(&class_decl.ident.sym, class_decl.ident.span);
                let (line, column) = self.loc(class_decl.ident.span);
                self.summary.classes.insert(
                    class_decl.ident.sym.to_string(),
                    DeclInfo {
                        line,
                        column,
                        is_exported: true,
                        kind: None,
                    },
                );
                class_decl.class.visit_with(self);
            }
            Decl::Fn(fn_decl) => {
                self.record_named_export(&fn_decl.ident.sym, fn_decl.ident.span);
                let (line, column) = self.loc(fn_decl.ident.span);
                self.summary.functions.insert(
                    fn_decl.ident.sym.to_string(),
                    DeclInfo {
                        line,
                        column,
                        is_exported: true,
                        kind: None,
                    },
                );
                fn_decl.function.visit_with(self);
            }
            Decl::Var(var_decl) => {
                for d in &var_decl.decls {
                    self.bind_pattern(&d.name, true);
                    if let Some(init) = &d.init {
                        init.visit_with(self);
                    }
                }
                for name in pattern_top_level_names(var_decl) {
                    self.record_named_export(&name.0, name.1);
                }
            }
            Decl::TsInterface(i) => {
                self.record_named_export(&i.id.sym, i.id.span);
                let (line, column) = self.loc(i.id.span);
                self.summary.types.insert(
                    i.id.sym.to_string(),
                    DeclInfo {
                        line,
                        column,
                        is_exported: true,
                        kind: Some("interface".to_string()),
                    },
                );
                i.extends.visit_with(self);
                i.body.visit_with(self);
            }
            Decl::TsTypeAlias(t) => {
                self.record_named_export(&t.id.sym, t.id.span);
                let (line, column) = self.loc(t.id.span);
                self.summary.types.insert(
                    t.id.sym.to_string(),
                    DeclInfo {
                        line,
                        column,
                        is_exported: true,
                        kind: Some("type".to_string()),
                    },
                );
                t.type_ann.visit_with(self);
            }
            Decl::TsEnum(e) => {
                self.record_named_export(&e.id.sym, e.id.span);
                let (line, column) = self.loc(e.id.span);
                self.summary.types.insert(
                    e.id.sym.to_string(),
                    DeclInfo {
                        line,
                        column,
                        is_exported: true,
                        kind: Some("enum".to_string()),
                    },
                );
                for member in &e.members {
                    if let Some(init) = &member.init {
                        init.visit_with(self);
                    }
                }
            }
            Decl::TsModule(_) | Decl::Using(_) => {}
        }
    }

    /// Handles a non-exported top-level `Decl`.
    fn visit_plain_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Class(class_decl) => {
                let (line, column) = self.loc(class_decl.ident.span);
                self.summary.classes.insert(
                    class_decl.ident.sym.to_string(),
                    self.decl_info_at(line, column),
                );
                class_decl.class.visit_with(self);
            }
            Decl::Fn(fn_decl) => {
                let (line, column) = self.loc(fn_decl.ident.span);
                self.summary.functions.insert(
                    fn_decl.ident.sym.to_string(),
                    self.decl_info_at(line, column),
                );
                fn_decl.function.visit_with(self);
            }
            Decl::Var(var_decl) => {
                for d in &var_decl.decls {
                    self.bind_pattern(&d.name, false);
                    if let Some(init) = &d.init {
                        init.visit_with(self);
                    }
                }
            }
            Decl::TsInterface(i) => {
                let (line, column) = self.loc(i.id.span);
                self.summary.types.insert(
                    i.id.sym.to_string(),
                    DeclInfo {
                        line,
                        column,
                        is_exported: false,
                        kind: Some("interface".to_string()),
                    },
                );
                i.extends.visit_with(self);
                i.body.visit_with(self);
            }
            Decl::TsTypeAlias(t) => {
                let (line, column) = self.loc(t.id.span);
                self.summary.types.insert(
                    t.id.sym.to_string(),
                    DeclInfo {
                        line,
                        column,
                        is_exported: false,
                        kind: Some("type".to_string()),
                    },
                );
                t.type_ann.visit_with(self);
            }
            Decl::TsEnum(e) => {
                let (line, column) = self.loc(e.id.span);
                self.summary.types.insert(
                    e.id.sym.to_string(),
                    DeclInfo {
                        line,
                        column,
                        is_exported: false,
                        kind: Some("enum".to_string()),
                    },
                );
                for member in &e.members {
                    if let Some(init) = &member.init {
                        init.visit_with(self);
                    }
                }
            }
            Decl::TsModule(_) | Decl::Using(_) => {}
        }
    }

    fn decl_info_at(&self, line: u32, column: u32) -> DeclInfo {
        DeclInfo {
            line,
            column,
            is_exported: false,
            kind: None,
        }
    }

    fn module_export_name_str(name: &ModuleExportName) -> String {
        match name {
            ModuleExportName::Ident(id) => id.sym.to_string(),
            ModuleExportName::Str(s) => s.value.to_string(),
        }
    }

    fn tokenize_class_literal(&mut self, literal: &str) {
        for token in literal.split_whitespace() {
            if !token.is_empty() {
                self.summary.css_classes.insert(token.to_string());
            }
        }
    }

    /// Reconstructs the raw template literal text, preserving `${...}` holes
    /// for dynamic-import recording.
    fn template_raw(tpl: &Tpl) -> String {
        let mut out = String::new();
        for (i, quasi) in tpl.quasis.iter().enumerate() {
            out.push_str(&quasi.raw);
            if i < tpl.exprs.len() {
                out.push_str("${...}");
            }
        }
        out
    }

    fn dynamic_import_record(&mut self, call: &CallExpr) {
        let arg = match call.args.first() {
            Some(a) => &a.expr,
            None => return,
        };
        match &**arg {
            Expr::Lit(Lit::Str(s)) => {
                self.summary.dynamic_imports.push(DynamicImport {
                    path: s.value.to_string(),
                    is_template_literal: false,
                });
            }
            Expr::Tpl(tpl) => {
                self.summary.dynamic_imports.push(DynamicImport {
                    path: Self::template_raw(tpl),
                    is_template_literal: true,
                });
            }
            Expr::Ident(ident) if ident.sym == *"__dirname" || ident.sym == *"__filename" => {
                self.summary.dynamic_imports.push(DynamicImport {
                    path: ident.sym.to_string(),
                    is_template_literal: false,
                });
            }
            Expr::Bin(bin) if bin.op == BinaryOp::Add => {
                if let Expr::Ident(ident) = &*bin.left {
                    if ident.sym == *"__dirname" || ident.sym == *"__filename" {
                        if let Expr::Lit(Lit::Str(rest)) = &*bin.right {
                            self.summary.dynamic_imports.push(DynamicImport {
                                path: format!("{}{}", ident.sym, rest.value),
                                is_template_literal: false,
                            });
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

/// Extracts `(name, span)` pairs for every top-level binding in a `VarDecl`,
/// used when an export declaration needs to record names separately from
/// binding (the declaration's own span differs from each name's span).
fn pattern_top_level_names(var_decl: &VarDecl) -> Vec<(String, Span)> {
    fn collect(pat: &Pat, out: &mut Vec<(String, Span)>) {
        match pat {
            Pat::Ident(i) => out.push((i.id.sym.to_string(), i.id.span)),
            Pat::Array(a) => {
                for elem in a.elems.iter().flatten() {
                    collect(elem, out);
                }
            }
            Pat::Object(o) => {
                for prop in &o.props {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => collect(&kv.value, out),
                        ObjectPatProp::Assign(a) => out.push((a.key.id.sym.to_string(), a.key.id.span)),
                        ObjectPatProp::Rest(r) => collect(&r.arg, out),
                    }
                }
            }
            Pat::Rest(r) => collect(&r.arg, out),
            Pat::Assign(a) => collect(&a.left, out),
            Pat::Invalid(_) | Pat::Expr(_) => {}
        }
    }
    let mut out = Vec::new();
    for d in &var_decl.decls {
        collect(&d.name, &mut out);
    }
    out
}

impl<'a> Visit for SummaryVisitor<'a> {
    // --- imports -----------------------------------------------------

    fn visit_import_decl(&mut self, node: &ImportDecl) {
        let src = node.src.value.to_string();

        if node.specifiers.is_empty() {
            self.summary.add_import(src, ImportDetail::default());
            return;
        }

        let (line, column) = self.loc(node.span);
        let mut detail = ImportDetail {
            line,
            column,
            is_type_only: node.type_only,
            ..Default::default()
        };

        for spec in &node.specifiers {
            match spec {
                ImportSpecifier::Default(d) => {
                    detail.is_default = true;
                    detail.specifiers.insert(d.local.sym.to_string());
                }
                ImportSpecifier::Namespace(n) => {
                    detail.is_namespace = true;
                    detail.specifiers.insert(n.local.sym.to_string());
                }
                ImportSpecifier::Named(named) => {
                    let imported_name = match &named.imported {
                        Some(m) => Self::module_export_name_str(m),
                        None => named.local.sym.to_string(),
                    };
                    if named.is_type_only || node.type_only {
                        detail.type_specifiers.insert(imported_name);
                        detail.is_type_only = true;
                    } else {
                        detail.specifiers.insert(imported_name);
                    }
                }
            }
        }

        self.summary.add_import(src, detail);
    }

    // require('x') / import('x')
    fn visit_call_expr(&mut self, node: &CallExpr) {
        if let Callee::Import(_) = &node.callee {
            self.dynamic_import_record(node);
        }
        if let Callee::Expr(callee) = &node.callee {
            match &**callee {
                Expr::Ident(ident) => {
                    self.summary.function_calls.insert(ident.sym.to_string());
                }
                Expr::Member(member) => {
                    if let MemberProp::Ident(prop) = &member.prop {
                        self.summary.function_calls.insert(prop.sym.to_string());
                    }
                }
                _ => {}
            }
        }
        node.visit_children_with(self);
    }

    // --- exports -------------------------------------------------------

    fn visit_export_decl(&mut self, node: &ExportDecl) {
        self.visit_exported_decl(&node.decl);
    }

    fn visit_export_default_decl(&mut self, node: &ExportDefaultDecl) {
        self.record_default_export(node.span());
        match &node.decl {
            DefaultDecl::Class(c) => {
                if let Some(ident) = &c.ident {
                    let (line, column) = self.loc(ident.span);
                    self.summary
                        .classes
                        .insert(ident.sym.to_string(), self.decl_info_at(line, column));
                }
                c.class.visit_with(self);
            }
            DefaultDecl::Fn(f) => {
                if let Some(ident) = &f.ident {
                    let (line, column) = self.loc(ident.span);
                    self.summary
                        .functions
                        .insert(ident.sym.to_string(), self.decl_info_at(line, column));
                }
                f.function.visit_with(self);
            }
            DefaultDecl::TsInterfaceDecl(i) => {
                let (line, column) = self.loc(i.id.span);
                self.summary.types.insert(
                    i.id.sym.to_string(),
                    DeclInfo {
                        line,
                        column,
                        is_exported: true,
                        kind: Some("interface".to_string()),
                    },
                );
                i.body.visit_with(self);
            }
        }
    }

    fn visit_export_default_expr(&mut self, node: &ExportDefaultExpr) {
        self.record_default_export(node.span());
        node.expr.visit_with(self);
    }

    fn visit_export_all(&mut self, node: &ExportAll) {
        let src = node.src.value.to_string();
        self.summary.add_import(
            src.clone(),
            ImportDetail {
                is_namespace: true,
                ..Default::default()
            },
        );
        self.summary.re_exports.insert(
            EXPORT_STAR_KEY.to_string(),
            ReExportInfo {
                source_file: src,
                exported_name: EXPORT_STAR_KEY.to_string(),
            },
        );
    }

    fn visit_named_export(&mut self, node: &NamedExport) {
        let (line, column) = self.loc(node.span());
        match &node.src {
            Some(src) => {
                let source_file = src.value.to_string();
                self.summary.add_import(
                    source_file.clone(),
                    ImportDetail {
                        is_namespace: false,
                        ..Default::default()
                    },
                );
                for spec in &node.specifiers {
                    match spec {
                        ExportSpecifier::Namespace(ns) => {
                            let exported_name = Self::module_export_name_str(&ns.name);
                            self.summary.re_exports.insert(
                                exported_name.clone(),
                                ReExportInfo {
                                    source_file: source_file.clone(),
                                    exported_name: EXPORT_STAR_KEY.to_string(),
                                },
                            );
                            self.record_named_export(&exported_name, node.span());
                        }
                        ExportSpecifier::Default(d) => {
                            let exported_name = d.exported.sym.to_string();
                            self.summary.re_exports.insert(
                                exported_name.clone(),
                                ReExportInfo {
                                    source_file: source_file.clone(),
                                    exported_name: "default".to_string(),
                                },
                            );
                            self.record_named_export(&exported_name, node.span());
                        }
                        ExportSpecifier::Named(named) => {
                            let orig = Self::module_export_name_str(&named.orig);
                            let exported_name = named
                                .exported
                                .as_ref()
                                .map(Self::module_export_name_str)
                                .unwrap_or_else(|| orig.clone());
                            self.summary.re_exports.insert(
                                exported_name.clone(),
                                ReExportInfo {
                                    source_file: source_file.clone(),
                                    exported_name: orig,
                                },
                            );
                            self.record_named_export(&exported_name, node.span());
                        }
                    }
                }
            }
            None => {
                for spec in &node.specifiers {
                    if let ExportSpecifier::Named(named) = spec {
                        let orig = Self::module_export_name_str(&named.orig);
                        let exported_name = named
                            .exported
                            .as_ref()
                            .map(Self::module_export_name_str)
                            .unwrap_or(orig.clone());
                        if exported_name == "default" {
                            self.summary.exports.insert(
                                "default".to_string(),
                                ExportInfo {
                                    kind: ExportKind::Default,
                                    line,
                                    column,
                                },
                            );
                        } else {
                            self.record_named_export(&exported_name, node.span());
                        }
                        self.record_reference(&orig);
                    }
                }
            }
        }
    }

    fn visit_ts_import_equals_decl(&mut self, node: &TsImportEqualsDecl) {
        if let TsModuleRef::TsExternalModuleRef(m) = &node.module_ref {
            self.summary
                .add_import(m.expr.value.to_string(), ImportDetail::default());
        }
    }

    // --- declarations ----------------------------------------------------

    fn visit_module_item(&mut self, node: &ModuleItem) {
        match node {
            ModuleItem::Stmt(Stmt::Decl(decl)) => self.visit_plain_decl(decl),
            _ => node.visit_children_with(self),
        }
    }

    // Function/class/var/type declarations that are *not* wrapped in an
    // `export`/`ModuleItem` context (nested inside blocks, etc.) fall through
    // to the generic visitors below so nested scopes are still covered.
    fn visit_fn_decl(&mut self, node: &FnDecl) {
        let (line, column) = self.loc(node.ident.span);
        self.summary
            .functions
            .entry(node.ident.sym.to_string())
            .or_insert_with(|| self.decl_info_at(line, column));
        node.function.visit_with(self);
    }

    fn visit_class_decl(&mut self, node: &ClassDecl) {
        let (line, column) = self.loc(node.ident.span);
        self.summary
            .classes
            .entry(node.ident.sym.to_string())
            .or_insert_with(|| self.decl_info_at(line, column));
        node.class.visit_with(self);
    }

    fn visit_var_decl(&mut self, node: &VarDecl) {
        for d in &node.decls {
            self.bind_pattern(&d.name, false);
            if let Some(init) = &d.init {
                init.visit_with(self);
            }
        }
    }

    // --- binding sites that must not register as references --------------

    fn visit_binding_ident(&mut self, _node: &BindingIdent) {
        // Intentionally a no-op: a `BindingIdent` is, by construction, a
        // binding-site occurrence (var-decl name, function/catch/destructure
        // param). Not calling `visit_children_with` stops the generic
        // `visit_ident` below from ever seeing it as a reference.
    }

    fn visit_import_named_specifier(&mut self, _node: &ImportNamedSpecifier) {
        // local/imported names are already captured in visit_import_decl.
    }

    fn visit_import_default_specifier(&mut self, _node: &ImportDefaultSpecifier) {}

    fn visit_import_star_as_specifier(&mut self, _node: &ImportStarAsSpecifier) {}

    fn visit_export_specifier(&mut self, _node: &ExportSpecifier) {
        // handled explicitly in visit_named_export
    }

    fn visit_prop_name(&mut self, node: &PropName) {
        // object/class member keys are never references; only descend into
        // computed keys, which hold a real expression.
        if let PropName::Computed(c) = node {
            c.expr.visit_with(self);
        }
    }

    // --- references --------------------------------------------------

    fn visit_ident(&mut self, node: &Ident) {
        self.record_reference(&node.sym);
    }

    // --- JSX -----------------------------------------------------------

    fn visit_jsx_opening_element(&mut self, node: &JSXOpeningElement) {
        let name = jsx_name_string(&node.name);
        if let Some(name) = name {
            self.summary.jsx_elements.insert(name);
        }
        for attr_or_spread in &node.attrs {
            if let JSXAttrOrSpread::JSXAttr(attr) = attr_or_spread {
                let is_class_attr = matches!(&attr.name,
                    JSXAttrName::Ident(id) if id.sym == *"class" || id.sym == *"className");
                if is_class_attr {
                    if let Some(JSXAttrValue::Lit(Lit::Str(s))) = &attr.value {
                        self.tokenize_class_literal(&s.value);
                    }
                }
                if let Some(value) = &attr.value {
                    value.visit_with(self);
                }
            } else {
                attr_or_spread.visit_with(self);
            }
        }
    }
}

fn jsx_name_string(name: &JSXElementName) -> Option<String> {
    match name {
        JSXElementName::Ident(ident) => Some(ident.sym.to_string()),
        JSXElementName::JSXMemberExpr(member) => Some(member.prop.sym.to_string()),
        JSXElementName::JSXNamespacedName(ns) => Some(ns.name.sym.to_string()),
    }
}
