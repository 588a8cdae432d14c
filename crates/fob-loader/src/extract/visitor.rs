//! AST visitor that collects dependency specifiers.

use oxc_ast::ast::{
    Argument, CallExpression, ExportAllDeclaration, ExportNamedDeclaration, Expression,
    ImportDeclaration, ImportExpression, TemplateLiteral,
};
use oxc_ast_visit::{Visit, walk};

use crate::file::DependencyMap;

/// Collects literal specifiers and notes non-literal ones.
#[derive(Default)]
pub(super) struct DependencyVisitor {
    pub(super) dependencies: DependencyMap,
    pub(super) has_variable_imports: bool,
}

impl DependencyVisitor {
    fn record(&mut self, specifier: &str) {
        if !specifier.is_empty() {
            self.dependencies.entry(specifier.to_string()).or_insert(None);
        }
    }

    fn record_expression(&mut self, expr: &Expression<'_>) {
        match literal_expression(expr) {
            Some(specifier) => self.record(&specifier),
            None => self.has_variable_imports = true,
        }
    }

    /// `require(x)` or `require.resolve(x)`
    fn is_require_callee(callee: &Expression<'_>) -> bool {
        match callee {
            Expression::Identifier(ident) => ident.name == "require",
            Expression::StaticMemberExpression(member) => {
                member.property.name == "resolve"
                    && matches!(&member.object, Expression::Identifier(ident) if ident.name == "require")
            }
            _ => false,
        }
    }
}

/// Static string value of a specifier expression, if it has one.
fn literal_expression(expr: &Expression<'_>) -> Option<String> {
    match expr {
        Expression::StringLiteral(lit) => Some(lit.value.to_string()),
        Expression::TemplateLiteral(template) => literal_template(template),
        Expression::ParenthesizedExpression(paren) => literal_expression(&paren.expression),
        _ => None,
    }
}

/// A template literal is static only without substitutions.
fn literal_template(template: &TemplateLiteral<'_>) -> Option<String> {
    if !template.expressions.is_empty() {
        return None;
    }
    template
        .quasis
        .first()
        .map(|quasi| {
            quasi
                .value
                .cooked
                .as_ref()
                .map_or_else(|| quasi.value.raw.to_string(), |cooked| cooked.to_string())
        })
}

impl<'a> Visit<'a> for DependencyVisitor {
    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        if !decl.import_kind.is_type() {
            self.record(decl.source.value.as_str());
        }
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if let Some(source) = &decl.source {
            if !decl.export_kind.is_type() {
                self.record(source.value.as_str());
            }
        }
        walk::walk_export_named_declaration(self, decl);
    }

    fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
        if !decl.export_kind.is_type() {
            self.record(decl.source.value.as_str());
        }
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        self.record_expression(&expr.source);
        walk::walk_import_expression(self, expr);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if Self::is_require_callee(&call.callee) {
            match call.arguments.first() {
                Some(Argument::SpreadElement(_)) => self.has_variable_imports = true,
                Some(arg) => match arg.as_expression() {
                    Some(expr) => self.record_expression(expr),
                    None => self.has_variable_imports = true,
                },
                // Bare `require()` imports nothing.
                None => {}
            }
        }
        walk::walk_call_expression(self, call);
    }
}
