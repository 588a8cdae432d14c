//! Static dependency extraction.
//!
//! Turns JavaScript source text into the set of specifiers it imports, using
//! the Oxc parser. Recognized forms:
//!
//! - `import x from 'a'`, `import 'a'`
//! - `export { x } from 'a'`, `export * from 'a'`
//! - `import('a')`
//! - `require('a')`, `require.resolve('a')`
//!
//! String literals and template literals without substitutions are literal.
//! Any other argument (`require(name)`, `` import(`./${x}`) ``) is a
//! *variable import*: it cannot be enumerated statically and is only reported
//! as a signal for the loader's expansion policy.
//!
//! Extraction is pure: no filesystem access.

mod visitor;

use std::path::{Path, PathBuf};

use oxc_allocator::Allocator;
use oxc_ast_visit::Visit;
use oxc_parser::{ParseOptions, Parser};
use oxc_span::SourceType;
use thiserror::Error;

use crate::file::DependencyMap;
use visitor::DependencyVisitor;

/// Source text that failed to parse.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to parse {}: {message}", path.display())]
pub struct ParseFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Module grammar used for parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleSyntax {
    /// ECMAScript module (`import`/`export`, strict mode).
    Module,
    /// CommonJS script (top-level `return` allowed).
    Script,
}

impl ModuleSyntax {
    /// Pick a grammar from the extension, then from the text.
    ///
    /// `.mjs` is always a module and `.cjs` always a script. Anything else is a
    /// module when it mentions `import ` or `export `.
    pub fn detect(path: &Path, source: &str) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("mjs") => ModuleSyntax::Module,
            Some("cjs") => ModuleSyntax::Script,
            _ if source.contains("import ") || source.contains("export ") => ModuleSyntax::Module,
            _ => ModuleSyntax::Script,
        }
    }

    fn other(self) -> Self {
        match self {
            ModuleSyntax::Module => ModuleSyntax::Script,
            ModuleSyntax::Script => ModuleSyntax::Module,
        }
    }

    fn source_type(self) -> SourceType {
        match self {
            ModuleSyntax::Module => SourceType::mjs().with_jsx(true),
            ModuleSyntax::Script => SourceType::cjs().with_jsx(true),
        }
    }
}

/// Result of extracting one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Literal specifiers, all unresolved.
    pub dependencies: DependencyMap,
    /// At least one import expression has a non-literal target.
    pub has_variable_imports: bool,
}

/// Extract dependencies from `source` parsed with `syntax`.
///
/// `path` only labels the error.
pub fn extract(source: &str, path: &Path, syntax: ModuleSyntax) -> Result<Extraction, ParseFailure> {
    let allocator = Allocator::default();
    let options = ParseOptions {
        allow_return_outside_function: syntax == ModuleSyntax::Script,
        ..ParseOptions::default()
    };
    let ret = Parser::new(&allocator, source, syntax.source_type())
        .with_options(options)
        .parse();

    if ret.panicked || !ret.errors.is_empty() {
        let message = ret
            .errors
            .iter()
            .map(|err| err.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ParseFailure {
            path: path.to_path_buf(),
            message: if message.is_empty() {
                "parser aborted".to_string()
            } else {
                message
            },
        });
    }

    let mut visitor = DependencyVisitor::default();
    visitor.visit_program(&ret.program);

    Ok(Extraction {
        dependencies: visitor.dependencies,
        has_variable_imports: visitor.has_variable_imports,
    })
}

/// Extract with a detected grammar.
///
/// Without an `.mjs` or `.cjs` extension the guess can be wrong either way
/// (minified modules have no `import ` token), so a failed parse gets a
/// second chance in the other grammar. The first error is reported if both
/// fail.
pub fn extract_detected(source: &str, path: &Path) -> Result<Extraction, ParseFailure> {
    let syntax = ModuleSyntax::detect(path, source);
    let has_explicit_extension = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("mjs") | Some("cjs")
    );

    match extract(source, path, syntax) {
        Err(first) if !has_explicit_extension => {
            let fallback = syntax.other();
            tracing::trace!("{} failed as {:?}, retrying as {:?}", path.display(), syntax, fallback);
            extract(source, path, fallback).map_err(|_| first)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(extraction: &Extraction) -> Vec<&str> {
        extraction.dependencies.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_commonjs_requires() {
        let source = r#"
            const a = require('./a');
            const _ = require('lodash');
            const p = require.resolve('./data.json');
        "#;

        let extraction = extract(source, Path::new("index.js"), ModuleSyntax::Script).unwrap();
        assert_eq!(keys(&extraction), vec!["./a", "lodash", "./data.json"]);
        assert!(extraction.dependencies.values().all(Option::is_none));
        assert!(!extraction.has_variable_imports);
    }

    #[test]
    fn test_esm_imports_and_reexports() {
        let source = r#"
            import React from 'react';
            import './side-effect.js';
            export { helper } from './helper.js';
            export * from './all.js';
            const lazy = () => import('./lazy.js');
        "#;

        let extraction = extract(source, Path::new("index.mjs"), ModuleSyntax::Module).unwrap();
        assert_eq!(
            keys(&extraction),
            vec!["react", "./side-effect.js", "./helper.js", "./all.js", "./lazy.js"]
        );
        assert!(!extraction.has_variable_imports);
    }

    #[test]
    fn test_variable_imports_are_flagged_not_listed() {
        let source = r#"
            const name = process.env.PLUGIN;
            const plugin = require(name);
            const locale = require('./locales/' + lang);
            const mod = import(`./pages/${page}.js`);
        "#;

        let extraction = extract(source, Path::new("index.js"), ModuleSyntax::Script).unwrap();
        assert!(extraction.dependencies.is_empty());
        assert!(extraction.has_variable_imports);
    }

    #[test]
    fn test_static_template_literal_is_literal() {
        let source = "const a = require(`./static`);";
        let extraction = extract(source, Path::new("index.js"), ModuleSyntax::Script).unwrap();
        assert_eq!(keys(&extraction), vec!["./static"]);
        assert!(!extraction.has_variable_imports);
    }

    #[test]
    fn test_duplicate_specifiers_collapse() {
        let source = "require('./a'); require('./a'); require(`./a`);";
        let extraction = extract(source, Path::new("index.js"), ModuleSyntax::Script).unwrap();
        assert_eq!(extraction.dependencies.len(), 1);
    }

    #[test]
    fn test_nested_requires_are_found() {
        let source = r#"
            function load() {
                if (cond) {
                    return require('./deep');
                }
            }
        "#;
        let extraction = extract(source, Path::new("index.js"), ModuleSyntax::Script).unwrap();
        assert_eq!(keys(&extraction), vec!["./deep"]);
    }

    #[test]
    fn test_top_level_return_in_script() {
        let source = "if (done) return;\nrequire('./after');";
        let extraction = extract(source, Path::new("index.js"), ModuleSyntax::Script).unwrap();
        assert_eq!(keys(&extraction), vec!["./after"]);
    }

    #[test]
    fn test_parse_failure_names_the_file() {
        let err = extract("const = ;", Path::new("/src/broken.js"), ModuleSyntax::Script)
            .unwrap_err();
        assert_eq!(err.path, PathBuf::from("/src/broken.js"));
        assert!(!err.message.is_empty());
        assert!(err.to_string().contains("/src/broken.js"));
    }

    #[test]
    fn test_detect_syntax() {
        assert_eq!(
            ModuleSyntax::detect(Path::new("a.mjs"), "require('x')"),
            ModuleSyntax::Module
        );
        assert_eq!(
            ModuleSyntax::detect(Path::new("a.cjs"), "import x from 'y'"),
            ModuleSyntax::Script
        );
        assert_eq!(
            ModuleSyntax::detect(Path::new("a.js"), "export const x = 1;"),
            ModuleSyntax::Module
        );
        assert_eq!(
            ModuleSyntax::detect(Path::new("a.js"), "module.exports = 1;"),
            ModuleSyntax::Script
        );
    }

    #[test]
    fn test_detected_module_falls_back_to_script() {
        // Mentions "import " in a comment, but uses a top-level return.
        let source = "// we import nothing here\nif (x) return;\nrequire('./fallback');";
        let extraction = extract_detected(source, Path::new("index.js")).unwrap();
        assert_eq!(keys(&extraction), vec!["./fallback"]);
    }

    #[test]
    fn test_minified_module_falls_back_to_module() {
        let source = "import{a}from\"./a\";export{a};";
        assert_eq!(
            ModuleSyntax::detect(Path::new("m.js"), source),
            ModuleSyntax::Script
        );

        let extraction = extract_detected(source, Path::new("m.js")).unwrap();
        assert_eq!(keys(&extraction), vec!["./a"]);
    }

    #[test]
    fn test_explicit_cjs_is_not_retried() {
        let err = extract_detected("import{a}from\"./a\";", Path::new("m.cjs")).unwrap_err();
        assert_eq!(err.path, PathBuf::from("m.cjs"));
    }
}
