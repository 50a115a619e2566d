//! Import extraction from Python source
//!
//! Walks the syntax tree of a script and records the top-level module name
//! of every import statement. The source is parsed, never executed, so
//! imports inside functions, conditionals, and try/except blocks all count.
//! Relative from-imports are recorded but flagged; they are never subject to
//! classification.

use rustpython_parser::{Parse, ast};

use crate::error::Error;

/// A single top-level import found in a script.
///
/// One record per distinct root, in order of first appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    /// Top-level module name before any dot. `None` for bare relative
    /// imports (`from . import x`).
    pub root: Option<String>,
    /// Relative from-imports (`from .utils import x`) resolve against the
    /// script's own package and are excluded from classification.
    pub is_relative: bool,
    /// 1-based source line of the statement, for diagnostics.
    pub line: usize,
}

/// Return the top-level package name from a dotted module path.
fn module_root(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// 1-based line number of a byte offset into `source`.
fn line_at(source: &str, offset: u32) -> usize {
    let end = (offset as usize).min(source.len());
    source.as_bytes()[..end]
        .iter()
        .filter(|&&byte| byte == b'\n')
        .count()
        + 1
}

/// Extract every import statement from `source`.
///
/// Fails with [`Error::Syntax`] when the source does not parse; the caller
/// skips the file without modifying it.
pub fn extract_imports(source: &str) -> Result<Vec<ImportRecord>, Error> {
    let suite = ast::Suite::parse(source, "<script>").map_err(|err| {
        let line = line_at(source, u32::from(err.offset));
        Error::Syntax(format!("line {line}: {}", err.error))
    })?;

    let mut collector = Collector {
        source,
        records: Vec::new(),
    };
    collector.walk_body(&suite);
    Ok(collector.records)
}

struct Collector<'a> {
    source: &'a str,
    records: Vec<ImportRecord>,
}

impl Collector<'_> {
    fn push(&mut self, root: Option<&str>, is_relative: bool, offset: u32) {
        let root = root.map(str::to_string);
        let duplicate = self
            .records
            .iter()
            .any(|record| record.root == root && record.is_relative == is_relative);
        if duplicate {
            return;
        }
        self.records.push(ImportRecord {
            root,
            is_relative,
            line: line_at(self.source, offset),
        });
    }

    fn walk_body(&mut self, body: &[ast::Stmt]) {
        for stmt in body {
            self.walk_stmt(stmt);
        }
    }

    fn walk_stmt(&mut self, stmt: &ast::Stmt) {
        match stmt {
            ast::Stmt::Import(node) => {
                let offset = u32::from(node.range.start());
                for alias in &node.names {
                    self.push(Some(module_root(alias.name.as_str())), false, offset);
                }
            }
            ast::Stmt::ImportFrom(node) => {
                let offset = u32::from(node.range.start());
                let level = node.level.as_ref().map_or(0, |level| level.to_u32());
                match node.module.as_ref() {
                    Some(module) if level == 0 => {
                        self.push(Some(module_root(module.as_str())), false, offset);
                    }
                    // Leading dots, or no module at all: relative either way.
                    Some(module) => self.push(Some(module_root(module.as_str())), true, offset),
                    None => self.push(None, true, offset),
                }
            }
            ast::Stmt::FunctionDef(node) => self.walk_body(&node.body),
            ast::Stmt::AsyncFunctionDef(node) => self.walk_body(&node.body),
            ast::Stmt::ClassDef(node) => self.walk_body(&node.body),
            ast::Stmt::For(node) => {
                self.walk_body(&node.body);
                self.walk_body(&node.orelse);
            }
            ast::Stmt::AsyncFor(node) => {
                self.walk_body(&node.body);
                self.walk_body(&node.orelse);
            }
            ast::Stmt::While(node) => {
                self.walk_body(&node.body);
                self.walk_body(&node.orelse);
            }
            ast::Stmt::If(node) => {
                self.walk_body(&node.body);
                self.walk_body(&node.orelse);
            }
            ast::Stmt::With(node) => self.walk_body(&node.body),
            ast::Stmt::AsyncWith(node) => self.walk_body(&node.body),
            ast::Stmt::Match(node) => {
                for case in &node.cases {
                    self.walk_body(&case.body);
                }
            }
            ast::Stmt::Try(node) => {
                self.walk_body(&node.body);
                for handler in &node.handlers {
                    let ast::ExceptHandler::ExceptHandler(handler) = handler;
                    self.walk_body(&handler.body);
                }
                self.walk_body(&node.orelse);
                self.walk_body(&node.finalbody);
            }
            ast::Stmt::TryStar(node) => {
                self.walk_body(&node.body);
                for handler in &node.handlers {
                    let ast::ExceptHandler::ExceptHandler(handler) = handler;
                    self.walk_body(&handler.body);
                }
                self.walk_body(&node.orelse);
                self.walk_body(&node.finalbody);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots(records: &[ImportRecord]) -> Vec<&str> {
        records
            .iter()
            .filter(|record| !record.is_relative)
            .filter_map(|record| record.root.as_deref())
            .collect()
    }

    #[test]
    fn test_direct_imports() {
        let records = extract_imports("import os\nimport httpx\n").unwrap();
        assert_eq!(roots(&records), vec!["os", "httpx"]);
    }

    #[test]
    fn test_dotted_import_keeps_root_only() {
        let records = extract_imports("import os.path\nimport xml.etree.ElementTree\n").unwrap();
        assert_eq!(roots(&records), vec!["os", "xml"]);
    }

    #[test]
    fn test_multi_name_import() {
        let records = extract_imports("import os, sys, json\n").unwrap();
        assert_eq!(roots(&records), vec!["os", "sys", "json"]);
    }

    #[test]
    fn test_from_import() {
        let records =
            extract_imports("from pathlib import Path\nfrom rich.console import Console\n")
                .unwrap();
        assert_eq!(roots(&records), vec!["pathlib", "rich"]);
    }

    #[test]
    fn test_relative_imports_are_flagged() {
        let records = extract_imports(
            "from . import helpers\nfrom .utils import thing\nfrom ..pkg import x\n",
        )
        .unwrap();
        assert!(records.iter().all(|record| record.is_relative));
        assert!(roots(&records).is_empty());
        // The named ones still carry a root for diagnostics.
        assert!(
            records
                .iter()
                .any(|record| record.root.as_deref() == Some("utils"))
        );
        assert!(records.iter().any(|record| record.root.is_none()));
    }

    #[test]
    fn test_duplicates_collapse_to_first_appearance() {
        let records =
            extract_imports("import httpx\nimport os\nfrom httpx import get\nimport os.path\n")
                .unwrap();
        assert_eq!(roots(&records), vec!["httpx", "os"]);
    }

    #[test]
    fn test_nested_imports_are_counted() {
        let source = r#"
def fetch():
    import requests
    return requests

class Loader:
    def load(self):
        from yaml import safe_load
        return safe_load

if True:
    import tomllib

try:
    import ujson
except ImportError:
    import json

with open("x") as f:
    import csv

while False:
    import queue
"#;
        let records = extract_imports(source).unwrap();
        let found = roots(&records);
        for expected in ["requests", "yaml", "tomllib", "ujson", "json", "csv", "queue"] {
            assert!(found.contains(&expected), "missing {expected}: {found:?}");
        }
    }

    #[test]
    fn test_line_numbers() {
        let records = extract_imports("import os\n\nimport sys\n").unwrap();
        assert_eq!(records[0].line, 1);
        assert_eq!(records[1].line, 3);
    }

    #[test]
    fn test_syntax_error() {
        let err = extract_imports("def broken(:\n    pass\n").unwrap_err();
        match err {
            Error::Syntax(message) => {
                assert!(
                    message.starts_with("line "),
                    "should locate the error: {message}"
                )
            }
            other => panic!("expected a syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_no_imports() {
        let records = extract_imports("print('hello')\n").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_empty_source() {
        let records = extract_imports("").unwrap();
        assert!(records.is_empty());
    }
}
