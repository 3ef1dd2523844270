#![allow(dead_code)]

use kpl_core::{SemanticErrorKind, Type};
use kpl_parse::{compile, CompileError, CompiledProgram, SyntaxErrorKind};

pub fn ok(src: &str) -> CompiledProgram {
    match compile(src) {
        Ok(program) => program,
        Err(err) => panic!("expected success, got {err}\n--- source ---\n{src}"),
    }
}

pub fn semantic(src: &str) -> SemanticErrorKind {
    match compile(src) {
        Err(CompileError::Semantic(e)) => e.kind,
        other => panic!("expected a semantic error, got {other:?}\n--- source ---\n{src}"),
    }
}

pub fn semantic_named(src: &str) -> (SemanticErrorKind, String) {
    match compile(src) {
        Err(CompileError::Semantic(e)) => (e.kind, e.name.unwrap_or_default()),
        other => panic!("expected a semantic error, got {other:?}\n--- source ---\n{src}"),
    }
}

pub fn syntax(src: &str) -> SyntaxErrorKind {
    match compile(src) {
        Err(CompileError::Syntax(e)) => e.kind,
        other => panic!("expected a syntax error, got {other:?}\n--- source ---\n{src}"),
    }
}

pub fn mismatch(expected: Type, found: Type) -> SemanticErrorKind {
    SemanticErrorKind::TypeInconsistency { expected, found }
}

/// Wraps `body` in a program declaring `i, j: integer`, `c: char` and
/// `a: array[4] of integer`.
pub fn with_vars(body: &str) -> String {
    format!(
        "program T;\nvar i: integer; j: integer; c: char; a: array[4] of integer;\nbegin\n{body}\nend."
    )
}
