#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use kpl_lex::{Loc, Span};
use miette::Diagnostic;
use thiserror::Error;

use crate::types::Type;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SemanticErrorKind {
    #[error("undeclared identifier")]
    UndeclaredIdent,
    #[error("undeclared constant")]
    UndeclaredConstant,
    #[error("undeclared type")]
    UndeclaredType,
    #[error("undeclared variable")]
    UndeclaredVariable,
    #[error("undeclared procedure")]
    UndeclaredProcedure,
    #[error("duplicate identifier")]
    DuplicateIdent,
    #[error("invalid constant")]
    InvalidConstant,
    #[error("an integer constant is required")]
    InvalidIntConstant,
    #[error("invalid type")]
    InvalidType,
    #[error("invalid variable")]
    InvalidVariable,
    #[error("invalid procedure")]
    InvalidProcedure,
    #[error("invalid lvalue")]
    InvalidLValue,
    #[error("identifier is not a value")]
    InvalidFactor,
    #[error("a basic type (integer or char) is required")]
    InvalidBasicType,
    #[error("a comparison operator is required")]
    InvalidComparator,
    #[error("array size must be positive")]
    InvalidArraySize,
    #[error("indexed value is not an array")]
    NotAnArray,
    #[error("type inconsistency: expected {expected}, found {found}")]
    TypeInconsistency { expected: Type, found: Type },
    #[error("inconsistent count: expected {expected}, found {found}")]
    ArityMismatch { expected: usize, found: usize },
}

#[derive(Debug, Error, Diagnostic)]
#[error("semantic error at {line}-{column}: {message}")]
#[diagnostic(code(kpl::sema))]
#[allow(unused_assignments)]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    /// Offending identifier, when there is one.
    pub name: Option<String>,
    pub message: String,
    #[label("{kind}")]
    pub span: Span,
    pub line: u32,
    pub column: u32,
}

impl SemanticError {
    pub fn new(kind: SemanticErrorKind, loc: Loc) -> Self {
        Self {
            message: kind.to_string(),
            kind,
            name: None,
            span: loc.span,
            line: loc.line,
            column: loc.column,
        }
    }

    pub fn named(kind: SemanticErrorKind, name: &str, loc: Loc) -> Self {
        Self {
            message: format!("{kind} '{name}'"),
            kind,
            name: Some(name.to_string()),
            span: loc.span,
            line: loc.line,
            column: loc.column,
        }
    }

    pub fn loc(&self) -> Loc {
        Loc::new(self.span, self.line, self.column)
    }
}
