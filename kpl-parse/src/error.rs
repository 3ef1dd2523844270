#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use kpl_core::{SemanticError, SemanticErrorKind, SymbolTableError};
use kpl_lex::{LexError, Loc, Span, TokenKind};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("expected {expected}, found {found}")]
    MissingToken { expected: TokenKind, found: TokenKind },
    #[error("invalid statement")]
    InvalidStatement,
    #[error("invalid factor")]
    InvalidFactor,
    #[error("invalid type")]
    InvalidType,
    #[error("invalid parameter")]
    InvalidParameter,
    #[error("invalid arguments")]
    InvalidArguments,
    #[error("invalid expression")]
    InvalidExpression,
    #[error("invalid term")]
    InvalidTerm,
    #[error("nesting deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
}

#[derive(Debug, Error, Diagnostic)]
#[error("syntax error at {line}-{column}: {kind}")]
#[diagnostic(code(kpl::syntax))]
#[allow(unused_assignments)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    #[label("{kind}")]
    pub span: Span,
    pub line: u32,
    pub column: u32,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, loc: Loc) -> Self {
        Self {
            kind,
            span: loc.span,
            line: loc.line,
            column: loc.column,
        }
    }

    pub fn loc(&self) -> Loc {
        Loc::new(self.span, self.line, self.column)
    }
}

/// First error of a compilation. Nothing is recovered after it.
#[derive(Debug, Error, Diagnostic)]
pub enum CompileError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Semantic(#[from] SemanticError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Internal(#[from] SymbolTableError),
}

impl CompileError {
    pub fn loc(&self) -> Option<Loc> {
        match self {
            CompileError::Lex(e) => Some(e.loc()),
            CompileError::Syntax(e) => Some(e.loc()),
            CompileError::Semantic(e) => Some(e.loc()),
            CompileError::Internal(_) => None,
        }
    }

    pub fn syntax_kind(&self) -> Option<&SyntaxErrorKind> {
        match self {
            CompileError::Syntax(e) => Some(&e.kind),
            _ => None,
        }
    }

    pub fn semantic_kind(&self) -> Option<&SemanticErrorKind> {
        match self {
            CompileError::Semantic(e) => Some(&e.kind),
            _ => None,
        }
    }
}
