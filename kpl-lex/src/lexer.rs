#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use logos::Logos;
use miette::Diagnostic;
use thiserror::Error;

use crate::token::{span_between, Loc, Span, Token, TokenKind};

/// Identifiers longer than this are rejected unless configured otherwise.
pub const DEFAULT_MAX_IDENT_LEN: usize = 15;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("invalid symbol")]
    InvalidSymbol,
    #[error("identifier longer than {max} characters")]
    IdentTooLong { max: usize },
    #[error("invalid character constant")]
    InvalidCharConstant,
    #[error("end of comment expected")]
    EndOfComment,
    #[error("number out of range")]
    NumberTooLarge,
}

#[derive(Debug, Error, Diagnostic)]
#[error("lex error at {line}-{column}: {kind}")]
#[diagnostic(code(kpl::lex))]
#[allow(unused_assignments)]
pub struct LexError {
    pub kind: LexErrorKind,
    #[label("{kind}")]
    pub span: Span,
    pub line: u32,
    pub column: u32,
}

impl LexError {
    pub fn new(kind: LexErrorKind, loc: Loc) -> Self {
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

/// Pull interface the parser consumes: one token per call, `Eof` forever
/// once the input is exhausted.
pub trait TokenSource {
    fn next_token(&mut self) -> Result<Token, LexError>;
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
    #[token("program", ignore(ascii_case))]
    KwProgram,
    #[token("const", ignore(ascii_case))]
    KwConst,
    #[token("type", ignore(ascii_case))]
    KwType,
    #[token("var", ignore(ascii_case))]
    KwVar,
    #[token("integer", ignore(ascii_case))]
    KwInteger,
    #[token("char", ignore(ascii_case))]
    KwChar,
    #[token("array", ignore(ascii_case))]
    KwArray,
    #[token("of", ignore(ascii_case))]
    KwOf,
    #[token("function", ignore(ascii_case))]
    KwFunction,
    #[token("procedure", ignore(ascii_case))]
    KwProcedure,
    #[token("begin", ignore(ascii_case))]
    KwBegin,
    #[token("end", ignore(ascii_case))]
    KwEnd,
    #[token("call", ignore(ascii_case))]
    KwCall,
    #[token("if", ignore(ascii_case))]
    KwIf,
    #[token("then", ignore(ascii_case))]
    KwThen,
    #[token("else", ignore(ascii_case))]
    KwElse,
    #[token("while", ignore(ascii_case))]
    KwWhile,
    #[token("do", ignore(ascii_case))]
    KwDo,
    #[token("for", ignore(ascii_case))]
    KwFor,
    #[token("to", ignore(ascii_case))]
    KwTo,

    #[token("(*", block_comment)]
    BlockComment,
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[token(":=")]
    Assign,
    #[token("+=")]
    AssignPlus,
    #[token("-=")]
    AssignMinus,
    #[token("*=")]
    AssignTimes,
    #[token("/=")]
    AssignSlash,

    #[token("!=")]
    Neq,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Eq,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Times,
    #[token("/")]
    Slash,

    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Period,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    #[token("(.")]
    LSel,
    #[token("]")]
    #[token(".)")]
    RSel,

    #[regex(r"[0-9]+")]
    Number,

    #[regex(r"'[^'\n]'")]
    Char,

    #[regex(r"[a-zA-Z][a-zA-Z0-9_]*")]
    Ident,
}

/// Consumes the body of a `(* ... *)` comment. An unterminated comment eats
/// the rest of the input and is reported as an error.
fn block_comment(lex: &mut logos::Lexer<RawToken>) -> bool {
    match lex.remainder().find("*)") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            let rest = lex.remainder().len();
            lex.bump(rest);
            false
        }
    }
}

/// Byte offset -> (line, column) translation.
#[derive(Clone, Debug)]
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(src: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(src.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn position(&self, src: &str, offset: usize) -> (u32, u32) {
        let line = self.starts.partition_point(|&s| s <= offset).max(1);
        let start = self.starts[line - 1];
        let column = src
            .get(start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - start)
            + 1;
        (line as u32, column as u32)
    }
}

pub struct Lexer<'a> {
    src: &'a str,
    raw: logos::Lexer<'a, RawToken>,
    lines: LineIndex,
    max_ident_len: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self::with_max_ident_len(src, DEFAULT_MAX_IDENT_LEN)
    }

    pub fn with_max_ident_len(src: &'a str, max_ident_len: usize) -> Self {
        Self {
            src,
            raw: RawToken::lexer(src),
            lines: LineIndex::new(src),
            max_ident_len,
        }
    }

    /// Lex the whole input, `Eof` token included.
    pub fn lex(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn loc(&self, start: usize, end: usize) -> Loc {
        let (line, column) = self.lines.position(self.src, start);
        Loc::new(span_between(start, end), line, column)
    }

    fn classify_error(&self, slice: &str, loc: Loc) -> LexError {
        let kind = if slice.starts_with("(*") {
            LexErrorKind::EndOfComment
        } else if slice.starts_with('\'') {
            LexErrorKind::InvalidCharConstant
        } else {
            LexErrorKind::InvalidSymbol
        };
        LexError::new(kind, loc)
    }

    fn scan(&mut self) -> Result<Token, LexError> {
        loop {
            let Some(raw) = self.raw.next() else {
                let end = self.src.len();
                return Ok(Token::new(TokenKind::Eof, "", self.loc(end, end)));
            };
            let range = self.raw.span();
            let slice = self.raw.slice();
            let loc = self.loc(range.start, range.end);

            let kind = match raw {
                Ok(RawToken::BlockComment) | Ok(RawToken::LineComment) => continue,

                Ok(RawToken::KwProgram) => TokenKind::KwProgram,
                Ok(RawToken::KwConst) => TokenKind::KwConst,
                Ok(RawToken::KwType) => TokenKind::KwType,
                Ok(RawToken::KwVar) => TokenKind::KwVar,
                Ok(RawToken::KwInteger) => TokenKind::KwInteger,
                Ok(RawToken::KwChar) => TokenKind::KwChar,
                Ok(RawToken::KwArray) => TokenKind::KwArray,
                Ok(RawToken::KwOf) => TokenKind::KwOf,
                Ok(RawToken::KwFunction) => TokenKind::KwFunction,
                Ok(RawToken::KwProcedure) => TokenKind::KwProcedure,
                Ok(RawToken::KwBegin) => TokenKind::KwBegin,
                Ok(RawToken::KwEnd) => TokenKind::KwEnd,
                Ok(RawToken::KwCall) => TokenKind::KwCall,
                Ok(RawToken::KwIf) => TokenKind::KwIf,
                Ok(RawToken::KwThen) => TokenKind::KwThen,
                Ok(RawToken::KwElse) => TokenKind::KwElse,
                Ok(RawToken::KwWhile) => TokenKind::KwWhile,
                Ok(RawToken::KwDo) => TokenKind::KwDo,
                Ok(RawToken::KwFor) => TokenKind::KwFor,
                Ok(RawToken::KwTo) => TokenKind::KwTo,

                Ok(RawToken::Assign) => TokenKind::Assign,
                Ok(RawToken::AssignPlus) => TokenKind::AssignPlus,
                Ok(RawToken::AssignMinus) => TokenKind::AssignMinus,
                Ok(RawToken::AssignTimes) => TokenKind::AssignTimes,
                Ok(RawToken::AssignSlash) => TokenKind::AssignSlash,

                Ok(RawToken::Neq) => TokenKind::Neq,
                Ok(RawToken::Le) => TokenKind::Le,
                Ok(RawToken::Ge) => TokenKind::Ge,
                Ok(RawToken::Lt) => TokenKind::Lt,
                Ok(RawToken::Gt) => TokenKind::Gt,
                Ok(RawToken::Eq) => TokenKind::Eq,

                Ok(RawToken::Plus) => TokenKind::Plus,
                Ok(RawToken::Minus) => TokenKind::Minus,
                Ok(RawToken::Times) => TokenKind::Times,
                Ok(RawToken::Slash) => TokenKind::Slash,

                Ok(RawToken::Semicolon) => TokenKind::Semicolon,
                Ok(RawToken::Colon) => TokenKind::Colon,
                Ok(RawToken::Comma) => TokenKind::Comma,
                Ok(RawToken::Period) => TokenKind::Period,

                Ok(RawToken::LParen) => TokenKind::LParen,
                Ok(RawToken::RParen) => TokenKind::RParen,
                Ok(RawToken::LSel) => TokenKind::LSel,
                Ok(RawToken::RSel) => TokenKind::RSel,

                Ok(RawToken::Ident) => {
                    if slice.chars().count() > self.max_ident_len {
                        return Err(LexError::new(
                            LexErrorKind::IdentTooLong {
                                max: self.max_ident_len,
                            },
                            loc,
                        ));
                    }
                    TokenKind::Ident
                }
                Ok(RawToken::Number) => {
                    let value = slice
                        .parse::<i32>()
                        .map_err(|_| LexError::new(LexErrorKind::NumberTooLarge, loc))?;
                    return Ok(Token::number(slice, value, loc));
                }
                Ok(RawToken::Char) => {
                    let inner = &slice[1..slice.len() - 1];
                    return Ok(Token::new(TokenKind::Char, inner, loc));
                }

                Err(()) => return Err(self.classify_error(slice, loc)),
            };
            return Ok(Token::new(kind, slice, loc));
        }
    }
}

impl TokenSource for Lexer<'_> {
    fn next_token(&mut self) -> Result<Token, LexError> {
        let tok = self.scan()?;
        tracing::trace!(
            kind = tok.kind.tag(),
            lexeme = %tok.lexeme,
            line = tok.loc.line,
            column = tok.loc.column,
            "token"
        );
        Ok(tok)
    }
}
