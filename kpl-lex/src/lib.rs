#![forbid(unsafe_code)]

mod lexer;
mod token;

pub use lexer::{LexError, LexErrorKind, Lexer, TokenSource, DEFAULT_MAX_IDENT_LEN};
pub use token::{span, span_between, Loc, Span, Token, TokenKind};
