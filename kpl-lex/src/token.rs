#![forbid(unsafe_code)]

use std::fmt;

use miette::SourceSpan;

pub type Span = SourceSpan;

pub fn span(start: usize, len: usize) -> Span {
    SourceSpan::new(start.into(), len)
}

pub fn span_between(start: usize, end: usize) -> Span {
    debug_assert!(end >= start);
    span(start, end - start)
}

/// Where a token (or a diagnostic) sits in the source: a byte span for
/// labels plus the 1-based line/column pair reported to users.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Loc {
    pub span: Span,
    pub line: u32,
    pub column: u32,
}

impl Loc {
    pub fn new(span: Span, line: u32, column: u32) -> Self {
        Self { span, line, column }
    }
}

impl Default for Loc {
    fn default() -> Self {
        Self {
            span: span(0, 0),
            line: 1,
            column: 1,
        }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.line, self.column)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    /// Numeric value of a `Number` token.
    pub value: Option<i32>,
    pub loc: Loc,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, loc: Loc) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            value: None,
            loc,
        }
    }

    pub fn number(lexeme: impl Into<String>, value: i32, loc: Loc) -> Self {
        Self {
            kind: TokenKind::Number,
            lexeme: lexeme.into(),
            value: Some(value),
            loc,
        }
    }

    /// The literal character of a `Char` token.
    pub fn char_value(&self) -> Option<char> {
        match self.kind {
            TokenKind::Char => self.lexeme.chars().next(),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,
    Number,
    Char,
    Eof,

    // Keywords
    KwProgram,
    KwConst,
    KwType,
    KwVar,
    KwInteger,
    KwChar,
    KwArray,
    KwOf,
    KwFunction,
    KwProcedure,
    KwBegin,
    KwEnd,
    KwCall,
    KwIf,
    KwThen,
    KwElse,
    KwWhile,
    KwDo,
    KwFor,
    KwTo,

    // Operators / punctuation
    Semicolon,
    Colon,
    Period,
    Comma,
    Assign,
    AssignPlus,
    AssignMinus,
    AssignTimes,
    AssignSlash,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Times,
    Slash,
    LParen,
    RParen,
    LSel,
    RSel,
}

impl TokenKind {
    /// Upper-case tag used by the token dump (`KW_BEGIN`, `SB_SEMICOLON`, ...).
    pub fn tag(self) -> &'static str {
        match self {
            TokenKind::Ident => "TK_IDENT",
            TokenKind::Number => "TK_NUMBER",
            TokenKind::Char => "TK_CHAR",
            TokenKind::Eof => "TK_EOF",
            TokenKind::KwProgram => "KW_PROGRAM",
            TokenKind::KwConst => "KW_CONST",
            TokenKind::KwType => "KW_TYPE",
            TokenKind::KwVar => "KW_VAR",
            TokenKind::KwInteger => "KW_INTEGER",
            TokenKind::KwChar => "KW_CHAR",
            TokenKind::KwArray => "KW_ARRAY",
            TokenKind::KwOf => "KW_OF",
            TokenKind::KwFunction => "KW_FUNCTION",
            TokenKind::KwProcedure => "KW_PROCEDURE",
            TokenKind::KwBegin => "KW_BEGIN",
            TokenKind::KwEnd => "KW_END",
            TokenKind::KwCall => "KW_CALL",
            TokenKind::KwIf => "KW_IF",
            TokenKind::KwThen => "KW_THEN",
            TokenKind::KwElse => "KW_ELSE",
            TokenKind::KwWhile => "KW_WHILE",
            TokenKind::KwDo => "KW_DO",
            TokenKind::KwFor => "KW_FOR",
            TokenKind::KwTo => "KW_TO",
            TokenKind::Semicolon => "SB_SEMICOLON",
            TokenKind::Colon => "SB_COLON",
            TokenKind::Period => "SB_PERIOD",
            TokenKind::Comma => "SB_COMMA",
            TokenKind::Assign => "SB_ASSIGN",
            TokenKind::AssignPlus => "SB_ASSIGN_PLUS",
            TokenKind::AssignMinus => "SB_ASSIGN_MINUS",
            TokenKind::AssignTimes => "SB_ASSIGN_TIMES",
            TokenKind::AssignSlash => "SB_ASSIGN_SLASH",
            TokenKind::Eq => "SB_EQ",
            TokenKind::Neq => "SB_NEQ",
            TokenKind::Lt => "SB_LT",
            TokenKind::Le => "SB_LE",
            TokenKind::Gt => "SB_GT",
            TokenKind::Ge => "SB_GE",
            TokenKind::Plus => "SB_PLUS",
            TokenKind::Minus => "SB_MINUS",
            TokenKind::Times => "SB_TIMES",
            TokenKind::Slash => "SB_SLASH",
            TokenKind::LParen => "SB_LPAR",
            TokenKind::RParen => "SB_RPAR",
            TokenKind::LSel => "SB_LSEL",
            TokenKind::RSel => "SB_RSEL",
        }
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::Neq
                | TokenKind::Lt
                | TokenKind::Le
                | TokenKind::Gt
                | TokenKind::Ge
        )
    }

    pub fn is_assign_op(self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::AssignPlus
                | TokenKind::AssignMinus
                | TokenKind::AssignTimes
                | TokenKind::AssignSlash
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Ident => "an identifier",
            TokenKind::Number => "a number",
            TokenKind::Char => "a character constant",
            TokenKind::Eof => "end of input",
            TokenKind::KwProgram => "'program'",
            TokenKind::KwConst => "'const'",
            TokenKind::KwType => "'type'",
            TokenKind::KwVar => "'var'",
            TokenKind::KwInteger => "'integer'",
            TokenKind::KwChar => "'char'",
            TokenKind::KwArray => "'array'",
            TokenKind::KwOf => "'of'",
            TokenKind::KwFunction => "'function'",
            TokenKind::KwProcedure => "'procedure'",
            TokenKind::KwBegin => "'begin'",
            TokenKind::KwEnd => "'end'",
            TokenKind::KwCall => "'call'",
            TokenKind::KwIf => "'if'",
            TokenKind::KwThen => "'then'",
            TokenKind::KwElse => "'else'",
            TokenKind::KwWhile => "'while'",
            TokenKind::KwDo => "'do'",
            TokenKind::KwFor => "'for'",
            TokenKind::KwTo => "'to'",
            TokenKind::Semicolon => "';'",
            TokenKind::Colon => "':'",
            TokenKind::Period => "'.'",
            TokenKind::Comma => "','",
            TokenKind::Assign => "':='",
            TokenKind::AssignPlus => "'+='",
            TokenKind::AssignMinus => "'-='",
            TokenKind::AssignTimes => "'*='",
            TokenKind::AssignSlash => "'/='",
            TokenKind::Eq => "'='",
            TokenKind::Neq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Times => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LSel => "'['",
            TokenKind::RSel => "']'",
        };
        f.write_str(s)
    }
}
