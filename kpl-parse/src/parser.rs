#![forbid(unsafe_code)]

use std::mem;

use kpl_core::{
    ConstantValue, Object, ObjectId, ObjectKind, PassMode, SemanticError,
    SemanticErrorKind, SymbolTable, SymbolTableError, Type,
};
use kpl_lex::{Token, TokenKind, TokenSource};

use crate::error::{CompileError, SyntaxError, SyntaxErrorKind};
use crate::CompileConfig;

/// Single-pass recursive descent over a token stream with one token of
/// lookahead. Declarations go straight into the symbol table and every
/// construct is type-checked as soon as it is recognized.
pub struct Parser<'t, S: TokenSource> {
    source: S,
    look_ahead: Token,
    pub(crate) symtab: &'t mut SymbolTable,
    config: CompileConfig,
    depth: usize,
}

impl<'t, S: TokenSource> Parser<'t, S> {
    pub fn new(
        mut source: S,
        symtab: &'t mut SymbolTable,
        config: &CompileConfig,
    ) -> Result<Self, CompileError> {
        let look_ahead = source.next_token()?;
        Ok(Self {
            source,
            look_ahead,
            symtab,
            config: config.clone(),
            depth: 0,
        })
    }

    // ---- token cursor ----

    /// Consumes the lookahead token and hands it to the caller.
    pub(crate) fn scan(&mut self) -> Result<Token, CompileError> {
        let next = self.source.next_token()?;
        Ok(mem::replace(&mut self.look_ahead, next))
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Result<Token, CompileError> {
        if self.at(kind) {
            self.scan()
        } else {
            Err(self.missing(kind))
        }
    }

    pub(crate) fn missing(&self, expected: TokenKind) -> CompileError {
        self.syntax_error(SyntaxErrorKind::MissingToken {
            expected,
            found: self.look_ahead.kind,
        })
    }

    pub(crate) fn syntax_error(&self, kind: SyntaxErrorKind) -> CompileError {
        SyntaxError::new(kind, self.look_ahead.loc).into()
    }

    pub(crate) fn semantic_error(&self, kind: SemanticErrorKind) -> CompileError {
        SemanticError::new(kind, self.look_ahead.loc).into()
    }

    pub(crate) fn peek(&self) -> TokenKind {
        self.look_ahead.kind
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.look_ahead.kind == kind
    }

    pub(crate) fn look_ahead(&self) -> &Token {
        &self.look_ahead
    }

    /// Runs `f` one nesting level deeper, failing once the configured bound
    /// is exceeded.
    pub(crate) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, CompileError>,
    ) -> Result<T, CompileError> {
        if self.depth >= self.config.max_depth {
            return Err(self.syntax_error(SyntaxErrorKind::NestingTooDeep {
                limit: self.config.max_depth,
            }));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // ---- program and blocks ----

    pub fn compile_program(&mut self) -> Result<ObjectId, CompileError> {
        self.eat(TokenKind::KwProgram)?;
        let name = self.eat(TokenKind::Ident)?;
        let program = self.symtab.create_program(&name.lexeme, name.loc);
        self.enter_owned_scope(program)?;
        self.eat(TokenKind::Semicolon)?;
        self.compile_block()?;
        self.eat(TokenKind::Period)?;
        self.symtab.exit_scope()?;
        self.eat(TokenKind::Eof)?;
        Ok(program)
    }

    fn enter_owned_scope(&mut self, owner: ObjectId) -> Result<(), CompileError> {
        let scope = self
            .symtab
            .object(owner)
            .owned_scope()
            .ok_or(SymbolTableError::NoEnclosingRoutine)?;
        self.symtab.enter_scope(scope);
        Ok(())
    }

    /// Declaration sections in any order, then the `begin ... end` body.
    fn compile_block(&mut self) -> Result<(), CompileError> {
        loop {
            match self.peek() {
                TokenKind::KwConst => self.compile_const_decls()?,
                TokenKind::KwType => self.compile_type_decls()?,
                TokenKind::KwVar => self.compile_var_decls()?,
                TokenKind::KwFunction => self.compile_func_decl()?,
                TokenKind::KwProcedure => self.compile_proc_decl()?,
                _ => break,
            }
        }
        self.eat(TokenKind::KwBegin)?;
        self.compile_statements()?;
        self.eat(TokenKind::KwEnd)?;
        Ok(())
    }

    fn compile_const_decls(&mut self) -> Result<(), CompileError> {
        self.eat(TokenKind::KwConst)?;
        loop {
            let name = self.eat(TokenKind::Ident)?;
            self.symtab.check_fresh_ident(&name.lexeme, name.loc)?;
            self.eat(TokenKind::Eq)?;
            let value = self.compile_constant()?;
            self.symtab
                .declare(Object::constant(&name.lexeme, value, name.loc))?;
            self.eat(TokenKind::Semicolon)?;
            if !self.at(TokenKind::Ident) {
                return Ok(());
            }
        }
    }

    fn compile_type_decls(&mut self) -> Result<(), CompileError> {
        self.eat(TokenKind::KwType)?;
        loop {
            let name = self.eat(TokenKind::Ident)?;
            self.symtab.check_fresh_ident(&name.lexeme, name.loc)?;
            self.eat(TokenKind::Eq)?;
            let actual = self.compile_type()?;
            self.symtab
                .declare(Object::type_alias(&name.lexeme, actual, name.loc))?;
            self.eat(TokenKind::Semicolon)?;
            if !self.at(TokenKind::Ident) {
                return Ok(());
            }
        }
    }

    fn compile_var_decls(&mut self) -> Result<(), CompileError> {
        self.eat(TokenKind::KwVar)?;
        loop {
            let name = self.eat(TokenKind::Ident)?;
            self.symtab.check_fresh_ident(&name.lexeme, name.loc)?;
            self.eat(TokenKind::Colon)?;
            let ty = self.compile_type()?;
            self.symtab
                .declare(Object::variable(&name.lexeme, ty, name.loc))?;
            self.eat(TokenKind::Semicolon)?;
            if !self.at(TokenKind::Ident) {
                return Ok(());
            }
        }
    }

    fn compile_func_decl(&mut self) -> Result<(), CompileError> {
        self.eat(TokenKind::KwFunction)?;
        let name = self.eat(TokenKind::Ident)?;
        self.symtab.check_fresh_ident(&name.lexeme, name.loc)?;
        let func = self.symtab.create_function_object(&name.lexeme, name.loc);
        let id = self.symtab.declare(func)?;
        self.enter_owned_scope(id)?;

        self.compile_params()?;
        self.eat(TokenKind::Colon)?;
        let return_type = self.compile_basic_type()?;
        self.symtab.set_return_type(id, return_type);
        self.eat(TokenKind::Semicolon)?;
        self.compile_block()?;
        self.eat(TokenKind::Semicolon)?;

        self.symtab.exit_scope()?;
        Ok(())
    }

    fn compile_proc_decl(&mut self) -> Result<(), CompileError> {
        self.eat(TokenKind::KwProcedure)?;
        let name = self.eat(TokenKind::Ident)?;
        self.symtab.check_fresh_ident(&name.lexeme, name.loc)?;
        let proc = self.symtab.create_procedure_object(&name.lexeme, name.loc);
        let id = self.symtab.declare(proc)?;
        self.enter_owned_scope(id)?;

        self.compile_params()?;
        self.eat(TokenKind::Semicolon)?;
        self.compile_block()?;
        self.eat(TokenKind::Semicolon)?;

        self.symtab.exit_scope()?;
        Ok(())
    }

    /// Optional `( param { ; param } )`; `()` declares no parameters.
    fn compile_params(&mut self) -> Result<(), CompileError> {
        if !self.at(TokenKind::LParen) {
            return Ok(());
        }
        self.eat(TokenKind::LParen)?;
        if !self.at(TokenKind::RParen) {
            self.compile_param()?;
            while self.at(TokenKind::Semicolon) {
                self.scan()?;
                self.compile_param()?;
            }
        }
        self.eat(TokenKind::RParen)?;
        Ok(())
    }

    fn compile_param(&mut self) -> Result<(), CompileError> {
        let mode = match self.peek() {
            TokenKind::Ident => PassMode::Value,
            TokenKind::KwVar => {
                self.scan()?;
                PassMode::Reference
            }
            _ => return Err(self.syntax_error(SyntaxErrorKind::InvalidParameter)),
        };
        let name = self.eat(TokenKind::Ident)?;
        self.symtab.check_fresh_ident(&name.lexeme, name.loc)?;
        self.eat(TokenKind::Colon)?;
        let ty = self.compile_basic_type()?;
        let param = self
            .symtab
            .create_parameter_object(&name.lexeme, mode, ty, name.loc)?;
        self.symtab.declare(param)?;
        Ok(())
    }

    // ---- constants ----

    /// A constant folded at compile time: an optionally signed integer
    /// constant, or a character literal.
    fn compile_constant(&mut self) -> Result<ConstantValue, CompileError> {
        match self.peek() {
            TokenKind::Plus => {
                self.scan()?;
                self.compile_unsigned_constant()
            }
            TokenKind::Minus => {
                let sign = self.scan()?;
                let value = self.compile_unsigned_constant()?;
                value.negate().ok_or_else(|| {
                    SemanticError::new(SemanticErrorKind::InvalidConstant, sign.loc).into()
                })
            }
            TokenKind::Char => {
                let tok = self.scan()?;
                tok.char_value()
                    .map(ConstantValue::Char)
                    .ok_or_else(|| malformed_constant(&tok))
            }
            _ => self.compile_unsigned_constant(),
        }
    }

    /// A number literal or the name of an integer constant declared earlier.
    fn compile_unsigned_constant(&mut self) -> Result<ConstantValue, CompileError> {
        match self.peek() {
            TokenKind::Number => {
                let tok = self.scan()?;
                tok.value
                    .map(ConstantValue::Int)
                    .ok_or_else(|| malformed_constant(&tok))
            }
            TokenKind::Ident => {
                let tok = self.scan()?;
                let id = self.symtab.check_declared_constant(&tok.lexeme, tok.loc)?;
                match &self.symtab.object(id).kind {
                    ObjectKind::Constant {
                        value: value @ ConstantValue::Int(_),
                    } => Ok(value.duplicate()),
                    _ => Err(SemanticError::named(
                        SemanticErrorKind::InvalidIntConstant,
                        &tok.lexeme,
                        tok.loc,
                    )
                    .into()),
                }
            }
            _ => Err(self.semantic_error(SemanticErrorKind::InvalidConstant)),
        }
    }

    // ---- types ----

    pub(crate) fn compile_type(&mut self) -> Result<Type, CompileError> {
        match self.peek() {
            TokenKind::KwInteger => {
                self.scan()?;
                Ok(Type::int())
            }
            TokenKind::KwChar => {
                self.scan()?;
                Ok(Type::char())
            }
            TokenKind::KwArray => {
                self.scan()?;
                self.eat(TokenKind::LSel)?;
                let size = self.eat(TokenKind::Number)?;
                self.eat(TokenKind::RSel)?;
                self.eat(TokenKind::KwOf)?;
                let element = self.compile_type()?;
                match size.value.and_then(|n| u32::try_from(n).ok()) {
                    Some(n) if n > 0 => Ok(Type::array(n, element)),
                    _ => Err(SemanticError::named(
                        SemanticErrorKind::InvalidArraySize,
                        &size.lexeme,
                        size.loc,
                    )
                    .into()),
                }
            }
            TokenKind::Ident => {
                let tok = self.scan()?;
                let id = self.symtab.check_declared_type(&tok.lexeme, tok.loc)?;
                match &self.symtab.object(id).kind {
                    ObjectKind::TypeAlias { actual } => Ok(actual.duplicate()),
                    _ => Err(SemanticError::named(
                        SemanticErrorKind::InvalidType,
                        &tok.lexeme,
                        tok.loc,
                    )
                    .into()),
                }
            }
            _ => Err(self.syntax_error(SyntaxErrorKind::InvalidType)),
        }
    }

    fn compile_basic_type(&mut self) -> Result<Type, CompileError> {
        match self.peek() {
            TokenKind::KwInteger => {
                self.scan()?;
                Ok(Type::int())
            }
            TokenKind::KwChar => {
                self.scan()?;
                Ok(Type::char())
            }
            _ => Err(self.semantic_error(SemanticErrorKind::InvalidBasicType)),
        }
    }
}

/// A literal token whose payload the token source left empty.
fn malformed_constant(tok: &Token) -> CompileError {
    SemanticError::named(SemanticErrorKind::InvalidConstant, &tok.lexeme, tok.loc).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kpl_lex::{LexError, Loc};

    /// Feeds a fixed token list, then `Eof` forever.
    struct Scripted {
        tokens: std::vec::IntoIter<Token>,
    }

    impl Scripted {
        fn new(kinds: &[(TokenKind, &str)]) -> Self {
            let tokens: Vec<Token> = kinds
                .iter()
                .enumerate()
                .map(|(i, (kind, lexeme))| {
                    let loc = Loc::new(kpl_lex::span(i, 1), 1, i as u32 + 1);
                    match kind {
                        TokenKind::Number => Token::number(*lexeme, lexeme.parse().unwrap(), loc),
                        _ => Token::new(*kind, *lexeme, loc),
                    }
                })
                .collect();
            Self::from_tokens(tokens)
        }

        fn from_tokens(tokens: Vec<Token>) -> Self {
            Self {
                tokens: tokens.into_iter(),
            }
        }
    }

    impl TokenSource for Scripted {
        fn next_token(&mut self) -> Result<Token, LexError> {
            Ok(self
                .tokens
                .next()
                .unwrap_or_else(|| Token::new(TokenKind::Eof, "", Loc::default())))
        }
    }

    #[test]
    fn parses_from_any_token_source() {
        use TokenKind::*;
        let source = Scripted::new(&[
            (KwProgram, "program"),
            (Ident, "P"),
            (Semicolon, ";"),
            (KwConst, "const"),
            (Ident, "n"),
            (Eq, "="),
            (Minus, "-"),
            (Number, "4"),
            (Semicolon, ";"),
            (KwBegin, "begin"),
            (KwEnd, "end"),
            (Period, "."),
        ]);
        let mut table = SymbolTable::new();
        let mut parser = Parser::new(source, &mut table, &CompileConfig::default()).unwrap();
        let program = parser.compile_program().unwrap();

        let scope = table.object(program).owned_scope().unwrap();
        let consts: Vec<_> = table.scope_objects(scope).collect();
        assert_eq!(consts.len(), 1);
        assert_eq!(
            consts[0].kind,
            ObjectKind::Constant {
                value: ConstantValue::Int(-4)
            }
        );
        assert_eq!(table.current_scope(), None);
    }

    #[test]
    fn missing_token_names_both_kinds() {
        use TokenKind::*;
        let source = Scripted::new(&[(KwProgram, "program"), (Semicolon, ";")]);
        let mut table = SymbolTable::new();
        let mut parser = Parser::new(source, &mut table, &CompileConfig::default()).unwrap();
        let err = parser.compile_program().unwrap_err();
        assert_eq!(
            err.syntax_kind(),
            Some(&SyntaxErrorKind::MissingToken {
                expected: Ident,
                found: Semicolon
            })
        );
        assert_eq!(err.loc().map(|l| l.column), Some(2));
    }

    #[test]
    fn literal_without_payload_is_an_invalid_constant() {
        use TokenKind::*;
        let at = |i: usize| Loc::new(kpl_lex::span(i, 1), 1, i as u32 + 1);
        for literal in [Token::new(Number, "7", at(5)), Token::new(Char, "", at(5))] {
            let source = Scripted::from_tokens(vec![
                Token::new(KwProgram, "program", at(0)),
                Token::new(Ident, "P", at(1)),
                Token::new(Semicolon, ";", at(2)),
                Token::new(KwConst, "const", at(3)),
                Token::new(Ident, "k", at(4)),
                Token::new(Eq, "=", at(4)),
                literal,
                Token::new(Semicolon, ";", at(6)),
                Token::new(KwBegin, "begin", at(7)),
                Token::new(KwEnd, "end", at(8)),
                Token::new(Period, ".", at(9)),
            ]);
            let mut table = SymbolTable::new();
            let mut parser = Parser::new(source, &mut table, &CompileConfig::default()).unwrap();
            let err = parser.compile_program().unwrap_err();
            assert_eq!(err.semantic_kind(), Some(&SemanticErrorKind::InvalidConstant));
            assert_eq!(err.loc().map(|l| l.column), Some(6));
        }
    }

    #[test]
    fn nesting_bound_is_enforced() {
        let config = CompileConfig {
            max_depth: 2,
            ..CompileConfig::default()
        };
        let mut table = SymbolTable::new();
        let source = Scripted::new(&[]);
        let mut parser = Parser::new(source, &mut table, &config).unwrap();
        let ok = parser.nested(|p| p.nested(|_| Ok(())));
        assert!(ok.is_ok());
        let err = parser
            .nested(|p| p.nested(|p| p.nested(|_| Ok(()))))
            .unwrap_err();
        assert_eq!(
            err.syntax_kind(),
            Some(&SyntaxErrorKind::NestingTooDeep { limit: 2 })
        );
        assert_eq!(parser.depth, 0);
    }
}
