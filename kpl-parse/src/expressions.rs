#![forbid(unsafe_code)]

use kpl_core::{
    check_type_equality, require_array, require_basic, require_int, ObjectId, ObjectKind,
    PassMode, SemanticError, SemanticErrorKind, Type,
};
use kpl_lex::{Loc, TokenKind, TokenSource};

use crate::error::{CompileError, SyntaxErrorKind};
use crate::parser::Parser;

/// Tokens that may follow a complete expression.
const EXPRESSION_FOLLOW: &[TokenKind] = &[
    TokenKind::KwTo,
    TokenKind::KwDo,
    TokenKind::RParen,
    TokenKind::Comma,
    TokenKind::Eq,
    TokenKind::Neq,
    TokenKind::Le,
    TokenKind::Lt,
    TokenKind::Ge,
    TokenKind::Gt,
    TokenKind::RSel,
    TokenKind::Semicolon,
    TokenKind::KwEnd,
    TokenKind::KwElse,
    TokenKind::KwThen,
];

fn follows_expression(kind: TokenKind) -> bool {
    EXPRESSION_FOLLOW.contains(&kind)
}

fn follows_term(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Plus | TokenKind::Minus) || follows_expression(kind)
}

/// Tokens after which a routine name stands for a call with no arguments.
fn follows_arguments(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Times | TokenKind::Slash) || follows_term(kind)
}

/// What an identifier in factor position denotes.
enum FactorUse {
    Value(Type),
    Storage(Type),
    Call(Option<Type>),
    Invalid,
}

impl<S: TokenSource> Parser<'_, S> {
    /// `expr relop expr` over basic types of the same kind.
    pub(crate) fn compile_condition(&mut self) -> Result<(), CompileError> {
        let loc = self.look_ahead().loc;
        let left = self.compile_expression()?;
        require_basic(&left, loc)?;

        if !self.peek().is_relational() {
            return Err(self.semantic_error(SemanticErrorKind::InvalidComparator));
        }
        self.scan()?;

        let loc = self.look_ahead().loc;
        let right = self.compile_expression()?;
        require_basic(&right, loc)?;
        check_type_equality(&left, &right, loc)?;
        Ok(())
    }

    /// `[+|-] term {(+|-) term}`. A lone unsigned term keeps its type; any
    /// sign or additive operator makes the expression integer arithmetic.
    pub(crate) fn compile_expression(&mut self) -> Result<Type, CompileError> {
        self.nested(|p| {
            let signed = matches!(p.peek(), TokenKind::Plus | TokenKind::Minus);
            if signed {
                p.scan()?;
            }
            let loc = p.look_ahead().loc;
            let mut ty = p.compile_term()?;
            if signed {
                require_int(&ty, loc)?;
            }

            while matches!(p.peek(), TokenKind::Plus | TokenKind::Minus) {
                require_int(&ty, loc)?;
                p.scan()?;
                let rhs_loc = p.look_ahead().loc;
                let rhs = p.compile_term()?;
                require_int(&rhs, rhs_loc)?;
                ty = Type::int();
            }

            if !follows_expression(p.peek()) {
                return Err(p.syntax_error(SyntaxErrorKind::InvalidExpression));
            }
            Ok(ty)
        })
    }

    fn compile_term(&mut self) -> Result<Type, CompileError> {
        let loc = self.look_ahead().loc;
        let mut ty = self.compile_factor()?;

        while matches!(self.peek(), TokenKind::Times | TokenKind::Slash) {
            require_int(&ty, loc)?;
            self.scan()?;
            let rhs_loc = self.look_ahead().loc;
            let rhs = self.compile_factor()?;
            require_int(&rhs, rhs_loc)?;
            ty = Type::int();
        }

        if !follows_term(self.peek()) {
            return Err(self.syntax_error(SyntaxErrorKind::InvalidTerm));
        }
        Ok(ty)
    }

    fn compile_factor(&mut self) -> Result<Type, CompileError> {
        match self.peek() {
            TokenKind::Number => {
                self.scan()?;
                Ok(Type::int())
            }
            TokenKind::Char => {
                self.scan()?;
                Ok(Type::char())
            }
            TokenKind::LParen => {
                self.scan()?;
                let ty = self.compile_expression()?;
                self.eat(TokenKind::RParen)?;
                Ok(ty)
            }
            TokenKind::Ident => self.compile_ident_factor(),
            _ => Err(self.syntax_error(SyntaxErrorKind::InvalidFactor)),
        }
    }

    fn compile_ident_factor(&mut self) -> Result<Type, CompileError> {
        let tok = self.eat(TokenKind::Ident)?;
        let id = self.symtab.check_declared_ident(&tok.lexeme, tok.loc)?;
        let usage = match &self.symtab.object(id).kind {
            ObjectKind::Constant { value } => FactorUse::Value(value.ty()),
            ObjectKind::Variable { ty } | ObjectKind::Parameter { ty, .. } => {
                FactorUse::Storage(ty.duplicate())
            }
            ObjectKind::Function { return_type, .. } => {
                FactorUse::Call(return_type.as_ref().map(Type::duplicate))
            }
            ObjectKind::Program { .. }
            | ObjectKind::TypeAlias { .. }
            | ObjectKind::Procedure { .. } => FactorUse::Invalid,
        };

        let invalid =
            || SemanticError::named(SemanticErrorKind::InvalidFactor, &tok.lexeme, tok.loc);
        match usage {
            FactorUse::Value(ty) => Ok(ty),
            FactorUse::Storage(ty) => self.compile_indexes(ty),
            FactorUse::Call(return_type) => {
                self.compile_arguments(id, tok.loc)?;
                Ok(return_type.ok_or_else(invalid)?)
            }
            FactorUse::Invalid => Err(invalid().into()),
        }
    }

    /// Zero or more `[expr]` selectors; each peels one array level off `ty`.
    pub(crate) fn compile_indexes(&mut self, mut ty: Type) -> Result<Type, CompileError> {
        while self.at(TokenKind::LSel) {
            let open = self.scan()?;
            let element = require_array(&ty, open.loc)?.duplicate();
            let loc = self.look_ahead().loc;
            let index = self.compile_expression()?;
            require_int(&index, loc)?;
            self.eat(TokenKind::RSel)?;
            ty = element;
        }
        Ok(ty)
    }

    /// Argument list of a call to `routine`. Without parentheses the call
    /// passes nothing, which is only legal where a call may end.
    pub(crate) fn compile_arguments(
        &mut self,
        routine: ObjectId,
        call_loc: Loc,
    ) -> Result<(), CompileError> {
        let params: Vec<(PassMode, Type)> = self
            .symtab
            .params(routine)
            .filter_map(|p| match &p.kind {
                ObjectKind::Parameter { mode, ty, .. } => Some((*mode, ty.duplicate())),
                _ => None,
            })
            .collect();

        if self.at(TokenKind::LParen) {
            self.scan()?;
            let mut count = 0;
            if !self.at(TokenKind::RParen) {
                loop {
                    match params.get(count) {
                        Some((mode, ty)) => self.compile_argument(*mode, ty)?,
                        None => {
                            self.compile_expression()?;
                        }
                    }
                    count += 1;
                    if !self.at(TokenKind::Comma) {
                        break;
                    }
                    self.scan()?;
                }
            }
            if count != params.len() {
                return Err(self.semantic_error(SemanticErrorKind::ArityMismatch {
                    expected: params.len(),
                    found: count,
                }));
            }
            self.eat(TokenKind::RParen)?;
            Ok(())
        } else if follows_arguments(self.peek()) {
            if !params.is_empty() {
                return Err(SemanticError::new(
                    SemanticErrorKind::ArityMismatch {
                        expected: params.len(),
                        found: 0,
                    },
                    call_loc,
                )
                .into());
            }
            Ok(())
        } else {
            Err(self.syntax_error(SyntaxErrorKind::InvalidArguments))
        }
    }

    fn compile_argument(&mut self, mode: PassMode, param_ty: &Type) -> Result<(), CompileError> {
        let loc = self.look_ahead().loc;
        let ty = match mode {
            PassMode::Value => self.compile_expression()?,
            PassMode::Reference => self.compile_reference_argument()?,
        };
        check_type_equality(param_ty, &ty, loc)?;
        Ok(())
    }

    /// A by-reference argument must name storage: a variable or parameter,
    /// optionally indexed, and nothing more.
    fn compile_reference_argument(&mut self) -> Result<Type, CompileError> {
        if !self.at(TokenKind::Ident) {
            let tok = self.look_ahead();
            return Err(
                SemanticError::named(SemanticErrorKind::InvalidLValue, &tok.lexeme, tok.loc).into(),
            );
        }
        let tok = self.scan()?;
        let id = self.symtab.check_declared_ident(&tok.lexeme, tok.loc)?;
        let ty = self
            .symtab
            .object(id)
            .storage_type()
            .map(Type::duplicate)
            .ok_or_else(|| {
                SemanticError::named(SemanticErrorKind::InvalidLValue, &tok.lexeme, tok.loc)
            })?;
        let ty = self.compile_indexes(ty)?;
        if !matches!(self.peek(), TokenKind::Comma | TokenKind::RParen) {
            return Err(
                SemanticError::named(SemanticErrorKind::InvalidLValue, &tok.lexeme, tok.loc).into(),
            );
        }
        Ok(ty)
    }
}
