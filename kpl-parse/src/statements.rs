#![forbid(unsafe_code)]

use kpl_core::{check_type_equality, require_int, ObjectKind, SemanticError, SemanticErrorKind, Type};
use kpl_lex::{TokenKind, TokenSource};

use crate::error::{CompileError, SyntaxErrorKind};
use crate::parser::Parser;

impl<S: TokenSource> Parser<'_, S> {
    pub(crate) fn compile_statements(&mut self) -> Result<(), CompileError> {
        self.compile_statement()?;
        while self.at(TokenKind::Semicolon) {
            self.scan()?;
            self.compile_statement()?;
        }
        Ok(())
    }

    pub(crate) fn compile_statement(&mut self) -> Result<(), CompileError> {
        self.nested(|p| match p.peek() {
            TokenKind::Ident => p.compile_assign_st(),
            TokenKind::KwCall => p.compile_call_st(),
            TokenKind::KwBegin => p.compile_group_st(),
            TokenKind::KwIf => p.compile_if_st(),
            TokenKind::KwWhile => p.compile_while_st(),
            TokenKind::KwFor => p.compile_for_st(),
            // empty statement
            TokenKind::Semicolon | TokenKind::KwEnd | TokenKind::KwElse => Ok(()),
            _ => Err(p.syntax_error(SyntaxErrorKind::InvalidStatement)),
        })
    }

    /// `lvalue {, lvalue} op expr {, expr}`. Targets and sources pair up in
    /// order; compound operators need integer operands.
    fn compile_assign_st(&mut self) -> Result<(), CompileError> {
        let mut targets = vec![self.compile_lvalue()?];
        while self.at(TokenKind::Comma) {
            self.scan()?;
            targets.push(self.compile_lvalue()?);
        }

        let op = if self.peek().is_assign_op() {
            self.scan()?
        } else {
            return Err(self.missing(TokenKind::Assign));
        };

        let mut sources = 0;
        loop {
            let loc = self.look_ahead().loc;
            let ty = self.compile_expression()?;
            if let Some(target) = targets.get(sources) {
                check_type_equality(target, &ty, loc)?;
                if op.kind != TokenKind::Assign {
                    require_int(target, loc)?;
                }
            }
            sources += 1;
            if !self.at(TokenKind::Comma) {
                break;
            }
            self.scan()?;
        }

        if sources != targets.len() {
            return Err(SemanticError::new(
                SemanticErrorKind::ArityMismatch {
                    expected: targets.len(),
                    found: sources,
                },
                op.loc,
            )
            .into());
        }
        Ok(())
    }

    /// Assignment target: a variable or parameter, optionally indexed, or
    /// the result slot of the function being compiled.
    fn compile_lvalue(&mut self) -> Result<Type, CompileError> {
        let tok = self.eat(TokenKind::Ident)?;
        let id = self
            .symtab
            .check_declared_lvalue_ident(&tok.lexeme, tok.loc)?;
        let (ty, indexable) = match &self.symtab.object(id).kind {
            ObjectKind::Variable { ty } | ObjectKind::Parameter { ty, .. } => {
                (Some(ty.duplicate()), true)
            }
            ObjectKind::Function { return_type, .. } => {
                (return_type.as_ref().map(Type::duplicate), false)
            }
            ObjectKind::Program { .. }
            | ObjectKind::Constant { .. }
            | ObjectKind::TypeAlias { .. }
            | ObjectKind::Procedure { .. } => (None, false),
        };
        let ty = ty.ok_or_else(|| {
            SemanticError::named(SemanticErrorKind::InvalidLValue, &tok.lexeme, tok.loc)
        })?;
        if indexable {
            self.compile_indexes(ty)
        } else {
            Ok(ty)
        }
    }

    fn compile_call_st(&mut self) -> Result<(), CompileError> {
        self.eat(TokenKind::KwCall)?;
        let tok = self.eat(TokenKind::Ident)?;
        let id = self.symtab.check_declared_procedure(&tok.lexeme, tok.loc)?;
        self.compile_arguments(id, tok.loc)
    }

    fn compile_group_st(&mut self) -> Result<(), CompileError> {
        self.eat(TokenKind::KwBegin)?;
        self.compile_statements()?;
        self.eat(TokenKind::KwEnd)?;
        Ok(())
    }

    fn compile_if_st(&mut self) -> Result<(), CompileError> {
        self.eat(TokenKind::KwIf)?;
        self.compile_condition()?;
        self.eat(TokenKind::KwThen)?;
        self.compile_statement()?;
        if self.at(TokenKind::KwElse) {
            self.scan()?;
            self.compile_statement()?;
        }
        Ok(())
    }

    fn compile_while_st(&mut self) -> Result<(), CompileError> {
        self.eat(TokenKind::KwWhile)?;
        self.compile_condition()?;
        self.eat(TokenKind::KwDo)?;
        self.compile_statement()
    }

    fn compile_for_st(&mut self) -> Result<(), CompileError> {
        self.eat(TokenKind::KwFor)?;
        let tok = self.eat(TokenKind::Ident)?;
        let id = self.symtab.check_declared_variable(&tok.lexeme, tok.loc)?;
        let var_ty = self
            .symtab
            .object(id)
            .storage_type()
            .map(Type::duplicate)
            .ok_or_else(|| {
                SemanticError::named(SemanticErrorKind::InvalidVariable, &tok.lexeme, tok.loc)
            })?;
        require_int(&var_ty, tok.loc)?;

        self.eat(TokenKind::Assign)?;
        let loc = self.look_ahead().loc;
        let from = self.compile_expression()?;
        check_type_equality(&var_ty, &from, loc)?;

        self.eat(TokenKind::KwTo)?;
        let loc = self.look_ahead().loc;
        let to = self.compile_expression()?;
        check_type_equality(&var_ty, &to, loc)?;

        self.eat(TokenKind::KwDo)?;
        self.compile_statement()
    }
}
