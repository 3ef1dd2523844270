#![forbid(unsafe_code)]

//! Name resolution checks run by the parser at each identifier.

use kpl_lex::Loc;

use crate::error::{SemanticError, SemanticErrorKind};
use crate::object::{ObjectId, ObjectKind};
use crate::symtab::SymbolTable;

impl SymbolTable {
    /// Fails if `name` is already declared in the current scope.
    pub fn check_fresh_ident(&self, name: &str, loc: Loc) -> Result<(), SemanticError> {
        match self.lookup_in_current(name) {
            Some(_) => Err(SemanticError::named(SemanticErrorKind::DuplicateIdent, name, loc)),
            None => Ok(()),
        }
    }

    pub fn check_declared_ident(&self, name: &str, loc: Loc) -> Result<ObjectId, SemanticError> {
        self.lookup(name)
            .ok_or_else(|| SemanticError::named(SemanticErrorKind::UndeclaredIdent, name, loc))
    }

    pub fn check_declared_constant(&self, name: &str, loc: Loc) -> Result<ObjectId, SemanticError> {
        self.resolve_as(
            name,
            loc,
            SemanticErrorKind::UndeclaredConstant,
            SemanticErrorKind::InvalidConstant,
            |kind| matches!(kind, ObjectKind::Constant { .. }),
        )
    }

    pub fn check_declared_type(&self, name: &str, loc: Loc) -> Result<ObjectId, SemanticError> {
        self.resolve_as(
            name,
            loc,
            SemanticErrorKind::UndeclaredType,
            SemanticErrorKind::InvalidType,
            |kind| matches!(kind, ObjectKind::TypeAlias { .. }),
        )
    }

    pub fn check_declared_variable(&self, name: &str, loc: Loc) -> Result<ObjectId, SemanticError> {
        self.resolve_as(
            name,
            loc,
            SemanticErrorKind::UndeclaredVariable,
            SemanticErrorKind::InvalidVariable,
            |kind| matches!(kind, ObjectKind::Variable { .. }),
        )
    }

    pub fn check_declared_procedure(&self, name: &str, loc: Loc) -> Result<ObjectId, SemanticError> {
        self.resolve_as(
            name,
            loc,
            SemanticErrorKind::UndeclaredProcedure,
            SemanticErrorKind::InvalidProcedure,
            |kind| matches!(kind, ObjectKind::Procedure { .. }),
        )
    }

    /// Resolves an assignment target: a variable, a parameter, or the
    /// function whose body is being parsed (its result slot).
    pub fn check_declared_lvalue_ident(&self, name: &str, loc: Loc) -> Result<ObjectId, SemanticError> {
        let id = self.check_declared_ident(name, loc)?;
        match &self.object(id).kind {
            ObjectKind::Variable { .. } | ObjectKind::Parameter { .. } => Ok(id),
            ObjectKind::Function { .. } if self.current_owner() == Some(id) => Ok(id),
            _ => Err(SemanticError::named(SemanticErrorKind::InvalidLValue, name, loc)),
        }
    }

    fn resolve_as(
        &self,
        name: &str,
        loc: Loc,
        undeclared: SemanticErrorKind,
        wrong_kind: SemanticErrorKind,
        accept: impl Fn(&ObjectKind) -> bool,
    ) -> Result<ObjectId, SemanticError> {
        let id = self
            .lookup(name)
            .ok_or_else(|| SemanticError::named(undeclared, name, loc))?;
        if accept(&self.object(id).kind) {
            Ok(id)
        } else {
            Err(SemanticError::named(wrong_kind, name, loc))
        }
    }
}
