#![forbid(unsafe_code)]

use std::fmt;

use kpl_lex::Loc;

use crate::types::{ConstantValue, Type};

/// Handle of an object in the symbol table arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) usize);

/// Handle of a scope in the symbol table arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassMode {
    Value,
    Reference,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    pub name: String,
    /// Declaration site; `None` for builtins.
    pub loc: Option<Loc>,
    pub kind: ObjectKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ObjectKind {
    Program {
        scope: ScopeId,
    },
    Constant {
        value: ConstantValue,
    },
    TypeAlias {
        actual: Type,
    },
    Variable {
        ty: Type,
    },
    Function {
        params: Vec<ObjectId>,
        /// Unset while the parameter list is still being parsed.
        return_type: Option<Type>,
        scope: ScopeId,
    },
    Procedure {
        params: Vec<ObjectId>,
        scope: ScopeId,
    },
    Parameter {
        mode: PassMode,
        ty: Type,
        routine: ObjectId,
    },
}

impl Object {
    pub fn new(name: impl Into<String>, loc: Option<Loc>, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            loc,
            kind,
        }
    }

    pub fn constant(name: &str, value: ConstantValue, loc: Loc) -> Self {
        Self::new(name, Some(loc), ObjectKind::Constant { value })
    }

    pub fn type_alias(name: &str, actual: Type, loc: Loc) -> Self {
        Self::new(name, Some(loc), ObjectKind::TypeAlias { actual })
    }

    pub fn variable(name: &str, ty: Type, loc: Loc) -> Self {
        Self::new(name, Some(loc), ObjectKind::Variable { ty })
    }

    pub fn class(&self) -> ObjectClass {
        match self.kind {
            ObjectKind::Program { .. } => ObjectClass::Program,
            ObjectKind::Constant { .. } => ObjectClass::Constant,
            ObjectKind::TypeAlias { .. } => ObjectClass::TypeAlias,
            ObjectKind::Variable { .. } => ObjectClass::Variable,
            ObjectKind::Function { .. } => ObjectClass::Function,
            ObjectKind::Procedure { .. } => ObjectClass::Procedure,
            ObjectKind::Parameter { .. } => ObjectClass::Parameter,
        }
    }

    /// The scope introduced by a program, function or procedure.
    pub fn owned_scope(&self) -> Option<ScopeId> {
        match &self.kind {
            ObjectKind::Program { scope }
            | ObjectKind::Function { scope, .. }
            | ObjectKind::Procedure { scope, .. } => Some(*scope),
            _ => None,
        }
    }

    /// Ordered parameter list of a routine; empty for anything else.
    pub fn params(&self) -> &[ObjectId] {
        match &self.kind {
            ObjectKind::Function { params, .. } | ObjectKind::Procedure { params, .. } => params,
            _ => &[],
        }
    }

    /// Storage type of a variable or parameter.
    pub fn storage_type(&self) -> Option<&Type> {
        match &self.kind {
            ObjectKind::Variable { ty } | ObjectKind::Parameter { ty, .. } => Some(ty),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectClass {
    Program,
    Constant,
    TypeAlias,
    Variable,
    Function,
    Procedure,
    Parameter,
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ObjectClass::Program => "Program",
            ObjectClass::Constant => "Const",
            ObjectClass::TypeAlias => "Type",
            ObjectClass::Variable => "Var",
            ObjectClass::Function => "Function",
            ObjectClass::Procedure => "Procedure",
            ObjectClass::Parameter => "Param",
        };
        f.write_str(s)
    }
}
