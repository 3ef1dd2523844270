#![forbid(unsafe_code)]

mod checks;
mod dump;
mod error;
mod object;
mod symtab;
mod types;

pub use error::{SemanticError, SemanticErrorKind};
pub use object::{Object, ObjectClass, ObjectId, ObjectKind, PassMode, ScopeId};
pub use symtab::{Scope, SymbolTable, SymbolTableError};
pub use types::{
    check_type_equality, require_array, require_basic, require_int, ConstantValue, Type,
};
