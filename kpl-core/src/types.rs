#![forbid(unsafe_code)]

use std::fmt;

use kpl_lex::Loc;

use crate::error::{SemanticError, SemanticErrorKind};

/// Value types of the language.
///
/// Types are plain values: an array owns its element type, and every object
/// that records a type holds its own copy (see [`Type::duplicate`]).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Char,
    Array { size: u32, element: Box<Type> },
}

impl Type {
    pub fn int() -> Self {
        Type::Int
    }

    pub fn char() -> Self {
        Type::Char
    }

    pub fn array(size: u32, element: Type) -> Self {
        Type::Array {
            size,
            element: Box::new(element),
        }
    }

    /// Deep copy; the result shares no structure with `self`.
    pub fn duplicate(&self) -> Self {
        match self {
            Type::Int => Type::Int,
            Type::Char => Type::Char,
            Type::Array { size, element } => Type::array(*size, element.duplicate()),
        }
    }

    /// Structural equality: same tag, and for arrays the same size and equal
    /// element types.
    pub fn equals(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Int, Type::Int) | (Type::Char, Type::Char) => true,
            (
                Type::Array { size: s1, element: e1 },
                Type::Array { size: s2, element: e2 },
            ) => s1 == s2 && e1.equals(e2),
            _ => false,
        }
    }

    pub fn is_basic(&self) -> bool {
        matches!(self, Type::Int | Type::Char)
    }

    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Array { element, .. } => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("integer"),
            Type::Char => f.write_str("char"),
            Type::Array { size, element } => write!(f, "array[{size}] of {element}"),
        }
    }
}

/// Folded value of a `const` declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstantValue {
    Int(i32),
    Char(char),
}

impl ConstantValue {
    pub fn ty(&self) -> Type {
        match self {
            ConstantValue::Int(_) => Type::Int,
            ConstantValue::Char(_) => Type::Char,
        }
    }

    pub fn duplicate(&self) -> Self {
        *self
    }

    /// Unary minus. Only integers negate.
    pub fn negate(self) -> Option<Self> {
        match self {
            ConstantValue::Int(i) => i.checked_neg().map(ConstantValue::Int),
            ConstantValue::Char(_) => None,
        }
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Int(i) => write!(f, "{i}"),
            ConstantValue::Char(c) => write!(f, "'{c}'"),
        }
    }
}

pub fn require_basic(ty: &Type, loc: Loc) -> Result<(), SemanticError> {
    if ty.is_basic() {
        Ok(())
    } else {
        Err(SemanticError::new(SemanticErrorKind::InvalidBasicType, loc))
    }
}

pub fn require_int(ty: &Type, loc: Loc) -> Result<(), SemanticError> {
    check_type_equality(&Type::Int, ty, loc)
}

/// Returns the element type of an array, or `NotAnArray`.
pub fn require_array(ty: &Type, loc: Loc) -> Result<&Type, SemanticError> {
    ty.element()
        .ok_or_else(|| SemanticError::new(SemanticErrorKind::NotAnArray, loc))
}

pub fn check_type_equality(expected: &Type, found: &Type, loc: Loc) -> Result<(), SemanticError> {
    if expected.equals(found) {
        Ok(())
    } else {
        Err(SemanticError::new(
            SemanticErrorKind::TypeInconsistency {
                expected: expected.duplicate(),
                found: found.duplicate(),
            },
            loc,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_equality_is_structural() {
        let a = Type::array(5, Type::int());
        assert!(a.equals(&Type::array(5, Type::int())));
        assert!(!a.equals(&Type::array(5, Type::char())));
        assert!(!a.equals(&Type::array(6, Type::int())));
        assert!(!a.equals(&Type::int()));
    }

    #[test]
    fn nested_arrays_compare_all_levels() {
        let m = Type::array(2, Type::array(3, Type::char()));
        assert!(m.equals(&m.duplicate()));
        assert!(!m.equals(&Type::array(2, Type::array(4, Type::char()))));
        assert_eq!(m.element().and_then(Type::element), Some(&Type::char()));
        assert_eq!(m.to_string(), "array[2] of array[3] of char");
    }

    #[test]
    fn requirements_report_the_offending_type() {
        let loc = Loc::default();
        assert!(require_basic(&Type::char(), loc).is_ok());
        let err = require_basic(&Type::array(1, Type::int()), loc).unwrap_err();
        assert_eq!(err.kind, SemanticErrorKind::InvalidBasicType);

        let err = require_int(&Type::char(), loc).unwrap_err();
        assert_eq!(
            err.kind,
            SemanticErrorKind::TypeInconsistency {
                expected: Type::Int,
                found: Type::Char
            }
        );

        assert_eq!(require_array(&Type::array(4, Type::char()), loc).unwrap(), &Type::Char);
        let err = require_array(&Type::int(), loc).unwrap_err();
        assert_eq!(err.kind, SemanticErrorKind::NotAnArray);
    }

    #[test]
    fn constants_negate_only_integers() {
        assert_eq!(ConstantValue::Int(4).negate(), Some(ConstantValue::Int(-4)));
        assert_eq!(ConstantValue::Char('x').negate(), None);
        assert_eq!(ConstantValue::Char('x').ty(), Type::Char);
    }
}
