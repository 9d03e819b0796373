//! Reduced-C type system
//!
//! Types are fully resolved by the front end before they reach the emitter.
//! The emitter only needs sizes, names and the array dimension chain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of every scalar (int, float, bool) and pointer in bytes
pub const WORD_SIZE: u32 = 4;

/// Reduced-C semantic types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    Int,
    Float,
    Bool,
    Void,
    /// Type of the `nullptr` literal
    Null,

    /// Pointer to another type
    Pointer(Box<Type>),

    /// (Possibly multi-dimensional) array
    Array(ArrayType),

    /// Struct with its laid-out size in bytes
    Struct { name: String, size: u32 },
}

impl Type {
    pub fn pointer_to(target: Type) -> Self {
        Type::Pointer(Box::new(target))
    }

    /// Size of this type in bytes
    pub fn size(&self) -> u32 {
        match self {
            Type::Int | Type::Float | Type::Bool | Type::Null | Type::Pointer(_) => WORD_SIZE,
            Type::Void => 0,
            Type::Array(array) => array.total_size(),
            Type::Struct { size, .. } => *size,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_) | Type::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Type::Struct { .. })
    }

    /// Int, float and bool
    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Int | Type::Float | Type::Bool)
    }

    /// Get pointer target type
    pub fn pointer_target(&self) -> Option<&Type> {
        match self {
            Type::Pointer(target) => Some(target),
            _ => None,
        }
    }

    /// Source-level spelling
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Spelling that is legal inside an assembler symbol
    pub fn label_name(&self) -> String {
        match self {
            Type::Int => "int".to_string(),
            Type::Float => "float".to_string(),
            Type::Bool => "bool".to_string(),
            Type::Void => "void".to_string(),
            Type::Null => "nullptr".to_string(),
            Type::Pointer(target) => format!("{}$p", target.label_name()),
            Type::Array(array) => {
                let mut name = array
                    .base_type()
                    .map(Type::label_name)
                    .unwrap_or_else(|| "incomplete".to_string());
                for length in array.lengths() {
                    name.push_str(&format!("$a{length}"));
                }
                name
            }
            Type::Struct { name, .. } => name.clone(),
        }
    }

    /// Structural equivalence
    pub fn is_equivalent(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Array(a), Type::Array(b)) => a.is_equivalent(b),
            (Type::Pointer(a), Type::Pointer(b)) => a.is_equivalent(b),
            (Type::Struct { name: a, .. }, Type::Struct { name: b, .. }) => a == b,
            _ => self == other,
        }
    }

    /// Whether a value of type `other` may be assigned to a slot of this type
    pub fn is_assignable(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Float, Type::Int) => true,
            (Type::Pointer(_), Type::Null) => true,
            (Type::Array(a), Type::Array(b)) => a.is_assignable(b),
            _ => self.is_equivalent(other),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::Void => write!(f, "void"),
            Type::Null => write!(f, "nullptr"),
            Type::Pointer(target) => write!(f, "{target}*"),
            Type::Array(array) => {
                match array.base_type() {
                    Some(base) => write!(f, "{base}")?,
                    None => write!(f, "<incomplete>")?,
                }
                for length in array.lengths() {
                    write!(f, "[{length}]")?;
                }
                Ok(())
            }
            Type::Struct { name, .. } => write!(f, "{name}"),
        }
    }
}

/// Array type as a chain of dimension nodes
///
/// `next` is the inner dimension (another `ArrayType`) or, at
/// `dimension == 1`, the element type. A declaration `int a[3][4]` is the
/// chain `[3] -> [4] -> int` with dimensions 2 and 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayType {
    pub dimension: u32,
    pub length: u32,
    pub next: Option<Box<Type>>,
}

impl ArrayType {
    /// Create an unlinked dimension node
    pub fn new(length: u32, dimension: u32) -> Self {
        Self {
            dimension,
            length,
            next: None,
        }
    }

    /// Build a complete chain from outer-to-inner lengths and an element type
    pub fn with_dimensions(lengths: &[u32], element: Type) -> Self {
        let depth = lengths.len() as u32;
        let mut array = ArrayType::new(lengths.first().copied().unwrap_or(0), depth.max(1));
        for (i, &length) in lengths.iter().enumerate().skip(1) {
            array.add_next(Type::Array(ArrayType::new(length, depth - i as u32)));
        }
        array.add_next(element);
        array
    }

    /// Link `t` at the end of the chain
    pub fn add_next(&mut self, t: Type) {
        match &mut self.next {
            None => self.next = Some(Box::new(t)),
            Some(next) => match next.as_mut() {
                Type::Array(inner) => inner.add_next(t),
                // The element is already linked; the chain is complete.
                _ => {}
            },
        }
    }

    pub fn next(&self) -> Option<&Type> {
        self.next.as_deref()
    }

    /// Ultimate element type
    pub fn base_type(&self) -> Option<&Type> {
        let next = self.next.as_deref()?;
        if self.dimension <= 1 {
            return Some(next);
        }
        match next {
            Type::Array(inner) => inner.base_type(),
            other => Some(other),
        }
    }

    /// Byte size of one element at this level
    pub fn element_size(&self) -> u32 {
        self.next.as_deref().map(Type::size).unwrap_or(0)
    }

    /// Total byte footprint of the whole chain, saturating at `u32::MAX`
    pub fn total_size(&self) -> u32 {
        self.length.saturating_mul(self.element_size())
    }

    /// Total byte footprint, `None` when it does not fit in 32 bits
    pub fn checked_total_size(&self) -> Option<u32> {
        let element = match self.next.as_deref() {
            Some(Type::Array(inner)) => inner.checked_total_size()?,
            Some(other) => other.size(),
            None => 0,
        };
        self.length.checked_mul(element)
    }

    /// Lengths from the outermost dimension inward
    pub fn lengths(&self) -> Vec<u32> {
        let mut lengths = vec![self.length];
        let mut current = self.next.as_deref();
        while let Some(Type::Array(inner)) = current {
            lengths.push(inner.length);
            current = inner.next.as_deref();
        }
        lengths
    }

    pub fn is_equivalent(&self, other: &ArrayType) -> bool {
        if self.length != other.length {
            return false;
        }
        match (self.next(), other.next()) {
            (Some(a), Some(b)) => a.is_equivalent(b),
            _ => false,
        }
    }

    pub fn is_assignable(&self, other: &ArrayType) -> bool {
        match (self.next(), other.next()) {
            (Some(a), Some(b)) => a.is_assignable(b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_sizes() {
        assert_eq!(Type::Int.size(), 4);
        assert_eq!(Type::Float.size(), 4);
        assert_eq!(Type::Bool.size(), 4);
        assert_eq!(Type::pointer_to(Type::Int).size(), 4);
        assert_eq!(Type::Void.size(), 0);
    }

    #[test]
    fn test_two_dimensional_total_size() {
        let mut outer = ArrayType::new(3, 2);
        outer.add_next(Type::Array(ArrayType::new(4, 1)));
        outer.add_next(Type::Int);

        assert_eq!(outer.total_size(), 48);
        assert_eq!(outer.element_size(), 16);
        assert_eq!(outer.base_type(), Some(&Type::Int));
        assert_eq!(outer.lengths(), vec![3, 4]);
    }

    #[test]
    fn test_with_dimensions_matches_incremental_build() {
        let mut manual = ArrayType::new(2, 3);
        manual.add_next(Type::Array(ArrayType::new(5, 2)));
        manual.add_next(Type::Array(ArrayType::new(7, 1)));
        manual.add_next(Type::Float);

        let built = ArrayType::with_dimensions(&[2, 5, 7], Type::Float);
        assert_eq!(built, manual);
        assert_eq!(built.total_size(), 2 * 5 * 7 * 4);
    }

    #[test]
    fn test_oversized_array_does_not_overflow() {
        let huge = ArrayType::with_dimensions(&[70_000, 70_000], Type::Int);
        assert_eq!(huge.checked_total_size(), None);
        assert_eq!(huge.total_size(), u32::MAX);
        assert_eq!(Type::Array(huge).size(), u32::MAX);

        let matrix = ArrayType::with_dimensions(&[3, 4], Type::Int);
        assert_eq!(matrix.checked_total_size(), Some(48));
    }

    #[test]
    fn test_incomplete_chain() {
        let array = ArrayType::new(3, 1);
        assert_eq!(array.total_size(), 0);
        assert_eq!(array.base_type(), None);
    }

    #[test]
    fn test_struct_element_array() {
        let point = Type::Struct { name: "Point".to_string(), size: 12 };
        let array = ArrayType::with_dimensions(&[5], point.clone());
        assert_eq!(array.total_size(), 60);
        assert_eq!(array.base_type(), Some(&point));
    }

    #[test]
    fn test_array_equivalence() {
        let a = ArrayType::with_dimensions(&[3, 4], Type::Int);
        let b = ArrayType::with_dimensions(&[3, 4], Type::Int);
        let c = ArrayType::with_dimensions(&[3, 5], Type::Int);
        let d = ArrayType::with_dimensions(&[3, 4], Type::Float);

        assert!(a.is_equivalent(&b));
        assert!(!a.is_equivalent(&c));
        assert!(!a.is_equivalent(&d));
    }

    #[test]
    fn test_assignability() {
        assert!(Type::Float.is_assignable(&Type::Int));
        assert!(!Type::Int.is_assignable(&Type::Float));
        assert!(Type::pointer_to(Type::Int).is_assignable(&Type::Null));
        assert!(!Type::Bool.is_assignable(&Type::Int));

        let floats = Type::Array(ArrayType::with_dimensions(&[4], Type::Float));
        let ints = Type::Array(ArrayType::with_dimensions(&[4], Type::Int));
        assert!(floats.is_assignable(&ints));
        assert!(!ints.is_assignable(&floats));
    }

    #[test]
    fn test_names() {
        let matrix = Type::Array(ArrayType::with_dimensions(&[3, 4], Type::Int));
        assert_eq!(matrix.name(), "int[3][4]");
        assert_eq!(matrix.label_name(), "int$a3$a4");

        let ptr = Type::pointer_to(Type::Float);
        assert_eq!(ptr.name(), "float*");
        assert_eq!(ptr.label_name(), "float$p");
    }
}
