//! Storage descriptors handed to the emitter
//!
//! A `Sto` describes one value-producing entity (variable, temporary,
//! literal constant) after the front end has resolved its type and storage
//! layout. A `FuncSto` describes a function or struct method.

use crate::error::CompilerError;
use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base register of a memory operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Base {
    /// `%g0`, used with a symbol displacement for globals and statics
    G0,
    /// `%fp`, locals and parameters
    Fp,
    /// `%sp`, outgoing argument area
    Sp,
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Base::G0 => write!(f, "%g0"),
            Base::Fp => write!(f, "%fp"),
            Base::Sp => write!(f, "%sp"),
        }
    }
}

/// Displacement added to the base register
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Displacement {
    Const(i32),
    Symbol(String),
}

impl fmt::Display for Displacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Displacement::Const(n) => write!(f, "{n}"),
            Displacement::Symbol(s) => write!(f, "{s}"),
        }
    }
}

/// `base + offset` memory operand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub base: Base,
    pub offset: Displacement,
}

impl Address {
    pub fn frame(offset: i32) -> Self {
        Self { base: Base::Fp, offset: Displacement::Const(offset) }
    }

    pub fn global(symbol: &str) -> Self {
        Self { base: Base::G0, offset: Displacement::Symbol(symbol.to_string()) }
    }

    /// Whether this names a global or static symbol
    pub fn is_global(&self) -> bool {
        matches!(self.offset, Displacement::Symbol(_))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.offset {
            Displacement::Const(n) if *n < 0 => write!(f, "{}{}", self.base, n),
            offset => write!(f, "{}+{}", self.base, offset),
        }
    }
}

/// Literal constant value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i32),
    Float(f32),
    Bool(bool),
    Str(String),
}

impl Literal {
    /// Integer bit pattern for int and bool literals
    pub fn as_word(&self) -> Option<i32> {
        match self {
            Literal::Int(v) => Some(*v),
            Literal::Bool(b) => Some(*b as i32),
            _ => None,
        }
    }

    pub fn literal_type(&self) -> Type {
        match self {
            Literal::Int(_) => Type::Int,
            Literal::Float(_) => Type::Float,
            Literal::Bool(_) => Type::Bool,
            // String constants only appear as print operands.
            Literal::Str(_) => Type::Void,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Float(v) => write!(f, "{v:?}"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// Where a descriptor's value comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Location {
    Literal(Literal),
    Memory(Address),
    /// Storage layout not finalized yet
    Unallocated,
}

/// Why an indirect slot holds an address instead of a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Indirection {
    /// Reference parameter, reference return or by-reference foreach variable
    Reference,
    /// Result of an array index expression
    ArrayElement,
    /// Result of a struct member access
    StructField { struct_name: String, offset: u32 },
    /// Result of a pointer dereference
    Deref,
}

/// How the slot at a descriptor's address relates to its value
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Storage {
    /// The value lives at the address
    #[default]
    Direct,
    /// The address holds a pointer to the value
    Indirect(Indirection),
}

impl Storage {
    pub fn is_indirect(&self) -> bool {
        matches!(self, Storage::Indirect(_))
    }
}

/// Storage descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sto {
    pub name: String,
    pub ty: Type,
    pub location: Location,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub addressable: bool,
    #[serde(default)]
    pub modifiable: bool,
}

impl Sto {
    pub fn new(name: &str, ty: Type, location: Location) -> Self {
        Self {
            name: name.to_string(),
            ty,
            location,
            storage: Storage::Direct,
            addressable: false,
            modifiable: false,
        }
    }

    /// Global or static variable labelled `symbol`
    pub fn global(name: &str, ty: Type) -> Self {
        Self::new(name, ty, Location::Memory(Address::global(name))).as_variable()
    }

    /// Frame-allocated variable at `%fp + offset`
    pub fn local(name: &str, ty: Type, offset: i32) -> Self {
        Self::new(name, ty, Location::Memory(Address::frame(offset))).as_variable()
    }

    /// Compiler temporary at `%fp + offset`
    pub fn temp(name: &str, ty: Type, offset: i32) -> Self {
        Self::new(name, ty, Location::Memory(Address::frame(offset)))
    }

    pub fn literal(value: Literal) -> Self {
        let name = value.to_string();
        let ty = value.literal_type();
        Self::new(&name, ty, Location::Literal(value))
    }

    pub fn int(value: i32) -> Self {
        Self::literal(Literal::Int(value))
    }

    pub fn float(value: f32) -> Self {
        Self::literal(Literal::Float(value))
    }

    pub fn bool(value: bool) -> Self {
        Self::literal(Literal::Bool(value))
    }

    pub fn string(value: &str) -> Self {
        let mut sto = Self::literal(Literal::Str(value.to_string()));
        sto.name = value.to_string();
        sto
    }

    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.storage = storage;
        self
    }

    /// Mark as an addressable, modifiable variable
    pub fn as_variable(mut self) -> Self {
        self.addressable = true;
        self.modifiable = true;
        self
    }

    pub fn is_mod_lvalue(&self) -> bool {
        self.addressable && self.modifiable
    }

    pub fn literal_value(&self) -> Option<&Literal> {
        match &self.location {
            Location::Literal(value) => Some(value),
            _ => None,
        }
    }

    pub fn memory(&self) -> Option<&Address> {
        match &self.location {
            Location::Memory(address) => Some(address),
            _ => None,
        }
    }

    /// Textual `base+offset`, empty for literals and unallocated descriptors
    pub fn address(&self) -> String {
        self.memory().map(Address::to_string).unwrap_or_default()
    }

    pub fn is_indirect(&self) -> bool {
        self.storage.is_indirect()
    }

    /// Validate that the tag bits and location agree
    pub fn check(&self) -> Result<(), CompilerError> {
        match (&self.location, &self.storage) {
            (Location::Literal(_), Storage::Indirect(_)) => Err(CompilerError::invalid_descriptor(
                &self.name,
                "a literal cannot be an indirect slot",
            )),
            (Location::Unallocated, _) => Err(CompilerError::invalid_descriptor(
                &self.name,
                "storage has not been allocated",
            )),
            _ => match &self.ty {
                Type::Array(array) if array.checked_total_size().is_none() => Err(
                    CompilerError::invalid_descriptor(&self.name, "array size does not fit in 32 bits"),
                ),
                _ => Ok(()),
            },
        }
    }
}

/// Function descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncSto {
    pub name: String,
    pub return_type: Type,
    #[serde(default)]
    pub params: Vec<Sto>,
    /// Owning struct for methods, constructors and destructors
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub overloaded: bool,
    #[serde(default)]
    pub is_extern: bool,
    #[serde(default)]
    pub returns_ref: bool,
}

impl FuncSto {
    pub fn new(name: &str, return_type: Type) -> Self {
        Self {
            name: name.to_string(),
            return_type,
            params: Vec::new(),
            owner: None,
            overloaded: false,
            is_extern: false,
            returns_ref: false,
        }
    }

    pub fn with_param(mut self, param: Sto) -> Self {
        self.params.push(param);
        self
    }

    pub fn method_of(mut self, owner: &str) -> Self {
        self.owner = Some(owner.to_string());
        self
    }

    pub fn is_method(&self) -> bool {
        self.owner.is_some()
    }

    /// Dot-joined parameter type names, `void` without parameters
    pub fn assembly_name(&self) -> String {
        if self.params.is_empty() {
            return "void".to_string();
        }
        self.params
            .iter()
            .map(|param| param.ty.label_name())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Linker-visible label, unique per overload
    pub fn label(&self) -> String {
        if self.is_extern {
            return self.name.clone();
        }
        match &self.owner {
            Some(owner) => format!("{}.{}.{}", owner, self.name, self.assembly_name()),
            None => format!("{}.{}", self.name, self.assembly_name()),
        }
    }

    /// Frame-size patch symbol
    pub fn save_symbol(&self) -> String {
        format!("SAVE.{}", self.label())
    }

    /// Shared teardown trampoline label
    pub fn fini_label(&self) -> String {
        format!("{}.fini", self.label())
    }

    pub fn is_main(&self) -> bool {
        self.name == "main" && self.owner.is_none()
    }
}
