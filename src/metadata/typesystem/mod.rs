//! Runtime type descriptors shared by AOT and interpreter metadata.
//!
//! A [`TypeDescriptor`] is the small fixed record the runtime passes around for every
//! use of a type: the element type, a [`TypeData`] payload, the attribute bits of the
//! place it is used in (field, parameter) and the by-reference/pinned flags. Descriptors
//! never hold pointers; they live in an append-only [`TypeArena`] and are addressed by
//! stable [`TypeId`]s. Generic instantiations are split the same way into
//! [`GenericInst`] (argument lists) and [`GenericClass`] (definition + arguments).
//!
//! # Key Components
//!
//! - [`ElementType`]: The element type tag of a descriptor (ECMA-335 II.23.1.16)
//! - [`TypeData`]: What the descriptor points at (definition, generic parameter, element type, ...)
//! - [`TypeArena`]: Append-only, lock-free storage with optional interning
//! - [`TypeKey`], [`shallow_hash`], [`shallow_eq`]: Shallow identity for cache keys
//! - [`GenericContext`]: Class and method arguments a reference is inflated against

mod arena;
mod hash;

use std::fmt;

use strum::{EnumCount, EnumIter, FromRepr, IntoStaticStr};

pub use arena::TypeArena;
pub use hash::{shallow_eq, shallow_hash, ShallowTypeHash, TypeKey};

use crate::{metadata::handle::MetadataHandle, Error, Result};

/// Element type tag of a type descriptor, encoded as in ECMA-335 signatures
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    EnumCount,
    FromRepr,
    IntoStaticStr,
)]
#[repr(u8)]
pub enum ElementType {
    /// void
    Void = 0x01,
    /// bool
    Boolean = 0x02,
    /// char
    Char = 0x03,
    /// signed 8bit integer
    I1 = 0x04,
    /// unsigned 8bit integer
    U1 = 0x05,
    /// signed 16bit integer
    I2 = 0x06,
    /// unsigned 16bit integer
    U2 = 0x07,
    /// signed 32bit integer
    I4 = 0x08,
    /// unsigned 32bit integer
    U4 = 0x09,
    /// signed 64bit integer
    I8 = 0x0a,
    /// unsigned 64bit integer
    U8 = 0x0b,
    /// 32bit floating-point
    R4 = 0x0c,
    /// 64bit floating-point
    R8 = 0x0d,
    /// System.String
    String = 0x0e,
    /// Unmanaged pointer, followed by the element type
    Ptr = 0x0f,
    /// Value type definition
    ValueType = 0x11,
    /// Class definition
    Class = 0x12,
    /// Generic parameter of a type
    Var = 0x13,
    /// Multi-dimensional array
    Array = 0x14,
    /// Instantiated generic type
    GenericInst = 0x15,
    /// Typed reference
    TypedByRef = 0x16,
    /// Native signed integer
    I = 0x18,
    /// Native unsigned integer
    U = 0x19,
    /// Function pointer
    FnPtr = 0x1b,
    /// System.Object
    Object = 0x1c,
    /// Single dimension, zero based array
    SzArray = 0x1d,
    /// Generic parameter of a method
    MVar = 0x1e,
}

impl ElementType {
    /// Element types whose descriptor carries no payload
    #[must_use]
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            ElementType::Void
                | ElementType::Boolean
                | ElementType::Char
                | ElementType::I1
                | ElementType::U1
                | ElementType::I2
                | ElementType::U2
                | ElementType::I4
                | ElementType::U4
                | ElementType::I8
                | ElementType::U8
                | ElementType::R4
                | ElementType::R8
                | ElementType::String
                | ElementType::TypedByRef
                | ElementType::I
                | ElementType::U
                | ElementType::FnPtr
                | ElementType::Object
        )
    }

    /// `Var` or `MVar`
    #[must_use]
    pub fn is_generic_param(self) -> bool {
        matches!(self, ElementType::Var | ElementType::MVar)
    }
}

impl TryFrom<u8> for ElementType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        ElementType::from_repr(value)
            .ok_or_else(|| malformed_error!("Unknown element type - 0x{:02x}", value))
    }
}

/// Index of a [`TypeDescriptor`] inside a [`TypeArena`]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    /// Position inside the arena
    #[must_use]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a [`GenericInst`] inside a [`TypeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenericInstId(pub(crate) u32);

/// Index of a [`GenericClass`] inside a [`TypeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenericClassId(pub(crate) u32);

/// Payload of a [`TypeDescriptor`]; which variant is used follows from the element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeData {
    /// Primitive types carry nothing
    #[default]
    None,
    /// `Class` / `ValueType`: handle of the type definition
    Definition(MetadataHandle),
    /// `Var` / `MVar` bound to a declared generic parameter
    GenericParam(MetadataHandle),
    /// `Var` / `MVar` from a member reference signature, only the position is known
    GenericIndex(u32),
    /// `Ptr` / `SzArray`: the element type
    Element(TypeId),
    /// `Array`: element type and rank
    Array {
        /// The element type
        element: TypeId,
        /// Number of dimensions
        rank: u32,
    },
    /// `GenericInst`: definition and arguments
    GenericClass(GenericClassId),
}

impl TypeData {
    /// Flat integer form of the payload, the "data handle" of shallow identity.
    ///
    /// Positional generic indices set bit 63 so they never collide with the handle of a
    /// declared generic parameter.
    #[must_use]
    pub fn raw(&self) -> u64 {
        match *self {
            TypeData::None => 0,
            TypeData::Definition(handle) | TypeData::GenericParam(handle) => {
                u64::from(handle.raw() as u32)
            }
            TypeData::GenericIndex(position) => (1 << 63) | u64::from(position),
            TypeData::Element(element) => u64::from(element.0),
            TypeData::Array { element, rank } => (u64::from(rank) << 32) | u64::from(element.0),
            TypeData::GenericClass(class) => u64::from(class.0),
        }
    }
}

/// One use of a type: element type, payload, use-site attributes and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    /// What the descriptor points at
    pub data: TypeData,
    /// Attributes of the use site (e.g. `FieldAttributes` for a field's type)
    pub attrs: u32,
    /// The element type tag
    pub kind: ElementType,
    /// Passed by reference
    pub byref: bool,
    /// Pinned local
    pub pinned: bool,
}

impl TypeDescriptor {
    /// A descriptor without attributes or flags
    #[must_use]
    pub fn new(kind: ElementType, data: TypeData) -> Self {
        TypeDescriptor {
            data,
            attrs: 0,
            kind,
            byref: false,
            pinned: false,
        }
    }

    /// Copy with different use-site attributes
    #[must_use]
    pub fn with_attrs(mut self, attrs: u32) -> Self {
        self.attrs = attrs;
        self
    }

    /// Copy with a different by-reference flag
    #[must_use]
    pub fn with_byref(mut self, byref: bool) -> Self {
        self.byref = byref;
        self
    }

    /// Copy with a different pinned flag
    #[must_use]
    pub fn with_pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    /// Inline copy of the shallow identity fields
    #[must_use]
    pub fn key(&self) -> TypeKey {
        TypeKey::from(self)
    }
}

/// Argument list of a generic instantiation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenericInst {
    /// Bound arguments in declaration order
    pub args: Vec<TypeId>,
}

impl GenericInst {
    /// Number of arguments
    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// True if there are no arguments
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// A generic type definition together with its class arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenericClass {
    /// Handle of the generic type definition
    pub definition: MetadataHandle,
    /// The class arguments
    pub class_inst: GenericInstId,
}

/// Arguments a reference is inflated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GenericContext {
    /// Arguments for `Var` slots
    pub class_inst: Option<GenericInstId>,
    /// Arguments for `MVar` slots
    pub method_inst: Option<GenericInstId>,
}

impl GenericContext {
    /// Context binding only class variables
    #[must_use]
    pub fn for_class(class_inst: GenericInstId) -> Self {
        GenericContext {
            class_inst: Some(class_inst),
            method_inst: None,
        }
    }

    /// Copy with method arguments added
    #[must_use]
    pub fn with_method_inst(mut self, method_inst: GenericInstId) -> Self {
        self.method_inst = Some(method_inst);
        self
    }

    /// True if nothing is bound
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.class_inst.is_none() && self.method_inst.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_element_type_from_byte() {
        for kind in ElementType::iter() {
            assert_eq!(ElementType::try_from(kind as u8).unwrap(), kind);
        }
        assert!(matches!(
            ElementType::try_from(0x10),
            Err(Error::Malformed { .. })
        ));
        assert!(ElementType::try_from(0x00).is_err());
        assert!(ElementType::try_from(0x45).is_err());
    }

    #[test]
    fn test_primitive_classification() {
        assert!(ElementType::I4.is_primitive());
        assert!(ElementType::Object.is_primitive());
        assert!(!ElementType::Class.is_primitive());
        assert!(!ElementType::GenericInst.is_primitive());
        assert!(ElementType::MVar.is_generic_param());
        assert!(!ElementType::SzArray.is_generic_param());
    }

    #[test]
    fn test_raw_data_is_distinct_per_payload() {
        let param = TypeData::GenericParam(MetadataHandle::from_raw(2));
        let index = TypeData::GenericIndex(2);
        assert_ne!(param.raw(), index.raw());

        let a = TypeData::Array {
            element: TypeId(4),
            rank: 2,
        };
        let b = TypeData::Array {
            element: TypeId(4),
            rank: 3,
        };
        assert_ne!(a.raw(), b.raw());
        assert_eq!(TypeData::None.raw(), 0);
    }

    #[test]
    fn test_descriptor_builders() {
        let base = TypeDescriptor::new(ElementType::I4, TypeData::None);
        let byref = base.with_byref(true).with_attrs(0x10);
        assert!(!base.byref);
        assert!(byref.byref);
        assert_eq!(byref.attrs, 0x10);
        assert!(byref.with_pinned(true).pinned);
    }

    #[test]
    fn test_generic_context() {
        let empty = GenericContext::default();
        assert!(empty.is_empty());

        let ctx = GenericContext::for_class(GenericInstId(1)).with_method_inst(GenericInstId(2));
        assert_eq!(ctx.class_inst, Some(GenericInstId(1)));
        assert_eq!(ctx.method_inst, Some(GenericInstId(2)));
        assert!(!ctx.is_empty());
    }
}
