//! Definition records produced by an image loader.
//!
//! Records are immutable once their image is registered and shared behind `Arc`, so a
//! lookup hands out a cheap clone that outlives any lock on the table it came from.

use std::sync::Arc;

use crate::metadata::{
    attributes::{
        is_instance_method, is_interface, is_new_slot, is_sealed_type, is_virtual_method,
        MethodModifiers,
    },
    handle::MetadataHandle,
    typesystem::TypeId,
};

/// A reference to a type definition
pub type TypeDefinitionRc = Arc<TypeDefinition>;
/// A reference to a method definition
pub type MethodDefinitionRc = Arc<MethodDefinition>;
/// A reference to a field definition
pub type FieldDefinitionRc = Arc<FieldDefinition>;
/// A reference to a generic container
pub type GenericContainerRc = Arc<GenericContainer>;
/// A reference to a generic parameter
pub type GenericParameterRc = Arc<GenericParameter>;

/// A type declared by an image
#[derive(Debug, Clone)]
pub struct TypeDefinition {
    /// Handle of this definition
    pub handle: MetadataHandle,
    /// Namespace, empty for the global namespace
    pub namespace: String,
    /// Simple name, including the generic arity suffix
    pub name: String,
    /// `TypeAttributes` flag word
    pub flags: u32,
    /// True for value types and enums
    pub value_type: bool,
    /// True for enums
    pub enum_type: bool,
    /// Descriptor of the type used by value (`Class`/`ValueType` over this definition)
    pub byval_type: TypeId,
    /// Base type, `None` for `System.Object` and interfaces
    pub parent: Option<TypeId>,
    /// Generic parameters of the type, if it is generic
    pub generic_container: Option<MetadataHandle>,
    /// Declared fields in declaration order
    pub fields: Vec<MetadataHandle>,
    /// Declared methods in declaration order
    pub methods: Vec<MetadataHandle>,
}

impl TypeDefinition {
    /// `Namespace.Name`, or just the name in the global namespace
    #[must_use]
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Value type or enum
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        self.value_type
    }

    /// Enum, always a value type as well
    #[must_use]
    pub fn is_enum(&self) -> bool {
        self.enum_type
    }

    /// Interface type
    #[must_use]
    pub fn is_interface(&self) -> bool {
        is_interface(self.flags)
    }

    /// True if the type can not be derived from
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        is_sealed_type(self.flags)
    }
}

/// A method declared by a type
#[derive(Debug, Clone)]
pub struct MethodDefinition {
    /// Handle of this definition
    pub handle: MetadataHandle,
    /// Method name
    pub name: String,
    /// Handle of the declaring type definition
    pub declaring_type: MetadataHandle,
    /// `MethodAttributes` flag word
    pub flags: u32,
    /// Return type
    pub return_type: TypeId,
    /// Parameter types, without `this`
    pub params: Vec<TypeId>,
    /// Generic parameters of the method, if it is generic
    pub generic_container: Option<MetadataHandle>,
}

impl MethodDefinition {
    /// Number of arguments a call passes, `this` included
    #[must_use]
    pub fn actual_param_count(&self) -> usize {
        self.params.len() + usize::from(self.is_instance())
    }

    /// Method with a `this` argument
    #[must_use]
    pub fn is_instance(&self) -> bool {
        is_instance_method(self.flags)
    }

    /// Occupies or overrides a vtable slot
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        is_virtual_method(self.flags)
    }

    /// Always allocates a new vtable slot
    #[must_use]
    pub fn is_new_slot(&self) -> bool {
        is_new_slot(self.flags)
    }

    /// Can not be overridden
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.modifiers().contains(MethodModifiers::FINAL)
    }

    /// Typed view of the modifier bits
    #[must_use]
    pub fn modifiers(&self) -> MethodModifiers {
        MethodModifiers::from_method_flags(self.flags)
    }
}

/// A field declared by a type
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// Handle of this definition
    pub handle: MetadataHandle,
    /// Field name
    pub name: String,
    /// Handle of the declaring type definition
    pub declaring_type: MetadataHandle,
    /// Field type; its `attrs` carry the `FieldAttributes` flag word
    pub field_type: TypeId,
    /// `FieldAttributes` flag word
    pub flags: u32,
}

/// The generic parameter list of a type or method
#[derive(Debug, Clone)]
pub struct GenericContainer {
    /// Handle of this container
    pub handle: MetadataHandle,
    /// Handle of the owning type or method definition
    pub owner: MetadataHandle,
    /// True if `owner` is a method
    pub is_method: bool,
    /// Declared parameters, in position order
    pub params: Vec<MetadataHandle>,
}

impl GenericContainer {
    /// Number of declared parameters
    #[must_use]
    pub fn type_argc(&self) -> usize {
        self.params.len()
    }
}

/// One declared generic parameter
#[derive(Debug, Clone)]
pub struct GenericParameter {
    /// Handle of this parameter
    pub handle: MetadataHandle,
    /// Handle of the declaring container
    pub owner: MetadataHandle,
    /// Position inside the container
    pub num: u32,
    /// Parameter name
    pub name: String,
    /// `GenericParamAttributes` flag word
    pub flags: u16,
}
