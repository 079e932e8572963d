//! Attribute bitfields of types, methods, fields and P/Invoke maps.
//!
//! The raw flag words are stored untouched in the definitions; this module holds the
//! constants to test them, the cheap boolean predicates, and the decoders that map a
//! masked group of bits onto a closed enumeration (see [`CallConvention`], [`CharSet`],
//! [`MemberAccess`] and [`TypeVisibility`]). The predicates can not fail; the decoders
//! report patterns outside their enumeration as [`crate::Error::Malformed`].
//!
//! # Example
//!
//! ```rust
//! use hybridmeta::metadata::attributes::{
//!     is_new_slot, is_virtual_method, CallConvention, MethodAttributes, PInvokeAttributes,
//! };
//!
//! let flags = MethodAttributes::PUBLIC | MethodAttributes::VIRTUAL | MethodAttributes::NEW_SLOT;
//! assert!(is_virtual_method(flags));
//! assert!(is_new_slot(flags));
//!
//! let conv = CallConvention::from_pinvoke_flags(PInvokeAttributes::CALL_CONV_CDECL)?;
//! assert_eq!(conv, CallConvention::Cdecl);
//! # Ok::<(), hybridmeta::Error>(())
//! ```

mod decode;

use bitflags::bitflags;

pub use decode::{CallConvention, CharSet, MemberAccess, TypeVisibility};

use crate::metadata::typesystem::{ElementType, TypeDescriptor};

#[allow(non_snake_case)]
/// All possible flags for `TypeAttributes`
pub mod TypeAttributes {
    /// Use this mask to retrieve visibility information
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    /// Class has no public scope
    pub const NOT_PUBLIC: u32 = 0x0000_0000;
    /// Class has public scope
    pub const PUBLIC: u32 = 0x0000_0001;
    /// Class is nested with public visibility
    pub const NESTED_PUBLIC: u32 = 0x0000_0002;
    /// Class is nested with private visibility
    pub const NESTED_PRIVATE: u32 = 0x0000_0003;
    /// Class is nested with family visibility
    pub const NESTED_FAMILY: u32 = 0x0000_0004;
    /// Class is nested with assembly visibility
    pub const NESTED_ASSEMBLY: u32 = 0x0000_0005;
    /// Class is nested with family and assembly visibility
    pub const NESTED_FAM_AND_ASSEM: u32 = 0x0000_0006;
    /// Class is nested with family or assembly visibility
    pub const NESTED_FAM_OR_ASSEM: u32 = 0x0000_0007;
    /// Use this mask to retrieve class semantics information
    pub const CLASS_SEMANTICS_MASK: u32 = 0x0000_0020;
    /// Type is a class
    pub const CLASS: u32 = 0x0000_0000;
    /// Type is an interface
    pub const INTERFACE: u32 = 0x0000_0020;
    /// Class is abstract
    pub const ABSTRACT: u32 = 0x0000_0080;
    /// Class can not be extended
    pub const SEALED: u32 = 0x0000_0100;
    /// Class name is special
    pub const SPECIAL_NAME: u32 = 0x0000_0400;
    /// Class is imported
    pub const IMPORT: u32 = 0x0000_1000;
    /// Class is serializable
    pub const SERIALIZABLE: u32 = 0x0000_2000;
    /// Initialize the class before first static field access
    pub const BEFORE_FIELD_INIT: u32 = 0x0010_0000;
}

#[allow(non_snake_case)]
/// All possible flags for `MethodAttributes`
pub mod MethodAttributes {
    /// These 3 bits contain the member access
    pub const MEMBER_ACCESS_MASK: u32 = 0x0007;
    /// Member not referenceable
    pub const COMPILER_CONTROLLED: u32 = 0x0000;
    /// Accessible only by the parent type
    pub const PRIVATE: u32 = 0x0001;
    /// Accessible by sub-types only in this Assembly
    pub const FAM_AND_ASSEM: u32 = 0x0002;
    /// Accessibly by anyone in the Assembly
    pub const ASSEM: u32 = 0x0003;
    /// Accessible only by type and sub-types
    pub const FAMILY: u32 = 0x0004;
    /// Accessibly by sub-types anywhere, plus anyone in assembly
    pub const FAM_OR_ASSEM: u32 = 0x0005;
    /// Accessibly by anyone who has visibility to this scope
    pub const PUBLIC: u32 = 0x0006;
    /// Defined on type, else per instance
    pub const STATIC: u32 = 0x0010;
    /// Method can not be overridden
    pub const FINAL: u32 = 0x0020;
    /// Method is virtual
    pub const VIRTUAL: u32 = 0x0040;
    /// Method hides by name+sig, else just by name
    pub const HIDE_BY_SIG: u32 = 0x0080;
    /// Use this mask to retrieve vtable attributes
    pub const VTABLE_LAYOUT_MASK: u32 = 0x0100;
    /// Method reuses existing slot in vtable
    pub const REUSE_SLOT: u32 = 0x0000;
    /// Method always gets a new slot in the vtable
    pub const NEW_SLOT: u32 = 0x0100;
    /// Method can only be overriden if also accessible
    pub const STRICT: u32 = 0x0200;
    /// Method does not provide an implementation
    pub const ABSTRACT: u32 = 0x0400;
    /// Method is special
    pub const SPECIAL_NAME: u32 = 0x0800;
    /// Implementation is forwarded through `PInvoke`
    pub const PINVOKE_IMPL: u32 = 0x2000;
    /// CLI provides 'special' behavior, depending upon the name of the method
    pub const RTSPECIAL_NAME: u32 = 0x1000;
}

#[allow(non_snake_case)]
/// All possible flags for `FieldAttributes`
pub mod FieldAttributes {
    /// These 3 bits contain the member access
    pub const FIELD_ACCESS_MASK: u32 = 0x0007;
    /// Accessible only by the parent type
    pub const PRIVATE: u32 = 0x0001;
    /// Accessibly by anyone in the Assembly
    pub const ASSEMBLY: u32 = 0x0003;
    /// Accessible only by type and sub-types
    pub const FAMILY: u32 = 0x0004;
    /// Accessibly by anyone who has visibility to this scope
    pub const PUBLIC: u32 = 0x0006;
    /// Defined on type, else per instance
    pub const STATIC: u32 = 0x0010;
    /// Field can only be initialized, not written to after init
    pub const INIT_ONLY: u32 = 0x0020;
    /// Value is compile time constant
    pub const LITERAL: u32 = 0x0040;
    /// Field has RVA
    pub const HAS_FIELD_RVA: u32 = 0x0100;
    /// Field is special
    pub const SPECIAL_NAME: u32 = 0x0200;
    /// CLI provides 'special' behavior, depending upon the name of the field
    pub const RTSPECIAL_NAME: u32 = 0x0400;
    /// Field has default
    pub const HAS_DEFAULT: u32 = 0x8000;
}

#[allow(non_snake_case)]
/// All possible flags for `PInvokeAttributes`
pub mod PInvokeAttributes {
    /// `PInvoke` is to use the member name as specified
    pub const NO_MANGLE: u32 = 0x0001;
    /// Character set mask
    pub const CHAR_SET_MASK: u32 = 0x0006;
    /// No character set was specified
    pub const CHAR_SET_NOT_SPEC: u32 = 0x0000;
    /// Strings are marshalled as ANSI
    pub const CHAR_SET_ANSI: u32 = 0x0002;
    /// Strings are marshalled as UTF-16
    pub const CHAR_SET_UNICODE: u32 = 0x0004;
    /// Platform picks the character set
    pub const CHAR_SET_AUTO: u32 = 0x0006;
    /// Information about target function. Not relevant for fields
    pub const SUPPORTS_LAST_ERROR: u32 = 0x0040;
    /// Calling convention mask
    pub const CALL_CONV_MASK: u32 = 0x0700;
    /// Calling convention = `WinAPI`
    pub const CALL_CONV_WINAPI: u32 = 0x0100;
    /// Calling convention = C
    pub const CALL_CONV_CDECL: u32 = 0x0200;
    /// Calling convention = `StdCall`
    pub const CALL_CONV_STDCALL: u32 = 0x0300;
    /// Calling convention = `ThisCall`
    pub const CALL_CONV_THISCALL: u32 = 0x0400;
    /// Calling convention = `FastCall`
    pub const CALL_CONV_FASTCALL: u32 = 0x0500;
}

#[allow(non_snake_case)]
/// Calling convention byte that starts a method signature (II.23.2.1)
pub mod SignatureFlags {
    /// Default managed calling convention
    pub const DEFAULT: u8 = 0x00;
    /// Variable argument list
    pub const VARARG: u8 = 0x05;
    /// Method has generic parameters
    pub const GENERIC: u8 = 0x10;
    /// Method has a `this` argument
    pub const HAS_THIS: u8 = 0x20;
    /// The `this` argument is listed explicitly
    pub const EXPLICIT_THIS: u8 = 0x40;
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method modifiers and properties, the non-access part of `MethodAttributes`
    pub struct MethodModifiers: u32 {
        /// Defined on type, else per instance
        const STATIC = MethodAttributes::STATIC;
        /// Method cannot be overridden
        const FINAL = MethodAttributes::FINAL;
        /// Method is virtual
        const VIRTUAL = MethodAttributes::VIRTUAL;
        /// Method hides by name+sig, else just by name
        const HIDE_BY_SIG = MethodAttributes::HIDE_BY_SIG;
        /// Method always gets a new slot in the vtable
        const NEW_SLOT = MethodAttributes::NEW_SLOT;
        /// Method can only be overriden if also accessible
        const STRICT = MethodAttributes::STRICT;
        /// Method does not provide an implementation
        const ABSTRACT = MethodAttributes::ABSTRACT;
        /// Method is special
        const SPECIAL_NAME = MethodAttributes::SPECIAL_NAME;
        /// Implementation is forwarded through PInvoke
        const PINVOKE_IMPL = MethodAttributes::PINVOKE_IMPL;
        /// CLI provides 'special' behavior, dpending upon the name of the method
        const RTSPECIAL_NAME = MethodAttributes::RTSPECIAL_NAME;
    }
}

impl MethodModifiers {
    /// Extract method modifiers from raw method attributes
    #[must_use]
    pub fn from_method_flags(flags: u32) -> Self {
        Self::from_bits_truncate(flags & !MethodAttributes::MEMBER_ACCESS_MASK)
    }
}

/// Method is declared `static`
#[must_use]
pub fn is_static_method(flags: u32) -> bool {
    flags & MethodAttributes::STATIC != 0
}

/// Method takes a `this` argument
#[must_use]
pub fn is_instance_method(flags: u32) -> bool {
    !is_static_method(flags)
}

/// Method has private access
#[must_use]
pub fn is_private_method(flags: u32) -> bool {
    flags & MethodAttributes::MEMBER_ACCESS_MASK == MethodAttributes::PRIVATE
}

/// Method has public access
#[must_use]
pub fn is_public_method(flags: u32) -> bool {
    flags & MethodAttributes::MEMBER_ACCESS_MASK == MethodAttributes::PUBLIC
}

/// Method occupies a vtable slot
#[must_use]
pub fn is_virtual_method(flags: u32) -> bool {
    flags & MethodAttributes::VIRTUAL != 0
}

/// Method has no body
#[must_use]
pub fn is_abstract_method(flags: u32) -> bool {
    flags & MethodAttributes::ABSTRACT != 0
}

/// Method always starts a new vtable slot and never overrides
#[must_use]
pub fn is_new_slot(flags: u32) -> bool {
    flags & MethodAttributes::NEW_SLOT != 0
}

/// Method is `final` and can not be overridden further
#[must_use]
pub fn is_final_method(flags: u32) -> bool {
    flags & MethodAttributes::FINAL != 0
}

/// Type flags describe an interface
#[must_use]
pub fn is_interface(type_flags: u32) -> bool {
    type_flags & TypeAttributes::INTERFACE != 0
}

/// Type flags forbid deriving from the type
#[must_use]
pub fn is_sealed_type(type_flags: u32) -> bool {
    type_flags & TypeAttributes::SEALED != 0
}

/// Method is implemented through P/Invoke
#[must_use]
pub fn is_pinvoke_method(flags: u32) -> bool {
    flags & MethodAttributes::PINVOKE_IMPL != 0
}

/// P/Invoke entry point name must not be mangled
#[must_use]
pub fn is_dll_import_no_mangle(mapping_flags: u32) -> bool {
    mapping_flags & PInvokeAttributes::NO_MANGLE != 0
}

/// P/Invoke target records the last OS error
#[must_use]
pub fn supports_last_error(mapping_flags: u32) -> bool {
    mapping_flags & PInvokeAttributes::SUPPORTS_LAST_ERROR != 0
}

/// Signature calling convention carries a `this` argument
#[must_use]
pub fn is_prolog_has_this(flags: u8) -> bool {
    flags & SignatureFlags::HAS_THIS != 0
}

/// Signature lists the `this` argument explicitly
#[must_use]
pub fn is_prolog_explicit_this(flags: u8) -> bool {
    flags & SignatureFlags::EXPLICIT_THIS != 0
}

/// Field descriptor belongs to an instance field (attributes live on the field's type)
#[must_use]
pub fn is_instance_field(field_type: &TypeDescriptor) -> bool {
    field_type.attrs & FieldAttributes::STATIC == 0
}

/// Descriptor is an instantiated generic type
#[must_use]
pub fn is_generic_inst(ty: &TypeDescriptor) -> bool {
    ty.kind == ElementType::GenericInst
}

/// Descriptor is `void`
#[must_use]
pub fn is_void_type(ty: &TypeDescriptor) -> bool {
    ty.kind == ElementType::Void
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{handle::MetadataHandle, typesystem::TypeData};

    #[test]
    fn test_method_predicates() {
        let flags = MethodAttributes::PUBLIC
            | MethodAttributes::VIRTUAL
            | MethodAttributes::ABSTRACT
            | MethodAttributes::NEW_SLOT;
        assert!(is_public_method(flags));
        assert!(!is_private_method(flags));
        assert!(is_virtual_method(flags));
        assert!(is_abstract_method(flags));
        assert!(is_new_slot(flags));
        assert!(!is_final_method(flags));
        assert!(is_instance_method(flags));
        assert!(!is_pinvoke_method(flags));

        let flags = MethodAttributes::PRIVATE | MethodAttributes::STATIC | MethodAttributes::PINVOKE_IMPL;
        assert!(is_private_method(flags));
        assert!(is_static_method(flags));
        assert!(!is_instance_method(flags));
        assert!(is_pinvoke_method(flags));
        assert!(is_final_method(MethodAttributes::FINAL));
    }

    #[test]
    fn test_method_modifiers() {
        let flags = MethodAttributes::FAMILY | MethodAttributes::VIRTUAL | MethodAttributes::FINAL;
        let modifiers = MethodModifiers::from_method_flags(flags);
        assert_eq!(modifiers, MethodModifiers::VIRTUAL | MethodModifiers::FINAL);
        assert!(!modifiers.contains(MethodModifiers::NEW_SLOT));
    }

    #[test]
    fn test_type_and_pinvoke_predicates() {
        let interface = TypeAttributes::INTERFACE | TypeAttributes::ABSTRACT;
        let sealed = TypeAttributes::PUBLIC | TypeAttributes::SEALED;
        assert!(is_interface(interface));
        assert!(!is_interface(sealed));
        // INTERFACE shares its bit with the method FINAL flag
        assert!(!is_sealed_type(interface));
        assert!(is_sealed_type(sealed));

        let mapping = PInvokeAttributes::NO_MANGLE
            | PInvokeAttributes::SUPPORTS_LAST_ERROR
            | PInvokeAttributes::CALL_CONV_CDECL;
        assert!(is_dll_import_no_mangle(mapping));
        assert!(supports_last_error(mapping));
        assert!(!is_dll_import_no_mangle(PInvokeAttributes::CALL_CONV_WINAPI));
    }

    #[test]
    fn test_prolog_flags() {
        assert!(is_prolog_has_this(SignatureFlags::HAS_THIS));
        assert!(!is_prolog_explicit_this(SignatureFlags::HAS_THIS));
        assert!(is_prolog_explicit_this(SignatureFlags::HAS_THIS | SignatureFlags::EXPLICIT_THIS));
        assert!(!is_prolog_has_this(SignatureFlags::DEFAULT));
    }

    #[test]
    fn test_descriptor_predicates() {
        let instance = TypeDescriptor::new(ElementType::I4, TypeData::None)
            .with_attrs(FieldAttributes::PUBLIC);
        let stat = instance.with_attrs(FieldAttributes::PUBLIC | FieldAttributes::STATIC);
        assert!(is_instance_field(&instance));
        assert!(!is_instance_field(&stat));
        assert!(!is_generic_inst(&instance));

        let class = TypeDescriptor::new(
            ElementType::Class,
            TypeData::Definition(MetadataHandle::from_raw(3)),
        );
        assert!(!is_generic_inst(&class));
        assert!(!is_void_type(&class));
        assert!(is_void_type(&TypeDescriptor::new(ElementType::Void, TypeData::None)));
    }
}
