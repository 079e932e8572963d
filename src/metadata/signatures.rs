//! Requested method signatures.
//!
//! A [`MethodSignature`] is what a member reference asks for: the calling convention
//! prolog byte, the generic arity and the return and parameter types. Generic variables
//! inside a requested signature are usually positional (`TypeData::GenericIndex`), since
//! a reference only knows "the first type argument", not which declaration it came from.

use crate::metadata::{
    attributes::{is_prolog_explicit_this, is_prolog_has_this, SignatureFlags},
    typesystem::TypeId,
};

/// Signature of a method as requested by a member reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    /// Calling convention prolog byte (`SignatureFlags`)
    pub flags: u8,
    /// Number of method generic parameters
    pub generic_param_count: u32,
    /// Return type
    pub return_type: TypeId,
    /// Parameter types, without `this`
    pub params: Vec<TypeId>,
}

impl MethodSignature {
    /// A signature with an explicit prolog byte
    #[must_use]
    pub fn new(flags: u8, return_type: TypeId, params: Vec<TypeId>) -> Self {
        MethodSignature {
            flags,
            generic_param_count: 0,
            return_type,
            params,
        }
    }

    /// An instance method signature (`HAS_THIS`)
    #[must_use]
    pub fn instance(return_type: TypeId, params: Vec<TypeId>) -> Self {
        Self::new(SignatureFlags::HAS_THIS, return_type, params)
    }

    /// A static method signature
    #[must_use]
    pub fn static_method(return_type: TypeId, params: Vec<TypeId>) -> Self {
        Self::new(SignatureFlags::DEFAULT, return_type, params)
    }

    /// Copy declaring `count` method generic parameters
    #[must_use]
    pub fn with_generic_params(mut self, count: u32) -> Self {
        self.generic_param_count = count;
        if count > 0 {
            self.flags |= SignatureFlags::GENERIC;
        } else {
            self.flags &= !SignatureFlags::GENERIC;
        }
        self
    }

    /// True if the callee receives `this`
    #[must_use]
    pub fn has_this(&self) -> bool {
        is_prolog_has_this(self.flags)
    }

    /// True if `this` is spelled out as the first parameter
    #[must_use]
    pub fn explicit_this(&self) -> bool {
        is_prolog_explicit_this(self.flags)
    }
}
