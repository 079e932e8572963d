//! # hybridmeta Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the hybridmeta library. Import this module to get quick access to handles,
//! images, the registry and the resolver.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all hybridmeta operations
pub use crate::Error;

/// The result type used throughout hybridmeta
pub use crate::Result;

/// Tunables for resolution and interning
pub use crate::metadata::config::ResolverConfig;

// ================================================================================================
// Handles
// ================================================================================================

/// Packed handles and the image they belong to
pub use crate::metadata::handle::{ImageIndex, MetadataHandle, MetadataKind};

// ================================================================================================
// Flags and Attributes
// ================================================================================================

/// ECMA-335 flag constants
pub use crate::metadata::attributes::{
    FieldAttributes, MethodAttributes, PInvokeAttributes, SignatureFlags, TypeAttributes,
};

/// Decoded flag views
pub use crate::metadata::attributes::{CallConvention, CharSet, MemberAccess, TypeVisibility};

// ================================================================================================
// Type System
// ================================================================================================

/// Core type system components
pub use crate::metadata::typesystem::{
    shallow_eq, shallow_hash, ElementType, GenericContext, GenericInstId, TypeData,
    TypeDescriptor, TypeId,
};

/// Method signatures used as lookup keys
pub use crate::metadata::signatures::MethodSignature;

// ================================================================================================
// Definitions
// ================================================================================================

/// Entity definitions shared between images and resolution results
pub use crate::metadata::definitions::{
    FieldDefinition, FieldDefinitionRc, MethodDefinition, MethodDefinitionRc, TypeDefinition,
    TypeDefinitionRc,
};

// ================================================================================================
// Images and Registry
// ================================================================================================

/// Metadata sources and their construction
pub use crate::metadata::image::{Image, ImageBuilder, ImageIndexAllocator, MetadataSource};

/// The registry owning every image and the shared type arena
pub use crate::metadata::registry::MetadataRegistry;

// ================================================================================================
// Resolution
// ================================================================================================

/// Generic variable substitution
pub use crate::metadata::generics::{GenericInflator, InflatedMethod};

/// Field and method resolution
pub use crate::metadata::resolver::MemberResolver;
