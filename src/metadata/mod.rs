//! Hybrid metadata handles, type identities and member resolution.
//!
//! A process hosts one ahead-of-time compiled image plus any number of images loaded
//! later for the interpreter. Every metadata handle encodes which image it came from,
//! so lookups are routed without a side table, and all images share one type arena so
//! structurally equal types compare by id.
//!
//! # Key Components
//!
//! - [`handle`] - Packed handles and image indices
//! - [`attributes`] - ECMA-335 flag constants and predicates
//! - [`typesystem`] - Type descriptors, generic instantiations and the interning arena
//! - [`image`] - The per-image metadata source, builder and index allocator
//! - [`registry`] - Image registration, routed lookups and type equality
//! - [`generics`] - Substitution of generic variables
//! - [`resolver`] - Field and method resolution, signature matching and overrides
//!
//! # Examples
//!
//! ```rust
//! use hybridmeta::prelude::*;
//!
//! let registry = MetadataRegistry::new();
//! let int = registry.primitive(ElementType::I4)?;
//!
//! let index = registry.allocate_image_index(4)?;
//! let mut builder = ImageBuilder::new(&registry, index, "Shapes.dll");
//! let square = builder.add_class("Shapes", "Square", TypeAttributes::PUBLIC)?;
//! let side = builder.add_field(square, "side", int, FieldAttributes::PUBLIC)?;
//! let square_type = builder.type_of(square)?;
//! registry.register_image(builder.build())?;
//!
//! let resolver = MemberResolver::new(&registry);
//! let field = resolver.resolve_field(square_type, "side", int)?;
//! assert_eq!(field.handle, side);
//! assert!(side.is_interpreter_origin());
//! # Ok::<(), hybridmeta::Error>(())
//! ```

/// Metadata flag constants, decoded views and predicates
pub mod attributes;
/// Tunables for resolution and interning
pub mod config;
/// Type, method, field and generic parameter definitions
pub mod definitions;
/// Inflation of generic variables with instantiation arguments
pub mod generics;
/// Packed metadata handles and image indices
pub mod handle;
/// Metadata images, their builder and the image index allocator
pub mod image;
/// The registry owning all images and the shared type arena
pub mod registry;
/// Field and method lookup, signature matching and override detection
pub mod resolver;
/// Method signatures used as lookup keys
pub mod signatures;
/// Type descriptors, generic instantiations and interning
pub mod typesystem;
