// Copyright 2025 The hybridmeta Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # hybridmeta
//!
//! Metadata identity and member resolution for runtimes that execute ahead-of-time
//! compiled .NET code side by side with images loaded later into an interpreter.
//!
//! Both worlds share one handle space. A [`MetadataHandle`](metadata::handle::MetadataHandle)
//! is a packed 32-bit value whose image index tells which image owns the row, so a
//! handle taken from anywhere can be routed back to its definition. Types from all
//! images are interned in one arena, which makes type identity an id comparison and
//! lets an interpreter type inherit from an AOT type (and the other way round for
//! generic instantiations).
//!
//! ## Features
//!
//! - **Packed handles** - Four size classes trade image count against rows per image
//! - **Shared type arena** - Lock-free interning of descriptors and instantiations
//! - **Routed lookups** - One registry answers for the AOT image and every interpreter image
//! - **Generic inflation** - Substitution of class and method variables, recursively
//! - **Member resolution** - Fields and methods by name and signature, override detection
//!
//! ### Using the Prelude
//!
//! ```rust
//! use hybridmeta::prelude::*;
//!
//! let registry = MetadataRegistry::new();
//! let int = registry.primitive(ElementType::I4)?;
//!
//! let index = registry.allocate_image_index(8)?;
//! let mut builder = ImageBuilder::new(&registry, index, "Game.dll");
//! let player = builder.add_class("Game", "Player", TypeAttributes::PUBLIC)?;
//! builder.add_field(player, "score", int, FieldAttributes::PUBLIC)?;
//! let player_type = builder.type_of(player)?;
//! registry.register_image(builder.build())?;
//!
//! let resolver = MemberResolver::new(&registry);
//! assert!(resolver.find_field(player_type, "score", int)?.is_some());
//! assert!(resolver.find_field(player_type, "health", int)?.is_none());
//! # Ok::<(), hybridmeta::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`Result<T>`]. Lookups that may legitimately miss
//! (`find_*`, `lookup_*`) return `Option`, their strict counterparts (`resolve_*`,
//! `*_definition`) turn a miss into an [`Error`].
//!
//! ## Logging
//!
//! Resolution emits [`tracing`](https://docs.rs/tracing) events at `debug` and
//! `trace` level. Install any subscriber to see them.

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// ```rust
/// use hybridmeta::prelude::*;
///
/// let handle = MetadataHandle::encode(ImageIndex::AOT, 42);
/// assert_eq!(handle.local_index(), 42);
/// assert!(!handle.is_interpreter_origin());
/// ```
pub mod prelude;

/// Handles, images, the type system and member resolution.
///
/// Start with [`metadata::registry::MetadataRegistry`], register images built with
/// [`metadata::image::ImageBuilder`] (or any [`metadata::image::MetadataSource`]) and
/// resolve members through [`metadata::resolver::MemberResolver`].
pub mod metadata;

/// `hybridmeta` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `hybridmeta` Error type
///
/// The main error type for all operations in this crate.
///
/// # Example
///
/// ```rust
/// use hybridmeta::{prelude::*, Error};
///
/// let registry = MetadataRegistry::new();
/// let orphan = MetadataHandle::encode(ImageIndex::new(0x041), 1);
/// match registry.type_definition(orphan) {
///     Err(Error::ImageNotRegistered(index, _)) => assert_eq!(index.value(), 0x041),
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
pub use error::Error;
