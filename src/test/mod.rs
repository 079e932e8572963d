//! Shared fixtures for unit tests.
//!
//! The factories build small registries with hand-made images, so tests across modules
//! resolve against the same well-known shapes.

pub(crate) mod factories;
