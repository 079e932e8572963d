//! Resolver configuration
//!
//! This module provides the knobs a host can turn on the resolution layer: how deep
//! generic substitution may recurse, whether descriptors created during inflation are
//! deduplicated, and how strictly method signatures are compared.

/// Configuration for generic inflation and member resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Maximum nesting depth of generic substitution and signature comparison (default: 100)
    pub max_recursion_depth: usize,

    /// Deduplicate descriptors created during inflation by shallow identity
    /// Disabling it trades memory for skipping the intern cache lookup
    pub intern_types: bool,

    /// Require the `HAS_THIS` prolog bit of a requested signature to agree with the
    /// candidate's static/instance flag (default: off, only count, arity and types
    /// are compared)
    pub match_instance_flag: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: 100,
            intern_types: true,
            match_instance_flag: false,
        }
    }
}

impl ResolverConfig {
    /// Creates a configuration that never consults the intern cache
    ///
    /// Every inflation allocates a fresh descriptor; shallow identity of inflated
    /// types then only holds for types that did not need substitution.
    #[must_use]
    pub fn uncached() -> Self {
        Self {
            intern_types: false,
            ..Self::default()
        }
    }

    /// Creates a configuration that also compares the `HAS_THIS` prolog bit
    ///
    /// A static method then never answers an instance signature of the same shape,
    /// and the other way round.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            match_instance_flag: true,
            ..Self::default()
        }
    }

    /// Copy with a different recursion limit
    #[must_use]
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }
}
