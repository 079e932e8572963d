//! Shallow type identity for cache keys.
//!
//! Shallow identity looks at the five fields stored inline in a [`TypeDescriptor`]: the
//! raw payload, the attributes, the element type and the by-reference and pinned flags.
//! It does not follow element types or generic arguments, so two descriptors built
//! independently for `List<int>` are only shallow-equal if they share the same interned
//! generic class. Structural comparison lives on the registry.
//!
//! [`ShallowTypeHash`] mixes the fields sequentially (FNV-1a followed by an avalanche
//! step), so reordered or self-cancelling fields still produce different hashes.

use std::hash::{DefaultHasher, Hash, Hasher};

use crate::metadata::typesystem::{ElementType, TypeDescriptor};

/// Order sensitive hash builder over descriptor fields
pub struct ShallowTypeHash {
    state: u64,
}

impl ShallowTypeHash {
    /// Starts from the FNV-1a 64-bit offset basis
    #[must_use]
    pub fn new() -> Self {
        ShallowTypeHash {
            state: 0xcbf2_9ce4_8422_2325_u64,
        }
    }

    fn mix(&mut self, value: u64) {
        self.state ^= value;
        self.state = self.state.wrapping_mul(0x0100_0000_01b3_u64);

        self.state ^= self.state >> 33;
        self.state = self.state.wrapping_mul(0xff51_afd7_ed55_8ccd_u64);
        self.state ^= self.state >> 33;
    }

    /// Mixes in any hashable component
    #[must_use]
    pub fn add_component<T: Hash + ?Sized>(mut self, component: &T) -> Self {
        let mut hasher = DefaultHasher::new();
        component.hash(&mut hasher);
        self.mix(hasher.finish());
        self
    }

    /// Mixes in the raw payload
    #[must_use]
    pub fn add_data(mut self, raw: u64) -> Self {
        self.mix(raw);
        self
    }

    /// Mixes in the element type tag
    #[must_use]
    pub fn add_kind(mut self, kind: ElementType) -> Self {
        self.mix(u64::from(kind as u8));
        self
    }

    /// Returns the computed hash
    #[must_use]
    pub fn finalize(self) -> u64 {
        self.state
    }
}

impl Default for ShallowTypeHash {
    fn default() -> Self {
        Self::new()
    }
}

/// The shallow identity fields of a descriptor, usable as a hash map key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeKey {
    /// Raw payload, see [`TypeData::raw`](crate::metadata::typesystem::TypeData::raw)
    pub data: u64,
    /// Use-site attributes
    pub attrs: u32,
    /// Element type tag
    pub kind: ElementType,
    /// By-reference flag
    pub byref: bool,
    /// Pinned flag
    pub pinned: bool,
}

impl TypeKey {
    /// Hash over all five fields
    #[must_use]
    pub fn shallow_hash(&self) -> u64 {
        ShallowTypeHash::new()
            .add_data(self.data)
            .add_component(&self.attrs)
            .add_kind(self.kind)
            .add_component(&self.byref)
            .add_component(&self.pinned)
            .finalize()
    }
}

impl From<&TypeDescriptor> for TypeKey {
    fn from(desc: &TypeDescriptor) -> Self {
        TypeKey {
            data: desc.data.raw(),
            attrs: desc.attrs,
            kind: desc.kind,
            byref: desc.byref,
            pinned: desc.pinned,
        }
    }
}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.shallow_hash());
    }
}

/// Shallow hash of a descriptor
#[must_use]
pub fn shallow_hash(desc: &TypeDescriptor) -> u64 {
    TypeKey::from(desc).shallow_hash()
}

/// Shallow equality of two descriptors; implies equal [`shallow_hash`] values
#[must_use]
pub fn shallow_eq(a: &TypeDescriptor, b: &TypeDescriptor) -> bool {
    TypeKey::from(a) == TypeKey::from(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        handle::{ImageIndex, MetadataHandle, MetadataKind},
        typesystem::{TypeData, TypeId},
    };

    fn class(local: i32) -> TypeDescriptor {
        let image = ImageIndex::compose(MetadataKind::Small, 1).unwrap();
        TypeDescriptor::new(
            ElementType::Class,
            TypeData::Definition(MetadataHandle::encode(image, local)),
        )
    }

    #[test]
    fn test_hash_deterministic() {
        let a = class(4);
        let b = class(4);
        assert_eq!(shallow_hash(&a), shallow_hash(&b));
        assert!(shallow_eq(&a, &b));
    }

    #[test]
    fn test_every_field_participates() {
        let base = class(4);
        let variants = [
            class(5),
            base.with_attrs(0x10),
            base.with_byref(true),
            base.with_pinned(true),
            TypeDescriptor {
                kind: ElementType::ValueType,
                ..base
            },
        ];

        for other in variants {
            assert!(!shallow_eq(&base, &other), "{other:?}");
            assert_ne!(shallow_hash(&base), shallow_hash(&other), "{other:?}");
        }
    }

    #[test]
    fn test_hash_order_sensitive() {
        let hash1 = ShallowTypeHash::new()
            .add_component(&"first")
            .add_component(&"second")
            .finalize();
        let hash2 = ShallowTypeHash::new()
            .add_component(&"second")
            .add_component(&"first")
            .finalize();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_shallow_identity_does_not_follow_elements() {
        // Two arrays over different element ids are different, even if the elements
        // would compare structurally equal
        let a = TypeDescriptor::new(ElementType::SzArray, TypeData::Element(TypeId(1)));
        let b = TypeDescriptor::new(ElementType::SzArray, TypeData::Element(TypeId(2)));
        assert!(!shallow_eq(&a, &b));
    }

    #[test]
    fn test_key_usable_in_maps() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(class(1).key(), "one");
        map.insert(class(2).key(), "two");
        assert_eq!(map.get(&class(1).key()), Some(&"one"));
        assert_eq!(map.get(&class(1).with_byref(true).key()), None);
    }
}
