//! Append-only storage for descriptors and generic instantiations.
//!
//! Entries are pushed into `boxcar` vectors, so readers never block writers and an id
//! handed out once stays valid for the lifetime of the arena. Interning goes through
//! `DashMap` caches keyed by shallow identity; the entry API keeps "look up or push"
//! atomic per key, so two threads interning the same descriptor get the same id.

use dashmap::DashMap;
use strum::IntoEnumIterator;

use crate::{
    metadata::{
        handle::MetadataHandle,
        typesystem::{
            ElementType, GenericClass, GenericClassId, GenericInst, GenericInstId, TypeData,
            TypeDescriptor, TypeId, TypeKey,
        },
    },
    Result,
};

/// Lock-free storage for [`TypeDescriptor`], [`GenericInst`] and [`GenericClass`] entries
pub struct TypeArena {
    types: boxcar::Vec<TypeDescriptor>,
    insts: boxcar::Vec<GenericInst>,
    classes: boxcar::Vec<GenericClass>,
    type_cache: DashMap<TypeKey, TypeId>,
    inst_cache: DashMap<Vec<TypeId>, GenericInstId>,
    class_cache: DashMap<(MetadataHandle, GenericInstId), GenericClassId>,
    primitives: Vec<(ElementType, TypeId)>,
    intern: bool,
}

impl TypeArena {
    /// Creates an arena holding one descriptor per primitive element type.
    ///
    /// With `intern` disabled every [`intern`](Self::intern) call pushes a fresh
    /// descriptor; generic argument lists and classes are always interned.
    #[must_use]
    pub fn new(intern: bool) -> Self {
        let mut arena = TypeArena {
            types: boxcar::Vec::new(),
            insts: boxcar::Vec::new(),
            classes: boxcar::Vec::new(),
            type_cache: DashMap::new(),
            inst_cache: DashMap::new(),
            class_cache: DashMap::new(),
            primitives: Vec::new(),
            intern,
        };

        let primitives = ElementType::iter()
            .filter(|kind| kind.is_primitive())
            .map(|kind| {
                let desc = TypeDescriptor::new(kind, TypeData::None);
                let id = arena.push(desc);
                arena.type_cache.insert(desc.key(), id);
                (kind, id)
            })
            .collect();
        arena.primitives = primitives;
        arena
    }

    fn push(&self, desc: TypeDescriptor) -> TypeId {
        TypeId(self.types.push(desc) as u32)
    }

    /// Stores `desc` without consulting the cache
    pub fn alloc(&self, desc: TypeDescriptor) -> TypeId {
        self.push(desc)
    }

    /// Returns the id of a shallow-equal descriptor, storing `desc` if there is none
    pub fn intern(&self, desc: TypeDescriptor) -> TypeId {
        if !self.intern {
            return self.push(desc);
        }

        *self
            .type_cache
            .entry(desc.key())
            .or_insert_with(|| self.push(desc))
    }

    /// The shared descriptor of a primitive element type
    #[must_use]
    pub fn primitive(&self, kind: ElementType) -> Option<TypeId> {
        self.primitives
            .iter()
            .find(|(primitive, _)| *primitive == kind)
            .map(|(_, id)| *id)
    }

    /// Looks up a descriptor
    #[must_use]
    pub fn get(&self, id: TypeId) -> Option<&TypeDescriptor> {
        self.types.get(id.index())
    }

    /// Looks up a descriptor, treating an unknown id as corrupted input
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `id` was not issued by this arena.
    pub fn descriptor(&self, id: TypeId) -> Result<TypeDescriptor> {
        self.get(id)
            .copied()
            .ok_or_else(|| malformed_error!("Unknown type id - {}", id))
    }

    /// Interns an argument list
    pub fn generic_inst(&self, args: Vec<TypeId>) -> GenericInstId {
        if let Some(existing) = self.inst_cache.get(&args) {
            return *existing;
        }

        let stored = args.clone();
        *self
            .inst_cache
            .entry(args)
            .or_insert_with(|| GenericInstId(self.insts.push(GenericInst { args: stored }) as u32))
    }

    /// Looks up an argument list
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `id` was not issued by this arena.
    pub fn get_generic_inst(&self, id: GenericInstId) -> Result<&GenericInst> {
        self.insts
            .get(id.0 as usize)
            .ok_or_else(|| malformed_error!("Unknown generic instantiation - {:?}", id))
    }

    /// Interns a generic class
    pub fn generic_class(
        &self,
        definition: MetadataHandle,
        class_inst: GenericInstId,
    ) -> GenericClassId {
        *self
            .class_cache
            .entry((definition, class_inst))
            .or_insert_with(|| {
                GenericClassId(self.classes.push(GenericClass {
                    definition,
                    class_inst,
                }) as u32)
            })
    }

    /// Looks up a generic class
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `id` was not issued by this arena.
    pub fn get_generic_class(&self, id: GenericClassId) -> Result<GenericClass> {
        self.classes
            .get(id.0 as usize)
            .copied()
            .ok_or_else(|| malformed_error!("Unknown generic class - {:?}", id))
    }

    /// Number of stored descriptors
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.count()
    }

    /// True if no descriptor is stored; never the case after construction
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.count() == 0
    }
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new(true)
    }
}
