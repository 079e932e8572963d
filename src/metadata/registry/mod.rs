//! The process-wide metadata registry.
//!
//! [`MetadataRegistry`] owns the type arena and every registered image. Handle lookups are
//! routed by origin: a handle whose image index is `0` goes to the AOT image, any other
//! handle to the interpreter image registered under that index. Images are registered
//! append-only during boot; afterwards every operation takes `&self` and may run from
//! any number of threads.
//!
//! # Thread Safety
//!
//! - Interpreter images live in a lock-free `SkipMap` keyed by image index
//! - The AOT image sits in a `OnceLock` and is set at most once
//! - Descriptors are appended to a `boxcar` arena, deduplicated through `DashMap` caches

mod compare;

use std::sync::{Arc, OnceLock};

use crossbeam_skiplist::SkipMap;

use crate::{
    metadata::{
        attributes::is_void_type,
        config::ResolverConfig,
        definitions::{
            FieldDefinitionRc, GenericContainerRc, GenericParameterRc, MethodDefinition,
            MethodDefinitionRc, TypeDefinitionRc,
        },
        handle::{ImageIndex, MetadataHandle},
        image::{ImageIndexAllocator, MetadataSource, MetadataSourceRc},
        typesystem::{
            ElementType, GenericClass, GenericClassId, GenericInst, GenericInstId, TypeArena,
            TypeData, TypeDescriptor, TypeId,
        },
    },
    Error, Result,
};

/// Registered images plus the shared type arena
pub struct MetadataRegistry {
    config: ResolverConfig,
    arena: TypeArena,
    aot: OnceLock<MetadataSourceRc>,
    images: SkipMap<ImageIndex, MetadataSourceRc>,
    allocator: ImageIndexAllocator,
}

impl MetadataRegistry {
    /// Creates an empty registry with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    /// Creates an empty registry
    #[must_use]
    pub fn with_config(config: ResolverConfig) -> Self {
        MetadataRegistry {
            config,
            arena: TypeArena::new(config.intern_types),
            aot: OnceLock::new(),
            images: SkipMap::new(),
            allocator: ImageIndexAllocator::new(),
        }
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Direct access to the descriptor storage
    #[must_use]
    pub fn arena(&self) -> &TypeArena {
        &self.arena
    }

    /// Allocates an interpreter image index for an image whose largest table has
    /// `row_count` rows
    ///
    /// # Errors
    /// Returns [`Error::ImageIndexExhausted`] if no fitting index is left.
    pub fn allocate_image_index(&self, row_count: u32) -> Result<ImageIndex> {
        self.allocator.allocate(row_count)
    }

    /// Registers an image under its own index.
    ///
    /// # Errors
    /// Returns [`Error::ImageAlreadyRegistered`] if the index is taken; the first
    /// registration stays in place.
    pub fn register_image<S: MetadataSource + 'static>(&self, source: S) -> Result<()> {
        self.register_source(Arc::new(source))
    }

    /// Registers a shared image under its own index.
    ///
    /// # Errors
    /// Returns [`Error::ImageAlreadyRegistered`] if the index is taken.
    pub fn register_source(&self, source: MetadataSourceRc) -> Result<()> {
        let index = source.image_index();

        if !index.is_interpreter() {
            self.aot
                .set(source.clone())
                .map_err(|_| Error::ImageAlreadyRegistered(index))?;
        } else {
            let entry = self.images.get_or_insert(index, source.clone());
            if !Arc::ptr_eq(entry.value(), &source) {
                return Err(Error::ImageAlreadyRegistered(index));
            }
        }

        tracing::debug!(image = %index, name = source.name(), "registered image");
        Ok(())
    }

    /// The image registered under `index`
    #[must_use]
    pub fn image(&self, index: ImageIndex) -> Option<MetadataSourceRc> {
        if index.is_interpreter() {
            self.images.get(&index).map(|entry| entry.value().clone())
        } else {
            self.aot.get().cloned()
        }
    }

    /// Number of registered images, the AOT image included
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.len() + usize::from(self.aot.get().is_some())
    }

    /// Routes a handle to the image that owns it
    ///
    /// # Errors
    /// Returns [`Error::ImageNotRegistered`] for handles into unknown images, and
    /// [`Error::Malformed`] for the sentinel.
    pub fn source_of(&self, handle: MetadataHandle) -> Result<MetadataSourceRc> {
        if !handle.is_valid() {
            return Err(malformed_error!("Lookup of the invalid handle"));
        }

        let index = if handle.is_interpreter_origin() {
            handle.image_index()
        } else {
            ImageIndex::AOT
        };
        self.image(index)
            .ok_or(Error::ImageNotRegistered(index, handle))
    }

    /// Looks up a type definition, `None` if the handle leads nowhere
    #[must_use]
    pub fn lookup_type(&self, handle: MetadataHandle) -> Option<TypeDefinitionRc> {
        self.source_of(handle).ok()?.lookup_type(handle)
    }

    /// Looks up a method definition, `None` if the handle leads nowhere
    #[must_use]
    pub fn lookup_method(&self, handle: MetadataHandle) -> Option<MethodDefinitionRc> {
        self.source_of(handle).ok()?.lookup_method(handle)
    }

    /// Looks up a field definition, `None` if the handle leads nowhere
    #[must_use]
    pub fn lookup_field(&self, handle: MetadataHandle) -> Option<FieldDefinitionRc> {
        self.source_of(handle).ok()?.lookup_field(handle)
    }

    /// Looks up a generic container, `None` if the handle leads nowhere
    #[must_use]
    pub fn lookup_generic_container(&self, handle: MetadataHandle) -> Option<GenericContainerRc> {
        self.source_of(handle).ok()?.lookup_generic_container(handle)
    }

    /// Looks up a generic parameter, `None` if the handle leads nowhere
    #[must_use]
    pub fn lookup_generic_parameter(&self, handle: MetadataHandle) -> Option<GenericParameterRc> {
        self.source_of(handle).ok()?.lookup_generic_parameter(handle)
    }

    /// Type definition a loaded table refers to; absence means corrupted metadata
    ///
    /// # Errors
    /// Returns [`Error::ImageNotRegistered`] or [`Error::Malformed`].
    pub fn type_definition(&self, handle: MetadataHandle) -> Result<TypeDefinitionRc> {
        self.source_of(handle)?
            .lookup_type(handle)
            .ok_or_else(|| malformed_error!("TypeDef row {} does not exist", handle))
    }

    /// Method definition a loaded table refers to; absence means corrupted metadata
    ///
    /// # Errors
    /// Returns [`Error::ImageNotRegistered`] or [`Error::Malformed`].
    pub fn method_definition(&self, handle: MetadataHandle) -> Result<MethodDefinitionRc> {
        self.source_of(handle)?
            .lookup_method(handle)
            .ok_or_else(|| malformed_error!("MethodDef row {} does not exist", handle))
    }

    /// Field definition a loaded table refers to; absence means corrupted metadata
    ///
    /// # Errors
    /// Returns [`Error::ImageNotRegistered`] or [`Error::Malformed`].
    pub fn field_definition(&self, handle: MetadataHandle) -> Result<FieldDefinitionRc> {
        self.source_of(handle)?
            .lookup_field(handle)
            .ok_or_else(|| malformed_error!("Field row {} does not exist", handle))
    }

    /// Generic container a loaded table refers to; absence means corrupted metadata
    ///
    /// # Errors
    /// Returns [`Error::ImageNotRegistered`] or [`Error::Malformed`].
    pub fn generic_container(&self, handle: MetadataHandle) -> Result<GenericContainerRc> {
        self.source_of(handle)?
            .lookup_generic_container(handle)
            .ok_or_else(|| malformed_error!("GenericContainer row {} does not exist", handle))
    }

    /// Generic parameter a loaded table refers to; absence means corrupted metadata
    ///
    /// # Errors
    /// Returns [`Error::ImageNotRegistered`] or [`Error::Malformed`].
    pub fn generic_parameter(&self, handle: MetadataHandle) -> Result<GenericParameterRc> {
        self.source_of(handle)?
            .lookup_generic_parameter(handle)
            .ok_or_else(|| malformed_error!("GenericParam row {} does not exist", handle))
    }

    /// Number of parameters of an optional generic container, `0` for `None`
    ///
    /// # Errors
    /// Propagates lookup failures of the container.
    pub fn generic_arity(&self, container: Option<MetadataHandle>) -> Result<usize> {
        match container {
            Some(handle) => Ok(self.generic_container(handle)?.type_argc()),
            None => Ok(0),
        }
    }

    /// Copies a descriptor out of the arena
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] for ids not issued by this registry.
    pub fn descriptor(&self, id: TypeId) -> Result<TypeDescriptor> {
        self.arena.descriptor(id)
    }

    /// True if values of `ty` are stored inline: primitives other than `string` and
    /// `object`, value types, enums and instances of generic value types.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] for unknown ids and propagates lookup failures of
    /// a generic instance's definition.
    pub fn is_value_type(&self, ty: TypeId) -> Result<bool> {
        let desc = self.descriptor(ty)?;
        match (desc.kind, desc.data) {
            (
                ElementType::Boolean
                | ElementType::Char
                | ElementType::I1
                | ElementType::U1
                | ElementType::I2
                | ElementType::U2
                | ElementType::I4
                | ElementType::U4
                | ElementType::I8
                | ElementType::U8
                | ElementType::R4
                | ElementType::R8
                | ElementType::I
                | ElementType::U
                | ElementType::TypedByRef
                | ElementType::ValueType,
                _,
            ) => Ok(true),
            (ElementType::GenericInst, TypeData::GenericClass(class)) => {
                let definition = self.get_generic_class(class)?.definition;
                Ok(self.type_definition(definition)?.is_value_type())
            }
            _ => Ok(false),
        }
    }

    /// True if `ty` is `void`
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] for ids not issued by this registry.
    pub fn is_void_type(&self, ty: TypeId) -> Result<bool> {
        Ok(is_void_type(&self.descriptor(ty)?))
    }

    /// True if `method` returns nothing
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the return type is unknown.
    pub fn is_return_void_method(&self, method: &MethodDefinition) -> Result<bool> {
        self.is_void_type(method.return_type)
    }

    /// Stores a descriptor, deduplicating it when interning is enabled
    pub fn intern_type(&self, desc: TypeDescriptor) -> TypeId {
        self.arena.intern(desc)
    }

    /// The shared descriptor of a primitive type
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if `kind` carries a payload and is no primitive.
    pub fn primitive(&self, kind: ElementType) -> Result<TypeId> {
        self.arena
            .primitive(kind)
            .ok_or_else(|| malformed_error!("{:?} is not a primitive element type", kind))
    }

    /// Interns an argument list
    pub fn generic_inst(&self, args: Vec<TypeId>) -> GenericInstId {
        self.arena.generic_inst(args)
    }

    /// Looks up an argument list
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] for ids not issued by this registry.
    pub fn get_generic_inst(&self, id: GenericInstId) -> Result<&GenericInst> {
        self.arena.get_generic_inst(id)
    }

    /// Looks up a generic class
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] for ids not issued by this registry.
    pub fn get_generic_class(&self, id: GenericClassId) -> Result<GenericClass> {
        self.arena.get_generic_class(id)
    }

    fn make_element(&self, kind: ElementType, element: TypeId) -> Result<TypeId> {
        self.descriptor(element)?;
        Ok(self.intern_type(TypeDescriptor::new(kind, TypeData::Element(element))))
    }

    /// `element*`
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if `element` is unknown.
    pub fn make_pointer(&self, element: TypeId) -> Result<TypeId> {
        self.make_element(ElementType::Ptr, element)
    }

    /// `element[]`
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if `element` is unknown.
    pub fn make_szarray(&self, element: TypeId) -> Result<TypeId> {
        self.make_element(ElementType::SzArray, element)
    }

    /// `element[,...]` with `rank` dimensions
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if `element` is unknown or `rank` is zero.
    pub fn make_array(&self, element: TypeId, rank: u32) -> Result<TypeId> {
        self.descriptor(element)?;
        if rank == 0 {
            return Err(malformed_error!("Array rank must be at least 1"));
        }
        Ok(self.intern_type(TypeDescriptor::new(
            ElementType::Array,
            TypeData::Array { element, rank },
        )))
    }

    /// `ty&`, the same type passed by reference
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if `ty` is unknown.
    pub fn make_byref(&self, ty: TypeId) -> Result<TypeId> {
        let desc = self.descriptor(ty)?;
        if desc.byref {
            return Ok(ty);
        }
        Ok(self.intern_type(desc.with_byref(true)))
    }

    /// `definition<args...>`
    ///
    /// The argument count is not checked against the definition's container, the
    /// definition may live in an image that is still being built.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if an argument is unknown or `args` is empty.
    pub fn make_generic_instance(
        &self,
        definition: MetadataHandle,
        args: &[TypeId],
    ) -> Result<TypeId> {
        if args.is_empty() {
            return Err(malformed_error!(
                "Generic instance of {} without arguments",
                definition
            ));
        }
        for arg in args {
            self.descriptor(*arg)?;
        }

        let inst = self.generic_inst(args.to_vec());
        let class = self.arena.generic_class(definition, inst);
        Ok(self.intern_type(TypeDescriptor::new(
            ElementType::GenericInst,
            TypeData::GenericClass(class),
        )))
    }

    /// Re-targets a generic instance type to new class arguments
    pub(crate) fn make_generic_instance_from(
        &self,
        template: TypeDescriptor,
        definition: MetadataHandle,
        class_inst: GenericInstId,
    ) -> TypeId {
        let class = self.arena.generic_class(definition, class_inst);
        self.intern_type(TypeDescriptor {
            data: TypeData::GenericClass(class),
            ..template
        })
    }
}

impl Default for MetadataRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetadataRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataRegistry")
            .field("config", &self.config)
            .field("images", &self.image_count())
            .field("types", &self.arena.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{attributes::MethodAttributes, image::ImageBuilder};
    use std::thread;

    #[test]
    fn test_register_routes_by_origin() {
        let registry = MetadataRegistry::new();
        let int = registry.primitive(ElementType::I4).unwrap();

        let mut aot = ImageBuilder::new(&registry, ImageIndex::AOT, "mscorlib");
        let object = aot.add_class("System", "Object", 0).unwrap();
        registry.register_image(aot.build()).unwrap();

        let index = registry.allocate_image_index(4).unwrap();
        let mut hot = ImageBuilder::new(&registry, index, "Hot.dll");
        let player = hot.add_class("Game", "Player", 0).unwrap();
        hot.add_field(player, "hp", int, 0).unwrap();
        registry.register_image(hot.build()).unwrap();

        assert!(!object.is_interpreter_origin());
        assert!(player.is_interpreter_origin());
        assert_eq!(registry.lookup_type(object).unwrap().name, "Object");
        assert_eq!(registry.lookup_type(player).unwrap().name, "Player");
        assert_eq!(registry.image_count(), 2);

        // same local index, different image
        assert_eq!(object.local_index(), player.local_index());
        assert_ne!(
            registry.lookup_type(object).unwrap().handle,
            registry.lookup_type(player).unwrap().handle
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = MetadataRegistry::new();
        let index = registry.allocate_image_index(1).unwrap();

        registry
            .register_image(ImageBuilder::new(&registry, index, "A.dll").build())
            .unwrap();
        let again = registry.register_image(ImageBuilder::new(&registry, index, "B.dll").build());
        assert!(matches!(again, Err(Error::ImageAlreadyRegistered(i)) if i == index));
        assert_eq!(registry.image(index).unwrap().name(), "A.dll");

        registry
            .register_image(ImageBuilder::new(&registry, ImageIndex::AOT, "aot").build())
            .unwrap();
        assert!(registry
            .register_image(ImageBuilder::new(&registry, ImageIndex::AOT, "aot2").build())
            .is_err());
    }

    #[test]
    fn test_unregistered_and_invalid_handles() {
        let registry = MetadataRegistry::new();
        let index = registry.allocate_image_index(1).unwrap();
        let handle = MetadataHandle::encode(index, 0);

        assert!(registry.lookup_type(handle).is_none());
        assert!(matches!(
            registry.type_definition(handle),
            Err(Error::ImageNotRegistered(i, h)) if i == index && h == handle
        ));
        assert!(registry.lookup_type(MetadataHandle::INVALID).is_none());
        assert!(registry.type_definition(MetadataHandle::INVALID).is_err());
    }

    #[test]
    fn test_type_constructors() {
        let registry = MetadataRegistry::new();
        let int = registry.primitive(ElementType::I4).unwrap();

        let ptr = registry.make_pointer(int).unwrap();
        assert_eq!(registry.make_pointer(int).unwrap(), ptr);
        assert_eq!(
            registry.descriptor(ptr).unwrap().data,
            TypeData::Element(int)
        );

        let arr = registry.make_array(int, 2).unwrap();
        assert_eq!(
            registry.descriptor(arr).unwrap().data,
            TypeData::Array {
                element: int,
                rank: 2
            }
        );
        assert!(registry.make_array(int, 0).is_err());

        let byref = registry.make_byref(int).unwrap();
        assert!(registry.descriptor(byref).unwrap().byref);
        assert_eq!(registry.make_byref(byref).unwrap(), byref);

        assert!(registry.primitive(ElementType::Class).is_err());
        assert!(registry
            .make_generic_instance(MetadataHandle::from_raw(1), &[])
            .is_err());
    }

    #[test]
    fn test_value_and_void_types() {
        let registry = MetadataRegistry::new();
        let int = registry.primitive(ElementType::I4).unwrap();
        let string = registry.primitive(ElementType::String).unwrap();
        let void = registry.primitive(ElementType::Void).unwrap();

        let index = registry.allocate_image_index(8).unwrap();
        let mut hot = ImageBuilder::new(&registry, index, "Shapes.dll");
        let pair = hot.add_value_type("Shapes", "Pair`1", 0).unwrap();
        hot.add_type_generic_parameters(pair, &["T"]).unwrap();
        let list = hot.add_class("Shapes", "List`1", 0).unwrap();
        hot.add_type_generic_parameters(list, &["T"]).unwrap();
        let color = hot.add_enum("Shapes", "Color", 0, int).unwrap();
        let color_type = hot.type_of(color).unwrap();
        let list_type = hot.type_of(list).unwrap();

        let clear = hot.add_method(list, "Clear", 0).unwrap();
        hot.set_signature(clear, void, &[]).unwrap();
        let parse = hot
            .add_method(list, "Parse", MethodAttributes::STATIC)
            .unwrap();
        hot.set_signature(parse, int, &[string, int]).unwrap();
        registry.register_image(hot.build()).unwrap();

        assert!(registry.is_value_type(int).unwrap());
        assert!(!registry.is_value_type(string).unwrap());
        assert!(registry.is_value_type(color_type).unwrap());
        assert!(!registry.is_value_type(list_type).unwrap());

        let pair_of_int = registry.make_generic_instance(pair, &[int]).unwrap();
        let list_of_int = registry.make_generic_instance(list, &[int]).unwrap();
        assert!(registry.is_value_type(pair_of_int).unwrap());
        assert!(!registry.is_value_type(list_of_int).unwrap());
        assert!(!registry
            .is_value_type(registry.make_szarray(int).unwrap())
            .unwrap());

        assert!(registry.is_void_type(void).unwrap());
        assert!(!registry.is_void_type(int).unwrap());

        let clear = registry.method_definition(clear).unwrap();
        let parse = registry.method_definition(parse).unwrap();
        assert!(registry.is_return_void_method(&clear).unwrap());
        assert!(!registry.is_return_void_method(&parse).unwrap());
        // `this` counts as an argument of instance methods
        assert_eq!(clear.actual_param_count(), 1);
        assert_eq!(parse.actual_param_count(), 2);
    }

    #[test]
    fn test_registry_is_shareable() {
        let registry = Arc::new(MetadataRegistry::new());
        let int = registry.primitive(ElementType::I4).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || registry.make_szarray(int).unwrap())
            })
            .collect();
        let ids: Vec<TypeId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
    }
}
