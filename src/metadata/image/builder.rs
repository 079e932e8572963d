//! Fluent construction of in-memory images.
//!
//! The builder assigns every row its handle as it is added, using the image index the
//! image was allocated, and creates the descriptors a definition needs (`Class` or
//! `ValueType` over the definition, `Var`/`MVar` over each generic parameter) in the
//! registry's arena. Handles are valid as soon as they are returned, so definitions can
//! reference each other before the image is registered.
//!
//! # Example
//!
//! ```rust
//! use hybridmeta::prelude::*;
//!
//! # fn example() -> hybridmeta::Result<()> {
//! let registry = MetadataRegistry::new();
//! let index = registry.allocate_image_index(16)?;
//! let int = registry.primitive(ElementType::I4)?;
//!
//! let mut builder = ImageBuilder::new(&registry, index, "Game.dll");
//! let point = builder.add_value_type("Game", "Point", TypeAttributes::PUBLIC)?;
//! builder.add_field(point, "x", int, FieldAttributes::PUBLIC)?;
//! registry.register_image(builder.build())?;
//!
//! assert!(registry.lookup_type(point).is_some());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use crate::{
    metadata::{
        attributes::{FieldAttributes, TypeAttributes},
        definitions::{
            FieldDefinition, GenericContainer, GenericParameter, MethodDefinition,
            TypeDefinition,
        },
        handle::{ImageIndex, MetadataHandle},
        image::Image,
        registry::MetadataRegistry,
        typesystem::{ElementType, TypeData, TypeDescriptor, TypeId},
    },
    Error, Result,
};
use std::sync::Arc;

/// Builds an [`Image`] row by row
pub struct ImageBuilder<'a> {
    registry: &'a MetadataRegistry,
    index: ImageIndex,
    name: String,
    types: Vec<TypeDefinition>,
    methods: Vec<MethodDefinition>,
    fields: Vec<FieldDefinition>,
    containers: Vec<GenericContainer>,
    params: Vec<GenericParameter>,
}

impl<'a> ImageBuilder<'a> {
    /// Starts an empty image with the given index
    #[must_use]
    pub fn new(registry: &'a MetadataRegistry, index: ImageIndex, name: &str) -> Self {
        ImageBuilder {
            registry,
            index,
            name: name.to_string(),
            types: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            containers: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Index the image is being built for
    #[must_use]
    pub fn image_index(&self) -> ImageIndex {
        self.index
    }

    fn next_handle(&self, row: usize) -> Result<MetadataHandle> {
        let local = i32::try_from(row).map_err(|_| Error::IndexSpaceExhausted(self.index))?;
        MetadataHandle::try_encode(self.index, local)
            .map_err(|_| Error::IndexSpaceExhausted(self.index))
    }

    fn row(&self, handle: MetadataHandle, len: usize, table: &str) -> Result<usize> {
        if !handle.is_valid() || handle.image_index() != self.index {
            return Err(malformed_error!(
                "{} handle {} does not belong to image {}",
                table,
                handle,
                self.index
            ));
        }

        let row = handle.local_index() as usize;
        if row >= len {
            return Err(malformed_error!("{} handle {} is out of range", table, handle));
        }
        Ok(row)
    }

    fn type_row(&self, handle: MetadataHandle) -> Result<usize> {
        self.row(handle, self.types.len(), "TypeDef")
    }

    fn method_row(&self, handle: MetadataHandle) -> Result<usize> {
        self.row(handle, self.methods.len(), "MethodDef")
    }

    fn add_type(
        &mut self,
        namespace: &str,
        name: &str,
        flags: u32,
        value_type: bool,
        enum_type: bool,
    ) -> Result<MetadataHandle> {
        let handle = self.next_handle(self.types.len())?;
        let kind = if value_type {
            ElementType::ValueType
        } else {
            ElementType::Class
        };
        let byval_type = self
            .registry
            .intern_type(TypeDescriptor::new(kind, TypeData::Definition(handle)));

        self.types.push(TypeDefinition {
            handle,
            namespace: namespace.to_string(),
            name: name.to_string(),
            flags,
            value_type,
            enum_type,
            byval_type,
            parent: None,
            generic_container: None,
            fields: Vec::new(),
            methods: Vec::new(),
        });
        Ok(handle)
    }

    /// Adds a reference type definition
    ///
    /// # Errors
    /// Returns [`Error::IndexSpaceExhausted`] if the table is full for this image's kind.
    pub fn add_class(&mut self, namespace: &str, name: &str, flags: u32) -> Result<MetadataHandle> {
        self.add_type(namespace, name, flags, false, false)
    }

    /// Adds a value type definition
    ///
    /// # Errors
    /// Returns [`Error::IndexSpaceExhausted`] if the table is full for this image's kind.
    pub fn add_value_type(
        &mut self,
        namespace: &str,
        name: &str,
        flags: u32,
    ) -> Result<MetadataHandle> {
        self.add_type(namespace, name, flags, true, false)
    }

    /// Adds an enum definition, a value type over `underlying`
    ///
    /// The underlying integer type becomes the `value__` instance field.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if `underlying` is unknown, and
    /// [`Error::IndexSpaceExhausted`] if a table is full for this image's kind.
    pub fn add_enum(
        &mut self,
        namespace: &str,
        name: &str,
        flags: u32,
        underlying: TypeId,
    ) -> Result<MetadataHandle> {
        let ty = self.add_type(namespace, name, flags | TypeAttributes::SEALED, true, true)?;
        self.add_field(
            ty,
            "value__",
            underlying,
            FieldAttributes::PUBLIC | FieldAttributes::SPECIAL_NAME | FieldAttributes::RTSPECIAL_NAME,
        )?;
        Ok(ty)
    }

    /// The by-value descriptor of a type added to this builder
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if `ty` is not a type of this builder.
    pub fn type_of(&self, ty: MetadataHandle) -> Result<TypeId> {
        Ok(self.types[self.type_row(ty)?].byval_type)
    }

    /// Sets the base type
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if `ty` is not a type of this builder.
    pub fn set_parent(&mut self, ty: MetadataHandle, parent: TypeId) -> Result<()> {
        let row = self.type_row(ty)?;
        self.types[row].parent = Some(parent);
        Ok(())
    }

    fn add_container(
        &mut self,
        owner: MetadataHandle,
        is_method: bool,
        names: &[&str],
    ) -> Result<(MetadataHandle, Vec<TypeId>)> {
        let handle = self.next_handle(self.containers.len())?;
        let kind = if is_method {
            ElementType::MVar
        } else {
            ElementType::Var
        };

        let mut params = Vec::with_capacity(names.len());
        let mut types = Vec::with_capacity(names.len());
        for (num, name) in names.iter().enumerate() {
            let param = self.next_handle(self.params.len())?;
            self.params.push(GenericParameter {
                handle: param,
                owner: handle,
                num: num as u32,
                name: (*name).to_string(),
                flags: 0,
            });
            params.push(param);
            types.push(
                self.registry
                    .intern_type(TypeDescriptor::new(kind, TypeData::GenericParam(param))),
            );
        }

        self.containers.push(GenericContainer {
            handle,
            owner,
            is_method,
            params,
        });
        Ok((handle, types))
    }

    /// Declares generic parameters on a type, returning one `Var` descriptor per name
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if `ty` is unknown or already generic, and
    /// [`Error::IndexSpaceExhausted`] if a table is full.
    pub fn add_type_generic_parameters(
        &mut self,
        ty: MetadataHandle,
        names: &[&str],
    ) -> Result<Vec<TypeId>> {
        let row = self.type_row(ty)?;
        if self.types[row].generic_container.is_some() {
            return Err(malformed_error!("Type {} already has generic parameters", ty));
        }

        let (container, types) = self.add_container(ty, false, names)?;
        self.types[row].generic_container = Some(container);
        Ok(types)
    }

    /// Adds a field to `owner`; `flags` become the attributes of the field's descriptor
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if `owner` or `field_type` are unknown, and
    /// [`Error::IndexSpaceExhausted`] if the table is full.
    pub fn add_field(
        &mut self,
        owner: MetadataHandle,
        name: &str,
        field_type: TypeId,
        flags: u32,
    ) -> Result<MetadataHandle> {
        let row = self.type_row(owner)?;
        let handle = self.next_handle(self.fields.len())?;
        let desc = self.registry.descriptor(field_type)?.with_attrs(flags);
        let field_type = self.registry.intern_type(desc);

        self.fields.push(FieldDefinition {
            handle,
            name: name.to_string(),
            declaring_type: owner,
            field_type,
            flags,
        });
        self.types[row].fields.push(handle);
        Ok(handle)
    }

    /// Adds a method to `owner` returning void without parameters
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if `owner` is unknown, and
    /// [`Error::IndexSpaceExhausted`] if the table is full.
    pub fn add_method(
        &mut self,
        owner: MetadataHandle,
        name: &str,
        flags: u32,
    ) -> Result<MetadataHandle> {
        let row = self.type_row(owner)?;
        let handle = self.next_handle(self.methods.len())?;
        let void = self.registry.primitive(ElementType::Void)?;

        self.methods.push(MethodDefinition {
            handle,
            name: name.to_string(),
            declaring_type: owner,
            flags,
            return_type: void,
            params: Vec::new(),
            generic_container: None,
        });
        self.types[row].methods.push(handle);
        Ok(handle)
    }

    /// Declares generic parameters on a method, returning one `MVar` descriptor per name
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if `method` is unknown or already generic, and
    /// [`Error::IndexSpaceExhausted`] if a table is full.
    pub fn add_method_generic_parameters(
        &mut self,
        method: MetadataHandle,
        names: &[&str],
    ) -> Result<Vec<TypeId>> {
        let row = self.method_row(method)?;
        if self.methods[row].generic_container.is_some() {
            return Err(malformed_error!(
                "Method {} already has generic parameters",
                method
            ));
        }

        let (container, types) = self.add_container(method, true, names)?;
        self.methods[row].generic_container = Some(container);
        Ok(types)
    }

    /// Sets the return and parameter types of a method
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if `method` is not a method of this builder.
    pub fn set_signature(
        &mut self,
        method: MetadataHandle,
        return_type: TypeId,
        params: &[TypeId],
    ) -> Result<()> {
        let row = self.method_row(method)?;
        let definition = &mut self.methods[row];
        definition.return_type = return_type;
        definition.params = params.to_vec();
        Ok(())
    }

    /// Freezes the tables
    #[must_use]
    pub fn build(self) -> Image {
        tracing::trace!(
            image = %self.index,
            name = %self.name,
            types = self.types.len(),
            methods = self.methods.len(),
            fields = self.fields.len(),
            "built image"
        );

        Image {
            index: self.index,
            name: self.name,
            types: self.types.into_iter().map(Arc::new).collect(),
            methods: self.methods.into_iter().map(Arc::new).collect(),
            fields: self.fields.into_iter().map(Arc::new).collect(),
            generic_containers: self.containers.into_iter().map(Arc::new).collect(),
            generic_parameters: self.params.into_iter().map(Arc::new).collect(),
        }
    }
}
