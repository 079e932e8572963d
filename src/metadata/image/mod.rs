//! Loaded images and the table accessor seam.
//!
//! An image is one unit of compiled or interpreted code. The resolution layer never
//! parses images itself; it reads their definition tables through [`MetadataSource`],
//! which the AOT tables and the interpreter's tables implement independently. [`Image`]
//! is the in-memory implementation that [`ImageBuilder`] produces.
//!
//! # Key Components
//!
//! - [`MetadataSource`]: Lookup of definitions by handle, `None` when absent
//! - [`Image`]: Vector backed tables indexed by the handle's local index
//! - [`ImageBuilder`]: Fluent construction of an [`Image`] with correctly encoded handles
//! - [`ImageIndexAllocator`]: Hands out image indices sized for an image's row count

mod allocator;
mod builder;

use std::sync::Arc;

pub use allocator::ImageIndexAllocator;
pub use builder::ImageBuilder;

use crate::metadata::{
    definitions::{
        FieldDefinitionRc, GenericContainerRc, GenericParameterRc, MethodDefinitionRc,
        TypeDefinitionRc,
    },
    handle::{ImageIndex, MetadataHandle},
};

/// A reference to a registered metadata source
pub type MetadataSourceRc = Arc<dyn MetadataSource>;

/// Read access to the definition tables of one image.
///
/// Every lookup returns `None` for handles that do not belong to this image or point
/// past the end of the table. Implementations must be immutable once registered.
pub trait MetadataSource: Send + Sync {
    /// Index this image was registered under
    fn image_index(&self) -> ImageIndex;

    /// Human readable name, e.g. the assembly file name
    fn name(&self) -> &str;

    /// Looks up a type definition
    fn lookup_type(&self, handle: MetadataHandle) -> Option<TypeDefinitionRc>;

    /// Looks up a method definition
    fn lookup_method(&self, handle: MetadataHandle) -> Option<MethodDefinitionRc>;

    /// Looks up a field definition
    fn lookup_field(&self, handle: MetadataHandle) -> Option<FieldDefinitionRc>;

    /// Looks up a generic container
    fn lookup_generic_container(&self, handle: MetadataHandle) -> Option<GenericContainerRc>;

    /// Looks up a generic parameter
    fn lookup_generic_parameter(&self, handle: MetadataHandle) -> Option<GenericParameterRc>;
}

/// Definition tables of one image
pub struct Image {
    index: ImageIndex,
    name: String,
    types: Vec<TypeDefinitionRc>,
    methods: Vec<MethodDefinitionRc>,
    fields: Vec<FieldDefinitionRc>,
    generic_containers: Vec<GenericContainerRc>,
    generic_parameters: Vec<GenericParameterRc>,
}

impl Image {
    fn row<T>(&self, table: &[Arc<T>], handle: MetadataHandle) -> Option<Arc<T>> {
        if !handle.is_valid() || handle.image_index() != self.index {
            return None;
        }

        table.get(handle.local_index() as usize).cloned()
    }
}

impl MetadataSource for Image {
    fn image_index(&self) -> ImageIndex {
        self.index
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn lookup_type(&self, handle: MetadataHandle) -> Option<TypeDefinitionRc> {
        self.row(&self.types, handle)
    }

    fn lookup_method(&self, handle: MetadataHandle) -> Option<MethodDefinitionRc> {
        self.row(&self.methods, handle)
    }

    fn lookup_field(&self, handle: MetadataHandle) -> Option<FieldDefinitionRc> {
        self.row(&self.fields, handle)
    }

    fn lookup_generic_container(&self, handle: MetadataHandle) -> Option<GenericContainerRc> {
        self.row(&self.generic_containers, handle)
    }

    fn lookup_generic_parameter(&self, handle: MetadataHandle) -> Option<GenericParameterRc> {
        self.row(&self.generic_parameters, handle)
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("types", &self.types.len())
            .field("methods", &self.methods.len())
            .field("fields", &self.fields.len())
            .finish_non_exhaustive()
    }
}
