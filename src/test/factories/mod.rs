//! Registries with prepared images.
//!
//! - [`PointFixture`]: `Geometry.Point { int x; float y; }`
//! - [`GenericFixture`]: `Box<T>` with a field, a generic method and a virtual method,
//!   plus an unrelated `Other<T>`
//! - [`HierarchyFixture`]: a class hierarchy split across the AOT image and an
//!   interpreter image, including generic base types

mod hierarchy;

pub(crate) use hierarchy::HierarchyFixture;

use crate::metadata::{
    attributes::{FieldAttributes, MethodAttributes, TypeAttributes},
    config::ResolverConfig,
    handle::MetadataHandle,
    image::ImageBuilder,
    registry::MetadataRegistry,
    typesystem::{ElementType, TypeId},
};

/// `Geometry.Point { int x; float y; }` in an interpreter image
pub(crate) struct PointFixture {
    pub registry: MetadataRegistry,
    pub int: TypeId,
    pub float: TypeId,
    pub point_def: MetadataHandle,
    pub point_type: TypeId,
    pub x: MetadataHandle,
    pub y: MetadataHandle,
}

impl PointFixture {
    pub fn new() -> Self {
        let registry = MetadataRegistry::new();
        let int = registry.primitive(ElementType::I4).unwrap();
        let float = registry.primitive(ElementType::R4).unwrap();
        let index = registry.allocate_image_index(8).unwrap();

        let mut builder = ImageBuilder::new(&registry, index, "Geometry.dll");
        let point_def = builder
            .add_value_type("Geometry", "Point", TypeAttributes::PUBLIC)
            .unwrap();
        let x = builder
            .add_field(point_def, "x", int, FieldAttributes::PUBLIC)
            .unwrap();
        let y = builder
            .add_field(point_def, "y", float, FieldAttributes::PUBLIC)
            .unwrap();
        let point_type = builder.type_of(point_def).unwrap();
        registry.register_image(builder.build()).unwrap();

        PointFixture {
            registry,
            int,
            float,
            point_def,
            point_type,
            x,
            y,
        }
    }
}

/// ```text
/// class Box<T> {
///     public T value;
///     public T Convert<U>(U input);
///     public virtual string Describe();
/// }
/// class Other<T> { }
/// ```
pub(crate) struct GenericFixture {
    pub registry: MetadataRegistry,
    pub int: TypeId,
    pub float: TypeId,
    pub string: TypeId,
    pub box_def: MetadataHandle,
    pub box_t: TypeId,
    pub value: MetadataHandle,
    pub convert: MetadataHandle,
    pub convert_u: TypeId,
    pub describe: MetadataHandle,
    pub other_def: MetadataHandle,
    pub other_t: TypeId,
}

impl GenericFixture {
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        let registry = MetadataRegistry::with_config(config);
        let int = registry.primitive(ElementType::I4).unwrap();
        let float = registry.primitive(ElementType::R4).unwrap();
        let string = registry.primitive(ElementType::String).unwrap();
        let index = registry.allocate_image_index(16).unwrap();

        let mut builder = ImageBuilder::new(&registry, index, "Generics.dll");
        let box_def = builder
            .add_class("Generics", "Box`1", TypeAttributes::PUBLIC)
            .unwrap();
        let box_t = builder
            .add_type_generic_parameters(box_def, &["T"])
            .unwrap()[0];

        let value = builder
            .add_field(box_def, "value", box_t, FieldAttributes::PUBLIC)
            .unwrap();

        let convert = builder
            .add_method(box_def, "Convert", MethodAttributes::PUBLIC)
            .unwrap();
        let convert_u = builder
            .add_method_generic_parameters(convert, &["U"])
            .unwrap()[0];
        builder.set_signature(convert, box_t, &[convert_u]).unwrap();

        let describe = builder
            .add_method(
                box_def,
                "Describe",
                MethodAttributes::PUBLIC | MethodAttributes::VIRTUAL,
            )
            .unwrap();
        builder.set_signature(describe, string, &[]).unwrap();

        let other_def = builder
            .add_class("Generics", "Other`1", TypeAttributes::PUBLIC)
            .unwrap();
        let other_t = builder
            .add_type_generic_parameters(other_def, &["T"])
            .unwrap()[0];

        registry.register_image(builder.build()).unwrap();

        GenericFixture {
            registry,
            int,
            float,
            string,
            box_def,
            box_t,
            value,
            convert,
            convert_u,
            describe,
            other_def,
            other_t,
        }
    }
}
