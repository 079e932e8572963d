//! A class hierarchy across two images.
//!
//! ```text
//! AOT image:
//!     class Animal              { virtual string Speak(); virtual void Eat(int); }
//!     class Sink<T>             { virtual newslot void Put(T); }
//!
//! interpreter image:
//!     class Dog : Animal        { virtual string Speak(); virtual newslot void Eat(int);
//!                                 virtual final newslot void Bark(); }
//!     class Puppy : Dog         { virtual void Bark(); }
//!     class IntSink : Sink<int> { virtual void Put(int); virtual void Put(string); }
//!     class Forwarder<U> : Sink<U> { virtual void Put(U); }
//! ```

use crate::metadata::{
    attributes::{MethodAttributes, TypeAttributes},
    handle::{ImageIndex, MetadataHandle},
    image::ImageBuilder,
    registry::MetadataRegistry,
    typesystem::{ElementType, TypeId},
};

pub(crate) struct HierarchyFixture {
    pub registry: MetadataRegistry,
    pub animal: TypeId,
    pub animal_speak: MetadataHandle,
    pub animal_eat: MetadataHandle,
    pub sink: TypeId,
    pub sink_put: MetadataHandle,
    pub dog: TypeId,
    pub dog_speak: MetadataHandle,
    pub dog_eat: MetadataHandle,
    pub dog_bark: MetadataHandle,
    pub puppy: TypeId,
    pub puppy_bark: MetadataHandle,
    pub int_sink: TypeId,
    pub int_sink_put: MetadataHandle,
    pub int_sink_put_string: MetadataHandle,
    pub forwarder: TypeId,
    pub forwarder_put: MetadataHandle,
}

const VIRTUAL: u32 = MethodAttributes::PUBLIC | MethodAttributes::VIRTUAL;
const NEW_SLOT: u32 = VIRTUAL | MethodAttributes::NEW_SLOT;

impl HierarchyFixture {
    pub fn new() -> Self {
        let registry = MetadataRegistry::new();
        let int = registry.primitive(ElementType::I4).unwrap();
        let string = registry.primitive(ElementType::String).unwrap();

        let mut aot = ImageBuilder::new(&registry, ImageIndex::AOT, "mscorlib");
        let animal_def = aot.add_class("Zoo", "Animal", TypeAttributes::PUBLIC).unwrap();
        let animal = aot.type_of(animal_def).unwrap();
        let animal_speak = aot.add_method(animal_def, "Speak", NEW_SLOT).unwrap();
        aot.set_signature(animal_speak, string, &[]).unwrap();
        let animal_eat = aot.add_method(animal_def, "Eat", NEW_SLOT).unwrap();
        aot.set_signature(animal_eat, void(&registry), &[int])
            .unwrap();

        let sink_def = aot.add_class("Zoo", "Sink`1", TypeAttributes::PUBLIC).unwrap();
        let sink = aot.type_of(sink_def).unwrap();
        let sink_t = aot.add_type_generic_parameters(sink_def, &["T"]).unwrap()[0];
        let sink_put = aot.add_method(sink_def, "Put", NEW_SLOT).unwrap();
        aot.set_signature(sink_put, void(&registry), &[sink_t])
            .unwrap();
        registry.register_image(aot.build()).unwrap();

        let index = registry.allocate_image_index(32).unwrap();
        let mut hot = ImageBuilder::new(&registry, index, "Zoo.Hot.dll");

        let dog_def = hot.add_class("Zoo", "Dog", TypeAttributes::PUBLIC).unwrap();
        let dog = hot.type_of(dog_def).unwrap();
        hot.set_parent(dog_def, animal).unwrap();
        let dog_speak = hot.add_method(dog_def, "Speak", VIRTUAL).unwrap();
        hot.set_signature(dog_speak, string, &[]).unwrap();
        let dog_eat = hot.add_method(dog_def, "Eat", NEW_SLOT).unwrap();
        hot.set_signature(dog_eat, void(&registry), &[int])
            .unwrap();
        let dog_bark = hot
            .add_method(dog_def, "Bark", NEW_SLOT | MethodAttributes::FINAL)
            .unwrap();

        let puppy_def = hot.add_class("Zoo", "Puppy", TypeAttributes::PUBLIC).unwrap();
        let puppy = hot.type_of(puppy_def).unwrap();
        hot.set_parent(puppy_def, dog).unwrap();
        let puppy_bark = hot.add_method(puppy_def, "Bark", VIRTUAL).unwrap();

        let int_sink_def = hot
            .add_class("Zoo", "IntSink", TypeAttributes::PUBLIC)
            .unwrap();
        let int_sink = hot.type_of(int_sink_def).unwrap();
        let sink_of_int = registry.make_generic_instance(sink_def, &[int]).unwrap();
        hot.set_parent(int_sink_def, sink_of_int).unwrap();
        let int_sink_put = hot.add_method(int_sink_def, "Put", VIRTUAL).unwrap();
        hot.set_signature(int_sink_put, void(&registry), &[int])
            .unwrap();
        let int_sink_put_string = hot.add_method(int_sink_def, "Put", VIRTUAL).unwrap();
        hot.set_signature(int_sink_put_string, void(&registry), &[string])
            .unwrap();

        let forwarder_def = hot
            .add_class("Zoo", "Forwarder`1", TypeAttributes::PUBLIC)
            .unwrap();
        let forwarder = hot.type_of(forwarder_def).unwrap();
        let forwarder_u = hot
            .add_type_generic_parameters(forwarder_def, &["U"])
            .unwrap()[0];
        let sink_of_u = registry
            .make_generic_instance(sink_def, &[forwarder_u])
            .unwrap();
        hot.set_parent(forwarder_def, sink_of_u).unwrap();
        let forwarder_put = hot.add_method(forwarder_def, "Put", VIRTUAL).unwrap();
        hot.set_signature(forwarder_put, void(&registry), &[forwarder_u])
            .unwrap();

        registry.register_image(hot.build()).unwrap();

        HierarchyFixture {
            registry,
            animal,
            animal_speak,
            animal_eat,
            sink,
            sink_put,
            dog,
            dog_speak,
            dog_eat,
            dog_bark,
            puppy,
            puppy_bark,
            int_sink,
            int_sink_put,
            int_sink_put_string,
            forwarder,
            forwarder_put,
        }
    }
}

fn void(registry: &MetadataRegistry) -> TypeId {
    registry.primitive(ElementType::Void).unwrap()
}
