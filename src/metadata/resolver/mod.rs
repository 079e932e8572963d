//! Member resolution by name and signature.
//!
//! [`MemberResolver`] finds the field or method a member reference points at by scanning
//! the declared members of the target type, and decides which base method a virtual
//! method overrides. Both jobs compare signatures written in different generic scopes,
//! so generic variables are resolved against the right container: `T` of `List<T>` and
//! `T` of an unrelated `Box<T>` never match.
//!
//! Two failure disciplines coexist. The `find_*` queries return `None` when nothing
//! matches; the `resolve_*` variants turn that into [`Error::MissingField`] or
//! [`Error::MissingMethod`] for callers that can not proceed without the member.
//!
//! # Example
//!
//! ```rust
//! use hybridmeta::prelude::*;
//!
//! # fn example() -> hybridmeta::Result<()> {
//! let registry = MetadataRegistry::new();
//! let index = registry.allocate_image_index(8)?;
//! let int = registry.primitive(ElementType::I4)?;
//! let float = registry.primitive(ElementType::R4)?;
//!
//! let mut builder = ImageBuilder::new(&registry, index, "Geometry.dll");
//! let point = builder.add_value_type("", "Point", TypeAttributes::PUBLIC)?;
//! builder.add_field(point, "x", int, FieldAttributes::PUBLIC)?;
//! builder.add_field(point, "y", float, FieldAttributes::PUBLIC)?;
//! let point_type = builder.type_of(point)?;
//! registry.register_image(builder.build())?;
//!
//! let resolver = MemberResolver::new(&registry);
//! assert_eq!(resolver.resolve_field(point_type, "y", float)?.name, "y");
//! assert!(matches!(
//!     resolver.resolve_field(point_type, "z", int),
//!     Err(Error::MissingField { .. })
//! ));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod matcher;
mod overrides;

use crate::{
    metadata::{
        definitions::{FieldDefinitionRc, MethodDefinitionRc, TypeDefinitionRc},
        generics::GenericInflator,
        handle::MetadataHandle,
        registry::MetadataRegistry,
        signatures::MethodSignature,
        typesystem::{ElementType, TypeData, TypeId},
    },
    Error, Result,
};

/// Resolves fields and methods against the definitions of a [`MetadataRegistry`]
pub struct MemberResolver<'a> {
    registry: &'a MetadataRegistry,
    inflator: GenericInflator<'a>,
}

impl<'a> MemberResolver<'a> {
    /// Creates a resolver over the registry's images
    #[must_use]
    pub fn new(registry: &'a MetadataRegistry) -> Self {
        MemberResolver {
            registry,
            inflator: GenericInflator::new(registry),
        }
    }

    /// The inflator used for generic substitution
    #[must_use]
    pub fn inflator(&self) -> &GenericInflator<'a> {
        &self.inflator
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        let limit = self.registry.config().max_recursion_depth;
        if depth >= limit {
            return Err(Error::RecursionLimit(limit));
        }
        Ok(())
    }

    /// The definition behind a class, value type or generic instance.
    ///
    /// Returns `None` for types without a definition (primitives, arrays, pointers,
    /// generic variables).
    ///
    /// # Errors
    /// Returns [`Error::ImageNotRegistered`] or [`Error::Malformed`] if the definition
    /// handle leads nowhere.
    pub fn underlying_type_definition(&self, ty: TypeId) -> Result<Option<TypeDefinitionRc>> {
        let desc = self.registry.descriptor(ty)?;
        let handle = match (desc.kind, desc.data) {
            (ElementType::Class | ElementType::ValueType, TypeData::Definition(handle)) => handle,
            (ElementType::GenericInst, TypeData::GenericClass(class)) => {
                self.registry.get_generic_class(class)?.definition
            }
            _ => return Ok(None),
        };
        self.registry.type_definition(handle).map(Some)
    }

    /// The generic container of the definition behind `ty`, if it is generic
    ///
    /// # Errors
    /// Same as [`underlying_type_definition`](Self::underlying_type_definition).
    pub fn generic_container_of(&self, ty: TypeId) -> Result<Option<MetadataHandle>> {
        Ok(self
            .underlying_type_definition(ty)?
            .and_then(|def| def.generic_container))
    }

    fn type_name(&self, ty: TypeId) -> String {
        match self.underlying_type_definition(ty) {
            Ok(Some(def)) => def.fullname(),
            _ => format!("{ty:?}"),
        }
    }

    /// Finds the declared field `name` of `ty` whose type matches `field_type`.
    ///
    /// `field_type` is compared as written in a member reference: generic variables
    /// refer to the generic parameters of the declaring type. For a generic instance
    /// such as `Box<int>`, the inflated field type (`int` for a field declared `T`) is
    /// accepted as well.
    ///
    /// # Errors
    /// Propagates lookup failures of the type's tables.
    pub fn find_field(
        &self,
        ty: TypeId,
        name: &str,
        field_type: TypeId,
    ) -> Result<Option<FieldDefinitionRc>> {
        let Some(def) = self.underlying_type_definition(ty)? else {
            return Ok(None);
        };
        let is_instance = self.registry.descriptor(ty)?.kind == ElementType::GenericInst;

        for handle in &def.fields {
            let field = self.registry.field_definition(*handle)?;
            if field.name != name {
                continue;
            }

            if self.is_match_sig_type(field.field_type, field_type, def.generic_container, None)? {
                return Ok(Some(field));
            }
            if is_instance {
                let inflated = self.inflator.try_inflate_in_type(ty, field.field_type)?;
                if self.registry.is_type_equal(inflated, field_type)? {
                    return Ok(Some(field));
                }
            }
        }

        tracing::debug!(type_name = %def.fullname(), field = name, "field not found");
        Ok(None)
    }

    /// Like [`find_field`](Self::find_field), but a missing field is an error
    ///
    /// # Errors
    /// Returns [`Error::MissingField`] if no declared field matches.
    pub fn resolve_field(
        &self,
        ty: TypeId,
        name: &str,
        field_type: TypeId,
    ) -> Result<FieldDefinitionRc> {
        self.find_field(ty, name, field_type)?
            .ok_or_else(|| Error::MissingField {
                type_name: self.type_name(ty),
                field: name.to_string(),
            })
    }

    /// Finds the declared method `name` of `ty` matching `signature`
    ///
    /// # Errors
    /// Propagates lookup failures of the type's tables.
    pub fn find_method(
        &self,
        ty: TypeId,
        name: &str,
        signature: &MethodSignature,
    ) -> Result<Option<MethodDefinitionRc>> {
        let Some(def) = self.underlying_type_definition(ty)? else {
            return Ok(None);
        };

        for handle in &def.methods {
            let method = self.registry.method_definition(*handle)?;
            if method.name == name
                && self.is_match_method_sig(&method, signature, def.generic_container)?
            {
                return Ok(Some(method));
            }
        }

        tracing::debug!(type_name = %def.fullname(), method = name, "method not found");
        Ok(None)
    }

    /// Like [`find_method`](Self::find_method), but a missing method is an error
    ///
    /// # Errors
    /// Returns [`Error::MissingMethod`] if no declared method matches.
    pub fn resolve_method(
        &self,
        ty: TypeId,
        name: &str,
        signature: &MethodSignature,
    ) -> Result<MethodDefinitionRc> {
        self.find_method(ty, name, signature)?
            .ok_or_else(|| Error::MissingMethod {
                type_name: self.type_name(ty),
                method: name.to_string(),
            })
    }
}
