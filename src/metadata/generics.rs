//! Generic inflation.
//!
//! Inflation replaces the generic variables of an open reference with the arguments of a
//! [`GenericContext`]: `Var n` takes the `n`-th class argument, `MVar n` the `n`-th method
//! argument. Substitution recurses through pointers, arrays and the arguments of generic
//! instances, so `List<T>[]` under `T = int` becomes `List<int>[]`.
//!
//! Closed references come back as the very same [`TypeId`] and nothing is allocated.
//! New descriptors are only created for the parts that actually changed, and are
//! interned when the registry is configured to do so.
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
//!
//! let mut builder = ImageBuilder::new(&registry, index, "Lib.dll");
//! let list = builder.add_class("", "List`1", TypeAttributes::PUBLIC)?;
//! let t = builder.add_type_generic_parameters(list, &["T"])?[0];
//! registry.register_image(builder.build())?;
//!
//! let inflator = GenericInflator::new(&registry);
//! let array_of_t = registry.make_szarray(t)?;
//! assert!(inflator.has_unresolved_generic(array_of_t)?);
//!
//! let context = GenericContext::for_class(registry.generic_inst(vec![int]));
//! let array_of_int = inflator.try_inflate(array_of_t, &context, false)?;
//! assert_eq!(array_of_int, registry.make_szarray(int)?);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use crate::{
    metadata::{
        definitions::MethodDefinitionRc,
        registry::MetadataRegistry,
        typesystem::{
            ElementType, GenericContext, GenericInstId, TypeData, TypeDescriptor, TypeId,
        },
    },
    Error, Result,
};

/// A method with its signature closed over a generic context
#[derive(Debug, Clone)]
pub struct InflatedMethod {
    /// The open definition
    pub method: MethodDefinitionRc,
    /// Arguments the signature was inflated with
    pub context: GenericContext,
    /// Inflated return type
    pub return_type: TypeId,
    /// Inflated parameter types
    pub params: Vec<TypeId>,
}

/// Substitutes generic arguments into type references
pub struct GenericInflator<'a> {
    registry: &'a MetadataRegistry,
}

impl<'a> GenericInflator<'a> {
    /// Creates an inflator over the registry's arena and images
    #[must_use]
    pub fn new(registry: &'a MetadataRegistry) -> Self {
        GenericInflator { registry }
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        let limit = self.registry.config().max_recursion_depth;
        if depth >= limit {
            return Err(Error::RecursionLimit(limit));
        }
        Ok(())
    }

    /// Substitutes the variables bound by `context` into `ty`.
    ///
    /// `MVar`s are only substituted when `inflate_method_vars` is set; unbound variables
    /// (no arguments of that kind in `context`) are left in place.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if a variable's position lies past the end of the
    /// bound arguments, and [`Error::RecursionLimit`] for nesting beyond the limit.
    pub fn try_inflate(
        &self,
        ty: TypeId,
        context: &GenericContext,
        inflate_method_vars: bool,
    ) -> Result<TypeId> {
        if context.is_empty() {
            return Ok(ty);
        }
        self.inflate(ty, context, inflate_method_vars, 0)
    }

    fn inflate(
        &self,
        ty: TypeId,
        context: &GenericContext,
        inflate_method_vars: bool,
        depth: usize,
    ) -> Result<TypeId> {
        self.check_depth(depth)?;
        let desc = self.registry.descriptor(ty)?;

        match desc.kind {
            ElementType::Var => match context.class_inst {
                Some(inst) => self.bind(ty, desc, inst),
                None => Ok(ty),
            },
            ElementType::MVar => match context.method_inst {
                Some(inst) if inflate_method_vars => self.bind(ty, desc, inst),
                _ => Ok(ty),
            },
            ElementType::Ptr | ElementType::SzArray => {
                let TypeData::Element(element) = desc.data else {
                    return Err(malformed_error!("{:?} without element type", desc.kind));
                };
                let inflated = self.inflate(element, context, inflate_method_vars, depth + 1)?;
                if inflated == element {
                    return Ok(ty);
                }
                Ok(self.registry.intern_type(TypeDescriptor {
                    data: TypeData::Element(inflated),
                    ..desc
                }))
            }
            ElementType::Array => {
                let TypeData::Array { element, rank } = desc.data else {
                    return Err(malformed_error!("Array without element type"));
                };
                let inflated = self.inflate(element, context, inflate_method_vars, depth + 1)?;
                if inflated == element {
                    return Ok(ty);
                }
                Ok(self.registry.intern_type(TypeDescriptor {
                    data: TypeData::Array {
                        element: inflated,
                        rank,
                    },
                    ..desc
                }))
            }
            ElementType::GenericInst => {
                let TypeData::GenericClass(class) = desc.data else {
                    return Err(malformed_error!("GenericInst without generic class"));
                };
                let class = self.registry.get_generic_class(class)?;
                let inst =
                    self.inflate_inst(class.class_inst, context, inflate_method_vars, depth + 1)?;
                if inst == class.class_inst {
                    return Ok(ty);
                }
                Ok(self
                    .registry
                    .make_generic_instance_from(desc, class.definition, inst))
            }
            _ => Ok(ty),
        }
    }

    /// Replaces a variable by its argument; the result keeps the variable's use-site
    /// attributes and flags
    fn bind(&self, ty: TypeId, var: TypeDescriptor, inst: GenericInstId) -> Result<TypeId> {
        let position = self.registry.generic_position(var.data)?;
        let args = self.registry.get_generic_inst(inst)?;
        let Some(&arg) = args.args.get(position as usize) else {
            return Err(malformed_error!(
                "Generic variable {} of {:?} is out of range - {} arguments bound",
                position,
                ty,
                args.len()
            ));
        };

        let arg_desc = self.registry.descriptor(arg)?;
        if arg_desc.byref == var.byref && arg_desc.attrs == var.attrs && arg_desc.pinned == var.pinned
        {
            return Ok(arg);
        }

        Ok(self.registry.intern_type(TypeDescriptor {
            attrs: var.attrs,
            byref: var.byref,
            pinned: var.pinned,
            ..arg_desc
        }))
    }

    /// Substitutes `context` into every argument of `inst`
    ///
    /// # Errors
    /// Same as [`try_inflate`](Self::try_inflate).
    pub fn try_inflate_generic_inst(
        &self,
        inst: GenericInstId,
        context: &GenericContext,
    ) -> Result<GenericInstId> {
        if context.is_empty() {
            return Ok(inst);
        }
        self.inflate_inst(inst, context, true, 0)
    }

    fn inflate_inst(
        &self,
        inst: GenericInstId,
        context: &GenericContext,
        inflate_method_vars: bool,
        depth: usize,
    ) -> Result<GenericInstId> {
        self.check_depth(depth)?;
        let args = &self.registry.get_generic_inst(inst)?.args;

        let mut inflated = Vec::with_capacity(args.len());
        let mut changed = false;
        for arg in args {
            let new = self.inflate(*arg, context, inflate_method_vars, depth + 1)?;
            changed |= new != *arg;
            inflated.push(new);
        }

        if !changed {
            return Ok(inst);
        }
        Ok(self.registry.generic_inst(inflated))
    }

    /// The class context of a generic instance type, empty for any other type
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] for unknown ids.
    pub fn context_of(&self, ty: TypeId) -> Result<GenericContext> {
        let desc = self.registry.descriptor(ty)?;
        match desc.data {
            TypeData::GenericClass(class) if desc.kind == ElementType::GenericInst => Ok(
                GenericContext::for_class(self.registry.get_generic_class(class)?.class_inst),
            ),
            _ => Ok(GenericContext::default()),
        }
    }

    /// Inflates `self_type`, as written inside the definition of `container_type`, with
    /// the class arguments of `container_type`.
    ///
    /// For `container_type = List<int>` and `self_type = T[]` this yields `int[]`.
    /// Containers that are not generic instances leave `self_type` unchanged.
    ///
    /// # Errors
    /// Same as [`try_inflate`](Self::try_inflate).
    pub fn try_inflate_in_type(&self, container_type: TypeId, self_type: TypeId) -> Result<TypeId> {
        let context = self.context_of(container_type)?;
        self.try_inflate(self_type, &context, false)
    }

    /// True if `ty` still contains a generic variable anywhere
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] for unknown ids and [`Error::RecursionLimit`] for
    /// nesting beyond the limit.
    pub fn has_unresolved_generic(&self, ty: TypeId) -> Result<bool> {
        self.unresolved(ty, 0)
    }

    /// True if any argument of `inst` still contains a generic variable
    ///
    /// # Errors
    /// Same as [`has_unresolved_generic`](Self::has_unresolved_generic).
    pub fn has_unresolved_generic_inst(&self, inst: GenericInstId) -> Result<bool> {
        self.unresolved_inst(inst, 0)
    }

    fn unresolved(&self, ty: TypeId, depth: usize) -> Result<bool> {
        self.check_depth(depth)?;
        let desc = self.registry.descriptor(ty)?;

        match (desc.kind, desc.data) {
            (ElementType::Var | ElementType::MVar, _) => Ok(true),
            (_, TypeData::Element(element) | TypeData::Array { element, .. }) => {
                self.unresolved(element, depth + 1)
            }
            (ElementType::GenericInst, TypeData::GenericClass(class)) => {
                let class = self.registry.get_generic_class(class)?;
                self.unresolved_inst(class.class_inst, depth + 1)
            }
            _ => Ok(false),
        }
    }

    fn unresolved_inst(&self, inst: GenericInstId, depth: usize) -> Result<bool> {
        self.check_depth(depth)?;
        for arg in &self.registry.get_generic_inst(inst)?.args {
            if self.unresolved(*arg, depth + 1)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Closes the return and parameter types of `method` over `context`
    ///
    /// # Errors
    /// Same as [`try_inflate`](Self::try_inflate).
    pub fn inflate_method(
        &self,
        method: &MethodDefinitionRc,
        context: &GenericContext,
    ) -> Result<InflatedMethod> {
        let return_type = self.try_inflate(method.return_type, context, true)?;
        let params = method
            .params
            .iter()
            .map(|param| self.try_inflate(*param, context, true))
            .collect::<Result<Vec<_>>>()?;

        tracing::trace!(method = %method.name, ?context, "inflated method signature");
        Ok(InflatedMethod {
            method: method.clone(),
            context: *context,
            return_type,
            params,
        })
    }
}
