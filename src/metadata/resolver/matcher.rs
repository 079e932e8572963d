//! Signature matching.
//!
//! `dst` types come from a definition, `sig` types from the signature being resolved.
//! A `Var` in the signature matches a `Var` of the definition when it sits at the same
//! position and the definition's variable belongs to the class container in scope; a
//! declared variable in the signature must belong to that container as well. `MVar`
//! works the same way against the method container.

use crate::{
    metadata::{
        attributes::is_instance_method,
        definitions::MethodDefinition,
        generics::InflatedMethod,
        handle::MetadataHandle,
        resolver::MemberResolver,
        signatures::MethodSignature,
        typesystem::{ElementType, GenericContext, TypeData, TypeDescriptor, TypeId},
    },
    Result,
};

impl MemberResolver<'_> {
    /// True if the definition type `dst` is what the signature type `sig` asks for.
    ///
    /// Generic variables are resolved against `klass_container` (for `Var`) and
    /// `method_container` (for `MVar`); a variable without a container in scope never
    /// matches. Use-site attributes are ignored, the by-reference flag must agree.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for unknown ids or parameters and
    /// [`crate::Error::RecursionLimit`] for nesting beyond the limit.
    pub fn is_match_sig_type(
        &self,
        dst: TypeId,
        sig: TypeId,
        klass_container: Option<MetadataHandle>,
        method_container: Option<MetadataHandle>,
    ) -> Result<bool> {
        self.match_sig_type(dst, sig, klass_container, method_container, 0)
    }

    fn match_sig_type(
        &self,
        dst: TypeId,
        sig: TypeId,
        klass_container: Option<MetadataHandle>,
        method_container: Option<MetadataHandle>,
        depth: usize,
    ) -> Result<bool> {
        self.check_depth(depth)?;

        let d = self.registry.descriptor(dst)?;
        let s = self.registry.descriptor(sig)?;
        if d.byref != s.byref || d.kind != s.kind {
            return Ok(false);
        }

        match (s.kind, s.data, d.data) {
            (ElementType::Var, _, _) => self.match_generic_var(&d, &s, klass_container),
            (ElementType::MVar, _, _) => self.match_generic_var(&d, &s, method_container),
            (_, TypeData::Element(sig_elem), TypeData::Element(dst_elem)) => self.match_sig_type(
                dst_elem,
                sig_elem,
                klass_container,
                method_container,
                depth + 1,
            ),
            (
                _,
                TypeData::Array {
                    element: sig_elem,
                    rank: sig_rank,
                },
                TypeData::Array {
                    element: dst_elem,
                    rank: dst_rank,
                },
            ) => Ok(sig_rank == dst_rank
                && self.match_sig_type(
                    dst_elem,
                    sig_elem,
                    klass_container,
                    method_container,
                    depth + 1,
                )?),
            (_, TypeData::GenericClass(sig_class), TypeData::GenericClass(dst_class)) => {
                let sig_class = self.registry.get_generic_class(sig_class)?;
                let dst_class = self.registry.get_generic_class(dst_class)?;
                if sig_class.definition != dst_class.definition {
                    return Ok(false);
                }

                let sig_args = &self.registry.get_generic_inst(sig_class.class_inst)?.args;
                let dst_args = &self.registry.get_generic_inst(dst_class.class_inst)?.args;
                if sig_args.len() != dst_args.len() {
                    return Ok(false);
                }
                for (dst_arg, sig_arg) in dst_args.iter().zip(sig_args) {
                    if !self.match_sig_type(
                        *dst_arg,
                        *sig_arg,
                        klass_container,
                        method_container,
                        depth + 1,
                    )? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (_, sig_data, dst_data) => Ok(sig_data == dst_data),
        }
    }

    fn match_generic_var(
        &self,
        dst: &TypeDescriptor,
        sig: &TypeDescriptor,
        container: Option<MetadataHandle>,
    ) -> Result<bool> {
        let Some(container) = container else {
            return Ok(false);
        };
        let TypeData::GenericParam(dst_param) = dst.data else {
            return Ok(false);
        };

        let dst_param = self.registry.generic_parameter(dst_param)?;
        if dst_param.owner != container {
            return Ok(false);
        }

        match sig.data {
            TypeData::GenericIndex(position) => Ok(position == dst_param.num),
            TypeData::GenericParam(sig_param) => {
                let sig_param = self.registry.generic_parameter(sig_param)?;
                Ok(sig_param.owner == container && sig_param.num == dst_param.num)
            }
            _ => Ok(false),
        }
    }

    /// True if `candidate` is the method `signature` asks for.
    ///
    /// Compares parameter count, generic arity (against the candidate's own container),
    /// return type and parameter types. Variables resolve against `klass_container` and
    /// the candidate's container. The `HAS_THIS` prolog bit is only compared under
    /// [`ResolverConfig::strict`](crate::metadata::config::ResolverConfig::strict).
    ///
    /// # Errors
    /// Same as [`is_match_sig_type`](Self::is_match_sig_type).
    pub fn is_match_method_sig(
        &self,
        candidate: &MethodDefinition,
        signature: &MethodSignature,
        klass_container: Option<MetadataHandle>,
    ) -> Result<bool> {
        if candidate.params.len() != signature.params.len() {
            return Ok(false);
        }
        if self.registry.config().match_instance_flag
            && is_instance_method(candidate.flags) != signature.has_this()
        {
            return Ok(false);
        }

        let method_container = candidate.generic_container;
        if self.registry.generic_arity(method_container)? != signature.generic_param_count as usize
        {
            return Ok(false);
        }

        if !self.is_match_sig_type(
            candidate.return_type,
            signature.return_type,
            klass_container,
            method_container,
        )? {
            return Ok(false);
        }

        for (dst, sig) in candidate.params.iter().zip(&signature.params) {
            if !self.is_match_sig_type(*dst, *sig, klass_container, method_container)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// True if an inflated method matches `signature` once the signature is closed over
    /// `context`.
    ///
    /// The signature's variables are substituted with the concrete arguments first; the
    /// resulting closed types are compared with deep equality.
    ///
    /// # Errors
    /// Same as [`is_match_sig_type`](Self::is_match_sig_type), plus inflation failures.
    pub fn is_match_method_sig_with_args(
        &self,
        candidate: &InflatedMethod,
        signature: &MethodSignature,
        context: &GenericContext,
    ) -> Result<bool> {
        if candidate.params.len() != signature.params.len() {
            return Ok(false);
        }
        if self.registry.config().match_instance_flag
            && candidate.method.is_instance() != signature.has_this()
        {
            return Ok(false);
        }
        if self.registry.generic_arity(candidate.method.generic_container)?
            != signature.generic_param_count as usize
        {
            return Ok(false);
        }

        let return_type = self.inflator.try_inflate(signature.return_type, context, true)?;
        if !self
            .registry
            .is_type_equal(candidate.return_type, return_type)?
        {
            return Ok(false);
        }

        for (dst, sig) in candidate.params.iter().zip(&signature.params) {
            let sig = self.inflator.try_inflate(*sig, context, true)?;
            if !self.registry.is_type_equal(*dst, sig)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        metadata::{
            config::ResolverConfig,
            resolver::MemberResolver,
            signatures::MethodSignature,
            typesystem::{ElementType, GenericContext, TypeData, TypeDescriptor},
        },
        test::factories::GenericFixture,
    };

    #[test]
    fn test_var_positions_resolve_against_container() {
        let fixture = GenericFixture::new();
        let registry = &fixture.registry;
        let resolver = MemberResolver::new(registry);
        let box_container = registry
            .type_definition(fixture.box_def)
            .unwrap()
            .generic_container;
        let other_container = registry
            .type_definition(fixture.other_def)
            .unwrap()
            .generic_container;

        let t0 = registry.intern_type(TypeDescriptor::new(
            ElementType::Var,
            TypeData::GenericIndex(0),
        ));
        let t1 = registry.intern_type(TypeDescriptor::new(
            ElementType::Var,
            TypeData::GenericIndex(1),
        ));

        assert!(resolver
            .is_match_sig_type(fixture.box_t, t0, box_container, None)
            .unwrap());
        assert!(!resolver
            .is_match_sig_type(fixture.box_t, t1, box_container, None)
            .unwrap());
        // the definition's T is not a parameter of the container in scope
        assert!(!resolver
            .is_match_sig_type(fixture.box_t, t0, other_container, None)
            .unwrap());
        // no container in scope at all
        assert!(!resolver
            .is_match_sig_type(fixture.box_t, t0, None, None)
            .unwrap());
        // declared parameters of unrelated types never match
        assert!(!resolver
            .is_match_sig_type(fixture.box_t, fixture.other_t, box_container, None)
            .unwrap());
        assert!(resolver
            .is_match_sig_type(fixture.box_t, fixture.box_t, box_container, None)
            .unwrap());
    }

    #[test]
    fn test_structural_types() {
        let fixture = GenericFixture::new();
        let registry = &fixture.registry;
        let resolver = MemberResolver::new(registry);
        let box_container = registry
            .type_definition(fixture.box_def)
            .unwrap()
            .generic_container;

        let t0 = registry.intern_type(TypeDescriptor::new(
            ElementType::Var,
            TypeData::GenericIndex(0),
        ));
        let dst = registry.make_szarray(fixture.box_t).unwrap();
        let sig = registry.make_szarray(t0).unwrap();
        assert!(resolver
            .is_match_sig_type(dst, sig, box_container, None)
            .unwrap());

        let byref_sig = registry.make_byref(sig).unwrap();
        assert!(!resolver
            .is_match_sig_type(dst, byref_sig, box_container, None)
            .unwrap());

        let md = registry.make_array(fixture.int, 2).unwrap();
        let md3 = registry.make_array(fixture.int, 3).unwrap();
        assert!(!resolver.is_match_sig_type(md, md3, None, None).unwrap());
        assert!(resolver.is_match_sig_type(md, md, None, None).unwrap());

        // Box<T> written in the definition vs Box<!0> in the signature
        let dst_inst = registry
            .make_generic_instance(fixture.box_def, &[fixture.box_t])
            .unwrap();
        let sig_inst = registry
            .make_generic_instance(fixture.box_def, &[t0])
            .unwrap();
        assert!(resolver
            .is_match_sig_type(dst_inst, sig_inst, box_container, None)
            .unwrap());
        let other_inst = registry
            .make_generic_instance(fixture.other_def, &[t0])
            .unwrap();
        assert!(!resolver
            .is_match_sig_type(dst_inst, other_inst, box_container, None)
            .unwrap());
    }

    #[test]
    fn test_instance_flag_ignored_by_default() {
        let fixture = GenericFixture::new();
        let registry = &fixture.registry;
        let resolver = MemberResolver::new(registry);

        let describe = registry.method_definition(fixture.describe).unwrap();
        let instance = MethodSignature::instance(fixture.string, vec![]);
        let stat = MethodSignature::static_method(fixture.string, vec![]);

        let box_container = registry
            .type_definition(fixture.box_def)
            .unwrap()
            .generic_container;
        assert!(resolver
            .is_match_method_sig(&describe, &instance, box_container)
            .unwrap());
        assert!(resolver
            .is_match_method_sig(&describe, &stat, box_container)
            .unwrap());
    }

    #[test]
    fn test_instance_flag_strict() {
        let fixture = GenericFixture::with_config(ResolverConfig::strict());
        let registry = &fixture.registry;
        let resolver = MemberResolver::new(registry);

        let describe = registry.method_definition(fixture.describe).unwrap();
        let instance = MethodSignature::instance(fixture.string, vec![]);
        let stat = MethodSignature::static_method(fixture.string, vec![]);

        let box_container = registry
            .type_definition(fixture.box_def)
            .unwrap()
            .generic_container;
        assert!(resolver
            .is_match_method_sig(&describe, &instance, box_container)
            .unwrap());
        assert!(!resolver
            .is_match_method_sig(&describe, &stat, box_container)
            .unwrap());

        let convert = registry.method_definition(fixture.convert).unwrap();
        let ctx = GenericContext::for_class(registry.generic_inst(vec![fixture.float]))
            .with_method_inst(registry.generic_inst(vec![fixture.int]));
        let inflated = resolver.inflator().inflate_method(&convert, &ctx).unwrap();
        let closed_static =
            MethodSignature::static_method(fixture.float, vec![fixture.int]).with_generic_params(1);
        assert!(!resolver
            .is_match_method_sig_with_args(&inflated, &closed_static, &ctx)
            .unwrap());
    }

    #[test]
    fn test_match_with_concrete_args() {
        let fixture = GenericFixture::new();
        let registry = &fixture.registry;
        let resolver = MemberResolver::new(registry);

        let convert = registry.method_definition(fixture.convert).unwrap();
        let ctx = GenericContext::for_class(registry.generic_inst(vec![fixture.float]))
            .with_method_inst(registry.generic_inst(vec![fixture.int]));
        let inflated = resolver.inflator().inflate_method(&convert, &ctx).unwrap();

        let t0 = registry.intern_type(TypeDescriptor::new(
            ElementType::Var,
            TypeData::GenericIndex(0),
        ));
        let m0 = registry.intern_type(TypeDescriptor::new(
            ElementType::MVar,
            TypeData::GenericIndex(0),
        ));

        let open = MethodSignature::instance(t0, vec![m0]).with_generic_params(1);
        assert!(resolver
            .is_match_method_sig_with_args(&inflated, &open, &ctx)
            .unwrap());

        let closed = MethodSignature::instance(fixture.float, vec![fixture.int])
            .with_generic_params(1);
        assert!(resolver
            .is_match_method_sig_with_args(&inflated, &closed, &ctx)
            .unwrap());

        let wrong = MethodSignature::instance(fixture.float, vec![fixture.float])
            .with_generic_params(1);
        assert!(!resolver
            .is_match_method_sig_with_args(&inflated, &wrong, &ctx)
            .unwrap());
    }
}
