//! Override detection for virtual dispatch.
//!
//! Signatures of the two methods are compared in the scope of the type each is seen
//! through: the base method's `T` in `Base<T>` seen through `Base<int>` becomes `int`
//! before it is compared with the derived method's `int`. Remaining variables are
//! compared by position.

use crate::{
    metadata::{
        definitions::{MethodDefinition, MethodDefinitionRc},
        resolver::MemberResolver,
        typesystem::TypeId,
    },
    Error, Result,
};

impl MemberResolver<'_> {
    /// True if `derived`, declared by `derived_type`, overrides `base`, seen through
    /// `base_type`.
    ///
    /// Names must be equal, both methods virtual, `derived` must reuse its slot (a
    /// new-slot method never overrides) and `base` must not be final.
    ///
    /// # Errors
    /// Same as [`is_override_method_ignore_name`](Self::is_override_method_ignore_name).
    pub fn is_override_method(
        &self,
        derived_type: TypeId,
        derived: &MethodDefinition,
        base_type: TypeId,
        base: &MethodDefinition,
    ) -> Result<bool> {
        if derived.name != base.name
            || !derived.is_virtual()
            || !base.is_virtual()
            || derived.is_new_slot()
            || base.is_final()
        {
            return Ok(false);
        }

        self.is_override_method_ignore_name(derived_type, derived, base_type, base)
    }

    /// Signature-only part of override matching, used for explicit implementations
    /// where the names differ.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] for unknown ids and [`Error::RecursionLimit`] for
    /// nesting beyond the limit.
    pub fn is_override_method_ignore_name(
        &self,
        derived_type: TypeId,
        derived: &MethodDefinition,
        base_type: TypeId,
        base: &MethodDefinition,
    ) -> Result<bool> {
        if derived.params.len() != base.params.len() {
            return Ok(false);
        }
        if self.registry.generic_arity(derived.generic_container)?
            != self.registry.generic_arity(base.generic_container)?
        {
            return Ok(false);
        }

        let compatible = |derived_ty: TypeId, base_ty: TypeId| -> Result<bool> {
            let derived_ty = self.inflator.try_inflate_in_type(derived_type, derived_ty)?;
            let base_ty = self.inflator.try_inflate_in_type(base_type, base_ty)?;
            self.registry.is_type_generic_compatible(derived_ty, base_ty)
        };

        if !compatible(derived.return_type, base.return_type)? {
            return Ok(false);
        }
        for (derived_param, base_param) in derived.params.iter().zip(&base.params) {
            if !compatible(*derived_param, *base_param)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The base type of `ty`, inflated with `ty`'s class arguments
    ///
    /// # Errors
    /// Propagates lookup and inflation failures.
    pub fn parent_of(&self, ty: TypeId) -> Result<Option<TypeId>> {
        let Some(def) = self.underlying_type_definition(ty)? else {
            return Ok(None);
        };
        match def.parent {
            Some(parent) => Ok(Some(self.inflator.try_inflate_in_type(ty, parent)?)),
            None => Ok(None),
        }
    }

    /// Walks the base types of `ty` for the method that `method` overrides.
    ///
    /// Returns the base type the method was found through together with the method,
    /// or `None` if `method` introduces a new slot.
    ///
    /// # Errors
    /// Returns [`Error::RecursionLimit`] if the parent chain is longer than the limit
    /// (a cycle in corrupted metadata), plus lookup failures.
    pub fn find_overridden_method(
        &self,
        ty: TypeId,
        method: &MethodDefinition,
    ) -> Result<Option<(TypeId, MethodDefinitionRc)>> {
        if !method.is_virtual() || method.is_new_slot() {
            return Ok(None);
        }

        let limit = self.registry.config().max_recursion_depth;
        let mut current = self.parent_of(ty)?;
        let mut depth = 0;

        while let Some(parent) = current {
            depth += 1;
            if depth > limit {
                return Err(Error::RecursionLimit(limit));
            }

            if let Some(def) = self.underlying_type_definition(parent)? {
                for handle in &def.methods {
                    let candidate = self.registry.method_definition(*handle)?;
                    if self.is_override_method(ty, method, parent, &candidate)? {
                        tracing::trace!(
                            method = %method.name,
                            base = %def.fullname(),
                            "found overridden method"
                        );
                        return Ok(Some((parent, candidate)));
                    }
                }
            }
            current = self.parent_of(parent)?;
        }

        Ok(None)
    }
}
