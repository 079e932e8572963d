//! Structural type comparison.
//!
//! Unlike shallow identity, these comparisons follow element types and generic
//! arguments, so independently created descriptors for `List<int>[]` compare equal.
//! Use-site attributes and the pinned flag are not part of a type's identity here.

use crate::{
    metadata::{
        registry::MetadataRegistry,
        typesystem::{ElementType, GenericInstId, TypeData, TypeId},
    },
    Error, Result,
};

/// How generic variables are compared
#[derive(Clone, Copy, PartialEq, Eq)]
enum VarMode {
    /// Same declared parameter
    Identity,
    /// Same position, whatever declared it
    Position,
}

impl MetadataRegistry {
    /// Deep semantic equality of two types.
    ///
    /// Generic variables are equal only if they refer to the same declared parameter
    /// (or, for positional variables, carry the same position).
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] for unknown ids and [`Error::RecursionLimit`] for
    /// types nested deeper than the configured limit.
    pub fn is_type_equal(&self, a: TypeId, b: TypeId) -> Result<bool> {
        self.compare_types(a, b, VarMode::Identity, 0)
    }

    /// Deep equality treating two generic variables of the same kind as equal when they
    /// sit at the same position.
    ///
    /// This is what override matching needs: `void M(T)` in `Base<T>` and `void M(U)` in
    /// `Derived<U> : Base<U>` are compatible although `T` and `U` are different
    /// declarations.
    ///
    /// # Errors
    /// Same as [`is_type_equal`](Self::is_type_equal).
    pub fn is_type_generic_compatible(&self, a: TypeId, b: TypeId) -> Result<bool> {
        self.compare_types(a, b, VarMode::Position, 0)
    }

    /// Position of a `Var`/`MVar` payload inside its container
    pub(crate) fn generic_position(&self, data: TypeData) -> Result<u32> {
        match data {
            TypeData::GenericParam(handle) => Ok(self.generic_parameter(handle)?.num),
            TypeData::GenericIndex(position) => Ok(position),
            other => Err(malformed_error!(
                "Generic variable without parameter - {:?}",
                other
            )),
        }
    }

    fn compare_types(&self, a: TypeId, b: TypeId, mode: VarMode, depth: usize) -> Result<bool> {
        if depth >= self.config().max_recursion_depth {
            return Err(Error::RecursionLimit(self.config().max_recursion_depth));
        }
        if a == b {
            return Ok(true);
        }

        let da = self.descriptor(a)?;
        let db = self.descriptor(b)?;
        if da.kind != db.kind || da.byref != db.byref {
            return Ok(false);
        }

        match (da.kind, da.data, db.data) {
            (ElementType::Var | ElementType::MVar, left, right) => match mode {
                VarMode::Identity => Ok(left == right),
                VarMode::Position => {
                    Ok(self.generic_position(left)? == self.generic_position(right)?)
                }
            },
            (_, TypeData::Element(left), TypeData::Element(right)) => {
                self.compare_types(left, right, mode, depth + 1)
            }
            (
                _,
                TypeData::Array {
                    element: left,
                    rank: left_rank,
                },
                TypeData::Array {
                    element: right,
                    rank: right_rank,
                },
            ) => Ok(left_rank == right_rank && self.compare_types(left, right, mode, depth + 1)?),
            (_, TypeData::GenericClass(left), TypeData::GenericClass(right)) => {
                let left = self.get_generic_class(left)?;
                let right = self.get_generic_class(right)?;
                Ok(left.definition == right.definition
                    && self.compare_insts(left.class_inst, right.class_inst, mode, depth + 1)?)
            }
            (_, left, right) => Ok(left == right),
        }
    }

    fn compare_insts(
        &self,
        a: GenericInstId,
        b: GenericInstId,
        mode: VarMode,
        depth: usize,
    ) -> Result<bool> {
        if a == b {
            return Ok(true);
        }

        let left = self.get_generic_inst(a)?;
        let right = self.get_generic_inst(b)?;
        if left.len() != right.len() {
            return Ok(false);
        }

        for (l, r) in left.args.iter().zip(&right.args) {
            if !self.compare_types(*l, *r, mode, depth)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
