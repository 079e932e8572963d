//! Closed enumerations decoded from masked attribute bits.

use strum::{EnumIter, IntoStaticStr};

use crate::{
    metadata::attributes::{MethodAttributes, PInvokeAttributes, TypeAttributes},
    Result,
};

/// Native calling convention of a P/Invoke target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub enum CallConvention {
    /// Platform default (`WinAPI`)
    Default,
    /// C calling convention
    Cdecl,
    /// Callee cleans the stack
    StdCall,
    /// `this` passed in a register
    ThisCall,
    /// Arguments passed in registers
    FastCall,
}

impl CallConvention {
    /// Decodes the calling convention bits of an `ImplMap` flag word
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the masked bits are not one of the five
    /// recognized conventions (including an unset convention).
    pub fn from_pinvoke_flags(mapping_flags: u32) -> Result<Self> {
        match mapping_flags & PInvokeAttributes::CALL_CONV_MASK {
            PInvokeAttributes::CALL_CONV_WINAPI => Ok(CallConvention::Default),
            PInvokeAttributes::CALL_CONV_CDECL => Ok(CallConvention::Cdecl),
            PInvokeAttributes::CALL_CONV_STDCALL => Ok(CallConvention::StdCall),
            PInvokeAttributes::CALL_CONV_THISCALL => Ok(CallConvention::ThisCall),
            PInvokeAttributes::CALL_CONV_FASTCALL => Ok(CallConvention::FastCall),
            other => Err(malformed_error!(
                "Unknown P/Invoke calling convention - 0x{:04x}",
                other
            )),
        }
    }

    /// The bits this convention occupies in an `ImplMap` flag word
    #[must_use]
    pub fn to_pinvoke_flags(self) -> u32 {
        match self {
            CallConvention::Default => PInvokeAttributes::CALL_CONV_WINAPI,
            CallConvention::Cdecl => PInvokeAttributes::CALL_CONV_CDECL,
            CallConvention::StdCall => PInvokeAttributes::CALL_CONV_STDCALL,
            CallConvention::ThisCall => PInvokeAttributes::CALL_CONV_THISCALL,
            CallConvention::FastCall => PInvokeAttributes::CALL_CONV_FASTCALL,
        }
    }
}

/// String marshalling of a P/Invoke target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub enum CharSet {
    /// No character set given
    NotSpecified,
    /// ANSI strings
    Ansi,
    /// UTF-16 strings
    Unicode,
}

impl CharSet {
    /// Decodes the character set bits of an `ImplMap` flag word
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for `CHAR_SET_AUTO`, which the runtime has no
    /// marshaller for.
    pub fn from_pinvoke_flags(mapping_flags: u32) -> Result<Self> {
        match mapping_flags & PInvokeAttributes::CHAR_SET_MASK {
            PInvokeAttributes::CHAR_SET_NOT_SPEC => Ok(CharSet::NotSpecified),
            PInvokeAttributes::CHAR_SET_ANSI => Ok(CharSet::Ansi),
            PInvokeAttributes::CHAR_SET_UNICODE => Ok(CharSet::Unicode),
            other => Err(malformed_error!(
                "Unsupported P/Invoke character set - 0x{:04x}",
                other
            )),
        }
    }
}

/// Accessibility of a method or field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, IntoStaticStr)]
pub enum MemberAccess {
    /// Member not referenceable
    CompilerControlled,
    /// Accessible only by the parent type
    Private,
    /// Accessible by sub-types only in this assembly
    FamAndAssem,
    /// Accessible by anyone in the assembly
    Assembly,
    /// Accessible only by type and sub-types
    Family,
    /// Accessible by sub-types anywhere, plus anyone in the assembly
    FamOrAssem,
    /// Accessible by anyone
    Public,
}

impl MemberAccess {
    /// Decodes the access bits of a method or field flag word
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for the unassigned pattern `0x7`.
    pub fn from_flags(flags: u32) -> Result<Self> {
        match flags & MethodAttributes::MEMBER_ACCESS_MASK {
            MethodAttributes::COMPILER_CONTROLLED => Ok(MemberAccess::CompilerControlled),
            MethodAttributes::PRIVATE => Ok(MemberAccess::Private),
            MethodAttributes::FAM_AND_ASSEM => Ok(MemberAccess::FamAndAssem),
            MethodAttributes::ASSEM => Ok(MemberAccess::Assembly),
            MethodAttributes::FAMILY => Ok(MemberAccess::Family),
            MethodAttributes::FAM_OR_ASSEM => Ok(MemberAccess::FamOrAssem),
            MethodAttributes::PUBLIC => Ok(MemberAccess::Public),
            other => Err(malformed_error!("Unknown member access - 0x{:x}", other)),
        }
    }
}

/// Visibility of a type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub enum TypeVisibility {
    /// Not visible outside its assembly
    NotPublic,
    /// Visible everywhere
    Public,
    /// Nested, public
    NestedPublic,
    /// Nested, private
    NestedPrivate,
    /// Nested, family
    NestedFamily,
    /// Nested, assembly
    NestedAssembly,
    /// Nested, family and assembly
    NestedFamAndAssem,
    /// Nested, family or assembly
    NestedFamOrAssem,
}

impl TypeVisibility {
    /// Decodes the visibility bits of a type flag word; every pattern is assigned
    #[must_use]
    pub fn from_type_flags(flags: u32) -> Self {
        match flags & TypeAttributes::VISIBILITY_MASK {
            TypeAttributes::NOT_PUBLIC => TypeVisibility::NotPublic,
            TypeAttributes::PUBLIC => TypeVisibility::Public,
            TypeAttributes::NESTED_PUBLIC => TypeVisibility::NestedPublic,
            TypeAttributes::NESTED_PRIVATE => TypeVisibility::NestedPrivate,
            TypeAttributes::NESTED_FAMILY => TypeVisibility::NestedFamily,
            TypeAttributes::NESTED_ASSEMBLY => TypeVisibility::NestedAssembly,
            TypeAttributes::NESTED_FAM_AND_ASSEM => TypeVisibility::NestedFamAndAssem,
            _ => TypeVisibility::NestedFamOrAssem,
        }
    }

    /// True for every nested variant
    #[must_use]
    pub fn is_nested(self) -> bool {
        !matches!(self, TypeVisibility::NotPublic | TypeVisibility::Public)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use strum::IntoEnumIterator;

    #[test]
    fn test_call_convention_exhaustive() {
        let expected = [
            (PInvokeAttributes::CALL_CONV_WINAPI, CallConvention::Default),
            (PInvokeAttributes::CALL_CONV_CDECL, CallConvention::Cdecl),
            (PInvokeAttributes::CALL_CONV_STDCALL, CallConvention::StdCall),
            (PInvokeAttributes::CALL_CONV_THISCALL, CallConvention::ThisCall),
            (PInvokeAttributes::CALL_CONV_FASTCALL, CallConvention::FastCall),
        ];
        for (bits, conv) in expected {
            assert_eq!(CallConvention::from_pinvoke_flags(bits).unwrap(), conv);
            // unrelated bits do not disturb the mask
            let noisy = bits | PInvokeAttributes::NO_MANGLE | PInvokeAttributes::CHAR_SET_UNICODE;
            assert_eq!(CallConvention::from_pinvoke_flags(noisy).unwrap(), conv);
        }

        for conv in CallConvention::iter() {
            assert_eq!(
                CallConvention::from_pinvoke_flags(conv.to_pinvoke_flags()).unwrap(),
                conv
            );
        }
    }

    #[test]
    fn test_call_convention_malformed() {
        for bits in [0x0000, 0x0600, 0x0700] {
            let result = CallConvention::from_pinvoke_flags(bits);
            assert!(matches!(result, Err(Error::Malformed { .. })), "0x{bits:04x}");
        }
    }

    #[test]
    fn test_char_set() {
        assert_eq!(CharSet::from_pinvoke_flags(0).unwrap(), CharSet::NotSpecified);
        assert_eq!(
            CharSet::from_pinvoke_flags(PInvokeAttributes::CHAR_SET_ANSI).unwrap(),
            CharSet::Ansi
        );
        assert_eq!(
            CharSet::from_pinvoke_flags(
                PInvokeAttributes::CHAR_SET_UNICODE | PInvokeAttributes::CALL_CONV_CDECL
            )
            .unwrap(),
            CharSet::Unicode
        );
        assert!(matches!(
            CharSet::from_pinvoke_flags(PInvokeAttributes::CHAR_SET_AUTO),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_member_access() {
        let decoded: Vec<MemberAccess> = (0..7)
            .map(|bits| MemberAccess::from_flags(bits).unwrap())
            .collect();
        let all: Vec<MemberAccess> = MemberAccess::iter().collect();
        assert_eq!(decoded, all);

        assert_eq!(
            MemberAccess::from_flags(MethodAttributes::PUBLIC | MethodAttributes::STATIC).unwrap(),
            MemberAccess::Public
        );
        assert!(MemberAccess::from_flags(0x7).is_err());
    }

    #[test]
    fn test_type_visibility() {
        let decoded: Vec<TypeVisibility> = (0..8).map(TypeVisibility::from_type_flags).collect();
        let all: Vec<TypeVisibility> = TypeVisibility::iter().collect();
        assert_eq!(decoded, all);

        assert!(!TypeVisibility::from_type_flags(TypeAttributes::PUBLIC).is_nested());
        assert!(TypeVisibility::from_type_flags(TypeAttributes::NESTED_PRIVATE).is_nested());
    }
}
