//! Primitive type vocabulary.
//!
//! Every managed primitive maps to a fixed runtime type name in the emitted C++ (`System.Int32` becomes
//! `::System::Int32`). Metadata on each entry drives literal rendering (suffixes, named boundary constants) and
//! implicit widening decisions.
//!
//! ## Notes
//! - `widening_rank` orders the integral types for conditional-expression widening:
//!   `bool < byte < sbyte < short < ushort < int < uint < long < ulong`.
//! - `String` and `Object` are listed because the backend special-cases them, but they are reference types.

/// Stable identifier for every primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveId {
    Boolean,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    IntPtr,
    UIntPtr,
    String,
    Object,
    Void,
}

/// Coarse classification used by literal rendering and operator typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveCategory {
    Boolean,
    Char,
    SignedInteger,
    UnsignedInteger,
    Float,
    Decimal,
    Pointer,
    Reference,
    Void,
}

/// Metadata for a primitive type.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveInfo {
    pub id: PrimitiveId,
    /// Managed full name (e.g. `System.Int32`).
    pub dotnet_name: &'static str,
    /// Emitted scoped name (e.g. `::System::Int32`).
    pub cpp_name: &'static str,
    pub category: PrimitiveCategory,
    /// Suffix appended to integer and float literals of this type.
    pub literal_suffix: &'static str,
    /// Position in the integral widening order, if the type takes part in it.
    pub widening_rank: Option<u8>,
}

impl PrimitiveInfo {
    /// Value types are stored inline; `String` and `Object` are heap references.
    pub fn is_value_type(&self) -> bool {
        !matches!(self.category, PrimitiveCategory::Reference | PrimitiveCategory::Void)
    }

    /// Whether C++ operators apply directly to values of this type (no `op_*` lookup needed).
    pub fn has_builtin_operators(&self) -> bool {
        self.is_value_type()
    }

    /// Whether the runtime exposes `MinValue` / `MaxValue` constants for this type.
    pub fn has_bounds(&self) -> bool {
        matches!(
            self.category,
            PrimitiveCategory::SignedInteger
                | PrimitiveCategory::UnsignedInteger
                | PrimitiveCategory::Float
                | PrimitiveCategory::Decimal
        ) && self.id != PrimitiveId::IntPtr
            && self.id != PrimitiveId::UIntPtr
    }
}

/// Registry of all primitive types.
pub const PRIMITIVES: &[PrimitiveInfo] = &[
    prim(PrimitiveId::Boolean, "System.Boolean", "::System::Boolean", PrimitiveCategory::Boolean, "", Some(0)),
    prim(PrimitiveId::Char, "System.Char", "::System::Char", PrimitiveCategory::Char, "", None),
    prim(PrimitiveId::SByte, "System.SByte", "::System::SByte", PrimitiveCategory::SignedInteger, "", Some(2)),
    prim(PrimitiveId::Byte, "System.Byte", "::System::Byte", PrimitiveCategory::UnsignedInteger, "", Some(1)),
    prim(PrimitiveId::Int16, "System.Int16", "::System::Int16", PrimitiveCategory::SignedInteger, "", Some(3)),
    prim(PrimitiveId::UInt16, "System.UInt16", "::System::UInt16", PrimitiveCategory::UnsignedInteger, "", Some(4)),
    prim(PrimitiveId::Int32, "System.Int32", "::System::Int32", PrimitiveCategory::SignedInteger, "", Some(5)),
    prim(PrimitiveId::UInt32, "System.UInt32", "::System::UInt32", PrimitiveCategory::UnsignedInteger, "U", Some(6)),
    prim(PrimitiveId::Int64, "System.Int64", "::System::Int64", PrimitiveCategory::SignedInteger, "LL", Some(7)),
    prim(PrimitiveId::UInt64, "System.UInt64", "::System::UInt64", PrimitiveCategory::UnsignedInteger, "ULL", Some(8)),
    prim(PrimitiveId::Single, "System.Single", "::System::Single", PrimitiveCategory::Float, "f", None),
    prim(PrimitiveId::Double, "System.Double", "::System::Double", PrimitiveCategory::Float, "", None),
    prim(PrimitiveId::Decimal, "System.Decimal", "::System::Decimal", PrimitiveCategory::Decimal, "", None),
    prim(PrimitiveId::IntPtr, "System.IntPtr", "::System::IntPtr", PrimitiveCategory::Pointer, "", None),
    prim(PrimitiveId::UIntPtr, "System.UIntPtr", "::System::UIntPtr", PrimitiveCategory::Pointer, "", None),
    prim(PrimitiveId::String, "System.String", "::System::String", PrimitiveCategory::Reference, "", None),
    prim(PrimitiveId::Object, "System.Object", "::System::Object", PrimitiveCategory::Reference, "", None),
    prim(PrimitiveId::Void, "System.Void", "::System::Void", PrimitiveCategory::Void, "", None),
];

/// Get the metadata for a primitive.
pub fn info_for(id: PrimitiveId) -> &'static PrimitiveInfo {
    // The table holds one entry per variant, in declaration order.
    &PRIMITIVES[id as usize]
}

/// Resolve a managed full name (e.g. `System.Int32`) to a primitive id.
pub fn from_dotnet_name(name: &str) -> Option<PrimitiveId> {
    PRIMITIVES.iter().find(|p| p.dotnet_name == name).map(|p| p.id)
}

/// Resolve an emitted scoped name (e.g. `::System::Int32`) to a primitive id.
pub fn from_cpp_name(name: &str) -> Option<PrimitiveId> {
    PRIMITIVES.iter().find(|p| p.cpp_name == name).map(|p| p.id)
}

/// The wider of two integral types per the widening order, or `None` if either is not integral.
pub fn wider(a: PrimitiveId, b: PrimitiveId) -> Option<PrimitiveId> {
    let ra = info_for(a).widening_rank?;
    let rb = info_for(b).widening_rank?;
    Some(if ra >= rb { a } else { b })
}

const fn prim(
    id: PrimitiveId,
    dotnet_name: &'static str,
    cpp_name: &'static str,
    category: PrimitiveCategory,
    literal_suffix: &'static str,
    widening_rank: Option<u8>,
) -> PrimitiveInfo {
    PrimitiveInfo {
        id,
        dotnet_name,
        cpp_name,
        category,
        literal_suffix,
        widening_rank,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_for_matches_id() {
        for p in PRIMITIVES {
            assert_eq!(info_for(p.id).id, p.id);
        }
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(from_dotnet_name("System.Char"), Some(PrimitiveId::Char));
        assert_eq!(from_cpp_name("::System::UInt64"), Some(PrimitiveId::UInt64));
        assert_eq!(from_dotnet_name("System.DateTime"), None);
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(info_for(PrimitiveId::UInt32).literal_suffix, "U");
        assert_eq!(info_for(PrimitiveId::Int64).literal_suffix, "LL");
        assert_eq!(info_for(PrimitiveId::UInt64).literal_suffix, "ULL");
        assert_eq!(info_for(PrimitiveId::Int32).literal_suffix, "");
    }

    #[test]
    fn test_widening_order() {
        assert_eq!(wider(PrimitiveId::Byte, PrimitiveId::SByte), Some(PrimitiveId::SByte));
        assert_eq!(wider(PrimitiveId::Int32, PrimitiveId::UInt32), Some(PrimitiveId::UInt32));
        assert_eq!(wider(PrimitiveId::UInt64, PrimitiveId::Boolean), Some(PrimitiveId::UInt64));
        assert_eq!(wider(PrimitiveId::Int32, PrimitiveId::Double), None);
    }

    #[test]
    fn test_value_type_classification() {
        assert!(info_for(PrimitiveId::Decimal).is_value_type());
        assert!(!info_for(PrimitiveId::String).is_value_type());
        assert!(!info_for(PrimitiveId::Void).is_value_type());
        assert!(!info_for(PrimitiveId::Boolean).has_bounds());
        assert!(info_for(PrimitiveId::Single).has_bounds());
    }
}
