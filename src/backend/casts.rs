//! Implicit cast selection.
//!
//! Every assignment, argument, and return site asks [`cast_prefix`] whether a value of the source type needs a
//! runtime cast before it can be stored in the destination type. The answer is the text placed in front of the
//! parenthesized value (`::CrossNetRuntime::Box<::System::Int32 >(x)`), or `None`.
//!
//! ## Notes
//!
//! - Rules are tried in order and the first match wins; see the table in [`cast_prefix`].
//! - The cast target is the bare type name. Array names already carry their ` *`.
//! - A user-defined conversion operator on either type takes precedence over the runtime helpers.

use nativize_core::lang::primitives::PrimitiveId;
use nativize_core::lang::runtime;
use nativize_model::TypeRef;

use super::names::Names;
use super::text::{AnnotatedText, is_null_type};
use super::type_table::TypeClass;

/// Which conversion operators a cast site may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Assignment, argument, and return sites: `op_Implicit` only.
    Implicit,
    /// Explicit casts in source: `op_Explicit` or `op_Implicit`.
    Explicit,
}

/// Runtime cast needed to convert a `src` value to `dst`, if any.
///
/// | source → destination | prefix |
/// |---|---|
/// | same type | none |
/// | `Int32` → `Char`/`UInt16`/`Int16` | `(::System::Char)` |
/// | `null` → anything but a pointer or generic parameter | `static_cast<T * >` |
/// | user conversion operator | `::NS::T::op_Implicit__NS__U` |
/// | generic parameter → class/delegate | `Box<T >` |
/// | generic parameter → interface | `InterfaceCast<T >` |
/// | generic parameter → struct/enum | `Unbox<T >` |
/// | anything → generic parameter | `Unbox<BaseTypeWrapper<T >::BoxeableType >`, `InterfaceCast`, or `UnsafeCast` |
/// | array → anything | none |
/// | anything → array | `UnsafeCast<T >` |
/// | pointer ↔ value | `ReinterpretCast<T >` |
/// | value → value | `EnumCast<T >` to enums, otherwise `UnsafeCast<T >` |
/// | reference → interface, interface → class | `InterfaceCast<T >` |
/// | reference → reference | `Cast<T >` |
/// | value → reference | `Box<T >` or `BoxEnum<T, E >` |
/// | reference → value | `Unbox<T >` |
pub fn cast_prefix(names: Names<'_, '_>, dst: &TypeRef, src: &TypeRef, conversion: Conversion) -> Option<String> {
    let table = names.table();
    let dst = dst.dereferenced();
    let src = src.dereferenced();
    if dst == src || dst.is_void() {
        return None;
    }
    let target = names.type_name(dst);

    if src.is_primitive(PrimitiveId::Int32) {
        if let Some(id) = dst.primitive_id() {
            if matches!(id, PrimitiveId::Char | PrimitiveId::UInt16 | PrimitiveId::Int16) {
                return Some(format!("({})", target));
            }
        }
    }

    if is_null_type(src) {
        return match dst {
            TypeRef::Pointer { .. } | TypeRef::GenericParam { .. } => None,
            _ if target.ends_with('*') => Some(format!("static_cast<{} >", target)),
            _ => Some(format!("static_cast<{} * >", target)),
        };
    }

    if let Some(op) = find_conversion(names, dst, src, conversion) {
        return Some(op);
    }

    let src_class = table.classify(src);
    let dst_class = table.classify(dst);

    if dst_class == TypeClass::Delegate {
        return None;
    }

    if src_class == TypeClass::GenericParam {
        return Some(match dst_class {
            TypeClass::Class => format!("{}<{} >", runtime::BOX, target),
            TypeClass::Primitive(PrimitiveId::String | PrimitiveId::Object) => format!("{}<{} >", runtime::BOX, target),
            TypeClass::Interface => format!("{}<{} >", runtime::INTERFACE_CAST, target),
            TypeClass::Primitive(_) => format!("{}<{}<{} >::BoxeableType >", runtime::UNBOX, runtime::BASE_TYPE_WRAPPER, target),
            TypeClass::Struct | TypeClass::Enum => format!("{}<{} >", runtime::UNBOX, target),
            _ => format!("{}<{} >", runtime::UNSAFE_CAST, target),
        });
    }

    if dst_class == TypeClass::GenericParam {
        return Some(match src_class {
            TypeClass::Class | TypeClass::Delegate | TypeClass::Primitive(PrimitiveId::String | PrimitiveId::Object) => {
                format!("{}<{}<{} >::BoxeableType >", runtime::UNBOX, runtime::BASE_TYPE_WRAPPER, target)
            }
            TypeClass::Interface => format!("{}<{} >", runtime::INTERFACE_CAST, target),
            TypeClass::Primitive(_) => format!("{}<{}<{} >::BoxeableType >", runtime::UNBOX, runtime::BASE_TYPE_WRAPPER, target),
            TypeClass::Struct | TypeClass::Enum => format!("{}<{} >", runtime::UNBOX, target),
            _ => format!("{}<{} >", runtime::UNSAFE_CAST, target),
        });
    }

    if src_class == TypeClass::Array {
        return None;
    }
    if dst_class == TypeClass::Array {
        return Some(format!("{}<{} >", runtime::UNSAFE_CAST, target));
    }
    if dst_class == TypeClass::Pointer || (src_class == TypeClass::Pointer && dst_class.is_value_type()) {
        return Some(format!("{}<{} >", runtime::REINTERPRET_CAST, target));
    }
    if matches!(src_class, TypeClass::Pointer | TypeClass::ByRef | TypeClass::Null)
        || matches!(dst_class, TypeClass::ByRef | TypeClass::Null)
    {
        return None;
    }

    let src_value = src_class.is_value_type();
    let dst_value = dst_class.is_value_type();
    match (src_value, dst_value) {
        (true, true) => {
            if dst_class == TypeClass::Enum {
                Some(format!("{}<{} >", runtime::ENUM_CAST, target))
            } else {
                Some(format!("{}<{} >", runtime::UNSAFE_CAST, target))
            }
        }
        (false, false) => {
            if dst_class == TypeClass::Interface
                || (src_class == TypeClass::Interface && dst_class != TypeClass::Interface)
            {
                Some(format!("{}<{} >", runtime::INTERFACE_CAST, target))
            } else {
                Some(format!("{}<{} >", runtime::CAST, target))
            }
        }
        (true, false) => {
            if src_class == TypeClass::Enum {
                Some(format!("{}<{}, {} >", runtime::BOX_ENUM, target, names.type_name(src)))
            } else {
                Some(format!("{}<{} >", runtime::BOX, target))
            }
        }
        (false, true) => {
            if let TypeClass::Primitive(_) = dst_class {
                Some(format!("{}<{}<{} >::BoxeableType >", runtime::UNBOX, runtime::BASE_TYPE_WRAPPER, target))
            } else {
                Some(format!("{}<{} >", runtime::UNBOX, target))
            }
        }
    }
}

/// Wrap `value` in the cast `src → dst` needs, keeping it untouched when none is needed.
pub fn convert(names: Names<'_, '_>, dst: &TypeRef, value: AnnotatedText, conversion: Conversion) -> AnnotatedText {
    match cast_prefix(names, dst, &value.ty, conversion) {
        Some(prefix) => AnnotatedText {
            text: format!("{}({})", prefix, value.text),
            ty: dst.dereferenced().clone(),
            embedded: None,
            pending_set: false,
        },
        None => value,
    }
}

/// `Declaring::op_Implicit__Dst` when either side declares a matching conversion operator.
fn find_conversion(names: Names<'_, '_>, dst: &TypeRef, src: &TypeRef, conversion: Conversion) -> Option<String> {
    let table = names.table();
    let operator_names: &[&str] = match conversion {
        Conversion::Implicit => &["op_Implicit"],
        Conversion::Explicit => &["op_Explicit", "op_Implicit"],
    };
    for owner in [src, dst] {
        let Some(decl) = table.decl_of(owner) else {
            continue;
        };
        let found = decl.methods.iter().find(|m| {
            m.is_static
                && operator_names.contains(&m.name.as_str())
                && m.params.len() == 1
                && m.params[0].ty.substitute(owner.args(), &[]) == *src
                && m.return_type.as_ref().map(|r| r.substitute(owner.args(), &[])).as_ref() == Some(dst)
        });
        if let Some(m) = found {
            return Some(format!(
                "{}::{}",
                names.type_name(owner),
                names.conversion_method_name(&m.name, dst)
            ));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use nativize_model::{Assembly, MethodDecl, ParamDecl, TypeDecl, TypeKind};

    use super::*;
    use crate::backend::text::null_type;
    use crate::backend::type_table::TypeTable;

    fn assembly() -> Assembly {
        Assembly::new("App")
            .with_type(TypeDecl::new("App.Animal", TypeKind::Class))
            .with_type(TypeDecl::new("App.Dog", TypeKind::Class).with_base(TypeRef::named("App.Animal")))
            .with_type(TypeDecl::new("App.IRun", TypeKind::Interface))
            .with_type(TypeDecl::new("App.Point", TypeKind::Struct))
            .with_type(TypeDecl::new("App.Color", TypeKind::Enum))
            .with_type(TypeDecl::new("App.Handler", TypeKind::Delegate))
            .with_type(
                TypeDecl::new("App.Money", TypeKind::Struct).with_method(
                    MethodDecl::new("op_Implicit")
                        .static_()
                        .with_param(ParamDecl::new("v", TypeRef::int32()))
                        .returning(TypeRef::named("App.Money")),
                ),
            )
    }

    fn prefix(dst: TypeRef, src: TypeRef) -> Option<String> {
        let asm = assembly();
        let table = TypeTable::new(&asm, &HashSet::new());
        cast_prefix(Names::new(&table), &dst, &src, Conversion::Implicit)
    }

    #[test]
    fn test_same_type_needs_no_cast() {
        assert_eq!(prefix(TypeRef::named("App.Dog"), TypeRef::named("App.Dog")), None);
    }

    #[test]
    fn test_narrowing_from_int32() {
        assert_eq!(prefix(TypeRef::char(), TypeRef::int32()), Some("(::System::Char)".to_string()));
    }

    #[test]
    fn test_null_to_reference() {
        assert_eq!(
            prefix(TypeRef::named("App.Dog"), null_type()),
            Some("static_cast<::App::Dog * >".to_string())
        );
        assert_eq!(prefix(TypeRef::pointer(TypeRef::int32()), null_type()), None);
    }

    #[test]
    fn test_reference_casts() {
        assert_eq!(
            prefix(TypeRef::named("App.IRun"), TypeRef::named("App.Dog")),
            Some("::CrossNetRuntime::InterfaceCast<::App::IRun >".to_string())
        );
        assert_eq!(
            prefix(TypeRef::object(), TypeRef::named("App.IRun")),
            Some("::CrossNetRuntime::InterfaceCast<::System::Object >".to_string())
        );
        assert_eq!(
            prefix(TypeRef::named("App.Dog"), TypeRef::named("App.Animal")),
            Some("::CrossNetRuntime::Cast<::App::Dog >".to_string())
        );
    }

    #[test]
    fn test_boxing_and_unboxing() {
        assert_eq!(
            prefix(TypeRef::object(), TypeRef::int32()),
            Some("::CrossNetRuntime::Box<::System::Object >".to_string())
        );
        assert_eq!(
            prefix(TypeRef::object(), TypeRef::named("App.Color")),
            Some("::CrossNetRuntime::BoxEnum<::System::Object, ::App::Color >".to_string())
        );
        assert_eq!(
            prefix(TypeRef::int32(), TypeRef::object()),
            Some("::CrossNetRuntime::Unbox<::CrossNetRuntime::BaseTypeWrapper<::System::Int32 >::BoxeableType >".to_string())
        );
        assert_eq!(
            prefix(TypeRef::named("App.Point"), TypeRef::object()),
            Some("::CrossNetRuntime::Unbox<::App::Point >".to_string())
        );
    }

    #[test]
    fn test_value_to_value() {
        assert_eq!(
            prefix(TypeRef::named("App.Color"), TypeRef::int32()),
            Some("::CrossNetRuntime::EnumCast<::App::Color >".to_string())
        );
        assert_eq!(
            prefix(TypeRef::primitive(PrimitiveId::Int64), TypeRef::int32()),
            Some("::CrossNetRuntime::UnsafeCast<::System::Int64 >".to_string())
        );
    }

    #[test]
    fn test_generic_parameters() {
        let t = TypeRef::type_param("T", 0);
        assert_eq!(
            prefix(TypeRef::named("App.Dog"), t.clone()),
            Some("::CrossNetRuntime::Box<::App::Dog >".to_string())
        );
        assert_eq!(
            prefix(TypeRef::named("App.Point"), t.clone()),
            Some("::CrossNetRuntime::Unbox<::App::Point >".to_string())
        );
        assert_eq!(
            prefix(t.clone(), TypeRef::object()),
            Some("::CrossNetRuntime::Unbox<::CrossNetRuntime::BaseTypeWrapper<T >::BoxeableType >".to_string())
        );
        assert_eq!(prefix(t, TypeRef::named("App.Point")), Some("::CrossNetRuntime::Unbox<T >".to_string()));
    }

    #[test]
    fn test_arrays_pointers_and_delegates() {
        let ints = TypeRef::array(TypeRef::int32());
        assert_eq!(prefix(TypeRef::object(), ints.clone()), None);
        assert_eq!(
            prefix(ints, TypeRef::object()),
            Some("::CrossNetRuntime::UnsafeCast<::System::Array__G< ::System::Int32 > * >".to_string())
        );
        assert_eq!(
            prefix(TypeRef::pointer(TypeRef::int32()), TypeRef::primitive(PrimitiveId::IntPtr)),
            Some("::CrossNetRuntime::ReinterpretCast<::System::Int32 * >".to_string())
        );
        assert_eq!(prefix(TypeRef::named("App.Handler"), TypeRef::object()), None);
    }

    #[test]
    fn test_user_conversion_wins() {
        assert_eq!(
            prefix(TypeRef::named("App.Money"), TypeRef::int32()),
            Some("::App::Money::op_Implicit__App__Money".to_string())
        );
    }

    #[test]
    fn test_convert_wraps_text() {
        let asm = assembly();
        let table = TypeTable::new(&asm, &HashSet::new());
        let value = AnnotatedText::new("x", TypeRef::int32());
        let converted = convert(Names::new(&table), &TypeRef::object(), value, Conversion::Implicit);
        assert_eq!(converted.text, "::CrossNetRuntime::Box<::System::Object >(x)");
        assert_eq!(converted.ty, TypeRef::object());
    }
}
