//! Enum structs.
//!
//! An enum becomes a struct deriving from the runtime's `__StructEnum__<U >` with one `static const U` member per
//! enumerator. Values are written as plain integral text here: the named boundary constants used for ordinary
//! literals are not constant expressions in a class body.

use nativize_core::lang::runtime;
use nativize_model::{Literal, TypeDecl, TypeRef};

use super::super::Translator;
use super::super::emitter::CppEmitter;
use super::super::expr::enum_member_name;
use super::super::names::Names;
use super::super::output::TypeText;
use super::super::state::LedgerEntry;
use super::{TypeScope, in_namespaces};

/// Backing field the managed compiler adds to every enum.
const VALUE_FIELD: &str = "value__";

/// Integral text of a constant usable as a C++ integral constant expression, or `None` for floating point,
/// strings, decimals and `null`.
pub(super) fn raw_integral(value: &Literal) -> Option<String> {
    let text = match value {
        Literal::Bool(b) => b.to_string(),
        Literal::Char(c) => c.to_string(),
        Literal::I8(v) => v.to_string(),
        Literal::U8(v) => v.to_string(),
        Literal::I16(v) => v.to_string(),
        Literal::U16(v) => v.to_string(),
        // The most negative value has no literal spelling: `2147483648` alone does not fit the signed type.
        Literal::I32(v) if *v == i32::MIN => format!("({} - 1)", i32::MIN + 1),
        Literal::I32(v) => v.to_string(),
        Literal::U32(v) => format!("{}U", v),
        Literal::I64(v) if *v == i64::MIN => format!("({}LL - 1)", i64::MIN + 1),
        Literal::I64(v) => format!("{}LL", v),
        Literal::U64(v) => format!("{}ULL", v),
        Literal::Null | Literal::String(_) | Literal::F32(_) | Literal::F64(_) | Literal::Decimal(_) => return None,
    };
    Some(text)
}

impl<'t, 'a> Translator<'t, 'a> {
    /// Emit an enum as a tagged struct.
    pub(super) fn emit_enum(&mut self, decl: &TypeDecl) -> TypeText {
        let scope = TypeScope::new(decl);
        let indent = self.config.indent;
        let underlying = decl.enum_underlying.clone().unwrap_or_else(TypeRef::int32);
        let names = Names::new(self.table).with_typename(scope.generic);
        let u = names.type_name(&underlying);
        let base = format!("{}<{} >", runtime::STRUCT_ENUM, u);

        let members: Vec<(String, String)> = decl
            .fields
            .iter()
            .filter(|f| f.is_static && f.name != VALUE_FIELD)
            .map(|f| {
                let value = f.constant.as_ref().and_then(raw_integral).unwrap_or_else(|| "0".to_string());
                (enum_member_name(&scope.self_ty, &f.name), value)
            })
            .collect();
        let default = members.first().map(|(_, v)| v.clone()).unwrap_or_else(|| "0".to_string());

        let mut forward = CppEmitter::with_indent(indent);
        let mut class = CppEmitter::with_indent(indent);
        if let Some(t) = scope.template_header() {
            forward.line(&t);
            class.line(&t);
        }
        forward.line(&format!("struct {};", scope.name));

        let identity = if scope.generic {
            runtime::MULTIPLE_DYNAMIC_OBJECT_ID_MACRO
        } else {
            runtime::DYNAMIC_ID_MACRO
        };
        class.class_block(&format!("struct {} : public {}", scope.name, base), |e| {
            e.line(identity);
            e.line("public:");
            if !scope.generic {
                e.line(&format!("static void {}();", runtime::CREATE_INTERFACE_MAP));
            }
            e.line(&format!("{}({} value) : {}(value) {{}}", scope.name, u, base));
            e.line(&format!("{}() : {}({}) {{}}", scope.name, base, default));
            e.line(&format!("operator {}() {{ return (mValue); }}", u));
            for (name, value) in &members {
                e.line(&format!("static const {} {} = {};", u, name, value));
            }
        });

        let mut methods = CppEmitter::with_indent(indent);
        if !scope.generic {
            methods.line(&format!("void * * {}::{} = NULL;", scope.qualified, runtime::INTERFACE_MAP_STATIC));
            methods.blank_line();
            methods.line(&format!("void {}::{}()", scope.qualified, runtime::CREATE_INTERFACE_MAP));
            methods.block("", |e| {
                e.line(&format!(
                    "void * * interfaceMap = {}::RegisterObject(sizeof({}<{} >), NULL, 0);",
                    runtime::INTERFACE_MAPPER,
                    runtime::BOXED_OBJECT,
                    scope.full_name
                ));
                e.line(&format!("{}::{} = interfaceMap;", scope.full_name, runtime::INTERFACE_MAP_STATIC));
            });
            methods.blank_line();
            self.unit.interface_maps.push(LedgerEntry::new(
                &decl.key,
                format!("{}::{}();", scope.full_name, runtime::CREATE_INTERFACE_MAP),
            ));
        }
        tracing::debug!(members = members.len(), underlying = %u, "emitted enum");

        TypeText {
            key: decl.key.clone(),
            declaration: in_namespaces(&decl.key, forward.as_str(), indent),
            definition: in_namespaces(&decl.key, class.as_str(), indent),
            methods: methods.finish(),
        }
    }
}
