//! Interface dispatch wrappers and the interface map.
//!
//! An interface call goes through the object's interface map: `INTERFACE__CALL(obj, I)` finds the wrapper
//! registered for `I`, and the wrapper forwards to the implementing member of the object passed as
//! `__passed_instance__`. Every type gets one wrapper class per interface in its exclusive set (declared
//! interfaces plus what they extend); interfaces that only come through the base class reuse the base's
//! wrappers through the base's interface map.
//!
//! ## Notes
//!
//! - Interface methods without an implementation on the type or its base chain are left out of the wrapper.
//! - Generic types register no interface map of their own; their identity macro handles it per instantiation.

use nativize_core::lang::runtime;
use nativize_model::{MethodDecl, TypeKind, TypeRef};

use super::super::Translator;
use super::super::emitter::CppEmitter;
use super::super::local_name;
use super::super::names::Names;
use super::super::state::LedgerEntry;
use super::members::{declared_name, effective_return};
use super::types::TypeParts;
use super::{TypeScope, emit_member};

/// Inheritance chains are cut at this depth when searching for implementations.
const MAX_BASE_WALK: usize = 64;

/// Wrapper class names for an exclusive interface set, index-aligned with it. A repeated name (two
/// instantiations of one generic interface) gets a `__<n>` suffix.
pub(super) fn wrapper_names(exclusive: &[TypeRef]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(exclusive.len());
    for iface in exclusive {
        let base = match iface.key() {
            Some(key) => format!("{}{}", runtime::WRAPPER_PREFIX, Names::declaration_name(key)),
            None => runtime::WRAPPER_PREFIX.to_string(),
        };
        let mut name = base.clone();
        let mut n = 0;
        while out.contains(&name) {
            name = format!("{}__{}", base, n);
            n += 1;
        }
        out.push(name);
    }
    out
}

impl<'t, 'a> Translator<'t, 'a> {
    /// Wrapper of `iface` declared by `ty` itself, as `(name)`.
    fn own_wrapper(&self, ty: &TypeRef, iface: &TypeRef) -> Option<String> {
        let info = ty.key().and_then(|k| self.table.info(k))?;
        let exclusive: Vec<TypeRef> = info.exclusive.iter().map(|e| e.substitute(ty.args(), &[])).collect();
        let names = wrapper_names(&exclusive);
        exclusive.iter().position(|e| e == iface).and_then(|i| names.into_iter().nth(i))
    }

    /// Nearest wrapper of `iface` on the base chain of `ty` (excluding `ty`), with the type declaring it.
    fn inherited_wrapper(&self, ty: &TypeRef, iface: &TypeRef) -> Option<(TypeRef, String)> {
        let mut current = self.table.base_of(ty);
        let mut depth = 0;
        while let Some(t) = current {
            if depth > MAX_BASE_WALK {
                break;
            }
            if let Some(name) = self.own_wrapper(&t, iface) {
                return Some((t, name));
            }
            current = self.table.base_of(&t);
            depth += 1;
        }
        None
    }

    /// Name of the member of `ty` (or its bases) implementing `im` of `iface`.
    fn find_implementation(&self, ty: &TypeRef, iface: &TypeRef, im: &MethodDecl) -> Option<String> {
        let wanted: Vec<TypeRef> = im.params.iter().map(|p| p.ty.substitute(iface.args(), &[])).collect();
        let names = Names::new(self.table);
        let mut current = Some(ty.clone());
        let mut depth = 0;
        while let Some(t) = current {
            if depth > MAX_BASE_WALK {
                break;
            }
            if let Some(decl) = self.table.decl_of(&t) {
                let explicit = decl.methods.iter().find(|m| {
                    m.overrides
                        .iter()
                        .any(|o| o.name == im.name && o.declaring_type.substitute(t.args(), &[]) == *iface)
                });
                if let Some(m) = explicit {
                    return Some(declared_name(names, decl, m));
                }
                let public = decl.methods.iter().find(|m| {
                    m.name == im.name
                        && !m.is_static
                        && m.generic_params.is_empty()
                        && m.params.len() == wanted.len()
                        && m.params
                            .iter()
                            .zip(&wanted)
                            .all(|(p, w)| p.ty.substitute(t.args(), &[]) == *w)
                });
                if let Some(m) = public {
                    return Some(declared_name(names, decl, m));
                }
            }
            current = self.table.base_of(&t);
            depth += 1;
        }
        None
    }

    /// One nested wrapper class per exclusive interface.
    pub(super) fn emit_wrappers(&mut self, scope: &TypeScope<'_>, parts: &mut TypeParts) {
        let Some(info) = self.table.info(&scope.decl.key) else {
            return;
        };
        let exclusive = info.exclusive.clone();
        let names = Names::new(self.table).with_typename(scope.generic);
        for (iface, wrapper) in exclusive.iter().zip(wrapper_names(&exclusive)) {
            let parent = match self.inherited_wrapper(&scope.self_ty, iface) {
                Some((owner, name)) => format!("{}::{}", Names::new(self.table).type_name(&owner), name),
                None => Names::new(self.table).type_name(iface),
            };
            let Some(iface_decl) = self.table.decl_of(iface) else { continue };

            let mut class = parts.nested.sibling();
            let mut out_of_line = parts.out_of_line.sibling();
            class.class_block(&format!("class {} : public {}", wrapper, parent), |e| {
                e.line("public:");
                for im in iface_decl
                    .methods
                    .iter()
                    .filter(|m| !m.is_static && m.generic_params.is_empty())
                {
                    let Some(target) = self.find_implementation(&scope.self_ty, iface, im) else {
                        tracing::debug!(ty = %scope.decl.key, method = %im.name, "interface method has no implementation");
                        continue;
                    };
                    let ret_ty = effective_return(im).substitute(iface.args(), &[]);
                    let ret = if ret_ty.is_void() { "void".to_string() } else { names.type_decl(&ret_ty) };
                    let mut params = format!("void * {}", runtime::PASSED_INSTANCE);
                    let mut args = Vec::new();
                    for p in &im.params {
                        let ty = names.param_type(&p.ty.substitute(iface.args(), &[]), p.mode);
                        params.push_str(&format!(", {} {}", ty, local_name(&p.name)));
                        args.push(local_name(&p.name));
                    }
                    let member = declared_name(Names::new(self.table), iface_decl, im);

                    let mut body = e.sibling();
                    body.block("", |b| {
                        b.line(&self.unwrap_instance(scope));
                        let call = format!("{}->{}({})", runtime::INSTANCE, target, args.join(", "));
                        if ret_ty.is_void() {
                            b.line(&format!("{};", call));
                        } else {
                            b.line(&format!("return ({});", call));
                        }
                    });
                    emit_member(
                        e,
                        &mut out_of_line,
                        scope.generic,
                        &format!("virtual {} {}({})", ret, member, params),
                        &format!("{} {}::{}::{}({})", ret, scope.qualified, wrapper, member, params),
                        body.as_str(),
                    );
                }
                e.line(runtime::WRAPPER_NEW_DELETE);
            });
            parts.nested.append(&class);
            parts.out_of_line.append(&out_of_line);
        }
    }

    /// `__instance__` declaration recovering the implementing object from `__passed_instance__`.
    fn unwrap_instance(&self, scope: &TypeScope<'_>) -> String {
        let full = if scope.generic {
            Names::new(self.table).type_name(&scope.self_ty)
        } else {
            scope.full_name.clone()
        };
        if scope.value_type {
            format!(
                "{full} * {} = (static_cast< {}<{full} > * >({}))->GetUnboxedAddress();",
                runtime::INSTANCE,
                runtime::BOXED_OBJECT,
                runtime::PASSED_INSTANCE
            )
        } else {
            format!("{full} * {} = static_cast<{full} * >({});", runtime::INSTANCE, runtime::PASSED_INSTANCE)
        }
    }

    /// `__CreateInterfaceMap__` registering the type's own wrappers, chained to the base class's map.
    pub(super) fn emit_interface_map(&mut self, scope: &TypeScope<'_>, parts: &mut TypeParts) {
        if scope.generic {
            return;
        }
        let full = &scope.full_name;
        parts
            .members
            .line(&format!("static void {}();", runtime::CREATE_INTERFACE_MAP));

        let mut body = CppEmitter::with_indent(self.config.indent);
        body.block("", |e| {
            if scope.decl.kind == TypeKind::Interface {
                e.line(&format!(
                    "void * * interfaceMap = {}::RegisterInterface();",
                    runtime::INTERFACE_MAPPER
                ));
            } else {
                let exclusive = self
                    .table
                    .info(&scope.decl.key)
                    .map(|i| i.exclusive.clone())
                    .unwrap_or_default();
                let wrappers = wrapper_names(&exclusive);
                let array = if wrappers.is_empty() {
                    "NULL"
                } else {
                    e.line(&format!("{} info[] =", runtime::INTERFACE_INFO));
                    e.line("{");
                    e.indent();
                    for w in &wrappers {
                        e.line(&format!("{{ {full}::{w}::{}(), new {full}::{w} }},", runtime::GET_ID));
                    }
                    e.dedent();
                    e.line("};");
                    "info"
                };
                let size_of = if scope.value_type {
                    format!("{}<{} >", runtime::BOXED_OBJECT, full)
                } else {
                    full.clone()
                };
                let base_map = match scope.decl.kind {
                    TypeKind::Class => {
                        let base = match &scope.decl.base {
                            Some(b) => Names::new(self.table).type_name(b),
                            None => runtime::OBJECT_TYPE.to_string(),
                        };
                        format!(", {}::{}()", base, runtime::GET_INTERFACE_MAP)
                    }
                    _ => String::new(),
                };
                e.line(&format!(
                    "void * * interfaceMap = {}::RegisterObject(sizeof({}), {}, {}{});",
                    runtime::INTERFACE_MAPPER,
                    size_of,
                    array,
                    wrappers.len(),
                    base_map
                ));
            }
            e.line(&format!("{}::{} = interfaceMap;", full, runtime::INTERFACE_MAP_STATIC));
        });

        let o = &mut parts.out_of_line;
        o.line(&format!("void * * {}::{} = NULL;", scope.qualified, runtime::INTERFACE_MAP_STATIC));
        o.blank_line();
        o.line(&format!("void {}::{}()", scope.qualified, runtime::CREATE_INTERFACE_MAP));
        o.lines(body.as_str());
        o.blank_line();

        let register = format!("{}::{}();", full, runtime::CREATE_INTERFACE_MAP);
        self.unit.interface_maps.push(LedgerEntry::new(&scope.decl.key, register));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use nativize_model::{Assembly, Block, MethodRef, ParamDecl, TypeDecl, TypeKey};

    use super::*;
    use crate::backend::output::TypeText;
    use crate::backend::state::UnitState;
    use crate::backend::type_table::TypeTable;
    use crate::config::BackendConfig;

    fn emit(asm: &Assembly, key: &str) -> (TypeText, UnitState) {
        let table = TypeTable::new(asm, &HashSet::new());
        let config = BackendConfig::default();
        let mut t = Translator::new(&table, &config, "App");
        let decl = table.decl(&TypeKey::new(key)).unwrap();
        let text = t.emit_class(decl).unwrap();
        (text, t.unit)
    }

    fn shape() -> TypeDecl {
        TypeDecl::new("App.IShape", TypeKind::Interface)
            .with_method(MethodDecl::new("Area").returning(TypeRef::int32()).abstract_())
            .with_method(
                MethodDecl::new("Scale")
                    .with_param(ParamDecl::new("by", TypeRef::int32()))
                    .abstract_(),
            )
    }

    #[test]
    fn test_wrapper_names_are_unique() {
        let list = TypeRef::generic("App.IList`1", vec![TypeRef::int32()]);
        let other = TypeRef::generic("App.IList`1", vec![TypeRef::string()]);
        assert_eq!(
            wrapper_names(&[TypeRef::named("App.IShape"), list, other]),
            vec!["Wrapper__IShape", "Wrapper__IList__G1", "Wrapper__IList__G1__0"]
        );
    }

    #[test]
    fn test_class_wrapper_forwards_to_implementation() {
        let asm = Assembly::new("App").with_type(shape()).with_type(
            TypeDecl::new("App.Square", TypeKind::Class)
                .with_interface(TypeRef::named("App.IShape"))
                .with_method(MethodDecl::new("Area").returning(TypeRef::int32()).with_body(Block::default()))
                .with_method(
                    MethodDecl::new("App.IShape.Scale")
                        .with_param(ParamDecl::new("by", TypeRef::int32()))
                        .with_override(MethodRef::new(TypeRef::named("App.IShape"), "Scale"))
                        .with_body(Block::default()),
                ),
        );
        let (text, unit) = emit(&asm, "App.Square");
        assert!(text.definition.contains("class Wrapper__IShape : public ::App::IShape"));
        assert!(text.definition.contains("virtual ::System::Int32 Area(void * __passed_instance__);"));
        assert!(text.definition.contains("CN__NEW_DELETE_OPERATORS_FOR_WRAPPER"));
        insta::assert_snapshot!(
            text.methods.split("\n\n").find(|s| s.contains("Wrapper__IShape::Scale")).unwrap(),
            @r"
        void App::Square::Wrapper__IShape::Scale(void * __passed_instance__, ::System::Int32 by)
        {
            ::App::Square * __instance__ = static_cast<::App::Square * >(__passed_instance__);
            __instance__->App_IShape_Scale(by);
        }
        "
        );
        assert!(text.methods.contains("return (__instance__->Area());"));
        assert!(text.methods.contains("{ ::App::Square::Wrapper__IShape::__GetId__(), new ::App::Square::Wrapper__IShape },"));
        assert!(text.methods.contains(
            "void * * interfaceMap = ::CrossNetRuntime::InterfaceMapper::RegisterObject(sizeof(::App::Square), info, 1, ::System::Object::__GetInterfaceMap__());"
        ));
        assert!(text.methods.contains("void * * App::Square::s__InterfaceMap__ = NULL;"));
        assert!(
            unit.interface_maps
                .iter()
                .any(|e| e.statement == "::App::Square::__CreateInterfaceMap__();")
        );
    }

    #[test]
    fn test_struct_wrapper_unboxes() {
        let asm = Assembly::new("App").with_type(shape()).with_type(
            TypeDecl::new("App.Dot", TypeKind::Struct)
                .with_interface(TypeRef::named("App.IShape"))
                .with_method(MethodDecl::new("Area").returning(TypeRef::int32()).with_body(Block::default())),
        );
        let (text, _) = emit(&asm, "App.Dot");
        assert!(text.methods.contains(
            "::App::Dot * __instance__ = (static_cast< ::CrossNetRuntime::BoxedObject<::App::Dot > * >(__passed_instance__))->GetUnboxedAddress();"
        ));
        // Scale has no implementation and is left out.
        assert!(!text.definition.contains("Scale(void * __passed_instance__"));
        assert!(text.methods.contains("RegisterObject(sizeof(::CrossNetRuntime::BoxedObject<::App::Dot >), info, 1);"));
    }

    #[test]
    fn test_interfaces_from_the_base_reuse_its_wrappers() {
        let asm = Assembly::new("App")
            .with_type(shape())
            .with_type(
                TypeDecl::new("App.Base", TypeKind::Class)
                    .with_interface(TypeRef::named("App.IShape"))
                    .with_method(MethodDecl::new("Area").returning(TypeRef::int32()).with_body(Block::default())),
            )
            .with_type(TypeDecl::new("App.Derived", TypeKind::Class).with_base(TypeRef::named("App.Base")))
            .with_type(
                TypeDecl::new("App.Again", TypeKind::Class)
                    .with_base(TypeRef::named("App.Base"))
                    .with_interface(TypeRef::named("App.IShape")),
            );
        let (derived, _) = emit(&asm, "App.Derived");
        assert!(!derived.definition.contains("Wrapper__"));
        assert!(derived.methods.contains("RegisterObject(sizeof(::App::Derived), NULL, 0, ::App::Base::__GetInterfaceMap__());"));

        let (again, _) = emit(&asm, "App.Again");
        assert!(again.definition.contains("class Wrapper__IShape : public ::App::Base::Wrapper__IShape"));
        assert!(again.methods.contains("return (__instance__->Area());"));
    }

    #[test]
    fn test_interface_registers_itself() {
        let asm = Assembly::new("App").with_type(shape());
        let (text, _) = emit(&asm, "App.IShape");
        assert!(text.methods.contains("void * * interfaceMap = ::CrossNetRuntime::InterfaceMapper::RegisterInterface();"));
        assert!(text.methods.contains("::App::IShape::s__InterfaceMap__ = interfaceMap;"));
    }
}
