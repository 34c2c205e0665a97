//! Member access: fields, properties, indexers, events, method calls and their arguments.
//!
//! ## Notes
//!
//! - Calls through an interface materialize the target into a `__tempN__` pre-statement and dispatch through
//!   `INTERFACE__CALL(tmp, ::I)->M(tmp, ...)`.
//! - Members of generic-parameter or primitive targets go through `CrossNetRuntime::GenWrapperConvert(x)` so one
//!   template body serves primitive, struct and class instantiations.
//! - Properties render as `get_X()`; as assignment targets they render as an unfinished `set_X(` that the
//!   assignment closes.

use nativize_core::lang::cpp_keywords::sanitize_extended;
use nativize_core::lang::runtime;
use nativize_model::{EventRef, Expr, FieldRef, Literal, MethodRef, ParamDecl, PropertyRef, TypeRef};

use super::super::Translator;
use super::super::context::{PropertyMode, TranslationContext};
use super::super::errors::TranslateResult;
use super::super::local_name;
use super::super::names::Names;
use super::super::text::AnnotatedText;
use super::super::type_table::TypeClass;
use super::needs_parens;

/// Start of a member call: everything up to and including the opening parenthesis.
pub(super) struct CallPrefix {
    pub text: String,
    /// Interface calls pass the materialized target as the first argument.
    pub instance: Option<String>,
}

impl CallPrefix {
    /// Complete the call with its translated arguments.
    fn call(&self, args: &[String]) -> String {
        format!("{}{})", self.text, self.arguments(args).join(", "))
    }

    fn arguments(&self, args: &[String]) -> Vec<String> {
        self.instance.iter().cloned().chain(args.iter().cloned()).collect()
    }
}

/// Emitted name of a method: constructors map to the runtime's `__ctor__`/`Static__ctor__`, conversion operators
/// are mangled with their return type, explicit interface implementations keep their last segment.
pub(crate) fn method_member_name(names: Names<'_, '_>, name: &str, generic_args: &[TypeRef], return_type: &TypeRef) -> String {
    match name {
        ".ctor" => runtime::CTOR.to_string(),
        ".cctor" => runtime::STATIC_CTOR.to_string(),
        "op_Implicit" | "op_Explicit" => names.conversion_method_name(name, return_type),
        _ => {
            let simple = name.rsplit('.').next().unwrap_or(name);
            names.method_name(simple, generic_args)
        }
    }
}

impl<'t, 'a> Translator<'t, 'a> {
    /// Build the call prefix for `member` on `target`.
    pub(super) fn member_call_prefix(
        &mut self,
        cx: &mut TranslationContext,
        target: Option<&Expr>,
        declaring: &TypeRef,
        is_static: bool,
        member: &str,
    ) -> TranslateResult<CallPrefix> {
        if is_static {
            let scope = self.names(cx).static_scope(declaring);
            return Ok(CallPrefix {
                text: format!("{}::{}(", scope, member),
                instance: None,
            });
        }
        let in_carrier = cx.closure.as_ref().is_some_and(|c| c.inside_carrier());
        let Some(target) = target else {
            let text = if in_carrier {
                format!("{}->{}(", runtime::CLOSURE_THIS, member)
            } else {
                format!("{}(", member)
            };
            return Ok(CallPrefix { text, instance: None });
        };
        if let Expr::Base = target {
            let scope = self.names(cx).type_name(declaring);
            let text = if in_carrier {
                format!("{}->{}::{}(", runtime::CLOSURE_THIS, scope, member)
            } else {
                format!("{}::{}(", scope, member)
            };
            return Ok(CallPrefix { text, instance: None });
        }

        let mut t = self.translate_expr(cx, target)?;
        if needs_parens(target) {
            t = t.parenthesized();
        }

        // An interface-typed target always dispatches through its map. The slot lives on the declaring
        // interface; members inherited from `Object` go through the target's own interface.
        let dispatch = if self.table.is_interface(&t.ty) {
            let holder = t.ty.clone();
            let slot = if self.table.is_interface(declaring) { declaring.clone() } else { holder.clone() };
            Some((holder, slot))
        } else if self.table.is_interface(declaring) {
            Some((declaring.clone(), declaring.clone()))
        } else {
            None
        };
        if let Some((holder, slot)) = dispatch {
            let temp = self.unit.next_temp();
            let local = self.local_type(cx, &holder);
            let value = self.convert(cx, &holder, t);
            let iface = self.names(cx).type_name(&slot);
            cx.hoist(format!("{} {} = {};", local, temp, value.text));
            return Ok(CallPrefix {
                text: format!("{}({}, {})->{}(", runtime::INTERFACE_CALL, temp, iface, member),
                instance: Some(temp),
            });
        }

        let text = match self.table.classify(&t.ty) {
            TypeClass::GenericParam => format!("{}({})->{}(", runtime::GEN_WRAPPER_CONVERT, t.text, member),
            TypeClass::Primitive(id) if nativize_core::lang::primitives::info_for(id).is_value_type() => {
                format!("{}({}).{}(", runtime::GEN_WRAPPER_CONVERT, t.text, member)
            }
            _ => format!("{}{}{}(", t.text, self.table.member_access(&t.ty), member),
        };
        Ok(CallPrefix { text, instance: None })
    }

    /// Translate call arguments against the callee's parameters.
    ///
    /// ## Parameters
    /// - `params`: declared parameters (modes and unsubstituted types).
    /// - `resolved`: parameter types with generic arguments substituted, index-aligned with `params`.
    /// - `args`: argument expressions; extra arguments (variadic tails) are translated without conversion.
    pub(in crate::backend) fn translate_args(
        &mut self,
        cx: &mut TranslationContext,
        params: &[ParamDecl],
        resolved: &[TypeRef],
        args: &[Expr],
    ) -> TranslateResult<Vec<String>> {
        let mut out = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let param = params.get(i);
            let ty = resolved.get(i).or_else(|| param.map(|p| &p.ty));
            let by_ref = param.is_some_and(|p| p.mode.is_by_ref()) || matches!(ty, Some(TypeRef::Reference { .. }));

            if by_ref {
                let text = match arg {
                    Expr::AddressOut { .. } | Expr::AddressReference { .. } => self.translate_expr(cx, arg)?.text,
                    _ => format!("&{}", self.translate_expr(cx, arg)?.text),
                };
                out.push(text);
                continue;
            }

            match ty {
                Some(ty @ TypeRef::Pointer { .. }) => {
                    cx.uses_low_level = true;
                    let text = if matches!(arg, Expr::Literal { value: Literal::Null }) {
                        format!("{}(({})NULL)", runtime::CREATE_POINTER_WRAPPER, self.names(cx).type_name(ty))
                    } else {
                        format!("{}({})", runtime::CREATE_POINTER_WRAPPER, self.translate_expr(cx, arg)?.text)
                    };
                    out.push(text);
                }
                Some(ty) => {
                    let ty = ty.clone();
                    let value = {
                        let mut g = cx.push_cast_target(ty.clone());
                        self.translate_expr(&mut g, arg)?
                    };
                    out.push(self.convert(cx, &ty, value).text);
                }
                None => out.push(self.translate_expr(cx, arg)?.text),
            }
        }
        Ok(out)
    }

    pub(super) fn translate_invoke(
        &mut self,
        cx: &mut TranslationContext,
        target: Option<&Expr>,
        method: &MethodRef,
        args: &[Expr],
    ) -> TranslateResult<AnnotatedText> {
        let return_type = method.resolved_return_type();
        let name = method_member_name(self.names(cx), &method.name, &method.generic_args, &return_type);
        let prefix = {
            let mut g = cx.push_property_mode(PropertyMode::Get);
            self.member_call_prefix(&mut g, target, &method.declaring_type, method.is_static, &name)?
        };
        let resolved: Vec<TypeRef> = (0..method.params.len())
            .filter_map(|i| method.resolved_param_type(i))
            .collect();
        let args = self.translate_args(cx, &method.params, &resolved, args)?;
        Ok(AnnotatedText::new(prefix.call(&args), return_type))
    }

    pub(super) fn translate_property(
        &mut self,
        cx: &mut TranslationContext,
        target: Option<&Expr>,
        property: &PropertyRef,
        indices: &[Expr],
    ) -> TranslateResult<AnnotatedText> {
        let mode = cx.property_mode();
        let declaring = &property.declaring_type;
        let ty = property.ty.substitute(declaring.args(), &[]);
        let accessor = match mode {
            PropertyMode::Get => "get_",
            PropertyMode::Set => "set_",
        };
        let member = format!("{}{}", accessor, sanitize_extended(&property.name));

        let mut g = cx.push_property_mode(PropertyMode::Get);
        let prefix = self.member_call_prefix(&mut g, target, declaring, property.is_static, &member)?;
        let resolved: Vec<TypeRef> = property
            .params
            .iter()
            .map(|p| p.ty.substitute(declaring.args(), &[]))
            .collect();
        let args = self.translate_args(&mut g, &property.params, &resolved, indices)?;
        drop(g);

        match mode {
            PropertyMode::Get => Ok(AnnotatedText::new(prefix.call(&args), ty)),
            PropertyMode::Set => {
                let mut text = prefix.text.clone();
                for arg in prefix.arguments(&args) {
                    text.push_str(&arg);
                    text.push_str(", ");
                }
                Ok(AnnotatedText::pending_setter(text, ty))
            }
        }
    }

    pub(super) fn translate_field(
        &mut self,
        cx: &mut TranslationContext,
        target: Option<&Expr>,
        field: &FieldRef,
    ) -> TranslateResult<AnnotatedText> {
        let declaring = &field.declaring_type;
        let ty = field.ty.substitute(declaring.args(), &[]);
        let name = local_name(&field.name);

        if field.is_static {
            if self.table.is_enum(declaring) {
                let enum_name = self.names(cx).type_name(declaring);
                let member = enum_member_name(declaring, &field.name);
                return Ok(AnnotatedText::new(
                    format!("({})({}::{})", enum_name, enum_name, member),
                    declaring.clone(),
                ));
            }
            let scope = self.names(cx).static_scope(declaring);
            return Ok(AnnotatedText::new(format!("{}::{}", scope, name), ty));
        }

        self.instance_member(cx, target, name, ty)
    }

    pub(super) fn translate_event(
        &mut self,
        cx: &mut TranslationContext,
        target: Option<&Expr>,
        event: &EventRef,
    ) -> TranslateResult<AnnotatedText> {
        let declaring = &event.declaring_type;
        let ty = event.ty.substitute(declaring.args(), &[]);
        let name = local_name(&event.name);
        if event.is_static {
            let scope = self.names(cx).static_scope(declaring);
            return Ok(AnnotatedText::new(format!("{}::{}", scope, name), ty));
        }
        self.instance_member(cx, target, name, ty)
    }

    /// `target->name`, or the implicit-`this` form when there is no target.
    fn instance_member(
        &mut self,
        cx: &mut TranslationContext,
        target: Option<&Expr>,
        name: String,
        ty: TypeRef,
    ) -> TranslateResult<AnnotatedText> {
        let Some(target) = target else {
            let in_carrier = cx.closure.as_ref().is_some_and(|c| c.inside_carrier());
            let text = if in_carrier {
                format!("{}->{}", runtime::CLOSURE_THIS, name)
            } else {
                name
            };
            return Ok(AnnotatedText::new(text, ty));
        };
        let mut t = {
            let mut g = cx.push_property_mode(PropertyMode::Get);
            self.translate_expr(&mut g, target)?
        };
        if needs_parens(target) {
            t = t.parenthesized();
        }
        let access = self.table.member_access(&t.ty);
        Ok(AnnotatedText::new(format!("{}{}{}", t.text, access, name), ty))
    }

    pub(super) fn translate_array_index(
        &mut self,
        cx: &mut TranslationContext,
        target: &Expr,
        indices: &[Expr],
    ) -> TranslateResult<AnnotatedText> {
        let mut g = cx.push_property_mode(PropertyMode::Get);
        let mut t = self.translate_expr(&mut g, target)?;
        if needs_parens(target) {
            t = t.parenthesized();
        }
        let mut rendered = Vec::with_capacity(indices.len());
        for index in indices {
            rendered.push(self.translate_expr(&mut g, index)?.text);
        }
        drop(g);

        let element = t.ty.element().cloned().unwrap_or_else(TypeRef::object);
        if t.ty.is_pointer() {
            cx.uses_low_level = true;
            return Ok(AnnotatedText::new(format!("{}[{}]", t.text, rendered.join("][")), element.clone())
                .with_embedded(element));
        }
        Ok(
            AnnotatedText::new(format!("{}->Item({})", t.text, rendered.join(", ")), element.clone())
                .with_embedded(element),
        )
    }
}

/// Enum members named like their enum are renamed so they do not collide with the type's constructor.
pub(crate) fn enum_member_name(enum_type: &TypeRef, member: &str) -> String {
    let simple = enum_type.key().map(|k| k.simple_name()).unwrap_or_default();
    if member == simple {
        format!("__{}__", member)
    } else {
        local_name(member)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use nativize_model::{Assembly, ParamMode, TypeDecl, TypeKind};

    use super::*;
    use crate::backend::type_table::TypeTable;
    use crate::config::BackendConfig;

    fn assembly() -> Assembly {
        Assembly::new("App")
            .with_type(TypeDecl::new("App.Widget", TypeKind::Class))
            .with_type(TypeDecl::new("App.Color", TypeKind::Enum))
            .with_type(TypeDecl::new("App.Point", TypeKind::Struct))
    }

    fn run(cx: &mut TranslationContext, expr: &Expr) -> AnnotatedText {
        let asm = assembly();
        let table = TypeTable::new(&asm, &HashSet::new());
        let config = BackendConfig::default();
        let mut t = Translator::new(&table, &config, "App");
        t.translate_expr(cx, expr).unwrap()
    }

    fn cx() -> TranslationContext {
        TranslationContext::new("App.Widget::Run", TypeRef::named("App.Widget"))
    }

    #[test]
    fn test_enum_fields_are_wrapped() {
        let field = FieldRef::new(TypeRef::named("App.Color"), "Red", TypeRef::named("App.Color")).static_();
        assert_eq!(run(&mut cx(), &Expr::field(None, field)).text, "(::App::Color)(::App::Color::Red)");
        assert_eq!(enum_member_name(&TypeRef::named("App.Color"), "Color"), "__Color__");
    }

    #[test]
    fn test_static_calls_on_primitives_use_the_wrapper() {
        let parse = MethodRef::new(TypeRef::int32(), "Parse")
            .static_()
            .with_param("s", TypeRef::string())
            .returning(TypeRef::int32());
        let text = run(&mut cx(), &Expr::call(None, parse, vec![Expr::string("1")]));
        assert_eq!(text.text, "CrossNetRuntime::BaseTypeWrapper<::System::Int32 >::Parse(sApp__1)");
    }

    #[test]
    fn test_instance_call_on_primitive_is_wrapped() {
        let mut cx = cx();
        cx.declare_local("n", TypeRef::int32());
        let to_string = MethodRef::new(TypeRef::int32(), "ToString").returning(TypeRef::string());
        let text = run(&mut cx, &Expr::call(Some(Expr::var("n")), to_string, vec![]));
        assert_eq!(text.text, "CrossNetRuntime::GenWrapperConvert(n).ToString()");
    }

    #[test]
    fn test_out_arguments_pass_addresses() {
        let mut cx = cx();
        cx.declare_local("x", TypeRef::int32());
        let try_get = MethodRef::new(TypeRef::named("App.Widget"), "TryGet")
            .with_param_mode("value", TypeRef::int32(), ParamMode::Out)
            .returning(TypeRef::boolean());
        let call = Expr::call(
            Some(Expr::This),
            try_get,
            vec![Expr::AddressOut {
                operand: Box::new(Expr::var("x")),
            }],
        );
        assert_eq!(run(&mut cx, &call).text, "this->TryGet(& x)");
    }

    #[test]
    fn test_indexer_assignment_becomes_set_item() {
        let mut cx = cx();
        let item = PropertyRef {
            params: vec![ParamDecl::new("i", TypeRef::int32())],
            ..PropertyRef::new(TypeRef::named("App.Widget"), "Item", TypeRef::string())
        };
        let assign = Expr::assign(
            Expr::Indexer {
                target: Box::new(Expr::This),
                property: item,
                indices: vec![Expr::int(0)],
            },
            Expr::null(),
        );
        assert_eq!(
            run(&mut cx, &assign).text,
            "this->set_Item(0, static_cast<::System::String * >(NULL))"
        );
    }

    #[test]
    fn test_array_and_pointer_indexing() {
        let mut cx = cx();
        cx.declare_local("xs", TypeRef::array(TypeRef::int32()));
        cx.declare_local("p", TypeRef::pointer(TypeRef::int32()));
        let item = run(&mut cx, &Expr::ArrayIndex {
            target: Box::new(Expr::var("xs")),
            indices: vec![Expr::int(1)],
        });
        assert_eq!(item.text, "xs->Item(1)");
        assert_eq!(item.ty, TypeRef::int32());
        let raw = run(&mut cx, &Expr::ArrayIndex {
            target: Box::new(Expr::var("p")),
            indices: vec![Expr::int(2)],
        });
        assert_eq!(raw.text, "p[2]");
        assert!(cx.uses_low_level);
    }

    #[test]
    fn test_method_member_names() {
        let asm = assembly();
        let table = TypeTable::new(&asm, &HashSet::new());
        let names = Names::new(&table);
        assert_eq!(method_member_name(names, ".ctor", &[], &TypeRef::void()), "__ctor__");
        assert_eq!(method_member_name(names, ".cctor", &[], &TypeRef::void()), "Static__ctor__");
        assert_eq!(
            method_member_name(names, "System.IDisposable.Dispose", &[], &TypeRef::void()),
            "Dispose"
        );
        assert_eq!(
            method_member_name(names, "op_Explicit", &[], &TypeRef::named("App.Point")),
            "op_Explicit__App__Point"
        );
    }
}
