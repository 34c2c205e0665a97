//! Translate model expressions into annotated C++ text.
//!
//! [`Translator::translate_expr`] is the single entry point. It dispatches over the closed [`Expr`] sum and returns
//! the emitted text together with the static type of the value (see [`AnnotatedText`]).
//!
//! ## Module organization
//!
//! - [`literals`]: literal rendering (named boundary constants, suffixes, pooled strings)
//! - [`operators`]: unary/binary operators, user-defined operator lookup, result typing
//! - [`members`]: field/property/indexer/event access, method invocation, interface calls, arguments
//! - [`create`]: object/array construction, delegates and anonymous methods
//!
//! ## Notes
//!
//! - **Side effects**: a translation may hoist pre-statements into the context (interface-call temporaries, array
//!   and initializer temporaries) and may mark the context as low-level. Nothing else in the context changes.
//! - **Balanced stacks**: every push onto a context stack goes through a guard, so early returns leave the stacks
//!   at their entry depth.

mod create;
mod literals;
mod members;
mod operators;

use nativize_core::lang::runtime;
use nativize_model::{Expr, TypeKind, TypeRef};

use super::Translator;
use super::casts::{self, Conversion};
use super::context::{PropertyMode, TranslationContext};
use super::errors::{TranslateError, TranslateResult};
use super::local_name;
use super::text::AnnotatedText;

pub(super) use create::ClosureMethod;
pub(super) use members::{enum_member_name, method_member_name};

impl<'t, 'a> Translator<'t, 'a> {
    /// Translate one expression.
    ///
    /// ## Parameters
    /// - `cx`: the context of the method body being translated.
    /// - `expr`: the expression node.
    ///
    /// ## Returns
    /// - The emitted text with its static type.
    ///
    /// ## Errors
    /// - `TranslateError::InternalDefect`: the expression references a local, parameter or member the model did
    ///   not declare.
    pub(super) fn translate_expr(&mut self, cx: &mut TranslationContext, expr: &Expr) -> TranslateResult<AnnotatedText> {
        match expr {
            Expr::AddressOf { operand } => {
                let inner = self.translate_expr(cx, operand)?;
                cx.uses_low_level = true;
                Ok(AnnotatedText::new(
                    format!("&{}", inner.text),
                    TypeRef::pointer(inner.ty.dereferenced().clone()),
                ))
            }
            Expr::AddressDereference { operand } => {
                let inner = self.translate_expr(cx, operand)?;
                cx.uses_low_level = true;
                let element = inner.ty.element().cloned().unwrap_or_else(TypeRef::object);
                Ok(AnnotatedText::new(format!("(*{})", inner.text), element.clone()).with_embedded(element))
            }
            Expr::AddressOut { operand } | Expr::AddressReference { operand } => self.translate_address(cx, operand),
            Expr::Literal { value } => Ok(self.render_literal(cx, value)),
            Expr::Unary { op, operand } => self.translate_unary(cx, *op, operand),
            Expr::Binary { op, left, right } => self.translate_binary(cx, *op, left, right),
            Expr::Assign { target, value } => self.translate_assign(cx, target, value),
            Expr::Cast { target_type, operand } => {
                let value = {
                    let mut g = cx.push_cast_target(target_type.clone());
                    self.translate_expr(&mut g, operand)?
                };
                let converted = casts::convert(self.names(cx), target_type, value, Conversion::Explicit);
                Ok(AnnotatedText::new(converted.text, target_type.clone()))
            }
            Expr::TryCast { target_type, operand } => {
                let value = self.translate_expr(cx, operand)?;
                let target = self.names(cx).type_name(target_type);
                Ok(AnnotatedText::new(
                    format!("{}<{} >({})", runtime::AS_CAST, target, value.text),
                    target_type.clone(),
                ))
            }
            Expr::TypeTest { target_type, operand } => {
                let value = self.translate_expr(cx, operand)?;
                let target = self.names(cx).type_name(target_type);
                Ok(AnnotatedText::new(
                    format!("{}<{} >({})", runtime::IS_CAST, target, value.text),
                    TypeRef::boolean(),
                ))
            }
            Expr::Field { target, field } => self.translate_field(cx, target.as_deref(), field),
            Expr::Property { target, property } => self.translate_property(cx, target.as_deref(), property, &[]),
            Expr::Indexer {
                target,
                property,
                indices,
            } => self.translate_property(cx, Some(target.as_ref()), property, indices),
            Expr::Event { target, event } => self.translate_event(cx, target.as_deref(), event),
            Expr::Invoke { target, method, args } => self.translate_invoke(cx, target.as_deref(), method, args),
            Expr::ObjectCreate {
                ty,
                constructor,
                args,
                initializers,
            } => self.translate_object_create(cx, ty, constructor.as_ref(), args, initializers),
            Expr::ArrayCreate {
                element,
                dimensions,
                initializer,
            } => self.translate_array_create(cx, element, dimensions, initializer),
            Expr::ArrayIndex { target, indices } => self.translate_array_index(cx, target, indices),
            Expr::Condition {
                condition,
                then,
                otherwise,
            } => {
                let c = self.translate_expr(cx, condition)?;
                let a = self.translate_expr(cx, then)?;
                let b = self.translate_expr(cx, otherwise)?;
                let ty = self.common_type(&a, &b);
                let a = self.convert(cx, &ty, a);
                let b = self.convert(cx, &ty, b);
                Ok(AnnotatedText::new(format!("({}) ? {} : {}", c.text, a.text, b.text), ty))
            }
            Expr::NullCoalescing { value, fallback } => {
                let a = self.translate_expr(cx, value)?;
                let b = self.translate_expr(cx, fallback)?;
                let ty = a.ty.clone();
                let b = self.convert(cx, &ty, b);
                Ok(AnnotatedText::new(
                    format!("({} != NULL) ? {} : {}", a.text, a.text, b.text),
                    ty,
                ))
            }
            Expr::DelegateCreate {
                delegate_type,
                target,
                method,
            } => self.translate_delegate_create(cx, delegate_type, target.as_deref(), method),
            Expr::DelegateInvoke { target, args } => self.translate_delegate_invoke(cx, target, args),
            Expr::AnonymousMethod {
                delegate_type,
                params,
                return_type,
                body,
            } => self.translate_anonymous_method(cx, delegate_type, params, return_type.as_ref(), body),
            Expr::This => Ok(self.this_text(cx)),
            Expr::Base => {
                let base = self.base_type(cx)?;
                let this = self.this_text(cx);
                Ok(AnnotatedText::new(this.text, base))
            }
            Expr::TypeOf { ty } => {
                let name = self.names(cx).type_name(ty);
                Ok(AnnotatedText::new(
                    format!("{}({})", runtime::TYPEOF_MACRO, name),
                    TypeRef::named("System.Type"),
                ))
            }
            Expr::SizeOf { ty } => {
                let name = self.names(cx).type_decl(ty);
                Ok(AnnotatedText::new(format!("sizeof({})", name), TypeRef::int32()))
            }
            Expr::StackAlloc { element, count } => {
                let n = self.translate_expr(cx, count)?;
                let name = self.names(cx).type_decl(element);
                cx.uses_low_level = true;
                Ok(AnnotatedText::new(
                    format!("({} *){}({} * sizeof({}))", name, runtime::STACKALLOC_MACRO, n.text, name),
                    TypeRef::pointer(element.clone()),
                ))
            }
            Expr::DefaultValue { ty } => Ok(self.default_value(cx, ty)),
            Expr::VariableDecl { decl } => {
                if let Some(captured) = self.captured_slot(cx, &decl.name) {
                    return Ok(AnnotatedText::new(captured, decl.ty.clone()));
                }
                cx.declare_local(&decl.name, decl.ty.clone());
                let ty = self.local_type(cx, &decl.ty);
                Ok(AnnotatedText::new(
                    format!("{} {}", ty, local_name(&decl.name)),
                    decl.ty.clone(),
                ))
            }
            Expr::Variable { name } => self.translate_variable(cx, name),
            Expr::Argument { name } => self.translate_argument(cx, name),
            Expr::TypeReference { ty } => {
                let scope = self.names(cx).static_scope(ty);
                Ok(AnnotatedText::new(scope, ty.clone()))
            }
            Expr::Unsupported { construct } => {
                let text = self.unit.unimplemented(construct, &cx.location);
                Ok(AnnotatedText::new(text, TypeRef::object()))
            }
        }
    }

    /// Translate an assignment. Property targets come back as pending `set_X(` calls and are closed here.
    fn translate_assign(&mut self, cx: &mut TranslationContext, target: &Expr, value: &Expr) -> TranslateResult<AnnotatedText> {
        if let Expr::VariableDecl { decl } = target {
            let v = {
                let mut g = cx.push_cast_target(decl.ty.clone());
                self.translate_expr(&mut g, value)?
            };
            let v = self.convert(cx, &decl.ty, v);
            if let Some(captured) = self.captured_slot(cx, &decl.name) {
                return Ok(AnnotatedText::new(format!("{} = {}", captured, v.text), decl.ty.clone()));
            }
            cx.declare_local(&decl.name, decl.ty.clone());
            let ty = self.local_type(cx, &decl.ty);
            return Ok(AnnotatedText::new(
                format!("{} {} = {}", ty, local_name(&decl.name), v.text),
                decl.ty.clone(),
            ));
        }

        let lhs = match target {
            Expr::Property { .. } | Expr::Indexer { .. } => {
                let mut g = cx.push_property_mode(PropertyMode::Set);
                self.translate_expr(&mut g, target)?
            }
            _ => self.translate_expr(cx, target)?,
        };
        let slot_ty = lhs.ty.dereferenced().clone();

        if !lhs.pending_set {
            if let Expr::ObjectCreate {
                ty,
                constructor,
                args,
                initializers,
            } = value
            {
                if initializers.is_empty() && self.table.classify(ty) == super::type_table::TypeClass::Struct {
                    let params = constructor.as_ref().map(|c| c.params.clone()).unwrap_or_default();
                    let resolved: Vec<TypeRef> = constructor
                        .as_ref()
                        .map(|c| (0..c.params.len()).filter_map(|i| c.resolved_param_type(i)).collect())
                        .unwrap_or_default();
                    let args = self.translate_args(cx, &params, &resolved, args)?;
                    return Ok(AnnotatedText::new(
                        format!("{}.{}({})", lhs.text, runtime::CTOR, args.join(", ")),
                        slot_ty,
                    ));
                }
            }
        }

        let v = {
            let mut g = cx.push_cast_target(slot_ty.clone());
            self.translate_expr(&mut g, value)?
        };
        let v = self.convert(cx, &slot_ty, v);
        if lhs.pending_set {
            return Ok(AnnotatedText::new(format!("{}{})", lhs.text, v.text), slot_ty));
        }
        Ok(AnnotatedText::new(format!("{} = {}", lhs.text, v.text), slot_ty))
    }

    /// `out x` / `ref x` argument: the address of the slot, or the pointer itself for a by-ref parameter.
    fn translate_address(&mut self, cx: &mut TranslationContext, operand: &Expr) -> TranslateResult<AnnotatedText> {
        if let Expr::Argument { name } = operand {
            if cx.is_by_ref_param(name) && self.captured_slot(cx, name).is_none() {
                let ty = cx.param(name).map(|(t, _)| t.dereferenced().clone()).unwrap_or_else(TypeRef::object);
                return Ok(AnnotatedText::new(local_name(name), TypeRef::reference(ty)));
            }
        }
        let inner = self.translate_expr(cx, operand)?;
        Ok(AnnotatedText::new(
            format!("& {}", inner.text),
            TypeRef::reference(inner.ty.dereferenced().clone()),
        ))
    }

    /// `this`, `(*this)` in value types, `__this__` inside a closure carrier.
    pub(super) fn this_text(&self, cx: &TranslationContext) -> AnnotatedText {
        let text = match &cx.closure {
            Some(scope) if scope.inside_carrier() => runtime::CLOSURE_THIS,
            _ if cx.in_value_type => "(*this)",
            _ => "this",
        };
        AnnotatedText::new(text, cx.declaring_type.clone())
    }

    /// Base type of the type being translated; classes without an explicit base derive from `System.Object`.
    fn base_type(&self, cx: &TranslationContext) -> TranslateResult<TypeRef> {
        if let Some(base) = self.table.base_of(&cx.declaring_type) {
            return Ok(base);
        }
        match self.table.decl_of(&cx.declaring_type).map(|d| d.kind) {
            Some(TypeKind::Class) | None => Ok(TypeRef::object()),
            Some(_) => Err(TranslateError::defect(&cx.location, "`base` used in a type without a base type")),
        }
    }

    /// Rendering of a captured variable, if `name` lives in the closure carrier.
    pub(super) fn captured_slot(&self, cx: &TranslationContext, name: &str) -> Option<String> {
        let scope = cx.closure.as_ref()?;
        if !scope.captured.contains_key(name) {
            return None;
        }
        if scope.inside_carrier() {
            Some(local_name(name))
        } else {
            Some(format!("{}->{}", scope.pointer, local_name(name)))
        }
    }

    fn translate_variable(&mut self, cx: &mut TranslationContext, name: &str) -> TranslateResult<AnnotatedText> {
        if let Some(ty) = cx.captured(name).cloned() {
            if let Some(slot) = self.captured_slot(cx, name) {
                return Ok(AnnotatedText::new(slot, ty));
            }
        }
        if let Some(ty) = cx.local_type(name) {
            return Ok(AnnotatedText::new(local_name(name), ty.clone()));
        }
        if cx.param(name).is_some() {
            return self.translate_argument(cx, name);
        }
        Err(TranslateError::defect(&cx.location, format!("reference to undeclared local `{}`", name)))
    }

    fn translate_argument(&mut self, cx: &mut TranslationContext, name: &str) -> TranslateResult<AnnotatedText> {
        if let Some(ty) = cx.captured(name).cloned() {
            if let Some(slot) = self.captured_slot(cx, name) {
                return Ok(AnnotatedText::new(slot, ty));
            }
        }
        let Some((ty, mode)) = cx.param(name) else {
            if let Some(ty) = cx.local_type(name) {
                return Ok(AnnotatedText::new(local_name(name), ty.clone()));
            }
            return Err(TranslateError::defect(&cx.location, format!("reference to undeclared parameter `{}`", name)));
        };
        let element = ty.dereferenced().clone();
        if mode.is_by_ref() || matches!(ty, TypeRef::Reference { .. }) {
            return Ok(AnnotatedText::new(format!("(*{})", local_name(name)), element.clone()).with_embedded(element));
        }
        Ok(AnnotatedText::new(local_name(name), element))
    }

    /// Common type of the two branches of a conditional expression.
    fn common_type(&self, a: &AnnotatedText, b: &AnnotatedText) -> TypeRef {
        if a.is_null() {
            return b.ty.clone();
        }
        if b.is_null() {
            return a.ty.clone();
        }
        if let (Some(x), Some(y)) = (a.ty.primitive_id(), b.ty.primitive_id()) {
            if let Some(wider) = nativize_core::lang::primitives::wider(x, y) {
                return TypeRef::primitive(wider);
            }
        }
        a.ty.clone()
    }

    /// `default(T)`.
    pub(super) fn default_value(&self, cx: &TranslationContext, ty: &TypeRef) -> AnnotatedText {
        use nativize_core::lang::primitives::{PrimitiveCategory, info_for};

        if ty.is_generic_param() {
            let name = self.names(cx).type_name(ty);
            return AnnotatedText::new(format!("{}({})", runtime::DEFAULT_MACRO, name), ty.clone());
        }
        if let Some(id) = ty.primitive_id() {
            let text = match info_for(id).category {
                PrimitiveCategory::Boolean => "false",
                PrimitiveCategory::Char | PrimitiveCategory::SignedInteger | PrimitiveCategory::UnsignedInteger => "0",
                PrimitiveCategory::Float if id == nativize_core::lang::primitives::PrimitiveId::Single => "0.0f",
                PrimitiveCategory::Float | PrimitiveCategory::Decimal => "0.0",
                _ => "NULL",
            };
            return AnnotatedText::new(text, ty.clone());
        }
        if self.table.is_value_type(ty) {
            let name = self.names(cx).type_name(ty);
            return AnnotatedText::new(format!("{}()", name), ty.clone());
        }
        AnnotatedText::new("NULL", ty.clone())
    }
}

/// Operands that must be parenthesized when embedded in a larger expression.
fn needs_parens(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Binary { .. }
            | Expr::Unary { .. }
            | Expr::TypeTest { .. }
            | Expr::Assign { .. }
            | Expr::Condition { .. }
            | Expr::NullCoalescing { .. }
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use nativize_model::{
        Assembly, BinaryOp, FieldDecl, FieldRef, Literal, MethodRef, ParamMode, PropertyRef, TypeDecl, UnaryOp,
    };

    use super::*;
    use crate::backend::type_table::TypeTable;
    use crate::config::BackendConfig;

    fn assembly() -> Assembly {
        Assembly::new("App")
            .with_type(
                TypeDecl::new("App.Widget", TypeKind::Class)
                    .with_field(FieldDecl::new("size", TypeRef::int32())),
            )
            .with_type(TypeDecl::new("App.IShape", TypeKind::Interface))
            .with_type(TypeDecl::new("App.Point", TypeKind::Struct))
    }

    fn translate_in(cx: &mut TranslationContext, expr: &Expr) -> AnnotatedText {
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
    fn test_local_declaration_and_use() {
        let mut cx = cx();
        let decl = translate_in(&mut cx, &Expr::assign(Expr::declare("n", TypeRef::int32()), Expr::int(3)));
        assert_eq!(decl.text, "::System::Int32 n = 3");
        let used = translate_in(&mut cx, &Expr::var("n"));
        assert_eq!(used.text, "n");
        assert_eq!(used.ty, TypeRef::int32());
    }

    #[test]
    fn test_by_ref_parameter_is_dereferenced() {
        let mut cx = cx();
        cx.declare_param("result", TypeRef::int32(), ParamMode::Out);
        let text = translate_in(&mut cx, &Expr::assign(Expr::arg("result"), Expr::int(1)));
        assert_eq!(text.text, "(*result) = 1");
    }

    #[test]
    fn test_property_assignment_becomes_setter() {
        let mut cx = cx();
        let prop = PropertyRef::new(TypeRef::named("App.Widget"), "Size", TypeRef::int32());
        let text = translate_in(&mut cx, &Expr::assign(Expr::property(Some(Expr::This), prop.clone()), Expr::int(4)));
        assert_eq!(text.text, "this->set_Size(4)");
        let get = translate_in(&mut cx, &Expr::property(Some(Expr::This), prop));
        assert_eq!(get.text, "this->get_Size()");
        assert_eq!(cx.depths(), Default::default());
    }

    #[test]
    fn test_interface_call_hoists_temporary() {
        let mut cx = cx();
        cx.declare_local("s", TypeRef::named("App.IShape"));
        let call = Expr::call(
            Some(Expr::var("s")),
            MethodRef::new(TypeRef::named("App.IShape"), "Area").returning(TypeRef::int32()),
            vec![Expr::int(2)],
        );
        let text = translate_in(&mut cx, &call);
        assert_eq!(text.text, "INTERFACE__CALL(__temp0__, ::App::IShape)->Area(__temp0__, 2)");
        assert_eq!(cx.take_pre_statements(), vec!["::App::IShape * __temp0__ = s;".to_string()]);
    }

    #[test]
    fn test_object_method_on_interface_target_dispatches_through_the_map() {
        let mut cx = cx();
        cx.declare_local("s", TypeRef::named("App.IShape"));
        let call = Expr::call(
            Some(Expr::var("s")),
            MethodRef::new(TypeRef::object(), "ToString").returning(TypeRef::string()),
            vec![],
        );
        let text = translate_in(&mut cx, &call);
        assert_eq!(text.text, "INTERFACE__CALL(__temp0__, ::App::IShape)->ToString(__temp0__)");
        assert_eq!(cx.take_pre_statements(), vec!["::App::IShape * __temp0__ = s;".to_string()]);
    }

    #[test]
    fn test_boxing_on_assignment() {
        let mut cx = cx();
        let text = translate_in(&mut cx, &Expr::assign(Expr::declare("o", TypeRef::object()), Expr::int(7)));
        assert_eq!(text.text, "::System::Object * o = ::CrossNetRuntime::Box<::System::Object >(7)");
    }

    #[test]
    fn test_string_equality_uses_runtime_compare() {
        let mut cx = cx();
        cx.declare_local("a", TypeRef::string());
        let text = translate_in(
            &mut cx,
            &Expr::binary(BinaryOp::ValueEquality, Expr::var("a"), Expr::string("x")),
        );
        assert_eq!(text.text, "::System::String::op_Equality(a, sApp__x)");
        assert_eq!(text.ty, TypeRef::boolean());
    }

    #[test]
    fn test_nested_operands_are_parenthesized() {
        let mut cx = cx();
        let expr = Expr::binary(
            BinaryOp::Multiply,
            Expr::binary(BinaryOp::Add, Expr::int(1), Expr::int(2)),
            Expr::unary(UnaryOp::Negate, Expr::int(3)),
        );
        assert_eq!(translate_in(&mut cx, &expr).text, "(1 + 2) * (-3)");
    }

    #[test]
    fn test_field_access_and_struct_this() {
        let mut cx = cx();
        let field = FieldRef::new(TypeRef::named("App.Widget"), "size", TypeRef::int32());
        assert_eq!(translate_in(&mut cx, &Expr::field(Some(Expr::This), field.clone())).text, "this->size");
        let mut value_cx = TranslationContext::new("App.Point::Run", TypeRef::named("App.Point"));
        value_cx.in_value_type = true;
        assert_eq!(translate_in(&mut value_cx, &Expr::This).text, "(*this)");
    }

    #[test]
    fn test_unknown_local_is_a_defect() {
        let asm = assembly();
        let table = TypeTable::new(&asm, &HashSet::new());
        let config = BackendConfig::default();
        let mut t = Translator::new(&table, &config, "App");
        let err = t.translate_expr(&mut cx(), &Expr::var("ghost")).unwrap_err();
        assert!(err.is_internal_defect());
    }

    #[test]
    fn test_explicit_cast_narrows_char_literal() {
        let mut cx = cx();
        let text = translate_in(&mut cx, &Expr::cast(TypeRef::char(), Expr::int(65)));
        assert_eq!(text.text, "L'A'");
        assert_eq!(text.ty, TypeRef::char());
        let literal = translate_in(&mut cx, &Expr::literal(Literal::I32(65)));
        assert_eq!(literal.text, "65");
    }
}
