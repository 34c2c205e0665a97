//! Construction: objects, arrays, delegates, and anonymous methods.

use nativize_core::lang::runtime;
use nativize_model::{Block, Expr, MemberInit, MethodRef, ParamDecl, TypeRef};

use super::super::Translator;
use super::super::context::{ClosureScope, PropertyMode, TranslationContext};
use super::super::errors::{TranslateError, TranslateResult};
use super::super::local_name;
use super::super::text::AnnotatedText;
use super::super::type_table::TypeClass;
use super::members::method_member_name;

/// An anonymous method translated into its enclosing method's closure carrier.
#[derive(Debug, Clone)]
pub(crate) struct ClosureMethod {
    pub name: String,
    /// Emitted return type.
    pub return_type: String,
    /// Emitted parameter list, without parentheses.
    pub params: String,
    /// Braced body.
    pub body: String,
}

impl<'t, 'a> Translator<'t, 'a> {
    pub(super) fn translate_object_create(
        &mut self,
        cx: &mut TranslationContext,
        ty: &TypeRef,
        constructor: Option<&MethodRef>,
        args: &[Expr],
        initializers: &[MemberInit],
    ) -> TranslateResult<AnnotatedText> {
        let params = constructor.map(|c| c.params.as_slice()).unwrap_or_default();
        let resolved: Vec<TypeRef> = constructor
            .map(|c| (0..c.params.len()).filter_map(|i| c.resolved_param_type(i)).collect())
            .unwrap_or_default();
        let args = self.translate_args(cx, params, &resolved, args)?;
        let name = self.names(cx).with_typename(cx.in_generic_type).type_name(ty);

        let create = match self.table.classify(ty) {
            TypeClass::GenericParam => format!("{}({})", runtime::PARAMETERLESS_NEW_MACRO, name),
            class if class.is_value_type() => format!("{}({})", name, args.join(", ")),
            _ => format!("{}::{}({})", name, runtime::CREATE, args.join(", ")),
        };
        if initializers.is_empty() {
            return Ok(AnnotatedText::new(create, ty.clone()));
        }

        let temp = self.unit.next_temp();
        let local = self.local_type(cx, ty);
        cx.hoist(format!("{} {} = {};", local, temp, create));
        let access = self.table.member_access(ty);
        for init in initializers {
            let line = match init {
                MemberInit::Field { field, value } => {
                    let slot = field.ty.substitute(ty.args(), &[]);
                    let v = self.translate_converted(cx, &slot, value)?;
                    format!("{}{}{} = {};", temp, access, local_name(&field.name), v)
                }
                MemberInit::Property { property, value } => {
                    let slot = property.ty.substitute(ty.args(), &[]);
                    let v = self.translate_converted(cx, &slot, value)?;
                    format!("{}{}set_{}({});", temp, access, local_name(&property.name), v)
                }
                MemberInit::Add { method, value } => {
                    let slot = method.resolved_param_type(0).unwrap_or_else(TypeRef::object);
                    let v = self.translate_converted(cx, &slot, value)?;
                    let name = method_member_name(self.names(cx), &method.name, &method.generic_args, &TypeRef::void());
                    format!("{}{}{}({});", temp, access, name, v)
                }
            };
            cx.hoist(line);
        }
        Ok(AnnotatedText::new(temp, ty.clone()))
    }

    /// Translate `value` for a slot of type `slot` and convert it.
    fn translate_converted(&mut self, cx: &mut TranslationContext, slot: &TypeRef, value: &Expr) -> TranslateResult<String> {
        let v = {
            let mut g = cx.push_cast_target(slot.clone());
            self.translate_expr(&mut g, value)?
        };
        Ok(self.convert(cx, slot, v).text)
    }

    pub(super) fn translate_array_create(
        &mut self,
        cx: &mut TranslationContext,
        element: &TypeRef,
        dimensions: &[Expr],
        initializer: &[Expr],
    ) -> TranslateResult<AnnotatedText> {
        let mut dims = Vec::with_capacity(dimensions.len());
        for d in dimensions {
            let v = self.translate_converted(cx, &TypeRef::int32(), d)?;
            dims.push(v);
        }
        if dims.is_empty() {
            dims.push(initializer.len().to_string());
        }
        let rank = dims.len();
        let element_decl = self.local_type(cx, element);
        let array_name = format!("{}< {} >", runtime::ARRAY_TYPE, element_decl);
        let temp = self.unit.next_temp();

        if initializer.is_empty() {
            cx.hoist(format!(
                "{} * {} = {}::{}({});",
                array_name,
                temp,
                array_name,
                runtime::CREATE,
                dims.join(", ")
            ));
        } else {
            let mut values = Vec::with_capacity(initializer.len());
            for v in initializer {
                values.push(self.translate_converted(cx, element, v)?);
            }
            let init = self.unit.next_temp();
            cx.hoist(format!("{} {}[] = {{ {} }};", element_decl, init, values.join(", ")));
            cx.hoist(format!(
                "{} * {} = {}::{}({}, {});",
                array_name,
                temp,
                array_name,
                runtime::CREATE,
                dims.join(", "),
                init
            ));
        }
        let ty = TypeRef::Array {
            element: Box::new(element.clone()),
            rank,
        };
        Ok(AnnotatedText::new(temp, ty))
    }

    pub(super) fn translate_delegate_create(
        &mut self,
        cx: &mut TranslationContext,
        delegate_type: &TypeRef,
        target: Option<&Expr>,
        method: &MethodRef,
    ) -> TranslateResult<AnnotatedText> {
        let name = method_member_name(
            self.names(cx),
            &method.name,
            &method.generic_args,
            &method.resolved_return_type(),
        );
        if method.is_static {
            let scope = self.names(cx).static_scope(&method.declaring_type);
            let text = self.functor(cx, delegate_type, &scope, None, &format!("&{}::{}", scope, name));
            return Ok(AnnotatedText::new(text, delegate_type.clone()));
        }
        let (instance, target_type) = match target {
            Some(t) => {
                let value = {
                    let mut g = cx.push_property_mode(PropertyMode::Get);
                    self.translate_expr(&mut g, t)?
                };
                let target_type = self.names(cx).type_name(&value.ty);
                (value.text, target_type)
            }
            None => {
                let this = self.this_text(cx);
                (this.text, self.names(cx).type_name(&method.declaring_type))
            }
        };
        let text = self.functor(
            cx,
            delegate_type,
            &target_type,
            Some(&instance),
            &format!("&{}::{}", target_type, name),
        );
        Ok(AnnotatedText::new(text, delegate_type.clone()))
    }

    /// `new D__FUNCTOR__<Target[, args] >(instance, &Target::M)`. A generic delegate's own argument list moves
    /// behind the target type.
    fn functor(
        &self,
        cx: &TranslationContext,
        delegate_type: &TypeRef,
        target_type: &str,
        instance: Option<&str>,
        method: &str,
    ) -> String {
        let delegate = self.names(cx).type_name(delegate_type);
        let (base, template) = split_template(&delegate);
        let template = match template {
            Some(t) => format!(", {}", t),
            None => String::new(),
        };
        match instance {
            Some(i) => format!("new {}__FUNCTOR__<{}{} >({}, {})", base, target_type, template, i, method),
            None => format!("new {}__FUNCTOR__<{}{} >({})", base, target_type, template, method),
        }
    }

    pub(super) fn translate_delegate_invoke(
        &mut self,
        cx: &mut TranslationContext,
        target: &Expr,
        args: &[Expr],
    ) -> TranslateResult<AnnotatedText> {
        let value = {
            let mut g = cx.push_property_mode(PropertyMode::Get);
            self.translate_expr(&mut g, target)?
        };
        let Some(invoke) = self.table.decl_of(&value.ty).and_then(|d| d.delegate_invoke()) else {
            return Err(TranslateError::defect(
                &cx.location,
                format!("invocation of `{}`, which is not a delegate", value.text),
            ));
        };
        let type_args = value.ty.args().to_vec();
        let resolved: Vec<TypeRef> = invoke.params.iter().map(|p| p.ty.substitute(&type_args, &[])).collect();
        let args = self.translate_args(cx, &invoke.params, &resolved, args)?;
        let ret = invoke
            .return_type
            .as_ref()
            .map(|r| r.substitute(&type_args, &[]))
            .unwrap_or_else(TypeRef::void);
        Ok(AnnotatedText::new(format!("{}->Invoke({})", value.text, args.join(", ")), ret))
    }

    /// Translate an anonymous method into a carrier method and return the delegate creation that binds it.
    ///
    /// ## Errors
    /// - `TranslateError::InternalDefect`: the enclosing method was not prepared with a closure scope.
    pub(super) fn translate_anonymous_method(
        &mut self,
        cx: &mut TranslationContext,
        delegate_type: &TypeRef,
        params: &[ParamDecl],
        return_type: Option<&TypeRef>,
        body: &Block,
    ) -> TranslateResult<AnnotatedText> {
        let Some(scope) = cx.closure.clone() else {
            return Err(TranslateError::defect(&cx.location, "anonymous method outside a closure scope"));
        };
        let name = self.unit.next_anonymous_method();
        let ret = match return_type {
            Some(t) => t.clone(),
            None => self
                .table
                .decl_of(delegate_type)
                .and_then(|d| d.delegate_invoke())
                .and_then(|m| m.return_type.as_ref())
                .map(|r| r.substitute(delegate_type.args(), &[]))
                .unwrap_or_else(TypeRef::void),
        };

        let mut inner = TranslationContext::new(format!("{}::{}", cx.location, name), cx.declaring_type.clone());
        inner.in_generic_type = cx.in_generic_type;
        inner.return_type = ret.clone();
        inner.closure = Some(ClosureScope {
            pointer: String::new(),
            ..scope.clone()
        });
        for p in params {
            inner.declare_param(&p.name, p.ty.clone(), p.mode);
        }
        let body_text = self.translate_method_body(&mut inner, body)?;
        cx.uses_low_level |= inner.uses_low_level;

        let return_text = self.return_type_decl(cx, &ret);
        let params_text = self.param_list(cx, params);
        self.closure_methods.push(ClosureMethod {
            name: name.clone(),
            return_type: return_text,
            params: params_text,
            body: body_text,
        });

        let instance = if scope.inside_carrier() { "this".to_string() } else { scope.pointer.clone() };
        let text = self.functor(
            cx,
            delegate_type,
            &scope.carrier,
            Some(&instance),
            &format!("&{}::{}", scope.carrier, name),
        );
        Ok(AnnotatedText::new(text, delegate_type.clone()))
    }
}

/// Split `::NS::Func__G1<A >` into (`::NS::Func__G1`, `A`). Nested argument lists are matched.
fn split_template(name: &str) -> (&str, Option<&str>) {
    if !name.ends_with('>') {
        return (name, None);
    }
    let mut level = 0usize;
    for (i, c) in name.char_indices().rev() {
        match c {
            '>' => level += 1,
            '<' => {
                level = level.saturating_sub(1);
                if level == 0 {
                    return (&name[..i], Some(name[i + 1..name.len() - 1].trim()));
                }
            }
            _ => {}
        }
    }
    (name, None)
}
