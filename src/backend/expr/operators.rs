//! Unary and binary operators.
//!
//! ## Notes
//!
//! - Operands whose static type has no built-in C++ operators (structs, classes) dispatch to the user-defined
//!   `op_*` method first, with the symbol form as the fallback.
//! - String `==`/`!=` always compare contents through `::System::String::op_Equality`/`op_Inequality`.
//! - The result type follows the usual promotions: char and enum operands compute in `Int32`, integrals widen to
//!   the wider operand (never narrower than `Int32`), and floating types dominate integrals.

use nativize_core::lang::operators::{BinaryOpId, Fixity, OperatorResult, UnaryOpId, binary_info, unary_info};
use nativize_core::lang::primitives::{PrimitiveCategory, PrimitiveId, info_for, wider};
use nativize_core::lang::runtime;
use nativize_model::{BinaryOp, Expr, MethodDecl, TypeRef, UnaryOp};

use super::super::Translator;
use super::super::context::{PropertyMode, TranslationContext};
use super::super::errors::TranslateResult;
use super::super::text::AnnotatedText;
use super::super::type_table::TypeClass;
use super::needs_parens;

impl<'t, 'a> Translator<'t, 'a> {
    pub(super) fn translate_binary(
        &mut self,
        cx: &mut TranslationContext,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> TranslateResult<AnnotatedText> {
        let info = binary_info(op.id());
        let mut l = self.translate_expr(cx, left)?;
        let mut r = self.translate_expr(cx, right)?;
        if needs_parens(left) {
            l = l.parenthesized();
        }
        if needs_parens(right) {
            r = r.parenthesized();
        }

        if info.id.is_value_comparison() && (is_string(&l.ty) || is_string(&r.ty)) && !l.is_null() && !r.is_null() {
            let routine = if info.id == BinaryOpId::ValueEquality { "op_Equality" } else { "op_Inequality" };
            return Ok(AnnotatedText::new(
                format!("{}::{}({}, {})", runtime::STRING_TYPE, routine, l.text, r.text),
                TypeRef::boolean(),
            ));
        }

        if !info.id.is_identity() {
            if let Some(op_name) = info.overload {
                if let Some(call) = self.user_binary_operator(cx, op_name, &l, &r) {
                    return Ok(call);
                }
            }
        }

        if info.id == BinaryOpId::Modulus && (is_float(&l.ty) || is_float(&r.ty)) {
            let ty = self.operation_type(&l.ty, &r.ty);
            return Ok(AnnotatedText::new(
                format!("{}({}, {})", runtime::MATH_MODULO, l.text, r.text),
                ty,
            ));
        }

        if info.id == BinaryOpId::Subtract && l.ty.is_pointer() && r.ty.is_pointer() {
            cx.uses_low_level = true;
            return Ok(AnnotatedText::new(
                format!(
                    "{}({}) - {}({})",
                    runtime::POINTER_TO_INT32,
                    l.text,
                    runtime::POINTER_TO_INT32,
                    r.text
                ),
                TypeRef::int32(),
            ));
        }

        let ty = match info.result {
            OperatorResult::Boolean => TypeRef::boolean(),
            OperatorResult::Operand if matches!(info.id, BinaryOpId::ShiftLeft | BinaryOpId::ShiftRight) => {
                self.promote(&l.ty)
            }
            OperatorResult::Operand => self.operation_type(&l.ty, &r.ty),
        };
        Ok(AnnotatedText::new(format!("{} {} {}", l.text, info.symbol, r.text), ty))
    }

    /// `Scope::op_X(a, b)` if either operand's type declares the operator.
    fn user_binary_operator(
        &self,
        cx: &TranslationContext,
        op_name: &str,
        l: &AnnotatedText,
        r: &AnnotatedText,
    ) -> Option<AnnotatedText> {
        for owner in [&l.ty, &r.ty] {
            if !has_user_operators(self.table.classify(owner)) {
                continue;
            }
            let Some(m) = self.table.find_operator(owner, op_name) else {
                continue;
            };
            let a = self.convert(cx, &m.params[0].ty.substitute(owner.args(), &[]), l.clone());
            let b = self.convert(cx, &m.params[1].ty.substitute(owner.args(), &[]), r.clone());
            let scope = self.names(cx).static_scope(owner);
            let ty = return_type_on(m, owner);
            return Some(AnnotatedText::new(format!("{}::{}({}, {})", scope, m.name, a.text, b.text), ty));
        }
        None
    }

    pub(super) fn translate_unary(
        &mut self,
        cx: &mut TranslationContext,
        op: UnaryOp,
        operand: &Expr,
    ) -> TranslateResult<AnnotatedText> {
        let info = unary_info(op.id());
        let is_step = matches!(
            info.id,
            UnaryOpId::PreIncrement | UnaryOpId::PreDecrement | UnaryOpId::PostIncrement | UnaryOpId::PostDecrement
        );

        if is_step && matches!(operand, Expr::Property { .. } | Expr::Indexer { .. }) {
            // `p++` on a property reads through the getter and writes through the setter.
            let setter = {
                let mut g = cx.push_property_mode(PropertyMode::Set);
                self.translate_expr(&mut g, operand)?
            };
            let getter = self.translate_expr(cx, operand)?;
            let step = if matches!(info.id, UnaryOpId::PreIncrement | UnaryOpId::PostIncrement) { "+" } else { "-" };
            if matches!(info.id, UnaryOpId::PreIncrement | UnaryOpId::PreDecrement) {
                // Setters return their value, so the call is the new value.
                return Ok(AnnotatedText::new(
                    format!("{}{} {} 1)", setter.text, getter.text, step),
                    getter.ty,
                ));
            }
            // Postfix yields the value read before the write.
            let old = self.unit.next_temp();
            let local = self.local_type(cx, &getter.ty);
            cx.hoist(format!("{} {};", local, old));
            return Ok(AnnotatedText::new(
                format!("({} = {}, {}{} {} 1), {})", old, getter.text, setter.text, old, step, old),
                getter.ty,
            ));
        }

        let mut value = self.translate_expr(cx, operand)?;
        if needs_parens(operand) || value.text.starts_with(['-', '+']) {
            value = value.parenthesized();
        }

        if has_user_operators(self.table.classify(&value.ty)) {
            if let Some(m) = self.find_unary_operator(&value.ty, info.overload) {
                let arg = self.convert(cx, &m.params[0].ty.substitute(value.ty.args(), &[]), value.clone());
                let scope = self.names(cx).static_scope(&value.ty);
                let ty = return_type_on(m, &value.ty);
                return Ok(AnnotatedText::new(format!("{}::{}({})", scope, m.name, arg.text), ty));
            }
        }

        let ty = match info.id {
            UnaryOpId::BooleanNot => TypeRef::boolean(),
            UnaryOpId::Negate | UnaryOpId::BitwiseNot => self.promote(&value.ty),
            _ => value.ty.clone(),
        };
        let text = match info.fixity {
            Fixity::Prefix => format!("{}{}", info.symbol, value.text),
            Fixity::Postfix => format!("{}{}", value.text, info.symbol),
        };
        Ok(AnnotatedText::new(text, ty))
    }

    fn find_unary_operator(&self, ty: &TypeRef, op_name: &str) -> Option<&'a MethodDecl> {
        self.table
            .decl_of(ty)?
            .methods
            .iter()
            .find(|m| m.is_static && m.name == op_name && m.params.len() == 1)
    }

    /// Promotion applied to a single operand: char and enums compute in `Int32`, small integrals widen to `Int32`.
    pub(super) fn promote(&self, ty: &TypeRef) -> TypeRef {
        if self.table.is_enum(ty) {
            let underlying = self.table.enum_underlying(ty);
            return self.promote(&underlying);
        }
        match ty.primitive_id() {
            Some(PrimitiveId::Char) => TypeRef::int32(),
            Some(id) if info_for(id).widening_rank.is_some() && id != PrimitiveId::Boolean => {
                TypeRef::primitive(wider(id, PrimitiveId::Int32).unwrap_or(id))
            }
            _ => ty.clone(),
        }
    }

    /// Type a binary arithmetic operation computes in.
    pub(super) fn operation_type(&self, l: &TypeRef, r: &TypeRef) -> TypeRef {
        if l.is_pointer() {
            return l.clone();
        }
        if r.is_pointer() {
            return r.clone();
        }
        let pl = self.promote(l);
        let pr = self.promote(r);
        let (Some(a), Some(b)) = (pl.primitive_id(), pr.primitive_id()) else {
            return pl;
        };
        if a == PrimitiveId::Boolean && b == PrimitiveId::Boolean {
            return TypeRef::boolean();
        }
        for dominant in [PrimitiveId::Double, PrimitiveId::Single, PrimitiveId::Decimal] {
            if a == dominant || b == dominant {
                return TypeRef::primitive(dominant);
            }
        }
        match wider(a, b) {
            Some(w) => TypeRef::primitive(w),
            None => pl,
        }
    }
}

fn is_string(ty: &TypeRef) -> bool {
    ty.is_primitive(PrimitiveId::String)
}

fn is_float(ty: &TypeRef) -> bool {
    ty.primitive_id()
        .is_some_and(|id| info_for(id).category == PrimitiveCategory::Float)
}

/// Only declared structs and classes can carry `op_*` methods.
fn has_user_operators(class: TypeClass) -> bool {
    matches!(class, TypeClass::Struct | TypeClass::Class)
}

fn return_type_on(m: &MethodDecl, owner: &TypeRef) -> TypeRef {
    m.return_type
        .as_ref()
        .map(|t| t.substitute(owner.args(), &[]))
        .unwrap_or_else(TypeRef::void)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use nativize_model::{Assembly, Literal, MethodDecl, ParamDecl, PropertyRef, TypeDecl, TypeKind};

    use super::*;
    use crate::backend::type_table::TypeTable;
    use crate::config::BackendConfig;

    fn assembly() -> Assembly {
        let vec = TypeRef::named("App.Vec");
        Assembly::new("App")
            .with_type(
                TypeDecl::new("App.Vec", TypeKind::Struct)
                    .with_method(
                        MethodDecl::new("op_Addition")
                            .static_()
                            .with_param(ParamDecl::new("a", vec.clone()))
                            .with_param(ParamDecl::new("b", vec.clone()))
                            .returning(vec.clone()),
                    )
                    .with_method(
                        MethodDecl::new("op_UnaryNegation")
                            .static_()
                            .with_param(ParamDecl::new("a", vec.clone()))
                            .returning(vec),
                    ),
            )
            .with_type(TypeDecl::new("App.Color", TypeKind::Enum))
            .with_type(TypeDecl::new("App.Widget", TypeKind::Class))
    }

    fn run(cx: &mut TranslationContext, expr: &Expr) -> AnnotatedText {
        let asm = assembly();
        let table = TypeTable::new(&asm, &HashSet::new());
        let config = BackendConfig::default();
        let mut t = Translator::new(&table, &config, "App");
        t.translate_expr(cx, expr).unwrap()
    }

    fn cx() -> TranslationContext {
        let mut cx = TranslationContext::new("App.Widget::Run", TypeRef::named("App.Widget"));
        cx.declare_local("v", TypeRef::named("App.Vec"));
        cx.declare_local("c", TypeRef::char());
        cx.declare_local("d", TypeRef::primitive(PrimitiveId::Double));
        cx.declare_local("b", TypeRef::primitive(PrimitiveId::Byte));
        cx
    }

    #[test]
    fn test_user_operators_are_called() {
        let mut cx = cx();
        let sum = run(&mut cx, &Expr::binary(BinaryOp::Add, Expr::var("v"), Expr::var("v")));
        assert_eq!(sum.text, "::App::Vec::op_Addition(v, v)");
        assert_eq!(sum.ty, TypeRef::named("App.Vec"));
        let neg = run(&mut cx, &Expr::unary(UnaryOp::Negate, Expr::var("v")));
        assert_eq!(neg.text, "::App::Vec::op_UnaryNegation(v)");
    }

    #[test]
    fn test_promotions() {
        let mut cx = cx();
        let char_math = run(&mut cx, &Expr::binary(BinaryOp::Add, Expr::var("c"), Expr::int(1)));
        assert_eq!(char_math.ty, TypeRef::int32());
        let byte_math = run(&mut cx, &Expr::binary(BinaryOp::BitwiseOr, Expr::var("b"), Expr::var("b")));
        assert_eq!(byte_math.ty, TypeRef::int32());
        let wide = run(
            &mut cx,
            &Expr::binary(BinaryOp::Multiply, Expr::int(2), Expr::literal(Literal::I64(3))),
        );
        assert_eq!(wide.ty, TypeRef::primitive(PrimitiveId::Int64));
        let float = run(&mut cx, &Expr::binary(BinaryOp::Add, Expr::var("d"), Expr::int(1)));
        assert_eq!(float.ty, TypeRef::primitive(PrimitiveId::Double));
    }

    #[test]
    fn test_float_modulus_uses_runtime() {
        let mut cx = cx();
        let text = run(&mut cx, &Expr::binary(BinaryOp::Modulus, Expr::var("d"), Expr::int(2)));
        assert_eq!(text.text, "::CrossNetRuntime::__Math__::Modulo(d, 2)");
    }

    #[test]
    fn test_comparisons_are_boolean() {
        let mut cx = cx();
        let text = run(&mut cx, &Expr::binary(BinaryOp::LessThan, Expr::var("c"), Expr::int(3)));
        assert_eq!(text.text, "c < 3");
        assert_eq!(text.ty, TypeRef::boolean());
    }

    #[test]
    fn test_negating_a_negative_literal_stays_unambiguous() {
        let mut cx = cx();
        let text = run(&mut cx, &Expr::unary(UnaryOp::Negate, Expr::int(-1)));
        assert_eq!(text.text, "-(-1)");
    }

    #[test]
    fn test_prefix_property_increment_yields_the_setter_result() {
        let mut cx = cx();
        let prop = PropertyRef::new(TypeRef::named("App.Widget"), "Count", TypeRef::int32());
        let text = run(
            &mut cx,
            &Expr::unary(UnaryOp::PreIncrement, Expr::property(Some(Expr::This), prop)),
        );
        assert_eq!(text.text, "this->set_Count(this->get_Count() + 1)");
        assert!(cx.take_pre_statements().is_empty());
    }

    #[test]
    fn test_postfix_property_decrement_yields_the_old_value() {
        let mut cx = cx();
        let prop = PropertyRef::new(TypeRef::named("App.Widget"), "Count", TypeRef::int32());
        let text = run(
            &mut cx,
            &Expr::unary(UnaryOp::PostDecrement, Expr::property(Some(Expr::This), prop)),
        );
        assert_eq!(
            text.text,
            "(__temp0__ = this->get_Count(), this->set_Count(__temp0__ - 1), __temp0__)"
        );
        assert_eq!(text.ty, TypeRef::int32());
        assert_eq!(cx.take_pre_statements(), vec!["::System::Int32 __temp0__;".to_string()]);
    }
}
