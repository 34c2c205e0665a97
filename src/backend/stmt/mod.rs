//! Statement translation.
//!
//! Statements are written straight into a [`CppEmitter`]. Expressions inside a statement may hoist
//! pre-statements (interface-call temporaries, array initializers, object initializer blocks); those are flushed
//! right before the statement that produced them. Compound statements flush after translating their header
//! expressions and before their bodies, so a loop's hoisted temporaries land in front of the loop header.
//!
//! ## Module organization
//!
//! - `mod.rs` - Dispatch, blocks, conditionals, loops, jumps, lock/fixed, events
//! - `foreach` - `foreach` lowering onto index loops or enumerators
//! - `switch` - `switch`, including the hashed string switch
//! - `exceptions` - `try`/`catch`/`finally` emulation and `using`

mod exceptions;
mod foreach;
mod switch;

use nativize_core::lang::primitives::PrimitiveId;
use nativize_core::lang::runtime;
use nativize_model::{Block, EventRef, Expr, Stmt, TypeRef};

use super::Translator;
use super::context::{PropertyMode, TranslationContext};
use super::emitter::CppEmitter;
use super::errors::TranslateResult;
use super::local_name;

impl<'t, 'a> Translator<'t, 'a> {
    /// Translate a method body into its braced C++ text.
    ///
    /// ## Errors
    /// - `TranslateError::InternalDefect`: a statement references an undeclared name, or the context is unbalanced
    ///   once the body is complete.
    pub(super) fn translate_method_body(&mut self, cx: &mut TranslationContext, body: &Block) -> TranslateResult<String> {
        let mut out = CppEmitter::with_indent(self.config.indent);
        self.translate_body_into(cx, body, &mut out)?;
        Ok(out.finish())
    }

    /// Like [`Translator::translate_method_body`], writing into an existing emitter.
    pub(super) fn translate_body_into(
        &mut self,
        cx: &mut TranslationContext,
        body: &Block,
        out: &mut CppEmitter,
    ) -> TranslateResult<()> {
        walk_block(body, &mut |s| {
            if let Stmt::Labeled { label, .. } = s {
                cx.declare_label(label);
            }
        });
        self.translate_block(cx, body, out)?;
        cx.check_balanced()
    }

    pub(super) fn translate_block(
        &mut self,
        cx: &mut TranslationContext,
        block: &Block,
        out: &mut CppEmitter,
    ) -> TranslateResult<()> {
        out.line("{");
        out.indent();
        for stmt in &block.statements {
            self.translate_stmt(cx, stmt, out)?;
        }
        out.dedent();
        out.line("}");
        Ok(())
    }

    pub(super) fn translate_stmt(&mut self, cx: &mut TranslationContext, stmt: &Stmt, out: &mut CppEmitter) -> TranslateResult<()> {
        match stmt {
            Stmt::Block { body } => self.translate_block(cx, body, out),
            Stmt::Expression { expr } => {
                let text = self.translate_expr(cx, expr)?;
                flush(cx, out);
                out.line(&format!("{};", text.text));
                Ok(())
            }
            Stmt::If {
                condition,
                then,
                otherwise,
            } => {
                let c = self.translate_condition(cx, condition)?;
                flush(cx, out);
                out.line(&format!("if ({})", c));
                self.translate_block(cx, then, out)?;
                if let Some(otherwise) = otherwise {
                    if !otherwise.is_empty() {
                        out.line("else");
                        self.translate_block(cx, otherwise, out)?;
                    }
                }
                Ok(())
            }
            Stmt::While { condition, body } => {
                let c = self.translate_condition(cx, condition)?;
                flush(cx, out);
                if c == "true" {
                    out.line("for ( ; ; )");
                } else {
                    out.line(&format!("while ({})", c));
                }
                self.translate_block(cx, body, out)
            }
            Stmt::Do { body, condition } => {
                let c = self.translate_condition(cx, condition)?;
                flush(cx, out);
                if c == "true" {
                    out.line("for ( ; ; )");
                    return self.translate_block(cx, body, out);
                }
                out.line("do");
                self.translate_block(cx, body, out)?;
                out.line(&format!("while ({});", c));
                Ok(())
            }
            Stmt::For {
                init,
                condition,
                increment,
                body,
            } => {
                let init = self.translate_clause(cx, init)?;
                let condition = match condition {
                    Some(c) => self.translate_condition(cx, c)?,
                    None => String::new(),
                };
                let increment = self.translate_clause(cx, increment)?;
                flush(cx, out);
                out.line(&format!("for ({} ; {} ; {})", init, condition, increment));
                self.translate_block(cx, body, out)
            }
            Stmt::ForEach {
                variable,
                collection,
                body,
            } => self.translate_foreach(cx, variable, collection, body, out),
            Stmt::Switch { value, cases } => self.translate_switch(cx, value, cases, out),
            Stmt::Try { body, catches, finally } => self.translate_try(cx, body, catches, finally.as_ref(), out),
            Stmt::Throw { value } => {
                match value {
                    Some(v) => {
                        let t = self.translate_expr(cx, v)?;
                        flush(cx, out);
                        out.line(&format!("throw {};", t.text));
                    }
                    None => out.line("throw;"),
                }
                Ok(())
            }
            Stmt::Using { resource, body } => self.translate_using(cx, resource, body, out),
            Stmt::Lock { target, body } => {
                let t = self.translate_expr(cx, target)?;
                flush(cx, out);
                out.line("{");
                out.indent();
                out.line(&format!("{}({});", runtime::LOCK, t.text));
                self.translate_block(cx, body, out)?;
                out.line(&format!("{}({});", runtime::UNLOCK, t.text));
                out.dedent();
                out.line("}");
                Ok(())
            }
            Stmt::Fixed { variable, value, body } => {
                let v = self.translate_fixed_source(cx, &variable.ty, value)?;
                cx.declare_local(&variable.name, variable.ty.clone());
                cx.uses_low_level = true;
                let decl = self.local_type(cx, &variable.ty);
                let name = local_name(&variable.name);
                flush(cx, out);
                out.line("{");
                out.indent();
                out.line(&format!("{} {} = {};", decl, name, v));
                out.line(&format!("{}({}, true);", runtime::SET_FIXED, name));
                self.translate_block(cx, body, out)?;
                out.line(&format!("{}({}, false);", runtime::SET_FIXED, name));
                out.dedent();
                out.line("}");
                Ok(())
            }
            Stmt::Labeled { label, body } => {
                let label = local_name(label);
                if matches!(body.as_ref(), Stmt::Block { body } if body.is_empty()) {
                    out.line(&format!("{}: ;", label));
                    return Ok(());
                }
                out.line(&format!("{}:", label));
                self.translate_stmt(cx, body, out)
            }
            Stmt::Goto { label } => {
                if cx.has_label(label) {
                    out.line(&format!("goto {};", local_name(label)));
                } else {
                    // Decompilers emit gotos to missing labels for `continue` inside some loops.
                    tracing::debug!(label = %label, location = %cx.location, "goto to an unknown label became continue");
                    out.line("continue;");
                }
                Ok(())
            }
            Stmt::Break => {
                out.line("break;");
                Ok(())
            }
            Stmt::Continue => {
                out.line("continue;");
                Ok(())
            }
            Stmt::Return { value } => {
                let Some(value) = value else {
                    out.line("return;");
                    return Ok(());
                };
                let ret = cx.return_type.clone();
                let v = {
                    let mut g = cx.push_cast_target(ret.clone());
                    self.translate_expr(&mut g, value)?
                };
                let v = self.convert(cx, &ret, v);
                flush(cx, out);
                out.line(&format!("return ({});", v.text));
                Ok(())
            }
            Stmt::Comment { text } => {
                for line in text.lines() {
                    out.line(&format!("// {}", line));
                }
                Ok(())
            }
            Stmt::AttachEvent { event, target, handler } => {
                self.translate_event_update(cx, "add_", event, target.as_ref(), handler, out)
            }
            Stmt::RemoveEvent { event, target, handler } => {
                self.translate_event_update(cx, "remove_", event, target.as_ref(), handler, out)
            }
            Stmt::Unsupported { construct } => {
                let text = self.unit.unimplemented(construct, &cx.location);
                out.line(&format!("{};", text));
                Ok(())
            }
        }
    }

    fn translate_condition(&mut self, cx: &mut TranslationContext, condition: &Expr) -> TranslateResult<String> {
        let mut g = cx.push_property_mode(PropertyMode::Get);
        Ok(self.translate_expr(&mut g, condition)?.text)
    }

    /// Initializer or increment clause of a `for` header: expression statements joined by commas.
    fn translate_clause(&mut self, cx: &mut TranslationContext, stmts: &[Stmt]) -> TranslateResult<String> {
        let mut parts = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            match stmt {
                Stmt::Expression { expr } => parts.push(self.translate_expr(cx, expr)?.text),
                _ => parts.push(self.unit.unimplemented("compound statement in a for clause", &cx.location)),
            }
        }
        Ok(parts.join(", "))
    }

    /// Source of a `fixed` pin. Strings pinned as `char*` go through `__ToCString__()`, arrays through
    /// `__ToPointer__()`.
    fn translate_fixed_source(&mut self, cx: &mut TranslationContext, pointer: &TypeRef, value: &Expr) -> TranslateResult<String> {
        let char_pointer = pointer.element().is_some_and(|e| e.is_primitive(PrimitiveId::Char));
        if char_pointer {
            if let Expr::Cast { operand, .. } = value {
                let inner = self.translate_expr(cx, operand)?;
                if inner.ty.is_primitive(PrimitiveId::String) {
                    return Ok(format!("{}->__ToCString__()", inner.text));
                }
            }
        }
        let v = self.translate_expr(cx, value)?;
        if v.ty.is_array() {
            return Ok(format!("{}->__ToPointer__()", v.text));
        }
        Ok(v.text)
    }

    /// `target->add_E(handler);`, through an interface call when the target is an interface.
    fn translate_event_update(
        &mut self,
        cx: &mut TranslationContext,
        accessor: &str,
        event: &EventRef,
        target: Option<&Expr>,
        handler: &Expr,
        out: &mut CppEmitter,
    ) -> TranslateResult<()> {
        let event_type = event.ty.substitute(event.declaring_type.args(), &[]);
        let h = {
            let mut g = cx.push_cast_target(event_type.clone());
            self.translate_expr(&mut g, handler)?
        };
        let h = self.convert(cx, &event_type, h);
        let member = format!("{}{}", accessor, local_name(&event.name));

        let line = if event.is_static {
            let scope = self.names(cx).static_scope(&event.declaring_type);
            format!("{}::{}({});", scope, member, h.text)
        } else {
            match target {
                None => {
                    let in_carrier = cx.closure.as_ref().is_some_and(|c| c.inside_carrier());
                    if in_carrier {
                        format!("{}->{}({});", runtime::CLOSURE_THIS, member, h.text)
                    } else {
                        format!("{}({});", member, h.text)
                    }
                }
                Some(target) => {
                    let t = self.translate_expr(cx, target)?;
                    if self.table.is_interface(&t.ty) {
                        let temp = self.unit.next_temp();
                        let local = self.local_type(cx, &t.ty);
                        let iface = self.names(cx).type_name(&t.ty);
                        cx.hoist(format!("{} {} = {};", local, temp, t.text));
                        format!("{};", interface_call(&temp, &iface, &member, &[h.text]))
                    } else {
                        format!("{}{}{}({});", t.text, self.table.member_access(&t.ty), member, h.text)
                    }
                }
            }
        };
        flush(cx, out);
        out.line(&line);
        Ok(())
    }
}

/// Emit the pending pre-statements of `cx`.
fn flush(cx: &mut TranslationContext, out: &mut CppEmitter) {
    for line in cx.take_pre_statements() {
        out.line(&line);
    }
}

/// `INTERFACE__CALL(obj, I)->member(obj, args...)`.
pub(super) fn interface_call(object: &str, interface: &str, member: &str, args: &[String]) -> String {
    let mut all = vec![object.to_string()];
    all.extend(args.iter().cloned());
    format!(
        "{}({}, {})->{}({})",
        runtime::INTERFACE_CALL,
        object,
        interface,
        member,
        all.join(", ")
    )
}

/// Visit every statement of `block`, nested statements included. Expressions, and so the bodies of anonymous
/// methods, are not entered.
pub(super) fn walk_block<'m, F: FnMut(&'m Stmt)>(block: &'m Block, f: &mut F) {
    for stmt in &block.statements {
        walk_stmt(stmt, f);
    }
}

pub(super) fn walk_stmt<'m, F: FnMut(&'m Stmt)>(stmt: &'m Stmt, f: &mut F) {
    f(stmt);
    match stmt {
        Stmt::Block { body }
        | Stmt::While { body, .. }
        | Stmt::Do { body, .. }
        | Stmt::ForEach { body, .. }
        | Stmt::Using { body, .. }
        | Stmt::Lock { body, .. }
        | Stmt::Fixed { body, .. } => walk_block(body, f),
        Stmt::If { then, otherwise, .. } => {
            walk_block(then, f);
            if let Some(otherwise) = otherwise {
                walk_block(otherwise, f);
            }
        }
        Stmt::For {
            init, increment, body, ..
        } => {
            for s in init.iter().chain(increment) {
                walk_stmt(s, f);
            }
            walk_block(body, f);
        }
        Stmt::Switch { cases, .. } => {
            for case in cases {
                walk_block(&case.body, f);
            }
        }
        Stmt::Try { body, catches, finally } => {
            walk_block(body, f);
            for c in catches {
                walk_block(&c.body, f);
            }
            if let Some(finally) = finally {
                walk_block(finally, f);
            }
        }
        Stmt::Labeled { body, .. } => walk_stmt(body, f),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use nativize_model::{Assembly, BinaryOp, MethodDecl, MethodRef, TypeDecl, TypeKind, VariableDecl};

    use super::*;
    use crate::backend::type_table::TypeTable;
    use crate::config::BackendConfig;

    pub(super) fn assembly() -> Assembly {
        Assembly::new("App")
            .with_type(TypeDecl::new("App.Widget", TypeKind::Class))
            .with_type(
                TypeDecl::new("App.Bag", TypeKind::Class)
                    .with_interface(TypeRef::generic("System.Collections.Generic.IEnumerable`1", vec![TypeRef::int32()])),
            )
            .with_type(TypeDecl::new("App.Resource", TypeKind::Class).with_interface(TypeRef::named("System.IDisposable")))
            .with_type(
                TypeDecl::new("App.Items", TypeKind::Class)
                    .with_method(MethodDecl::new("GetEnumerator").returning(TypeRef::named("App.Items+Enumerator"))),
            )
            .with_type(
                TypeDecl::new("App.Items+Enumerator", TypeKind::Struct)
                    .with_method(MethodDecl::new("MoveNext").returning(TypeRef::boolean()))
                    .with_method(MethodDecl::new("get_Current").returning(TypeRef::int32())),
            )
    }

    pub(super) fn body(cx: &mut TranslationContext, block: Block) -> String {
        let asm = assembly();
        let table = TypeTable::new(&asm, &HashSet::new());
        let config = BackendConfig::default();
        let mut t = Translator::new(&table, &config, "App");
        t.translate_method_body(cx, &block).unwrap()
    }

    pub(super) fn cx() -> TranslationContext {
        TranslationContext::new("App.Widget::Run", TypeRef::named("App.Widget"))
    }

    #[test]
    fn test_while_true_becomes_for_ever() {
        let block = Block::new(vec![Stmt::While {
            condition: Expr::bool(true),
            body: Block::new(vec![Stmt::Break]),
        }]);
        insta::assert_snapshot!(body(&mut cx(), block), @r"
        {
            for ( ; ; )
            {
                break;
            }
        }
        ");
    }

    #[test]
    fn test_for_loop_header() {
        let i = || Expr::var("i");
        let block = Block::new(vec![Stmt::For {
            init: vec![Stmt::local("i", TypeRef::int32(), Expr::int(0))],
            condition: Some(Expr::binary(BinaryOp::LessThan, i(), Expr::int(10))),
            increment: vec![Stmt::expr(Expr::assign(i(), Expr::binary(BinaryOp::Add, i(), Expr::int(1))))],
            body: Block::default(),
        }]);
        let text = body(&mut cx(), block);
        assert!(text.contains("for (::System::Int32 i = 0 ; i < 10 ; i = i + 1)"), "{}", text);
    }

    #[test]
    fn test_goto_to_unknown_label_is_continue() {
        let block = Block::new(vec![
            Stmt::Labeled {
                label: "top".into(),
                body: Box::new(Stmt::Block { body: Block::default() }),
            },
            Stmt::Goto { label: "top".into() },
            Stmt::Goto { label: "missing".into() },
        ]);
        insta::assert_snapshot!(body(&mut cx(), block), @r"
        {
            top: ;
            goto top;
            continue;
        }
        ");
    }

    #[test]
    fn test_return_converts_to_the_return_type() {
        let mut cx = cx();
        cx.return_type = TypeRef::object();
        let block = Block::new(vec![Stmt::ret(Some(Expr::int(3)))]);
        let text = body(&mut cx, block);
        assert!(text.contains("return (::CrossNetRuntime::Box<::System::Object >(3));"), "{}", text);
    }

    #[test]
    fn test_lock_brackets_the_body() {
        let mut cx = cx();
        cx.declare_local("gate", TypeRef::object());
        let block = Block::new(vec![Stmt::Lock {
            target: Expr::var("gate"),
            body: Block::default(),
        }]);
        insta::assert_snapshot!(body(&mut cx, block), @r"
        {
            {
                ::System::Object::__Lock__(gate);
                {
                }
                ::System::Object::__Unlock__(gate);
            }
        }
        ");
    }

    #[test]
    fn test_fixed_pins_and_unpins() {
        let mut cx = cx();
        cx.declare_local("data", TypeRef::array(TypeRef::int32()));
        let block = Block::new(vec![Stmt::Fixed {
            variable: VariableDecl::new("p", TypeRef::pointer(TypeRef::int32())),
            value: Expr::var("data"),
            body: Block::default(),
        }]);
        let text = body(&mut cx, block);
        assert!(text.contains("::System::Int32 * p = data->__ToPointer__();"), "{}", text);
        assert!(text.contains("::CrossNetRuntime::SetFixed(p, true);"));
        assert!(text.contains("::CrossNetRuntime::SetFixed(p, false);"));
        assert!(cx.uses_low_level);
    }

    #[test]
    fn test_hoisted_statements_precede_their_statement() {
        let mut cx = cx();
        cx.declare_local("d", TypeRef::named("System.IDisposable"));
        let dispose = MethodRef::new(TypeRef::named("System.IDisposable"), "Dispose");
        let block = Block::new(vec![Stmt::expr(Expr::call(Some(Expr::var("d")), dispose, vec![]))]);
        insta::assert_snapshot!(body(&mut cx, block), @r"
        {
            ::System::IDisposable * __temp0__ = d;
            INTERFACE__CALL(__temp0__, ::System::IDisposable)->Dispose(__temp0__);
        }
        ");
    }

    #[test]
    fn test_event_attach_on_this() {
        let handler_type = TypeRef::named("App.Handler");
        let event = EventRef::new(TypeRef::named("App.Widget"), "Changed", handler_type.clone());
        let mut cx = cx();
        cx.declare_local("h", handler_type);
        let block = Block::new(vec![Stmt::AttachEvent {
            event,
            target: Some(Expr::This),
            handler: Expr::var("h"),
        }]);
        let text = body(&mut cx, block);
        assert!(text.contains("this->add_Changed(h);"), "{}", text);
    }

    #[test]
    fn test_comment_passes_through() {
        let block = Block::new(vec![Stmt::Comment { text: "note".into() }]);
        assert!(body(&mut cx(), block).contains("// note"));
    }
}
