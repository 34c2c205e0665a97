//! Method signatures and bodies.
//!
//! Every method of a class or struct goes through [`Translator::emit_method`]. Constructors and static
//! constructors get a preamble before the translated body: instance field initializers and the chained
//! constructor call, or the static field initializers and, for generic types, the run-once guard.

use nativize_core::lang::cpp_keywords::sanitize_extended;
use nativize_core::lang::runtime;
use nativize_model::{
    Block, Expr, FieldRef, InitializerTarget, MethodDecl, MethodKind, ParamDecl, Stmt, TypeDecl, TypeKind, TypeRef,
};

use super::super::Translator;
use super::super::context::TranslationContext;
use super::super::diagnostics::{Diagnostic, DiagnosticCode};
use super::super::emitter::CppEmitter;
use super::super::errors::TranslateResult;
use super::super::expr::method_member_name;
use super::super::local_name;
use super::super::names::Names;
use super::super::stmt::walk_block;
use super::closures;
use super::types::{TypeParts, emitted_fields, static_initializer};
use super::{TypeScope, emit_member};

/// Return type as emitted. Setters return the assigned value so assignments through properties chain.
pub(super) fn effective_return(m: &MethodDecl) -> TypeRef {
    if m.kind == MethodKind::Setter && m.return_type.is_none() {
        if let Some(value) = m.params.last() {
            return value.ty.clone();
        }
    }
    m.return_type.clone().unwrap_or_else(TypeRef::void)
}

/// Member name of `m` inside its class.
pub(super) fn declared_name(names: Names<'_, '_>, decl: &TypeDecl, m: &MethodDecl) -> String {
    let name = match m.kind {
        MethodKind::Constructor => runtime::CTOR.to_string(),
        MethodKind::StaticConstructor => runtime::STATIC_CTOR.to_string(),
        MethodKind::Finalizer => format!("~{}", Names::declaration_name(&decl.key)),
        // Explicit interface implementations keep their qualified name so they cannot clash with a public
        // method of the same simple name.
        _ if m.name.contains('.') && !m.overrides.is_empty() => sanitize_extended(&m.name),
        _ => method_member_name(names, &m.name, &[], &effective_return(m)),
    };
    if m.generic_params.is_empty() {
        name
    } else {
        format!("{}__G{}", name, m.generic_params.len())
    }
}

/// Fresh translation context for a member of `scope`.
pub(super) fn method_context(scope: &TypeScope<'_>, m: &MethodDecl) -> TranslationContext {
    let mut cx = TranslationContext::new(scope.location(&m.name), scope.self_ty.clone());
    cx.in_value_type = scope.value_type;
    cx.in_generic_type = scope.generic || !m.generic_params.is_empty();
    cx.is_static = m.is_static;
    cx.return_type = effective_return(m);
    for p in &m.params {
        cx.declare_param(&p.name, p.ty.clone(), p.mode);
    }
    cx
}

impl<'t, 'a> Translator<'t, 'a> {
    /// Declare and define one method of a class or struct.
    ///
    /// ## Errors
    /// - `TranslateError::InternalDefect`: propagated from body translation.
    pub(super) fn emit_method(&mut self, scope: &TypeScope<'_>, m: &MethodDecl, parts: &mut TypeParts) -> TranslateResult<()> {
        let name = declared_name(Names::new(self.table), scope.decl, m);
        let generic_method = !m.generic_params.is_empty();
        let inline = scope.generic || generic_method;
        let mut cx = method_context(scope, m);
        let params = self.param_list(&cx, &m.params);

        let ret = match m.kind {
            MethodKind::Constructor | MethodKind::StaticConstructor => "void ".to_string(),
            MethodKind::Finalizer => String::new(),
            _ => format!("{} ", self.return_type_decl(&cx, &cx.return_type)),
        };
        let wants_virtual = m.is_abstract
            || (m.is_virtual && m.is_new_slot && !scope.decl.is_sealed && !m.is_final && !scope.value_type)
            || (m.kind == MethodKind::Finalizer && !scope.value_type);
        let mut prefix = if m.is_static { "static " } else { "" }.to_string();

        if generic_method && m.is_abstract {
            self.unit.report(Diagnostic::new(
                DiagnosticCode::GenericAbstractMethod,
                "generic abstract method cannot be expressed as a C++ template; emitted a plain declaration",
                scope.location(&m.name),
            ));
            parts.members.line(&Names::template_header(&m.generic_params));
            parts.members.line(&format!("{}{}{}({});", prefix, ret, name, params));
            return Ok(());
        }
        if generic_method && wants_virtual {
            self.unit.report(Diagnostic::new(
                DiagnosticCode::GenericVirtualMethod,
                "generic virtual method emitted without `virtual`",
                scope.location(&m.name),
            ));
            parts.members.line("// virtual dropped: a template method cannot be virtual.");
            parts.members.line("// Calls through a base reference dispatch statically.");
        } else if wants_virtual {
            prefix.push_str("virtual ");
        }

        let declaration = format!("{}{}{}({})", prefix, ret, name, params);
        if m.is_abstract {
            parts.members.line(&format!("{} = 0;", declaration));
            return Ok(());
        }
        let Some(body) = &m.body else {
            parts.members.line(&format!("{};", declaration));
            return Ok(());
        };

        let body = self.method_body(scope, m, &mut cx, body, parts)?;
        let header = format!("{}{}::{}({})", ret, scope.qualified, name, params);
        if generic_method {
            parts.members.line(&Names::template_header(&m.generic_params));
        }
        emit_member(&mut parts.members, &mut parts.out_of_line, inline, &declaration, &header, &body);
        Ok(())
    }

    /// Pure virtual dispatch slot of an interface method. The implementing object arrives as the first argument.
    pub(super) fn emit_interface_method(&mut self, scope: &TypeScope<'_>, m: &MethodDecl, parts: &mut TypeParts) {
        if !m.generic_params.is_empty() {
            self.unit.report(Diagnostic::new(
                DiagnosticCode::GenericVirtualMethod,
                "generic interface method has no dispatch slot",
                scope.location(&m.name),
            ));
            return;
        }
        let cx = method_context(scope, m);
        let name = declared_name(Names::new(self.table), scope.decl, m);
        let ret = self.return_type_decl(&cx, &cx.return_type);
        let mut params = format!("void * {}", runtime::PASSED_INSTANCE);
        if !m.params.is_empty() {
            params.push_str(", ");
            params.push_str(&self.param_list(&cx, &m.params));
        }
        parts.members.line(&format!("virtual {} {}({}) = 0;", ret, name, params));
    }

    /// Braced body of `m`: closure prologue, constructor preamble, statements and the implicit returns.
    fn method_body(
        &mut self,
        scope: &TypeScope<'_>,
        m: &MethodDecl,
        cx: &mut TranslationContext,
        body: &Block,
        parts: &mut TypeParts,
    ) -> TranslateResult<String> {
        let mut out = CppEmitter::with_indent(self.config.indent);
        out.line("{");
        out.indent();

        let captures = closures::scan(&m.params, body);
        let carrier = if captures.has_closures {
            Some(self.open_closure(scope, cx, &captures, &mut out))
        } else {
            None
        };

        match m.kind {
            MethodKind::Constructor => self.constructor_preamble(scope, m, cx, &mut out)?,
            MethodKind::StaticConstructor => self.static_constructor_preamble(scope, cx, &mut out)?,
            _ => {}
        }

        walk_block(body, &mut |s| {
            if let Stmt::Labeled { label, .. } = s {
                cx.declare_label(label);
            }
        });
        for stmt in &body.statements {
            self.translate_stmt(cx, stmt, &mut out)?;
        }

        if m.kind == MethodKind::Setter {
            if let Some(value) = m.params.last() {
                let slot = self
                    .captured_slot(cx, &value.name)
                    .unwrap_or_else(|| local_name(&value.name));
                out.line(&format!("return ({});", slot));
            }
        } else if m.returns_value() && matches!(body.statements.last(), Some(Stmt::Try { .. })) {
            // Every path of the emulated `try` returns, but the C++ compiler cannot see it.
            let ret = cx.return_type.clone();
            let value = self.default_value(cx, &ret);
            out.line(&format!("return ({});", value.text));
        }

        out.dedent();
        out.line("}");
        cx.check_balanced()?;

        if let Some(carrier) = carrier {
            let methods = std::mem::take(&mut self.closure_methods);
            self.emit_carrier(scope, &carrier, methods, parts);
        }
        Ok(out.finish())
    }

    /// Instance field initializers and the chained constructor call.
    fn constructor_preamble(
        &mut self,
        scope: &TypeScope<'_>,
        m: &MethodDecl,
        cx: &mut TranslationContext,
        out: &mut CppEmitter,
    ) -> TranslateResult<()> {
        if scope.generic {
            out.line(&format!("{}();", runtime::STATIC_CTOR));
        }

        let chains_to_this = m
            .initializer
            .as_ref()
            .is_some_and(|i| i.target == InitializerTarget::This);
        if !chains_to_this {
            for field in emitted_fields(scope.decl).filter(|f| !f.is_static) {
                let Some(value) = &field.initializer else { continue };
                let target = Expr::field(
                    Some(Expr::This),
                    FieldRef::new(scope.self_ty.clone(), field.name.clone(), field.ty.clone()),
                );
                self.translate_stmt(cx, &Stmt::expr(Expr::assign(target, value.clone())), out)?;
            }
        }

        let base = scope.decl.base.clone().unwrap_or_else(TypeRef::object);
        let call = match &m.initializer {
            Some(init) if init.target == InitializerTarget::This => {
                let (params, resolved) = self.constructor_params(&scope.self_ty, init.args.len());
                let args = self.translate_args(cx, &params, &resolved, &init.args)?;
                Some(format!("{}({});", runtime::CTOR, args.join(", ")))
            }
            Some(init) if scope.decl.kind == TypeKind::Class => {
                let (params, resolved) = self.constructor_params(&base, init.args.len());
                let args = self.translate_args(cx, &params, &resolved, &init.args)?;
                let owner = Names::new(self.table).type_name(&base);
                Some(format!("{}::{}({});", owner, runtime::CTOR, args.join(", ")))
            }
            None if scope.decl.kind == TypeKind::Class => {
                let owner = Names::new(self.table).type_name(&base);
                Some(format!("{}::{}();", owner, runtime::CTOR))
            }
            _ => None,
        };
        for line in cx.take_pre_statements() {
            out.line(&line);
        }
        if let Some(call) = call {
            out.line(&call);
        }
        Ok(())
    }

    /// Declared parameters of the constructor of `ty` taking `arity` arguments, plus their substituted types.
    fn constructor_params(&self, ty: &TypeRef, arity: usize) -> (Vec<ParamDecl>, Vec<TypeRef>) {
        let ctor = self.table.decl_of(ty).and_then(|d| {
            d.methods
                .iter()
                .find(|m| m.kind == MethodKind::Constructor && m.params.len() == arity)
        });
        match ctor {
            Some(ctor) => {
                let resolved = ctor.params.iter().map(|p| p.ty.substitute(ty.args(), &[])).collect();
                (ctor.params.clone(), resolved)
            }
            None => (Vec::new(), Vec::new()),
        }
    }

    /// Run-once guard for generic types, then the static field initializers.
    fn static_constructor_preamble(
        &mut self,
        scope: &TypeScope<'_>,
        cx: &mut TranslationContext,
        out: &mut CppEmitter,
    ) -> TranslateResult<()> {
        if scope.generic {
            // Every constructor of a generic type calls this, so it has to tolerate repeated calls.
            out.line("static bool __static_initialized__ = false;");
            out.line("if (__static_initialized__)");
            out.block("", |e| e.line("return;"));
            out.line("__static_initialized__ = true;");
        }
        for field in emitted_fields(scope.decl) {
            let Some(value) = static_initializer(field) else { continue };
            let target = Expr::field(
                None,
                FieldRef::new(scope.self_ty.clone(), field.name.clone(), field.ty.clone()).static_(),
            );
            self.translate_stmt(cx, &Stmt::expr(Expr::assign(target, value)), out)?;
        }
        Ok(())
    }
}
