//! `try`/`catch`/`finally` and `using`.
//!
//! C++ has no `finally`. The finally block is rendered once and its text is replayed:
//! - inside every catch clause, whose body is wrapped in a `try` so the finally code runs before rethrowing,
//! - after the whole statement for the non-exceptional path, preceded by `// Emulation of finally`.
//!
//! A `try` without catch clauses still needs one in C++ and gets an empty `catch (...)`.

use nativize_core::lang::primitives::PrimitiveId;
use nativize_model::{Block, CatchClause, Expr, TypeRef};

use super::super::Translator;
use super::super::context::TranslationContext;
use super::super::emitter::CppEmitter;
use super::super::errors::TranslateResult;
use super::super::local_name;
use super::{flush, interface_call};

const DISPOSABLE: &str = "System.IDisposable";

impl<'t, 'a> Translator<'t, 'a> {
    pub(super) fn translate_try(
        &mut self,
        cx: &mut TranslationContext,
        body: &Block,
        catches: &[CatchClause],
        finally: Option<&Block>,
        out: &mut CppEmitter,
    ) -> TranslateResult<()> {
        out.line("try");
        self.translate_block(cx, body, out)?;

        let finally_text = match finally {
            Some(f) if !f.is_empty() => {
                let mut e = out.sibling();
                self.translate_block(cx, f, &mut e)?;
                Some(e.finish())
            }
            _ => None,
        };

        for clause in catches {
            out.line(&self.catch_header(cx, clause));
            let Some(finally_text) = &finally_text else {
                self.translate_block(cx, &clause.body, out)?;
                continue;
            };
            out.line("{");
            out.indent();
            out.line("try");
            self.translate_block(cx, &clause.body, out)?;
            out.line("catch (...)");
            out.line("{");
            out.indent();
            out.lines(finally_text);
            out.line("throw;");
            out.dedent();
            out.line("}");
            out.dedent();
            out.line("}");
        }
        if catches.is_empty() {
            out.line("catch (...)");
            out.block("", |e| e.line("//Empty catch"));
        }

        if let Some(finally_text) = &finally_text {
            out.line("// Emulation of finally");
            out.lines(finally_text);
        }
        Ok(())
    }

    /// `catch (T * e)`; untyped clauses and clauses catching `object` catch everything.
    fn catch_header(&self, cx: &mut TranslationContext, clause: &CatchClause) -> String {
        let Some(ty) = clause.ty.as_ref().filter(|t| !t.is_primitive(PrimitiveId::Object)) else {
            return "catch (...)".to_string();
        };
        let decl = self.local_type(cx, ty);
        match &clause.variable {
            Some(name) => {
                cx.declare_local(name, ty.clone());
                format!("catch ({} {})", decl, local_name(name))
            }
            None => format!("catch ({})", decl),
        }
    }

    /// `using`: declare the resource, run the body in a `try`, and dispose on both paths.
    pub(super) fn translate_using(
        &mut self,
        cx: &mut TranslationContext,
        resource: &Expr,
        body: &Block,
        out: &mut CppEmitter,
    ) -> TranslateResult<()> {
        let declared = match resource {
            Expr::Assign { target, .. } => match target.as_ref() {
                Expr::VariableDecl { decl } => Some(decl),
                _ => None,
            },
            _ => None,
        };
        let (declaration, name, ty) = match declared {
            Some(decl) => {
                let text = self.translate_expr(cx, resource)?;
                let name = self.captured_slot(cx, &decl.name).unwrap_or_else(|| local_name(&decl.name));
                (text.text, name, decl.ty.clone())
            }
            None => {
                let value = self.translate_expr(cx, resource)?;
                let temp = self.unit.next_temp();
                let text = format!("{} {} = {}", self.local_type(cx, &value.ty), temp, value.text);
                (text, temp, value.ty)
            }
        };
        flush(cx, out);

        let dispose = self.dispose_call(cx, &name, &ty);
        let guarded = !self.table.is_value_type(&ty);
        let emit_dispose = |e: &mut CppEmitter| {
            if guarded {
                e.line(&format!("if ({} != NULL)", name));
                e.block("", |e| e.line(&dispose));
            } else {
                e.line(&dispose);
            }
        };

        out.line("{");
        out.indent();
        out.line(&format!("{};", declaration));
        out.line("try");
        self.translate_block(cx, body, out)?;
        out.line("catch (...)");
        out.block("", |e| {
            emit_dispose(e);
            e.line("throw;");
        });
        emit_dispose(out);
        out.dedent();
        out.line("}");
        Ok(())
    }

    fn dispose_call(&self, cx: &TranslationContext, name: &str, ty: &TypeRef) -> String {
        if self.table.is_value_type(ty) {
            return format!("{}.Dispose();", name);
        }
        if self.table.implements(ty, DISPOSABLE) {
            let iface = self.names(cx).type_name(&TypeRef::named(DISPOSABLE));
            return format!("{};", interface_call(name, &iface, "Dispose", &[]));
        }
        format!("{}->Dispose();", name)
    }
}
