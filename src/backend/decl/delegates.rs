//! Delegate macros.
//!
//! A delegate type is a single `CREATE_DELEGATE` invocation; the runtime macro expands to the delegate class and
//! its functor. Only the signature of `Invoke` is needed.

use nativize_core::lang::runtime;
use nativize_model::TypeDecl;

use super::super::errors::{TranslateError, TranslateResult};
use super::super::names::Names;
use super::super::output::TypeText;
use super::super::{Translator, local_name};
use super::members::effective_return;
use super::{TypeScope, in_namespaces};

/// `__Wn__(a, b)`, the wrapper that keeps a comma-separated list a single macro argument.
fn wrapped(items: &[String]) -> String {
    format!("__W{}__({})", items.len(), items.join(", "))
}

impl<'t, 'a> Translator<'t, 'a> {
    /// Emit a delegate type.
    ///
    /// ## Errors
    /// - `TranslateError::InvalidModel`: the delegate has no instance `Invoke` method.
    pub(super) fn emit_delegate(&mut self, decl: &TypeDecl) -> TranslateResult<TypeText> {
        let Some(invoke) = decl.delegate_invoke() else {
            return Err(TranslateError::InvalidModel(format!("delegate `{}` has no `Invoke` method", decl.key)));
        };
        let scope = TypeScope::new(decl);
        let names = Names::new(self.table).with_typename(scope.generic);

        let declarations: Vec<String> = invoke
            .params
            .iter()
            .map(|p| format!("{} {}", names.param_type(&p.ty, p.mode), local_name(&p.name)))
            .collect();
        let arguments: Vec<String> = invoke.params.iter().map(|p| local_name(&p.name)).collect();
        let ret = effective_return(invoke);
        let returns = if ret.is_void() {
            format!(", {}", names.type_name(&ret))
        } else {
            format!("return, {}", names.type_decl(&ret))
        };

        let mut text = format!(
            "{}{}({}, {}, {}, {}",
            runtime::CREATE_DELEGATE_MACRO,
            if scope.generic { "__G" } else { "" },
            scope.name,
            returns,
            wrapped(&declarations),
            wrapped(&arguments)
        );
        if scope.generic {
            let typenames: Vec<String> = decl.generic_params.iter().map(|p| format!("typename {}", p)).collect();
            text.push_str(&format!(", {}, {}", wrapped(&typenames), wrapped(&decl.generic_params)));
        }
        text.push_str(")\n");

        let mut forward = String::new();
        if let Some(t) = scope.template_header() {
            forward.push_str(&t);
            forward.push('\n');
        }
        forward.push_str(&format!("class {};\n", scope.name));
        tracing::debug!(params = invoke.params.len(), generic = scope.generic, "emitted delegate");

        let indent = self.config.indent;
        Ok(TypeText {
            key: decl.key.clone(),
            declaration: in_namespaces(&decl.key, &forward, indent),
            definition: in_namespaces(&decl.key, &text, indent),
            methods: String::new(),
        })
    }
}
