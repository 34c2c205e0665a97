//! nativize backend
//!
//! This module turns one [`Assembly`] of the resolved managed object model into C++ source text.
//!
//! The pipeline is:
//! 1. Index the unit and its references into a [`TypeTable`] (kinds, interface sets, member lookup)
//! 2. Schedule the unit's types in dependency order (`decl::schedule`)
//! 3. Emit every type: class shape, members, interface wrappers, GC trace, closure carriers
//! 4. Flush the per-unit ledgers into the fixed-name setup/teardown functions and lay out the output files
//!
//! ## Module Organization
//!
//! - `type_table` - Kinds, interface union/exclusive sets, member lookup
//! - `names` - Canonical C++ spellings for type references
//! - `casts` - Implicit/explicit cast selection
//! - `context` - Per-method translation state and scoped stacks
//! - `expr/` - Expression translation (literals, operators, members, construction)
//! - `stmt/` - Statement translation (control flow, foreach, switch, exceptions)
//! - `decl/` - Declaration emission (scheduling, types, members, wrappers, enums, delegates, closures, unit setup)
//! - `string_pool` - Per-unit literal pool
//! - `emitter` - Indenting text buffer
//! - `output` - Unit result and file layout
//!
//! ## Notes
//!
//! - Everything mutable for one unit lives in a [`UnitState`] owned by [`Backend::translate_unit`]; units never
//!   share state.
//! - Degradations are collected as [`Diagnostic`]s. Only broken input contracts and internal defects abort a unit
//!   (see [`TranslateError`]).

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod casts;
pub mod context;
mod decl;
pub mod diagnostics;
pub mod emitter;
pub mod errors;
mod expr;
pub mod names;
pub mod output;
pub mod state;
mod stmt;
pub mod string_pool;
pub mod text;
pub mod type_table;

pub use diagnostics::{Diagnostic, DiagnosticCode, Severity};
pub use errors::{TranslateError, TranslateResult};
pub use output::{OutputFile, UnitOutput};

use nativize_core::lang::cpp_keywords::sanitize;
use nativize_model::{Assembly, ParamDecl, TypeRef};

use crate::config::BackendConfig;
use casts::Conversion;
use context::TranslationContext;
use names::Names;
use state::UnitState;
use text::AnnotatedText;
use type_table::TypeTable;

/// Entry point of the backend: translates units with one configuration.
#[derive(Debug, Clone, Default)]
pub struct Backend {
    config: BackendConfig,
}

impl Backend {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Translate one unit.
    ///
    /// ## Parameters
    /// - `assembly`: the unit's types plus signature-only references.
    ///
    /// ## Returns
    /// - The unit's output files, diagnostics and scheduling summary. Degraded output (placeholders, forced cycle
    ///   drains) is still returned as `Ok`.
    ///
    /// ## Errors
    /// - `TranslateError::InternalDefect`: the model broke a promise (dangling reference, unbalanced context) or the
    ///   unit has no name.
    /// - `TranslateError::InvalidModel`: an emitted type names an unknown base or interface.
    #[tracing::instrument(skip_all, fields(unit = %assembly.name, types = assembly.types.len()))]
    pub fn translate_unit(&self, assembly: &Assembly) -> TranslateResult<UnitOutput> {
        if assembly.name.trim().is_empty() {
            return Err(TranslateError::defect("<unit>", "unit name is empty"));
        }
        let table = TypeTable::new(assembly, &self.config.excluded);
        let translator = Translator::new(&table, &self.config, &assembly.name);
        let output = translator.translate()?;
        tracing::info!(
            emitted = output.emitted.len(),
            forced = output.forced.len(),
            diagnostics = output.diagnostics.len(),
            "unit translated"
        );
        Ok(output)
    }
}

/// Translation state for one unit: the read-only table and configuration plus the mutable [`UnitState`].
///
/// Expression, statement and declaration translation are `impl` blocks on this type spread over the `expr`,
/// `stmt` and `decl` modules.
pub(crate) struct Translator<'t, 'a> {
    table: &'t TypeTable<'a>,
    config: &'t BackendConfig,
    unit: UnitState,
    /// Anonymous methods of the method being emitted, drained into its closure carrier.
    closure_methods: Vec<expr::ClosureMethod>,
}

impl<'t, 'a> Translator<'t, 'a> {
    fn new(table: &'t TypeTable<'a>, config: &'t BackendConfig, unit_name: &str) -> Self {
        Self {
            table,
            config,
            unit: UnitState::new(unit_name),
            closure_methods: Vec::new(),
        }
    }

    /// Name resolver seeing the method generic bindings of `cx`.
    fn names<'s>(&'s self, cx: &'s TranslationContext) -> Names<'s, 'a> {
        Names::new(self.table).with_bindings(cx.generic_bindings())
    }

    /// Type as written in a local declaration (`typename`-prefixed inside generic types).
    fn local_type(&self, cx: &TranslationContext, ty: &TypeRef) -> String {
        self.names(cx).with_typename(cx.in_generic_type).type_decl(ty)
    }

    /// Return type as written in a signature; `void` stays `void`.
    fn return_type_decl(&self, cx: &TranslationContext, ty: &TypeRef) -> String {
        if ty.is_void() {
            "void".to_string()
        } else {
            self.local_type(cx, ty)
        }
    }

    /// `T a, U * b` for a parameter list.
    fn param_list(&self, cx: &TranslationContext, params: &[ParamDecl]) -> String {
        let names = self.names(cx).with_typename(cx.in_generic_type);
        params
            .iter()
            .map(|p| format!("{} {}", names.param_type(&p.ty, p.mode), local_name(&p.name)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Apply the implicit conversion `value → dst`.
    fn convert(&self, cx: &TranslationContext, dst: &TypeRef, value: AnnotatedText) -> AnnotatedText {
        casts::convert(self.names(cx), dst, value, Conversion::Implicit)
    }
}

/// Identifier of a local, parameter or field as emitted.
pub(crate) fn local_name(name: &str) -> String {
    sanitize(name)
}

#[cfg(test)]
mod tests {
    use nativize_model::{TypeDecl, TypeKind};

    use super::*;

    #[test]
    fn test_empty_unit_name_is_a_defect() {
        let err = Backend::default().translate_unit(&Assembly::new("  ")).unwrap_err();
        assert!(err.is_internal_defect());
    }

    #[test]
    fn test_empty_unit_still_has_setup() {
        let output = Backend::default().translate_unit(&Assembly::new("Empty")).unwrap();
        assert!(output.emitted.is_empty());
        let methods = output.file("Empty_method_definition.cpp").unwrap();
        assert!(methods.contains("void Empty__Setup()"));
    }

    #[test]
    fn test_excluded_types_are_not_emitted() {
        let asm = Assembly::new("App")
            .with_type(TypeDecl::new("App.Keep", TypeKind::Class))
            .with_type(TypeDecl::new("App.Skip", TypeKind::Class));
        let config = BackendConfig::default().with_excluded(["App.Skip"]);
        let output = Backend::new(config).translate_unit(&asm).unwrap();
        assert_eq!(output.emitted, vec!["App.Keep".to_string()]);
        assert!(output.files.iter().all(|f| !f.contents.contains("Skip")));
    }
}
