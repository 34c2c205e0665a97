//! Declaration emission: the unit's types turned into the three output streams.
//!
//! [`Translator::translate`] schedules the unit's types, emits each one in dependency order, then writes the
//! unit-wide setup functions from the ledgers the types filled.
//!
//! ## Module organization
//!
//! - `schedule` - Dependency order and the cycle fallback
//! - `types` - Class shape: header, fields, factories, GC trace, static constructor bookkeeping
//! - `members` - Method signatures and bodies, constructor preambles
//! - `wrappers` - Interface dispatch wrappers and the interface map
//! - `enums` - Enum structs
//! - `delegates` - Delegate macros
//! - `closures` - Capture analysis and closure carrier classes
//! - `unit` - `{A}__Setup` and friends
//!
//! ## Notes
//!
//! - Non-generic members are declared in the class and defined out of line in the method stream under their
//!   namespace-qualified name (`App::Widget::Run`). Generic types, and generic methods of any type, are defined
//!   inline because templates must be visible where they are instantiated.
//! - Everything is emitted `public:`; access checks already happened upstream.

mod closures;
mod delegates;
mod enums;
mod members;
pub(crate) mod schedule;
mod types;
mod unit;
mod wrappers;

use nativize_model::{TypeDecl, TypeKey, TypeKind, TypeRef};

use super::Translator;
use super::diagnostics::{Diagnostic, DiagnosticCode};
use super::emitter::CppEmitter;
use super::errors::{TranslateError, TranslateResult};
use super::names::Names;
use super::output::{self, TypeText, UnitOutput, UnitText};

/// The type being emitted, with the spellings every member needs.
pub(super) struct TypeScope<'d> {
    pub decl: &'d TypeDecl,
    /// The type instantiated with its own generic parameters.
    pub self_ty: TypeRef,
    /// Declaration name inside its namespace (`Box__G1`).
    pub name: String,
    /// Namespace-qualified name for out-of-line definitions, without leading `::` (`App::Box__G1`).
    pub qualified: String,
    /// Fully scoped name (`::App::Box__G1`).
    pub full_name: String,
    pub generic: bool,
    pub value_type: bool,
}

impl<'d> TypeScope<'d> {
    pub fn new(decl: &'d TypeDecl) -> Self {
        let name = Names::declaration_name(&decl.key);
        let mut path = Names::namespace_path(&decl.key);
        path.push(name.clone());
        Self {
            decl,
            self_ty: decl.self_ref(),
            qualified: path.join("::"),
            full_name: Names::full_name(&decl.key),
            name,
            generic: decl.is_generic(),
            value_type: decl.kind.is_value_type(),
        }
    }

    /// `NS.Type::member`, as used in diagnostics.
    pub fn location(&self, member: &str) -> String {
        format!("{}::{}", self.decl.key, member)
    }

    /// `template <typename T >` for generic types.
    pub fn template_header(&self) -> Option<String> {
        self.generic.then(|| Names::template_header(&self.decl.generic_params))
    }
}

/// Wrap `body` in the namespaces of `key`.
pub(super) fn in_namespaces(key: &TypeKey, body: &str, indent: usize) -> String {
    let path = Names::namespace_path(key);
    let mut out = CppEmitter::with_indent(indent);
    for ns in &path {
        out.line(&format!("namespace {} {{", ns));
        out.indent();
    }
    out.lines(body);
    for _ in &path {
        out.dedent();
        out.line("}");
    }
    out.finish()
}

/// Emit `body` as a member: inline in `class` when `inline`, otherwise declared in `class` and defined in
/// `methods` under `header`.
pub(super) fn emit_member(
    class: &mut CppEmitter,
    methods: &mut CppEmitter,
    inline: bool,
    declaration: &str,
    header: &str,
    body: &str,
) {
    if inline {
        class.line(declaration);
        class.lines(body);
    } else {
        class.line(&format!("{};", declaration));
        methods.line(header);
        methods.lines(body);
        methods.blank_line();
    }
}

impl<'t, 'a> Translator<'t, 'a> {
    /// Translate the whole unit.
    ///
    /// ## Errors
    /// - `TranslateError::InvalidModel`: an emitted type names a base or interface the table does not know.
    /// - `TranslateError::InternalDefect`: propagated from member translation.
    #[tracing::instrument(skip_all, fields(unit = %self.unit.name))]
    pub(super) fn translate(mut self) -> TranslateResult<UnitOutput> {
        let schedule = schedule::schedule(self.table, self.config.enum_prepass);
        if !schedule.forced.is_empty() {
            let forced: Vec<&str> = schedule.forced.iter().map(TypeKey::as_str).collect();
            self.unit.report(
                Diagnostic::new(
                    DiagnosticCode::DependencyCycle,
                    format!(
                        "{} types sit on a dependency cycle and were emitted before their dependencies",
                        forced.len()
                    ),
                    self.unit.name.clone(),
                )
                .with_note(format!("forced: {}", forced.join(", "))),
            );
        }

        let mut types = Vec::new();
        let mut emitted = Vec::new();
        for key in &schedule.order {
            let Some(decl) = self.table.decl(key) else {
                return Err(TranslateError::defect(key.as_str(), "scheduled type is missing from the type table"));
            };
            self.check_supertypes(decl)?;
            if TypeRef::named(key.as_str()).primitive_id().is_some() {
                // Built-in types come from the runtime headers.
                tracing::debug!(ty = %key, "skipping primitive type");
                continue;
            }
            types.push(self.emit_type(decl)?);
            emitted.push(key.to_string());
        }

        let functions = self.emit_unit_functions();
        let text = UnitText {
            unit: self.unit.name.clone(),
            safe_name: self.unit.safe_name.clone(),
            types,
            pool_declarations: self.unit.pool.declarations(),
            pool_definitions: self.unit.pool.definitions(),
            function_declarations: functions.declarations,
            function_definitions: functions.definitions,
        };
        let files = output::layout(self.config, &text);
        Ok(UnitOutput {
            unit: self.unit.name,
            files,
            diagnostics: self.unit.diagnostics,
            emitted,
            forced: schedule.forced.iter().map(TypeKey::to_string).collect(),
        })
    }

    /// Every base and declared interface of an emitted type must be known.
    fn check_supertypes(&self, decl: &TypeDecl) -> TranslateResult<()> {
        let known = |ty: &TypeRef| ty.primitive_id().is_some() || self.table.decl_of(ty).is_some();
        if decl.kind == TypeKind::Class {
            if let Some(base) = &decl.base {
                if !known(base) {
                    return Err(TranslateError::InvalidModel(format!(
                        "`{}` derives from unknown type `{}`",
                        decl.key,
                        base.key().map(TypeKey::as_str).unwrap_or("?")
                    )));
                }
            }
        }
        if let Some(unknown) = decl.interfaces.iter().find(|i| !known(i)) {
            return Err(TranslateError::InvalidModel(format!(
                "`{}` implements unknown interface `{}`",
                decl.key,
                unknown.key().map(TypeKey::as_str).unwrap_or("?")
            )));
        }
        Ok(())
    }

    /// Emit one type into its three streams.
    #[tracing::instrument(skip_all, fields(ty = %decl.key))]
    fn emit_type(&mut self, decl: &TypeDecl) -> TranslateResult<TypeText> {
        tracing::debug!(kind = ?decl.kind, "emitting type");
        match decl.kind {
            TypeKind::Enum => Ok(self.emit_enum(decl)),
            TypeKind::Delegate => self.emit_delegate(decl),
            TypeKind::Class | TypeKind::Struct | TypeKind::Interface => self.emit_class(decl),
        }
    }
}
