//! Per-unit mutable state.
//!
//! Everything that outlives one method but not one unit lives here: the string pool, collected diagnostics, the
//! setup ledgers flushed into the unit's fixed-name functions, and the name counters. A fresh [`UnitState`] is
//! created for every [`crate::backend::Backend::translate_unit`] call, so units never share counters.

use nativize_core::lang::cpp_keywords::VALID_REPLACEMENT;
use nativize_model::TypeKey;

use super::diagnostics::{Diagnostic, DiagnosticCode};
use super::string_pool::StringPool;

/// One statement of a unit-wide setup function, remembered with the type that contributed it so file-per-type
/// output can guard it with that type's `CN_NO_*` define.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub owner: TypeKey,
    pub statement: String,
}

impl LedgerEntry {
    pub fn new(owner: &TypeKey, statement: impl Into<String>) -> Self {
        Self {
            owner: owner.clone(),
            statement: statement.into(),
        }
    }
}

/// Append-only per-unit bookkeeping.
#[derive(Debug)]
pub struct UnitState {
    /// Assembly name as given.
    pub name: String,
    /// Assembly name usable inside identifiers.
    pub safe_name: String,
    pub pool: StringPool,
    pub diagnostics: Vec<Diagnostic>,
    /// `::NS::T::Static__ctor__();` calls, in emission order.
    pub static_ctors: Vec<LedgerEntry>,
    /// `::NS::T::__CreateInterfaceMap__();` and closure `__RegisterId__()` calls.
    pub interface_maps: Vec<LedgerEntry>,
    /// Trace statements for static reference fields.
    pub assembly_trace: Vec<LedgerEntry>,
    temp_counter: usize,
    closure_counter: usize,
    anonymous_method_counter: usize,
}

impl UnitState {
    pub fn new(name: &str) -> Self {
        let safe_name = safe_unit_name(name);
        Self {
            name: name.to_string(),
            pool: StringPool::new(safe_name.clone()),
            safe_name,
            diagnostics: Vec::new(),
            static_ctors: Vec::new(),
            interface_maps: Vec::new(),
            assembly_trace: Vec::new(),
            temp_counter: 0,
            closure_counter: 0,
            anonymous_method_counter: 0,
        }
    }

    /// `__tempN__`.
    pub fn next_temp(&mut self) -> String {
        let name = format!("__temp{}__", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    /// `__AnonymousClassN__`.
    pub fn next_closure_class(&mut self) -> String {
        let name = format!("__AnonymousClass{}__", self.closure_counter);
        self.closure_counter += 1;
        name
    }

    /// `__AnonymousMethodN__`.
    pub fn next_anonymous_method(&mut self) -> String {
        let name = format!("__AnonymousMethod{}__", self.anonymous_method_counter);
        self.anonymous_method_counter += 1;
        name
    }

    /// Record a degradation and log it.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            tracing::error!(code = %diagnostic.code, location = %diagnostic.location, "{}", diagnostic.message);
        } else {
            tracing::warn!(code = %diagnostic.code, location = %diagnostic.location, "{}", diagnostic.message);
        }
        self.diagnostics.push(diagnostic);
    }

    /// Record a `[==name==]` placeholder for an untranslatable construct.
    pub fn unimplemented(&mut self, construct: &str, location: &str) -> String {
        self.report(Diagnostic::new(
            DiagnosticCode::Unimplemented,
            format!("`{}` is not supported; emitted a placeholder", construct),
            location,
        ));
        format!("[=={}==]", construct)
    }
}

/// Assembly name with every non-alphanumeric character replaced, for `{A}__Setup` and pool identifiers.
pub fn safe_unit_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { VALID_REPLACEMENT })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_independent() {
        let mut state = UnitState::new("App");
        assert_eq!(state.next_temp(), "__temp0__");
        assert_eq!(state.next_temp(), "__temp1__");
        assert_eq!(state.next_closure_class(), "__AnonymousClass0__");
        assert_eq!(state.next_anonymous_method(), "__AnonymousMethod0__");
    }

    #[test]
    fn test_fresh_state_restarts_counters() {
        let mut first = UnitState::new("App");
        first.next_temp();
        let mut second = UnitState::new("App");
        assert_eq!(second.next_temp(), "__temp0__");
    }

    #[test]
    fn test_safe_unit_name() {
        assert_eq!(safe_unit_name("My.App-Core"), "My_App_Core");
        assert_eq!(UnitState::new("My.App").pool.intern("x"), "sMy_App__x");
    }

    #[test]
    fn test_placeholder_reports_diagnostic() {
        let mut state = UnitState::new("App");
        assert_eq!(state.unimplemented("ArgList", "App.T::M"), "[==ArgList==]");
        assert_eq!(state.diagnostics.len(), 1);
        assert_eq!(state.diagnostics[0].code, DiagnosticCode::Unimplemented);
    }
}
