//! Per-method translation state.
//!
//! A [`TranslationContext`] is created fresh for every method body and dropped afterwards. It carries locals and
//! parameter modes, the hoisted pre-statements of the statement being translated, and four scoped stacks:
//!
//! - method generic-argument bindings,
//! - pending property mode (get vs. set),
//! - switch scrutinee types,
//! - cast targets.
//!
//! Stacks are only pushed through [`ScopeGuard`]s, which pop on drop. Early returns (including `?`) therefore
//! cannot leave a stack unbalanced.

use std::collections::{HashMap, HashSet};
use std::ops::{Deref, DerefMut};

use nativize_model::{ParamMode, TypeRef};

use super::errors::{TranslateError, TranslateResult};

/// How a property reference is being used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyMode {
    Get,
    /// Assignment target: rendered as an unfinished `set_X(` call.
    Set,
}

/// Which scoped stack a guard restores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StackKind {
    Generic,
    Property,
    Switch,
    Cast,
}

/// Depth of every scoped stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackDepths {
    pub generic: usize,
    pub property: usize,
    pub switch: usize,
    pub cast: usize,
}

/// Closure capture state of the method being translated.
#[derive(Debug, Clone, Default)]
pub struct ClosureScope {
    /// Carrier class name (`__AnonymousClassN__`).
    pub carrier: String,
    /// Local pointing at the carrier instance in the enclosing method; empty inside carrier methods.
    pub pointer: String,
    /// Captured variables and parameters, by managed name.
    pub captured: HashMap<String, TypeRef>,
    /// `this` is captured as `__this__`.
    pub captures_this: bool,
}

impl ClosureScope {
    /// Whether code is being emitted inside a carrier method (captures are plain fields there).
    pub fn inside_carrier(&self) -> bool {
        self.pointer.is_empty()
    }
}

/// Translation state of one method body.
#[derive(Debug, Clone)]
pub struct TranslationContext {
    /// Managed `Type::Member` name used in diagnostics.
    pub location: String,
    /// The type whose member is being translated.
    pub declaring_type: TypeRef,
    pub in_value_type: bool,
    pub in_generic_type: bool,
    pub is_static: bool,
    /// Return type of the method (`void` if none).
    pub return_type: TypeRef,
    /// Set when the body needs pointers or other low-level constructs.
    pub uses_low_level: bool,
    pub closure: Option<ClosureScope>,
    locals: HashMap<String, TypeRef>,
    params: HashMap<String, (TypeRef, ParamMode)>,
    labels: HashSet<String>,
    pre_statements: Vec<String>,
    generic_args: Vec<Vec<TypeRef>>,
    property_modes: Vec<PropertyMode>,
    switch_types: Vec<TypeRef>,
    cast_targets: Vec<TypeRef>,
}

impl TranslationContext {
    pub fn new(location: impl Into<String>, declaring_type: TypeRef) -> Self {
        Self {
            location: location.into(),
            declaring_type,
            in_value_type: false,
            in_generic_type: false,
            is_static: false,
            return_type: TypeRef::void(),
            uses_low_level: false,
            closure: None,
            locals: HashMap::new(),
            params: HashMap::new(),
            labels: HashSet::new(),
            pre_statements: Vec::new(),
            generic_args: Vec::new(),
            property_modes: Vec::new(),
            switch_types: Vec::new(),
            cast_targets: Vec::new(),
        }
    }

    // ========================================================================
    // Locals, parameters, labels
    // ========================================================================

    pub fn declare_local(&mut self, name: &str, ty: TypeRef) {
        self.locals.insert(name.to_string(), ty);
    }

    pub fn local_type(&self, name: &str) -> Option<&TypeRef> {
        self.locals.get(name)
    }

    pub fn declare_param(&mut self, name: &str, ty: TypeRef, mode: ParamMode) {
        self.params.insert(name.to_string(), (ty, mode));
    }

    pub fn param(&self, name: &str) -> Option<&(TypeRef, ParamMode)> {
        self.params.get(name)
    }

    /// Whether `name` is a `ref`/`out` parameter (accessed through a pointer).
    pub fn is_by_ref_param(&self, name: &str) -> bool {
        self.params.get(name).is_some_and(|(_, mode)| mode.is_by_ref())
    }

    pub fn declare_label(&mut self, label: &str) {
        self.labels.insert(label.to_string());
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Captured-variable type if `name` lives in the closure carrier.
    pub fn captured(&self, name: &str) -> Option<&TypeRef> {
        self.closure.as_ref().and_then(|c| c.captured.get(name))
    }

    // ========================================================================
    // Pre-statements
    // ========================================================================

    /// Hoist a statement before the statement currently being translated.
    pub fn hoist(&mut self, statement: impl Into<String>) {
        self.pre_statements.push(statement.into());
    }

    pub fn take_pre_statements(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pre_statements)
    }

    pub fn has_pre_statements(&self) -> bool {
        !self.pre_statements.is_empty()
    }

    // ========================================================================
    // Scoped stacks
    // ========================================================================

    pub fn push_generic_args(&mut self, args: Vec<TypeRef>) -> ScopeGuard<'_> {
        self.generic_args.push(args);
        ScopeGuard::new(self, StackKind::Generic)
    }

    pub fn generic_bindings(&self) -> &[Vec<TypeRef>] {
        &self.generic_args
    }

    pub fn push_property_mode(&mut self, mode: PropertyMode) -> ScopeGuard<'_> {
        self.property_modes.push(mode);
        ScopeGuard::new(self, StackKind::Property)
    }

    /// Current property mode; get unless an enclosing assignment asked for a set.
    pub fn property_mode(&self) -> PropertyMode {
        self.property_modes.last().copied().unwrap_or(PropertyMode::Get)
    }

    pub fn push_switch_type(&mut self, ty: TypeRef) -> ScopeGuard<'_> {
        self.switch_types.push(ty);
        ScopeGuard::new(self, StackKind::Switch)
    }

    pub fn switch_type(&self) -> Option<&TypeRef> {
        self.switch_types.last()
    }

    pub fn push_cast_target(&mut self, ty: TypeRef) -> ScopeGuard<'_> {
        self.cast_targets.push(ty);
        ScopeGuard::new(self, StackKind::Cast)
    }

    pub fn cast_target(&self) -> Option<&TypeRef> {
        self.cast_targets.last()
    }

    pub fn depths(&self) -> StackDepths {
        StackDepths {
            generic: self.generic_args.len(),
            property: self.property_modes.len(),
            switch: self.switch_types.len(),
            cast: self.cast_targets.len(),
        }
    }

    /// Fail if any scoped stack is not empty (checked when a method body is complete).
    pub fn check_balanced(&self) -> TranslateResult<()> {
        let depths = self.depths();
        if depths != StackDepths::default() || !self.pre_statements.is_empty() {
            return Err(TranslateError::defect(
                &self.location,
                format!(
                    "unbalanced context at method end (generic {}, property {}, switch {}, cast {}, pending {})",
                    depths.generic,
                    depths.property,
                    depths.switch,
                    depths.cast,
                    self.pre_statements.len()
                ),
            ));
        }
        Ok(())
    }

    fn pop(&mut self, kind: StackKind) {
        match kind {
            StackKind::Generic => {
                self.generic_args.pop();
            }
            StackKind::Property => {
                self.property_modes.pop();
            }
            StackKind::Switch => {
                self.switch_types.pop();
            }
            StackKind::Cast => {
                self.cast_targets.pop();
            }
        }
    }
}

/// Restores one scoped stack of a [`TranslationContext`] when dropped.
///
/// The guard dereferences to the context, so translation continues through it.
#[derive(Debug)]
pub struct ScopeGuard<'c> {
    cx: &'c mut TranslationContext,
    kind: StackKind,
}

impl<'c> ScopeGuard<'c> {
    fn new(cx: &'c mut TranslationContext, kind: StackKind) -> Self {
        Self { cx, kind }
    }
}

impl Deref for ScopeGuard<'_> {
    type Target = TranslationContext;

    fn deref(&self) -> &TranslationContext {
        self.cx
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut TranslationContext {
        self.cx
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.cx.pop(self.kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cx() -> TranslationContext {
        TranslationContext::new("App.Widget::Run", TypeRef::named("App.Widget"))
    }

    #[test]
    fn test_guards_pop_on_drop() {
        let mut cx = cx();
        {
            let mut g = cx.push_cast_target(TypeRef::int32());
            assert_eq!(g.cast_target(), Some(&TypeRef::int32()));
            let g2 = g.push_property_mode(PropertyMode::Set);
            assert_eq!(g2.property_mode(), PropertyMode::Set);
        }
        assert_eq!(cx.depths(), StackDepths::default());
        assert_eq!(cx.property_mode(), PropertyMode::Get);
        assert!(cx.check_balanced().is_ok());
    }

    #[test]
    fn test_guards_pop_on_early_return() {
        fn fails(cx: &mut TranslationContext) -> TranslateResult<()> {
            let mut g = cx.push_switch_type(TypeRef::string());
            let _inner = g.push_generic_args(vec![TypeRef::int32()]);
            Err(TranslateError::defect("x", "y"))
        }
        let mut cx = cx();
        assert!(fails(&mut cx).is_err());
        assert_eq!(cx.depths(), StackDepths::default());
    }

    #[test]
    fn test_pending_pre_statements_are_unbalanced() {
        let mut cx = cx();
        cx.hoist("int __temp0__ = 1;");
        assert!(cx.check_balanced().is_err());
        assert_eq!(cx.take_pre_statements().len(), 1);
        assert!(cx.check_balanced().is_ok());
    }

    #[test]
    fn test_by_ref_params() {
        let mut cx = cx();
        cx.declare_param("x", TypeRef::int32(), ParamMode::Out);
        cx.declare_param("y", TypeRef::int32(), ParamMode::Value);
        assert!(cx.is_by_ref_param("x"));
        assert!(!cx.is_by_ref_param("y"));
    }
}
