//! Property-based tests for nativize
//!
//! These tests use proptest to verify invariants across many randomly
//! generated inputs, catching edge cases that hand-written tests might miss.

mod common;

use std::collections::HashSet;

use common::*;
use nativize::backend::names::Names;
use nativize::backend::string_pool::StringPool;
use nativize_core::strings::{NULL_CASE_HASH, switch_hash};
use nativize_model::{Assembly, TypeDecl, TypeKey};
use proptest::prelude::*;

fn identifier() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,8}"
}

// =============================================================================
// Switch hash
// =============================================================================

proptest! {
    /// Property: the hash is a pure function of the text and never the null case's value.
    #[test]
    fn switch_hash_is_pure_and_never_null(text in any::<String>()) {
        prop_assert_eq!(switch_hash(&text), switch_hash(&text.clone()));
        prop_assert_ne!(switch_hash(&text), NULL_CASE_HASH);
    }
}

// =============================================================================
// String pool
// =============================================================================

proptest! {
    /// Property: one identifier per distinct literal, and distinct literals never share one.
    #[test]
    fn pool_identifiers_are_unique(texts in prop::collection::vec("[ -~]{0,14}", 1..24)) {
        let mut pool = StringPool::new("App");
        let first: Vec<String> = texts.iter().map(|t| pool.intern(t)).collect();
        let again: Vec<String> = texts.iter().map(|t| pool.intern(t)).collect();
        prop_assert_eq!(&first, &again);

        let distinct_texts: HashSet<&String> = texts.iter().collect();
        let distinct_ids: HashSet<&String> = first.iter().collect();
        prop_assert_eq!(distinct_texts.len(), distinct_ids.len());
        prop_assert_eq!(pool.len(), distinct_texts.len());
        for id in &first {
            prop_assert!(id.starts_with("sApp__"));
            prop_assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }
    }
}

// =============================================================================
// Type names
// =============================================================================

proptest! {
    /// Property: flattened declaration names are deterministic identifiers.
    #[test]
    fn declaration_names_are_identifiers(
        ns in prop::collection::vec(identifier(), 0..3),
        nesting in prop::collection::vec((identifier(), 0usize..3), 1..4),
    ) {
        let nested: Vec<String> = nesting
            .iter()
            .map(|(name, arity)| if *arity == 0 { name.clone() } else { format!("{}`{}", name, arity) })
            .collect();
        let mut full = ns.join(".");
        if !full.is_empty() {
            full.push('.');
        }
        full.push_str(&nested.join("+"));
        let key = TypeKey::new(full);

        let name = Names::declaration_name(&key);
        prop_assert_eq!(&name, &Names::declaration_name(&key));
        prop_assert!(!name.is_empty());
        prop_assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        // A generic segment anywhere in the chain marks every later segment too.
        if nesting.iter().any(|(_, arity)| *arity > 0) {
            let expected_suffix = format!("__G{}", nesting.iter().map(|(_, a)| a).sum::<usize>());
            prop_assert!(name.ends_with(&expected_suffix));
        }
    }
}

// =============================================================================
// Scheduling
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: in an acyclic graph of value fields, every type is emitted exactly once and after its
    /// dependencies.
    #[test]
    fn acyclic_graphs_emit_dependencies_first(
        edges in prop::collection::vec(prop::collection::vec(any::<prop::sample::Index>(), 0..3), 1..12),
    ) {
        let count = edges.len();
        let key = |i: usize| format!("App.S{}", i);
        let mut deps: Vec<Vec<usize>> = Vec::new();
        let mut asm = Assembly::new("App");
        for (i, targets) in edges.iter().enumerate() {
            let mut decl: TypeDecl = structure(&key(i));
            let mut mine = Vec::new();
            if i > 0 {
                for t in targets {
                    let j = t.index(i);
                    if !mine.contains(&j) {
                        decl = decl.with_field(field(&format!("f{}", j), &key(j)));
                        mine.push(j);
                    }
                }
            }
            deps.push(mine);
            asm = asm.with_type(decl);
        }

        let output = translate(&asm);
        prop_assert!(!output.has_cycles());
        prop_assert_eq!(output.emitted.len(), count);
        let unique: HashSet<&String> = output.emitted.iter().collect();
        prop_assert_eq!(unique.len(), count);
        let position = |k: &str| output.emitted.iter().position(|e| e == k);
        for (i, mine) in deps.iter().enumerate() {
            for j in mine {
                prop_assert!(position(&key(*j)) < position(&key(i)));
            }
        }
    }
}
