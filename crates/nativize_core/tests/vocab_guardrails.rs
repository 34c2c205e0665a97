use std::collections::HashMap;
use std::collections::HashSet;

use nativize_core::lang::cpp_keywords;
use nativize_core::lang::operators;
use nativize_core::lang::primitives;
use nativize_core::strings;
use proptest::prelude::*;

#[test]
fn primitive_names_unique_and_resolvable() {
    let mut dotnet: HashMap<&'static str, primitives::PrimitiveId> = HashMap::new();
    let mut cpp: HashMap<&'static str, primitives::PrimitiveId> = HashMap::new();

    for info in primitives::PRIMITIVES {
        assert_eq!(
            primitives::from_dotnet_name(info.dotnet_name),
            Some(info.id),
            "primitive managed name not resolvable: {}",
            info.dotnet_name
        );
        assert_eq!(
            primitives::from_cpp_name(info.cpp_name),
            Some(info.id),
            "primitive emitted name not resolvable: {}",
            info.cpp_name
        );
        if let Some(prev) = dotnet.insert(info.dotnet_name, info.id) {
            panic!("duplicate managed name {:?}: {:?} and {:?}", info.dotnet_name, prev, info.id);
        }
        if let Some(prev) = cpp.insert(info.cpp_name, info.id) {
            panic!("duplicate emitted name {:?}: {:?} and {:?}", info.cpp_name, prev, info.id);
        }
        assert_eq!(
            info.cpp_name,
            format!("::{}", info.dotnet_name.replace('.', "::")),
            "emitted name must be the scoped managed name for {:?}",
            info.id
        );
    }
}

#[test]
fn widening_ranks_are_a_total_order() {
    let mut seen = HashSet::new();
    for info in primitives::PRIMITIVES {
        if let Some(rank) = info.widening_rank {
            assert!(seen.insert(rank), "duplicate widening rank {} for {:?}", rank, info.id);
        }
    }
    let max = seen.iter().copied().max().unwrap_or(0);
    assert_eq!(seen.len(), usize::from(max) + 1, "widening ranks must be contiguous");
}

#[test]
fn operator_overload_names_are_well_formed() {
    for info in operators::BINARY_OPERATORS {
        if let Some(name) = info.overload {
            assert!(name.starts_with("op_"), "bad overload name {name}");
        }
        assert!(!info.symbol.is_empty());
    }
    for info in operators::UNARY_OPERATORS {
        assert!(info.overload.starts_with("op_"), "bad overload name {}", info.overload);
    }
}

#[test]
fn keywords_are_unique() {
    let mut seen = HashSet::new();
    for kw in cpp_keywords::CPP_KEYWORDS {
        assert!(seen.insert(*kw), "duplicate keyword {kw}");
        assert_eq!(cpp_keywords::safe_name(kw), format!("__{kw}__"));
    }
}

proptest! {
    /// The switch hash is a pure function of its input and never yields the reserved null label.
    #[test]
    fn switch_hash_is_deterministic_and_nonzero(text in ".*") {
        let a = strings::switch_hash(&text);
        let b = strings::switch_hash(&text.clone());
        prop_assert_eq!(a, b);
        prop_assert_ne!(a, strings::NULL_CASE_HASH);
    }

    /// Sanitized identifiers never contain characters the target rejects.
    #[test]
    fn sanitized_identifiers_are_clean(name in "[a-zA-Z0-9_<>{}$=., -]{1,24}") {
        let clean = cpp_keywords::sanitize_extended(&name);
        for c in cpp_keywords::EXTENDED_INVALID_IDENTIFIER_CHARS {
            prop_assert!(!clean.contains(*c));
        }
    }

    /// Wide string literals are always closed and only contain printable ASCII.
    #[test]
    fn wide_string_literals_are_printable(text in "\\PC*") {
        let lit = strings::wide_string_literal(&text);
        prop_assert!(lit.starts_with("L\""));
        prop_assert!(lit.ends_with('"'));
        prop_assert!(lit.chars().all(|c| (' '..='~').contains(&c)));
    }
}
