//! Provide shared, pure target-language vocabulary and text helpers for the nativize backend.
//!
//! This crate is intentionally small and dependency-free. It contains deterministic helpers that both:
//! - the backend uses when spelling identifiers, operators, and literals in emitted C++, and
//! - tooling (the CLI `hash` command, tests) uses to reproduce the exact same spellings.
//!
//! ## Notes
//!
//! - This is a “vocabulary” crate: **no IO**, no global state, and no model-specific types.
//! - Current scope: target keywords and identifier sanitizing, the primitive type table, the operator registry,
//!   runtime helper names, the text-switch hash, and literal escaping.

pub mod lang;
pub mod strings;
