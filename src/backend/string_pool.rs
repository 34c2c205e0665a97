//! Per-unit literal string pool.
//!
//! Every string literal in a unit is replaced by a reference to one pooled `::System::String *` global. The pool
//! hands out one identifier per distinct text and registers each with the runtime interner during unit setup.

use std::collections::HashMap;

use nativize_core::lang::runtime;
use nativize_core::strings::{needs_explicit_length, pool_identifier_stem, utf16_len, wide_string_literal};

/// Characters of the literal kept in its identifier.
const STEM_CHARS: usize = 10;

#[derive(Debug, Clone)]
struct PooledString {
    text: String,
    name: String,
}

/// Insertion-ordered pool of literal strings.
#[derive(Debug, Clone)]
pub struct StringPool {
    unit: String,
    entries: Vec<PooledString>,
    by_text: HashMap<String, usize>,
    /// Per-stem collision counters.
    collisions: HashMap<String, usize>,
}

impl StringPool {
    /// Create an empty pool for the unit whose identifier-safe name is `unit`.
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            entries: Vec::new(),
            by_text: HashMap::new(),
            collisions: HashMap::new(),
        }
    }

    /// Identifier for `text`, pooling it on first use.
    pub fn intern(&mut self, text: &str) -> String {
        if let Some(&idx) = self.by_text.get(text) {
            return self.entries[idx].name.clone();
        }
        let stem = pool_identifier_stem(&self.unit, text, STEM_CHARS);
        let name = if self.entries.iter().any(|e| e.name == stem) {
            self.next_collision_name(&stem)
        } else {
            stem.clone()
        };
        self.by_text.insert(text.to_string(), self.entries.len());
        self.entries.push(PooledString {
            text: text.to_string(),
            name: name.clone(),
        });
        name
    }

    fn next_collision_name(&mut self, stem: &str) -> String {
        loop {
            let counter = self.collisions.entry(stem.to_string()).or_insert(0);
            let candidate = format!("{}__{}", stem, counter);
            *counter += 1;
            if !self.entries.iter().any(|e| e.name == candidate) {
                return candidate;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `extern ::System::String * id;` lines for the declaration stream.
    pub fn declarations(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| format!("extern {} * {};", runtime::STRING_TYPE, e.name))
            .collect()
    }

    /// `::System::String * id;` lines for the method stream.
    pub fn definitions(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| format!("{} * {};", runtime::STRING_TYPE, e.name))
            .collect()
    }

    /// Interner registration statements, in pool order.
    pub fn registrations(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| {
                let literal = wide_string_literal(&e.text);
                if needs_explicit_length(&e.text) {
                    format!("{} = {}({}, {});", e.name, runtime::STRING_POOLER, literal, utf16_len(&e.text))
                } else {
                    format!("{} = {}({});", e.name, runtime::STRING_POOLER, literal)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_text_same_identifier() {
        let mut pool = StringPool::new("App");
        let a = pool.intern("hello");
        let b = pool.intern("hello");
        assert_eq!(a, b);
        assert_eq!(a, "sApp__hello");
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_collisions_get_counters() {
        let mut pool = StringPool::new("App");
        assert_eq!(pool.intern("a b"), "sApp__a_b");
        assert_eq!(pool.intern("a-b"), "sApp__a_b__0");
        assert_eq!(pool.intern("a.b"), "sApp__a_b__1");
        assert_eq!(pool.intern("0123456789X"), "sApp__0123456789");
        assert_eq!(pool.intern("0123456789Y"), "sApp__0123456789__0");
    }

    #[test]
    fn test_registration_with_embedded_nul() {
        let mut pool = StringPool::new("App");
        pool.intern("a\0b");
        pool.intern("ok");
        assert_eq!(
            pool.registrations(),
            vec![
                "sApp__a_b = ::CrossNetRuntime::StringPooler::GetOrCreateString(L\"a\\x0000\" L\"b\", 3);".to_string(),
                "sApp__ok = ::CrossNetRuntime::StringPooler::GetOrCreateString(L\"ok\");".to_string(),
            ]
        );
        assert_eq!(pool.declarations()[1], "extern ::System::String * sApp__ok;");
        assert_eq!(pool.definitions()[1], "::System::String * sApp__ok;");
    }
}
