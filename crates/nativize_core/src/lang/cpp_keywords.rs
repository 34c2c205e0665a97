//! C++ keyword vocabulary (for emitted identifier escaping).
//!
//! Managed identifiers are mostly valid C++ identifiers already. The exceptions are names that collide with C++
//! keywords or with macros the runtime headers pull in (`stdin`, `EOF`, ...), and compiler-generated names that
//! contain characters C++ rejects (`<>c__DisplayClass1`, `$ArrayType=8`).
//!
//! ## Examples
//! ```rust
//! use nativize_core::lang::cpp_keywords;
//!
//! assert_eq!(cpp_keywords::safe_name("delete"), "__delete__");
//! assert_eq!(cpp_keywords::safe_full_name("NS::class"), "NS::__class__");
//! assert_eq!(cpp_keywords::sanitize("<Module>"), "_Module_");
//! ```

/// Reserved words and reserved macro names that cannot be used as identifiers in emitted C++.
pub const CPP_KEYWORDS: &[&str] = &[
    "break",
    "case",
    "catch",
    "class",
    "const",
    "const_cast",
    "continue",
    "default",
    "delete",
    "do",
    "dynamic_cast",
    "else",
    "enum",
    "explicit",
    "extern",
    "for",
    "friend",
    "goto",
    "if",
    "inline",
    "mutable",
    "namespace",
    "new",
    "NULL",
    "operator",
    "private",
    "protected",
    "public",
    "register",
    "reinterpret_cast",
    "return",
    "signed",
    "sizeof",
    "static",
    "static_cast",
    "struct",
    "switch",
    "template",
    "this",
    "throw",
    "try",
    "typedef",
    "typename",
    "union",
    "unsigned",
    "using",
    "virtual",
    "volatile",
    "while",
    // Builtin types and literals
    "bool",
    "char",
    "double",
    "false",
    "float",
    "int",
    "long",
    "short",
    "true",
    "void",
    // Compiler extensions
    "finally",
    "asm",
    "naked",
    // Macros from the C runtime headers
    "stdin",
    "stdout",
    "stderr",
    "__FILE__",
    "__LINE__",
    "EOF",
    "OVERFLOW",
    "_OVERFLOW",
    "pow",
];

/// Characters that cannot appear in an emitted identifier.
pub const INVALID_IDENTIFIER_CHARS: &[char] = &['<', '>', '{', '}', '-', '$', '=', '.', ' '];

/// Invalid characters for method and type names, which may also carry a `,` from generic spellings.
pub const EXTENDED_INVALID_IDENTIFIER_CHARS: &[char] = &['<', '>', '{', '}', '-', '$', '.', '=', ',', ' '];

/// Replacement for every invalid identifier character.
pub const VALID_REPLACEMENT: char = '_';

/// Check whether an identifier is a reserved C++ word.
pub fn is_keyword(name: &str) -> bool {
    CPP_KEYWORDS.contains(&name)
}

/// Escape a single identifier that collides with a reserved word.
///
/// Reserved words are wrapped as `__name__`; every other identifier is returned unchanged.
pub fn safe_name(name: &str) -> String {
    if is_keyword(name) {
        format!("__{}__", name)
    } else {
        name.to_string()
    }
}

/// Escape each `::`-separated segment of a scoped name.
pub fn safe_full_name(full_name: &str) -> String {
    full_name.split("::").map(safe_name).collect::<Vec<_>>().join("::")
}

/// Replace invalid identifier characters with `_`, then escape reserved words.
pub fn sanitize(name: &str) -> String {
    sanitize_with(name, INVALID_IDENTIFIER_CHARS)
}

/// Like [`sanitize`], but also treats `,` as invalid (used for type and method names).
pub fn sanitize_extended(name: &str) -> String {
    sanitize_with(name, EXTENDED_INVALID_IDENTIFIER_CHARS)
}

fn sanitize_with(name: &str, invalid: &[char]) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if invalid.contains(&c) { VALID_REPLACEMENT } else { c })
        .collect();
    safe_name(&replaced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_identifier_is_unchanged() {
        assert_eq!(safe_name("Count"), "Count");
        assert_eq!(sanitize("Count"), "Count");
    }

    #[test]
    fn test_keyword_is_wrapped() {
        assert_eq!(safe_name("class"), "__class__");
        assert_eq!(safe_name("NULL"), "__NULL__");
        assert_eq!(safe_name("stdin"), "__stdin__");
    }

    #[test]
    fn test_full_name_escapes_each_segment() {
        assert_eq!(safe_full_name("System::Collections"), "System::Collections");
        assert_eq!(safe_full_name("Outer::new::Inner"), "Outer::__new__::Inner");
    }

    #[test]
    fn test_compiler_generated_names() {
        assert_eq!(sanitize("<>c__DisplayClass1"), "__c__DisplayClass1");
        assert_eq!(sanitize("$$method0x6000001-1"), "__method0x6000001_1");
        assert_eq!(sanitize_extended("<PrivateImplementationDetails>{A-B}"), "_PrivateImplementationDetails__A_B_");
    }

    #[test]
    fn test_comma_only_invalid_in_extended_mode() {
        assert_eq!(sanitize("a,b"), "a,b");
        assert_eq!(sanitize_extended("a,b"), "a_b");
    }
}
