//! Define shared text semantics for emitted literals (pure helpers).
//!
//! These helpers produce the exact spellings the runtime expects, so the backend, the CLI `hash` command and the
//! runtime's own `String::GetHashCode` agree bit for bit.
//!
//! ## Notes
//! - **Code units**: managed strings are UTF-16. Hashing and escaping work on UTF-16 code units, so characters
//!   outside the BMP are escaped as two surrogate units.
//! - **Hex escapes**: a C++ `\x` escape consumes every following hex digit. Each hex escape therefore ends the
//!   current string segment (`"\x00e9" L"..."`), so a following `a-f0-9` character cannot extend it.

/// FNV-1 offset basis shared with the runtime string hash.
pub const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
/// FNV-1 prime shared with the runtime string hash.
pub const FNV_PRIME: u32 = 16_777_619;
/// Case label reserved for the `null` case of a switch over text.
pub const NULL_CASE_HASH: i32 = 0;

/// Hash case-label text for a switch over strings.
///
/// ## Parameters
/// - `text`: the case label text.
///
/// ## Returns
/// - (`i32`): FNV-1 over the UTF-16 code units, with `0` remapped to `1` so it never collides with
///   [`NULL_CASE_HASH`].
///
/// ## Examples
/// ```rust
/// use nativize_core::strings::switch_hash;
///
/// assert_eq!(switch_hash(""), 2_166_136_261u32 as i32);
/// assert_ne!(switch_hash("a"), 0);
/// ```
pub fn switch_hash(text: &str) -> i32 {
    let mut hash = FNV_OFFSET_BASIS;
    for unit in text.encode_utf16() {
        hash ^= u32::from(unit);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    if hash == 0 {
        hash = 1;
    }
    hash as i32
}

/// Render a managed string as a wide C++ string literal (`L"..."`).
///
/// ## Examples
/// ```rust
/// use nativize_core::strings::wide_string_literal;
///
/// assert_eq!(wide_string_literal("a\"b"), r#"L"a\"b""#);
/// assert_eq!(wide_string_literal("caf\u{e9}"), r#"L"caf\x00e9" L"""#);
/// ```
pub fn wide_string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 3);
    out.push_str("L\"");
    for unit in text.encode_utf16() {
        match unit {
            0x0d => out.push_str("\\r"),
            0x09 => out.push_str("\\t"),
            0x0a => out.push_str("\\n"),
            0x22 => out.push_str("\\\""),
            0x5c => out.push_str("\\\\"),
            u if !(0x20..0x80).contains(&u) => out.push_str(&format!("\\x{:04x}\" L\"", u)),
            u => out.push(char::from(u as u8)),
        }
    }
    out.push('"');
    out
}

/// Render a UTF-16 code unit as a wide C++ character literal (`L'x'`).
///
/// ## Examples
/// ```rust
/// use nativize_core::strings::wide_char_literal;
///
/// assert_eq!(wide_char_literal(u16::from(b'a')), "L'a'");
/// assert_eq!(wide_char_literal(u16::from(b'\n')), "L'\\x000a'");
/// assert_eq!(wide_char_literal(0x00e9), "L'\\x00e9'");
/// ```
pub fn wide_char_literal(unit: u16) -> String {
    let body = match unit {
        u if !(0x20..0x80).contains(&u) => format!("\\x{:04x}", u),
        0x27 => "\\'".to_string(),
        0x5c => "\\\\".to_string(),
        u => char::from(u as u8).to_string(),
    };
    format!("L'{}'", body)
}

/// Whether the literal needs an explicit length when pooled (it contains an embedded NUL).
pub fn needs_explicit_length(text: &str) -> bool {
    text.contains('\0')
}

/// Length of a managed string in UTF-16 code units.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Build the identifier stem for a pooled string.
///
/// The stem is `s{unit}__` followed by the first `max_chars` characters of the text, where every character other
/// than ASCII letters and digits becomes `_`.
///
/// ## Examples
/// ```rust
/// use nativize_core::strings::pool_identifier_stem;
///
/// assert_eq!(pool_identifier_stem("App", "Hello, world!", 10), "sApp__Hello__wor");
/// ```
pub fn pool_identifier_stem(unit_name: &str, text: &str, max_chars: usize) -> String {
    let mut stem = format!("s{}__", unit_name);
    for c in text.chars().take(max_chars) {
        if c.is_ascii_alphanumeric() {
            stem.push(c);
        } else {
            stem.push('_');
        }
    }
    stem
}
