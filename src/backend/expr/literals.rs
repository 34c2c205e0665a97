//! Literal rendering.
//!
//! Boundary values (min/max, NaN, infinities, the smallest subnormal) never go through decimal text: they render as
//! the runtime's named constants so no precision is lost between the managed and native toolchains.

use nativize_core::lang::primitives::{PrimitiveId, info_for};
use nativize_core::lang::runtime;
use nativize_core::strings::wide_char_literal;
use nativize_model::{Literal, TypeRef};

use super::super::Translator;
use super::super::context::TranslationContext;
use super::super::text::AnnotatedText;

impl<'t, 'a> Translator<'t, 'a> {
    /// Render a literal.
    ///
    /// An `Int32` literal under a `Char` cast target becomes a character literal, so `(char)65` reads `L'A'`.
    pub(in crate::backend) fn render_literal(&mut self, cx: &TranslationContext, value: &Literal) -> AnnotatedText {
        if let Literal::I32(v) = value {
            if cx.cast_target().is_some_and(|t| t.is_primitive(PrimitiveId::Char)) {
                if let Ok(unit) = u16::try_from(*v) {
                    return AnnotatedText::new(wide_char_literal(unit), TypeRef::char());
                }
            }
        }
        if let Literal::String(s) = value {
            let id = self.unit.pool.intern(s);
            return AnnotatedText::new(id, TypeRef::string());
        }
        match value.ty() {
            Some(ty) => AnnotatedText::new(literal_text(value), ty),
            None => AnnotatedText::null(),
        }
    }
}

/// Text of a non-string literal.
pub(crate) fn literal_text(value: &Literal) -> String {
    match value {
        Literal::Null => "NULL".to_string(),
        Literal::Bool(b) => b.to_string(),
        Literal::Char(c) => wide_char_literal(*c),
        Literal::String(s) => nativize_core::strings::wide_string_literal(s),
        Literal::I8(v) => integral(PrimitiveId::SByte, *v, i8::MIN, i8::MAX),
        Literal::U8(v) => integral(PrimitiveId::Byte, *v, u8::MIN, u8::MAX),
        Literal::I16(v) => integral(PrimitiveId::Int16, *v, i16::MIN, i16::MAX),
        Literal::U16(v) => integral(PrimitiveId::UInt16, *v, u16::MIN, u16::MAX),
        Literal::I32(v) => integral(PrimitiveId::Int32, *v, i32::MIN, i32::MAX),
        Literal::U32(v) => integral(PrimitiveId::UInt32, *v, u32::MIN, u32::MAX),
        Literal::I64(v) => integral(PrimitiveId::Int64, *v, i64::MIN, i64::MAX),
        Literal::U64(v) => integral(PrimitiveId::UInt64, *v, u64::MIN, u64::MAX),
        Literal::F32(v) => single(*v),
        Literal::F64(v) => double(*v),
        Literal::Decimal(d) => decimal(d),
    }
}

/// `::CrossNetRuntime::BaseTypeWrapper<System::Int32>::MaxValue`.
fn named_constant(id: PrimitiveId, constant: &str) -> String {
    let name = info_for(id).dotnet_name.trim_start_matches("System.");
    format!("{}<System::{}>::{}", runtime::BASE_TYPE_WRAPPER, name, constant)
}

fn integral<T: PartialEq + std::fmt::Display>(id: PrimitiveId, v: T, min: T, max: T) -> String {
    if v == min {
        return named_constant(id, "MinValue");
    }
    if v == max {
        return named_constant(id, "MaxValue");
    }
    format!("{}{}", v, info_for(id).literal_suffix)
}

/// Ensure a float spelling reads as floating point in C++.
fn with_point(mut text: String) -> String {
    if !text.contains(['.', 'e', 'E']) {
        text.push('.');
    }
    text
}

fn double(v: f64) -> String {
    let id = PrimitiveId::Double;
    if v.is_nan() {
        return named_constant(id, "NaN");
    }
    if v.is_infinite() {
        return named_constant(id, if v > 0.0 { "PositiveInfinity" } else { "NegativeInfinity" });
    }
    let sign = if v.is_sign_negative() && v != 0.0 { "-" } else { "" };
    let abs = v.abs();
    if abs == f64::MAX {
        return format!("{}{}", sign, named_constant(id, "MaxValue"));
    }
    if abs == f64::from_bits(1) {
        return format!("{}{}", sign, named_constant(id, "Epsilon"));
    }
    with_point(format!("{:?}", v))
}

fn single(v: f32) -> String {
    let id = PrimitiveId::Single;
    if v.is_nan() {
        return named_constant(id, "NaN");
    }
    if v.is_infinite() {
        return named_constant(id, if v > 0.0 { "PositiveInfinity" } else { "NegativeInfinity" });
    }
    let sign = if v.is_sign_negative() && v != 0.0 { "-" } else { "" };
    let abs = v.abs();
    if abs == f32::MAX {
        return format!("{}{}", sign, named_constant(id, "MaxValue"));
    }
    if abs == f32::from_bits(1) {
        return format!("{}{}", sign, named_constant(id, "Epsilon"));
    }
    format!("{}{}", with_point(format!("{:?}", v)), info_for(id).literal_suffix)
}

/// The managed decimal range: ±(2^96 - 1).
const DECIMAL_MAX: &str = "79228162514264337593543950335";

fn decimal(text: &str) -> String {
    let id = PrimitiveId::Decimal;
    let normalized = normalize_decimal(text);
    match normalized.as_str() {
        DECIMAL_MAX => return named_constant(id, "MaxValue"),
        "0" => return named_constant(id, "Zero"),
        "1" => return named_constant(id, "One"),
        "-1" => return named_constant(id, "MinusOne"),
        _ => {}
    }
    if normalized.strip_prefix('-') == Some(DECIMAL_MAX) {
        return named_constant(id, "MinValue");
    }
    match normalized.parse::<f64>() {
        Ok(v) => with_point(format!("{:?}", v)),
        Err(_) => with_point(normalized),
    }
}

/// Strip a leading `+`, leading zeros, trailing fractional zeros and a dangling point.
fn normalize_decimal(text: &str) -> String {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (digits, ""),
    };
    let int_part = int_part.trim_start_matches('0');
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let body = if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    };
    if negative && body != "0" { format!("-{}", body) } else { body }
}
