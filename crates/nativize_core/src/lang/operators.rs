//! Operator vocabulary.
//!
//! Each managed binary/unary operator maps to a C++ symbol, a result-type rule, and the name of the user-defined
//! operator method (`op_Addition`, ...) that the backend looks up when an operand is not a builtin primitive.
//!
//! ## Notes
//! - Identity and value equality share the `==` / `!=` symbols. They differ only in that value equality on two
//!   strings routes through `::System::String::op_Equality` instead of comparing pointers.
//! - `||` and `&&` have no overload name.
//!
//! ## Examples
//! ```rust
//! use nativize_core::lang::operators::{self, BinaryOpId, OperatorResult};
//!
//! let info = operators::binary_info(BinaryOpId::LessThan);
//! assert_eq!(info.symbol, "<");
//! assert_eq!(info.result, OperatorResult::Boolean);
//! assert_eq!(info.overload, Some("op_LessThan"));
//! ```

/// Stable identifier for every binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOpId {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
    ShiftLeft,
    ShiftRight,
    IdentityEquality,
    IdentityInequality,
    ValueEquality,
    ValueInequality,
    BitwiseOr,
    BitwiseAnd,
    BitwiseExclusiveOr,
    BooleanOr,
    BooleanAnd,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

/// Stable identifier for every unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOpId {
    Negate,
    BooleanNot,
    BitwiseNot,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

/// How the result type of an operator is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorResult {
    /// The (promoted) operand type.
    Operand,
    /// Always `System.Boolean`.
    Boolean,
}

/// Whether a unary operator is written before or after its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    Prefix,
    Postfix,
}

/// Metadata for a binary operator.
#[derive(Debug, Clone, Copy)]
pub struct BinaryOpInfo {
    pub id: BinaryOpId,
    pub symbol: &'static str,
    pub result: OperatorResult,
    pub overload: Option<&'static str>,
}

/// Metadata for a unary operator.
#[derive(Debug, Clone, Copy)]
pub struct UnaryOpInfo {
    pub id: UnaryOpId,
    pub symbol: &'static str,
    pub fixity: Fixity,
    pub overload: &'static str,
}

/// Registry of all binary operators.
pub const BINARY_OPERATORS: &[BinaryOpInfo] = &[
    bin(BinaryOpId::Add, "+", OperatorResult::Operand, Some("op_Addition")),
    bin(BinaryOpId::Subtract, "-", OperatorResult::Operand, Some("op_Subtraction")),
    bin(BinaryOpId::Multiply, "*", OperatorResult::Operand, Some("op_Multiply")),
    bin(BinaryOpId::Divide, "/", OperatorResult::Operand, Some("op_Division")),
    bin(BinaryOpId::Modulus, "%", OperatorResult::Operand, Some("op_Modulus")),
    bin(BinaryOpId::ShiftLeft, "<<", OperatorResult::Operand, Some("op_LeftShift")),
    bin(BinaryOpId::ShiftRight, ">>", OperatorResult::Operand, Some("op_RightShift")),
    bin(BinaryOpId::IdentityEquality, "==", OperatorResult::Boolean, Some("op_Equality")),
    bin(BinaryOpId::IdentityInequality, "!=", OperatorResult::Boolean, Some("op_Inequality")),
    bin(BinaryOpId::ValueEquality, "==", OperatorResult::Boolean, Some("op_Equality")),
    bin(BinaryOpId::ValueInequality, "!=", OperatorResult::Boolean, Some("op_Inequality")),
    bin(BinaryOpId::BitwiseOr, "|", OperatorResult::Operand, Some("op_BitwiseOr")),
    bin(BinaryOpId::BitwiseAnd, "&", OperatorResult::Operand, Some("op_BitwiseAnd")),
    bin(BinaryOpId::BitwiseExclusiveOr, "^", OperatorResult::Operand, Some("op_ExclusiveOr")),
    bin(BinaryOpId::BooleanOr, "||", OperatorResult::Boolean, None),
    bin(BinaryOpId::BooleanAnd, "&&", OperatorResult::Boolean, None),
    bin(BinaryOpId::LessThan, "<", OperatorResult::Boolean, Some("op_LessThan")),
    bin(BinaryOpId::LessThanOrEqual, "<=", OperatorResult::Boolean, Some("op_LessThanOrEqual")),
    bin(BinaryOpId::GreaterThan, ">", OperatorResult::Boolean, Some("op_GreaterThan")),
    bin(BinaryOpId::GreaterThanOrEqual, ">=", OperatorResult::Boolean, Some("op_GreaterThanOrEqual")),
];

/// Registry of all unary operators.
pub const UNARY_OPERATORS: &[UnaryOpInfo] = &[
    un(UnaryOpId::Negate, "-", Fixity::Prefix, "op_UnaryNegation"),
    un(UnaryOpId::BooleanNot, "!", Fixity::Prefix, "op_LogicalNot"),
    un(UnaryOpId::BitwiseNot, "~", Fixity::Prefix, "op_OnesComplement"),
    un(UnaryOpId::PreIncrement, "++", Fixity::Prefix, "op_Increment"),
    un(UnaryOpId::PreDecrement, "--", Fixity::Prefix, "op_Decrement"),
    un(UnaryOpId::PostIncrement, "++", Fixity::Postfix, "op_Increment"),
    un(UnaryOpId::PostDecrement, "--", Fixity::Postfix, "op_Decrement"),
];

/// Get the metadata for a binary operator.
pub fn binary_info(id: BinaryOpId) -> &'static BinaryOpInfo {
    &BINARY_OPERATORS[id as usize]
}

/// Get the metadata for a unary operator.
pub fn unary_info(id: UnaryOpId) -> &'static UnaryOpInfo {
    &UNARY_OPERATORS[id as usize]
}

impl BinaryOpId {
    /// Identity comparisons never dispatch to a user-defined operator (e.g. `x == null`).
    pub fn is_identity(self) -> bool {
        matches!(self, BinaryOpId::IdentityEquality | BinaryOpId::IdentityInequality)
    }

    /// Value comparisons route strings through the runtime string comparison.
    pub fn is_value_comparison(self) -> bool {
        matches!(self, BinaryOpId::ValueEquality | BinaryOpId::ValueInequality)
    }
}

const fn bin(id: BinaryOpId, symbol: &'static str, result: OperatorResult, overload: Option<&'static str>) -> BinaryOpInfo {
    BinaryOpInfo {
        id,
        symbol,
        result,
        overload,
    }
}

const fn un(id: UnaryOpId, symbol: &'static str, fixity: Fixity, overload: &'static str) -> UnaryOpInfo {
    UnaryOpInfo {
        id,
        symbol,
        fixity,
        overload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_matches_ids() {
        for info in BINARY_OPERATORS {
            assert_eq!(binary_info(info.id).id, info.id);
        }
        for info in UNARY_OPERATORS {
            assert_eq!(unary_info(info.id).id, info.id);
        }
    }

    #[test]
    fn test_logical_operators_have_no_overload() {
        assert_eq!(binary_info(BinaryOpId::BooleanAnd).overload, None);
        assert_eq!(binary_info(BinaryOpId::BooleanOr).overload, None);
    }

    #[test]
    fn test_comparisons_yield_boolean() {
        for id in [
            BinaryOpId::IdentityEquality,
            BinaryOpId::ValueInequality,
            BinaryOpId::GreaterThanOrEqual,
        ] {
            assert_eq!(binary_info(id).result, OperatorResult::Boolean);
        }
        assert_eq!(binary_info(BinaryOpId::ShiftLeft).result, OperatorResult::Operand);
    }

    #[test]
    fn test_postfix_fixity() {
        assert_eq!(unary_info(UnaryOpId::PostIncrement).fixity, Fixity::Postfix);
        assert_eq!(unary_info(UnaryOpId::Negate).fixity, Fixity::Prefix);
    }
}
