//! Expression trees and resolved member references.

use nativize_core::lang::operators::{BinaryOpId, UnaryOpId};
use serde::{Deserialize, Serialize};

use crate::decl::{ParamDecl, ParamMode};
use crate::stmt::Block;
use crate::types::TypeRef;

/// A literal value.
///
/// ## Notes
/// - Floats serialize as JSON numbers when finite and as `"NaN"`, `"Infinity"`, `"-Infinity"` otherwise.
/// - Decimals keep their exact decimal spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Null,
    Bool(bool),
    /// One UTF-16 code unit.
    Char(u16),
    String(String),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(#[serde(with = "float_repr::single")] f32),
    F64(#[serde(with = "float_repr::double")] f64),
    Decimal(String),
}

impl Literal {
    /// Static type of the literal; `None` for `null`.
    pub fn ty(&self) -> Option<TypeRef> {
        use nativize_core::lang::primitives::PrimitiveId as P;
        let id = match self {
            Literal::Null => return None,
            Literal::Bool(_) => P::Boolean,
            Literal::Char(_) => P::Char,
            Literal::String(_) => P::String,
            Literal::I8(_) => P::SByte,
            Literal::U8(_) => P::Byte,
            Literal::I16(_) => P::Int16,
            Literal::U16(_) => P::UInt16,
            Literal::I32(_) => P::Int32,
            Literal::U32(_) => P::UInt32,
            Literal::I64(_) => P::Int64,
            Literal::U64(_) => P::UInt64,
            Literal::F32(_) => P::Single,
            Literal::F64(_) => P::Double,
            Literal::Decimal(_) => P::Decimal,
        };
        Some(TypeRef::primitive(id))
    }
}

mod float_repr {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    fn to_repr(v: f64) -> Repr {
        if v.is_nan() {
            Repr::Text("NaN".to_string())
        } else if v.is_infinite() {
            Repr::Text(if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string())
        } else {
            Repr::Number(v)
        }
    }

    fn from_repr<E: serde::de::Error>(repr: Repr) -> Result<f64, E> {
        match repr {
            Repr::Number(v) => Ok(v),
            Repr::Text(t) => match t.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => other.parse().map_err(E::custom),
            },
        }
    }

    pub mod double {
        use super::*;

        pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
            to_repr(*v).serialize(s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
            from_repr(Repr::deserialize(d)?)
        }
    }

    pub mod single {
        use super::*;

        pub fn serialize<S: Serializer>(v: &f32, s: S) -> Result<S::Ok, S::Error> {
            to_repr(f64::from(*v)).serialize(s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f32, D::Error> {
            from_repr(Repr::deserialize(d)?).map(|v| v as f32)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
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

impl BinaryOp {
    /// Registry id of this operator.
    pub fn id(self) -> BinaryOpId {
        match self {
            BinaryOp::Add => BinaryOpId::Add,
            BinaryOp::Subtract => BinaryOpId::Subtract,
            BinaryOp::Multiply => BinaryOpId::Multiply,
            BinaryOp::Divide => BinaryOpId::Divide,
            BinaryOp::Modulus => BinaryOpId::Modulus,
            BinaryOp::ShiftLeft => BinaryOpId::ShiftLeft,
            BinaryOp::ShiftRight => BinaryOpId::ShiftRight,
            BinaryOp::IdentityEquality => BinaryOpId::IdentityEquality,
            BinaryOp::IdentityInequality => BinaryOpId::IdentityInequality,
            BinaryOp::ValueEquality => BinaryOpId::ValueEquality,
            BinaryOp::ValueInequality => BinaryOpId::ValueInequality,
            BinaryOp::BitwiseOr => BinaryOpId::BitwiseOr,
            BinaryOp::BitwiseAnd => BinaryOpId::BitwiseAnd,
            BinaryOp::BitwiseExclusiveOr => BinaryOpId::BitwiseExclusiveOr,
            BinaryOp::BooleanOr => BinaryOpId::BooleanOr,
            BinaryOp::BooleanAnd => BinaryOpId::BooleanAnd,
            BinaryOp::LessThan => BinaryOpId::LessThan,
            BinaryOp::LessThanOrEqual => BinaryOpId::LessThanOrEqual,
            BinaryOp::GreaterThan => BinaryOpId::GreaterThan,
            BinaryOp::GreaterThanOrEqual => BinaryOpId::GreaterThanOrEqual,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Negate,
    BooleanNot,
    BitwiseNot,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UnaryOp {
    /// Registry id of this operator.
    pub fn id(self) -> UnaryOpId {
        match self {
            UnaryOp::Negate => UnaryOpId::Negate,
            UnaryOp::BooleanNot => UnaryOpId::BooleanNot,
            UnaryOp::BitwiseNot => UnaryOpId::BitwiseNot,
            UnaryOp::PreIncrement => UnaryOpId::PreIncrement,
            UnaryOp::PreDecrement => UnaryOpId::PreDecrement,
            UnaryOp::PostIncrement => UnaryOpId::PostIncrement,
            UnaryOp::PostDecrement => UnaryOpId::PostDecrement,
        }
    }
}

/// A resolved method reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    /// Declaring type, instantiated as seen from the call site.
    pub declaring_type: TypeRef,
    pub name: String,
    #[serde(default)]
    pub generic_args: Vec<TypeRef>,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub return_type: Option<TypeRef>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_virtual: bool,
}

impl MethodRef {
    pub fn new(declaring_type: TypeRef, name: impl Into<String>) -> Self {
        Self {
            declaring_type,
            name: name.into(),
            generic_args: Vec::new(),
            params: Vec::new(),
            return_type: None,
            is_static: false,
            is_virtual: false,
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.params.push(ParamDecl::new(name, ty));
        self
    }

    pub fn with_param_mode(mut self, name: impl Into<String>, ty: TypeRef, mode: ParamMode) -> Self {
        self.params.push(ParamDecl::new(name, ty).with_mode(mode));
        self
    }

    pub fn with_generic_args(mut self, args: Vec<TypeRef>) -> Self {
        self.generic_args = args;
        self
    }

    pub fn returning(mut self, ty: TypeRef) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Return type with the declaring type's and the method's generic arguments substituted.
    pub fn resolved_return_type(&self) -> TypeRef {
        match &self.return_type {
            Some(t) => t.substitute(self.declaring_type.args(), &self.generic_args),
            None => TypeRef::void(),
        }
    }

    /// Parameter type with generic arguments substituted.
    pub fn resolved_param_type(&self, index: usize) -> Option<TypeRef> {
        self.params
            .get(index)
            .map(|p| p.ty.substitute(self.declaring_type.args(), &self.generic_args))
    }
}

/// A resolved field reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    pub declaring_type: TypeRef,
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub is_static: bool,
}

impl FieldRef {
    pub fn new(declaring_type: TypeRef, name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            declaring_type,
            name: name.into(),
            ty,
            is_static: false,
        }
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// A resolved property (or indexer) reference. Accessors are `get_{name}` / `set_{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyRef {
    pub declaring_type: TypeRef,
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub is_static: bool,
    /// Index parameters of an indexer.
    #[serde(default)]
    pub params: Vec<ParamDecl>,
}

impl PropertyRef {
    pub fn new(declaring_type: TypeRef, name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            declaring_type,
            name: name.into(),
            ty,
            is_static: false,
            params: Vec::new(),
        }
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// A resolved event reference. Accessors are `add_{name}` / `remove_{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventRef {
    pub declaring_type: TypeRef,
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub is_static: bool,
}

impl EventRef {
    pub fn new(declaring_type: TypeRef, name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            declaring_type,
            name: name.into(),
            ty,
            is_static: false,
        }
    }
}

/// A local variable declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableDecl {
    pub name: String,
    pub ty: TypeRef,
}

impl VariableDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self { name: name.into(), ty }
    }
}

/// One entry of an object initializer block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "init", rename_all = "snake_case")]
pub enum MemberInit {
    Field { field: FieldRef, value: Expr },
    Property { property: PropertyRef, value: Expr },
    /// Collection initializer element (`Add(value)`).
    Add { method: MethodRef, value: Expr },
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expr {
    /// `&x` (unsafe address-of).
    AddressOf { operand: Box<Expr> },
    /// `*p`.
    AddressDereference { operand: Box<Expr> },
    /// `out x` argument.
    AddressOut { operand: Box<Expr> },
    /// `ref x` argument.
    AddressReference { operand: Box<Expr> },
    Literal { value: Literal },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    Assign { target: Box<Expr>, value: Box<Expr> },
    Cast { target_type: TypeRef, operand: Box<Expr> },
    /// `x as T`.
    TryCast { target_type: TypeRef, operand: Box<Expr> },
    /// `x is T`.
    TypeTest { target_type: TypeRef, operand: Box<Expr> },
    /// Field access; `target` is `None` for static fields.
    Field {
        #[serde(default)]
        target: Option<Box<Expr>>,
        field: FieldRef,
    },
    Property {
        #[serde(default)]
        target: Option<Box<Expr>>,
        property: PropertyRef,
    },
    Indexer {
        target: Box<Expr>,
        property: PropertyRef,
        indices: Vec<Expr>,
    },
    Event {
        #[serde(default)]
        target: Option<Box<Expr>>,
        event: EventRef,
    },
    Invoke {
        #[serde(default)]
        target: Option<Box<Expr>>,
        method: MethodRef,
        #[serde(default)]
        args: Vec<Expr>,
    },
    ObjectCreate {
        ty: TypeRef,
        #[serde(default)]
        constructor: Option<MethodRef>,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        initializers: Vec<MemberInit>,
    },
    ArrayCreate {
        element: TypeRef,
        #[serde(default)]
        dimensions: Vec<Expr>,
        #[serde(default)]
        initializer: Vec<Expr>,
    },
    ArrayIndex { target: Box<Expr>, indices: Vec<Expr> },
    Condition {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// `a ?? b`.
    NullCoalescing { value: Box<Expr>, fallback: Box<Expr> },
    DelegateCreate {
        delegate_type: TypeRef,
        #[serde(default)]
        target: Option<Box<Expr>>,
        method: MethodRef,
    },
    DelegateInvoke {
        target: Box<Expr>,
        #[serde(default)]
        args: Vec<Expr>,
    },
    AnonymousMethod {
        delegate_type: TypeRef,
        #[serde(default)]
        params: Vec<ParamDecl>,
        #[serde(default)]
        return_type: Option<TypeRef>,
        body: Block,
    },
    This,
    Base,
    TypeOf { ty: TypeRef },
    SizeOf { ty: TypeRef },
    StackAlloc { element: TypeRef, count: Box<Expr> },
    /// `default(T)`.
    DefaultValue { ty: TypeRef },
    VariableDecl { decl: VariableDecl },
    Variable { name: String },
    Argument { name: String },
    /// A type used as the target of a static member access.
    TypeReference { ty: TypeRef },
    /// A construct the upstream decompiler recognized but the backend does not translate.
    Unsupported { construct: String },
}

impl Expr {
    pub fn literal(value: Literal) -> Self {
        Expr::Literal { value }
    }

    pub fn null() -> Self {
        Expr::literal(Literal::Null)
    }

    pub fn bool(value: bool) -> Self {
        Expr::literal(Literal::Bool(value))
    }

    pub fn int(value: i32) -> Self {
        Expr::literal(Literal::I32(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::literal(Literal::String(value.into()))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Variable { name: name.into() }
    }

    pub fn arg(name: impl Into<String>) -> Self {
        Expr::Argument { name: name.into() }
    }

    pub fn declare(name: impl Into<String>, ty: TypeRef) -> Self {
        Expr::VariableDecl {
            decl: VariableDecl::new(name, ty),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::Assign {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn cast(target_type: TypeRef, operand: Expr) -> Self {
        Expr::Cast {
            target_type,
            operand: Box::new(operand),
        }
    }

    pub fn field(target: Option<Expr>, field: FieldRef) -> Self {
        Expr::Field {
            target: target.map(Box::new),
            field,
        }
    }

    pub fn property(target: Option<Expr>, property: PropertyRef) -> Self {
        Expr::Property {
            target: target.map(Box::new),
            property,
        }
    }

    pub fn call(target: Option<Expr>, method: MethodRef, args: Vec<Expr>) -> Self {
        Expr::Invoke {
            target: target.map(Box::new),
            method,
            args,
        }
    }

    pub fn new_object(ty: TypeRef, constructor: Option<MethodRef>, args: Vec<Expr>) -> Self {
        Expr::ObjectCreate {
            ty,
            constructor,
            args,
            initializers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_types() {
        assert_eq!(Literal::Null.ty(), None);
        assert_eq!(Literal::I32(3).ty(), Some(TypeRef::int32()));
        assert_eq!(Literal::Char(65).ty(), Some(TypeRef::char()));
    }

    #[test]
    fn test_non_finite_floats_round_trip_through_json() {
        let lit = Literal::F64(f64::NEG_INFINITY);
        let json = serde_json::to_string(&lit).unwrap();
        assert_eq!(json, r#"{"type":"f64","value":"-Infinity"}"#);
        let back: Literal = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lit);

        let nan: Literal = serde_json::from_str(r#"{"type":"f32","value":"NaN"}"#).unwrap();
        assert!(matches!(nan, Literal::F32(v) if v.is_nan()));
    }

    #[test]
    fn test_expr_tagging() {
        let json = r#"{"expr":"binary","op":"add","left":{"expr":"variable","name":"a"},
                       "right":{"expr":"literal","value":{"type":"i32","value":1}}}"#;
        let expr: Expr = serde_json::from_str(json).unwrap();
        assert_eq!(expr, Expr::binary(BinaryOp::Add, Expr::var("a"), Expr::int(1)));
    }

    #[test]
    fn test_resolved_return_type_substitutes() {
        let list = TypeRef::generic("System.Collections.Generic.List`1", vec![TypeRef::string()]);
        let get = MethodRef::new(list, "get_Item").returning(TypeRef::type_param("T", 0));
        assert_eq!(get.resolved_return_type(), TypeRef::string());
    }

    #[test]
    fn test_operator_ids_line_up() {
        assert_eq!(BinaryOp::ValueEquality.id(), BinaryOpId::ValueEquality);
        assert_eq!(UnaryOp::PostDecrement.id(), UnaryOpId::PostDecrement);
    }
}
