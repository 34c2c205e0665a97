//! Resolved managed object model consumed by the nativize backend.
//!
//! The model is the contract between an upstream decompiler and the backend: a read-only, fully type-checked graph
//! of type declarations, members, and expression/statement trees. Every member reference inside a body carries its
//! resolved signature, so the backend never has to perform overload resolution.
//!
//! ## Notes
//!
//! - All types derive `serde` traits; the JSON interchange format is the serde representation of [`Assembly`].
//! - Expression and statement variants are closed tagged sums (`"expr"` / `"stmt"` tags). The backend dispatches
//!   over them with exhaustive `match`es.
//! - Type identity uses managed full names ([`TypeKey`]): `NS.Outer`1+Inner`.
//!
//! ## Examples
//! ```rust
//! use nativize_model::{TypeDecl, TypeKind, TypeRef};
//!
//! let point = TypeDecl::new("Geometry.Point", TypeKind::Struct)
//!     .with_field(nativize_model::FieldDecl::new("X", TypeRef::int32()));
//! assert_eq!(point.key.simple_name(), "Point");
//! ```

pub mod decl;
pub mod expr;
pub mod stmt;
pub mod types;

pub use decl::{
    Assembly, CtorInitializer, EventDecl, FieldDecl, InitializerTarget, MethodDecl, MethodKind, ParamDecl, ParamMode,
    TypeDecl, TypeKind, Visibility,
};
pub use expr::{
    BinaryOp, EventRef, Expr, FieldRef, Literal, MemberInit, MethodRef, PropertyRef, UnaryOp, VariableDecl,
};
pub use stmt::{Block, CaseLabel, CatchClause, Stmt, SwitchCase};
pub use types::{GenericOwner, NameSegment, TypeKey, TypeRef};
