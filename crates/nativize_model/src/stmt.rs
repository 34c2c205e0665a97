//! Statement trees.

use serde::{Deserialize, Serialize};

use crate::expr::{EventRef, Expr, Literal, VariableDecl};
use crate::types::TypeRef;

/// A sequence of statements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl Block {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl From<Vec<Stmt>> for Block {
    fn from(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}

/// One label of a switch section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "label", rename_all = "snake_case")]
pub enum CaseLabel {
    /// Integral, character, enum, string, or `null` constant.
    Value { value: Literal },
    Default,
}

/// A switch section: one or more labels sharing a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub labels: Vec<CaseLabel>,
    #[serde(default)]
    pub body: Block,
}

/// A `catch` clause. `ty == None` catches everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    #[serde(default)]
    pub variable: Option<String>,
    #[serde(default)]
    pub ty: Option<TypeRef>,
    #[serde(default)]
    pub body: Block,
}

/// A statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Stmt {
    Block { body: Block },
    Expression { expr: Expr },
    If {
        condition: Expr,
        then: Block,
        #[serde(default)]
        otherwise: Option<Block>,
    },
    While { condition: Expr, body: Block },
    Do { body: Block, condition: Expr },
    For {
        #[serde(default)]
        init: Vec<Stmt>,
        #[serde(default)]
        condition: Option<Expr>,
        #[serde(default)]
        increment: Vec<Stmt>,
        body: Block,
    },
    ForEach {
        variable: VariableDecl,
        collection: Expr,
        body: Block,
    },
    Switch {
        value: Expr,
        cases: Vec<SwitchCase>,
    },
    Try {
        body: Block,
        #[serde(default)]
        catches: Vec<CatchClause>,
        #[serde(default)]
        finally: Option<Block>,
    },
    /// `throw expr;` or, inside a catch, `throw;`.
    Throw {
        #[serde(default)]
        value: Option<Expr>,
    },
    Using { resource: Expr, body: Block },
    Lock { target: Expr, body: Block },
    /// `fixed (T* p = expr) { ... }`.
    Fixed {
        variable: VariableDecl,
        value: Expr,
        body: Block,
    },
    Labeled { label: String, body: Box<Stmt> },
    Goto { label: String },
    Break,
    Continue,
    Return {
        #[serde(default)]
        value: Option<Expr>,
    },
    Comment { text: String },
    /// `target.Event += handler;`
    AttachEvent {
        event: EventRef,
        #[serde(default)]
        target: Option<Expr>,
        handler: Expr,
    },
    /// `target.Event -= handler;`
    RemoveEvent {
        event: EventRef,
        #[serde(default)]
        target: Option<Expr>,
        handler: Expr,
    },
    Unsupported { construct: String },
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Stmt::Expression { expr }
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Stmt::Return { value }
    }

    /// `name = value;` declaring `name` as a local of type `ty`.
    pub fn local(name: impl Into<String>, ty: TypeRef, value: Expr) -> Self {
        Stmt::expr(Expr::assign(Expr::declare(name, ty), value))
    }
}
