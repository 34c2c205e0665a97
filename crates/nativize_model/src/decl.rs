//! Declarations: assemblies, types, and members.

use serde::{Deserialize, Serialize};

use crate::expr::{Expr, Literal, MethodRef};
use crate::stmt::Block;
use crate::types::{TypeKey, TypeRef};

/// One output unit: the types to translate plus signature-only declarations of the types they reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assembly {
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    /// External types (signatures only; bodies are ignored).
    #[serde(default)]
    pub references: Vec<TypeDecl>,
}

impl Assembly {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn with_type(mut self, decl: TypeDecl) -> Self {
        self.types.push(decl);
        self
    }

    pub fn with_reference(mut self, decl: TypeDecl) -> Self {
        self.references.push(decl);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

impl TypeKind {
    /// Structs and enums are stored inline; everything else is a heap reference.
    pub fn is_value_type(self) -> bool {
        matches!(self, TypeKind::Struct | TypeKind::Enum)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
    Internal,
    ProtectedInternal,
}

/// A type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub key: TypeKey,
    pub kind: TypeKind,
    /// Every generic parameter in scope, including the ones introduced by declaring types.
    #[serde(default)]
    pub generic_params: Vec<String>,
    #[serde(default)]
    pub base: Option<TypeRef>,
    /// All implemented interfaces (direct and inherited through other interfaces).
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub events: Vec<EventDecl>,
    /// Underlying integral type of an enum (defaults to `System.Int32`).
    #[serde(default)]
    pub enum_underlying: Option<TypeRef>,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_sealed: bool,
}

impl TypeDecl {
    pub fn new(key: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            key: TypeKey::new(key),
            kind,
            generic_params: Vec::new(),
            base: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            events: Vec::new(),
            enum_underlying: None,
            is_abstract: false,
            is_sealed: false,
        }
    }

    pub fn with_generic_params(mut self, params: &[&str]) -> Self {
        self.generic_params = params.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_base(mut self, base: TypeRef) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_interface(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_event(mut self, event: EventDecl) -> Self {
        self.events.push(event);
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    /// This type as a reference, instantiated with its own generic parameters.
    pub fn self_ref(&self) -> TypeRef {
        TypeRef::Named {
            key: self.key.clone(),
            args: self
                .generic_params
                .iter()
                .enumerate()
                .map(|(i, p)| TypeRef::type_param(p.clone(), i))
                .collect(),
        }
    }

    /// The `Invoke` method of a delegate type.
    pub fn delegate_invoke(&self) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.name == "Invoke" && !m.is_static)
    }
}

/// A field (or, for enums, a named constant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
    /// Compile-time constant value (enum members, `const` fields).
    #[serde(default)]
    pub constant: Option<Literal>,
    /// Initializer folded into constructors (instance) or the static constructor (static).
    #[serde(default)]
    pub initializer: Option<Expr>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            visibility: Visibility::Public,
            is_static: false,
            constant: None,
            initializer: None,
        }
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_constant(mut self, value: Literal) -> Self {
        self.constant = Some(value);
        self
    }

    pub fn with_initializer(mut self, value: Expr) -> Self {
        self.initializer = Some(value);
        self
    }
}

/// How an argument is passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamMode {
    #[default]
    Value,
    Ref,
    Out,
    In,
}

impl ParamMode {
    /// `ref` and `out` parameters are passed by address.
    pub fn is_by_ref(self) -> bool {
        matches!(self, ParamMode::Ref | ParamMode::Out)
    }
}

/// A parameter. `ty` is the element type; by-ref passing is expressed by `mode`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub mode: ParamMode,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            mode: ParamMode::Value,
        }
    }

    pub fn with_mode(mut self, mode: ParamMode) -> Self {
        self.mode = mode;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    #[default]
    Normal,
    Constructor,
    StaticConstructor,
    Finalizer,
    Getter,
    Setter,
    EventAdder,
    EventRemover,
}

/// Which constructor a constructor chains to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitializerTarget {
    Base,
    This,
}

/// `: base(...)` / `: this(...)` constructor chaining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtorInitializer {
    pub target: InitializerTarget,
    #[serde(default)]
    pub args: Vec<Expr>,
}

/// A method, constructor, accessor, or finalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub kind: MethodKind,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub is_abstract: bool,
    /// Introduces a new virtual slot (as opposed to overriding an inherited one).
    #[serde(default)]
    pub is_new_slot: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub generic_params: Vec<String>,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    /// `None` for `void`.
    #[serde(default)]
    pub return_type: Option<TypeRef>,
    #[serde(default)]
    pub body: Option<Block>,
    /// Explicit interface implementations.
    #[serde(default)]
    pub overrides: Vec<MethodRef>,
    #[serde(default)]
    pub initializer: Option<CtorInitializer>,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MethodKind::Normal,
            visibility: Visibility::Public,
            is_static: false,
            is_virtual: false,
            is_abstract: false,
            is_new_slot: false,
            is_final: false,
            generic_params: Vec::new(),
            params: Vec::new(),
            return_type: None,
            body: None,
            overrides: Vec::new(),
            initializer: None,
        }
    }

    pub fn constructor() -> Self {
        let mut m = Self::new(".ctor");
        m.kind = MethodKind::Constructor;
        m
    }

    pub fn static_constructor() -> Self {
        let mut m = Self::new(".cctor");
        m.kind = MethodKind::StaticConstructor;
        m.is_static = true;
        m
    }

    pub fn with_kind(mut self, kind: MethodKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_param(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_generic_params(mut self, params: &[&str]) -> Self {
        self.generic_params = params.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn returning(mut self, ty: TypeRef) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn with_body(mut self, body: Block) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_override(mut self, target: MethodRef) -> Self {
        self.overrides.push(target);
        self
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as a newly introduced virtual method.
    pub fn virtual_(mut self) -> Self {
        self.is_virtual = true;
        self.is_new_slot = true;
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.is_virtual = true;
        self.is_new_slot = true;
        self.is_abstract = true;
        self
    }

    /// Return type, with `None` meaning `void`.
    pub fn returns_value(&self) -> bool {
        self.return_type.as_ref().is_some_and(|t| !t.is_void())
    }

    /// A reference to this method as declared on `declaring_type`.
    pub fn as_ref_on(&self, declaring_type: TypeRef) -> MethodRef {
        MethodRef {
            declaring_type,
            name: self.name.clone(),
            generic_args: Vec::new(),
            params: self.params.clone(),
            return_type: self.return_type.clone(),
            is_static: self.is_static,
            is_virtual: self.is_virtual,
        }
    }
}

/// An event. Its add/remove accessors appear as methods with kind `EventAdder` / `EventRemover`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDecl {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub is_static: bool,
}

impl EventDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_ref_uses_own_params() {
        let decl = TypeDecl::new("NS.Pair`2", TypeKind::Class).with_generic_params(&["A", "B"]);
        assert_eq!(
            decl.self_ref(),
            TypeRef::generic("NS.Pair`2", vec![TypeRef::type_param("A", 0), TypeRef::type_param("B", 1)])
        );
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"{
            "name": "App",
            "types": [
                { "key": "App.Widget", "kind": "class",
                  "fields": [ { "name": "size", "ty": { "kind": "named", "key": "System.Int32" } } ] }
            ]
        }"#;
        let asm: Assembly = serde_json::from_str(json).unwrap();
        assert_eq!(asm.types.len(), 1);
        let widget = &asm.types[0];
        assert_eq!(widget.fields[0].ty, TypeRef::int32());
        assert!(!widget.fields[0].is_static);
        assert!(asm.references.is_empty());
    }

    #[test]
    fn test_returns_value() {
        assert!(!MethodDecl::new("Run").returns_value());
        assert!(!MethodDecl::new("Run").returning(TypeRef::void()).returns_value());
        assert!(MethodDecl::new("Get").returning(TypeRef::int32()).returns_value());
    }
}
