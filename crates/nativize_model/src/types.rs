//! Type identity and type references.
//!
//! A [`TypeKey`] names a type definition by its managed full name; a [`TypeRef`] is a use of a type, possibly
//! instantiated, composed into arrays/pointers/references, or naming a generic parameter.

use std::fmt;

use nativize_core::lang::primitives::{self, PrimitiveId};
use serde::{Deserialize, Serialize};

/// Managed full name of a type definition.
///
/// ## Notes
/// - Namespaces are separated by `.`; nested types by `+`.
/// - Each segment may carry a backtick arity for the generic parameters it introduces itself:
///   `Collections.Dictionary`2+Enumerator` declares two parameters on the outer type and none on the nested one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(String);

/// One `+`-separated segment of a [`TypeKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameSegment<'a> {
    /// Segment name without its arity marker.
    pub name: &'a str,
    /// Generic parameters this segment introduces (not counting its owners').
    pub arity: usize,
}

impl TypeKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespace of the outermost declaring type, if any.
    pub fn namespace(&self) -> Option<&str> {
        let outer = self.0.split('+').next().unwrap_or_default();
        outer.rfind('.').map(|idx| &outer[..idx])
    }

    /// Nesting chain from the outermost type to this one.
    pub fn segments(&self) -> Vec<NameSegment<'_>> {
        self.0
            .split('+')
            .enumerate()
            .map(|(i, raw)| {
                let raw = if i == 0 {
                    raw.rfind('.').map_or(raw, |idx| &raw[idx + 1..])
                } else {
                    raw
                };
                split_arity(raw)
            })
            .collect()
    }

    /// Name of the innermost segment, without arity.
    pub fn simple_name(&self) -> &str {
        let last = self.0.rsplit('+').next().unwrap_or_default();
        let last = if self.0.contains('+') {
            last
        } else {
            last.rfind('.').map_or(last, |idx| &last[idx + 1..])
        };
        split_arity(last).name
    }

    /// Total number of generic parameters, including those introduced by declaring types.
    pub fn total_arity(&self) -> usize {
        self.segments().iter().map(|s| s.arity).sum()
    }

    /// Declaring type of a nested type.
    pub fn declaring_type(&self) -> Option<TypeKey> {
        self.0.rfind('+').map(|idx| TypeKey(self.0[..idx].to_string()))
    }

    /// Whether this is a nested type.
    pub fn is_nested(&self) -> bool {
        self.0.contains('+')
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeKey {
    fn from(value: &str) -> Self {
        TypeKey::new(value)
    }
}

fn split_arity(raw: &str) -> NameSegment<'_> {
    match raw.rfind('`') {
        Some(idx) => NameSegment {
            name: &raw[..idx],
            arity: raw[idx + 1..].parse().unwrap_or(0),
        },
        None => NameSegment { name: raw, arity: 0 },
    }
}

/// Which declaration introduced a generic parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericOwner {
    Type,
    Method,
}

/// A use of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeRef {
    /// A named type, instantiated with `args` when generic (all arguments, including the owners').
    Named {
        key: TypeKey,
        #[serde(default)]
        args: Vec<TypeRef>,
    },
    /// A generic parameter of the enclosing type or method.
    GenericParam {
        name: String,
        position: usize,
        owner: GenericOwner,
    },
    /// A managed array (`rank` dimensions).
    Array {
        element: Box<TypeRef>,
        #[serde(default = "default_rank")]
        rank: usize,
    },
    /// An unmanaged pointer.
    Pointer { element: Box<TypeRef> },
    /// A by-reference location (`ref` / `out` slots).
    Reference { element: Box<TypeRef> },
}

fn default_rank() -> usize {
    1
}

impl TypeRef {
    pub fn named(key: impl Into<String>) -> Self {
        TypeRef::Named {
            key: TypeKey::new(key),
            args: Vec::new(),
        }
    }

    pub fn generic(key: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Named {
            key: TypeKey::new(key),
            args,
        }
    }

    pub fn type_param(name: impl Into<String>, position: usize) -> Self {
        TypeRef::GenericParam {
            name: name.into(),
            position,
            owner: GenericOwner::Type,
        }
    }

    pub fn method_param(name: impl Into<String>, position: usize) -> Self {
        TypeRef::GenericParam {
            name: name.into(),
            position,
            owner: GenericOwner::Method,
        }
    }

    pub fn array(element: TypeRef) -> Self {
        TypeRef::Array {
            element: Box::new(element),
            rank: 1,
        }
    }

    pub fn pointer(element: TypeRef) -> Self {
        TypeRef::Pointer {
            element: Box::new(element),
        }
    }

    pub fn reference(element: TypeRef) -> Self {
        TypeRef::Reference {
            element: Box::new(element),
        }
    }

    pub fn primitive(id: PrimitiveId) -> Self {
        TypeRef::named(primitives::info_for(id).dotnet_name)
    }

    pub fn void() -> Self {
        Self::primitive(PrimitiveId::Void)
    }

    pub fn object() -> Self {
        Self::primitive(PrimitiveId::Object)
    }

    pub fn string() -> Self {
        Self::primitive(PrimitiveId::String)
    }

    pub fn boolean() -> Self {
        Self::primitive(PrimitiveId::Boolean)
    }

    pub fn char() -> Self {
        Self::primitive(PrimitiveId::Char)
    }

    pub fn int32() -> Self {
        Self::primitive(PrimitiveId::Int32)
    }

    /// Key of a named type.
    pub fn key(&self) -> Option<&TypeKey> {
        match self {
            TypeRef::Named { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Generic arguments of a named type.
    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Named { args, .. } => args,
            _ => &[],
        }
    }

    /// Primitive id of a non-generic named type.
    pub fn primitive_id(&self) -> Option<PrimitiveId> {
        match self {
            TypeRef::Named { key, args } if args.is_empty() => primitives::from_dotnet_name(key.as_str()),
            _ => None,
        }
    }

    pub fn is_primitive(&self, id: PrimitiveId) -> bool {
        self.primitive_id() == Some(id)
    }

    pub fn is_void(&self) -> bool {
        self.is_primitive(PrimitiveId::Void)
    }

    pub fn is_generic_param(&self) -> bool {
        matches!(self, TypeRef::GenericParam { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeRef::Array { .. })
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeRef::Pointer { .. })
    }

    /// Element of an array, pointer, or reference.
    pub fn element(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array { element, .. } | TypeRef::Pointer { element } | TypeRef::Reference { element } => {
                Some(element)
            }
            _ => None,
        }
    }

    /// Strip a by-reference wrapper, if present.
    pub fn dereferenced(&self) -> &TypeRef {
        match self {
            TypeRef::Reference { element } => element,
            other => other,
        }
    }

    /// Whether any generic parameter appears anywhere in this reference.
    pub fn contains_generic_param(&self) -> bool {
        match self {
            TypeRef::GenericParam { .. } => true,
            TypeRef::Named { args, .. } => args.iter().any(TypeRef::contains_generic_param),
            TypeRef::Array { element, .. } | TypeRef::Pointer { element } | TypeRef::Reference { element } => {
                element.contains_generic_param()
            }
        }
    }

    /// Replace generic parameters with concrete arguments.
    ///
    /// Parameters without a matching argument are left in place.
    pub fn substitute(&self, type_args: &[TypeRef], method_args: &[TypeRef]) -> TypeRef {
        match self {
            TypeRef::GenericParam { position, owner, .. } => {
                let source = match owner {
                    GenericOwner::Type => type_args,
                    GenericOwner::Method => method_args,
                };
                source.get(*position).cloned().unwrap_or_else(|| self.clone())
            }
            TypeRef::Named { key, args } => TypeRef::Named {
                key: key.clone(),
                args: args.iter().map(|a| a.substitute(type_args, method_args)).collect(),
            },
            TypeRef::Array { element, rank } => TypeRef::Array {
                element: Box::new(element.substitute(type_args, method_args)),
                rank: *rank,
            },
            TypeRef::Pointer { element } => TypeRef::Pointer {
                element: Box::new(element.substitute(type_args, method_args)),
            },
            TypeRef::Reference { element } => TypeRef::Reference {
                element: Box::new(element.substitute(type_args, method_args)),
            },
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named { key, args } => {
                write!(f, "{}", key)?;
                if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
                Ok(())
            }
            TypeRef::GenericParam { name, .. } => f.write_str(name),
            TypeRef::Array { element, rank } => write!(f, "{}[{}]", element, ",".repeat(rank.saturating_sub(1))),
            TypeRef::Pointer { element } => write!(f, "{}*", element),
            TypeRef::Reference { element } => write!(f, "{}&", element),
        }
    }
}
