//! Annotated output fragments.
//!
//! Every expression translation yields an [`AnnotatedText`]: the emitted C++ text plus the managed type of the value
//! it denotes. The type drives implicit casts, member-access tokens, and operator selection further up the tree.

use nativize_model::TypeRef;

/// Key of the pseudo type carried by the `null` literal.
pub const NULL_TYPE_KEY: &str = "<null>";

/// An emitted expression fragment with its inferred type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedText {
    pub text: String,
    /// Static type of the value.
    pub ty: TypeRef,
    /// One level of indirection behind `ty`: the element of an indexed array or dereferenced pointer, or the
    /// referenced slot of a by-ref parameter.
    pub embedded: Option<TypeRef>,
    /// The text is an unfinished `set_X(` call awaiting its value and closing parenthesis.
    pub pending_set: bool,
}

impl AnnotatedText {
    pub fn new(text: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            text: text.into(),
            ty,
            embedded: None,
            pending_set: false,
        }
    }

    pub fn with_embedded(mut self, embedded: TypeRef) -> Self {
        self.embedded = Some(embedded);
        self
    }

    /// The text of `null`.
    pub fn null() -> Self {
        Self::new("NULL", null_type())
    }

    /// A `set_X(` prefix whose value is supplied by the enclosing assignment.
    pub fn pending_setter(prefix: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            text: prefix.into(),
            ty,
            embedded: None,
            pending_set: true,
        }
    }

    pub fn is_null(&self) -> bool {
        is_null_type(&self.ty)
    }

    /// Wrap the text in parentheses, keeping the annotation.
    pub fn parenthesized(mut self) -> Self {
        self.text = format!("({})", self.text);
        self
    }
}

pub fn null_type() -> TypeRef {
    TypeRef::named(NULL_TYPE_KEY)
}

pub fn is_null_type(ty: &TypeRef) -> bool {
    ty.key().is_some_and(|k| k.as_str() == NULL_TYPE_KEY)
}
