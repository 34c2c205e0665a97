//! Per-unit type table: kinds, interface sets, and member lookup.
//!
//! The table indexes every declaration the unit can see (translated types, signature-only references, and a few
//! well-known runtime interfaces) and precomputes each type's transitive interface *union* and its *exclusive*
//! interface set.
//!
//! ## Notes
//!
//! - The union of a type is: its base's union, then each declared interface followed by that interface's union.
//!   Order is first-seen and duplicates are dropped.
//! - The exclusive set is the declared interfaces plus everything they imply, whether or not the base already
//!   implements them. One dispatch wrapper is generated per exclusive interface; interfaces of the union outside
//!   that set resolve to the wrapper nested in a base type.
//! - Interface sets are expressed in terms of the declaring type's own generic parameters; [`TypeTable::union_of`]
//!   substitutes the arguments of an instantiation.
//! - Types unknown to the table are treated as classes.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use nativize_core::lang::primitives::{self, PrimitiveId};
use nativize_model::{Assembly, MethodDecl, MethodKind, TypeDecl, TypeKey, TypeKind, TypeRef, Visibility};

use super::text::is_null_type;

/// Inheritance chains deeper than this are treated as malformed (cyclic) and cut.
const MAX_INHERITANCE_DEPTH: usize = 64;

/// Shape of a type as far as emission is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    Primitive(PrimitiveId),
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
    GenericParam,
    Array,
    Pointer,
    ByRef,
    Null,
}

impl TypeClass {
    pub fn is_value_type(self) -> bool {
        match self {
            TypeClass::Primitive(id) => primitives::info_for(id).is_value_type(),
            TypeClass::Struct | TypeClass::Enum => true,
            _ => false,
        }
    }

    /// Heap-allocated, garbage-collected values.
    pub fn is_reference_type(self) -> bool {
        match self {
            TypeClass::Primitive(id) => matches!(id, PrimitiveId::String | PrimitiveId::Object),
            TypeClass::Class | TypeClass::Interface | TypeClass::Delegate | TypeClass::Array => true,
            _ => false,
        }
    }
}

/// Precomputed per-declaration bookkeeping.
#[derive(Debug, Clone)]
pub struct TypeInfo<'a> {
    pub decl: &'a TypeDecl,
    /// Part of the unit being translated (as opposed to a signature-only reference).
    pub in_unit: bool,
    /// Transitive interface set, in the declaration's own generic parameters.
    pub union: Vec<TypeRef>,
    /// Interfaces needing a dedicated dispatch wrapper on this type.
    pub exclusive: Vec<TypeRef>,
}

impl TypeInfo<'_> {
    pub fn kind(&self) -> TypeKind {
        self.decl.kind
    }

    pub fn is_value_type(&self) -> bool {
        self.decl.kind.is_value_type()
    }

    /// `.` for value types, `->` otherwise.
    pub fn member_access(&self) -> &'static str {
        if self.is_value_type() { "." } else { "->" }
    }

    /// ` *` for class/interface/delegate, empty for struct/enum.
    pub fn instance_postfix(&self) -> &'static str {
        if self.is_value_type() { "" } else { " *" }
    }
}

/// Index of all declarations visible to one unit.
#[derive(Debug)]
pub struct TypeTable<'a> {
    infos: HashMap<TypeKey, TypeInfo<'a>>,
    /// Unit types in input order.
    unit: Vec<TypeKey>,
}

impl<'a> TypeTable<'a> {
    /// Build the table for `assembly`. Types whose key is in `excluded` are neither translated nor indexed as unit
    /// members (they remain resolvable as references).
    pub fn new(assembly: &'a Assembly, excluded: &HashSet<String>) -> Self {
        let mut decls: Vec<(&'a TypeDecl, bool)> = Vec::new();
        for decl in well_known_interfaces() {
            decls.push((decl, false));
        }
        for decl in &assembly.references {
            decls.push((decl, false));
        }
        let mut unit = Vec::new();
        for decl in &assembly.types {
            let skip = excluded.contains(decl.key.as_str()) || is_synthetic(&decl.key);
            if !skip {
                unit.push(decl.key.clone());
            }
            decls.push((decl, !skip));
        }

        // Later entries win: unit types override references, references override the built-in shims.
        let by_key: HashMap<TypeKey, (&'a TypeDecl, bool)> =
            decls.into_iter().map(|(d, in_unit)| (d.key.clone(), (d, in_unit))).collect();

        let mut unions: HashMap<TypeKey, Vec<TypeRef>> = HashMap::new();
        for key in by_key.keys() {
            compute_union(key, &by_key, &mut unions, 0);
        }

        let mut infos = HashMap::new();
        for (key, (decl, in_unit)) in &by_key {
            let union = unions.get(key).cloned().unwrap_or_default();
            let exclusive = compute_exclusive(decl, &by_key, &unions);
            infos.insert(
                key.clone(),
                TypeInfo {
                    decl,
                    in_unit: *in_unit,
                    union,
                    exclusive,
                },
            );
        }

        Self { infos, unit }
    }

    /// Keys of the types to translate, in input order.
    pub fn unit_types(&self) -> &[TypeKey] {
        &self.unit
    }

    pub fn info(&self, key: &TypeKey) -> Option<&TypeInfo<'a>> {
        self.infos.get(key)
    }

    pub fn decl(&self, key: &TypeKey) -> Option<&'a TypeDecl> {
        self.infos.get(key).map(|i| i.decl)
    }

    /// Declaration behind a type reference, if it names a known type.
    pub fn decl_of(&self, ty: &TypeRef) -> Option<&'a TypeDecl> {
        ty.dereferenced().key().and_then(|k| self.decl(k))
    }

    pub fn is_in_unit(&self, key: &TypeKey) -> bool {
        self.infos.get(key).is_some_and(|i| i.in_unit)
    }

    pub fn classify(&self, ty: &TypeRef) -> TypeClass {
        if is_null_type(ty) {
            return TypeClass::Null;
        }
        match ty {
            TypeRef::GenericParam { .. } => TypeClass::GenericParam,
            TypeRef::Array { .. } => TypeClass::Array,
            TypeRef::Pointer { .. } => TypeClass::Pointer,
            TypeRef::Reference { .. } => TypeClass::ByRef,
            TypeRef::Named { key, .. } => {
                if let Some(id) = ty.primitive_id() {
                    return TypeClass::Primitive(id);
                }
                match self.decl(key).map(|d| d.kind) {
                    Some(TypeKind::Struct) => TypeClass::Struct,
                    Some(TypeKind::Interface) => TypeClass::Interface,
                    Some(TypeKind::Enum) => TypeClass::Enum,
                    Some(TypeKind::Delegate) => TypeClass::Delegate,
                    Some(TypeKind::Class) | None => TypeClass::Class,
                }
            }
        }
    }

    pub fn is_value_type(&self, ty: &TypeRef) -> bool {
        self.classify(ty).is_value_type()
    }

    pub fn is_interface(&self, ty: &TypeRef) -> bool {
        self.classify(ty) == TypeClass::Interface
    }

    pub fn is_enum(&self, ty: &TypeRef) -> bool {
        self.classify(ty) == TypeClass::Enum
    }

    /// ` *` for heap types, empty otherwise. Arrays and pointers already carry their indirection in the name.
    pub fn instance_postfix(&self, ty: &TypeRef) -> &'static str {
        match self.classify(ty) {
            TypeClass::Class | TypeClass::Interface | TypeClass::Delegate => " *",
            TypeClass::Primitive(PrimitiveId::String | PrimitiveId::Object) => " *",
            _ => "",
        }
    }

    /// Member-access token for a value of type `ty`.
    pub fn member_access(&self, ty: &TypeRef) -> &'static str {
        match self.classify(ty) {
            TypeClass::Struct | TypeClass::Enum => ".",
            TypeClass::Primitive(id) if primitives::info_for(id).is_value_type() => ".",
            _ => "->",
        }
    }

    /// Underlying integral type of an enum.
    pub fn enum_underlying(&self, ty: &TypeRef) -> TypeRef {
        self.decl_of(ty)
            .and_then(|d| d.enum_underlying.clone())
            .unwrap_or_else(TypeRef::int32)
    }

    /// Base type of an instantiated type, with the instantiation's arguments substituted.
    pub fn base_of(&self, ty: &TypeRef) -> Option<TypeRef> {
        let decl = self.decl_of(ty)?;
        decl.base.as_ref().map(|b| b.substitute(ty.args(), &[]))
    }

    /// Transitive interfaces of an instantiated type.
    pub fn union_of(&self, ty: &TypeRef) -> Vec<TypeRef> {
        let Some(info) = ty.key().and_then(|k| self.info(k)) else {
            return Vec::new();
        };
        info.union.iter().map(|i| i.substitute(ty.args(), &[])).collect()
    }

    /// Whether `ty` implements the interface named `iface` (directly, transitively, or by being it).
    pub fn implements(&self, ty: &TypeRef, iface: &str) -> bool {
        if ty.key().is_some_and(|k| k.as_str() == iface) {
            return true;
        }
        self.union_of(ty).iter().any(|i| i.key().is_some_and(|k| k.as_str() == iface))
    }

    /// The instantiated interface named `iface` among the interfaces of `ty`.
    pub fn find_interface(&self, ty: &TypeRef, iface: &str) -> Option<TypeRef> {
        if ty.key().is_some_and(|k| k.as_str() == iface) {
            return Some(ty.clone());
        }
        self.union_of(ty).into_iter().find(|i| i.key().is_some_and(|k| k.as_str() == iface))
    }

    /// Find a method by name and arity on `ty` or its base chain.
    ///
    /// Returns the declaring type (instantiated) with the method.
    pub fn find_method(&self, ty: &TypeRef, name: &str, arity: usize) -> Option<(TypeRef, &'a MethodDecl)> {
        let mut current = Some(ty.clone());
        let mut depth = 0;
        while let Some(t) = current {
            if depth > MAX_INHERITANCE_DEPTH {
                break;
            }
            if let Some(decl) = self.decl_of(&t) {
                if let Some(m) = decl.methods.iter().find(|m| m.name == name && m.params.len() == arity) {
                    return Some((t, m));
                }
            }
            current = self.base_of(&t);
            depth += 1;
        }
        None
    }

    /// A public, non-static, parameterless method declared directly on `ty` (no base lookup).
    pub fn own_public_method(&self, ty: &TypeRef, name: &str) -> Option<&'a MethodDecl> {
        self.decl_of(ty)?.methods.iter().find(|m| {
            m.name == name && !m.is_static && m.params.is_empty() && m.visibility == Visibility::Public
        })
    }

    /// A user-defined operator `op_name(a, b)` declared on `ty`.
    pub fn find_operator(&self, ty: &TypeRef, op_name: &str) -> Option<&'a MethodDecl> {
        self.decl_of(ty)?
            .methods
            .iter()
            .find(|m| m.is_static && m.name == op_name && m.params.len() == 2)
    }

    /// Whether a type declares a parameterless instance constructor.
    pub fn has_default_constructor(&self, decl: &TypeDecl) -> bool {
        decl.methods
            .iter()
            .any(|m| m.kind == MethodKind::Constructor && m.params.is_empty())
    }
}

/// `<Module>` and `<PrivateImplementationDetails>` are compiler artifacts and never translated.
pub fn is_synthetic(key: &TypeKey) -> bool {
    let name = key.as_str();
    name == "<Module>" || name.starts_with("<PrivateImplementationDetails>")
}

fn compute_union(
    key: &TypeKey,
    decls: &HashMap<TypeKey, (&TypeDecl, bool)>,
    unions: &mut HashMap<TypeKey, Vec<TypeRef>>,
    depth: usize,
) -> Vec<TypeRef> {
    if let Some(done) = unions.get(key) {
        return done.clone();
    }
    let Some((decl, _)) = decls.get(key) else {
        return Vec::new();
    };
    if depth > MAX_INHERITANCE_DEPTH {
        return Vec::new();
    }

    let mut out: Vec<TypeRef> = Vec::new();
    let push = |out: &mut Vec<TypeRef>, t: TypeRef| {
        if !out.contains(&t) {
            out.push(t);
        }
    };
    if let Some(base) = &decl.base {
        if let Some(base_key) = base.key() {
            for i in compute_union(base_key, decls, unions, depth + 1) {
                push(&mut out, i.substitute(base.args(), &[]));
            }
        }
    }
    for iface in &decl.interfaces {
        push(&mut out, iface.clone());
        if let Some(iface_key) = iface.key() {
            for i in compute_union(iface_key, decls, unions, depth + 1) {
                push(&mut out, i.substitute(iface.args(), &[]));
            }
        }
    }
    unions.insert(key.clone(), out.clone());
    out
}

fn compute_exclusive(
    decl: &TypeDecl,
    decls: &HashMap<TypeKey, (&TypeDecl, bool)>,
    unions: &HashMap<TypeKey, Vec<TypeRef>>,
) -> Vec<TypeRef> {
    let instantiated_union = |t: &TypeRef| -> Vec<TypeRef> {
        t.key()
            .filter(|k| decls.contains_key(*k))
            .and_then(|k| unions.get(k))
            .map(|u| u.iter().map(|i| i.substitute(t.args(), &[])).collect())
            .unwrap_or_default()
    };

    let mut out: Vec<TypeRef> = Vec::new();
    for iface in &decl.interfaces {
        for t in std::iter::once(iface.clone()).chain(instantiated_union(iface)) {
            if !out.contains(&t) {
                out.push(t);
            }
        }
    }
    out
}

/// Collection and disposal interfaces the statement translator relies on, used when the unit does not supply them.
pub fn well_known_interfaces() -> &'static [TypeDecl] {
    static SHIMS: OnceLock<Vec<TypeDecl>> = OnceLock::new();
    SHIMS.get_or_init(|| {
        let t = || TypeRef::type_param("T", 0);
        let abstract_method = |name: &str| MethodDecl::new(name).abstract_();
        vec![
            TypeDecl::new("System.IDisposable", TypeKind::Interface).with_method(abstract_method("Dispose")),
            TypeDecl::new("System.Collections.IEnumerator", TypeKind::Interface)
                .with_method(abstract_method("MoveNext").returning(TypeRef::boolean()))
                .with_method(
                    abstract_method("get_Current")
                        .with_kind(MethodKind::Getter)
                        .returning(TypeRef::object()),
                )
                .with_method(abstract_method("Reset")),
            TypeDecl::new("System.Collections.IEnumerable", TypeKind::Interface).with_method(
                abstract_method("GetEnumerator").returning(TypeRef::named("System.Collections.IEnumerator")),
            ),
            TypeDecl::new("System.Collections.Generic.IEnumerator`1", TypeKind::Interface)
                .with_generic_params(&["T"])
                .with_interface(TypeRef::named("System.IDisposable"))
                .with_interface(TypeRef::named("System.Collections.IEnumerator"))
                .with_method(abstract_method("get_Current").with_kind(MethodKind::Getter).returning(t())),
            TypeDecl::new("System.Collections.Generic.IEnumerable`1", TypeKind::Interface)
                .with_generic_params(&["T"])
                .with_interface(TypeRef::named("System.Collections.IEnumerable"))
                .with_method(abstract_method("GetEnumerator").returning(TypeRef::generic(
                    "System.Collections.Generic.IEnumerator`1",
                    vec![t()],
                ))),
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface(name: &str) -> TypeDecl {
        TypeDecl::new(name, TypeKind::Interface)
    }

    #[test]
    fn test_union_and_exclusive_sets() {
        let asm = Assembly::new("App")
            .with_type(iface("App.IA"))
            .with_type(iface("App.IB").with_interface(TypeRef::named("App.IA")))
            .with_type(iface("App.IC"))
            .with_type(TypeDecl::new("App.Base", TypeKind::Class).with_interface(TypeRef::named("App.IC")))
            .with_type(
                TypeDecl::new("App.Derived", TypeKind::Class)
                    .with_base(TypeRef::named("App.Base"))
                    .with_interface(TypeRef::named("App.IB"))
                    .with_interface(TypeRef::named("App.IA"))
                    .with_interface(TypeRef::named("App.IC")),
            );
        let table = TypeTable::new(&asm, &HashSet::new());
        let derived = table.info(&TypeKey::new("App.Derived")).unwrap();
        assert_eq!(
            derived.union,
            vec![TypeRef::named("App.IC"), TypeRef::named("App.IB"), TypeRef::named("App.IA")]
        );
        // Declared interfaces and what they imply, even when the base already has them.
        assert_eq!(
            derived.exclusive,
            vec![TypeRef::named("App.IB"), TypeRef::named("App.IA"), TypeRef::named("App.IC")]
        );
        let base = table.info(&TypeKey::new("App.Base")).unwrap();
        assert_eq!(base.exclusive, vec![TypeRef::named("App.IC")]);
    }

    #[test]
    fn test_generic_union_is_substituted() {
        let asm = Assembly::new("App").with_type(
            TypeDecl::new("App.Bag`1", TypeKind::Class)
                .with_generic_params(&["T"])
                .with_interface(TypeRef::generic(
                    "System.Collections.Generic.IEnumerable`1",
                    vec![TypeRef::type_param("T", 0)],
                )),
        );
        let table = TypeTable::new(&asm, &HashSet::new());
        let bag_of_int = TypeRef::generic("App.Bag`1", vec![TypeRef::int32()]);
        let found = table.find_interface(&bag_of_int, "System.Collections.Generic.IEnumerable`1");
        assert_eq!(
            found,
            Some(TypeRef::generic("System.Collections.Generic.IEnumerable`1", vec![TypeRef::int32()]))
        );
        assert!(table.implements(&bag_of_int, "System.Collections.IEnumerable"));
    }

    #[test]
    fn test_classification() {
        let asm = Assembly::new("App")
            .with_type(TypeDecl::new("App.P", TypeKind::Struct))
            .with_type(TypeDecl::new("App.E", TypeKind::Enum));
        let table = TypeTable::new(&asm, &HashSet::new());
        assert_eq!(table.classify(&TypeRef::named("App.P")), TypeClass::Struct);
        assert!(table.is_value_type(&TypeRef::named("App.E")));
        assert!(!table.is_value_type(&TypeRef::string()));
        assert_eq!(table.instance_postfix(&TypeRef::named("App.Unknown")), " *");
        assert_eq!(table.instance_postfix(&TypeRef::int32()), "");
        assert_eq!(table.member_access(&TypeRef::named("App.P")), ".");
    }

    #[test]
    fn test_exclusions_and_synthetic_types() {
        let asm = Assembly::new("App")
            .with_type(TypeDecl::new("<Module>", TypeKind::Class))
            .with_type(TypeDecl::new("App.Keep", TypeKind::Class))
            .with_type(TypeDecl::new("App.Skip", TypeKind::Class));
        let excluded: HashSet<String> = ["App.Skip".to_string()].into_iter().collect();
        let table = TypeTable::new(&asm, &excluded);
        assert_eq!(table.unit_types(), &[TypeKey::new("App.Keep")]);
        assert!(table.decl(&TypeKey::new("App.Skip")).is_some());
        assert!(!table.is_in_unit(&TypeKey::new("App.Skip")));
    }
}
