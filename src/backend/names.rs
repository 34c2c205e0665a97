//! Type-name resolution: canonical C++ spellings for managed type references.
//!
//! Resolution is a pure function of the [`TypeRef`], the [`TypeTable`] (for kinds), and the method generic bindings
//! currently in scope.
//!
//! ## Notes
//!
//! - Namespaces: `NS.Sub` → `::NS::Sub::`.
//! - Nesting flattens into one identifier: `Outer`1+Inner` → `Outer__G1__Inner__G1`. Every segment of a generic
//!   chain carries `__G<n>` (`n` = parameters in scope at that level) so a generic nested type never collides with
//!   a non-generic one of the same name.
//! - Instantiation: `Name__G1<A >`, or `Name__G2<__W2__(A, B) >` so the argument list survives macro expansion.
//!   Heap-type arguments carry their ` *`.
//! - Arrays: `::System::Array__G< E > *`. Pointers append ` *`, references `&`.
//!
//! ## Examples
//! ```text
//! NS.Dictionary`2<System.String, NS.Item>  →  ::NS::Dictionary__G2<__W2__(::System::String *, ::NS::Item *) >
//! System.Int32[]                           →  ::System::Array__G< ::System::Int32 > *
//! ```

use nativize_core::lang::cpp_keywords::{safe_full_name, safe_name, sanitize_extended};
use nativize_core::lang::runtime;
use nativize_model::{GenericOwner, ParamMode, TypeKey, TypeRef};

use super::type_table::TypeTable;

/// Name resolver bound to a type table and the active method generic bindings.
#[derive(Clone, Copy)]
pub struct Names<'t, 'a> {
    table: &'t TypeTable<'a>,
    /// Innermost binding last.
    method_bindings: &'t [Vec<TypeRef>],
    /// Prefix dependent generic names with `typename`.
    typename: bool,
}

impl<'t, 'a> Names<'t, 'a> {
    pub fn new(table: &'t TypeTable<'a>) -> Self {
        Self {
            table,
            method_bindings: &[],
            typename: false,
        }
    }

    pub fn with_bindings(mut self, bindings: &'t [Vec<TypeRef>]) -> Self {
        self.method_bindings = bindings;
        self
    }

    /// Enable `typename` prefixes (inside generic declarations).
    pub fn with_typename(mut self, typename: bool) -> Self {
        self.typename = typename;
        self
    }

    /// Namespace path of a type, each segment keyword-safe.
    pub fn namespace_path(key: &TypeKey) -> Vec<String> {
        match key.namespace() {
            Some(ns) if !ns.starts_with('<') => safe_full_name(&ns.replace('.', "::"))
                .split("::")
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Flattened declaration name without namespace: `Outer__G1__Inner__G1`.
    pub fn declaration_name(key: &TypeKey) -> String {
        let segments = key.segments();
        let mut out = String::new();
        let mut arity = 0;
        let last = segments.len().saturating_sub(1);
        for (i, seg) in segments.iter().enumerate() {
            arity += seg.arity;
            out.push_str(&sanitize_extended(seg.name));
            if arity > 0 {
                out.push_str(&format!("__G{}", arity));
            }
            if i != last {
                out.push_str("__");
            }
        }
        safe_name(&out)
    }

    /// Fully scoped definition name without generic arguments: `::NS::Outer__G1__Inner__G1`.
    pub fn full_name(key: &TypeKey) -> String {
        let mut out = String::from("::");
        for ns in Self::namespace_path(key) {
            out.push_str(&ns);
            out.push_str("::");
        }
        out.push_str(&Self::declaration_name(key));
        out
    }

    /// Bare C++ type name (no instance postfix).
    pub fn type_name(&self, ty: &TypeRef) -> String {
        let name = self.raw_type_name(ty);
        if self.typename && ty.contains_generic_param() && name.contains('<') && !ty.is_pointer() {
            format!("typename {}", name)
        } else {
            name
        }
    }

    fn raw_type_name(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Named { key, args } => {
                if let Some(id) = ty.primitive_id() {
                    return nativize_core::lang::primitives::info_for(id).cpp_name.to_string();
                }
                let mut out = Self::full_name(key);
                if !args.is_empty() {
                    out.push_str(&self.argument_list(args));
                }
                out
            }
            TypeRef::GenericParam { name, position, owner } => {
                if *owner == GenericOwner::Method {
                    if let Some(bound) = self.method_bindings.last().and_then(|b| b.get(*position)) {
                        // A body binds its own parameters to themselves.
                        if bound != ty {
                            return self.raw_type_name(bound);
                        }
                    }
                }
                safe_name(name)
            }
            TypeRef::Array { element, .. } => {
                format!("{}< {} > *", runtime::ARRAY_TYPE, self.declared(element))
            }
            TypeRef::Pointer { element } => format!("{} *", self.declared(element)),
            TypeRef::Reference { element } => format!("{}&", self.declared(element)),
        }
    }

    /// Type as written in a declaration: bare name plus the instance postfix.
    pub fn type_decl(&self, ty: &TypeRef) -> String {
        format!("{}{}", self.type_name(ty), self.table.instance_postfix(ty))
    }

    fn declared(&self, ty: &TypeRef) -> String {
        format!("{}{}", self.raw_type_name(ty), self.table.instance_postfix(ty))
    }

    /// `<A >` / `<__W2__(A, B) >` argument list with the `__G<n>` marker already on the name.
    fn argument_list(&self, args: &[TypeRef]) -> String {
        let rendered: Vec<String> = args.iter().map(|a| self.declared(a)).collect();
        if rendered.len() > 1 {
            format!("<__W{}__({}) >", rendered.len(), rendered.join(", "))
        } else {
            format!("<{} >", rendered.join(", "))
        }
    }

    /// Generic method name: `Name__G<n><args >`.
    pub fn method_name(&self, name: &str, generic_args: &[TypeRef]) -> String {
        let base = sanitize_extended(name);
        if generic_args.is_empty() {
            return base;
        }
        format!("{}__G{}{}", base, generic_args.len(), self.argument_list(generic_args))
    }

    /// Parameter type: by-ref parameters are passed by address (`T *`, `T * *` for heap types).
    pub fn param_type(&self, ty: &TypeRef, mode: ParamMode) -> String {
        let element = ty.dereferenced();
        if mode.is_by_ref() || matches!(ty, TypeRef::Reference { .. }) {
            format!("{} *", self.type_decl(element))
        } else {
            self.type_decl(element)
        }
    }

    /// `template <typename T, typename U >` for the given parameter names.
    pub fn template_header(params: &[String]) -> String {
        let params: Vec<String> = params.iter().map(|p| format!("typename {}", safe_name(p))).collect();
        format!("template <{} >", params.join(", "))
    }

    /// Scope for static member access. Primitives and generic parameters go through `BaseTypeWrapper<T >`.
    pub fn static_scope(&self, ty: &TypeRef) -> String {
        if ty.is_generic_param() || ty.primitive_id().is_some() {
            format!("{}<{} >", runtime::GEN_BASE_TYPE_WRAPPER, self.raw_type_name(ty))
        } else {
            self.raw_type_name(ty)
        }
    }

    /// Name of a user-defined conversion operator, mangled with its return type so overloads that differ only
    /// by return type stay distinct: `op_Implicit` returning `NS.Money` → `op_Implicit__NS__Money`.
    pub fn conversion_method_name(&self, name: &str, return_type: &TypeRef) -> String {
        let mangled = match return_type.key() {
            Some(key) if return_type.primitive_id().is_none() => Self::full_name(key),
            _ => self.raw_type_name(return_type),
        };
        let mangled = mangled.replace("::", "__").replace(" *", "__P__").replace('&', "__R__");
        safe_name(&format!("{}{}", name, sanitize_extended(&mangled)))
    }

    /// The table this resolver reads kinds from.
    pub fn table(&self) -> &'t TypeTable<'a> {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use nativize_model::{Assembly, TypeDecl, TypeKind};

    use super::*;

    fn with_table<R>(f: impl FnOnce(Names<'_, '_>) -> R) -> R {
        let asm = Assembly::new("App")
            .with_type(TypeDecl::new("NS.Item", TypeKind::Class))
            .with_type(TypeDecl::new("NS.Point", TypeKind::Struct));
        let table = TypeTable::new(&asm, &HashSet::new());
        f(Names::new(&table))
    }

    #[test]
    fn test_full_names() {
        assert_eq!(Names::full_name(&TypeKey::new("NS.Sub.Widget")), "::NS::Sub::Widget");
        assert_eq!(Names::full_name(&TypeKey::new("Program")), "::Program");
        assert_eq!(Names::full_name(&TypeKey::new("NS.Outer+Inner")), "::NS::Outer__Inner");
        assert_eq!(Names::full_name(&TypeKey::new("NS.Outer`1+Inner")), "::NS::Outer__G1__Inner__G1");
        assert_eq!(Names::full_name(&TypeKey::new("NS.Outer`1+Inner`2")), "::NS::Outer__G1__Inner__G3");
    }

    #[test]
    fn test_keyword_namespaces_are_escaped() {
        assert_eq!(Names::full_name(&TypeKey::new("App.delete.Thing")), "::App::__delete__::Thing");
    }

    #[test]
    fn test_instantiations() {
        with_table(|names| {
            let one = TypeRef::generic("NS.Box`1", vec![TypeRef::named("NS.Item")]);
            assert_eq!(names.type_name(&one), "::NS::Box__G1<::NS::Item * >");
            let two = TypeRef::generic("NS.Pair`2", vec![TypeRef::int32(), TypeRef::named("NS.Point")]);
            assert_eq!(names.type_name(&two), "::NS::Pair__G2<__W2__(::System::Int32, ::NS::Point) >");
            assert_eq!(names.type_decl(&two), "::NS::Pair__G2<__W2__(::System::Int32, ::NS::Point) > *");
        });
    }

    #[test]
    fn test_arrays_and_pointers() {
        with_table(|names| {
            assert_eq!(
                names.type_name(&TypeRef::array(TypeRef::string())),
                "::System::Array__G< ::System::String * > *"
            );
            assert_eq!(names.type_decl(&TypeRef::pointer(TypeRef::int32())), "::System::Int32 *");
            assert_eq!(names.param_type(&TypeRef::named("NS.Item"), ParamMode::Out), "::NS::Item * *");
            assert_eq!(names.param_type(&TypeRef::int32(), ParamMode::Ref), "::System::Int32 *");
        });
    }

    #[test]
    fn test_method_bindings() {
        with_table(|names| {
            let bindings = vec![vec![TypeRef::string()]];
            let bound = names.with_bindings(&bindings);
            assert_eq!(bound.type_name(&TypeRef::method_param("U", 0)), "::System::String");
            assert_eq!(names.type_name(&TypeRef::method_param("U", 0)), "U");
            assert_eq!(names.method_name("Map", &[TypeRef::int32()]), "Map__G1<::System::Int32 >");
        });
    }

    #[test]
    fn test_static_scope_and_conversions() {
        with_table(|names| {
            assert_eq!(
                names.static_scope(&TypeRef::int32()),
                "CrossNetRuntime::BaseTypeWrapper<::System::Int32 >"
            );
            assert_eq!(names.static_scope(&TypeRef::named("NS.Item")), "::NS::Item");
            assert_eq!(
                names.conversion_method_name("op_Implicit", &TypeRef::named("NS.Point")),
                "op_Implicit__NS__Point"
            );
            assert_eq!(
                names.conversion_method_name("op_Explicit", &TypeRef::int32()),
                "op_Explicit__System__Int32"
            );
        });
    }

    #[test]
    fn test_typename_prefix() {
        with_table(|names| {
            let dependent = TypeRef::generic("NS.Box`1", vec![TypeRef::type_param("T", 0)]);
            assert_eq!(names.with_typename(true).type_name(&dependent), "typename ::NS::Box__G1<T >");
            assert_eq!(names.with_typename(true).type_name(&TypeRef::int32()), "::System::Int32");
        });
    }
}
