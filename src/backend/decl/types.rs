//! Class shape: header, fields, factories, GC trace and static constructor bookkeeping.
//!
//! Classes, structs and interfaces go through [`Translator::emit_class`]. The pieces of the class body are
//! collected in a [`TypeParts`] and assembled once every member is known, because translating a method body
//! can add a closure carrier to the nested section.

use nativize_core::lang::primitives::{PrimitiveCategory, PrimitiveId, info_for};
use nativize_core::lang::runtime;
use nativize_model::{Block, Expr, FieldDecl, MethodDecl, MethodKind, TypeDecl, TypeKind, TypeRef};

use super::super::Translator;
use super::super::emitter::CppEmitter;
use super::super::errors::TranslateResult;
use super::super::local_name;
use super::super::names::Names;
use super::super::output::TypeText;
use super::super::state::LedgerEntry;
use super::super::type_table::{TypeClass, TypeTable};
use super::enums::raw_integral;
use super::members::method_context;
use super::{TypeScope, emit_member, in_namespaces};

/// Sections of a class body under construction.
pub(super) struct TypeParts {
    /// Nested classes: interface wrappers and closure carriers.
    pub nested: CppEmitter,
    /// Member declarations and inline definitions.
    pub members: CppEmitter,
    pub fields: CppEmitter,
    /// Out-of-line definitions for the method stream.
    pub out_of_line: CppEmitter,
    /// Definitions following the class in the definition stream (template statics).
    pub tail: CppEmitter,
}

impl TypeParts {
    pub fn new(indent: usize) -> Self {
        let e = CppEmitter::with_indent(indent);
        Self {
            nested: e.sibling(),
            members: e.sibling(),
            fields: e.sibling(),
            out_of_line: e.sibling(),
            tail: e,
        }
    }
}

/// Whether a field is an integral compile-time constant, emitted as `static const T Name = v;`.
pub(super) fn is_inline_constant(field: &FieldDecl) -> bool {
    if !field.is_static {
        return false;
    }
    let integral = field.ty.primitive_id().is_some_and(|id| {
        matches!(
            info_for(id).category,
            PrimitiveCategory::Boolean
                | PrimitiveCategory::Char
                | PrimitiveCategory::SignedInteger
                | PrimitiveCategory::UnsignedInteger
        ) && id != PrimitiveId::IntPtr
            && id != PrimitiveId::UIntPtr
    });
    integral && field.constant.as_ref().and_then(raw_integral).is_some()
}

/// Value a static field receives in the static constructor: its initializer, or its constant when the constant
/// cannot be written inline.
pub(super) fn static_initializer(field: &FieldDecl) -> Option<Expr> {
    if !field.is_static || is_inline_constant(field) {
        return None;
    }
    field
        .initializer
        .clone()
        .or_else(|| field.constant.clone().map(Expr::literal))
}

/// Fields that are emitted: event backing fields are replaced by the event itself.
pub(super) fn emitted_fields(decl: &TypeDecl) -> impl Iterator<Item = &FieldDecl> {
    decl.fields
        .iter()
        .filter(move |f| !decl.events.iter().any(|e| e.name == f.name))
}

/// GC trace statement for a slot of type `ty`, if the slot can hold references.
pub(super) fn trace_statement(table: &TypeTable<'_>, ty: &TypeRef, slot: &str) -> Option<String> {
    match table.classify(ty) {
        TypeClass::Struct => Some(format!("{}.{}(currentMark);", slot, runtime::TRACE)),
        TypeClass::Class | TypeClass::Interface | TypeClass::Delegate | TypeClass::Array => {
            Some(format!("{}({}, currentMark);", runtime::GC_TRACE, slot))
        }
        TypeClass::Primitive(PrimitiveId::String | PrimitiveId::Object) => {
            Some(format!("{}({}, currentMark);", runtime::GC_TRACE, slot))
        }
        TypeClass::GenericParam => Some(format!("{}(currentMark, {});", runtime::TRACER_DO_TRACE, slot)),
        _ => None,
    }
}

impl<'t, 'a> Translator<'t, 'a> {
    /// Emit a class, struct or interface.
    pub(super) fn emit_class(&mut self, decl: &TypeDecl) -> TranslateResult<TypeText> {
        let scope = TypeScope::new(decl);
        let mut parts = TypeParts::new(self.config.indent);

        if decl.kind == TypeKind::Interface {
            for m in decl.methods.iter().filter(|m| !m.is_static) {
                self.emit_interface_method(&scope, m, &mut parts);
            }
            self.emit_interface_map(&scope, &mut parts);
        } else {
            self.emit_wrappers(&scope, &mut parts);
            if decl.kind == TypeKind::Struct {
                self.emit_struct_support(&scope, &mut parts);
            }
            for m in &decl.methods {
                self.emit_method(&scope, m, &mut parts)?;
            }
            if let Some(synthesized) = synthesized_static_constructor(decl) {
                self.emit_method(&scope, &synthesized, &mut parts)?;
            }
            if decl.kind == TypeKind::Class && !decl.is_abstract {
                self.emit_factories(&scope, &mut parts);
            }
            self.emit_trace(&scope, &mut parts);
            self.emit_interface_map(&scope, &mut parts);
            let has_static_ctor = decl.methods.iter().any(|m| m.kind == MethodKind::StaticConstructor)
                || synthesized_static_constructor(decl).is_some();
            if has_static_ctor && !scope.generic {
                let call = format!("{}::{}();", scope.full_name, runtime::STATIC_CTOR);
                self.unit.static_ctors.push(LedgerEntry::new(&decl.key, call));
            }
        }
        self.emit_fields(&scope, &mut parts);

        Ok(self.assemble(&scope, parts))
    }

    /// Forward declaration, class body and tail, each in the type's namespaces.
    fn assemble(&self, scope: &TypeScope<'_>, parts: TypeParts) -> TypeText {
        let indent = self.config.indent;
        let keyword = if scope.value_type { "struct" } else { "class" };
        let template = scope.template_header();

        let mut forward = CppEmitter::with_indent(indent);
        if let Some(t) = &template {
            forward.line(t);
        }
        forward.line(&format!("{} {};", keyword, scope.name));

        let mut class = CppEmitter::with_indent(indent);
        if let Some(t) = &template {
            class.line(t);
        }
        let header = format!("{} {} : public {}", keyword, scope.name, self.parent_name(scope));
        let identity = match (scope.generic, scope.decl.kind) {
            (false, _) => runtime::DYNAMIC_ID_MACRO,
            (true, TypeKind::Interface) => runtime::MULTIPLE_DYNAMIC_INTERFACE_ID_MACRO,
            (true, _) => runtime::MULTIPLE_DYNAMIC_OBJECT_ID_MACRO,
        };
        class.class_block(&header, |e| {
            e.line(identity);
            if !parts.nested.is_empty() {
                e.line("public:");
                e.append(&parts.nested);
            }
            e.line("public:");
            e.append(&parts.members);
            if !parts.fields.is_empty() {
                e.line("public:");
                e.append(&parts.fields);
            }
        });
        if !parts.tail.is_empty() {
            class.append(&parts.tail);
        }

        TypeText {
            key: scope.decl.key.clone(),
            declaration: in_namespaces(&scope.decl.key, forward.as_str(), indent),
            definition: in_namespaces(&scope.decl.key, class.as_str(), indent),
            methods: parts.out_of_line.finish(),
        }
    }

    /// What the class derives from.
    fn parent_name(&self, scope: &TypeScope<'_>) -> String {
        match scope.decl.kind {
            TypeKind::Interface => runtime::INTERFACE_BASE.to_string(),
            TypeKind::Struct | TypeKind::Enum => runtime::BASE_STRUCT.to_string(),
            TypeKind::Class | TypeKind::Delegate => match &scope.decl.base {
                Some(base) => Names::new(self.table).type_name(base),
                None => runtime::OBJECT_TYPE.to_string(),
            },
        }
    }

    fn emit_fields(&mut self, scope: &TypeScope<'_>, parts: &mut TypeParts) {
        let names = Names::new(self.table).with_typename(scope.generic);
        for field in emitted_fields(scope.decl) {
            let ty = names.type_decl(&field.ty);
            let name = local_name(&field.name);
            if is_inline_constant(field) {
                if let Some(value) = field.constant.as_ref().and_then(raw_integral) {
                    parts.fields.line(&format!("static const {} {} = {};", ty, name, value));
                }
                continue;
            }
            if !field.is_static {
                parts.fields.line(&format!("{} {};", ty, name));
                continue;
            }
            parts.fields.line(&format!("static {} {};", ty, name));
            self.define_static(scope, &ty, &name, parts);
        }
        for event in &scope.decl.events {
            let ty = names.type_decl(&event.ty);
            let name = local_name(&event.name);
            if event.is_static {
                parts.fields.line(&format!("static {} {};", ty, name));
                self.define_static(scope, &ty, &name, parts);
            } else {
                parts.fields.line(&format!("{} {};", ty, name));
            }
        }
    }

    /// Storage of a static data member: out of line, or after the class for templates.
    fn define_static(&self, scope: &TypeScope<'_>, ty: &str, name: &str, parts: &mut TypeParts) {
        if scope.generic {
            if let Some(t) = scope.template_header() {
                parts.tail.line(&t);
            }
            let owner = Names::new(self.table).type_name(&scope.self_ty);
            parts.tail.line(&format!("{} {}::{};", ty, owner, name));
        } else {
            parts.out_of_line.line(&format!("{} {}::{};", ty, scope.qualified, name));
            parts.out_of_line.blank_line();
        }
    }

    /// Value-type support: default constructor, constructor forwarders, `operator->`, and the object methods
    /// a struct inherits from `ValueType`.
    fn emit_struct_support(&mut self, scope: &TypeScope<'_>, parts: &mut TypeParts) {
        let e = &mut parts.members;
        e.line(runtime::VALUE_TYPE_NEW_DELETE);
        e.line(&format!("{}()", scope.name));
        e.line("{");
        e.indent();
        e.line(&format!("{}(this, sizeof(*this));", runtime::MEMCLEAR));
        e.dedent();
        e.line("}");

        for ctor in scope
            .decl
            .methods
            .iter()
            .filter(|m| m.kind == MethodKind::Constructor && !m.params.is_empty())
        {
            let cx = method_context(scope, ctor);
            let params = self.param_list(&cx, &ctor.params);
            let args: Vec<String> = ctor.params.iter().map(|p| local_name(&p.name)).collect();
            let e = &mut parts.members;
            e.line(&format!("{}({})", scope.name, params));
            e.line("{");
            e.indent();
            e.line(&format!("{}({});", runtime::CTOR, args.join(", ")));
            e.dedent();
            e.line("}");
        }

        let e = &mut parts.members;
        e.line(&format!("{} * operator->()", scope.name));
        e.line("{");
        e.indent();
        e.line("return (this);");
        e.dedent();
        e.line("}");

        let declares = |name: &str, arity: usize| {
            scope
                .decl
                .methods
                .iter()
                .any(|m| m.name == name && !m.is_static && m.params.len() == arity)
        };
        let defaults = [
            ("ToString", 0, format!("{} *", runtime::STRING_TYPE), String::new(), runtime::STRUCT_TO_STRING, "this"),
            (
                "Equals",
                1,
                "::System::Boolean".to_string(),
                format!("{} * obj", runtime::OBJECT_TYPE),
                runtime::STRUCT_EQUALS,
                "this, obj",
            ),
            ("GetHashCode", 0, "::System::Int32".to_string(), String::new(), runtime::STRUCT_GET_HASH_CODE, "this"),
        ];
        for (name, arity, ret, params, helper, args) in defaults {
            if declares(name, arity) {
                continue;
            }
            e.line(&format!("{} {}({})", ret, name, params));
            e.line("{");
            e.indent();
            e.line(&format!("return ({}({}));", helper, args));
            e.dedent();
            e.line("}");
        }
    }

    /// `__Create__` factories, one per constructor, plus a parameterless one when none is declared.
    fn emit_factories(&mut self, scope: &TypeScope<'_>, parts: &mut TypeParts) {
        let ctors: Vec<&MethodDecl> = scope
            .decl
            .methods
            .iter()
            .filter(|m| m.kind == MethodKind::Constructor)
            .collect();
        let default_ctor = MethodDecl::constructor();
        let mut factories: Vec<(&MethodDecl, bool)> = ctors.iter().map(|c| (*c, true)).collect();
        if !self.table.has_default_constructor(scope.decl) {
            factories.push((&default_ctor, false));
        }

        for (ctor, calls_ctor) in factories {
            let cx = method_context(scope, ctor);
            let params = self.param_list(&cx, &ctor.params);
            let args: Vec<String> = ctor.params.iter().map(|p| local_name(&p.name)).collect();

            let mut body = CppEmitter::with_indent(self.config.indent);
            body.block("", |e| {
                e.line(&format!("{} * __temp__ = new {}();", scope.name, scope.name));
                e.line(&format!(
                    "__temp__->{} = {}();",
                    runtime::INTERFACE_MAP_FIELD,
                    runtime::GET_INTERFACE_MAP
                ));
                if calls_ctor {
                    e.line(&format!("__temp__->{}({});", runtime::CTOR, args.join(", ")));
                }
                e.line("return (__temp__);");
            });

            let declaration = format!("static {} * {}({})", scope.name, runtime::CREATE, params);
            let header = format!("{} * {}::{}({})", scope.full_name, scope.qualified, runtime::CREATE, params);
            emit_member(
                &mut parts.members,
                &mut parts.out_of_line,
                scope.generic,
                &declaration,
                &header,
                body.as_str(),
            );
        }
    }

    /// `__Trace__` over the instance fields; static reference fields go to the unit-wide trace.
    fn emit_trace(&mut self, scope: &TypeScope<'_>, parts: &mut TypeParts) {
        let table = self.table;
        let mut lines = Vec::new();
        if scope.decl.kind == TypeKind::Class {
            if let Some(base) = scope.decl.base.as_ref().filter(|b| !b.is_primitive(PrimitiveId::Object)) {
                lines.push(format!("{}::{}(currentMark);", Names::new(table).type_name(base), runtime::TRACE));
            }
        }
        let instance_slots = emitted_fields(scope.decl)
            .filter(|f| !f.is_static)
            .map(|f| (&f.ty, &f.name))
            .chain(scope.decl.events.iter().filter(|e| !e.is_static).map(|e| (&e.ty, &e.name)));
        for (ty, name) in instance_slots {
            if let Some(line) = trace_statement(table, ty, &local_name(name)) {
                lines.push(line);
            }
        }

        if !scope.generic {
            let static_slots = emitted_fields(scope.decl)
                .filter(|f| f.is_static && !is_inline_constant(f))
                .map(|f| (&f.ty, &f.name))
                .chain(scope.decl.events.iter().filter(|e| e.is_static).map(|e| (&e.ty, &e.name)));
            for (ty, name) in static_slots {
                let slot = format!("{}::{}", scope.full_name, local_name(name));
                if let Some(line) = trace_statement(table, ty, &slot) {
                    self.unit.assembly_trace.push(LedgerEntry::new(&scope.decl.key, line));
                }
            }
        }

        let mut body = CppEmitter::with_indent(self.config.indent);
        body.block("", |e| {
            for line in &lines {
                e.line(line);
            }
        });
        let virtual_ = if scope.value_type { "" } else { "virtual " };
        let declaration = format!("{}void {}(unsigned char currentMark)", virtual_, runtime::TRACE);
        let header = format!("void {}::{}(unsigned char currentMark)", scope.qualified, runtime::TRACE);
        emit_member(
            &mut parts.members,
            &mut parts.out_of_line,
            scope.generic,
            &declaration,
            &header,
            body.as_str(),
        );
    }
}

/// A static constructor to emit when the type declares none: static initializers need one, and generic types
/// always get one so their constructors can call it.
pub(super) fn synthesized_static_constructor(decl: &TypeDecl) -> Option<MethodDecl> {
    if decl.methods.iter().any(|m| m.kind == MethodKind::StaticConstructor) {
        return None;
    }
    let needs_one = decl.is_generic() || emitted_fields(decl).any(|f| static_initializer(f).is_some());
    needs_one.then(|| MethodDecl::static_constructor().with_body(Block::default()))
}
