//! Capture analysis and closure carrier classes.
//!
//! A method containing anonymous methods gets one carrier class, nested in the declaring type. The carrier holds
//! every captured parameter and local, plus `__this__`, and each anonymous method becomes one of its member
//! functions. The enclosing method creates the carrier up front and reads and writes captured variables through
//! it, so the enclosing method and every anonymous method share one copy.
//!
//! ## Notes
//!
//! - By-ref parameters are never captured; the carrier cannot outlive what they point at.
//! - Value types do not capture `this`: a struct's `this` is not a GC reference.
//! - The carrier is templated only on the declaring type's parameters. Captures typed by a method's own generic
//!   parameters render that parameter's name unbound.

use std::collections::HashSet;

use nativize_core::lang::runtime;
use nativize_model::{Block, Expr, MemberInit, ParamDecl, Stmt, TypeRef};

use super::super::Translator;
use super::super::context::{ClosureScope, TranslationContext};
use super::super::emitter::CppEmitter;
use super::super::expr::ClosureMethod;
use super::super::local_name;
use super::super::names::Names;
use super::super::state::LedgerEntry;
use super::super::stmt::walk_block;
use super::types::TypeParts;
use super::{TypeScope, emit_member};

// ============================================================================
// Traversal
// ============================================================================

/// A statement or expression reached while walking a body.
enum Node<'m> {
    Stmt(&'m Stmt),
    Expr(&'m Expr),
}

/// Visit every statement and expression of `block`. With `deep`, bodies of anonymous methods are entered too.
fn visit_block<'m>(block: &'m Block, deep: bool, f: &mut dyn FnMut(Node<'m>)) {
    walk_block(block, &mut |s| {
        f(Node::Stmt(s));
        for e in direct_exprs(s) {
            visit_expr(e, deep, &mut *f);
        }
    });
}

fn visit_expr<'m>(e: &'m Expr, deep: bool, f: &mut dyn FnMut(Node<'m>)) {
    f(Node::Expr(e));
    if deep {
        if let Expr::AnonymousMethod { body, .. } = e {
            visit_block(body, deep, &mut *f);
        }
    }
    for c in children(e) {
        visit_expr(c, deep, &mut *f);
    }
}

/// Expressions held directly by a statement (nested statements are reached by `walk_block`).
fn direct_exprs(stmt: &Stmt) -> Vec<&Expr> {
    match stmt {
        Stmt::Expression { expr } => vec![expr],
        Stmt::If { condition, .. } | Stmt::While { condition, .. } | Stmt::Do { condition, .. } => vec![condition],
        Stmt::For { condition, .. } => condition.iter().collect(),
        Stmt::ForEach { collection, .. } => vec![collection],
        Stmt::Switch { value, .. } => vec![value],
        Stmt::Throw { value } | Stmt::Return { value } => value.iter().collect(),
        Stmt::Using { resource, .. } => vec![resource],
        Stmt::Lock { target, .. } => vec![target],
        Stmt::Fixed { value, .. } => vec![value],
        Stmt::AttachEvent { target, handler, .. } | Stmt::RemoveEvent { target, handler, .. } => {
            target.iter().chain(std::iter::once(handler)).collect()
        }
        _ => Vec::new(),
    }
}

/// Sub-expressions of `e`. Anonymous method bodies are statements and are not included.
fn children(e: &Expr) -> Vec<&Expr> {
    match e {
        Expr::AddressOf { operand }
        | Expr::AddressDereference { operand }
        | Expr::AddressOut { operand }
        | Expr::AddressReference { operand }
        | Expr::Unary { operand, .. }
        | Expr::Cast { operand, .. }
        | Expr::TryCast { operand, .. }
        | Expr::TypeTest { operand, .. } => vec![operand],
        Expr::Binary { left, right, .. } => vec![left, right],
        Expr::Assign { target, value } => vec![target, value],
        Expr::Field { target, .. } | Expr::Property { target, .. } | Expr::Event { target, .. } => {
            target.iter().map(|t| &**t).collect()
        }
        Expr::DelegateCreate { target, .. } => target.iter().map(|t| &**t).collect(),
        Expr::Indexer { target, indices, .. } | Expr::ArrayIndex { target, indices } => {
            std::iter::once(&**target).chain(indices).collect()
        }
        Expr::Invoke { target, args, .. } => target.iter().map(|t| &**t).chain(args).collect(),
        Expr::DelegateInvoke { target, args } => std::iter::once(&**target).chain(args).collect(),
        Expr::ObjectCreate { args, initializers, .. } => args
            .iter()
            .chain(initializers.iter().map(|i| match i {
                MemberInit::Field { value, .. } | MemberInit::Property { value, .. } | MemberInit::Add { value, .. } => {
                    value
                }
            }))
            .collect(),
        Expr::ArrayCreate {
            dimensions, initializer, ..
        } => dimensions.iter().chain(initializer).collect(),
        Expr::Condition {
            condition,
            then,
            otherwise,
        } => vec![condition, then, otherwise],
        Expr::NullCoalescing { value, fallback } => vec![value, fallback],
        Expr::StackAlloc { count, .. } => vec![count],
        _ => Vec::new(),
    }
}

/// Locals declared in `block`, in declaration order.
fn declared_locals(block: &Block, deep: bool) -> Vec<(String, TypeRef)> {
    let mut locals: Vec<(String, TypeRef)> = Vec::new();
    visit_block(block, deep, &mut |node| match node {
        Node::Stmt(Stmt::ForEach { variable, .. } | Stmt::Fixed { variable, .. }) => {
            locals.push((variable.name.clone(), variable.ty.clone()));
        }
        Node::Stmt(Stmt::Try { catches, .. }) => {
            for c in catches {
                if let (Some(name), Some(ty)) = (&c.variable, &c.ty) {
                    locals.push((name.clone(), ty.clone()));
                }
            }
        }
        Node::Expr(Expr::VariableDecl { decl }) => locals.push((decl.name.clone(), decl.ty.clone())),
        _ => {}
    });
    locals
}

// ============================================================================
// Capture analysis
// ============================================================================

/// What the anonymous methods of one method body capture.
#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct Captures {
    /// Captured parameters, in parameter order.
    pub params: Vec<(String, TypeRef)>,
    /// Captured locals of the enclosing method, in declaration order.
    pub locals: Vec<(String, TypeRef)>,
    pub has_closures: bool,
}

impl Captures {
    pub fn all(&self) -> impl Iterator<Item = &(String, TypeRef)> {
        self.params.iter().chain(&self.locals)
    }
}

/// Find the variables of the enclosing method that its anonymous methods reference.
pub(super) fn scan(params: &[ParamDecl], body: &Block) -> Captures {
    let mut referenced: HashSet<&str> = HashSet::new();
    let mut has_closures = false;
    visit_block(body, false, &mut |node| {
        let Node::Expr(Expr::AnonymousMethod {
            params: own_params,
            body: inner,
            ..
        }) = node
        else {
            return;
        };
        has_closures = true;
        let own: HashSet<String> = own_params
            .iter()
            .map(|p| p.name.clone())
            .chain(declared_locals(inner, true).into_iter().map(|(n, _)| n))
            .collect();
        visit_block(inner, true, &mut |n| {
            if let Node::Expr(Expr::Variable { name } | Expr::Argument { name }) = n {
                if !own.contains(name) {
                    referenced.insert(name.as_str());
                }
            }
        });
    });

    let mut captures = Captures {
        has_closures,
        ..Captures::default()
    };
    for p in params {
        if !p.mode.is_by_ref() && referenced.contains(p.name.as_str()) {
            captures.params.push((p.name.clone(), p.ty.clone()));
        }
    }
    for (name, ty) in declared_locals(body, false) {
        if referenced.contains(name.as_str()) && !captures.all().any(|(n, _)| *n == name) {
            captures.locals.push((name, ty));
        }
    }
    captures
}

// ============================================================================
// Carrier emission
// ============================================================================

/// The carrier opened for one method.
#[derive(Debug, Clone)]
pub(super) struct Carrier {
    pub name: String,
    pub fields: Vec<(String, TypeRef)>,
    pub captures_this: bool,
}

impl<'t, 'a> Translator<'t, 'a> {
    /// Create the carrier instance at the top of the enclosing method, copy the captured parameters into it and
    /// switch `cx` to closure mode.
    pub(super) fn open_closure(
        &mut self,
        scope: &TypeScope<'_>,
        cx: &mut TranslationContext,
        captures: &Captures,
        out: &mut CppEmitter,
    ) -> Carrier {
        let name = self.unit.next_closure_class();
        let pointer = self.unit.next_temp();
        let captures_this = !cx.is_static && !scope.value_type;
        tracing::debug!(carrier = %name, captured = captures.params.len() + captures.locals.len(), "opening closure");

        out.line(&format!("{} * {} = {}::{}();", name, pointer, name, runtime::CREATE));
        if captures_this {
            out.line(&format!("{}->{} = this;", pointer, runtime::CLOSURE_THIS));
        }
        for (param, _) in &captures.params {
            out.line(&format!("{}->{} = {};", pointer, local_name(param), local_name(param)));
        }

        cx.closure = Some(ClosureScope {
            carrier: name.clone(),
            pointer,
            captured: captures.all().cloned().collect(),
            captures_this,
        });
        Carrier {
            name,
            fields: captures.all().cloned().collect(),
            captures_this,
        }
    }

    /// Nest the carrier class in the declaring type and define its members.
    pub(super) fn emit_carrier(
        &mut self,
        scope: &TypeScope<'_>,
        carrier: &Carrier,
        methods: Vec<ClosureMethod>,
        parts: &mut TypeParts,
    ) {
        let c = &carrier.name;
        let inline = scope.generic;
        let names = Names::new(self.table).with_typename(scope.generic);
        let mut fields: Vec<(String, String)> = Vec::new();
        if carrier.captures_this {
            fields.push((runtime::CLOSURE_THIS.to_string(), names.type_decl(&scope.self_ty)));
        }
        for (name, ty) in &carrier.fields {
            fields.push((local_name(name), names.type_decl(ty)));
        }

        let mut class = parts.nested.sibling();
        let mut out_of_line = parts.out_of_line.sibling();
        let owner = format!("{}::{}", scope.qualified, c);

        let identity = if scope.generic {
            runtime::MULTIPLE_DYNAMIC_OBJECT_ID_MACRO.to_string()
        } else {
            format!("{}(sizeof({}))", runtime::DYNAMIC_OBJECT_ID_MACRO, c)
        };
        class.class_block(&format!("class {} : public {}", c, runtime::OBJECT_TYPE), |e| {
            e.line(&identity);
            e.line("public:");

            let mut create = e.sibling();
            create.block("", |b| {
                b.line(&format!("{} * __temp__ = new {};", c, c));
                b.line(&format!("__temp__->{} = {}();", runtime::INTERFACE_MAP_FIELD, runtime::GET_INTERFACE_MAP));
                b.line("return (__temp__);");
            });
            emit_member(
                e,
                &mut out_of_line,
                inline,
                &format!("static {} * {}()", c, runtime::CREATE),
                &format!("{}::{} * {}::{}()", scope.full_name, c, owner, runtime::CREATE),
                create.as_str(),
            );

            let mut trace = e.sibling();
            trace.block("", |b| {
                for (name, _) in &fields {
                    b.line(&format!("{}(currentMark, {});", runtime::TRACER_DO_TRACE, name));
                }
            });
            emit_member(
                e,
                &mut out_of_line,
                inline,
                &format!("virtual void {}(unsigned char currentMark)", runtime::TRACE),
                &format!("void {}::{}(unsigned char currentMark)", owner, runtime::TRACE),
                trace.as_str(),
            );

            for m in &methods {
                emit_member(
                    e,
                    &mut out_of_line,
                    inline,
                    &format!("{} {}({})", m.return_type, m.name, m.params),
                    &format!("{} {}::{}({})", m.return_type, owner, m.name, m.params),
                    &m.body,
                );
            }

            if !fields.is_empty() {
                e.line("public:");
                for (name, ty) in &fields {
                    e.line(&format!("{} {};", ty, name));
                }
            }
        });

        if !inline {
            out_of_line.line(&format!("void * * {}::{} = NULL;", owner, runtime::INTERFACE_MAP_STATIC));
            out_of_line.blank_line();
            let register = format!("{}::{}::{}();", scope.full_name, c, runtime::REGISTER_ID);
            self.unit.interface_maps.push(LedgerEntry::new(&scope.decl.key, register));
        }
        parts.nested.append(&class);
        parts.out_of_line.append(&out_of_line);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use nativize_model::{Assembly, MethodDecl, MethodRef, ParamMode, TypeDecl, TypeKey, TypeKind, VariableDecl};

    use super::*;
    use crate::backend::type_table::TypeTable;
    use crate::config::BackendConfig;

    fn action() -> TypeRef {
        TypeRef::named("App.Action")
    }

    fn lambda(body: Vec<Stmt>) -> Expr {
        Expr::AnonymousMethod {
            delegate_type: action(),
            params: Vec::new(),
            return_type: None,
            body: Block::new(body),
        }
    }

    fn print(arg: Expr) -> Stmt {
        Stmt::expr(Expr::call(
            None,
            MethodRef::new(TypeRef::named("App.Widget"), "Print")
                .with_param("v", TypeRef::int32())
                .static_(),
            vec![arg],
        ))
    }

    #[test]
    fn test_scan_finds_captured_params_and_locals() {
        let params = vec![
            ParamDecl::new("a", TypeRef::int32()),
            ParamDecl::new("unused", TypeRef::int32()),
            ParamDecl::new("r", TypeRef::int32()).with_mode(ParamMode::Ref),
        ];
        let body = Block::new(vec![
            Stmt::local("count", TypeRef::int32(), Expr::int(0)),
            Stmt::local("other", TypeRef::int32(), Expr::int(1)),
            Stmt::local(
                "f",
                action(),
                lambda(vec![
                    Stmt::local("inner", TypeRef::int32(), Expr::arg("a")),
                    print(Expr::var("count")),
                    print(Expr::var("inner")),
                    print(Expr::arg("r")),
                ]),
            ),
        ]);
        let captures = scan(&params, &body);
        assert!(captures.has_closures);
        assert_eq!(captures.params, vec![("a".to_string(), TypeRef::int32())]);
        assert_eq!(captures.locals, vec![("count".to_string(), TypeRef::int32())]);
    }

    #[test]
    fn test_scan_without_closures() {
        let body = Block::new(vec![Stmt::local("x", TypeRef::int32(), Expr::int(0))]);
        assert_eq!(scan(&[], &body), Captures::default());
    }

    #[test]
    fn test_foreach_variables_are_outer_locals() {
        let body = Block::new(vec![Stmt::ForEach {
            variable: VariableDecl::new("item", TypeRef::int32()),
            collection: Expr::var("items"),
            body: Block::new(vec![Stmt::expr(lambda(vec![print(Expr::var("item"))]))]),
        }]);
        let captures = scan(&[], &body);
        assert_eq!(captures.locals, vec![("item".to_string(), TypeRef::int32())]);
    }

    #[test]
    fn test_method_with_closure_gets_a_carrier() {
        let asm = Assembly::new("App")
            .with_type(TypeDecl::new("App.Action", TypeKind::Delegate).with_method(MethodDecl::new("Invoke")))
            .with_type(
                TypeDecl::new("App.Widget", TypeKind::Class)
                    .with_method(
                        MethodDecl::new("Print")
                            .static_()
                            .with_param(ParamDecl::new("v", TypeRef::int32()))
                            .with_body(Block::default()),
                    )
                    .with_method(
                        MethodDecl::new("Run")
                            .with_param(ParamDecl::new("a", TypeRef::int32()))
                            .with_body(Block::new(vec![Stmt::local(
                                "f",
                                action(),
                                lambda(vec![print(Expr::arg("a"))]),
                            )])),
                    ),
            );
        let table = TypeTable::new(&asm, &HashSet::new());
        let config = BackendConfig::default();
        let mut t = Translator::new(&table, &config, "App");
        let decl = table.decl(&TypeKey::new("App.Widget")).unwrap();
        let text = t.emit_class(decl).unwrap();

        assert!(text.definition.contains("class __AnonymousClass0__ : public ::System::Object"));
        assert!(text.definition.contains("CN_DYNAMIC_OBJECT_ID0(sizeof(__AnonymousClass0__))"));
        assert!(text.definition.contains("static __AnonymousClass0__ * __Create__();"));
        assert!(text.definition.contains("void __AnonymousMethod0__();"));
        assert!(text.definition.contains("::App::Widget * __this__;"));
        assert!(text.definition.contains("::System::Int32 a;"));
        assert!(text.methods.contains("__AnonymousClass0__ * __temp0__ = __AnonymousClass0__::__Create__();"));
        assert!(text.methods.contains("__temp0__->__this__ = this;"));
        assert!(text.methods.contains("__temp0__->a = a;"));
        assert!(text.methods.contains("void App::Widget::__AnonymousClass0__::__AnonymousMethod0__()"));
        assert!(text.methods.contains("::CrossNetRuntime::Tracer::DoTrace(currentMark, __this__);"));
        assert!(text.methods.contains("void * * App::Widget::__AnonymousClass0__::s__InterfaceMap__ = NULL;"));
        assert!(
            t.unit
                .interface_maps
                .iter()
                .any(|e| e.statement == "::App::Widget::__AnonymousClass0__::__RegisterId__();")
        );
        assert!(t.closure_methods.is_empty());
    }
}
