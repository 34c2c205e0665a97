//! Emission order for the types of one unit.
//!
//! A C++ class can only be defined once every class it derives from and every class it embeds by value is
//! complete. The schedule is a topological sort over those edges (Kahn's algorithm, ready types taken in input
//! order). Whatever is left once the ready queue runs dry sits on a true cycle and is force-drained in input order.
//!
//! ## Notes
//!
//! - Base types and every interface of the union are hard edges.
//! - Fields (and delegate signatures) only create an edge when their type is a value type; heap types are held by
//!   pointer and a forward declaration suffices.
//! - Generic arguments of a dependency are dependencies too, ahead of the generic definition itself.
//! - Edges to types outside the unit are already satisfied.

use std::collections::{HashMap, VecDeque};

use nativize_model::{TypeDecl, TypeKey, TypeKind, TypeRef};

use super::super::type_table::TypeTable;

/// Dependency-ordered list of the unit's types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Schedule {
    /// Every unit type exactly once, in emission order.
    pub order: Vec<TypeKey>,
    /// Types emitted by the cycle fallback (a suffix of `order`).
    pub forced: Vec<TypeKey>,
}

/// Collects the dependencies of one type.
struct Collector<'t, 'a> {
    table: &'t TypeTable<'a>,
    owner: &'t TypeKey,
    deps: Vec<TypeKey>,
}

impl Collector<'_, '_> {
    fn push(&mut self, key: &TypeKey) {
        if key != self.owner && self.table.is_in_unit(key) && !self.deps.contains(key) {
            self.deps.push(key.clone());
        }
    }

    /// `ty` must be complete first, along with its generic arguments.
    fn require(&mut self, ty: &TypeRef) {
        if let TypeRef::Named { key, args } = ty {
            for arg in args {
                self.require(arg);
            }
            self.push(key);
        }
    }

    /// `ty` must be complete first only if it is stored inline.
    fn require_value(&mut self, ty: &TypeRef) {
        if self.table.is_value_type(ty) {
            self.require(ty);
        }
    }
}

/// Unit types `decl` has to be emitted after.
pub(crate) fn dependencies(table: &TypeTable<'_>, decl: &TypeDecl) -> Vec<TypeKey> {
    let mut c = Collector {
        table,
        owner: &decl.key,
        deps: Vec::new(),
    };
    if let Some(base) = &decl.base {
        c.require(base);
    }
    let interfaces = table.info(&decl.key).map(|i| i.union.clone()).unwrap_or_default();
    for iface in &interfaces {
        c.require(iface);
    }
    for field in &decl.fields {
        c.require_value(&field.ty);
    }
    if decl.kind == TypeKind::Delegate {
        if let Some(invoke) = decl.delegate_invoke() {
            for p in &invoke.params {
                c.require_value(&p.ty);
            }
            if let Some(ret) = &invoke.return_type {
                c.require_value(ret);
            }
        }
    }
    c.deps
}

/// Order the unit's types so that no type precedes one of its dependencies, except on true cycles.
///
/// ## Parameters
/// - `enum_prepass`: start with every enum, ahead of other ready types.
#[tracing::instrument(skip_all, fields(types = table.unit_types().len()))]
pub(crate) fn schedule(table: &TypeTable<'_>, enum_prepass: bool) -> Schedule {
    let keys = table.unit_types();
    let index: HashMap<&TypeKey, usize> = keys.iter().enumerate().map(|(i, k)| (k, i)).collect();

    let mut in_degree = vec![0usize; keys.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); keys.len()];
    for (i, key) in keys.iter().enumerate() {
        let Some(decl) = table.decl(key) else { continue };
        for dep in dependencies(table, decl) {
            if let Some(&j) = index.get(&dep) {
                in_degree[i] += 1;
                dependents[j].push(i);
            }
        }
    }

    let is_enum = |i: usize| table.decl(&keys[i]).is_some_and(|d| d.kind == TypeKind::Enum);
    let mut queue: VecDeque<usize> = VecDeque::new();
    if enum_prepass {
        queue.extend((0..keys.len()).filter(|&i| in_degree[i] == 0 && is_enum(i)));
        queue.extend((0..keys.len()).filter(|&i| in_degree[i] == 0 && !is_enum(i)));
    } else {
        queue.extend((0..keys.len()).filter(|&i| in_degree[i] == 0));
    }

    let mut emitted = vec![false; keys.len()];
    let mut schedule = Schedule::default();
    while let Some(i) = queue.pop_front() {
        if emitted[i] {
            continue;
        }
        emitted[i] = true;
        schedule.order.push(keys[i].clone());
        for &d in &dependents[i] {
            in_degree[d] -= 1;
            if in_degree[d] == 0 {
                queue.push_back(d);
            }
        }
    }

    for (i, key) in keys.iter().enumerate() {
        if !emitted[i] {
            schedule.order.push(key.clone());
            schedule.forced.push(key.clone());
        }
    }
    tracing::debug!(ordered = schedule.order.len(), forced = schedule.forced.len(), "schedule built");
    schedule
}
