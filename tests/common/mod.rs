//! Shared fixture builders for the integration tests.

#![allow(dead_code)]

use nativize::backend::{Backend, UnitOutput};
use nativize::config::BackendConfig;
use nativize_model::{Assembly, Block, Expr, FieldDecl, MethodDecl, Stmt, TypeDecl, TypeKind, TypeRef};

pub const DECLARATIONS: &str = "App_class_declaration.h";
pub const DEFINITIONS: &str = "App_class_definition.h";
pub const METHODS: &str = "App_method_definition.cpp";

pub fn class(key: &str) -> TypeDecl {
    TypeDecl::new(key, TypeKind::Class)
}

pub fn structure(key: &str) -> TypeDecl {
    TypeDecl::new(key, TypeKind::Struct)
}

pub fn interface(key: &str) -> TypeDecl {
    TypeDecl::new(key, TypeKind::Interface)
}

pub fn field(name: &str, ty: &str) -> FieldDecl {
    FieldDecl::new(name, TypeRef::named(ty))
}

/// `ret Name() { return value; }`
pub fn returning_method(name: &str, ret: TypeRef, value: Expr) -> MethodDecl {
    MethodDecl::new(name)
        .returning(ret)
        .with_body(Block::new(vec![Stmt::ret(Some(value))]))
}

pub fn translate(asm: &Assembly) -> UnitOutput {
    translate_with(BackendConfig::default(), asm)
}

pub fn translate_with(config: BackendConfig, asm: &Assembly) -> UnitOutput {
    Backend::new(config).translate_unit(asm).unwrap()
}

/// Contents of one output file; panics with the available names when it is missing.
pub fn file<'o>(output: &'o UnitOutput, name: &str) -> &'o str {
    output.file(name).unwrap_or_else(|| {
        let names: Vec<&str> = output.files.iter().map(|f| f.name.as_str()).collect();
        panic!("missing output file `{}`; have {:?}", name, names)
    })
}

/// Every output file concatenated.
pub fn all_text(output: &UnitOutput) -> String {
    output.files.iter().map(|f| f.contents.as_str()).collect::<Vec<_>>().join("\n")
}
