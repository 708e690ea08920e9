// tests/common/mod.rs
#![allow(dead_code)]

use genus::frontend::{AstBuilder, Decl, Program};
use genus::identity::Interner;
use genus::runtime::DescriptorRegistry;
use genus::sema::AnalyzerOptions;
use genus::{CompileError, CompileOptions, Compiled};

pub fn build(f: impl FnOnce(&mut AstBuilder) -> Vec<Decl>) -> (Program, Interner) {
    let mut b = AstBuilder::new();
    let decls = f(&mut b);
    b.finish(decls)
}

pub fn options(specialize: bool) -> CompileOptions {
    CompileOptions::new().with_analyzer(AnalyzerOptions::default().with_specialize(specialize))
}

pub fn compile(
    registry: &DescriptorRegistry,
    specialize: bool,
    f: impl FnOnce(&mut AstBuilder) -> Vec<Decl>,
) -> Result<Compiled, CompileError> {
    let (program, interner) = build(f);
    genus::compile_with(&program, &interner, &options(specialize), registry)
}

pub fn compile_ok(
    registry: &DescriptorRegistry,
    specialize: bool,
    f: impl FnOnce(&mut AstBuilder) -> Vec<Decl>,
) -> Compiled {
    match compile(registry, specialize, f) {
        Ok(compiled) => compiled,
        Err(err) => panic!("compile failed: {:?}", err.type_errors()),
    }
}

/// `[E] { type List struct { items []E; size int } }`
pub fn list(b: &mut AstBuilder) -> Decl {
    let e = b.ty("E");
    let items = b.slice(e);
    let int = b.ty("int");
    let fields = b.struct_ty(vec![("items", items), ("size", int)]);
    let list = b.type_decl("List", fields, vec![]);
    let tp = b.type_param("E", None);
    b.generic(vec![tp], vec![list])
}

/// `type Stringer interface { String() string }`
pub fn stringer(b: &mut AstBuilder) -> Decl {
    let string = b.ty("string");
    let sig = b.method_sig("String", vec![], vec![string]);
    let iface = b.interface_ty(vec![sig]);
    b.type_decl("Stringer", iface, vec![])
}
