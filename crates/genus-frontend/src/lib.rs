//! genus frontend: the syntax tree consumed by the checker.
//!
//! Lexing and parsing live outside this workspace. `AstBuilder` is the
//! construction surface a parser (or a test) uses to produce trees with
//! well-formed node ids and spans.

pub mod ast;
mod builder;

pub use ast::{
    AssertExpr, AssignStmt, BinaryOp, Block, CallExpr, CoerceExpr, Decl, Expr, ExprKind,
    ExprStmt, FieldDecl, FuncDecl, GenericBlock, InterfaceMethod, LetStmt, MethodDecl, NodeId,
    Param, Program, ReturnStmt, Stmt, TypeCase, TypeDecl, TypeExpr, TypeExprKind, TypeParam,
    TypeSwitchStmt,
};
pub use builder::AstBuilder;
pub use genus_identity::{ChanDir, Interner, Span, Symbol};
