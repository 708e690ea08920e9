// builder.rs
//
// Programmatic construction of syntax trees with fresh node ids and
// monotonically increasing spans.

use genus_identity::{ChanDir, Interner, Span, Symbol};

use crate::ast::*;

/// Allocates node ids and spans while building a `Program`.
///
/// Spans are synthetic (one byte per node, line 1) but unique, so diagnostics
/// attached to different nodes remain distinguishable.
#[derive(Debug)]
pub struct AstBuilder {
    interner: Interner,
    next_node: u32,
    offset: usize,
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AstBuilder {
    pub fn new() -> Self {
        Self {
            interner: Interner::with_primitives(),
            next_node: 0,
            offset: 0,
        }
    }

    pub fn sym(&mut self, name: &str) -> Symbol {
        self.interner.intern(name)
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Finish the tree, handing back the interner that owns its symbols.
    pub fn finish(self, declarations: Vec<Decl>) -> (Program, Interner) {
        let program = Program {
            declarations,
            next_node_id: self.next_node,
        };
        (program, self.interner)
    }

    fn span(&mut self) -> Span {
        let start = self.offset;
        self.offset += 1;
        Span::new(start, start + 1, 1, start as u32 + 1)
    }

    fn node(&mut self) -> NodeId {
        let id = NodeId::new(self.next_node);
        self.next_node += 1;
        id
    }

    fn expr(&mut self, kind: ExprKind) -> Expr {
        Expr {
            id: self.node(),
            kind,
            span: self.span(),
        }
    }

    fn type_expr(&mut self, kind: TypeExprKind) -> TypeExpr {
        TypeExpr {
            kind,
            span: self.span(),
        }
    }

    fn block(&mut self, stmts: Vec<Stmt>) -> Block {
        Block {
            stmts,
            span: self.span(),
        }
    }

    // ------------------------------------------------------------------
    // Type expressions
    // ------------------------------------------------------------------

    /// Bare name: `int`, `T`, or an uninstantiated `List`.
    pub fn ty(&mut self, name: &str) -> TypeExpr {
        let name = self.sym(name);
        self.type_expr(TypeExprKind::Named { name, args: None })
    }

    /// Instantiated name: `List[int]`.
    pub fn ty_args(&mut self, name: &str, args: Vec<TypeExpr>) -> TypeExpr {
        let name = self.sym(name);
        self.type_expr(TypeExprKind::Named {
            name,
            args: Some(args),
        })
    }

    pub fn ptr(&mut self, elem: TypeExpr) -> TypeExpr {
        self.type_expr(TypeExprKind::Pointer(Box::new(elem)))
    }

    pub fn slice(&mut self, elem: TypeExpr) -> TypeExpr {
        self.type_expr(TypeExprKind::Slice(Box::new(elem)))
    }

    pub fn array(&mut self, elem: TypeExpr, len: u64) -> TypeExpr {
        self.type_expr(TypeExprKind::Array {
            elem: Box::new(elem),
            len,
        })
    }

    pub fn map(&mut self, key: TypeExpr, value: TypeExpr) -> TypeExpr {
        self.type_expr(TypeExprKind::Map {
            key: Box::new(key),
            value: Box::new(value),
        })
    }

    pub fn chan(&mut self, elem: TypeExpr, dir: ChanDir) -> TypeExpr {
        self.type_expr(TypeExprKind::Chan {
            elem: Box::new(elem),
            dir,
        })
    }

    pub fn func_ty(&mut self, params: Vec<TypeExpr>, results: Vec<TypeExpr>) -> TypeExpr {
        self.type_expr(TypeExprKind::Func { params, results })
    }

    pub fn struct_ty(&mut self, fields: Vec<(&str, TypeExpr)>) -> TypeExpr {
        let fields = fields
            .into_iter()
            .map(|(name, ty)| FieldDecl {
                name: self.sym(name),
                ty,
                span: self.span(),
            })
            .collect();
        self.type_expr(TypeExprKind::Struct(fields))
    }

    pub fn interface_ty(&mut self, methods: Vec<InterfaceMethod>) -> TypeExpr {
        self.type_expr(TypeExprKind::Interface(methods))
    }

    pub fn method_sig(
        &mut self,
        name: &str,
        params: Vec<TypeExpr>,
        results: Vec<TypeExpr>,
    ) -> InterfaceMethod {
        InterfaceMethod {
            name: self.sym(name),
            params,
            results,
            span: self.span(),
        }
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    pub fn type_param(&mut self, name: &str, constraint: Option<TypeExpr>) -> TypeParam {
        TypeParam {
            name: self.sym(name),
            constraint,
            span: self.span(),
        }
    }

    pub fn generic(&mut self, type_params: Vec<TypeParam>, decls: Vec<Decl>) -> Decl {
        Decl::Generic(GenericBlock {
            type_params,
            decls,
            span: self.span(),
        })
    }

    pub fn type_decl(&mut self, name: &str, ty: TypeExpr, methods: Vec<MethodDecl>) -> Decl {
        Decl::Type(TypeDecl {
            name: self.sym(name),
            ty,
            methods,
            span: self.span(),
        })
    }

    fn params(&mut self, params: Vec<(&str, TypeExpr)>) -> Vec<Param> {
        params
            .into_iter()
            .map(|(name, ty)| Param {
                name: self.sym(name),
                ty,
                span: self.span(),
            })
            .collect()
    }

    /// Function declaration; `body: None` declares a signature whose source
    /// is not available.
    pub fn func(
        &mut self,
        name: &str,
        params: Vec<(&str, TypeExpr)>,
        results: Vec<TypeExpr>,
        body: Option<Vec<Stmt>>,
    ) -> Decl {
        let params = self.params(params);
        let body = body.map(|stmts| self.block(stmts));
        Decl::Function(FuncDecl {
            name: self.sym(name),
            params,
            results,
            body,
            span: self.span(),
        })
    }

    pub fn method(
        &mut self,
        name: &str,
        receiver: &str,
        params: Vec<(&str, TypeExpr)>,
        results: Vec<TypeExpr>,
        body: Option<Vec<Stmt>>,
    ) -> MethodDecl {
        let params = self.params(params);
        let body = body.map(|stmts| self.block(stmts));
        MethodDecl {
            name: self.sym(name),
            receiver: self.sym(receiver),
            params,
            results,
            body,
            span: self.span(),
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub fn int(&mut self, value: i128) -> Expr {
        self.expr(ExprKind::IntLiteral(value))
    }

    pub fn float(&mut self, value: f64) -> Expr {
        self.expr(ExprKind::FloatLiteral(value))
    }

    pub fn string(&mut self, value: &str) -> Expr {
        self.expr(ExprKind::StringLiteral(value.to_string()))
    }

    pub fn boolean(&mut self, value: bool) -> Expr {
        self.expr(ExprKind::BoolLiteral(value))
    }

    pub fn nil(&mut self) -> Expr {
        self.expr(ExprKind::Nil)
    }

    pub fn ident(&mut self, name: &str) -> Expr {
        let name = self.sym(name);
        self.expr(ExprKind::Ident(name))
    }

    pub fn instantiate(&mut self, name: &str, args: Vec<TypeExpr>) -> Expr {
        let name = self.sym(name);
        self.expr(ExprKind::Instantiate { name, args })
    }

    pub fn call(&mut self, callee: Expr, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call(Box::new(CallExpr { callee, args })))
    }

    /// `name(args...)`
    pub fn call_named(&mut self, name: &str, args: Vec<Expr>) -> Expr {
        let callee = self.ident(name);
        self.call(callee, args)
    }

    pub fn coerce(&mut self, value: Expr, target: TypeExpr) -> Expr {
        self.expr(ExprKind::Coerce(Box::new(CoerceExpr { value, target })))
    }

    pub fn assert(&mut self, value: Expr, target: TypeExpr) -> Expr {
        self.expr(ExprKind::Assert(Box::new(AssertExpr {
            value,
            target,
            two_result: false,
        })))
    }

    pub fn assert_checked(&mut self, value: Expr, target: TypeExpr) -> Expr {
        self.expr(ExprKind::Assert(Box::new(AssertExpr {
            value,
            target,
            two_result: true,
        })))
    }

    pub fn select(&mut self, base: Expr, field: &str) -> Expr {
        let field = self.sym(field);
        self.expr(ExprKind::Selector {
            base: Box::new(base),
            field,
        })
    }

    pub fn index(&mut self, base: Expr, index: Expr) -> Expr {
        self.expr(ExprKind::Index {
            base: Box::new(base),
            index: Box::new(index),
        })
    }

    pub fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        self.expr(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub fn let_(&mut self, names: &[&str], ty: Option<TypeExpr>, init: Option<Expr>) -> Stmt {
        let names = names.iter().map(|n| self.sym(n)).collect();
        Stmt::Let(LetStmt {
            names,
            ty,
            init,
            span: self.span(),
        })
    }

    pub fn assign(&mut self, target: Expr, value: Expr) -> Stmt {
        Stmt::Assign(AssignStmt {
            target,
            value,
            span: self.span(),
        })
    }

    pub fn expr_stmt(&mut self, expr: Expr) -> Stmt {
        Stmt::Expr(ExprStmt {
            expr,
            span: self.span(),
        })
    }

    pub fn ret(&mut self, values: Vec<Expr>) -> Stmt {
        Stmt::Return(ReturnStmt {
            values,
            span: self.span(),
        })
    }

    pub fn type_case(&mut self, types: Vec<TypeExpr>, body: Vec<Stmt>) -> TypeCase {
        let body = self.block(body);
        TypeCase {
            types,
            body,
            span: self.span(),
        }
    }

    pub fn type_switch(
        &mut self,
        binding: Option<&str>,
        scrutinee: Expr,
        cases: Vec<TypeCase>,
        default: Option<Vec<Stmt>>,
    ) -> Stmt {
        let binding = binding.map(|b| self.sym(b));
        let default = default.map(|stmts| self.block(stmts));
        Stmt::TypeSwitch(TypeSwitchStmt {
            binding,
            scrutinee,
            cases,
            default,
            span: self.span(),
        })
    }

    pub fn nested(&mut self, stmts: Vec<Stmt>) -> Stmt {
        Stmt::Block(self.block(stmts))
    }
}
