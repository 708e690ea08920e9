// genus-frontend/src/ast.rs

use genus_identity::{ChanDir, Span, Symbol};

/// Unique identifier for AST nodes. Call sites are keyed by the id of their
/// call expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A complete translation unit
#[derive(Debug, Clone)]
pub struct Program {
    pub declarations: Vec<Decl>,
    /// One past the highest node id in the tree.
    pub next_node_id: u32,
}

#[derive(Debug, Clone)]
pub enum Decl {
    /// Parameter-introduction form scoping one or more declarations.
    Generic(GenericBlock),
    Type(TypeDecl),
    Function(FuncDecl),
}

/// `[T Constraint, U] { decls... }`. Blocks nest; the declarations inside are
/// parameterized by every enclosing block, outermost first.
#[derive(Debug, Clone)]
pub struct GenericBlock {
    pub type_params: Vec<TypeParam>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

/// Type parameter with an optional constraint (an interface type)
#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: Symbol,
    pub constraint: Option<TypeExpr>,
    pub span: Span,
}

/// Named type declaration with its method set
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: Symbol,
    pub ty: TypeExpr,
    pub methods: Vec<MethodDecl>,
    pub span: Span,
}

/// Method attached to a `TypeDecl`. The receiver has the declared type,
/// implicitly instantiated with the enclosing scope's parameters.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: Symbol,
    pub receiver: Symbol,
    pub params: Vec<Param>,
    pub results: Vec<TypeExpr>,
    pub body: Option<Block>,
    pub span: Span,
}

/// Function declaration. `body == None` means the source lives in another
/// unit and only the signature is known here.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub results: Vec<TypeExpr>,
    pub body: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: Symbol,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TypeExprKind {
    /// `Name` or `Name[args...]`. `args: None` means no bracket list was
    /// written, which is different from an empty one.
    Named {
        name: Symbol,
        args: Option<Vec<TypeExpr>>,
    },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array {
        elem: Box<TypeExpr>,
        len: u64,
    },
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    Chan {
        elem: Box<TypeExpr>,
        dir: ChanDir,
    },
    Func {
        params: Vec<TypeExpr>,
        results: Vec<TypeExpr>,
    },
    Struct(Vec<FieldDecl>),
    Interface(Vec<InterfaceMethod>),
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: Symbol,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct InterfaceMethod {
    pub name: Symbol,
    pub params: Vec<TypeExpr>,
    pub results: Vec<TypeExpr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLiteral(i128),
    FloatLiteral(f64),
    StringLiteral(String),
    BoolLiteral(bool),
    Nil,
    Ident(Symbol),
    /// `Name[args...]` in value position.
    Instantiate { name: Symbol, args: Vec<TypeExpr> },
    Call(Box<CallExpr>),
    /// `value[Target]`: concrete or literal value into a parametric type.
    Coerce(Box<CoerceExpr>),
    /// `value.(Target)`; `two_result` selects the `v, ok` form.
    Assert(Box<AssertExpr>),
    Selector { base: Box<Expr>, field: Symbol },
    Index { base: Box<Expr>, index: Box<Expr> },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: Expr,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct CoerceExpr {
    pub value: Expr,
    pub target: TypeExpr,
}

#[derive(Debug, Clone)]
pub struct AssertExpr {
    pub value: Expr,
    pub target: TypeExpr,
    pub two_result: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Let(LetStmt),
    Assign(AssignStmt),
    Expr(ExprStmt),
    Return(ReturnStmt),
    TypeSwitch(TypeSwitchStmt),
    Block(Block),
}

/// `let a, b: T = init`. Two names are only valid with a two-result
/// initializer (a two-result assertion or a two-result call).
#[derive(Debug, Clone)]
pub struct LetStmt {
    pub names: Vec<Symbol>,
    pub ty: Option<TypeExpr>,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct AssignStmt {
    pub target: Expr,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub values: Vec<Expr>,
    pub span: Span,
}

/// `switch v := x.(type) { case A, B: ... default: ... }`
#[derive(Debug, Clone)]
pub struct TypeSwitchStmt {
    pub binding: Option<Symbol>,
    pub scrutinee: Expr,
    pub cases: Vec<TypeCase>,
    pub default: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeCase {
    pub types: Vec<TypeExpr>,
    pub body: Block,
    pub span: Span,
}
