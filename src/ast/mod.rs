//! Typed abstract syntax tree
//!
//! All nodes of one compilation live in a single [`Ast`] arena and refer to
//! each other through the [`DeclId`], [`StmtId`] and [`ExprId`] handles.
//! Parents own their children (every id appears as a child exactly once), while
//! [`VarRef`] and [`FunCall`] additionally point at the declaration they were
//! resolved to. Those declaration links are lookups only, so the graph stays a
//! tree with side references and never forms an ownership cycle.
//!
//! Nodes are created exclusively by the semantic analyzer
//! ([`crate::sema::Semantics`]), which means every expression is already bound
//! and typed when the parser receives it.
//!
//! - [`visit`]: traversal contract (visitor with default walks)
//! - [`dump`]: labeled bracket dump built on the visitor

pub mod dump;
pub mod visit;

use crate::parser::lexer::Category;
use crate::source::Span;
use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            fn new(index: usize) -> Self {
                $name(index)
            }

            /// Position of the node in its arena.
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Handle to a declaration node.
    DeclId
);
arena_id!(
    /// Handle to a statement node.
    StmtId
);
arena_id!(
    /// Handle to an expression node.
    ExprId
);

/// Type specifier as written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSpecifier {
    Int,
    Void,
}

impl TypeSpecifier {
    pub fn from_category(category: Category) -> Option<Self> {
        match category {
            Category::Int => Some(TypeSpecifier::Int),
            Category::Void => Some(TypeSpecifier::Void),
            _ => None,
        }
    }
}

impl fmt::Display for TypeSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpecifier::Int => f.write_str("int"),
            TypeSpecifier::Void => f.write_str("void"),
        }
    }
}

/// Value category of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprType {
    Void,
    Int,
    Array,
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprType::Void => f.write_str("void"),
            ExprType::Int => f.write_str("int"),
            ExprType::Array => f.write_str("int[]"),
        }
    }
}

/// Binary operators, assignment included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Assign,
}

impl BinOp {
    pub fn from_category(category: Category) -> Option<Self> {
        let op = match category {
            Category::Plus => BinOp::Add,
            Category::Minus => BinOp::Sub,
            Category::Multiply => BinOp::Mul,
            Category::Divide => BinOp::Div,
            Category::Less => BinOp::Lt,
            Category::LessEqual => BinOp::Le,
            Category::Greater => BinOp::Gt,
            Category::GreaterEqual => BinOp::Ge,
            Category::Equal => BinOp::Eq,
            Category::NotEqual => BinOp::Ne,
            Category::Assign => BinOp::Assign,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Assign => "=",
        }
    }
}

// ===== Declarations =====

/// `int x;` or `int x[10];`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub span: Span,
    pub ty: TypeSpecifier,
    pub array_size: Option<NumberLit>,
}

impl VarDecl {
    pub fn is_array(&self) -> bool {
        self.array_size.is_some()
    }
}

/// `int x` or `int x[]` in a parameter list. Never carries a size.
#[derive(Debug, Clone, PartialEq)]
pub struct ParmVarDecl {
    pub name: String,
    pub span: Span,
    pub ty: TypeSpecifier,
    pub is_array: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    pub name: String,
    pub span: Span,
    pub return_type: TypeSpecifier,
    pub params: Vec<DeclId>,
    /// `None` until the body has been parsed, and always for built-ins.
    pub body: Option<StmtId>,
    pub builtin: bool,
}

impl FunDecl {
    pub fn is_void(&self) -> bool {
        self.return_type == TypeSpecifier::Void
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Parm,
    Fun,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Var(VarDecl),
    Parm(ParmVarDecl),
    Fun(FunDecl),
}

impl Decl {
    pub fn kind(&self) -> DeclKind {
        match self {
            Decl::Var(_) => DeclKind::Var,
            Decl::Parm(_) => DeclKind::Parm,
            Decl::Fun(_) => DeclKind::Fun,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Decl::Var(d) => &d.name,
            Decl::Parm(d) => &d.name,
            Decl::Fun(d) => &d.name,
        }
    }

    /// Span of the declared name.
    pub fn span(&self) -> Span {
        match self {
            Decl::Var(d) => d.span,
            Decl::Parm(d) => d.span,
            Decl::Fun(d) => d.span,
        }
    }

    /// `true` for array variables and array parameters.
    pub fn is_array(&self) -> bool {
        match self {
            Decl::Var(d) => d.is_array(),
            Decl::Parm(d) => d.is_array,
            Decl::Fun(_) => false,
        }
    }

    pub fn is_variable(&self) -> bool {
        !matches!(self, Decl::Fun(_))
    }

    /// Declared type: the value type of a variable, the return type of a
    /// function.
    pub fn ty(&self) -> ExprType {
        let (spec, is_array) = match self {
            Decl::Var(d) => (d.ty, d.is_array()),
            Decl::Parm(d) => (d.ty, d.is_array),
            Decl::Fun(d) => (d.return_type, false),
        };
        match (spec, is_array) {
            (TypeSpecifier::Void, _) => ExprType::Void,
            (TypeSpecifier::Int, true) => ExprType::Array,
            (TypeSpecifier::Int, false) => ExprType::Int,
        }
    }

    pub fn as_fun(&self) -> Option<&FunDecl> {
        match self {
            Decl::Fun(d) => Some(d),
            _ => None,
        }
    }
}

// ===== Statements =====

#[derive(Debug, Clone, PartialEq)]
pub struct CompoundStmt {
    pub decls: Vec<DeclId>,
    pub stmts: Vec<StmtId>,
    pub span: Span,
}

/// `if (cond) then_stmt [else else_stmt]`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionStmt {
    pub cond: ExprId,
    pub then_stmt: StmtId,
    pub else_stmt: Option<StmtId>,
    pub span: Span,
}

/// `while (cond) body`
#[derive(Debug, Clone, PartialEq)]
pub struct IterationStmt {
    pub cond: ExprId,
    pub body: StmtId,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub expr: Option<ExprId>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StmtKind {
    Null,
    Expr,
    Compound,
    Selection,
    Iteration,
    Return,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Null(Span),
    /// An expression evaluated for its effect.
    Expr(ExprId),
    Compound(CompoundStmt),
    Selection(SelectionStmt),
    Iteration(IterationStmt),
    Return(ReturnStmt),
}

impl Stmt {
    pub fn kind(&self) -> StmtKind {
        match self {
            Stmt::Null(_) => StmtKind::Null,
            Stmt::Expr(_) => StmtKind::Expr,
            Stmt::Compound(_) => StmtKind::Compound,
            Stmt::Selection(_) => StmtKind::Selection,
            Stmt::Iteration(_) => StmtKind::Iteration,
            Stmt::Return(_) => StmtKind::Return,
        }
    }
}

// ===== Expressions =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberLit {
    pub value: i32,
    pub span: Span,
}

/// Reference to a variable, optionally subscripted.
#[derive(Debug, Clone, PartialEq)]
pub struct VarRef {
    pub decl: DeclId,
    pub index: Option<ExprId>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunCall {
    pub decl: DeclId,
    pub args: Vec<ExprId>,
    pub span: Span,
}

/// Binary operation. With [`BinOp::Assign`] the left operand is always a
/// [`VarRef`].
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinOp,
    pub lhs: ExprId,
    pub rhs: ExprId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprKind {
    Number,
    VarRef,
    FunCall,
    Binary,
    Assign,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(NumberLit),
    VarRef(VarRef),
    Call(FunCall),
    Binary(BinaryExpr),
}

impl Expr {
    pub fn kind(&self) -> ExprKind {
        match self {
            Expr::Number(_) => ExprKind::Number,
            Expr::VarRef(_) => ExprKind::VarRef,
            Expr::Call(_) => ExprKind::FunCall,
            Expr::Binary(b) if b.op == BinOp::Assign => ExprKind::Assign,
            Expr::Binary(_) => ExprKind::Binary,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Number(n) => n.span,
            Expr::VarRef(v) => v.span,
            Expr::Call(c) => c.span,
            Expr::Binary(b) => b.span,
        }
    }

    pub fn as_var_ref(&self) -> Option<&VarRef> {
        match self {
            Expr::VarRef(v) => Some(v),
            _ => None,
        }
    }
}

// ===== Arena =====

/// Ordered top-level declarations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub decls: Vec<DeclId>,
}

/// Arena holding every node of one compilation unit.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    decls: Vec<Decl>,
    stmts: Vec<Stmt>,
    exprs: Vec<Expr>,
    program: Program,
}

impl Ast {
    pub fn new() -> Self {
        Ast::default()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// The function declaration behind `id`, if it is one.
    pub fn fun(&self, id: DeclId) -> Option<&FunDecl> {
        self.decl(id).as_fun()
    }

    /// First top-level function with the given name.
    pub fn find_function(&self, name: &str) -> Option<DeclId> {
        self.program
            .decls
            .iter()
            .copied()
            .find(|&id| matches!(self.decl(id), Decl::Fun(f) if f.name == name))
    }

    /// Derived type of an expression.
    ///
    /// Numbers and binary expressions are `Int`; a variable reference is
    /// `Array` when it names an array and carries no subscript; a call is
    /// `Void` exactly when its target returns void.
    pub fn expr_type(&self, id: ExprId) -> ExprType {
        match self.expr(id) {
            Expr::Number(_) | Expr::Binary(_) => ExprType::Int,
            Expr::VarRef(var) => {
                if self.decl(var.decl).is_array() && var.index.is_none() {
                    ExprType::Array
                } else {
                    ExprType::Int
                }
            }
            Expr::Call(call) => match self.fun(call.decl) {
                Some(fun) if fun.is_void() => ExprType::Void,
                _ => ExprType::Int,
            },
        }
    }

    pub fn stmt_span(&self, id: StmtId) -> Span {
        match self.stmt(id) {
            Stmt::Null(span) => *span,
            Stmt::Expr(expr) => self.expr(*expr).span(),
            Stmt::Compound(s) => s.span,
            Stmt::Selection(s) => s.span,
            Stmt::Iteration(s) => s.span,
            Stmt::Return(s) => s.span,
        }
    }

    // Construction is reserved to the analyzer.

    pub(crate) fn alloc_decl(&mut self, decl: Decl) -> DeclId {
        self.decls.push(decl);
        DeclId::new(self.decls.len() - 1)
    }

    pub(crate) fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        self.stmts.push(stmt);
        StmtId::new(self.stmts.len() - 1)
    }

    pub(crate) fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        self.exprs.push(expr);
        ExprId::new(self.exprs.len() - 1)
    }

    pub(crate) fn fun_mut(&mut self, id: DeclId) -> Option<&mut FunDecl> {
        match &mut self.decls[id.index()] {
            Decl::Fun(f) => Some(f),
            _ => None,
        }
    }

    pub(crate) fn push_top_level(&mut self, id: DeclId) {
        self.program.decls.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(ast: &mut Ast, name: &str, size: Option<i32>) -> DeclId {
        ast.alloc_decl(Decl::Var(VarDecl {
            name: name.to_string(),
            span: Span::default(),
            ty: TypeSpecifier::Int,
            array_size: size.map(|value| NumberLit {
                value,
                span: Span::default(),
            }),
        }))
    }

    fn number(ast: &mut Ast, value: i32) -> ExprId {
        ast.alloc_expr(Expr::Number(NumberLit {
            value,
            span: Span::default(),
        }))
    }

    fn var_ref(ast: &mut Ast, decl: DeclId, index: Option<ExprId>) -> ExprId {
        ast.alloc_expr(Expr::VarRef(VarRef {
            decl,
            index,
            span: Span::default(),
        }))
    }

    #[test]
    fn test_var_ref_types() {
        let mut ast = Ast::new();
        let array = var(&mut ast, "a", Some(4));
        let scalar = var(&mut ast, "s", None);

        let bare_array = var_ref(&mut ast, array, None);
        let idx = number(&mut ast, 1);
        let indexed_array = var_ref(&mut ast, array, Some(idx));
        let bare_scalar = var_ref(&mut ast, scalar, None);
        let idx = number(&mut ast, 0);
        let indexed_scalar = var_ref(&mut ast, scalar, Some(idx));

        assert_eq!(ast.expr_type(bare_array), ExprType::Array);
        assert_eq!(ast.expr_type(indexed_array), ExprType::Int);
        assert_eq!(ast.expr_type(bare_scalar), ExprType::Int);
        assert_eq!(ast.expr_type(indexed_scalar), ExprType::Int);
    }

    #[test]
    fn test_call_and_binary_types() {
        let mut ast = Ast::new();
        let void_fun = ast.alloc_decl(Decl::Fun(FunDecl {
            name: "f".to_string(),
            span: Span::default(),
            return_type: TypeSpecifier::Void,
            params: Vec::new(),
            body: None,
            builtin: false,
        }));
        let call = ast.alloc_expr(Expr::Call(FunCall {
            decl: void_fun,
            args: Vec::new(),
            span: Span::default(),
        }));
        let lhs = number(&mut ast, 1);
        let rhs = number(&mut ast, 2);
        let sum = ast.alloc_expr(Expr::Binary(BinaryExpr {
            op: BinOp::Add,
            lhs,
            rhs,
            span: Span::default(),
        }));

        assert_eq!(ast.expr_type(call), ExprType::Void);
        assert_eq!(ast.expr_type(sum), ExprType::Int);
        assert_eq!(ast.expr(sum).kind(), ExprKind::Binary);
    }

    #[test]
    fn test_decl_types() {
        let mut ast = Ast::new();
        let array = var(&mut ast, "a", Some(2));
        let scalar = var(&mut ast, "b", None);
        assert_eq!(ast.decl(array).ty(), ExprType::Array);
        assert_eq!(ast.decl(scalar).ty(), ExprType::Int);
        assert_eq!(ast.decl(array).kind(), DeclKind::Var);
    }

    #[test]
    fn test_binop_from_category() {
        assert_eq!(BinOp::from_category(Category::LessEqual), Some(BinOp::Le));
        assert_eq!(BinOp::from_category(Category::Assign), Some(BinOp::Assign));
        assert_eq!(BinOp::from_category(Category::Comma), None);
        assert_eq!(BinOp::Ne.symbol(), "!=");
    }
}
