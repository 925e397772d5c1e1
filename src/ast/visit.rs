//! AST traversal
//!
//! [`Visitor`] has one `visit_*` method per concrete node kind. Each default
//! implementation calls the matching `walk_*` function, which visits the
//! node's children; an implementor overrides only the kinds it cares about and
//! calls `walk_*` itself when it still wants the children visited.
//!
//! The abstract node families (declaration, statement, expression) are
//! dispatched by the free functions [`visit_decl`], [`visit_stmt`] and
//! [`visit_expr`], which match on the closed node enums. They are not part of
//! the trait so that a node is never visited twice under two different kinds.
//!
//! Children are visited left to right, declarations before statements:
//!
//! | node          | order                                 |
//! |---------------|---------------------------------------|
//! | program       | top-level declarations                |
//! | var decl      | type, name, array size                |
//! | param decl    | type, name                            |
//! | fun decl      | return type, name, params, body       |
//! | compound      | local declarations, then statements   |
//! | selection     | condition, then branch, else branch   |
//! | iteration     | condition, body                       |
//! | return        | value                                 |
//! | var ref       | name, index                           |
//! | call          | name, arguments                       |
//! | binary/assign | left, right                           |

use super::*;

pub trait Visitor {
    fn visit_program(&mut self, ast: &Ast) {
        walk_program(self, ast);
    }

    fn visit_var_decl(&mut self, ast: &Ast, _id: DeclId, decl: &VarDecl) {
        walk_var_decl(self, ast, decl);
    }

    fn visit_parm_decl(&mut self, ast: &Ast, _id: DeclId, decl: &ParmVarDecl) {
        walk_parm_decl(self, ast, decl);
    }

    fn visit_fun_decl(&mut self, ast: &Ast, _id: DeclId, decl: &FunDecl) {
        walk_fun_decl(self, ast, decl);
    }

    fn visit_null_stmt(&mut self, _ast: &Ast, _span: Span) {}

    fn visit_compound_stmt(&mut self, ast: &Ast, stmt: &CompoundStmt) {
        walk_compound_stmt(self, ast, stmt);
    }

    fn visit_selection_stmt(&mut self, ast: &Ast, stmt: &SelectionStmt) {
        walk_selection_stmt(self, ast, stmt);
    }

    fn visit_iteration_stmt(&mut self, ast: &Ast, stmt: &IterationStmt) {
        walk_iteration_stmt(self, ast, stmt);
    }

    fn visit_return_stmt(&mut self, ast: &Ast, stmt: &ReturnStmt) {
        walk_return_stmt(self, ast, stmt);
    }

    fn visit_number(&mut self, _ast: &Ast, _num: &NumberLit) {}

    fn visit_var_ref(&mut self, ast: &Ast, _id: ExprId, var: &VarRef) {
        walk_var_ref(self, ast, var);
    }

    fn visit_call(&mut self, ast: &Ast, _id: ExprId, call: &FunCall) {
        walk_call(self, ast, call);
    }

    /// Called for both plain binary expressions and assignments.
    fn visit_binary(&mut self, ast: &Ast, _id: ExprId, expr: &BinaryExpr) {
        walk_binary(self, ast, expr);
    }

    fn visit_type(&mut self, _ty: ExprType) {}

    fn visit_name(&mut self, _name: &str) {}
}

// ===== Family dispatch =====

pub fn visit_decl<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, id: DeclId) {
    match ast.decl(id) {
        Decl::Var(decl) => visitor.visit_var_decl(ast, id, decl),
        Decl::Parm(decl) => visitor.visit_parm_decl(ast, id, decl),
        Decl::Fun(decl) => visitor.visit_fun_decl(ast, id, decl),
    }
}

pub fn visit_stmt<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, id: StmtId) {
    match ast.stmt(id) {
        Stmt::Null(span) => visitor.visit_null_stmt(ast, *span),
        Stmt::Expr(expr) => visit_expr(visitor, ast, *expr),
        Stmt::Compound(stmt) => visitor.visit_compound_stmt(ast, stmt),
        Stmt::Selection(stmt) => visitor.visit_selection_stmt(ast, stmt),
        Stmt::Iteration(stmt) => visitor.visit_iteration_stmt(ast, stmt),
        Stmt::Return(stmt) => visitor.visit_return_stmt(ast, stmt),
    }
}

pub fn visit_expr<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, id: ExprId) {
    match ast.expr(id) {
        Expr::Number(num) => visitor.visit_number(ast, num),
        Expr::VarRef(var) => visitor.visit_var_ref(ast, id, var),
        Expr::Call(call) => visitor.visit_call(ast, id, call),
        Expr::Binary(expr) => visitor.visit_binary(ast, id, expr),
    }
}

// ===== Default walks =====

pub fn walk_program<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast) {
    for &id in &ast.program().decls {
        visit_decl(visitor, ast, id);
    }
}

pub fn walk_var_decl<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, decl: &VarDecl) {
    visitor.visit_type(if decl.ty == TypeSpecifier::Void {
        ExprType::Void
    } else if decl.is_array() {
        ExprType::Array
    } else {
        ExprType::Int
    });
    visitor.visit_name(&decl.name);
    if let Some(size) = &decl.array_size {
        visitor.visit_number(ast, size);
    }
}

pub fn walk_parm_decl<V: Visitor + ?Sized>(visitor: &mut V, _ast: &Ast, decl: &ParmVarDecl) {
    visitor.visit_type(if decl.ty == TypeSpecifier::Void {
        ExprType::Void
    } else if decl.is_array {
        ExprType::Array
    } else {
        ExprType::Int
    });
    visitor.visit_name(&decl.name);
}

pub fn walk_fun_decl<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, decl: &FunDecl) {
    visitor.visit_type(match decl.return_type {
        TypeSpecifier::Void => ExprType::Void,
        TypeSpecifier::Int => ExprType::Int,
    });
    visitor.visit_name(&decl.name);
    for &param in &decl.params {
        visit_decl(visitor, ast, param);
    }
    if let Some(body) = decl.body {
        visit_stmt(visitor, ast, body);
    }
}

pub fn walk_compound_stmt<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, stmt: &CompoundStmt) {
    for &decl in &stmt.decls {
        visit_decl(visitor, ast, decl);
    }
    for &inner in &stmt.stmts {
        visit_stmt(visitor, ast, inner);
    }
}

pub fn walk_selection_stmt<V: Visitor + ?Sized>(
    visitor: &mut V,
    ast: &Ast,
    stmt: &SelectionStmt,
) {
    visit_expr(visitor, ast, stmt.cond);
    visit_stmt(visitor, ast, stmt.then_stmt);
    if let Some(else_stmt) = stmt.else_stmt {
        visit_stmt(visitor, ast, else_stmt);
    }
}

pub fn walk_iteration_stmt<V: Visitor + ?Sized>(
    visitor: &mut V,
    ast: &Ast,
    stmt: &IterationStmt,
) {
    visit_expr(visitor, ast, stmt.cond);
    visit_stmt(visitor, ast, stmt.body);
}

pub fn walk_return_stmt<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, stmt: &ReturnStmt) {
    if let Some(expr) = stmt.expr {
        visit_expr(visitor, ast, expr);
    }
}

pub fn walk_var_ref<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, var: &VarRef) {
    visitor.visit_name(ast.decl(var.decl).name());
    if let Some(index) = var.index {
        visit_expr(visitor, ast, index);
    }
}

pub fn walk_call<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, call: &FunCall) {
    visitor.visit_name(ast.decl(call.decl).name());
    for &arg in &call.args {
        visit_expr(visitor, ast, arg);
    }
}

pub fn walk_binary<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast, expr: &BinaryExpr) {
    visit_expr(visitor, ast, expr.lhs);
    visit_expr(visitor, ast, expr.rhs);
}
