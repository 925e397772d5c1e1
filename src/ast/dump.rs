//! Labeled bracket dump of an [`Ast`]
//!
//! Every node prints as `[label children...]`. Declarations, statements,
//! binary expressions and calls open a new line indented two spaces per
//! level; numbers, names, types and variable references stay on the line of
//! their parent.

use super::visit::{self, Visitor};
use super::*;

/// Render the whole program.
pub fn dump(ast: &Ast) -> String {
    let mut visitor = DumpVisitor::default();
    visitor.visit_program(ast);
    visitor.out
}

#[derive(Default)]
struct DumpVisitor {
    out: String,
    depth: usize,
    /// Set right before a statement is dispatched, so an expression statement
    /// made of a single inline node still starts its own line.
    statement_start: bool,
}

impl DumpVisitor {
    fn newline(&mut self, depth: usize) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        for _ in 0..depth {
            self.out.push_str("  ");
        }
    }

    fn open_block(&mut self, label: &str) {
        self.statement_start = false;
        self.newline(self.depth);
        self.out.push('[');
        self.out.push_str(label);
    }

    fn open_inline(&mut self) {
        if self.statement_start {
            self.statement_start = false;
            self.newline(self.depth);
        } else {
            self.out.push(' ');
        }
    }

    fn close_block(&mut self) {
        self.newline(self.depth);
        self.out.push(']');
    }

    fn nested<F: FnOnce(&mut Self)>(&mut self, levels: usize, f: F) {
        self.depth += levels;
        f(self);
        self.depth -= levels;
    }

    fn stmt(&mut self, ast: &Ast, id: StmtId) {
        self.statement_start = true;
        visit::visit_stmt(self, ast, id);
        self.statement_start = false;
    }
}

impl Visitor for DumpVisitor {
    fn visit_program(&mut self, ast: &Ast) {
        self.open_block("program");
        self.nested(1, |v| visit::walk_program(v, ast));
        self.close_block();
    }

    fn visit_var_decl(&mut self, ast: &Ast, _id: DeclId, decl: &VarDecl) {
        self.open_block("var-declaration");
        self.nested(1, |v| visit::walk_var_decl(v, ast, decl));
        self.out.push(']');
    }

    fn visit_parm_decl(&mut self, ast: &Ast, _id: DeclId, decl: &ParmVarDecl) {
        self.open_block("param");
        self.nested(1, |v| visit::walk_parm_decl(v, ast, decl));
        if decl.is_array {
            self.out.push_str(" [\\[\\]]");
        }
        self.out.push(']');
    }

    fn visit_fun_decl(&mut self, ast: &Ast, _id: DeclId, decl: &FunDecl) {
        self.open_block("fun-declaration");

        self.newline(self.depth + 1);
        self.out.push_str(if decl.is_void() { "[void]" } else { "[int]" });

        self.newline(self.depth + 1);
        self.out.push('[');
        self.out.push_str(&decl.name);
        self.out.push(']');

        self.newline(self.depth + 1);
        self.out.push_str("[params");
        self.nested(2, |v| {
            for &param in &decl.params {
                visit::visit_decl(v, ast, param);
            }
        });
        self.out.push(']');

        if let Some(body) = decl.body {
            self.nested(1, |v| v.stmt(ast, body));
        }
        self.close_block();
    }

    fn visit_null_stmt(&mut self, _ast: &Ast, _span: Span) {
        self.open_block(";");
        self.out.push(']');
    }

    fn visit_compound_stmt(&mut self, ast: &Ast, stmt: &CompoundStmt) {
        self.open_block("compound-stmt");
        self.nested(1, |v| {
            for &decl in &stmt.decls {
                visit::visit_decl(v, ast, decl);
            }
            for &inner in &stmt.stmts {
                v.stmt(ast, inner);
            }
        });
        self.close_block();
    }

    fn visit_selection_stmt(&mut self, ast: &Ast, stmt: &SelectionStmt) {
        self.open_block("selection-stmt");
        self.nested(1, |v| {
            visit::visit_expr(v, ast, stmt.cond);
            v.stmt(ast, stmt.then_stmt);
            if let Some(else_stmt) = stmt.else_stmt {
                v.stmt(ast, else_stmt);
            }
        });
        self.close_block();
    }

    fn visit_iteration_stmt(&mut self, ast: &Ast, stmt: &IterationStmt) {
        self.open_block("iteration-stmt");
        self.nested(1, |v| {
            visit::visit_expr(v, ast, stmt.cond);
            v.stmt(ast, stmt.body);
        });
        self.close_block();
    }

    fn visit_return_stmt(&mut self, ast: &Ast, stmt: &ReturnStmt) {
        self.open_block("return-stmt");
        self.nested(1, |v| visit::walk_return_stmt(v, ast, stmt));
        self.out.push(']');
    }

    fn visit_number(&mut self, _ast: &Ast, num: &NumberLit) {
        self.open_inline();
        self.out.push('[');
        self.out.push_str(&num.value.to_string());
        self.out.push(']');
    }

    fn visit_var_ref(&mut self, ast: &Ast, _id: ExprId, var: &VarRef) {
        self.open_inline();
        self.out.push_str("[var");
        self.nested(1, |v| visit::walk_var_ref(v, ast, var));
        self.out.push(']');
    }

    fn visit_call(&mut self, ast: &Ast, _id: ExprId, call: &FunCall) {
        self.open_block("call");

        self.newline(self.depth + 1);
        self.out.push('[');
        self.out.push_str(ast.decl(call.decl).name());
        self.out.push(']');

        self.newline(self.depth + 1);
        self.out.push_str("[args");
        self.nested(2, |v| {
            for &arg in &call.args {
                visit::visit_expr(v, ast, arg);
            }
        });
        self.out.push(']');

        self.close_block();
    }

    fn visit_binary(&mut self, ast: &Ast, _id: ExprId, expr: &BinaryExpr) {
        self.open_block(expr.op.symbol());
        self.nested(1, |v| visit::walk_binary(v, ast, expr));
        self.out.push(']');
    }

    fn visit_type(&mut self, ty: ExprType) {
        self.out.push_str(match ty {
            ExprType::Void => " [void]",
            ExprType::Int | ExprType::Array => " [int]",
        });
    }

    fn visit_name(&mut self, name: &str) {
        self.out.push_str(" [");
        self.out.push_str(name);
        self.out.push(']');
    }
}
