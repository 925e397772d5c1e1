//! MIPS code generation
//!
//! Emits assembly for the SPIM/MARS simulators from a checked [`Ast`]. The
//! generator is a single [`Visitor`] pass over the program; each function
//! first gets a [`frame::FrameLayout`] from a second, smaller visitor.
//!
//! # Conventions
//!
//! - Every expression leaves its value in `$a0`; `$t1` holds the left operand
//!   of a binary operation after it is popped.
//! - Arguments are pushed right to left, so argument 1 ends up closest to the
//!   callee's frame. The caller pops them after the call.
//! - Results come back in `$v0`.
//! - Functions are labelled `f_<name>`, globals `g_<name>`.
//!
//! Only programs that produced no diagnostics may be handed to [`generate`];
//! the generator trusts every name to be resolved and every type to be right.

mod frame;
mod runtime;

use crate::ast::visit::{self, Visitor};
use crate::ast::{
    Ast, BinOp, BinaryExpr, Decl, DeclId, ExprId, FunCall, FunDecl, IterationStmt, NumberLit,
    ReturnStmt, SelectionStmt, VarDecl, VarRef,
};
use frame::{FrameLayout, Slot};
use rustc_hash::FxHashMap;
use std::fmt::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Check subscripts of arrays whose size is known at the access site.
    /// Array parameters are never checked.
    pub bounds_checks: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            bounds_checks: true,
        }
    }
}

/// Generate a complete assembly file for `ast`.
pub fn generate(ast: &Ast, options: &CodegenOptions) -> String {
    let mut generator = Generator::new(options);
    generator.visit_program(ast);
    tracing::debug!(
        functions = generator.functions,
        bounds_checks = options.bounds_checks,
        "generated assembly"
    );
    generator.finish()
}

struct Generator<'o> {
    options: &'o CodegenOptions,
    /// Body of the `.data` section
    data: String,
    /// Body of the `.text` section after the entry stub
    text: String,
    /// Storage of every variable declared so far
    slots: FxHashMap<DeclId, Slot>,
    /// Epilogue label of the function being emitted
    ret_label: Option<String>,
    next_label: usize,
    functions: usize,
}

impl<'o> Generator<'o> {
    fn new(options: &'o CodegenOptions) -> Self {
        Generator {
            options,
            data: String::new(),
            text: String::new(),
            slots: FxHashMap::default(),
            ret_label: None,
            next_label: 0,
            functions: 0,
        }
    }

    fn finish(self) -> String {
        let mut out = String::new();
        if !self.data.is_empty() {
            out.push_str("    .data\n");
            out.push_str(&self.data);
        }
        out.push_str("    .text\n");
        out.push_str(runtime::ENTRY);
        out.push_str(&self.text);
        out.push_str(runtime::SUPPORT);
        out
    }

    // ===== Emission helpers =====

    fn emit(&mut self, instr: fmt::Arguments<'_>) {
        let _ = writeln!(self.text, "    {}", instr);
    }

    fn label(&mut self, label: &str) {
        let _ = writeln!(self.text, "{}:", label);
    }

    fn fresh_label(&mut self, hint: &str) -> String {
        self.next_label += 1;
        format!("__{}_{}", hint, self.next_label)
    }

    fn push_acc(&mut self) {
        self.emit(format_args!("sw $a0, 0($sp)"));
        self.emit(format_args!("addiu $sp, $sp, -4"));
    }

    /// Pop the top of the stack into `$t1`.
    fn pop_tmp(&mut self) {
        self.emit(format_args!("lw $t1, 4($sp)"));
        self.emit(format_args!("addiu $sp, $sp, 4"));
    }

    fn expr(&mut self, ast: &Ast, id: ExprId) {
        visit::visit_expr(self, ast, id);
    }

    fn slot(&self, decl: DeclId) -> Slot {
        self.slots.get(&decl).copied().unwrap_or(Slot::Global)
    }

    // ===== Variables =====

    fn load_scalar(&mut self, ast: &Ast, decl: DeclId) {
        match self.slot(decl) {
            Slot::Global => self.emit(format_args!("lw $a0, g_{}", ast.decl(decl).name())),
            Slot::Word(off) | Slot::Array(off) => self.emit(format_args!("lw $a0, {}($fp)", off)),
        }
    }

    fn store_scalar(&mut self, ast: &Ast, decl: DeclId) {
        match self.slot(decl) {
            Slot::Global => self.emit(format_args!("sw $a0, g_{}", ast.decl(decl).name())),
            Slot::Word(off) | Slot::Array(off) => self.emit(format_args!("sw $a0, {}($fp)", off)),
        }
    }

    /// Address of element 0 into `$a0`.
    fn load_array_base(&mut self, ast: &Ast, decl: DeclId) {
        match self.slot(decl) {
            Slot::Global => self.emit(format_args!("la $a0, g_{}", ast.decl(decl).name())),
            Slot::Array(off) => self.emit(format_args!("addiu $a0, $fp, {}", off)),
            // array parameter: the slot holds the caller's address
            Slot::Word(off) => self.emit(format_args!("lw $a0, {}($fp)", off)),
        }
    }

    /// Address of `var[index]` into `$a0`.
    fn element_address(&mut self, ast: &Ast, var: &VarRef, index: ExprId) {
        self.expr(ast, index);

        if self.options.bounds_checks {
            if let Decl::Var(VarDecl {
                array_size: Some(size),
                ..
            }) = ast.decl(var.decl)
            {
                self.emit(format_args!("bltz $a0, {}", runtime::OUT_OF_BOUNDS));
                self.emit(format_args!("li $t1, {}", size.value));
                self.emit(format_args!("bge $a0, $t1, {}", runtime::OUT_OF_BOUNDS));
            }
        }

        self.emit(format_args!("sll $a0, $a0, 2"));
        self.push_acc();
        self.load_array_base(ast, var.decl);
        self.pop_tmp();
        self.emit(format_args!("addu $a0, $a0, $t1"));
    }

    fn assign(&mut self, ast: &Ast, target: &VarRef, value: ExprId) {
        self.expr(ast, value);
        match target.index {
            Some(index) => {
                self.push_acc();
                self.element_address(ast, target, index);
                self.pop_tmp();
                self.emit(format_args!("sw $t1, 0($a0)"));
                self.emit(format_args!("move $a0, $t1"));
            }
            None => self.store_scalar(ast, target.decl),
        }
    }

    fn binary_op(&mut self, op: BinOp) {
        match op {
            BinOp::Add => self.emit(format_args!("addu $a0, $t1, $a0")),
            BinOp::Sub => self.emit(format_args!("subu $a0, $t1, $a0")),
            BinOp::Mul => self.emit(format_args!("mul $a0, $t1, $a0")),
            BinOp::Div => {
                self.emit(format_args!("div $t1, $a0"));
                self.emit(format_args!("mflo $a0"));
            }
            BinOp::Lt => self.emit(format_args!("slt $a0, $t1, $a0")),
            BinOp::Gt => self.emit(format_args!("slt $a0, $a0, $t1")),
            BinOp::Le => {
                self.emit(format_args!("slt $a0, $a0, $t1"));
                self.emit(format_args!("xori $a0, $a0, 1"));
            }
            BinOp::Ge => {
                self.emit(format_args!("slt $a0, $t1, $a0"));
                self.emit(format_args!("xori $a0, $a0, 1"));
            }
            BinOp::Eq => {
                self.emit(format_args!("xor $a0, $t1, $a0"));
                self.emit(format_args!("sltiu $a0, $a0, 1"));
            }
            BinOp::Ne => {
                self.emit(format_args!("xor $a0, $t1, $a0"));
                self.emit(format_args!("sltu $a0, $zero, $a0"));
            }
            BinOp::Assign => unreachable!("assignment is not an arithmetic operator"),
        }
    }
}

impl Visitor for Generator<'_> {
    fn visit_var_decl(&mut self, _ast: &Ast, id: DeclId, decl: &VarDecl) {
        // Locals were placed by the frame layout.
        if self.ret_label.is_some() {
            return;
        }
        match decl.array_size {
            Some(size) => {
                let _ = writeln!(self.data, "    .align 2");
                let _ = writeln!(self.data, "g_{}: .space {}", decl.name, 4 * i64::from(size.value.max(1)));
            }
            None => {
                let _ = writeln!(self.data, "g_{}: .word 0", decl.name);
            }
        }
        self.slots.insert(id, Slot::Global);
    }

    fn visit_fun_decl(&mut self, ast: &Ast, _id: DeclId, decl: &FunDecl) {
        let Some(body) = decl.body else {
            return;
        };

        let mut layout = FrameLayout::new(&decl.params);
        visit::visit_stmt(&mut layout, ast, body);
        tracing::trace!(function = %decl.name, words = layout.words, "frame layout");
        let words = layout.words;
        self.slots.extend(layout.slots);

        let ret_label = format!("__ret_{}", decl.name);
        self.ret_label = Some(ret_label.clone());
        self.functions += 1;

        self.label(&format!("f_{}", decl.name));
        self.emit(format_args!("sw $ra, 0($sp)"));
        self.emit(format_args!("addiu $sp, $sp, -4"));
        self.emit(format_args!("sw $fp, 0($sp)"));
        self.emit(format_args!("addiu $sp, $sp, -4"));
        self.emit(format_args!("addiu $fp, $sp, 8"));
        if words > 0 {
            self.emit(format_args!("addiu $sp, $sp, -{}", 4 * words));
        }

        visit::visit_stmt(self, ast, body);

        self.label(&ret_label);
        self.emit(format_args!("lw $ra, 0($fp)"));
        self.emit(format_args!("move $t1, $fp"));
        self.emit(format_args!("lw $fp, -4($fp)"));
        self.emit(format_args!("move $sp, $t1"));
        self.emit(format_args!("jr $ra"));

        self.ret_label = None;
    }

    fn visit_selection_stmt(&mut self, ast: &Ast, stmt: &SelectionStmt) {
        let else_label = self.fresh_label("else");
        let end_label = self.fresh_label("endif");

        self.expr(ast, stmt.cond);
        self.emit(format_args!("beqz $a0, {}", else_label));
        visit::visit_stmt(self, ast, stmt.then_stmt);
        self.emit(format_args!("j {}", end_label));
        self.label(&else_label);
        if let Some(else_stmt) = stmt.else_stmt {
            visit::visit_stmt(self, ast, else_stmt);
        }
        self.label(&end_label);
    }

    fn visit_iteration_stmt(&mut self, ast: &Ast, stmt: &IterationStmt) {
        let top_label = self.fresh_label("while");
        let end_label = self.fresh_label("endwhile");

        self.label(&top_label);
        self.expr(ast, stmt.cond);
        self.emit(format_args!("beqz $a0, {}", end_label));
        visit::visit_stmt(self, ast, stmt.body);
        self.emit(format_args!("j {}", top_label));
        self.label(&end_label);
    }

    fn visit_return_stmt(&mut self, ast: &Ast, stmt: &ReturnStmt) {
        if let Some(expr) = stmt.expr {
            self.expr(ast, expr);
            self.emit(format_args!("move $v0, $a0"));
        }
        if let Some(ret_label) = self.ret_label.clone() {
            self.emit(format_args!("j {}", ret_label));
        }
    }

    fn visit_number(&mut self, _ast: &Ast, num: &NumberLit) {
        self.emit(format_args!("li $a0, {}", num.value));
    }

    fn visit_var_ref(&mut self, ast: &Ast, _id: ExprId, var: &VarRef) {
        match var.index {
            Some(index) => {
                self.element_address(ast, var, index);
                self.emit(format_args!("lw $a0, 0($a0)"));
            }
            None if ast.decl(var.decl).is_array() => self.load_array_base(ast, var.decl),
            None => self.load_scalar(ast, var.decl),
        }
    }

    fn visit_call(&mut self, ast: &Ast, _id: ExprId, call: &FunCall) {
        for &arg in call.args.iter().rev() {
            self.expr(ast, arg);
            self.push_acc();
        }
        self.emit(format_args!("jal f_{}", ast.decl(call.decl).name()));
        if !call.args.is_empty() {
            self.emit(format_args!("addiu $sp, $sp, {}", 4 * call.args.len()));
        }
        self.emit(format_args!("move $a0, $v0"));
    }

    fn visit_binary(&mut self, ast: &Ast, _id: ExprId, expr: &BinaryExpr) {
        if expr.op == BinOp::Assign {
            if let Some(target) = ast.expr(expr.lhs).as_var_ref() {
                self.assign(ast, target, expr.rhs);
            }
            return;
        }

        self.expr(ast, expr.lhs);
        self.push_acc();
        self.expr(ast, expr.rhs);
        self.pop_tmp();
        self.binary_op(expr.op);
    }
}
