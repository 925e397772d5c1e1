//! Semantic actions
//!
//! [`Semantics`] is the only place AST nodes are created. The parser calls one
//! `act_on_*` method per recognised production; each method checks the
//! context-sensitive rules of that construct, reports what is wrong, and
//! returns the node anyway so parsing can go on and collect more diagnostics.
//!
//! The single exception is name resolution: [`Semantics::act_on_var`] and
//! [`Semantics::act_on_call`] return `None` when the name does not resolve to
//! something of the right kind, and the caller has to give up on the
//! enclosing construct.

use super::scope::{ScopeFlags, ScopeStack};
use crate::ast::*;
use crate::diagnostics::{Diag, Diagnostic, DiagnosticSink};
use crate::parser::lexer::{Category, Word};
use crate::source::Span;

pub struct Semantics<'a> {
    source: &'a str,
    diags: &'a dyn DiagnosticSink,
    ast: Ast,
    scopes: ScopeStack,
    /// Function whose body is being analysed.
    current_fun: Option<DeclId>,
}

impl<'a> Semantics<'a> {
    /// Creates an analyzer whose top-level scope already knows the built-in
    /// functions `int input(void)` and `void println(int value)`.
    pub fn new(source: &'a str, diags: &'a dyn DiagnosticSink) -> Self {
        let mut sema = Semantics {
            source,
            diags,
            ast: Ast::new(),
            scopes: ScopeStack::new(),
            current_fun: None,
        };
        sema.declare_builtins();
        sema
    }

    fn declare_builtins(&mut self) {
        let input = self.ast.alloc_decl(Decl::Fun(FunDecl {
            name: "input".to_string(),
            span: Span::default(),
            return_type: TypeSpecifier::Int,
            params: Vec::new(),
            body: None,
            builtin: true,
        }));
        self.scopes.insert("input", input);

        let value = self.ast.alloc_decl(Decl::Parm(ParmVarDecl {
            name: "value".to_string(),
            span: Span::default(),
            ty: TypeSpecifier::Int,
            is_array: false,
        }));
        let println = self.ast.alloc_decl(Decl::Fun(FunDecl {
            name: "println".to_string(),
            span: Span::default(),
            return_type: TypeSpecifier::Void,
            params: vec![value],
            body: None,
            builtin: true,
        }));
        self.scopes.insert("println", println);
    }

    /// The tree built so far.
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    pub fn enter_scope(&mut self, flags: ScopeFlags) -> usize {
        let depth = self.scopes.enter(flags);
        tracing::trace!(depth, flags = flags.bits(), "enter scope");
        depth
    }

    pub fn leave_scope(&mut self, depth: usize) {
        tracing::trace!(depth, "leave scope");
        self.scopes.leave(depth);
    }

    fn text(&self, word: Word) -> &'a str {
        word.text(self.source)
    }

    fn report(&self, diag: Diagnostic) {
        self.diags.report(diag);
    }

    // ===== Program =====

    pub fn act_on_program_start(&mut self) {
        tracing::debug!(bytes = self.source.len(), "program start");
    }

    pub fn act_on_top_level_decl(&mut self, decl: DeclId) {
        self.ast.push_top_level(decl);
    }

    /// Checks the shape of the program and hands over the finished tree.
    ///
    /// The last declaration must be `void main(void)`. This leaves the
    /// analyzer with an empty tree.
    pub fn act_on_program_end(&mut self) -> Ast {
        match self.ast.program().decls.last().copied() {
            None => {
                self.report(Diagnostic::new(0, Diag::SemaLastDeclNotMain));
            }
            Some(last) => {
                let decl = self.ast.decl(last);
                let span = decl.span();
                match decl.as_fun() {
                    Some(fun) if fun.name == "main" && fun.is_void() => {
                        if !fun.params.is_empty() {
                            self.report(
                                Diagnostic::new(span.start, Diag::SemaMainHasParams).range(span),
                            );
                        }
                    }
                    _ => {
                        self.report(
                            Diagnostic::new(span.start, Diag::SemaLastDeclNotMain).range(span),
                        );
                    }
                }
            }
        }

        let ast = std::mem::take(&mut self.ast);
        tracing::debug!(decls = ast.program().decls.len(), "program end");
        ast
    }

    // ===== Declarations =====

    /// Binds `decl` in the innermost scope, reporting a redefinition when
    /// the name is taken.
    fn declare(&mut self, name: Word, decl: DeclId) {
        let text = self.text(name);
        let (existing, inserted) = self.scopes.insert(text, decl);
        tracing::trace!(name = text, inserted, "declare");
        if !inserted {
            let previous = self.ast.decl(existing).span();
            let mut diag = Diagnostic::new(name.location(), Diag::SemaRedefinition)
                .arg(text)
                .range(name.span);
            if !previous.is_empty() {
                diag = diag.range(previous);
            }
            self.report(diag);
        }
    }

    fn type_specifier(&self, ty: Word) -> TypeSpecifier {
        debug_assert!(ty.is_any_of(&[Category::Int, Category::Void]));
        TypeSpecifier::from_category(ty.category).unwrap_or(TypeSpecifier::Int)
    }

    /// `type ID ;` or `type ID [ NUM ] ;`
    pub fn act_on_var_decl(&mut self, ty: Word, name: Word, array_size: Option<Word>) -> DeclId {
        let spec = self.type_specifier(ty);
        if spec == TypeSpecifier::Void {
            self.report(
                Diagnostic::new(name.location(), Diag::SemaVarDeclaredVoid)
                    .arg(self.text(name))
                    .range(ty.span),
            );
        }

        let array_size = array_size.map(|word| self.number_from_word(word));
        let id = self.ast.alloc_decl(Decl::Var(VarDecl {
            name: self.text(name).to_string(),
            span: name.span,
            ty: spec,
            array_size,
        }));
        self.declare(name, id);
        id
    }

    /// Called once the name of a function is known, before its parameters.
    ///
    /// The function is bound in the enclosing scope right away so its body
    /// can call it recursively.
    pub fn act_on_fun_decl_start(&mut self, ty: Word, name: Word) -> DeclId {
        let return_type = self.type_specifier(ty);
        let id = self.ast.alloc_decl(Decl::Fun(FunDecl {
            name: self.text(name).to_string(),
            span: name.span,
            return_type,
            params: Vec::new(),
            body: None,
            builtin: false,
        }));
        self.declare(name, id);
        self.current_fun = Some(id);
        tracing::debug!(name = self.text(name), "function start");
        id
    }

    /// `type ID` or `type ID [ ]` in a parameter list.
    pub fn act_on_param_decl(&mut self, ty: Word, name: Word, is_array: bool) -> DeclId {
        let spec = self.type_specifier(ty);
        if spec == TypeSpecifier::Void {
            self.report(
                Diagnostic::new(name.location(), Diag::SemaParamDeclaredVoid)
                    .arg(self.text(name))
                    .range(ty.span),
            );
        }

        let id = self.ast.alloc_decl(Decl::Parm(ParmVarDecl {
            name: self.text(name).to_string(),
            span: name.span,
            ty: spec,
            is_array,
        }));
        self.declare(name, id);
        id
    }

    pub fn act_on_fun_params(&mut self, fun: DeclId, params: Vec<DeclId>) {
        if let Some(decl) = self.ast.fun_mut(fun) {
            decl.params = params;
        }
    }

    pub fn act_on_fun_decl_end(&mut self, fun: DeclId, body: StmtId) -> DeclId {
        if let Some(decl) = self.ast.fun_mut(fun) {
            decl.body = Some(body);
        }
        self.current_fun = None;
        fun
    }

    // ===== Statements =====

    pub fn act_on_null_stmt(&mut self, semi: Word) -> StmtId {
        self.ast.alloc_stmt(Stmt::Null(semi.span))
    }

    pub fn act_on_expr_stmt(&mut self, expr: ExprId) -> StmtId {
        if self.ast.expr_type(expr) == ExprType::Array {
            let span = self.ast.expr(expr).span();
            self.report(Diagnostic::new(span.start, Diag::SemaArrayStatement).range(span));
        }
        self.ast.alloc_stmt(Stmt::Expr(expr))
    }

    pub fn act_on_compound_stmt(
        &mut self,
        decls: Vec<DeclId>,
        stmts: Vec<StmtId>,
        span: Span,
    ) -> StmtId {
        self.ast
            .alloc_stmt(Stmt::Compound(CompoundStmt { decls, stmts, span }))
    }

    fn check_condition(&self, cond: ExprId) {
        let ty = self.ast.expr_type(cond);
        if ty != ExprType::Int {
            let span = self.ast.expr(cond).span();
            self.report(
                Diagnostic::new(span.start, Diag::SemaConditionNotInt)
                    .arg(ty.to_string())
                    .range(span),
            );
        }
    }

    pub fn act_on_selection_stmt(
        &mut self,
        if_word: Word,
        cond: ExprId,
        then_stmt: StmtId,
        else_stmt: Option<StmtId>,
    ) -> StmtId {
        self.check_condition(cond);
        let last = else_stmt.unwrap_or(then_stmt);
        let span = if_word.span.to(self.ast.stmt_span(last));
        self.ast.alloc_stmt(Stmt::Selection(SelectionStmt {
            cond,
            then_stmt,
            else_stmt,
            span,
        }))
    }

    pub fn act_on_iteration_stmt(&mut self, while_word: Word, cond: ExprId, body: StmtId) -> StmtId {
        self.check_condition(cond);
        let span = while_word.span.to(self.ast.stmt_span(body));
        self.ast
            .alloc_stmt(Stmt::Iteration(IterationStmt { cond, body, span }))
    }

    /// `return ;` or `return expr ;`
    ///
    /// Returning a value from a void function, returning nothing from an int
    /// function and returning a non-int value are reported independently.
    pub fn act_on_return_stmt(&mut self, retn: Word, expr: Option<ExprId>) -> StmtId {
        let fun = self.current_fun.and_then(|id| self.ast.fun(id));
        let fun_name = fun.map(|f| f.name.clone()).unwrap_or_default();
        let is_void = fun.map(FunDecl::is_void).unwrap_or(true);

        if is_void && expr.is_some() {
            self.report(
                Diagnostic::new(retn.location(), Diag::SemaVoidFunReturnsValue)
                    .arg(fun_name.as_str())
                    .range(retn.span),
            );
        }
        if !is_void && expr.is_none() {
            self.report(
                Diagnostic::new(retn.location(), Diag::SemaFunMustReturnValue)
                    .arg(fun_name.as_str())
                    .range(retn.span),
            );
        }

        let mut span = retn.span;
        if let Some(expr) = expr {
            let expr_span = self.ast.expr(expr).span();
            let ty = self.ast.expr_type(expr);
            if ty != ExprType::Int {
                self.report(
                    Diagnostic::new(expr_span.start, Diag::SemaIncompatibleReturnType)
                        .arg(ty.to_string())
                        .range(expr_span),
                );
            }
            span = span.to(expr_span);
        }

        self.ast.alloc_stmt(Stmt::Return(ReturnStmt { expr, span }))
    }

    // ===== Expressions =====

    fn check_operand(&self, operand: ExprId, op: Word) {
        let ty = self.ast.expr_type(operand);
        if ty != ExprType::Int {
            let symbol = BinOp::from_category(op.category)
                .map(BinOp::symbol)
                .unwrap_or("?");
            self.report(
                Diagnostic::new(op.location(), Diag::SemaOperandNotInt)
                    .arg(ty.to_string())
                    .arg(symbol)
                    .range(op.span)
                    .range(self.ast.expr(operand).span()),
            );
        }
    }

    fn binary(&mut self, op: BinOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        let span = self.ast.expr(lhs).span().to(self.ast.expr(rhs).span());
        self.ast.alloc_expr(Expr::Binary(BinaryExpr { op, lhs, rhs, span }))
    }

    /// `var = expression`. `lhs` must be a variable reference.
    pub fn act_on_assign(&mut self, lhs: ExprId, rhs: ExprId, op: Word) -> ExprId {
        debug_assert!(self.ast.expr(lhs).as_var_ref().is_some());
        self.check_operand(lhs, op);
        self.check_operand(rhs, op);
        self.binary(BinOp::Assign, lhs, rhs)
    }

    pub fn act_on_binary_expr(&mut self, lhs: ExprId, rhs: ExprId, op: Word) -> ExprId {
        self.check_operand(lhs, op);
        self.check_operand(rhs, op);
        let binop = BinOp::from_category(op.category).unwrap_or(BinOp::Add);
        debug_assert!(binop != BinOp::Assign);
        self.binary(binop, lhs, rhs)
    }

    /// Resolves `name`, or `name[index]` when `index` carries the index
    /// expression and the closing bracket.
    ///
    /// Returns `None` when the name is undeclared or names a function. A
    /// subscript on a scalar is reported and dropped.
    #[must_use]
    pub fn act_on_var(&mut self, name: Word, index: Option<(ExprId, Word)>) -> Option<ExprId> {
        let text = self.text(name);
        let decl = match self.scopes.lookup(text) {
            Some(decl) => decl,
            None => {
                self.report(
                    Diagnostic::new(name.location(), Diag::SemaUndeclaredIdentifier)
                        .arg(text)
                        .range(name.span),
                );
                return None;
            }
        };
        if !self.ast.decl(decl).is_variable() {
            self.report(
                Diagnostic::new(name.location(), Diag::SemaNotAVariable)
                    .arg(text)
                    .range(name.span),
            );
            return None;
        }

        let mut span = name.span;
        let index = match index {
            None => None,
            Some((index, close)) => {
                span = span.to(close.span);
                let index_span = self.ast.expr(index).span();
                let ty = self.ast.expr_type(index);
                if ty != ExprType::Int {
                    self.report(
                        Diagnostic::new(index_span.start, Diag::SemaIndexNotInt)
                            .arg(ty.to_string())
                            .range(index_span),
                    );
                }
                if self.ast.decl(decl).is_array() {
                    Some(index)
                } else {
                    self.report(
                        Diagnostic::new(name.location(), Diag::SemaNotAnArray)
                            .arg(text)
                            .range(name.span)
                            .range(index_span),
                    );
                    None
                }
            }
        };

        Some(self.ast.alloc_expr(Expr::VarRef(VarRef { decl, index, span })))
    }

    /// Resolves a call of `name` with `args`, closed by `rparen`.
    ///
    /// Returns `None` when the name is undeclared or names a variable.
    /// Argument problems are reported one by one and never stop the scan.
    #[must_use]
    pub fn act_on_call(&mut self, name: Word, args: Vec<ExprId>, rparen: Word) -> Option<ExprId> {
        let text = self.text(name);
        let decl = match self.scopes.lookup(text) {
            Some(decl) => decl,
            None => {
                self.report(
                    Diagnostic::new(name.location(), Diag::SemaUndeclaredIdentifier)
                        .arg(text)
                        .range(name.span),
                );
                return None;
            }
        };
        let params = match self.ast.fun(decl) {
            Some(fun) => fun.params.clone(),
            None => {
                self.report(
                    Diagnostic::new(name.location(), Diag::SemaNotAFunction)
                        .arg(text)
                        .range(name.span),
                );
                return None;
            }
        };

        for (i, &arg) in args.iter().enumerate() {
            let arg_ty = self.ast.expr_type(arg);
            let arg_span = self.ast.expr(arg).span();
            if i == params.len() {
                self.report(
                    Diagnostic::new(arg_span.start, Diag::SemaTooManyArgs)
                        .arg(params.len())
                        .arg(args.len())
                        .range(arg_span),
                );
            }
            if arg_ty == ExprType::Void {
                self.report(
                    Diagnostic::new(arg_span.start, Diag::SemaVoidArgument)
                        .arg(i + 1)
                        .range(arg_span),
                );
                continue;
            }
            if let Some(&param) = params.get(i) {
                let param_ty = self.ast.decl(param).ty();
                if (param_ty == ExprType::Array) != (arg_ty == ExprType::Array) {
                    self.report(
                        Diagnostic::new(arg_span.start, Diag::SemaArgTypeMismatch)
                            .arg(i + 1)
                            .arg(arg_ty.to_string())
                            .arg(param_ty.to_string())
                            .range(arg_span),
                    );
                }
            }
        }
        if args.len() < params.len() {
            self.report(
                Diagnostic::new(rparen.location(), Diag::SemaTooFewArgs)
                    .arg(params.len())
                    .arg(args.len())
                    .range(rparen.span),
            );
        }

        let span = name.span.to(rparen.span);
        Some(self.ast.alloc_expr(Expr::Call(FunCall { decl, args, span })))
    }

    pub fn act_on_number(&mut self, word: Word) -> ExprId {
        let num = self.number_from_word(word);
        self.ast.alloc_expr(Expr::Number(num))
    }

    /// Converts a number word, reporting overflow and substituting 0.
    fn number_from_word(&self, word: Word) -> NumberLit {
        debug_assert!(word.is(Category::Number));
        let text = self.text(word);
        let value = match text.parse::<i32>() {
            Ok(value) => value,
            Err(_) => {
                self.report(
                    Diagnostic::new(word.location(), Diag::ParserNumberTooBig)
                        .arg(text)
                        .range(word.span),
                );
                0
            }
        };
        NumberLit {
            value,
            span: word.span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticBuffer;

    /// Words are located by searching for the n-th occurrence of their text.
    struct Words<'s> {
        source: &'s str,
    }

    impl<'s> Words<'s> {
        fn at(&self, category: Category, text: &str, nth: usize) -> Word {
            let start = self
                .source
                .match_indices(text)
                .nth(nth)
                .map(|(i, _)| i)
                .expect("word not in source");
            Word::new(category, Span::new(start, start + text.len()))
        }

        fn id(&self, text: &str) -> Word {
            self.at(Category::Identifier, text, 0)
        }
    }

    #[test]
    fn test_builtins_are_visible() {
        let diags = DiagnosticBuffer::new();
        let sema = Semantics::new("", &diags);
        let println = sema.scopes().lookup("println").expect("println");
        let fun = sema.ast().fun(println).expect("function");
        assert!(fun.builtin && fun.is_void());
        assert_eq!(fun.params.len(), 1);
        assert!(sema.scopes().lookup("input").is_some());
        assert!(sema.ast().program().decls.is_empty());
    }

    #[test]
    fn test_var_decl_void_and_redefinition() {
        let src = "void q; int x; int x;";
        let w = Words { source: src };
        let diags = DiagnosticBuffer::new();
        let mut sema = Semantics::new(src, &diags);

        sema.act_on_var_decl(w.at(Category::Void, "void", 0), w.id("q"), None);
        let first = sema.act_on_var_decl(
            w.at(Category::Int, "int", 0),
            w.at(Category::Identifier, "x", 0),
            None,
        );
        let second = sema.act_on_var_decl(
            w.at(Category::Int, "int", 1),
            w.at(Category::Identifier, "x", 1),
            None,
        );

        assert_eq!(
            diags.kinds(),
            vec![Diag::SemaVarDeclaredVoid, Diag::SemaRedefinition]
        );
        assert_ne!(first, second);
        assert_eq!(sema.scopes().lookup("x"), Some(first));
        let reported = diags.take();
        assert_eq!(reported[1].location, src.rfind('x').unwrap_or(0));
    }

    #[test]
    fn test_number_overflow_substitutes_zero() {
        let src = "4294967296";
        let diags = DiagnosticBuffer::new();
        let mut sema = Semantics::new(src, &diags);
        let id = sema.act_on_number(Word::new(Category::Number, Span::new(0, src.len())));
        assert_eq!(diags.kinds(), vec![Diag::ParserNumberTooBig]);
        match sema.ast().expr(id) {
            Expr::Number(num) => assert_eq!(num.value, 0),
            other => panic!("expected number, got {:?}", other),
        }
    }

    #[test]
    fn test_undeclared_and_wrong_kind() {
        let src = "y input";
        let w = Words { source: src };
        let diags = DiagnosticBuffer::new();
        let mut sema = Semantics::new(src, &diags);
        let paren = Word::new(Category::CloseParen, Span::new(7, 7));

        assert!(sema.act_on_var(w.id("y"), None).is_none());
        assert!(sema.act_on_var(w.id("input"), None).is_none());
        assert!(sema.act_on_call(w.id("y"), Vec::new(), paren).is_none());
        assert_eq!(
            diags.kinds(),
            vec![
                Diag::SemaUndeclaredIdentifier,
                Diag::SemaNotAVariable,
                Diag::SemaUndeclaredIdentifier,
            ]
        );
    }

    #[test]
    fn test_subscript_on_scalar_is_dropped() {
        let src = "int s; s 0 ]";
        let w = Words { source: src };
        let diags = DiagnosticBuffer::new();
        let mut sema = Semantics::new(src, &diags);
        sema.act_on_var_decl(w.at(Category::Int, "int", 0), w.id("s"), None);

        let index = sema.act_on_number(w.at(Category::Number, "0", 0));
        let close = w.at(Category::CloseBracket, "]", 0);
        let var = sema
            .act_on_var(w.at(Category::Identifier, "s", 1), Some((index, close)))
            .expect("resolves");

        assert_eq!(diags.kinds(), vec![Diag::SemaNotAnArray]);
        assert_eq!(sema.ast().expr(var).as_var_ref().and_then(|v| v.index), None);
        assert_eq!(sema.ast().expr_type(var), ExprType::Int);
    }

    #[test]
    fn test_return_checks_are_independent() {
        let src = "void f int a return";
        let w = Words { source: src };
        let diags = DiagnosticBuffer::new();
        let mut sema = Semantics::new(src, &diags);

        let fun = sema.act_on_fun_decl_start(w.at(Category::Void, "void", 0), w.id("f"));
        let depth = sema.enter_scope(ScopeFlags::FUN_PARAMS);
        let a = sema.act_on_param_decl(w.at(Category::Int, "int", 0), w.id("a"), true);
        sema.act_on_fun_params(fun, vec![a]);

        let array = sema.act_on_var(w.id("a"), None).expect("resolves");
        sema.act_on_return_stmt(w.at(Category::Return, "return", 0), Some(array));
        sema.leave_scope(depth);

        assert_eq!(
            diags.kinds(),
            vec![Diag::SemaVoidFunReturnsValue, Diag::SemaIncompatibleReturnType]
        );
    }
}
