//! Statement parsing implementation
//!
//! This module handles parsing of all C- statement types:
//!
//! - Compound statements: `{ local declarations, then statements }`
//! - Selection: `if (cond) stmt [else stmt]`
//! - Iteration: `while (cond) stmt`
//! - Return: `return;`, `return expr;`
//! - Expression statements and the null statement `;`
//!
//! # Grammar
//!
//! ```text
//! statement      ::= expr_stmt | compound_stmt | selection_stmt
//!                  | iteration_stmt | return_stmt
//! compound_stmt  ::= "{" var_declaration* statement* "}"
//! expr_stmt      ::= expression ";" | ";"
//! selection_stmt ::= "if" "(" expression ")" statement [ "else" statement ]
//! iteration_stmt ::= "while" "(" expression ")" statement
//! return_stmt    ::= "return" [ expression ] ";"
//! ```
//!
//! An `else` always belongs to the nearest `if` without one.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::ast::StmtId;
use crate::diagnostics::Diag;
use crate::parser::lexer::{Category, TokenStream};
use crate::parser::parse::{ParseError, Parser};
use crate::sema::ScopeFlags;

impl<T: TokenStream> Parser<'_, T> {
    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Result<StmtId, ParseError> {
        match self.peek().category {
            Category::Identifier | Category::Number | Category::OpenParen | Category::Semicolon => {
                self.parse_expr_stmt()
            }
            Category::OpenCurly => self.parse_compound_stmt(ScopeFlags::COMPOUND),
            Category::If => self.parse_selection_stmt(),
            Category::While => self.parse_iteration_stmt(),
            Category::Return => self.parse_return_stmt(),
            _ => Err(self.syntax_error(Diag::ParserExpectedStatement)),
        }
    }

    /// Parse compound statement: { declarations statements }
    ///
    /// The block gets its own scope, entered with `flags`.
    pub(crate) fn parse_compound_stmt(&mut self, flags: ScopeFlags) -> Result<StmtId, ParseError> {
        let open = self.expect_and_consume(Category::OpenCurly)?;

        let mut scope = self.enter_scope(flags);

        // Statements never start with a type, so declarations end at the
        // first word that is not one.
        let mut decls = Vec::new();
        while scope.check(Category::Int) || scope.check(Category::Void) {
            decls.push(scope.parse_var_declaration()?);
        }

        let mut stmts = Vec::new();
        while !scope.check(Category::CloseCurly) {
            stmts.push(scope.parse_statement()?);
        }
        let close = scope.consume();
        drop(scope);

        Ok(self
            .sema
            .act_on_compound_stmt(decls, stmts, open.span.to(close.span)))
    }

    /// Parse expression statement or null statement
    fn parse_expr_stmt(&mut self) -> Result<StmtId, ParseError> {
        if let Some(semi) = self.try_consume(&[Category::Semicolon]) {
            return Ok(self.sema.act_on_null_stmt(semi));
        }

        let expr = self.parse_expression()?;
        self.expect_and_consume(Category::Semicolon)?;
        Ok(self.sema.act_on_expr_stmt(expr))
    }

    /// Parse if statement: if ( expr ) stmt [else stmt]
    fn parse_selection_stmt(&mut self) -> Result<StmtId, ParseError> {
        let if_word = self.expect_and_consume(Category::If)?;
        self.expect_and_consume(Category::OpenParen)?;
        let cond = self.parse_expression()?;
        self.expect_and_consume(Category::CloseParen)?;

        let then_stmt = self.parse_statement()?;
        let else_stmt = match self.try_consume(&[Category::Else]) {
            Some(_) => Some(self.parse_statement()?),
            None => None,
        };

        Ok(self
            .sema
            .act_on_selection_stmt(if_word, cond, then_stmt, else_stmt))
    }

    /// Parse while loop: while ( expr ) stmt
    fn parse_iteration_stmt(&mut self) -> Result<StmtId, ParseError> {
        let while_word = self.expect_and_consume(Category::While)?;
        self.expect_and_consume(Category::OpenParen)?;
        let cond = self.parse_expression()?;
        self.expect_and_consume(Category::CloseParen)?;
        let body = self.parse_statement()?;

        Ok(self.sema.act_on_iteration_stmt(while_word, cond, body))
    }

    /// Parse return statement: return [expr] ;
    fn parse_return_stmt(&mut self) -> Result<StmtId, ParseError> {
        let retn = self.expect_and_consume(Category::Return)?;

        let expr = if self.check(Category::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_and_consume(Category::Semicolon)?;

        Ok(self.sema.act_on_return_stmt(retn, expr))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Ast, Stmt, StmtId, StmtKind};
    use crate::compile;
    use crate::diagnostics::{Diag, DiagnosticBuffer};

    fn main_body(ast: &Ast) -> Vec<StmtId> {
        let main = ast.find_function("main").unwrap();
        match ast.stmt(ast.fun(main).unwrap().body.unwrap()) {
            Stmt::Compound(comp) => comp.stmts.clone(),
            other => panic!("expected compound statement, got {:?}", other),
        }
    }

    #[test]
    fn test_dangling_else_binds_inner_if() {
        let diags = DiagnosticBuffer::new();
        let ast = compile(
            "void main(void) { int a; int b; if (a) if (b) a = 1; else a = 2; }",
            &diags,
        )
        .unwrap();
        assert!(diags.is_empty());

        let body = main_body(&ast);
        let outer = match ast.stmt(body[0]) {
            Stmt::Selection(sel) => sel,
            other => panic!("expected if, got {:?}", other),
        };
        assert!(outer.else_stmt.is_none());
        match ast.stmt(outer.then_stmt) {
            Stmt::Selection(inner) => assert!(inner.else_stmt.is_some()),
            other => panic!("expected inner if, got {:?}", other),
        }
    }

    #[test]
    fn test_statement_kinds() {
        let diags = DiagnosticBuffer::new();
        let ast = compile(
            "void main(void) { int i; ; { i = 0; } while (i < 3) i = i + 1; return; }",
            &diags,
        )
        .unwrap();
        assert!(diags.is_empty(), "{:?}", diags.kinds());

        let kinds: Vec<StmtKind> = main_body(&ast).iter().map(|&s| ast.stmt(s).kind()).collect();
        assert_eq!(
            kinds,
            vec![
                StmtKind::Null,
                StmtKind::Compound,
                StmtKind::Iteration,
                StmtKind::Return
            ]
        );
    }

    #[test]
    fn test_declaration_after_statement_is_syntax_error() {
        let diags = DiagnosticBuffer::new();
        assert!(compile("void main(void) { ; int x; }", &diags).is_err());
        assert_eq!(diags.kinds(), vec![Diag::ParserExpectedStatement]);
    }

    #[test]
    fn test_return_checks() {
        let diags = DiagnosticBuffer::new();
        compile(
            "int f(void) { return; }\n\
             void g(void) { return 1; }\n\
             void main(void) { }",
            &diags,
        )
        .unwrap();
        assert_eq!(
            diags.kinds(),
            vec![Diag::SemaFunMustReturnValue, Diag::SemaVoidFunReturnsValue]
        );
    }

    #[test]
    fn test_condition_must_be_int() {
        let diags = DiagnosticBuffer::new();
        compile(
            "void main(void) { int a[2]; if (a) ; while (println(1)) ; }",
            &diags,
        )
        .unwrap();
        assert_eq!(
            diags.kinds(),
            vec![Diag::SemaConditionNotInt, Diag::SemaConditionNotInt]
        );
    }

    #[test]
    fn test_array_as_statement() {
        let diags = DiagnosticBuffer::new();
        compile("void main(void) { int a[2]; a; a[0]; }", &diags).unwrap();
        assert_eq!(diags.kinds(), vec![Diag::SemaArrayStatement]);
    }
}
