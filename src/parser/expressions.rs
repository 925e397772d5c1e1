//! Expression parsing implementation
//!
//! This module handles parsing of C- expressions by recursive descent, one
//! function per precedence level.
//!
//! # Supported Expressions
//!
//! - Literals: decimal integers
//! - Variables and array subscripts: `x`, `a[i]`
//! - Function calls: `f(a, b)`
//! - Binary operators: `*` `/`, then `+` `-`, then one relational operator
//! - Assignment: `var = expression` (right associative)
//! - Parenthesised expressions
//!
//! # Grammar
//!
//! ```text
//! expression  ::= var "=" expression | simple_expr
//! simple_expr ::= additive [ relop additive ]
//! additive    ::= term ( ("+" | "-") term )*
//! term        ::= factor ( ("*" | "/") factor )*
//! factor      ::= "(" expression ")" | var | call | NUM
//! var         ::= ID [ "[" expression "]" ]
//! call        ::= ID "(" [ expression ( "," expression )* ] ")"
//! relop       ::= "<=" | "<" | ">" | ">=" | "==" | "!="
//! ```
//!
//! The left recursive `additive` and `term` rules are parsed with loops and
//! stay left associative. An assignment is recognised after the fact: the
//! parsed simple expression is a bare variable and the next word is `=`.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::ast::{Expr, ExprId};
use crate::diagnostics::Diag;
use crate::parser::lexer::{Category, TokenStream};
use crate::parser::parse::{ParseError, Parser};

const RELATIONAL_OPS: &[Category] = &[
    Category::LessEqual,
    Category::Less,
    Category::Greater,
    Category::GreaterEqual,
    Category::Equal,
    Category::NotEqual,
];

const ADDITIVE_OPS: &[Category] = &[Category::Plus, Category::Minus];

const MULTIPLICATIVE_OPS: &[Category] = &[Category::Multiply, Category::Divide];

impl<T: TokenStream> Parser<'_, T> {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<ExprId, ParseError> {
        let expr = self.parse_simple_expression()?;

        // A simple expression never contains `=`, so it stops right before
        // one when its whole text was a variable.
        if matches!(self.sema.ast().expr(expr), Expr::VarRef(_)) {
            if let Some(op) = self.try_consume(&[Category::Assign]) {
                let rhs = self.parse_expression()?;
                return Ok(self.sema.act_on_assign(expr, rhs, op));
            }
        }
        Ok(expr)
    }

    /// Parse additive expression with at most one relational operator
    fn parse_simple_expression(&mut self) -> Result<ExprId, ParseError> {
        let lhs = self.parse_additive_expression()?;
        match self.try_consume(RELATIONAL_OPS) {
            Some(op) => {
                let rhs = self.parse_additive_expression()?;
                Ok(self.sema.act_on_binary_expr(lhs, rhs, op))
            }
            None => Ok(lhs),
        }
    }

    fn parse_additive_expression(&mut self) -> Result<ExprId, ParseError> {
        let mut expr = self.parse_term()?;
        while let Some(op) = self.try_consume(ADDITIVE_OPS) {
            let rhs = self.parse_term()?;
            expr = self.sema.act_on_binary_expr(expr, rhs, op);
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<ExprId, ParseError> {
        let mut expr = self.parse_factor()?;
        while let Some(op) = self.try_consume(MULTIPLICATIVE_OPS) {
            let rhs = self.parse_factor()?;
            expr = self.sema.act_on_binary_expr(expr, rhs, op);
        }
        Ok(expr)
    }

    /// Parse factor: ( expr ), var, call or number
    fn parse_factor(&mut self) -> Result<ExprId, ParseError> {
        match self.peek().category {
            Category::Number => {
                let word = self.consume();
                Ok(self.sema.act_on_number(word))
            }
            Category::OpenParen => {
                self.consume();
                let expr = self.parse_expression()?;
                self.expect_and_consume(Category::CloseParen)?;
                Ok(expr)
            }
            Category::Identifier if self.lookahead(1).is(Category::OpenParen) => self.parse_call(),
            Category::Identifier => self.parse_var(),
            _ => Err(self.syntax_error(Diag::ParserExpectedExpression)),
        }
    }

    /// Parse variable: ID [ "[" expr "]" ]
    fn parse_var(&mut self) -> Result<ExprId, ParseError> {
        let name = self.expect_and_consume(Category::Identifier)?;

        let mut index = None;
        if self.try_consume(&[Category::OpenBracket]).is_some() {
            let expr = self.parse_expression()?;
            let close = self.expect_and_consume(Category::CloseBracket)?;
            index = Some((expr, close));
        }

        self.sema
            .act_on_var(name, index)
            .ok_or(ParseError::Unresolved(name.location()))
    }

    /// Parse function call: ID ( args )
    fn parse_call(&mut self) -> Result<ExprId, ParseError> {
        let name = self.expect_and_consume(Category::Identifier)?;
        self.expect_and_consume(Category::OpenParen)?;

        let mut args = Vec::new();
        if !self.check(Category::CloseParen) {
            args.push(self.parse_expression()?);
            while self.try_consume(&[Category::Comma]).is_some() {
                args.push(self.parse_expression()?);
            }
        }
        let rparen = self.expect_and_consume(Category::CloseParen)?;

        self.sema
            .act_on_call(name, args, rparen)
            .ok_or(ParseError::Unresolved(name.location()))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Ast, BinOp, Expr, ExprId, ExprType, Stmt};
    use crate::compile;
    use crate::diagnostics::{Diag, DiagnosticBuffer};
    use crate::parser::parse::ParseError;

    /// Compiles `void main(void) { int x; int a[4]; <stmt> }` and returns the
    /// expression of the single expression statement.
    fn parse_expr(stmt: &str, diags: &DiagnosticBuffer) -> (Ast, ExprId) {
        let source = format!("void main(void) {{ int x; int a[4]; {} }}", stmt);
        let ast = compile(&source, diags).unwrap();
        let main = ast.find_function("main").unwrap();
        let body = ast.fun(main).unwrap().body.unwrap();
        let expr = match ast.stmt(body) {
            Stmt::Compound(comp) => match ast.stmt(comp.stmts[0]) {
                Stmt::Expr(expr) => *expr,
                other => panic!("expected expression statement, got {:?}", other),
            },
            other => panic!("expected compound, got {:?}", other),
        };
        (ast, expr)
    }

    fn binary(ast: &Ast, id: ExprId) -> (BinOp, ExprId, ExprId) {
        match ast.expr(id) {
            Expr::Binary(b) => (b.op, b.lhs, b.rhs),
            other => panic!("expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_and_associativity() {
        let diags = DiagnosticBuffer::new();
        let (ast, expr) = parse_expr("x = 1 - 2 - 3 * 4 < 5;", &diags);
        assert!(diags.is_empty());

        let (op, _, rhs) = binary(&ast, expr);
        assert_eq!(op, BinOp::Assign);
        let (op, lhs, _) = binary(&ast, rhs);
        assert_eq!(op, BinOp::Lt);
        // (1 - 2) - (3 * 4)
        let (op, left, right) = binary(&ast, lhs);
        assert_eq!(op, BinOp::Sub);
        assert_eq!(binary(&ast, left).0, BinOp::Sub);
        assert_eq!(binary(&ast, right).0, BinOp::Mul);
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let diags = DiagnosticBuffer::new();
        let (ast, expr) = parse_expr("x = a[1] = 2;", &diags);
        assert!(diags.is_empty());
        let (_, lhs, rhs) = binary(&ast, expr);
        assert!(ast.expr(lhs).as_var_ref().is_some());
        assert_eq!(binary(&ast, rhs).0, BinOp::Assign);
    }

    #[test]
    fn test_parenthesised_var_is_not_assignable() {
        let diags = DiagnosticBuffer::new();
        assert_eq!(
            compile("void main(void) { int x; (x + 1) = 2; }", &diags).unwrap_err(),
            ParseError::Syntax(33)
        );
        assert_eq!(diags.kinds(), vec![Diag::ParserExpectedToken]);
    }

    #[test]
    fn test_call_and_subscript_types() {
        let diags = DiagnosticBuffer::new();
        let (ast, expr) = parse_expr("x = input() + a[2];", &diags);
        assert!(diags.is_empty());
        let (_, _, sum) = binary(&ast, expr);
        let (_, call, elem) = binary(&ast, sum);
        assert_eq!(ast.expr_type(call), ExprType::Int);
        assert_eq!(ast.expr_type(elem), ExprType::Int);
    }

    #[test]
    fn test_array_operand_is_diagnosed() {
        let diags = DiagnosticBuffer::new();
        parse_expr("x = a + 1;", &diags);
        assert_eq!(diags.kinds(), vec![Diag::SemaOperandNotInt]);
    }

    #[test]
    fn test_undeclared_name_aborts() {
        let diags = DiagnosticBuffer::new();
        let err = compile("void main(void) { y = 1; }", &diags).unwrap_err();
        assert_eq!(err, ParseError::Unresolved(18));
        assert_eq!(diags.kinds(), vec![Diag::SemaUndeclaredIdentifier]);
    }
}
