//! Declaration parsing implementation
//!
//! This module handles parsing of declarations in C- programs:
//!
//! - Variable declarations: `int x;`, `int x[10];`
//! - Function declarations: `type name(params) { ... }`
//! - Function parameters: `void`, or a comma separated list of `int x` / `int x[]`
//!
//! # Grammar
//!
//! ```text
//! declaration     ::= var_declaration | fun_declaration
//! var_declaration ::= type ID ";" | type ID "[" NUM "]" ";"
//! fun_declaration ::= type ID "(" params ")" compound_stmt
//! params          ::= "void" | param ("," param)*
//! param           ::= type ID | type ID "[" "]"
//! type            ::= "int" | "void"
//! ```
//!
//! Variable and function declarations share the `type ID` prefix, so the
//! choice is made by looking at the third word.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::ast::DeclId;
use crate::parser::lexer::{Category, TokenStream};
use crate::parser::parse::{ParseError, Parser};
use crate::sema::ScopeFlags;

impl<T: TokenStream> Parser<'_, T> {
    /// Parse a declaration (variable or function)
    pub(crate) fn parse_declaration(&mut self) -> Result<DeclId, ParseError> {
        if self.lookahead(2).is(Category::OpenParen) {
            self.parse_fun_declaration()
        } else {
            self.parse_var_declaration()
        }
    }

    /// Parse variable declaration: type ID [ "[" NUM "]" ] ;
    pub(crate) fn parse_var_declaration(&mut self) -> Result<DeclId, ParseError> {
        let ty = self.expect_and_consume_type()?;
        let name = self.expect_and_consume(Category::Identifier)?;

        let mut array_size = None;
        if self.try_consume(&[Category::OpenBracket]).is_some() {
            array_size = Some(self.expect_and_consume(Category::Number)?);
            self.expect_and_consume(Category::CloseBracket)?;
        }

        self.expect_and_consume(Category::Semicolon)?;
        Ok(self.sema.act_on_var_decl(ty, name, array_size))
    }

    /// Parse function declaration: type ID ( params ) compound_stmt
    ///
    /// The parameter scope stays open while the body is parsed, so the body
    /// sees the parameters and cannot redeclare them.
    pub(crate) fn parse_fun_declaration(&mut self) -> Result<DeclId, ParseError> {
        let ty = self.expect_and_consume_type()?;
        let name = self.expect_and_consume(Category::Identifier)?;
        self.expect_and_consume(Category::OpenParen)?;

        let fun = self.sema.act_on_fun_decl_start(ty, name);

        let mut scope = self.enter_scope(ScopeFlags::FUN_PARAMS);
        let params = scope.parse_params()?;
        scope.expect_and_consume(Category::CloseParen)?;
        scope.sema.act_on_fun_params(fun, params);

        let body = scope.parse_compound_stmt(ScopeFlags::FUN_BODY | ScopeFlags::COMPOUND)?;
        drop(scope);

        Ok(self.sema.act_on_fun_decl_end(fun, body))
    }

    /// Parse parameter list, stopping before the closing parenthesis
    fn parse_params(&mut self) -> Result<Vec<DeclId>, ParseError> {
        // A lone `void` means no parameters; `void x` is a (void) parameter.
        if self.lookahead(0).is(Category::Void) && self.lookahead(1).is(Category::CloseParen) {
            self.consume();
            return Ok(Vec::new());
        }

        let mut params = vec![self.parse_param()?];
        while !self.check(Category::CloseParen) {
            self.expect_and_consume(Category::Comma)?;
            params.push(self.parse_param()?);
        }
        Ok(params)
    }

    /// Parse a single parameter: type ID [ "[" "]" ]
    fn parse_param(&mut self) -> Result<DeclId, ParseError> {
        let ty = self.expect_and_consume_type()?;
        let name = self.expect_and_consume(Category::Identifier)?;

        let is_array = self.try_consume(&[Category::OpenBracket]).is_some();
        if is_array {
            self.expect_and_consume(Category::CloseBracket)?;
        }

        Ok(self.sema.act_on_param_decl(ty, name, is_array))
    }
}
