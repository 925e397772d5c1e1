//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including the error type, the lookahead buffer, helper methods, and the
//! main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser is a predictive recursive descent parser:
//! - This module: Parser struct, word helpers, scope guard and coordination
//! - `declarations`: program, variable, function and parameter declarations
//! - `statements`: compound, selection, iteration, return and expression statements
//! - `expressions`: assignment, relational, additive and multiplicative expressions
//!
//! # Lookahead
//!
//! Three words are visible at any time: the peek word and two more behind it.
//! Two productions need them:
//! - a declaration is a function declaration when its third word is `(`
//! - an identifier in a factor is a call when the word after it is `(`
//!
//! Everything else is decided by the peek word alone.
//!
//! # Failure
//!
//! Semantic problems are reported by the analyzer and never stop the parse.
//! A syntax error is reported once and the whole parse gives up; the error
//! carries no message because the diagnostic already went to the sink.
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.

use crate::ast::Ast;
use crate::diagnostics::{Diag, Diagnostic, DiagnosticSink};
use crate::parser::lexer::{Category, TokenStream, Word};
use crate::sema::{ScopeFlags, Semantics};
use std::ops::{Deref, DerefMut};
use thiserror::Error;

/// Parser error type
///
/// Both variants carry the byte offset where parsing stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A word did not fit the grammar.
    #[error("syntax error at offset {0}")]
    Syntax(usize),
    /// A name did not resolve to a declaration of the right kind.
    #[error("unresolved name at offset {0}")]
    Unresolved(usize),
}

impl ParseError {
    pub fn location(&self) -> usize {
        match *self {
            ParseError::Syntax(loc) | ParseError::Unresolved(loc) => loc,
        }
    }
}

/// Predictive recursive descent parser for C-
pub struct Parser<'a, T: TokenStream> {
    stream: T,
    /// The next word to be consumed.
    peek_word: Word,
    /// The two words after the peek word.
    lookahead_words: [Word; 2],
    pub(crate) sema: Semantics<'a>,
    diags: &'a dyn DiagnosticSink,
}

impl<'a, T: TokenStream> Parser<'a, T> {
    pub fn new(mut stream: T, sema: Semantics<'a>, diags: &'a dyn DiagnosticSink) -> Self {
        let peek_word = stream.next_word();
        let lookahead_words = [stream.next_word(), stream.next_word()];
        Self {
            stream,
            peek_word,
            lookahead_words,
            sema,
            diags,
        }
    }

    /// Parse the entire program.
    ///
    /// Returns the finished tree even when semantic diagnostics were
    /// reported; only a syntax error or an unresolved name yields `Err`.
    pub fn parse_program(&mut self) -> Result<Ast, ParseError> {
        self.sema.act_on_program_start();
        loop {
            let decl = self.parse_declaration()?;
            self.sema.act_on_top_level_decl(decl);
            if self.is_at_end() {
                break;
            }
        }
        Ok(self.sema.act_on_program_end())
    }

    // ===== Helper methods =====

    /// Word `n` positions ahead; `lookahead(0)` is the peek word.
    pub(crate) fn lookahead(&self, n: usize) -> Word {
        match n {
            0 => self.peek_word,
            _ => self.lookahead_words[n - 1],
        }
    }

    pub(crate) fn peek(&self) -> Word {
        self.peek_word
    }

    pub(crate) fn check(&self, category: Category) -> bool {
        self.peek_word.is(category)
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.check(Category::Eof)
    }

    /// Consume the peek word regardless of its category.
    pub(crate) fn consume(&mut self) -> Word {
        let eaten = self.peek_word;
        self.peek_word = self.lookahead_words[0];
        self.lookahead_words[0] = self.lookahead_words[1];
        self.lookahead_words[1] = self.stream.next_word();
        eaten
    }

    /// Consume the peek word if its category is any of `categories`.
    pub(crate) fn try_consume(&mut self, categories: &[Category]) -> Option<Word> {
        if self.peek_word.is_any_of(categories) {
            Some(self.consume())
        } else {
            None
        }
    }

    pub(crate) fn expect_and_consume(&mut self, category: Category) -> Result<Word, ParseError> {
        if self.check(category) {
            return Ok(self.consume());
        }
        let found = self.peek_word;
        self.diags.report(
            Diagnostic::new(found.location(), Diag::ParserExpectedToken)
                .arg(category)
                .arg(found.category)
                .range(found.span),
        );
        Err(ParseError::Syntax(found.location()))
    }

    /// `int` or `void`
    pub(crate) fn expect_and_consume_type(&mut self) -> Result<Word, ParseError> {
        match self.try_consume(&[Category::Int, Category::Void]) {
            Some(word) => Ok(word),
            None => Err(self.syntax_error(Diag::ParserExpectedType)),
        }
    }

    /// Report `kind` at the peek word, which is passed as the only argument.
    pub(crate) fn syntax_error(&self, kind: Diag) -> ParseError {
        let found = self.peek_word;
        self.diags.report(
            Diagnostic::new(found.location(), kind)
                .arg(found.category)
                .range(found.span),
        );
        ParseError::Syntax(found.location())
    }

    /// Enter a scope that stays active until the returned guard is dropped.
    pub(crate) fn enter_scope(&mut self, flags: ScopeFlags) -> ParseScope<'_, 'a, T> {
        let depth = self.sema.enter_scope(flags);
        ParseScope {
            parser: self,
            depth,
        }
    }
}

/// Scope guard handed out by [`Parser::enter_scope`].
///
/// Dereferences to the parser, so parsing continues through the guard. The
/// scope is left when the guard is dropped, on success and on `?` alike.
pub(crate) struct ParseScope<'p, 'a, T: TokenStream> {
    parser: &'p mut Parser<'a, T>,
    depth: usize,
}

impl<'a, T: TokenStream> Deref for ParseScope<'_, 'a, T> {
    type Target = Parser<'a, T>;

    fn deref(&self) -> &Self::Target {
        &*self.parser
    }
}

impl<'a, T: TokenStream> DerefMut for ParseScope<'_, 'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.parser
    }
}

impl<T: TokenStream> Drop for ParseScope<'_, '_, T> {
    fn drop(&mut self) {
        self.parser.sema.leave_scope(self.depth);
    }
}
