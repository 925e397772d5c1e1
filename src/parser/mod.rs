//! C- source code parser
//!
//! This module transforms C- source text into the typed AST:
//! - [`lexer`]: Tokenization (source text → words)
//! - [`parse`]: Parsing (words → semantic actions → AST)
//!
//! # Language
//!
//! C- is a teaching subset of C:
//! - Types: `int`, `void`, one-dimensional `int` arrays
//! - Statements: compound blocks, `if`/`else`, `while`, `return`, expressions
//! - Expressions: `+ - * /`, relational operators, assignment, calls, subscripts
//! - Comments: `/* ... */` only
//! - Built-ins: `int input(void)`, `void println(int value)`
//!
//! # Parser Implementation
//!
//! Hand-written predictive recursive descent parser with three words of
//! lookahead. The parser never builds nodes itself: every recognised
//! production is handed to [`crate::sema::Semantics`], which checks it and
//! returns the node.

mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;

pub use parse::{ParseError, Parser};
