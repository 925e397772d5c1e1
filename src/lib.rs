//! # Introduction
//!
//! `cminus` is a single-pass front end for C-, the small C subset used in
//! compiler courses, plus a MIPS back end for the SPIM/MARS simulators.
//!
//! ## Compilation pipeline
//!
//! ```text
//! Source → Scanner → Parser ⇄ Semantics → AST → Dump / Codegen
//! ```
//!
//! 1. [`parser::lexer`] turns the source into words on demand and reports
//!    malformed input without stopping.
//! 2. [`parser`] recognises the grammar with three words of lookahead and
//!    calls the `act_on_*` actions of [`sema::Semantics`] for each production.
//! 3. [`sema`] resolves names through the [`sema::ScopeStack`], checks types
//!    and builds the nodes of the typed [`ast::Ast`].
//! 4. [`ast::dump`] prints the tree; [`codegen`] emits assembly for programs
//!    without diagnostics.
//!
//! Language errors are reported through a [`diagnostics::DiagnosticSink`]
//! rather than returned, so one run can surface many of them.
//! [`diagnostics::render`] formats them for a terminal.
//!
//! ## Supported language
//!
//! Types: `int`, `void`, one-dimensional `int` arrays.
//! Control flow: `if/else`, `while`, `return`.
//! Built-ins: `input`, `println`.

pub mod ast;
pub mod codegen;
pub mod diagnostics;
pub mod parser;
pub mod sema;
pub mod source;

use ast::Ast;
use diagnostics::DiagnosticSink;
use parser::lexer::Scanner;
use parser::{ParseError, Parser};
use sema::Semantics;

/// Scan, parse and analyse `source` in one pass.
///
/// Diagnostics go to `diags`. The tree is returned whenever parsing ran to
/// the end, even if semantic errors were reported along the way.
pub fn compile<'a>(source: &'a str, diags: &'a dyn DiagnosticSink) -> Result<Ast, ParseError> {
    let scanner = Scanner::new(source, diags);
    let sema = Semantics::new(source, diags);
    let mut parser = Parser::new(scanner, sema, diags);
    parser.parse_program()
}
