//! Semantic analysis
//!
//! - [`scope`]: the lexical scope stack
//! - [`analyzer`]: semantic actions invoked by the parser, which build the
//!   typed AST

pub mod analyzer;
pub mod scope;

pub use analyzer::Semantics;
pub use scope::{ScopeFlags, ScopeStack};
