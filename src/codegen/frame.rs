//! Stack frame layout
//!
//! ```text
//!          ┌──────────────┐
//!  4n($fp) │ argument n   │  pushed first by the caller
//!          │ ...          │
//!   4($fp) │ argument 1   │  pushed last
//!   0($fp) │ $ra          │
//!  -4($fp) │ caller's $fp │
//!  -8($fp) │ locals ...   │  every local of every nested block,
//!          │              │  in declaration order, never reused
//!          └──────────────┘
//! ```
//!
//! An array local of `n` words keeps element 0 at the lowest address.

use crate::ast::visit::Visitor;
use crate::ast::{Ast, DeclId, VarDecl};
use rustc_hash::FxHashMap;

/// Where a variable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// `.data` label `g_<name>`.
    Global,
    /// One word at `offset($fp)`. For array parameters the word holds the
    /// address of element 0.
    Word(i64),
    /// Local array with element 0 at `offset($fp)`.
    Array(i64),
}

/// Locals and parameters of one function.
#[derive(Debug, Default)]
pub(crate) struct FrameLayout {
    pub slots: FxHashMap<DeclId, Slot>,
    /// Words reserved below the saved `$fp`.
    pub words: u64,
}

impl FrameLayout {
    const FIRST_LOCAL: i64 = -8;

    pub fn new(params: &[DeclId]) -> Self {
        let mut layout = FrameLayout::default();
        for (i, &param) in params.iter().enumerate() {
            layout.slots.insert(param, Slot::Word(4 * (i as i64 + 1)));
        }
        layout
    }

    fn next_offset(&self) -> i64 {
        Self::FIRST_LOCAL - 4 * self.words as i64
    }
}

impl Visitor for FrameLayout {
    fn visit_var_decl(&mut self, _ast: &Ast, id: DeclId, decl: &VarDecl) {
        let top = self.next_offset();
        let slot = match decl.array_size {
            Some(size) => {
                let len = i64::from(size.value.max(1));
                self.words += len as u64;
                Slot::Array(top - 4 * (len - 1))
            }
            None => {
                self.words += 1;
                Slot::Word(top)
            }
        };
        self.slots.insert(id, slot);
    }
}
