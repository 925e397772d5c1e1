//! Lexical scopes
//!
//! The analyzer keeps one [`ScopeStack`] for the whole compilation. Frames are
//! pushed when parsing enters a block (the program, a parameter list, a
//! function body, a nested `{}`) and popped when it leaves, strictly LIFO.
//!
//! Parameters and the locals of the function body live in two frames but
//! share one namespace: inserting into a frame whose parent is a parameter
//! frame also checks the parent's names. Nested blocks inside the body may
//! shadow parameters as usual.

use crate::ast::DeclId;
use rustc_hash::FxHashMap;
use std::ops::{BitOr, BitOrAssign};

/// Kind of block a scope frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScopeFlags(u8);

impl ScopeFlags {
    pub const NONE: ScopeFlags = ScopeFlags(0);
    pub const TOP_LEVEL: ScopeFlags = ScopeFlags(1 << 0);
    pub const FUN_PARAMS: ScopeFlags = ScopeFlags(1 << 1);
    /// Always entered together with [`ScopeFlags::COMPOUND`].
    pub const FUN_BODY: ScopeFlags = ScopeFlags(1 << 2);
    pub const COMPOUND: ScopeFlags = ScopeFlags(1 << 3);

    pub fn contains(self, other: ScopeFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for ScopeFlags {
    type Output = ScopeFlags;

    fn bitor(self, rhs: ScopeFlags) -> ScopeFlags {
        ScopeFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ScopeFlags {
    fn bitor_assign(&mut self, rhs: ScopeFlags) {
        self.0 |= rhs.0;
    }
}

#[derive(Debug)]
struct Frame {
    flags: ScopeFlags,
    symbols: FxHashMap<String, DeclId>,
}

impl Frame {
    fn new(flags: ScopeFlags) -> Self {
        Frame {
            flags,
            symbols: FxHashMap::default(),
        }
    }
}

/// Stack of scope frames, innermost last.
///
/// A new stack already holds the top-level frame, which is never popped.
#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack {
            frames: vec![Frame::new(ScopeFlags::TOP_LEVEL)],
        }
    }

    /// Number of frames currently on the stack.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current_flags(&self) -> ScopeFlags {
        self.innermost().flags
    }

    /// Pushes a frame and returns the new depth, which must be handed back to
    /// [`ScopeStack::leave`].
    pub fn enter(&mut self, mut flags: ScopeFlags) -> usize {
        if flags.contains(ScopeFlags::FUN_BODY) {
            flags |= ScopeFlags::COMPOUND;
        }
        self.frames.push(Frame::new(flags));
        self.frames.len()
    }

    /// Pops the innermost frame.
    ///
    /// # Panics
    ///
    /// When `depth` is not the innermost frame, or names the top-level frame.
    /// Unbalanced scopes are a bug in the caller, not a language error.
    pub fn leave(&mut self, depth: usize) {
        assert!(
            depth == self.frames.len() && depth > 1,
            "leaving scope at depth {} but the innermost scope is at depth {}",
            depth,
            self.frames.len()
        );
        self.frames.pop();
    }

    /// Binds `name` in the innermost frame.
    ///
    /// Returns the declaration now visible under `name` and whether the
    /// insertion happened. When the name is already bound in this frame, or in
    /// the parameter frame directly enclosing it, nothing changes and the
    /// existing declaration is returned with `false`.
    pub fn insert(&mut self, name: &str, decl: DeclId) -> (DeclId, bool) {
        if let Some(existing) = self.lookup_local(name) {
            return (existing, false);
        }
        if let Some(existing) = self.lookup_in_param_parent(name) {
            return (existing, false);
        }
        self.innermost_mut().symbols.insert(name.to_string(), decl);
        (decl, true)
    }

    /// Innermost binding of `name`, searching outwards.
    pub fn lookup(&self, name: &str) -> Option<DeclId> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.symbols.get(name).copied())
    }

    /// Binding of `name` in the innermost frame only.
    pub fn lookup_local(&self, name: &str) -> Option<DeclId> {
        self.innermost().symbols.get(name).copied()
    }

    fn lookup_in_param_parent(&self, name: &str) -> Option<DeclId> {
        let parent = self.frames.len().checked_sub(2).map(|i| &self.frames[i])?;
        if parent.flags.contains(ScopeFlags::FUN_PARAMS) {
            parent.symbols.get(name).copied()
        } else {
            None
        }
    }

    fn innermost(&self) -> &Frame {
        // The top-level frame is never popped.
        &self.frames[self.frames.len() - 1]
    }

    fn innermost_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Ast, Decl, VarDecl, TypeSpecifier};
    use crate::source::Span;

    fn decls(n: usize) -> Vec<DeclId> {
        let mut ast = Ast::new();
        (0..n)
            .map(|i| {
                ast.alloc_decl(Decl::Var(VarDecl {
                    name: format!("v{}", i),
                    span: Span::default(),
                    ty: TypeSpecifier::Int,
                    array_size: None,
                }))
            })
            .collect()
    }

    #[test]
    fn test_shadowing_and_restore() {
        let ids = decls(2);
        let mut scopes = ScopeStack::new();
        assert_eq!(scopes.insert("x", ids[0]), (ids[0], true));

        let depth = scopes.enter(ScopeFlags::COMPOUND);
        assert_eq!(scopes.insert("x", ids[1]), (ids[1], true));
        assert_eq!(scopes.lookup("x"), Some(ids[1]));

        scopes.leave(depth);
        assert_eq!(scopes.lookup("x"), Some(ids[0]));
    }

    #[test]
    fn test_redeclaration_in_same_frame() {
        let ids = decls(2);
        let mut scopes = ScopeStack::new();
        scopes.insert("x", ids[0]);
        assert_eq!(scopes.insert("x", ids[1]), (ids[0], false));
        assert_eq!(scopes.lookup("x"), Some(ids[0]));
    }

    #[test]
    fn test_body_local_collides_with_param() {
        let ids = decls(2);
        let mut scopes = ScopeStack::new();
        let params = scopes.enter(ScopeFlags::FUN_PARAMS);
        scopes.insert("x", ids[0]);

        let body = scopes.enter(ScopeFlags::FUN_BODY);
        assert!(scopes.current_flags().contains(ScopeFlags::COMPOUND));
        assert_eq!(scopes.insert("x", ids[1]), (ids[0], false));
        assert_eq!(scopes.lookup_local("x"), None);

        scopes.leave(body);
        scopes.leave(params);
    }

    #[test]
    fn test_nested_block_may_shadow_param() {
        let ids = decls(2);
        let mut scopes = ScopeStack::new();
        let params = scopes.enter(ScopeFlags::FUN_PARAMS);
        scopes.insert("x", ids[0]);
        let body = scopes.enter(ScopeFlags::FUN_BODY);
        let inner = scopes.enter(ScopeFlags::COMPOUND);

        assert_eq!(scopes.insert("x", ids[1]), (ids[1], true));

        scopes.leave(inner);
        scopes.leave(body);
        scopes.leave(params);
        assert_eq!(scopes.depth(), 1);
    }

    #[test]
    #[should_panic(expected = "leaving scope")]
    fn test_leave_out_of_order_panics() {
        let mut scopes = ScopeStack::new();
        let outer = scopes.enter(ScopeFlags::COMPOUND);
        let _inner = scopes.enter(ScopeFlags::COMPOUND);
        scopes.leave(outer);
    }

    #[test]
    fn test_flags() {
        let flags = ScopeFlags::FUN_BODY | ScopeFlags::COMPOUND;
        assert!(flags.contains(ScopeFlags::FUN_BODY));
        assert!(!flags.contains(ScopeFlags::FUN_PARAMS));
        assert!(flags.contains(ScopeFlags::NONE));
    }
}
