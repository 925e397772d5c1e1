// Symbol table properties through the public API

use cminus::ast::DeclId;
use cminus::compile;
use cminus::diagnostics::DiagnosticBuffer;
use cminus::sema::{ScopeFlags, ScopeStack};

/// Three distinct declaration handles to bind under arbitrary names.
fn handles() -> (DeclId, DeclId, DeclId) {
    let diags = DiagnosticBuffer::new();
    let ast = compile("int a; int b; void main(void) { }", &diags).expect("Parsing failed");
    let decls = &ast.program().decls;
    (decls[0], decls[1], decls[2])
}

#[test]
fn test_shadowing_and_restore() {
    let (outer, inner, _) = handles();
    let mut scopes = ScopeStack::new();
    assert_eq!(scopes.insert("x", outer), (outer, true));

    let depth = scopes.enter(ScopeFlags::COMPOUND);
    assert_eq!(scopes.insert("x", inner), (inner, true));
    assert_eq!(scopes.lookup("x"), Some(inner));

    scopes.leave(depth);
    assert_eq!(scopes.lookup("x"), Some(outer));
}

#[test]
fn test_parameter_and_body_share_names() {
    let (param, local, _) = handles();
    let mut scopes = ScopeStack::new();

    let params = scopes.enter(ScopeFlags::FUN_PARAMS);
    scopes.insert("x", param);
    let body = scopes.enter(ScopeFlags::FUN_BODY);
    assert_eq!(scopes.insert("x", local), (param, false));

    // a block nested in the body may shadow the parameter again
    let block = scopes.enter(ScopeFlags::COMPOUND);
    assert_eq!(scopes.insert("x", local), (local, true));
    scopes.leave(block);

    scopes.leave(body);
    scopes.leave(params);
    assert_eq!(scopes.lookup("x"), None);
}

#[test]
fn test_redeclaration_in_same_scope() {
    let (first, second, _) = handles();
    let mut scopes = ScopeStack::new();
    assert_eq!(scopes.insert("x", first), (first, true));
    assert_eq!(scopes.insert("x", second), (first, false));
    assert_eq!(scopes.lookup("x"), Some(first));
}

#[test]
fn test_lookup_local_ignores_outer_scopes() {
    let (outer, _, _) = handles();
    let mut scopes = ScopeStack::new();
    scopes.insert("x", outer);
    let depth = scopes.enter(ScopeFlags::COMPOUND);
    assert_eq!(scopes.lookup_local("x"), None);
    assert_eq!(scopes.lookup("x"), Some(outer));
    scopes.leave(depth);
}

#[test]
fn test_body_scope_is_compound() {
    let mut scopes = ScopeStack::new();
    assert!(scopes.current_flags().contains(ScopeFlags::TOP_LEVEL));
    let params = scopes.enter(ScopeFlags::FUN_PARAMS);
    let body = scopes.enter(ScopeFlags::FUN_BODY);
    assert!(scopes.current_flags().contains(ScopeFlags::COMPOUND));
    assert_eq!(scopes.depth(), 3);
    scopes.leave(body);
    scopes.leave(params);
    assert_eq!(scopes.depth(), 1);
}

#[test]
#[should_panic(expected = "leaving scope")]
fn test_leaving_top_level_panics() {
    let mut scopes = ScopeStack::new();
    scopes.leave(1);
}
