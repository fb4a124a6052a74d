mod common;

use common::*;
use pruvo::ast::{IsMutable, RelOp};
use pruvo::legal::Sort;
use pruvo::raw::Entry;
use pruvo::typecheck::check_func_def;
use pruvo::Env;

fn func_def(entry: Entry) -> pruvo::raw::FuncDef {
    match entry {
        Entry::FuncDef(def) => def,
        _ => panic!("not a function definition"),
    }
}

fn lt0(x: &str) -> pruvo::raw::Expr {
    rel(RelOp::Lt, var(x), num(0))
}

#[test]
fn variable_not_found() {
    let f = func("f", vec![], i32_t(), vec![ret(var("y"))]);
    assert_eq!(check_err(vec![f]), "variable not found: y");
}

#[test]
fn conflicting_args() {
    let args = vec![arg(i32_t(), "x"), arg(i32_t(), "x")];
    let f = func("f", args, i32_t(), vec![ret(var("x"))]);
    assert_eq!(check_err(vec![f]), "conflicting declaration of x");
}

#[test]
fn missing_return() {
    let f = func("f", vec![arg(i32_t(), "x")], i32_t(), vec![]);
    assert_eq!(check_err(vec![f]), "missing return statement");

    let cond = if_else(lt0("x"), vec![ret(num(0))], None);
    let f = func("f", vec![arg(i32_t(), "x")], i32_t(), vec![cond]);
    assert_eq!(check_err(vec![f]), "missing return statement");

    let cond = if_else(lt0("x"), vec![ret(num(0))], Some(vec![ret(num(1))]));
    let f = func("f", vec![arg(i32_t(), "x")], i32_t(), vec![cond]);
    assert!(check(vec![f]).is_ok());
}

#[test]
fn unit_without_return() {
    let f = func("f", vec![], unit_t(), vec![]);
    assert!(check(vec![f]).is_ok());

    let f = func("f", vec![], i32_t(), vec![ret_unit()]);
    assert!(check_err(vec![f]).starts_with("return statement without value"));
}

#[test]
fn numeric_out_of_range() {
    let f = func("f", vec![], u8_t(), vec![ret(num(255))]);
    assert!(check(vec![f]).is_ok());

    let f = func("f", vec![], u8_t(), vec![ret(num(256))]);
    assert_eq!(check_err(vec![f]), "numeric literal out of range for type `u8`");

    let f = func("f", vec![], i8_t(), vec![ret(num(-129))]);
    assert_eq!(check_err(vec![f]), "numeric literal out of range for type `i8`");
}

#[test]
fn type_mismatch() {
    let f = func("f", vec![], i32_t(), vec![ret(bool_lit(true))]);
    let err = check(vec![f]).unwrap_err();
    assert_eq!(
        err.error.error,
        "expression of type `bool` does not typecheck with expected type `i32`"
    );
    assert!(err.to_string().contains("⊢ i32"));
}

#[test]
fn mutable_calls() {
    let read = || extern_decl(IsMutable::Yes, "read", vec![], i32_t());
    let f = func("f", vec![], i32_t(), vec![ret(call("read", vec![]))]);
    assert_eq!(
        check_err(vec![read(), f]),
        "cannot invoke mutable function inside immutable context"
    );

    let f = mutable_func("f", vec![], i32_t(), vec![ret(call("read", vec![]))]);
    assert!(check(vec![read(), f]).is_ok());
}

#[test]
fn expression_statement_must_be_call() {
    let stmts = vec![expr_stmt(var("x")), ret(var("x"))];
    let f = func("f", vec![arg(i32_t(), "x")], i32_t(), stmts);
    assert_eq!(check_err(vec![f]), "expression statement must be a function call");
}

#[test]
fn argument_count() {
    let g = func("g", vec![arg(i32_t(), "x")], i32_t(), vec![ret(var("x"))]);
    let f = func("f", vec![], i32_t(), vec![ret(call("g", vec![]))]);
    assert_eq!(
        check_err(vec![g, f]),
        "function expects 1 arguments, but 0 were given"
    );
}

#[test]
fn impossible_statement() {
    // if x < 0 and not (x < 0), then we are in an impossible branch
    let inner = if_else(not(lt0("x")), vec![impossible()], None);
    let outer = if_else(lt0("x"), vec![inner, ret(num(0))], None);
    let f = func("f", vec![arg(i32_t(), "x")], i32_t(), vec![outer, ret(num(1))]);
    assert!(check(vec![f]).is_ok());

    let cond = if_else(lt0("x"), vec![impossible()], None);
    let f = func("f", vec![arg(i32_t(), "x")], i32_t(), vec![cond, ret(num(1))]);
    assert_eq!(
        check_err(vec![f]),
        "cannot prove that this statement is unreachable"
    );
}

#[test]
fn forward_declaration() {
    let d = decl("f", vec![arg(i32_t(), "x")], i32_t());
    let f = func("f", vec![arg(i32_t(), "y")], i32_t(), vec![ret(var("y"))]);
    assert!(check(vec![d, f]).is_ok());

    let d = decl("f", vec![arg(i32_t(), "x")], i32_t());
    let f = func("f", vec![arg(u8_t(), "x")], i32_t(), vec![ret(num(0))]);
    assert_eq!(
        check_err(vec![d, f]),
        "definition of f does not match its declaration"
    );
}

#[test]
fn recursion() {
    let n = || var("n");
    let base = if_else(rel(RelOp::Eq, n(), num(0)), vec![ret(num(0))], None);
    let rec = ret(add(n(), call("sum", vec![sub(n(), num(1))])));
    let sum = func("sum", vec![arg(u64_t(), "n")], u64_t(), vec![base, rec]);
    assert!(check(vec![sum]).is_ok());
}

#[test]
fn redefinition() {
    let f = || func("f", vec![], i32_t(), vec![ret(num(0))]);
    assert_eq!(check_err(vec![f(), f()]), "redefinition of global f");
}

/// Slice `k` elements off the front of an array of three elements.
fn slice_off(k: i64) -> pruvo::raw::Entry {
    let ret_ty = array_t(i32_t(), num((3 - k).max(0)));
    let args = vec![auto(), auto(), var("xs"), num(k), init_list(vec![])];
    let arg = arg(array_t(i32_t(), num(3)), "xs");
    func("f", vec![arg], ret_ty, vec![ret(call("slice", args))])
}

#[test]
fn slice() {
    assert!(check(vec![slice_off(2)]).is_ok());
    assert!(check(vec![slice_off(3)]).is_ok());
    assert!(check_err(vec![slice_off(5)]).starts_with("cannot prove"));
}

#[test]
fn struct_member() {
    let point = struct_def("point", vec![arg(i32_t(), "x"), arg(i32_t(), "y")]);
    let ret_y = ret(member(var("p"), "y"));
    let get_y = func("get_y", vec![arg(global("point"), "p")], i32_t(), vec![ret_y]);
    assert!(check(vec![point.clone(), get_y]).is_ok());

    let ret_z = ret(member(var("p"), "z"));
    let get_z = func("get_z", vec![arg(global("point"), "p")], i32_t(), vec![ret_z]);
    assert_eq!(check_err(vec![point, get_z]), "no member named z");
}

#[test]
fn because_justifies_proof() {
    let x = || var("x");
    let nonzero = || rel(RelOp::Neq, x(), num(0));
    let args = vec![arg(i32_t(), "x"), arg(true_t(nonzero()), "p")];
    let g = || func("g", args.clone(), i32_t(), vec![ret(x())]);

    let proof = because(init_list(vec![]), nonzero());
    let f = func("f", vec![arg(i32_t(), "x")], i32_t(), vec![ret(call("g", vec![x(), proof]))]);
    assert!(check(vec![g(), f]).is_ok());

    let proof = init_list(vec![]);
    let f = func("f", vec![arg(i32_t(), "x")], i32_t(), vec![ret(call("g", vec![x(), proof]))]);
    assert_eq!(check_err(vec![g(), f]), "cannot prove `x != 0`");
}

#[test]
fn failed_definition_is_forgotten() {
    init_logger();
    let mut env = Env::new();
    let f = func_def(func("f", vec![], i32_t(), vec![ret(bool_lit(true))]));
    assert!(check_func_def(&mut env, &f).is_err());
    let g = func_def(func("g", vec![], i32_t(), vec![ret(call("f", vec![]))]));
    let err = check_func_def(&mut env, &g).unwrap_err();
    assert_eq!(err.error.error, "global not found: f");

    // a forward declaration survives a failed definition
    let mut env = Env::new();
    let d = decl("f", vec![], i32_t());
    pruvo::typecheck::check_module(&mut env, &module(vec![d])).unwrap();
    assert!(check_func_def(&mut env, &f).is_err());
    assert!(check_func_def(&mut env, &g).is_ok());
}

#[test]
fn annotated_types() {
    let x = || var("x");
    let f = func("f", vec![arg(i32_t(), "x")], i32_t(), vec![ret(add(x(), x()))]);
    let (_, module) = check(vec![f]).unwrap();
    let sum = returned(&module, "f");
    match sum.properties.sort() {
        Sort::Expr(ty) => assert_eq!(ty.to_string(), "i32"),
        Sort::Kind => panic!("term classified as a type"),
    }
    assert_eq!(sum.ty().map(|ty| ty.to_string()), Some("i32".to_string()));
}
