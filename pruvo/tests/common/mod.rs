//! Builders for raw syntax trees.
#![allow(dead_code)]

use pruvo::ast::{ArithOp, IsMutable, Qty, RelOp, Sign, Width};
use pruvo::legal;
use pruvo::ast;
use pruvo::raw::{Abs, Body, Entry, Expr, ExprValue, FuncArg, FuncDecl, FuncDef, IfElse, Module, Pi};
use pruvo::raw::{Stmt, StmtValue, TypeDef, TypeDefValue};
use pruvo::{normalize, typecheck, Env, GlobalRef, IndexedVar, SourceLoc, TypeError};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn loc() -> SourceLoc {
    SourceLoc::default()
}

pub fn e(value: ExprValue) -> Expr {
    Expr::new(loc(), value)
}

pub fn var(name: &str) -> Expr {
    e(ExprValue::Var(IndexedVar::new(name)))
}

pub fn global(name: &str) -> Expr {
    e(ExprValue::Global(GlobalRef::new(name)))
}

pub fn num(n: i64) -> Expr {
    e(ExprValue::Numeric(n.into()))
}

pub fn bool_lit(b: bool) -> Expr {
    e(ExprValue::BoolLit(b))
}

pub fn auto() -> Expr {
    e(ExprValue::Auto)
}

pub fn int_t(sign: Sign, width: Width) -> Expr {
    e(ExprValue::IntegerT(sign, width))
}

pub fn i8_t() -> Expr {
    int_t(Sign::Signed, Width::W8)
}

pub fn i32_t() -> Expr {
    int_t(Sign::Signed, Width::W32)
}

pub fn u8_t() -> Expr {
    int_t(Sign::Unsigned, Width::W8)
}

pub fn u32_t() -> Expr {
    int_t(Sign::Unsigned, Width::W32)
}

pub fn u64_t() -> Expr {
    int_t(Sign::Unsigned, Width::W64)
}

pub fn bool_t() -> Expr {
    e(ExprValue::BoolT)
}

pub fn unit_t() -> Expr {
    e(ExprValue::UnitT)
}

pub fn true_t(cond: Expr) -> Expr {
    e(ExprValue::TrueT(Box::new(cond)))
}

pub fn array_t(ty: Expr, size: Expr) -> Expr {
    e(ExprValue::ArrayT(Box::new(ty), Box::new(size)))
}

pub fn arith(op: ArithOp, x: Expr, y: Expr) -> Expr {
    e(ExprValue::Arith(op, Box::new(x), Box::new(y)))
}

pub fn add(x: Expr, y: Expr) -> Expr {
    arith(ArithOp::Plus, x, y)
}

pub fn sub(x: Expr, y: Expr) -> Expr {
    arith(ArithOp::Minus, x, y)
}

pub fn rel(op: RelOp, x: Expr, y: Expr) -> Expr {
    e(ExprValue::Rel(op, Box::new(x), Box::new(y)))
}

pub fn not(x: Expr) -> Expr {
    e(ExprValue::Not(Box::new(x)))
}

pub fn member(x: Expr, field: &str) -> Expr {
    e(ExprValue::Member(Box::new(x), field.to_string()))
}

pub fn init_list(xs: Vec<Expr>) -> Expr {
    e(ExprValue::InitList(xs))
}

pub fn because(x: Expr, reason: Expr) -> Expr {
    e(ExprValue::Because(Box::new(x), Box::new(reason)))
}

pub fn subscript(x: Expr, idx: Expr) -> Expr {
    e(ExprValue::Subscript(Box::new(x), Box::new(idx)))
}

pub fn app(func: Expr, args: Vec<Expr>) -> Expr {
    e(ExprValue::App(Box::new(func), args))
}

pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    app(global(name), args)
}

/// Anonymous immutable function.
pub fn abs(args: Vec<FuncArg>, ret_type: Expr, stmts: Vec<Stmt>) -> Expr {
    e(ExprValue::Abs(Abs {
        is_mutable: IsMutable::No,
        args,
        ret_type: Box::new(ret_type),
        body: Body::new(loc(), stmts),
    }))
}

pub fn arg(ty: Expr, name: &str) -> FuncArg {
    let var = Some(IndexedVar::new(name));
    FuncArg {
        properties: loc(),
        qty: Qty::Many,
        ty,
        var,
    }
}

pub fn stmt(value: StmtValue) -> Stmt {
    Stmt::new(loc(), value)
}

pub fn ret(x: Expr) -> Stmt {
    stmt(StmtValue::Return(Some(x)))
}

pub fn ret_unit() -> Stmt {
    stmt(StmtValue::Return(None))
}

pub fn impossible() -> Stmt {
    stmt(StmtValue::Impossible(None))
}

pub fn impossible_because(reason: Expr) -> Stmt {
    stmt(StmtValue::Impossible(Some(reason)))
}

pub fn expr_stmt(x: Expr) -> Stmt {
    stmt(StmtValue::Expr(x))
}

pub fn if_else(cond: Expr, tb: Vec<Stmt>, fb: Option<Vec<Stmt>>) -> Stmt {
    stmt(StmtValue::IfElse(IfElse {
        cond,
        true_branch: Body::new(loc(), tb),
        false_branch: fb.map(|fb| Body::new(loc(), fb)),
    }))
}

fn pi(is_mutable: IsMutable, args: Vec<FuncArg>, ret_type: Expr) -> Pi {
    let ret_type = Box::new(ret_type);
    Pi {
        is_mutable,
        args,
        ret_type,
    }
}

fn func_with(is_mutable: IsMutable, name: &str, args: Vec<FuncArg>, ret_type: Expr, stmts: Vec<Stmt>) -> Entry {
    let body = Body::new(loc(), stmts);
    let ret_type = Box::new(ret_type);
    let value = Abs {
        is_mutable,
        args,
        ret_type,
        body,
    };
    let name = name.to_string();
    Entry::FuncDef(FuncDef {
        properties: loc(),
        name,
        value,
    })
}

pub fn func(name: &str, args: Vec<FuncArg>, ret_type: Expr, stmts: Vec<Stmt>) -> Entry {
    func_with(IsMutable::No, name, args, ret_type, stmts)
}

pub fn mutable_func(name: &str, args: Vec<FuncArg>, ret_type: Expr, stmts: Vec<Stmt>) -> Entry {
    func_with(IsMutable::Yes, name, args, ret_type, stmts)
}

pub fn decl(name: &str, args: Vec<FuncArg>, ret_type: Expr) -> Entry {
    let signature = pi(IsMutable::No, args, ret_type);
    let name = name.to_string();
    Entry::FuncDecl(FuncDecl {
        properties: loc(),
        name,
        signature,
    })
}

pub fn extern_decl(is_mutable: IsMutable, name: &str, args: Vec<FuncArg>, ret_type: Expr) -> Entry {
    let signature = pi(is_mutable, args, ret_type);
    let name = name.to_string();
    Entry::ExternDecl(FuncDecl {
        properties: loc(),
        name,
        signature,
    })
}

pub fn struct_def(name: &str, fields: Vec<FuncArg>) -> Entry {
    Entry::TypeDef(TypeDef {
        properties: loc(),
        name: name.to_string(),
        value: TypeDefValue::Struct(fields),
    })
}

pub fn module(entries: Vec<Entry>) -> Module {
    Module {
        properties: loc(),
        entries,
    }
}

/// Type check a module.
pub fn check(entries: Vec<Entry>) -> Result<(Env, legal::Module), TypeError> {
    init_logger();
    let mut env = Env::new();
    let module = typecheck::check_module(&mut env, &module(entries))?;
    Ok((env, module))
}

/// Type check and normalise a module.
pub fn compile(entries: Vec<Entry>) -> Result<legal::Module, TypeError> {
    let (env, mut module) = check(entries)?;
    normalize::normalize_module(&env, &mut module);
    Ok(module)
}

/// Return the error message of type checking a module.
pub fn check_err(entries: Vec<Entry>) -> String {
    match check(entries) {
        Ok(_) => panic!("module unexpectedly type checks"),
        Err(err) => err.error.error,
    }
}

/// Return the body of a function definition as string.
pub fn body_of(module: &legal::Module, name: &str) -> String {
    let def = module.entries.iter().find_map(|entry| match entry {
        ast::Entry::FuncDef(def) if def.name == name => Some(def),
        _ => None,
    });
    def.expect("function not found").value.body.to_string()
}

/// Return the expression returned by the last statement of a function definition.
pub fn returned<'a>(module: &'a legal::Module, name: &str) -> &'a legal::Expr {
    let def = module.entries.iter().find_map(|entry| match entry {
        ast::Entry::FuncDef(def) if def.name == name => Some(def),
        _ => None,
    });
    let stmts = &def.expect("function not found").value.body.stmts;
    match stmts.last().map(|stmt| &stmt.value) {
        Some(ast::StmtValue::Return(Some(x))) => x,
        _ => panic!("function does not end with a return"),
    }
}
