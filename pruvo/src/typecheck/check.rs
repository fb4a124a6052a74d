//! Checking expressions against types, and checking statements and declarations.

use super::derivation_rules::*;
use super::type_assign::type_assign;
use super::{error, is_equivalent, sort_of, Result};
use crate::alpha::is_alpha_equivalent;
use crate::ast::{Entry, ExprValue, GlobalRef, IfElse, Stmt, StmtValue, TypeDefValue};
use crate::context::Context;
use crate::env::{Env, Global};
use crate::error::TypeError;
use crate::legal;
use crate::normalize::{bounds, normalize_expr};
use crate::raw;
use crate::reachability::returns_from_all_branches;
use crate::source::SourceLoc;
use crate::subst::substitute_scope;
use num_bigint::BigInt;

/// Check that an expression has the expected type.
///
/// ~~~
/// # use pruvo::typecheck::check_expr;
/// # use pruvo::ast::{Sign, Width};
/// # use pruvo::raw::{Expr, ExprValue};
/// # use pruvo::{Context, Env, SourceLoc};
/// let env = Env::new();
/// let ctx = Context::new();
/// let expr = |value| Expr::new(SourceLoc::default(), value);
/// let u8_t = pruvo::typecheck::check_type(&env, &ctx, &expr(ExprValue::IntegerT(Sign::Unsigned, Width::W8)))?;
/// assert!(check_expr(&env, &ctx, &expr(ExprValue::Numeric(255.into())), &u8_t).is_ok());
/// assert!(check_expr(&env, &ctx, &expr(ExprValue::Numeric(256.into())), &u8_t).is_err());
/// # Ok::<_, pruvo::TypeError>(())
/// ~~~
pub fn check_expr(
    env: &Env,
    ctx: &Context,
    expr: &raw::Expr,
    expected: &legal::Expr,
) -> Result<legal::Expr> {
    debug!("check {} against {}", expr, expected);
    let loc = expr.loc();
    match &expr.value {
        ExprValue::Numeric(n) => {
            let (sign, width) = env.integer_type(expected).ok_or_else(|| {
                let msg = format!("numeric literal cannot have type `{}`", expected);
                error(msg, loc, ctx).expected(expected)
            })?;
            let (min, max) = bounds(sign, width);
            if *n < min || *n > max {
                let msg = format!("numeric literal out of range for type `{}`", expected);
                return Err(error(msg, loc, ctx).expected(expected));
            }
            Ok(make_term(expected.clone(), ExprValue::Numeric(n.clone())))
        }
        ExprValue::InitList(xs) => check_init_list(env, ctx, xs, expected, loc),
        ExprValue::Because(x, reason) => {
            let reason = check_expr(env, ctx, reason, &make_bool_t())?;
            let mut ctx = ctx.extend();
            ctx.add_assumption(reason.clone());
            let x = check_expr(env, &ctx, x, expected)?;
            let value = ExprValue::Because(Box::new(x), Box::new(reason));
            Ok(make_term(expected.clone(), value))
        }
        ExprValue::Arith(op, x, y) if env.integer_type(expected).is_some() => {
            let x = check_expr(env, ctx, x, expected)?;
            let y = check_expr(env, ctx, y, expected)?;
            let value = ExprValue::Arith(*op, Box::new(x), Box::new(y));
            Ok(make_term(expected.clone(), value))
        }
        _ => {
            let legal = type_assign(env, ctx, expr)?;
            let ty = sort_of(&legal, loc, ctx)?;
            if is_equivalent(env, ty, expected) {
                Ok(legal)
            } else {
                let msg = format!(
                    "expression of type `{}` does not typecheck with expected type `{}`",
                    ty, expected
                );
                Err(error(msg, loc, ctx).expected(expected))
            }
        }
    }
}

/// Check that an expression is a type.
pub fn check_type(env: &Env, ctx: &Context, ty: &raw::Expr) -> Result<legal::Expr> {
    match ty.value {
        ExprValue::Typename => Ok(make_typename()),
        _ => check_expr(env, ctx, ty, &make_typename()),
    }
}

fn check_init_list(
    env: &Env,
    ctx: &Context,
    xs: &[raw::Expr],
    expected: &legal::Expr,
    loc: &SourceLoc,
) -> Result<legal::Expr> {
    let err = |msg: String| error(msg, loc, ctx).expected(expected);
    let xs = match &expected.value {
        ExprValue::ArrayT(elem, size) => {
            let mut size = (**size).clone();
            normalize_expr(env, &mut size);
            match &size.value {
                ExprValue::Numeric(n) if *n == BigInt::from(xs.len()) => (),
                ExprValue::Numeric(n) => {
                    let msg = format!("initializer list has {} elements, expected {}", xs.len(), n);
                    return Err(err(msg));
                }
                _ => return Err(err(format!("cannot determine the size of `{}`", expected))),
            }
            let elems = xs.iter().map(|x| check_expr(env, ctx, x, elem));
            elems.collect::<Result<_>>()?
        }
        ExprValue::UnitT if xs.is_empty() => Vec::new(),
        ExprValue::TrueT(cond) if xs.is_empty() => {
            if !is_provable(env, ctx, cond) {
                return Err(err(format!("cannot prove `{}`", cond)));
            }
            Vec::new()
        }
        ExprValue::Sigma(fields) => check_fields(env, ctx, xs, fields, loc)?,
        _ => match env.struct_fields(expected) {
            Some(fields) => check_fields(env, ctx, xs, fields, loc)?,
            None => {
                let msg = format!("initializer list cannot have type `{}`", expected);
                return Err(err(msg));
            }
        },
    };
    Ok(make_term(expected.clone(), ExprValue::InitList(xs)))
}

/// Check the elements of an initializer list against dependent fields.
fn check_fields(
    env: &Env,
    ctx: &Context,
    xs: &[raw::Expr],
    fields: &[legal::FuncArg],
    loc: &SourceLoc,
) -> Result<Vec<legal::Expr>> {
    if xs.len() != fields.len() {
        let msg = format!("initializer list has {} elements, expected {}", xs.len(), fields.len());
        return Err(error(msg, loc, ctx));
    }
    let mut fields = fields.to_vec();
    let mut out = Vec::with_capacity(xs.len());
    for (i, x) in xs.iter().enumerate() {
        let (field, rest) = fields[i..].split_at_mut(1);
        let x = check_expr(env, ctx, x, &field[0].ty)?;
        if let Some(var) = &field[0].var {
            substitute_scope(rest, None, None, var, &x);
        }
        out.push(x);
    }
    Ok(out)
}

/// Return true if a boolean condition holds in the context.
fn is_provable(env: &Env, ctx: &Context, cond: &legal::Expr) -> bool {
    let mut cond = cond.clone();
    normalize_expr(env, &mut cond);
    if cond.is_bool_lit(true) {
        return true;
    }
    let facts = normalized_assumptions(env, ctx);
    facts.iter().any(|fact| is_alpha_equivalent(fact, &cond)) || is_contradictory(&facts)
}

fn normalized_assumptions(env: &Env, ctx: &Context) -> Vec<legal::Expr> {
    let facts = ctx.assumptions().cloned().map(|mut fact| {
        normalize_expr(env, &mut fact);
        fact
    });
    facts.collect()
}

/// Return true if a set of facts is inconsistent,
/// that is, it contains `false` or a fact together with its negation.
fn is_contradictory(facts: &[legal::Expr]) -> bool {
    facts.iter().any(|fact| match &fact.value {
        ExprValue::BoolLit(false) => true,
        ExprValue::Not(neg) => facts.iter().any(|f| is_alpha_equivalent(f, neg)),
        _ => false,
    })
}

/// Check the arguments of a binder and declare them in the context.
pub(super) fn check_func_args(
    env: &Env,
    ctx: &mut Context,
    args: &[raw::FuncArg],
) -> Result<Vec<legal::FuncArg>> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        let ty = check_type(env, ctx, &arg.ty)?;
        if let Some(var) = &arg.var {
            let origin = Some(arg.properties.clone());
            let added = match ty.value {
                ExprValue::Typename => ctx.add_type_var(var.clone(), origin),
                _ => ctx.add_term_var(var.clone(), arg.qty, ty.clone(), origin),
            };
            added.map_err(|e| TypeError::new(e, ctx))?;
        }
        out.push(legal::FuncArg {
            properties: Derivation::new(),
            qty: arg.qty,
            ty,
            var: arg.var.clone(),
        });
    }
    Ok(out)
}

pub(super) fn check_pi(env: &Env, ctx: &Context, pi: &raw::Pi) -> Result<legal::Pi> {
    let mut ctx = ctx.extend();
    let args = check_func_args(env, &mut ctx, &pi.args)?;
    let ret_type = Box::new(check_type(env, &ctx, &pi.ret_type)?);
    let is_mutable = pi.is_mutable;
    Ok(legal::Pi {
        is_mutable,
        args,
        ret_type,
    })
}

pub(super) fn check_abs(
    env: &Env,
    ctx: &Context,
    abs: &raw::Abs,
    loc: &SourceLoc,
) -> Result<legal::Abs> {
    let mut ctx = ctx.extend_with(abs.is_mutable);
    let args = check_func_args(env, &mut ctx, &abs.args)?;
    let ret_type = check_type(env, &ctx, &abs.ret_type)?;
    let body = check_body(env, &ctx, &abs.body, &ret_type)?;
    let is_unit = matches!(ret_type.value, ExprValue::UnitT);
    if !is_unit && !returns_from_all_branches(&body) {
        let err = error("missing return statement", loc, &ctx);
        return Err(err.expected(&ret_type));
    }
    Ok(legal::Abs {
        is_mutable: abs.is_mutable,
        args,
        ret_type: Box::new(ret_type),
        body,
    })
}

/// Check the statements of a function body, where `ret_type` is the return type of the function.
pub fn check_body(
    env: &Env,
    ctx: &Context,
    body: &raw::Body,
    ret_type: &legal::Expr,
) -> Result<legal::Body> {
    let mut ctx = ctx.extend();
    let mut stmts = Vec::with_capacity(body.stmts.len());
    for stmt in &body.stmts {
        let stmt = check_stmt(env, &ctx, stmt, ret_type)?;
        // a branch that always returns tells us something about the code after it
        if let StmtValue::IfElse(ite) = &stmt.value {
            let returns = |b: &legal::Body| returns_from_all_branches(b);
            match &ite.false_branch {
                None if returns(&ite.true_branch) => {
                    ctx.add_assumption(make_not(ite.cond.clone()));
                }
                Some(fb) if returns(fb) && !returns(&ite.true_branch) => {
                    ctx.add_assumption(ite.cond.clone());
                }
                _ => (),
            }
        }
        stmts.push(stmt);
    }
    Ok(legal::Body {
        properties: Derivation::new(),
        stmts,
    })
}

fn check_stmt(
    env: &Env,
    ctx: &Context,
    stmt: &raw::Stmt,
    ret_type: &legal::Expr,
) -> Result<legal::Stmt> {
    let loc = &stmt.properties;
    let value = match &stmt.value {
        StmtValue::Expr(e) => {
            if !matches!(e.value, ExprValue::App(..)) {
                return Err(error("expression statement must be a function call", loc, ctx));
            }
            StmtValue::Expr(type_assign(env, ctx, e)?)
        }
        StmtValue::IfElse(ite) => {
            let cond = check_expr(env, ctx, &ite.cond, &make_bool_t())?;
            let mut ctx_true = ctx.extend();
            ctx_true.add_assumption(cond.clone());
            let true_branch = check_body(env, &ctx_true, &ite.true_branch, ret_type)?;
            let false_branch = match &ite.false_branch {
                Some(fb) => {
                    let mut ctx_false = ctx.extend();
                    ctx_false.add_assumption(make_not(cond.clone()));
                    Some(check_body(env, &ctx_false, fb, ret_type)?)
                }
                None => None,
            };
            StmtValue::IfElse(IfElse {
                cond,
                true_branch,
                false_branch,
            })
        }
        StmtValue::Return(Some(e)) => StmtValue::Return(Some(check_expr(env, ctx, e, ret_type)?)),
        StmtValue::Return(None) => {
            if !matches!(ret_type.value, ExprValue::UnitT) {
                let msg = format!("return statement without value in function returning `{}`", ret_type);
                return Err(error(msg, loc, ctx).expected(ret_type));
            }
            StmtValue::Return(None)
        }
        StmtValue::Impossible(Some(reason)) => {
            StmtValue::Impossible(Some(type_assign(env, ctx, reason)?))
        }
        StmtValue::Impossible(None) => {
            if !is_contradictory(&normalized_assumptions(env, ctx)) {
                let msg = "cannot prove that this statement is unreachable";
                return Err(error(msg, loc, ctx));
            }
            StmtValue::Impossible(None)
        }
    };
    Ok(Stmt::new(Derivation::new(), value))
}

fn insert(env: &mut Env, name: &str, global: Global) -> Result<()> {
    let inserted = env.insert(name.to_string(), global);
    inserted.map_err(|e| TypeError::new(e, &Context::new()))
}

/// Check a type definition and add it to the environment.
pub fn check_type_def(env: &mut Env, td: &raw::TypeDef) -> Result<legal::TypeDef> {
    debug!("check type definition {}", td.name);
    let value = match &td.value {
        TypeDefValue::Integer(sign, width) => TypeDefValue::Integer(*sign, *width),
        TypeDefValue::Struct(fields) => {
            let mut ctx = Context::new();
            TypeDefValue::Struct(check_func_args(env, &mut ctx, fields)?)
        }
    };
    let td = legal::TypeDef {
        properties: Derivation::new(),
        name: td.name.clone(),
        value,
    };
    insert(env, &td.name, Global::TypeDef(td.clone()))?;
    Ok(td)
}

fn check_decl(env: &Env, decl: &raw::FuncDecl) -> Result<legal::FuncDecl> {
    debug!("check declaration {}", decl.name);
    Ok(legal::FuncDecl {
        properties: Derivation::new(),
        name: decl.name.clone(),
        signature: check_pi(env, &Context::new(), &decl.signature)?,
    })
}

/// Check a forward declaration and add it to the environment.
pub fn check_func_decl(env: &mut Env, decl: &raw::FuncDecl) -> Result<legal::FuncDecl> {
    let decl = check_decl(env, decl)?;
    insert(env, &decl.name, Global::FuncDecl(decl.clone()))?;
    Ok(decl)
}

/// Check an external declaration and add it to the environment.
pub fn check_extern_decl(env: &mut Env, decl: &raw::FuncDecl) -> Result<legal::FuncDecl> {
    let decl = check_decl(env, decl)?;
    insert(env, &decl.name, Global::ExternDecl(decl.clone()))?;
    Ok(decl)
}

/// Check a function definition and add it to the environment.
///
/// The signature of the function is added to the environment
/// before its body is checked, allowing for recursion.
/// If the function was declared before, its signature must match the declaration.
pub fn check_func_def(env: &mut Env, def: &raw::FuncDef) -> Result<legal::FuncDef> {
    debug!("check definition {}", def.name);
    let loc = &def.properties;
    let ctx = Context::new();
    let signature = check_pi(env, &ctx, &def.value.pi())?;
    let forward = match env.get(&GlobalRef::new(def.name.clone())) {
        Some(Global::FuncDecl(decl)) => {
            let declared = make_type(ExprValue::Pi(decl.signature.clone()));
            let defined = make_type(ExprValue::Pi(signature));
            if !is_alpha_equivalent(&declared, &defined) {
                let msg = format!("definition of {} does not match its declaration", def.name);
                return Err(error(msg, loc, &ctx).expected(&declared));
            }
            true
        }
        _ => {
            let decl = legal::FuncDecl {
                properties: Derivation::new(),
                name: def.name.clone(),
                signature,
            };
            insert(env, &def.name, Global::FuncDecl(decl))?;
            false
        }
    };
    let value = match check_abs(env, &ctx, &def.value, loc) {
        Ok(value) => value,
        Err(err) => {
            // the signature was only registered to allow for recursion
            if !forward {
                env.remove(&def.name);
            }
            return Err(err);
        }
    };
    let def = legal::FuncDef {
        properties: Derivation::new(),
        name: def.name.clone(),
        value,
    };
    insert(env, &def.name, Global::FuncDef(def.clone()))?;
    Ok(def)
}

/// Check all entries of a module in order, adding them to the environment.
pub fn check_module(env: &mut Env, module: &raw::Module) -> Result<legal::Module> {
    let entries = module.entries.iter().map(|entry| {
        Ok(match entry {
            Entry::TypeDef(td) => Entry::TypeDef(check_type_def(env, td)?),
            Entry::FuncDecl(decl) => Entry::FuncDecl(check_func_decl(env, decl)?),
            Entry::ExternDecl(decl) => Entry::ExternDecl(check_extern_decl(env, decl)?),
            Entry::FuncDef(def) => Entry::FuncDef(check_func_def(env, def)?),
        })
    });
    Ok(legal::Module {
        properties: Derivation::new(),
        entries: entries.collect::<Result<_>>()?,
    })
}
