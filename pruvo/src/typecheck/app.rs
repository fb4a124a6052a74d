//! Type assignment for function applications.

use super::check::check_expr;
use super::derivation_rules::make_term;
use super::type_assign::type_assign;
use super::{error, is_equivalent, Result};
use crate::ast::{ExprValue, IndexedVar, IsMutable};
use crate::context::Context;
use crate::env::Env;
use crate::legal;
use crate::raw;
use crate::source::SourceLoc;
use crate::subst::substitute_scope;

pub(super) fn type_assign_app(
    env: &Env,
    ctx: &Context,
    func: &raw::Expr,
    args: &[raw::Expr],
    loc: &SourceLoc,
) -> Result<legal::Expr> {
    let func = type_assign(env, ctx, func)?;
    let pi = match func.pi_sort() {
        Some(pi) => pi.clone(),
        None => {
            let ty = func.ty().map(|ty| ty.to_string()).unwrap_or_default();
            let msg = format!("expression of type `{}` cannot be applied", ty);
            return Err(error(msg, loc, ctx));
        }
    };
    if pi.is_mutable == IsMutable::Yes && ctx.is_mutable() == IsMutable::No {
        let msg = "cannot invoke mutable function inside immutable context";
        return Err(error(msg, loc, ctx));
    }
    if pi.args.len() != args.len() {
        let msg = format!(
            "function expects {} arguments, but {} were given",
            pi.args.len(),
            args.len()
        );
        return Err(error(msg, loc, ctx));
    }

    let mut formals = pi.args;
    let mut ret_type = *pi.ret_type;
    let mut actuals = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        let actual = match arg.value {
            ExprValue::Auto => infer_auto(env, ctx, &formals, args, i, arg.loc())?,
            _ => check_expr(env, ctx, arg, &formals[i].ty)?,
        };
        let (formal, rest) = formals[i..].split_at_mut(1);
        if let Some(var) = &formal[0].var {
            substitute_scope(rest, Some(&mut ret_type), None, var, &actual);
        }
        actuals.push(actual);
    }
    let value = ExprValue::App(Box::new(func), actuals);
    Ok(make_term(ret_type, value))
}

/// Find the value of the `i`-th argument by matching
/// the declared types of later arguments against their assigned types.
fn infer_auto(
    env: &Env,
    ctx: &Context,
    formals: &[legal::FuncArg],
    args: &[raw::Expr],
    i: usize,
    loc: &SourceLoc,
) -> Result<legal::Expr> {
    let err = || error("cannot infer value for auto", loc, ctx);
    let var = formals[i].var.as_ref().ok_or_else(err)?;
    for (formal, arg) in formals.iter().zip(args).skip(i + 1) {
        if matches!(arg.value, ExprValue::Auto) {
            continue;
        }
        // later arguments that cannot be assigned a type on their own are skipped
        let assigned = match type_assign(env, ctx, arg) {
            Ok(assigned) => assigned,
            Err(_) => continue,
        };
        let found = assigned.ty().and_then(|ty| first_order_match(&formal.ty, ty, var));
        if let Some(value) = found {
            trace!("infer {} := {}", var, value);
            let fits = match value.ty() {
                Some(ty) => is_equivalent(env, ty, &formals[i].ty),
                None => false,
            };
            if !fits {
                return Err(err().expected(&formals[i].ty));
            }
            return Ok(value);
        }
    }
    Err(err())
}

/// Find the subexpression of `target` at the position where `pattern` contains `var`.
fn first_order_match(
    pattern: &legal::Expr,
    target: &legal::Expr,
    var: &IndexedVar,
) -> Option<legal::Expr> {
    if let ExprValue::Var(v) = &pattern.value {
        if v == var {
            return Some(target.clone());
        }
    }
    if core::mem::discriminant(&pattern.value) != core::mem::discriminant(&target.value) {
        return None;
    }
    let (ps, ts) = (pattern.value.children(), target.value.children());
    if ps.len() != ts.len() {
        return None;
    }
    ps.into_iter()
        .zip(ts)
        .find_map(|(p, t)| first_order_match(p, t, var))
}
