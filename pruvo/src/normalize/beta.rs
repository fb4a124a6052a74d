//! Beta-reduction and pruning of statements without effect.

use crate::alpha::{max_index, rename_above};
use crate::ast::{ExprValue, Properties, SortMut, Stmt, StmtValue};
use crate::legal::{self, Legal};
use crate::mutability::is_mutable;
use crate::reachability::{is_impossible, is_impossible_stmts};
use crate::subst::substitute_scope;

/// Perform one reduction step at the root of an expression.
///
/// Return true if the expression changed.
pub(super) fn reduce(expr: &mut legal::Expr) -> bool {
    erase_because(expr) || substitute_args(expr) || collapse(expr)
}

/// `x because r` reduces to `x`.
fn erase_because(expr: &mut legal::Expr) -> bool {
    if !matches!(expr.value, ExprValue::Because(..)) {
        return false;
    }
    if let ExprValue::Because(value, _) = core::mem::replace(&mut expr.value, ExprValue::Auto) {
        *expr = *value;
    }
    true
}

/// Substitute the arguments of an applied abstraction into its body,
/// provided that evaluating the arguments has no side effects.
///
/// Afterwards, the abstraction has no arguments left.
fn substitute_args(expr: &mut legal::Expr) -> bool {
    let (func, args) = match &mut expr.value {
        ExprValue::App(func, args) if !args.is_empty() => (func, args),
        _ => return false,
    };
    let abs = match &mut func.value {
        ExprValue::Abs(abs) => abs,
        _ => return false,
    };
    if abs.args.len() != args.len() || args.iter().any(is_mutable) {
        return false;
    }

    // make the formal arguments distinct from all variables in the actual arguments,
    // so that the order of substitution does not matter
    let floor = args.iter().map(max_index).max().unwrap_or(0);
    for i in 0..abs.args.len() {
        let (formal, rest) = abs.args[i..].split_at_mut(1);
        if let Some(var) = formal[0].var.clone() {
            let ret = Some(&mut *abs.ret_type);
            let fresh = rename_above(&var, floor, rest, ret, Some(&mut abs.body));
            formal[0].var = Some(fresh);
        }
    }

    for (i, actual) in args.iter().enumerate().rev() {
        let (formal, rest) = abs.args[i..].split_at_mut(1);
        if let Some(var) = &formal[0].var {
            trace!("substitute {} := {}", var, actual);
            let ret = Some(&mut *abs.ret_type);
            substitute_scope(rest, ret, Some(&mut abs.body), var, actual);
        }
    }
    abs.args.clear();
    args.clear();
    if let Some(sort) = Legal::sort_mut(&mut func.properties, SortMut(())) {
        sort.value = ExprValue::Pi(abs.pi());
    }
    true
}

/// An applied abstraction without arguments whose body consists of
/// a single `return e` reduces to `e`.
fn collapse(expr: &mut legal::Expr) -> bool {
    let stmts = match &mut expr.value {
        ExprValue::App(func, args) if args.is_empty() => match &mut func.value {
            ExprValue::Abs(abs) => &mut abs.body.stmts,
            _ => return false,
        },
        _ => return false,
    };
    let single_return = matches!(
        stmts.as_slice(),
        [Stmt {
            value: StmtValue::Return(Some(_)),
            ..
        }]
    );
    if !single_return {
        return false;
    }
    match stmts.pop() {
        Some(Stmt {
            value: StmtValue::Return(Some(e)),
            ..
        }) => {
            trace!("collapse to {}", e);
            *expr = e;
            true
        }
        _ => false,
    }
}

/// Remove statements without effect and `if` statements whose outcome is known.
///
/// Return true if the body changed.
pub(super) fn prune_body(body: &mut legal::Body) -> bool {
    let mut changed = false;
    let mut stmts = core::mem::take(&mut body.stmts).into_iter();
    while let Some(Stmt { properties, value }) = stmts.next() {
        match value {
            StmtValue::Expr(e) if !is_mutable(&e) => {
                trace!("drop statement {}", e);
                changed = true;
            }
            StmtValue::IfElse(ite) => match prune_if(ite, stmts.as_slice()) {
                Ok((spliced, truncate)) => {
                    body.stmts.extend(spliced);
                    changed = true;
                    if truncate {
                        trace!("drop {} statements after if", stmts.len());
                        break;
                    }
                }
                Err(ite) => body.stmts.push(Stmt::new(properties, StmtValue::IfElse(ite))),
            },
            value => body.stmts.push(Stmt::new(properties, value)),
        }
    }
    changed
}

/// Return the statements that an `if` statement can be replaced with,
/// or the statement itself if it has to stay.
///
/// `rest` are the statements following the `if` statement.
/// The returned flag is true if `rest` has to be dropped.
fn prune_if(ite: legal::IfElse, rest: &[legal::Stmt]) -> Result<(Vec<legal::Stmt>, bool), legal::IfElse> {
    let branch = |b: Option<legal::Body>| b.map(|b| b.stmts).unwrap_or_default();
    if ite.cond.is_bool_lit(true) {
        trace!("take then branch of if (true)");
        return Ok((ite.true_branch.stmts, false));
    }
    if ite.cond.is_bool_lit(false) {
        trace!("take else branch of if (false)");
        return Ok((branch(ite.false_branch), false));
    }
    // we may only drop the condition if it has no effect
    if is_mutable(&ite.cond) {
        return Err(ite);
    }
    if is_impossible(&ite.true_branch) {
        trace!("take else branch of if ({}) with impossible then branch", ite.cond);
        return Ok((branch(ite.false_branch), false));
    }
    match ite.false_branch.as_ref().map(is_impossible) {
        Some(true) => Ok((ite.true_branch.stmts, false)),
        // the implicit else branch runs into the impossible rest
        None if !rest.is_empty() && is_impossible_stmts(rest) => {
            trace!("take then branch of if ({}) followed by impossible code", ite.cond);
            Ok((ite.true_branch.stmts, true))
        }
        _ => Err(ite),
    }
}
