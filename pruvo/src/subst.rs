//! Capture-avoiding substitution.

use crate::alpha::{max_index, rename_above};
use crate::ast::{Body, Expr, ExprValue, FuncArg, IndexedVar, Properties, SortMut, StmtValue};

/// What a variable is replaced with.
enum With<'a, P: Properties> {
    Expr(&'a Expr<P>),
    /// replace only the variable, keeping the properties of its occurrences
    Var(&'a IndexedVar),
}

impl<'a, P: Properties> With<'a, P> {
    fn occurs_free(&self, var: &IndexedVar) -> bool {
        match self {
            Self::Expr(e) => occurs_free(var, e),
            Self::Var(v) => *v == var,
        }
    }

    fn max_index(&self) -> usize {
        match self {
            Self::Expr(e) => max_index(e),
            Self::Var(v) => v.idx,
        }
    }
}

/// Replace all free occurrences of a variable in an expression.
///
/// Bound variables that would capture free variables of the replacement
/// are renamed beforehand.
///
/// ~~~
/// # use pruvo::subst::substitute;
/// # use pruvo::raw::{Expr, ExprValue};
/// # use pruvo::{IndexedVar, SourceLoc};
/// let var = |name| Expr::new(SourceLoc::default(), ExprValue::Var(IndexedVar::new(name)));
/// let mut e = Expr::new(SourceLoc::default(), ExprValue::Not(Box::new(var("x"))));
/// substitute(&mut e, &IndexedVar::new("x"), &var("y"));
/// assert_eq!(e.to_string(), "not y");
/// ~~~
pub fn substitute<P: Properties>(expr: &mut Expr<P>, var: &IndexedVar, replacement: &Expr<P>) {
    subst_expr(expr, var, &With::Expr(replacement))
}

/// Replace all free occurrences of a variable in the scope of a binder.
///
/// The scope consists of the binder arguments,
/// followed by an optional return type and an optional body.
pub(crate) fn substitute_scope<P: Properties>(
    args: &mut [FuncArg<P>],
    ret: Option<&mut Expr<P>>,
    body: Option<&mut Body<P>>,
    var: &IndexedVar,
    replacement: &Expr<P>,
) {
    subst_scope(args, ret, body, var, &With::Expr(replacement))
}

/// Replace all free occurrences of `old` in the scope of a binder by `new`.
pub(crate) fn rename_scope<P: Properties>(
    args: &mut [FuncArg<P>],
    ret: Option<&mut Expr<P>>,
    body: Option<&mut Body<P>>,
    old: &IndexedVar,
    new: &IndexedVar,
) {
    subst_scope(args, ret, body, old, &With::Var(new))
}

fn subst_expr<P: Properties>(expr: &mut Expr<P>, var: &IndexedVar, with: &With<P>) {
    if let ExprValue::Var(v) = &mut expr.value {
        if v == var {
            match with {
                With::Expr(e) => {
                    *expr = (*e).clone();
                    return;
                }
                With::Var(w) => *v = (*w).clone(),
            }
        }
    }
    if let Some(sort) = P::sort_mut(&mut expr.properties, SortMut(())) {
        subst_expr(sort, var, with)
    }

    use ExprValue::*;
    match &mut expr.value {
        Typename | Auto | BoolT | UnitT | CstrT | ScopeT | IntegerT(..) => (),
        BoolLit(_) | Numeric(_) | Str(_) | Var(_) | Global(_) => (),
        TrueT(x) | AddressOf(x) | Deref(x) | ScopeOf(x) | Not(x) | Member(x, _) => {
            subst_expr(x, var, with)
        }
        ArrayT(x, y) | RefT(x, y) | Subscript(x, y) | Because(x, y) => {
            subst_expr(x, var, with);
            subst_expr(y, var, with)
        }
        Bool(_, x, y) | Rel(_, x, y) | Arith(_, x, y) => {
            subst_expr(x, var, with);
            subst_expr(y, var, with)
        }
        App(f, args) => {
            subst_expr(f, var, with);
            args.iter_mut().for_each(|a| subst_expr(a, var, with))
        }
        InitList(xs) => xs.iter_mut().for_each(|x| subst_expr(x, var, with)),
        Abs(abs) => subst_scope(
            &mut abs.args,
            Some(&mut *abs.ret_type),
            Some(&mut abs.body),
            var,
            with,
        ),
        Pi(pi) => subst_scope(&mut pi.args, Some(&mut *pi.ret_type), None, var, with),
        Sigma(args) => subst_scope(args, None, None, var, with),
    }
}

fn subst_scope<P: Properties>(
    args: &mut [FuncArg<P>],
    mut ret: Option<&mut Expr<P>>,
    mut body: Option<&mut Body<P>>,
    var: &IndexedVar,
    with: &With<P>,
) {
    let mut rest = args;
    while let Some((arg, tail)) = core::mem::take(&mut rest).split_first_mut() {
        subst_expr(&mut arg.ty, var, with);
        if let Some(v) = arg.var.clone() {
            // the remainder of the scope refers to the argument, not to `var`
            if v == *var {
                return;
            }
            if with.occurs_free(&v) {
                let floor = with.max_index();
                let new = rename_above(&v, floor, tail, ret.as_deref_mut(), body.as_deref_mut());
                arg.var = Some(new);
            }
        }
        rest = tail;
    }
    if let Some(ret) = ret {
        subst_expr(ret, var, with)
    }
    if let Some(body) = body {
        subst_body(body, var, with)
    }
}

fn subst_body<P: Properties>(body: &mut Body<P>, var: &IndexedVar, with: &With<P>) {
    for stmt in body.stmts.iter_mut() {
        match &mut stmt.value {
            StmtValue::Expr(e) => subst_expr(e, var, with),
            StmtValue::IfElse(ite) => {
                subst_expr(&mut ite.cond, var, with);
                subst_body(&mut ite.true_branch, var, with);
                if let Some(fb) = &mut ite.false_branch {
                    subst_body(fb, var, with)
                }
            }
            StmtValue::Return(e) | StmtValue::Impossible(e) => {
                if let Some(e) = e {
                    subst_expr(e, var, with)
                }
            }
        }
    }
}

/// Return true if a variable occurs free in an expression or in its sorts.
pub fn occurs_free<P: Properties>(var: &IndexedVar, expr: &Expr<P>) -> bool {
    if P::sort(&expr.properties).map_or(false, |sort| occurs_free(var, sort)) {
        return true;
    }
    match &expr.value {
        ExprValue::Var(v) => v == var,
        ExprValue::Abs(abs) => {
            occurs_free_scope(var, &abs.args, Some(&*abs.ret_type), Some(&abs.body))
        }
        ExprValue::Pi(pi) => occurs_free_scope(var, &pi.args, Some(&*pi.ret_type), None),
        ExprValue::Sigma(args) => occurs_free_scope(var, args, None, None),
        value => value.children().into_iter().any(|x| occurs_free(var, x)),
    }
}

fn occurs_free_scope<P: Properties>(
    var: &IndexedVar,
    args: &[FuncArg<P>],
    ret: Option<&Expr<P>>,
    body: Option<&Body<P>>,
) -> bool {
    for arg in args {
        if occurs_free(var, &arg.ty) {
            return true;
        }
        if arg.var.as_ref() == Some(var) {
            return false;
        }
    }
    ret.map_or(false, |ret| occurs_free(var, ret))
        || body.map_or(false, |body| occurs_free_body(var, body))
}

pub(crate) fn occurs_free_body<P: Properties>(var: &IndexedVar, body: &Body<P>) -> bool {
    body.stmts.iter().any(|stmt| match &stmt.value {
        StmtValue::Expr(e) => occurs_free(var, e),
        StmtValue::IfElse(ite) => {
            occurs_free(var, &ite.cond)
                || occurs_free_body(var, &ite.true_branch)
                || ite.false_branch.iter().any(|fb| occurs_free_body(var, fb))
        }
        StmtValue::Return(e) | StmtValue::Impossible(e) => {
            e.iter().any(|e| occurs_free(var, e))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{IsMutable, Qty};
    use crate::raw;
    use crate::SourceLoc;

    fn expr(value: raw::ExprValue) -> raw::Expr {
        raw::Expr::new(SourceLoc::default(), value)
    }

    fn var(name: &str) -> raw::Expr {
        expr(ExprValue::Var(IndexedVar::new(name)))
    }

    fn arg(ty: raw::Expr, name: &str) -> raw::FuncArg {
        FuncArg {
            properties: SourceLoc::default(),
            qty: Qty::Many,
            ty,
            var: Some(IndexedVar::new(name)),
        }
    }

    fn u64_t() -> raw::Expr {
        expr(ExprValue::IntegerT(crate::ast::Sign::Unsigned, crate::ast::Width::W64))
    }

    /// `(u64 y) -> array_t(u64, x)`
    fn pi_over_y() -> raw::Expr {
        let ret = expr(ExprValue::ArrayT(Box::new(u64_t()), Box::new(var("x"))));
        expr(ExprValue::Pi(raw::Pi {
            is_mutable: IsMutable::No,
            args: Vec::from([arg(u64_t(), "y")]),
            ret_type: Box::new(ret),
        }))
    }

    #[test]
    fn capture_avoidance() {
        let mut e = pi_over_y();
        substitute(&mut e, &IndexedVar::new("x"), &var("y"));
        assert_eq!(e.to_string(), "(u64 y:1) -> array_t(u64, y)");
        assert!(occurs_free(&IndexedVar::new("y"), &e));
    }

    #[test]
    fn shadowing_stops_substitution() {
        let mut e = pi_over_y();
        if let ExprValue::Pi(pi) = &mut e.value {
            pi.args[0].var = Some(IndexedVar::new("x"));
        }
        let before = e.to_string();
        substitute(&mut e, &IndexedVar::new("x"), &var("z"));
        assert_eq!(e.to_string(), before);
    }

    #[test]
    fn bound_occurrence_is_not_free() {
        let mut e = pi_over_y();
        if let ExprValue::Pi(pi) = &mut e.value {
            pi.args[0].var = Some(IndexedVar::new("x"));
        }
        assert!(!occurs_free(&IndexedVar::new("x"), &e));
        assert!(occurs_free(&IndexedVar::new("x"), &pi_over_y()));
    }
}
