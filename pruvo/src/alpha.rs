//! Fresh variables and equality modulo renaming of bound variables.

use crate::ast::{Body, Expr, ExprValue, FuncArg, IndexedVar, Properties, StmtValue};
use crate::subst::rename_scope;

/// Return the largest variable index occurring in an expression,
/// including binders and sorts.
pub fn max_index<P: Properties>(expr: &Expr<P>) -> usize {
    let sort = P::sort(&expr.properties).map_or(0, max_index);
    let value = match &expr.value {
        ExprValue::Var(v) => v.idx,
        ExprValue::Abs(abs) => max_index_scope(&abs.args, Some(&*abs.ret_type), Some(&abs.body)),
        ExprValue::Pi(pi) => max_index_scope(&pi.args, Some(&*pi.ret_type), None),
        ExprValue::Sigma(args) => max_index_scope(args, None, None),
        value => value.children().into_iter().map(max_index).max().unwrap_or(0),
    };
    sort.max(value)
}

/// Return the largest variable index occurring in the scope of a binder.
pub fn max_index_scope<P: Properties>(
    args: &[FuncArg<P>],
    ret: Option<&Expr<P>>,
    body: Option<&Body<P>>,
) -> usize {
    let args = args.iter().map(|arg| {
        let var = arg.var.as_ref().map_or(0, |v| v.idx);
        var.max(max_index(&arg.ty))
    });
    let ret = ret.map_or(0, max_index);
    let body = body.map_or(0, max_index_body);
    args.max().unwrap_or(0).max(ret).max(body)
}

fn max_index_body<P: Properties>(body: &Body<P>) -> usize {
    let stmts = body.stmts.iter().map(|stmt| match &stmt.value {
        StmtValue::Expr(e) => max_index(e),
        StmtValue::IfElse(ite) => {
            let fb = ite.false_branch.as_ref().map_or(0, max_index_body);
            max_index(&ite.cond)
                .max(max_index_body(&ite.true_branch))
                .max(fb)
        }
        StmtValue::Return(e) | StmtValue::Impossible(e) => e.as_ref().map_or(0, max_index),
    });
    stmts.max().unwrap_or(0)
}

/// Replace a variable in the scope of a binder by a fresh variable with the same name,
/// and return the fresh variable.
///
/// The index of the fresh variable is larger than
/// the index of the old variable and any index in the scope.
pub fn rename<P: Properties>(
    var: &IndexedVar,
    args: &mut [FuncArg<P>],
    ret: Option<&mut Expr<P>>,
    body: Option<&mut Body<P>>,
) -> IndexedVar {
    rename_above(var, 0, args, ret, body)
}

/// Like [`rename`], but the fresh index is furthermore larger than `floor`.
pub(crate) fn rename_above<P: Properties>(
    var: &IndexedVar,
    floor: usize,
    args: &mut [FuncArg<P>],
    ret: Option<&mut Expr<P>>,
    body: Option<&mut Body<P>>,
) -> IndexedVar {
    let scope = max_index_scope(args, ret.as_deref(), body.as_deref());
    let idx = 1 + var.idx.max(scope).max(floor);
    let fresh = IndexedVar::with_idx(var.name.clone(), idx);
    trace!("rename {} to {}", var, fresh);
    rename_scope(args, ret, body, var, &fresh);
    fresh
}

/// Pairs of variables bound at the same position on both sides.
struct Bound<'a>(Vec<(Option<&'a IndexedVar>, Option<&'a IndexedVar>)>);

/// Return true if two expressions are equal modulo renaming of bound variables.
///
/// Properties of the expressions are ignored.
///
/// ~~~
/// # use pruvo::alpha::is_alpha_equivalent;
/// # use pruvo::ast::{FuncArg, IsMutable, Qty};
/// # use pruvo::raw::{Expr, ExprValue, Pi};
/// # use pruvo::{IndexedVar, SourceLoc};
/// let expr = |value| Expr::new(SourceLoc::default(), value);
/// let id = |x: &str| {
///     let var = IndexedVar::new(x);
///     let ty = expr(ExprValue::BoolT);
///     let properties = SourceLoc::default();
///     let arg = FuncArg { properties, qty: Qty::Many, ty, var: Some(var.clone()) };
///     let ret_type = Box::new(expr(ExprValue::TrueT(Box::new(expr(ExprValue::Var(var))))));
///     expr(ExprValue::Pi(Pi { is_mutable: IsMutable::No, args: vec![arg], ret_type }))
/// };
/// assert!(is_alpha_equivalent(&id("x"), &id("y")));
/// ~~~
pub fn is_alpha_equivalent<P: Properties>(a: &Expr<P>, b: &Expr<P>) -> bool {
    Bound(Vec::new()).expr(a, b)
}

impl<'a> Bound<'a> {
    fn var(&self, x: &IndexedVar, y: &IndexedVar) -> bool {
        for (l, r) in self.0.iter().rev() {
            let (lx, ry) = (*l == Some(x), *r == Some(y));
            if lx || ry {
                return lx && ry;
            }
        }
        x == y
    }

    fn exprs<P: Properties>(&mut self, a: &'a [Expr<P>], b: &'a [Expr<P>]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(a, b)| self.expr(a, b))
    }

    fn expr<P: Properties>(&mut self, a: &'a Expr<P>, b: &'a Expr<P>) -> bool {
        use ExprValue::*;
        match (&a.value, &b.value) {
            (Typename, Typename) | (Auto, Auto) | (BoolT, BoolT) => true,
            (UnitT, UnitT) | (CstrT, CstrT) | (ScopeT, ScopeT) => true,
            (IntegerT(s1, w1), IntegerT(s2, w2)) => s1 == s2 && w1 == w2,
            (BoolLit(x), BoolLit(y)) => x == y,
            (Numeric(x), Numeric(y)) => x == y,
            (Str(x), Str(y)) => x == y,
            (Var(x), Var(y)) => self.var(x, y),
            (Global(x), Global(y)) => x == y,
            (TrueT(x), TrueT(y))
            | (AddressOf(x), AddressOf(y))
            | (Deref(x), Deref(y))
            | (ScopeOf(x), ScopeOf(y))
            | (Not(x), Not(y)) => self.expr(x, y),
            (Member(x, f1), Member(y, f2)) => f1 == f2 && self.expr(x, y),
            (ArrayT(x1, y1), ArrayT(x2, y2))
            | (RefT(x1, y1), RefT(x2, y2))
            | (Subscript(x1, y1), Subscript(x2, y2))
            | (Because(x1, y1), Because(x2, y2)) => self.expr(x1, x2) && self.expr(y1, y2),
            (Bool(o1, x1, y1), Bool(o2, x2, y2)) => {
                o1 == o2 && self.expr(x1, x2) && self.expr(y1, y2)
            }
            (Rel(o1, x1, y1), Rel(o2, x2, y2)) => {
                o1 == o2 && self.expr(x1, x2) && self.expr(y1, y2)
            }
            (Arith(o1, x1, y1), Arith(o2, x2, y2)) => {
                o1 == o2 && self.expr(x1, x2) && self.expr(y1, y2)
            }
            (App(f1, a1), App(f2, a2)) => self.expr(f1, f2) && self.exprs(a1, a2),
            (InitList(x), InitList(y)) => self.exprs(x, y),
            (Abs(x), Abs(y)) => {
                let (r1, r2) = (&*x.ret_type, &*y.ret_type);
                let (b1, b2) = (&x.body, &y.body);
                x.is_mutable == y.is_mutable
                    && self.scope(&x.args, &y.args, move |this| {
                        this.expr(r1, r2) && this.body(b1, b2)
                    })
            }
            (Pi(x), Pi(y)) => {
                let (r1, r2) = (&*x.ret_type, &*y.ret_type);
                x.is_mutable == y.is_mutable
                    && self.scope(&x.args, &y.args, move |this| this.expr(r1, r2))
            }
            (Sigma(x), Sigma(y)) => self.scope(x, y, |_| true),
            _ => false,
        }
    }

    fn scope<P: Properties, F>(&mut self, a: &'a [FuncArg<P>], b: &'a [FuncArg<P>], f: F) -> bool
    where
        F: FnOnce(&mut Self) -> bool,
    {
        if a.len() != b.len() {
            return false;
        }
        let len = self.0.len();
        let args = a.iter().zip(b).all(|(a, b)| {
            let eq = a.qty == b.qty && self.expr(&a.ty, &b.ty);
            self.0.push((a.var.as_ref(), b.var.as_ref()));
            eq
        });
        let eq = args && f(self);
        self.0.truncate(len);
        eq
    }

    fn body<P: Properties>(&mut self, a: &'a Body<P>, b: &'a Body<P>) -> bool {
        a.stmts.len() == b.stmts.len()
            && a.stmts.iter().zip(&b.stmts).all(|(x, y)| {
                match (&x.value, &y.value) {
                    (StmtValue::Expr(x), StmtValue::Expr(y)) => self.expr(x, y),
                    (StmtValue::Return(x), StmtValue::Return(y))
                    | (StmtValue::Impossible(x), StmtValue::Impossible(y)) => match (x, y) {
                        (None, None) => true,
                        (Some(x), Some(y)) => self.expr(x, y),
                        _ => false,
                    },
                    (StmtValue::IfElse(x), StmtValue::IfElse(y)) => {
                        let fb = match (&x.false_branch, &y.false_branch) {
                            (None, None) => true,
                            (Some(x), Some(y)) => self.body(x, y),
                            _ => false,
                        };
                        fb && self.expr(&x.cond, &y.cond) && self.body(&x.true_branch, &y.true_branch)
                    }
                    _ => false,
                }
            })
    }
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

    fn var(v: IndexedVar) -> raw::Expr {
        expr(ExprValue::Var(v))
    }

    /// `(bool x, bool y) -> true_t(<ret>)`
    fn pi(x: IndexedVar, y: IndexedVar, ret: raw::Expr) -> raw::Expr {
        let arg = |v| raw::FuncArg {
            properties: SourceLoc::default(),
            qty: Qty::Many,
            ty: expr(ExprValue::BoolT),
            var: Some(v),
        };
        expr(ExprValue::Pi(raw::Pi {
            is_mutable: IsMutable::No,
            args: Vec::from([arg(x), arg(y)]),
            ret_type: Box::new(expr(ExprValue::TrueT(Box::new(ret)))),
        }))
    }

    #[test]
    fn max_index_sees_binders() {
        let x = IndexedVar::with_idx("x", 3);
        let y = IndexedVar::with_idx("y", 5);
        let e = pi(x.clone(), y, var(x));
        assert_eq!(max_index(&e), 5);
    }

    #[test]
    fn rename_in_scope() {
        let x = IndexedVar::new("x");
        let mut ret = var(x.clone());
        let mut args = Vec::new();
        let fresh = rename::<raw::Raw>(&x, &mut args, Some(&mut ret), None);
        assert_eq!(fresh, IndexedVar::with_idx("x", 1));
        assert_eq!(ret.to_string(), "x:1");
    }

    #[test]
    fn bound_variables() {
        let (x, y) = (IndexedVar::new("x"), IndexedVar::new("y"));
        let (a, b) = (IndexedVar::new("a"), IndexedVar::new("b"));
        let e1 = pi(x.clone(), y.clone(), var(x.clone()));
        let e2 = pi(a.clone(), b.clone(), var(a.clone()));
        let e3 = pi(a.clone(), b.clone(), var(b));
        assert!(is_alpha_equivalent(&e1, &e2));
        assert!(!is_alpha_equivalent(&e1, &e3));
        // shadowing: the inner binder wins
        let e4 = pi(x.clone(), x.clone(), var(x));
        let e5 = pi(a, y.clone(), var(y));
        assert!(is_alpha_equivalent(&e4, &e5));
    }

    #[test]
    fn free_variables() {
        let x = IndexedVar::new("x");
        let y = IndexedVar::new("y");
        assert!(is_alpha_equivalent(&var(x.clone()), &var(x.clone())));
        assert!(!is_alpha_equivalent(&var(x), &var(y)));
    }
}
