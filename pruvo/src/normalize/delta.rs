//! Unfolding of global definitions and folding of primitive operations.

use super::Normalizer;
use crate::alpha::is_alpha_equivalent;
use crate::ast::{ArithOp, BoolOp, ExprValue, RelOp, Sign, Width};
use crate::env::Env;
use crate::legal;
use crate::mutability::is_mutable;
use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Return the smallest and the largest value of an integer type.
///
/// ~~~
/// # use pruvo::normalize::bounds;
/// # use pruvo::ast::{Sign, Width};
/// assert_eq!(bounds(Sign::Signed, Width::W8), ((-128).into(), 127.into()));
/// assert_eq!(bounds(Sign::Unsigned, Width::W16), (0.into(), 65535.into()));
/// ~~~
pub fn bounds(sign: Sign, width: Width) -> (BigInt, BigInt) {
    match sign {
        Sign::Unsigned => (BigInt::zero(), (BigInt::one() << width.bits()) - BigInt::one()),
        Sign::Signed => {
            let half = BigInt::one() << (width.bits() - 1);
            (-half.clone(), half - BigInt::one())
        }
    }
}

/// Map an integer to the value it has when stored in an integer type,
/// wrapping around on overflow.
///
/// ~~~
/// # use pruvo::normalize::wrap;
/// # use pruvo::ast::{Sign, Width};
/// assert_eq!(wrap(300.into(), Sign::Unsigned, Width::W8), 44.into());
/// assert_eq!(wrap(200.into(), Sign::Signed, Width::W8), (-56).into());
/// assert_eq!(wrap((-1).into(), Sign::Unsigned, Width::W32), 4294967295u32.into());
/// ~~~
pub fn wrap(value: BigInt, sign: Sign, width: Width) -> BigInt {
    let modulus = BigInt::one() << width.bits();
    let mut value = value % &modulus;
    if value.is_negative() {
        value += &modulus;
    }
    if sign == Sign::Signed && value >= BigInt::one() << (width.bits() - 1) {
        value -= &modulus;
    }
    value
}

/// Return true if an expression is a literal value.
fn is_value(expr: &legal::Expr) -> bool {
    use ExprValue::*;
    match &expr.value {
        BoolLit(_) | Numeric(_) | Str(_) => true,
        Typename | BoolT | UnitT | CstrT | ScopeT | IntegerT(..) => true,
        InitList(xs) => xs.iter().all(is_value),
        _ => false,
    }
}

/// Evaluate a primitive operation at the root of an expression if its operands are literals.
///
/// Return true if the expression changed.
pub(super) fn fold(env: &Env, expr: &mut legal::Expr) -> bool {
    use ExprValue::*;
    let folded = match &expr.value {
        Not(x) => match x.value {
            BoolLit(b) => Some(BoolLit(!b)),
            _ => None,
        },
        Bool(op, x, y) => match (&x.value, &y.value) {
            (BoolLit(x), BoolLit(y)) => Some(BoolLit(match op {
                BoolOp::And => *x && *y,
                BoolOp::Or => *x || *y,
                BoolOp::Xor => x != y,
            })),
            _ => None,
        },
        Rel(op, x, y) => fold_rel(*op, x, y).map(BoolLit),
        Arith(op, x, y) => fold_arith(env, expr.ty(), *op, x, y).map(Numeric),
        _ => None,
    };
    if let Some(value) = folded {
        trace!("fold {} to {}", expr, value);
        expr.value = value;
        return true;
    }
    fold_member(env, expr) || fold_subscript(expr) || fold_slice(env, expr)
}

fn fold_rel(op: RelOp, x: &legal::Expr, y: &legal::Expr) -> Option<bool> {
    let ord = match (&x.value, &y.value) {
        (ExprValue::Numeric(x), ExprValue::Numeric(y)) => x.cmp(y),
        (ExprValue::BoolLit(x), ExprValue::BoolLit(y)) => x.cmp(y),
        _ => return None,
    };
    Some(match op {
        RelOp::Eq => ord.is_eq(),
        RelOp::Neq => ord.is_ne(),
        RelOp::Lt => ord.is_lt(),
        RelOp::Lte => ord.is_le(),
        RelOp::Gt => ord.is_gt(),
        RelOp::Gte => ord.is_ge(),
    })
}

fn fold_arith(
    env: &Env,
    ty: Option<&legal::Expr>,
    op: ArithOp,
    x: &legal::Expr,
    y: &legal::Expr,
) -> Option<BigInt> {
    let (x, y) = match (&x.value, &y.value) {
        (ExprValue::Numeric(x), ExprValue::Numeric(y)) => (x, y),
        _ => return None,
    };
    let (sign, width) = env.integer_type(ty?)?;
    let value = match op {
        ArithOp::Plus => x + y,
        ArithOp::Minus => x - y,
        ArithOp::Mult => x * y,
        ArithOp::Div if y.is_zero() => {
            warn!("division by zero in {} / {} is left unevaluated", x, y);
            return None;
        }
        ArithOp::Div => x / y,
    };
    Some(wrap(value, sign, width))
}

/// Return the position of a named field in a struct or sigma type.
fn field_position(env: &Env, ty: &legal::Expr, field: &str) -> Option<usize> {
    let fields = match &ty.value {
        ExprValue::Sigma(fields) => fields.as_slice(),
        _ => env.struct_fields(ty)?,
    };
    let is_field = |arg: &legal::FuncArg| arg.var.as_ref().map_or(false, |v| v.name == field);
    fields.iter().position(is_field)
}

/// Return the elements of an initializer list if evaluating them has no side effects.
fn pure_list(expr: &legal::Expr) -> Option<&[legal::Expr]> {
    match &expr.value {
        ExprValue::InitList(xs) if !xs.iter().any(is_mutable) => Some(xs),
        _ => None,
    }
}

/// Replace a member access or a subscript of an initializer list
/// by the list element at the given position.
fn take_element(expr: &mut legal::Expr, pos: usize) -> bool {
    let xs = match &mut expr.value {
        ExprValue::Member(x, _) | ExprValue::Subscript(x, _) => match &mut x.value {
            ExprValue::InitList(xs) if pos < xs.len() => xs,
            _ => return false,
        },
        _ => return false,
    };
    let elem = xs.swap_remove(pos);
    trace!("select element {}: {}", pos, elem);
    *expr = elem;
    true
}

fn fold_member(env: &Env, expr: &mut legal::Expr) -> bool {
    let pos = match &expr.value {
        ExprValue::Member(x, field) => pure_list(x)
            .and_then(|_| x.ty())
            .and_then(|ty| field_position(env, ty, field)),
        _ => None,
    };
    pos.map_or(false, |pos| take_element(expr, pos))
}

fn fold_subscript(expr: &mut legal::Expr) -> bool {
    let pos = match &expr.value {
        ExprValue::Subscript(x, idx) => match (pure_list(x), &idx.value) {
            (Some(_), ExprValue::Numeric(i)) => i.to_usize(),
            _ => None,
        },
        _ => None,
    };
    pos.map_or(false, |pos| take_element(expr, pos))
}

/// Evaluate `slice(t, n, xs, k, proof)` for a literal list `xs` and a literal start `k`.
fn fold_slice(env: &Env, expr: &mut legal::Expr) -> bool {
    let args = match &mut expr.value {
        ExprValue::App(func, args) => match &func.value {
            ExprValue::Global(g) if g.path.is_empty() && g.name == "slice" && env.get(g).is_none() => {
                args
            }
            _ => return false,
        },
        _ => return false,
    };
    let k = match args.get(3).map(|k| &k.value) {
        Some(ExprValue::Numeric(k)) => k.to_usize(),
        _ => None,
    };
    let (xs, k) = match (args.get_mut(2).map(|xs| &mut xs.value), k) {
        (Some(ExprValue::InitList(xs)), Some(k)) if k <= xs.len() => (xs, k),
        _ => return false,
    };
    if xs[..k].iter().any(is_mutable) {
        return false;
    }
    let rest = xs.split_off(k);
    trace!("slice off {} elements", k);
    expr.value = ExprValue::InitList(rest);
    true
}

impl<'e> Normalizer<'e> {
    /// Inline a global function definition at an immutable call site.
    ///
    /// The inlined call is normalised, and the inlining is only kept
    /// if the call reduces to something that is no longer a call.
    pub(super) fn unfold(&mut self, expr: &mut legal::Expr) -> bool {
        let env = self.env;
        if !env.inline_globals || self.fuel == 0 {
            return false;
        }
        let (global, args) = match &expr.value {
            ExprValue::App(func, args) => match &func.value {
                ExprValue::Global(g) => (g, args),
                _ => return false,
            },
            _ => return false,
        };
        let def = match env.func_def(global) {
            Some(def) => def,
            None => return false,
        };
        if is_mutable(expr) {
            return false;
        }
        if self.stack.len() >= env.unfold_limit {
            debug!("not unfolding {}: nesting limit reached", global);
            return false;
        }
        if self.stack.contains(global) && !args.iter().all(is_value) {
            return false;
        }
        self.fuel -= 1;

        let mut unfolded = expr.clone();
        if let ExprValue::App(func, _) = &mut unfolded.value {
            func.value = ExprValue::Abs(def.value.clone());
        }
        self.stack.push(global.clone());
        self.expr(&mut unfolded);
        self.stack.pop();

        let stuck = match &unfolded.value {
            ExprValue::App(func, _) => matches!(func.value, ExprValue::Abs(_)),
            _ => false,
        };
        if stuck || is_alpha_equivalent(&unfolded, expr) {
            return false;
        }
        trace!("unfold {} to {}", expr, unfolded);
        *expr = unfolded;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraparound() {
        assert_eq!(wrap(BigInt::from(200 + 100), Sign::Unsigned, Width::W8), 44.into());
        assert_eq!(wrap(BigInt::from(100 + 100), Sign::Signed, Width::W8), (-56).into());
        assert_eq!(wrap(BigInt::from(-129), Sign::Signed, Width::W8), 127.into());
        let max = BigInt::from(u64::MAX);
        assert_eq!(wrap(max.clone() + BigInt::one(), Sign::Unsigned, Width::W64), 0.into());
        assert_eq!(wrap(max, Sign::Signed, Width::W64), (-1).into());
    }

    #[test]
    fn bounds_are_wrap_fixpoints() {
        for sign in [Sign::Signed, Sign::Unsigned] {
            for width in [Width::W8, Width::W16, Width::W32, Width::W64] {
                let (min, max) = bounds(sign, width);
                assert_eq!(wrap(min.clone(), sign, width), min);
                assert_eq!(wrap(max.clone(), sign, width), max);
                assert_eq!(wrap(max + BigInt::one(), sign, width), min);
            }
        }
    }
}
