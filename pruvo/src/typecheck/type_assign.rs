//! Determining the type of an expression.

use super::app::type_assign_app;
use super::check::{check_abs, check_expr, check_func_args, check_pi, check_type};
use super::derivation_rules::*;
use super::{error, sort_of, Result};
use crate::ast::{ExprValue, FuncArg, GlobalRef, IndexedVar, IsMutable, Qty, RelOp};
use crate::ast::{ArithOp, Sign, Width};
use crate::context::{Context, Decl};
use crate::env::Env;
use crate::legal;
use crate::raw;
use crate::source::SourceLoc;
use crate::subst::substitute_scope;
use num_traits::ToPrimitive;

/// Assign a type to an expression.
///
/// ~~~
/// # use pruvo::typecheck::type_assign;
/// # use pruvo::raw::{Expr, ExprValue};
/// # use pruvo::{Context, Env, SourceLoc};
/// let expr = |value| Expr::new(SourceLoc::default(), value);
/// let t = expr(ExprValue::Not(Box::new(expr(ExprValue::BoolLit(true)))));
/// let legal = type_assign(&Env::new(), &Context::new(), &t)?;
/// assert_eq!(legal.ty().unwrap().to_string(), "bool");
/// # Ok::<_, pruvo::TypeError>(())
/// ~~~
pub fn type_assign(env: &Env, ctx: &Context, expr: &raw::Expr) -> Result<legal::Expr> {
    debug!("type assign {}", expr);
    let loc = expr.loc();
    use ExprValue::*;
    match &expr.value {
        Typename => Ok(make_typename()),
        BoolT => Ok(make_bool_t()),
        UnitT => Ok(make_unit_t()),
        CstrT => Ok(make_type(CstrT)),
        ScopeT => Ok(make_scope_t()),
        IntegerT(sign, width) => Ok(make_type(IntegerT(*sign, *width))),
        Auto => Err(error("cannot infer value for auto", loc, ctx)),
        TrueT(cond) => {
            let cond = check_expr(env, ctx, cond, &make_bool_t())?;
            Ok(make_type(TrueT(Box::new(cond))))
        }
        ArrayT(ty, size) => {
            let ty = check_type(env, ctx, ty)?;
            let size = check_expr(env, ctx, size, &make_u64_t())?;
            Ok(make_type(ArrayT(Box::new(ty), Box::new(size))))
        }
        RefT(ty, scope) => {
            let ty = check_type(env, ctx, ty)?;
            let scope = check_expr(env, ctx, scope, &make_scope_t())?;
            Ok(make_type(RefT(Box::new(ty), Box::new(scope))))
        }
        BoolLit(b) => Ok(make_bool_lit(*b)),
        Numeric(_) => Err(error(
            "cannot assign a type to a numeric literal without context",
            loc,
            ctx,
        )),
        Str(s) => Ok(make_term(make_type(CstrT), Str(s.clone()))),
        Var(v) => match ctx.lookup(v).map(|entry| &entry.decl) {
            Some(Decl::TypeVar) => Ok(make_type(Var(v.clone()))),
            Some(Decl::TermVar { ty, .. }) => Ok(make_term(ty.clone(), Var(v.clone()))),
            None => Err(error(format!("variable not found: {}", v), loc, ctx)),
        },
        Global(g) => type_assign_global(env, ctx, g, loc),
        App(func, args) => type_assign_app(env, ctx, func, args, loc),
        Abs(abs) => {
            let abs = check_abs(env, ctx, abs, loc)?;
            Ok(make_term(make_type(Pi(abs.pi())), Abs(abs)))
        }
        Pi(pi) => Ok(make_type(Pi(check_pi(env, ctx, pi)?))),
        Sigma(args) => {
            let mut ctx = ctx.extend();
            Ok(make_type(Sigma(check_func_args(env, &mut ctx, args)?)))
        }
        InitList(_) => Err(error(
            "cannot assign a type to an initializer list without context",
            loc,
            ctx,
        )),
        Member(x, field) => {
            let x = type_assign(env, ctx, x)?;
            let ty = sort_of(&x, loc, ctx)?;
            let fields = fields_of(env, ty)
                .ok_or_else(|| error(format!("type `{}` has no members", ty), loc, ctx))?;
            let ty = field_type(fields, |_, arg| arg_name(arg) == Some(field.as_str()), |_, arg| {
                let name = arg_name(arg).unwrap_or_default().to_string();
                Member(Box::new(x.clone()), name)
            });
            let ty = ty.ok_or_else(|| error(format!("no member named {}", field), loc, ctx))?;
            Ok(make_term(ty, Member(Box::new(x), field.clone())))
        }
        Subscript(x, idx) => {
            let x = type_assign(env, ctx, x)?;
            let ty = sort_of(&x, loc, ctx)?.clone();
            match &ty.value {
                ArrayT(elem, _) => {
                    let idx = check_expr(env, ctx, idx, &make_u64_t())?;
                    Ok(make_term((**elem).clone(), Subscript(Box::new(x), Box::new(idx))))
                }
                Sigma(fields) => {
                    let pos = match &idx.value {
                        Numeric(n) => n.to_usize(),
                        _ => None,
                    };
                    let pos = pos.ok_or_else(|| {
                        error("subscript of a sigma type must be a numeric literal", loc, ctx)
                    })?;
                    let idx = check_expr(env, ctx, idx, &make_u64_t())?;
                    let ty = field_type(fields, |i, _| i == pos, |i, _| {
                        let i = make_term(make_u64_t(), Numeric(i.into()));
                        Subscript(Box::new(x.clone()), Box::new(i))
                    });
                    let ty = ty.ok_or_else(|| error("subscript out of range", loc, ctx))?;
                    Ok(make_term(ty, Subscript(Box::new(x), Box::new(idx))))
                }
                _ => Err(error(format!("type `{}` cannot be subscripted", ty), loc, ctx)),
            }
        }
        AddressOf(x) => {
            if !matches!(x.value, Var(_)) {
                return Err(error("only variables can be addressed", loc, ctx));
            }
            let x = type_assign(env, ctx, x)?;
            let ty = sort_of(&x, loc, ctx)?.clone();
            let scope = make_term(make_scope_t(), ScopeOf(Box::new(x.clone())));
            let ref_t = make_type(RefT(Box::new(ty), Box::new(scope)));
            Ok(make_term(ref_t, AddressOf(Box::new(x))))
        }
        Deref(x) => {
            let x = type_assign(env, ctx, x)?;
            let ty = match &sort_of(&x, loc, ctx)?.value {
                RefT(ty, _) => (**ty).clone(),
                _ => return Err(error("cannot dereference a non-reference", loc, ctx)),
            };
            Ok(make_term(ty, Deref(Box::new(x))))
        }
        ScopeOf(x) => {
            let x = type_assign(env, ctx, x)?;
            Ok(make_term(make_scope_t(), ScopeOf(Box::new(x))))
        }
        Not(x) => Ok(make_not(check_expr(env, ctx, x, &make_bool_t())?)),
        Bool(op, x, y) => {
            let x = check_expr(env, ctx, x, &make_bool_t())?;
            let y = check_expr(env, ctx, y, &make_bool_t())?;
            Ok(make_term(make_bool_t(), Bool(*op, Box::new(x), Box::new(y))))
        }
        Rel(op, x, y) => {
            let (x, y) = type_assign_pair(env, ctx, x, y)?;
            let ty = sort_of(&x, loc, ctx)?;
            let ordered = !matches!(op, RelOp::Eq | RelOp::Neq);
            if ordered && env.integer_type(ty).is_none() {
                let msg = format!("cannot compare values of type `{}` with {}", ty, op);
                return Err(error(msg, loc, ctx));
            }
            Ok(make_term(make_bool_t(), Rel(*op, Box::new(x), Box::new(y))))
        }
        Arith(op, x, y) => {
            let (x, y) = type_assign_pair(env, ctx, x, y)?;
            let ty = sort_of(&x, loc, ctx)?.clone();
            if env.integer_type(&ty).is_none() {
                let msg = format!("arithmetic on values of type `{}` is not supported", ty);
                return Err(error(msg, loc, ctx));
            }
            Ok(make_term(ty, Arith(*op, Box::new(x), Box::new(y))))
        }
        Because(x, reason) => {
            let reason = check_expr(env, ctx, reason, &make_bool_t())?;
            let mut ctx = ctx.extend();
            ctx.add_assumption(reason.clone());
            let x = type_assign(env, &ctx, x)?;
            let ty = sort_of(&x, loc, &ctx)?.clone();
            Ok(make_term(ty, Because(Box::new(x), Box::new(reason))))
        }
    }
}

/// Return true if an expression can only be checked, not assigned a type.
fn needs_expected_type(expr: &raw::Expr) -> bool {
    matches!(
        expr.value,
        ExprValue::Numeric(_) | ExprValue::InitList(_) | ExprValue::Auto
    )
}

/// Assign a type to one operand and check the other operand against it.
fn type_assign_pair(
    env: &Env,
    ctx: &Context,
    x: &raw::Expr,
    y: &raw::Expr,
) -> Result<(legal::Expr, legal::Expr)> {
    if needs_expected_type(x) && !needs_expected_type(y) {
        let y_legal = type_assign(env, ctx, y)?;
        let x = check_expr(env, ctx, x, sort_of(&y_legal, y.loc(), ctx)?)?;
        Ok((x, y_legal))
    } else {
        let x_legal = type_assign(env, ctx, x)?;
        let y = check_expr(env, ctx, y, sort_of(&x_legal, x.loc(), ctx)?)?;
        Ok((x_legal, y))
    }
}

fn arg_name(arg: &legal::FuncArg) -> Option<&str> {
    arg.var.as_ref().map(|v| v.name.as_str())
}

/// Return the fields of a struct or sigma type.
fn fields_of<'a>(env: &'a Env, ty: &'a legal::Expr) -> Option<&'a [legal::FuncArg]> {
    match &ty.value {
        ExprValue::Sigma(fields) => Some(fields),
        _ => env.struct_fields(ty),
    }
}

/// Return the type of the first field satisfying `is_target`,
/// where every previous field is replaced by the access to it given by `access`.
fn field_type(
    fields: &[legal::FuncArg],
    is_target: impl Fn(usize, &legal::FuncArg) -> bool,
    access: impl Fn(usize, &legal::FuncArg) -> legal::ExprValue,
) -> Option<legal::Expr> {
    let mut fields = fields.to_vec();
    for i in 0..fields.len() {
        let (field, rest) = fields[i..].split_first_mut()?;
        if is_target(i, field) {
            return Some(field.ty.clone());
        }
        if let Some(var) = field.var.clone() {
            let value = make_term(field.ty.clone(), access(i, field));
            substitute_scope(rest, None, None, &var, &value);
        }
    }
    None
}

fn type_assign_global(
    env: &Env,
    ctx: &Context,
    global: &GlobalRef,
    loc: &SourceLoc,
) -> Result<legal::Expr> {
    let value = ExprValue::Global(global.clone());
    match env.get(global) {
        Some(crate::env::Global::TypeDef(_)) => Ok(make_type(value)),
        Some(g) => match g.signature() {
            Some(pi) => Ok(make_term(make_type(ExprValue::Pi(pi)), value)),
            None => Ok(make_type(value)),
        },
        None if global.path.is_empty() && global.name == "slice" => {
            let pi = check_pi(env, &Context::new(), &slice_signature())?;
            Ok(make_term(make_type(ExprValue::Pi(pi)), value))
        }
        None => Err(error(format!("global not found: {}", global), loc, ctx)),
    }
}

/// `(0 typename t, u64 n, array_t(t, n) xs, u64 k, true_t(k <= n)) -> array_t(t, n - k)`
fn slice_signature() -> raw::Pi {
    let expr = |value| raw::Expr::new(SourceLoc::default(), value);
    let var = |name: &str| expr(ExprValue::Var(IndexedVar::new(name)));
    let u64_t = || expr(ExprValue::IntegerT(Sign::Unsigned, Width::W64));
    let arg = |qty, ty, name: Option<&str>| FuncArg {
        properties: SourceLoc::default(),
        qty,
        ty,
        var: name.map(IndexedVar::new),
    };
    let array_t = |size| expr(ExprValue::ArrayT(Box::new(var("t")), Box::new(size)));
    let k_le_n = expr(ExprValue::Rel(RelOp::Lte, Box::new(var("k")), Box::new(var("n"))));
    let n_minus_k = expr(ExprValue::Arith(ArithOp::Minus, Box::new(var("n")), Box::new(var("k"))));
    raw::Pi {
        is_mutable: IsMutable::No,
        args: Vec::from([
            arg(Qty::Zero, expr(ExprValue::Typename), Some("t")),
            arg(Qty::Many, u64_t(), Some("n")),
            arg(Qty::Many, array_t(var("n")), Some("xs")),
            arg(Qty::Many, u64_t(), Some("k")),
            arg(Qty::Zero, expr(ExprValue::TrueT(Box::new(k_le_n))), None),
        ]),
        ret_type: Box::new(array_t(n_minus_k)),
    }
}
