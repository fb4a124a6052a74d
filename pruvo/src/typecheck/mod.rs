//! Type checking of raw trees, yielding legal trees.
//!
//! Type checking is bidirectional:
//! [`type_assign`] determines the type of an expression on its own, whereas
//! [`check_expr`] verifies that an expression has a given type.
//! The latter is required for expressions such as numeric literals and
//! initialiser lists, whose type cannot be determined in isolation.
//!
//! Declarations are checked by [`check_module`],
//! which adds them to a global environment as it goes.

mod app;
mod check;
mod derivation_rules;
mod type_assign;

pub use check::{check_body, check_expr, check_func_decl, check_func_def, check_module};
pub use check::{check_extern_decl, check_type, check_type_def};
pub use derivation_rules::Derivation;
pub use type_assign::type_assign;

use crate::context::Context;
use crate::env::Env;
use crate::error::{Error, TypeError};
use crate::legal;
use crate::normalize::normalize_expr;
use crate::source::SourceLoc;

pub type Result<T> = core::result::Result<T, TypeError>;

/// Construct a type error located at the given source location.
fn error(msg: impl Into<String>, loc: &SourceLoc, ctx: &Context) -> TypeError {
    TypeError::new(Error::new(msg).at(loc.clone()), ctx)
}

/// Return the type of a legal expression, failing if it is `typename`.
fn sort_of<'a>(expr: &'a legal::Expr, loc: &SourceLoc, ctx: &Context) -> Result<&'a legal::Expr> {
    expr.ty()
        .ok_or_else(|| error("`typename` cannot be used as a term", loc, ctx))
}

/// Return true if two legal expressions have alpha-equivalent normal forms.
fn is_equivalent(env: &Env, a: &legal::Expr, b: &legal::Expr) -> bool {
    let (mut a, mut b) = (a.clone(), b.clone());
    normalize_expr(env, &mut a);
    normalize_expr(env, &mut b);
    crate::alpha::is_alpha_equivalent(&a, &b)
}
