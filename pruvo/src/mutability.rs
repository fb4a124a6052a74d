//! Classification of expressions by whether evaluating them may have side effects.

use crate::ast::{ExprValue, IsMutable};
use crate::legal::Expr;

/// Return true if evaluating the expression may have side effects.
///
/// This is the case if the expression contains
/// a call to a mutable function or a call with a mutable argument.
/// Abstractions are never mutable, because their body is only evaluated when called.
pub fn is_mutable(expr: &Expr) -> bool {
    match &expr.value {
        ExprValue::App(func, args) => {
            let pi = func.pi_sort();
            pi.map_or(false, |pi| pi.is_mutable == IsMutable::Yes)
                || is_mutable(func)
                || args.iter().any(is_mutable)
        }
        ExprValue::Abs(_) => false,
        value => value.children().into_iter().any(is_mutable),
    }
}
