//! Construction of legal nodes.
//!
//! This is the only place where derivations are created,
//! and its functions are only visible to the type checker.

use crate::ast::{ExprValue, Sign, Width};
use crate::legal::{self, ExprProperties, Sort};

/// Evidence that a node has been type checked.
///
/// Derivations are only created by the type checker.
/// Elsewhere, they can only be copied from nodes that the type checker produced.
///
/// ~~~compile_fail
/// let forged = pruvo::typecheck::Derivation { _private: () };
/// ~~~
#[derive(Clone, Debug)]
pub struct Derivation {
    _private: (),
}

impl Derivation {
    pub(super) fn new() -> Self {
        Self { _private: () }
    }
}

fn make_legal_expr(sort: Sort, value: legal::ExprValue) -> legal::Expr {
    let derivation = Derivation::new();
    legal::Expr::new(ExprProperties::new(derivation, sort), value)
}

/// `typename`, the only expression of sort `Kind`.
pub(super) fn make_typename() -> legal::Expr {
    make_legal_expr(Sort::Kind, ExprValue::Typename)
}

/// Type, i.e. an expression of type `typename`.
pub(super) fn make_type(value: legal::ExprValue) -> legal::Expr {
    make_legal_expr(Sort::Expr(Box::new(make_typename())), value)
}

/// Term of the given type.
pub(super) fn make_term(ty: legal::Expr, value: legal::ExprValue) -> legal::Expr {
    make_legal_expr(Sort::Expr(Box::new(ty)), value)
}

pub(super) fn make_bool_t() -> legal::Expr {
    make_type(ExprValue::BoolT)
}

pub(super) fn make_unit_t() -> legal::Expr {
    make_type(ExprValue::UnitT)
}

pub(super) fn make_scope_t() -> legal::Expr {
    make_type(ExprValue::ScopeT)
}

pub(super) fn make_u64_t() -> legal::Expr {
    make_type(ExprValue::IntegerT(Sign::Unsigned, Width::W64))
}

pub(super) fn make_bool_lit(b: bool) -> legal::Expr {
    make_term(make_bool_t(), ExprValue::BoolLit(b))
}

/// Negation of a legal boolean expression.
pub(super) fn make_not(cond: legal::Expr) -> legal::Expr {
    make_term(make_bool_t(), ExprValue::Not(Box::new(cond)))
}
