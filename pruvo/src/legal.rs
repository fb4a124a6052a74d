//! Typed trees as produced by the type checker.
//!
//! Every node of a legal tree carries a [`Derivation`],
//! which can only be obtained by passing type assignment.
//! Expressions furthermore carry their [`Sort`].

use crate::ast::{self, Properties, SortMut};
use crate::typecheck::Derivation;

/// Type of a legal expression.
#[derive(Clone, Debug)]
pub enum Sort {
    /// the expression is a term or a type, and this is its type
    Expr(Box<Expr>),
    /// the expression is `typename`
    Kind,
}

/// Annotation of a legal expression.
///
/// Annotations are created by the type checker only.
/// Outside of this crate, they can be inspected, but neither built nor changed:
///
/// ~~~compile_fail
/// # use pruvo::legal::{ExprProperties, Sort};
/// # use pruvo::typecheck::Derivation;
/// fn forge(derivation: Derivation) -> ExprProperties {
///     ExprProperties { derivation, sort: Sort::Kind }
/// }
/// ~~~
///
/// ~~~compile_fail
/// # use pruvo::ast::{Properties, SortMut};
/// # use pruvo::legal::{ExprProperties, Legal};
/// fn retype(props: &mut ExprProperties) {
///     Legal::sort_mut(props, SortMut(()));
/// }
/// ~~~
#[derive(Clone, Debug)]
pub struct ExprProperties {
    derivation: Derivation,
    sort: Sort,
}

impl ExprProperties {
    pub(crate) fn new(derivation: Derivation, sort: Sort) -> Self {
        Self { derivation, sort }
    }

    pub fn derivation(&self) -> &Derivation {
        &self.derivation
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }
}

/// Annotation of legal trees.
#[derive(Clone, Debug)]
pub struct Legal;

impl Properties for Legal {
    type Module = Derivation;
    type TypeDef = Derivation;
    type FuncDecl = Derivation;
    type FuncDef = Derivation;
    type FuncArg = Derivation;
    type Body = Derivation;
    type Stmt = Derivation;
    type Expr = ExprProperties;

    fn sort(props: &ExprProperties) -> Option<&Expr> {
        match &props.sort {
            Sort::Expr(ty) => Some(ty),
            Sort::Kind => None,
        }
    }

    fn sort_mut(props: &mut ExprProperties, _: SortMut) -> Option<&mut Expr> {
        match &mut props.sort {
            Sort::Expr(ty) => Some(ty),
            Sort::Kind => None,
        }
    }
}

pub type Expr = ast::Expr<Legal>;
pub type ExprValue = ast::ExprValue<Legal>;
pub type FuncArg = ast::FuncArg<Legal>;
pub type Pi = ast::Pi<Legal>;
pub type Abs = ast::Abs<Legal>;
pub type Body = ast::Body<Legal>;
pub type Stmt = ast::Stmt<Legal>;
pub type StmtValue = ast::StmtValue<Legal>;
pub type IfElse = ast::IfElse<Legal>;
pub type TypeDef = ast::TypeDef<Legal>;
pub type TypeDefValue = ast::TypeDefValue<Legal>;
pub type FuncDecl = ast::FuncDecl<Legal>;
pub type FuncDef = ast::FuncDef<Legal>;
pub type Entry = ast::Entry<Legal>;
pub type Module = ast::Module<Legal>;

impl Expr {
    /// Return the type of the expression, or `None` if the expression is `typename`.
    pub fn ty(&self) -> Option<&Expr> {
        Legal::sort(&self.properties)
    }

    /// Return the signature of the expression if its type is a pi-type.
    pub fn pi_sort(&self) -> Option<&Pi> {
        match &self.ty()?.value {
            ast::ExprValue::Pi(pi) => Some(pi),
            _ => None,
        }
    }
}
