//! Untyped trees as produced by the parser.

use crate::ast::{self, Properties, SortMut};
use crate::source::SourceLoc;

/// Annotation of raw trees: every node carries its source location.
#[derive(Clone, Debug)]
pub struct Raw;

impl Properties for Raw {
    type Module = SourceLoc;
    type TypeDef = SourceLoc;
    type FuncDecl = SourceLoc;
    type FuncDef = SourceLoc;
    type FuncArg = SourceLoc;
    type Body = SourceLoc;
    type Stmt = SourceLoc;
    type Expr = SourceLoc;

    fn sort(_: &SourceLoc) -> Option<&Expr> {
        None
    }

    fn sort_mut(_: &mut SourceLoc, _: SortMut) -> Option<&mut Expr> {
        None
    }
}

pub type Expr = ast::Expr<Raw>;
pub type ExprValue = ast::ExprValue<Raw>;
pub type FuncArg = ast::FuncArg<Raw>;
pub type Pi = ast::Pi<Raw>;
pub type Abs = ast::Abs<Raw>;
pub type Body = ast::Body<Raw>;
pub type Stmt = ast::Stmt<Raw>;
pub type StmtValue = ast::StmtValue<Raw>;
pub type IfElse = ast::IfElse<Raw>;
pub type TypeDef = ast::TypeDef<Raw>;
pub type TypeDefValue = ast::TypeDefValue<Raw>;
pub type FuncDecl = ast::FuncDecl<Raw>;
pub type FuncDef = ast::FuncDef<Raw>;
pub type Entry = ast::Entry<Raw>;
pub type Module = ast::Module<Raw>;

impl Expr {
    /// Return the source location of the expression.
    pub fn loc(&self) -> &SourceLoc {
        &self.properties
    }
}
