//! Scoped maps from variables to their declarations.

use crate::ast::{IndexedVar, IsMutable, Qty};
use crate::error::{Error, Result};
use crate::legal;
use crate::source::SourceLoc;
use std::rc::Rc;
use core::fmt::{self, Display};

/// Immutable HashMap for fast cloning of scopes.
type FnvHashMap<K, V> = im::hashmap::HashMap<K, V, fnv::FnvBuildHasher>;

#[derive(Clone, Debug)]
pub enum Decl {
    TypeVar,
    TermVar { qty: Qty, ty: legal::Expr },
}

#[derive(Clone, Debug)]
pub struct ContextEntry {
    /// where the variable was declared
    pub origin: Option<SourceLoc>,
    pub decl: Decl,
}

/// Chain of scopes, each mapping variables to declarations.
///
/// Extending a context takes a snapshot of it;
/// declarations added to a context later are not visible in its extensions.
///
/// ~~~
/// # use pruvo::{Context, IndexedVar};
/// let x = IndexedVar::new("x");
/// let mut ctx = Context::new();
/// let child = ctx.extend();
/// ctx.add_type_var(x.clone(), None)?;
/// assert!(ctx.lookup_type_var(&x).is_some());
/// assert!(child.lookup_type_var(&x).is_none());
/// # Ok::<_, pruvo::Error>(())
/// ~~~
#[derive(Clone, Debug, Default)]
pub struct Context {
    parent: Option<Rc<Context>>,
    decls: FnvHashMap<IndexedVar, ContextEntry>,
    assumptions: Vec<legal::Expr>,
    is_mutable: IsMutable,
}

impl Context {
    /// Create an empty, immutable context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new scope on top of a snapshot of this context.
    pub fn extend(&self) -> Self {
        self.extend_with(self.is_mutable)
    }

    /// Create a new scope that belongs to a function of the given mutability.
    pub fn extend_with(&self, is_mutable: IsMutable) -> Self {
        Self {
            parent: Some(Rc::new(self.clone())),
            decls: Default::default(),
            assumptions: Vec::new(),
            is_mutable,
        }
    }

    fn scopes(&self) -> impl Iterator<Item = &Context> {
        core::iter::successors(Some(self), |ctx| ctx.parent.as_deref())
    }

    fn insert(&mut self, var: IndexedVar, entry: ContextEntry) -> Result<()> {
        if let Some(prev) = self.decls.get(&var) {
            let reason = Error::new(format!("previous declaration of {}", var));
            let reason = reason.at(prev.origin.clone());
            let err = Error::new(format!("conflicting declaration of {}", var));
            return Err(err.at(entry.origin).because(reason));
        }
        trace!("declare {}", var);
        self.decls.insert(var, entry);
        Ok(())
    }

    /// Declare a type variable in the current scope.
    pub fn add_type_var(&mut self, var: IndexedVar, origin: Option<SourceLoc>) -> Result<()> {
        let decl = Decl::TypeVar;
        self.insert(var, ContextEntry { origin, decl })
    }

    /// Declare a term variable of the given type in the current scope.
    pub fn add_term_var(
        &mut self,
        var: IndexedVar,
        qty: Qty,
        ty: legal::Expr,
        origin: Option<SourceLoc>,
    ) -> Result<()> {
        let decl = Decl::TermVar { qty, ty };
        self.insert(var, ContextEntry { origin, decl })
    }

    /// Return the nearest declaration of a variable, regardless of its kind.
    pub fn lookup(&self, var: &IndexedVar) -> Option<&ContextEntry> {
        self.scopes().find_map(|ctx| ctx.decls.get(var))
    }

    /// Return the nearest declaration of a variable as type variable.
    pub fn lookup_type_var(&self, var: &IndexedVar) -> Option<&ContextEntry> {
        let mut scopes = self.scopes().filter_map(|ctx| ctx.decls.get(var));
        scopes.find(|entry| matches!(entry.decl, Decl::TypeVar))
    }

    /// Return the quantity and type of the nearest declaration of a variable as term variable.
    pub fn lookup_term_var(&self, var: &IndexedVar) -> Option<(Qty, &legal::Expr)> {
        let mut scopes = self.scopes().filter_map(|ctx| ctx.decls.get(var));
        scopes.find_map(|entry| match &entry.decl {
            Decl::TermVar { qty, ty } => Some((*qty, ty)),
            Decl::TypeVar => None,
        })
    }

    /// Record a boolean fact that holds in the current scope.
    pub fn add_assumption(&mut self, cond: legal::Expr) {
        trace!("assume {}", cond);
        self.assumptions.push(cond)
    }

    /// Return all facts that hold in this context, innermost first.
    pub fn assumptions(&self) -> impl Iterator<Item = &legal::Expr> {
        self.scopes().flat_map(|ctx| ctx.assumptions.iter().rev())
    }

    /// Return whether the context belongs to a mutable function.
    pub fn is_mutable(&self) -> IsMutable {
        self.is_mutable
    }
}

impl Display for Decl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::TypeVar => write!(f, "typename"),
            Self::TermVar { qty, ty } => write!(f, "{}{}", qty, ty),
        }
    }
}

impl Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let scopes: Vec<_> = self.scopes().collect();
        write!(f, "[")?;
        for ctx in scopes.iter().rev() {
            let mut decls: Vec<_> = ctx.decls.iter().collect();
            decls.sort_by(|(v1, _), (v2, _)| v1.cmp(v2));
            for (var, entry) in decls {
                write!(f, "{}: {}, ", var, entry.decl)?;
            }
            for cond in &ctx.assumptions {
                write!(f, "{}, ", cond)?;
            }
        }
        write!(f, "]")
    }
}
