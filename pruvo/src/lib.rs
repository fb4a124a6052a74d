#![forbid(unsafe_code)]

//! Type checking and normalisation for a dependently-typed systems language.
//!
//! # Usage
//!
//! The input of this library is a *raw* syntax tree, as produced by a parser,
//! where every node is annotated with its source location.
//! Type checking a raw tree yields a *legal* tree,
//! where every node carries a proof that it has been type checked and
//! every expression carries its type.
//! Legal trees can then be normalised, meaning that
//! applications of functions are reduced, global definitions are inlined,
//! primitive operations on literals are evaluated, and
//! dead code is removed.
//!
//! The following example type checks and normalises
//! a function that returns `2 + 2`.
//!
//! ~~~
//! # use pruvo::ast::{Entry, IsMutable, Sign, Width, ArithOp};
//! # use pruvo::raw::{Abs, Body, Expr, ExprValue, FuncDef, Module, Stmt, StmtValue};
//! # use pruvo::{normalize, typecheck, Env, SourceLoc};
//! let loc = SourceLoc::default;
//! let num = |n: u32| Expr::new(loc(), ExprValue::Numeric(n.into()));
//! let sum = ExprValue::Arith(ArithOp::Plus, Box::new(num(2)), Box::new(num(2)));
//! let body = Body::new(loc(), vec![Stmt::new(loc(), StmtValue::Return(Some(Expr::new(loc(), sum))))]);
//! let i32_t = Expr::new(loc(), ExprValue::IntegerT(Sign::Signed, Width::W32));
//! let main = Abs { is_mutable: IsMutable::No, args: vec![], ret_type: Box::new(i32_t), body };
//! let main = FuncDef { properties: loc(), name: "main".into(), value: main };
//! let module = Module { properties: loc(), entries: vec![Entry::FuncDef(main)] };
//!
//! let mut env = Env::new();
//! let mut module = typecheck::check_module(&mut env, &module)?;
//! normalize::normalize_module(&env, &mut module);
//! match &module.entries[0] {
//!     Entry::FuncDef(main) => assert_eq!(main.value.body.to_string(), "return 4;"),
//!     _ => unreachable!(),
//! }
//! # Ok::<_, pruvo::TypeError>(())
//! ~~~
//!
//! # Organisation
//!
//! Syntax trees are defined generically in the [`ast`] module,
//! and instantiated with source locations in [`raw`] and with types in [`legal`].
//! Type checking is performed by the [`typecheck`] module, using
//! a [`Context`] for local variables and an [`Env`] for global definitions.
//! Normalisation is performed by the [`normalize`] module.
//! Both rely on the capture-avoiding substitution in [`subst`] and
//! on the renaming of bound variables in [`alpha`].

#[macro_use]
extern crate log;

pub mod alpha;
pub mod ast;
pub mod context;
pub mod env;
pub mod error;
pub mod legal;
pub mod mutability;
pub mod normalize;
pub mod raw;
pub mod reachability;
pub mod source;
pub mod subst;
pub mod typecheck;

pub use ast::{GlobalRef, IndexedVar};
pub use context::Context;
pub use env::Env;
pub use error::{Error, TypeError};
pub use source::SourceLoc;
