//! Normalisation of legal trees.
//!
//! Normalisation interleaves beta-reduction, delta-unfolding of global definitions,
//! folding of primitive operations and dead-code elimination,
//! until none of them changes the tree any more.
//! It rewrites legal trees in place, only ever moving existing nodes around.

mod beta;
mod delta;

pub use delta::{bounds, wrap};

use crate::ast::{Entry, ExprValue, GlobalRef, StmtValue};
use crate::env::Env;
use crate::legal;
use crate::reachability::{always_terminates, delete_unreachable_stmts};

/// State of normalisation.
pub struct Normalizer<'e> {
    env: &'e Env,
    /// global definitions currently being unfolded
    stack: Vec<GlobalRef>,
    /// number of remaining attempts to unfold a global definition
    fuel: usize,
}

impl<'e> Normalizer<'e> {
    pub fn new(env: &'e Env) -> Self {
        Self {
            env,
            stack: Vec::new(),
            fuel: env.unfold_fuel,
        }
    }

    /// Normalise an expression, returning true if it changed.
    pub fn expr(&mut self, expr: &mut legal::Expr) -> bool {
        let mut changed = false;
        while self.expr_once(expr) {
            changed = true;
        }
        changed
    }

    fn expr_once(&mut self, expr: &mut legal::Expr) -> bool {
        let children = self.children(expr);
        let beta = beta::reduce(expr);
        let fold = delta::fold(self.env, expr);
        let unfold = self.unfold(expr);
        children || beta || fold || unfold
    }

    fn children(&mut self, expr: &mut legal::Expr) -> bool {
        use ExprValue::*;
        match &mut expr.value {
            Typename | Auto | BoolT | UnitT | CstrT | ScopeT | IntegerT(..) => false,
            BoolLit(_) | Numeric(_) | Str(_) | Var(_) | Global(_) => false,
            TrueT(x) | AddressOf(x) | Deref(x) | ScopeOf(x) | Not(x) | Member(x, _) => self.expr(x),
            ArrayT(x, y) | RefT(x, y) | Subscript(x, y) | Because(x, y) => {
                self.expr(x) | self.expr(y)
            }
            Bool(_, x, y) | Rel(_, x, y) | Arith(_, x, y) => self.expr(x) | self.expr(y),
            App(func, args) => {
                let func = self.expr(func);
                args.iter_mut().fold(func, |acc, arg| self.expr(arg) | acc)
            }
            InitList(xs) => xs.iter_mut().fold(false, |acc, x| self.expr(x) | acc),
            Abs(abs) => {
                let args = self.args(&mut abs.args);
                args | self.expr(&mut abs.ret_type) | self.body(&mut abs.body)
            }
            Pi(pi) => self.args(&mut pi.args) | self.expr(&mut pi.ret_type),
            Sigma(args) => self.args(args),
        }
    }

    fn args(&mut self, args: &mut [legal::FuncArg]) -> bool {
        args.iter_mut().fold(false, |acc, arg| self.expr(&mut arg.ty) | acc)
    }

    /// Normalise a function body, returning true if it changed.
    pub fn body(&mut self, body: &mut legal::Body) -> bool {
        let mut changed = false;
        loop {
            let dead = delete_unreachable_stmts(body);
            let mut stmts = false;
            for stmt in body.stmts.iter_mut() {
                stmts |= self.stmt(stmt);
                // the remaining statements are removed in the next round
                if always_terminates(stmt) {
                    break;
                }
            }
            let pruned = beta::prune_body(body);
            if !(dead || stmts || pruned) {
                return changed;
            }
            changed = true;
        }
    }

    fn stmt(&mut self, stmt: &mut legal::Stmt) -> bool {
        match &mut stmt.value {
            StmtValue::Expr(e) => self.expr(e),
            StmtValue::IfElse(ite) => {
                let cond = self.expr(&mut ite.cond);
                let tb = self.body(&mut ite.true_branch);
                let fb = match &mut ite.false_branch {
                    Some(fb) => self.body(fb),
                    None => false,
                };
                cond || tb || fb
            }
            StmtValue::Return(e) | StmtValue::Impossible(e) => match e {
                Some(e) => self.expr(e),
                None => false,
            },
        }
    }
}

/// Normalise an expression.
pub fn normalize_expr(env: &Env, expr: &mut legal::Expr) {
    Normalizer::new(env).expr(expr);
}

/// Normalise a function body.
pub fn normalize_body(env: &Env, body: &mut legal::Body) {
    Normalizer::new(env).body(body);
}

/// Normalise the body of a function definition.
///
/// Recursive calls of the function to itself are only unfolded
/// when all their arguments are values.
pub fn normalize_func_def(env: &Env, def: &mut legal::FuncDef) {
    debug!("normalise {}", def.name);
    let mut normalizer = Normalizer::new(env);
    normalizer.stack.push(GlobalRef::new(def.name.clone()));
    normalizer.body(&mut def.value.body);
}

/// Normalise all function definitions of a module.
pub fn normalize_module(env: &Env, module: &mut legal::Module) {
    for entry in module.entries.iter_mut() {
        if let Entry::FuncDef(def) = entry {
            normalize_func_def(env, def)
        }
    }
}
