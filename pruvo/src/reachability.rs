//! Detection and removal of statements that are never executed.

use crate::ast::{Body, Properties, Stmt, StmtValue};

/// Return true if control never continues past the statement.
pub fn is_terminator<P: Properties>(stmt: &Stmt<P>) -> bool {
    match &stmt.value {
        StmtValue::Return(_) | StmtValue::Impossible(_) => true,
        StmtValue::IfElse(ite) => match &ite.false_branch {
            Some(fb) => returns_from_all_branches(&ite.true_branch) && returns_from_all_branches(fb),
            None => false,
        },
        StmtValue::Expr(_) => false,
    }
}

/// Return true if control never continues past the statement,
/// taking into account which branch a literal condition selects.
pub fn always_terminates<P: Properties>(stmt: &Stmt<P>) -> bool {
    match &stmt.value {
        StmtValue::IfElse(ite) if ite.cond.is_bool_lit(true) => {
            returns_from_all_branches(&ite.true_branch)
        }
        StmtValue::IfElse(ite) if ite.cond.is_bool_lit(false) => {
            ite.false_branch.as_ref().map_or(false, returns_from_all_branches)
        }
        _ => is_terminator(stmt),
    }
}

/// Return true if every execution path through the body ends in a terminator.
pub fn returns_from_all_branches<P: Properties>(body: &Body<P>) -> bool {
    body.stmts.iter().any(is_terminator)
}

/// Return true if every execution path through the statements reaches `impossible`.
pub fn is_impossible_stmts<P: Properties>(stmts: &[Stmt<P>]) -> bool {
    for stmt in stmts {
        match &stmt.value {
            StmtValue::Impossible(_) => return true,
            StmtValue::Return(_) => return false,
            StmtValue::IfElse(ite) => {
                if let Some(fb) = &ite.false_branch {
                    if is_impossible(&ite.true_branch) && is_impossible(fb) {
                        return true;
                    }
                }
                if is_terminator(stmt) {
                    return false;
                }
            }
            StmtValue::Expr(_) => (),
        }
    }
    false
}

/// Return true if every execution path through the body reaches `impossible`.
pub fn is_impossible<P: Properties>(body: &Body<P>) -> bool {
    is_impossible_stmts(&body.stmts)
}

/// Remove statements following a terminator and
/// branches of `if` statements with a literal condition that are never taken.
///
/// Return true if anything was removed.
/// Applying this function a second time never removes anything.
pub fn delete_unreachable_stmts<P: Properties>(body: &mut Body<P>) -> bool {
    let mut changed = false;
    for stmt in body.stmts.iter_mut() {
        if let StmtValue::IfElse(ite) = &mut stmt.value {
            if ite.cond.is_bool_lit(true) && ite.false_branch.is_some() {
                trace!("delete else branch of if (true)");
                ite.false_branch = None;
                changed = true;
            }
            if ite.cond.is_bool_lit(false) && !ite.true_branch.stmts.is_empty() {
                trace!("delete then branch of if (false)");
                ite.true_branch.stmts.clear();
                changed = true;
            }
            changed |= delete_unreachable_stmts(&mut ite.true_branch);
            if let Some(fb) = &mut ite.false_branch {
                changed |= delete_unreachable_stmts(fb);
            }
        }
    }
    if let Some(pos) = body.stmts.iter().position(is_terminator) {
        if pos + 1 < body.stmts.len() {
            trace!("delete {} statements after terminator", body.stmts.len() - pos - 1);
            body.stmts.truncate(pos + 1);
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprValue, IfElse};
    use crate::raw;
    use crate::SourceLoc;

    fn stmt(value: raw::StmtValue) -> raw::Stmt {
        raw::Stmt::new(SourceLoc::default(), value)
    }

    fn body(stmts: Vec<raw::Stmt>) -> raw::Body {
        raw::Body::new(SourceLoc::default(), stmts)
    }

    fn bool_lit(b: bool) -> raw::Expr {
        raw::Expr::new(SourceLoc::default(), ExprValue::BoolLit(b))
    }

    fn ret(b: bool) -> raw::Stmt {
        stmt(StmtValue::Return(Some(bool_lit(b))))
    }

    fn if_else(cond: bool, tb: Vec<raw::Stmt>, fb: Option<Vec<raw::Stmt>>) -> raw::Stmt {
        stmt(StmtValue::IfElse(IfElse {
            cond: bool_lit(cond),
            true_branch: body(tb),
            false_branch: fb.map(body),
        }))
    }

    #[test]
    fn terminators() {
        assert!(is_terminator(&ret(true)));
        assert!(is_terminator(&stmt(StmtValue::Impossible(None))));
        assert!(!is_terminator(&if_else(true, vec![ret(true)], None)));
        let both = if_else(true, vec![ret(true)], Some(vec![ret(false)]));
        assert!(is_terminator(&both));
        let one = if_else(true, vec![ret(true)], Some(vec![]));
        assert!(!is_terminator(&one));
        assert!(always_terminates(&one));
        assert!(!always_terminates(&if_else(false, vec![ret(true)], None)));
    }

    #[test]
    fn truncate_after_return() {
        let mut b = body(vec![ret(true), ret(false), ret(true)]);
        assert!(delete_unreachable_stmts(&mut b));
        assert_eq!(b.to_string(), "return true;");
    }

    #[test]
    fn idempotent() {
        let cond = if_else(false, vec![ret(true)], Some(vec![ret(false), ret(true)]));
        let mut b = body(vec![cond, ret(false)]);
        assert!(delete_unreachable_stmts(&mut b));
        let once = b.to_string();
        assert_eq!(once, "if (false) {} else { return false; } return false;");
        assert!(!delete_unreachable_stmts(&mut b));
        assert_eq!(b.to_string(), once);
    }

    #[test]
    fn impossible_branches() {
        let imp = || stmt(StmtValue::Impossible(None));
        let both = if_else(true, vec![imp()], Some(vec![imp()]));
        assert!(is_impossible_stmts(&[both]));
        let one = if_else(true, vec![imp()], Some(vec![ret(true)]));
        assert!(!is_impossible_stmts(&[one]));
        let one_then_imp = if_else(true, vec![imp()], None);
        assert!(is_impossible_stmts(&[one_then_imp, imp()]));
    }
}
