//! Diagnostics.

use crate::context::Context;
use crate::legal;
use crate::source::SourceLoc;
use core::fmt::{self, Display};

pub type Result<T> = core::result::Result<T, Error>;

/// Error message with an optional source location and a list of causes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    pub error: String,
    pub location: Option<SourceLoc>,
    pub reasons: Vec<Error>,
}

impl Error {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            location: None,
            reasons: Vec::new(),
        }
    }

    /// Attach a location to the error.
    pub fn at(self, location: impl Into<Option<SourceLoc>>) -> Self {
        let location = location.into();
        Self { location, ..self }
    }

    /// Append a reason to the error.
    pub fn because(mut self, reason: Error) -> Self {
        self.reasons.push(reason);
        self
    }

    fn fmt_level(&self, f: &mut fmt::Formatter, level: usize) -> fmt::Result {
        let indent = "    ".repeat(level);
        write!(f, "{}", self.error)?;
        let mut quoted = false;
        if let Some(loc) = &self.location {
            write!(f, " at {}", loc)?;
            if loc.is_multiline() {
                for line in loc.txt.lines() {
                    write!(f, "\n{}> {}", indent, line)?;
                }
                quoted = true;
            }
        }
        match self.reasons.as_slice() {
            [] => Ok(()),
            [reason] => {
                if quoted {
                    write!(f, "\n{}because ", indent)?;
                } else {
                    write!(f, " because ")?;
                }
                reason.fmt_level(f, level)
            }
            reasons => {
                write!(f, "\n{}Because:", indent)?;
                for (i, reason) in reasons.iter().enumerate() {
                    write!(f, "\n{}{}. ", indent, i + 1)?;
                    reason.fmt_level(f, level + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_level(f, 0)
    }
}

impl std::error::Error for Error {}

/// Type checking error.
///
/// Besides the error itself, this stores
/// the context in which the error occurred and,
/// if the error occurred while checking against a type, that type.
#[derive(Clone, Debug)]
pub struct TypeError {
    pub error: Error,
    pub ctx: Context,
    pub expected: Option<legal::Expr>,
}

impl TypeError {
    pub fn new(error: Error, ctx: &Context) -> Self {
        let ctx = ctx.clone();
        Self {
            error,
            ctx,
            expected: None,
        }
    }

    pub fn expected(self, ty: &legal::Expr) -> Self {
        let expected = Some(ty.clone());
        Self { expected, ..self }
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.error)?;
        write!(f, "{}", self.ctx)?;
        match &self.expected {
            Some(ty) => write!(f, " ⊢ {}", ty),
            None => Ok(()),
        }
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        err.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_reason_inline() {
        let prev = Error::new("previous declaration of x").at(SourceLoc::new(1, 5, "x"));
        let err = Error::new("conflicting declaration of x")
            .at(SourceLoc::new(3, 9, "x"))
            .because(prev);
        assert_eq!(
            err.to_string(),
            "conflicting declaration of x at 3:9 because previous declaration of x at 1:5"
        );
    }

    #[test]
    fn quoted_location() {
        let err = Error::new("missing return statement")
            .at(SourceLoc::new(2, 1, "f() {\n}"))
            .because(Error::new("not all branches return"));
        let expected = "missing return statement at 2:1\n> f() {\n> }\nbecause not all branches return";
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn numbered_reasons() {
        let inner = Error::new("c").because(Error::new("d")).because(Error::new("e"));
        let err = Error::new("a").because(Error::new("b")).because(inner);
        let expected = "a\nBecause:\n1. b\n2. c\n    Because:\n    1. d\n    2. e";
        assert_eq!(err.to_string(), expected);
    }
}
