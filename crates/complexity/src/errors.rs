use std::fmt;

use thiserror::Error;

use crate::aggregate::Role;
use crate::expr::CostExpr;
use crate::value::{Kind, Operation};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("{operation} is not defined for {left} and {right}")]
    IncompatibleKinds {
        operation: Operation,
        left: Kind,
        right: Kind,
    },
    #[error("repetition counts differ: {left} vs {right}")]
    CountMismatch { left: CostExpr, right: CostExpr },
    #[error("scope {0} was already entered")]
    ScopeReused(String),
    #[error("{operation} requires a party in scope")]
    MissingParty { operation: &'static str },
    #[error("{operation} requires a phase in scope")]
    MissingPhase { operation: &'static str },
    #[error("cost coefficients overflow in {operation}")]
    CoefficientOverflow { operation: &'static str },
    #[error("{operation} expects party {}, but {} is in scope", DisplayRole(.expected), DisplayRole(.found))]
    UnexpectedParty {
        operation: &'static str,
        expected: Option<Role>,
        found: Option<Role>,
    },
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("neither communication nor computation was requested")]
    NothingToRender,
    #[error("collapse mode {0} is not supported for computation tables")]
    UnsupportedCollapse(&'static str),
    #[error("Unable to format table")]
    Format(#[from] fmt::Error),
}

struct DisplayRole<'a>(&'a Option<Role>);

impl fmt::Display for DisplayRole<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(role) => write!(f, "{role}"),
            None => f.write_str("none"),
        }
    }
}
