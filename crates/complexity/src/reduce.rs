//! Asymptotic simplification of cost expressions.
//!
//! Protocol costs are large polynomials over size parameters and unit costs. For comparing
//! protocols only the dominant growth matters, so [`reduce`] can drop everything but the leading
//! power of one parameter, or forget all unit costs and keep the Pareto-maximal monomials over
//! the size parameters.
use std::fmt;

use itertools::Itertools;
use num_traits::{One, Zero};
use smallvec::SmallVec;

use crate::expr::{Atom, CostExpr, Monomial, Symbol};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ReduceMode {
    /// The simplified expression itself.
    #[default]
    Exact,
    /// Only the highest power of the given parameter.
    Leading(Symbol),
    /// Every non-parameter symbol is set to one, then dominated monomials are removed.
    DropUnitCosts,
}

impl fmt::Display for ReduceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReduceMode::Exact => f.write_str("exact"),
            ReduceMode::Leading(symbol) => write!(f, "leading({symbol})"),
            ReduceMode::DropUnitCosts => f.write_str("drop-unit-costs"),
        }
    }
}

pub fn reduce(expr: &CostExpr, params: &[Symbol], mode: &ReduceMode) -> CostExpr {
    match mode {
        ReduceMode::Exact => expr.clone(),
        ReduceMode::Leading(symbol) => leading_term(expr, symbol),
        ReduceMode::DropUnitCosts => {
            let stripped = expr.substitute_with(&|symbol: &Symbol| {
                (!params.contains(symbol)).then(CostExpr::one)
            });
            dominant_terms(&stripped, params)
        }
    }
}

/// `var^k` for the highest exponent `k` of `var` in `expr`.
///
/// All other atoms are treated as coefficients. The zero expression yields `0`, a nonzero
/// expression without `var` yields `1`.
pub fn leading_term(expr: &CostExpr, var: &Symbol) -> CostExpr {
    if expr.is_zero() {
        return CostExpr::zero();
    }
    let atom = Atom::Symbol(var.clone());
    let exponent = expr
        .terms()
        .map(|(monomial, _)| monomial.exponent(&atom))
        .max()
        .unwrap_or(0);
    CostExpr::symbol(var).pow(exponent)
}

/// For every parameter, its exponent and the exponent of its logarithm.
type Exponents = SmallVec<[(u32, u32); 9]>;

fn exponents(monomial: &Monomial, params: &[Symbol]) -> Exponents {
    params
        .iter()
        .map(|param| {
            (
                monomial.exponent(&Atom::Symbol(param.clone())),
                monomial.exponent(&Atom::Log(CostExpr::symbol(param))),
            )
        })
        .collect()
}

/// `other` dominates `exps` if it grows at least as fast in every parameter.
fn dominates(other: &Exponents, exps: &Exponents) -> bool {
    other.iter().zip(exps).all(|(y, x)| y >= x)
}

/// The sum of all Pareto-maximal monomials over `params` with coefficient one.
///
/// Atoms which are neither parameters nor their logarithms are treated as coefficients.
pub fn dominant_terms(expr: &CostExpr, params: &[Symbol]) -> CostExpr {
    let all: Vec<Exponents> = expr
        .terms()
        .map(|(monomial, _)| exponents(monomial, params))
        .sorted()
        .dedup()
        .collect();
    all.iter()
        .enumerate()
        .filter(|(idx, exps)| !all[idx + 1..].iter().any(|other| dominates(other, exps)))
        .map(|(_, exps)| monomial(exps, params))
        .sum()
}

fn monomial(exps: &Exponents, params: &[Symbol]) -> CostExpr {
    params
        .iter()
        .zip(exps)
        .map(|(param, &(exp, log_exp))| {
            CostExpr::symbol(param).pow(exp) * CostExpr::log(param).pow(log_exp)
        })
        .product()
}
