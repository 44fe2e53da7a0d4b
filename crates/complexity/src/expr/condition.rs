use std::fmt;
use std::ops::Not;

use num_traits::Zero;

use super::{CostExpr, Symbol};

/// A predicate over non-negative size parameters.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Condition {
    /// `expr > 0`
    Positive(CostExpr),
    /// `expr <= 0`
    NonPositive(CostExpr),
}

impl Condition {
    pub fn positive(expr: impl Into<CostExpr>) -> Self {
        Self::Positive(expr.into())
    }

    pub fn non_positive(expr: impl Into<CostExpr>) -> Self {
        Self::NonPositive(expr.into())
    }

    pub fn negated(&self) -> Self {
        match self {
            Self::Positive(expr) => Self::NonPositive(expr.clone()),
            Self::NonPositive(expr) => Self::Positive(expr.clone()),
        }
    }

    pub fn expr(&self) -> &CostExpr {
        match self {
            Self::Positive(expr) | Self::NonPositive(expr) => expr,
        }
    }

    /// Decides the condition if possible.
    ///
    /// All atoms are non-negative, so an expression with only non-negative coefficients is
    /// positive as soon as one of its terms is a positive constant or a product of symbols which
    /// are assumed positive. An expression with only non-positive coefficients is never positive.
    pub fn evaluate(&self) -> Option<bool> {
        let positive = is_positive(self.expr());
        match self {
            Self::Positive(_) => positive,
            Self::NonPositive(_) => positive.map(bool::not),
        }
    }

    pub fn substitute_with(&self, replacement: &impl Fn(&Symbol) -> Option<CostExpr>) -> Self {
        match self {
            Self::Positive(expr) => Self::Positive(expr.substitute_with(replacement)),
            Self::NonPositive(expr) => Self::NonPositive(expr.substitute_with(replacement)),
        }
    }
}

fn is_positive(expr: &CostExpr) -> Option<bool> {
    if expr.is_zero() {
        return Some(false);
    }
    if let Some(value) = expr.as_constant() {
        return Some(value > 0);
    }
    if expr.terms().all(|(_, coeff)| coeff >= 0) {
        let has_positive_term = expr.terms().any(|(monomial, coeff)| {
            coeff > 0 && monomial.atoms().all(|(atom, _)| atom.is_positive())
        });
        return has_positive_term.then_some(true);
    }
    if expr.terms().all(|(_, coeff)| coeff <= 0) {
        return Some(false);
    }
    None
}

impl From<bool> for Condition {
    fn from(value: bool) -> Self {
        Self::Positive(CostExpr::constant(value.into()))
    }
}

impl Not for Condition {
    type Output = Condition;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl Not for &Condition {
    type Output = Condition;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive(expr) => write!(f, "{expr} > 0"),
            Self::NonPositive(expr) => write!(f, "{expr} <= 0"),
        }
    }
}

/// Selects `if_true` when `condition` holds and `if_false` otherwise.
///
/// Undecided conditions yield `if_false + (if_true - if_false) * [condition]`.
pub fn conditional(
    condition: &Condition,
    if_true: impl Into<CostExpr>,
    if_false: impl Into<CostExpr>,
) -> CostExpr {
    let (if_true, if_false) = (if_true.into(), if_false.into());
    match condition.evaluate() {
        Some(true) => if_true,
        Some(false) => if_false,
        None => {
            let indicator = CostExpr::indicator(condition.clone());
            &if_false + (&if_true - &if_false) * indicator
        }
    }
}

#[cfg(test)]
mod tests {
    use num_traits::One;

    use super::*;

    #[test]
    fn positive_symbols_decide() {
        let m = Symbol::positive("M");
        let n = Symbol::new("n");
        assert_eq!(Condition::positive(&m).evaluate(), Some(true));
        assert_eq!(Condition::positive(CostExpr::symbol(&m) * &n).evaluate(), None);
        assert_eq!(Condition::positive(CostExpr::symbol(&n) + 1).evaluate(), Some(true));
        assert_eq!(Condition::positive(&n).evaluate(), None);
        assert_eq!(Condition::non_positive(&m).evaluate(), Some(false));
        assert_eq!(Condition::positive(CostExpr::zero()).evaluate(), Some(false));
        assert_eq!(Condition::positive(-CostExpr::symbol(&n)).evaluate(), Some(false));
    }

    #[test]
    fn decided_conditional_selects_branch() {
        let m = Symbol::positive("M");
        let x = Symbol::new("x");
        assert_eq!(conditional(&Condition::positive(&m), &x, 0), CostExpr::symbol(&x));
        assert!(conditional(&Condition::non_positive(&m), &x, 0).is_zero());
    }

    #[test]
    fn complementary_branches_fold() {
        let n = Symbol::new("n");
        let x = CostExpr::symbol(&Symbol::new("x"));
        let condition = Condition::positive(&n);
        let taken = conditional(&condition, x.clone(), 0);
        let not_taken = conditional(&!&condition, x.clone(), 0);
        assert_eq!(taken.len(), 1);
        assert_eq!(taken + not_taken, x);
    }

    #[test]
    fn complementary_indicators_vanish() {
        let condition = Condition::positive(Symbol::new("n"));
        let product = CostExpr::indicator(condition.clone()) * CostExpr::indicator(!condition);
        assert!(product.is_zero());
    }

    #[test]
    fn indicators_are_idempotent() {
        let indicator = CostExpr::indicator(Condition::positive(Symbol::new("n")));
        assert_eq!(indicator.pow(3), indicator);
        assert!(!indicator.is_one());
    }

    #[test]
    fn substitution_decides() {
        let n = Symbol::new("n");
        let indicator = CostExpr::indicator(Condition::positive(&n));
        assert!(indicator.substitute(&n, &CostExpr::zero()).is_zero());
        assert!(indicator.substitute(&n, &CostExpr::constant(2)).is_one());
    }
}
