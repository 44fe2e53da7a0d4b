//! Symbolic cost polynomials.
//!
//! A [`CostExpr`] is a finite sum of monomials with integer coefficients. The atoms of a monomial
//! are [symbols](`Symbol`), logarithms of expressions and Iverson indicators of
//! [conditions](`Condition`) which could not be decided statically. Expressions are kept in a canonical form at all times:
//! atoms and monomials are ordered, zero coefficients are removed and complementary indicators
//! are folded. Structural equality is therefore expression equality for all expressions built
//! through this API.
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use num_traits::{CheckedAdd, CheckedMul, CheckedSub, One, Zero};
use serde::{Serialize, Serializer};

mod condition;
mod display;
mod ops;
mod symbol;

pub use condition::{conditional, Condition};
pub use symbol::Symbol;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Atom {
    Symbol(Symbol),
    /// Logarithm of a single atom, of a constant above one, or of a sum.
    Log(CostExpr),
    /// `1` if the condition holds, `0` otherwise.
    Indicator(Condition),
}

impl Atom {
    /// Atoms are non-negative, this returns whether the atom is known to be strictly positive.
    pub fn is_positive(&self) -> bool {
        match self {
            Atom::Symbol(symbol) => symbol.is_positive(),
            Atom::Log(_) | Atom::Indicator(_) => false,
        }
    }
}

/// Product of atoms raised to positive exponents. The empty monomial is `1`.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Monomial(BTreeMap<Atom, u32>);

impl Monomial {
    pub fn one() -> Self {
        Self::default()
    }

    pub fn atom(atom: Atom) -> Self {
        Self(BTreeMap::from([(atom, 1)]))
    }

    pub fn is_constant(&self) -> bool {
        self.0.is_empty()
    }

    pub fn exponent(&self, atom: &Atom) -> u32 {
        self.0.get(atom).copied().unwrap_or(0)
    }

    pub fn atoms(&self) -> impl Iterator<Item = (&Atom, u32)> + '_ {
        self.0.iter().map(|(atom, exp)| (atom, *exp))
    }

    pub fn indicators(&self) -> impl Iterator<Item = &Condition> + '_ {
        self.0.keys().filter_map(|atom| match atom {
            Atom::Indicator(condition) => Some(condition),
            _ => None,
        })
    }

    /// Sum of the exponents of all symbols and logarithms.
    pub fn degree(&self) -> u32 {
        self.0
            .iter()
            .filter(|(atom, _)| !matches!(atom, Atom::Indicator(_)))
            .map(|(_, exp)| exp)
            .sum()
    }

    /// Multiplies two monomials. Returns `None` if the product contains an indicator and its
    /// complement and is thus zero.
    pub fn checked_mul(&self, other: &Monomial) -> Option<Monomial> {
        let mut atoms = self.0.clone();
        for (atom, exp) in &other.0 {
            match atom {
                Atom::Indicator(condition) => {
                    if atoms.contains_key(&Atom::Indicator(condition.negated())) {
                        return None;
                    }
                    atoms.insert(atom.clone(), 1);
                }
                _ => *atoms.entry(atom.clone()).or_insert(0) += exp,
            }
        }
        Some(Self(atoms))
    }

    fn without(&self, atom: &Atom) -> Monomial {
        let mut atoms = self.0.clone();
        atoms.remove(atom);
        Self(atoms)
    }

    fn with(mut self, atom: Atom, exp: u32) -> Monomial {
        self.0.insert(atom, exp);
        self
    }
}

/// Coefficient type of cost expressions.
pub type Coefficient = i128;

/// A polynomial with integer coefficients over [`Atom`]s.
///
/// # Panics
/// The arithmetic operators panic when a coefficient overflows [`Coefficient`], like the integer
/// operators do in debug builds. [`CheckedAdd`], [`CheckedSub`] and [`CheckedMul`] report the
/// overflow instead.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CostExpr {
    terms: BTreeMap<Monomial, Coefficient>,
}

impl CostExpr {
    pub fn constant(value: Coefficient) -> Self {
        Self::from_terms([(Monomial::one(), value)])
    }

    pub fn symbol(symbol: &Symbol) -> Self {
        Self::from_terms([(Monomial::atom(Atom::Symbol(symbol.clone())), 1)])
    }

    pub fn log(symbol: &Symbol) -> Self {
        Self::from_terms([(Monomial::atom(Atom::Log(Self::symbol(symbol))), 1)])
    }

    /// Iverson bracket of `condition`. Decided conditions yield `0` or `1` directly.
    pub fn indicator(condition: Condition) -> Self {
        match condition.evaluate() {
            Some(true) => Self::one(),
            Some(false) => Self::zero(),
            None => Self::from_terms([(Monomial::atom(Atom::Indicator(condition)), 1)]),
        }
    }

    /// # Panics
    /// If the coefficients of equal monomials overflow when summed.
    pub fn from_terms(terms: impl IntoIterator<Item = (Monomial, Coefficient)>) -> Self {
        let mut expr = Self::default();
        for (monomial, coefficient) in terms {
            expr.add_term(monomial, coefficient).unwrap_or_else(|| panic!("{OVERFLOW}"));
        }
        expr.fold_complementary().unwrap_or_else(|| panic!("{OVERFLOW}"));
        expr
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, Coefficient)> + '_ {
        self.terms.iter().map(|(monomial, coeff)| (monomial, *coeff))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns the value of a constant expression.
    pub fn as_constant(&self) -> Option<Coefficient> {
        match self.terms.len() {
            0 => Some(0),
            1 => self
                .terms
                .iter()
                .next()
                .filter(|(monomial, _)| monomial.is_constant())
                .map(|(_, coeff)| *coeff),
            _ => None,
        }
    }

    /// Returns the symbol if the expression is exactly one symbol.
    pub fn as_symbol(&self) -> Option<&Symbol> {
        let (monomial, coeff) = self.terms().exactly_one().ok()?;
        if coeff != 1 {
            return None;
        }
        match monomial.atoms().exactly_one().ok()? {
            (Atom::Symbol(symbol), 1) => Some(symbol),
            _ => None,
        }
    }

    /// All symbols occurring in the expression, including those in logarithms and conditions.
    pub fn symbols(&self) -> BTreeSet<Symbol> {
        let mut symbols = BTreeSet::new();
        for monomial in self.terms.keys() {
            for (atom, _) in monomial.atoms() {
                match atom {
                    Atom::Symbol(symbol) => {
                        symbols.insert(symbol.clone());
                    }
                    Atom::Log(argument) => symbols.extend(argument.symbols()),
                    Atom::Indicator(condition) => symbols.extend(condition.expr().symbols()),
                }
            }
        }
        symbols
    }

    pub fn pow(&self, exp: u32) -> CostExpr {
        (0..exp).fold(CostExpr::one(), |acc, _| acc.mul_expr(self))
    }

    pub fn substitute(&self, symbol: &Symbol, value: &CostExpr) -> CostExpr {
        self.substitute_with(&|candidate: &Symbol| (candidate == symbol).then(|| value.clone()))
    }

    /// Replaces every symbol for which `replacement` returns a value. Conditions are re-evaluated
    /// after the substitution.
    pub fn substitute_with(&self, replacement: &impl Fn(&Symbol) -> Option<CostExpr>) -> CostExpr {
        let mut result = CostExpr::zero();
        for (monomial, coeff) in &self.terms {
            let mut term = CostExpr::constant(*coeff);
            for (atom, exp) in monomial.atoms() {
                let factor = match atom {
                    Atom::Symbol(symbol) => match replacement(symbol) {
                        Some(value) => value.pow(exp),
                        None => CostExpr::symbol(symbol).pow(exp),
                    },
                    Atom::Log(argument) => log_of(&argument.substitute_with(replacement)).pow(exp),
                    Atom::Indicator(condition) => {
                        CostExpr::indicator(condition.substitute_with(replacement))
                    }
                };
                term = term.mul_expr(&factor);
            }
            result = result.add_expr(&term);
        }
        result
    }

    pub(crate) fn add_expr(&self, other: &CostExpr) -> CostExpr {
        self.try_add(other).unwrap_or_else(|| panic!("{OVERFLOW}"))
    }

    pub(crate) fn sub_expr(&self, other: &CostExpr) -> CostExpr {
        self.try_sub(other).unwrap_or_else(|| panic!("{OVERFLOW}"))
    }

    pub(crate) fn mul_expr(&self, other: &CostExpr) -> CostExpr {
        self.try_mul(other).unwrap_or_else(|| panic!("{OVERFLOW}"))
    }

    fn try_add(&self, other: &CostExpr) -> Option<CostExpr> {
        let mut result = self.clone();
        for (monomial, coeff) in &other.terms {
            result.add_term(monomial.clone(), *coeff)?;
        }
        result.fold_complementary()?;
        Some(result)
    }

    fn try_sub(&self, other: &CostExpr) -> Option<CostExpr> {
        let mut result = self.clone();
        for (monomial, coeff) in &other.terms {
            result.add_term(monomial.clone(), coeff.checked_neg()?)?;
        }
        result.fold_complementary()?;
        Some(result)
    }

    fn try_mul(&self, other: &CostExpr) -> Option<CostExpr> {
        let mut result = CostExpr::default();
        for (lhs, lhs_coeff) in &self.terms {
            for (rhs, rhs_coeff) in &other.terms {
                if let Some(monomial) = lhs.checked_mul(rhs) {
                    result.add_term(monomial, lhs_coeff.checked_mul(rhs_coeff)?)?;
                }
            }
        }
        result.fold_complementary()?;
        Some(result)
    }

    /// Returns `None` on overflow.
    #[must_use]
    fn add_term(&mut self, monomial: Monomial, coeff: Coefficient) -> Option<()> {
        if coeff == 0 {
            return Some(());
        }
        match self.terms.entry(monomial) {
            Entry::Occupied(mut entry) => {
                let sum = entry.get().checked_add(&coeff)?;
                if sum == 0 {
                    entry.remove();
                } else {
                    *entry.get_mut() = sum;
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(coeff);
            }
        }
        Some(())
    }

    /// Rewrites `k*m*[c] + k*m*[!c]` to `k*m`. Returns `None` on overflow.
    #[must_use]
    fn fold_complementary(&mut self) -> Option<()> {
        loop {
            let pair = self.terms.iter().find_map(|(monomial, coeff)| {
                monomial.indicators().find_map(|condition| {
                    let base = monomial.without(&Atom::Indicator(condition.clone()));
                    let partner = base.clone().with(Atom::Indicator(condition.negated()), 1);
                    (self.terms.get(&partner) == Some(coeff))
                        .then(|| (monomial.clone(), partner, base, *coeff))
                })
            });
            let Some((monomial, partner, base, coeff)) = pair else {
                return Some(());
            };
            self.terms.remove(&monomial);
            self.terms.remove(&partner);
            self.add_term(base, coeff)?;
        }
    }
}

const OVERFLOW: &str = "cost coefficient overflow";

/// `log(value)`, with `log 0 = log 1 = 0`.
///
/// The logarithm of a product `c * a^k * ...` with a positive coefficient is expanded to
/// `log(c) + k * log(a) + ...`, other arguments are kept whole.
pub fn log_of(value: &CostExpr) -> CostExpr {
    if value.is_zero() || value.is_one() {
        return CostExpr::zero();
    }
    let product = value
        .terms()
        .exactly_one()
        .ok()
        .filter(|(monomial, coeff)| {
            *coeff > 0 && !monomial.is_constant() && monomial.indicators().next().is_none()
        });
    let Some((monomial, coeff)) = product else {
        return opaque_log(value);
    };
    let factors: CostExpr = monomial
        .atoms()
        .map(|(atom, exp)| {
            let factor = CostExpr::from_terms([(Monomial::atom(atom.clone()), 1)]);
            opaque_log(&factor) * CostExpr::from(exp)
        })
        .sum();
    factors + log_of(&CostExpr::constant(coeff))
}

fn opaque_log(argument: &CostExpr) -> CostExpr {
    CostExpr::from_terms([(Monomial::atom(Atom::Log(argument.clone())), 1)])
}

impl CheckedAdd for CostExpr {
    fn checked_add(&self, other: &Self) -> Option<Self> {
        self.try_add(other)
    }
}

impl CheckedSub for CostExpr {
    fn checked_sub(&self, other: &Self) -> Option<Self> {
        self.try_sub(other)
    }
}

impl CheckedMul for CostExpr {
    fn checked_mul(&self, other: &Self) -> Option<Self> {
        self.try_mul(other)
    }
}

impl Zero for CostExpr {
    fn zero() -> Self {
        Self::default()
    }

    fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }
}

impl One for CostExpr {
    fn one() -> Self {
        Self::constant(1)
    }

    fn is_one(&self) -> bool {
        self.as_constant() == Some(1)
    }
}

impl Serialize for CostExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
