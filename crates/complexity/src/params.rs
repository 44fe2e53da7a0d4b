//! Protocol size parameters.
use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::expr::{Condition, CostExpr, Symbol};

pub static COMPUTE_PARTY_COUNT: Lazy<Symbol> = Lazy::new(|| Symbol::new("n"));
pub static INPUT_PARTY_COUNT: Lazy<Symbol> = Lazy::new(|| Symbol::new("nI"));
pub static OUTPUT_PARTY_COUNT: Lazy<Symbol> = Lazy::new(|| Symbol::new("nO"));
pub static INPUT_COUNT: Lazy<Symbol> = Lazy::new(|| Symbol::new("I"));
pub static ADDITION_COUNT: Lazy<Symbol> = Lazy::new(|| Symbol::new("A"));
pub static SCALAR_MULTIPLICATION_COUNT: Lazy<Symbol> = Lazy::new(|| Symbol::new("S"));
pub static MULTIPLICATION_COUNT: Lazy<Symbol> = Lazy::new(|| Symbol::positive("M"));
pub static PUBLIC_OUTPUT_COUNT: Lazy<Symbol> = Lazy::new(|| Symbol::positive("publicO"));
pub static PRIVATE_OUTPUT_COUNT: Lazy<Symbol> = Lazy::new(|| Symbol::positive("privateO"));

/// All size parameter symbols in their canonical order.
pub fn size_symbols() -> Vec<Symbol> {
    [
        &COMPUTE_PARTY_COUNT,
        &INPUT_PARTY_COUNT,
        &OUTPUT_PARTY_COUNT,
        &INPUT_COUNT,
        &ADDITION_COUNT,
        &SCALAR_MULTIPLICATION_COUNT,
        &MULTIPLICATION_COUNT,
        &PUBLIC_OUTPUT_COUNT,
        &PRIVATE_OUTPUT_COUNT,
    ]
    .into_iter()
    .map(|symbol| Symbol::clone(symbol))
    .collect()
}

/// Size of the computation a protocol instance is built for.
///
/// Every parameter is symbolic by default and can be fixed to a concrete value:
/// ```
/// use complexity::params::SizeParams;
///
/// let params = SizeParams::default().parties(2).multiplications(0);
/// assert_eq!(params.parties.as_constant(), Some(2));
/// assert_eq!(params.is_non_linear().evaluate(), Some(false));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SizeParams {
    pub parties: CostExpr,
    pub input_parties: CostExpr,
    pub output_parties: CostExpr,
    pub inputs: CostExpr,
    pub additions: CostExpr,
    pub scalar_multiplications: CostExpr,
    pub multiplications: CostExpr,
    pub public_outputs: CostExpr,
    pub private_outputs: CostExpr,
}

impl Default for SizeParams {
    fn default() -> Self {
        Self {
            parties: CostExpr::from(&*COMPUTE_PARTY_COUNT),
            input_parties: CostExpr::from(&*INPUT_PARTY_COUNT),
            output_parties: CostExpr::from(&*OUTPUT_PARTY_COUNT),
            inputs: CostExpr::from(&*INPUT_COUNT),
            additions: CostExpr::from(&*ADDITION_COUNT),
            scalar_multiplications: CostExpr::from(&*SCALAR_MULTIPLICATION_COUNT),
            multiplications: CostExpr::from(&*MULTIPLICATION_COUNT),
            public_outputs: CostExpr::from(&*PUBLIC_OUTPUT_COUNT),
            private_outputs: CostExpr::from(&*PRIVATE_OUTPUT_COUNT),
        }
    }
}

impl SizeParams {
    pub fn parties(mut self, parties: impl Into<CostExpr>) -> Self {
        self.parties = parties.into();
        self
    }

    pub fn input_parties(mut self, input_parties: impl Into<CostExpr>) -> Self {
        self.input_parties = input_parties.into();
        self
    }

    pub fn output_parties(mut self, output_parties: impl Into<CostExpr>) -> Self {
        self.output_parties = output_parties.into();
        self
    }

    pub fn inputs(mut self, inputs: impl Into<CostExpr>) -> Self {
        self.inputs = inputs.into();
        self
    }

    pub fn additions(mut self, additions: impl Into<CostExpr>) -> Self {
        self.additions = additions.into();
        self
    }

    pub fn scalar_multiplications(mut self, scalar_multiplications: impl Into<CostExpr>) -> Self {
        self.scalar_multiplications = scalar_multiplications.into();
        self
    }

    pub fn multiplications(mut self, multiplications: impl Into<CostExpr>) -> Self {
        self.multiplications = multiplications.into();
        self
    }

    pub fn public_outputs(mut self, public_outputs: impl Into<CostExpr>) -> Self {
        self.public_outputs = public_outputs.into();
        self
    }

    pub fn private_outputs(mut self, private_outputs: impl Into<CostExpr>) -> Self {
        self.private_outputs = private_outputs.into();
        self
    }

    /// Public and private outputs.
    pub fn outputs(&self) -> CostExpr {
        &self.public_outputs + &self.private_outputs
    }

    /// The circuit contains at least one multiplication.
    pub fn is_non_linear(&self) -> Condition {
        Condition::positive(&self.multiplications)
    }

    /// The size parameters which are still symbolic, in canonical order.
    pub fn free_symbols(&self) -> Vec<Symbol> {
        let used: BTreeSet<Symbol> = self.values().iter().flat_map(|expr| expr.symbols()).collect();
        size_symbols()
            .into_iter()
            .filter(|symbol| used.contains(symbol))
            .collect()
    }

    fn values(&self) -> [&CostExpr; 9] {
        [
            &self.parties,
            &self.input_parties,
            &self.output_parties,
            &self.inputs,
            &self.additions,
            &self.scalar_multiplications,
            &self.multiplications,
            &self.public_outputs,
            &self.private_outputs,
        ]
    }
}
