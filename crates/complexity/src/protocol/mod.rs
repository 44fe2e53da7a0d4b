//! Recording the cost trace of a protocol.
//!
//! A [`Protocol`] is built once by issuing primitive operations on a [`ProtocolBuilder`]. The
//! builder keeps a scope stack of the current [`Phase`], the current party [`Role`] and a
//! multiplicative factor. Scopes are entered through [`Scope`]s, whose guards restore the
//! enclosing state when dropped, or through the closure helpers like
//! [`ProtocolBuilder::at_each_party`].
//!
//! ```
//! use complexity::aggregate::{Edge, Role};
//! use complexity::params::SizeParams;
//! use complexity::protocol::{Phase, Protocol};
//! use complexity::value::Value;
//!
//! let protocol = Protocol::build("example", SizeParams::default(), |p| {
//!     p.in_phase(Phase::Online, |p| {
//!         p.at_party(Role::ComputeParty, |p| {
//!             p.for_each(3, |p| p.broadcast(Value::field()))
//!         })
//!     })
//! })
//! .unwrap();
//! let online = protocol.phase(Phase::Online);
//! let edge = Edge::new(Role::ComputeParty, Role::BulletinBoard);
//! assert_eq!(online.communication.get(&edge).to_string(), "3*field");
//! ```
use std::collections::BTreeMap;
use std::fmt;

use num_traits::CheckedMul;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::aggregate::{Complexity, Edge, Role};
use crate::errors::BuildError;
use crate::expr::{CostExpr, Symbol};
use crate::params::SizeParams;
use crate::value::Value;

mod combinators;
mod scope;

pub use scope::{Scope, ScopeGuard};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    /// Preprocessing independent of the inputs.
    Offline,
    Online,
    Verification,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Setup,
        Phase::Offline,
        Phase::Online,
        Phase::Verification,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Offline => "offline",
            Phase::Online => "online",
            Phase::Verification => "verification",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a primitive operation accounts for.
#[derive(Clone, Debug)]
pub enum Amount {
    Cost(CostExpr),
    Value(Value),
}

impl Amount {
    /// Computing a value costs `count * cost`.
    pub fn computation(self) -> CostExpr {
        match self {
            Amount::Cost(cost) => cost,
            Amount::Value(value) => value.total_cost(),
        }
    }

    /// Sending a value costs its size, `count * <element>`, whatever it took to compute it.
    pub fn communication(self) -> CostExpr {
        match self {
            Amount::Cost(cost) => cost,
            Amount::Value(value) => value.size(),
        }
    }
}

impl From<CostExpr> for Amount {
    fn from(cost: CostExpr) -> Self {
        Amount::Cost(cost)
    }
}

impl From<&CostExpr> for Amount {
    fn from(cost: &CostExpr) -> Self {
        Amount::Cost(cost.clone())
    }
}

impl From<Symbol> for Amount {
    fn from(symbol: Symbol) -> Self {
        Amount::Cost(symbol.into())
    }
}

impl From<&Symbol> for Amount {
    fn from(symbol: &Symbol) -> Self {
        Amount::Cost(symbol.into())
    }
}

impl From<i64> for Amount {
    fn from(amount: i64) -> Self {
        Amount::Cost(amount.into())
    }
}

impl From<Value> for Amount {
    fn from(value: Value) -> Self {
        Amount::Value(value)
    }
}

impl From<&Value> for Amount {
    fn from(value: &Value) -> Self {
        Amount::Value(value.clone())
    }
}

#[derive(Clone, Debug)]
struct ScopeState {
    phase: Option<Phase>,
    party: Option<Role>,
    factor: CostExpr,
}

impl Default for ScopeState {
    fn default() -> Self {
        Self {
            phase: None,
            party: None,
            factor: CostExpr::from(1),
        }
    }
}

/// Records the primitive operations of one protocol instance.
///
/// A builder is exclusively owned by the construction of one [`Protocol`]. Building several
/// protocols concurrently needs one builder each.
pub struct ProtocolBuilder {
    name: String,
    params: SizeParams,
    phases: BTreeMap<Phase, Complexity>,
    state: ScopeState,
}

impl ProtocolBuilder {
    pub fn new(name: impl Into<String>, params: SizeParams) -> Self {
        Self {
            name: name.into(),
            params,
            phases: BTreeMap::new(),
            state: ScopeState::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &SizeParams {
        &self.params
    }

    /// Number of compute parties.
    pub fn parties(&self) -> CostExpr {
        self.params.parties.clone()
    }

    pub fn phase(&self) -> Option<Phase> {
        self.state.phase
    }

    pub fn party(&self) -> Option<Role> {
        self.state.party
    }

    pub fn factor(&self) -> &CostExpr {
        &self.state.factor
    }

    /// Computation of `amount` at the current party.
    pub fn compute(&mut self, amount: impl Into<Amount>) -> Result<(), BuildError> {
        self.compute_times(amount, 1)
    }

    /// Computation of `times * amount` at the current party.
    pub fn compute_times(
        &mut self,
        amount: impl Into<Amount>,
        times: impl Into<CostExpr>,
    ) -> Result<(), BuildError> {
        let (phase, party) = self.context("compute")?;
        let amount = self.scaled("compute", amount.into().computation(), times.into())?;
        trace!(%phase, %party, %amount, "compute");
        self.complexity(phase).computation.try_record(party, amount)
    }

    /// Communication of `amount` from the current party to `destination`.
    pub fn communicate(
        &mut self,
        destination: Role,
        amount: impl Into<Amount>,
    ) -> Result<(), BuildError> {
        self.communicate_times(destination, amount, 1)
    }

    pub fn communicate_times(
        &mut self,
        destination: Role,
        amount: impl Into<Amount>,
        times: impl Into<CostExpr>,
    ) -> Result<(), BuildError> {
        let (phase, party) = self.context("communicate")?;
        let edge = Edge::new(party, destination);
        let amount = self.scaled("communicate", amount.into().communication(), times.into())?;
        trace!(%phase, %edge, %amount, "communicate");
        self.complexity(phase).communication.try_record(edge, amount)
    }

    /// Communication to the [bulletin board](`Role::BulletinBoard`).
    pub fn broadcast(&mut self, amount: impl Into<Amount>) -> Result<(), BuildError> {
        self.communicate(Role::BulletinBoard, amount)
    }

    pub fn broadcast_times(
        &mut self,
        amount: impl Into<Amount>,
        times: impl Into<CostExpr>,
    ) -> Result<(), BuildError> {
        self.communicate_times(Role::BulletinBoard, amount, times)
    }

    /// `factor * amount * times`, failing if a coefficient overflows.
    fn scaled(
        &self,
        operation: &'static str,
        amount: CostExpr,
        times: CostExpr,
    ) -> Result<CostExpr, BuildError> {
        self.state
            .factor
            .checked_mul(&amount)
            .and_then(|scaled| scaled.checked_mul(&times))
            .ok_or(BuildError::CoefficientOverflow { operation })
    }

    /// Fails unless exactly `expected` is the current party.
    pub fn require_party(
        &self,
        operation: &'static str,
        expected: Option<Role>,
    ) -> Result<(), BuildError> {
        if self.state.party == expected {
            Ok(())
        } else {
            Err(BuildError::UnexpectedParty {
                operation,
                expected,
                found: self.state.party,
            })
        }
    }

    /// Fails if a party is in scope.
    pub fn require_no_party(&self, operation: &'static str) -> Result<(), BuildError> {
        self.require_party(operation, None)
    }

    /// Fails if no party is in scope.
    pub fn require_any_party(&self, operation: &'static str) -> Result<(), BuildError> {
        match self.state.party {
            Some(_) => Ok(()),
            None => Err(BuildError::MissingParty { operation }),
        }
    }

    /// Finishes the construction.
    pub fn finish(self) -> Protocol {
        debug!(name = %self.name, phases = self.phases.len(), "Finished protocol");
        Protocol {
            name: self.name,
            params: self.params,
            phases: self.phases,
        }
    }

    fn context(&self, operation: &'static str) -> Result<(Phase, Role), BuildError> {
        let party = self
            .state
            .party
            .ok_or(BuildError::MissingParty { operation })?;
        let phase = self
            .state
            .phase
            .ok_or(BuildError::MissingPhase { operation })?;
        Ok((phase, party))
    }

    fn complexity(&mut self, phase: Phase) -> &mut Complexity {
        self.phases.entry(phase).or_default()
    }
}

impl fmt::Debug for ProtocolBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolBuilder")
            .field("name", &self.name)
            .field("phase", &self.state.phase)
            .field("party", &self.state.party)
            .field("factor", &format_args!("{}", self.state.factor))
            .finish_non_exhaustive()
    }
}

static EMPTY: Lazy<Complexity> = Lazy::new(Complexity::default);

/// The costs of a protocol, per phase. Immutable once built.
#[derive(Clone, Debug, Serialize)]
pub struct Protocol {
    name: String,
    params: SizeParams,
    phases: BTreeMap<Phase, Complexity>,
}

impl Protocol {
    /// Builds a protocol by running `trace` on a fresh builder.
    ///
    /// Any error aborts the construction and no protocol is returned.
    #[tracing::instrument(level = "debug", skip(params, trace))]
    pub fn build<F>(name: &str, params: SizeParams, trace: F) -> Result<Protocol, BuildError>
    where
        F: FnOnce(&mut ProtocolBuilder) -> Result<(), BuildError>,
    {
        let mut builder = ProtocolBuilder::new(name, params);
        trace(&mut builder)?;
        Ok(builder.finish())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &SizeParams {
        &self.params
    }

    /// Costs of `phase`. Phases that were never entered have no costs.
    pub fn phase(&self, phase: Phase) -> &Complexity {
        self.phases.get(&phase).unwrap_or(&EMPTY)
    }

    pub fn has_phase(&self, phase: Phase) -> bool {
        self.phases.contains_key(&phase)
    }

    pub fn phases(&self) -> impl Iterator<Item = (Phase, &Complexity)> + '_ {
        self.phases.iter().map(|(phase, complexity)| (*phase, complexity))
    }

    /// Costs summed over all phases.
    pub fn total(&self) -> Complexity {
        let mut total = Complexity::default();
        for complexity in self.phases.values() {
            total += complexity;
        }
        total
    }
}
