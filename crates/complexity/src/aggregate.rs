//! Accumulators for communication and computation costs.
//!
//! An [`Aggregator`] maps keys to cost expressions. Recording an amount for a key adds it to the
//! entry, absent keys are zero. Merging two aggregators is the pointwise sum, which is
//! associative and commutative.
use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;

use num_traits::{CheckedAdd, Zero};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::errors::BuildError;
use crate::expr::CostExpr;

/// Participant classes of a protocol.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    ComputeParty,
    InputParty,
    OutputParty,
    /// The public broadcast channel.
    BulletinBoard,
    /// Placeholder for merged roles, only used when collapsing.
    AnyParty,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::ComputeParty => "compute_party",
            Role::InputParty => "input_party",
            Role::OutputParty => "output_party",
            Role::BulletinBoard => "bulletin_board",
            Role::AnyParty => "any_party",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Directed communication between two roles.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    pub source: Role,
    pub destination: Role,
}

impl Edge {
    pub fn new(source: Role, destination: Role) -> Self {
        Self {
            source,
            destination,
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_to_{}", self.source, self.destination)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Aggregator<K> {
    entries: BTreeMap<K, CostExpr>,
}

/// Communication per (source, destination) pair.
pub type CommunicationComplexity = Aggregator<Edge>;
/// Computation per role.
pub type ComputationComplexity = Aggregator<Role>;

impl<K> Default for Aggregator<K> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> Aggregator<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to the entry of `key`.
    pub fn record(&mut self, key: K, amount: impl Into<CostExpr>) {
        let amount = amount.into();
        if amount.is_zero() && !self.entries.contains_key(&key) {
            return;
        }
        let entry = self.entries.entry(key).or_default();
        *entry += amount;
    }

    /// Like [`record`](Self::record), but fails instead of panicking when a coefficient of the
    /// entry overflows. The entry is unchanged in that case.
    pub fn try_record(&mut self, key: K, amount: CostExpr) -> Result<(), BuildError> {
        if amount.is_zero() && !self.entries.contains_key(&key) {
            return Ok(());
        }
        let entry = self.entries.entry(key).or_default();
        *entry = entry
            .checked_add(&amount)
            .ok_or(BuildError::CoefficientOverflow { operation: "record" })?;
        Ok(())
    }

    /// Merges all entries of `other` into `self`.
    pub fn update(&mut self, other: &Aggregator<K>) {
        for (key, amount) in &other.entries {
            self.record(key.clone(), amount);
        }
    }

    /// The entry of `key`, zero if nothing was recorded for it.
    pub fn get(&self, key: &K) -> CostExpr {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    /// All non-zero entries.
    pub fn summary(&self) -> BTreeMap<K, CostExpr> {
        self.entries
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(key, amount)| (key.clone(), amount.clone()))
            .collect()
    }

    /// Sum over all entries.
    pub fn total(&self) -> CostExpr {
        self.entries.values().sum()
    }

    /// Recorded keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &CostExpr)> + '_ {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Zero::is_zero)
    }

    /// Sums the entries of `keys`.
    pub fn sum_of<'a>(&self, keys: impl IntoIterator<Item = &'a K>) -> CostExpr
    where
        K: 'a,
    {
        keys.into_iter().map(|key| self.get(key)).sum()
    }
}

impl<K: Ord + Clone> AddAssign<&Aggregator<K>> for Aggregator<K> {
    fn add_assign(&mut self, rhs: &Aggregator<K>) {
        self.update(rhs);
    }
}

impl<K: Ord + Clone> AddAssign<Aggregator<K>> for Aggregator<K> {
    fn add_assign(&mut self, rhs: Aggregator<K>) {
        self.update(&rhs);
    }
}

impl<K: Ord + Clone, A: Into<CostExpr>> FromIterator<(K, A)> for Aggregator<K> {
    fn from_iter<T: IntoIterator<Item = (K, A)>>(iter: T) -> Self {
        let mut aggregator = Self::new();
        aggregator.extend(iter);
        aggregator
    }
}

impl<K: Ord + Clone, A: Into<CostExpr>> Extend<(K, A)> for Aggregator<K> {
    fn extend<T: IntoIterator<Item = (K, A)>>(&mut self, iter: T) {
        for (key, amount) in iter {
            self.record(key, amount);
        }
    }
}

impl<K: fmt::Display> fmt::Debug for Aggregator<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, amount) in &self.entries {
            map.key(&format_args!("{key}"))
                .value(&format_args!("{amount}"));
        }
        map.finish()
    }
}

// Keys are serialized through their `Display` implementation, e.g. `compute_party_to_bulletin_board`.
impl<K: fmt::Display> Serialize for Aggregator<K> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .collect();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, amount) in entries {
            map.serialize_entry(&key.to_string(), amount)?;
        }
        map.end()
    }
}

/// Communication and computation of one phase.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Complexity {
    pub communication: CommunicationComplexity,
    pub computation: ComputationComplexity,
}

impl Complexity {
    pub fn update(&mut self, other: &Complexity) {
        self.communication.update(&other.communication);
        self.computation.update(&other.computation);
    }

    pub fn is_empty(&self) -> bool {
        self.communication.is_empty() && self.computation.is_empty()
    }
}

impl AddAssign<&Complexity> for Complexity {
    fn add_assign(&mut self, rhs: &Complexity) {
        self.update(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Symbol;

    fn field() -> CostExpr {
        CostExpr::from(Symbol::new("field"))
    }

    #[test]
    fn absent_keys_are_zero() {
        let aggregator = ComputationComplexity::new();
        assert!(aggregator.get(&Role::OutputParty).is_zero());
        assert!(aggregator.total().is_zero());
        assert!(aggregator.summary().is_empty());
    }

    #[test]
    fn record_accumulates() {
        let mut aggregator = CommunicationComplexity::new();
        let edge = Edge::new(Role::ComputeParty, Role::BulletinBoard);
        aggregator.record(edge, field());
        aggregator.record(edge, field() * 2);
        aggregator.record(Edge::new(Role::InputParty, Role::ComputeParty), 0);
        assert_eq!(aggregator.get(&edge), field() * 3);
        assert_eq!(aggregator.summary().len(), 1);
        assert_eq!(aggregator.keys().count(), 1);
    }

    #[test]
    fn cancelling_entries_are_omitted_from_summary() {
        let mut aggregator = ComputationComplexity::new();
        aggregator.record(Role::ComputeParty, field());
        aggregator.record(Role::ComputeParty, -field());
        assert!(aggregator.summary().is_empty());
        assert!(aggregator.is_empty());
    }

    #[test]
    fn update_is_pointwise() {
        let mut left: ComputationComplexity = [
            (Role::ComputeParty, field()),
            (Role::InputParty, CostExpr::from(1)),
        ]
        .into_iter()
        .collect();
        let right: ComputationComplexity = [
            (Role::ComputeParty, field()),
            (Role::OutputParty, field()),
        ]
        .into_iter()
        .collect();
        left += &right;
        assert_eq!(left.get(&Role::ComputeParty), field() * 2);
        assert_eq!(left.get(&Role::OutputParty), field());
        assert_eq!(left.total(), field() * 3 + 1);
    }

    #[test]
    fn serializes_with_display_keys() {
        let mut aggregator = CommunicationComplexity::new();
        aggregator.record(Edge::new(Role::ComputeParty, Role::BulletinBoard), field());
        let json = serde_json::to_string(&aggregator).unwrap();
        assert_eq!(json, r#"{"compute_party_to_bulletin_board":"field"}"#);
    }
}
