use std::cell::Cell;
use std::fmt;
use std::ops::{Deref, DerefMut};

use itertools::Itertools;
use num_traits::{CheckedMul, One};
use tracing::debug;

use super::{Phase, ProtocolBuilder, ScopeState};
use crate::aggregate::Role;
use crate::errors::BuildError;
use crate::expr::{conditional, Condition, CostExpr};

/// A single-use change of the builder's scope stack.
///
/// Entering a scope returns a [`ScopeGuard`] which restores the previous phase, party and factor
/// when dropped, also when an error is propagated out of the scope or the thread unwinds. A scope
/// can only be entered once, entering it again fails with [`BuildError::ScopeReused`].
pub struct Scope {
    kind: ScopeKind,
    entered: Cell<bool>,
}

enum ScopeKind {
    Phase(Phase),
    Party(Role),
    Factor(CostExpr),
    Combined(Vec<Scope>),
}

impl Scope {
    fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            entered: Cell::new(false),
        }
    }

    /// Sets the current phase. The first entry of a phase allocates its aggregators.
    pub fn phase(phase: Phase) -> Self {
        Self::new(ScopeKind::Phase(phase))
    }

    pub fn party(role: Role) -> Self {
        Self::new(ScopeKind::Party(role))
    }

    /// Multiplies the current factor with `factor`.
    pub fn factor(factor: impl Into<CostExpr>) -> Self {
        Self::new(ScopeKind::Factor(factor.into()))
    }

    /// Enters all `scopes` at once, in order. Nothing is changed if any of them was used before.
    pub fn combined(scopes: impl IntoIterator<Item = Scope>) -> Self {
        Self::new(ScopeKind::Combined(scopes.into_iter().collect()))
    }

    pub fn is_entered(&self) -> bool {
        self.entered.get()
    }

    pub fn enter<'b>(&self, builder: &'b mut ProtocolBuilder) -> Result<ScopeGuard<'b>, BuildError> {
        self.validate()?;
        let saved = builder.state.clone();
        if let Err(err) = self.apply(builder) {
            builder.state = saved;
            return Err(err);
        }
        Ok(ScopeGuard { builder, saved })
    }

    fn validate(&self) -> Result<(), BuildError> {
        if self.entered.get() {
            return Err(BuildError::ScopeReused(self.to_string()));
        }
        if let ScopeKind::Combined(scopes) = &self.kind {
            scopes.iter().try_for_each(Scope::validate)?;
        }
        Ok(())
    }

    fn apply(&self, builder: &mut ProtocolBuilder) -> Result<(), BuildError> {
        self.entered.set(true);
        match &self.kind {
            ScopeKind::Phase(phase) => {
                if !builder.phases.contains_key(phase) {
                    debug!(%phase, protocol = %builder.name, "Entered new phase");
                    builder.phases.insert(*phase, Default::default());
                }
                builder.state.phase = Some(*phase);
            }
            ScopeKind::Party(role) => builder.state.party = Some(*role),
            ScopeKind::Factor(factor) => {
                builder.state.factor = builder
                    .state
                    .factor
                    .checked_mul(factor)
                    .ok_or(BuildError::CoefficientOverflow { operation: "factor scope" })?;
            }
            ScopeKind::Combined(scopes) => {
                return scopes.iter().try_for_each(|scope| scope.apply(builder));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ScopeKind::Phase(phase) => write!(f, "phase {phase}"),
            ScopeKind::Party(role) => write!(f, "party {role}"),
            ScopeKind::Factor(factor) => write!(f, "factor {factor}"),
            ScopeKind::Combined(scopes) => write!(f, "({})", scopes.iter().format(", ")),
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("kind", &format_args!("{self}"))
            .field("entered", &self.entered.get())
            .finish()
    }
}

/// Restores the enclosing scope state on drop.
pub struct ScopeGuard<'b> {
    builder: &'b mut ProtocolBuilder,
    saved: ScopeState,
}

impl fmt::Debug for ScopeGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScopeGuard").field(&*self.builder).finish()
    }
}

impl Deref for ScopeGuard<'_> {
    type Target = ProtocolBuilder;

    fn deref(&self) -> &Self::Target {
        self.builder
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.builder
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.builder.state = std::mem::take(&mut self.saved);
    }
}

impl ProtocolBuilder {
    /// Runs `f` inside `scope`.
    pub fn scoped<T, F>(&mut self, scope: Scope, f: F) -> Result<T, BuildError>
    where
        F: FnOnce(&mut ProtocolBuilder) -> Result<T, BuildError>,
    {
        let mut guard = scope.enter(self)?;
        f(&mut *guard)
    }

    pub fn in_phase<T, F>(&mut self, phase: Phase, f: F) -> Result<T, BuildError>
    where
        F: FnOnce(&mut ProtocolBuilder) -> Result<T, BuildError>,
    {
        self.scoped(Scope::phase(phase), f)
    }

    pub fn at_party<T, F>(&mut self, role: Role, f: F) -> Result<T, BuildError>
    where
        F: FnOnce(&mut ProtocolBuilder) -> Result<T, BuildError>,
    {
        self.scoped(Scope::party(role), f)
    }

    /// Runs `f` once on behalf of each of `count` parties of `role`.
    pub fn at_each_party<T, F>(
        &mut self,
        role: Role,
        count: impl Into<CostExpr>,
        f: F,
    ) -> Result<T, BuildError>
    where
        F: FnOnce(&mut ProtocolBuilder) -> Result<T, BuildError>,
    {
        let scope = Scope::combined([Scope::party(role), Scope::factor(count)]);
        self.scoped(scope, f)
    }

    /// Repeats everything recorded by `f` `count` times.
    pub fn for_each<T, F>(&mut self, count: impl Into<CostExpr>, f: F) -> Result<T, BuildError>
    where
        F: FnOnce(&mut ProtocolBuilder) -> Result<T, BuildError>,
    {
        self.scoped(Scope::factor(count), f)
    }

    /// Repeats everything recorded by `f` for each combination of `counts`.
    pub fn for_each_product<I, T, F>(&mut self, counts: I, f: F) -> Result<T, BuildError>
    where
        I: IntoIterator,
        I::Item: Into<CostExpr>,
        F: FnOnce(&mut ProtocolBuilder) -> Result<T, BuildError>,
    {
        let factor = counts
            .into_iter()
            .try_fold(CostExpr::one(), |factor, count| factor.checked_mul(&count.into()))
            .ok_or(BuildError::CoefficientOverflow { operation: "for_each_product" })?;
        self.scoped(Scope::factor(factor), f)
    }

    /// Everything recorded by `f` only counts if `condition` holds.
    pub fn if_conditionally<T, F>(&mut self, condition: &Condition, f: F) -> Result<T, BuildError>
    where
        F: FnOnce(&mut ProtocolBuilder) -> Result<T, BuildError>,
    {
        self.scoped(Scope::factor(conditional(condition, 1, 0)), f)
    }

    /// Everything recorded by `f` only counts if `condition` does not hold.
    pub fn else_conditionally<T, F>(
        &mut self,
        condition: &Condition,
        f: F,
    ) -> Result<T, BuildError>
    where
        F: FnOnce(&mut ProtocolBuilder) -> Result<T, BuildError>,
    {
        self.scoped(Scope::factor(conditional(&!condition, 1, 0)), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SizeParams;

    fn builder() -> ProtocolBuilder {
        ProtocolBuilder::new("test", SizeParams::default())
    }

    #[test]
    fn guard_restores_state() {
        let mut builder = builder();
        let phase = Scope::phase(Phase::Online);
        {
            let guard = phase.enter(&mut builder).unwrap();
            assert_eq!(guard.phase(), Some(Phase::Online));
        }
        assert_eq!(builder.phase(), None);
        assert!(phase.is_entered());
    }

    #[test]
    fn scopes_are_single_use() {
        let mut builder = builder();
        let party = Scope::party(Role::ComputeParty);
        drop(party.enter(&mut builder).unwrap());
        let err = party.enter(&mut builder).unwrap_err();
        assert_eq!(err, BuildError::ScopeReused("party compute_party".into()));
    }

    #[test]
    fn combined_validates_before_mutation() {
        let mut builder = builder();
        let factor = Scope::factor(3);
        drop(factor.enter(&mut builder).unwrap());
        let combined = Scope::combined([Scope::phase(Phase::Setup), Scope::factor(2)]);
        let guard = combined.enter(&mut builder).unwrap();
        assert_eq!(guard.factor(), &CostExpr::from(2));
        drop(guard);
        let err = combined.enter(&mut builder).unwrap_err();
        assert!(matches!(err, BuildError::ScopeReused(_)));
        assert_eq!(builder.phase(), None);
        assert_eq!(builder.factor(), &CostExpr::from(1));
    }

    #[test]
    fn factors_multiply() {
        let mut builder = builder();
        let n = builder.parties();
        builder
            .for_each(2, |p| {
                p.for_each(&n, |p| {
                    assert_eq!(p.factor(), &(&n * 2));
                    Ok(())
                })
            })
            .unwrap();
        assert_eq!(builder.factor(), &CostExpr::from(1));
    }

    #[test]
    fn conditional_factors() {
        let mut builder = builder();
        let n = builder.parties();
        let condition = Condition::positive(&n - 1);
        let taken = builder
            .if_conditionally(&condition, |p| Ok(p.factor().clone()))
            .unwrap();
        let not_taken = builder
            .else_conditionally(&condition, |p| Ok(p.factor().clone()))
            .unwrap();
        assert_eq!(taken + not_taken, CostExpr::from(1));
    }

    #[test]
    fn overflowing_factor_is_rejected() {
        let mut builder = ProtocolBuilder::new("test", SizeParams::default().parties(i64::MAX));
        let n = builder.parties();
        let err = builder
            .in_phase(Phase::Online, |p| {
                p.for_each(&n, |p| {
                    p.for_each(&n, |p| p.for_each(&n, |p| Ok(p.factor().clone())))
                })
            })
            .unwrap_err();
        assert_eq!(err, BuildError::CoefficientOverflow { operation: "factor scope" });
        assert_eq!(builder.factor(), &CostExpr::from(1));
        assert_eq!(builder.phase(), None);
    }
}
