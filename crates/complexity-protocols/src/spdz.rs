//! Share arithmetic of SPDZ-like protocols.
//!
//! Secrets are additively shared field elements, each share carries a share of a MAC under a
//! global key. Linear operations therefore touch the share and its MAC share. Opened values are
//! checked in a batched MAC check at the end (Keller et al. 2017, Fig. 4 and 5).
use complexity::aggregate::Role;
use complexity::value::{Kind, Value};
use complexity::{BuildError, CostExpr, ProtocolBuilder};

/// Adds two shares and their MAC shares.
pub fn add_share(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_party("add_share", Some(Role::ComputeParty))?;
    p.compute_times(Value::field() + Value::field(), 2)
}

/// Adds a public constant. One party adjusts its share, all adjust their MAC share.
pub fn add_constant(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_party("add_constant", Some(Role::ComputeParty))?;
    p.compute(Value::field() + Value::field() * Value::field())
}

pub fn sub_share(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    add_share(p)
}

/// Multiplies a share and its MAC share with a public scalar.
pub fn mul_share(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_party("mul_share", Some(Role::ComputeParty))?;
    p.compute_times(Value::field() * Value::field(), 2)
}

/// Broadcasts the shares of a value and reconstructs it, without checking the MACs.
pub fn open(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("open")?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        p.broadcast(Value::field())?;
        p.compute(Value::field().sum(&n))
    })
}

/// Checks `count` opened values at once by a random linear combination, then runs `mac_check`
/// on the combined value.
pub fn check<F>(
    p: &mut ProtocolBuilder,
    count: impl Into<CostExpr>,
    mac_check: F,
) -> Result<(), BuildError>
where
    F: FnOnce(&mut ProtocolBuilder) -> Result<(), BuildError>,
{
    p.require_no_party("check")?;
    let count = count.into();
    p.rand(&Kind::Field.element(), &count)?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, n, |p| {
        p.compute_times(Value::field() * Value::field(), &count * 2)?;
        p.compute_times(Value::field().sum(&count), 2)
    })?;
    mac_check(p)
}

/// Commits to and opens `sigma_i = m_i - alpha_i * a`, then checks that the sum is zero.
pub fn mac_check(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("mac_check")?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        p.compute(Value::field() - Value::field() * Value::field())?;
        p.commit(1)?;
        p.decommit(1)
    })?;
    p.at_each_party(Role::ComputeParty, &n, |p| {
        p.compute(Value::field().sum(&n).equals(Value::field())?)
    })
}

/// Additions and scalar multiplications of the circuit.
pub fn linear_operations(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    let params = p.params().clone();
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, n, |p| {
        p.for_each(&params.additions, add_share)?;
        p.for_each(&params.scalar_multiplications, mul_share)
    })
}

/// Beaver multiplication with a preprocessed triple `(a, b, c)`.
///
/// `x - a` and `y - b` are opened, then every party computes its share of
/// `c + (x - a) * b + (y - b) * a` and one party adds `(x - a) * (y - b)`.
pub fn beaver_multiplication(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("beaver_multiplication")?;
    let n = p.parties();
    p.for_each(2, |p| {
        p.at_each_party(Role::ComputeParty, &n, sub_share)?;
        open(p)?;
        p.at_each_party(Role::ComputeParty, &n, |p| {
            mul_share(p)?;
            add_share(p)
        })
    })?;
    p.at_party(Role::ComputeParty, |p| {
        p.compute(Value::field() * Value::field())?;
        add_constant(p)
    })
}

/// A compute party publishes its input masked with a preprocessed random share.
pub fn masked_input(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.at_party(Role::ComputeParty, |p| {
        p.compute(Value::field() - Value::field())?;
        p.broadcast(Value::field())
    })
}
