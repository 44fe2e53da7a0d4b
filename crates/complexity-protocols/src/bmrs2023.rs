use complexity::aggregate::Role;
use complexity::expr::log_of;
use complexity::value::{Kind, Value};
use complexity::{BuildError, CostExpr, Phase, ProtocolBuilder, Zero};

use crate::ProtocolEncoding;

/// Cheater Identification on a Budget: MPC with Identifiable Abort from Pairwise MACs.
///
/// Carsten Baum, Nikolas Melissaris, Rahul Rachuri, Peter Scholl.
/// <https://eprint.iacr.org/2023/1548.pdf>
///
/// Every share carries one pairwise MAC per other party, the correlations come from VOLE
/// extension whose communication grows logarithmically in the number of correlations. There is
/// no verification phase, each opening is checked on arrival.
#[derive(Copy, Clone, Debug, Default)]
pub struct BaumMelissarisRachuriScholl2023;

/// Fig. 2. The owner sends its share and one MAC to every other party, which checks it.
fn output(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("output")?;
    let n = p.parties();
    p.at_party(Role::ComputeParty, |p| {
        p.for_each(&n - 1, |p| {
            p.communicate_times(Role::ComputeParty, Value::field(), 2)
        })
    })?;
    p.at_each_party(Role::ComputeParty, &n - 1, check_mac)
}

fn check_mac(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    let mac = Value::field() * Value::field() + Value::field();
    p.compute(mac.equals(Value::field())?)
}

fn open(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    let n = p.parties();
    p.for_each(n, output)
}

/// Lifts an operation on authenticated values of one party to shares of all parties.
fn per_share<F>(p: &mut ProtocolBuilder, name: &'static str, op: F) -> Result<(), BuildError>
where
    F: Fn(&mut ProtocolBuilder) -> Result<(), BuildError>,
{
    p.require_no_party(name)?;
    let n = p.parties();
    p.for_each(n, op)
}

fn add_share(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    per_share(p, "add_share", add_authenticated)
}

fn sub_share(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    per_share(p, "sub_share", add_authenticated)
}

fn add_constant_share(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    per_share(p, "add_constant_share", add_constant_authenticated)
}

fn mul_share(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    per_share(p, "mul_share", mul_authenticated)
}

/// Sec. 4. The sender updates its value and its `n - 1` MACs, each receiver its key.
fn add_authenticated(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("add_authenticated")?;
    let n = p.parties();
    p.at_party(Role::ComputeParty, |p| {
        p.compute_times(Value::field() + Value::field(), &n)
    })?;
    p.at_each_party(Role::ComputeParty, &n - 1, |p| {
        p.compute(Value::field() + Value::field())
    })
}

fn mul_authenticated(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("mul_authenticated")?;
    let n = p.parties();
    p.at_party(Role::ComputeParty, |p| {
        p.compute_times(Value::field() * Value::field(), &n)
    })?;
    p.at_each_party(Role::ComputeParty, &n - 1, |p| {
        p.compute(Value::field() * Value::field())
    })
}

/// Sec. 4. Only the receivers adjust their keys by the constant times the global key.
fn add_constant_authenticated(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("add_constant_authenticated")?;
    let n = p.parties();
    p.at_party(Role::ComputeParty, |p| p.compute(Value::field() + Value::field()))?;
    p.at_each_party(Role::ComputeParty, &n - 1, |p| {
        p.compute(Value::field() - Value::field() * Value::field())
    })
}

/// `count` VOLE correlations between one pair, rough costs for sender and receiver alike.
fn vole_extend(p: &mut ProtocolBuilder, count: &CostExpr) -> Result<(), BuildError> {
    p.require_no_party("vole_extend")?;
    if count.is_zero() {
        return Ok(());
    }
    p.at_party(Role::ComputeParty, |p| {
        p.communicate_times(Role::ComputeParty, Value::field(), log_of(count))?;
        p.compute_times(Value::field() + Value::field(), count)?;
        p.compute_times(Value::field() * Value::field(), count)
    })
}

/// Fig. 2. Commits one party to `count` random values.
fn commit_random(p: &mut ProtocolBuilder, count: &CostExpr) -> Result<(), BuildError> {
    p.require_no_party("commit_random")?;
    let n = p.parties();
    p.at_party(Role::ComputeParty, |p| p.compute(Value::field().sample()))?;
    p.for_each(&n - 1, |p| {
        // sender
        vole_extend(p, count)?;
        // receiver
        vole_extend(p, count)
    })?;
    p.rand(&Kind::Field.element(), count)?;
    // random linear combination of all commitments plus a mask
    p.for_each(count, |p| {
        mul_authenticated(p)?;
        add_authenticated(p)
    })?;
    p.at_party(Role::ComputeParty, |p| {
        p.broadcast(Value::field())?;
        p.for_each(&n - 1, |p| p.communicate(Role::ComputeParty, Value::field()))
    })?;
    p.at_each_party(Role::ComputeParty, &n - 1, check_mac)
}

/// Fig. 2. Commits one party to `count` chosen values by correcting random commitments.
fn commit_input(p: &mut ProtocolBuilder, count: &CostExpr) -> Result<(), BuildError> {
    p.require_no_party("commit_input")?;
    commit_random(p, count)?;
    let n = p.parties();
    p.for_each(count, |p| {
        p.at_party(Role::ComputeParty, |p| {
            p.compute(Value::field() - Value::field())?;
            p.broadcast(Value::field())
        })?;
        p.at_each_party(Role::ComputeParty, &n - 1, |p| {
            p.compute(Value::field() - Value::field() * Value::field())
        })
    })
}

/// Fig. 2. Opens `count` commitments towards a single party.
fn open_privately(p: &mut ProtocolBuilder, count: impl Into<CostExpr>) -> Result<(), BuildError> {
    p.require_no_party("open_privately")?;
    p.for_each(count, |p| {
        p.at_party(Role::ComputeParty, |p| {
            p.communicate_times(Role::ComputeParty, Value::field(), 2)?;
            check_mac(p)
        })
    })
}

/// Unauthenticated triples. Their generation is not accounted for.
fn triples(p: &mut ProtocolBuilder, _count: &CostExpr) -> Result<(), BuildError> {
    p.require_no_party("triples")
}

/// Fig. 13. Every party commits to `count` random values which are summed up.
fn random_inputs(p: &mut ProtocolBuilder, count: &CostExpr) -> Result<(), BuildError> {
    p.require_no_party("random_inputs")?;
    let n = p.parties();
    p.for_each(&n, |p| {
        commit_random(p, count)?;
        open_privately(p, count)
    })?;
    p.at_party(Role::ComputeParty, |p| {
        p.compute_times(Value::field().sum(&n), count)
    })
}

/// Fig. 14. Authenticates `count` triples with one sacrificed triple each, then checks all of
/// them by a random linear combination.
fn triple_generation(p: &mut ProtocolBuilder, count: &CostExpr) -> Result<(), BuildError> {
    p.require_no_party("triple_generation")?;
    triples(p, &(count * 2))?;
    let n = p.parties();
    // three values of two triples
    let committed = count * 6;
    p.for_each(&n, |p| commit_input(p, &committed))?;
    p.rand(&Kind::Field.element(), count)?;
    p.for_each(count, |p| {
        // t * a + a' and b + b'
        mul_share(p)?;
        add_share(p)?;
        add_share(p)?;
        // alpha and beta
        open(p)?;
        open(p)?;
        // t * c - c' + alpha * b + beta * a' - alpha * beta
        mul_share(p)?;
        sub_share(p)?;
        add_share(p)?;
        mul_share(p)?;
        add_share(p)?;
        mul_share(p)?;
        p.at_each_party(Role::ComputeParty, &n, |p| {
            p.compute(Value::field() * Value::field())
        })?;
        add_constant_share(p)
    })?;
    p.for_each(count, mul_share)?;
    p.for_each(count - 1, add_share)?;
    open(p)
}

/// Fig. 19. The input party broadcasts its masked input, which is added to a random share.
fn input(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("input")?;
    p.at_party(Role::ComputeParty, |p| {
        p.compute(Value::field() - Value::field())?;
        p.broadcast(Value::field())
    })?;
    add_constant_share(p)
}

fn beaver_multiplication(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.for_each(2, |p| {
        sub_share(p)?;
        open(p)?;
        mul_share(p)?;
        add_share(p)
    })?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, n, |p| {
        p.compute(Value::field() * Value::field())
    })?;
    add_constant_share(p)
}

impl ProtocolEncoding for BaumMelissarisRachuriScholl2023 {
    fn name(&self) -> &'static str {
        "BaumMelissarisRachuriScholl2023"
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn trace(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        let params = p.params().clone();
        let n = p.parties();

        // every party samples its keys and sends them to the others
        p.in_phase(Phase::Setup, |p| {
            p.at_each_party(Role::ComputeParty, &n, |p| {
                p.for_each(&n - 1, |p| {
                    p.compute(Value::field().sample())?;
                    p.communicate(Role::ComputeParty, Value::field())
                })
            })
        })?;

        p.in_phase(Phase::Offline, |p| {
            triple_generation(p, &params.multiplications)?;
            random_inputs(p, &params.inputs)
        })?;

        p.in_phase(Phase::Online, |p| {
            p.for_each(&params.inputs, input)?;
            p.for_each(&params.additions, add_share)?;
            p.for_each(&params.scalar_multiplications, mul_share)?;
            p.for_each(&params.multiplications, beaver_multiplication)?;
            p.for_each(&params.public_outputs, output)?;
            p.for_each(&params.private_outputs, |p| open_privately(p, 1))
        })
    }
}

#[cfg(test)]
mod tests {
    use complexity::aggregate::Edge;
    use complexity::expr::Atom;
    use complexity::params::SizeParams;
    use complexity::{CostExpr, Phase, Symbol};

    use super::*;

    #[test]
    fn no_verification_phase() {
        let protocol = BaumMelissarisRachuriScholl2023
            .build(SizeParams::default())
            .unwrap();
        assert!(protocol.has_phase(Phase::Setup));
        assert!(protocol.has_phase(Phase::Offline));
        assert!(protocol.has_phase(Phase::Online));
        assert!(!protocol.has_phase(Phase::Verification));
    }

    #[test]
    fn vole_communication_is_logarithmic() {
        let protocol = BaumMelissarisRachuriScholl2023
            .build(SizeParams::default())
            .unwrap();
        let communication = protocol
            .phase(Phase::Offline)
            .communication
            .get(&Edge::new(Role::ComputeParty, Role::ComputeParty));
        let log_inputs = Atom::Log(CostExpr::symbol(&Symbol::new("I")));
        assert!(communication
            .terms()
            .any(|(monomial, _)| monomial.exponent(&log_inputs) == 1));
    }

    #[test]
    fn no_inputs_skip_vole() -> anyhow::Result<()> {
        let params = SizeParams::default().inputs(0).multiplications(0);
        let protocol = BaumMelissarisRachuriScholl2023.build(params)?;
        let communication = protocol
            .phase(Phase::Offline)
            .communication
            .get(&Edge::new(Role::ComputeParty, Role::ComputeParty));
        assert!(communication.terms().all(|(monomial, _)| monomial
            .atoms()
            .all(|(atom, _)| !matches!(atom, Atom::Log(_)))));
        Ok(())
    }
}
