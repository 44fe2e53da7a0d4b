use complexity::aggregate::Role;
use complexity::units::{ZK, ZK_VERIFICATION};
use complexity::value::{Kind, Value};
use complexity::{BuildError, CostExpr, Phase, ProtocolBuilder};

use crate::spdz::{self, mul_share, open, sub_share};
use crate::ProtocolEncoding;

/// Overdrive: Making SPDZ Great Again, LowGear variant.
///
/// Marcel Keller, Valerio Pastro, Dragos Rotaru. <https://eprint.iacr.org/2017/1230.pdf>
///
/// Triples are generated with pairwise linearly homomorphic encryption. For HighGear see
/// [`BaumCozzoSmart2019`](crate::BaumCozzoSmart2019).
#[derive(Copy, Clone, Debug, Default)]
pub struct KellerPastroRotaru2017;

/// Fig. 4. Key exchange with pairwise proofs of plaintext knowledge.
fn initialize(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("initialize")?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        p.compute(Value::field().sample())?;
        // diagonal proofs
        p.for_each(&n - 1, pairwise_zk)
    })
}

fn pairwise_zk(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.compute(&*ZK)?;
    p.communicate(Role::ComputeParty, &*ZK)?;
    p.compute(&*ZK_VERIFICATION)
}

/// Fig. 4. Authenticates `count` values of one party plus one for the check.
fn input(p: &mut ProtocolBuilder, count: CostExpr) -> Result<(), BuildError> {
    p.require_no_party("input")?;
    let n = p.parties();
    let m = &count + 1;
    p.at_party(Role::ComputeParty, |p| {
        p.for_each(&count, |p| {
            p.for_each(&n - 1, |p| {
                p.compute(Value::field().sample())?;
                p.communicate(Role::ComputeParty, Value::field())
            })?;
            p.compute(Value::field() - Value::field().sum(&n - 1))
        })?;
        p.for_each(&m, |p| {
            p.for_each(&n - 1, |p| {
                p.compute(Value::field().sample())?;
                p.encrypt_drowning()?;
                p.compute(Value::field() * Value::ciphertext() - Value::ciphertext())?;
                p.communicate(Role::ComputeParty, Value::ciphertext())
            })
        })
    })?;
    p.at_each_party(Role::ComputeParty, &n - 1, |p| p.decrypt(&m))?;
    p.rand(&Kind::Field.element(), &m)?;
    p.at_party(Role::ComputeParty, |p| {
        // rho
        p.compute_times(Value::field() * Value::field(), &m)?;
        p.compute(Value::field().sum(&m))?;
        // sigma for every other party
        p.for_each(&n - 1, |p| {
            p.compute_times(Value::field() * Value::field(), &m)?;
            p.compute(Value::field().sum(&m))?;
            p.communicate_times(Role::ComputeParty, Value::field(), 2)
        })
    })?;
    p.at_each_party(Role::ComputeParty, &n - 1, |p| {
        p.compute_times(Value::field() * Value::field(), &m)?;
        let combined = Value::field() * Value::field() - Value::field() - Value::field().sum(&m);
        p.compute(combined.equals(Value::field())?)
    })?;
    // final MAC shares
    p.at_party(Role::ComputeParty, |p| {
        let mac = Value::field().sum(&n - 1) + Value::field() * Value::field();
        p.compute_times(mac, &count)
    })
}

/// Fig. 7. Unauthenticated triples and their check copies.
fn multiply(p: &mut ProtocolBuilder, count: &CostExpr) -> Result<(), BuildError> {
    p.require_no_party("multiply")?;
    let n = p.parties();
    p.for_each(count, |p| {
        p.at_each_party(Role::ComputeParty, &n, |p| {
            p.compute_times(Value::field().sample(), 3)?;
            p.for_each(&n - 1, |p| {
                // a
                pairwise_zk(p)?;
                // b and b hat, masked with e and e hat, giving d and d hat
                p.for_each(2, |p| {
                    p.compute(Value::field().sample())?;
                    p.encrypt_drowning()?;
                    p.compute(Value::field() * Value::ciphertext() - Value::ciphertext())?;
                    p.decrypt(1)
                })
            })?;
            // c and c hat
            p.for_each(2, |p| {
                let product = Value::field() * Value::field()
                    + Value::field().sum(&n - 1)
                    + Value::field().sum(&n - 1);
                p.compute(product)
            })
        })
    })
}

/// Fig. 7, called Authenticate there. Five values per triple and party.
fn authenticate_triples(p: &mut ProtocolBuilder, count: &CostExpr) -> Result<(), BuildError> {
    p.require_no_party("authenticate_triples")?;
    let values = count * 5 * p.parties();
    input(p, values)
}

/// Fig. 7. Checks each triple against its copy, which is sacrificed.
fn sacrifice(p: &mut ProtocolBuilder, count: &CostExpr) -> Result<(), BuildError> {
    p.require_no_party("sacrifice")?;
    p.rand(&Kind::Field.element(), 1)?;
    let n = p.parties();
    p.for_each(count, |p| {
        p.at_each_party(Role::ComputeParty, &n, |p| {
            mul_share(p)?;
            sub_share(p)
        })?;
        open(p)?;
        p.at_each_party(Role::ComputeParty, &n, |p| {
            mul_share(p)?;
            sub_share(p)?;
            mul_share(p)?;
            sub_share(p)
        })?;
        open(p)?;
        p.at_each_party(Role::ComputeParty, &n, |p| {
            p.compute(Value::field().equals(Value::field())?)
        })
    })?;
    spdz::check(p, count * 2, spdz::mac_check)
}

impl ProtocolEncoding for KellerPastroRotaru2017 {
    fn name(&self) -> &'static str {
        "KellerPastroRotaru2017"
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn trace(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        let params = p.params().clone();

        p.in_phase(Phase::Setup, initialize)?;

        p.in_phase(Phase::Offline, |p| {
            multiply(p, &params.multiplications)?;
            authenticate_triples(p, &params.multiplications)?;
            sacrifice(p, &params.multiplications)
        })?;

        p.in_phase(Phase::Online, |p| {
            // all inputs are authenticated online
            input(p, params.inputs.clone())?;
            spdz::linear_operations(p)?;
            p.for_each(&params.multiplications, spdz::beaver_multiplication)?;
            p.for_each(params.outputs(), open)
        })?;

        p.in_phase(Phase::Verification, |p| {
            let opened = &params.multiplications * 2 + params.outputs();
            spdz::check(p, opened, spdz::mac_check)
        })
    }
}
