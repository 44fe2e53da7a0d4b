use complexity::aggregate::Role;
use complexity::value::{Kind, Value};
use complexity::{BuildError, CostExpr, Phase, ProtocolBuilder, Zero};

use crate::bos::{private_dec, rand_sh_ctxt, share_dec};
use crate::spdz::masked_input;
use crate::{ProtocolConfig, ProtocolEncoding};

/// Efficient Secure Multiparty Computation with Identifiable Abort.
///
/// Carsten Baum, Emmanuela Orsini, Peter Scholl. <https://eprint.iacr.org/2016/187.pdf>
///
/// Shares are authenticated with pairwise information-theoretic signatures, each party holds a
/// signature share for every other party.
#[derive(Clone, Debug)]
pub struct BaumOrsiniScholl2016 {
    batched_mac_check: bool,
    distinct_setup_phase: bool,
}

impl BaumOrsiniScholl2016 {
    pub fn new(config: &ProtocolConfig) -> Self {
        Self {
            batched_mac_check: config.bos_batched_mac_check,
            distinct_setup_phase: config.bos_distinct_setup_phase,
        }
    }

    fn setup_phase(&self) -> Phase {
        if self.distinct_setup_phase {
            Phase::Setup
        } else {
            Phase::Offline
        }
    }

    /// Fig. 11. Key material for `2n` setup and `n * (M + I)` offline signatures.
    fn setup(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        p.require_no_party("setup")?;
        let setup = self.setup_phase();
        let n = p.parties();
        let params = p.params();
        let w = &n * (&params.multiplications + &params.inputs);

        // key generation is not accounted for
        p.in_phase(Phase::Setup, |_| Ok(()))?;

        p.in_phase(setup, |p| p.for_each(&n * 2, rand_sh_ctxt))?;
        p.in_phase(Phase::Offline, |p| p.for_each(&w, rand_sh_ctxt))?;
        p.at_each_party(Role::ComputeParty, &n, |p| {
            // alpha hat and beta hat
            p.in_phase(setup, |p| {
                p.for_each(&n, |p| p.compute(Value::ciphertext().sum(&n)))
            })?;
            p.in_phase(Phase::Offline, |p| {
                p.for_each_product([&n, &w], |p| p.compute(Value::ciphertext().sum(&n)))
            })?;
            // alpha and beta
            p.in_phase(setup, |p| p.for_each(&n, |p| signature_key(p, &n)))?;
            p.in_phase(Phase::Offline, |p| {
                p.for_each_product([&n, &w], |p| signature_key(p, &n))
            })
        })?;
        // verification keys
        p.in_phase(setup, |p| p.for_each(&n, private_dec))?;
        p.in_phase(Phase::Offline, |p| p.for_each_product([&n, &w], private_dec))
    }

    /// Fig. 12. Signs a shared ciphertext for every party.
    fn auth(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        p.require_no_party("auth")?;
        let n = p.parties();
        p.at_each_party(Role::ComputeParty, &n, |p| {
            p.for_each(&n, |p| {
                p.compute(Value::ciphertext() * Value::ciphertext() + Value::ciphertext())
            })
        })?;
        p.for_each(&n, private_dec)
    }

    /// Fig. 12
    fn triple(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        p.require_no_party("triple")?;
        p.for_each(2, rand_sh_ctxt)?;
        let n = p.parties();
        p.at_each_party(Role::ComputeParty, &n, |p| {
            p.compute(Value::ciphertext().sum(&n) * Value::ciphertext().sum(&n))
        })?;
        share_dec(p, true)?;
        p.for_each_product([n, CostExpr::from(3)], |p| self.auth(p))
    }

    /// Fig. 12
    fn input(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        p.require_no_party("input")?;
        rand_sh_ctxt(p)?;
        let n = p.parties();
        p.for_each(&n, |p| self.auth(p))?;
        p.at_each_party(Role::ComputeParty, &n, |p| {
            p.compute(Value::ciphertext().sum(&n))
        })?;
        private_dec(p)
    }

    /// Fig. 3. Without a batched check every share is opened together with its signature, which
    /// the other parties verify right away.
    fn open(&self, p: &mut ProtocolBuilder, check: Option<bool>) -> Result<(), BuildError> {
        p.require_no_party("open")?;
        let check = check.unwrap_or(!self.batched_mac_check);
        let n = p.parties();
        p.at_each_party(Role::ComputeParty, &n, |p| {
            if check {
                p.broadcast(Value::field())?;
            } else {
                // share and a signature of size n
                p.broadcast_times(Value::field(), &n + 1)?;
                p.for_each(&n - 1, |p| self.verify(p, &CostExpr::from(0), false))?;
            }
            p.compute(Value::field().sum(&n))
        })
    }

    /// Fig. 6
    fn output(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        if !self.batched_mac_check {
            return self.open(p, Some(true));
        }
        p.require_no_party("output")?;
        let n = p.parties();
        p.at_each_party(Role::ComputeParty, &n, |p| {
            p.broadcast(Value::field())?;
            p.compute(Value::field().sum(&n))
        })
    }

    /// Fig. 6. Verifies a random combination of all `count` opened values.
    fn output_check(&self, p: &mut ProtocolBuilder, count: CostExpr) -> Result<(), BuildError> {
        if !self.batched_mac_check {
            // every opening was verified right away
            return Ok(());
        }
        p.require_no_party("output_check")?;
        p.rand(&Kind::Field.element(), &count)?;
        let n = p.parties();
        p.at_each_party(Role::ComputeParty, &n, |p| {
            p.for_each(&n, |p| {
                p.compute_times(Value::field() * Value::field(), &count)?;
                p.compute(Value::field().sum(&count))
            })?;
            p.broadcast_times(Value::field(), &n)?;
            p.for_each(&n - 1, |p| self.verify(p, &count, false))
        })
    }

    /// Sec. 4. Verifies a signature, optionally of a linear combination of `multiplications`
    /// values or with a public constant added.
    fn verify(
        &self,
        p: &mut ProtocolBuilder,
        multiplications: &CostExpr,
        constant: bool,
    ) -> Result<(), BuildError> {
        p.require_any_party("verify")?;
        if !multiplications.is_zero() {
            p.compute_times(Value::field() * Value::field(), multiplications)?;
            p.compute(Value::field().sum(multiplications))?;
        }
        if constant {
            p.compute(Value::field() - Value::field() * Value::field())?;
        }
        p.compute(Value::field() + Value::field() * Value::field())?;
        let n = p.parties();
        p.for_each(&n, |p| p.compute(Value::field() * Value::field()))?;
        p.compute(Value::field().sum(&n))?;
        p.compute(Value::field().equals(Value::field())?)
    }
}

/// Sec. 5. Linear operations act on the share, the `n - 1` keys and the `n` signature parts.
fn add_share(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_any_party("add_share")?;
    let n = p.parties();
    p.for_each(&n - 1, |p| p.compute(Value::field() + Value::field()))?;
    p.compute(Value::field() + Value::field())?;
    p.for_each(&n, |p| p.compute(Value::field() + Value::field()))
}

fn sub_share(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    add_share(p)
}

fn mul_share(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_any_party("mul_share")?;
    let n = p.parties();
    p.for_each(&n - 1, |p| p.compute(Value::field() * Value::field()))?;
    p.compute(Value::field() * Value::field())?;
    p.for_each(&n, |p| p.compute(Value::field() * Value::field()))
}

/// Only the keys change; one party also adds the constant to its share, which is free.
fn add_constant(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_any_party("add_constant")?;
    p.compute(Value::field() - Value::field() * Value::field())
}

/// `alpha = sum_j alpha_hat_j * beta_hat_j` for one key.
fn signature_key(p: &mut ProtocolBuilder, n: &CostExpr) -> Result<(), BuildError> {
    p.for_each(n, |p| p.compute(Value::ciphertext() * Value::ciphertext()))?;
    p.compute(Value::ciphertext().sum(n))
}

impl ProtocolEncoding for BaumOrsiniScholl2016 {
    fn name(&self) -> &'static str {
        "BaumOrsiniScholl2016"
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn trace(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        let params = p.params().clone();
        let n = p.parties();

        self.setup(p)?;

        p.in_phase(Phase::Offline, |p| {
            p.for_each(&params.inputs, |p| self.input(p))?;
            p.for_each(&params.multiplications, |p| self.triple(p))
        })?;

        p.in_phase(Phase::Online, |p| {
            p.for_each(&params.inputs, |p| {
                masked_input(p)?;
                p.at_each_party(Role::ComputeParty, &n, sub_share)
            })?;
            p.at_each_party(Role::ComputeParty, &n, |p| {
                p.for_each(&params.additions, add_share)?;
                p.for_each(&params.scalar_multiplications, mul_share)
            })?;
            p.for_each(&params.multiplications, |p| {
                p.for_each(2, |p| {
                    p.at_each_party(Role::ComputeParty, &n, sub_share)?;
                    self.open(p, None)?;
                    p.at_each_party(Role::ComputeParty, &n, |p| {
                        mul_share(p)?;
                        add_share(p)
                    })
                })?;
                p.at_party(Role::ComputeParty, |p| {
                    p.compute(Value::field() * Value::field())?;
                    add_constant(p)
                })
            })?;
            // private outputs are opened like public ones
            p.for_each(params.outputs(), |p| self.output(p))
        })?;

        p.in_phase(Phase::Verification, |p| {
            let opened = &params.multiplications * 2 + params.outputs();
            self.output_check(p, opened)
        })
    }
}
