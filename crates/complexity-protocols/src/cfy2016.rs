use complexity::aggregate::Role;
use complexity::units::{COMMITMENT_ZK, ZK, ZK_VERIFICATION};
use complexity::value::{Kind, Value};
use complexity::{BuildError, CostExpr, Phase, ProtocolBuilder};

use crate::bos::{rand_sh_ctxt, share_dec};
use crate::{spdz, ProtocolConfig, ProtocolEncoding};

/// Catching MPC Cheaters: Identification and Openability.
///
/// Robert Cunningham, Benjamin Fuller, Sophia Yakoubov. <https://eprint.iacr.org/2016/611.pdf>
///
/// SPDZ shares which are additionally committed to, so that a cheater can be identified. Only the
/// identifiable abort variant is modeled, not the openable one.
#[derive(Clone, Debug)]
pub struct CunninghamFullerYakoubov2016 {
    batched_mac_check: bool,
}

impl CunninghamFullerYakoubov2016 {
    pub fn new(config: &ProtocolConfig) -> Self {
        Self {
            batched_mac_check: config.cfy_batched_mac_check,
        }
    }

    /// Fig. 6. Opens a value with its MAC, checked now or later in the batched check.
    fn open(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        p.require_no_party("open")?;
        let n = p.parties();
        p.at_each_party(Role::ComputeParty, &n, |p| {
            p.broadcast_times(Value::field(), 2)?;
            p.compute(Value::field().sum(&n))
        })?;
        if !self.batched_mac_check {
            mac_check(p)?;
        }
        Ok(())
    }

    /// Sec. 4.2
    fn multiply(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        p.require_no_party("multiply")?;
        p.for_each(2, |p| {
            add_share(p)?;
            self.open(p)?;
            mul_share(p)?;
            add_share(p)
        })?;
        let n = p.parties();
        p.at_each_party(Role::ComputeParty, n, |p| {
            p.compute(Value::field() * Value::field())
        })?;
        add_constant(p)
    }

    fn check(&self, p: &mut ProtocolBuilder, count: CostExpr) -> Result<(), BuildError> {
        if self.batched_mac_check {
            spdz::check(p, count, mac_check)
        } else {
            // every opening was checked right away
            Ok(())
        }
    }
}

/// Fig. 4. Every party proves the encryptions of its share and its randomness.
fn chess_priv_open(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("chess_priv_open")?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, n, |p| {
        p.compute_times(&*ZK, 2)?;
        // the proofs have to be published to be verifiable by all parties
        p.broadcast_times(&*ZK, 2)
    })
}

/// Fig. 4. Opens a value privately towards one compute party.
fn chess_priv_rec(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("chess_priv_rec")?;
    chess_priv_open(p)?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        p.for_each(&n, |p| p.compute(&*ZK_VERIFICATION))
    })?;
    p.at_party(Role::ComputeParty, |p| {
        p.decrypt(&n)?;
        p.compute(Value::field().sum(&n))
    })
}

/// Fig. 5
fn mac_check(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("mac_check")?;
    p.rand(&Kind::Field.element(), 1)?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        // a = r * x and b_i = r * MAC(x)_i
        p.compute_times(Value::field() * Value::field(), 2)?;
        // f_i = b_i - alpha_i * a
        p.compute(Value::field() - Value::field() * Value::field())?;
        p.commit(1)?;
        p.decommit(1)?;
        p.compute(Value::field().sum(&n).equals(Value::field())?)
    })
}

/// Sec. 4.2. Adjusts the share, its randomness, all commitments and the MAC share.
fn add_share(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("add_share")?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        p.compute_times(Value::field() + Value::field(), 2)?;
        p.for_each(&n, |p| p.compute(Value::commitment() + Value::commitment()))?;
        p.compute(Value::field() + Value::field())
    })
}

/// Sec. 4.2
fn add_constant(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("add_constant")?;
    p.at_party(Role::ComputeParty, |p| {
        p.compute(Value::field() + Value::field())
    })?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, n, |p| {
        p.compute(Value::commitment() + Value::field())?;
        p.compute(Value::field() + Value::field() * Value::field())
    })
}

/// Sec. 4.2
fn mul_share(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("mul_share")?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        p.compute_times(Value::field() * Value::field(), 2)?;
        p.for_each(&n, |p| p.compute(Value::commitment() * Value::field()))?;
        p.compute(Value::field() * Value::field())
    })
}

/// Fig. 7
fn input(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("input")?;
    chess_priv_rec(p)?;
    spdz::masked_input(p)?;
    add_constant(p)
}

/// Fig. 10. Encryption of the MAC key.
fn dist_mac_key_gen(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("dist_mac_key_gen")?;
    rand_sh_ctxt(p)?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        p.compute(Value::ciphertext().sum(&n))
    })
}

/// Fig. 11. Turns an encrypted value into committed and authenticated shares.
fn reshare(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("reshare")?;
    share_dec(p, false)?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        p.verifiable(&COMMITMENT_ZK)?;
        // own randomness
        p.compute(Value::field() - Value::field())?;
        // commitments of one party, then of all others
        p.compute(Value::field() - Value::commitment())?;
        p.for_each(&n - 1, |p| {
            p.compute(Value::commitment() - Value::commitment())
        })?;
        // encrypted MAC tag
        p.compute(Value::ciphertext() * Value::ciphertext())
    })?;
    // additive resharing of the tag (Fig. 9)
    share_dec(p, false)
}

/// Fig. 12
fn pick_secret_shared_random(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("pick_secret_shared_random")?;
    rand_sh_ctxt(p)?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        p.compute(Value::ciphertext().sum(&n))
    })?;
    reshare(p)
}

/// Fig. 13
fn mult_secret_shared_values(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("mult_secret_shared_values")?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        p.for_each(2, |p| {
            p.verifiable(&ZK)?;
            p.verifiable(&COMMITMENT_ZK)?;
            p.compute(Value::ciphertext().sum(&n))
        })?;
        p.compute(Value::ciphertext() * Value::ciphertext())
    })?;
    reshare(p)
}

/// Fig. 14
fn pick_secret_shared_beaver_triple(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    pick_secret_shared_random(p)?;
    pick_secret_shared_random(p)?;
    mult_secret_shared_values(p)
}

impl ProtocolEncoding for CunninghamFullerYakoubov2016 {
    fn name(&self) -> &'static str {
        "CunninghamFullerYakoubov2016"
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn trace(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        let params = p.params().clone();

        // Fig. 15, key generation is not accounted for
        p.in_phase(Phase::Setup, dist_mac_key_gen)?;

        p.in_phase(Phase::Offline, |p| {
            p.for_each(&params.inputs, pick_secret_shared_random)?;
            p.for_each(&params.multiplications, pick_secret_shared_beaver_triple)
        })?;

        p.in_phase(Phase::Online, |p| {
            p.for_each(&params.inputs, input)?;
            p.for_each(&params.additions, add_share)?;
            p.for_each(&params.scalar_multiplications, mul_share)?;
            p.for_each(&params.multiplications, |p| self.multiply(p))?;
            // private outputs are opened like public ones
            p.for_each(params.outputs(), |p| self.open(p))
        })?;

        p.in_phase(Phase::Verification, |p| {
            let opened = &params.multiplications * 2 + params.outputs();
            self.check(p, opened)
        })
    }
}
