use complexity::aggregate::Role;
use complexity::value::{Kind, Value};
use complexity::{BuildError, Phase, ProtocolBuilder};

use crate::spdz::{self, add_constant, masked_input, open};
use crate::ProtocolEncoding;

/// Using TopGear in Overdrive: A more efficient ZKPoK for SPDZ.
///
/// Carsten Baum, Daniele Cozzo, Nigel Smart. <https://eprint.iacr.org/2019/035.pdf>
#[derive(Copy, Clone, Debug, Default)]
pub struct BaumCozzoSmart2019;

/// The TopGear zero-knowledge proof of plaintext knowledge, run jointly by all parties.
fn top_gear_zk(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("top_gear_zk")?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        // Samp
        p.compute(Value::field().sample())?;
        p.encrypt(1)?;
        p.commit(1)?;
        p.decommit(1)?;
        // Comm, with a not uniformly random mask
        p.compute(Value::ciphertext_field().sample())?;
        p.encrypt(1)?;
        p.broadcast(Value::ciphertext())
    })?;
    // Chall, a random matrix
    p.rand(&Kind::Field.element(), 1)?;
    p.at_each_party(Role::ComputeParty, &n, |p| {
        // Resp: y + W m and S + W R
        let response = Value::ciphertext_field() + Value::field() * Value::ciphertext_field();
        p.compute_times(response, 1 + 3)?;
        // z and T
        p.broadcast_times(Value::ciphertext_field(), 1 + 3)?;
        // Verify
        p.encrypt(1)?;
        p.compute_times(Value::ciphertext().sum(&n), 3)?;
        p.compute_times(Value::ciphertext_field().sum(&n), 3 + 1)?;
        let check = Value::ciphertext() + Value::field() * Value::ciphertext();
        p.compute(check.equals(Value::ciphertext())?)
    })
}

/// Fig. 3. Encryption of the MAC key.
fn init(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    top_gear_zk(p)?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        p.compute(Value::ciphertext().sum(&n))
    })
}

/// A random value known to one compute party, with MAC shares for all.
fn input(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    // Enc(r_i) and r_i
    top_gear_zk(p)?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        // Enc(r), doubled
        p.compute(Value::ciphertext().sum(&n))?;
        p.compute(Value::ciphertext() + Value::ciphertext())?;
        // encrypted MAC, decrypted to shares
        p.compute(Value::ciphertext() * Value::ciphertext())?;
        p.decrypt_distributed_shares()?;
        p.compute(Value::field() + Value::field())
    })?;
    // r_i to the input party
    p.at_each_party(Role::ComputeParty, &n - 1, |p| {
        p.communicate(Role::ComputeParty, Value::field())
    })?;
    p.at_party(Role::ComputeParty, |p| p.compute(Value::field().sum(&n)))
}

/// Fig. 3
fn triples(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    // a hat, b hat and f hat
    p.for_each(3, top_gear_zk)?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        // a, b and f
        p.compute_times(Value::ciphertext().sum(&n), 3)?;
        p.compute_times(Value::ciphertext() + Value::ciphertext(), 3)?;

        p.compute(Value::ciphertext() * Value::ciphertext())?;
        p.compute(Value::ciphertext() + Value::ciphertext())?;
        p.decrypt_distributed()?;
        // f = 2 f hat, then delta - f at one party and -f at the others
        p.compute(Value::field() + Value::field())?;
        p.compute(Value::field() - Value::field())?;
        p.compute(Value::field() - Value::ciphertext())?;
        // encrypted MACs of a, b and c, decrypted to shares
        p.compute_times(Value::ciphertext() * Value::ciphertext(), 3)?;
        p.for_each(3, |p| p.decrypt_distributed_shares())?;
        // shares of a and b are doubled
        p.compute_times(Value::field() + Value::field(), 2)
    })
}

impl ProtocolEncoding for BaumCozzoSmart2019 {
    fn name(&self) -> &'static str {
        "BaumCozzoSmart2019"
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn trace(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        let params = p.params().clone();

        p.in_phase(Phase::Setup, init)?;

        // no sacrificing step is described
        p.in_phase(Phase::Offline, |p| {
            p.for_each(&params.multiplications, triples)?;
            p.for_each(&params.inputs, input)
        })?;

        p.in_phase(Phase::Online, |p| {
            p.for_each(&params.inputs, |p| {
                masked_input(p)?;
                p.at_party(Role::ComputeParty, add_constant)
            })?;
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
