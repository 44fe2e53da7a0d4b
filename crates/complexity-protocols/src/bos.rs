//! Threshold-encryption sub-procedures of Baum, Orsini and Scholl 2016 (Fig. 10).
//!
//! Cunningham et al. 2016 generate their preprocessing material the same way, so these are
//! shared.
use complexity::aggregate::Role;
use complexity::value::Value;
use complexity::{BuildError, ProtocolBuilder};

/// Every compute party encrypts a fresh random share and proves knowledge of it.
pub fn rand_sh_ctxt(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("rand_sh_ctxt")?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, n, |p| {
        p.compute(Value::field().sample())?;
        p.zk()
    })
}

/// Re-shares an encrypted value: it is masked with fresh random shares and decrypted.
///
/// With `new_ctxt` every party also derives a fresh encryption of the value.
pub fn share_dec(p: &mut ProtocolBuilder, new_ctxt: bool) -> Result<(), BuildError> {
    p.require_no_party("share_dec")?;
    rand_sh_ctxt(p)?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        // n masks and the input ciphertext
        p.compute(Value::ciphertext().sum(&n + 1))?;
        p.decrypt_distributed_verifiably()?;
        p.compute(Value::field() - Value::field())?;
        if new_ctxt {
            p.compute(Value::ciphertext() - Value::field())?;
        }
        Ok(())
    })
}

/// Decrypts a ciphertext towards a single compute party.
pub fn private_dec(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("private_dec")?;
    p.at_party(Role::ComputeParty, |p| {
        p.compute(Value::field().sample())?;
        p.zk()
    })?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, n, |p| {
        p.compute(Value::ciphertext() + Value::ciphertext())?;
        p.decrypt_distributed_verifiably()
    })?;
    p.at_party(Role::ComputeParty, |p| {
        p.compute(Value::field() - Value::field())
    })
}

#[cfg(test)]
mod tests {
    use complexity::params::SizeParams;
    use complexity::private_test_utils::unit;
    use complexity::{Phase, Protocol};

    use super::*;

    #[test]
    fn share_dec_derives_ciphertext_on_request() {
        let build = |new_ctxt| {
            Protocol::build("bos", SizeParams::default().parties(2), |p| {
                p.in_phase(Phase::Offline, |p| share_dec(p, new_ctxt))
            })
            .unwrap()
        };
        let plain = build(false).phase(Phase::Offline).computation.get(&Role::ComputeParty);
        let fresh = build(true).phase(Phase::Offline).computation.get(&Role::ComputeParty);
        assert_eq!(fresh - plain, unit("ciphertext_field_addition") * 2);
    }

    #[test]
    fn private_dec_proves_once() {
        let protocol = Protocol::build("bos", SizeParams::default().parties(4), |p| {
            p.in_phase(Phase::Offline, private_dec)
        })
        .unwrap();
        let computation = protocol.phase(Phase::Offline).computation.get(&Role::ComputeParty);
        let zk_terms: Vec<_> = computation
            .terms()
            .filter(|(monomial, _)| monomial.to_string() == "ZK")
            .map(|(_, coefficient)| coefficient)
            .collect();
        assert_eq!(zk_terms, vec![1]);
    }
}
