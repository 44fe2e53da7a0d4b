//! Building blocks shared by many protocol encodings.
use super::ProtocolBuilder;
use crate::aggregate::Role;
use crate::errors::BuildError;
use crate::expr::{CostExpr, Symbol};
use crate::units::{
    self, DECOMMITMENT, DECRYPTION, DISTRIBUTED_DECRYPTION, DROWNING_ENCRYPTION, ENCRYPTION, ZK,
};
use crate::value::Value;

impl ProtocolBuilder {
    /// Joint generation of public randomness.
    ///
    /// Every compute party computes and broadcasts its contribution, then combines the `n`
    /// received contributions and derives `factor` values from them.
    pub fn rand(&mut self, what: &Symbol, factor: impl Into<CostExpr>) -> Result<(), BuildError> {
        self.require_no_party("rand")?;
        let unit = units::public_random(what);
        let parties = self.parties();
        let repetitions = &parties + factor.into();
        self.at_each_party(Role::ComputeParty, parties, |p| {
            p.compute_times(&unit, repetitions)?;
            p.broadcast(&unit)
        })
    }

    pub fn encrypt(&mut self, times: impl Into<CostExpr>) -> Result<(), BuildError> {
        self.compute_times(&*ENCRYPTION, times)
    }

    pub fn encrypt_drowning(&mut self) -> Result<(), BuildError> {
        self.compute(&*DROWNING_ENCRYPTION)
    }

    pub fn decrypt(&mut self, times: impl Into<CostExpr>) -> Result<(), BuildError> {
        self.compute_times(&*DECRYPTION, times)
    }

    /// Computes and publishes `what`, which every other compute party verifies.
    pub fn verifiable(&mut self, what: &Symbol) -> Result<(), BuildError> {
        self.require_party("verifiable", Some(Role::ComputeParty))?;
        self.compute(what)?;
        self.broadcast(what)?;
        let others = self.parties() - 1;
        self.for_each(others, |p| p.compute(units::verification(what)))
    }

    /// A published zero-knowledge proof.
    pub fn zk(&mut self) -> Result<(), BuildError> {
        self.verifiable(&ZK)
    }

    /// Threshold decryption to a public field element.
    pub fn decrypt_distributed(&mut self) -> Result<(), BuildError> {
        self.decrypt_distributed_shares()?;
        let parties = self.parties();
        self.compute(Value::ciphertext_field().sum(parties))?;
        self.compute(Value::ciphertext_field() % Value::field())
    }

    /// Publishes a decryption share without combining the shares.
    pub fn decrypt_distributed_shares(&mut self) -> Result<(), BuildError> {
        self.require_party("decrypt_distributed", Some(Role::ComputeParty))?;
        self.compute(Value::ciphertext_field().sample())?;
        self.decrypt(1)?;
        self.broadcast(Value::ciphertext_field())
    }

    pub fn decrypt_distributed_verifiably(&mut self) -> Result<(), BuildError> {
        self.verifiable(&DISTRIBUTED_DECRYPTION)
    }

    pub fn commit(&mut self, times: impl Into<CostExpr>) -> Result<(), BuildError> {
        self.require_party("commit", Some(Role::ComputeParty))?;
        let times = times.into();
        self.compute_times(Value::commitment(), &times)?;
        self.broadcast_times(Value::commitment(), times)
    }

    /// Opens a commitment, every other compute party recomputes and compares it.
    pub fn decommit(&mut self, times: impl Into<CostExpr>) -> Result<(), BuildError> {
        self.require_party("decommit", Some(Role::ComputeParty))?;
        let times = times.into();
        self.broadcast_times(&*DECOMMITMENT, &times)?;
        let others = self.parties() - 1;
        self.for_each(others, |p| {
            p.compute_times(Value::commitment(), &times)?;
            p.compute_times(Value::commitment().equals(Value::commitment())?, &times)
        })
    }
}

#[cfg(test)]
mod tests {
    use num_traits::Zero;

    use crate::aggregate::{Edge, Role};
    use crate::expr::{CostExpr, Symbol};
    use crate::params::SizeParams;
    use crate::protocol::{Phase, Protocol};

    fn unit(name: &str) -> CostExpr {
        CostExpr::from(Symbol::new(name))
    }

    #[test]
    fn rand_runs_at_every_party() {
        let params = SizeParams::default().parties(3);
        let protocol = Protocol::build("rand", params, |p| {
            p.in_phase(Phase::Offline, |p| p.rand(&Symbol::new("field"), 2))
        })
        .unwrap();
        let offline = protocol.phase(Phase::Offline);
        assert_eq!(
            offline.computation.get(&Role::ComputeParty),
            unit("public_random_field") * 15
        );
        let edge = Edge::new(Role::ComputeParty, Role::BulletinBoard);
        assert_eq!(
            offline.communication.get(&edge),
            unit("public_random_field") * 3
        );
    }

    #[test]
    fn rand_rejects_party_in_scope() {
        let result = Protocol::build("rand", SizeParams::default(), |p| {
            p.in_phase(Phase::Offline, |p| {
                p.at_party(Role::ComputeParty, |p| p.rand(&Symbol::new("field"), 1))
            })
        });
        assert!(result.is_err());
    }

    #[test]
    fn zk_is_verified_by_the_others() {
        let params = SizeParams::default().parties(4);
        let protocol = Protocol::build("zk", params, |p| {
            p.in_phase(Phase::Online, |p| p.at_party(Role::ComputeParty, |p| p.zk()))
        })
        .unwrap();
        let online = protocol.phase(Phase::Online);
        assert_eq!(
            online.computation.get(&Role::ComputeParty),
            unit("ZK") + unit("ZK_verify") * 3
        );
    }

    #[test]
    fn commitments_cost_communication_only() {
        let params = SizeParams::default().parties(2);
        let protocol = Protocol::build("commit", params, |p| {
            p.in_phase(Phase::Online, |p| {
                p.at_party(Role::ComputeParty, |p| {
                    p.commit(2)?;
                    p.decommit(2)
                })
            })
        })
        .unwrap();
        let online = protocol.phase(Phase::Online);
        let edge = Edge::new(Role::ComputeParty, Role::BulletinBoard);
        assert_eq!(
            online.communication.get(&edge),
            unit("commitment") * 2 + unit("decommitment") * 2
        );
        assert_eq!(
            online.computation.get(&Role::ComputeParty),
            unit("commitment_equality") * 2
        );
    }

    #[test]
    fn distributed_decryption() {
        let protocol = Protocol::build("ddec", SizeParams::default().parties(3), |p| {
            p.in_phase(Phase::Online, |p| {
                p.at_party(Role::ComputeParty, |p| p.decrypt_distributed())
            })
        })
        .unwrap();
        let online = protocol.phase(Phase::Online);
        let expected = unit("ciphertext_field_sampling")
            + unit("Dec")
            + unit("ciphertext_field_addition") * 2
            + unit("ciphertext_field_mod_field");
        assert_eq!(online.computation.get(&Role::ComputeParty), expected);
        assert!(online.computation.get(&Role::InputParty).is_zero());
    }
}
