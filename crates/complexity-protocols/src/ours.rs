use complexity::aggregate::Role;
use complexity::expr::Condition;
use complexity::protocol::Scope;
use complexity::units::{PRF_EVALUATION, PUBLIC_KEY_ZK};
use complexity::value::Value;
use complexity::{BuildError, CostExpr, Phase, ProtocolBuilder};

use crate::{ProtocolConfig, ProtocolEncoding};

/// MPC with identifiable abort and publicly verifiable outputs.
///
/// Shares are authenticated with MACs under keys derived from committed PRF keys. Everything
/// is checked in a verification phase after the online phase, at the end of which the keys of
/// the encrypted outputs are released, if outputs are delayed.
#[derive(Clone, Debug)]
pub struct OurProtocol {
    input_party: Role,
    output_party: Role,
    delayed_output: bool,
}

impl OurProtocol {
    pub fn new(config: &ProtocolConfig) -> Self {
        Self {
            input_party: config.input_party,
            output_party: config.output_party,
            delayed_output: config.delayed_output,
        }
    }

    /// Masks for the inputs. Input parties which are not compute parties only get
    /// authenticated shares of their mask.
    fn prepare_input(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        p.require_no_party("prepare_input")?;
        let n = p.parties();
        if self.input_party == Role::ComputeParty {
            p.at_party(Role::ComputeParty, |p| {
                p.for_each(&n, |p| {
                    p.compute(Value::field().sample())?;
                    p.zk()
                })?;
                p.compute(Value::field().sum(&n))
            })?;
            p.at_each_party(Role::ComputeParty, &n, authenticate)
        } else {
            p.at_each_party(Role::ComputeParty, &n, |p| {
                p.compute(Value::field().sample())?;
                p.zk()?;
                authenticate(p)
            })
        }
    }

    fn input(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        p.require_no_party("input")?;
        if self.input_party != Role::ComputeParty {
            open_to(p, self.input_party, false)?;
        }
        p.at_party(self.input_party, |p| {
            p.compute(Value::field() - Value::field())?;
            p.broadcast(Value::field())
        })?;
        // one party adds the mask to its share
        p.at_party(Role::ComputeParty, |p| {
            p.compute(Value::field() + Value::field())
        })
    }

    fn verify_input(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        verify_open_to(p, self.input_party)
    }

    fn public_output(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        p.require_no_party("public_output")?;
        let non_linear = p.params().is_non_linear();
        // open x - r for non-linear circuits
        p.if_conditionally(&non_linear, mask_output)?;
        open(p, false)?;
        if self.delayed_output {
            p.if_conditionally(&non_linear, |p| open(p, true))?;
        }
        Ok(())
    }

    fn finish_public_output(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        p.require_no_party("finish_public_output")?;
        let non_linear = p.params().is_non_linear();
        verify_open(p)?;
        p.if_conditionally(&non_linear, |p| {
            if self.delayed_output {
                finish_open(p, true)?;
            } else {
                open(p, false)?;
            }
            verify_open(p)?;
            let n = p.parties();
            p.at_each_party(Role::ComputeParty, n, |p| {
                p.compute(Value::field() + Value::field())
            })
        })
    }

    fn private_output(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        p.require_no_party("private_output")?;
        let non_linear = p.params().is_non_linear();
        p.if_conditionally(&non_linear, |p| {
            mask_output(p)?;
            open(p, false)?;
            if self.delayed_output {
                open_to(p, self.output_party, true)?;
            }
            Ok(())
        })?;
        // linear circuits are opened directly
        p.else_conditionally(&non_linear, |p| open_to(p, self.output_party, false))
    }

    fn finish_private_output(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        p.require_no_party("finish_private_output")?;
        let non_linear = p.params().is_non_linear();
        p.if_conditionally(&non_linear, |p| {
            verify_open(p)?;
            if self.delayed_output {
                finish_open_to(p, self.output_party, true)
            } else {
                open_to(p, self.output_party, false)
            }
        })?;
        verify_open_to(p, self.output_party)?;
        p.if_conditionally(&non_linear, |p| {
            p.at_party(self.output_party, |p| {
                p.compute(Value::field() + Value::field())
            })
        })
    }

    fn setup(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        let non_linear = p.params().is_non_linear();
        let n = p.parties();
        let scope = Scope::combined([
            Scope::phase(Phase::Setup),
            Scope::party(Role::ComputeParty),
            Scope::factor(n),
        ]);
        p.scoped(scope, |p| {
            // MAC key share, PRF key and PRNG key
            p.compute_times(Value::field().sample(), 3)?;
            p.commit(3)?;
            p.if_conditionally(&non_linear, |p| {
                p.compute_times(Value::field().sample(), 3)?;
                p.commit(3)
            })
        })
    }

    fn offline(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        let params = p.params().clone();
        p.for_each(&params.inputs, |p| self.prepare_input(p))?;
        p.if_conditionally(&params.is_non_linear(), |p| {
            p.for_each(&params.multiplications, prepare_multiplication)?;
            p.for_each(params.outputs(), prepare_output)
        })
    }

    fn online(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        let params = p.params().clone();
        let n = p.parties();
        p.for_each(&params.inputs, |p| self.input(p))?;
        p.at_each_party(Role::ComputeParty, &n, |p| {
            // both components of the authenticated share
            p.for_each(&params.additions, |p| {
                p.compute_times(Value::field() + Value::field(), 2)
            })?;
            p.for_each(&params.scalar_multiplications, |p| {
                p.compute_times(Value::field() * Value::field(), 2)
            })
        })?;
        p.for_each(&params.multiplications, multiply)?;
        p.for_each(&params.private_outputs, |p| self.private_output(p))?;
        p.for_each(&params.public_outputs, |p| self.public_output(p))
    }

    fn verification(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        let params = p.params().clone();
        let n = p.parties();
        let non_linear = params.is_non_linear();

        // setup keys
        p.at_each_party(Role::ComputeParty, &n, |p| p.decommit(3))?;

        // offline phase
        p.at_each_party(Role::ComputeParty, &n, |p| {
            p.for_each(&params.inputs, verify_authenticate)?;
            p.if_conditionally(&non_linear, |p| {
                p.for_each_product(
                    [&params.multiplications, &CostExpr::from(3)],
                    verify_authenticate,
                )?;
                p.for_each(params.outputs(), verify_authenticate)
            })
        })?;

        p.for_each(&params.inputs, |p| self.verify_input(p))?;
        // tag components of the linear operations
        p.at_each_party(Role::ComputeParty, &n, |p| {
            p.for_each(&n - 1, |p| {
                p.for_each(&params.additions, |p| {
                    p.compute(Value::field() + Value::field())
                })?;
                p.for_each(&params.scalar_multiplications, |p| {
                    p.compute(Value::field() * Value::field())
                })
            })
        })?;
        p.for_each(&params.multiplications, verify_multiply)?;

        if self.delayed_output {
            // decryption keys of the outputs
            let public = Condition::positive(&params.public_outputs);
            p.if_conditionally(&public, |p| {
                p.at_each_party(Role::ComputeParty, &n, |p| p.broadcast(Value::field()))
            })?;
            let private = Condition::positive(&params.private_outputs);
            p.if_conditionally(&private, |p| {
                p.at_each_party(Role::ComputeParty, &n, |p| {
                    p.communicate(self.output_party, Value::field())
                })
            })?;
        }

        // outputs, with the keys of the second setup
        p.if_conditionally(&non_linear, |p| {
            p.at_each_party(Role::ComputeParty, &n, |p| {
                p.decommit(3)?;
                p.for_each(params.outputs(), verify_authenticate)
            })
        })?;
        p.for_each(&params.private_outputs, |p| self.finish_private_output(p))?;
        p.for_each(&params.public_outputs, |p| self.finish_public_output(p))?;

        // everybody publishes whether it accepts
        p.at_each_party(Role::ComputeParty, &n, |p| p.broadcast(Value::boolean()))?;
        p.at_each_party(Role::InputParty, &params.input_parties, |p| {
            p.broadcast(Value::boolean())
        })?;
        p.at_each_party(Role::OutputParty, &params.output_parties, |p| {
            p.broadcast(Value::boolean())
        })
    }
}

fn prf(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.compute(&*PRF_EVALUATION)
}

/// Checks the MAC of an opened value.
///
/// Compute parties already derived the global PRF value in the verification of the offline
/// phase, other recipients evaluate all `n` PRFs.
fn mac_check(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_any_party("mac_check")?;
    if p.party() != Some(Role::ComputeParty) {
        let n = p.parties();
        p.for_each(&n, prf)?;
        p.compute(Value::field().sum(&n))?;
    }
    p.compute(Value::field() * Value::field() + Value::field())?;
    p.compute(Value::field().equals(Value::field())?)
}

/// Authenticates a share of the current compute party under the keys of all others.
fn authenticate(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_party("authenticate", Some(Role::ComputeParty))?;
    let n = p.parties();
    p.for_each(&n, prf)?;
    p.for_each(&n - 1, |p| {
        p.encrypt_drowning()?;
        p.compute(Value::field() * Value::ciphertext() + Value::ciphertext())?;
        p.communicate(Role::ComputeParty, Value::ciphertext())?;
        p.decrypt(1)
    })?;
    p.compute(Value::field() * Value::field() + Value::field())?;
    p.compute(Value::field().sum(&n))
}

/// Recomputes the messages of [`authenticate`] from the opened keys.
fn verify_authenticate(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_party("verify_authenticate", Some(Role::ComputeParty))?;
    let n = p.parties();
    p.for_each(&n - 1, |p| {
        prf(p)?;
        p.encrypt_drowning()?;
        p.compute(Value::field() * Value::ciphertext() + Value::ciphertext())?;
        p.compute(Value::ciphertext().equals(Value::ciphertext())?)
    })?;
    // the global PRF value used later in the MAC checks
    p.compute(Value::field().sum(&n))
}

/// Publishes both components of the authenticated shares, optionally encrypted.
fn open(p: &mut ProtocolBuilder, encrypted: bool) -> Result<(), BuildError> {
    p.require_no_party("open")?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        if encrypted {
            p.encrypt(2)?;
            p.broadcast_times(Value::ciphertext(), 2)
        } else {
            p.broadcast_times(Value::field(), 2)?;
            p.compute(Value::field().sum(&n))
        }
    })
}

/// Decrypts an encrypted opening once the keys are released.
fn finish_open(p: &mut ProtocolBuilder, encrypted: bool) -> Result<(), BuildError> {
    p.require_no_party("finish_open")?;
    if !encrypted {
        return Ok(());
    }
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        p.decrypt(&n * 2)?;
        p.compute(Value::field().sum(&n))
    })
}

/// Every compute party checks the MACs of the shares of all others.
fn verify_open(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("verify_open")?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| p.for_each(&n - 1, mac_check))
}

fn open_to(p: &mut ProtocolBuilder, recipient: Role, encrypted: bool) -> Result<(), BuildError> {
    p.require_no_party("open_to")?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        if encrypted {
            p.encrypt(2)?;
            p.communicate_times(recipient, Value::ciphertext(), 2)
        } else {
            p.communicate_times(recipient, Value::field(), 2)
        }
    })?;
    if encrypted {
        return Ok(());
    }
    p.at_party(recipient, |p| p.compute(Value::field().sum(&n)))
}

fn finish_open_to(
    p: &mut ProtocolBuilder,
    recipient: Role,
    encrypted: bool,
) -> Result<(), BuildError> {
    p.require_no_party("finish_open_to")?;
    if !encrypted {
        return Ok(());
    }
    let n = p.parties();
    p.at_party(recipient, |p| {
        p.decrypt(&n * 2)?;
        p.compute(Value::field().sum(&n))
    })
}

fn verify_open_to(p: &mut ProtocolBuilder, recipient: Role) -> Result<(), BuildError> {
    p.require_no_party("verify_open_to")?;
    let n = p.parties();
    p.at_party(recipient, |p| p.for_each(&n, mac_check))
}

/// Beaver triples: three random shares, `c = a * b` by distributed decryption.
fn prepare_multiplication(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("prepare_multiplication")?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, &n, |p| {
        p.for_each(3, |p| {
            p.compute(Value::field().sample())?;
            p.verifiable(&PUBLIC_KEY_ZK)
        })?;
        p.compute(Value::ciphertext() * Value::ciphertext() - Value::ciphertext())?;
        p.decrypt_distributed_verifiably()?;
        // all but one party
        p.compute(Value::field() + Value::field())?;
        p.for_each(&n, |p| p.compute(Value::ciphertext() + Value::ciphertext()))?;
        p.for_each(3, authenticate)
    })
}

/// Masks for the outputs of non-linear circuits.
fn prepare_output(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("prepare_output")?;
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, n, |p| {
        p.compute(Value::field().sample())?;
        p.zk()?;
        p.for_each(2, authenticate)
    })
}

/// `x - r` on both components of the authenticated share.
fn mask_output(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    let n = p.parties();
    p.at_each_party(Role::ComputeParty, n, |p| {
        p.compute_times(Value::field() - Value::field(), 2)
    })
}

/// Beaver multiplication on both components of the authenticated shares.
fn multiply(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("multiply")?;
    let n = p.parties();
    // a and b of the triple
    p.for_each(2, |p| {
        p.at_each_party(Role::ComputeParty, &n, |p| {
            p.compute_times(Value::field() - Value::field(), 2)
        })?;
        open(p, false)
    })?;
    p.at_each_party(Role::ComputeParty, &n, |p| {
        // [[a]] * v and u * [[b]], added to [[c]]
        p.compute_times(Value::field() * Value::field(), 4)?;
        p.compute_times(Value::field() + Value::field(), 4)
    })?;
    // one party adds u * v
    p.at_party(Role::ComputeParty, |p| {
        p.compute(Value::field() * Value::field())?;
        p.compute(Value::field() + Value::field())
    })
}

/// Recomputes the tag components of [`multiply`].
fn verify_multiply(p: &mut ProtocolBuilder) -> Result<(), BuildError> {
    p.require_no_party("verify_multiply")?;
    let n = p.parties();
    p.for_each(2, |p| {
        p.at_each_party(Role::ComputeParty, &n, |p| {
            p.for_each(&n - 1, |p| p.compute(Value::field() - Value::field()))
        })?;
        verify_open(p)
    })?;
    p.at_each_party(Role::ComputeParty, &n, |p| {
        p.for_each(&n - 1, |p| {
            p.compute_times(Value::field() * Value::field(), 2)?;
            p.compute_times(Value::field() + Value::field(), 2)
        })
    })?;
    // one party already added u * v
    p.at_each_party(Role::ComputeParty, &n - 1, |p| {
        p.compute(Value::field() * Value::field())?;
        p.compute(Value::field() + Value::field())
    })
}

impl ProtocolEncoding for OurProtocol {
    fn name(&self) -> &'static str {
        "OurProtocol"
    }

    #[tracing::instrument(level = "debug", skip_all, fields(delayed_output = self.delayed_output))]
    fn trace(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError> {
        self.setup(p)?;
        p.in_phase(Phase::Offline, |p| self.offline(p))?;
        p.in_phase(Phase::Online, |p| self.online(p))?;
        p.in_phase(Phase::Verification, |p| self.verification(p))
    }
}
