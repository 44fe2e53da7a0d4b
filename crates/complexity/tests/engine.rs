use complexity::aggregate::{Edge, Role};
use complexity::errors::BuildError;
use complexity::expr::{Condition, CostExpr};
use complexity::params::SizeParams;
use complexity::private_test_utils::{build, init_tracing, unit};
use complexity::protocol::{Phase, Protocol, ProtocolBuilder, Scope};
use complexity::value::{combination, Kind, Operation, Value};
use complexity::Zero;
use proptest::prelude::*;

#[test]
fn two_party_field_addition() -> anyhow::Result<()> {
    let _guard = init_tracing();
    let protocol = build("addition", SizeParams::default().parties(2), |p| {
        p.in_phase(Phase::Online, |p| {
            p.at_party(Role::ComputeParty, |p| {
                p.compute(Value::field() + Value::field())
            })
        })
    })?;
    let online = protocol.phase(Phase::Online);
    let summary = online.computation.summary();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[&Role::ComputeParty], unit("field_addition"));
    assert!(online.communication.total().is_zero());
    Ok(())
}

#[test]
fn repeated_broadcast() -> anyhow::Result<()> {
    let _guard = init_tracing();
    let protocol = build("broadcast", SizeParams::default(), |p| {
        p.in_phase(Phase::Online, |p| {
            p.at_party(Role::InputParty, |p| {
                p.for_each(3, |p| p.broadcast(Value::field()))
            })
        })
    })?;
    let edge = Edge::new(Role::InputParty, Role::BulletinBoard);
    let communication = &protocol.phase(Phase::Online).communication;
    assert_eq!(communication.get(&edge), unit("field") * 3);
    assert_eq!(communication.summary().len(), 1);
    Ok(())
}

fn nested(outer: CostExpr, inner: CostExpr) -> anyhow::Result<CostExpr> {
    let protocol = build("nested", SizeParams::default(), |p| {
        p.in_phase(Phase::Offline, |p| {
            p.at_party(Role::ComputeParty, |p| {
                p.for_each(outer, |p| p.for_each(inner, |p| p.compute(unit("x"))))
            })
        })
    })?;
    Ok(protocol.phase(Phase::Offline).computation.get(&Role::ComputeParty))
}

#[test]
fn nested_factors_commute() -> anyhow::Result<()> {
    let params = SizeParams::default();
    let a = params.inputs.clone();
    let b = params.parties.clone() - 1;
    let expected = &a * &b * unit("x");
    assert_eq!(nested(a.clone(), b.clone())?, expected);
    assert_eq!(nested(b, a)?, expected);
    Ok(())
}

#[test]
fn each_party_and_product_factors() -> anyhow::Result<()> {
    let params = SizeParams::default();
    let (n, m, i) = (
        params.parties.clone(),
        params.multiplications.clone(),
        params.inputs.clone(),
    );
    let protocol = build("product", params, |p| {
        p.in_phase(Phase::Online, |p| {
            let n = p.parties();
            p.at_each_party(Role::ComputeParty, n, |p| {
                let counts = [p.params().multiplications.clone(), p.params().inputs.clone()];
                p.for_each_product(counts, |p| p.compute(unit("y")))
            })
        })
    })?;
    let computation = &protocol.phase(Phase::Online).computation;
    assert_eq!(computation.get(&Role::ComputeParty), n * m * i * unit("y"));
    Ok(())
}

#[test]
fn scope_reuse_fails_and_fresh_scope_succeeds() {
    let mut builder = ProtocolBuilder::new("reuse", SizeParams::default());
    let online = Scope::phase(Phase::Online);
    drop(online.enter(&mut builder).unwrap());
    assert!(matches!(
        online.enter(&mut builder),
        Err(BuildError::ScopeReused(_))
    ));
    let fresh = Scope::phase(Phase::Online);
    let guard = fresh.enter(&mut builder).unwrap();
    assert_eq!(guard.phase(), Some(Phase::Online));
}

#[test]
fn state_is_restored_after_errors() {
    let mut builder = ProtocolBuilder::new("restore", SizeParams::default());
    let result = builder.in_phase(Phase::Online, |p| {
        p.at_party(Role::ComputeParty, |p| {
            p.for_each(5, |p| p.compute(Value::field().try_add(Value::commitment())?))
        })
    });
    assert!(result.is_ok());
    let result = builder.in_phase(Phase::Online, |p| {
        p.at_party(Role::ComputeParty, |p| {
            p.for_each(5, |p| p.compute(Value::boolean().try_add(Value::field())?))
        })
    });
    assert_eq!(
        result,
        Err(BuildError::IncompatibleKinds {
            operation: Operation::Addition,
            left: Kind::Boolean,
            right: Kind::Field,
        })
    );
    assert_eq!(builder.phase(), None);
    assert_eq!(builder.party(), None);
    assert_eq!(builder.factor(), &CostExpr::from(1));
}

#[test]
fn failed_construction_yields_no_protocol() {
    let result = Protocol::build("broken", SizeParams::default(), |p| {
        p.in_phase(Phase::Setup, |p| p.compute(unit("x")))
    });
    assert_eq!(
        result.unwrap_err(),
        BuildError::MissingParty {
            operation: "compute"
        }
    );
}

#[test]
fn conditional_branches_add_up() -> anyhow::Result<()> {
    let protocol = build("branches", SizeParams::default(), |p| {
        let condition = Condition::positive(p.params().inputs.clone());
        p.in_phase(Phase::Online, |p| {
            p.at_party(Role::ComputeParty, |p| {
                p.if_conditionally(&condition, |p| p.compute(unit("x")))?;
                p.else_conditionally(&condition, |p| p.compute(unit("x")))
            })
        })
    })?;
    let computation = &protocol.phase(Phase::Online).computation;
    assert_eq!(computation.get(&Role::ComputeParty), unit("x"));
    Ok(())
}

fn expected_result(operation: Operation, left: Kind, right: Kind) -> Option<Kind> {
    use Kind::*;
    let symmetric = |a: Kind, b: Kind| (left, right) == (a, b) || (left, right) == (b, a);
    match operation {
        Operation::Equality => (left == right).then_some(Boolean),
        Operation::Modulo => (left == CiphertextField && right == Field).then_some(Field),
        Operation::Addition | Operation::Subtraction => [
            (Field, Field, Field),
            (CiphertextField, CiphertextField, CiphertextField),
            (CiphertextField, Field, CiphertextField),
            (Ciphertext, Ciphertext, Ciphertext),
            (Ciphertext, Field, Ciphertext),
            (Commitment, Commitment, Commitment),
            (Commitment, Field, Commitment),
        ]
        .into_iter()
        .find(|&(a, b, _)| symmetric(a, b))
        .map(|(_, _, result)| result),
        Operation::Multiplication => [
            (Field, Field, Field),
            (CiphertextField, CiphertextField, CiphertextField),
            (CiphertextField, Field, CiphertextField),
            (Ciphertext, Ciphertext, Ciphertext),
            (Ciphertext, Field, Ciphertext),
            (Commitment, Field, Commitment),
        ]
        .into_iter()
        .find(|&(a, b, _)| symmetric(a, b))
        .map(|(_, _, result)| result),
    }
}

#[test]
fn kind_table_is_exhaustive() {
    let operations = [
        Operation::Addition,
        Operation::Subtraction,
        Operation::Multiplication,
        Operation::Modulo,
        Operation::Equality,
    ];
    for operation in operations {
        for left in Kind::ALL {
            for right in Kind::ALL {
                let expected = expected_result(operation, left, right);
                let actual = combination(operation, left, right).map(|c| c.result);
                assert_eq!(actual, expected, "{operation} of {left} and {right}");
                let combined = Value::combine(operation, &Value::new(left), &Value::new(right));
                assert_eq!(combined.is_ok(), expected.is_some());
            }
        }
    }
}

#[test]
fn scalars_apply_to_every_kind() {
    for kind in Kind::ALL {
        let scaled = Value::new(kind) * 4;
        assert_eq!(scaled.kind(), kind);
        assert_eq!(scaled.size(), CostExpr::from(kind.element()) * 4);
    }
}

#[derive(Clone, Debug)]
enum Call {
    Compute(Role, u8),
    Send(Role, Role, u8),
}

fn call() -> impl Strategy<Value = Call> {
    let role = prop_oneof![
        Just(Role::ComputeParty),
        Just(Role::InputParty),
        Just(Role::OutputParty),
    ];
    let destination = prop_oneof![
        Just(Role::ComputeParty),
        Just(Role::OutputParty),
        Just(Role::BulletinBoard),
    ];
    prop_oneof![
        (role.clone(), 0..4u8).prop_map(|(role, unit)| Call::Compute(role, unit)),
        (role, destination, 0..4u8).prop_map(|(from, to, unit)| Call::Send(from, to, unit)),
    ]
}

fn replay(calls: &[Call]) -> Protocol {
    Protocol::build("replay", SizeParams::default(), |p| {
        p.in_phase(Phase::Online, |p| {
            for call in calls {
                match call {
                    Call::Compute(role, idx) => {
                        p.at_party(*role, |p| p.compute(unit(&format!("u{idx}"))))?
                    }
                    Call::Send(from, to, idx) => p.at_party(*from, |p| {
                        p.communicate(*to, unit(&format!("u{idx}")) * p.parties())
                    })?,
                }
            }
            Ok(())
        })
    })
    .unwrap()
}

proptest! {
    #[test]
    fn merge_is_order_independent(
        (calls, shuffled) in prop::collection::vec(call(), 0..24)
            .prop_flat_map(|calls| (Just(calls.clone()), Just(calls).prop_shuffle()))
    ) {
        let original = replay(&calls);
        let reordered = replay(&shuffled);
        let (a, b) = (original.phase(Phase::Online), reordered.phase(Phase::Online));
        prop_assert_eq!(a.communication.summary(), b.communication.summary());
        prop_assert_eq!(a.computation.summary(), b.computation.summary());
        prop_assert_eq!(a.communication.total(), b.communication.total());
    }
}

#[test]
fn large_concrete_sizes_stay_exact() -> anyhow::Result<()> {
    let params = SizeParams::default()
        .parties(1_000_000i64)
        .multiplications(10_000_000_000_000i64);
    let protocol = build("large", params, |p| {
        p.in_phase(Phase::Offline, |p| {
            let (n, m) = (p.parties(), p.params().multiplications.clone());
            p.at_each_party(Role::ComputeParty, &n, |p| {
                p.for_each_product([&m, &n], |p| p.compute(Value::field() * Value::field()))
            })
        })
    })?;
    let expected = CostExpr::constant(10i128.pow(25)) * unit("field_multiplication");
    let offline = protocol.phase(Phase::Offline);
    assert_eq!(offline.computation.get(&Role::ComputeParty), expected);
    Ok(())
}

#[test]
fn overflowing_totals_fail_the_build() {
    let params = SizeParams::default().parties(i64::MAX);
    let err = Protocol::build("overflow", params, |p| {
        p.in_phase(Phase::Online, |p| {
            let n = p.parties();
            p.at_each_party(Role::ComputeParty, &n, |p| {
                p.for_each(&n, |p| p.compute(unit("x")))?;
                p.for_each(&n, |p| p.compute(unit("x")))?;
                p.for_each(&n, |p| p.compute(unit("x")))
            })
        })
    })
    .unwrap_err();
    assert_eq!(err, BuildError::CoefficientOverflow { operation: "record" });
}
