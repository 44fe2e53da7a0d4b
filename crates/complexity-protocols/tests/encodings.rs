use anyhow::{Context, Result};
use complexity::aggregate::{Edge, Role};
use complexity::params::{
    size_symbols, SizeParams, COMPUTE_PARTY_COUNT, INPUT_COUNT, MULTIPLICATION_COUNT,
};
use complexity::private_test_utils::{init_tracing, unit};
use complexity::reduce::{reduce, ReduceMode};
use complexity::render::{Collapse, Table};
use complexity::{CostExpr, Phase, Zero};
use complexity_protocols::{build_all, encoding, ProtocolConfig, ProtocolEncoding, PROTOCOLS};

fn all_encodings(config: &ProtocolConfig) -> Result<Vec<Box<dyn ProtocolEncoding>>> {
    PROTOCOLS
        .iter()
        .map(|name| encoding(name, config).context("looking up encoding"))
        .collect()
}

#[test]
fn every_encoding_builds_symbolically() -> Result<()> {
    let _guard = init_tracing();
    let encodings = all_encodings(&ProtocolConfig::default())?;
    let protocols = build_all(&encodings, &SizeParams::default())?;
    for (protocol, name) in protocols.iter().zip(PROTOCOLS) {
        assert_eq!(protocol.name(), name);
        for phase in [Phase::Offline, Phase::Online] {
            assert!(protocol.has_phase(phase), "{name} has no {phase} phase");
        }
        let online = protocol.phase(Phase::Online);
        assert!(
            !online.computation.get(&Role::ComputeParty).is_zero(),
            "{name} computes nothing online"
        );
    }
    Ok(())
}

#[test]
fn every_encoding_builds_concretely() -> Result<()> {
    let _guard = init_tracing();
    let params = SizeParams::default()
        .parties(3)
        .input_parties(2)
        .output_parties(1)
        .inputs(4)
        .additions(10)
        .scalar_multiplications(5)
        .multiplications(8)
        .public_outputs(1)
        .private_outputs(1);
    let protocols = build_all(&all_encodings(&ProtocolConfig::default())?, &params)?;
    for protocol in &protocols {
        let total = protocol.total();
        // only unit costs remain
        let size_symbols = size_symbols();
        let leftover: Vec<_> = total
            .computation
            .total()
            .symbols()
            .into_iter()
            .filter(|symbol| size_symbols.contains(symbol))
            .collect();
        assert!(leftover.is_empty(), "{}: {leftover:?}", protocol.name());
    }
    Ok(())
}

#[test]
fn field_additions_scale_with_additions() -> Result<()> {
    let _guard = init_tracing();
    let encodings = all_encodings(&ProtocolConfig::default())?;
    let few = build_all(&encodings, &SizeParams::default().parties(2).additions(1))?;
    let many = build_all(&encodings, &SizeParams::default().parties(2).additions(2))?;
    for (few, many) in few.iter().zip(&many) {
        let delta = many.phase(Phase::Online).computation.get(&Role::ComputeParty)
            - few.phase(Phase::Online).computation.get(&Role::ComputeParty);
        assert!(!delta.is_zero(), "{} ignores additions", few.name());
        assert!(delta
            .symbols()
            .iter()
            .all(|symbol| symbol.name().ends_with("addition")));
    }
    Ok(())
}

#[test]
fn baum_orsini_scholl_setup_can_be_merged() -> Result<()> {
    let merged = ProtocolConfig::default().bos_distinct_setup_phase(false);
    let protocol = encoding("BaumOrsiniScholl2016", &merged)?.build(SizeParams::default())?;
    assert!(protocol.has_phase(Phase::Setup));
    assert!(protocol.phase(Phase::Setup).is_empty());

    let distinct = encoding("BaumOrsiniScholl2016", &ProtocolConfig::default())?
        .build(SizeParams::default())?;
    assert!(!distinct.phase(Phase::Setup).is_empty());
    Ok(())
}

#[test]
fn unbatched_mac_checks_verify_online() -> Result<()> {
    let unbatched = ProtocolConfig::default()
        .bos_batched_mac_check(false)
        .cfy_batched_mac_check(false);
    for name in ["BaumOrsiniScholl2016", "CunninghamFullerYakoubov2016"] {
        let protocol = encoding(name, &unbatched)?.build(SizeParams::default())?;
        assert!(
            protocol.phase(Phase::Verification).is_empty(),
            "{name} verifies after the online phase"
        );
    }
    Ok(())
}

#[test]
fn our_protocol_publishes_verdicts() -> Result<()> {
    let protocol = encoding("Ours", &ProtocolConfig::default())?.build(SizeParams::default())?;
    let verification = protocol.phase(Phase::Verification);
    let from_inputs = Edge::new(Role::InputParty, Role::BulletinBoard);
    assert_eq!(
        verification.communication.get(&from_inputs),
        unit("bool") * unit("nI")
    );
    Ok(())
}

#[test]
fn comparison_table() -> Result<()> {
    let _guard = init_tracing();
    let protocols = build_all(
        &all_encodings(&ProtocolConfig::default())?,
        &SizeParams::default(),
    )?;
    let table = Table::new()
        .communication(true)
        .computation(true)
        .collapse(Collapse::ComputeToAny)
        .zero("--")
        .render(&protocols)?;
    let header = format!("phase & sender & receiver & {} \\\\", PROTOCOLS.join(" & "));
    assert!(table.contains(&header));
    assert_eq!(table.matches(r"\begin{tabular}").count(), 2);
    Ok(())
}

#[test]
fn pairwise_mac_vole_keeps_its_logarithm() -> Result<()> {
    let _guard = init_tracing();
    let protocol = encoding("BMRS2023", &ProtocolConfig::default())?.build(SizeParams::default())?;
    assert!(!protocol.has_phase(Phase::Verification));
    let between_parties = Edge::new(Role::ComputeParty, Role::ComputeParty);
    let offline = protocol.phase(Phase::Offline).communication.get(&between_parties);
    let reduced = reduce(&offline, &size_symbols(), &ReduceMode::DropUnitCosts);

    let n = CostExpr::symbol(&COMPUTE_PARTY_COUNT);
    let inputs = CostExpr::symbol(&INPUT_COUNT);
    let multiplications = CostExpr::symbol(&MULTIPLICATION_COUNT);
    let expected = n.pow(2) * &multiplications
        + n.pow(2) * CostExpr::log(&INPUT_COUNT)
        + &n * &inputs;
    assert_eq!(reduced, expected);
    assert!(reduced.to_string().contains("log(I)"));
    Ok(())
}

#[test]
fn large_concrete_sizes_build() -> Result<()> {
    let params = SizeParams::default()
        .parties(1_000_000i64)
        .multiplications(10_000_000_000_000i64);
    let protocol = encoding("LowGear", &ProtocolConfig::default())?.build(params)?;
    let online = protocol.phase(Phase::Online).computation.get(&Role::ComputeParty);
    // beaver multiplications at every party exceed the 64-bit range
    assert!(online
        .terms()
        .any(|(_, coeff)| coeff > i128::from(i64::MAX)));
    Ok(())
}
