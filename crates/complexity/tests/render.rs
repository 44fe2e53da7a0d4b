use complexity::aggregate::Role;
use complexity::expr::{CostExpr, Symbol};
use complexity::params::{size_symbols, SizeParams, COMPUTE_PARTY_COUNT};
use complexity::private_test_utils::{build, init_tracing};
use complexity::protocol::{Phase, Protocol};
use complexity::reduce::{reduce, ReduceMode};
use complexity::render::{Collapse, Midrules, Table};
use complexity::value::Value;
use proptest::prelude::*;

fn opening(name: &str) -> anyhow::Result<Protocol> {
    build(name, SizeParams::default(), |p| {
        p.in_phase(Phase::Online, |p| {
            let n = p.parties();
            p.at_each_party(Role::ComputeParty, n.clone(), |p| {
                p.broadcast(Value::field())?;
                p.compute(Value::field().sum(n))
            })
        })
    })
}

#[test]
fn full_communication_table() -> anyhow::Result<()> {
    let _guard = init_tracing();
    let table = Table::new()
        .communication(true)
        .phases([Phase::Online])
        .parties([Role::ComputeParty])
        .render(&[opening("Open")?])?;
    let expected = r"\begin{tabular}{c c c c}
\toprule
phase & sender & receiver & Open \\
\midrule
\multirow{2}*{online} & compute_party & compute_party &  \\
& compute_party & bulletin_board & $\mathrm{field} n$ \\
\bottomrule
\end{tabular}
";
    assert_eq!(table, expected);
    Ok(())
}

#[test]
fn leading_terms_per_party() -> anyhow::Result<()> {
    let _guard = init_tracing();
    let table = Table::new()
        .computation(true)
        .phases([Phase::Setup, Phase::Online])
        .parties([Role::ComputeParty, Role::InputParty])
        .midrules(Midrules::Full)
        .notation(ReduceMode::Leading(COMPUTE_PARTY_COUNT.clone()))
        .zero("--")
        .render(&[opening("A")?, opening("B")?])?;
    let expected = r"\begin{tabular}{c c c c}
\toprule
phase & party & A & B \\
\midrule
\multirow{2}*{setup} & compute_party & -- & -- \\
& input_party & -- & -- \\
\cmidrule{1-4}
\multirow{2}*{online} & compute_party & $n^{2}$ & $n^{2}$ \\
& input_party & -- & -- \\
\bottomrule
\end{tabular}
";
    assert_eq!(table, expected);
    Ok(())
}

#[test]
fn both_tables_are_separated() -> anyhow::Result<()> {
    let table = Table::new()
        .communication(true)
        .computation(true)
        .collapse(Collapse::ComputeToAny)
        .phases([Phase::Online])
        .notation(ReduceMode::DropUnitCosts)
        .render(&[opening("Open")?])?;
    let (communication, computation) = table
        .split_once("\n\n")
        .expect("tables are separated by a blank line");
    assert_eq!(communication.matches(r"\multirow{6}*{online}").count(), 1);
    assert!(communication.contains(r"& compute_party & bulletin_board & $n$ \\"));
    assert!(computation.contains(r"\multirow{1}*{online} & $n^{2}$ \\"));
    Ok(())
}

fn monomial() -> impl Strategy<Value = CostExpr> {
    let params = size_symbols();
    (0..params.len(), 0..3u32, 0..2u32, 1..5i64).prop_map(move |(idx, exp, log_exp, coeff)| {
        let param = &params[idx];
        CostExpr::symbol(param).pow(exp) * CostExpr::log(param).pow(log_exp) * coeff
            * Symbol::new("field")
    })
}

proptest! {
    #[test]
    fn reduction_is_idempotent(terms in prop::collection::vec(monomial(), 1..8)) {
        let expr: CostExpr = terms.into_iter().sum();
        let params = size_symbols();
        let once = reduce(&expr, &params, &ReduceMode::DropUnitCosts);
        let twice = reduce(&once, &params, &ReduceMode::DropUnitCosts);
        prop_assert_eq!(once, twice);
    }
}
