use std::fmt::Write;

use itertools::Itertools;
use num_traits::{One, Zero};
use tracing::debug;

use super::collapse::{collapse_communication, collapse_computation, communication_keys, Collapse};
use crate::aggregate::{Edge, Role};
use crate::errors::RenderError;
use crate::expr::CostExpr;
use crate::params::size_symbols;
use crate::protocol::{Phase, Protocol};
use crate::reduce::{reduce, ReduceMode};

/// Rules between the phase blocks of a table.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Midrules {
    #[default]
    None,
    /// `\cmidrule{1-k}`
    Full,
    /// `\cmidrule(rl){1-k}`
    Trimmed,
}

/// Renders booktabs tables comparing the costs of several protocols.
///
/// ```
/// use complexity::protocol::Protocol;
/// use complexity::params::SizeParams;
/// use complexity::render::Table;
///
/// let protocol = Protocol::build("Empty", SizeParams::default(), |_| Ok(())).unwrap();
/// let table = Table::new().computation(true).render(&[protocol]).unwrap();
/// assert!(table.starts_with(r"\begin{tabular}{c c c}"));
/// ```
#[derive(Clone, Debug)]
pub struct Table {
    communication: bool,
    computation: bool,
    phases: Vec<Phase>,
    parties: Vec<Role>,
    collapse: Collapse,
    midrules: Midrules,
    notation: ReduceMode,
    zero: Option<String>,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            communication: false,
            computation: false,
            phases: Phase::ALL.to_vec(),
            parties: vec![Role::ComputeParty, Role::InputParty, Role::OutputParty],
            collapse: Collapse::None,
            midrules: Midrules::None,
            notation: ReduceMode::Exact,
            zero: None,
        }
    }
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn communication(mut self, communication: bool) -> Self {
        self.communication = communication;
        self
    }

    pub fn computation(mut self, computation: bool) -> Self {
        self.computation = computation;
        self
    }

    pub fn phases(mut self, phases: impl IntoIterator<Item = Phase>) -> Self {
        self.phases = phases.into_iter().collect();
        self
    }

    pub fn parties(mut self, parties: impl IntoIterator<Item = Role>) -> Self {
        self.parties = parties.into_iter().collect();
        self
    }

    pub fn collapse(mut self, collapse: Collapse) -> Self {
        self.collapse = collapse;
        self
    }

    pub fn midrules(mut self, midrules: Midrules) -> Self {
        self.midrules = midrules;
        self
    }

    pub fn notation(mut self, notation: ReduceMode) -> Self {
        self.notation = notation;
        self
    }

    /// Placeholder for cells which are zero or one.
    pub fn zero(mut self, zero: impl Into<String>) -> Self {
        self.zero = Some(zero.into());
        self
    }

    #[tracing::instrument(level = "debug", skip_all, fields(protocols = protocols.len()))]
    pub fn render(&self, protocols: &[Protocol]) -> Result<String, RenderError> {
        if !self.communication && !self.computation {
            return Err(RenderError::NothingToRender);
        }
        let mut out = String::new();
        if self.communication {
            self.communication_table(&mut out, protocols)?;
        }
        if self.communication && self.computation {
            writeln!(out)?;
        }
        if self.computation {
            self.computation_table(&mut out, protocols)?;
        }
        debug!(bytes = out.len(), "Rendered table");
        Ok(out)
    }

    fn communication_table(
        &self,
        out: &mut String,
        protocols: &[Protocol],
    ) -> Result<(), RenderError> {
        let key_columns: &[&str] = match self.collapse {
            Collapse::None | Collapse::ComputeToAny => &["sender", "receiver"],
            Collapse::DestinationToAny => &["sender"],
            Collapse::SenderToo => &["receiver"],
        };
        let keys = communication_keys(self.collapse, &self.parties);
        let columns = key_columns.len() + protocols.len();
        self.header(out, key_columns, protocols)?;
        for (row, &phase) in self.phases.iter().enumerate() {
            let collapsed: Vec<_> = protocols
                .iter()
                .map(|protocol| {
                    let aggregator = &protocol.phase(phase).communication;
                    collapse_communication(aggregator, self.collapse, &self.parties)
                })
                .collect();
            self.phase_header(out, columns, keys.len(), phase, row)?;
            for edge in &keys {
                write!(out, "& {}", edge_columns(edge, self.collapse))?;
                for aggregator in &collapsed {
                    write!(out, " & {}", self.cell(&aggregator.get(edge)))?;
                }
                writeln!(out, r" \\")?;
            }
        }
        footer(out)
    }

    fn computation_table(
        &self,
        out: &mut String,
        protocols: &[Protocol],
    ) -> Result<(), RenderError> {
        let merged = self.collapse == Collapse::ComputeToAny;
        let key_columns: &[&str] = if merged { &[] } else { &["party"] };
        let columns = key_columns.len() + protocols.len();
        // fail early for groupings without a computation counterpart
        collapse_computation(&Default::default(), self.collapse, &self.parties)?;
        self.header(out, key_columns, protocols)?;
        for (row, &phase) in self.phases.iter().enumerate() {
            let collapsed = protocols
                .iter()
                .map(|protocol| {
                    let aggregator = &protocol.phase(phase).computation;
                    collapse_computation(aggregator, self.collapse, &self.parties)
                })
                .collect::<Result<Vec<_>, _>>()?;
            if merged {
                self.phase_header(out, columns, 1, phase, row)?;
                let cells = collapsed
                    .iter()
                    .map(|aggregator| self.cell(&aggregator.get(&Role::AnyParty)))
                    .join(" & ");
                writeln!(out, r"& {cells} \\")?;
                continue;
            }
            self.phase_header(out, columns, self.parties.len(), phase, row)?;
            for party in &self.parties {
                write!(out, "& {party}")?;
                for aggregator in &collapsed {
                    write!(out, " & {}", self.cell(&aggregator.get(party)))?;
                }
                writeln!(out, r" \\")?;
            }
        }
        footer(out)
    }

    fn header(
        &self,
        out: &mut String,
        key_columns: &[&str],
        protocols: &[Protocol],
    ) -> Result<(), RenderError> {
        let columns = key_columns.len() + protocols.len();
        writeln!(out, r"\begin{{tabular}}{{{}}}", ["c"].repeat(columns + 1).join(" "))?;
        writeln!(out, r"\toprule")?;
        let headings = std::iter::once("phase")
            .chain(key_columns.iter().copied())
            .chain(protocols.iter().map(Protocol::name))
            .join(" & ");
        writeln!(out, r"{headings} \\")?;
        writeln!(out, r"\midrule")?;
        Ok(())
    }

    fn phase_header(
        &self,
        out: &mut String,
        columns: usize,
        rows: usize,
        phase: Phase,
        row: usize,
    ) -> Result<(), RenderError> {
        if row != 0 {
            match self.midrules {
                Midrules::None => {}
                Midrules::Full => writeln!(out, r"\cmidrule{{1-{}}}", columns + 1)?,
                Midrules::Trimmed => writeln!(out, r"\cmidrule(rl){{1-{}}}", columns + 1)?,
            }
        }
        write!(out, r"\multirow{{{rows}}}*{{{phase}}} ")?;
        Ok(())
    }

    fn cell(&self, value: &CostExpr) -> String {
        let value = reduce(value, &size_symbols(), &self.notation);
        if value.is_zero() || value.is_one() {
            self.zero.clone().unwrap_or_default()
        } else {
            format!("${}$", value.to_latex())
        }
    }
}

fn edge_columns(edge: &Edge, collapse: Collapse) -> String {
    match collapse {
        Collapse::None | Collapse::ComputeToAny => {
            format!("{} & {}", edge.source, edge.destination)
        }
        Collapse::DestinationToAny => edge.source.to_string(),
        Collapse::SenderToo => edge.destination.to_string(),
    }
}

fn footer(out: &mut String) -> Result<(), RenderError> {
    writeln!(out, r"\bottomrule")?;
    writeln!(out, r"\end{{tabular}}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SizeParams;
    use crate::value::Value;

    fn broadcaster(name: &str) -> Protocol {
        Protocol::build(name, SizeParams::default(), |p| {
            p.in_phase(Phase::Online, |p| {
                p.at_party(Role::ComputeParty, |p| p.broadcast(Value::field()))
            })
        })
        .unwrap()
    }

    #[test]
    fn nothing_requested() {
        assert!(matches!(
            Table::new().render(&[]),
            Err(RenderError::NothingToRender)
        ));
    }

    #[test]
    fn collapsed_computation() {
        let table = Table::new()
            .computation(true)
            .collapse(Collapse::ComputeToAny)
            .phases([Phase::Online])
            .zero("-")
            .render(&[broadcaster("A"), broadcaster("B")])
            .unwrap();
        let expected = "\\begin{tabular}{c c c}\n\\toprule\nphase & A & B \\\\\n\\midrule\n\
                        \\multirow{1}*{online} & - & - \\\\\n\\bottomrule\n\\end{tabular}\n";
        assert_eq!(table, expected);
    }

    #[test]
    fn unsupported_computation_collapse() {
        let result = Table::new()
            .computation(true)
            .collapse(Collapse::DestinationToAny)
            .render(&[broadcaster("A")]);
        assert!(matches!(result, Err(RenderError::UnsupportedCollapse(_))));
    }

    #[test]
    fn midrules_between_phases() {
        let table = Table::new()
            .communication(true)
            .collapse(Collapse::SenderToo)
            .phases([Phase::Offline, Phase::Online])
            .midrules(Midrules::Trimmed)
            .render(&[broadcaster("A")])
            .unwrap();
        assert_eq!(table.matches(r"\cmidrule(rl){1-3}").count(), 1);
        assert!(table.contains(r"& bulletin_board & $\mathrm{field}$ \\"));
    }
}
