use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aggregate::{CommunicationComplexity, ComputationComplexity, Edge, Role};
use crate::errors::RenderError;

/// How role keys are merged before tabulating.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collapse {
    /// Every sender and receiver on its own.
    #[default]
    None,
    /// Receivers which are parties are merged into `any_party`, the bulletin board is kept.
    ComputeToAny,
    /// All receivers including the bulletin board are merged into `any_party`.
    DestinationToAny,
    /// Senders are merged as well.
    SenderToo,
}

impl Collapse {
    /// Numeric collapse levels as used on the command line.
    pub fn from_level(level: u8) -> Option<Collapse> {
        match level {
            0 => Some(Collapse::None),
            1 => Some(Collapse::ComputeToAny),
            2 => Some(Collapse::DestinationToAny),
            3 => Some(Collapse::SenderToo),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Collapse::None => "none",
            Collapse::ComputeToAny => "compute_to_any",
            Collapse::DestinationToAny => "destination_to_any",
            Collapse::SenderToo => "sender_too",
        }
    }
}

impl fmt::Display for Collapse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The edges a collapsed communication aggregator is keyed by, in table order.
pub fn communication_keys(grouping: Collapse, parties: &[Role]) -> Vec<Edge> {
    match grouping {
        Collapse::None => parties
            .iter()
            .flat_map(|&sender| receivers(parties).map(move |receiver| Edge::new(sender, receiver)))
            .collect(),
        Collapse::ComputeToAny => parties
            .iter()
            .flat_map(|&sender| {
                [
                    Edge::new(sender, Role::AnyParty),
                    Edge::new(sender, Role::BulletinBoard),
                ]
            })
            .collect(),
        Collapse::DestinationToAny => parties
            .iter()
            .map(|&sender| Edge::new(sender, Role::AnyParty))
            .collect(),
        Collapse::SenderToo => vec![
            Edge::new(Role::AnyParty, Role::AnyParty),
            Edge::new(Role::AnyParty, Role::BulletinBoard),
        ],
    }
}

fn receivers(parties: &[Role]) -> impl Iterator<Item = Role> + '_ {
    parties
        .iter()
        .copied()
        .chain(std::iter::once(Role::BulletinBoard))
}

/// Projects `aggregator` onto the keys of `grouping`, restricted to `parties` and the bulletin
/// board.
pub fn collapse_communication(
    aggregator: &CommunicationComplexity,
    grouping: Collapse,
    parties: &[Role],
) -> CommunicationComplexity {
    let with_board: Vec<Role> = receivers(parties).collect();
    let mut collapsed = CommunicationComplexity::new();
    match grouping {
        Collapse::None => {
            for edge in edges(parties, &with_board) {
                collapsed.record(edge, aggregator.get(&edge));
            }
        }
        Collapse::ComputeToAny => {
            for &sender in parties {
                let to_parties = aggregator.sum_of(&edges(&[sender], parties));
                collapsed.record(Edge::new(sender, Role::AnyParty), to_parties);
                let to_board = Edge::new(sender, Role::BulletinBoard);
                collapsed.record(to_board, aggregator.get(&to_board));
            }
        }
        Collapse::DestinationToAny => {
            for &sender in parties {
                let total = aggregator.sum_of(&edges(&[sender], &with_board));
                collapsed.record(Edge::new(sender, Role::AnyParty), total);
            }
        }
        Collapse::SenderToo => {
            let to_parties = aggregator.sum_of(&edges(parties, parties));
            collapsed.record(Edge::new(Role::AnyParty, Role::AnyParty), to_parties);
            let to_board = aggregator.sum_of(&edges(parties, &[Role::BulletinBoard]));
            collapsed.record(Edge::new(Role::AnyParty, Role::BulletinBoard), to_board);
        }
    }
    collapsed
}

fn edges(senders: &[Role], receivers: &[Role]) -> Vec<Edge> {
    senders
        .iter()
        .flat_map(|&source| {
            receivers
                .iter()
                .map(move |&destination| Edge::new(source, destination))
        })
        .collect()
}

/// Projects `aggregator` onto `parties`, or onto a single `any_party` entry.
pub fn collapse_computation(
    aggregator: &ComputationComplexity,
    grouping: Collapse,
    parties: &[Role],
) -> Result<ComputationComplexity, RenderError> {
    let mut collapsed = ComputationComplexity::new();
    match grouping {
        Collapse::None => {
            for &party in parties {
                collapsed.record(party, aggregator.get(&party));
            }
        }
        Collapse::ComputeToAny => collapsed.record(Role::AnyParty, aggregator.sum_of(parties)),
        other => return Err(RenderError::UnsupportedCollapse(other.name())),
    }
    Ok(collapsed)
}
