//! Tabular summaries of protocol costs.
pub mod collapse;
mod table;

pub use collapse::{collapse_communication, collapse_computation, Collapse};
pub use table::{Midrules, Table};
