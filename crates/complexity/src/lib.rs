//! # Symbolic cost accounting for MPC protocols
//!
//! This crate derives closed-form communication and computation costs of secure multi-party
//! computation protocols without executing them. A protocol is encoded as a trace of primitive
//! operations, i.e. computing on typed data, sending data to another role or broadcasting it,
//! issued inside scopes that state the protocol [phase](protocol::Phase), the acting
//! [party](aggregate::Role) and how often the operation happens.
//!
//! All costs are symbolic [polynomials](expr::CostExpr) over the [size parameters](params) of
//! the computation (number of parties, inputs, multiplications, ...) and unit costs which are
//! synthesized from the data kinds involved, e.g. `field_multiplication`.
//!
//! ```
//! use complexity::aggregate::{Edge, Role};
//! use complexity::params::SizeParams;
//! use complexity::protocol::{Phase, Protocol};
//! use complexity::value::Value;
//!
//! let protocol = Protocol::build("AddAndOpen", SizeParams::default().parties(2), |p| {
//!     p.in_phase(Phase::Online, |p| {
//!         let parties = p.parties();
//!         p.at_each_party(Role::ComputeParty, parties, |p| {
//!             p.compute(Value::field() + Value::field())?;
//!             p.broadcast(Value::field())
//!         })
//!     })
//! })
//! .unwrap();
//!
//! let online = protocol.phase(Phase::Online);
//! assert_eq!(
//!     online.computation.get(&Role::ComputeParty).to_string(),
//!     "2*field_addition"
//! );
//! let to_board = Edge::new(Role::ComputeParty, Role::BulletinBoard);
//! assert_eq!(online.communication.get(&to_board).to_string(), "2*field");
//! ```
//!
//! Costs of several protocols can be compared asymptotically with [`reduce`](reduce::reduce)
//! and tabulated with [`Table`](render::Table).
pub use errors::{BuildError, RenderError};
pub use expr::{Coefficient, CostExpr, Symbol};
pub use num_traits::{One, Zero};
pub use protocol::{Phase, Protocol, ProtocolBuilder};

pub mod aggregate;
pub mod errors;
pub mod expr;
pub mod params;
#[cfg(feature = "_integration_tests")]
#[doc(hidden)]
/// Do **not** use items from this module. They are intended for integration tests only.
pub mod private_test_utils;
pub mod protocol;
pub mod reduce;
pub mod render;
pub mod units;
pub mod value;
