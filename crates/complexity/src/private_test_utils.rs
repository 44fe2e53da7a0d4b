use anyhow::Context;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::expr::{CostExpr, Symbol};
use crate::params::SizeParams;
use crate::protocol::{Protocol, ProtocolBuilder};
use crate::BuildError;

/// Installs a test-local subscriber which prints builder events filtered by `RUST_LOG`.
///
/// The subscriber stays active until the returned guard is dropped, so bind it at the start of a
/// test: `let _guard = init_tracing();`
pub fn init_tracing() -> tracing::dispatcher::DefaultGuard {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .set_default()
}

/// A unit cost or element size symbol as expression.
pub fn unit(name: &str) -> CostExpr {
    CostExpr::from(Symbol::new(name))
}

/// Builds a protocol and attaches its name to a construction error.
pub fn build<F>(name: &str, params: SizeParams, trace: F) -> anyhow::Result<Protocol>
where
    F: FnOnce(&mut ProtocolBuilder) -> Result<(), BuildError>,
{
    Protocol::build(name, params, trace).with_context(|| format!("building {name}"))
}
