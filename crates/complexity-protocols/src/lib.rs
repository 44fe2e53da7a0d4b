//! # Cost encodings of published MPC protocols
//!
//! Every protocol is a [`ProtocolEncoding`] which issues its trace on a
//! [`ProtocolBuilder`](complexity::ProtocolBuilder). Sub-procedures shared between protocols of
//! the SPDZ family live in [`spdz`] and [`bos`].
//!
//! ```
//! use complexity::params::SizeParams;
//! use complexity::Phase;
//! use complexity_protocols::{encoding, ProtocolConfig};
//!
//! let low_gear = encoding("LowGear", &ProtocolConfig::default()).unwrap();
//! let protocol = low_gear.build(SizeParams::default().parties(2)).unwrap();
//! assert_eq!(protocol.name(), "KellerPastroRotaru2017");
//! assert!(protocol.has_phase(Phase::Verification));
//! ```
use complexity::aggregate::Role;
use complexity::params::SizeParams;
use complexity::{BuildError, Protocol, ProtocolBuilder};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use bcs2019::BaumCozzoSmart2019;
pub use bmrs2023::BaumMelissarisRachuriScholl2023;
pub use bos2016::BaumOrsiniScholl2016;
pub use cfy2016::CunninghamFullerYakoubov2016;
pub use kpr2017::KellerPastroRotaru2017;
pub use ours::OurProtocol;

mod bcs2019;
mod bmrs2023;
pub mod bos;
mod bos2016;
mod cfy2016;
mod kpr2017;
mod ours;
pub mod spdz;

/// A protocol whose costs can be derived by tracing it on a builder.
pub trait ProtocolEncoding: Send + Sync {
    /// Name used in table headers.
    fn name(&self) -> &'static str;

    /// Issues all primitive operations of one protocol run.
    fn trace(&self, p: &mut ProtocolBuilder) -> Result<(), BuildError>;

    fn build(&self, params: SizeParams) -> Result<Protocol, BuildError> {
        Protocol::build(self.name(), params, |p| self.trace(p))
    }
}

/// Variants of the encodings.
///
/// Can be read from JSON, missing fields take their default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Role which provides the inputs. Compute parties can provide inputs themselves.
    pub input_party: Role,
    /// Role which receives the private outputs.
    pub output_party: Role,
    /// Outputs are released encrypted and the keys are sent after the verification.
    pub delayed_output: bool,
    /// Baum et al. 2016 check all opened values at once at the end.
    pub bos_batched_mac_check: bool,
    /// Baum et al. 2016 generate the MAC keys in a setup phase of their own.
    pub bos_distinct_setup_phase: bool,
    /// Cunningham et al. 2016 check all opened values at once at the end.
    pub cfy_batched_mac_check: bool,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            input_party: Role::InputParty,
            output_party: Role::OutputParty,
            delayed_output: true,
            bos_batched_mac_check: true,
            bos_distinct_setup_phase: true,
            cfy_batched_mac_check: true,
        }
    }
}

impl ProtocolConfig {
    pub fn input_party(mut self, input_party: Role) -> Self {
        self.input_party = input_party;
        self
    }

    pub fn output_party(mut self, output_party: Role) -> Self {
        self.output_party = output_party;
        self
    }

    pub fn delayed_output(mut self, delayed_output: bool) -> Self {
        self.delayed_output = delayed_output;
        self
    }

    pub fn bos_batched_mac_check(mut self, batched: bool) -> Self {
        self.bos_batched_mac_check = batched;
        self
    }

    pub fn bos_distinct_setup_phase(mut self, distinct: bool) -> Self {
        self.bos_distinct_setup_phase = distinct;
        self
    }

    pub fn cfy_batched_mac_check(mut self, batched: bool) -> Self {
        self.cfy_batched_mac_check = batched;
        self
    }
}

/// Canonical names of all encodings.
pub const PROTOCOLS: [&str; 6] = [
    "OurProtocol",
    "BaumOrsiniScholl2016",
    "CunninghamFullerYakoubov2016",
    "KellerPastroRotaru2017",
    "BaumCozzoSmart2019",
    "BaumMelissarisRachuriScholl2023",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown protocol {0}, expected one of {}", PROTOCOLS.join(", "))]
pub struct UnknownProtocol(pub String);

/// Looks up an encoding by its canonical name or one of the aliases `Ours`, `LowGear`,
/// `TopGear` and `BMRS2023`.
pub fn encoding(
    name: &str,
    config: &ProtocolConfig,
) -> Result<Box<dyn ProtocolEncoding>, UnknownProtocol> {
    let encoding: Box<dyn ProtocolEncoding> = match name {
        "OurProtocol" | "Ours" => Box::new(OurProtocol::new(config)),
        "BaumOrsiniScholl2016" => Box::new(BaumOrsiniScholl2016::new(config)),
        "CunninghamFullerYakoubov2016" => Box::new(CunninghamFullerYakoubov2016::new(config)),
        "KellerPastroRotaru2017" | "LowGear" => Box::new(KellerPastroRotaru2017),
        "BaumCozzoSmart2019" | "TopGear" => Box::new(BaumCozzoSmart2019),
        "BaumMelissarisRachuriScholl2023" | "BMRS2023" => {
            Box::new(BaumMelissarisRachuriScholl2023)
        }
        _ => return Err(UnknownProtocol(name.to_owned())),
    };
    Ok(encoding)
}

/// Builds all `encodings` for the same parameters in parallel, keeping their order.
#[tracing::instrument(level = "debug", skip_all, fields(protocols = encodings.len()))]
pub fn build_all(
    encodings: &[Box<dyn ProtocolEncoding>],
    params: &SizeParams,
) -> Result<Vec<Protocol>, BuildError> {
    encodings
        .par_iter()
        .map(|encoding| encoding.build(params.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases() {
        let config = ProtocolConfig::default();
        for (alias, name) in [
            ("Ours", "OurProtocol"),
            ("LowGear", "KellerPastroRotaru2017"),
            ("TopGear", "BaumCozzoSmart2019"),
            ("BMRS2023", "BaumMelissarisRachuriScholl2023"),
        ] {
            assert_eq!(encoding(alias, &config).unwrap().name(), name);
        }
        for name in PROTOCOLS {
            assert_eq!(encoding(name, &config).unwrap().name(), name);
        }
    }

    #[test]
    fn unknown_protocol() {
        let err = encoding("SpdzWithoutMacs", &ProtocolConfig::default())
            .err()
            .unwrap();
        assert_eq!(err, UnknownProtocol("SpdzWithoutMacs".into()));
        assert!(err.to_string().contains("BaumCozzoSmart2019"));
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: ProtocolConfig =
            serde_json::from_str(r#"{"input_party": "compute_party"}"#).unwrap();
        assert_eq!(
            config,
            ProtocolConfig::default().input_party(Role::ComputeParty)
        );
    }
}
