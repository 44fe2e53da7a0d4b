//! Well-known unit costs which are not derived from a [`Kind`](crate::value::Kind).
use once_cell::sync::Lazy;

use crate::expr::Symbol;

pub static DECOMMITMENT: Lazy<Symbol> = Lazy::new(|| Symbol::new("decommitment"));

pub static PRF_EVALUATION: Lazy<Symbol> = Lazy::new(|| Symbol::new("PRF"));
pub static ENCRYPTION: Lazy<Symbol> = Lazy::new(|| Symbol::new("Enc"));
pub static DROWNING_ENCRYPTION: Lazy<Symbol> = Lazy::new(|| Symbol::new("Enc_drown"));
pub static DECRYPTION: Lazy<Symbol> = Lazy::new(|| Symbol::new("Dec"));
pub static DISTRIBUTED_DECRYPTION: Lazy<Symbol> = Lazy::new(|| Symbol::new("DDec"));
pub static ZK: Lazy<Symbol> = Lazy::new(|| Symbol::new("ZK"));
pub static ZK_VERIFICATION: Lazy<Symbol> = Lazy::new(|| verification(&ZK));
pub static PUBLIC_KEY_ZK: Lazy<Symbol> = Lazy::new(|| Symbol::new("public_ZK"));
pub static COMMITMENT_ZK: Lazy<Symbol> = Lazy::new(|| Symbol::new("commitment_ZK"));

/// Cost of jointly generating one public random `what`.
pub fn public_random(what: &Symbol) -> Symbol {
    Symbol::new(format!("public_random_{what}"))
}

/// Cost of verifying a published `what`.
pub fn verification(what: &Symbol) -> Symbol {
    what.suffixed("verify")
}
