use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// A named, non-negative integer variable of a cost expression.
///
/// Symbols are identified by their name. Size parameters like the number of multiplications may
/// additionally be assumed strictly positive, which lets conditions like `M > 0` be decided
/// statically. The assumption is not part of the identity, `Symbol::new("M")` and
/// `Symbol::positive("M")` are the same variable. Within one expression the assumption of the
/// first occurrence is kept.
#[derive(Clone)]
pub struct Symbol {
    name: Arc<str>,
    positive: bool,
}

impl Symbol {
    /// A symbol which may be zero.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            positive: false,
        }
    }

    /// A symbol which is assumed to be strictly positive.
    pub fn positive(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            positive: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_positive(&self) -> bool {
        self.positive
    }

    /// Derives a new non-negative symbol `<self>_<suffix>`.
    pub fn suffixed(&self, suffix: &str) -> Self {
        Self::new(format!("{}_{suffix}", self.name))
    }

    pub(crate) fn to_latex(&self) -> String {
        if self.name.chars().count() == 1 {
            self.name.to_string()
        } else {
            format!(r"\mathrm{{{}}}", self.name.replace('_', r"\_"))
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Symbol {}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.positive {
            write!(f, "{}(+)", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixed_symbols_are_not_positive() {
        let m = Symbol::positive("M");
        let derived = m.suffixed("verify");
        assert_eq!(derived.name(), "M_verify");
        assert!(!derived.is_positive());
    }

    #[test]
    fn identity_ignores_assumptions() {
        use std::collections::BTreeSet;

        let assumed = Symbol::positive("M");
        let named = Symbol::new("M");
        assert_eq!(assumed, named);
        assert_eq!(assumed.cmp(&named), Ordering::Equal);
        let set = BTreeSet::from([assumed, named]);
        assert_eq!(set.len(), 1);
        assert_ne!(Symbol::new("M"), Symbol::new("n"));
    }

    #[test]
    fn latex_names() {
        assert_eq!(Symbol::new("n").to_latex(), "n");
        assert_eq!(
            Symbol::new("field_addition").to_latex(),
            r"\mathrm{field\_addition}"
        );
    }
}
