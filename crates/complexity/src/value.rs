//! Typed symbolic values.
//!
//! A [`Value`] stands for a bundle of `count` protocol data elements of one [`Kind`] together with
//! the cost of computing them. Combining two values consults a fixed compatibility table and
//! adds one freshly named unit cost for the operation, e.g. `field_addition` or
//! `ciphertext_field_multiplication`.
//!
//! ```
//! use complexity::value::Value;
//!
//! let masked = Value::field() - Value::field() * Value::field();
//! assert_eq!(masked.cost().to_string(), "field_addition + field_multiplication");
//! ```
use std::borrow::Borrow;
use std::fmt;
use std::ops::{Add, Mul, Rem, Sub};

use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::errors::BuildError;
use crate::expr::{CostExpr, Symbol};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Boolean,
    Field,
    CiphertextField,
    Ciphertext,
    Commitment,
}

impl Kind {
    pub const ALL: [Kind; 5] = [
        Kind::Boolean,
        Kind::Field,
        Kind::CiphertextField,
        Kind::Ciphertext,
        Kind::Commitment,
    ];

    /// Name of the element symbol, which doubles as the prefix of the kind's unit costs.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Boolean => "bool",
            Kind::Field => "field",
            Kind::CiphertextField => "ciphertext_field",
            Kind::Ciphertext => "ciphertext",
            Kind::Commitment => "commitment",
        }
    }

    /// Symbol for the size of one element of this kind.
    pub fn element(&self) -> Symbol {
        Symbol::new(self.name())
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Addition,
    Subtraction,
    Multiplication,
    Modulo,
    Equality,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Addition => "addition",
            Operation::Subtraction => "subtraction",
            Operation::Multiplication => "multiplication",
            Operation::Modulo => "modulo",
            Operation::Equality => "equality",
        };
        f.write_str(name)
    }
}

/// Row of the compatibility table: `(left, right)` combine to `result` at cost `unit`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Combination {
    pub result: Kind,
    pub unit: Symbol,
}

/// Looks up the result kind and unit cost of `left op right`.
///
/// The table is symmetric except for the modulo reduction. Mixed-kind unit costs are named after
/// the dominant kind first, e.g. `ciphertext_field_multiplication` for a ciphertext multiplied
/// with a field element.
pub fn combination(operation: Operation, left: Kind, right: Kind) -> Option<Combination> {
    use Kind::*;

    if operation == Operation::Equality {
        return (left == right).then(|| Combination {
            result: Boolean,
            unit: left.element().suffixed("equality"),
        });
    }

    let (dominant, other) = if rank(left) >= rank(right) {
        (left, right)
    } else {
        (right, left)
    };
    let result = match (operation, dominant, other) {
        (Operation::Addition | Operation::Subtraction, Field, Field)
        | (Operation::Multiplication, Field, Field) => Field,
        (Operation::Addition | Operation::Subtraction, CiphertextField, CiphertextField | Field)
        | (Operation::Multiplication, CiphertextField, CiphertextField | Field) => CiphertextField,
        (Operation::Addition | Operation::Subtraction, Ciphertext, Ciphertext | Field)
        | (Operation::Multiplication, Ciphertext, Ciphertext | Field) => Ciphertext,
        (Operation::Addition | Operation::Subtraction, Commitment, Commitment | Field)
        | (Operation::Multiplication, Commitment, Field) => Commitment,
        (Operation::Modulo, CiphertextField, Field) if left == CiphertextField => Field,
        _ => return None,
    };

    let name = match operation {
        Operation::Addition | Operation::Subtraction => "addition",
        Operation::Multiplication => "multiplication",
        Operation::Modulo => {
            return Some(Combination {
                result,
                unit: Symbol::new(format!("{dominant}_mod_{other}")),
            })
        }
        Operation::Equality => unreachable!("equality is handled above"),
    };
    let unit = if dominant == other {
        dominant.element().suffixed(name)
    } else {
        Symbol::new(format!("{dominant}_{other}_{name}"))
    };
    Some(Combination { result, unit })
}

/// Order in which kinds absorb each other in mixed operations.
fn rank(kind: Kind) -> u8 {
    match kind {
        Kind::Boolean => 0,
        Kind::Field => 1,
        Kind::CiphertextField => 2,
        Kind::Ciphertext => 3,
        Kind::Commitment => 4,
    }
}

/// `count` elements of `kind` and the cost of computing them.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Value {
    kind: Kind,
    cost: CostExpr,
    count: CostExpr,
}

impl Value {
    /// A single bare element, i.e. with zero cost.
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            cost: CostExpr::zero(),
            count: CostExpr::one(),
        }
    }

    pub fn boolean() -> Self {
        Self::new(Kind::Boolean)
    }

    pub fn field() -> Self {
        Self::new(Kind::Field)
    }

    pub fn ciphertext_field() -> Self {
        Self::new(Kind::CiphertextField)
    }

    pub fn ciphertext() -> Self {
        Self::new(Kind::Ciphertext)
    }

    pub fn commitment() -> Self {
        Self::new(Kind::Commitment)
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn cost(&self) -> &CostExpr {
        &self.cost
    }

    pub fn count(&self) -> &CostExpr {
        &self.count
    }

    /// Cost of computing all elements: `count * cost`.
    pub fn total_cost(&self) -> CostExpr {
        &self.count * &self.cost
    }

    /// Size of all elements: `count * <element>`.
    pub fn size(&self) -> CostExpr {
        &self.count * self.kind.element()
    }

    /// Combines two values according to the compatibility table.
    pub fn combine(operation: Operation, lhs: &Value, rhs: &Value) -> Result<Value, BuildError> {
        let Combination { result, unit } =
            combination(operation, lhs.kind, rhs.kind).ok_or(BuildError::IncompatibleKinds {
                operation,
                left: lhs.kind,
                right: rhs.kind,
            })?;
        if lhs.count != rhs.count {
            return Err(BuildError::CountMismatch {
                left: lhs.count.clone(),
                right: rhs.count.clone(),
            });
        }
        Ok(Value {
            kind: result,
            cost: &lhs.cost + &rhs.cost + unit,
            count: lhs.count.clone(),
        })
    }

    pub fn try_add(&self, rhs: impl Borrow<Value>) -> Result<Value, BuildError> {
        Self::combine(Operation::Addition, self, rhs.borrow())
    }

    pub fn try_sub(&self, rhs: impl Borrow<Value>) -> Result<Value, BuildError> {
        Self::combine(Operation::Subtraction, self, rhs.borrow())
    }

    pub fn try_mul(&self, rhs: impl Borrow<Value>) -> Result<Value, BuildError> {
        Self::combine(Operation::Multiplication, self, rhs.borrow())
    }

    pub fn try_rem(&self, rhs: impl Borrow<Value>) -> Result<Value, BuildError> {
        Self::combine(Operation::Modulo, self, rhs.borrow())
    }

    /// Compares two values of the same kind and count, yielding a boolean.
    pub fn equals(&self, rhs: impl Borrow<Value>) -> Result<Value, BuildError> {
        Self::combine(Operation::Equality, self, rhs.borrow())
    }

    /// Multiplies with a public scalar.
    ///
    /// A bare value is a bundle of elements and the scalar multiplies its count. Otherwise the
    /// computation is repeated and the scalar multiplies its cost.
    pub fn scale(&self, factor: impl Into<CostExpr>) -> Value {
        let factor = factor.into();
        if self.cost.is_zero() {
            Value {
                kind: self.kind,
                cost: CostExpr::zero(),
                count: &self.count * factor,
            }
        } else {
            Value {
                kind: self.kind,
                cost: &self.cost * factor,
                count: self.count.clone(),
            }
        }
    }

    /// Sum of `terms` values, which takes `terms - 1` additions.
    pub fn sum(&self, terms: impl Into<CostExpr>) -> Value {
        let additions = terms.into() - 1;
        Value {
            kind: self.kind,
            cost: &self.cost + additions * self.kind.element().suffixed("addition"),
            count: self.count.clone(),
        }
    }

    /// A fresh random value of the same kind and count. Any previous cost is discarded.
    pub fn sample(&self) -> Value {
        Value {
            kind: self.kind,
            cost: CostExpr::from(self.kind.element().suffixed("sampling")),
            count: self.count.clone(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("kind", &self.kind)
            .field("cost", &format_args!("{}", self.cost))
            .field("count", &format_args!("{}", self.count))
            .finish()
    }
}

macro_rules! impl_value_op {
    ($op:ident, $method:ident, $checked:ident) => {
        impl<Rhs: Borrow<Value>> $op<Rhs> for Value {
            type Output = Value;

            /// # Panics
            /// If the kinds are incompatible or the counts differ.
            fn $method(self, rhs: Rhs) -> Value {
                self.$checked(rhs).unwrap_or_else(|err| panic!("{err}"))
            }
        }

        impl<Rhs: Borrow<Value>> $op<Rhs> for &Value {
            type Output = Value;

            /// # Panics
            /// If the kinds are incompatible or the counts differ.
            fn $method(self, rhs: Rhs) -> Value {
                self.$checked(rhs).unwrap_or_else(|err| panic!("{err}"))
            }
        }
    };
}

impl_value_op!(Add, add, try_add);
impl_value_op!(Sub, sub, try_sub);
impl_value_op!(Rem, rem, try_rem);

impl Mul<Value> for Value {
    type Output = Value;

    /// # Panics
    /// If the kinds are incompatible or the counts differ.
    fn mul(self, rhs: Value) -> Value {
        self.try_mul(rhs).unwrap_or_else(|err| panic!("{err}"))
    }
}

impl Mul<&Value> for Value {
    type Output = Value;

    /// # Panics
    /// If the kinds are incompatible or the counts differ.
    fn mul(self, rhs: &Value) -> Value {
        self.try_mul(rhs).unwrap_or_else(|err| panic!("{err}"))
    }
}

impl Mul<i64> for Value {
    type Output = Value;

    fn mul(self, rhs: i64) -> Value {
        self.scale(rhs)
    }
}

impl Mul<CostExpr> for Value {
    type Output = Value;

    fn mul(self, rhs: CostExpr) -> Value {
        self.scale(rhs)
    }
}

impl Mul<Value> for i64 {
    type Output = Value;

    fn mul(self, rhs: Value) -> Value {
        rhs.scale(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str) -> CostExpr {
        CostExpr::from(Symbol::new(name))
    }

    #[test]
    fn same_kind_addition() {
        let sum = Value::field() + Value::field();
        assert_eq!(sum.kind(), Kind::Field);
        assert_eq!(sum.cost(), &unit("field_addition"));
        assert_eq!(sum.count(), &CostExpr::one());
    }

    #[test]
    fn mixed_kinds_name_dominant_first() {
        let product = Value::field() * Value::ciphertext();
        assert_eq!(product.kind(), Kind::Ciphertext);
        assert_eq!(product.cost(), &unit("ciphertext_field_multiplication"));

        let sum = Value::field() + Value::ciphertext_field();
        assert_eq!(sum.kind(), Kind::CiphertextField);
        assert_eq!(sum.cost(), &unit("ciphertext_field_field_addition"));
    }

    #[test]
    fn modulo_yields_field() {
        let reduced = Value::ciphertext_field() % Value::field();
        assert_eq!(reduced.kind(), Kind::Field);
        assert_eq!(reduced.cost(), &unit("ciphertext_field_mod_field"));
        assert!(Value::field().try_rem(Value::ciphertext_field()).is_err());
    }

    #[test]
    fn sum_needs_one_addition_less() {
        let n = Symbol::new("n");
        let sum = Value::field().sum(&n);
        assert_eq!(sum.cost(), &((&n - 1) * unit("field_addition")));
        assert!(Value::field().sum(1).cost().is_zero());
    }

    #[test]
    fn sampling_discards_cost() {
        let sampled = (Value::ciphertext() + Value::ciphertext()).sample();
        assert_eq!(sampled.cost(), &unit("ciphertext_sampling"));
    }

    #[test]
    fn scalar_multiplication() {
        let bundle = Value::boolean() * 3;
        assert_eq!(bundle.count(), &CostExpr::from(3));
        assert!(bundle.cost().is_zero());
        assert_eq!(bundle.size(), unit("bool") * 3);

        let repeated = (Value::field() + Value::field()) * 2;
        assert_eq!(repeated.count(), &CostExpr::one());
        assert_eq!(repeated.cost(), &(unit("field_addition") * 2));
    }

    #[test]
    fn equality() {
        let eq = Value::commitment().equals(Value::commitment()).unwrap();
        assert_eq!(eq.kind(), Kind::Boolean);
        assert_eq!(eq.cost(), &unit("commitment_equality"));

        let err = Value::field().equals(Value::commitment()).unwrap_err();
        assert!(matches!(err, BuildError::IncompatibleKinds { .. }));
    }

    #[test]
    fn count_mismatch() {
        let err = (Value::field() * 2).try_add(Value::field()).unwrap_err();
        assert_eq!(
            err,
            BuildError::CountMismatch {
                left: CostExpr::from(2),
                right: CostExpr::one()
            }
        );
    }

    #[test]
    #[should_panic(expected = "addition is not defined for commitment and bool")]
    fn operators_panic_on_incompatible_kinds() {
        let _ = Value::field() + Value::commitment() + Value::boolean();
    }
}
