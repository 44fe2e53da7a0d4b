use std::iter::{Product, Sum};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_traits::{One, Zero};

use super::{Coefficient, CostExpr, Symbol};

macro_rules! impl_from_int {
    ($($int:ty),*) => {
        $(
            impl From<$int> for CostExpr {
                fn from(value: $int) -> Self {
                    CostExpr::constant(Coefficient::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i32, i64, i128, u32, u64);

impl From<usize> for CostExpr {
    fn from(value: usize) -> Self {
        // usize is at most 64 bits wide on all supported targets
        CostExpr::constant(value as Coefficient)
    }
}

impl From<Symbol> for CostExpr {
    fn from(symbol: Symbol) -> Self {
        CostExpr::symbol(&symbol)
    }
}

impl From<&Symbol> for CostExpr {
    fn from(symbol: &Symbol) -> Self {
        CostExpr::symbol(symbol)
    }
}

impl From<&CostExpr> for CostExpr {
    fn from(expr: &CostExpr) -> Self {
        expr.clone()
    }
}

/// Implements a binary operator for all combinations of owned and borrowed cost expressions as
/// well as integers and symbols on either side.
macro_rules! impl_binary_op {
    ($op:ident, $method:ident, $inner:ident) => {
        impl $op<CostExpr> for CostExpr {
            type Output = CostExpr;
            fn $method(self, rhs: CostExpr) -> CostExpr {
                self.$inner(&rhs)
            }
        }

        impl $op<&CostExpr> for CostExpr {
            type Output = CostExpr;
            fn $method(self, rhs: &CostExpr) -> CostExpr {
                self.$inner(rhs)
            }
        }

        impl $op<CostExpr> for &CostExpr {
            type Output = CostExpr;
            fn $method(self, rhs: CostExpr) -> CostExpr {
                self.$inner(&rhs)
            }
        }

        impl $op<&CostExpr> for &CostExpr {
            type Output = CostExpr;
            fn $method(self, rhs: &CostExpr) -> CostExpr {
                self.$inner(rhs)
            }
        }

        impl_binary_op!(@convert $op, $method, $inner, i64);
        impl_binary_op!(@convert $op, $method, $inner, Symbol);
        impl_binary_op!(@convert $op, $method, $inner, &Symbol);

        impl $op<CostExpr> for i64 {
            type Output = CostExpr;
            fn $method(self, rhs: CostExpr) -> CostExpr {
                CostExpr::from(self).$inner(&rhs)
            }
        }

        impl $op<&CostExpr> for i64 {
            type Output = CostExpr;
            fn $method(self, rhs: &CostExpr) -> CostExpr {
                CostExpr::from(self).$inner(rhs)
            }
        }

        impl $op<CostExpr> for &Symbol {
            type Output = CostExpr;
            fn $method(self, rhs: CostExpr) -> CostExpr {
                CostExpr::from(self).$inner(&rhs)
            }
        }

        impl $op<&Symbol> for &Symbol {
            type Output = CostExpr;
            fn $method(self, rhs: &Symbol) -> CostExpr {
                CostExpr::from(self).$inner(&CostExpr::from(rhs))
            }
        }

        impl $op<i64> for &Symbol {
            type Output = CostExpr;
            fn $method(self, rhs: i64) -> CostExpr {
                CostExpr::from(self).$inner(&CostExpr::from(rhs))
            }
        }
    };
    (@convert $op:ident, $method:ident, $inner:ident, $rhs:ty) => {
        impl $op<$rhs> for CostExpr {
            type Output = CostExpr;
            fn $method(self, rhs: $rhs) -> CostExpr {
                self.$inner(&CostExpr::from(rhs))
            }
        }

        impl $op<$rhs> for &CostExpr {
            type Output = CostExpr;
            fn $method(self, rhs: $rhs) -> CostExpr {
                self.$inner(&CostExpr::from(rhs))
            }
        }
    };
}

impl_binary_op!(Add, add, add_expr);
impl_binary_op!(Sub, sub, sub_expr);
impl_binary_op!(Mul, mul, mul_expr);

macro_rules! impl_assign_op {
    ($op:ident, $method:ident, $inner:ident) => {
        impl<T: Into<CostExpr>> $op<T> for CostExpr {
            fn $method(&mut self, rhs: T) {
                *self = self.$inner(&rhs.into());
            }
        }
    };
}

impl_assign_op!(AddAssign, add_assign, add_expr);
impl_assign_op!(SubAssign, sub_assign, sub_expr);
impl_assign_op!(MulAssign, mul_assign, mul_expr);

impl Neg for CostExpr {
    type Output = CostExpr;

    fn neg(self) -> CostExpr {
        CostExpr::zero().sub_expr(&self)
    }
}

impl Neg for &CostExpr {
    type Output = CostExpr;

    fn neg(self) -> CostExpr {
        CostExpr::zero().sub_expr(self)
    }
}

impl Sum for CostExpr {
    fn sum<I: Iterator<Item = CostExpr>>(iter: I) -> Self {
        iter.fold(CostExpr::zero(), |acc, expr| acc.add_expr(&expr))
    }
}

impl<'a> Sum<&'a CostExpr> for CostExpr {
    fn sum<I: Iterator<Item = &'a CostExpr>>(iter: I) -> Self {
        iter.fold(CostExpr::zero(), |acc, expr| acc.add_expr(expr))
    }
}

impl Product for CostExpr {
    fn product<I: Iterator<Item = CostExpr>>(iter: I) -> Self {
        iter.fold(CostExpr::one(), |acc, expr| acc.mul_expr(&expr))
    }
}

impl<'a> Product<&'a CostExpr> for CostExpr {
    fn product<I: Iterator<Item = &'a CostExpr>>(iter: I) -> Self {
        iter.fold(CostExpr::one(), |acc, expr| acc.mul_expr(expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_operands() {
        let n = Symbol::new("n");
        let a = &n * 2 + 1;
        let b = 2 * CostExpr::from(&n) + CostExpr::from(1);
        assert_eq!(a, b);
        assert_eq!(&n - &n, CostExpr::zero());

        let mut acc = CostExpr::zero();
        acc += &n;
        acc *= 3;
        acc -= 1;
        assert_eq!(acc, 3 * CostExpr::from(&n) - 1);
    }

    #[test]
    fn unsigned_constants_do_not_wrap() {
        let expr = CostExpr::from(u64::MAX);
        assert_eq!(expr.as_constant(), Some(Coefficient::from(u64::MAX)));
        assert_eq!(CostExpr::from(usize::MAX).as_constant(), Some(usize::MAX as Coefficient));
    }

    #[test]
    fn sum_and_product() {
        let n = Symbol::new("n");
        let terms = vec![CostExpr::from(&n), CostExpr::from(2), CostExpr::from(&n)];
        let sum: CostExpr = terms.iter().sum();
        assert_eq!(sum, &n * 2 + 2);
        let product: CostExpr = terms.into_iter().product();
        assert_eq!(product, CostExpr::from(&n).pow(2) * 2);
    }
}
