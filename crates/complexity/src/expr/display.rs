use std::fmt;

use itertools::Itertools;

use super::{Atom, Coefficient, Condition, CostExpr, Monomial};

impl CostExpr {
    /// Terms ordered by descending degree, ties in canonical order.
    fn display_order(&self) -> Vec<(&Monomial, Coefficient)> {
        self.terms()
            .sorted_by(|(a, _), (b, _)| b.degree().cmp(&a.degree()).then_with(|| a.cmp(b)))
            .collect()
    }

    /// Renders the expression as LaTeX math (without surrounding `$`).
    pub fn to_latex(&self) -> String {
        if self.is_empty() {
            return "0".to_owned();
        }
        let mut out = String::new();
        for (idx, (monomial, coeff)) in self.display_order().into_iter().enumerate() {
            push_sign(&mut out, idx == 0, coeff);
            let abs = coeff.unsigned_abs();
            if monomial.is_constant() {
                out.push_str(&abs.to_string());
                continue;
            }
            if abs != 1 {
                out.push_str(&abs.to_string());
                out.push(' ');
            }
            out.push_str(&monomial.atoms().map(|(atom, exp)| atom_latex(atom, exp)).join(" "));
        }
        out
    }
}

fn push_sign(out: &mut String, first: bool, coeff: Coefficient) {
    match (first, coeff < 0) {
        (true, true) => out.push('-'),
        (true, false) => {}
        (false, true) => out.push_str(" - "),
        (false, false) => out.push_str(" + "),
    }
}

fn atom_latex(atom: &Atom, exp: u32) -> String {
    let base = match atom {
        Atom::Symbol(symbol) => symbol.to_latex(),
        Atom::Log(argument) => format!(r"\log({})", argument.to_latex()),
        Atom::Indicator(condition) => {
            return format!(r"\left[{}\right]", condition_latex(condition));
        }
    };
    match exp {
        1 => base,
        exp => format!("{base}^{{{exp}}}"),
    }
}

fn condition_latex(condition: &Condition) -> String {
    match condition {
        Condition::Positive(expr) => format!("{} > 0", expr.to_latex()),
        Condition::NonPositive(expr) => format!(r"{} \leq 0", expr.to_latex()),
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Symbol(symbol) => write!(f, "{symbol}"),
            Atom::Log(argument) => write!(f, "log({argument})"),
            Atom::Indicator(condition) => write!(f, "[{condition}]"),
        }
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_constant() {
            return f.write_str("1");
        }
        let atoms = self.atoms().format_with("*", |(atom, exp), f| match exp {
            1 => f(&atom),
            exp => f(&format_args!("{atom}^{exp}")),
        });
        write!(f, "{atoms}")
    }
}

impl fmt::Display for CostExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("0");
        }
        for (idx, (monomial, coeff)) in self.display_order().into_iter().enumerate() {
            let mut sign = String::new();
            push_sign(&mut sign, idx == 0, coeff);
            f.write_str(&sign)?;
            let abs = coeff.unsigned_abs();
            match (monomial.is_constant(), abs) {
                (true, abs) => write!(f, "{abs}")?,
                (false, 1) => write!(f, "{monomial}")?,
                (false, abs) => write!(f, "{abs}*{monomial}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CostExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CostExpr({self})")
    }
}
