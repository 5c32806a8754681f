//! Rational-function normal forms: common denominators, cancellation and
//! extraction of common factors.

use std::collections::{BTreeMap, BTreeSet};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use crate::expr::{Expr, Func, Rational};
use crate::polynomial::Poly;
use crate::simplify::expand;
use crate::simplify::rules::{add_all, mul_all, pow};

/// Split an expression into numerator and denominator without combining sums.
pub fn numer_denom(expr: &Expr) -> (Expr, Expr) {
    let mut numer = Vec::new();
    let mut denom = Vec::new();
    for factor in expr.factors() {
        match factor {
            Expr::Constant(c) => {
                numer.push(Expr::Constant(Rational::from_integer(c.numer().clone())));
                denom.push(Expr::Constant(Rational::from_integer(c.denom().clone())));
            }
            Expr::Pow(base, e) if e.could_extract_minus_sign() => {
                denom.push(pow(*base, mul_all(vec![Expr::integer(-1), *e])));
            }
            Expr::Func(Func::Exp, arg) if arg.could_extract_minus_sign() => {
                denom.push(Expr::Func(
                    Func::Exp,
                    mul_all(vec![Expr::integer(-1), *arg]).boxed(),
                ));
            }
            other => numer.push(other),
        }
    }
    (mul_all(numer), mul_all(denom))
}

/// Numerator and denominator after bringing everything over a common denominator.
pub fn fraction(expr: &Expr) -> (Expr, Expr) {
    numer_denom(&together(expr))
}

/// Denominator factors keyed by base with rational exponent, plus an integer part.
struct DenomFactors {
    integer: BigInt,
    powers: BTreeMap<Expr, Rational>,
}

impl DenomFactors {
    fn of(denom: &Expr) -> Self {
        let mut integer = BigInt::one();
        let mut powers = BTreeMap::new();
        for factor in denom.factors() {
            let (base, exp) = base_exponent(&factor);
            match base {
                Expr::Constant(c) if exp.is_one() && c.is_integer() => {
                    integer *= c.to_integer();
                }
                base => {
                    *powers.entry(base).or_insert_with(Rational::zero) += exp;
                }
            }
        }
        DenomFactors { integer, powers }
    }

    fn to_expr(&self) -> Expr {
        let mut factors = vec![Expr::Constant(Rational::from_integer(self.integer.clone()))];
        for (base, exp) in &self.powers {
            factors.push(pow(base.clone(), Expr::Constant(exp.clone())));
        }
        mul_all(factors)
    }
}

/// `(base, exponent)` of a factor, folding `exp(k*u)` into `(exp(u), k)`.
fn base_exponent(factor: &Expr) -> (Expr, Rational) {
    match factor {
        Expr::Pow(base, e) => match &**e {
            Expr::Constant(k) => ((**base).clone(), k.clone()),
            _ => (factor.clone(), Rational::one()),
        },
        Expr::Func(Func::Exp, arg) => {
            let k = arg.coefficient();
            if k.is_one() || matches!(**arg, Expr::Add(_)) {
                (factor.clone(), Rational::one())
            } else {
                let unit = mul_all(vec![Expr::Constant(k.recip()), (**arg).clone()]);
                (Expr::Func(Func::Exp, unit.boxed()), k)
            }
        }
        other => (other.clone(), Rational::one()),
    }
}

/// Combine the terms of every sum over a common denominator.
pub fn together(expr: &Expr) -> Expr {
    let expr = match expr {
        Expr::Constant(_) | Expr::Symbol(_) | Expr::Wild(_) => return expr.clone(),
        Expr::Integral(..) | Expr::Derivative(..) => return expr.clone(),
        other => other.map_children(together),
    };
    let Expr::Add(terms) = &expr else {
        return expr;
    };

    let parts: Vec<(Expr, DenomFactors)> = terms
        .iter()
        .map(|t| {
            let (n, d) = numer_denom(t);
            (n, DenomFactors::of(&d))
        })
        .collect();
    if parts.iter().all(|(_, d)| d.integer.is_one() && d.powers.is_empty()) {
        return expr;
    }

    let mut common = DenomFactors {
        integer: BigInt::one(),
        powers: BTreeMap::new(),
    };
    for (_, d) in &parts {
        common.integer = common.integer.lcm(&d.integer);
        for (base, exp) in &d.powers {
            let slot = common
                .powers
                .entry(base.clone())
                .or_insert_with(|| exp.clone());
            if exp > slot {
                *slot = exp.clone();
            }
        }
    }

    let numerator_terms = parts
        .into_iter()
        .map(|(n, d)| {
            let mut factors = vec![
                n,
                Expr::Constant(Rational::new(common.integer.clone(), d.integer.clone())),
            ];
            for (base, exp) in &common.powers {
                let own = d.powers.get(base).cloned().unwrap_or_else(Rational::zero);
                let missing = exp.clone() - own;
                if !missing.is_zero() {
                    factors.push(pow(base.clone(), Expr::Constant(missing)));
                }
            }
            mul_all(factors)
        })
        .collect();
    let numerator = add_all(numerator_terms);
    mul_all(vec![numerator, pow(common.to_expr(), Expr::integer(-1))])
}

/// Reduce a rational expression to lowest terms where a common factor can be
/// found, either syntactically or through a univariate polynomial gcd.
pub fn cancel(expr: &Expr) -> Expr {
    let (numer, denom) = fraction(expr);
    let numer = expand(&numer);
    let denom = expand(&denom);
    if numer.is_zero() {
        return numer;
    }
    if denom.is_one() {
        return numer;
    }
    if let Some((n, d)) = polynomial_cancel(&numer, &denom) {
        return mul_all(vec![factor_terms(&n), pow(factor_terms(&d), Expr::integer(-1))]);
    }
    mul_all(vec![
        factor_terms(&numer),
        pow(factor_terms(&denom), Expr::integer(-1)),
    ])
}

fn polynomial_cancel(numer: &Expr, denom: &Expr) -> Option<(Expr, Expr)> {
    let mut gens = kernels(numer);
    gens.extend(kernels(denom));
    if gens.len() != 1 {
        return None;
    }
    let gen = gens.into_iter().next()?;
    let n = Poly::from_expr(numer, &gen)?;
    let d = Poly::from_expr(denom, &gen)?;
    let g = Poly::gcd(&n, &d);
    if g.degree().unwrap_or(0) == 0 {
        return None;
    }
    let n = n.div_exact(&g)?;
    let d = d.div_exact(&g)?;
    Some((n.to_expr(&gen), d.to_expr(&gen)))
}

/// Non-numeric atoms a polynomial in `expr` would be built from.
pub(crate) fn kernels(expr: &Expr) -> BTreeSet<Expr> {
    let mut out = BTreeSet::new();
    collect_kernels(expr, &mut out);
    out
}

fn collect_kernels(expr: &Expr, out: &mut BTreeSet<Expr>) {
    match expr {
        Expr::Constant(_) => {}
        Expr::Add(items) | Expr::Mul(items) => {
            for item in items {
                collect_kernels(item, out);
            }
        }
        Expr::Pow(base, e) if e.as_integer().map(|k| k.is_positive()).unwrap_or(false) => {
            collect_kernels(base, out)
        }
        other => {
            out.insert(other.clone());
        }
    }
}

/// Pull the factors common to every term of a sum out in front of it.
pub fn factor_terms(expr: &Expr) -> Expr {
    let expr = match expr {
        Expr::Add(_) => expr.clone(),
        Expr::Constant(_) | Expr::Symbol(_) | Expr::Wild(_) => return expr.clone(),
        Expr::Integral(..) | Expr::Derivative(..) => return expr.clone(),
        other => return other.map_children(factor_terms),
    };
    let terms = expr.terms();

    let mut common: Option<BTreeMap<Expr, Rational>> = None;
    let mut numer_gcd = BigInt::zero();
    let mut denom_lcm = BigInt::one();
    let mut maps = Vec::with_capacity(terms.len());
    for term in &terms {
        let coeff = term.coefficient();
        numer_gcd = numer_gcd.gcd(coeff.numer());
        denom_lcm = denom_lcm.lcm(coeff.denom());
        let mut powers: BTreeMap<Expr, Rational> = BTreeMap::new();
        for factor in term.factors() {
            if factor.is_constant() {
                continue;
            }
            let (base, exp) = base_exponent(&factor);
            *powers.entry(base).or_insert_with(Rational::zero) += exp;
        }
        common = Some(match common {
            None => powers.clone(),
            Some(prev) => prev
                .into_iter()
                .filter_map(|(base, exp)| {
                    let other = powers.get(&base)?;
                    let lowest = if *other < exp { other.clone() } else { exp };
                    Some((base, lowest))
                })
                .collect(),
        });
        maps.push(powers);
    }

    let content = if numer_gcd.is_zero() {
        Rational::one()
    } else {
        Rational::new(numer_gcd, denom_lcm)
    };
    let common = common.unwrap_or_default();
    let common: BTreeMap<Expr, Rational> = common.into_iter().filter(|(_, e)| !e.is_zero()).collect();
    if common.is_empty() && content.is_one() {
        return expr;
    }

    let mut extracted = vec![Expr::Constant(content.clone())];
    for (base, exp) in &common {
        extracted.push(pow(base.clone(), Expr::Constant(exp.clone())));
    }
    let extracted = mul_all(extracted);
    let inverse = pow(extracted.clone(), Expr::integer(-1));
    let inner = add_all(
        terms
            .into_iter()
            .map(|t| mul_all(vec![t, inverse.clone()]))
            .collect(),
    );
    mul_all(vec![extracted, inner])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{int, sym};

    #[test]
    fn together_combines_simple_fractions() {
        let x = sym("x");
        let e = pow(x.clone(), int(-1)) + int(1);
        let (n, d) = fraction(&e);
        assert_eq!(n, x.clone() + int(1));
        assert_eq!(d, x);
    }

    #[test]
    fn cancel_removes_polynomial_gcd() {
        let x = sym("x");
        let n = pow(x.clone(), int(2)) - int(1);
        let d = x.clone() - int(1);
        let e = n * pow(d, int(-1));
        assert_eq!(cancel(&e), x + int(1));
    }
}
