use num_traits::{One, Signed, Zero};

use crate::expr::{Expr, Func, Rational};
use crate::polynomial::Poly;
use crate::simplify::fraction;
use crate::simplify::rules::{add_all, func, mul_all, neg, pow};
use crate::solver::solve_rational_system;

/// Partial fraction integration of `p(x)/q(x)` with rational coefficients.
///
/// The denominator must split into rational linear factors and at most one
/// remaining quadratic.
pub(super) fn integrate_rational(expr: &Expr, var: &str) -> Option<Expr> {
    let x = Expr::symbol(var);
    let (numer, denom) = fraction(expr);
    let denom = Poly::from_expr(&denom, &x)?;
    if denom.degree()? == 0 {
        return None;
    }
    let numer = Poly::from_expr(&numer, &x)?;

    let (quotient, remainder) = numer.div_rem(&denom);
    let mut terms = vec![integrate_polynomial(&quotient, &x)];
    if remainder.is_zero() {
        return Some(add_all(terms));
    }

    let lc = denom.leading_coeff();
    let denom = denom.monic();
    let remainder = remainder.scale(&(Rational::one() / lc));

    let roots = denom.rational_roots();
    let mut rest = denom.clone();
    for (r, m) in &roots {
        let linear = linear_factor(r);
        for _ in 0..*m {
            rest = rest.div_exact(&linear)?;
        }
    }
    let quadratic = match rest.degree()? {
        0 => None,
        2 => Some(rest),
        _ => return None,
    };

    // One basis numerator per unknown, so that remainder = sum(unknown_k * basis_k).
    let mut basis: Vec<Poly> = Vec::new();
    for (r, m) in &roots {
        for j in 1..=*m {
            basis.push(denom.div_exact(&linear_factor(r).pow(j))?);
        }
    }
    if let Some(q) = &quadratic {
        let cofactor = denom.div_exact(q)?;
        basis.push(cofactor.clone() * Poly::monomial(Rational::one(), 1));
        basis.push(cofactor);
    }

    let n = denom.degree()?;
    let matrix: Vec<Vec<Rational>> = (0..n)
        .map(|power| basis.iter().map(|b| b.coeff(power)).collect())
        .collect();
    let rhs: Vec<Rational> = (0..n).map(|power| remainder.coeff(power)).collect();
    let unknowns = solve_rational_system(matrix, rhs)?;

    let mut next = unknowns.into_iter();
    for (r, m) in &roots {
        let shifted = add_all(vec![x.clone(), Expr::Constant(-r.clone())]);
        for j in 1..=*m {
            let a = next.next()?;
            if a.is_zero() {
                continue;
            }
            if j == 1 {
                terms.push(mul_all(vec![Expr::Constant(a), func(Func::Log, shifted.clone())]));
            } else {
                let k = Rational::from_integer((j as i64 - 1).into());
                terms.push(mul_all(vec![
                    Expr::Constant(-a / k.clone()),
                    pow(shifted.clone(), Expr::Constant(-k)),
                ]));
            }
        }
    }
    if let Some(q) = &quadratic {
        let b = next.next()?;
        let c = next.next()?;
        terms.push(integrate_quadratic_term(&b, &c, q, &x));
    }
    Some(add_all(terms))
}

fn linear_factor(root: &Rational) -> Poly {
    Poly::from_constant(-root.clone()) + Poly::monomial(Rational::one(), 1)
}

fn integrate_polynomial(poly: &Poly, x: &Expr) -> Expr {
    add_all(
        poly.coeff_entries()
            .map(|(power, coeff)| {
                let next = Rational::from_integer(((power + 1) as i64).into());
                mul_all(vec![
                    Expr::Constant(coeff / next),
                    pow(x.clone(), Expr::integer((power + 1) as i64)),
                ])
            })
            .collect(),
    )
}

/// Antiderivative of `(b*x + c) / (x^2 + p*x + s)`.
fn integrate_quadratic_term(b: &Rational, c: &Rational, q: &Poly, x: &Expr) -> Expr {
    let two = Rational::from_integer(2.into());
    let p = q.coeff(1);
    let s = q.coeff(0);
    let half_p = p.clone() / two.clone();
    let mut terms = Vec::new();
    if !b.is_zero() {
        terms.push(mul_all(vec![
            Expr::Constant(b.clone() / two.clone()),
            func(Func::Log, q.to_expr(x)),
        ]));
    }

    let rest = c.clone() - b.clone() * half_p.clone();
    if rest.is_zero() {
        return add_all(terms);
    }
    // x^2 + p*x + s = (x + p/2)^2 + k
    let k = s - half_p.clone() * half_p.clone();
    let shifted = add_all(vec![x.clone(), Expr::Constant(half_p)]);
    let half = Expr::constant(1, 2);
    if k.is_positive() {
        let root = pow(Expr::Constant(k), half);
        terms.push(mul_all(vec![
            Expr::Constant(rest),
            pow(root.clone(), Expr::integer(-1)),
            func(Func::Atan, mul_all(vec![shifted, pow(root, Expr::integer(-1))])),
        ]));
    } else {
        let m = pow(Expr::Constant(-k), half);
        let lower = func(Func::Log, add_all(vec![shifted.clone(), neg(m.clone())]));
        let upper = func(Func::Log, add_all(vec![shifted, m.clone()]));
        terms.push(mul_all(vec![
            Expr::Constant(rest / two),
            pow(m, Expr::integer(-1)),
            add_all(vec![lower, neg(upper)]),
        ]));
    }
    add_all(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculus::differentiate;
    use crate::expr::{int, sym};
    use crate::simplify::equivalent;

    #[test]
    fn splits_distinct_linear_factors() {
        let x = sym("x");
        // 1 / (x^2 - 1)
        let integrand = pow(pow(x.clone(), int(2)) - int(1), int(-1));
        let result = integrate_rational(&integrand, "x").expect("partial fractions");
        assert!(equivalent(&differentiate(&result, "x"), &integrand));
    }

    #[test]
    fn irreducible_quadratic_gives_arctangent() {
        let x = sym("x");
        let integrand = pow(pow(x.clone(), int(2)) + int(1), int(-1));
        let result = integrate_rational(&integrand, "x").expect("partial fractions");
        assert_eq!(result, func(Func::Atan, x));
    }
}
