//! Truncated power series solutions: Taylor series for first order equations
//! and at ordinary points of second order linear equations, Frobenius series
//! at regular singular points.

use log::{debug, trace};
use num_traits::{Signed, ToPrimitive};

use crate::calculus::differentiate;
use crate::error::Unsolvable;
use crate::expr::{Equation, Expr, Func};
use crate::ode::dispatch::SolveContext;
use crate::ode::matcher::MatchRecord;
use crate::ode::normalize::{dummy, dummy_name, Ode};
use crate::ode::solvers::{constant, explicit, quotient, y_name};
use crate::polynomial::Polynomial;
use crate::simplify::rules::{add_all, mul_all, neg, order, pow};
use crate::simplify::{cancel, is_identically_zero, simplify, substitute_symbol};

/// Whether an evaluated expression hit a pole: `0^-k` or `log(0)`.
pub(crate) fn is_singular(expr: &Expr) -> bool {
    expr.preorder().into_iter().any(|e| match e {
        Expr::Pow(base, exp) => base.is_zero() && exp.as_constant().is_some_and(|c| c.is_negative()),
        Expr::Func(Func::Log, arg) => arg.is_zero(),
        _ => false,
    })
}

fn factorial(n: usize) -> Expr {
    Expr::integer((1..=n as u64).product::<u64>())
}

/// `(x - x0)`
fn shifted(ode: &Ode, x0: &Expr) -> Expr {
    add_all(vec![ode.x(), neg(x0.clone())])
}

fn at_point(expr: &Expr, var: &str, x0: &Expr) -> Expr {
    cancel(&substitute_symbol(expr, var, x0))
}

/// `y' = h(x, y)` around `x0` with `y(x0) = C1`: the `n`-th Taylor
/// coefficient comes from `F_1 = h`, `F_{n+1} = ∂F_n/∂x + h*∂F_n/∂y`.
pub(crate) fn first_order(ode: &Ode, record: &MatchRecord, context: &SolveContext) -> Result<Vec<Equation>, Unsolvable> {
    let h = record.require("h")?;
    let x0 = &context.x0;
    let y = y_name();
    let y0 = constant(1);
    let point = |e: &Expr| cancel(&substitute_symbol(&substitute_symbol(e, &ode.var, x0), &y, &y0));
    let dx = shifted(ode, x0);

    let mut terms = vec![y0.clone()];
    let mut derivative = h.clone();
    for n in 1..context.series_terms {
        let value = point(&derivative);
        if is_singular(&value) {
            debug!("series term {n} is singular at {x0}, stopping");
            break;
        }
        trace!("F_{n}({x0}) = {value}");
        terms.push(mul_all(vec![
            quotient(value, factorial(n)),
            pow(dx.clone(), Expr::integer(n as i64)),
        ]));
        derivative = cancel(&add_all(vec![
            differentiate(&derivative, &ode.var),
            mul_all(vec![h.clone(), differentiate(&derivative, &y)]),
        ]));
    }
    terms.push(order(pow(dx, Expr::integer(context.series_terms as i64))));
    Ok(vec![explicit(ode, &add_all(terms))])
}

/// `a2*y'' + a1*y' + a0*y = 0` around an ordinary point `x0`, `a2(x0) != 0`.
/// Both basis series come from repeatedly applying
/// `D = ∂/∂x + p*∂/∂y + F*∂/∂p` to `y`, where `y'' = F(x, y, p)`.
pub(crate) fn second_order_ordinary(
    ode: &Ode,
    record: &MatchRecord,
    context: &SolveContext,
) -> Result<Vec<Equation>, Unsolvable> {
    let a2 = record.require("a2")?;
    let a1 = record.require("a1")?;
    let a0 = record.require("a0")?;
    let x0 = &context.x0;
    let (y, p) = (dummy_name(0), dummy_name(1));
    let f = quotient(
        neg(add_all(vec![mul_all(vec![a1.clone(), dummy(1)]), mul_all(vec![a0.clone(), dummy(0)])])),
        a2.clone(),
    );
    let dx = shifted(ode, x0);

    let mut first = Vec::new();
    let mut second = Vec::new();
    let mut current = dummy(0);
    for n in 0..context.series_terms {
        let at_x0 = at_point(&current, &ode.var, x0);
        let coefficient = |y0: i64, p0: i64| {
            let value = substitute_symbol(&substitute_symbol(&at_x0, &y, &Expr::integer(y0)), &p, &Expr::integer(p0));
            quotient(value, factorial(n))
        };
        let power = pow(dx.clone(), Expr::integer(n as i64));
        first.push(mul_all(vec![coefficient(1, 0), power.clone()]));
        second.push(mul_all(vec![coefficient(0, 1), power]));
        current = cancel(&add_all(vec![
            differentiate(&current, &ode.var),
            mul_all(vec![dummy(1), differentiate(&current, &y)]),
            mul_all(vec![f.clone(), differentiate(&current, &p)]),
        ]));
    }
    let solution = add_all(vec![
        mul_all(vec![constant(2), add_all(first)]),
        mul_all(vec![constant(1), add_all(second)]),
        order(pow(dx, Expr::integer(context.series_terms as i64))),
    ]);
    Ok(vec![explicit(ode, &solution)])
}

/// `y'' + P*y' + Q*y = 0` around a regular singular point `x0`, where
/// `p = (x - x0)*P` and `q = (x - x0)^2*Q` are analytic. With the indicial
/// roots `r1 >= r2`, each root `r` gives `(x - x0)^r * Σ c_n (x - x0)^n`,
/// `c_n*F(n + r) = -Σ_{k<n} c_k*((k + r)*p_{n-k} + q_{n-k})`.
pub(crate) fn second_order_regular(
    ode: &Ode,
    record: &MatchRecord,
    context: &SolveContext,
) -> Result<Vec<Equation>, Unsolvable> {
    let big_p = record.require("P")?;
    let big_q = record.require("Q")?;
    let x0 = &context.x0;
    let dx = shifted(ode, x0);
    let p = cancel(&mul_all(vec![dx.clone(), big_p.clone()]));
    let q = cancel(&mul_all(vec![pow(dx.clone(), Expr::integer(2)), big_q.clone()]));
    let p_coeffs = taylor_coefficients(&p, &ode.var, x0, context.series_terms)?;
    let q_coeffs = taylor_coefficients(&q, &ode.var, x0, context.series_terms)?;

    let r = Expr::symbol("_r");
    let indicial = |s: &Expr| {
        cancel(&add_all(vec![
            mul_all(vec![s.clone(), add_all(vec![s.clone(), Expr::integer(-1)])]),
            mul_all(vec![p_coeffs[0].clone(), s.clone()]),
            q_coeffs[0].clone(),
        ]))
    };
    let roots = Polynomial::<Expr>::from_expr(&crate::simplify::expand(&indicial(&r)), &r)
        .and_then(|poly| poly.roots())
        .ok_or_else(|| Unsolvable::new("indicial equation has no usable roots"))?;
    if roots.iter().any(|root| !root.is_real()) {
        return Err(Unsolvable::new("complex roots of the indicial equation"));
    }
    let mut exponents: Vec<Expr> = roots.into_iter().map(|root| root.re).collect();
    exponents.sort_by(|a, b| match (a.as_constant(), b.as_constant()) {
        (Some(a), Some(b)) => b.cmp(a),
        _ => std::cmp::Ordering::Equal,
    });
    debug!("indicial exponents {exponents:?}");

    let larger = exponents[0].clone();
    let mut series = vec![frobenius(&larger, &p_coeffs, &q_coeffs, &indicial, None)?];
    if let Some(smaller) = exponents.get(1) {
        let gap = simplify(&add_all(vec![larger.clone(), neg(smaller.clone())]));
        let resonance = gap
            .as_constant()
            .filter(|g| g.is_integer() && g.is_positive())
            .and_then(|g| g.to_integer().to_usize());
        match frobenius(smaller, &p_coeffs, &q_coeffs, &indicial, resonance) {
            Ok(second) => series.push(second),
            Err(e) => debug!("second Frobenius series dropped: {e}"),
        }
    }

    let mut terms = Vec::new();
    for (k, (exponent, coefficients)) in series.into_iter().enumerate() {
        let sum = add_all(
            coefficients
                .into_iter()
                .enumerate()
                .map(|(n, c)| mul_all(vec![c, pow(dx.clone(), Expr::integer(n as i64))]))
                .collect(),
        );
        terms.push(mul_all(vec![constant(k + 1), pow(dx.clone(), exponent), sum]));
    }
    terms.push(order(pow(dx, Expr::integer(context.series_terms as i64))));
    Ok(vec![explicit(ode, &add_all(terms))])
}

/// Coefficients `c_0 = 1, c_1, ...` of the Frobenius series for `exponent`.
/// At the resonant index the series survives only when the recurrence
/// numerator vanishes there, and that coefficient is then left at zero.
fn frobenius(
    exponent: &Expr,
    p: &[Expr],
    q: &[Expr],
    indicial: &dyn Fn(&Expr) -> Expr,
    resonance: Option<usize>,
) -> Result<(Expr, Vec<Expr>), Unsolvable> {
    let mut c = vec![Expr::integer(1)];
    for n in 1..p.len() {
        let numer = cancel(&neg(add_all(
            (0..n)
                .map(|k| {
                    let shifted = add_all(vec![Expr::integer(k as i64), exponent.clone()]);
                    mul_all(vec![
                        c[k].clone(),
                        add_all(vec![mul_all(vec![shifted, p[n - k].clone()]), q[n - k].clone()]),
                    ])
                })
                .collect(),
        )));
        let denom = indicial(&add_all(vec![Expr::integer(n as i64), exponent.clone()]));
        if resonance == Some(n) || is_identically_zero(&denom) {
            if !is_identically_zero(&numer) {
                return Err(Unsolvable::new(format!("resonance at n = {n} with nonzero numerator")));
            }
            c.push(Expr::integer(0));
            continue;
        }
        c.push(quotient(numer, denom));
    }
    Ok((exponent.clone(), c))
}

/// First `n` Taylor coefficients of `expr` at `x0`.
fn taylor_coefficients(expr: &Expr, var: &str, x0: &Expr, n: usize) -> Result<Vec<Expr>, Unsolvable> {
    let mut out = Vec::with_capacity(n);
    let mut current = expr.clone();
    for k in 0..n {
        let value = at_point(&current, var, x0);
        if is_singular(&value) {
            return Err(Unsolvable::new(format!("{expr} is not analytic at {x0}")));
        }
        out.push(quotient(value, factorial(k)));
        current = cancel(&differentiate(&current, var));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    #[test]
    fn detects_poles() {
        let pole = pow(Expr::integer(0), Expr::integer(-1));
        assert!(is_singular(&mul_all(vec![Expr::symbol("a"), pole])));
        assert!(is_singular(&Expr::Func(Func::Log, Expr::integer(0).boxed())));
        assert!(!is_singular(&parse_expr("x + 1").expect("parse")));
    }

    #[test]
    fn taylor_coefficients_of_exponential() {
        let e = parse_expr("exp(x)").expect("parse");
        let coeffs = taylor_coefficients(&e, "x", &Expr::integer(0), 4).expect("analytic");
        let got: Vec<_> = coeffs.iter().map(|c| c.as_constant().cloned()).collect();
        let want: Vec<_> = [(1, 1), (1, 1), (1, 2), (1, 6)]
            .iter()
            .map(|&(n, d)| Some(crate::expr::rational(n, d)))
            .collect();
        assert_eq!(got, want);
    }
}
