use crate::calculus::differentiate;
use crate::expr::{Expr, Func};
use crate::simplify::rules::{add_all, mul_all, neg};

use super::{affine, integrate_inner, is_polynomial_in, table};

/// Highest polynomial degree handled by the tabular method.
const TABULAR_STEP_LIMIT: usize = 12;

/// Integration by parts for `P(x)*g(u)` with `P` a polynomial: tabular for
/// exponential and trigonometric `g`, one step for logarithms and arctangents.
pub(super) fn integrate_by_parts(expr: &Expr, var: &str, depth: usize) -> Option<Expr> {
    let Expr::Mul(factors) = expr else {
        return None;
    };
    let (poly_factors, rest): (Vec<Expr>, Vec<Expr>) =
        factors.iter().cloned().partition(|f| is_polynomial_in(f, var));
    if rest.len() != 1 || poly_factors.is_empty() {
        return None;
    }
    let poly = mul_all(poly_factors);
    let other = &rest[0];
    match other {
        Expr::Func(Func::Exp | Func::Sin | Func::Cos | Func::Sinh | Func::Cosh, arg) => {
            affine(arg, var)?;
            tabular(&poly, other, var)
        }
        Expr::Pow(base, e) if !base.has_symbol(var) && affine(e, var).is_some() => {
            tabular(&poly, other, var)
        }
        Expr::Func(Func::Log | Func::Atan, arg) => {
            affine(arg, var)?;
            // ∫P g = Q g - ∫Q g' with Q = ∫P.
            let q = integrate_inner(&poly, var, depth + 1)?;
            let dg = differentiate(other, var);
            let remainder = integrate_inner(&mul_all(vec![q.clone(), dg]), var, depth + 1)?;
            Some(add_all(vec![mul_all(vec![q, other.clone()]), neg(remainder)]))
        }
        _ => None,
    }
}

/// `∫P g = Σ (-1)^k P^(k) G_(k+1)` where `G_j` is the `j`-th antiderivative of `g`.
fn tabular(poly: &Expr, g: &Expr, var: &str) -> Option<Expr> {
    let mut terms = Vec::new();
    let mut p = poly.clone();
    let mut antiderivative = table::integrate_table(g, var)?;
    for k in 0..=TABULAR_STEP_LIMIT {
        if p.is_zero() {
            return Some(add_all(terms));
        }
        let sign = if k % 2 == 0 { 1 } else { -1 };
        terms.push(mul_all(vec![Expr::integer(sign), p.clone(), antiderivative.clone()]));
        p = differentiate(&p, var);
        antiderivative = integrate_scaled(&antiderivative, var)?;
    }
    None
}

/// Antiderivative of a constant multiple of a table entry.
fn integrate_scaled(expr: &Expr, var: &str) -> Option<Expr> {
    let (mut free, dependent): (Vec<Expr>, Vec<Expr>) =
        expr.factors().into_iter().partition(|f| !f.has_symbol(var));
    let integrated = table::integrate_table(&mul_all(dependent), var)?;
    free.push(integrated);
    Some(mul_all(free))
}
