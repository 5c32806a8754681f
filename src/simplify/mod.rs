//! Symbolic simplification, rational normalization, and substitution utilities.

mod expand;
mod rational;
pub mod rules;
mod substitute;
mod trig;

pub use expand::{expand, expand_with_limit};
pub use rational::{cancel, factor_terms, fraction, numer_denom, together};
pub use substitute::{substitute, substitute_many, substitute_symbol};
pub use trig::eliminate_sin_squares;

use crate::expr::Expr;

/// Pick the smallest of a handful of equivalent rewritings.
pub fn simplify(expr: &Expr) -> Expr {
    if expr.is_constant() || matches!(expr, Expr::Symbol(_)) {
        return expr.clone();
    }
    let cancelled = cancel(expr);
    let candidates = [
        expand(expr),
        factor_terms(&cancelled),
        trig::simplify_trig(&expand(&cancelled)),
        cancelled,
    ];
    let mut best = expr.clone();
    for candidate in candidates {
        if candidate.size() < best.size() {
            best = candidate;
        }
    }
    best
}

/// Sound zero test: `true` only when `expr` is proven identically zero.
///
/// The expression is put over a common denominator, the numerator is
/// expanded and `sin(u)^2` is rewritten through `cos(u)^2`.
pub fn is_identically_zero(expr: &Expr) -> bool {
    if expr.is_zero() {
        return true;
    }
    let (numer, _) = fraction(expr);
    let numer = expand(&numer);
    if numer.is_zero() {
        return true;
    }
    eliminate_sin_squares(&numer).is_zero()
}

/// Whether `a` and `b` are provably equal.
pub fn equivalent(a: &Expr, b: &Expr) -> bool {
    a == b || is_identically_zero(&(a.clone() - b.clone()))
}

/// Whether `expr` is provably free of the variable `var`, i.e. its
/// derivative with respect to `var` vanishes.
pub fn is_free_of(expr: &Expr, var: &str) -> bool {
    if !expr.has_symbol(var) {
        return true;
    }
    is_identically_zero(&crate::calculus::differentiate(expr, var))
}
