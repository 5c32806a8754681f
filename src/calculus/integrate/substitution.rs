use std::collections::BTreeSet;

use crate::calculus::differentiate;
use crate::expr::Expr;
use crate::simplify::rules::{mul_all, pow};
use crate::simplify::{cancel, substitute};

use super::integrate_inner;

/// Upper bound on the candidate inner functions tried per integrand.
const SUBSTITUTION_CANDIDATE_LIMIT: usize = 24;
const DUMMY: &str = "_u";

/// Derivative-divides: find an inner function `u(x)` such that
/// `expr / u'(x)` is a function of `u` alone, integrate in `u` and substitute back.
pub(super) fn integrate_by_substitution(expr: &Expr, var: &str, depth: usize) -> Option<Expr> {
    let dummy = Expr::symbol(DUMMY);
    if expr.has(&dummy) {
        return None;
    }
    for candidate in candidates(expr, var) {
        let du = differentiate(&candidate, var);
        if du.is_zero() {
            continue;
        }
        let ratio = mul_all(vec![expr.clone(), pow(du, Expr::integer(-1))]);
        let in_u = substitute(&ratio, &candidate, &dummy);
        let in_u = if in_u.has_symbol(var) {
            let cancelled = substitute(&cancel(&ratio), &candidate, &dummy);
            if cancelled.has_symbol(var) {
                continue;
            }
            cancelled
        } else {
            in_u
        };
        let Some(integrated) = integrate_inner(&in_u, DUMMY, depth + 1) else {
            continue;
        };
        return Some(substitute(&integrated, &dummy, &candidate));
    }
    None
}

/// Sub-expressions depending on `var`, largest first, skipping `var` itself.
fn candidates(expr: &Expr, var: &str) -> Vec<Expr> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for node in expr.preorder().into_iter().skip(1) {
        if !node.has_symbol(var) || node.as_symbol() == Some(var) || node.is_constant() {
            continue;
        }
        let candidate = match node {
            Expr::Func(_, arg) if arg.as_symbol() != Some(var) => vec![node.clone(), (**arg).clone()],
            Expr::Pow(base, e) if e.is_constant() => vec![(**base).clone()],
            Expr::Pow(..) | Expr::Func(..) => vec![node.clone()],
            Expr::Add(_) => vec![node.clone()],
            _ => Vec::new(),
        };
        for c in candidate {
            if c.as_symbol() == Some(var) || c == *expr {
                continue;
            }
            if seen.insert(c.clone()) {
                out.push(c);
            }
        }
        if out.len() >= SUBSTITUTION_CANDIDATE_LIMIT {
            break;
        }
    }
    out.sort_by_key(|c| std::cmp::Reverse(c.size()));
    out
}
