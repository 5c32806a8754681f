//! Equations that factor into pieces `g(x, f^(k)) = 0`, each solvable for a
//! single derivative which is then integrated back.

use log::debug;

use crate::calculus::differentiate_n;
use crate::error::Unsolvable;
use crate::expr::{Equation, Expr};
use crate::ode::dispatch::SolveContext;
use crate::ode::matcher::MatchRecord;
use crate::ode::normalize::{dummy, dummy_name, Ode};
use crate::ode::solvers::{explicit, integrate_times, is_constant_name};
use crate::simplify::rules::{add_all, neg};
use crate::simplify::{factor_terms, fraction, is_free_of, substitute_symbol};
use crate::solver::{solve_for, solve_linear_system, LinearResult};

/// Roots `(k, g)` with `f^(k)(x) = g(x)` for every factor of the equation
/// that mentions the unknown. `None` unless every such factor involves a
/// single derivative order and can be inverted.
pub(crate) fn algebraic_roots(ode: &Ode) -> Option<Vec<(usize, Expr)>> {
    let expr = ode.to_symbols(&ode.expr);
    let (numer, _) = fraction(&expr);
    let mut roots = Vec::new();
    for factor in factor_terms(&numer).factors() {
        let orders: Vec<usize> = (0..=ode.order)
            .filter(|k| factor.has_symbol(&dummy_name(*k)))
            .collect();
        let k = match orders.as_slice() {
            [] => continue,
            [k] => *k,
            _ => return None,
        };
        let solutions = solve_for(&factor, &dummy(k));
        if solutions.is_empty() {
            return None;
        }
        roots.extend(solutions.into_iter().map(|g| (k, g)));
    }
    if roots.is_empty() {
        None
    } else {
        Some(roots)
    }
}

/// Integrate each root back to `f`; drop solutions that are special cases of
/// another one.
pub(crate) fn solve(ode: &Ode, _record: &MatchRecord, context: &SolveContext) -> Result<Vec<Equation>, Unsolvable> {
    let roots = algebraic_roots(ode).ok_or_else(|| Unsolvable::new("equation is not algebraic in a derivative"))?;
    let mut candidates: Vec<Expr> = Vec::new();
    for (k, g) in roots {
        let solution = integrate_times(&g, &ode.var, k, 1, context);
        if !candidates.contains(&solution) {
            candidates.push(solution);
        }
    }
    let mut dropped = vec![false; candidates.len()];
    for i in 0..candidates.len() {
        let special = (0..candidates.len())
            .any(|j| j != i && !dropped[j] && is_special_case(&candidates[i], &candidates[j], ode));
        dropped[i] = special;
    }
    let kept: Vec<&Expr> = candidates
        .iter()
        .zip(&dropped)
        .filter(|(_, dropped)| !**dropped)
        .map(|(s, _)| s)
        .collect();
    if kept.len() < candidates.len() {
        debug!("dropped {} special case solution(s)", candidates.len() - kept.len());
    }
    Ok(kept.iter().map(|s| explicit(ode, s)).collect())
}

/// Whether constants of `general` can be chosen, independently of `x`, so
/// that `general` and its first `order` derivatives agree with `special`.
fn is_special_case(special: &Expr, general: &Expr, ode: &Ode) -> bool {
    let unknowns: Vec<String> = general
        .free_symbols()
        .into_iter()
        .filter(|s| is_constant_name(s))
        .collect();
    if unknowns.is_empty() {
        return false;
    }
    // Constants of the special solution are parameters, not unknowns.
    let special = special
        .free_symbols()
        .into_iter()
        .filter(|s| is_constant_name(s))
        .fold(special.clone(), |acc, name| {
            substitute_symbol(&acc, &name, &Expr::symbol(format!("_s{name}")))
        });
    let difference = add_all(vec![general.clone(), neg(special)]);
    let equations: Vec<Expr> = (0..=ode.order)
        .map(|k| differentiate_n(&difference, &ode.var, k))
        .collect();
    let values = match solve_linear_system(&equations, &unknowns) {
        LinearResult::Unique(solution) => solution.values,
        LinearResult::Infinite(family) => family.particular,
        LinearResult::Inconsistent(_) | LinearResult::NonLinear(_) => return false,
    };
    values.iter().all(|v| is_free_of(v, &ode.var))
}
