//! Antiderivatives of elementary expressions.
//!
//! Each strategy is tried in a fixed order; the first one producing a result
//! wins. When every strategy declines, [`integrate`] returns an unevaluated
//! [`Expr::Integral`].

mod parts;
mod rational;
mod substitution;
mod table;
mod trig;

use log::trace;
use num_traits::Signed;

use crate::calculus::differentiate;
use crate::expr::Expr;
use crate::simplify::rules::{add_all, mul_all};
use crate::simplify::{cancel, expand};

/// Nested strategy calls beyond this depth give up.
const MAX_DEPTH: usize = 5;
/// Integrands larger than this are not expanded.
const EXPAND_SIZE_LIMIT: usize = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Direct,
    Linearity,
    Expansion,
    IntegrationByParts,
    ExpTrig,
    ProductToSum,
    PartialFractions,
    Substitution,
}

const STRATEGIES: [Strategy; 8] = [
    Strategy::Direct,
    Strategy::Linearity,
    Strategy::IntegrationByParts,
    Strategy::ExpTrig,
    Strategy::ProductToSum,
    Strategy::PartialFractions,
    Strategy::Substitution,
    Strategy::Expansion,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    Succeeded,
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationAttempt {
    pub strategy: Strategy,
    pub status: AttemptStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrationResult {
    Integrated {
        result: Expr,
        attempts: Vec<IntegrationAttempt>,
    },
    NotIntegrable(Vec<IntegrationAttempt>),
}

/// Antiderivative of `expr` with respect to `var`, or an unevaluated integral.
pub fn integrate(expr: &Expr, var: &str) -> Expr {
    try_integrate(expr, var)
        .unwrap_or_else(|| Expr::Integral(expr.clone().boxed(), var.to_string(), None))
}

pub fn try_integrate(expr: &Expr, var: &str) -> Option<Expr> {
    match integrate_report(expr, var) {
        IntegrationResult::Integrated { result, .. } => Some(result),
        IntegrationResult::NotIntegrable(_) => None,
    }
}

/// Run the strategies in order and report which ones were tried.
pub fn integrate_report(expr: &Expr, var: &str) -> IntegrationResult {
    let mut attempts = Vec::new();
    for strategy in STRATEGIES {
        let outcome = run_strategy(strategy, expr, var, 0);
        let status = if outcome.is_some() {
            AttemptStatus::Succeeded
        } else {
            AttemptStatus::NotApplicable
        };
        attempts.push(IntegrationAttempt { strategy, status });
        if let Some(result) = outcome {
            trace!("integrated {expr} d{var} by {strategy:?}");
            return IntegrationResult::Integrated { result, attempts };
        }
    }
    trace!("no antiderivative found for {expr} d{var}");
    IntegrationResult::NotIntegrable(attempts)
}

pub(crate) fn integrate_inner(expr: &Expr, var: &str, depth: usize) -> Option<Expr> {
    if depth > MAX_DEPTH {
        return None;
    }
    STRATEGIES
        .iter()
        .find_map(|s| run_strategy(*s, expr, var, depth))
}

fn run_strategy(strategy: Strategy, expr: &Expr, var: &str, depth: usize) -> Option<Expr> {
    match strategy {
        Strategy::Direct => {
            if !expr.has_symbol(var) {
                return Some(mul_all(vec![expr.clone(), Expr::symbol(var)]));
            }
            table::integrate_table(expr, var)
        }
        Strategy::Linearity => linearity(expr, var, depth),
        Strategy::IntegrationByParts => parts::integrate_by_parts(expr, var, depth),
        Strategy::ExpTrig => trig::integrate_exp_trig(expr, var),
        Strategy::ProductToSum => trig::integrate_product_to_sum(expr, var, depth),
        Strategy::PartialFractions => rational::integrate_rational(expr, var),
        Strategy::Substitution => substitution::integrate_by_substitution(expr, var, depth),
        Strategy::Expansion => {
            if expr.size() > EXPAND_SIZE_LIMIT {
                return None;
            }
            let expanded = expand(expr);
            if expanded != *expr {
                return integrate_inner(&expanded, var, depth + 1);
            }
            let cancelled = cancel(expr);
            if cancelled != *expr && cancelled.size() <= expr.size() {
                return integrate_inner(&cancelled, var, depth + 1);
            }
            None
        }
    }
}

/// Integrate sums term by term and pull out factors free of `var`.
fn linearity(expr: &Expr, var: &str, depth: usize) -> Option<Expr> {
    match expr {
        Expr::Add(terms) => {
            let parts: Option<Vec<Expr>> = terms
                .iter()
                .map(|t| integrate_inner(t, var, depth + 1))
                .collect();
            parts.map(add_all)
        }
        Expr::Mul(factors) => {
            let (free, dependent): (Vec<Expr>, Vec<Expr>) =
                factors.iter().cloned().partition(|f| !f.has_symbol(var));
            if free.is_empty() {
                return None;
            }
            let rest = mul_all(dependent);
            let integrated = integrate_inner(&rest, var, depth + 1)?;
            let mut out = free;
            out.push(integrated);
            Some(mul_all(out))
        }
        _ => None,
    }
}

/// `(a, b)` with `expr = a*var + b`, both free of `var`, `a != 0`.
pub(crate) fn affine(expr: &Expr, var: &str) -> Option<(Expr, Expr)> {
    let a = differentiate(expr, var);
    if a.is_zero() || a.has_symbol(var) {
        return None;
    }
    let b = expr.clone() - mul_all(vec![a.clone(), Expr::symbol(var)]);
    let b = expand(&b);
    if b.has_symbol(var) {
        return None;
    }
    Some((a, b))
}

/// Whether `expr` is a polynomial in `var` with coefficients free of `var`.
pub(crate) fn is_polynomial_in(expr: &Expr, var: &str) -> bool {
    match expr {
        e if !e.has_symbol(var) => true,
        Expr::Symbol(s) => s == var,
        Expr::Add(items) | Expr::Mul(items) => items.iter().all(|i| is_polynomial_in(i, var)),
        Expr::Pow(base, e) => {
            e.as_integer().map(|k| !k.is_negative()).unwrap_or(false) && is_polynomial_in(base, var)
        }
        _ => false,
    }
}
