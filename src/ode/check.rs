//! Verification of candidate solutions by substitution.

use std::collections::BTreeMap;

use log::{debug, trace};
use num_traits::ToPrimitive;

use crate::calculus::{differentiate, differentiate_n};
use crate::expr::{Equation, Expr, Func};
use crate::ode::normalize::{dummy, dummy_name, Ode};
use crate::ode::solvers::is_constant_name;
use crate::simplify::rules::{add_all, PI};
use crate::simplify::{cancel, is_identically_zero, simplify, substitute, substitute_symbol};
use crate::solver::solve_for;

/// Sample points for the numeric fallback.
const SAMPLE_POINTS: [f64; 5] = [0.37, 0.73, 1.29, 1.91, 2.53];
const NUMERIC_TOLERANCE: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The residual was proven identically zero.
    Satisfied,
    /// Not proven zero, but it vanishes at every sample point.
    Inconclusive,
    /// The residual is clearly nonzero somewhere.
    Violated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub verdict: Verdict,
    pub residual: Expr,
}

impl CheckResult {
    fn satisfied() -> Self {
        CheckResult {
            verdict: Verdict::Satisfied,
            residual: Expr::integer(0),
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.verdict == Verdict::Satisfied
    }
}

/// Substitute `solution` back into `ode`. `order` defaults to the order of
/// the equation.
pub fn checkodesol(ode: &Ode, solution: &Equation, order: Option<usize>) -> CheckResult {
    let order = order.unwrap_or(ode.order);
    let mut residual = None;

    for explicit in explicit_forms(ode, solution) {
        let r = substituted(ode, &explicit, order);
        if vanishes(&r) {
            return CheckResult::satisfied();
        }
        residual.get_or_insert(r);
    }

    if order == 1 {
        if let Some(r) = first_order_implicit(ode, solution) {
            if vanishes(&r) {
                return CheckResult::satisfied();
            }
            residual.get_or_insert(r);
        }
    }

    if let Some(r) = back_substitution(ode, solution, order) {
        if vanishes(&r) {
            return CheckResult::satisfied();
        }
        residual.get_or_insert(r);
    }

    let residual = residual.map(|r| simplify(&r)).unwrap_or_else(|| ode.expr.clone());
    let verdict = numeric_verdict(&residual, &ode.var, &ode.func);
    debug!("{solution} against {ode}: {verdict:?}, residual {residual}");
    CheckResult { verdict, residual }
}

fn vanishes(residual: &Expr) -> bool {
    is_identically_zero(residual) || is_identically_zero(&simplify(residual))
}

/// Right-hand sides `g` with `f(x) = g(x)`, from the solution as given or by
/// solving it for the unknown.
fn explicit_forms(ode: &Ode, solution: &Equation) -> Vec<Expr> {
    if solution.lhs == ode.func && !solution.rhs.has(&ode.func) {
        return vec![solution.rhs.clone()];
    }
    if solution.rhs == ode.func && !solution.lhs.has(&ode.func) {
        return vec![solution.lhs.clone()];
    }
    if solution.lhs.has_integral() || solution.rhs.has_integral() {
        return Vec::new();
    }
    solve_for(&solution.residual(), &ode.func)
}

/// `ode` with `f^(k)` replaced by `g^(k)`, highest order first.
fn substituted(ode: &Ode, g: &Expr, order: usize) -> Expr {
    let mut expr = ode.expr.clone();
    for k in (1..=order.max(ode.order)).rev() {
        expr = substitute(&expr, &ode.derivative(k), &differentiate_n(g, &ode.var, k));
    }
    substitute(&expr, &ode.func, g)
}

/// `G(x, y) = 0` gives `y' = -G_x/G_y`; the remaining residual must vanish
/// on the curve, so constants are eliminated through `G = 0` when needed.
fn first_order_implicit(ode: &Ode, solution: &Equation) -> Option<Expr> {
    let g = ode.to_symbols(&solution.residual());
    let y = dummy_name(0);
    let gy = differentiate(&g, &y);
    if is_identically_zero(&gy) {
        return None;
    }
    let slope = cancel(&(-differentiate(&g, &ode.var) / gy));
    let expr = ode.to_symbols(&ode.expr);
    let residual = cancel(&substitute_symbol(&expr, &dummy_name(1), &slope));
    trace!("implicit first order residual {residual}");
    if vanishes(&residual) {
        return Some(residual);
    }
    Some(eliminate_constants(&residual, &g))
}

/// Replace each arbitrary constant by its value from `G = 0`.
fn eliminate_constants(residual: &Expr, g: &Expr) -> Expr {
    let mut out = residual.clone();
    for name in g.free_symbols().into_iter().filter(|s| is_constant_name(s)) {
        if let Some(value) = solve_for(g, &Expr::symbol(&name)).into_iter().next() {
            out = cancel(&substitute_symbol(&out, &name, &value));
        }
    }
    out
}

/// Differentiate `G(x, f) = 0` up to `order` times, solve the `k`-th
/// derivative for `f^(k)` in terms of lower ones and substitute everything
/// into the equation from the highest order down.
fn back_substitution(ode: &Ode, solution: &Equation, order: usize) -> Option<Expr> {
    let g = ode.to_symbols(&solution.residual());
    if !g.has_symbol(&dummy_name(0)) {
        return None;
    }
    // d/dx of an expression in x, y, y', ... along the solution.
    let total = |e: &Expr| {
        let mut terms = vec![differentiate(e, &ode.var)];
        for k in 0..order {
            terms.push(differentiate(e, &dummy_name(k)) * dummy(k + 1));
        }
        add_all(terms)
    };
    let mut values: BTreeMap<usize, Expr> = BTreeMap::new();
    let mut current = g.clone();
    for k in 1..=order {
        current = total(&current);
        let mut relation = current.clone();
        for (j, value) in values.iter().rev() {
            relation = substitute_symbol(&relation, &dummy_name(*j), value);
        }
        let value = solve_for(&relation, &dummy(k)).into_iter().next()?;
        values.insert(k, cancel(&value));
    }
    let mut expr = ode.to_symbols(&ode.expr);
    for (k, value) in values.iter().rev() {
        expr = substitute_symbol(&expr, &dummy_name(*k), value);
    }
    let residual = cancel(&expr);
    if vanishes(&residual) {
        return Some(residual);
    }
    Some(eliminate_constants(&residual, &g))
}

/// Numeric check at a handful of points, with constants `C_k = 0.5 + 0.3*k`.
fn numeric_verdict(residual: &Expr, var: &str, func: &Expr) -> Verdict {
    if residual.has(func) || residual.has_integral() || residual.has_order() {
        return Verdict::Inconclusive;
    }
    if residual.preorder().iter().any(|e| matches!(e, Expr::Derivative(..) | Expr::Apply(..))) {
        return Verdict::Inconclusive;
    }
    let mut bindings: BTreeMap<String, f64> = residual
        .free_symbols()
        .into_iter()
        .filter(|s| is_constant_name(s))
        .filter_map(|s| {
            let k: f64 = s[1..].parse().ok()?;
            Some((s, 0.5 + 0.3 * k))
        })
        .collect();
    bindings.insert(PI.to_string(), std::f64::consts::PI);
    let mut evaluated = 0;
    for point in SAMPLE_POINTS {
        bindings.insert(var.to_string(), point);
        match evaluate(residual, &bindings) {
            Some(value) if value.is_finite() => {
                evaluated += 1;
                if value.abs() > NUMERIC_TOLERANCE {
                    return Verdict::Violated;
                }
            }
            _ => continue,
        }
    }
    trace!("residual vanished at {evaluated} sample point(s)");
    Verdict::Inconclusive
}

/// Floating point value of `expr`, `None` on unbound symbols or domain errors.
fn evaluate(expr: &Expr, bindings: &BTreeMap<String, f64>) -> Option<f64> {
    let value = match expr {
        Expr::Constant(c) => c.to_f64()?,
        Expr::Symbol(s) => *bindings.get(s)?,
        Expr::Add(terms) => terms.iter().map(|t| evaluate(t, bindings)).sum::<Option<f64>>()?,
        Expr::Mul(factors) => factors.iter().map(|f| evaluate(f, bindings)).product::<Option<f64>>()?,
        Expr::Pow(base, exp) => evaluate(base, bindings)?.powf(evaluate(exp, bindings)?),
        Expr::Func(f, arg) => {
            let a = evaluate(arg, bindings)?;
            match f {
                Func::Sin => a.sin(),
                Func::Cos => a.cos(),
                Func::Tan => a.tan(),
                Func::Asin => a.asin(),
                Func::Acos => a.acos(),
                Func::Atan => a.atan(),
                Func::Sinh => a.sinh(),
                Func::Cosh => a.cosh(),
                Func::Tanh => a.tanh(),
                Func::Exp => a.exp(),
                Func::Log => a.ln(),
                Func::Abs => a.abs(),
            }
        }
        _ => return None,
    };
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_equation, parse_expr};

    fn ode(text: &str) -> Ode {
        let eq = parse_equation(text).expect("parse");
        Ode::new(&eq, &parse_expr("f(x)").expect("parse")).expect("ode")
    }

    #[test]
    fn explicit_solution_is_satisfied() {
        let eq = ode("f'(x) = f(x)");
        let sol = parse_equation("f(x) = C1*exp(x)").expect("parse");
        assert!(checkodesol(&eq, &sol, None).is_satisfied());
    }

    #[test]
    fn wrong_solution_is_violated() {
        let eq = ode("f'(x) = f(x)");
        let sol = parse_equation("f(x) = C1*exp(2*x)").expect("parse");
        let result = checkodesol(&eq, &sol, None);
        assert_eq!(result.verdict, Verdict::Violated);
    }

    #[test]
    fn implicit_first_order_solution() {
        // y*y' = -x has circles as solutions.
        let eq = ode("f(x)*f'(x) + x = 0");
        let sol = parse_equation("f(x)^2 + x^2 = C1").expect("parse");
        assert!(checkodesol(&eq, &sol, None).is_satisfied());
    }
}
