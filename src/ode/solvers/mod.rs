//! One routine per hint. Routines return raw solutions; merging constants,
//! pending integrals and solving for the unknown happen in post-processing.

pub(crate) mod algebraic;
pub(crate) mod euler;
pub(crate) mod exact;
pub(crate) mod first_order;
pub(crate) mod homogeneous;
pub mod lie;
pub(crate) mod linear_constant;
pub(crate) mod liouville;
pub(crate) mod reducible;
pub(crate) mod riccati;
pub(crate) mod series;

use crate::calculus::{differentiate, integrate, try_integrate};
use crate::error::Unsolvable;
use crate::expr::{Equation, Expr, Func};
use crate::ode::dispatch::SolveContext;
use crate::ode::normalize::{dummy, Ode};
use crate::simplify::rules::{add_all, func, mul_all, neg, pow};
use crate::simplify::{cancel, factor_terms, is_identically_zero, substitute_symbol};

/// Arbitrary constant `Ck`.
pub(crate) fn constant(k: usize) -> Expr {
    Expr::Symbol(format!("C{k}"))
}

/// Whether `name` is one of the reserved arbitrary constants `C1, C2, ...`.
pub fn is_constant_name(name: &str) -> bool {
    name.strip_prefix('C')
        .map(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

/// Placeholder for the unknown, `_d0`.
pub(crate) fn y() -> Expr {
    dummy(0)
}

pub(crate) fn y_name() -> String {
    crate::ode::normalize::dummy_name(0)
}

/// `∫ expr d(var)`, evaluated unless the context asks for unevaluated integrals.
pub(crate) fn antiderivative(expr: &Expr, var: &str, context: &SolveContext) -> Expr {
    if context.evaluate_integrals {
        integrate(expr, var)
    } else {
        Expr::Integral(expr.clone().boxed(), var.to_string(), None)
    }
}

/// Antiderivative that must exist in closed form, whatever the context says.
pub(crate) fn closed_antiderivative(expr: &Expr, var: &str) -> Result<Expr, Unsolvable> {
    try_integrate(expr, var).ok_or_else(|| Unsolvable::new(format!("cannot integrate {expr} d{var}")))
}

/// `∫ expr d(var)` as a function of `var`, then evaluated at `upper`.
pub(crate) fn antiderivative_at(expr: &Expr, var: &str, upper: &Expr, context: &SolveContext) -> Expr {
    substitute_symbol(&antiderivative(expr, var, context), var, upper)
}

pub(crate) fn quotient(numer: Expr, denom: Expr) -> Expr {
    cancel(&mul_all(vec![numer, pow(denom, Expr::integer(-1))]))
}

/// First order equations linear in the derivative, `P + Q*y' = 0`, in the
/// placeholder variables. `None` when the derivative enters non-linearly or
/// `Q` vanishes.
pub(crate) fn first_order_form(ode: &Ode) -> Option<(Expr, Expr)> {
    if ode.order != 1 {
        return None;
    }
    let expr = ode.to_symbols(&ode.expr);
    let p_name = crate::ode::normalize::dummy_name(1);
    let q = differentiate(&expr, &p_name);
    if q.has_symbol(&p_name) && !is_identically_zero(&differentiate(&q, &p_name)) {
        return None;
    }
    let q = cancel(&q);
    if is_identically_zero(&q) {
        return None;
    }
    let p = cancel(&substitute_symbol(&expr, &p_name, &Expr::integer(0)));
    if p.has_symbol(&p_name) || q.has_symbol(&p_name) {
        return None;
    }
    Some((p, q))
}

/// `y' = h(x, y)` for a first order form `P + Q*y' = 0`.
pub(crate) fn slope(p: &Expr, q: &Expr) -> Expr {
    quotient(neg(p.clone()), q.clone())
}

/// `f(x) = rhs`, with placeholders mapped back to the unknown.
pub(crate) fn explicit(ode: &Ode, rhs: &Expr) -> Equation {
    Equation::new(ode.func.clone(), ode.from_symbols(rhs))
}

/// `lhs = rhs` in the placeholders, mapped back to the unknown.
pub(crate) fn implicit(ode: &Ode, lhs: &Expr, rhs: &Expr) -> Equation {
    Equation::new(ode.from_symbols(lhs), ode.from_symbols(rhs))
}

/// Repeated antiderivative `n` times, adding a fresh constant after each
/// step: `∫∫ g = G + C_a*x + C_b`.
pub(crate) fn integrate_times(
    expr: &Expr,
    var: &str,
    n: usize,
    first_constant: usize,
    context: &SolveContext,
) -> Expr {
    let mut out = expr.clone();
    for k in 0..n {
        out = antiderivative(&out, var, context) + constant(first_constant + k);
    }
    out
}

/// Largest `k` such that `Ck` occurs in `expr`.
pub(crate) fn max_constant(expr: &Expr) -> usize {
    expr.free_symbols()
        .iter()
        .filter(|s| is_constant_name(s))
        .filter_map(|s| s[1..].parse::<usize>().ok())
        .max()
        .unwrap_or(0)
}

/// `expr = X(x)*Y(y)`, returned as `(X, Y)`. Constant factors go to `X`.
pub(crate) fn separate_variables(expr: &Expr, x: &str, y: &str) -> Option<(Expr, Expr)> {
    [expr.clone(), factor_terms(&cancel(expr)), factor_terms(expr)]
        .iter()
        .find_map(|candidate| split_factors(candidate, x, y))
}

fn split_factors(expr: &Expr, x: &str, y: &str) -> Option<(Expr, Expr)> {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for factor in expr.factors() {
        match (factor.has_symbol(x), factor.has_symbol(y)) {
            (_, false) => xs.push(factor),
            (false, true) => ys.push(factor),
            (true, true) => match &factor {
                // exp(a(x) + b(y)) = exp(a(x))*exp(b(y))
                Expr::Func(Func::Exp, arg) => {
                    let (mut ax, mut ay) = (Vec::new(), Vec::new());
                    for term in arg.terms() {
                        match (term.has_symbol(x), term.has_symbol(y)) {
                            (true, true) => return None,
                            (_, false) => ax.push(term),
                            (false, true) => ay.push(term),
                        }
                    }
                    xs.push(func(Func::Exp, add_all(ax)));
                    ys.push(func(Func::Exp, add_all(ay)));
                }
                Expr::Pow(base, e) if !e.has_symbol(x) && !e.has_symbol(y) => {
                    let (bx, by) = split_factors(&factor_terms(base), x, y)?;
                    xs.push(pow(bx, (**e).clone()));
                    ys.push(pow(by, (**e).clone()));
                }
                _ => return None,
            },
        }
    }
    Some((mul_all(xs), mul_all(ys)))
}
