//! Separable, linear, Bernoulli, almost linear and reduced separable
//! first order equations.

use crate::error::Unsolvable;
use crate::expr::{Equation, Expr, Func};
use crate::ode::dispatch::SolveContext;
use crate::ode::matcher::MatchRecord;
use crate::ode::normalize::Ode;
use crate::ode::solvers::{antiderivative, antiderivative_at, constant, explicit, implicit, quotient, y, y_name};
use crate::simplify::rules::{add_all, func, mul_all, neg, pow};

/// `y' = X(x)*Y(y)`: `∫ dy/Y(y) = ∫ X(x) dx + C1`.
pub(crate) fn separable(ode: &Ode, record: &MatchRecord, context: &SolveContext) -> Result<Vec<Equation>, Unsolvable> {
    let x_part = record.require("X")?;
    let y_part = record.require("Y")?;
    let lhs = antiderivative(&quotient(Expr::integer(1), y_part.clone()), &y_name(), context);
    let rhs = antiderivative(x_part, &ode.var, context) + constant(1);
    Ok(vec![implicit(ode, &lhs, &rhs)])
}

/// `y' + a(x)*y = b(x)` through the integrating factor `exp(∫a)`.
pub(crate) fn linear(ode: &Ode, record: &MatchRecord, context: &SolveContext) -> Result<Vec<Equation>, Unsolvable> {
    let a = record.require("a")?;
    let b = record.require("b")?;
    let solution = linear_solution(a, b, &ode.var, 1, context);
    Ok(vec![explicit(ode, &solution)])
}

/// General solution of `u' + a*u = b` with the constant `C{k}`.
pub(crate) fn linear_solution(a: &Expr, b: &Expr, var: &str, k: usize, context: &SolveContext) -> Expr {
    let exponent = antiderivative(a, var, context);
    let factor = func(Func::Exp, exponent.clone());
    let inverse = func(Func::Exp, neg(exponent));
    let integral = antiderivative(&mul_all(vec![b.clone(), factor]), var, context);
    mul_all(vec![add_all(vec![integral, constant(k)]), inverse])
}

/// `y' + P(x)*y = Q(x)*y^n`: `w = y^(1-n)` satisfies a linear equation.
pub(crate) fn bernoulli(ode: &Ode, record: &MatchRecord, context: &SolveContext) -> Result<Vec<Equation>, Unsolvable> {
    let p = record.require("P")?;
    let q = record.require("Q")?;
    let n = record.require("n")?;
    let t = add_all(vec![Expr::integer(1), neg(n.clone())]);
    if t.is_zero() {
        return Err(Unsolvable::new("Bernoulli exponent 1 is a linear equation"));
    }
    // w' + (1-n)*P*w = (1-n)*Q
    let w = linear_solution(
        &mul_all(vec![t.clone(), p.clone()]),
        &mul_all(vec![t.clone(), q.clone()]),
        &ode.var,
        1,
        context,
    );
    let solution = pow(w, pow(t, Expr::integer(-1)));
    Ok(vec![explicit(ode, &solution)])
}

/// `a(x)*g'(y)*y' + b(x)*g(y) + c(x) = 0`: `u = g(y)` is linear.
pub(crate) fn almost_linear(ode: &Ode, record: &MatchRecord, context: &SolveContext) -> Result<Vec<Equation>, Unsolvable> {
    let a = record.require("a")?;
    let b = record.require("b")?;
    let c = record.require("c")?;
    let g = record.require("g")?;
    let u = linear_solution(
        &quotient(b.clone(), a.clone()),
        &quotient(neg(c.clone()), a.clone()),
        &ode.var,
        1,
        context,
    );
    Ok(vec![implicit(ode, g, &u)])
}

/// `y' = (y/x)*H(x^n*y)`: with `v = x^n*y`, `∫ dv/(v*(n + H(v))) = log(x) + C1`.
pub(crate) fn separable_reduced(
    ode: &Ode,
    record: &MatchRecord,
    context: &SolveContext,
) -> Result<Vec<Equation>, Unsolvable> {
    let n = record.require("power")?;
    let h = record.require("H")?;
    let v = Expr::symbol(REDUCED_VARIABLE);
    let integrand = pow(
        mul_all(vec![v, add_all(vec![n.clone(), h.clone()])]),
        Expr::integer(-1),
    );
    let upper = mul_all(vec![pow(ode.x(), n.clone()), y()]);
    let lhs = antiderivative_at(&integrand, REDUCED_VARIABLE, &upper, context);
    let rhs = func(Func::Log, ode.x()) + constant(1);
    Ok(vec![implicit(ode, &lhs, &rhs)])
}

/// Variable of `H` in a reduced separable match record.
pub(crate) const REDUCED_VARIABLE: &str = "_v";
