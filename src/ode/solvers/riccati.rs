use crate::error::Unsolvable;
use crate::expr::{Equation, Expr, Func};
use crate::ode::dispatch::SolveContext;
use crate::ode::matcher::MatchRecord;
use crate::ode::normalize::Ode;
use crate::ode::solvers::{constant, explicit, quotient};
use crate::simplify::rules::{add_all, func, mul_all, neg, pow};

/// `a*y' = -b*y^2 - c*y/x - d/x^2` with constant `a, b, c, d`:
/// `y = (a - c - μ*tan(μ/(2a)*log(x) + C1)) / (2*b*x)` where
/// `μ = sqrt(4*d*b - (a - c)^2)`.
pub(crate) fn solve(ode: &Ode, record: &MatchRecord, _context: &SolveContext) -> Result<Vec<Equation>, Unsolvable> {
    let a = record.require("a")?;
    let b = record.require("b")?;
    let c = record.require("c")?;
    let d = record.require("d")?;
    if b.is_zero() {
        return Err(Unsolvable::new("no quadratic term in the Riccati equation"));
    }
    let a_minus_c = add_all(vec![a.clone(), neg(c.clone())]);
    let mu = pow(
        add_all(vec![
            mul_all(vec![Expr::integer(4), d.clone(), b.clone()]),
            neg(pow(a_minus_c.clone(), Expr::integer(2))),
        ]),
        Expr::constant(1, 2),
    );
    let phase = add_all(vec![
        mul_all(vec![
            quotient(mu.clone(), mul_all(vec![Expr::integer(2), a.clone()])),
            func(Func::Log, ode.x()),
        ]),
        constant(1),
    ]);
    let numer = add_all(vec![a_minus_c, neg(mul_all(vec![mu, func(Func::Tan, phase)]))]);
    let denom = mul_all(vec![Expr::integer(2), b.clone(), ode.x()]);
    let solution = mul_all(vec![numer, pow(denom, Expr::integer(-1))]);
    Ok(vec![explicit(ode, &solution)])
}
