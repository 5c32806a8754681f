//! Equations with homogeneous coefficients of equal order, solved through
//! `u = y/x` or `u = x/y`, and equations with linear coefficients reduced to
//! them by a shift of origin.

use log::debug;

use crate::error::Unsolvable;
use crate::expr::{Equation, Expr, Func};
use crate::ode::dispatch::SolveContext;
use crate::ode::hints::Hint;
use crate::ode::matcher::MatchRecord;
use crate::ode::normalize::Ode;
use crate::ode::simp::{ode_sol_simplicity, odesimp};
use crate::ode::solvers::{antiderivative_at, constant, implicit, quotient, y, y_name};
use crate::simplify::rules::{add_all, func, mul_all, neg};
use crate::simplify::{is_identically_zero, substitute_symbol};

const U: &str = "_v";

/// `u = y/x`: `log(x) = ∫^(y/x) -Q(1,u)/(P(1,u) + u*Q(1,u)) du + C1`.
pub(crate) fn dep_div_indep(
    ode: &Ode,
    record: &MatchRecord,
    context: &SolveContext,
) -> Result<Vec<Equation>, Unsolvable> {
    let p = record.require("P")?;
    let q = record.require("Q")?;
    let x = ode.x();
    let upper = quotient(y(), x.clone());
    let lhs = func(Func::Log, x);
    let rhs = substituted_integral(p, q, &ode.var, &y_name(), &upper, context)? + constant(1);
    Ok(vec![implicit(ode, &lhs, &rhs)])
}

/// `u = x/y`: `log(y) = ∫^(x/y) -P(u,1)/(u*P(u,1) + Q(u,1)) du + C1`.
pub(crate) fn indep_div_dep(
    ode: &Ode,
    record: &MatchRecord,
    context: &SolveContext,
) -> Result<Vec<Equation>, Unsolvable> {
    let p = record.require("P")?;
    let q = record.require("Q")?;
    let upper = quotient(ode.x(), y());
    let lhs = func(Func::Log, y());
    // Roles of the variables swap: dx/dy = -Q/P.
    let rhs = substituted_integral(q, p, &y_name(), &ode.var, &upper, context)? + constant(1);
    Ok(vec![implicit(ode, &lhs, &rhs)])
}

/// `∫^upper -B(1,u)/(A(1,u) + u*B(1,u)) du` for `A + B*dt/ds = 0`, where
/// `s` is the independent and `t` the dependent variable.
fn substituted_integral(
    a: &Expr,
    b: &Expr,
    s: &str,
    t: &str,
    upper: &Expr,
    context: &SolveContext,
) -> Result<Expr, Unsolvable> {
    let u = Expr::symbol(U);
    let at_unit = |e: &Expr| substitute_symbol(&substitute_symbol(e, t, &u), s, &Expr::integer(1));
    let a1 = at_unit(a);
    let b1 = at_unit(b);
    let denom = add_all(vec![a1, mul_all(vec![u, b1.clone()])]);
    if is_identically_zero(&denom) {
        return Err(Unsolvable::new("substitution leaves no equation in u"));
    }
    let integrand = quotient(neg(b1), denom);
    Ok(antiderivative_at(&integrand, U, upper, context))
}

/// Both substitutions, keeping whichever simplified result ranks simpler.
pub(crate) fn best(ode: &Ode, record: &MatchRecord, context: &SolveContext) -> Result<Vec<Equation>, Unsolvable> {
    let candidates = [
        (Hint::FirstHomogeneousCoeffSubsDepDivIndep, dep_div_indep(ode, record, context)),
        (Hint::FirstHomogeneousCoeffSubsIndepDivDep, indep_div_dep(ode, record, context)),
    ];
    let mut best: Option<(Vec<Equation>, _)> = None;
    let mut last_error = None;
    for (hint, outcome) in candidates {
        let solutions = match outcome {
            Ok(solutions) => odesimp(ode, solutions, hint, true),
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        };
        let rank = solutions
            .iter()
            .map(|s| ode_sol_simplicity(s, &ode.func))
            .max();
        debug!("{hint} ranks {rank:?}");
        let better = match &best {
            Some((_, best_rank)) => rank < *best_rank,
            None => true,
        };
        if better {
            best = Some((solutions, rank));
        }
    }
    match best {
        Some((solutions, _)) => Ok(solutions),
        None => Err(last_error.unwrap_or_else(|| Unsolvable::new("no homogeneous substitution applied"))),
    }
}

/// `y' = (a1*x + b1*y + c1)/(a2*x + b2*y + c2)` shifted to the intersection
/// `(x0, y0)` of the two lines, where it has homogeneous coefficients.
pub(crate) fn linear_coefficients(
    ode: &Ode,
    record: &MatchRecord,
    context: &SolveContext,
) -> Result<Vec<Equation>, Unsolvable> {
    let x0 = record.require("x0")?;
    let y0 = record.require("y0")?;
    let (a1, b1) = (record.require("a1")?, record.require("b1")?);
    let (a2, b2) = (record.require("a2")?, record.require("b2")?);
    let big_x = add_all(vec![ode.x(), neg(x0.clone())]);
    let big_y = add_all(vec![y(), neg(y0.clone())]);

    let (s, t) = ("_X", "_Y");
    let sx = Expr::symbol(s);
    let ty = Expr::symbol(t);
    // P + Q*Y' = 0 with P = -(a1*X + b1*Y) and Q = a2*X + b2*Y.
    let p = neg(add_all(vec![
        mul_all(vec![a1.clone(), sx.clone()]),
        mul_all(vec![b1.clone(), ty.clone()]),
    ]));
    let q = add_all(vec![mul_all(vec![a2.clone(), sx]), mul_all(vec![b2.clone(), ty])]);
    let upper = quotient(big_y, big_x.clone());
    let rhs = substituted_integral(&p, &q, s, t, &upper, context)? + constant(1);
    let lhs = func(Func::Log, big_x);
    Ok(vec![implicit(ode, &lhs, &rhs)])
}
