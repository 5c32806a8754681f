use crate::calculus::differentiate;
use crate::error::Unsolvable;
use crate::expr::{Equation, Expr};
use crate::ode::dispatch::SolveContext;
use crate::ode::matcher::MatchRecord;
use crate::ode::normalize::Ode;
use crate::ode::solvers::{antiderivative, constant, implicit, y_name};
use crate::simplify::rules::{add_all, neg};
use crate::simplify::{cancel, is_free_of};

/// `P + Q*y' = 0` with `P_y = Q_x` (after any integrating factor):
/// `∫P dx + ∫(Q - ∂/∂y ∫P dx) dy = C1`.
pub(crate) fn solve(ode: &Ode, record: &MatchRecord, context: &SolveContext) -> Result<Vec<Equation>, Unsolvable> {
    let p = record.require("P")?;
    let q = record.require("Q")?;
    let y = y_name();
    let along_x = antiderivative(p, &ode.var, context);
    let remainder = cancel(&add_all(vec![q.clone(), neg(differentiate(&along_x, &y))]));
    if context.evaluate_integrals && !along_x.has_integral() && !is_free_of(&remainder, &ode.var) {
        return Err(Unsolvable::new(format!("{p} + ({q})*y' is not exact")));
    }
    let potential = add_all(vec![along_x, antiderivative(&remainder, &y, context)]);
    Ok(vec![implicit(ode, &potential, &constant(1))])
}
