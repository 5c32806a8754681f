use crate::error::Unsolvable;
use crate::expr::{Equation, Expr, Func};
use crate::ode::dispatch::SolveContext;
use crate::ode::matcher::MatchRecord;
use crate::ode::normalize::Ode;
use crate::ode::solvers::{antiderivative, constant, implicit, y_name};
use crate::simplify::rules::{add_all, func, mul_all, neg};

/// `y'' + G(y)*y'^2 + H(x)*y' = 0`:
/// `∫ exp(∫G dy) dy + C1*∫ exp(-∫H dx) dx + C2 = 0`.
pub(crate) fn solve(ode: &Ode, record: &MatchRecord, context: &SolveContext) -> Result<Vec<Equation>, Unsolvable> {
    let g = record.require("G")?;
    let h = record.require("H")?;
    let y = y_name();
    let dependent = antiderivative(&func(Func::Exp, antiderivative(g, &y, context)), &y, context);
    let independent = antiderivative(
        &func(Func::Exp, neg(antiderivative(h, &ode.var, context))),
        &ode.var,
        context,
    );
    let lhs = add_all(vec![dependent, mul_all(vec![constant(1), independent]), constant(2)]);
    Ok(vec![implicit(ode, &lhs, &Expr::integer(0))])
}
