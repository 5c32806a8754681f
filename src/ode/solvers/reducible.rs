use log::debug;
use num_traits::ToPrimitive;

use crate::error::Unsolvable;
use crate::expr::{Equation, Expr};
use crate::ode::dispatch::SolveContext;
use crate::ode::dsolve::solve_default;
use crate::ode::matcher::MatchRecord;
use crate::ode::normalize::{dummy_name, Ode};
use crate::ode::solvers::{explicit, integrate_times, max_constant};
use crate::simplify::substitute_symbol;

/// Name of the unknown `g = f^(m)` of the reduced equation.
const REDUCED: &str = "_g";

/// `F(x, f^(m), ..., f^(n)) = 0` with `m >= 1`: solve for `g = f^(m)` and
/// integrate `m` times, each step adding a fresh constant.
pub(crate) fn solve(ode: &Ode, record: &MatchRecord, context: &SolveContext) -> Result<Vec<Equation>, Unsolvable> {
    let m = record
        .require("m")?
        .as_integer()
        .and_then(|m| m.to_usize())
        .ok_or_else(|| Unsolvable::new("reduction order is not a positive integer"))?;
    let g = Expr::apply(REDUCED, vec![ode.x()]);
    let mut reduced = ode.to_symbols(&ode.expr);
    for k in m..=ode.order {
        let replacement = match k - m {
            0 => g.clone(),
            j => Expr::Derivative(g.clone().boxed(), ode.var.clone(), j),
        };
        reduced = substitute_symbol(&reduced, &dummy_name(k), &replacement);
    }
    let reduced = Ode::from_expr(&reduced, &g).map_err(|e| Unsolvable::new(e.to_string()))?;
    debug!("reduced to {reduced}");
    let solutions = solve_default(&reduced, context).map_err(|e| Unsolvable::new(e.to_string()))?;

    let mut out = Vec::new();
    for solution in solutions {
        if solution.lhs != g || solution.rhs.has(&g) {
            debug!("skipping implicit reduced solution {solution}");
            continue;
        }
        let first = max_constant(&solution.rhs) + 1;
        let integrated = integrate_times(&solution.rhs, &ode.var, m, first, context);
        out.push(explicit(ode, &integrated));
    }
    if out.is_empty() {
        return Err(Unsolvable::new(format!("no explicit solution for {g}")));
    }
    Ok(out)
}
