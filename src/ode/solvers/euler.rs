//! Cauchy-Euler equations `Σ a_k*x^k*f^(k) = F(x)`. The substitution
//! `x = exp(t)` turns them into constant coefficient equations whose
//! characteristic polynomial is `Σ a_k*m*(m-1)*...*(m-k+1)`.

use crate::error::Unsolvable;
use crate::expr::{Equation, Expr, Func};
use crate::ode::dispatch::SolveContext;
use crate::ode::matcher::MatchRecord;
use crate::ode::normalize::Ode;
use crate::ode::solvers::linear_constant::{
    basis, characteristic_roots, general_solution, undetermined_particular, variation_particular,
};
use crate::ode::solvers::{explicit, quotient};
use crate::polynomial::Polynomial;
use crate::simplify::rules::{add_all, func, mul_all, pow};
use crate::simplify::substitute_symbol;

/// `t = log(x)`.
pub(crate) const T: &str = "_t";

/// `a0..=a{order}` from a match record.
fn euler_coefficients(record: &MatchRecord, order: usize) -> Result<Vec<Expr>, Unsolvable> {
    (0..=order).map(|k| record.require(&format!("a{k}")).cloned()).collect()
}

/// Coefficients in `m` of `Σ a_k*m*(m-1)*...*(m-k+1)`.
pub(crate) fn characteristic_coefficients(euler: &[Expr]) -> Vec<Expr> {
    let m = Polynomial::<Expr>::monomial(Expr::integer(1), 1);
    let mut falling = Polynomial::<Expr>::one();
    let mut total = Polynomial::<Expr>::zero();
    for (k, a) in euler.iter().enumerate() {
        if k > 0 {
            falling = falling * (m.clone() + Polynomial::from_constant(Expr::integer(1 - k as i64)));
        }
        total = total + falling.scale(a);
    }
    (0..euler.len()).map(|k| total.coeff(k)).collect()
}

/// Back from `t = log(x)`.
fn in_x(expr: &Expr, ode: &Ode) -> Expr {
    substitute_symbol(expr, T, &func(Func::Log, ode.x()))
}

/// `x^r*log(x)^i` for real roots, `x^a*log(x)^i*sin(b*log(x))` and the
/// cosine partner for complex ones.
fn euler_basis(ode: &Ode, characteristic: &[Expr]) -> Result<Vec<Expr>, Unsolvable> {
    let roots = characteristic_roots(characteristic)?;
    Ok(basis(&roots, &Expr::symbol(T)).iter().map(|b| in_x(b, ode)).collect())
}

pub(crate) fn homogeneous(ode: &Ode, record: &MatchRecord, _context: &SolveContext) -> Result<Vec<Equation>, Unsolvable> {
    let characteristic = characteristic_coefficients(&euler_coefficients(record, ode.order)?);
    let solution = general_solution(&euler_basis(ode, &characteristic)?);
    Ok(vec![explicit(ode, &solution)])
}

/// Undetermined coefficients on the constant coefficient equation in `t`,
/// with forcing `F(exp(t))`.
pub(crate) fn undetermined_coefficients(
    ode: &Ode,
    record: &MatchRecord,
    _context: &SolveContext,
) -> Result<Vec<Equation>, Unsolvable> {
    let characteristic = characteristic_coefficients(&euler_coefficients(record, ode.order)?);
    let forcing = record.require("F")?;
    let roots = characteristic_roots(&characteristic)?;
    let forcing_t = substitute_symbol(forcing, &ode.var, &func(Func::Exp, Expr::symbol(T)));
    let particular = undetermined_particular(&characteristic, &forcing_t, &roots, T)?;
    let homogeneous: Vec<Expr> = basis(&roots, &Expr::symbol(T)).iter().map(|b| in_x(b, ode)).collect();
    let solution = add_all(vec![general_solution(&homogeneous), in_x(&particular, ode)]);
    Ok(vec![explicit(ode, &solution)])
}

/// Variation of parameters with the Euler basis and forcing `F/(a_n*x^n)`.
pub(crate) fn variation_of_parameters(
    ode: &Ode,
    record: &MatchRecord,
    context: &SolveContext,
) -> Result<Vec<Equation>, Unsolvable> {
    let euler = euler_coefficients(record, ode.order)?;
    let forcing = record.require("F")?;
    let basis = euler_basis(ode, &characteristic_coefficients(&euler))?;
    let leading = mul_all(vec![euler[ode.order].clone(), pow(ode.x(), Expr::integer(ode.order as i64))]);
    let particular = variation_particular(&basis, &quotient(forcing.clone(), leading), &ode.var, context)?;
    let solution = add_all(vec![general_solution(&basis), particular]);
    Ok(vec![explicit(ode, &solution)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falling_factorial_characteristic() {
        // x^2*y'' - 2*x*y' + 2*y: m^2 - 3*m + 2
        let euler = vec![Expr::integer(2), Expr::integer(-2), Expr::integer(1)];
        assert_eq!(
            characteristic_coefficients(&euler),
            vec![Expr::integer(2), Expr::integer(-3), Expr::integer(1)]
        );
    }
}
