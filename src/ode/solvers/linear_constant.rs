//! Linear equations `Σ c_k*f^(k) = F(x)` with constant coefficients:
//! characteristic roots, undetermined coefficients and variation of
//! parameters. The basis and particular-solution helpers are shared with
//! the Euler solvers.

use std::collections::BTreeMap;

use log::{debug, trace};
use num_traits::ToPrimitive;

use crate::calculus::{differentiate, differentiate_n};
use crate::error::Unsolvable;
use crate::expr::{Equation, Expr, Func};
use crate::ode::dispatch::SolveContext;
use crate::ode::matcher::MatchRecord;
use crate::ode::normalize::Ode;
use crate::ode::solvers::{antiderivative, constant, explicit, quotient};
use crate::polynomial::{Polynomial, Root};
use crate::simplify::rules::{add_all, func, mul_all, neg, pow};
use crate::simplify::{equivalent, expand, is_free_of, is_identically_zero, simplify, substitute_many};
use crate::solver::{determinant, solve_linear_system, LinearResult};

/// `c0..=c{order}` from a match record.
pub(crate) fn coefficients(record: &MatchRecord, order: usize) -> Result<Vec<Expr>, Unsolvable> {
    (0..=order).map(|k| record.require(&format!("c{k}")).cloned()).collect()
}

/// Roots of `Σ c_k*m^k`, failing unless all of them are found.
pub(crate) fn characteristic_roots(coefficients: &[Expr]) -> Result<Vec<Root>, Unsolvable> {
    let poly = coefficients
        .iter()
        .enumerate()
        .fold(Polynomial::<Expr>::zero(), |acc, (k, c)| acc + Polynomial::monomial(c.clone(), k));
    let degree = poly.degree().unwrap_or(0);
    let roots = poly
        .roots()
        .ok_or_else(|| Unsolvable::new("cannot find the roots of the characteristic polynomial"))?;
    let found: usize = roots
        .iter()
        .map(|r| if r.is_real() { r.multiplicity } else { 2 * r.multiplicity })
        .sum();
    if found != degree {
        return Err(Unsolvable::new(format!("found {found} of {degree} characteristic roots")));
    }
    debug!("characteristic roots {roots:?}");
    Ok(roots)
}

/// `x^i*exp(r*x)` for a real root of multiplicity `m`, `i < m`;
/// `x^i*exp(a*x)*sin(b*x)` and `x^i*exp(a*x)*cos(b*x)` for `a ± i*b`.
pub(crate) fn basis(roots: &[Root], t: &Expr) -> Vec<Expr> {
    let mut out = Vec::new();
    for root in roots {
        let growth = func(Func::Exp, mul_all(vec![root.re.clone(), t.clone()]));
        for i in 0..root.multiplicity {
            let power = pow(t.clone(), Expr::integer(i as i64));
            if root.is_real() {
                out.push(mul_all(vec![power, growth.clone()]));
            } else {
                let angle = mul_all(vec![root.im.clone(), t.clone()]);
                out.push(mul_all(vec![power.clone(), growth.clone(), func(Func::Sin, angle.clone())]));
                out.push(mul_all(vec![power, growth.clone(), func(Func::Cos, angle)]));
            }
        }
    }
    out
}

/// `C1*y1 + C2*y2 + ...`
pub(crate) fn general_solution(basis: &[Expr]) -> Expr {
    add_all(
        basis
            .iter()
            .enumerate()
            .map(|(i, y)| mul_all(vec![constant(i + 1), y.clone()]))
            .collect(),
    )
}

/// `x^degree*exp(rate*x)`, times `sin/cos(frequency*x)` when present, and
/// every lower power of `x`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TrialFamily {
    pub degree: usize,
    pub rate: Expr,
    pub frequency: Option<Expr>,
}

/// Families spanning `F` and all its derivatives, or `None` when some term
/// of `F` does not generate a finite set.
pub(crate) fn trial_families(forcing: &Expr, var: &str) -> Option<Vec<TrialFamily>> {
    let mut families: Vec<TrialFamily> = Vec::new();
    for term in expand(&split_arguments(forcing, var)).terms() {
        let mut family = TrialFamily {
            degree: 0,
            rate: Expr::integer(0),
            frequency: None,
        };
        for factor in term.factors() {
            if is_free_of(&factor, var) {
                continue;
            }
            match &factor {
                Expr::Symbol(s) if s == var => family.degree += 1,
                Expr::Pow(base, e) if base.as_symbol() == Some(var) => {
                    family.degree += e.as_integer()?.to_usize().filter(|k| *k > 0)?;
                }
                Expr::Func(Func::Exp, arg) => {
                    family.rate = add_all(vec![family.rate, linear_rate(arg, var)?]);
                }
                Expr::Func(Func::Sin | Func::Cos, arg) if family.frequency.is_none() => {
                    let b = linear_rate(arg, var)?;
                    family.frequency = Some(if b.could_extract_minus_sign() { neg(b) } else { b });
                }
                _ => return None,
            }
        }
        match families
            .iter_mut()
            .find(|f| equivalent(&f.rate, &family.rate) && same_frequency(&f.frequency, &family.frequency))
        {
            Some(existing) => existing.degree = existing.degree.max(family.degree),
            None => families.push(family),
        }
    }
    Some(families)
}

fn same_frequency(a: &Option<Expr>, b: &Option<Expr>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => equivalent(a, b),
        _ => false,
    }
}

/// `d(arg)/dx` when `arg` is affine in `x`.
fn linear_rate(arg: &Expr, var: &str) -> Option<Expr> {
    let rate = simplify(&differentiate(arg, var));
    is_free_of(&rate, var).then_some(rate)
}

/// Pull `x`-free parts out of exponential and trigonometric arguments:
/// `exp(x + c) = exp(c)*exp(x)`, `sin(x + c) = sin(x)*cos(c) + cos(x)*sin(c)`.
fn split_arguments(expr: &Expr, var: &str) -> Expr {
    let expr = expr.map_children(|c| split_arguments(c, var));
    let Expr::Func(f, arg) = &expr else {
        return expr;
    };
    let (fixed, moving): (Vec<Expr>, Vec<Expr>) = arg.terms().into_iter().partition(|t| is_free_of(t, var));
    if fixed.is_empty() || moving.is_empty() {
        return expr;
    }
    let (c, d) = (add_all(fixed), add_all(moving));
    match f {
        Func::Exp => mul_all(vec![func(Func::Exp, c), func(Func::Exp, d)]),
        Func::Sin => add_all(vec![
            mul_all(vec![func(Func::Sin, d.clone()), func(Func::Cos, c.clone())]),
            mul_all(vec![func(Func::Cos, d), func(Func::Sin, c)]),
        ]),
        Func::Cos => add_all(vec![
            mul_all(vec![func(Func::Cos, d.clone()), func(Func::Cos, c.clone())]),
            neg(mul_all(vec![func(Func::Sin, d), func(Func::Sin, c)])),
        ]),
        _ => expr.clone(),
    }
}

/// Trial functions, each family raised by `x^s` where `s` is the
/// multiplicity of `rate ± i*frequency` as a characteristic root.
fn trial_functions(families: &[TrialFamily], roots: &[Root], t: &Expr) -> Vec<Expr> {
    let mut out = Vec::new();
    for family in families {
        let resonance = roots
            .iter()
            .find(|r| {
                equivalent(&r.re, &family.rate)
                    && match &family.frequency {
                        None => r.is_real(),
                        Some(b) => !r.is_real() && equivalent(&r.im, b),
                    }
            })
            .map(|r| r.multiplicity)
            .unwrap_or(0);
        let growth = func(Func::Exp, mul_all(vec![family.rate.clone(), t.clone()]));
        for j in 0..=family.degree {
            let power = pow(t.clone(), Expr::integer((j + resonance) as i64));
            match &family.frequency {
                None => out.push(mul_all(vec![power, growth.clone()])),
                Some(b) => {
                    let angle = mul_all(vec![b.clone(), t.clone()]);
                    out.push(mul_all(vec![power.clone(), growth.clone(), func(Func::Sin, angle.clone())]));
                    out.push(mul_all(vec![power, growth.clone(), func(Func::Cos, angle)]));
                }
            }
        }
    }
    out
}

/// Particular solution of `Σ c_k*y^(k) = F` by undetermined coefficients.
pub(crate) fn undetermined_particular(
    coefficients: &[Expr],
    forcing: &Expr,
    roots: &[Root],
    var: &str,
) -> Result<Expr, Unsolvable> {
    let families =
        trial_families(forcing, var).ok_or_else(|| Unsolvable::new(format!("{forcing} has no finite trial set")))?;
    let t = Expr::symbol(var);
    let functions = trial_functions(&families, roots, &t);
    let names: Vec<String> = (0..functions.len()).map(|i| format!("_a{i}")).collect();
    let trial = add_all(
        names
            .iter()
            .zip(&functions)
            .map(|(name, phi)| mul_all(vec![Expr::symbol(name), phi.clone()]))
            .collect(),
    );
    trace!("trial function {trial}");
    let mut applied: Vec<Expr> = coefficients
        .iter()
        .enumerate()
        .map(|(k, c)| mul_all(vec![c.clone(), differentiate_n(&trial, var, k)]))
        .collect();
    applied.push(neg(forcing.clone()));
    let residual = expand(&split_arguments(&add_all(applied), var));
    let equations = collect_by_function(&residual, var);
    let values = match solve_linear_system(&equations, &names) {
        LinearResult::Unique(solution) => solution.values,
        LinearResult::Infinite(family) => family.particular,
        LinearResult::Inconsistent(_) | LinearResult::NonLinear(_) => {
            return Err(Unsolvable::new("undetermined coefficients have no solution"))
        }
    };
    let pairs: Vec<(Expr, Expr)> = names.iter().cloned().map(Expr::Symbol).zip(values).collect();
    Ok(substitute_many(&trial, &pairs))
}

/// Coefficients of the distinct `x`-dependent factors of an expanded sum.
fn collect_by_function(expr: &Expr, var: &str) -> Vec<Expr> {
    let mut groups: BTreeMap<Expr, Vec<Expr>> = BTreeMap::new();
    for term in expr.terms() {
        let (free, dependent): (Vec<Expr>, Vec<Expr>) = term.factors().into_iter().partition(|f| is_free_of(f, var));
        groups.entry(mul_all(dependent)).or_default().push(mul_all(free));
    }
    groups.into_values().map(add_all).collect()
}

/// `Σ y_i*∫ W_i/W * F dx` for `y^(n) + ... = F`, with `W_i` the Wronskian
/// whose `i`-th column is replaced by `(0, ..., 0, 1)`.
pub(crate) fn variation_particular(
    basis: &[Expr],
    forcing: &Expr,
    var: &str,
    context: &SolveContext,
) -> Result<Expr, Unsolvable> {
    let n = basis.len();
    let rows: Vec<Vec<Expr>> = (0..n)
        .map(|i| basis.iter().map(|y| differentiate_n(y, var, i)).collect())
        .collect();
    let wronskian = simplify(&determinant(&rows));
    if is_identically_zero(&wronskian) {
        return Err(Unsolvable::new("the Wronskian of the basis vanishes"));
    }
    debug!("Wronskian {wronskian}");
    let mut terms = Vec::with_capacity(n);
    for (i, y) in basis.iter().enumerate() {
        let mut replaced = rows.clone();
        for (r, row) in replaced.iter_mut().enumerate() {
            row[i] = Expr::integer(i64::from(r + 1 == n));
        }
        let minor = simplify(&determinant(&replaced));
        let integrand = simplify(&quotient(mul_all(vec![minor, forcing.clone()]), wronskian.clone()));
        terms.push(mul_all(vec![y.clone(), antiderivative(&integrand, var, context)]));
    }
    Ok(add_all(terms))
}

pub(crate) fn homogeneous(ode: &Ode, record: &MatchRecord, _context: &SolveContext) -> Result<Vec<Equation>, Unsolvable> {
    let coefficients = coefficients(record, ode.order)?;
    let roots = characteristic_roots(&coefficients)?;
    let solution = general_solution(&basis(&roots, &ode.x()));
    Ok(vec![explicit(ode, &solution)])
}

pub(crate) fn undetermined_coefficients(
    ode: &Ode,
    record: &MatchRecord,
    _context: &SolveContext,
) -> Result<Vec<Equation>, Unsolvable> {
    let coefficients = coefficients(record, ode.order)?;
    let forcing = record.require("F")?;
    let roots = characteristic_roots(&coefficients)?;
    let particular = undetermined_particular(&coefficients, forcing, &roots, &ode.var)?;
    let solution = add_all(vec![general_solution(&basis(&roots, &ode.x())), particular]);
    Ok(vec![explicit(ode, &solution)])
}

pub(crate) fn variation_of_parameters(
    ode: &Ode,
    record: &MatchRecord,
    context: &SolveContext,
) -> Result<Vec<Equation>, Unsolvable> {
    let coefficients = coefficients(record, ode.order)?;
    let forcing = record.require("F")?;
    let roots = characteristic_roots(&coefficients)?;
    let basis = basis(&roots, &ode.x());
    let leading = coefficients[ode.order].clone();
    let particular = variation_particular(&basis, &quotient(forcing.clone(), leading), &ode.var, context)?;
    let solution = add_all(vec![general_solution(&basis), particular]);
    Ok(vec![explicit(ode, &solution)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn parse(s: &str) -> Expr {
        parse_expr(s).expect("parse")
    }

    #[test]
    fn trial_families_merge_polynomial_degrees() {
        let families = trial_families(&parse("x^2 + 3*x + exp(2*x)"), "x").expect("finite");
        assert_eq!(families.len(), 2);
        let polynomial = families.iter().find(|f| f.rate.is_zero()).expect("polynomial family");
        assert_eq!(polynomial.degree, 2);
        assert!(trial_families(&parse("log(x)"), "x").is_none());
    }

    #[test]
    fn repeated_root_basis() {
        let roots = characteristic_roots(&[parse("1"), parse("-2"), parse("1")]).expect("roots");
        let basis = basis(&roots, &Expr::symbol("x"));
        assert_eq!(basis, vec![parse("exp(x)"), parse("x*exp(x)")]);
    }
}
