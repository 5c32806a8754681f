//! Post-processing of raw solutions: pending integrals, constant absorption,
//! explicit solving for the unknown and canonical constant numbering.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, trace};
use num_traits::One;

use crate::calculus::try_integrate;
use crate::expr::{Equation, Expr, Func, Rational};
use crate::ode::hints::Hint;
use crate::ode::normalize::Ode;
use crate::ode::solvers::is_constant_name;
use crate::simplify::rules::{add_all, func, mul_all, pow};
use crate::simplify::{simplify as simplify_expr, substitute_symbol};
use crate::solver::solve_for;

/// Rounds of constant absorption before giving up on a fixpoint.
const MAX_ABSORB_ROUNDS: usize = 8;

/// Finish the raw output of a solver routine.
///
/// Pending integrals are evaluated unless `hint` is an `_Integral` variant.
/// With `simplify`, implicit solutions are solved for the unknown where
/// possible and both sides are simplified. Constants are always absorbed and
/// renumbered.
pub fn odesimp(ode: &Ode, solutions: Vec<Equation>, hint: Hint, simplify: bool) -> Vec<Equation> {
    let mut out: Vec<Equation> = Vec::new();
    for solution in solutions {
        let solution = if hint.is_integral() {
            solution
        } else {
            solution.map(evaluate_integrals)
        };
        let solution = constantsimp(&solution);
        let candidates = if simplify {
            solve_explicitly(ode, &solution)
                .into_iter()
                .map(|s| constantsimp(&s.map(simplify_expr)))
                .collect()
        } else {
            vec![solution]
        };
        for candidate in candidates {
            let candidate = constant_renumber(&candidate);
            if !out.contains(&candidate) {
                out.push(candidate);
            }
        }
    }
    debug!("{hint}: {} solution(s) after simplification", out.len());
    out
}

/// Evaluate every `Integral` node that has a closed form.
pub fn evaluate_integrals(expr: &Expr) -> Expr {
    if !expr.has_integral() {
        return expr.clone();
    }
    let expr = expr.map_children(evaluate_integrals);
    match &expr {
        Expr::Integral(inner, var, upper) => match try_integrate(inner, var) {
            Some(antiderivative) => match upper {
                Some(point) => substitute_symbol(&antiderivative, var, point),
                None => antiderivative,
            },
            None => expr.clone(),
        },
        _ => expr,
    }
}

/// `f(x) = g(x)` solutions of an implicit equation, or the equation itself
/// when it is already explicit or cannot be inverted.
fn solve_explicitly(ode: &Ode, solution: &Equation) -> Vec<Equation> {
    let pending = |e: &Expr| e.has_order() || e.has_integral();
    if is_explicit(solution, &ode.func) || pending(&solution.lhs) || pending(&solution.rhs) {
        return vec![solution.clone()];
    }
    let roots = solve_for(&solution.residual(), &ode.func);
    if roots.is_empty() {
        trace!("{solution} stays implicit");
        return vec![solution.clone()];
    }
    roots
        .into_iter()
        .map(|rhs| Equation::new(ode.func.clone(), rhs))
        .collect()
}

fn is_explicit(solution: &Equation, func: &Expr) -> bool {
    solution.lhs == *func && !solution.rhs.has(func)
}

/// Simplicity of a solution, smaller is simpler: explicit before solvable
/// before implicit before unevaluated integrals; ties by printed length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Simplicity {
    Explicit(usize),
    Solvable(usize),
    Implicit(usize),
    Unevaluated(usize),
}

pub fn ode_sol_simplicity(solution: &Equation, func: &Expr) -> Simplicity {
    let length = solution.to_string().len();
    if solution.lhs.has_integral() || solution.rhs.has_integral() {
        Simplicity::Unevaluated(length)
    } else if is_explicit(solution, func) {
        Simplicity::Explicit(length)
    } else if !solve_for(&solution.residual(), func).is_empty() {
        Simplicity::Solvable(length)
    } else {
        Simplicity::Implicit(length)
    }
}

/// Merge arbitrary constants that only ever appear together: `C1 + 2 → C1`,
/// `-3*C1*x → C1*x`, `exp(C1 + x) → C1*exp(x)`, `log(C1) → C1`.
pub fn constantsimp(solution: &Equation) -> Equation {
    let mut current = solution.clone();
    for _ in 0..MAX_ABSORB_ROUNDS {
        let counts = occurrences(&[&current.lhs, &current.rhs]);
        let next = current.map(|side| absorb(side, &counts));
        if next == current {
            break;
        }
        trace!("absorbed constants: {current} -> {next}");
        current = next;
    }
    current
}

fn occurrences(exprs: &[&Expr]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for expr in exprs {
        for node in expr.preorder() {
            if let Expr::Symbol(s) = node {
                if is_constant_name(s) {
                    *counts.entry(s.clone()).or_insert(0) += 1;
                }
            }
        }
    }
    counts
}

/// Only numbers and arbitrary constants.
fn is_pure(expr: &Expr) -> bool {
    expr.preorder().into_iter().all(|node| match node {
        Expr::Symbol(s) => is_constant_name(s),
        Expr::Constant(_) | Expr::Add(_) | Expr::Mul(_) | Expr::Pow(..) | Expr::Func(..) => true,
        _ => false,
    })
}

fn constant_index(name: &str) -> usize {
    name[1..].parse().unwrap_or(usize::MAX)
}

/// The constant a pure group collapses to, when every constant in it occurs
/// nowhere else.
fn absorbing_constant(group: &[&Expr], counts: &BTreeMap<String, usize>) -> Option<String> {
    let local = occurrences(group);
    if local.is_empty() {
        return None;
    }
    if local.iter().any(|(name, n)| counts.get(name) != Some(n)) {
        return None;
    }
    local.into_keys().min_by_key(|name| constant_index(name))
}

fn absorb(expr: &Expr, counts: &BTreeMap<String, usize>) -> Expr {
    let expr = expr.map_children(|c| absorb(c, counts));
    match &expr {
        Expr::Add(items) | Expr::Mul(items) => {
            let (pure, rest): (Vec<&Expr>, Vec<&Expr>) = items.iter().partition(|e| is_pure(e));
            let Some(name) = absorbing_constant(&pure, counts) else {
                return expr.clone();
            };
            if pure.len() == 1 && pure[0].as_symbol() == Some(name.as_str()) {
                return expr.clone();
            }
            let mut kept: Vec<Expr> = rest.into_iter().cloned().collect();
            kept.push(Expr::Symbol(name));
            if matches!(expr, Expr::Add(_)) {
                add_all(kept)
            } else {
                mul_all(kept)
            }
        }
        Expr::Func(Func::Exp, arg) if matches!(**arg, Expr::Add(_)) => {
            let terms = arg.terms();
            let (pure, rest): (Vec<&Expr>, Vec<&Expr>) = terms.iter().partition(|e| is_pure(e));
            match absorbing_constant(&pure, counts) {
                Some(name) if !rest.is_empty() => mul_all(vec![
                    Expr::Symbol(name),
                    func(Func::Exp, add_all(rest.into_iter().cloned().collect())),
                ]),
                _ => expr.clone(),
            }
        }
        Expr::Pow(base, e) if matches!((&**base, &**e), (Expr::Mul(_), Expr::Constant(_))) => {
            match (&**base, &**e) {
                (Expr::Mul(items), Expr::Constant(e)) => {
                    absorb_root(items, e, counts).unwrap_or_else(|| expr.clone())
                }
                _ => expr.clone(),
            }
        }
        Expr::Func(..) | Expr::Pow(..) if is_pure(&expr) => match absorbing_constant(&[&expr], counts) {
            Some(name) => Expr::Symbol(name),
            None => expr.clone(),
        },
        _ => expr.clone(),
    }
}

/// `(C*x^k)^e -> C*x^(k*e)` when every `k*e` is an integer. The sign lost
/// by an even root goes into `C`.
fn absorb_root(items: &[Expr], e: &Rational, counts: &BTreeMap<String, usize>) -> Option<Expr> {
    let (pure, rest): (Vec<&Expr>, Vec<&Expr>) = items.iter().partition(|f| is_pure(f));
    let name = absorbing_constant(&pure, counts)?;
    let mut kept = vec![Expr::Symbol(name)];
    for factor in rest {
        let (base, k) = match factor {
            Expr::Pow(base, k) => match &**k {
                Expr::Constant(k) => ((**base).clone(), k.clone()),
                _ => return None,
            },
            other => (other.clone(), Rational::one()),
        };
        let power = k * e.clone();
        if !power.is_integer() {
            return None;
        }
        kept.push(pow(base, Expr::Constant(power)));
    }
    Some(mul_all(kept))
}

/// Renumber constants `C1, C2, ...` in order of first appearance, visiting
/// children in an order that ignores the constants' names.
pub fn constant_renumber(solution: &Equation) -> Equation {
    let mut walk = RenumberWalk::default();
    walk.visit(&solution.lhs);
    walk.visit(&solution.rhs);
    let mapping: BTreeMap<String, Expr> = walk
        .order
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), Expr::Symbol(format!("C{}", i + 1))))
        .collect();
    if mapping.iter().all(|(old, new)| new.as_symbol() == Some(old.as_str())) {
        return solution.clone();
    }
    solution.map(|side| rename(side, &mapping))
}

#[derive(Default)]
struct RenumberWalk {
    order: Vec<String>,
    seen: BTreeSet<String>,
}

impl RenumberWalk {
    fn visit(&mut self, expr: &Expr) {
        if let Expr::Symbol(s) = expr {
            if is_constant_name(s) && self.seen.insert(s.clone()) {
                self.order.push(s.clone());
            }
            return;
        }
        let mut children = expr.children();
        children.sort_by_cached_key(|c| masked(c));
        for child in children {
            self.visit(child);
        }
    }
}

/// Every constant replaced by the same symbol `C`.
fn masked(expr: &Expr) -> Expr {
    match expr {
        Expr::Symbol(s) if is_constant_name(s) => Expr::symbol("C"),
        Expr::Symbol(_) | Expr::Constant(_) | Expr::Wild(_) => expr.clone(),
        _ => expr.map_children(masked),
    }
}

/// Simultaneous renaming of symbols.
fn rename(expr: &Expr, mapping: &BTreeMap<String, Expr>) -> Expr {
    match expr {
        Expr::Symbol(s) => mapping.get(s).cloned().unwrap_or_else(|| expr.clone()),
        _ => expr.map_children(|c| rename(c, mapping)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_equation;

    fn eq(text: &str) -> Equation {
        parse_equation(text).expect("parse")
    }

    #[test]
    fn absorbs_constant_groups() {
        assert_eq!(constantsimp(&eq("f(x) = 2*C1 + x + 3")), eq("f(x) = C1 + x"));
        assert_eq!(constantsimp(&eq("f(x) = exp(C1 + x)")), eq("f(x) = C1*exp(x)"));
    }

    #[test]
    fn keeps_constants_that_appear_elsewhere() {
        let solution = eq("f(x) = C1*x + C1");
        assert_eq!(constantsimp(&solution), solution);
    }

    #[test]
    fn renumbering_is_idempotent() {
        let once = constant_renumber(&eq("f(x) = C3*exp(x) + C7*x"));
        assert_eq!(constant_renumber(&once), once);
        assert!(once.rhs.has_symbol("C1") && once.rhs.has_symbol("C2"));
    }
}
