//! Lie group symmetries of first order equations `y' = h(x, y)`.
//!
//! Infinitesimals `(ξ, η)` satisfy
//! `η_x + (η_y - ξ_x)*h - ξ_y*h^2 - ξ*h_x - η*h_y = 0`. Each heuristic
//! assumes a restricted form for them; the first heuristic that yields any
//! pair wins. Canonical coordinates `(r, s)` with `ξ*r_x + η*r_y = 0` and
//! `ξ*s_x + η*s_y = 1` then turn the equation into a quadrature
//! `ds/dr = F(r)`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::{debug, trace};

use crate::calculus::{differentiate, try_integrate};
use crate::error::{OdeError, Result, Unsolvable};
use crate::expr::{Equation, Expr, Func};
use crate::ode::dispatch::SolveContext;
use crate::ode::matcher::MatchRecord;
use crate::ode::normalize::Ode;
use crate::ode::solvers::{
    antiderivative, constant, first_order_form, implicit, quotient, separate_variables, slope, y_name,
};
use crate::simplify::rules::{add_all, func, mul_all, neg, pow};
use crate::simplify::{
    cancel, expand, fraction, is_free_of, is_identically_zero, simplify, substitute_symbol, together,
};
use crate::solver::{solve_for, solve_linear_system, LinearResult};

/// Infinitesimal generator `ξ*∂x + η*∂y`.
#[derive(Debug, Clone, PartialEq)]
pub struct Infinitesimal {
    pub xi: Expr,
    pub eta: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    Abaco1Simple,
    Abaco1Product,
    Linear,
    Bivariate,
}

impl Heuristic {
    pub const ALL: [Heuristic; 4] = [
        Heuristic::Abaco1Simple,
        Heuristic::Abaco1Product,
        Heuristic::Linear,
        Heuristic::Bivariate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Heuristic::Abaco1Simple => "abaco1_simple",
            Heuristic::Abaco1Product => "abaco1_product",
            Heuristic::Linear => "linear",
            Heuristic::Bivariate => "bivariate",
        }
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Heuristic {
    type Err = OdeError;

    fn from_str(s: &str) -> Result<Self> {
        Heuristic::ALL
            .into_iter()
            .find(|h| h.name() == s)
            .ok_or_else(|| OdeError::InvalidInput(format!("unknown heuristic {s}")))
    }
}

/// Infinitesimals of a first order equation, in terms of `x` and `f(x)`.
/// Without a heuristic, the heuristics are tried in order and the first
/// one that finds anything wins.
pub fn infinitesimals(ode: &Ode, heuristic: Option<Heuristic>) -> Result<Vec<Infinitesimal>> {
    let h = slope_of(ode)?;
    let found = match heuristic {
        Some(heuristic) => run(heuristic, &h, &ode.var),
        None => first_found(&h, &ode.var).map(|(_, found)| found).unwrap_or_default(),
    };
    Ok(found
        .into_iter()
        .map(|inf| Infinitesimal {
            xi: ode.from_symbols(&inf.xi),
            eta: ode.from_symbols(&inf.eta),
        })
        .collect())
}

/// Whether `(ξ, η)`, given in terms of `x` and `f(x)`, satisfy the
/// determining equation of `ode`.
pub fn checkinfsol(ode: &Ode, xi: &Expr, eta: &Expr) -> Result<bool> {
    let h = slope_of(ode)?;
    let candidate = Infinitesimal {
        xi: ode.to_symbols(xi),
        eta: ode.to_symbols(eta),
    };
    Ok(satisfies(&candidate, &h, &ode.var))
}

fn slope_of(ode: &Ode) -> Result<Expr> {
    let (p, q) = first_order_form(ode).ok_or_else(|| {
        OdeError::InvalidInput(format!("{ode} is not a first order equation linear in the derivative"))
    })?;
    Ok(slope(&p, &q))
}

fn first_found(h: &Expr, x: &str) -> Option<(Heuristic, Vec<Infinitesimal>)> {
    Heuristic::ALL.into_iter().find_map(|heuristic| {
        let found = run(heuristic, h, x);
        debug!("heuristic {heuristic} found {} infinitesimal(s)", found.len());
        (!found.is_empty()).then_some((heuristic, found))
    })
}

fn run(heuristic: Heuristic, h: &Expr, x: &str) -> Vec<Infinitesimal> {
    match heuristic {
        Heuristic::Abaco1Simple => abaco1_simple(h, x),
        Heuristic::Abaco1Product => abaco1_product(h, x),
        Heuristic::Linear => polynomial_ansatz(h, x, 1),
        Heuristic::Bivariate => polynomial_ansatz(h, x, 2),
    }
}

fn determining_residual(inf: &Infinitesimal, h: &Expr, x: &str) -> Expr {
    let y = y_name();
    let d = |e: &Expr, v: &str| differentiate(e, v);
    add_all(vec![
        d(&inf.eta, x),
        mul_all(vec![add_all(vec![d(&inf.eta, &y), neg(d(&inf.xi, x))]), h.clone()]),
        neg(mul_all(vec![d(&inf.xi, &y), pow(h.clone(), Expr::integer(2))])),
        neg(mul_all(vec![inf.xi.clone(), d(h, x)])),
        neg(mul_all(vec![inf.eta.clone(), d(h, &y)])),
    ])
}

fn satisfies(inf: &Infinitesimal, h: &Expr, x: &str) -> bool {
    let residual = determining_residual(inf, h, x);
    is_identically_zero(&residual) || is_identically_zero(&simplify(&residual))
}

/// `ξ = 0` or `η = 0` with the other depending on one variable only.
fn abaco1_simple(h: &Expr, x: &str) -> Vec<Infinitesimal> {
    let y = y_name();
    let zero = Expr::integer(0);
    let hy = cancel(&differentiate(h, &y));
    let mut candidates = Vec::new();
    // η(x): η'/η = h_y
    if is_free_of(&hy, &y) {
        candidates.push(exp_integral(&hy, x).map(|eta| Infinitesimal { xi: zero.clone(), eta }));
    }
    if !h.is_zero() {
        let hx = differentiate(h, x);
        // η(y): η'/η = h_y/h
        let ratio = cancel(&quotient(hy.clone(), h.clone()));
        if is_free_of(&ratio, x) {
            candidates.push(exp_integral(&ratio, &y).map(|eta| Infinitesimal { xi: zero.clone(), eta }));
        }
        // ξ(x): ξ'/ξ = -h_x/h
        let g = cancel(&quotient(neg(hx.clone()), h.clone()));
        if is_free_of(&g, &y) {
            candidates.push(exp_integral(&g, x).map(|xi| Infinitesimal { xi, eta: zero.clone() }));
        }
        // ξ(y): ξ'/ξ = -h_x/h^2
        let g = cancel(&quotient(neg(hx), pow(h.clone(), Expr::integer(2))));
        if is_free_of(&g, x) {
            candidates.push(exp_integral(&g, &y).map(|xi| Infinitesimal { xi, eta: zero.clone() }));
        }
    }
    candidates
        .into_iter()
        .flatten()
        .find(|inf| satisfies(inf, h, x))
        .into_iter()
        .collect()
}

fn exp_integral(expr: &Expr, var: &str) -> Option<Expr> {
    try_integrate(expr, var).map(|i| func(Func::Exp, i))
}

/// Product forms `ξ = f(x)*g(y), η = 0` from `h`, and `ξ = 0, η = f(x)*g(y)`
/// from the inverse equation `dx/dy = 1/h` with the variables swapped.
fn abaco1_product(h: &Expr, x: &str) -> Vec<Infinitesimal> {
    let y = y_name();
    let mut out = Vec::new();
    if h.is_zero() {
        return out;
    }
    if let Some(xi) = product_factor(h, x, &y) {
        let inf = Infinitesimal {
            xi,
            eta: Expr::integer(0),
        };
        if satisfies(&inf, h, x) {
            out.push(inf);
        }
    }
    let inverse = swap(&quotient(Expr::integer(1), h.clone()), x, &y);
    if let Some(eta) = product_factor(&inverse, x, &y) {
        let inf = Infinitesimal {
            xi: Expr::integer(0),
            eta: swap(&eta, x, &y),
        };
        if satisfies(&inf, h, x) {
            out.push(inf);
        }
    }
    out
}

/// `f(x)*g(y)` where `f` is the `x` part of `(log h)_yx/h^2` and
/// `g = exp(∫ f*(1/(f*h))_x dy)`, provided that integrand is free of `x`.
fn product_factor(h: &Expr, x: &str, y: &str) -> Option<Expr> {
    let log_h = func(Func::Log, h.clone());
    let mixed = cancel(&quotient(differentiate(&differentiate(&log_h, y), x), pow(h.clone(), Expr::integer(2))));
    if is_identically_zero(&mixed) {
        return None;
    }
    let (fx, _) = separate_variables(&mixed, x, y)?;
    let gy = simplify(&mul_all(vec![
        fx.clone(),
        differentiate(&pow(mul_all(vec![fx.clone(), h.clone()]), Expr::integer(-1)), x),
    ]));
    if !is_free_of(&gy, x) {
        return None;
    }
    let g = func(Func::Exp, try_integrate(&gy, y)?);
    Some(mul_all(vec![fx, g]))
}

fn swap(expr: &Expr, x: &str, y: &str) -> Expr {
    let tmp = "_swap";
    let step = substitute_symbol(expr, x, &Expr::symbol(tmp));
    let step = substitute_symbol(&step, y, &Expr::symbol(x));
    substitute_symbol(&step, tmp, &Expr::symbol(y))
}

/// `ξ, η` polynomials of total degree `degree` in `x` and `y` with unknown
/// coefficients; every independent solution of the resulting linear system
/// gives a pair.
fn polynomial_ansatz(h: &Expr, x: &str, degree: usize) -> Vec<Infinitesimal> {
    let y = y_name();
    let xs = Expr::symbol(x);
    let mut names = Vec::new();
    let mut polys = [Vec::new(), Vec::new()];
    for (which, prefix) in ["_p", "_q"].iter().enumerate() {
        for i in 0..=degree {
            for j in 0..=(degree - i) {
                let name = format!("{prefix}{i}{j}");
                polys[which].push(mul_all(vec![
                    Expr::symbol(&name),
                    pow(xs.clone(), Expr::integer(i as i64)),
                    pow(super::y(), Expr::integer(j as i64)),
                ]));
                names.push(name);
            }
        }
    }
    let [xi_terms, eta_terms] = polys;
    let ansatz = Infinitesimal {
        xi: add_all(xi_terms),
        eta: add_all(eta_terms),
    };
    let (numer, _) = fraction(&together(&determining_residual(&ansatz, h, x)));
    let equations = collect_monomials(&expand(&numer), &[x, &y]);
    trace!("{} determining equations for degree {degree}", equations.len());

    let free = match solve_linear_system(&equations, &names) {
        LinearResult::Infinite(family) => family.free_variables,
        _ => return Vec::new(),
    };
    let mut out = Vec::new();
    for chosen in &free {
        let mut fixed: Vec<Expr> = equations.clone();
        for other in &free {
            let value = Expr::integer(i64::from(other == chosen));
            fixed = fixed.iter().map(|e| substitute_symbol(e, other, &value)).collect();
        }
        let rest: Vec<String> = names.iter().filter(|n| !free.contains(n)).cloned().collect();
        let mut values: BTreeMap<String, Expr> = free
            .iter()
            .map(|f| (f.clone(), Expr::integer(i64::from(f == chosen))))
            .collect();
        match solve_linear_system(&fixed, &rest) {
            LinearResult::Unique(solution) => values.extend(solution.variables.into_iter().zip(solution.values)),
            LinearResult::Infinite(family) => values.extend(family.variables.into_iter().zip(family.particular)),
            _ => continue,
        }
        let assign = |e: &Expr| values.iter().fold(e.clone(), |acc, (n, v)| substitute_symbol(&acc, n, v));
        let inf = Infinitesimal {
            xi: expand(&assign(&ansatz.xi)),
            eta: expand(&assign(&ansatz.eta)),
        };
        if (inf.xi.is_zero() && inf.eta.is_zero()) || !satisfies(&inf, h, x) {
            continue;
        }
        out.push(inf);
    }
    out
}

/// Coefficients of the distinct products of factors that involve any of
/// `vars`, in an expanded sum.
fn collect_monomials(expr: &Expr, vars: &[&str]) -> Vec<Expr> {
    let mut groups: BTreeMap<Expr, Vec<Expr>> = BTreeMap::new();
    for term in expr.terms() {
        let (fixed, moving): (Vec<Expr>, Vec<Expr>) = term
            .factors()
            .into_iter()
            .partition(|f| vars.iter().all(|v| !f.has_symbol(v)));
        groups.entry(mul_all(moving)).or_default().push(mul_all(fixed));
    }
    groups.into_values().map(add_all).collect()
}

/// `(r, s)` with `ξ*r_x + η*r_y = 0` and `ξ*s_x + η*s_y = 1`.
fn canonical_coordinates(inf: &Infinitesimal, x: &str) -> Option<(Expr, Expr)> {
    let y = y_name();
    let xs = Expr::symbol(x);
    if inf.xi.is_zero() {
        let s = try_integrate(&quotient(Expr::integer(1), inf.eta.clone()), &y)?;
        return Some((xs, s));
    }
    if inf.eta.is_zero() {
        let s = try_integrate(&quotient(Expr::integer(1), inf.xi.clone()), x)?;
        return Some((super::y(), s));
    }
    // Characteristics dy/dx = η/ξ.
    let ratio = cancel(&quotient(inf.eta.clone(), inf.xi.clone()));
    let r = if is_free_of(&ratio, &y) {
        add_all(vec![super::y(), neg(try_integrate(&ratio, x)?)])
    } else {
        let a = cancel(&differentiate(&ratio, &y));
        if !is_free_of(&a, &y) {
            return None;
        }
        let b = cancel(&substitute_symbol(&ratio, &y, &Expr::integer(0)));
        let damping = func(Func::Exp, neg(try_integrate(&a, x)?));
        add_all(vec![
            mul_all(vec![damping.clone(), super::y()]),
            neg(try_integrate(&mul_all(vec![b, damping]), x)?),
        ])
    };
    let candidates = [
        is_free_of(&inf.xi, &y).then(|| try_integrate(&quotient(Expr::integer(1), inf.xi.clone()), x)),
        is_free_of(&inf.eta, x).then(|| try_integrate(&quotient(Expr::integer(1), inf.eta.clone()), &y)),
    ];
    let s = candidates.into_iter().flatten().flatten().find(|s| {
        let lhs = add_all(vec![
            mul_all(vec![inf.xi.clone(), differentiate(s, x)]),
            mul_all(vec![inf.eta.clone(), differentiate(s, &y)]),
            Expr::integer(-1),
        ]);
        is_identically_zero(&simplify(&lhs))
    })?;
    Some((r, s))
}

/// `ds/dr` as a function of `r` alone, written in the symbol `big_r`.
fn reduced_slope(h: &Expr, r: &Expr, s: &Expr, x: &str, big_r: &str) -> Option<Expr> {
    let y = y_name();
    let d = |e: &Expr, v: &str| differentiate(e, v);
    let slope = cancel(&quotient(
        add_all(vec![d(s, x), mul_all(vec![h.clone(), d(s, &y)])]),
        add_all(vec![d(r, x), mul_all(vec![h.clone(), d(r, &y)])]),
    ));
    if is_free_of(&slope, x) && is_free_of(&slope, &y) {
        return Some(slope);
    }
    let level = add_all(vec![r.clone(), neg(Expr::symbol(big_r))]);
    for (target, other) in [(y.as_str(), x), (x, y.as_str())] {
        for value in solve_for(&level, &Expr::symbol(target)) {
            let in_r = simplify(&substitute_symbol(&slope, target, &value));
            if is_free_of(&in_r, other) && is_free_of(&in_r, target) {
                return Some(in_r);
            }
        }
    }
    None
}

/// `s(x, y) = ∫F(r) dr + C1` for the first infinitesimal pair with usable
/// canonical coordinates.
pub(crate) fn solve(ode: &Ode, _record: &MatchRecord, context: &SolveContext) -> std::result::Result<Vec<Equation>, Unsolvable> {
    let (p, q) = first_order_form(ode).ok_or_else(|| Unsolvable::new("not a first order equation"))?;
    let h = slope(&p, &q);
    let big_r = "_R";
    for heuristic in Heuristic::ALL {
        for inf in run(heuristic, &h, &ode.var) {
            debug!("{heuristic}: xi = {}, eta = {}", inf.xi, inf.eta);
            let Some((r, s)) = canonical_coordinates(&inf, &ode.var) else {
                continue;
            };
            let Some(f) = reduced_slope(&h, &r, &s, &ode.var, big_r) else {
                continue;
            };
            let quadrature = substitute_symbol(&antiderivative(&f, big_r, context), big_r, &r);
            let rhs = add_all(vec![quadrature, constant(1)]);
            return Ok(vec![implicit(ode, &s, &rhs)]);
        }
    }
    Err(Unsolvable::new(format!("no usable symmetry for y' = {}", ode.from_symbols(&h))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    fn ode(text: &str) -> Ode {
        let expr = parse_expr(text).expect("parse");
        Ode::from_expr(&expr, &parse_expr("f(x)").expect("parse")).expect("ode")
    }

    #[test]
    fn simple_heuristic_for_autonomous_equation() {
        // f' = f^2 is invariant under translations in x.
        let eq = ode("f'(x) - f(x)^2");
        let found = infinitesimals(&eq, Some(Heuristic::Abaco1Simple)).expect("first order");
        assert!(!found.is_empty());
        for inf in &found {
            assert!(checkinfsol(&eq, &inf.xi, &inf.eta).expect("first order"));
        }
    }

    #[test]
    fn translation_is_a_symmetry_of_autonomous_equations() {
        let eq = ode("f'(x) - f(x)^2 - 1");
        assert!(checkinfsol(&eq, &Expr::integer(1), &Expr::integer(0)).expect("first order"));
        assert!(!checkinfsol(&eq, &Expr::integer(0), &parse_expr("x").expect("parse")).expect("first order"));
    }
}
