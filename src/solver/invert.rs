use log::trace;
use num_traits::Signed;

use crate::expr::{Expr, Func};
use crate::polynomial::Polynomial;
use crate::simplify::rules::{add_all, func, mul_all, neg, pow};
use crate::simplify::{cancel, expand, factor_terms, fraction, is_identically_zero, substitute};

/// Nested inversions beyond this depth give up.
const MAX_INVERSION_DEPTH: usize = 6;

/// Solve `expr = 0` for `target`, which may be a symbol or a sub-expression
/// such as `f(x)`. Returns every solution found; an empty list means the
/// equation could not be inverted (not that it has no solution).
pub fn solve_for(expr: &Expr, target: &Expr) -> Vec<Expr> {
    let mut out: Vec<Expr> = Vec::new();
    for solution in solve_inner(expr, target, 0) {
        if solution.has(target) {
            continue;
        }
        if !out.iter().any(|s| s == &solution) {
            out.push(solution);
        }
    }
    trace!("solve_for {target} in {expr} = 0 gave {} solution(s)", out.len());
    out
}

fn solve_inner(expr: &Expr, target: &Expr, depth: usize) -> Vec<Expr> {
    if depth > MAX_INVERSION_DEPTH || !expr.has(target) {
        return Vec::new();
    }
    let (numer, _) = fraction(expr);
    let numer = factor_terms(&numer);
    let mut out = Vec::new();
    for factor in numer.factors() {
        if factor.has(target) {
            out.extend(solve_factor(&factor, target, depth));
        }
    }
    out
}

fn solve_factor(factor: &Expr, target: &Expr, depth: usize) -> Vec<Expr> {
    match factor {
        _ if factor == target => return vec![Expr::integer(0)],
        Expr::Pow(base, e) if !e.has(target) => {
            return match e.as_constant() {
                Some(k) if k.is_positive() => solve_inner(base, target, depth + 1),
                _ => Vec::new(),
            };
        }
        Expr::Func(Func::Exp, _) => return Vec::new(),
        _ => {}
    }

    let expanded = expand(factor);
    if let Some(poly) = Polynomial::<Expr>::from_expr(&expanded, target) {
        if let Some(solutions) = polynomial_solutions(&poly) {
            return solutions;
        }
    }
    isolate(&expanded, target, depth)
}

fn polynomial_solutions(poly: &Polynomial<Expr>) -> Option<Vec<Expr>> {
    match poly.degree()? {
        0 => Some(Vec::new()),
        1 => {
            let (a, b) = (poly.coeff(1), poly.coeff(0));
            if is_identically_zero(&a) {
                return None;
            }
            Some(vec![cancel(&mul_all(vec![neg(b), pow(a, Expr::integer(-1))]))])
        }
        _ => {
            // Complex roots are not solutions over the reals.
            let roots = poly.roots()?;
            Some(roots.into_iter().filter(|r| r.is_real()).map(|r| r.re).collect())
        }
    }
}

/// Isolate the single kernel containing `target` and invert it.
fn isolate(expr: &Expr, target: &Expr, depth: usize) -> Vec<Expr> {
    let kernels: Vec<Expr> = kernel_candidates(expr, target);
    let [kernel] = kernels.as_slice() else {
        return Vec::new();
    };
    let dummy = Expr::symbol("_k");
    let in_kernel = substitute(expr, kernel, &dummy);
    if in_kernel.has(target) {
        return Vec::new();
    }
    let Some(poly) = Polynomial::<Expr>::from_expr(&expand(&in_kernel), &dummy) else {
        return Vec::new();
    };
    let Some(values) = polynomial_solutions(&poly) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for value in values {
        if let Some(inner_eq) = invert_kernel(kernel, value) {
            out.extend(solve_inner(&inner_eq, target, depth + 1));
        }
    }
    out
}

/// Outermost non-polynomial sub-expressions that contain `target`.
fn kernel_candidates(expr: &Expr, target: &Expr) -> Vec<Expr> {
    let mut out = Vec::new();
    collect_kernels(expr, target, &mut out);
    out
}

fn collect_kernels(expr: &Expr, target: &Expr, out: &mut Vec<Expr>) {
    if !expr.has(target) {
        return;
    }
    match expr {
        Expr::Add(items) | Expr::Mul(items) => {
            for item in items {
                collect_kernels(item, target, out);
            }
        }
        Expr::Pow(base, e) if e.as_integer().map(|k| k.is_positive()).unwrap_or(false) => {
            collect_kernels(base, target, out)
        }
        other => {
            if !out.contains(other) {
                out.push(other.clone());
            }
        }
    }
}

/// Equation (as `expr = 0`) for the argument of `kernel` given `kernel = value`.
fn invert_kernel(kernel: &Expr, value: Expr) -> Option<Expr> {
    let (arg, inverse) = match kernel {
        Expr::Func(f, arg) => {
            let inverse = match f {
                Func::Exp => func(Func::Log, value),
                Func::Log => func(Func::Exp, value),
                Func::Sin => func(Func::Asin, value),
                Func::Cos => func(Func::Acos, value),
                Func::Tan => func(Func::Atan, value),
                Func::Atan => func(Func::Tan, value),
                Func::Asin => func(Func::Sin, value),
                Func::Acos => func(Func::Cos, value),
                _ => return None,
            };
            ((**arg).clone(), inverse)
        }
        Expr::Pow(base, e) if e.is_constant() => {
            ((**base).clone(), pow(value, pow((**e).clone(), Expr::integer(-1))))
        }
        Expr::Pow(base, e) if base.is_constant() => (
            (**e).clone(),
            mul_all(vec![
                func(Func::Log, value),
                pow(func(Func::Log, (**base).clone()), Expr::integer(-1)),
            ]),
        ),
        _ => return None,
    };
    Some(add_all(vec![arg, neg(inverse)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{int, sym};

    #[test]
    fn solves_linear_and_quadratic() {
        let y = sym("y");
        let linear = mul_all(vec![int(2), y.clone()]) - int(4);
        assert_eq!(solve_for(&linear, &y), vec![int(2)]);
        let quadratic = pow(y.clone(), int(2)) - int(1);
        assert_eq!(solve_for(&quadratic, &y), vec![int(-1), int(1)]);
    }

    #[test]
    fn inverts_logarithm() {
        let y = sym("y");
        let x = sym("x");
        let eq = func(Func::Log, y.clone()) - x.clone();
        assert_eq!(solve_for(&eq, &y), vec![func(Func::Exp, x)]);
    }
}
