use num_traits::ToPrimitive;

use crate::expr::{Expr, Func};
use crate::simplify::expand;
use crate::simplify::rules::{add_all, func, mul_all, pow};

/// Rewrite `sin(u)^2` as `1 - cos(u)^2` (and `sinh(u)^2` as `cosh(u)^2 - 1`)
/// in every term, then expand. A polynomial in `sin u, cos u` that vanishes
/// identically reduces to zero.
pub fn eliminate_sin_squares(expr: &Expr) -> Expr {
    reduce_squares(expr, Func::Sin)
}

fn reduce_squares(expr: &Expr, odd: Func) -> Expr {
    let (even, sign) = match odd {
        Func::Sin => (Func::Cos, 1),
        Func::Cos => (Func::Sin, 1),
        Func::Sinh => (Func::Cosh, -1),
        _ => return expr.clone(),
    };
    let mut changed = false;
    let terms: Vec<Expr> = expr
        .terms()
        .into_iter()
        .map(|term| {
            let factors = term
                .factors()
                .into_iter()
                .map(|factor| match square_power(&factor, odd) {
                    Some((arg, k)) if k >= 2 => {
                        changed = true;
                        // 1 - cos^2 for the circular case, cosh^2 - 1 for the hyperbolic one.
                        let other_sq = pow(func(even, arg.clone()), Expr::integer(2));
                        let identity = if sign > 0 {
                            Expr::integer(1) - other_sq
                        } else {
                            other_sq - Expr::integer(1)
                        };
                        mul_all(vec![
                            pow(func(odd, arg), Expr::integer((k % 2) as i64)),
                            pow(identity, Expr::integer((k / 2) as i64)),
                        ])
                    }
                    _ => factor,
                })
                .collect();
            mul_all(factors)
        })
        .collect();
    let reduced = if changed {
        expand(&add_all(terms))
    } else {
        expr.clone()
    };
    if odd == Func::Sin {
        reduce_squares(&reduced, Func::Sinh)
    } else {
        reduced
    }
}

fn square_power(factor: &Expr, target: Func) -> Option<(Expr, u32)> {
    match factor {
        Expr::Pow(base, e) => match (&**base, e.as_integer().and_then(|k| k.to_u32())) {
            (Expr::Func(f, arg), Some(k)) if *f == target => Some(((**arg).clone(), k)),
            _ => None,
        },
        _ => None,
    }
}

/// Smallest of the expression and its two Pythagorean rewritings.
pub(crate) fn simplify_trig(expr: &Expr) -> Expr {
    let by_cos = reduce_squares(expr, Func::Sin);
    let by_sin = reduce_squares(expr, Func::Cos);
    [by_cos, by_sin]
        .into_iter()
        .fold(expr.clone(), |best, c| if c.size() < best.size() { c } else { best })
}
