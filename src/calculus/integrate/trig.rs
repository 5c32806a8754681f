use crate::expr::{Expr, Func};
use crate::simplify::rules::{add_all, func, mul_all, neg, pow};

use super::{affine, integrate_inner};

/// `∫exp(u)*sin(v)` and `∫exp(u)*cos(v)` for affine `u, v`.
pub(super) fn integrate_exp_trig(expr: &Expr, var: &str) -> Option<Expr> {
    let Expr::Mul(factors) = expr else {
        return None;
    };
    let (free, dependent): (Vec<Expr>, Vec<Expr>) =
        factors.iter().cloned().partition(|f| !f.has_symbol(var));
    let [first, second] = dependent.as_slice() else {
        return None;
    };
    let (exp_arg, trig, trig_arg) = match (first, second) {
        (Expr::Func(Func::Exp, e), Expr::Func(t @ (Func::Sin | Func::Cos), v))
        | (Expr::Func(t @ (Func::Sin | Func::Cos), v), Expr::Func(Func::Exp, e)) => {
            ((**e).clone(), *t, (**v).clone())
        }
        _ => return None,
    };
    let (a, _) = affine(&exp_arg, var)?;
    let (c, _) = affine(&trig_arg, var)?;
    let denom = pow(
        add_all(vec![pow(a.clone(), Expr::integer(2)), pow(c.clone(), Expr::integer(2))]),
        Expr::integer(-1),
    );
    let sin_v = func(Func::Sin, trig_arg.clone());
    let cos_v = func(Func::Cos, trig_arg);
    let combination = match trig {
        Func::Sin => add_all(vec![mul_all(vec![a, sin_v]), neg(mul_all(vec![c, cos_v]))]),
        _ => add_all(vec![mul_all(vec![a, cos_v]), mul_all(vec![c, sin_v])]),
    };
    let mut out = free;
    out.push(func(Func::Exp, exp_arg));
    out.push(denom);
    out.push(combination);
    Some(mul_all(out))
}

/// Products of two sines/cosines become sums of single ones.
pub(super) fn integrate_product_to_sum(expr: &Expr, var: &str, depth: usize) -> Option<Expr> {
    let Expr::Mul(factors) = expr else {
        return None;
    };
    let (free, dependent): (Vec<Expr>, Vec<Expr>) =
        factors.iter().cloned().partition(|f| !f.has_symbol(var));
    let [Expr::Func(f, u), Expr::Func(g, v)] = dependent.as_slice() else {
        return None;
    };
    let (u, v) = ((**u).clone(), (**v).clone());
    let sum = add_all(vec![u.clone(), v.clone()]);
    let diff = add_all(vec![u, neg(v)]);
    let half = Expr::constant(1, 2);
    let rewritten = match (f, g) {
        (Func::Sin, Func::Cos) => mul_all(vec![
            half,
            add_all(vec![func(Func::Sin, sum), func(Func::Sin, diff)]),
        ]),
        (Func::Cos, Func::Sin) => mul_all(vec![
            half,
            add_all(vec![func(Func::Sin, sum), neg(func(Func::Sin, diff))]),
        ]),
        (Func::Sin, Func::Sin) => mul_all(vec![
            half,
            add_all(vec![func(Func::Cos, diff), neg(func(Func::Cos, sum))]),
        ]),
        (Func::Cos, Func::Cos) => mul_all(vec![
            half,
            add_all(vec![func(Func::Cos, diff), func(Func::Cos, sum)]),
        ]),
        _ => return None,
    };
    let integrated = integrate_inner(&rewritten, var, depth + 1)?;
    let mut out = free;
    out.push(integrated);
    Some(mul_all(out))
}
