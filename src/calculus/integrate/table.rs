use crate::expr::{Expr, Func};
use crate::simplify::rules::{add_all, func, mul_all, neg, pow};

use super::affine;

/// Table lookup for elementary integrands of an affine argument `u = a*x + b`.
pub(super) fn integrate_table(expr: &Expr, var: &str) -> Option<Expr> {
    match expr {
        Expr::Symbol(s) if s == var => Some(mul_all(vec![
            Expr::constant(1, 2),
            pow(expr.clone(), Expr::integer(2)),
        ])),
        Expr::Pow(base, exp) => power(base, exp, var),
        Expr::Func(f, arg) => {
            let (a, _) = affine(arg, var)?;
            let inv_a = pow(a, Expr::integer(-1));
            let u = (**arg).clone();
            let antiderivative = match f {
                Func::Exp => func(Func::Exp, u),
                Func::Sin => neg(func(Func::Cos, u)),
                Func::Cos => func(Func::Sin, u),
                Func::Tan => neg(func(Func::Log, func(Func::Cos, u))),
                Func::Sinh => func(Func::Cosh, u),
                Func::Cosh => func(Func::Sinh, u),
                Func::Tanh => func(Func::Log, func(Func::Cosh, u)),
                Func::Log => add_all(vec![mul_all(vec![u.clone(), func(Func::Log, u.clone())]), neg(u)]),
                Func::Atan => add_all(vec![
                    mul_all(vec![u.clone(), func(Func::Atan, u.clone())]),
                    mul_all(vec![
                        Expr::constant(-1, 2),
                        func(Func::Log, add_all(vec![pow(u, Expr::integer(2)), Expr::integer(1)])),
                    ]),
                ]),
                Func::Asin => add_all(vec![
                    mul_all(vec![u.clone(), func(Func::Asin, u.clone())]),
                    pow(
                        add_all(vec![Expr::integer(1), neg(pow(u, Expr::integer(2)))]),
                        Expr::constant(1, 2),
                    ),
                ]),
                Func::Acos | Func::Abs => return None,
            };
            Some(mul_all(vec![inv_a, antiderivative]))
        }
        _ => None,
    }
}

fn power(base: &Expr, exp: &Expr, var: &str) -> Option<Expr> {
    if !exp.has_symbol(var) {
        if let Expr::Func(f @ (Func::Sin | Func::Cos), arg) = base {
            if exp.as_integer() == Some(2.into()) {
                return trig_square(*f, arg, var);
            }
            return None;
        }
        let (a, _) = affine(base, var)?;
        let inv_a = pow(a, Expr::integer(-1));
        if exp.as_integer() == Some((-1).into()) {
            return Some(mul_all(vec![inv_a, func(Func::Log, base.clone())]));
        }
        let raised = add_all(vec![exp.clone(), Expr::integer(1)]);
        return Some(mul_all(vec![
            inv_a,
            pow(raised.clone(), Expr::integer(-1)),
            pow(base.clone(), raised),
        ]));
    }
    if !base.has_symbol(var) {
        // c^u = exp(u*log c)
        let (a, _) = affine(exp, var)?;
        return Some(mul_all(vec![
            pow(base.clone(), exp.clone()),
            pow(mul_all(vec![a, func(Func::Log, base.clone())]), Expr::integer(-1)),
        ]));
    }
    None
}

/// `sin(u)^2` and `cos(u)^2` through the half-angle identities.
fn trig_square(f: Func, arg: &Expr, var: &str) -> Option<Expr> {
    let (a, _) = affine(arg, var)?;
    let double = mul_all(vec![Expr::integer(2), arg.clone()]);
    let sign = if f == Func::Sin { -1 } else { 1 };
    Some(add_all(vec![
        mul_all(vec![Expr::constant(1, 2), Expr::symbol(var)]),
        mul_all(vec![
            Expr::constant(sign, 4),
            pow(a, Expr::integer(-1)),
            func(Func::Sin, double),
        ]),
    ]))
}
