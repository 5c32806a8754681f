use crate::expr::{Expr, Rational};
use num_traits::{One, Signed};

/// Derivatives up to this order print with primes, `f''(x)`.
const MAX_PRIMES: usize = 3;

pub fn pretty(expr: &Expr) -> String {
    pp(0, expr)
}

fn pp(ctx: u8, expr: &Expr) -> String {
    match expr {
        Expr::Symbol(v) => v.clone(),
        Expr::Wild(v) => format!("{v}_"),
        Expr::Constant(r) => {
            let body = show_rational(r);
            if r.is_integer() && !r.is_negative() {
                body
            } else {
                bracket(ctx, 2, body)
            }
        }

        Expr::Add(terms) => {
            // Constants print last: `x + 1` rather than `1 + x`.
            let mut ordered: Vec<&Expr> = terms.iter().filter(|t| !t.is_constant()).collect();
            ordered.extend(terms.iter().filter(|t| t.is_constant()));
            let mut body = String::new();
            for (idx, term) in ordered.into_iter().enumerate() {
                let (negative, magnitude) = split_neg(term);
                let shown = pp(1, &magnitude);
                match (idx, negative) {
                    (0, false) => body.push_str(&shown),
                    (0, true) => body.push_str(&format!("-{shown}")),
                    (_, false) => body.push_str(&format!(" + {shown}")),
                    (_, true) => body.push_str(&format!(" - {shown}")),
                }
            }
            bracket(ctx, 1, body)
        }

        Expr::Mul(_) => {
            let (negative, magnitude) = split_neg(expr);
            let body = show_product(&magnitude);
            if negative {
                bracket(ctx, 2, format!("-{body}"))
            } else {
                bracket(ctx, 2, body)
            }
        }

        Expr::Pow(base, exp) => match exp.as_constant() {
            Some(e) if *e == Rational::new(1.into(), 2.into()) => format!("sqrt({})", pp(0, base)),
            Some(e) if e.is_negative() => bracket(ctx, 2, show_product(expr)),
            _ => bracket(ctx, 3, format!("{}^{}", pp(4, base), pp(4, exp))),
        },

        Expr::Func(f, a) => format!("{}({})", f.name(), pp(0, a)),
        Expr::Apply(name, args) => format!("{name}({})", join_args(args)),
        Expr::Derivative(inner, var, n) => match &**inner {
            Expr::Apply(name, args) if *n <= MAX_PRIMES && args.len() == 1 && args[0].as_symbol() == Some(var) => {
                format!("{name}{}({var})", "'".repeat(*n))
            }
            other if *n == 1 => format!("diff({}, {var})", pp(0, other)),
            other => format!("diff({}, {var}, {n})", pp(0, other)),
        },
        Expr::Integral(inner, var, None) => format!("integrate({}, {var})", pp(0, inner)),
        Expr::Integral(inner, var, Some(upper)) => {
            format!("integrate({}, {var}, {})", pp(0, inner), pp(0, upper))
        }
        Expr::Order(inner) => format!("O({})", pp(0, inner)),
    }
}

/// Product printed as `numerator/denominator`.
fn show_product(expr: &Expr) -> String {
    let mut numer = Vec::new();
    let mut denom = Vec::new();
    for factor in expr.factors() {
        match &factor {
            Expr::Constant(c) => {
                if !c.numer().is_one() || numer.is_empty() && c.denom().is_one() {
                    numer.push(c.numer().to_string());
                }
                if !c.denom().is_one() {
                    denom.push(c.denom().to_string());
                }
            }
            Expr::Pow(base, e) if e.could_extract_minus_sign() => {
                let positive = crate::simplify::rules::neg((**e).clone());
                if positive.is_one() {
                    denom.push(pp(3, base));
                } else {
                    denom.push(pp(3, &crate::simplify::rules::pow((**base).clone(), positive)));
                }
            }
            other => numer.push(pp(2, other)),
        }
    }
    let numer = if numer.is_empty() {
        "1".to_string()
    } else {
        numer.join("*")
    };
    match denom.len() {
        0 => numer,
        1 => format!("{numer}/{}", denom[0]),
        _ => format!("{numer}/({})", denom.join("*")),
    }
}

fn join_args(args: &[Expr]) -> String {
    args.iter().map(|a| pp(0, a)).collect::<Vec<_>>().join(", ")
}

fn split_neg(expr: &Expr) -> (bool, Expr) {
    if expr.could_extract_minus_sign() {
        (true, crate::simplify::rules::neg(expr.clone()))
    } else {
        (false, expr.clone())
    }
}

fn bracket(ctx: u8, prec: u8, body: String) -> String {
    if prec < ctx {
        format!("({body})")
    } else {
        body
    }
}

fn show_rational(r: &Rational) -> String {
    if r.is_integer() {
        format!("{}", r.numer())
    } else {
        format!("{}/{}", r.numer(), r.denom())
    }
}
