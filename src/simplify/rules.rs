//! Canonical constructors. Every expression the crate builds goes through these.

use std::collections::BTreeMap;

use num_bigint::BigInt;
use num_integer::{Integer, Roots};
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::expr::{Expr, Func, Rational};

/// The circle constant, kept symbolic.
pub const PI: &str = "pi";

/// Largest integer exponent folded into an exact rational power.
const MAX_EXACT_POWER: u32 = 4096;

pub fn add_all(terms: Vec<Expr>) -> Expr {
    let mut constant = Rational::zero();
    let mut collected: BTreeMap<Expr, Rational> = BTreeMap::new();
    let mut orders: Vec<Expr> = Vec::new();

    let mut stack = terms;
    while let Some(term) = stack.pop() {
        match term {
            Expr::Add(inner) => stack.extend(inner),
            Expr::Constant(c) => constant += c,
            Expr::Order(o) => orders.push(*o),
            other => {
                let (coeff, base) = split_coeff(other);
                if coeff.is_zero() {
                    continue;
                }
                *collected.entry(base).or_insert_with(Rational::zero) += coeff;
            }
        }
    }

    let order = smallest_order(orders);

    let mut out: Vec<Expr> = collected
        .into_iter()
        .filter(|(_, c)| !c.is_zero())
        .map(|(base, c)| term_from(c, base))
        .filter(|t| match &order {
            Some(o) => !order_absorbs(o, t),
            None => true,
        })
        .collect();

    if !constant.is_zero() {
        let absorbed = matches!(&order, Some(o) if order_absorbs(o, &Expr::Constant(constant.clone())));
        if !absorbed {
            out.push(Expr::Constant(constant));
        }
    }
    if let Some(o) = order {
        out.push(Expr::Order(o.boxed()));
    }

    match out.len() {
        0 => Expr::Constant(Rational::zero()),
        1 => out.remove(0),
        _ => {
            out.sort();
            Expr::Add(out)
        }
    }
}

/// Split `3*x*y` into `(3, x*y)`.
pub fn split_coeff(expr: Expr) -> (Rational, Expr) {
    match expr {
        Expr::Constant(c) => (c, Expr::Constant(Rational::one())),
        Expr::Mul(mut factors) => {
            if let Some(Expr::Constant(_)) = factors.first() {
                let c = match factors.remove(0) {
                    Expr::Constant(c) => c,
                    _ => unreachable!(),
                };
                let base = match factors.len() {
                    0 => Expr::Constant(Rational::one()),
                    1 => factors.remove(0),
                    _ => Expr::Mul(factors),
                };
                (c, base)
            } else {
                (Rational::one(), Expr::Mul(factors))
            }
        }
        other => (Rational::one(), other),
    }
}

fn term_from(coeff: Rational, base: Expr) -> Expr {
    if base.is_one() {
        return Expr::Constant(coeff);
    }
    if coeff.is_one() {
        return base;
    }
    match base {
        Expr::Mul(mut factors) => {
            factors.insert(0, Expr::Constant(coeff));
            Expr::Mul(factors)
        }
        other => Expr::Mul(vec![Expr::Constant(coeff), other]),
    }
}

pub fn mul_all(factors: Vec<Expr>) -> Expr {
    let mut coeff = Rational::one();
    let mut powers: BTreeMap<Expr, Vec<Expr>> = BTreeMap::new();
    let mut exp_args: Vec<Expr> = Vec::new();
    let mut order: Option<Expr> = None;

    let mut stack = factors;
    while let Some(factor) = stack.pop() {
        match factor {
            Expr::Mul(inner) => stack.extend(inner),
            Expr::Constant(c) => coeff *= c,
            Expr::Func(Func::Exp, arg) => exp_args.push(*arg),
            Expr::Order(o) => {
                order = Some(match order {
                    Some(prev) => mul_all(vec![prev, *o]),
                    None => *o,
                })
            }
            Expr::Pow(base, e) => powers.entry(*base).or_default().push(*e),
            other => powers
                .entry(other)
                .or_default()
                .push(Expr::Constant(Rational::one())),
        }
    }

    if coeff.is_zero() && order.is_none() {
        return Expr::Constant(Rational::zero());
    }

    let mut out: Vec<Expr> = Vec::new();
    let mut needs_pass = false;
    for (base, exps) in powers {
        let factor = pow(base, add_all(exps));
        match factor {
            Expr::Constant(c) => coeff *= c,
            f if f.is_one() => {}
            f @ Expr::Mul(_) => {
                needs_pass = true;
                out.push(f);
            }
            f @ Expr::Func(Func::Exp, _) => {
                needs_pass = true;
                out.push(f);
            }
            f => out.push(f),
        }
    }

    if !exp_args.is_empty() {
        let e = func(Func::Exp, add_all(exp_args));
        match e {
            Expr::Func(Func::Exp, _) => out.push(e),
            Expr::Constant(c) => coeff *= c,
            other => {
                needs_pass = true;
                out.push(other);
            }
        }
    }

    if needs_pass {
        out.push(Expr::Constant(coeff));
        if let Some(o) = order {
            out.push(Expr::Order(o.boxed()));
        }
        return mul_all(out);
    }

    if let Some(o) = order {
        out.retain(|f| !matches!(f, Expr::Constant(_)));
        let inner = if out.is_empty() {
            o
        } else {
            out.push(o);
            mul_all(out)
        };
        return Expr::Order(strip_coefficient(inner).boxed());
    }

    if coeff.is_zero() {
        return Expr::Constant(Rational::zero());
    }

    // Numeric coefficients distribute over a lone sum: 2*(x + 1) -> 2*x + 2.
    if !coeff.is_one() && out.len() == 1 {
        if let Expr::Add(terms) = &out[0] {
            let c = coeff.clone();
            return add_all(
                terms
                    .iter()
                    .map(|t| mul_all(vec![Expr::Constant(c.clone()), t.clone()]))
                    .collect(),
            );
        }
    }

    out.sort();
    if !coeff.is_one() {
        out.insert(0, Expr::Constant(coeff));
    }
    match out.len() {
        0 => Expr::Constant(Rational::one()),
        1 => out.remove(0),
        _ => Expr::Mul(out),
    }
}

fn strip_coefficient(expr: Expr) -> Expr {
    let (_, base) = split_coeff(expr);
    base
}

pub fn neg(expr: Expr) -> Expr {
    mul_all(vec![Expr::Constant(-Rational::one()), expr])
}

pub fn pow(base: Expr, exp: Expr) -> Expr {
    if exp.is_zero() {
        return Expr::Constant(Rational::one());
    }
    if exp.is_one() {
        return base;
    }
    if base.is_one() {
        return base;
    }

    match (base, exp) {
        (Expr::Constant(b), Expr::Constant(e)) => pow_rational(b, e),
        (Expr::Pow(inner, e1), Expr::Constant(e2)) if e2.is_integer() => {
            let combined = mul_all(vec![*e1, Expr::Constant(e2)]);
            pow(*inner, combined)
        }
        (Expr::Pow(inner, e1), e2) if e1.is_one() => pow(*inner, e2),
        (Expr::Mul(factors), Expr::Constant(e)) if e.is_integer() => mul_all(
            factors
                .into_iter()
                .map(|f| pow(f, Expr::Constant(e.clone())))
                .collect(),
        ),
        (Expr::Mul(mut factors), e) => {
            // Pull a positive numeric coefficient out of a fractional power.
            let positive_coeff = matches!(factors.first(), Some(Expr::Constant(c)) if c.is_positive());
            if positive_coeff {
                let c = factors.remove(0);
                let rest = match factors.len() {
                    1 => factors.remove(0),
                    _ => Expr::Mul(factors),
                };
                mul_all(vec![pow(c, e.clone()), pow(rest, e)])
            } else {
                Expr::Pow(Expr::Mul(factors).boxed(), e.boxed())
            }
        }
        (Expr::Func(Func::Exp, arg), e) => func(Func::Exp, mul_all(vec![*arg, e])),
        (Expr::Order(o), Expr::Constant(e)) if e.is_positive() => {
            order(pow(*o, Expr::Constant(e)))
        }
        (b, e) => Expr::Pow(b.boxed(), e.boxed()),
    }
}

fn pow_rational(base: Rational, exp: Rational) -> Expr {
    if base.is_zero() {
        if exp.is_positive() {
            return Expr::Constant(Rational::zero());
        }
        return Expr::Pow(Expr::Constant(base).boxed(), Expr::Constant(exp).boxed());
    }
    if exp.is_integer() {
        if let Some(k) = exp.to_integer().abs().to_u32() {
            if k <= MAX_EXACT_POWER {
                let num = base.numer().pow(k);
                let den = base.denom().pow(k);
                return if exp.is_negative() {
                    Expr::Constant(Rational::new(den, num))
                } else {
                    Expr::Constant(Rational::new(num, den))
                };
            }
        }
        return Expr::Pow(Expr::Constant(base).boxed(), Expr::Constant(exp).boxed());
    }

    // Fractional exponent p/q: fold exact roots of positive rationals.
    let q = exp.denom().to_u32();
    if let (Some(q), true) = (q, base.is_positive()) {
        if let (Some(rn), Some(rd)) = (exact_root(base.numer(), q), exact_root(base.denom(), q)) {
            let root = Rational::new(rn, rd);
            return pow_rational(root, Rational::from_integer(exp.numer().clone()));
        }
        // Roots of a fraction: (3/4)^(1/2) -> 3^(1/2)/2, (1/3)^(1/2) -> 3^(-1/2).
        if !base.is_integer() {
            let (n, d) = (base.numer(), base.denom());
            let p = Rational::from_integer(exp.numer().clone());
            if let Some(rd) = exact_root(d, q) {
                return mul_all(vec![
                    pow_rational(Rational::from_integer(n.clone()), exp.clone()),
                    pow_rational(Rational::from_integer(rd), -p),
                ]);
            }
            if let Some(rn) = exact_root(n, q) {
                return mul_all(vec![
                    pow_rational(Rational::from_integer(rn), p),
                    pow_rational(Rational::from_integer(d.clone()), -exp.clone()),
                ]);
            }
        }
        // Split off whole powers: 8^(1/2) -> 2*2^(1/2).
        let whole = exp.floor();
        if !whole.is_zero() {
            let frac_part = exp.clone() - whole.clone();
            return mul_all(vec![
                pow_rational(base.clone(), whole),
                Expr::Pow(Expr::Constant(base).boxed(), Expr::Constant(frac_part).boxed()),
            ]);
        }
    }
    Expr::Pow(Expr::Constant(base).boxed(), Expr::Constant(exp).boxed())
}

fn exact_root(value: &BigInt, q: u32) -> Option<BigInt> {
    if value.is_negative() || q == 0 {
        return None;
    }
    let root = value.nth_root(q);
    if root.pow(q) == *value {
        Some(root)
    } else {
        None
    }
}

pub fn func(f: Func, arg: Expr) -> Expr {
    match f {
        Func::Sin | Func::Tan | Func::Asin | Func::Atan | Func::Sinh | Func::Tanh => {
            if arg.is_zero() {
                return Expr::Constant(Rational::zero());
            }
            if let Some(inverse) = inverse_of(f, &arg) {
                return inverse;
            }
            if let Some(value) = at_half_turns(f, &arg) {
                return value;
            }
            if arg.could_extract_minus_sign() {
                return neg(func(f, neg(arg)));
            }
            Expr::Func(f, arg.boxed())
        }
        Func::Cos | Func::Cosh => {
            if arg.is_zero() {
                return Expr::Constant(Rational::one());
            }
            if let Some(inverse) = inverse_of(f, &arg) {
                return inverse;
            }
            if let Some(value) = at_half_turns(f, &arg) {
                return value;
            }
            if arg.could_extract_minus_sign() {
                return func(f, neg(arg));
            }
            Expr::Func(f, arg.boxed())
        }
        Func::Acos => Expr::Func(f, arg.boxed()),
        Func::Exp => exp_of(arg),
        Func::Log => match arg {
            a if a.is_one() => Expr::Constant(Rational::zero()),
            Expr::Func(Func::Exp, inner) => *inner,
            a => Expr::Func(Func::Log, a.boxed()),
        },
        Func::Abs => match arg {
            Expr::Constant(c) => Expr::Constant(c.abs()),
            Expr::Func(Func::Abs, inner) => Expr::Func(Func::Abs, inner),
            a if a.could_extract_minus_sign() => func(Func::Abs, neg(a)),
            a => Expr::Func(Func::Abs, a.boxed()),
        },
    }
}

/// `q` when `expr` is `q*pi`.
pub fn pi_multiple(expr: &Expr) -> Option<Rational> {
    match expr {
        Expr::Symbol(s) if s == PI => Some(Rational::one()),
        Expr::Mul(factors) => match factors.as_slice() {
            [Expr::Constant(q), Expr::Symbol(s)] | [Expr::Symbol(s), Expr::Constant(q)] if s == PI => {
                Some(q.clone())
            }
            _ => None,
        },
        _ => None,
    }
}

/// Exact `sin`, `cos` and `tan` at integer multiples of `pi/2`.
fn at_half_turns(f: Func, arg: &Expr) -> Option<Expr> {
    let halves = pi_multiple(arg)? * Rational::from_integer(BigInt::from(2));
    if !halves.is_integer() {
        return None;
    }
    let quarter = halves.to_integer().mod_floor(&BigInt::from(4)).to_u8()?;
    // Values at 0, pi/2, pi, 3*pi/2.
    let value = match (f, quarter) {
        (Func::Sin, q) => [0, 1, 0, -1][q as usize],
        (Func::Cos, q) => [1, 0, -1, 0][q as usize],
        (Func::Tan, 0 | 2) => 0,
        _ => return None,
    };
    Some(Expr::integer(value))
}

fn inverse_of(f: Func, arg: &Expr) -> Option<Expr> {
    let inverse = match f {
        Func::Sin => Func::Asin,
        Func::Cos => Func::Acos,
        Func::Tan => Func::Atan,
        _ => return None,
    };
    match arg {
        Expr::Func(g, inner) if *g == inverse => Some((**inner).clone()),
        _ => None,
    }
}

/// `exp` with logarithms pulled out of the exponent: `exp(a + 2*log(x)) = x^2*exp(a)`.
fn exp_of(arg: Expr) -> Expr {
    if arg.is_zero() {
        return Expr::Constant(Rational::one());
    }
    let mut pulled = Vec::new();
    let mut rest = Vec::new();
    for term in arg.terms() {
        match log_power(&term) {
            Some((base, c)) => pulled.push(pow(base, Expr::Constant(c))),
            None => rest.push(term),
        }
    }
    if pulled.is_empty() {
        return Expr::Func(Func::Exp, arg.boxed());
    }
    let remainder = add_all(rest);
    if remainder.is_zero() {
        mul_all(pulled)
    } else {
        pulled.push(Expr::Func(Func::Exp, remainder.boxed()));
        mul_all(pulled)
    }
}

fn log_power(term: &Expr) -> Option<(Expr, Rational)> {
    match term {
        Expr::Func(Func::Log, inner) => Some(((**inner).clone(), Rational::one())),
        Expr::Mul(factors) if factors.len() == 2 => match (&factors[0], &factors[1]) {
            (Expr::Constant(c), Expr::Func(Func::Log, inner)) => Some(((**inner).clone(), c.clone())),
            _ => None,
        },
        _ => None,
    }
}

pub fn order(inner: Expr) -> Expr {
    match inner {
        Expr::Constant(_) => Expr::Order(Expr::Constant(Rational::one()).boxed()),
        other => Expr::Order(strip_coefficient(other).boxed()),
    }
}

fn smallest_order(orders: Vec<Expr>) -> Option<Expr> {
    orders
        .into_iter()
        .min_by(|a, b| order_degree(a).cmp(&order_degree(b)).then_with(|| a.cmp(b)))
}

/// Degree of a monomial order term `x^n` (None when it is not a monomial).
fn order_degree(o: &Expr) -> Option<Rational> {
    match o {
        Expr::Symbol(_) => Some(Rational::one()),
        Expr::Pow(b, e) => match (&**b, &**e) {
            (Expr::Symbol(_), Expr::Constant(n)) => Some(n.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn order_symbol(o: &Expr) -> Option<&str> {
    match o {
        Expr::Symbol(s) => Some(s),
        Expr::Pow(b, _) => b.as_symbol(),
        _ => None,
    }
}

/// Whether the monomial order term swallows `term`: `x^3` absorbs `5*x^4*C1`.
fn order_absorbs(o: &Expr, term: &Expr) -> bool {
    let (Some(n), Some(var)) = (order_degree(o), order_symbol(o)) else {
        return false;
    };
    let mut degree = Rational::zero();
    for factor in term.factors() {
        match &factor {
            Expr::Symbol(s) if s == var => degree += Rational::one(),
            Expr::Pow(b, e) if b.as_symbol() == Some(var) => match &**e {
                Expr::Constant(k) => degree += k.clone(),
                _ => return false,
            },
            other if other.has_symbol(var) => return false,
            _ => {}
        }
    }
    degree >= n
}
