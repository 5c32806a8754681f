//! Expression tree definitions and helpers.
//!
//! Every [`Expr`] built through the constructors in this module (or the operator
//! implementations) is kept in canonical form: sums and products are flattened,
//! like terms and powers are collected, numbers are folded and operands are sorted.
//! Structural equality is therefore a cheap, sound (but incomplete) test for
//! mathematical equality.

use std::collections::BTreeSet;
use std::fmt;
use std::ops;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::simplify::rules;

pub type Rational = BigRational;

/// Elementary functions of a single argument.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Log,
    Abs,
}

impl Func {
    pub const ALL: [Func; 12] = [
        Func::Sin,
        Func::Cos,
        Func::Tan,
        Func::Asin,
        Func::Acos,
        Func::Atan,
        Func::Sinh,
        Func::Cosh,
        Func::Tanh,
        Func::Exp,
        Func::Log,
        Func::Abs,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Asin => "asin",
            Func::Acos => "acos",
            Func::Atan => "atan",
            Func::Sinh => "sinh",
            Func::Cosh => "cosh",
            Func::Tanh => "tanh",
            Func::Exp => "exp",
            Func::Log => "log",
            Func::Abs => "abs",
        }
    }

    pub fn from_name(name: &str) -> Option<Func> {
        match name {
            "arcsin" => Some(Func::Asin),
            "arccos" => Some(Func::Acos),
            "arctan" => Some(Func::Atan),
            "ln" => Some(Func::Log),
            other => Func::ALL.iter().copied().find(|f| f.name() == other),
        }
    }
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Expr {
    Constant(Rational),
    Symbol(String),
    /// Pattern placeholder; only meaningful inside match templates.
    Wild(String),
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Func(Func, Box<Expr>),
    /// Application of an undefined function, e.g. `f(x)`.
    Apply(String, Vec<Expr>),
    /// `n`-th derivative of the inner expression with respect to a variable.
    Derivative(Box<Expr>, String, usize),
    /// Antiderivative that could not (or should not) be evaluated. With an upper
    /// point the antiderivative is evaluated there and the variable is bound.
    Integral(Box<Expr>, String, Option<Box<Expr>>),
    /// Remainder term `O(..)` of a truncated series.
    Order(Box<Expr>),
}

impl Expr {
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    pub fn wild(name: impl Into<String>) -> Self {
        Expr::Wild(name.into())
    }

    pub fn constant(num: impl Into<BigInt>, den: impl Into<BigInt>) -> Self {
        Expr::Constant(Rational::new(num.into(), den.into()))
    }

    pub fn integer(value: impl Into<BigInt>) -> Self {
        Expr::Constant(Rational::from_integer(value.into()))
    }

    pub fn rational(value: Rational) -> Self {
        Expr::Constant(value)
    }

    pub fn apply(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Apply(name.into(), args)
    }

    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Constant(r) if r.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Constant(r) if r.is_one())
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::Constant(_))
    }

    pub fn as_constant(&self) -> Option<&Rational> {
        match self {
            Expr::Constant(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<BigInt> {
        match self {
            Expr::Constant(r) if r.is_integer() => Some(r.to_integer()),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Expr::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// Numeric coefficient of a term, `3` for `3*x*y`, `1` for `x`.
    pub fn coefficient(&self) -> Rational {
        match self {
            Expr::Constant(c) => c.clone(),
            Expr::Mul(factors) => match factors.first() {
                Some(Expr::Constant(c)) => c.clone(),
                _ => Rational::one(),
            },
            _ => Rational::one(),
        }
    }

    /// True when the expression carries an explicit negative sign.
    pub fn could_extract_minus_sign(&self) -> bool {
        self.coefficient().is_negative()
    }

    /// Terms of a sum (the expression itself when it is not a sum).
    pub fn terms(&self) -> Vec<Expr> {
        match self {
            Expr::Add(terms) => terms.clone(),
            other => vec![other.clone()],
        }
    }

    /// Factors of a product (the expression itself when it is not a product).
    pub fn factors(&self) -> Vec<Expr> {
        match self {
            Expr::Mul(factors) => factors.clone(),
            other => vec![other.clone()],
        }
    }

    /// Immediate sub-expressions.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Constant(_) | Expr::Symbol(_) | Expr::Wild(_) => Vec::new(),
            Expr::Add(items) | Expr::Mul(items) | Expr::Apply(_, items) => items.iter().collect(),
            Expr::Pow(b, e) => vec![&**b, &**e],
            Expr::Func(_, a) | Expr::Derivative(a, _, _) | Expr::Order(a) => vec![&**a],
            Expr::Integral(a, _, upper) => {
                let mut out = vec![&**a];
                if let Some(u) = upper {
                    out.push(&**u);
                }
                out
            }
        }
    }

    /// Rebuild the expression with `f` applied to every immediate child, going
    /// through the canonical constructors.
    pub fn map_children<F>(&self, mut f: F) -> Expr
    where
        F: FnMut(&Expr) -> Expr,
    {
        match self {
            Expr::Constant(_) | Expr::Symbol(_) | Expr::Wild(_) => self.clone(),
            Expr::Add(terms) => rules::add_all(terms.iter().map(&mut f).collect()),
            Expr::Mul(factors) => rules::mul_all(factors.iter().map(&mut f).collect()),
            Expr::Pow(b, e) => {
                let b = f(&**b);
                let e = f(&**e);
                rules::pow(b, e)
            }
            Expr::Func(func, a) => rules::func(*func, f(&**a)),
            Expr::Apply(name, args) => Expr::Apply(name.clone(), args.iter().map(&mut f).collect()),
            Expr::Derivative(inner, var, n) => {
                crate::calculus::differentiate_n(&f(&**inner), var, *n)
            }
            Expr::Integral(inner, var, upper) => {
                let inner = f(&**inner);
                let upper = upper.as_ref().map(|u| f(&**u).boxed());
                Expr::Integral(inner.boxed(), var.clone(), upper)
            }
            Expr::Order(inner) => rules::order(f(&**inner)),
        }
    }

    /// Structural containment of `target` anywhere in the tree.
    pub fn has(&self, target: &Expr) -> bool {
        if self == target {
            return true;
        }
        self.children().into_iter().any(|c| c.has(target))
    }

    pub fn has_any(&self, targets: &[Expr]) -> bool {
        targets.iter().any(|t| self.has(t))
    }

    /// Whether `name` occurs free.
    pub fn has_symbol(&self, name: &str) -> bool {
        match self {
            Expr::Symbol(s) => s == name,
            Expr::Integral(inner, var, Some(upper)) => {
                upper.has_symbol(name) || (var != name && inner.has_symbol(name))
            }
            _ => self.children().into_iter().any(|c| c.has_symbol(name)),
        }
    }

    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        collect_symbols(self, &mut out);
        out
    }

    pub fn has_wild(&self) -> bool {
        match self {
            Expr::Wild(_) => true,
            _ => self.children().into_iter().any(Expr::has_wild),
        }
    }

    pub fn has_integral(&self) -> bool {
        match self {
            Expr::Integral(..) => true,
            _ => self.children().into_iter().any(Expr::has_integral),
        }
    }

    pub fn has_order(&self) -> bool {
        match self {
            Expr::Order(_) => true,
            _ => self.children().into_iter().any(Expr::has_order),
        }
    }

    /// Every sub-expression, parents before children.
    pub fn preorder(&self) -> Vec<&Expr> {
        let mut out = vec![self];
        let mut idx = 0;
        while idx < out.len() {
            let node = out[idx];
            out.extend(node.children());
            idx += 1;
        }
        out
    }

    /// Number of nodes, used as a crude complexity measure.
    pub fn size(&self) -> usize {
        1 + self.children().into_iter().map(Expr::size).sum::<usize>()
    }
}

fn collect_symbols(expr: &Expr, out: &mut BTreeSet<String>) {
    match expr {
        Expr::Symbol(s) => {
            out.insert(s.clone());
        }
        Expr::Integral(inner, var, Some(upper)) => {
            let mut inner_syms = BTreeSet::new();
            collect_symbols(inner, &mut inner_syms);
            inner_syms.remove(var);
            out.extend(inner_syms);
            collect_symbols(upper, out);
        }
        _ => {
            for child in expr.children() {
                collect_symbols(child, out);
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::format::pretty(self))
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::integer(value)
    }
}

impl From<Rational> for Expr {
    fn from(value: Rational) -> Self {
        Expr::Constant(value)
    }
}

impl ops::Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        rules::add_all(vec![self, rhs])
    }
}

impl ops::Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        rules::add_all(vec![self, rules::neg(rhs)])
    }
}

impl ops::Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        rules::mul_all(vec![self, rhs])
    }
}

impl ops::Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        rules::mul_all(vec![self, rules::pow(rhs, minus_one())])
    }
}

impl ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        rules::neg(self)
    }
}

/// An equation `lhs = rhs`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Equation {
    pub lhs: Expr,
    pub rhs: Expr,
}

impl Equation {
    pub fn new(lhs: Expr, rhs: Expr) -> Self {
        Equation { lhs, rhs }
    }

    /// `lhs - rhs`.
    pub fn residual(&self) -> Expr {
        self.lhs.clone() - self.rhs.clone()
    }

    pub fn map<F>(&self, mut f: F) -> Equation
    where
        F: FnMut(&Expr) -> Expr,
    {
        Equation {
            lhs: f(&self.lhs),
            rhs: f(&self.rhs),
        }
    }

    pub fn has(&self, target: &Expr) -> bool {
        self.lhs.has(target) || self.rhs.has(target)
    }

    pub fn reversed(&self) -> Equation {
        Equation::new(self.rhs.clone(), self.lhs.clone())
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}

pub fn zero() -> Expr {
    Expr::Constant(Rational::zero())
}

pub fn one() -> Expr {
    Expr::Constant(Rational::one())
}

pub fn minus_one() -> Expr {
    Expr::Constant(-Rational::one())
}

pub fn rational(num: i64, den: i64) -> Rational {
    Rational::new(num.into(), den.into())
}

pub fn sym(name: &str) -> Expr {
    Expr::Symbol(name.to_string())
}

pub fn int(value: i64) -> Expr {
    Expr::integer(value)
}

pub fn frac(num: i64, den: i64) -> Expr {
    Expr::Constant(rational(num, den))
}

pub fn add(a: Expr, b: Expr) -> Expr {
    rules::add_all(vec![a, b])
}

pub fn sub(a: Expr, b: Expr) -> Expr {
    a - b
}

pub fn mul(a: Expr, b: Expr) -> Expr {
    rules::mul_all(vec![a, b])
}

pub fn div(a: Expr, b: Expr) -> Expr {
    a / b
}

pub fn neg(a: Expr) -> Expr {
    rules::neg(a)
}

pub fn pow(base: Expr, exp: Expr) -> Expr {
    rules::pow(base, exp)
}

pub fn powi(base: Expr, exp: i64) -> Expr {
    rules::pow(base, Expr::integer(exp))
}

pub fn sqrt(a: Expr) -> Expr {
    rules::pow(a, frac(1, 2))
}

pub fn exp(a: Expr) -> Expr {
    rules::func(Func::Exp, a)
}

pub fn log(a: Expr) -> Expr {
    rules::func(Func::Log, a)
}

pub fn sin(a: Expr) -> Expr {
    rules::func(Func::Sin, a)
}

pub fn cos(a: Expr) -> Expr {
    rules::func(Func::Cos, a)
}

pub fn tan(a: Expr) -> Expr {
    rules::func(Func::Tan, a)
}

pub fn atan(a: Expr) -> Expr {
    rules::func(Func::Atan, a)
}

pub fn call(f: Func, a: Expr) -> Expr {
    rules::func(f, a)
}

pub fn add_all(terms: Vec<Expr>) -> Expr {
    rules::add_all(terms)
}

pub fn mul_all(factors: Vec<Expr>) -> Expr {
    rules::mul_all(factors)
}
