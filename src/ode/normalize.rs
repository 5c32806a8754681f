use std::fmt;

use crate::calculus::differentiate_n;
use crate::error::{OdeError, Result};
use crate::expr::{Equation, Expr};
use crate::parser::parse_condition_parts;
use crate::simplify::substitute_symbol;

/// An ordinary differential equation `expr = 0` in the unknown `name(var)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ode {
    /// `lhs - rhs` of the equation as given.
    pub expr: Expr,
    /// The unknown, `f(x)`.
    pub func: Expr,
    pub name: String,
    pub var: String,
    pub order: usize,
}

impl Ode {
    pub fn new(equation: &Equation, func: &Expr) -> Result<Ode> {
        Ode::from_expr(&equation.residual(), func)
    }

    pub fn from_expr(expr: &Expr, func: &Expr) -> Result<Ode> {
        let (name, var) = match func {
            Expr::Apply(name, args) => match args.as_slice() {
                [Expr::Symbol(var)] => (name.clone(), var.clone()),
                _ => {
                    return Err(OdeError::InvalidInput(format!(
                        "{func} must be a function of a single variable"
                    )))
                }
            },
            _ => return Err(OdeError::InvalidInput(format!("{func} is not an undefined function"))),
        };
        check_occurrences(expr, &name, &var)?;
        let order = ode_order(expr, func);
        if order == 0 {
            return Err(OdeError::InvalidInput(format!(
                "{expr} = 0 contains no derivative of {func}"
            )));
        }
        Ok(Ode {
            expr: expr.clone(),
            func: func.clone(),
            name,
            var,
            order,
        })
    }

    /// Same unknown, different equation; the order is recomputed.
    pub fn with_expr(&self, expr: Expr) -> Result<Ode> {
        Ode::from_expr(&expr, &self.func)
    }

    pub fn x(&self) -> Expr {
        Expr::Symbol(self.var.clone())
    }

    /// `k`-th derivative of the unknown.
    pub fn derivative(&self, k: usize) -> Expr {
        differentiate_n(&self.func, &self.var, k)
    }

    pub fn equation(&self) -> Equation {
        Equation::new(self.expr.clone(), Expr::integer(0))
    }

    /// Replace `f(x)` and its derivatives by the placeholders of [`dummy`].
    pub fn to_symbols(&self, expr: &Expr) -> Expr {
        match expr {
            Expr::Derivative(inner, v, k) if **inner == self.func && *v == self.var => dummy(*k),
            e if *e == self.func => dummy(0),
            e => e.map_children(|c| self.to_symbols(c)),
        }
    }

    /// Inverse of [`Ode::to_symbols`].
    pub fn from_symbols(&self, expr: &Expr) -> Expr {
        let mut out = expr.clone();
        for k in 0..=self.order {
            let name = dummy_name(k);
            if out.has_symbol(&name) {
                out = substitute_symbol(&out, &name, &self.derivative(k));
            }
        }
        out
    }
}

impl fmt::Display for Ode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = 0", self.expr)
    }
}

pub(crate) fn dummy_name(k: usize) -> String {
    format!("_d{k}")
}

/// Placeholder symbol standing for the `k`-th derivative of the unknown.
pub(crate) fn dummy(k: usize) -> Expr {
    Expr::Symbol(dummy_name(k))
}

/// Highest derivative order of `func` occurring in `expr`; 0 when only the
/// function itself (or nothing) appears.
pub fn ode_order(expr: &Expr, func: &Expr) -> usize {
    expr.preorder()
        .into_iter()
        .filter_map(|node| match node {
            Expr::Derivative(inner, _, k) if **inner == *func => Some(*k),
            _ => None,
        })
        .max()
        .unwrap_or(0)
}

fn check_occurrences(expr: &Expr, name: &str, var: &str) -> Result<()> {
    for node in expr.preorder() {
        match node {
            Expr::Derivative(inner, v, _) if matches!(&**inner, Expr::Apply(n, _) if n == name) => {
                if v != var {
                    return Err(OdeError::InvalidInput(format!(
                        "{node} differentiates {name} with respect to {v}, not {var}"
                    )));
                }
            }
            Expr::Apply(n, args) if n == name => {
                if !matches!(args.as_slice(), [Expr::Symbol(v)] if v == var) {
                    return Err(OdeError::InvalidInput(format!("{node} is not {name}({var})")));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// `f^(order)(point) = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub order: usize,
    pub point: Expr,
    pub value: Expr,
}

/// Initial (or boundary) conditions, applied once a general solution exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitialConditions {
    entries: Vec<Condition>,
}

impl InitialConditions {
    pub fn new() -> Self {
        InitialConditions::default()
    }

    /// `f(x0) = v`.
    pub fn value(self, x0: impl Into<Expr>, v: impl Into<Expr>) -> Self {
        self.derivative(0, x0, v)
    }

    /// `f^(k)(x0) = v`.
    pub fn derivative(mut self, k: usize, x0: impl Into<Expr>, v: impl Into<Expr>) -> Self {
        self.entries.push(Condition {
            order: k,
            point: x0.into(),
            value: v.into(),
        });
        self
    }

    /// Parse comma separated conditions such as `f(0) = 1, f'(0) = 0`.
    pub fn parse(text: &str, name: &str) -> Result<Self> {
        let mut out = InitialConditions::new();
        for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            out.entries.push(parse_condition(part, name)?);
        }
        Ok(out)
    }

    pub fn entries(&self) -> &[Condition] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Parse a single condition, `f'(0) = 2`, for the function called `name`.
pub fn parse_condition(text: &str, name: &str) -> Result<Condition> {
    let (found, order, point, value) = parse_condition_parts(text)?;
    if found != name {
        return Err(OdeError::InvalidInput(format!(
            "condition `{text}` is not about {name}"
        )));
    }
    if mentions(&point, name) || mentions(&value, name) {
        return Err(OdeError::InvalidInput(format!(
            "condition `{text}` refers to {name} on both sides"
        )));
    }
    Ok(Condition { order, point, value })
}

fn mentions(expr: &Expr, name: &str) -> bool {
    expr.preorder()
        .into_iter()
        .any(|node| matches!(node, Expr::Apply(n, _) if n == name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{int, sym};
    use crate::parser::parse_equation;

    fn f() -> Expr {
        Expr::apply("f", vec![sym("x")])
    }

    #[test]
    fn order_is_highest_derivative() {
        let eq = parse_equation("f''(x) + f'(x)^3 = x").expect("parse");
        let ode = Ode::new(&eq, &f()).expect("ode");
        assert_eq!(ode.order, 2);
        assert_eq!(ode.to_symbols(&ode.expr).free_symbols().len(), 3);
    }

    #[test]
    fn rejects_equations_without_derivatives() {
        let eq = parse_equation("f(x) = x").expect("parse");
        assert!(matches!(Ode::new(&eq, &f()), Err(OdeError::InvalidInput(_))));
    }

    #[test]
    fn rejects_other_arguments() {
        let eq = parse_equation("f'(x) = f(2*x)").expect("parse");
        assert!(Ode::new(&eq, &f()).is_err());
    }

    #[test]
    fn parses_derivative_condition() {
        let cond = parse_condition("f'(0) = 2", "f").expect("condition");
        assert_eq!(cond, Condition { order: 1, point: int(0), value: int(2) });
    }
}
