use crate::expr::{Expr, Func, Rational};
use crate::simplify::rules::{add_all, func, mul_all, neg, order, pow};
use crate::simplify::substitute;
use num_traits::One;

pub fn differentiate(expr: &Expr, var: &str) -> Expr {
    Differentiator { var }.derive(expr)
}

/// `n`-th derivative; `n = 0` returns the expression unchanged.
pub fn differentiate_n(expr: &Expr, var: &str, n: usize) -> Expr {
    let mut out = expr.clone();
    for _ in 0..n {
        if out.is_zero() {
            break;
        }
        out = differentiate(&out, var);
    }
    out
}

struct Differentiator<'a> {
    var: &'a str,
}

impl<'a> Differentiator<'a> {
    fn derive(&self, expr: &Expr) -> Expr {
        if !self.depends(expr) {
            return zero();
        }
        match expr {
            Expr::Symbol(name) if name == self.var => Expr::Constant(Rational::one()),
            Expr::Constant(_) | Expr::Symbol(_) | Expr::Wild(_) => zero(),

            Expr::Add(terms) => add_all(terms.iter().map(|t| self.derive(t)).collect()),
            Expr::Mul(factors) => self.product_rule(factors),
            Expr::Pow(base, exp) => self.power_rule(base, exp),
            Expr::Func(f, arg) => self.chain_rule(*f, arg),

            Expr::Derivative(inner, var, n) if var == self.var => {
                Expr::Derivative(inner.clone(), var.clone(), n + 1)
            }
            // Unknown functions stay as derivative nodes.
            Expr::Apply(..) | Expr::Derivative(..) => {
                Expr::Derivative(expr.clone().boxed(), self.var.to_string(), 1)
            }

            Expr::Integral(inner, var, None) if var == self.var => (**inner).clone(),
            Expr::Integral(inner, var, None) => {
                Expr::Integral(self.derive(inner).boxed(), var.clone(), None)
            }
            Expr::Integral(inner, var, Some(upper)) => self.leibniz(inner, var, upper),

            Expr::Order(inner) => order(mul_all(vec![
                (**inner).clone(),
                pow(Expr::symbol(self.var), Expr::integer(-1)),
            ])),
        }
    }

    fn depends(&self, expr: &Expr) -> bool {
        expr.has_symbol(self.var)
    }

    fn product_rule(&self, factors: &[Expr]) -> Expr {
        let mut terms = Vec::with_capacity(factors.len());
        for (idx, factor) in factors.iter().enumerate() {
            let d = self.derive(factor);
            if d.is_zero() {
                continue;
            }
            let mut product: Vec<Expr> = factors
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != idx)
                .map(|(_, f)| f.clone())
                .collect();
            product.push(d);
            terms.push(mul_all(product));
        }
        add_all(terms)
    }

    fn power_rule(&self, base: &Expr, exp: &Expr) -> Expr {
        let base_dep = self.depends(base);
        let exp_dep = self.depends(exp);
        let whole = pow(base.clone(), exp.clone());
        match (base_dep, exp_dep) {
            (true, false) => mul_all(vec![
                exp.clone(),
                pow(base.clone(), add_all(vec![exp.clone(), Expr::integer(-1)])),
                self.derive(base),
            ]),
            (false, true) => mul_all(vec![whole, func(Func::Log, base.clone()), self.derive(exp)]),
            (true, true) => mul_all(vec![
                whole,
                add_all(vec![
                    mul_all(vec![self.derive(exp), func(Func::Log, base.clone())]),
                    mul_all(vec![
                        exp.clone(),
                        self.derive(base),
                        pow(base.clone(), Expr::integer(-1)),
                    ]),
                ]),
            ]),
            (false, false) => zero(),
        }
    }

    fn chain_rule(&self, f: Func, arg: &Expr) -> Expr {
        let u = arg.clone();
        let outer = match f {
            Func::Sin => func(Func::Cos, u),
            Func::Cos => neg(func(Func::Sin, u)),
            Func::Tan => add_all(vec![Expr::integer(1), pow(func(Func::Tan, u), Expr::integer(2))]),
            Func::Asin => pow(
                add_all(vec![Expr::integer(1), neg(pow(u, Expr::integer(2)))]),
                Expr::constant(-1, 2),
            ),
            Func::Acos => neg(pow(
                add_all(vec![Expr::integer(1), neg(pow(u, Expr::integer(2)))]),
                Expr::constant(-1, 2),
            )),
            Func::Atan => pow(
                add_all(vec![Expr::integer(1), pow(u, Expr::integer(2))]),
                Expr::integer(-1),
            ),
            Func::Sinh => func(Func::Cosh, u),
            Func::Cosh => func(Func::Sinh, u),
            Func::Tanh => add_all(vec![Expr::integer(1), neg(pow(func(Func::Tanh, u), Expr::integer(2)))]),
            Func::Exp => func(Func::Exp, u),
            Func::Log => pow(u, Expr::integer(-1)),
            Func::Abs => mul_all(vec![func(Func::Abs, u.clone()), pow(u, Expr::integer(-1))]),
        };
        mul_all(vec![outer, self.derive(arg)])
    }

    /// d/dx F(u(x)) where F is an antiderivative in the bound variable `var`.
    fn leibniz(&self, inner: &Expr, var: &str, upper: &Expr) -> Expr {
        let at_upper = substitute(inner, &Expr::symbol(var), upper);
        let mut terms = vec![mul_all(vec![at_upper, self.derive(upper)])];
        if var != self.var {
            let d_inner = self.derive(inner);
            if !d_inner.is_zero() {
                terms.push(Expr::Integral(
                    d_inner.boxed(),
                    var.to_string(),
                    Some(upper.clone().boxed()),
                ));
            }
        }
        add_all(terms)
    }
}

fn zero() -> Expr {
    Expr::integer(0)
}
