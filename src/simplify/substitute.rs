use crate::calculus::differentiate_n;
use crate::expr::Expr;

/// Replace every occurrence of `target` in `expr` with `replacement`.
///
/// `target` may be a symbol or any sub-expression such as `f(x)` or one of its
/// derivatives. Replacing an unknown function inside a derivative differentiates
/// the replacement, and replacing a lower derivative inside a higher one
/// differentiates the remaining number of times.
pub fn substitute(expr: &Expr, target: &Expr, replacement: &Expr) -> Expr {
    if expr == target {
        return replacement.clone();
    }
    match expr {
        Expr::Constant(_) | Expr::Symbol(_) | Expr::Wild(_) => expr.clone(),
        Expr::Derivative(inner, var, n) => {
            if let Expr::Derivative(t_inner, t_var, k) = target {
                if t_inner == inner && t_var == var && k < n {
                    return differentiate_n(replacement, var, n - k);
                }
            }
            // f'(x) at a point has no closed representation here.
            if target.as_symbol() == Some(var.as_str()) && has_unknown_function(inner) {
                return expr.clone();
            }
            let inner = substitute(inner, target, replacement);
            differentiate_n(&inner, var, *n)
        }
        Expr::Integral(inner, var, upper) => match (target, upper) {
            (Expr::Symbol(name), None) if name == var => Expr::Integral(
                inner.clone(),
                var.clone(),
                Some(replacement.clone().boxed()),
            ),
            (Expr::Symbol(name), Some(u)) if name == var => Expr::Integral(
                inner.clone(),
                var.clone(),
                Some(substitute(u, target, replacement).boxed()),
            ),
            _ => expr.map_children(|c| substitute(c, target, replacement)),
        },
        _ => expr.map_children(|c| substitute(c, target, replacement)),
    }
}

/// Apply substitutions one after another.
pub fn substitute_many(expr: &Expr, pairs: &[(Expr, Expr)]) -> Expr {
    pairs
        .iter()
        .fold(expr.clone(), |acc, (target, value)| substitute(&acc, target, value))
}

fn has_unknown_function(expr: &Expr) -> bool {
    expr.preorder().into_iter().any(|e| matches!(e, Expr::Apply(..)))
}

pub fn substitute_symbol(expr: &Expr, name: &str, replacement: &Expr) -> Expr {
    substitute(expr, &Expr::symbol(name), replacement)
}
