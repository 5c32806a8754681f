use num_traits::ToPrimitive;

use crate::expr::Expr;
use crate::simplify::rules::{add_all, mul_all, pow};

/// Upper bound on the number of terms a single expansion may produce.
const DEFAULT_TERM_LIMIT: usize = 4096;

/// Distribute products over sums and expand positive integer powers of sums,
/// recursing into every sub-expression.
pub fn expand(expr: &Expr) -> Expr {
    expand_with_limit(expr, DEFAULT_TERM_LIMIT)
}

pub fn expand_with_limit(expr: &Expr, limit: usize) -> Expr {
    match expr {
        Expr::Constant(_) | Expr::Symbol(_) | Expr::Wild(_) => expr.clone(),
        Expr::Add(terms) => add_all(terms.iter().map(|t| expand_with_limit(t, limit)).collect()),
        Expr::Mul(factors) => {
            let expanded: Vec<Expr> = factors.iter().map(|f| expand_with_limit(f, limit)).collect();
            distribute(expanded, limit)
        }
        Expr::Pow(base, exp) => {
            let base = expand_with_limit(base, limit);
            let exp = expand_with_limit(exp, limit);
            match (&base, exp.as_integer().and_then(|k| k.to_i64())) {
                (Expr::Add(terms), Some(k)) if k > 1 => {
                    let n = terms.len();
                    if n.checked_pow(k as u32).map(|t| t > limit).unwrap_or(true) {
                        return pow(base, exp);
                    }
                    distribute(vec![base.clone(); k as usize], limit)
                }
                (Expr::Mul(_), _) => {
                    let rebuilt = pow(base, exp);
                    if matches!(rebuilt, Expr::Mul(_)) {
                        expand_with_limit(&rebuilt, limit)
                    } else {
                        rebuilt
                    }
                }
                _ => pow(base, exp),
            }
        }
        other => other.map_children(|c| expand_with_limit(c, limit)),
    }
}

/// Multiply out a list of already expanded factors.
fn distribute(factors: Vec<Expr>, limit: usize) -> Expr {
    let mut acc: Vec<Expr> = vec![Expr::integer(1)];
    for factor in factors {
        let terms = match &factor {
            Expr::Add(terms) => terms.clone(),
            _ => vec![factor.clone()],
        };
        if acc.len() * terms.len() > limit {
            let partial = add_all(acc);
            return mul_all(vec![partial, factor]);
        }
        let mut next = Vec::with_capacity(acc.len() * terms.len());
        for a in &acc {
            for t in &terms {
                next.push(mul_all(vec![a.clone(), t.clone()]));
            }
        }
        acc = next;
    }
    add_all(acc)
}
