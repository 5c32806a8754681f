//! Structural matching of expressions against templates with wildcards.
//!
//! A template is an ordinary [`Expr`] containing [`Expr::Wild`] placeholders.
//! Matching is algebraic rather than purely syntactic: in a sum, a
//! coefficient wildcard such as `a_*f'(x)` collects every term divisible by
//! `f'(x)` and a bare wildcard term collects whatever is left.

use std::collections::BTreeMap;

use crate::error::Unsolvable;
use crate::expr::{Expr, Rational};
use crate::simplify::rules::{add_all, mul_all, neg, pow};
use crate::simplify::{equivalent, expand};

/// A named placeholder that refuses candidates containing any excluded
/// sub-expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Wild {
    pub name: String,
    pub exclude: Vec<Expr>,
}

impl Wild {
    pub fn new(name: impl Into<String>, exclude: &[Expr]) -> Self {
        Wild {
            name: name.into(),
            exclude: exclude.to_vec(),
        }
    }

    /// The placeholder as it appears inside a template.
    pub fn expr(&self) -> Expr {
        Expr::Wild(self.name.clone())
    }

    fn accepts(&self, candidate: &Expr) -> bool {
        !candidate.has_wild() && !candidate.has_any(&self.exclude)
    }
}

/// Bindings produced by a successful match, keyed by wildcard name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchRecord {
    bindings: BTreeMap<String, Expr>,
}

impl MatchRecord {
    pub fn new() -> Self {
        MatchRecord::default()
    }

    pub fn get(&self, key: &str) -> Option<&Expr> {
        self.bindings.get(key)
    }

    /// Binding for `key`, or an [`Unsolvable`] naming the missing key.
    pub fn require(&self, key: &str) -> Result<&Expr, Unsolvable> {
        self.bindings
            .get(key)
            .ok_or_else(|| Unsolvable::new(format!("match record has no `{key}`")))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Expr) {
        self.bindings.insert(key.into(), value);
    }

    pub fn with(mut self, key: impl Into<String>, value: Expr) -> Self {
        self.insert(key, value);
        self
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.bindings.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Expr)> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Match `expr` against `pattern`. Every wildcard in the template must be
/// described in `wilds`.
pub fn match_pattern(expr: &Expr, pattern: &Expr, wilds: &[Wild]) -> Option<MatchRecord> {
    let matcher = Matcher { wilds };
    let mut record = MatchRecord::new();
    if matcher.matches(expr, pattern, &mut record) {
        Some(record)
    } else {
        None
    }
}

struct Matcher<'a> {
    wilds: &'a [Wild],
}

impl Matcher<'_> {
    fn wild(&self, name: &str) -> Option<&Wild> {
        self.wilds.iter().find(|w| w.name == name)
    }

    fn bind(&self, name: &str, value: Expr, record: &mut MatchRecord) -> bool {
        let Some(wild) = self.wild(name) else {
            return false;
        };
        if !wild.accepts(&value) {
            return false;
        }
        match record.get(name) {
            Some(existing) => equivalent(existing, &value),
            None => {
                record.insert(name, value);
                true
            }
        }
    }

    fn accepts(&self, name: &str, value: &Expr) -> bool {
        self.wild(name).map(|w| w.accepts(value)).unwrap_or(false)
    }

    fn matches(&self, expr: &Expr, pattern: &Expr, record: &mut MatchRecord) -> bool {
        if !pattern.has_wild() {
            return equivalent(expr, pattern);
        }
        match pattern {
            Expr::Wild(name) => self.bind(name, expr.clone(), record),
            Expr::Add(terms) => self.match_sum(expr, terms, record),
            Expr::Mul(factors) => self.match_product(expr, factors, record),
            Expr::Pow(pb, pe) => {
                if let Expr::Pow(b, e) = expr {
                    let mut trial = record.clone();
                    if self.matches(b, pb, &mut trial) && self.matches(e, pe, &mut trial) {
                        *record = trial;
                        return true;
                    }
                }
                // A non-power is its own first power.
                let mut trial = record.clone();
                if self.matches(expr, pb, &mut trial) && self.matches(&Expr::integer(1), pe, &mut trial) {
                    *record = trial;
                    return true;
                }
                false
            }
            Expr::Func(f, pa) => match expr {
                Expr::Func(g, a) if f == g => self.matches(a, pa, record),
                _ => false,
            },
            Expr::Apply(name, pargs) => match expr {
                Expr::Apply(other, args) if name == other && args.len() == pargs.len() => {
                    let mut trial = record.clone();
                    let ok = args
                        .iter()
                        .zip(pargs)
                        .all(|(a, p)| self.matches(a, p, &mut trial));
                    if ok {
                        *record = trial;
                    }
                    ok
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn match_sum(&self, expr: &Expr, pattern_terms: &[Expr], record: &mut MatchRecord) -> bool {
        let mut fixed = Vec::new();
        let mut coefficient = Vec::new();
        let mut structured = Vec::new();
        let mut bare = Vec::new();
        for term in pattern_terms {
            if !term.has_wild() {
                fixed.push(term.clone());
            } else if let Expr::Wild(name) = term {
                bare.push(name.clone());
            } else if let Some(split) = coefficient_term(term) {
                coefficient.push(split);
            } else {
                structured.push(term.clone());
            }
        }

        let mut trial = record.clone();
        let mut remaining = expr.clone();
        if !fixed.is_empty() {
            let mut items = vec![remaining];
            items.extend(fixed.into_iter().map(neg));
            remaining = add_all(items);
        }
        let mut rest: Vec<Expr> = if remaining.is_zero() {
            Vec::new()
        } else {
            expand(&remaining).terms()
        };

        for (name, fixed_part) in &coefficient {
            let inverse = pow(fixed_part.clone(), Expr::integer(-1));
            let mut collected = Vec::new();
            let mut kept = Vec::new();
            for term in rest {
                let quotient = mul_all(vec![term.clone(), inverse.clone()]);
                if divides_cleanly(&quotient, fixed_part) && self.accepts(name, &quotient) {
                    collected.push(quotient);
                } else {
                    kept.push(term);
                }
            }
            rest = kept;
            if !self.bind(name, add_all(collected), &mut trial) {
                return false;
            }
        }

        for pattern in &structured {
            let position = rest.iter().position(|term| {
                let mut probe = trial.clone();
                self.matches(term, pattern, &mut probe)
            });
            let Some(idx) = position else {
                return false;
            };
            let term = rest.remove(idx);
            if !self.matches(&term, pattern, &mut trial) {
                return false;
            }
        }

        if !self.distribute(rest, &bare, true, &mut trial) {
            return false;
        }
        *record = trial;
        true
    }

    fn match_product(&self, expr: &Expr, pattern_factors: &[Expr], record: &mut MatchRecord) -> bool {
        let mut fixed = Vec::new();
        let mut structured = Vec::new();
        let mut bare = Vec::new();
        for factor in pattern_factors {
            if !factor.has_wild() {
                fixed.push(factor.clone());
            } else if let Expr::Wild(name) = factor {
                bare.push(name.clone());
            } else {
                structured.push(factor.clone());
            }
        }

        let mut remaining = expr.clone();
        if !fixed.is_empty() {
            let divisor = mul_all(fixed);
            remaining = mul_all(vec![remaining, pow(divisor.clone(), Expr::integer(-1))]);
            if !divides_cleanly(&remaining, &divisor) {
                return false;
            }
        }

        let mut trial = record.clone();
        let mut rest = remaining.factors();
        for pattern in &structured {
            let position = rest.iter().position(|factor| {
                let mut probe = trial.clone();
                self.matches(factor, pattern, &mut probe)
            });
            match position {
                Some(idx) => {
                    let factor = rest.remove(idx);
                    if !self.matches(&factor, pattern, &mut trial) {
                        return false;
                    }
                }
                None => {
                    if !self.matches(&Expr::integer(1), pattern, &mut trial) {
                        return false;
                    }
                }
            }
        }

        if !self.distribute(rest, &bare, false, &mut trial) {
            return false;
        }
        *record = trial;
        true
    }

    /// Hand leftover terms (or factors) to bare wildcards, each going to the
    /// first wildcard whose exclusions allow it.
    fn distribute(&self, items: Vec<Expr>, bare: &[String], sum: bool, record: &mut MatchRecord) -> bool {
        let identity = if sum { Expr::integer(0) } else { Expr::integer(1) };
        if bare.is_empty() {
            return items.into_iter().all(|item| item == identity);
        }
        let mut groups: Vec<Vec<Expr>> = vec![Vec::new(); bare.len()];
        for item in items {
            let Some(slot) = bare.iter().position(|name| self.accepts(name, &item)) else {
                return false;
            };
            groups[slot].push(item);
        }
        for (name, group) in bare.iter().zip(groups) {
            let value = if sum { add_all(group) } else { mul_all(group) };
            if !self.bind(name, value, record) {
                return false;
            }
        }
        true
    }
}

/// Split `w_*rest` into the wildcard name and its wildcard-free cofactor.
fn coefficient_term(term: &Expr) -> Option<(String, Expr)> {
    let Expr::Mul(factors) = term else {
        return None;
    };
    let mut name = None;
    let mut rest = Vec::new();
    for factor in factors {
        match factor {
            Expr::Wild(w) if name.is_none() => name = Some(w.clone()),
            other if other.has_wild() => return None,
            other => rest.push(other.clone()),
        }
    }
    Some((name?, mul_all(rest)))
}

/// A quotient divides cleanly when no factor of the divisor was left in its
/// denominator.
fn divides_cleanly(quotient: &Expr, divisor: &Expr) -> bool {
    let bases: Vec<Expr> = divisor.factors().into_iter().map(|f| base_of(&f)).collect();
    !quotient.factors().iter().any(|factor| match factor {
        Expr::Pow(b, e) => e.could_extract_minus_sign() && bases.contains(b),
        _ => false,
    })
}

fn base_of(factor: &Expr) -> Expr {
    match factor {
        Expr::Pow(b, _) => (**b).clone(),
        other => other.clone(),
    }
}

/// Coefficients of an expression viewed as a sum of powers of `kernel`:
/// `x*y^2 + 3*y - 1` gives `{0: -1, 1: 3, 2: x}` for the kernel `y`. `None`
/// when some term contains `kernel` other than as a plain power.
pub fn power_coefficients(expr: &Expr, kernel: &Expr) -> Option<BTreeMap<Rational, Expr>> {
    let mut groups: BTreeMap<Rational, Vec<Expr>> = BTreeMap::new();
    for term in expand(expr).terms() {
        if term.is_zero() {
            continue;
        }
        let mut exponent = Rational::from_integer(0.into());
        let mut rest = Vec::new();
        for factor in term.factors() {
            if factor == *kernel {
                exponent += Rational::from_integer(1.into());
                continue;
            }
            match &factor {
                Expr::Pow(b, e) if **b == *kernel => match e.as_constant() {
                    Some(k) => exponent += k.clone(),
                    None => return None,
                },
                other if other.has(kernel) => return None,
                other => rest.push(other.clone()),
            }
        }
        groups.entry(exponent).or_default().push(mul_all(rest));
    }
    let mut out = BTreeMap::new();
    for (k, terms) in groups {
        let coeff = add_all(terms);
        if !coeff.is_zero() {
            out.insert(k, coeff);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculus::differentiate;
    use crate::expr::{int, sym};
    use crate::parser::parse_expr;

    fn f() -> Expr {
        Expr::apply("f", vec![sym("x")])
    }

    #[test]
    fn collects_coefficient_of_derivative() {
        let df = differentiate(&f(), "x");
        let a = Wild::new("a", &[df.clone()]);
        let b = Wild::new("b", &[df.clone()]);
        let pattern = mul_all(vec![a.expr(), df.clone()]) + b.expr();
        let expr = parse_expr("x*f'(x) + 2*f'(x) - f(x) + x").expect("parse");
        let record = match_pattern(&expr, &pattern, &[a, b]).expect("match");
        assert_eq!(record.get("a"), Some(&(sym("x") + int(2))));
        assert_eq!(record.get("b"), Some(&(sym("x") - f())));
    }

    #[test]
    fn exclusion_rejects_candidates() {
        let a = Wild::new("a", &[f()]);
        let pattern = mul_all(vec![a.expr(), sym("x")]);
        let expr = mul_all(vec![f(), sym("x")]);
        assert!(match_pattern(&expr, &pattern, &[a]).is_none());
    }

    #[test]
    fn power_wildcard_binds_one_for_plain_base() {
        let n = Wild::new("n", &[f()]);
        let c = Wild::new("c", &[f()]);
        let pattern = mul_all(vec![c.expr(), pow(f(), n.expr())]);
        let record = match_pattern(&mul_all(vec![int(3), f()]), &pattern, &[n, c]).expect("match");
        assert_eq!(record.get("n"), Some(&int(1)));
        assert_eq!(record.get("c"), Some(&int(3)));
    }

    #[test]
    fn power_coefficients_groups_by_exponent() {
        let y = sym("y");
        let expr = parse_expr("x*y^2 + 3*y - 1 + y/x").expect("parse");
        let coeffs = power_coefficients(&expr, &y).expect("polynomial in y");
        assert_eq!(coeffs.len(), 3);
        assert_eq!(coeffs[&Rational::from_integer(2.into())], sym("x"));
    }
}
