//! Classification of an equation against the hint catalogue.

use std::collections::BTreeMap;

use log::{debug, trace};

use crate::calculus::{differentiate, try_integrate};
use crate::expr::{Expr, Func, Rational};
use crate::ode::dispatch::SolveContext;
use crate::ode::hints::{Hint, ALL_HINTS};
use crate::ode::matcher::{power_coefficients, MatchRecord};
use crate::ode::normalize::{dummy, dummy_name, Ode};
use crate::ode::solvers::algebraic::algebraic_roots;
use crate::ode::solvers::euler;
use crate::ode::solvers::first_order::REDUCED_VARIABLE;
use crate::ode::solvers::linear_constant::trial_families;
use crate::ode::solvers::series::is_singular;
use crate::ode::solvers::{first_order_form, quotient, separate_variables, slope, y, y_name};
use crate::simplify::rules::{add_all, func, mul_all, neg, pow};
use crate::simplify::{cancel, expand, fraction, is_free_of, is_identically_zero, substitute_symbol};

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub order: usize,
    /// Matching hints in catalogue order.
    pub hints: Vec<Hint>,
    pub records: BTreeMap<Hint, MatchRecord>,
}

impl Classification {
    /// The first matching hint.
    pub fn default_hint(&self) -> Option<Hint> {
        self.hints.first().copied()
    }

    pub fn contains(&self, hint: Hint) -> bool {
        self.records.contains_key(&hint)
    }

    pub fn match_record(&self, hint: Hint) -> Option<&MatchRecord> {
        self.records.get(&hint)
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }
}

/// Every hint that applies to `ode`, with the bindings its routine needs.
/// `_Integral` variants are listed whenever their base hint matched.
pub fn classify_ode(ode: &Ode, context: &SolveContext) -> Classification {
    let mut records: BTreeMap<Hint, MatchRecord> = BTreeMap::new();

    if algebraic_roots(ode).is_some() {
        records.insert(Hint::NthAlgebraic, MatchRecord::new());
    }
    if let Some((p, q)) = first_order_form(ode) {
        classify_first_order(ode, &p, &q, context, &mut records);
    }
    if ode.order == 2 {
        if let Some(record) = liouville(ode) {
            records.insert(Hint::Liouville, record);
        }
    }
    if let Some((coefficients, forcing)) = linear_parts(ode) {
        constant_coefficients(ode, &coefficients, &forcing, &mut records);
        euler_equation(ode, &coefficients, &forcing, &mut records);
        if ode.order == 2 && is_identically_zero(&forcing) {
            second_order_series(ode, &coefficients, context, &mut records);
        }
    }
    if let Some(record) = reducible(ode) {
        records.insert(Hint::NthOrderReducible, record);
    }

    let integral: Vec<(Hint, MatchRecord)> = records
        .iter()
        .filter_map(|(hint, record)| hint.integral_variant().map(|h| (h, record.clone())))
        .collect();
    records.extend(integral);

    let hints: Vec<Hint> = ALL_HINTS.iter().copied().filter(|h| records.contains_key(h)).collect();
    debug!(
        "{ode}: order {}, hints [{}]",
        ode.order,
        hints.iter().map(|h| h.name()).collect::<Vec<_>>().join(", ")
    );
    Classification {
        order: ode.order,
        hints,
        records,
    }
}

/// `P + Q*y' = 0` with slope `h = -P/Q`.
fn classify_first_order(
    ode: &Ode,
    p: &Expr,
    q: &Expr,
    context: &SolveContext,
    records: &mut BTreeMap<Hint, MatchRecord>,
) {
    let x = ode.var.as_str();
    let y_var = y_name();
    let h = slope(p, q);
    trace!("first order slope {h}");

    if let Some((x_part, y_part)) = separate_variables(&h, x, &y_var) {
        records.insert(Hint::Separable, MatchRecord::new().with("X", x_part).with("Y", y_part));
    }
    if let Some((mp, mq)) = exact_form(p, q, x, &y_var) {
        records.insert(Hint::FirstExact, MatchRecord::new().with("P", mp).with("Q", mq));
    }
    if let Some(record) = linear(&h, &y_var) {
        records.insert(Hint::FirstLinear, record);
    }
    if let Some(record) = bernoulli(&h) {
        records.insert(Hint::Bernoulli, record);
    }
    if let Some(record) = riccati_special(&h, x) {
        records.insert(Hint::RiccatiSpecialMinus2, record);
    }
    homogeneous(p, q, x, &y_var, records);
    if let Some(record) = almost_linear(p, q, x, &y_var) {
        records.insert(Hint::AlmostLinear, record);
    }
    if let Some(record) = linear_coefficients(&h, x, &y_var) {
        records.insert(Hint::LinearCoefficients, record);
    }
    if let Some(record) = separable_reduced(&h, x, &y_var) {
        records.insert(Hint::SeparableReduced, record);
    }
    let at_point = |e: &Expr| substitute_symbol(e, x, &context.x0);
    if !is_singular(&at_point(&h)) && !is_singular(&at_point(&differentiate(&h, &y_var))) {
        records.insert(Hint::FirstPowerSeries, MatchRecord::new().with("h", h.clone()));
    }
    records.insert(Hint::LieGroup, MatchRecord::new());
}

/// `(μ*P, μ*Q)` exact for an integrating factor depending on `x` or `y`
/// alone, `μ = 1` when already exact.
fn exact_form(p: &Expr, q: &Expr, x: &str, y: &str) -> Option<(Expr, Expr)> {
    let gap = differentiate(p, y) - differentiate(q, x);
    if is_identically_zero(&gap) {
        return Some((p.clone(), q.clone()));
    }
    let by_x = quotient(gap.clone(), q.clone());
    let mut factor = None;
    if is_free_of(&by_x, y) {
        factor = try_integrate(&by_x, x).map(|e| func(Func::Exp, e));
    }
    if factor.is_none() && !p.is_zero() {
        let by_y = quotient(neg(gap), p.clone());
        if is_free_of(&by_y, x) {
            factor = try_integrate(&by_y, y).map(|e| func(Func::Exp, e));
        }
    }
    let factor = factor?;
    trace!("integrating factor {factor}");
    Some((
        cancel(&mul_all(vec![factor.clone(), p.clone()])),
        cancel(&mul_all(vec![factor, q.clone()])),
    ))
}

/// `y' = -a(x)*y + b(x)`.
fn linear(h: &Expr, y: &str) -> Option<MatchRecord> {
    let hy = cancel(&differentiate(h, y));
    if !is_free_of(&hy, y) {
        return None;
    }
    let b = cancel(&substitute_symbol(h, y, &Expr::integer(0)));
    if !is_free_of(&b, y) {
        return None;
    }
    Some(MatchRecord::new().with("a", neg(hy)).with("b", b))
}

fn integer_key(k: i64) -> Rational {
    Rational::from_integer(k.into())
}

/// `y' = -P(x)*y + Q(x)*y^n` with `n` other than 0 and 1.
fn bernoulli(h: &Expr) -> Option<MatchRecord> {
    let coefficients = power_coefficients(h, &y())?;
    let one = integer_key(1);
    if coefficients.contains_key(&integer_key(0)) {
        return None;
    }
    let others: Vec<&Rational> = coefficients.keys().filter(|k| **k != one).collect();
    let [n] = others.as_slice() else {
        return None;
    };
    let p = coefficients.get(&one).map(|c| neg(c.clone())).unwrap_or_else(|| Expr::integer(0));
    let q = coefficients.get(*n)?.clone();
    Some(
        MatchRecord::new()
            .with("P", cancel(&p))
            .with("Q", cancel(&q))
            .with("n", Expr::rational((*n).clone())),
    )
}

/// `y' = B*y^2 + C*y/x + D/x^2` with constant `B, C, D`, stored in the
/// `a*y' = -b*y^2 - c*y/x - d/x^2` convention.
fn riccati_special(h: &Expr, x: &str) -> Option<MatchRecord> {
    let coefficients = power_coefficients(h, &y())?;
    if coefficients
        .keys()
        .any(|k| !k.is_integer() || *k < integer_key(0) || *k > integer_key(2))
    {
        return None;
    }
    let get = |k: i64| coefficients.get(&integer_key(k)).cloned().unwrap_or_else(|| Expr::integer(0));
    let xs = Expr::symbol(x);
    let big_b = cancel(&get(2));
    let big_c = cancel(&mul_all(vec![get(1), xs.clone()]));
    let big_d = cancel(&mul_all(vec![get(0), pow(xs, Expr::integer(2))]));
    if big_b.is_zero() || (big_c.is_zero() && big_d.is_zero()) {
        return None;
    }
    if ![&big_b, &big_c, &big_d].iter().all(|e| is_free_of(e, x)) {
        return None;
    }
    Some(
        MatchRecord::new()
            .with("a", Expr::integer(1))
            .with("b", neg(big_b))
            .with("c", neg(big_c))
            .with("d", neg(big_d)),
    )
}

/// Degree `k` with `x*e_x + y*e_y = k*e`, when constant. `None` for zero
/// and for expressions that are not homogeneous.
pub fn homogeneous_order(expr: &Expr, x: &str, y: &str) -> Option<Rational> {
    if is_identically_zero(expr) {
        return None;
    }
    let euler = add_all(vec![
        mul_all(vec![Expr::symbol(x), differentiate(expr, x)]),
        mul_all(vec![Expr::symbol(y), differentiate(expr, y)]),
    ]);
    quotient(euler, expr.clone()).as_constant().cloned()
}

/// Both substitutions need `P` and `Q` homogeneous of the same degree and
/// a nonvanishing denominator after substituting.
fn homogeneous(p: &Expr, q: &Expr, x: &str, y: &str, records: &mut BTreeMap<Hint, MatchRecord>) {
    let (Some(m), Some(n)) = (homogeneous_order(p, x, y), homogeneous_order(q, x, y)) else {
        return;
    };
    if m != n {
        return;
    }
    let v = Expr::symbol(REDUCED_VARIABLE);
    let at = |e: &Expr, xv: &Expr, yv: &Expr| substitute_symbol(&substitute_symbol(e, x, xv), y, yv);
    let one = Expr::integer(1);
    // y = u*x: P(1,u) + u*Q(1,u); x = u*y: u*P(u,1) + Q(u,1).
    let dep = add_all(vec![at(p, &one, &v), mul_all(vec![v.clone(), at(q, &one, &v)])]);
    let indep = add_all(vec![mul_all(vec![v.clone(), at(p, &v, &one)]), at(q, &v, &one)]);
    let record = MatchRecord::new().with("P", p.clone()).with("Q", q.clone());
    let dep_ok = !is_identically_zero(&dep);
    let indep_ok = !is_identically_zero(&indep);
    if dep_ok && indep_ok {
        records.insert(Hint::FirstHomogeneousCoeffBest, record.clone());
    }
    if indep_ok {
        records.insert(Hint::FirstHomogeneousCoeffSubsIndepDivDep, record.clone());
    }
    if dep_ok {
        records.insert(Hint::FirstHomogeneousCoeffSubsDepDivIndep, record);
    }
}

/// `a(x)*g'(y)*y' + b(x)*g(y) + c(x) = 0`.
fn almost_linear(p: &Expr, q: &Expr, x: &str, y: &str) -> Option<MatchRecord> {
    let (a, k) = separate_variables(q, x, y)?;
    if is_free_of(p, y) {
        return None;
    }
    let g = try_integrate(&k, y)?;
    let b = quotient(differentiate(p, y), k);
    if is_identically_zero(&b) || !is_free_of(&b, y) {
        return None;
    }
    let c = cancel(&(p.clone() - mul_all(vec![b.clone(), g.clone()])));
    if !is_free_of(&c, y) {
        return None;
    }
    Some(MatchRecord::new().with("a", a).with("b", b).with("c", c).with("g", g))
}

/// `a*x + b*y + c` with rational coefficients.
fn affine(expr: &Expr, x: &str, y: &str) -> Option<(Rational, Rational, Rational)> {
    let expr = expand(expr);
    let a = differentiate(&expr, x).as_constant()?.clone();
    let b = differentiate(&expr, y).as_constant()?.clone();
    let zero = Expr::integer(0);
    let c = substitute_symbol(&substitute_symbol(&expr, x, &zero), y, &zero)
        .as_constant()?
        .clone();
    let rebuilt = add_all(vec![
        mul_all(vec![Expr::rational(a.clone()), Expr::symbol(x)]),
        mul_all(vec![Expr::rational(b.clone()), Expr::symbol(y)]),
        Expr::rational(c.clone()),
    ]);
    is_identically_zero(&(expr - rebuilt)).then_some((a, b, c))
}

/// `y' = (a1*x + b1*y + c1)/(a2*x + b2*y + c2)` whose lines meet away from
/// the origin.
fn linear_coefficients(h: &Expr, x: &str, y: &str) -> Option<MatchRecord> {
    let (numer, denom) = fraction(h);
    let (a1, b1, c1) = affine(&numer, x, y)?;
    let (a2, b2, c2) = affine(&denom, x, y)?;
    let det = &a1 * &b2 - &a2 * &b1;
    if det == integer_key(0) {
        return None;
    }
    let x0 = (&b1 * &c2 - &b2 * &c1) / &det;
    let y0 = (&a2 * &c1 - &a1 * &c2) / &det;
    if x0 == integer_key(0) && y0 == integer_key(0) {
        return None;
    }
    Some(
        MatchRecord::new()
            .with("x0", Expr::rational(x0))
            .with("y0", Expr::rational(y0))
            .with("a1", Expr::rational(a1))
            .with("b1", Expr::rational(b1))
            .with("a2", Expr::rational(a2))
            .with("b2", Expr::rational(b2)),
    )
}

/// `y' = (y/x)*H(x^n*y)`. `H` is recorded as a function of `v = x^n*y`.
fn separable_reduced(h: &Expr, x: &str, y: &str) -> Option<MatchRecord> {
    let xs = Expr::symbol(x);
    let big_h = cancel(&mul_all(vec![h.clone(), xs.clone(), pow(Expr::symbol(y), Expr::integer(-1))]));
    let hy = differentiate(&big_h, y);
    if is_identically_zero(&hy) {
        return None;
    }
    let ratio = quotient(
        mul_all(vec![xs.clone(), differentiate(&big_h, x)]),
        mul_all(vec![Expr::symbol(y), hy]),
    );
    let n = ratio.as_constant()?.clone();
    if n == integer_key(0) {
        return None;
    }
    let y_in_v = mul_all(vec![Expr::symbol(REDUCED_VARIABLE), pow(xs, Expr::rational(-n.clone()))]);
    let in_v = cancel(&substitute_symbol(&big_h, y, &y_in_v));
    if !is_free_of(&in_v, x) {
        return None;
    }
    Some(MatchRecord::new().with("power", Expr::rational(n)).with("H", in_v))
}

/// `y'' + G(y)*y'^2 + H(x)*y' = 0`, up to a common factor.
fn liouville(ode: &Ode) -> Option<MatchRecord> {
    let expr = ode.to_symbols(&ode.expr);
    let second = dummy_name(2);
    let lead = cancel(&differentiate(&expr, &second));
    if is_identically_zero(&lead) || lead.has_symbol(&second) {
        return None;
    }
    let rest = substitute_symbol(&expr, &second, &Expr::integer(0));
    let coefficients = power_coefficients(&rest, &dummy(1))?;
    let (one, two) = (integer_key(1), integer_key(2));
    if coefficients.keys().any(|k| *k != one && *k != two) {
        return None;
    }
    let g = quotient(coefficients.get(&two)?.clone(), lead.clone());
    let h = coefficients
        .get(&one)
        .map(|c| quotient(c.clone(), lead.clone()))
        .unwrap_or_else(|| Expr::integer(0));
    if !is_free_of(&g, &ode.var) || !is_free_of(&h, &y_name()) {
        return None;
    }
    Some(MatchRecord::new().with("G", g).with("H", h))
}

/// `Σ c_k*f^(k) = F(x)` when the equation is linear in the unknown and its
/// derivatives.
fn linear_parts(ode: &Ode) -> Option<(Vec<Expr>, Expr)> {
    let expr = ode.to_symbols(&ode.expr);
    let names: Vec<String> = (0..=ode.order).map(dummy_name).collect();
    let mut coefficients = Vec::with_capacity(names.len());
    for name in &names {
        let c = cancel(&differentiate(&expr, name));
        if names.iter().any(|n| c.has_symbol(n)) {
            return None;
        }
        coefficients.push(c);
    }
    let mut rest = expr;
    for name in &names {
        rest = substitute_symbol(&rest, name, &Expr::integer(0));
    }
    Some((coefficients, cancel(&neg(rest))))
}

fn constant_coefficients(
    ode: &Ode,
    coefficients: &[Expr],
    forcing: &Expr,
    records: &mut BTreeMap<Hint, MatchRecord>,
) {
    if !coefficients.iter().all(|c| is_free_of(c, &ode.var)) {
        return;
    }
    let mut record = MatchRecord::new().with("F", forcing.clone());
    for (k, c) in coefficients.iter().enumerate() {
        record.insert(format!("c{k}"), c.clone());
    }
    if is_identically_zero(forcing) {
        records.insert(Hint::NthLinearConstantCoeffHomogeneous, record);
        return;
    }
    if trial_families(forcing, &ode.var).is_some() {
        records.insert(Hint::NthLinearConstantCoeffUndeterminedCoefficients, record.clone());
    }
    records.insert(Hint::NthLinearConstantCoeffVariationOfParameters, record);
}

/// Dividing by `c_n/x^n` must leave `Σ a_k*x^k*f^(k)` with constant `a_k`.
fn euler_equation(ode: &Ode, coefficients: &[Expr], forcing: &Expr, records: &mut BTreeMap<Hint, MatchRecord>) {
    let n = ode.order;
    let lead = &coefficients[n];
    if is_identically_zero(lead) {
        return;
    }
    let mut record = MatchRecord::new();
    for (k, c) in coefficients.iter().enumerate() {
        let scaled = quotient(
            mul_all(vec![c.clone(), pow(ode.x(), Expr::integer((n - k) as i64))]),
            lead.clone(),
        );
        if !is_free_of(&scaled, &ode.var) {
            return;
        }
        record.insert(format!("a{k}"), scaled);
    }
    let forcing = quotient(
        mul_all(vec![forcing.clone(), pow(ode.x(), Expr::integer(n as i64))]),
        lead.clone(),
    );
    if is_identically_zero(&forcing) {
        records.insert(Hint::NthLinearEulerEqHomogeneous, record.with("F", Expr::integer(0)));
        return;
    }
    let in_t = substitute_symbol(&forcing, &ode.var, &func(Func::Exp, Expr::symbol(euler::T)));
    let record = record.with("F", forcing);
    if trial_families(&in_t, euler::T).is_some() {
        records.insert(Hint::NthLinearEulerEqNonhomogeneousUndeterminedCoefficients, record.clone());
    }
    records.insert(Hint::NthLinearEulerEqNonhomogeneousVariationOfParameters, record);
}

/// Homogeneous `a2*y'' + a1*y' + a0*y = 0` at an ordinary or a regular
/// singular point.
fn second_order_series(
    ode: &Ode,
    coefficients: &[Expr],
    context: &SolveContext,
    records: &mut BTreeMap<Hint, MatchRecord>,
) {
    let (a0, a1, a2) = (&coefficients[0], &coefficients[1], &coefficients[2]);
    let p = quotient(a1.clone(), a2.clone());
    let q = quotient(a0.clone(), a2.clone());
    let analytic = |e: &Expr| !is_singular(&substitute_symbol(e, &ode.var, &context.x0));
    if analytic(&p) && analytic(&q) {
        let record = MatchRecord::new()
            .with("a2", a2.clone())
            .with("a1", a1.clone())
            .with("a0", a0.clone());
        records.insert(Hint::SecondPowerSeriesOrdinary, record);
        return;
    }
    let shift = ode.x() - context.x0.clone();
    let shifted_p = cancel(&mul_all(vec![shift.clone(), p.clone()]));
    let shifted_q = cancel(&mul_all(vec![pow(shift, Expr::integer(2)), q.clone()]));
    if analytic(&shifted_p) && analytic(&shifted_q) {
        records.insert(Hint::SecondPowerSeriesRegular, MatchRecord::new().with("P", p).with("Q", q));
    }
}

/// The unknown itself is absent: `g = f^(m)` lowers the order by `m`.
fn reducible(ode: &Ode) -> Option<MatchRecord> {
    let expr = ode.to_symbols(&ode.expr);
    let m = (0..=ode.order).find(|k| expr.has_symbol(&dummy_name(*k)))?;
    if m == 0 || ode.order <= m {
        return None;
    }
    Some(MatchRecord::new().with("m", Expr::integer(m as i64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_equation, parse_expr};

    fn classify(text: &str) -> Classification {
        let eq = parse_equation(text).expect("parse");
        let ode = Ode::new(&eq, &parse_expr("f(x)").expect("parse")).expect("ode");
        classify_ode(&ode, &SolveContext::default())
    }

    #[test]
    fn homogeneous_degree() {
        let e = parse_expr("x^2 + x*y").expect("parse");
        assert_eq!(homogeneous_order(&e, "x", "y"), Some(integer_key(2)));
        let e = parse_expr("x^2 + y").expect("parse");
        assert_eq!(homogeneous_order(&e, "x", "y"), None);
    }

    #[test]
    fn integral_variants_follow_their_base() {
        let c = classify("f'(x) = f(x)");
        assert!(c.contains(Hint::Separable));
        assert!(c.contains(Hint::SeparableIntegral));
        assert!(!c.contains(Hint::RiccatiSpecialMinus2));
    }

    #[test]
    fn linear_coefficients_need_an_offset() {
        let c = classify("f'(x) = (x + f(x) - 3)/(x - f(x) + 1)");
        let record = c.match_record(Hint::LinearCoefficients).expect("matched");
        assert_eq!(record.get("x0"), Some(&Expr::integer(1)));
        assert_eq!(record.get("y0"), Some(&Expr::integer(2)));
        assert!(!classify("f'(x) = (x + f(x))/(x - f(x))").contains(Hint::LinearCoefficients));
    }

    #[test]
    fn reducible_needs_the_unknown_absent() {
        assert!(classify("f''(x) = f'(x)").contains(Hint::NthOrderReducible));
        assert!(!classify("f''(x) = f(x)").contains(Hint::NthOrderReducible));
    }
}
