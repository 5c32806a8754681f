//! Univariate polynomials over exact rationals or symbolic coefficients,
//! with rational root isolation and closed-form roots up to degree two.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::expr::{Expr, Rational};
use crate::simplify::expand;
use crate::simplify::rules::{add_all, mul_all, neg as neg_expr, pow};
use num_bigint::BigInt;
use num_integer::{Integer, Roots};
use num_traits::{One, Signed, ToPrimitive, Zero};

pub trait CoeffOps: Clone {
    fn zero() -> Self;
    fn one() -> Self;
    fn is_zero(&self) -> bool;
    fn is_one(&self) -> bool;
    fn add(&self, other: &Self) -> Self;
    fn sub(&self, other: &Self) -> Self;
    fn mul(&self, other: &Self) -> Self;
    fn neg(&self) -> Self;
}

impl CoeffOps for Rational {
    fn zero() -> Self {
        Zero::zero()
    }

    fn one() -> Self {
        One::one()
    }

    fn is_zero(&self) -> bool {
        Zero::is_zero(self)
    }

    fn is_one(&self) -> bool {
        One::is_one(self)
    }

    fn add(&self, other: &Self) -> Self {
        self.clone() + other.clone()
    }

    fn sub(&self, other: &Self) -> Self {
        self.clone() - other.clone()
    }

    fn mul(&self, other: &Self) -> Self {
        self.clone() * other.clone()
    }

    fn neg(&self) -> Self {
        -self.clone()
    }
}

impl CoeffOps for Expr {
    fn zero() -> Self {
        Expr::Constant(Zero::zero())
    }

    fn one() -> Self {
        Expr::Constant(One::one())
    }

    fn is_zero(&self) -> bool {
        self.is_zero()
    }

    fn is_one(&self) -> bool {
        self.is_one()
    }

    fn add(&self, other: &Self) -> Self {
        expand(&add_all(vec![self.clone(), other.clone()]))
    }

    fn sub(&self, other: &Self) -> Self {
        expand(&add_all(vec![self.clone(), neg_expr(other.clone())]))
    }

    fn mul(&self, other: &Self) -> Self {
        expand(&mul_all(vec![self.clone(), other.clone()]))
    }

    fn neg(&self) -> Self {
        neg_expr(self.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Polynomial<C> {
    pub(crate) coeffs: BTreeMap<usize, C>,
}

pub type Poly = Polynomial<Rational>;

impl<C: CoeffOps> Polynomial<C> {
    pub fn zero() -> Self {
        Polynomial {
            coeffs: BTreeMap::new(),
        }
    }

    pub fn one() -> Self {
        let mut coeffs = BTreeMap::new();
        coeffs.insert(0, C::one());
        Polynomial { coeffs }
    }

    pub fn from_constant(c: C) -> Self {
        if c.is_zero() {
            return Polynomial::zero();
        }
        let mut coeffs = BTreeMap::new();
        coeffs.insert(0, c);
        Polynomial { coeffs }
    }

    pub fn degree(&self) -> Option<usize> {
        self.coeffs.keys().rev().next().cloned()
    }

    pub fn leading_coeff(&self) -> C {
        self.degree()
            .and_then(|d| self.coeffs.get(&d).cloned())
            .unwrap_or_else(C::zero)
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.coeffs.len() == 1 && self.coeffs.get(&0).map(|c| c.is_one()).unwrap_or(false)
    }

    pub fn coeff(&self, power: usize) -> C {
        self.coeffs
            .get(&power)
            .cloned()
            .unwrap_or_else(C::zero)
    }

    pub fn coeff_entries(&self) -> impl Iterator<Item = (usize, C)> + '_ {
        self.coeffs.iter().map(|(e, c)| (*e, c.clone()))
    }

    pub fn pow(&self, exp: usize) -> Self {
        if exp == 0 {
            return Polynomial::one();
        }
        let mut result = Polynomial::one();
        let mut base = self.clone();
        let mut n = exp;
        while n > 0 {
            if n % 2 == 1 {
                result = result * base.clone();
            }
            base = base.clone() * base;
            n /= 2;
        }
        result
    }

    pub fn scale(&self, k: &C) -> Self {
        if k.is_zero() {
            return Polynomial::zero();
        }
        let mut coeffs = BTreeMap::new();
        for (exp, coeff) in &self.coeffs {
            let scaled = coeff.mul(k);
            if !scaled.is_zero() {
                coeffs.insert(*exp, scaled);
            }
        }
        Polynomial { coeffs }
    }

    pub fn add(&self, other: &Self) -> Self {
        self.clone() + other.clone()
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.clone() - other.clone()
    }

    pub fn mul(&self, other: &Self) -> Self {
        self.clone() * other.clone()
    }
}

impl<C: CoeffOps> std::ops::Add for Polynomial<C> {
    type Output = Polynomial<C>;
    fn add(self, rhs: Polynomial<C>) -> Polynomial<C> {
        let mut coeffs = self.coeffs;
        for (exp, coeff) in rhs.coeffs {
            match coeffs.entry(exp) {
                Entry::Vacant(entry) => {
                    if !coeff.is_zero() {
                        entry.insert(coeff);
                    }
                }
                Entry::Occupied(mut entry) => {
                    let updated = entry.get().add(&coeff);
                    if updated.is_zero() {
                        entry.remove();
                    } else {
                        *entry.get_mut() = updated;
                    }
                }
            }
        }
        Polynomial { coeffs }
    }
}

impl<C: CoeffOps> std::ops::Add<&Polynomial<C>> for Polynomial<C> {
    type Output = Polynomial<C>;
    fn add(self, rhs: &Polynomial<C>) -> Polynomial<C> {
        self + rhs.clone()
    }
}

impl<C: CoeffOps> std::ops::Sub for Polynomial<C> {
    type Output = Polynomial<C>;
    fn sub(self, rhs: Polynomial<C>) -> Polynomial<C> {
        let mut coeffs = self.coeffs;
        for (exp, coeff) in rhs.coeffs {
            match coeffs.entry(exp) {
                Entry::Vacant(entry) => {
                    if !coeff.is_zero() {
                        entry.insert(coeff.neg());
                    }
                }
                Entry::Occupied(mut entry) => {
                    let updated = entry.get().sub(&coeff);
                    if updated.is_zero() {
                        entry.remove();
                    } else {
                        *entry.get_mut() = updated;
                    }
                }
            }
        }
        Polynomial { coeffs }
    }
}

impl<C: CoeffOps> std::ops::Sub<&Polynomial<C>> for Polynomial<C> {
    type Output = Polynomial<C>;
    fn sub(self, rhs: &Polynomial<C>) -> Polynomial<C> {
        self - rhs.clone()
    }
}

impl<C: CoeffOps> std::ops::Mul for Polynomial<C> {
    type Output = Polynomial<C>;
    fn mul(self, rhs: Polynomial<C>) -> Polynomial<C> {
        let rhs_coeffs = rhs.coeffs;
        let mut coeffs = BTreeMap::new();
        for (exp_a, coeff_a) in self.coeffs {
            for (exp_b, coeff_b) in rhs_coeffs.iter() {
                let exp = exp_a + exp_b;
                let product = coeff_a.mul(coeff_b);
                if product.is_zero() {
                    continue;
                }
                match coeffs.entry(exp) {
                    Entry::Vacant(entry) => {
                        entry.insert(product);
                    }
                    Entry::Occupied(mut entry) => {
                        let updated = entry.get().add(&product);
                        if updated.is_zero() {
                            entry.remove();
                        } else {
                            *entry.get_mut() = updated;
                        }
                    }
                }
            }
        }
        Polynomial { coeffs }
    }
}

impl<C: CoeffOps> std::ops::Mul<&Polynomial<C>> for Polynomial<C> {
    type Output = Polynomial<C>;
    fn mul(self, rhs: &Polynomial<C>) -> Polynomial<C> {
        self * rhs.clone()
    }
}

impl<C: CoeffOps> std::ops::Neg for Polynomial<C> {
    type Output = Polynomial<C>;
    fn neg(self) -> Polynomial<C> {
        let mut coeffs = BTreeMap::new();
        for (exp, coeff) in self.coeffs {
            let negated = coeff.neg();
            if !negated.is_zero() {
                coeffs.insert(exp, negated);
            }
        }
        Polynomial { coeffs }
    }
}

impl<C: CoeffOps> Polynomial<C> {
    pub fn monomial(coeff: C, power: usize) -> Self {
        let mut coeffs = BTreeMap::new();
        if !coeff.is_zero() {
            coeffs.insert(power, coeff);
        }
        Polynomial { coeffs }
    }
}

/// A root of a polynomial, `re + i*im`, counted with multiplicity.
/// Complex conjugate pairs are stored once with `im > 0`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Root {
    pub re: Expr,
    pub im: Expr,
    pub multiplicity: usize,
}

impl Root {
    fn real(re: Expr, multiplicity: usize) -> Self {
        Root {
            re,
            im: Expr::integer(0),
            multiplicity,
        }
    }

    pub fn is_real(&self) -> bool {
        self.im.is_zero()
    }
}

/// Rational root search gives up on coefficients with more divisors than this.
const DIVISOR_SEARCH_LIMIT: u64 = 1_000_000;

impl Polynomial<Rational> {
    /// Polynomial in the generator `gen` with rational coefficients.
    pub fn from_expr(expr: &Expr, gen: &Expr) -> Option<Self> {
        if expr == gen {
            return Some(Polynomial::monomial(<Rational as One>::one(), 1));
        }
        match expr {
            Expr::Constant(c) => Some(Polynomial::from_constant(c.clone())),
            Expr::Add(terms) => terms
                .iter()
                .try_fold(Polynomial::zero(), |acc, t| Some(acc + Self::from_expr(t, gen)?)),
            Expr::Mul(factors) => factors
                .iter()
                .try_fold(Polynomial::one(), |acc, f| Some(acc * Self::from_expr(f, gen)?)),
            Expr::Pow(base, exp) => {
                let power = exp.as_integer()?.to_usize()?;
                Some(Self::from_expr(base, gen)?.pow(power))
            }
            _ => None,
        }
    }

    pub fn derivative(&self) -> Self {
        let mut coeffs = BTreeMap::new();
        for (exp, coeff) in &self.coeffs {
            if *exp == 0 {
                continue;
            }
            let factor = Rational::from_integer(BigInt::from(*exp));
            coeffs.insert(exp - 1, coeff.clone() * factor);
        }
        Polynomial { coeffs }
    }

    pub fn monic(&self) -> Self {
        let lc = self.leading_coeff();
        if Zero::is_zero(&lc) {
            return self.clone();
        }
        self.scale(&(<Rational as One>::one() / lc))
    }

    pub fn evaluate(&self, x: &Rational) -> Rational {
        let mut acc: Rational = Zero::zero();
        for (exp, coeff) in &self.coeffs {
            acc += coeff.clone() * pow_rational(x, *exp);
        }
        acc
    }

    pub fn div_rem(&self, divisor: &Self) -> (Self, Self) {
        if divisor.is_zero() {
            return (Polynomial::zero(), self.clone());
        }
        let mut remainder = self.clone();
        let mut quotient = Polynomial::zero();
        let divisor_degree = match divisor.degree() {
            Some(deg) => deg,
            None => return (Polynomial::zero(), remainder),
        };
        let divisor_lc = divisor.leading_coeff();

        while let Some(r_deg) = remainder.degree() {
            if r_deg < divisor_degree {
                break;
            }
            let power = r_deg - divisor_degree;
            let coeff = remainder.leading_coeff() / divisor_lc.clone();
            let term_poly = Polynomial::monomial(coeff, power);
            quotient = quotient + term_poly.clone();
            remainder = remainder - &(term_poly * divisor.clone());
        }

        (quotient, remainder)
    }

    pub fn div_exact(&self, divisor: &Self) -> Option<Self> {
        let (q, r) = self.div_rem(divisor);
        if r.is_zero() {
            Some(q)
        } else {
            None
        }
    }

    pub fn to_expr(&self, gen: &Expr) -> Expr {
        add_all(
            self.coeffs
                .iter()
                .map(|(exp, coeff)| {
                    mul_all(vec![
                        Expr::Constant(coeff.clone()),
                        pow(gen.clone(), Expr::integer(*exp as i64)),
                    ])
                })
                .collect(),
        )
    }

    pub fn content_and_primitive_part(&self) -> (Rational, Self) {
        if self.is_zero() {
            return (Zero::zero(), Polynomial::zero());
        }
        let mut lcm = BigInt::one();
        for coeff in self.coeffs.values() {
            lcm = lcm.lcm(coeff.denom());
        }

        let mut gcd_num = BigInt::zero();
        let mut scaled_nums = BTreeMap::new();
        for (exp, coeff) in &self.coeffs {
            let scaled = coeff * Rational::from_integer(lcm.clone());
            let num = scaled.numer().clone();
            gcd_num = gcd_num.gcd(&num);
            scaled_nums.insert(*exp, num);
        }

        let mut coeffs = BTreeMap::new();
        for (exp, num) in scaled_nums {
            let reduced = num / gcd_num.clone();
            if !reduced.is_zero() {
                coeffs.insert(exp, Rational::from_integer(reduced));
            }
        }

        let mut primitive = Polynomial { coeffs };
        let mut content = Rational::new(gcd_num, lcm);
        if primitive.leading_coeff().is_negative() {
            primitive = -primitive;
            content = -content;
        }
        (content, primitive)
    }

    pub fn gcd(a: &Poly, b: &Poly) -> Poly {
        let mut r0 = a.clone();
        let mut r1 = b.clone();
        while !r1.is_zero() {
            let (_, r) = r0.div_rem(&r1);
            r0 = r1;
            r1 = r;
        }
        r0.monic()
    }

    pub fn square_free_decomposition(&self) -> Vec<(Poly, usize)> {
        if self.is_zero() || self.degree().unwrap_or(0) == 0 {
            return Vec::new();
        }

        let mut result = Vec::new();
        let mut i = 1;
        let mut g = Poly::gcd(self, &self.derivative());
        let mut y = self.div_exact(&g).unwrap_or_else(Poly::zero);

        while !y.is_one() && !y.is_zero() {
            let z = Poly::gcd(&y, &g);
            let factor = y.div_exact(&z).unwrap_or_else(Poly::zero);
            if factor.degree().unwrap_or(0) > 0 {
                result.push((factor, i));
            }
            y = z.clone();
            g = g.div_exact(&z).unwrap_or_else(Poly::zero);
            i += 1;
        }

        result
    }

    /// Rational roots with multiplicity, by the rational root theorem.
    pub fn rational_roots(&self) -> Vec<(Rational, usize)> {
        let mut roots = Vec::new();
        if self.degree().unwrap_or(0) == 0 {
            return roots;
        }
        let mut rest = self.clone();
        let low = rest.coeffs.keys().next().copied().unwrap_or(0);
        if low > 0 {
            roots.push((<Rational as Zero>::zero(), low));
            rest = rest.div_exact(&Polynomial::monomial(<Rational as One>::one(), low)).unwrap_or(rest);
        }
        let (_, primitive) = rest.content_and_primitive_part();
        let a0 = primitive.coeff(0).to_integer();
        let an = primitive.leading_coeff().to_integer();
        let (Some(ps), Some(qs)) = (divisors(&a0), divisors(&an)) else {
            return roots;
        };
        let mut candidates: Vec<Rational> = Vec::new();
        for p in &ps {
            for q in &qs {
                let r = Rational::new(p.clone(), q.clone());
                for c in [r.clone(), -r] {
                    if !candidates.contains(&c) {
                        candidates.push(c);
                    }
                }
            }
        }
        candidates.sort();
        for c in candidates {
            let linear = Polynomial::from_constant(-c.clone()) + Polynomial::monomial(<Rational as One>::one(), 1);
            let mut multiplicity = 0;
            while let Some(q) = rest.div_exact(&linear) {
                if rest.degree().unwrap_or(0) == 0 {
                    break;
                }
                rest = q;
                multiplicity += 1;
            }
            if multiplicity > 0 {
                roots.push((c, multiplicity));
            }
        }
        roots
    }

    /// All roots with multiplicity, or `None` when some factor has no closed form here.
    pub fn roots(&self) -> Option<Vec<Root>> {
        let mut out = Vec::new();
        for (factor, mult) in self.square_free_decomposition() {
            let mut rest = factor.clone();
            for (r, m) in factor.rational_roots() {
                out.push(Root::real(Expr::Constant(r.clone()), m * mult));
                let linear = Polynomial::from_constant(-r) + Polynomial::monomial(<Rational as One>::one(), 1);
                for _ in 0..m {
                    rest = rest.div_exact(&linear)?;
                }
            }
            match rest.degree().unwrap_or(0) {
                0 => {}
                2 => out.extend(quadratic_roots(&rest, mult)),
                4 if Zero::is_zero(&rest.coeff(1)) && Zero::is_zero(&rest.coeff(3)) => {
                    out.extend(biquadratic_roots(&rest, mult)?)
                }
                _ => return None,
            }
        }
        Some(out)
    }
}

fn pow_rational(x: &Rational, exp: usize) -> Rational {
    let mut acc = <Rational as One>::one();
    for _ in 0..exp {
        acc *= x.clone();
    }
    acc
}

fn divisors(n: &BigInt) -> Option<Vec<BigInt>> {
    let n = n.abs();
    if n.is_zero() {
        return None;
    }
    let bound = n.sqrt();
    if bound > BigInt::from(DIVISOR_SEARCH_LIMIT) {
        return None;
    }
    let mut small = Vec::new();
    let mut large = Vec::new();
    let mut d = BigInt::one();
    while d <= bound {
        if (&n % &d).is_zero() {
            let other = &n / &d;
            if other != d {
                large.push(other);
            }
            small.push(d.clone());
        }
        d += 1;
    }
    large.reverse();
    small.extend(large);
    Some(small)
}

/// Roots of an irreducible quadratic `a x^2 + b x + c`.
fn quadratic_roots(poly: &Poly, multiplicity: usize) -> Vec<Root> {
    let (a, b, c) = (poly.coeff(2), poly.coeff(1), poly.coeff(0));
    let disc = b.clone() * b.clone() - Rational::from_integer(4.into()) * a.clone() * c;
    let two_a = Rational::from_integer(2.into()) * a;
    let center = Expr::Constant(-b / two_a.clone());
    let half_width = mul_all(vec![
        Expr::Constant(two_a.abs().recip()),
        pow(Expr::Constant(disc.abs()), Expr::constant(1, 2)),
    ]);
    if disc.is_negative() {
        vec![Root {
            re: center,
            im: half_width,
            multiplicity,
        }]
    } else {
        vec![
            Root::real(add_all(vec![center.clone(), neg_expr(half_width.clone())]), multiplicity),
            Root::real(add_all(vec![center, half_width]), multiplicity),
        ]
    }
}

/// Roots of `a x^4 + b x^2 + c` through `z = x^2`.
fn biquadratic_roots(poly: &Poly, multiplicity: usize) -> Option<Vec<Root>> {
    let inner = Polynomial::monomial(poly.coeff(4), 2)
        + Polynomial::monomial(poly.coeff(2), 1)
        + Polynomial::from_constant(poly.coeff(0));
    let z_roots = inner.rational_roots();
    let found: usize = z_roots.iter().map(|(_, m)| m).sum();
    if found < 2 {
        return None;
    }
    let mut out = Vec::new();
    for (z, m) in z_roots {
        let r = pow(Expr::Constant(z.abs()), Expr::constant(1, 2));
        if z.is_negative() {
            out.push(Root {
                re: Expr::integer(0),
                im: r,
                multiplicity: m * multiplicity,
            });
        } else if Zero::is_zero(&z) {
            out.push(Root::real(Expr::integer(0), 2 * m * multiplicity));
        } else {
            out.push(Root::real(neg_expr(r.clone()), m * multiplicity));
            out.push(Root::real(r, m * multiplicity));
        }
    }
    Some(out)
}

impl Polynomial<Expr> {
    /// Polynomial in `gen` whose coefficients may be arbitrary expressions free of `gen`.
    pub fn from_expr(expr: &Expr, gen: &Expr) -> Option<Self> {
        if expr == gen {
            return Some(Polynomial::monomial(Expr::integer(1), 1));
        }
        if !expr.has(gen) {
            return Some(Polynomial::from_constant(expr.clone()));
        }
        match expr {
            Expr::Add(terms) => terms
                .iter()
                .try_fold(Polynomial::zero(), |acc, t| Some(acc + Self::from_expr(t, gen)?)),
            Expr::Mul(factors) => factors
                .iter()
                .try_fold(Polynomial::one(), |acc, f| Some(acc * Self::from_expr(f, gen)?)),
            Expr::Pow(base, exp) => {
                let power = exp.as_integer()?.to_usize()?;
                Some(Self::from_expr(base, gen)?.pow(power))
            }
            _ => None,
        }
    }

    pub fn to_expr(&self, gen: &Expr) -> Expr {
        add_all(
            self.coeffs
                .iter()
                .map(|(exp, coeff)| mul_all(vec![coeff.clone(), pow(gen.clone(), Expr::integer(*exp as i64))]))
                .collect(),
        )
    }

    /// Rational-coefficient view when every coefficient is a number.
    pub fn to_rational(&self) -> Option<Poly> {
        let mut coeffs = BTreeMap::new();
        for (exp, coeff) in &self.coeffs {
            coeffs.insert(*exp, coeff.as_constant()?.clone());
        }
        Some(Polynomial { coeffs })
    }

    /// Roots with multiplicity: numeric polynomials go through [`Poly::roots`],
    /// symbolic ones are handled up to degree two.
    pub fn roots(&self) -> Option<Vec<Root>> {
        if let Some(rational) = self.to_rational() {
            return rational.roots();
        }
        match self.degree()? {
            1 => Some(vec![Root::real(
                expand(&mul_all(vec![
                    neg_expr(self.coeff(0)),
                    pow(self.coeff(1), Expr::integer(-1)),
                ])),
                1,
            )]),
            2 => {
                let (a, b, c) = (self.coeff(2), self.coeff(1), self.coeff(0));
                let disc = expand(&add_all(vec![
                    pow(b.clone(), Expr::integer(2)),
                    mul_all(vec![Expr::integer(-4), a.clone(), c]),
                ]));
                let inv_two_a = pow(mul_all(vec![Expr::integer(2), a]), Expr::integer(-1));
                if disc.is_zero() {
                    return Some(vec![Root::real(
                        mul_all(vec![neg_expr(b), inv_two_a]),
                        2,
                    )]);
                }
                let sq = pow(disc, Expr::constant(1, 2));
                Some(vec![
                    Root::real(
                        expand(&mul_all(vec![add_all(vec![neg_expr(b.clone()), neg_expr(sq.clone())]), inv_two_a.clone()])),
                        1,
                    ),
                    Root::real(
                        expand(&mul_all(vec![add_all(vec![neg_expr(b), sq]), inv_two_a])),
                        1,
                    ),
                ])
            }
            _ => None,
        }
    }
}
