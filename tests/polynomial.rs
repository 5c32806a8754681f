use num_traits::Zero;
use pretty_assertions::assert_eq;
use rcas_ode::expr::rational;
use rcas_ode::polynomial::{Poly, Polynomial};
use rcas_ode::{parse_expr, Expr, Rational};

fn x() -> Expr {
    Expr::symbol("x")
}

fn poly(input: &str) -> Poly {
    let expr = parse_expr(input).expect("parse polynomial");
    Poly::from_expr(&expr, &x()).expect("build polynomial")
}

#[test]
fn polynomial_division_exact() {
    let (quotient, remainder) = poly("x^3 - 1").div_rem(&poly("x - 1"));
    assert!(remainder.is_zero());
    assert_eq!(quotient, poly("x^2 + x + 1"));
}

#[test]
fn polynomial_division_remainder() {
    let (quotient, remainder) = poly("x^3 + x + 1").div_rem(&poly("x^2 + 1"));
    assert_eq!(quotient, poly("x"));
    assert_eq!(remainder, poly("1"));
    assert!(poly("x^2 + 1").div_exact(&poly("x + 1")).is_none());
}

#[test]
fn polynomial_gcd_ignores_content() {
    assert_eq!(Poly::gcd(&poly("x^2 - 1"), &poly("x^2 - x")), poly("x - 1"));
    assert_eq!(Poly::gcd(&poly("2*x^2 + 2*x"), &poly("4*x")), poly("x"));
}

#[test]
fn polynomial_content_and_primitive_part() {
    let polynomial = poly("2/3*x^2 + 4/3*x + 2/3");
    let (content, primitive) = polynomial.content_and_primitive_part();
    assert_eq!(content, rational(2, 3));
    assert_eq!(primitive, poly("x^2 + 2*x + 1"));
    assert!(Rational::zero() < content);
}

#[test]
fn repeated_rational_roots() {
    // (x - 1)^2 * (x + 2)
    let roots = poly("x^3 - 3*x + 2").rational_roots();
    assert!(roots.contains(&(rational(1, 1), 2)));
    assert!(roots.contains(&(rational(-2, 1), 1)));
}

#[test]
fn complex_roots_are_stored_once() {
    let roots = poly("x^2 + 9").roots().expect("quadratic");
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].re, Expr::integer(0));
    assert_eq!(roots[0].im, Expr::integer(3));
    assert!(!roots[0].is_real());
}

#[test]
fn symbolic_coefficients() {
    let expr = parse_expr("a*x^2 + b*x").expect("parse");
    let p = Polynomial::<Expr>::from_expr(&expr, &x()).expect("polynomial in x");
    assert_eq!(p.degree(), Some(2));
    assert_eq!(p.coeff(1), Expr::symbol("b"));
    assert_eq!(p.coeff(0), Expr::integer(0));
}
