//! Each solving method on an equation it was made for.

use rcas_ode::simplify::equivalent;
use rcas_ode::{
    checkodesol, dsolve, parse_equation, parse_expr, DsolveOptions, Equation, Expr, Hint, Ode,
};

fn f() -> Expr {
    parse_expr("f(x)").expect("parse function")
}

fn ode(text: &str) -> Ode {
    Ode::new(&parse_equation(text).expect("parse equation"), &f()).expect("build ode")
}

fn solve_with(text: &str, hint: Hint) -> Vec<Equation> {
    let _ = env_logger::builder().is_test(true).try_init();
    let equation = parse_equation(text).expect("parse equation");
    let options = DsolveOptions::new().hint(hint);
    dsolve(&equation, &f(), &options)
        .unwrap_or_else(|e| panic!("{hint} on {text}: {e}"))
        .solutions()
}

/// At least one solution is proven to satisfy the equation.
fn assert_checks(text: &str, hint: Hint) -> Vec<Equation> {
    let solutions = solve_with(text, hint);
    let ode = ode(text);
    assert!(
        solutions.iter().any(|s| checkodesol(&ode, s, None).is_satisfied()),
        "{hint}: {solutions:?}"
    );
    solutions
}

#[test]
fn separable() {
    let solutions = assert_checks("f'(x) = x*f(x)", Hint::Separable);
    let expected = parse_expr("C1*exp(x^2/2)").expect("parse");
    assert!(solutions.iter().any(|s| equivalent(&s.rhs, &expected)), "{solutions:?}");
}

#[test]
fn exact() {
    let solutions = assert_checks("2*x*f(x) + (x^2 + 1)*f'(x) = 0", Hint::FirstExact);
    let expected = parse_expr("C1/(x^2 + 1)").expect("parse");
    assert!(solutions.iter().any(|s| equivalent(&s.rhs, &expected)), "{solutions:?}");
}

#[test]
fn exact_through_integrating_factor() {
    assert_checks("f'(x) + f(x) = x", Hint::FirstExact);
}

#[test]
fn linear_with_unevaluated_integrals() {
    let solutions = solve_with("f'(x) + f(x) = exp(x^2)", Hint::FirstLinearIntegral);
    assert!(solutions.iter().all(|s| s.rhs.has_integral() || s.lhs.has_integral()));
}

#[test]
fn bernoulli() {
    assert_checks("f'(x) + f(x) = f(x)^3", Hint::Bernoulli);
}

#[test]
fn riccati_special() {
    assert_checks("f'(x) = -f(x)^2 - 2/x^2", Hint::RiccatiSpecialMinus2);
}

#[test]
fn homogeneous_substitutions() {
    let text = "f'(x) = (x + f(x))/x";
    assert_checks(text, Hint::FirstHomogeneousCoeffSubsDepDivIndep);
    assert_checks(text, Hint::FirstHomogeneousCoeffSubsIndepDivDep);
    assert_checks(text, Hint::FirstHomogeneousCoeffBest);
}

#[test]
fn almost_linear() {
    assert_checks("exp(f(x))*f'(x) + exp(f(x)) = x", Hint::AlmostLinear);
}

#[test]
fn linear_coefficients_leave_a_quadrature() {
    let solutions = solve_with("f'(x) = (x + f(x) - 3)/(x - f(x) + 1)", Hint::LinearCoefficientsIntegral);
    assert_eq!(solutions.len(), 1);
    assert!(solutions[0].lhs.has_integral() || solutions[0].rhs.has_integral());
}

#[test]
fn separable_reduced() {
    assert_checks("f'(x) = f(x)/x + x*f(x)^2", Hint::SeparableReduced);
}

#[test]
fn first_order_power_series() {
    let equation = parse_equation("f'(x) = f(x)").expect("parse");
    let options = DsolveOptions::new().hint(Hint::FirstPowerSeries).series_terms(4);
    let solutions = dsolve(&equation, &f(), &options).expect("dsolve").solutions();
    let rhs = &solutions[0].rhs;
    assert!(rhs.has_order());
    let truncated: Vec<Expr> = rhs.terms().into_iter().filter(|t| !t.has_order()).collect();
    let expected = parse_expr("C1 + C1*x + C1*x^2/2 + C1*x^3/6").expect("parse");
    assert!(equivalent(&Expr::Add(truncated), &expected), "got {rhs}");
}

#[test]
fn second_order_power_series() {
    let equation = parse_equation("f''(x) + f(x) = 0").expect("parse");
    let options = DsolveOptions::new().hint(Hint::SecondPowerSeriesOrdinary).series_terms(4);
    let solution = dsolve(&equation, &f(), &options).expect("dsolve").solutions().remove(0);
    assert!(solution.rhs.has_order());
    assert!(solution.rhs.has_symbol("C1") && solution.rhs.has_symbol("C2"));
}

#[test]
fn frobenius_series() {
    // Bessel-like equation with a regular singular point at zero.
    let equation = parse_equation("x^2*f''(x) + x*f'(x) + (x^2 - 1/4)*f(x) = 0").expect("parse");
    let options = DsolveOptions::new().hint(Hint::SecondPowerSeriesRegular).series_terms(4);
    let solution = dsolve(&equation, &f(), &options).expect("dsolve").solutions().remove(0);
    assert!(solution.rhs.has_order());
    assert!(solution.rhs.has_symbol("C1"));
}

#[test]
fn liouville() {
    assert_checks("f''(x) + f'(x)^2/f(x) + f'(x)/x = 0", Hint::Liouville);
}

#[test]
fn order_reduction() {
    let solutions = assert_checks("f''(x) = f'(x)", Hint::NthOrderReducible);
    let expected = parse_expr("C1 + C2*exp(x)").expect("parse");
    assert!(solutions.iter().any(|s| equivalent(&s.rhs, &expected)), "{solutions:?}");
}

#[test]
fn constant_coefficients() {
    assert_checks("f''(x) - 3*f'(x) + 2*f(x) = 0", Hint::NthLinearConstantCoeffHomogeneous);
    assert_checks("f''(x) - 2*f'(x) + f(x) = 0", Hint::NthLinearConstantCoeffHomogeneous);
    assert_checks("f''(x) - f(x) = x", Hint::NthLinearConstantCoeffUndeterminedCoefficients);
    assert_checks("f''(x) + f(x) = sin(x)", Hint::NthLinearConstantCoeffUndeterminedCoefficients);
    assert_checks("f''(x) - f(x) = exp(x)", Hint::NthLinearConstantCoeffVariationOfParameters);
}

#[test]
fn euler_equations() {
    let homogeneous = "x^2*f''(x) - 2*x*f'(x) + 2*f(x) = 0";
    let solutions = assert_checks(homogeneous, Hint::NthLinearEulerEqHomogeneous);
    let expected = parse_expr("C1*x + C2*x^2").expect("parse");
    let swapped = parse_expr("C2*x + C1*x^2").expect("parse");
    assert!(solutions
        .iter()
        .any(|s| equivalent(&s.rhs, &expected) || equivalent(&s.rhs, &swapped)));

    let forced = "x^2*f''(x) - 2*x*f'(x) + 2*f(x) = x^3";
    assert_checks(forced, Hint::NthLinearEulerEqNonhomogeneousUndeterminedCoefficients);
    assert_checks(forced, Hint::NthLinearEulerEqNonhomogeneousVariationOfParameters);
}

#[test]
fn algebraic() {
    let solutions = assert_checks("f'(x)^2 = 4", Hint::NthAlgebraic);
    assert_eq!(solutions.len(), 2);
}

#[test]
fn lie_group() {
    assert_checks("f'(x) = f(x)^2 + 1", Hint::LieGroup);
}

#[test]
fn short_series_keep_every_constant() {
    let equation = parse_equation("f''(x) + f(x) = 0").expect("parse");
    for terms in [0, 1] {
        let options = DsolveOptions::new().hint(Hint::SecondPowerSeriesOrdinary).series_terms(terms);
        let solution = dsolve(&equation, &f(), &options).expect("dsolve").solutions().remove(0);
        assert!(solution.rhs.has_symbol("C1") && solution.rhs.has_symbol("C2"), "{terms}: {solution}");
    }
    let equation = parse_equation("f'(x) = f(x)").expect("parse");
    let options = DsolveOptions::new().hint(Hint::FirstPowerSeries).series_terms(0);
    let solution = dsolve(&equation, &f(), &options).expect("dsolve").solutions().remove(0);
    assert!(solution.rhs.has_symbol("C1"), "{solution}");
}

#[test]
fn exact_solution_absorbs_the_root() {
    let solutions = assert_checks("2*x*f(x)^2 + 2*x^2*f(x)*f'(x) = 0", Hint::FirstExact);
    let expected = parse_expr("C1/x").expect("parse");
    assert!(solutions.iter().any(|s| equivalent(&s.rhs, &expected)), "{solutions:?}");
}
