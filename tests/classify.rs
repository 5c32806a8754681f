use pretty_assertions::assert_eq;
use rcas_ode::ode::SolveContext;
use rcas_ode::{classify_ode, parse_equation, parse_expr, Classification, Expr, Hint, Ode, ALL_HINTS};

fn ode(text: &str) -> Ode {
    let equation = parse_equation(text).expect("parse equation");
    Ode::new(&equation, &parse_expr("f(x)").expect("parse function")).expect("build ode")
}

fn classify(text: &str) -> Classification {
    classify_ode(&ode(text), &SolveContext::default())
}

fn assert_in_catalogue_order(classification: &Classification) {
    let positions: Vec<usize> = classification
        .hints
        .iter()
        .map(|h| ALL_HINTS.iter().position(|c| c == h).expect("catalogued"))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
}

#[test]
fn exponential_growth() {
    let c = classify("f'(x) = f(x)");
    assert!(c.contains(Hint::Separable));
    assert!(c.contains(Hint::FirstLinear));
    assert!(c.contains(Hint::FirstExact));
    assert!(c.contains(Hint::NthLinearConstantCoeffHomogeneous));
    assert_eq!(c.default_hint(), Some(Hint::Separable));
    assert_eq!(c.order, 1);
    assert_in_catalogue_order(&c);
}

#[test]
fn second_order_constant_coefficients() {
    let c = classify("f''(x) + 9*f(x) = 0");
    assert!(c.contains(Hint::NthLinearConstantCoeffHomogeneous));
    assert!(c.contains(Hint::SecondPowerSeriesOrdinary));
    assert!(!c.contains(Hint::NthLinearConstantCoeffVariationOfParameters));
    assert!(!c.contains(Hint::Separable));
    let record = c.match_record(Hint::NthLinearConstantCoeffHomogeneous).expect("record");
    assert_eq!(record.get("c0"), Some(&Expr::integer(9)));
    assert_eq!(record.get("c2"), Some(&Expr::integer(1)));
}

#[test]
fn forcing_selects_nonhomogeneous_hints() {
    let c = classify("f''(x) - f(x) = x*exp(x)");
    assert!(c.contains(Hint::NthLinearConstantCoeffUndeterminedCoefficients));
    assert!(c.contains(Hint::NthLinearConstantCoeffVariationOfParameters));
    assert!(c.contains(Hint::NthLinearConstantCoeffVariationOfParametersIntegral));
    assert!(!c.contains(Hint::NthLinearConstantCoeffHomogeneous));

    // log(x) has no finite set of derivatives up to scaling.
    let c = classify("f''(x) - f(x) = log(x)");
    assert!(!c.contains(Hint::NthLinearConstantCoeffUndeterminedCoefficients));
    assert!(c.contains(Hint::NthLinearConstantCoeffVariationOfParameters));
}

#[test]
fn linear_first_order_with_variable_coefficients() {
    let c = classify("x*f'(x) - f(x) = x^2*sin(x)");
    assert!(c.contains(Hint::FirstLinear));
    assert!(c.contains(Hint::FirstLinearIntegral));
    assert!(!c.contains(Hint::Separable));
}

#[test]
fn bernoulli_records_exponent() {
    let c = classify("f'(x) = f(x)/x + x*f(x)^2");
    let record = c.match_record(Hint::Bernoulli).expect("Bernoulli");
    assert_eq!(record.get("n"), Some(&Expr::integer(2)));
    assert!(c.contains(Hint::SeparableReduced));
    assert!(!c.contains(Hint::FirstLinear));
}

#[test]
fn algebraic_in_the_derivative() {
    let c = classify("f(x)*(f'(x)^2 - 1) = 0");
    assert_eq!(c.default_hint(), Some(Hint::NthAlgebraic));
    assert!(!c.contains(Hint::FirstLinear));
    assert!(!c.contains(Hint::LieGroup));
}

#[test]
fn homogeneous_coefficients() {
    let c = classify("f'(x) = (x + f(x))/x");
    assert!(c.contains(Hint::FirstHomogeneousCoeffBest));
    assert!(c.contains(Hint::FirstHomogeneousCoeffSubsDepDivIndep));
    assert!(c.contains(Hint::FirstHomogeneousCoeffSubsIndepDivDep));

    // P(1, u) + u*Q(1, u) vanishes for f' = f/x.
    let c = classify("f'(x) = f(x)/x");
    assert!(!c.contains(Hint::FirstHomogeneousCoeffSubsDepDivIndep));
    assert!(!c.contains(Hint::FirstHomogeneousCoeffBest));
}

#[test]
fn riccati_special_case() {
    let c = classify("f'(x) = -f(x)^2 - 2/x^2");
    let record = c.match_record(Hint::RiccatiSpecialMinus2).expect("Riccati");
    assert_eq!(record.get("b"), Some(&Expr::integer(1)));
    assert_eq!(record.get("d"), Some(&Expr::integer(2)));
}

#[test]
fn euler_equations() {
    let c = classify("x^2*f''(x) - 2*x*f'(x) + 2*f(x) = 0");
    assert!(c.contains(Hint::NthLinearEulerEqHomogeneous));
    assert!(!c.contains(Hint::NthLinearConstantCoeffHomogeneous));
    assert!(c.contains(Hint::SecondPowerSeriesRegular));

    let c = classify("x^2*f''(x) - 2*x*f'(x) + 2*f(x) = x^3");
    assert!(c.contains(Hint::NthLinearEulerEqNonhomogeneousUndeterminedCoefficients));
    assert!(c.contains(Hint::NthLinearEulerEqNonhomogeneousVariationOfParameters));
}

#[test]
fn liouville_and_reduction() {
    let c = classify("f''(x) + f'(x)^2/f(x) + f'(x)/x = 0");
    assert!(c.contains(Hint::Liouville));
    assert!(c.contains(Hint::LiouvilleIntegral));

    let c = classify("f''(x) = x*f'(x)");
    assert!(c.contains(Hint::NthOrderReducible));
}

#[test]
fn power_series_needs_a_regular_point() {
    assert!(classify("f'(x) = x + f(x)^2").contains(Hint::FirstPowerSeries));
    assert!(!classify("f'(x) = f(x)/x").contains(Hint::FirstPowerSeries));
    let shifted = classify_ode(
        &ode("f'(x) = f(x)/x"),
        &SolveContext {
            x0: Expr::integer(1),
            ..SolveContext::default()
        },
    );
    assert!(shifted.contains(Hint::FirstPowerSeries));
}

#[test]
fn nonlinear_equations_have_no_linear_hints() {
    let c = classify("f'(x) = sin(x*f(x))");
    assert!(!c.contains(Hint::FirstLinear));
    assert!(!c.contains(Hint::Separable));
    assert!(c.contains(Hint::LieGroup));
}
