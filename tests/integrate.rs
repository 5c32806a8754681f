use rcas_ode::calculus::{integrate_report, AttemptStatus, IntegrationResult, Strategy};
use rcas_ode::simplify::equivalent;
use rcas_ode::{differentiate, integrate, parse_expr, try_integrate, Expr};

/// The antiderivative differentiates back to the integrand.
fn assert_antiderivative(input: &str) -> Expr {
    let integrand = parse_expr(input).expect("parse integrand");
    let result = try_integrate(&integrand, "x").unwrap_or_else(|| panic!("no antiderivative for {input}"));
    assert!(
        equivalent(&differentiate(&result, "x"), &integrand),
        "d/dx of {result} is not {input}"
    );
    result
}

#[test]
fn integrates_polynomial_and_rational() {
    assert_antiderivative("x^3");
    assert_antiderivative("(2*x+3)/(x+1)");
    let result = integrate_report(&parse_expr("x^2 + 1").expect("parse"), "x");
    match result {
        IntegrationResult::Integrated { attempts, .. } => assert!(attempts
            .iter()
            .any(|a| a.status == AttemptStatus::Succeeded && a.strategy != Strategy::Expansion)),
        other => panic!("expected integration, got {other:?}"),
    }
}

#[test]
fn integrates_affine_trig_exp_log_and_one_over_x() {
    assert_antiderivative("sin(2*x + 3)");
    assert_antiderivative("exp(2*x + 1)");
    assert_antiderivative("log(2*x + 3)");
    assert_antiderivative("x^-1");
}

#[test]
fn substitution_and_parts_heuristics() {
    assert_antiderivative("2*x*exp(x^2)");
    assert_antiderivative("x*sin(x)");
    assert_antiderivative("x*exp(x)");
}

#[test]
fn non_elementary_inputs_stay_unevaluated() {
    let expr = parse_expr("exp(x^2)").expect("parse");
    assert_eq!(try_integrate(&expr, "x"), None);
    assert_eq!(integrate(&expr, "x"), Expr::Integral(expr.clone().boxed(), "x".to_string(), None));
}

#[test]
fn integrates_constants_wrt_other_var() {
    let expr = parse_expr("x*sin(x)").expect("parse");
    let result = try_integrate(&expr, "y").expect("constant integrand");
    assert!(equivalent(&result, &parse_expr("x*sin(x)*y").expect("parse")));
}
