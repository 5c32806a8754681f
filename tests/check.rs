use pretty_assertions::assert_eq;
use rcas_ode::{checkodesol, parse_equation, parse_expr, Expr, Ode, Verdict};

fn ode(text: &str) -> Ode {
    let equation = parse_equation(text).expect("parse equation");
    Ode::new(&equation, &parse_expr("f(x)").expect("parse function")).expect("build ode")
}

fn verdict(equation: &str, solution: &str) -> Verdict {
    let solution = parse_equation(solution).expect("parse solution");
    checkodesol(&ode(equation), &solution, None).verdict
}

#[test]
fn explicit_solutions() {
    assert_eq!(verdict("f'(x) = f(x)", "f(x) = C1*exp(x)"), Verdict::Satisfied);
    assert_eq!(verdict("f''(x) + 9*f(x) = 0", "f(x) = C1*sin(3*x) + C2*cos(3*x)"), Verdict::Satisfied);
    assert_eq!(verdict("f'(x) = f(x)", "C1*exp(x) = f(x)"), Verdict::Satisfied);
}

#[test]
fn wrong_solutions_are_violated() {
    assert_eq!(verdict("f'(x) = f(x)", "f(x) = C1*exp(2*x)"), Verdict::Violated);
    assert_eq!(verdict("f''(x) + 9*f(x) = 0", "f(x) = sin(2*x)"), Verdict::Violated);
}

#[test]
fn violated_residual_is_reported() {
    let solution = parse_equation("f(x) = x").expect("parse");
    let result = checkodesol(&ode("f'(x) = f(x)"), &solution, None);
    assert_eq!(result.verdict, Verdict::Violated);
    assert_ne!(result.residual, Expr::integer(0));
}

#[test]
fn implicit_solutions() {
    // Circles x^2 + f^2 = C1 solve f' = -x/f.
    assert_eq!(verdict("f'(x) = -x/f(x)", "x^2 + f(x)^2 = C1"), Verdict::Satisfied);
    assert_eq!(verdict("f'(x) = x/f(x)", "x^2 + f(x)^2 = C1"), Verdict::Violated);
}

#[test]
fn implicit_second_order() {
    assert_eq!(verdict("f''(x) = 0", "f(x) - C1*x - C2 = 0"), Verdict::Satisfied);
}

#[test]
fn explicit_order_override() {
    let solution = parse_equation("f(x) = C1*exp(x)").expect("parse");
    assert!(checkodesol(&ode("f'(x) = f(x)"), &solution, Some(1)).is_satisfied());
}
