use pretty_assertions::assert_eq;
use rcas_ode::ode::is_constant_name;
use rcas_ode::simplify::equivalent;
use rcas_ode::{
    checkodesol, dsolve, parse_equation, parse_expr, DsolveOptions, Dsolved, Equation, Expr, Hint,
    HintRequest, InitialConditions, Ode, OdeError, Verdict,
};

fn f() -> Expr {
    parse_expr("f(x)").expect("parse function")
}

fn expr(text: &str) -> Expr {
    parse_expr(text).expect("parse expression")
}

fn solve(text: &str, options: &DsolveOptions) -> Vec<Equation> {
    let equation = parse_equation(text).expect("parse equation");
    dsolve(&equation, &f(), options).expect("dsolve").solutions()
}

fn solve_one(text: &str) -> Equation {
    let solutions = solve(text, &DsolveOptions::default());
    assert_eq!(solutions.len(), 1, "{solutions:?}");
    solutions[0].clone()
}

fn constants(solution: &Equation) -> Vec<String> {
    let mut names: Vec<String> = solution
        .rhs
        .free_symbols()
        .into_iter()
        .chain(solution.lhs.free_symbols())
        .filter(|s| is_constant_name(s))
        .collect();
    names.sort();
    names.dedup();
    names
}

fn assert_solves(text: &str, solution: &Equation) {
    let ode = Ode::new(&parse_equation(text).expect("parse"), &f()).expect("ode");
    let result = checkodesol(&ode, solution, None);
    assert_eq!(result.verdict, Verdict::Satisfied, "{solution} residual {}", result.residual);
}

#[test]
fn exponential_growth() {
    let solution = solve_one("f'(x) = f(x)");
    assert_eq!(solution.lhs, f());
    assert!(equivalent(&solution.rhs, &expr("C1*exp(x)")), "got {solution}");
    assert_solves("f'(x) = f(x)", &solution);
}

#[test]
fn harmonic_oscillator() {
    let solution = solve_one("f''(x) + 9*f(x) = 0");
    assert!(solution.rhs.has(&expr("sin(3*x)")));
    assert!(solution.rhs.has(&expr("cos(3*x)")));
    assert_eq!(constants(&solution), vec!["C1", "C2"]);
    assert_solves("f''(x) + 9*f(x) = 0", &solution);
}

#[test]
fn first_order_linear() {
    let text = "x*f'(x) - f(x) = x^2*sin(x)";
    let options = DsolveOptions::new().hint(Hint::FirstLinear);
    let solutions = solve(text, &options);
    assert_eq!(solutions.len(), 1);
    assert!(equivalent(&solutions[0].rhs, &expr("x*(C1 - cos(x))")), "got {}", solutions[0]);
    assert_solves(text, &solutions[0]);
}

#[test]
fn bernoulli_through_reciprocal() {
    let text = "f'(x) = f(x)/x + x*f(x)^2";
    let solution = solve_one(text);
    assert_eq!(solution.lhs, f());
    assert_eq!(constants(&solution), vec!["C1"]);
    assert_solves(text, &solution);
}

#[test]
fn algebraic_factors_keep_the_zero_solution() {
    let solutions = solve("f(x)*(f'(x)^2 - 1) = 0", &DsolveOptions::default());
    assert_eq!(solutions.len(), 3, "{solutions:?}");
    assert!(solutions.contains(&Equation::new(f(), Expr::integer(0))));
    assert!(solutions.iter().any(|s| equivalent(&s.rhs, &expr("C1 + x"))));
    assert!(solutions.iter().any(|s| equivalent(&s.rhs, &expr("C1 - x"))));

    let solutions = solve("f(x)*(1 + f'(x)) = 0", &DsolveOptions::default());
    assert_eq!(solutions.len(), 2, "{solutions:?}");
}

#[test]
fn initial_value_fixes_the_constant() {
    let ics = InitialConditions::new().value(Expr::integer(0), Expr::integer(2));
    let options = DsolveOptions::new().ics(ics);
    let solutions = solve("f'(x) = f(x)", &options);
    assert_eq!(solutions.len(), 1);
    assert!(equivalent(&solutions[0].rhs, &expr("2*exp(x)")), "got {}", solutions[0]);
    assert!(constants(&solutions[0]).is_empty());
}

#[test]
fn second_order_initial_values() {
    let ics = InitialConditions::parse("f(0) = 0, f'(0) = 3", "f").expect("parse conditions");
    let options = DsolveOptions::new().ics(ics);
    let solutions = solve("f''(x) + 9*f(x) = 0", &options);
    assert_eq!(solutions.len(), 1);
    assert!(equivalent(&solutions[0].rhs, &expr("sin(3*x)")), "got {}", solutions[0]);
}

#[test]
fn fewer_conditions_leave_free_constants() {
    let ics = InitialConditions::new().value(Expr::integer(0), Expr::integer(1));
    let options = DsolveOptions::new().ics(ics);
    let solutions = solve("f''(x) + 9*f(x) = 0", &options);
    assert_eq!(constants(&solutions[0]).len(), 1);
}

#[test]
fn inconsistent_conditions() {
    let equation = parse_equation("f'(x) = 0").expect("parse");
    let ics = InitialConditions::new()
        .value(Expr::integer(0), Expr::integer(1))
        .value(Expr::integer(0), Expr::integer(2));
    let result = dsolve(&equation, &f(), &DsolveOptions::new().ics(ics));
    assert!(matches!(result, Err(OdeError::InitialConditions(_))), "{result:?}");
}

#[test]
fn all_hints_report_per_hint_outcomes() {
    let equation = parse_equation("f'(x) = f(x)").expect("parse");
    let request = DsolveOptions::new().hint(HintRequest::All);
    let Dsolved::All(all) = dsolve(&equation, &f(), &request).expect("dsolve") else {
        panic!("expected every hint");
    };
    assert_eq!(all.order, 1);
    assert_eq!(all.default, Some(Hint::Separable));
    assert!(all.results.contains_key(&Hint::SeparableIntegral));
    assert!(all.results[&Hint::FirstLinear].is_ok());
    let best = all.best.expect("best solution");
    assert!(all.best_hint.is_some());
    assert_eq!(best.len(), 1);
    assert!(equivalent(&best[0].rhs, &expr("C1*exp(x)")));
}

#[test]
fn all_integral_prefers_unevaluated_variants() {
    let equation = parse_equation("f'(x) = f(x)").expect("parse");
    let request = DsolveOptions::new().hint(HintRequest::AllIntegral);
    let Dsolved::All(all) = dsolve(&equation, &f(), &request).expect("dsolve") else {
        panic!("expected every hint");
    };
    assert!(all.results.contains_key(&Hint::SeparableIntegral));
    assert!(!all.results.contains_key(&Hint::Separable));
    assert!(all.results.contains_key(&Hint::NthLinearConstantCoeffHomogeneous));
}

#[test]
fn all_rejects_initial_conditions() {
    let equation = parse_equation("f'(x) = f(x)").expect("parse");
    let options = DsolveOptions::new()
        .hint(HintRequest::All)
        .ics(InitialConditions::new().value(Expr::integer(0), Expr::integer(1)));
    assert!(matches!(dsolve(&equation, &f(), &options), Err(OdeError::InvalidInput(_))));
}

#[test]
fn unmatched_hint_is_an_error() {
    let equation = parse_equation("f''(x) + 9*f(x) = 0").expect("parse");
    let options = DsolveOptions::new().hint(Hint::Bernoulli);
    assert!(matches!(
        dsolve(&equation, &f(), &options),
        Err(OdeError::HintNotApplicable { .. })
    ));
}

#[test]
fn invalid_input_is_rejected() {
    let equation = parse_equation("f(x) = x").expect("parse");
    assert!(matches!(
        dsolve(&equation, &f(), &DsolveOptions::default()),
        Err(OdeError::InvalidInput(_))
    ));
    let equation = parse_equation("f'(x) = f(x)").expect("parse");
    assert!(matches!(
        dsolve(&equation, &expr("x"), &DsolveOptions::default()),
        Err(OdeError::InvalidInput(_))
    ));
}

#[test]
fn general_solutions_carry_one_constant_per_order() {
    let cases = [
        ("f'(x) = f(x)", 1),
        ("f''(x) + 9*f(x) = 0", 2),
        ("f''(x) - f(x) = x", 2),
        ("f'''(x) - f'(x) = 0", 3),
        ("x^2*f''(x) - 2*x*f'(x) + 2*f(x) = 0", 2),
    ];
    for (text, order) in cases {
        let solution = solve_one(text);
        assert_eq!(constants(&solution).len(), order, "{text}: {solution}");
    }
}

/// Every condition evaluates exactly on the returned solutions.
fn assert_meets(solution: &Equation, point: i64, value: i64) {
    assert_eq!(solution.lhs, f());
    let at = rcas_ode::substitute(&solution.rhs, &expr("x"), &Expr::integer(point));
    assert_eq!(rcas_ode::simplify(&at), Expr::integer(value), "{solution}");
}

#[test]
fn fitted_constants_respect_the_sign_of_the_condition() {
    let ics = InitialConditions::parse("f(0) = 1", "f").expect("parse conditions");
    let solutions = solve("f'(x) = x/f(x)", &DsolveOptions::new().ics(ics));
    assert_eq!(solutions.len(), 1, "{solutions:?}");
    assert_meets(&solutions[0], 0, 1);
    assert!(equivalent(&solutions[0].rhs, &expr("sqrt(x^2 + 1)")), "got {}", solutions[0]);

    let ics = InitialConditions::parse("f(0) = 2", "f").expect("parse conditions");
    let solutions = solve("f'(x) = -x/f(x)", &DsolveOptions::new().ics(ics));
    assert_eq!(solutions.len(), 1, "{solutions:?}");
    assert_meets(&solutions[0], 0, 2);
}

#[test]
fn boundary_values_at_pi() {
    let equation = parse_equation("f''(x) + f(x) = 0").expect("parse");

    let ics = InitialConditions::parse("f(0) = 0, f(pi) = 1", "f").expect("parse conditions");
    let result = dsolve(&equation, &f(), &DsolveOptions::new().ics(ics));
    assert!(matches!(result, Err(OdeError::InitialConditions(_))), "{result:?}");

    let ics = InitialConditions::parse("f(0) = 0, f(pi) = 0", "f").expect("parse conditions");
    let solutions = solve("f''(x) + f(x) = 0", &DsolveOptions::new().ics(ics));
    assert_eq!(solutions.len(), 1);
    assert!(equivalent(&solutions[0].rhs, &expr("C1*sin(x)")), "got {}", solutions[0]);

    let ics = InitialConditions::parse("f(0) = 0, f(pi/2) = 2", "f").expect("parse conditions");
    let solutions = solve("f''(x) + f(x) = 0", &DsolveOptions::new().ics(ics));
    assert!(equivalent(&solutions[0].rhs, &expr("2*sin(x)")), "got {}", solutions[0]);
}

#[test]
fn nonlinear_in_the_derivative_splits_into_branches() {
    let text = "f'(x)^2 = f(x)";
    let solutions = solve(text, &DsolveOptions::default());
    // Both signs of the root may square to the same family.
    assert!((1..=2).contains(&solutions.len()), "{solutions:?}");
    for solution in &solutions {
        assert_solves(text, solution);
        assert_eq!(constants(solution), vec!["C1"]);
    }

    let equation = parse_equation(text).expect("parse");
    let request = DsolveOptions::new().hint(HintRequest::All);
    assert!(matches!(
        dsolve(&equation, &f(), &request),
        Err(OdeError::NoMatchingHint(_))
    ));
}
