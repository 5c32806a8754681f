use pretty_assertions::assert_eq;
use rcas_ode::ode::Simplicity;
use rcas_ode::simplify::equivalent;
use rcas_ode::{
    constant_renumber, constantsimp, ode_sol_simplicity, odesimp, parse_equation, parse_expr, Equation, Expr,
    Hint, Ode,
};

fn eq(text: &str) -> Equation {
    parse_equation(text).expect("parse equation")
}

fn f() -> Expr {
    parse_expr("f(x)").expect("parse function")
}

fn integral(integrand: &str) -> Expr {
    Expr::Integral(parse_expr(integrand).expect("parse integrand").boxed(), "x".to_string(), None)
}

#[test]
fn renumbers_by_first_appearance() {
    let renumbered = constant_renumber(&eq("f(x) = C3*sin(x) + C7*cos(x)"));
    let expected = [eq("f(x) = C1*sin(x) + C2*cos(x)"), eq("f(x) = C2*sin(x) + C1*cos(x)")];
    assert!(expected.contains(&renumbered), "got {renumbered}");
    let constants: Vec<String> = renumbered.rhs.free_symbols().into_iter().filter(|s| s.starts_with('C')).collect();
    assert_eq!(constants, vec!["C1", "C2"]);
}

#[test]
fn renumbering_is_idempotent() {
    for text in ["f(x) = C5*exp(x) + C2*x", "f(x) = C1", "C4*x + C9 = f(x)^2"] {
        let once = constant_renumber(&eq(text));
        assert_eq!(constant_renumber(&once), once, "{text}");
    }
}

#[test]
fn renumbering_ignores_original_names() {
    // Only the positions of the constants differ.
    let a = constant_renumber(&eq("f(x) = C1*exp(x) + C2*exp(2*x)"));
    let b = constant_renumber(&eq("f(x) = C2*exp(x) + C1*exp(2*x)"));
    assert_eq!(a, b);
}

#[test]
fn absorbs_numbers_into_constants() {
    let cases = [
        ("f(x) = C1 + 2 + x", "f(x) = C1 + x"),
        ("f(x) = -3*C1*x", "f(x) = C1*x"),
        ("f(x) = exp(C1 + x)", "f(x) = C1*exp(x)"),
        ("f(x) = x + log(C1)", "f(x) = x + C1"),
    ];
    for (input, expected) in cases {
        let got = constantsimp(&eq(input));
        let expected = eq(expected);
        assert!(equivalent(&got.rhs, &expected.rhs), "{input}: got {got}");
    }
}

#[test]
fn shared_constants_stay_apart() {
    // C1 appears twice, so neither occurrence can absorb its neighbour.
    let input = eq("f(x) = (C1 + 1)*x + C1");
    assert_eq!(constantsimp(&input), input);
}

#[test]
fn simplicity_orders_solution_shapes() {
    let func = f();
    let explicit = ode_sol_simplicity(&eq("f(x) = C1*exp(x)"), &func);
    let solvable = ode_sol_simplicity(&eq("f(x)^2 = C1 + x"), &func);
    let quadrature = integral("exp(x^2)") + Expr::symbol("C1");
    let unevaluated = ode_sol_simplicity(&Equation::new(func.clone(), quadrature), &func);
    assert!(matches!(explicit, Simplicity::Explicit(_)));
    assert!(explicit < solvable);
    assert!(solvable < unevaluated);
}

#[test]
fn odesimp_solves_and_tidies() {
    let ode = Ode::new(&eq("f'(x) = f(x)"), &f()).expect("ode");
    let raw = vec![eq("log(f(x)) = x + C1")];
    let solutions = odesimp(&ode, raw, Hint::Separable, true);
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0].lhs, f());
    assert!(equivalent(&solutions[0].rhs, &parse_expr("C1*exp(x)").expect("parse")), "got {}", solutions[0]);
}

#[test]
fn integral_hints_keep_quadratures() {
    let ode = Ode::new(&eq("f'(x) = x"), &f()).expect("ode");
    let raw = vec![Equation::new(f(), integral("x") + Expr::symbol("C1"))];

    let kept = odesimp(&ode, raw.clone(), Hint::SeparableIntegral, true);
    assert!(kept[0].rhs.has_integral(), "got {}", kept[0]);

    let evaluated = odesimp(&ode, raw, Hint::Separable, true);
    assert!(!evaluated[0].rhs.has_integral());
    assert!(equivalent(&evaluated[0].rhs, &parse_expr("x^2/2 + C1").expect("parse")));
}

#[test]
fn roots_of_constant_products() {
    let got = constantsimp(&eq("f(x) = sqrt(C1*x^2)/x^2"));
    assert!(equivalent(&got.rhs, &parse_expr("C1/x").expect("parse")), "got {got}");
    let got = constantsimp(&eq("f(x) = -sqrt(C1*x^2)/x^2"));
    assert!(equivalent(&got.rhs, &parse_expr("C1/x").expect("parse")), "got {got}");
    // x^(1/2) has no integer power to keep.
    let input = eq("f(x) = sqrt(C1*x)");
    assert_eq!(constantsimp(&input), input);
}
