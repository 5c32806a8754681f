use rcas_ode::ode::Heuristic;
use rcas_ode::{checkinfsol, infinitesimals, parse_equation, parse_expr, Expr, Ode, OdeError};

fn ode(text: &str) -> Ode {
    let equation = parse_equation(text).expect("parse equation");
    Ode::new(&equation, &parse_expr("f(x)").expect("parse function")).expect("build ode")
}

#[test]
fn autonomous_equation_admits_translations() {
    let ode = ode("f'(x) = f(x)^2 + 1");
    assert!(checkinfsol(&ode, &Expr::integer(1), &Expr::integer(0)).expect("first order"));
    assert!(!checkinfsol(&ode, &Expr::integer(0), &Expr::integer(1)).expect("first order"));
}

#[test]
fn found_infinitesimals_satisfy_the_determining_equation() {
    for text in ["f'(x) = f(x)^2 + 1", "f'(x) = x*f(x)", "f'(x) = f(x)/x + x"] {
        let ode = ode(text);
        let found = infinitesimals(&ode, None).expect("first order");
        assert!(!found.is_empty(), "{text}");
        for inf in found {
            assert!(checkinfsol(&ode, &inf.xi, &inf.eta).expect("first order"), "{text}: {inf:?}");
        }
    }
}

#[test]
fn scaling_symmetry_of_homogeneous_equation() {
    let ode = ode("f'(x) = (x + f(x))/x");
    let xi = parse_expr("x").expect("parse");
    let eta = parse_expr("f(x)").expect("parse");
    assert!(checkinfsol(&ode, &xi, &eta).expect("first order"));
}

#[test]
fn heuristics_by_name() {
    assert_eq!("abaco1_simple".parse::<Heuristic>().expect("known"), Heuristic::Abaco1Simple);
    assert_eq!(Heuristic::Bivariate.to_string(), "bivariate");
    assert!(matches!("abaco2".parse::<Heuristic>(), Err(OdeError::InvalidInput(_))));
}

#[test]
fn single_heuristic() {
    let ode = ode("f'(x) = f(x)^2 + 1");
    let found = infinitesimals(&ode, Some(Heuristic::Abaco1Simple)).expect("first order");
    assert_eq!(found.len(), 1);
    // η(y) = h(y) is tried before ξ(x).
    assert_eq!(found[0].xi, Expr::integer(0));
    assert!(checkinfsol(&ode, &found[0].xi, &found[0].eta).expect("first order"));
}

#[test]
fn higher_orders_are_rejected() {
    let ode = ode("f''(x) = f(x)");
    assert!(infinitesimals(&ode, None).is_err());
}
