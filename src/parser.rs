use crate::calculus::differentiate_n;
use crate::error::{OdeError, Result};
use crate::expr::{Equation, Expr, Func, Rational};
use crate::simplify::rules::{add_all, func, mul_all, neg, pow};
use nom::branch::alt;
use nom::bytes::complete::take_while;
use nom::character::complete::{alpha1, char, digit1, multispace0};
use nom::combinator::{all_consuming, map, recognize};
use nom::error::VerboseError;
use nom::multi::{fold_many0, many0_count, separated_list1};
use nom::sequence::{delimited, pair, preceded, separated_pair};
use nom::IResult;
use num_bigint::BigInt;
use num_traits::{Num, ToPrimitive};

type ParseResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

/// Parse an expression such as `x*f'(x) - sin(x)^2`.
pub fn parse_expr(input: &str) -> Result<Expr> {
    match all_consuming(ws(parse_add_sub))(input) {
        Ok((_, expr)) => Ok(expr),
        Err(e) => Err(OdeError::Parse(format!("{e:?}"))),
    }
}

/// Parse `lhs = rhs`; a bare expression means `expr = 0`.
pub fn parse_equation(input: &str) -> Result<Equation> {
    let equation = alt((
        map(
            separated_pair(parse_add_sub, ws(char('=')), parse_add_sub),
            |(lhs, rhs)| Equation::new(lhs, rhs),
        ),
        map(parse_add_sub, |lhs| Equation::new(lhs, Expr::integer(0))),
    ));
    match all_consuming(ws(equation))(input) {
        Ok((_, eq)) => Ok(eq),
        Err(e) => Err(OdeError::Parse(format!("{e:?}"))),
    }
}

/// Initial condition `f''(x0) = v`, returned as `(name, primes, x0, v)`.
pub fn parse_condition_parts(input: &str) -> Result<(String, usize, Expr, Expr)> {
    let condition = separated_pair(
        pair(ws(pair(identifier, many0_count(char('\'')))), parse_parens),
        ws(char('=')),
        parse_add_sub,
    );
    match all_consuming(ws(condition))(input) {
        Ok((_, (((name, primes), point), value))) => Ok((name.to_string(), primes, point, value)),
        Err(e) => Err(OdeError::Parse(format!("{e:?}"))),
    }
}

fn parse_add_sub(input: &str) -> ParseResult<'_, Expr> {
    let (rest, init) = parse_mul_div(input)?;
    fold_many0(
        pair(ws(alt((char('+'), char('-')))), parse_mul_div),
        move || init.clone(),
        |acc, (op, rhs)| match op {
            '+' => add_all(vec![acc, rhs]),
            _ => add_all(vec![acc, neg(rhs)]),
        },
    )(rest)
}

fn parse_mul_div(input: &str) -> ParseResult<'_, Expr> {
    let (rest, init) = parse_unary(input)?;
    fold_many0(
        pair(ws(alt((char('*'), char('/')))), parse_unary),
        move || init.clone(),
        |acc, (op, rhs)| match op {
            '*' => mul_all(vec![acc, rhs]),
            _ => mul_all(vec![acc, pow(rhs, Expr::integer(-1))]),
        },
    )(rest)
}

fn parse_unary(input: &str) -> ParseResult<'_, Expr> {
    if let Ok((rest, expr)) = preceded(ws(char('-')), parse_unary)(input) {
        Ok((rest, neg(expr)))
    } else {
        parse_pow(input)
    }
}

fn parse_pow(input: &str) -> ParseResult<'_, Expr> {
    let (rest, base) = parse_primary(input)?;
    if let Ok((next, exp)) = preceded(ws(char('^')), parse_unary)(rest) {
        Ok((next, pow(base, exp)))
    } else if let Ok((next, exp)) = preceded(ws(pair(char('*'), char('*'))), parse_unary)(rest) {
        Ok((next, pow(base, exp)))
    } else {
        Ok((rest, base))
    }
}

fn parse_primary(input: &str) -> ParseResult<'_, Expr> {
    alt((parse_parens, parse_number, parse_call, parse_identifier))(input)
}

fn parse_parens(input: &str) -> ParseResult<'_, Expr> {
    delimited(ws(char('(')), parse_add_sub, ws(char(')')))(input)
}

fn parse_number(input: &str) -> ParseResult<'_, Expr> {
    map(parse_int, |n| Expr::Constant(Rational::from_integer(n)))(input)
}

fn identifier(input: &str) -> ParseResult<'_, &str> {
    recognize(pair(alpha1, take_while(|c: char| c.is_alphanumeric() || c == '_')))(input)
}

fn parse_identifier(input: &str) -> ParseResult<'_, Expr> {
    map(ws(identifier), |s: &str| Expr::symbol(s))(input)
}

/// `name(args)` with optional primes, `f''(x)`.
fn parse_call(input: &str) -> ParseResult<'_, Expr> {
    let (rest, (name, primes)) = ws(pair(identifier, many0_count(char('\''))))(input)?;
    let (rest, args) = delimited(
        ws(char('(')),
        separated_list1(ws(char(',')), parse_add_sub),
        ws(char(')')),
    )(rest)?;
    let fail = || {
        nom::Err::Error(VerboseError {
            errors: vec![(input, nom::error::VerboseErrorKind::Context("function call"))],
        })
    };

    if primes > 0 {
        let [Expr::Symbol(var)] = args.as_slice() else {
            return Err(fail());
        };
        let var = var.clone();
        let applied = Expr::apply(name, args);
        return Ok((rest, differentiate_n(&applied, &var, primes)));
    }

    let expr = match (name, args.as_slice()) {
        ("sqrt", [arg]) => pow(arg.clone(), Expr::constant(1, 2)),
        ("diff" | "Derivative", [inner, Expr::Symbol(var)]) => differentiate_n(inner, var, 1),
        ("diff" | "Derivative", [inner, Expr::Symbol(var), n]) => {
            let n = n.as_integer().and_then(|k| k.to_usize()).ok_or_else(fail)?;
            differentiate_n(inner, var, n)
        }
        (name, [arg]) => match Func::from_name(name) {
            Some(f) => func(f, arg.clone()),
            None => Expr::apply(name, args.clone()),
        },
        (name, _) => Expr::apply(name, args.clone()),
    };
    Ok((rest, expr))
}

fn parse_int(input: &str) -> ParseResult<'_, BigInt> {
    let (rest, digits) = ws(digit1)(input)?;
    match BigInt::from_str_radix(digits, 10) {
        Ok(n) => Ok((rest, n)),
        Err(_) => Err(nom::Err::Error(VerboseError {
            errors: vec![(input, nom::error::VerboseErrorKind::Context("integer"))],
        })),
    }
}

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> ParseResult<'a, O>
where
    F: FnMut(&'a str) -> ParseResult<'a, O>,
{
    delimited(multispace0, inner, multispace0)
}
