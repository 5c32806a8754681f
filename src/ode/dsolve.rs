//! The solving pipeline: classify, pick hints, run their routines,
//! post-process and apply initial conditions.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::{debug, warn};

use crate::calculus::differentiate_n;
use crate::error::{OdeError, Result, Unsolvable};
use crate::expr::{Equation, Expr};
use crate::ode::classify::{classify_ode, Classification};
use crate::ode::dispatch::{solve_with, SolveContext, DEFAULT_SERIES_TERMS};
use crate::ode::hints::Hint;
use crate::ode::normalize::{dummy, Condition, InitialConditions, Ode};
use crate::ode::simp::{constant_renumber, ode_sol_simplicity, odesimp, Simplicity};
use crate::ode::solvers::is_constant_name;
use crate::ode::solvers::series::is_singular;
use crate::simplify::{is_identically_zero, simplify, substitute_symbol};
use crate::solver::{solve_for, solve_linear_system, LinearResult};

/// Which hints `dsolve` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HintRequest {
    /// The first classified hint, falling back to later ones when it
    /// cannot finish.
    #[default]
    Default,
    /// Every hint, keeping the simplest result.
    Best,
    All,
    /// Like `All`, but hints with an `_Integral` counterpart only run that
    /// counterpart.
    AllIntegral,
    Hint(Hint),
}

impl fmt::Display for HintRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HintRequest::Default => write!(f, "default"),
            HintRequest::Best => write!(f, "best"),
            HintRequest::All => write!(f, "all"),
            HintRequest::AllIntegral => write!(f, "all_Integral"),
            HintRequest::Hint(hint) => write!(f, "{hint}"),
        }
    }
}

impl FromStr for HintRequest {
    type Err = OdeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(HintRequest::Default),
            "best" => Ok(HintRequest::Best),
            "all" => Ok(HintRequest::All),
            "all_Integral" => Ok(HintRequest::AllIntegral),
            other => other.parse().map(HintRequest::Hint),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DsolveOptions {
    pub hint: HintRequest,
    /// Solve implicit results for the unknown and simplify them.
    pub simplify: bool,
    pub ics: InitialConditions,
    pub series_terms: usize,
    /// Expansion point of power series hints.
    pub x0: Expr,
}

impl Default for DsolveOptions {
    fn default() -> Self {
        DsolveOptions {
            hint: HintRequest::Default,
            simplify: true,
            ics: InitialConditions::new(),
            series_terms: DEFAULT_SERIES_TERMS,
            x0: Expr::integer(0),
        }
    }
}

impl DsolveOptions {
    pub fn new() -> Self {
        DsolveOptions::default()
    }

    pub fn hint(mut self, hint: impl Into<HintRequest>) -> Self {
        self.hint = hint.into();
        self
    }

    pub fn simplify(mut self, simplify: bool) -> Self {
        self.simplify = simplify;
        self
    }

    pub fn ics(mut self, ics: InitialConditions) -> Self {
        self.ics = ics;
        self
    }

    pub fn series_terms(mut self, terms: usize) -> Self {
        self.series_terms = terms;
        self
    }

    pub fn x0(mut self, x0: impl Into<Expr>) -> Self {
        self.x0 = x0.into();
        self
    }

    /// Series keep at least one term per arbitrary constant.
    fn context(&self, order: usize) -> SolveContext {
        SolveContext {
            x0: self.x0.clone(),
            series_terms: self.series_terms.max(order),
            ..SolveContext::default()
        }
    }
}

impl From<Hint> for HintRequest {
    fn from(hint: Hint) -> Self {
        HintRequest::Hint(hint)
    }
}

/// Every classified hint with its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct AllSolutions {
    pub order: usize,
    pub default: Option<Hint>,
    pub best: Option<Vec<Equation>>,
    pub best_hint: Option<Hint>,
    pub results: BTreeMap<Hint, std::result::Result<Vec<Equation>, Unsolvable>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dsolved {
    Single(Equation),
    Many(Vec<Equation>),
    All(AllSolutions),
}

impl Dsolved {
    /// The solutions of a single request; empty for `All`.
    pub fn solutions(&self) -> Vec<Equation> {
        match self {
            Dsolved::Single(solution) => vec![solution.clone()],
            Dsolved::Many(solutions) => solutions.clone(),
            Dsolved::All(_) => Vec::new(),
        }
    }

    pub fn single(&self) -> Option<&Equation> {
        match self {
            Dsolved::Single(solution) => Some(solution),
            _ => None,
        }
    }
}

/// Solve `equation` for the unknown function `func`.
pub fn dsolve(equation: &Equation, func: &Expr, options: &DsolveOptions) -> Result<Dsolved> {
    let ode = Ode::new(equation, func)?;
    dsolve_ode(&ode, options)
}

pub fn dsolve_ode(ode: &Ode, options: &DsolveOptions) -> Result<Dsolved> {
    let context = options.context(ode.order);
    let classification = classify_ode(ode, &context);
    if classification.is_empty() {
        let all = matches!(options.hint, HintRequest::All | HintRequest::AllIntegral);
        return match derivative_branches(ode) {
            Some(branches) if !all => solve_branches(ode, &branches, options),
            _ => Err(OdeError::NoMatchingHint(ode.to_string())),
        };
    }
    debug!("dsolve {ode} with {}", options.hint);

    let solutions = match options.hint {
        HintRequest::All | HintRequest::AllIntegral => {
            if !options.ics.is_empty() {
                return Err(OdeError::InvalidInput(format!(
                    "initial conditions cannot be applied with hint {}",
                    options.hint
                )));
            }
            let integral = options.hint == HintRequest::AllIntegral;
            return Ok(Dsolved::All(solve_all(ode, &classification, &context, options.simplify, integral)));
        }
        HintRequest::Best => {
            let all = solve_all(ode, &classification, &context, options.simplify, false);
            match (all.best, all.best_hint) {
                (Some(best), Some(hint)) => {
                    debug!("best hint {hint}");
                    best
                }
                _ => return Err(first_failure(all.results)),
            }
        }
        HintRequest::Default => first_success(ode, &classification, &context, options.simplify)?,
        HintRequest::Hint(hint) => {
            if !classification.contains(hint) {
                return Err(OdeError::HintNotApplicable {
                    hint: hint.to_string(),
                    equation: ode.to_string(),
                });
            }
            solve_hint(ode, &classification, hint, &context, options.simplify)?
        }
    };

    finish(ode, solutions, &options.ics)
}

fn finish(ode: &Ode, solutions: Vec<Equation>, ics: &InitialConditions) -> Result<Dsolved> {
    let solutions = if ics.is_empty() {
        solutions
    } else {
        with_initial_conditions(ode, &solutions, ics)?
    };
    Ok(match <[Equation; 1]>::try_from(solutions) {
        Ok([solution]) => Dsolved::Single(solution),
        Err(solutions) => Dsolved::Many(solutions),
    })
}

/// A first order equation that is not linear in `f'`, split into one
/// equation `f' = g` per root `g`.
fn derivative_branches(ode: &Ode) -> Option<Vec<Ode>> {
    if ode.order != 1 {
        return None;
    }
    let slope = dummy(1);
    let roots = solve_for(&ode.to_symbols(&ode.expr), &slope);
    if roots.is_empty() || roots.iter().any(|g| g.has(&slope)) {
        return None;
    }
    roots
        .into_iter()
        .map(|g| Ode::from_expr(&ode.from_symbols(&(slope.clone() - g)), &ode.func).ok())
        .collect()
}

fn solve_branches(ode: &Ode, branches: &[Ode], options: &DsolveOptions) -> Result<Dsolved> {
    let per_branch = DsolveOptions {
        ics: InitialConditions::new(),
        ..options.clone()
    };
    let mut solutions: Vec<Equation> = Vec::new();
    for branch in branches {
        debug!("{ode}: solving branch {branch}");
        for solution in dsolve_ode(branch, &per_branch)?.solutions() {
            if !solutions.contains(&solution) {
                solutions.push(solution);
            }
        }
    }
    finish(ode, solutions, &options.ics)
}

/// Default solving for nested calls, e.g. after reducing the order.
pub(crate) fn solve_default(ode: &Ode, context: &SolveContext) -> Result<Vec<Equation>> {
    let classification = classify_ode(ode, context);
    if classification.is_empty() {
        return Err(OdeError::NoMatchingHint(ode.to_string()));
    }
    first_success(ode, &classification, context, true)
}

fn solve_hint(
    ode: &Ode,
    classification: &Classification,
    hint: Hint,
    context: &SolveContext,
    simplify: bool,
) -> std::result::Result<Vec<Equation>, Unsolvable> {
    let record = classification
        .match_record(hint)
        .ok_or_else(|| Unsolvable::new(format!("{hint} did not match")))?;
    let raw = solve_with(hint, ode, record, context)?;
    Ok(odesimp(ode, raw, hint, simplify))
}

/// Classified hints in order until one finishes.
fn first_success(
    ode: &Ode,
    classification: &Classification,
    context: &SolveContext,
    simplify: bool,
) -> Result<Vec<Equation>> {
    let mut failure = None;
    for &hint in &classification.hints {
        match solve_hint(ode, classification, hint, context, simplify) {
            Ok(solutions) => return Ok(solutions),
            Err(e) => {
                debug!("{hint} failed: {e}");
                failure.get_or_insert(e);
            }
        }
    }
    Err(match failure {
        Some(e) => OdeError::Unsolvable(e),
        None => OdeError::NoMatchingHint(ode.to_string()),
    })
}

fn first_failure(results: BTreeMap<Hint, std::result::Result<Vec<Equation>, Unsolvable>>) -> OdeError {
    results
        .into_values()
        .find_map(|r| r.err())
        .map(OdeError::Unsolvable)
        .unwrap_or_else(|| OdeError::Unsolvable(Unsolvable::new("no hint produced a solution")))
}

fn solve_all(
    ode: &Ode,
    classification: &Classification,
    context: &SolveContext,
    simplify: bool,
    integral_only: bool,
) -> AllSolutions {
    let hints = classification.hints.iter().copied().filter(|hint| {
        !integral_only || !hint.integral_variant().is_some_and(|i| classification.contains(i))
    });
    let mut results = BTreeMap::new();
    for hint in hints {
        let result = solve_hint(ode, classification, hint, context, simplify);
        if let Err(e) = &result {
            debug!("{hint}: {e}");
        }
        results.insert(hint, result);
    }
    let ranked = results
        .iter()
        .filter_map(|(hint, result)| result.as_ref().ok().map(|sols| (*hint, sols)))
        .filter_map(|(hint, sols)| rank(ode, sols).map(|r| (r, hint, sols)))
        .min_by(|a, b| a.0.cmp(&b.0));
    let (best, best_hint) = match ranked {
        Some((_, hint, sols)) => (Some(sols.clone()), Some(hint)),
        None => (None, None),
    };
    AllSolutions {
        order: classification.order,
        default: classification.default_hint(),
        best,
        best_hint,
        results,
    }
}

/// A list of solutions is as complex as its worst member.
fn rank(ode: &Ode, solutions: &[Equation]) -> Option<Simplicity> {
    solutions.iter().map(|s| ode_sol_simplicity(s, &ode.func)).max()
}

/// Apply the conditions to every solution that can satisfy them.
fn with_initial_conditions(ode: &Ode, solutions: &[Equation], ics: &InitialConditions) -> Result<Vec<Equation>> {
    let mut out = Vec::new();
    let mut failure = None;
    for solution in solutions {
        match solve_ics(ode, solution, ics) {
            Ok(particular) => {
                if !out.contains(&particular) {
                    out.push(particular);
                }
            }
            Err(e) => {
                debug!("{solution} rejected: {e}");
                failure.get_or_insert(e);
            }
        }
    }
    match (out.is_empty(), failure) {
        (true, Some(e)) => Err(e),
        _ => Ok(out),
    }
}

fn constants_of(solution: &Equation) -> Vec<String> {
    let mut names: Vec<String> = solution
        .lhs
        .free_symbols()
        .into_iter()
        .chain(solution.rhs.free_symbols())
        .filter(|s| is_constant_name(s))
        .collect();
    names.sort_by_key(|s| s[1..].parse::<usize>().unwrap_or(usize::MAX));
    names.dedup();
    names
}

/// `condition` on `solution` as an equation `e = 0` in the constants.
fn condition_equation(ode: &Ode, solution: &Equation, condition: &Condition) -> Result<Expr> {
    let explicit = solution.lhs == ode.func && !solution.rhs.has(&ode.func);
    let residual = if explicit {
        let value = differentiate_n(&solution.rhs, &ode.var, condition.order);
        substitute_symbol(&value, &ode.var, &condition.point) - condition.value.clone()
    } else if condition.order == 0 {
        let at = solution.residual();
        let at = crate::simplify::substitute(&at, &ode.func, &condition.value);
        substitute_symbol(&at, &ode.var, &condition.point)
    } else {
        return Err(OdeError::InitialConditions(format!(
            "derivative conditions need an explicit solution, got {solution}"
        )));
    };
    if is_singular(&residual) {
        return Err(OdeError::InitialConditions(format!(
            "{solution} is singular at {} = {}",
            ode.var, condition.point
        )));
    }
    Ok(simplify(&residual))
}

/// Solve the conditions for the arbitrary constants and substitute them.
fn solve_ics(ode: &Ode, solution: &Equation, ics: &InitialConditions) -> Result<Equation> {
    let constants = constants_of(solution);
    let equations = ics
        .entries()
        .iter()
        .map(|c| condition_equation(ode, solution, c))
        .collect::<Result<Vec<_>>>()?;
    if equations.iter().all(is_identically_zero) {
        if constants.is_empty() {
            return Ok(solution.clone());
        }
        return Err(OdeError::InitialConditions(format!(
            "conditions do not determine any constant of {solution}"
        )));
    }
    if constants.is_empty() {
        return Err(OdeError::InitialConditions(format!("{solution} has no free constants")));
    }

    let values = match solve_linear_system(&equations, &constants) {
        LinearResult::Unique(found) => found.pairs(),
        LinearResult::Infinite(family) => family
            .variables
            .iter()
            .zip(family.particular.iter())
            .filter(|(name, _)| !family.free_variables.contains(name))
            .map(|(name, value)| (Expr::symbol(name.clone()), value.clone()))
            .collect(),
        LinearResult::Inconsistent(_) => {
            return Err(OdeError::InitialConditions(format!(
                "no choice of constants in {solution} satisfies the conditions"
            )))
        }
        LinearResult::NonLinear(_) => eliminate(&equations, &constants, solution)?,
    };

    let mut particular = solution.clone();
    for (name, value) in &values {
        if let Some(name) = name.as_symbol() {
            particular = particular.map(|side| substitute_symbol(side, name, value));
        }
    }
    let particular = particular.map(simplify);
    // Inverting even powers and roots can introduce values that fit the
    // squared equation only.
    for condition in ics.entries() {
        let residual = condition_equation(ode, &particular, condition)?;
        if !is_identically_zero(&residual) {
            return Err(OdeError::InitialConditions(format!(
                "{particular} misses the order {} condition at {} by {residual}",
                condition.order, condition.point
            )));
        }
    }
    let particular = constant_renumber(&particular);
    debug!("{solution} with conditions: {particular}");
    Ok(particular)
}

/// One equation at a time, each solved for a constant it contains.
fn eliminate(equations: &[Expr], constants: &[String], solution: &Equation) -> Result<Vec<(Expr, Expr)>> {
    let mut pending: Vec<Expr> = equations.to_vec();
    let mut values: Vec<(Expr, Expr)> = Vec::new();
    while let Some(equation) = pending.pop() {
        if is_identically_zero(&equation) {
            continue;
        }
        let Some(name) = constants.iter().find(|c| equation.has_symbol(c)) else {
            return Err(OdeError::InitialConditions(format!(
                "no choice of constants in {solution} satisfies the conditions"
            )));
        };
        let target = Expr::symbol(name.clone());
        let roots = solve_for(&equation, &target);
        let value = match roots.as_slice() {
            [value] => value.clone(),
            [] => {
                return Err(OdeError::InitialConditions(format!("cannot solve {equation} = 0 for {name}")))
            }
            _ => {
                warn!("{} values of {name} satisfy {equation} = 0", roots.len());
                return Err(OdeError::InitialConditions(format!(
                    "conditions allow several values of {name}"
                )));
            }
        };
        pending = pending.iter().map(|e| simplify(&substitute_symbol(e, name, &value))).collect();
        values = values
            .into_iter()
            .map(|(c, v)| (c, simplify(&substitute_symbol(&v, name, &value))))
            .collect();
        values.push((target, value));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;

    #[test]
    fn parses_requests() {
        assert_eq!("all_Integral".parse::<HintRequest>(), Ok(HintRequest::AllIntegral));
        assert_eq!(
            "separable".parse::<HintRequest>(),
            Ok(HintRequest::Hint(Hint::Separable))
        );
        assert!("nonsense".parse::<HintRequest>().is_err());
    }

    #[test]
    fn constants_sorted_by_index() {
        let solution = Equation::new(
            parse_expr("f(x)").expect("parse"),
            parse_expr("C10*x + C2").expect("parse"),
        );
        assert_eq!(constants_of(&solution), vec!["C2".to_string(), "C10".to_string()]);
    }
}
