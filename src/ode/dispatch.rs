use log::debug;

use crate::error::Unsolvable;
use crate::expr::{Equation, Expr};
use crate::ode::hints::Hint;
use crate::ode::matcher::MatchRecord;
use crate::ode::normalize::Ode;
use crate::ode::solvers::{
    algebraic, euler, exact, first_order, homogeneous, lie, linear_constant, liouville, reducible,
    riccati, series,
};

/// Default number of terms in power series solutions.
pub const DEFAULT_SERIES_TERMS: usize = 6;

/// Settings shared by classification and the solver routines.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveContext {
    /// Expansion point of power series solutions.
    pub x0: Expr,
    pub series_terms: usize,
    /// Evaluate integrals while solving; off for `_Integral` hints.
    pub evaluate_integrals: bool,
}

impl Default for SolveContext {
    fn default() -> Self {
        SolveContext {
            x0: Expr::integer(0),
            series_terms: DEFAULT_SERIES_TERMS,
            evaluate_integrals: true,
        }
    }
}

impl SolveContext {
    pub(crate) fn for_hint(&self, hint: Hint) -> SolveContext {
        SolveContext {
            evaluate_integrals: !hint.is_integral(),
            ..self.clone()
        }
    }
}

pub(crate) type Routine = fn(&Ode, &MatchRecord, &SolveContext) -> Result<Vec<Equation>, Unsolvable>;

/// The routine behind a hint. `_Integral` hints share their base routine.
pub(crate) fn routine(hint: Hint) -> Routine {
    match hint {
        Hint::NthAlgebraic | Hint::NthAlgebraicIntegral => algebraic::solve,
        Hint::Separable | Hint::SeparableIntegral => first_order::separable,
        Hint::FirstExact | Hint::FirstExactIntegral => exact::solve,
        Hint::FirstLinear | Hint::FirstLinearIntegral => first_order::linear,
        Hint::Bernoulli | Hint::BernoulliIntegral => first_order::bernoulli,
        Hint::RiccatiSpecialMinus2 => riccati::solve,
        Hint::FirstHomogeneousCoeffBest => homogeneous::best,
        Hint::FirstHomogeneousCoeffSubsIndepDivDep
        | Hint::FirstHomogeneousCoeffSubsIndepDivDepIntegral => homogeneous::indep_div_dep,
        Hint::FirstHomogeneousCoeffSubsDepDivIndep
        | Hint::FirstHomogeneousCoeffSubsDepDivIndepIntegral => homogeneous::dep_div_indep,
        Hint::AlmostLinear | Hint::AlmostLinearIntegral => first_order::almost_linear,
        Hint::LinearCoefficients | Hint::LinearCoefficientsIntegral => homogeneous::linear_coefficients,
        Hint::SeparableReduced | Hint::SeparableReducedIntegral => first_order::separable_reduced,
        Hint::FirstPowerSeries => series::first_order,
        Hint::LieGroup => lie::solve,
        Hint::NthLinearConstantCoeffHomogeneous => linear_constant::homogeneous,
        Hint::NthLinearEulerEqHomogeneous => euler::homogeneous,
        Hint::NthLinearConstantCoeffUndeterminedCoefficients => {
            linear_constant::undetermined_coefficients
        }
        Hint::NthLinearEulerEqNonhomogeneousUndeterminedCoefficients => {
            euler::undetermined_coefficients
        }
        Hint::NthLinearConstantCoeffVariationOfParameters
        | Hint::NthLinearConstantCoeffVariationOfParametersIntegral => {
            linear_constant::variation_of_parameters
        }
        Hint::NthLinearEulerEqNonhomogeneousVariationOfParameters
        | Hint::NthLinearEulerEqNonhomogeneousVariationOfParametersIntegral => {
            euler::variation_of_parameters
        }
        Hint::Liouville | Hint::LiouvilleIntegral => liouville::solve,
        Hint::SecondPowerSeriesOrdinary => series::second_order_ordinary,
        Hint::SecondPowerSeriesRegular => series::second_order_regular,
        Hint::NthOrderReducible => reducible::solve,
    }
}

/// Run the routine for `hint` on the matched equation. The returned
/// solutions are raw: integrals may be pending and constants unmerged.
pub(crate) fn solve_with(
    hint: Hint,
    ode: &Ode,
    record: &MatchRecord,
    context: &SolveContext,
) -> Result<Vec<Equation>, Unsolvable> {
    debug!("solving {ode} with {hint}");
    let context = context.for_hint(hint);
    let solutions = routine(hint)(ode, record, &context)?;
    if solutions.is_empty() {
        return Err(Unsolvable::new(format!("{hint} produced no solution")));
    }
    Ok(solutions)
}
