use std::fmt;
use std::str::FromStr;

use crate::error::OdeError;

/// Solving strategies, in the order they are preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hint {
    NthAlgebraic,
    Separable,
    FirstExact,
    FirstLinear,
    Bernoulli,
    RiccatiSpecialMinus2,
    FirstHomogeneousCoeffBest,
    FirstHomogeneousCoeffSubsIndepDivDep,
    FirstHomogeneousCoeffSubsDepDivIndep,
    AlmostLinear,
    LinearCoefficients,
    SeparableReduced,
    FirstPowerSeries,
    LieGroup,
    NthLinearConstantCoeffHomogeneous,
    NthLinearEulerEqHomogeneous,
    NthLinearConstantCoeffUndeterminedCoefficients,
    NthLinearEulerEqNonhomogeneousUndeterminedCoefficients,
    NthLinearConstantCoeffVariationOfParameters,
    NthLinearEulerEqNonhomogeneousVariationOfParameters,
    Liouville,
    SecondPowerSeriesOrdinary,
    SecondPowerSeriesRegular,
    NthOrderReducible,
    NthAlgebraicIntegral,
    SeparableIntegral,
    FirstExactIntegral,
    FirstLinearIntegral,
    BernoulliIntegral,
    FirstHomogeneousCoeffSubsIndepDivDepIntegral,
    FirstHomogeneousCoeffSubsDepDivIndepIntegral,
    AlmostLinearIntegral,
    LinearCoefficientsIntegral,
    SeparableReducedIntegral,
    NthLinearConstantCoeffVariationOfParametersIntegral,
    NthLinearEulerEqNonhomogeneousVariationOfParametersIntegral,
    LiouvilleIntegral,
}

/// Every hint, simplest and fastest first. Classification results are
/// sub-sequences of this list.
pub const ALL_HINTS: [Hint; 37] = [
    Hint::NthAlgebraic,
    Hint::Separable,
    Hint::FirstExact,
    Hint::FirstLinear,
    Hint::Bernoulli,
    Hint::RiccatiSpecialMinus2,
    Hint::FirstHomogeneousCoeffBest,
    Hint::FirstHomogeneousCoeffSubsIndepDivDep,
    Hint::FirstHomogeneousCoeffSubsDepDivIndep,
    Hint::AlmostLinear,
    Hint::LinearCoefficients,
    Hint::SeparableReduced,
    Hint::FirstPowerSeries,
    Hint::LieGroup,
    Hint::NthLinearConstantCoeffHomogeneous,
    Hint::NthLinearEulerEqHomogeneous,
    Hint::NthLinearConstantCoeffUndeterminedCoefficients,
    Hint::NthLinearEulerEqNonhomogeneousUndeterminedCoefficients,
    Hint::NthLinearConstantCoeffVariationOfParameters,
    Hint::NthLinearEulerEqNonhomogeneousVariationOfParameters,
    Hint::Liouville,
    Hint::SecondPowerSeriesOrdinary,
    Hint::SecondPowerSeriesRegular,
    Hint::NthOrderReducible,
    Hint::NthAlgebraicIntegral,
    Hint::SeparableIntegral,
    Hint::FirstExactIntegral,
    Hint::FirstLinearIntegral,
    Hint::BernoulliIntegral,
    Hint::FirstHomogeneousCoeffSubsIndepDivDepIntegral,
    Hint::FirstHomogeneousCoeffSubsDepDivIndepIntegral,
    Hint::AlmostLinearIntegral,
    Hint::LinearCoefficientsIntegral,
    Hint::SeparableReducedIntegral,
    Hint::NthLinearConstantCoeffVariationOfParametersIntegral,
    Hint::NthLinearEulerEqNonhomogeneousVariationOfParametersIntegral,
    Hint::LiouvilleIntegral,
];

/// Pairs of a method and its variant that leaves the last integral alone.
const INTEGRAL_VARIANTS: [(Hint, Hint); 13] = [
    (Hint::NthAlgebraic, Hint::NthAlgebraicIntegral),
    (Hint::Separable, Hint::SeparableIntegral),
    (Hint::FirstExact, Hint::FirstExactIntegral),
    (Hint::FirstLinear, Hint::FirstLinearIntegral),
    (Hint::Bernoulli, Hint::BernoulliIntegral),
    (
        Hint::FirstHomogeneousCoeffSubsIndepDivDep,
        Hint::FirstHomogeneousCoeffSubsIndepDivDepIntegral,
    ),
    (
        Hint::FirstHomogeneousCoeffSubsDepDivIndep,
        Hint::FirstHomogeneousCoeffSubsDepDivIndepIntegral,
    ),
    (Hint::AlmostLinear, Hint::AlmostLinearIntegral),
    (Hint::LinearCoefficients, Hint::LinearCoefficientsIntegral),
    (Hint::SeparableReduced, Hint::SeparableReducedIntegral),
    (
        Hint::NthLinearConstantCoeffVariationOfParameters,
        Hint::NthLinearConstantCoeffVariationOfParametersIntegral,
    ),
    (
        Hint::NthLinearEulerEqNonhomogeneousVariationOfParameters,
        Hint::NthLinearEulerEqNonhomogeneousVariationOfParametersIntegral,
    ),
    (Hint::Liouville, Hint::LiouvilleIntegral),
];

impl Hint {
    pub fn name(self) -> &'static str {
        match self {
            Hint::NthAlgebraic => "nth_algebraic",
            Hint::Separable => "separable",
            Hint::FirstExact => "1st_exact",
            Hint::FirstLinear => "1st_linear",
            Hint::Bernoulli => "Bernoulli",
            Hint::RiccatiSpecialMinus2 => "Riccati_special_minus2",
            Hint::FirstHomogeneousCoeffBest => "1st_homogeneous_coeff_best",
            Hint::FirstHomogeneousCoeffSubsIndepDivDep => "1st_homogeneous_coeff_subs_indep_div_dep",
            Hint::FirstHomogeneousCoeffSubsDepDivIndep => "1st_homogeneous_coeff_subs_dep_div_indep",
            Hint::AlmostLinear => "almost_linear",
            Hint::LinearCoefficients => "linear_coefficients",
            Hint::SeparableReduced => "separable_reduced",
            Hint::FirstPowerSeries => "1st_power_series",
            Hint::LieGroup => "lie_group",
            Hint::NthLinearConstantCoeffHomogeneous => "nth_linear_constant_coeff_homogeneous",
            Hint::NthLinearEulerEqHomogeneous => "nth_linear_euler_eq_homogeneous",
            Hint::NthLinearConstantCoeffUndeterminedCoefficients => {
                "nth_linear_constant_coeff_undetermined_coefficients"
            }
            Hint::NthLinearEulerEqNonhomogeneousUndeterminedCoefficients => {
                "nth_linear_euler_eq_nonhomogeneous_undetermined_coefficients"
            }
            Hint::NthLinearConstantCoeffVariationOfParameters => {
                "nth_linear_constant_coeff_variation_of_parameters"
            }
            Hint::NthLinearEulerEqNonhomogeneousVariationOfParameters => {
                "nth_linear_euler_eq_nonhomogeneous_variation_of_parameters"
            }
            Hint::Liouville => "Liouville",
            Hint::SecondPowerSeriesOrdinary => "2nd_power_series_ordinary",
            Hint::SecondPowerSeriesRegular => "2nd_power_series_regular",
            Hint::NthOrderReducible => "nth_order_reducible",
            Hint::NthAlgebraicIntegral => "nth_algebraic_Integral",
            Hint::SeparableIntegral => "separable_Integral",
            Hint::FirstExactIntegral => "1st_exact_Integral",
            Hint::FirstLinearIntegral => "1st_linear_Integral",
            Hint::BernoulliIntegral => "Bernoulli_Integral",
            Hint::FirstHomogeneousCoeffSubsIndepDivDepIntegral => {
                "1st_homogeneous_coeff_subs_indep_div_dep_Integral"
            }
            Hint::FirstHomogeneousCoeffSubsDepDivIndepIntegral => {
                "1st_homogeneous_coeff_subs_dep_div_indep_Integral"
            }
            Hint::AlmostLinearIntegral => "almost_linear_Integral",
            Hint::LinearCoefficientsIntegral => "linear_coefficients_Integral",
            Hint::SeparableReducedIntegral => "separable_reduced_Integral",
            Hint::NthLinearConstantCoeffVariationOfParametersIntegral => {
                "nth_linear_constant_coeff_variation_of_parameters_Integral"
            }
            Hint::NthLinearEulerEqNonhomogeneousVariationOfParametersIntegral => {
                "nth_linear_euler_eq_nonhomogeneous_variation_of_parameters_Integral"
            }
            Hint::LiouvilleIntegral => "Liouville_Integral",
        }
    }

    /// The `_Integral` counterpart, if this method has one.
    pub fn integral_variant(self) -> Option<Hint> {
        INTEGRAL_VARIANTS
            .iter()
            .find(|(base, _)| *base == self)
            .map(|(_, integral)| *integral)
    }

    /// The method an `_Integral` hint shares its routine with; other hints
    /// map to themselves.
    pub fn base(self) -> Hint {
        INTEGRAL_VARIANTS
            .iter()
            .find(|(_, integral)| *integral == self)
            .map(|(base, _)| *base)
            .unwrap_or(self)
    }

    pub fn is_integral(self) -> bool {
        self.base() != self
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Hint {
    type Err = OdeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_HINTS
            .iter()
            .copied()
            .find(|h| h.name() == s)
            .ok_or_else(|| OdeError::InvalidInput(format!("unknown hint `{s}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn names_are_unique_and_parse_back() {
        let names: BTreeSet<&str> = ALL_HINTS.iter().map(|h| h.name()).collect();
        assert_eq!(names.len(), ALL_HINTS.len());
        for hint in ALL_HINTS {
            assert_eq!(hint.name().parse::<Hint>(), Ok(hint));
        }
    }

    #[test]
    fn integral_variants_share_their_base() {
        for hint in ALL_HINTS {
            if let Some(integral) = hint.integral_variant() {
                assert_eq!(integral.name(), format!("{}_Integral", hint.name()));
                assert_eq!(integral.base(), hint);
                assert!(integral.is_integral());
            }
        }
        assert!(Hint::LieGroup.integral_variant().is_none());
    }
}
