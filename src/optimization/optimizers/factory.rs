//! optimizers::factory — name-based strategy lookup.
//!
//! Purpose
//! -------
//! Map a caller-supplied optimizer name to one of the concrete strategies.
//!
//! Key behaviors
//! -------------
//! - Exact, case-insensitive aliases are tried first (`"tnc"`,
//!   `"l-bfgs-b"`, `"nelder-mead"`, ...).
//! - Otherwise the name is matched as a case-insensitive substring of the
//!   canonical keys `fmin_tnc`, `simplex` and `lbfgsb`. Exactly one match
//!   is accepted; several matches are reported as ambiguous.
//!
//! Conventions
//! -----------
//! - [`Strategy`] implements [`Optimizer`] by dispatching to the unit
//!   struct behind each variant, so callers can hold a resolved strategy
//!   by value.
use std::{fmt, str::FromStr};

use crate::optimization::{
    errors::{OptError, OptResult},
    optimizers::{
        lbfgsb::LBfgsB,
        simplex::NelderMead,
        tnc::Tnc,
        traits::{OptimizationRequest, Optimizer, Solution},
    },
};

/// Closed set of available optimization strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Tnc,
    LBfgsB,
    NelderMead,
}

impl Strategy {
    /// Every strategy, in canonical-key order.
    pub const ALL: [Strategy; 3] = [Strategy::Tnc, Strategy::NelderMead, Strategy::LBfgsB];

    /// Canonical lookup key.
    pub fn key(&self) -> &'static str {
        match self {
            Strategy::Tnc => "fmin_tnc",
            Strategy::NelderMead => "simplex",
            Strategy::LBfgsB => "lbfgsb",
        }
    }

    fn from_alias(name: &str) -> Option<Self> {
        match name {
            "tnc" | "fmin_tnc" => Some(Strategy::Tnc),
            "lbfgsb" | "l-bfgs-b" | "l_bfgs_b" | "fmin_l_bfgs_b" => Some(Strategy::LBfgsB),
            "simplex" | "nelder-mead" | "nelder_mead" | "neldermead" | "fmin" => {
                Some(Strategy::NelderMead)
            }
            _ => None,
        }
    }

    fn engine(&self) -> &'static dyn Optimizer {
        match self {
            Strategy::Tnc => &Tnc,
            Strategy::LBfgsB => &LBfgsB,
            Strategy::NelderMead => &NelderMead,
        }
    }
}

impl FromStr for Strategy {
    type Err = OptError;

    /// Resolve a strategy from a name (case-insensitive).
    ///
    /// Any name that is neither an alias nor a substring of exactly one
    /// canonical key returns [`OptError::UnknownOptimizer`] or
    /// [`OptError::AmbiguousOptimizer`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        if let Some(strategy) = Self::from_alias(&name) {
            return Ok(strategy);
        }
        let matches: Vec<Strategy> = if name.is_empty() {
            Vec::new()
        } else {
            Self::ALL.into_iter().filter(|strategy| strategy.key().contains(&name)).collect()
        };
        match matches.as_slice() {
            [strategy] => Ok(*strategy),
            [] => Err(OptError::UnknownOptimizer { name: s.to_string() }),
            _ => Err(OptError::AmbiguousOptimizer {
                name: s.to_string(),
                candidates: matches.iter().map(Strategy::key).collect(),
            }),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Optimizer for Strategy {
    fn name(&self) -> &'static str {
        self.engine().name()
    }

    fn optimize(&self, request: &OptimizationRequest<'_>) -> OptResult<Solution> {
        self.engine().optimize(request)
    }
}

/// Look up a strategy by name.
///
/// # Errors
/// [`OptError::UnknownOptimizer`] or [`OptError::AmbiguousOptimizer`].
pub fn get_optimizer(name: &str) -> OptResult<Strategy> {
    name.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::optimizers::{lbfgsb::LBFGSB_NAME, simplex::SIMPLEX_NAME, tnc::TNC_NAME};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover alias resolution, substring matching, the ambiguity
    // and unknown-name errors, and name dispatch.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Lookups are case-insensitive and every alias resolves.
    fn aliases_resolve_case_insensitively() {
        for name in ["TNC", "tnc", "fmin_tnc", "Fmin_TNC"] {
            assert_eq!(get_optimizer(name).unwrap(), Strategy::Tnc, "{name}");
        }
        for name in ["lbfgsb", "L-BFGS-B", "l_bfgs_b", "fmin_l_bfgs_b"] {
            assert_eq!(get_optimizer(name).unwrap(), Strategy::LBfgsB, "{name}");
        }
        for name in ["simplex", "Nelder-Mead", "nelder_mead", "NelderMead", "fmin"] {
            assert_eq!(get_optimizer(name).unwrap(), Strategy::NelderMead, "{name}");
        }
    }

    #[test]
    // Purpose
    // -------
    // A name contained in exactly one canonical key resolves to it.
    fn unique_substring_resolves() {
        assert_eq!(get_optimizer("plex").unwrap(), Strategy::NelderMead);
        assert_eq!(get_optimizer("bfgs").unwrap(), Strategy::LBfgsB);
        assert_eq!(get_optimizer("min_t").unwrap(), Strategy::Tnc);
    }

    #[test]
    // Purpose
    // -------
    // A substring shared by several keys is ambiguous and lists them.
    //
    // Given
    // -----
    // - "f" occurs in both "fmin_tnc" and "lbfgsb".
    fn shared_substring_is_ambiguous() {
        match get_optimizer("f") {
            Err(OptError::AmbiguousOptimizer { name, candidates }) => {
                assert_eq!(name, "f");
                assert_eq!(candidates, vec!["fmin_tnc", "lbfgsb"]);
            }
            other => panic!("Expected AmbiguousOptimizer, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Unmatched and empty names fail with the lookup error carrying the name.
    fn unknown_names_fail() {
        assert_eq!(
            get_optimizer("conjugate-gradient"),
            Err(OptError::UnknownOptimizer { name: "conjugate-gradient".to_string() })
        );
        assert!(matches!(get_optimizer(""), Err(OptError::UnknownOptimizer { .. })));
    }

    #[test]
    // Purpose
    // -------
    // A resolved strategy reports the engine's display name.
    fn strategy_dispatches_names() {
        assert_eq!(Strategy::Tnc.name(), TNC_NAME);
        assert_eq!(Strategy::LBfgsB.name(), LBFGSB_NAME);
        assert_eq!(Strategy::NelderMead.name(), SIMPLEX_NAME);
        assert_eq!(Strategy::NelderMead.to_string(), "simplex");
    }
}
