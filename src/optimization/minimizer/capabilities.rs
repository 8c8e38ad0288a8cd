//! minimizer::capabilities — method tags and what each method accepts.
//!
//! A minimizer is one data structure plus a [`Method`] tag. The tag decides
//! which backend runs and which optional inputs (bounds, constraints,
//! jacobian) are honored; [`Capabilities`] is the lookup table.
use std::{fmt, str::FromStr};

use crate::optimization::errors::OptError;

/// Which external routine a minimizer dispatches to.
///
/// Parsing:
/// `FromStr` accepts the conventional names case-insensitively:
/// `"BFGS"`, `"Nelder-Mead"`, `"SLSQP"`, `"L-BFGS-B"`, `"MINPACK"`
/// (separators `-`/`_` optional).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Bfgs,
    NelderMead,
    Slsqp,
    LBfgsB,
    Minpack,
}

/// Optional inputs a method can consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub bounded: bool,
    pub constrained: bool,
    pub gradient: bool,
    /// `true` when the objective returns a residual vector instead of a scalar.
    pub least_squares: bool,
}

impl Method {
    pub const ALL: [Method; 5] =
        [Method::Bfgs, Method::NelderMead, Method::Slsqp, Method::LBfgsB, Method::Minpack];

    /// Conventional method name.
    pub fn name(self) -> &'static str {
        match self {
            Method::Bfgs => "BFGS",
            Method::NelderMead => "Nelder-Mead",
            Method::Slsqp => "SLSQP",
            Method::LBfgsB => "L-BFGS-B",
            Method::Minpack => "MINPACK",
        }
    }

    pub fn capabilities(self) -> Capabilities {
        match self {
            Method::Bfgs => Capabilities {
                bounded: false,
                constrained: false,
                gradient: true,
                least_squares: false,
            },
            Method::NelderMead => Capabilities {
                bounded: false,
                constrained: false,
                gradient: false,
                least_squares: false,
            },
            Method::Slsqp => Capabilities {
                bounded: true,
                constrained: true,
                gradient: true,
                least_squares: false,
            },
            Method::LBfgsB => Capabilities {
                bounded: true,
                constrained: false,
                gradient: true,
                least_squares: false,
            },
            Method::Minpack => Capabilities {
                bounded: true,
                constrained: false,
                gradient: true,
                least_squares: true,
            },
        }
    }

    pub fn is_bounded(self) -> bool {
        self.capabilities().bounded
    }

    pub fn is_constrained(self) -> bool {
        self.capabilities().constrained
    }

    pub fn accepts_jacobian(self) -> bool {
        self.capabilities().gradient
    }

    pub fn is_least_squares(self) -> bool {
        self.capabilities().least_squares
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String =
            s.chars().filter(|c| *c != '-' && *c != '_').collect::<String>().to_lowercase();
        match key.as_str() {
            "bfgs" => Ok(Method::Bfgs),
            "neldermead" => Ok(Method::NelderMead),
            "slsqp" => Ok(Method::Slsqp),
            "lbfgsb" => Ok(Method::LBfgsB),
            "minpack" | "leastsq" => Ok(Method::Minpack),
            _ => Err(OptError::InvalidMethod {
                name: s.to_string(),
                reason: "Valid options are 'BFGS', 'Nelder-Mead', 'SLSQP', 'L-BFGS-B' or 'MINPACK'.",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back_to_the_same_method() {
        for method in Method::ALL {
            assert_eq!(method.name().parse::<Method>().unwrap(), method);
        }
        assert_eq!("l_bfgs_b".parse::<Method>().unwrap(), Method::LBfgsB);
        assert_eq!("nelder-mead".parse::<Method>().unwrap(), Method::NelderMead);
    }

    #[test]
    fn unknown_method_is_a_configuration_error() {
        let err = "newton".parse::<Method>().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    // Purpose
    // -------
    // The capability table matches the method family: only SLSQP takes
    // constraints, Nelder-Mead takes no jacobian, MINPACK is the only
    // least-squares method.
    fn capability_table_matches_method_family() {
        assert!(Method::Slsqp.is_constrained());
        assert!(Method::Slsqp.is_bounded());
        assert!(Method::LBfgsB.is_bounded() && !Method::LBfgsB.is_constrained());
        assert!(!Method::Bfgs.is_bounded());
        assert!(!Method::NelderMead.accepts_jacobian());
        assert!(Method::Minpack.is_least_squares() && Method::Minpack.is_bounded());
        assert_eq!(Method::ALL.iter().filter(|m| m.is_least_squares()).count(), 1);
    }
}
