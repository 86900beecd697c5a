//! Error types for heston-rs.
//!
//! A single `thiserror`-derived enum carries the three failure families of
//! the pricing stack (domain, numerical, calibration) plus argument parsing
//! errors. The `ensure!`, `ensure_post!` and `fail!` macros defined here are
//! the short forms used throughout the workspace.

use thiserror::Error;

/// The top-level error type used throughout heston-rs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// An input violates a model invariant (negative variance, `|rho| > 1`,
    /// non-positive spot, strike or maturity, ...). Raised before any
    /// integration is attempted.
    #[error("domain error: {0}")]
    Domain(String),

    /// Quadrature failed to converge within its budget, or a computation
    /// produced a non-finite value.
    #[error("numerical error: {0}")]
    Numerical(String),

    /// A quote basket cannot be calibrated against (zero or non-finite
    /// market price, empty basket).
    #[error("calibration error: {0}")]
    Calibration(String),

    /// Invalid argument (unparseable option type, malformed bounds, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// `true` for [`Error::Domain`].
    pub fn is_domain(&self) -> bool {
        matches!(self, Error::Domain(_))
    }

    /// `true` for [`Error::Numerical`].
    pub fn is_numerical(&self) -> bool {
        matches!(self, Error::Numerical(_))
    }

    /// `true` for [`Error::Calibration`].
    pub fn is_calibration(&self) -> bool {
        matches!(self, Error::Calibration(_))
    }
}

/// Shorthand `Result` type used throughout heston-rs.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Input precondition.
///
/// Returns `Err(Error::Domain(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use heston_core::{ensure, errors::Error};
/// fn positive(x: f64) -> heston_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).unwrap_err().is_domain());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Domain(
                format!($($msg)*)
            ));
        }
    };
}

/// Result postcondition.
///
/// Returns `Err(Error::Numerical(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use heston_core::{ensure_post, errors::Error};
/// fn compute(x: f64) -> heston_core::errors::Result<f64> {
///     let result = x.ln();
///     ensure_post!(result.is_finite(), "ln({x}) is not finite");
///     Ok(result)
/// }
/// assert!(compute(1.0).is_ok());
/// assert!(compute(0.0).unwrap_err().is_numerical());
/// ```
#[macro_export]
macro_rules! ensure_post {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Numerical(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Numerical(...))` immediately.
///
/// # Example
/// ```
/// use heston_core::{fail, errors::Error};
/// fn always_err() -> heston_core::errors::Result<()> {
///     fail!("integration diverged");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Numerical(format!($($msg)*)))
    };
}
