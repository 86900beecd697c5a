//! Call / put selector.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::Real;

/// Option type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    /// A call option (right to buy).
    Call,
    /// A put option (right to sell).
    Put,
}

impl OptionType {
    /// +1 for Call, −1 for Put.
    pub fn sign(self) -> Real {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

impl FromStr for OptionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" => Ok(OptionType::Call),
            "put" => Ok(OptionType::Put),
            other => Err(Error::InvalidArgument(format!(
                "unknown option type '{other}', expected 'call' or 'put'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("call".parse::<OptionType>().unwrap(), OptionType::Call);
        assert_eq!(" PUT ".parse::<OptionType>().unwrap(), OptionType::Put);
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "straddle".parse::<OptionType>().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn sign_and_display() {
        assert_eq!(OptionType::Call.sign(), 1.0);
        assert_eq!(OptionType::Put.sign(), -1.0);
        assert_eq!(OptionType::Put.to_string(), "put");
    }
}
