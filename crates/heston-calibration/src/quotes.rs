//! Market quotes and the validated basket handed to the calibrator.

use heston_core::{
    ensure,
    errors::{Error, Result},
    Price, Rate, Time,
};
use heston_models::{CalibrationGuess, ModelParameters};
use serde::{Deserialize, Serialize};

/// One observed European call.
///
/// Serialized with the short field names `{s, r, t, k, c}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    /// Spot price.
    #[serde(rename = "s")]
    pub spot: Price,
    /// Continuously compounded risk-free rate.
    #[serde(rename = "r")]
    pub rate: Rate,
    /// Time to maturity in years.
    #[serde(rename = "t")]
    pub maturity: Time,
    /// Strike.
    #[serde(rename = "k")]
    pub strike: Price,
    /// Observed call price.
    #[serde(rename = "c")]
    pub market_price: Price,
}

impl MarketQuote {
    /// Create a quote. Not validated; see [`MarketQuote::validate`].
    pub fn new(spot: Price, rate: Rate, maturity: Time, strike: Price, market_price: Price) -> Self {
        Self {
            spot,
            rate,
            maturity,
            strike,
            market_price,
        }
    }

    /// A zero, negative or non-finite market price is an
    /// `Error::Calibration` (relative errors are undefined); any other bad
    /// field is an `Error::Domain`.
    pub fn validate(&self) -> Result<()> {
        if !(self.market_price > 0.0 && self.market_price.is_finite()) {
            return Err(Error::Calibration(format!(
                "market price must be positive and finite, got {}",
                self.market_price
            )));
        }
        ensure!(
            self.spot > 0.0 && self.spot.is_finite(),
            "quote spot must be positive and finite, got {}",
            self.spot
        );
        ensure!(
            self.strike > 0.0 && self.strike.is_finite(),
            "quote strike must be positive and finite, got {}",
            self.strike
        );
        ensure!(
            self.maturity > 0.0 && self.maturity.is_finite(),
            "quote maturity must be positive and finite, got {}",
            self.maturity
        );
        ensure!(self.rate.is_finite(), "quote rate must be finite, got {}", self.rate);
        Ok(())
    }

    /// Pricing inputs for this quote under `guess`.
    pub fn parameters(&self, guess: &CalibrationGuess) -> Result<ModelParameters> {
        ModelParameters::new(
            self.spot,
            self.strike,
            self.maturity,
            guess.v,
            self.rate,
            guess.theta,
            guess.kappa,
            guess.sigma,
            guess.rho,
        )
    }
}

/// A non-empty, validated, read-only collection of quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<MarketQuote>", into = "Vec<MarketQuote>")]
pub struct QuoteBasket {
    quotes: Vec<MarketQuote>,
}

impl QuoteBasket {
    /// Validate every quote. The first offending quote is reported with its
    /// position.
    pub fn new(quotes: Vec<MarketQuote>) -> Result<Self> {
        if quotes.is_empty() {
            return Err(Error::Calibration("quote basket is empty".into()));
        }
        for (i, q) in quotes.iter().enumerate() {
            q.validate().map_err(|e| match e {
                Error::Calibration(msg) => Error::Calibration(format!("quote {i}: {msg}")),
                Error::Domain(msg) => Error::Domain(format!("quote {i}: {msg}")),
                other => other,
            })?;
        }
        Ok(Self { quotes })
    }

    /// The quotes in input order.
    pub fn quotes(&self) -> &[MarketQuote] {
        &self.quotes
    }

    /// Number of quotes.
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Always `false` for a constructed basket.
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Iterator over the quotes.
    pub fn iter(&self) -> std::slice::Iter<'_, MarketQuote> {
        self.quotes.iter()
    }
}

impl TryFrom<Vec<MarketQuote>> for QuoteBasket {
    type Error = Error;

    fn try_from(quotes: Vec<MarketQuote>) -> Result<Self> {
        Self::new(quotes)
    }
}

impl From<QuoteBasket> for Vec<MarketQuote> {
    fn from(basket: QuoteBasket) -> Self {
        basket.quotes
    }
}

impl<'a> IntoIterator for &'a QuoteBasket {
    type Item = &'a MarketQuote;
    type IntoIter = std::slice::Iter<'a, MarketQuote>;

    fn into_iter(self) -> Self::IntoIter {
        self.quotes.iter()
    }
}
