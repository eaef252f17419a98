use std::fmt;

use bitcoin::Amount;
use spice_math::floor_to_u64;

use crate::{error::EstimateError, size::SizeEstimate};

/// Fee rate in sat/vB. Zero is allowed and means "no priority".
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct FeeRate(f64);

impl FeeRate {
    pub const ZERO: FeeRate = FeeRate(0.0);

    pub(crate) const fn new_unchecked(sat_per_vb: f64) -> Self {
        FeeRate(sat_per_vb)
    }

    pub const fn from_sat_per_vb(sat_per_vb: u64) -> Self {
        FeeRate(sat_per_vb as f64)
    }

    pub fn n(&self) -> f64 {
        self.0
    }

    /// Fee for a transaction of `size`, floored to whole satoshis.
    ///
    /// Saturates at `u64::MAX` satoshis instead of failing; such a fee is
    /// already far beyond any balance it could be compared against.
    pub fn fee(&self, size: SizeEstimate) -> Amount {
        let sats = size.to_vbytes() as f64 * self.0;
        Amount::from_sat(floor_to_u64(sats).unwrap_or(u64::MAX))
    }
}

impl TryFrom<f64> for FeeRate {
    type Error = EstimateError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 {
            return Err(EstimateError::InvalidFeeRate);
        }
        Ok(FeeRate(value))
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sat/vB", self.0)
    }
}

/// Exchange rate in fiat units per BTC.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct BtcPrice(f64);

impl BtcPrice {
    pub fn per_btc(&self) -> f64 {
        self.0
    }

    /// Fiat value of `amount` at this price.
    pub fn value_of(&self, amount: Amount) -> f64 {
        spice_math::sats_to_fiat(amount.to_sat(), self.0)
    }
}

impl TryFrom<f64> for BtcPrice {
    type Error = EstimateError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value <= 0.0 {
            return Err(EstimateError::InvalidPrice);
        }
        Ok(BtcPrice(value))
    }
}
