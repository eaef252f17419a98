use spice_math::MathError;
use thiserror::Error;

use crate::address::AddressKind;

/// Failures surfaced by size estimation and fee economics.
///
/// None of these are fatal: every public entry point returns them as values
/// so the caller can report the literal condition to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum EstimateError {
    #[error("unknown address type for size estimation: {0}")]
    UnsupportedAddressKind(AddressKind),

    #[error("invalid multisig parameters: {m}-of-{n} (need 0 < m <= n)")]
    InvalidMultisigParameters { m: u32, n: u32 },

    #[error("size estimate is zero, no fee economics can be derived from it")]
    DegenerateSize,

    #[error("fee rate must be a finite, non-negative number of sat/vB")]
    InvalidFeeRate,

    #[error("price must be a finite, positive number of fiat units per BTC")]
    InvalidPrice,

    #[error("size arithmetic overflowed")]
    CalcOverflow,
}

impl From<MathError> for EstimateError {
    fn from(error: MathError) -> Self {
        match error {
            MathError::AdditionOverflow => EstimateError::CalcOverflow,
            MathError::MultiplicationOverflow => EstimateError::CalcOverflow,
            MathError::ConversionError => EstimateError::CalcOverflow,
        }
    }
}

pub type Result<T> = core::result::Result<T, EstimateError>;
