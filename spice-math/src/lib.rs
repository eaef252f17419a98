use num::{CheckedAdd, CheckedMul};

use thiserror::Error;

/// Number of satoshis in one bitcoin.
pub const SATS_PER_BTC: f64 = 100_000_000.0;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("Addition overflowed")]
    AdditionOverflow,
    #[error("Multiplication overflowed")]
    MultiplicationOverflow,
    #[error("Failed to convert a floating point value into an integer")]
    ConversionError,
}

pub fn safe_add<T>(a: T, b: T) -> Result<T, MathError>
where
    T: CheckedAdd,
{
    a.checked_add(&b).ok_or(MathError::AdditionOverflow)
}

pub fn safe_mul<T>(a: T, b: T) -> Result<T, MathError>
where
    T: CheckedMul,
{
    a.checked_mul(&b).ok_or(MathError::MultiplicationOverflow)
}

/// Floors a non-negative float into a `u64`.
///
/// NaN, negative values and values past `u64::MAX` are rejected instead of
/// saturating the way a bare `as` cast would.
pub fn floor_to_u64(value: f64) -> Result<u64, MathError> {
    if !value.is_finite() || value < 0.0 {
        return Err(MathError::ConversionError);
    }

    let floored = value.floor();
    // 2^64 is exactly representable, anything at or above it does not fit.
    if floored >= 18_446_744_073_709_551_616.0 {
        return Err(MathError::ConversionError);
    }

    Ok(floored as u64)
}

/// Converts a satoshi amount into fiat at `price` fiat units per BTC.
pub fn sats_to_fiat(sats: u64, price: f64) -> f64 {
    sats as f64 / SATS_PER_BTC * price
}
