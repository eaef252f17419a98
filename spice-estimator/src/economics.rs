use bitcoin::Amount;

use crate::{
    curve::FeeCurve,
    fee_rate::{BtcPrice, FeeRate},
    size::SizeEstimate,
};

/// Fee economics of one transaction size against an address balance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeeEconomics {
    size: SizeEstimate,
    balance: Amount,
    price: BtcPrice,
}

impl FeeEconomics {
    pub fn new(size: SizeEstimate, balance: Amount, price: BtcPrice) -> Self {
        Self {
            size,
            balance,
            price,
        }
    }

    pub fn size(&self) -> SizeEstimate {
        self.size
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn price(&self) -> BtcPrice {
        self.price
    }

    /// `floor(size * rate)` satoshis.
    pub fn fee_sats(&self, rate: FeeRate) -> Amount {
        rate.fee(self.size)
    }

    pub fn fee_fiat(&self, rate: FeeRate) -> f64 {
        fee_fiat(self.size, rate, self.price)
    }

    pub fn balance_fiat(&self) -> f64 {
        self.price.value_of(self.balance)
    }

    /// Rate at which the fee would eat the whole balance.
    pub fn break_even_rate(&self) -> Option<FeeRate> {
        break_even_rate(self.size, self.balance)
    }

    /// Samples `(rate, fee_fiat)` from 1 sat/vB up to `max_rate`.
    pub fn curve(&self, max_rate: FeeRate) -> FeeCurve {
        FeeCurve::new(self.size, self.price, max_rate)
    }
}

pub fn fee_fiat(size: SizeEstimate, rate: FeeRate, price: BtcPrice) -> f64 {
    price.value_of(rate.fee(size))
}

/// `balance / size` in sat/vB, or `None` for a zero size.
///
/// This is an advisory threshold only: no valid transaction can spend more in
/// fees than its inputs carry.
pub fn break_even_rate(size: SizeEstimate, balance: Amount) -> Option<FeeRate> {
    if size.is_zero() {
        return None;
    }

    Some(FeeRate::new_unchecked(
        balance.to_sat() as f64 / size.to_vbytes() as f64,
    ))
}

/// Fiat difference between paying for `size_a` and `size_b` at `rate`.
///
/// Positive when `size_a` is the more expensive transaction.
pub fn savings(
    size_a: SizeEstimate,
    size_b: SizeEstimate,
    rate: FeeRate,
    price: BtcPrice,
) -> f64 {
    fee_fiat(size_a, rate, price) - fee_fiat(size_b, rate, price)
}
