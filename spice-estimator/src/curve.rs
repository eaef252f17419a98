use std::iter::FusedIterator;

use crate::{
    economics::fee_fiat,
    fee_rate::{BtcPrice, FeeRate},
    size::SizeEstimate,
};

/// Upper bound of an unscaled chart, in sat/vB.
pub const DEFAULT_CHART_MAX_RATE: f64 = 5000.0;
/// Smallest upper bound a scaled chart shrinks to.
pub const MIN_SCALED_CHART_MAX_RATE: f64 = 100.0;
/// Head-room a scaled chart keeps past the break-even rate.
pub const INTERSECTION_BUFFER: f64 = 1.2;

/// One sample of the fee curve.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FeeCurvePoint {
    pub rate: FeeRate,
    pub fee_fiat: f64,
}

/// Step to the next sampled rate; granularity coarsens as rates grow.
const fn rate_step(rate: u64) -> u64 {
    match rate {
        0..=9 => 1,
        10..=49 => 2,
        50..=199 => 5,
        200..=999 => 25,
        1000..=9999 => 100,
        _ => 1000,
    }
}

/// Lazily samples `(rate, fee_fiat)` from 1 sat/vB up to a maximum rate.
///
/// Rates are strictly increasing. A zero size has no meaningful curve and
/// yields nothing.
#[derive(Clone, Debug)]
pub struct FeeCurve {
    size: SizeEstimate,
    price: BtcPrice,
    max_rate: f64,
    next_rate: Option<u64>,
}

impl FeeCurve {
    pub fn new(size: SizeEstimate, price: BtcPrice, max_rate: FeeRate) -> Self {
        let next_rate = if size.is_zero() { None } else { Some(1) };

        Self {
            size,
            price,
            max_rate: max_rate.n(),
            next_rate,
        }
    }
}

impl Iterator for FeeCurve {
    type Item = FeeCurvePoint;

    fn next(&mut self) -> Option<Self::Item> {
        let rate = self.next_rate?;
        if rate as f64 > self.max_rate {
            self.next_rate = None;
            return None;
        }

        self.next_rate = rate.checked_add(rate_step(rate));

        let rate = FeeRate::from_sat_per_vb(rate);
        Some(FeeCurvePoint {
            rate,
            fee_fiat: fee_fiat(self.size, rate, self.price),
        })
    }
}

impl FusedIterator for FeeCurve {}

/// Samples the fee curve of `size` up to `max_rate`.
pub fn sample_curve(size: SizeEstimate, price: BtcPrice, max_rate: FeeRate) -> FeeCurve {
    FeeCurve::new(size, price, max_rate)
}

/// Highest fee rate worth charting.
///
/// A scaled chart zooms to `break_even * intersection_buffer`, but never below
/// [`MIN_SCALED_CHART_MAX_RATE`]; an unscaled one uses
/// [`DEFAULT_CHART_MAX_RATE`]. Either way the bound never passes the
/// break-even rate, where the balance is already gone.
pub fn chart_upper_bound(
    break_even: Option<FeeRate>,
    intersection_buffer: f64,
    scale_enabled: bool,
) -> f64 {
    let bound = if scale_enabled {
        let buffered = break_even
            .map(|rate| rate.n())
            .filter(|rate| *rate > 0.0)
            .map_or(0.0, |rate| rate * intersection_buffer);
        buffered.max(MIN_SCALED_CHART_MAX_RATE)
    } else {
        DEFAULT_CHART_MAX_RATE
    };

    match break_even {
        Some(rate) => bound.min(rate.n()),
        None => bound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price() -> BtcPrice {
        BtcPrice::try_from(50_000.0).unwrap()
    }

    fn rates(curve: FeeCurve) -> Vec<u64> {
        curve.map(|point| point.rate.n() as u64).collect()
    }

    #[test]
    fn granularity_widens_with_rate() {
        let rates = rates(sample_curve(
            SizeEstimate::from_vbytes(200),
            price(),
            FeeRate::from_sat_per_vb(60),
        ));

        assert_eq!(
            rates,
            vec![
                1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 12, 14, 16, 18, 20, 22, 24, 26, 28, 30, 32, 34, 36,
                38, 40, 42, 44, 46, 48, 50, 55, 60
            ]
        );
    }

    #[test]
    fn coarse_steps_at_high_rates() {
        let rates = rates(sample_curve(
            SizeEstimate::from_vbytes(200),
            price(),
            FeeRate::from_sat_per_vb(12_000),
        ));

        assert!(rates.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(rates.contains(&225));
        assert!(rates.contains(&1000));
        assert!(rates.contains(&1100));
        assert!(rates.contains(&11_000));
        assert_eq!(rates.last(), Some(&12_000));
    }

    #[test]
    fn fractional_max_rate_excludes_the_next_step() {
        let rates = rates(sample_curve(
            SizeEstimate::from_vbytes(200),
            price(),
            FeeRate::try_from(4.5).unwrap(),
        ));
        assert_eq!(rates, vec![1, 2, 3, 4]);
    }

    #[test]
    fn zero_size_has_no_curve() {
        let mut curve = sample_curve(
            SizeEstimate::from_vbytes(0),
            price(),
            FeeRate::from_sat_per_vb(100),
        );
        assert!(curve.next().is_none());
    }

    #[test]
    fn max_rate_below_one_has_no_curve() {
        let curve = sample_curve(SizeEstimate::from_vbytes(200), price(), FeeRate::ZERO);
        assert_eq!(curve.count(), 0);
    }

    #[test]
    fn curve_values_match_fee_fiat() {
        let size = SizeEstimate::from_vbytes(250);
        let points: Vec<_> = sample_curve(size, price(), FeeRate::from_sat_per_vb(3)).collect();

        assert_eq!(points.len(), 3);
        assert_eq!(points[2].rate, FeeRate::from_sat_per_vb(3));
        // 750 sats at 50k
        assert!((points[2].fee_fiat - 0.375).abs() < 1e-9);
    }

    #[test]
    fn sampling_is_repeatable() {
        let size = SizeEstimate::from_vbytes(321);
        let max = FeeRate::from_sat_per_vb(2_500);
        let first: Vec<_> = sample_curve(size, price(), max).collect();
        let second: Vec<_> = sample_curve(size, price(), max).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn scaled_bound_clamps_to_break_even() {
        let break_even = Some(FeeRate::try_from(400.0).unwrap());
        assert_eq!(chart_upper_bound(break_even, INTERSECTION_BUFFER, true), 400.0);

        let small = Some(FeeRate::try_from(40.0).unwrap());
        assert_eq!(chart_upper_bound(small, INTERSECTION_BUFFER, true), 40.0);
    }

    #[test]
    fn scaled_bound_without_break_even_uses_minimum() {
        assert_eq!(
            chart_upper_bound(None, INTERSECTION_BUFFER, true),
            MIN_SCALED_CHART_MAX_RATE
        );
    }

    #[test]
    fn unscaled_bound_uses_default() {
        assert_eq!(
            chart_upper_bound(None, INTERSECTION_BUFFER, false),
            DEFAULT_CHART_MAX_RATE
        );

        let break_even = Some(FeeRate::try_from(10_000.0).unwrap());
        assert_eq!(
            chart_upper_bound(break_even, INTERSECTION_BUFFER, false),
            DEFAULT_CHART_MAX_RATE
        );

        let break_even = Some(FeeRate::try_from(1_234.5).unwrap());
        assert_eq!(
            chart_upper_bound(break_even, INTERSECTION_BUFFER, false),
            1_234.5
        );
    }
}
