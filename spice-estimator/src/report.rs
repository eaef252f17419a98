use bitcoin::Amount;

use crate::{
    address::AddressKind,
    curve::{chart_upper_bound, FeeCurvePoint, INTERSECTION_BUFFER},
    economics::{savings, FeeEconomics},
    error::{EstimateError, Result},
    fee_rate::{BtcPrice, FeeRate},
    size::{estimate_size, SizeEstimate},
    spiciness::{SizeBand, SpicinessScore},
    topology::InputTopology,
};

/// A consolidation always pays into a single output.
pub const CONSOLIDATION_OUTPUTS: u64 = 1;
/// UTXO count past which consolidating gets called out explicitly.
pub const MANY_UTXOS_THRESHOLD: u64 = 10;
/// Fee, in satoshis, past which the current-rate fee is called out.
pub const HIGH_FEE_THRESHOLD_SATS: u64 = 100_000;
pub const DEFAULT_HIGH_FEE_RATE: FeeRate = FeeRate::from_sat_per_vb(500);
pub const DEFAULT_LOW_FEE_RATE: FeeRate = FeeRate::from_sat_per_vb(1);

/// Everything a report is derived from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReportInputs {
    pub kind: AddressKind,
    pub topology: InputTopology,
    pub num_utxos: u64,
    pub balance: Amount,
    pub price: BtcPrice,
    pub current_rate: FeeRate,
    pub high_rate: FeeRate,
    pub low_rate: FeeRate,
}

impl ReportInputs {
    pub fn new(
        kind: AddressKind,
        topology: InputTopology,
        num_utxos: u64,
        balance: Amount,
        price: BtcPrice,
        current_rate: FeeRate,
    ) -> Self {
        Self {
            kind,
            topology,
            num_utxos,
            balance,
            price,
            current_rate,
            high_rate: DEFAULT_HIGH_FEE_RATE,
            low_rate: DEFAULT_LOW_FEE_RATE,
        }
    }

    pub fn with_comparison_rates(mut self, high_rate: FeeRate, low_rate: FeeRate) -> Self {
        self.high_rate = high_rate;
        self.low_rate = low_rate;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "value"))]
pub enum Warning {
    /// Number of UTXOs held by the address.
    ManyUtxos(u64),
    /// Consolidation fee at the current rate, in satoshis.
    HighFee(u64),
}

/// Cost of consolidating now versus a later single-input spend, at one rate.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Scenario {
    pub rate: FeeRate,
    pub consolidation_fiat: f64,
    pub single_input_fiat: f64,
    pub saving_fiat: f64,
}

impl Scenario {
    fn at(rate: FeeRate, consolidation: &FeeEconomics, single_input: &FeeEconomics) -> Self {
        Self {
            rate,
            consolidation_fiat: consolidation.fee_fiat(rate),
            single_input_fiat: single_input.fee_fiat(rate),
            saving_fiat: savings(
                consolidation.size(),
                single_input.size(),
                rate,
                consolidation.price(),
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Advice {
    /// Priced at the current rate, or 1 sat/vB if the current rate is below it.
    pub current: Scenario,
    pub high: Scenario,
    pub low: Scenario,
    /// `high - current` consolidation cost, when the high rate is above the
    /// current one.
    pub rise_difference_fiat: Option<f64>,
    /// Whether the low-rate comparison is worth showing.
    pub low_rate_applies: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MarkerKind {
    Current,
    High,
    Low,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChartMarker {
    pub kind: MarkerKind,
    pub point: FeeCurvePoint,
}

/// Plot data derived from a report for one scale setting.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FeeChart {
    pub scaled: bool,
    pub upper_bound: f64,
    pub balance_fiat: f64,
    pub break_even: Option<FeeRate>,
    pub points: Vec<FeeCurvePoint>,
    pub markers: Vec<ChartMarker>,
}

/// Result of one consolidation estimate.
///
/// Immutable: redrawing with another chart scale goes through
/// [`ConsolidationReport::chart`] on the same value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConsolidationReport {
    pub kind: AddressKind,
    pub topology: InputTopology,
    pub num_utxos: u64,
    pub balance_sats: u64,
    pub balance_fiat: f64,
    pub price: BtcPrice,
    pub current_rate: FeeRate,
    pub size: SizeEstimate,
    pub size_band: SizeBand,
    pub single_input_size: SizeEstimate,
    pub current_fee_sats: u64,
    pub break_even: Option<FeeRate>,
    pub spiciness: SpicinessScore,
    pub warnings: Vec<Warning>,
    pub advice: Advice,
}

impl ConsolidationReport {
    pub fn new(inputs: ReportInputs) -> Result<Self> {
        if inputs.num_utxos == 0 {
            return Err(EstimateError::DegenerateSize);
        }

        let size = estimate_size(
            inputs.kind,
            inputs.num_utxos,
            CONSOLIDATION_OUTPUTS,
            inputs.topology,
        )?;
        let single_input_size =
            estimate_size(inputs.kind, 1, CONSOLIDATION_OUTPUTS, inputs.topology)?;

        let consolidation = FeeEconomics::new(size, inputs.balance, inputs.price);
        let single_input = FeeEconomics::new(single_input_size, inputs.balance, inputs.price);

        let current_fee_sats = consolidation.fee_sats(inputs.current_rate).to_sat();

        let mut warnings = Vec::new();
        if inputs.num_utxos > MANY_UTXOS_THRESHOLD {
            warnings.push(Warning::ManyUtxos(inputs.num_utxos));
        }
        if current_fee_sats > HIGH_FEE_THRESHOLD_SATS {
            warnings.push(Warning::HighFee(current_fee_sats));
        }

        let advice = advise(&inputs, &consolidation, &single_input);

        Ok(Self {
            kind: inputs.kind,
            topology: inputs.topology,
            num_utxos: inputs.num_utxos,
            balance_sats: inputs.balance.to_sat(),
            balance_fiat: consolidation.balance_fiat(),
            price: inputs.price,
            current_rate: inputs.current_rate,
            size,
            size_band: SizeBand::for_size(size),
            single_input_size,
            current_fee_sats,
            break_even: consolidation.break_even_rate(),
            spiciness: SpicinessScore::compute(inputs.num_utxos, size, inputs.current_rate),
            warnings,
            advice,
        })
    }

    fn economics(&self) -> FeeEconomics {
        FeeEconomics::new(self.size, Amount::from_sat(self.balance_sats), self.price)
    }

    /// Chart data for the given scale setting.
    pub fn chart(&self, scale_enabled: bool) -> FeeChart {
        let economics = self.economics();
        let upper_bound = chart_upper_bound(self.break_even, INTERSECTION_BUFFER, scale_enabled);

        // The bound is never negative or NaN: it is a clamp of positive
        // constants and a validated break-even rate.
        let max_rate = FeeRate::try_from(upper_bound).unwrap_or(FeeRate::ZERO);
        let points = economics.curve(max_rate).collect();

        let marker = |kind, rate| ChartMarker {
            kind,
            point: FeeCurvePoint {
                rate,
                fee_fiat: economics.fee_fiat(rate),
            },
        };
        let markers = vec![
            marker(MarkerKind::Current, self.current_rate),
            marker(MarkerKind::High, self.advice.high.rate),
            marker(MarkerKind::Low, self.advice.low.rate),
        ];

        FeeChart {
            scaled: scale_enabled,
            upper_bound,
            balance_fiat: self.balance_fiat,
            break_even: self.break_even,
            points,
            markers,
        }
    }
}

fn advise(
    inputs: &ReportInputs,
    consolidation: &FeeEconomics,
    single_input: &FeeEconomics,
) -> Advice {
    let display_rate = if inputs.current_rate.n() > 0.0 {
        inputs.current_rate
    } else {
        DEFAULT_LOW_FEE_RATE
    };

    let current = Scenario::at(display_rate, consolidation, single_input);
    let high = Scenario::at(inputs.high_rate, consolidation, single_input);
    let low = Scenario::at(inputs.low_rate, consolidation, single_input);

    let rise_difference_fiat = (inputs.high_rate.n() > display_rate.n())
        .then(|| high.consolidation_fiat - current.consolidation_fiat);

    Advice {
        current,
        high,
        low,
        rise_difference_fiat,
        low_rate_applies: inputs.current_rate.n() > inputs.low_rate.n(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(num_utxos: u64, balance: u64, current_rate: f64) -> ReportInputs {
        ReportInputs::new(
            AddressKind::Bech32,
            InputTopology::Simple,
            num_utxos,
            Amount::from_sat(balance),
            BtcPrice::try_from(50_000.0).unwrap(),
            FeeRate::try_from(current_rate).unwrap(),
        )
    }

    #[test]
    fn sizes_consolidation_and_follow_up() {
        let report = ConsolidationReport::new(inputs(12, 5_000_000, 20.0)).unwrap();

        // 10.5 + 12 * 68 + 31
        assert_eq!(report.size.to_vbytes(), 857);
        assert_eq!(report.single_input_size.to_vbytes(), 109);
        assert_eq!(report.size_band, SizeBand::Yellow);
        assert_eq!(report.current_fee_sats, 17_140);
        assert!((report.balance_fiat - 2_500.0).abs() < 1e-9);
    }

    #[test]
    fn zero_utxos_is_degenerate() {
        assert_eq!(
            ConsolidationReport::new(inputs(0, 0, 10.0)),
            Err(EstimateError::DegenerateSize)
        );
    }

    #[test]
    fn unknown_address_is_rejected() {
        let mut unknown = inputs(3, 1_000, 10.0);
        unknown.kind = AddressKind::Unknown;
        assert_eq!(
            ConsolidationReport::new(unknown),
            Err(EstimateError::UnsupportedAddressKind(AddressKind::Unknown))
        );
    }

    #[test]
    fn warnings_for_many_utxos_and_high_fees() {
        let quiet = ConsolidationReport::new(inputs(3, 1_000_000, 5.0)).unwrap();
        assert!(quiet.warnings.is_empty());

        // 857 vB at 200 sat/vB
        let loud = ConsolidationReport::new(inputs(12, 1_000_000, 200.0)).unwrap();
        assert_eq!(
            loud.warnings,
            vec![Warning::ManyUtxos(12), Warning::HighFee(171_400)]
        );
    }

    #[test]
    fn advice_prices_three_scenarios() {
        let report = ConsolidationReport::new(inputs(12, 5_000_000, 20.0)).unwrap();
        let advice = report.advice;

        assert_eq!(advice.current.rate, FeeRate::from_sat_per_vb(20));
        assert_eq!(advice.high.rate, DEFAULT_HIGH_FEE_RATE);
        assert_eq!(advice.low.rate, DEFAULT_LOW_FEE_RATE);
        assert!(advice.low_rate_applies);

        // (857 - 109) * 20 sats at 50k
        assert!((advice.current.saving_fiat - 7.48).abs() < 1e-9);
        let rise = advice.rise_difference_fiat.unwrap();
        let expected = advice.high.consolidation_fiat - advice.current.consolidation_fiat;
        assert!((rise - expected).abs() < 1e-12);
        assert!(rise > 0.0);
    }

    #[test]
    fn zero_rate_is_advised_at_one_sat() {
        let report = ConsolidationReport::new(inputs(2, 100_000, 0.0)).unwrap();

        assert_eq!(report.current_fee_sats, 0);
        assert_eq!(report.advice.current.rate, FeeRate::from_sat_per_vb(1));
        assert!(!report.advice.low_rate_applies);
        assert_eq!(report.spiciness.asu(), 0.0);
    }

    #[test]
    fn high_rate_below_current_has_no_rise() {
        let report = ConsolidationReport::new(
            inputs(2, 100_000, 800.0)
                .with_comparison_rates(FeeRate::from_sat_per_vb(500), FeeRate::from_sat_per_vb(1)),
        )
        .unwrap();
        assert_eq!(report.advice.rise_difference_fiat, None);
    }

    #[test]
    fn chart_redraws_from_the_same_report() {
        let report = ConsolidationReport::new(inputs(12, 5_000_000, 20.0)).unwrap();

        let unscaled = report.chart(false);
        let scaled = report.chart(true);

        // 5_000_000 / 857 ~ 5834 sat/vB, so the unscaled default of 5000 holds.
        assert_eq!(unscaled.upper_bound, 5000.0);
        assert!(!unscaled.points.is_empty());
        assert!(unscaled.points.last().unwrap().rate.n() <= 5000.0);

        let break_even = report.break_even.unwrap().n();
        assert_eq!(scaled.upper_bound, break_even);
        assert!(scaled.points.iter().all(|point| point.rate.n() <= break_even));

        assert_eq!(scaled.markers.len(), 3);
        assert_eq!(scaled.markers[0].kind, MarkerKind::Current);
        assert_eq!(report.chart(true), scaled);
    }
}
