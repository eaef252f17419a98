//! Transaction-size and fee-economics model for UTXO consolidation.
//!
//! Given how an address is classified and how many UTXOs it holds, this crate
//! estimates the virtual size of a transaction sweeping them all into a single
//! output, and prices that transaction against the address balance.
//!
//! ## Key Features
//!
//! - **Size estimation**: per-kind size tables plus exact multisig witness sizing
//! - **Fee economics**: fees in sats and fiat, break-even rate, consolidation savings
//! - **Spiciness**: a single severity score (ASU) with ordered bands
//! - **Fee curves**: lazily sampled `(rate, fiat)` points for charting
//!
//! Everything here is pure: no I/O, no shared state. Fetching UTXOs, fee
//! rates and prices, and inferring multisig parameters from address history,
//! is left to the caller.
//!
//! ## Quick Start
//!
//! ```rust
//! use bitcoin::Amount;
//! use spice_estimator::{
//!     AddressKind, BtcPrice, ConsolidationReport, FeeRate, InputTopology, ReportInputs,
//! };
//!
//! let kind = AddressKind::classify("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq");
//! let inputs = ReportInputs::new(
//!     kind,
//!     InputTopology::Simple,
//!     25,
//!     Amount::from_sat(3_000_000),
//!     BtcPrice::try_from(60_000.0)?,
//!     FeeRate::try_from(12.0)?,
//! );
//!
//! let report = ConsolidationReport::new(inputs)?;
//! assert_eq!(report.size.to_vbytes(), 1741);
//!
//! let chart = report.chart(true);
//! assert!(chart.points.iter().all(|p| p.rate.n() <= chart.upper_bound));
//! # Ok::<(), spice_estimator::EstimateError>(())
//! ```

pub mod address;
pub mod curve;
pub mod economics;
pub mod error;
pub mod fee_rate;
pub mod report;
pub mod size;
pub mod spiciness;
pub mod topology;

pub use address::AddressKind;
pub use curve::{chart_upper_bound, sample_curve, FeeCurve, FeeCurvePoint};
pub use economics::{break_even_rate, savings, FeeEconomics};
pub use error::EstimateError;
pub use fee_rate::{BtcPrice, FeeRate};
pub use report::{ConsolidationReport, FeeChart, ReportInputs};
pub use size::{estimate_size, witness_script_length_prefix, SizeEstimate};
pub use spiciness::{SizeBand, SpicinessBand, SpicinessScore};
pub use topology::{InputTopology, MultisigParams};
