use anyhow::{Context, Result};
use bitcoin::Amount;
use spice_estimator::{
    AddressKind, BtcPrice, ConsolidationReport, EstimateError, FeeRate, ReportInputs,
};
use spice_math::safe_add;
use tracing::{debug, info};

use crate::{
    error::CliError,
    inspect::{inspect_history, resolve_topology, MultisigStatus},
    mempool::ChainSource,
};

/// One `estimate` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateRequest<'a> {
    pub address: &'a str,
    /// User-supplied `(m, n)`; on-chain evidence wins over it.
    pub multisig: Option<(u32, u32)>,
    pub currency: &'a str,
    pub high_rate: FeeRate,
    pub low_rate: FeeRate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub address: String,
    pub currency: String,
    pub status: MultisigStatus,
    pub report: ConsolidationReport,
}

/// Fetches everything an address's report needs and builds it.
pub fn run_estimate<S: ChainSource + ?Sized>(
    source: &S,
    request: &EstimateRequest<'_>,
) -> Result<Estimate> {
    let address = request.address;
    let kind = AddressKind::classify(address);
    info!(%address, %kind, "classified address");
    if kind == AddressKind::Unknown {
        return Err(EstimateError::UnsupportedAddressKind(kind).into());
    }

    let utxos = source
        .utxos(address)
        .with_context(|| format!("Failed to fetch UTXOs for {address}"))?;
    if utxos.is_empty() {
        return Err(CliError::NoUtxos.into());
    }
    let balance = utxos
        .iter()
        .try_fold(0u64, |total, utxo| safe_add(total, utxo.value))
        .context("UTXO balance does not fit in 64 bits")?;
    info!(count = utxos.len(), balance, "fetched UTXOs");

    let fees = source
        .recommended_fees()
        .context("Failed to fetch recommended fees")?;
    let price = source
        .price(request.currency)
        .context("Failed to fetch BTC price")?;
    debug!(fastest_fee = fees.fastest_fee, price, currency = request.currency, "market data");

    let inspection = if kind.is_script_hash() {
        let history = source
            .address_txs(address)
            .with_context(|| format!("Failed to fetch transaction history for {address}"))?;
        let inspection = inspect_history(address, kind, &history);
        debug!(txs = history.len(), ?inspection, "inspected history");
        Some(inspection)
    } else {
        None
    };

    let (topology, status) = resolve_topology(kind, inspection, request.multisig)?;
    info!(?topology, ?status, "resolved input topology");

    let inputs = ReportInputs::new(
        kind,
        topology,
        utxos.len() as u64,
        Amount::from_sat(balance),
        BtcPrice::try_from(price)?,
        FeeRate::try_from(fees.fastest_fee)?,
    )
    .with_comparison_rates(request.high_rate, request.low_rate);

    let report = ConsolidationReport::new(inputs)?;

    Ok(Estimate {
        address: address.to_string(),
        currency: request.currency.to_string(),
        status,
        report,
    })
}
