use std::io;

use serde::Serialize;
use spice_estimator::{
    report::Warning, AddressKind, ConsolidationReport, FeeChart, FeeRate, SpicinessBand,
};

use crate::{estimate::Estimate, inspect::MultisigStatus};

/// Formats a fiat amount with the currency's symbol and thousands separators.
pub fn format_fiat(value: f64, currency: &str) -> String {
    let (prefix, decimals) = match currency {
        "USD" => ("$".to_string(), 2),
        "EUR" => ("€".to_string(), 2),
        "GBP" => ("£".to_string(), 2),
        "JPY" => ("¥".to_string(), 0),
        "CAD" => ("CA$".to_string(), 2),
        "AUD" => ("A$".to_string(), 2),
        other => (format!("{other} "), 2),
    };

    let rounded = format!("{:.*}", decimals, value.abs());
    let (whole, fraction) = match rounded.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (rounded.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && rounded.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match fraction {
        Some(fraction) => format!("{sign}{prefix}{grouped}.{fraction}"),
        None => format!("{sign}{prefix}{grouped}"),
    }
}

pub fn status_line(status: &MultisigStatus, kind: AddressKind) -> String {
    match status {
        MultisigStatus::Detected(params) => format!("✅ Detected {params} Multisig!"),
        MultisigStatus::UserLegacy(params) => {
            format!("✅ Using user-provided {params} legacy P2SH Multisig!")
        }
        MultisigStatus::UserSupplied(params) => {
            format!("✅ Using user-provided {params} Multisig!")
        }
        MultisigStatus::WrappedSingleSig => {
            "ℹ️ P2SH-P2WPKH (single-signature SegWit wrapped in P2SH).".to_string()
        }
        MultisigStatus::PotentialMultisig => {
            "⚠️ Potential Multisig Detected (no transaction history to confirm M-of-N).".to_string()
        }
        MultisigStatus::Standard => format!("ℹ️ Standard {kind} address (single-signature)."),
    }
}

/// Which input size the fee figures assume, when that isn't obvious.
pub fn fee_estimation_note(status: &MultisigStatus, kind: AddressKind) -> Option<String> {
    match status {
        MultisigStatus::Detected(params) | MultisigStatus::UserSupplied(params) => Some(format!(
            "(Fee estimation based on a {params} multisig input size)"
        )),
        MultisigStatus::UserLegacy(params) => Some(format!(
            "(Fee estimation based on a {params} legacy P2SH multisig input size)"
        )),
        MultisigStatus::PotentialMultisig if kind == AddressKind::P2WSH => {
            Some("(Fee estimation based on a generic 2-of-3 multisig input size)".to_string())
        }
        MultisigStatus::PotentialMultisig => Some(
            "(Fee estimation based on a single-signature P2SH-P2WPKH input size)".to_string(),
        ),
        MultisigStatus::WrappedSingleSig | MultisigStatus::Standard => None,
    }
}

/// Fee rate at which the whole balance goes to fees, rounded up.
pub fn run_out_of_money_rate(report: &ConsolidationReport) -> Option<u64> {
    report
        .break_even
        .map(|rate| rate.n().ceil())
        .filter(|rate| rate.is_finite() && *rate >= 0.0)
        .map(|rate| rate as u64)
}

fn rate_label(rate: FeeRate) -> String {
    format!("{} sat/vB", rate.n())
}

fn band_text(band: SpicinessBand) -> String {
    format!("{} {}", band.label().to_lowercase(), band.emoji())
}

/// Writes the human-readable report.
pub fn write_text_report<W: io::Write>(mut out: W, estimate: &Estimate) -> io::Result<()> {
    let report = &estimate.report;
    let fiat = |value: f64| format_fiat(value, &estimate.currency);

    writeln!(out, "Address:          {}", estimate.address)?;
    writeln!(out, "Address type:     {}", report.kind)?;
    writeln!(out, "Multisig status:  {}", status_line(&estimate.status, report.kind))?;
    writeln!(out, "UTXOs:            {}", report.num_utxos)?;
    writeln!(
        out,
        "Total balance:    {} sats ({})",
        report.balance_sats,
        fiat(report.balance_fiat)
    )?;
    writeln!(
        out,
        "Estimated size:   {} {}",
        report.size,
        report.size_band.emoji()
    )?;
    if let Some(note) = fee_estimation_note(&estimate.status, report.kind) {
        writeln!(out, "                  {note}")?;
    }
    let band = report.spiciness.band();
    writeln!(out, "ASU:              {} ({band})", report.spiciness)?;

    if !report.warnings.is_empty() {
        writeln!(out)?;
        for warning in &report.warnings {
            match warning {
                Warning::ManyUtxos(count) => writeln!(
                    out,
                    "🌶️ You have {count} UTXOs! Consolidating them will be a spicy transaction."
                )?,
                Warning::HighFee(sats) => writeln!(
                    out,
                    "🔥 Your estimated fee of {sats} sats is quite high! Consider consolidating during lower network activity."
                )?,
            }
        }
    }

    let advice = &report.advice;
    writeln!(out)?;
    writeln!(
        out,
        "Your UTXOs are {} with an ASU of {}.\n",
        band_text(band),
        report.spiciness
    )?;
    writeln!(
        out,
        "Consolidating them at the current rate ({}) would cost {}.\n",
        rate_label(advice.current.rate),
        fiat(advice.current.consolidation_fiat)
    )?;

    match advice.rise_difference_fiat {
        Some(difference) => {
            let direction = if difference > 0.0 { "more" } else { "less" };
            writeln!(
                out,
                "If fees were to rise to {}, the cost would be {}. This is {} {direction} than the current rate.\n",
                rate_label(advice.high.rate),
                fiat(advice.high.consolidation_fiat),
                fiat(difference.abs())
            )?;
        }
        None => {
            writeln!(
                out,
                "Even at {}, the cost would be {}.\n",
                rate_label(advice.high.rate),
                fiat(advice.high.consolidation_fiat)
            )?;
        }
    }

    if advice.low_rate_applies {
        writeln!(
            out,
            "For comparison, consolidating at a very low rate ({}) would cost {}.\n",
            rate_label(advice.low.rate),
            fiat(advice.low.consolidation_fiat)
        )?;
    }

    writeln!(
        out,
        "If you were to consolidate your UTXOs into a single UTXO, future transactions from this address would be significantly cheaper. For example, a transaction with just one UTXO would cost:"
    )?;
    for (label, scenario) in [
        ("current", &advice.current),
        ("high", &advice.high),
        ("low", &advice.low),
    ] {
        writeln!(
            out,
            "- At {label} rates ({}): {} - saving {} 💰💰",
            rate_label(scenario.rate),
            fiat(scenario.single_input_fiat),
            fiat(scenario.saving_fiat)
        )?;
    }

    if let Some(rate) = run_out_of_money_rate(report) {
        writeln!(
            out,
            "\nAt {rate} sat/vB the consolidation fee would eat the entire balance."
        )?;
    }

    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    address: &'a str,
    currency: &'a str,
    multisig_status: &'a MultisigStatus,
    fee_estimation_note: Option<String>,
    run_out_of_money_rate: Option<u64>,
    report: &'a ConsolidationReport,
    chart: &'a FeeChart,
}

pub fn json_report(estimate: &Estimate, chart: &FeeChart) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        address: &estimate.address,
        currency: &estimate.currency,
        multisig_status: &estimate.status,
        fee_estimation_note: fee_estimation_note(&estimate.status, estimate.report.kind),
        run_out_of_money_rate: run_out_of_money_rate(&estimate.report),
        report: &estimate.report,
        chart,
    })
}

/// Writes the chart's sampled curve as `rate_sat_vb,fee_fiat` rows.
pub fn write_curve_csv<W: io::Write>(writer: W, chart: &FeeChart) -> Result<(), csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["rate_sat_vb", "fee_fiat"])?;
    for point in &chart.points {
        csv.write_record([point.rate.n().to_string(), point.fee_fiat.to_string()])?;
    }
    csv.flush()?;
    Ok(())
}
