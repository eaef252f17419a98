use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use spice_cli::{
    render::{json_report, write_curve_csv, write_text_report},
    run_estimate, Config, EstimateRequest, MempoolClient,
};
use spice_estimator::{estimate_size, AddressKind, FeeRate, InputTopology};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    name = "utxo-spice",
    about = "How spicy is consolidating the UTXOs of a Bitcoin address?",
    version
)]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides it.
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Config file (defaults to $XDG_CONFIG_HOME/utxo-spice/config.toml)
    #[clap(long, env = "UTXO_SPICE_CONFIG", global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    #[clap(about = "Fetch an address's UTXOs and estimate what consolidating them costs")]
    Estimate {
        address: String,
        /// Required signatures, if the address is a multisig the history can't reveal
        #[clap(short, requires = "n")]
        m: Option<u32>,
        /// Total keys of that multisig
        #[clap(short, requires = "m")]
        n: Option<u32>,
        /// Zoom the fee curve to the break-even rate
        #[clap(long)]
        scale_x_axis: bool,
        #[clap(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Also write the fee curve as CSV
        #[clap(long)]
        curve_csv: Option<PathBuf>,
        #[clap(long, env = "UTXO_SPICE_API_BASE")]
        api_base: Option<String>,
        /// Fiat currency code for prices
        #[clap(long, env = "UTXO_SPICE_CURRENCY")]
        currency: Option<String>,
    },
    #[clap(about = "Estimate a consolidation's size offline")]
    Size {
        /// p2pkh, p2sh, bech32, p2wsh or taproot
        kind: AddressKind,
        #[clap(long)]
        inputs: u64,
        #[clap(long, default_value_t = 1)]
        outputs: u64,
        #[clap(short, requires = "n")]
        m: Option<u32>,
        #[clap(short, requires = "m")]
        n: Option<u32>,
        /// Treat m-of-n as bare pre-segwit P2SH multisig
        #[clap(long, requires = "m")]
        legacy: bool,
    },
    #[clap(about = "Print the kind of an address")]
    Classify { address: String },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn size_topology(
    kind: AddressKind,
    multisig: Option<(u32, u32)>,
    legacy: bool,
) -> Result<InputTopology> {
    let Some((m, n)) = multisig else {
        return Ok(InputTopology::Simple);
    };

    let topology = match kind {
        _ if legacy => InputTopology::legacy_p2sh_multisig(m, n)?,
        AddressKind::P2SH => InputTopology::p2sh_multisig(m, n)?,
        AddressKind::P2WSH => InputTopology::p2wsh_multisig(m, n)?,
        other => bail!("multisig parameters need a p2sh or p2wsh kind, not {other}"),
    };
    Ok(topology)
}

fn rate_from_config(value: f64, key: &str) -> Result<FeeRate> {
    FeeRate::try_from(value).with_context(|| format!("Invalid {key} in config"))
}

pub fn entry(opts: Cli) -> Result<()> {
    let config = Config::load(opts.config.as_deref())?;
    debug!(?config, "effective config");

    match opts.command {
        Commands::Estimate {
            address,
            m,
            n,
            scale_x_axis,
            format,
            curve_csv,
            api_base,
            currency,
        } => {
            let api_base = api_base.unwrap_or(config.api_base);
            let currency = currency.unwrap_or(config.currency).to_uppercase();
            let client = MempoolClient::new(
                &api_base,
                Duration::from_secs(config.timeout_secs),
                config.retries,
            )?;
            info!(%api_base, %currency, "estimating");

            let request = EstimateRequest {
                address: address.trim(),
                multisig: m.zip(n),
                currency: &currency,
                high_rate: rate_from_config(config.high_fee_rate, "high_fee_rate")?,
                low_rate: rate_from_config(config.low_fee_rate, "low_fee_rate")?,
            };
            let estimate = run_estimate(&client, &request)?;
            let chart = estimate.report.chart(scale_x_axis || config.scale_x_axis);

            let mut stdout = io::stdout().lock();
            match format {
                OutputFormat::Text => write_text_report(&mut stdout, &estimate)?,
                OutputFormat::Json => writeln!(stdout, "{}", json_report(&estimate, &chart)?)?,
            }

            if let Some(path) = curve_csv {
                let file = File::create(&path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                write_curve_csv(BufWriter::new(file), &chart)?;
                info!(path = %path.display(), points = chart.points.len(), "wrote fee curve");
            }
            Ok(())
        }
        Commands::Size {
            kind,
            inputs,
            outputs,
            m,
            n,
            legacy,
        } => {
            let topology = size_topology(kind, m.zip(n), legacy)?;
            let size = estimate_size(kind, inputs, outputs, topology)?;
            println!("{size}");
            Ok(())
        }
        Commands::Classify { address } => {
            println!("{}", AddressKind::classify(address.trim()));
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let opts = Cli::parse();
    init_tracing(opts.verbose);
    entry(opts)
}
