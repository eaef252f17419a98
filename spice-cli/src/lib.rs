//! Command-line adapters around `spice-estimator`: a mempool.space client,
//! a script inspector for multisig detection, and report rendering.

pub mod config;
pub mod error;
pub mod estimate;
pub mod inspect;
pub mod mempool;
pub mod render;

pub use config::Config;
pub use error::CliError;
pub use estimate::{run_estimate, Estimate, EstimateRequest};
pub use mempool::{ChainSource, MempoolClient};
