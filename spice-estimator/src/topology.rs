use std::fmt;

use crate::error::{EstimateError, Result};

/// A validated `m`-of-`n` multisig policy.
///
/// The fields are private so every value in circulation satisfies
/// `0 < m <= n`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MultisigParams {
    m: u32,
    n: u32,
}

impl MultisigParams {
    pub fn new(m: u32, n: u32) -> Result<Self> {
        if m == 0 || n == 0 || m > n {
            return Err(EstimateError::InvalidMultisigParameters { m, n });
        }
        Ok(Self { m, n })
    }

    /// Required signatures.
    pub fn m(&self) -> u32 {
        self.m
    }

    /// Total keys.
    pub fn n(&self) -> u32 {
        self.n
    }
}

impl fmt::Display for MultisigParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-of-{}", self.m, self.n)
    }
}

/// Shape of the script/witness every input of the transaction carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "params"))]
pub enum InputTopology {
    /// Single-sig (or generic fallback) input, sized from the per-kind table.
    #[default]
    Simple,
    /// P2SH-wrapped segwit multisig (P2SH-P2WSH).
    P2shMultisig(MultisigParams),
    /// Native segwit multisig.
    P2wshMultisig(MultisigParams),
    /// Pre-segwit bare P2SH multisig, no witness discount.
    LegacyP2shMultisig(MultisigParams),
}

impl InputTopology {
    pub fn p2sh_multisig(m: u32, n: u32) -> Result<Self> {
        MultisigParams::new(m, n).map(InputTopology::P2shMultisig)
    }

    pub fn p2wsh_multisig(m: u32, n: u32) -> Result<Self> {
        MultisigParams::new(m, n).map(InputTopology::P2wshMultisig)
    }

    pub fn legacy_p2sh_multisig(m: u32, n: u32) -> Result<Self> {
        MultisigParams::new(m, n).map(InputTopology::LegacyP2shMultisig)
    }

    pub fn multisig_params(&self) -> Option<MultisigParams> {
        match self {
            InputTopology::Simple => None,
            InputTopology::P2shMultisig(params)
            | InputTopology::P2wshMultisig(params)
            | InputTopology::LegacyP2shMultisig(params) => Some(*params),
        }
    }
}
