use std::fmt;

use bitcoin::{blockdata::constants::WITNESS_SCALE_FACTOR, Weight};
use spice_math::{safe_add, safe_mul};

use crate::{
    address::AddressKind,
    error::{EstimateError, Result},
    topology::{InputTopology, MultisigParams},
};

const SCALE: u64 = WITNESS_SCALE_FACTOR as u64;

/// Weight of `vbytes` virtual bytes.
const fn vb(vbytes: u64) -> Weight {
    Weight::from_wu(vbytes * SCALE)
}

// Version, locktime, in/out counts and the amortized segwit marker: 10.5 vB.
const TX_OVERHEAD: Weight = Weight::from_wu(42);

// Multisig witness building blocks
const PUBKEY_SIZE: u64 = 33; // compressed
const SIGNATURE_SIZE: u64 = 72; // DER, high-s worst case
const PUSH_OPCODE_SIZE: u64 = 1;

// Outpoint, scriptSig carrying the redeem script push, sequence.
const P2SH_WRAPPER_SIZE: Weight = vb(76);

// Legacy P2SH multisig: outpoint + sequence + script framing, then raw pushes.
const LEGACY_P2SH_BASE_SIZE: u64 = 41;
const LEGACY_P2SH_SIG_SIZE: u64 = 72;
const LEGACY_P2SH_PUBKEY_SIZE: u64 = 34;

/// Virtual size of a transaction, always a whole number of vbytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct SizeEstimate(u64);

impl SizeEstimate {
    pub const fn from_vbytes(vbytes: u64) -> Self {
        Self(vbytes)
    }

    pub const fn to_vbytes(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<SizeEstimate> for u64 {
    fn from(size: SizeEstimate) -> Self {
        size.0
    }
}

impl fmt::Display for SizeEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vB", self.0)
    }
}

/// Bytes needed to push a witness script of `wss` bytes (wslpb).
pub const fn witness_script_length_prefix(wss: u64) -> u64 {
    match wss {
        0..=75 => 1,
        76..=255 => 2,
        _ => 3,
    }
}

/// `OP_m <n pubkey pushes> OP_n OP_CHECKMULTISIG`
const fn witness_script_size(n: u64) -> u64 {
    PUSH_OPCODE_SIZE + n * (PUSH_OPCODE_SIZE + PUBKEY_SIZE) + PUSH_OPCODE_SIZE + 1
}

/// Witness stack after the item count: the dummy `OP_0`, `m` signatures and
/// the length-prefixed witness script.
const fn multisig_witness_items_size(m: u64, n: u64) -> u64 {
    let wss = witness_script_size(n);
    let wslpb = witness_script_length_prefix(wss);

    1 + m * (PUSH_OPCODE_SIZE + SIGNATURE_SIZE) + wslpb + wss
}

fn output_weight(kind: AddressKind) -> Option<Weight> {
    match kind {
        AddressKind::P2PKH => Some(vb(34)),
        AddressKind::P2SH => Some(vb(32)),
        AddressKind::Bech32 => Some(vb(31)),
        AddressKind::P2WSH => Some(vb(43)),
        AddressKind::Taproot => Some(vb(43)),
        AddressKind::Unknown => None,
    }
}

fn simple_input_weight(kind: AddressKind) -> Option<Weight> {
    match kind {
        AddressKind::P2PKH => Some(vb(148)),
        // P2SH-P2WPKH
        AddressKind::P2SH => Some(vb(91)),
        // P2WPKH
        AddressKind::Bech32 => Some(vb(68)),
        // generic 2-of-3 multisig fallback
        AddressKind::P2WSH => Some(vb(140)),
        // 57.5 vB key-path spend
        AddressKind::Taproot => Some(Weight::from_wu(230)),
        AddressKind::Unknown => None,
    }
}

fn input_weight(kind: AddressKind, topology: InputTopology) -> Result<Weight> {
    match topology {
        InputTopology::Simple => {
            simple_input_weight(kind).ok_or(EstimateError::UnsupportedAddressKind(kind))
        }
        InputTopology::LegacyP2shMultisig(params) => Ok(legacy_p2sh_input_weight(params)),
        InputTopology::P2shMultisig(params) => Ok(p2sh_p2wsh_input_weight(params)),
        InputTopology::P2wshMultisig(params) => Ok(p2wsh_input_weight(params)),
    }
}

fn legacy_p2sh_input_weight(params: MultisigParams) -> Weight {
    let (m, n) = (u64::from(params.m()), u64::from(params.n()));

    vb(LEGACY_P2SH_BASE_SIZE + m * LEGACY_P2SH_SIG_SIZE + n * LEGACY_P2SH_PUBKEY_SIZE)
}

fn p2sh_p2wsh_input_weight(params: MultisigParams) -> Weight {
    let (m, n) = (u64::from(params.m()), u64::from(params.n()));
    // witness item count + items
    let wds = 1 + multisig_witness_items_size(m, n);

    // Witness bytes weigh 1 WU each.
    Weight::from_wu(P2SH_WRAPPER_SIZE.to_wu() + wds)
}

fn p2wsh_input_weight(params: MultisigParams) -> Weight {
    let (m, n) = (u64::from(params.m()), u64::from(params.n()));

    Weight::from_wu(multisig_witness_items_size(m, n))
}

/// Output script size for `kind`. An unknown kind spending through a multisig
/// topology pays to the script family that topology implies.
fn resolve_output_weight(kind: AddressKind, topology: InputTopology) -> Result<Weight> {
    if let Some(weight) = output_weight(kind) {
        return Ok(weight);
    }

    match topology {
        InputTopology::Simple => Err(EstimateError::UnsupportedAddressKind(kind)),
        InputTopology::P2shMultisig(_) | InputTopology::LegacyP2shMultisig(_) => {
            Ok(vb(32))
        }
        InputTopology::P2wshMultisig(_) => Ok(vb(43)),
    }
}

/// Estimates the virtual size of a transaction spending `num_inputs` inputs
/// of the given topology into `num_outputs` outputs of `kind`.
///
/// The sum is accumulated in weight units so the quarter-vbyte constants
/// stay exact, then floored to whole vbytes.
///
/// ```
/// use spice_estimator::{estimate_size, AddressKind, InputTopology};
///
/// let size = estimate_size(AddressKind::P2PKH, 1, 1, InputTopology::Simple)?;
/// assert_eq!(size.to_vbytes(), 192);
///
/// let multisig = InputTopology::p2wsh_multisig(2, 3)?;
/// let size = estimate_size(AddressKind::P2WSH, 1, 1, multisig)?;
/// assert_eq!(size.to_vbytes(), 117);
/// # Ok::<(), spice_estimator::EstimateError>(())
/// ```
pub fn estimate_size(
    kind: AddressKind,
    num_inputs: u64,
    num_outputs: u64,
    topology: InputTopology,
) -> Result<SizeEstimate> {
    let input = input_weight(kind, topology)?;
    let output = resolve_output_weight(kind, topology)?;

    let inputs_wu = safe_mul(num_inputs, input.to_wu())?;
    let outputs_wu = safe_mul(num_outputs, output.to_wu())?;
    let total_wu = safe_add(safe_add(TX_OVERHEAD.to_wu(), inputs_wu)?, outputs_wu)?;

    Ok(SizeEstimate(Weight::from_wu(total_wu).to_vbytes_floor()))
}
