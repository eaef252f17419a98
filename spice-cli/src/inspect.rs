//! Reads an address's spending history for evidence of its script shape.

use serde::Serialize;
use spice_estimator::{AddressKind, EstimateError, InputTopology, MultisigParams};

use crate::mempool::Transaction;

const CHECKMULTISIG: &str = "OP_CHECKMULTISIG";
const PUSHNUM_PREFIX: &str = "OP_PUSHNUM_";
/// Witness program push of a P2SH-wrapped P2WPKH redeem script.
const P2WPKH_PROGRAM_MARKER: &str = "0014";

/// What the history of a script-hash address revealed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inspection {
    Multisig(MultisigParams),
    WrappedSingleSig,
    NoHistory,
    Inconclusive,
}

/// How the input topology was settled, for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "params")]
pub enum MultisigStatus {
    Detected(MultisigParams),
    UserLegacy(MultisigParams),
    UserSupplied(MultisigParams),
    WrappedSingleSig,
    PotentialMultisig,
    Standard,
}

/// Scans inputs that spend from `address` and returns the first conclusive
/// one.
pub fn inspect_history(address: &str, kind: AddressKind, history: &[Transaction]) -> Inspection {
    if history.is_empty() {
        return Inspection::NoHistory;
    }

    let spends = history.iter().flat_map(|tx| &tx.vin).filter(|vin| {
        vin.prevout
            .as_ref()
            .and_then(|prevout| prevout.scriptpubkey_address.as_deref())
            == Some(address)
    });

    for vin in spends {
        if let Some(asm) = vin.inner_witnessscript_asm.as_deref() {
            if let Some(params) = parse_multisig_script(asm) {
                return Inspection::Multisig(params);
            }
        } else if kind == AddressKind::P2SH
            && vin
                .scriptsig_asm
                .as_deref()
                .is_some_and(|asm| asm.contains(P2WPKH_PROGRAM_MARKER))
        {
            return Inspection::WrappedSingleSig;
        }
    }

    Inspection::Inconclusive
}

/// `OP_PUSHNUM_<m> <keys...> OP_PUSHNUM_<n> OP_CHECKMULTISIG`
fn parse_multisig_script(asm: &str) -> Option<MultisigParams> {
    let tokens: Vec<&str> = asm.split_whitespace().collect();
    let (&last, rest) = tokens.split_last()?;
    if last != CHECKMULTISIG || rest.len() < 2 {
        return None;
    }

    let m = parse_pushnum(rest[0])?;
    let n = parse_pushnum(rest[rest.len() - 1])?;
    MultisigParams::new(m, n).ok()
}

fn parse_pushnum(token: &str) -> Option<u32> {
    token.strip_prefix(PUSHNUM_PREFIX).unwrap_or(token).parse().ok()
}

/// Settles the input topology. On-chain evidence beats user-supplied
/// `(m, n)`, which beats the single-sig tables.
pub fn resolve_topology(
    kind: AddressKind,
    inspection: Option<Inspection>,
    user: Option<(u32, u32)>,
) -> Result<(InputTopology, MultisigStatus), EstimateError> {
    if let Some(Inspection::Multisig(params)) = inspection {
        match kind {
            AddressKind::P2SH => {
                return Ok((InputTopology::P2shMultisig(params), MultisigStatus::Detected(params)))
            }
            AddressKind::P2WSH => {
                return Ok((InputTopology::P2wshMultisig(params), MultisigStatus::Detected(params)))
            }
            _ => {}
        }
    }

    if let Some((m, n)) = user {
        match kind {
            AddressKind::P2SH => {
                let params = MultisigParams::new(m, n)?;
                return Ok((
                    InputTopology::LegacyP2shMultisig(params),
                    MultisigStatus::UserLegacy(params),
                ));
            }
            AddressKind::P2WSH => {
                let params = MultisigParams::new(m, n)?;
                return Ok((
                    InputTopology::P2wshMultisig(params),
                    MultisigStatus::UserSupplied(params),
                ));
            }
            _ => {}
        }
    }

    let status = match inspection {
        Some(Inspection::WrappedSingleSig) => MultisigStatus::WrappedSingleSig,
        Some(Inspection::NoHistory) => MultisigStatus::PotentialMultisig,
        _ => MultisigStatus::Standard,
    };
    Ok((InputTopology::Simple, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mempool::{Prevout, TxIn};

    const P2WSH_ADDR: &str = "bc1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3qccfmv3";
    const P2SH_ADDR: &str = "3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy";

    fn spend(from: &str, scriptsig: Option<&str>, witness_script: Option<&str>) -> TxIn {
        TxIn {
            prevout: Some(Prevout {
                scriptpubkey_address: Some(from.to_string()),
                value: 10_000,
            }),
            scriptsig_asm: scriptsig.map(str::to_string),
            inner_witnessscript_asm: witness_script.map(str::to_string),
        }
    }

    fn tx(vin: Vec<TxIn>) -> Transaction {
        Transaction {
            txid: "00".repeat(32),
            vin,
        }
    }

    fn params(m: u32, n: u32) -> MultisigParams {
        MultisigParams::new(m, n).unwrap()
    }

    #[test]
    fn detects_multisig_witness_script() {
        let history = vec![tx(vec![spend(
            P2WSH_ADDR,
            None,
            Some("OP_PUSHNUM_2 OP_PUSHBYTES_33 02aa OP_PUSHBYTES_33 03bb OP_PUSHBYTES_33 02cc OP_PUSHNUM_3 OP_CHECKMULTISIG"),
        )])];

        assert_eq!(
            inspect_history(P2WSH_ADDR, AddressKind::P2WSH, &history),
            Inspection::Multisig(params(2, 3))
        );
    }

    #[test]
    fn ignores_inputs_spending_other_addresses() {
        let history = vec![tx(vec![
            spend(
                "bc1qsomeoneelse",
                None,
                Some("OP_PUSHNUM_1 OP_PUSHBYTES_33 02aa OP_PUSHNUM_1 OP_CHECKMULTISIG"),
            ),
            TxIn::default(),
        ])];

        assert_eq!(
            inspect_history(P2WSH_ADDR, AddressKind::P2WSH, &history),
            Inspection::Inconclusive
        );
    }

    #[test]
    fn skips_unparsable_scripts_and_keeps_scanning() {
        let history = vec![
            tx(vec![spend(
                P2WSH_ADDR,
                None,
                Some("OP_PUSHBYTES_1 11 OP_PUSHBYTES_33 02aa OP_PUSHNUM_16 OP_CHECKMULTISIG"),
            )]),
            tx(vec![spend(P2WSH_ADDR, None, Some("OP_PUSHBYTES_32 ab OP_CHECKSIG"))]),
            tx(vec![spend(
                P2WSH_ADDR,
                None,
                Some("OP_PUSHNUM_3 02aa 03bb 02cc 03dd OP_PUSHNUM_4 OP_CHECKMULTISIG"),
            )]),
        ];

        assert_eq!(
            inspect_history(P2WSH_ADDR, AddressKind::P2WSH, &history),
            Inspection::Multisig(params(3, 4))
        );
    }

    #[test]
    fn detects_wrapped_single_sig_only_for_p2sh() {
        let history = vec![tx(vec![spend(P2SH_ADDR, Some("OP_PUSHBYTES_22 0014751e76e8"), None)])];

        assert_eq!(
            inspect_history(P2SH_ADDR, AddressKind::P2SH, &history),
            Inspection::WrappedSingleSig
        );
        assert_eq!(
            inspect_history(P2SH_ADDR, AddressKind::P2WSH, &history),
            Inspection::Inconclusive
        );
    }

    #[test]
    fn empty_history() {
        assert_eq!(inspect_history(P2SH_ADDR, AddressKind::P2SH, &[]), Inspection::NoHistory);
    }

    #[test]
    fn on_chain_evidence_beats_user_values() {
        let detected = Some(Inspection::Multisig(params(2, 3)));

        assert_eq!(
            resolve_topology(AddressKind::P2SH, detected, Some((1, 1))).unwrap(),
            (InputTopology::P2shMultisig(params(2, 3)), MultisigStatus::Detected(params(2, 3)))
        );
        assert_eq!(
            resolve_topology(AddressKind::P2WSH, detected, None).unwrap(),
            (InputTopology::P2wshMultisig(params(2, 3)), MultisigStatus::Detected(params(2, 3)))
        );
    }

    #[test]
    fn user_values_fill_in_when_history_is_silent() {
        assert_eq!(
            resolve_topology(AddressKind::P2SH, Some(Inspection::WrappedSingleSig), Some((2, 2)))
                .unwrap(),
            (
                InputTopology::LegacyP2shMultisig(params(2, 2)),
                MultisigStatus::UserLegacy(params(2, 2))
            )
        );
        assert_eq!(
            resolve_topology(AddressKind::P2WSH, Some(Inspection::NoHistory), Some((3, 5)))
                .unwrap(),
            (
                InputTopology::P2wshMultisig(params(3, 5)),
                MultisigStatus::UserSupplied(params(3, 5))
            )
        );
    }

    #[test]
    fn invalid_user_values_are_rejected() {
        assert_eq!(
            resolve_topology(AddressKind::P2WSH, Some(Inspection::Inconclusive), Some((3, 2))),
            Err(EstimateError::InvalidMultisigParameters { m: 3, n: 2 })
        );
    }

    #[test]
    fn falls_back_to_single_sig_tables() {
        let simple = |kind, inspection, user| resolve_topology(kind, inspection, user).unwrap();

        assert_eq!(
            simple(AddressKind::P2SH, Some(Inspection::WrappedSingleSig), None),
            (InputTopology::Simple, MultisigStatus::WrappedSingleSig)
        );
        assert_eq!(
            simple(AddressKind::P2WSH, Some(Inspection::NoHistory), None),
            (InputTopology::Simple, MultisigStatus::PotentialMultisig)
        );
        assert_eq!(
            simple(AddressKind::P2SH, Some(Inspection::Inconclusive), None),
            (InputTopology::Simple, MultisigStatus::Standard)
        );
        // Non-script addresses ignore multisig flags.
        assert_eq!(
            simple(AddressKind::Bech32, None, Some((2, 3))),
            (InputTopology::Simple, MultisigStatus::Standard)
        );
    }
}
