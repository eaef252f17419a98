use std::{fmt, str::FromStr};

/// Script family of a Bitcoin address, as far as the size tables care.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AddressKind {
    P2PKH,
    P2SH,
    /// Native segwit v0 single-sig (P2WPKH).
    Bech32,
    P2WSH,
    Taproot,
    Unknown,
}

const BECH32_P2WPKH_LEN: usize = 42;
const BECH32_P2WSH_LEN: usize = 62;

impl AddressKind {
    /// Classifies a raw mainnet address string by prefix and length.
    ///
    /// No checksum or network validation happens here. Anything that doesn't
    /// match one of the known shapes is [`AddressKind::Unknown`].
    ///
    /// ```
    /// use spice_estimator::AddressKind;
    ///
    /// assert_eq!(AddressKind::classify("1BoatSLRHtKNngkdXEeobR76b53LETtpyT"), AddressKind::P2PKH);
    /// assert_eq!(AddressKind::classify("bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr"), AddressKind::Taproot);
    /// assert_eq!(AddressKind::classify("tb1qxyz"), AddressKind::Unknown);
    /// ```
    pub fn classify(address: &str) -> Self {
        let len = address.chars().count();

        if address.starts_with('1') {
            AddressKind::P2PKH
        } else if address.starts_with('3') {
            AddressKind::P2SH
        } else if address.starts_with("bc1q") && len == BECH32_P2WPKH_LEN {
            AddressKind::Bech32
        } else if address.starts_with("bc1q") && len == BECH32_P2WSH_LEN {
            AddressKind::P2WSH
        } else if address.starts_with("bc1p") {
            AddressKind::Taproot
        } else {
            AddressKind::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AddressKind::P2PKH => "P2PKH",
            AddressKind::P2SH => "P2SH",
            AddressKind::Bech32 => "Bech32",
            AddressKind::P2WSH => "P2WSH",
            AddressKind::Taproot => "Taproot",
            AddressKind::Unknown => "Unknown",
        }
    }

    /// Whether the address may hide a multisig script worth inspecting.
    pub fn is_script_hash(&self) -> bool {
        matches!(self, AddressKind::P2SH | AddressKind::P2WSH)
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised address kind `{0}` (expected p2pkh, p2sh, bech32, p2wsh or taproot)")]
pub struct ParseAddressKindError(String);

impl FromStr for AddressKind {
    type Err = ParseAddressKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "p2pkh" => Ok(AddressKind::P2PKH),
            "p2sh" => Ok(AddressKind::P2SH),
            "bech32" | "p2wpkh" => Ok(AddressKind::Bech32),
            "p2wsh" => Ok(AddressKind::P2WSH),
            "taproot" | "p2tr" => Ok(AddressKind::Taproot),
            "unknown" => Ok(AddressKind::Unknown),
            _ => Err(ParseAddressKindError(s.to_string())),
        }
    }
}
