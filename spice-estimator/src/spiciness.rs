use std::fmt;

use crate::{fee_rate::FeeRate, size::SizeEstimate};

const ASU_DIVISOR: f64 = 100_000.0;

/// Heuristic severity score in Arbitrary Spiciness Units (ASU).
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct SpicinessScore(f64);

impl SpicinessScore {
    /// `num_utxos * size * rate / 100_000`
    pub fn compute(num_utxos: u64, size: SizeEstimate, rate: FeeRate) -> Self {
        Self(num_utxos as f64 * size.to_vbytes() as f64 * rate.n() / ASU_DIVISOR)
    }

    pub fn asu(&self) -> f64 {
        self.0
    }

    pub fn band(&self) -> SpicinessBand {
        SpicinessBand::for_score(self.0)
    }
}

impl fmt::Display for SpicinessScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Severity bands over the ASU score, lower bound inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SpicinessBand {
    Good,
    Mild,
    Medium,
    Hot,
    Fiery,
    Volcanic,
}

impl SpicinessBand {
    pub fn for_score(asu: f64) -> Self {
        if asu < 1.0 {
            SpicinessBand::Good
        } else if asu < 10.0 {
            SpicinessBand::Mild
        } else if asu < 100.0 {
            SpicinessBand::Medium
        } else if asu < 500.0 {
            SpicinessBand::Hot
        } else if asu < 1000.0 {
            SpicinessBand::Fiery
        } else {
            SpicinessBand::Volcanic
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpicinessBand::Good => "Good",
            SpicinessBand::Mild => "Mild",
            SpicinessBand::Medium => "Medium",
            SpicinessBand::Hot => "Hot",
            SpicinessBand::Fiery => "Fiery",
            SpicinessBand::Volcanic => "Volcanic",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            SpicinessBand::Good => "👍",
            SpicinessBand::Mild => "🌶️",
            SpicinessBand::Medium => "🌶️🌶️",
            SpicinessBand::Hot => "🌶️🌶️🌶️",
            SpicinessBand::Fiery => "🔥",
            SpicinessBand::Volcanic => "🔥🔥🔥",
        }
    }
}

impl fmt::Display for SpicinessBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.label(), self.emoji())
    }
}

/// Traffic-light rating of the consolidation size alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SizeBand {
    Green,
    Yellow,
    Red,
}

impl SizeBand {
    pub fn for_size(size: SizeEstimate) -> Self {
        match size.to_vbytes() {
            0..=499 => SizeBand::Green,
            500..=999 => SizeBand::Yellow,
            _ => SizeBand::Red,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            SizeBand::Green => "🟢",
            SizeBand::Yellow => "🟡",
            SizeBand::Red => "🔴",
        }
    }
}
