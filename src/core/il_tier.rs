//! IL tiers a flow graph can be displayed in.
//!
//! Tiers are ordered by declaration, from raw disassembly up to high level IL
//! SSA form. The stable identifier (`value()`) is what history documents and
//! configuration files store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Representation of a function's code shown by a pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum IlTier {
    /// Native disassembly
    Normal,
    /// Low level IL
    LowLevelIl,
    /// Low level IL before flag/stack resolution
    LiftedIl,
    /// Low level IL in SSA form
    LowLevelIlSsa,
    /// Medium level IL
    MediumLevelIl,
    /// Medium level IL in SSA form
    MediumLevelIlSsa,
    /// Medium level IL mapped back onto low level IL
    MappedMediumLevelIl,
    /// Mapped medium level IL in SSA form
    MappedMediumLevelIlSsa,
    /// High level IL
    HighLevelIl,
    /// High level IL in SSA form
    HighLevelIlSsa,
}

impl IlTier {
    pub const ALL: [IlTier; 10] = [
        IlTier::Normal,
        IlTier::LowLevelIl,
        IlTier::LiftedIl,
        IlTier::LowLevelIlSsa,
        IlTier::MediumLevelIl,
        IlTier::MediumLevelIlSsa,
        IlTier::MappedMediumLevelIl,
        IlTier::MappedMediumLevelIlSsa,
        IlTier::HighLevelIl,
        IlTier::HighLevelIlSsa,
    ];

    /// Stable identifier used in history documents.
    pub fn value(&self) -> &'static str {
        match self {
            IlTier::Normal => "disassembly",
            IlTier::LowLevelIl => "llil",
            IlTier::LiftedIl => "lifted_llil",
            IlTier::LowLevelIlSsa => "llil_ssa",
            IlTier::MediumLevelIl => "mlil",
            IlTier::MediumLevelIlSsa => "mlil_ssa",
            IlTier::MappedMediumLevelIl => "mapped_mlil",
            IlTier::MappedMediumLevelIlSsa => "mapped_mlil_ssa",
            IlTier::HighLevelIl => "hlil",
            IlTier::HighLevelIlSsa => "hlil_ssa",
        }
    }

    /// Name shown in the graph type label and menus.
    pub fn display_name(&self) -> &'static str {
        match self {
            IlTier::Normal => "Disassembly",
            IlTier::LowLevelIl => "Low Level IL",
            IlTier::LiftedIl => "Lifted IL",
            IlTier::LowLevelIlSsa => "Low Level IL (SSA Form)",
            IlTier::MediumLevelIl => "Medium Level IL",
            IlTier::MediumLevelIlSsa => "Medium Level IL (SSA Form)",
            IlTier::MappedMediumLevelIl => "Mapped Medium Level IL",
            IlTier::MappedMediumLevelIlSsa => "Mapped Medium Level IL (SSA Form)",
            IlTier::HighLevelIl => "High Level IL",
            IlTier::HighLevelIlSsa => "High Level IL (SSA Form)",
        }
    }

    pub fn is_ssa(&self) -> bool {
        matches!(
            self,
            IlTier::LowLevelIlSsa
                | IlTier::MediumLevelIlSsa
                | IlTier::MappedMediumLevelIlSsa
                | IlTier::HighLevelIlSsa
        )
    }

    /// Next tier in `available` after `self`, wrapping; `forward = false`
    /// walks the other way. Returns `None` when nothing is available.
    pub fn cycle(&self, available: &[IlTier], forward: bool) -> Option<IlTier> {
        let mut ordered: Vec<IlTier> = available.to_vec();
        ordered.sort();
        ordered.dedup();
        if ordered.is_empty() {
            return None;
        }
        let next = if forward {
            ordered
                .iter()
                .find(|t| **t > *self)
                .or_else(|| ordered.first())
        } else {
            ordered
                .iter()
                .rev()
                .find(|t| **t < *self)
                .or_else(|| ordered.last())
        };
        next.copied()
    }
}

impl Default for IlTier {
    fn default() -> Self {
        IlTier::Normal
    }
}

impl fmt::Display for IlTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Error returned when a tier identifier is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown IL tier: {0}")]
pub struct UnknownTier(pub String);

impl FromStr for IlTier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        IlTier::ALL
            .iter()
            .find(|t| {
                t.value().eq_ignore_ascii_case(needle)
                    || t.display_name().eq_ignore_ascii_case(needle)
            })
            .copied()
            .ok_or_else(|| UnknownTier(s.to_string()))
    }
}

impl From<IlTier> for String {
    fn from(tier: IlTier) -> Self {
        tier.value().to_string()
    }
}

impl TryFrom<String> for IlTier {
    type Error = UnknownTier;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identifier_and_display_name() {
        assert_eq!("mlil".parse::<IlTier>(), Ok(IlTier::MediumLevelIl));
        assert_eq!("HLIL_SSA".parse::<IlTier>(), Ok(IlTier::HighLevelIlSsa));
        assert_eq!(
            "medium level il".parse::<IlTier>(),
            Ok(IlTier::MediumLevelIl)
        );
        assert!("pcode".parse::<IlTier>().is_err());
    }

    #[test]
    fn test_serde_uses_identifier() {
        let json = serde_json::to_string(&IlTier::LiftedIl).unwrap();
        assert_eq!(json, "\"lifted_llil\"");
        let back: IlTier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, IlTier::LiftedIl);
        assert!(serde_json::from_str::<IlTier>("\"bogus\"").is_err());
    }

    #[test]
    fn test_cycle_wraps_within_available() {
        let available = [IlTier::HighLevelIl, IlTier::Normal, IlTier::MediumLevelIl];
        assert_eq!(
            IlTier::Normal.cycle(&available, true),
            Some(IlTier::MediumLevelIl)
        );
        assert_eq!(
            IlTier::HighLevelIl.cycle(&available, true),
            Some(IlTier::Normal)
        );
        assert_eq!(
            IlTier::Normal.cycle(&available, false),
            Some(IlTier::HighLevelIl)
        );
        // Current tier not in the set still finds a neighbour
        assert_eq!(
            IlTier::LowLevelIl.cycle(&available, true),
            Some(IlTier::MediumLevelIl)
        );
        assert_eq!(IlTier::Normal.cycle(&[], true), None);
    }

    #[test]
    fn test_ssa_flag() {
        assert!(IlTier::MediumLevelIlSsa.is_ssa());
        assert!(!IlTier::MediumLevelIl.is_ssa());
    }
}
