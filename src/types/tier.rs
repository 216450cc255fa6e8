//! Plan tiers shared by the parser and the pricing calculator

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the six fixed monthly billing buckets (1–6 month commitments).
///
/// Both the export-file column layout and the price table follow the order
/// of [`PlanTier::ALL`]; no call site hard-codes a tier position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlanTier {
    #[serde(rename = "1month")]
    OneMonth,
    #[serde(rename = "2month")]
    TwoMonth,
    #[serde(rename = "3month")]
    ThreeMonth,
    #[serde(rename = "4month")]
    FourMonth,
    #[serde(rename = "5month")]
    FiveMonth,
    #[serde(rename = "6month")]
    SixMonth,
}

/// Index of the first limited-usage column in an export row
/// (column 0 is the account identifier).
pub const LIMITED_COLUMN_OFFSET: usize = 1;

/// Index of the first unlimited-usage column in an export row.
pub const UNLIMITED_COLUMN_OFFSET: usize = LIMITED_COLUMN_OFFSET + PlanTier::ALL.len();

impl PlanTier {
    /// Canonical tier order, matching the export column layout.
    pub const ALL: [PlanTier; 6] = [
        PlanTier::OneMonth,
        PlanTier::TwoMonth,
        PlanTier::ThreeMonth,
        PlanTier::FourMonth,
        PlanTier::FiveMonth,
        PlanTier::SixMonth,
    ];

    /// Stable label used as JSON key and in usage maps (e.g. "3month").
    pub fn label(&self) -> &'static str {
        match self {
            PlanTier::OneMonth => "1month",
            PlanTier::TwoMonth => "2month",
            PlanTier::ThreeMonth => "3month",
            PlanTier::FourMonth => "4month",
            PlanTier::FiveMonth => "5month",
            PlanTier::SixMonth => "6month",
        }
    }

    /// Commitment length in months.
    pub fn months(&self) -> u32 {
        match self {
            PlanTier::OneMonth => 1,
            PlanTier::TwoMonth => 2,
            PlanTier::ThreeMonth => 3,
            PlanTier::FourMonth => 4,
            PlanTier::FiveMonth => 5,
            PlanTier::SixMonth => 6,
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
