//! Usage types produced by the export-file parser

use crate::types::PlanTier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-representative usage parsed from one export row.
///
/// Tier maps only carry tiers with strictly positive usage — a tier with
/// zero usage is absent, never a zero-valued entry. The totals are derived
/// sums computed at construction and are never set independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Account identifier from the upstream panel export (case-sensitive).
    pub account_id: String,
    /// Gigabytes consumed per limited tier.
    pub limited_usage: BTreeMap<PlanTier, f64>,
    /// Subscription-months purchased per unlimited tier.
    pub unlimited_usage: BTreeMap<PlanTier, f64>,
    pub total_limited: f64,
    pub total_unlimited: f64,
}

impl UsageRecord {
    /// Build a record from tier maps, deriving both totals.
    pub fn from_usage(
        account_id: impl Into<String>,
        limited_usage: BTreeMap<PlanTier, f64>,
        unlimited_usage: BTreeMap<PlanTier, f64>,
    ) -> Self {
        let total_limited = limited_usage.values().sum();
        let total_unlimited = unlimited_usage.values().sum();
        Self {
            account_id: account_id.into(),
            limited_usage,
            unlimited_usage,
            total_limited,
            total_unlimited,
        }
    }

    /// A record with no usage in either category is not billable and must
    /// not leave the parser.
    pub fn is_billable(&self) -> bool {
        self.total_limited > 0.0 || self.total_unlimited > 0.0
    }
}

/// Outcome of one parse pass over one uploaded file.
///
/// `errors` carries row-level faults with 1-based physical line numbers;
/// skipped rows (empty field lists, `"null"` identifiers, zero-usage rows)
/// are counted, not errored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileParseResult {
    pub records: Vec<UsageRecord>,
    pub total_rows: u64,
    pub skipped_rows: u64,
    pub errors: Vec<String>,
}
