//! Usage-export CSV parser
//!
//! One representative per row, fixed 13-column layout: the account
//! identifier, then six limited-tier gigabyte quantities, then six
//! unlimited-tier month counts, in [`PlanTier::ALL`] order.

use crate::types::{
    FileParseResult, PlanTier, UsageRecord, LIMITED_COLUMN_OFFSET, UNLIMITED_COLUMN_OFFSET,
};
use std::collections::BTreeMap;

/// Token marking the first line as a column-label header.
const HEADER_TOKEN: &str = "admin_username";

/// Identifier the upstream panel emits for rows with no data.
const NO_DATA_SENTINEL: &str = "null";

/// Parse the content of one usage-export file.
///
/// Worth knowing before calling:
/// - A first line containing `admin_username` anywhere is treated as a
///   header and skipped.
/// - Two consecutive blank lines end the scan. Everything after that
///   boundary is unseen: not parsed, not counted in `total_rows`, not
///   reported as skipped or erroneous. Uploaded sheets rely on this to
///   carry trailing notes after a blank-line separator.
/// - Data-shape problems never fail the pass. Rows with an empty field
///   list, a missing/`"null"` identifier, or zero usage in both
///   categories are counted in `skipped_rows`; a row-level fault is
///   recorded in `errors` with its 1-based line number and the scan
///   continues.
///
/// Pure function of the input text; parsing the same content twice yields
/// identical results.
pub fn parse_usage_csv(content: &str) -> FileParseResult {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut result = FileParseResult::default();

    let start_index = if lines.first().is_some_and(|l| l.contains(HEADER_TOKEN)) {
        1
    } else {
        0
    };

    let mut empty_row_count = 0u32;

    for (index, raw_line) in lines.iter().enumerate().skip(start_index) {
        let line = raw_line.trim();

        if line.is_empty() {
            empty_row_count += 1;
            if empty_row_count >= 2 {
                break;
            }
            continue;
        }
        empty_row_count = 0;
        result.total_rows += 1;

        match parse_row(line) {
            Ok(Some(record)) => result.records.push(record),
            Ok(None) => result.skipped_rows += 1,
            Err(message) => result.errors.push(format!("Row {}: {}", index + 1, message)),
        }
    }

    result
}

/// Parse one non-empty row. `Ok(None)` means the row is skipped.
///
/// The scanner currently absorbs every data-shape fault (malformed
/// quoting toggles state, bad numerics price as no usage), so the error
/// arm is the contract for faults, not a path data can reach.
fn parse_row(line: &str) -> Result<Option<UsageRecord>, String> {
    let fields = split_row(line);
    if fields.is_empty() {
        return Ok(None);
    }

    let account_id = fields[0].trim();
    if account_id.is_empty() || account_id.eq_ignore_ascii_case(NO_DATA_SENTINEL) {
        return Ok(None);
    }

    let limited_usage = collect_tier_usage(&fields, LIMITED_COLUMN_OFFSET);
    let unlimited_usage = collect_tier_usage(&fields, UNLIMITED_COLUMN_OFFSET);

    let record = UsageRecord::from_usage(account_id, limited_usage, unlimited_usage);
    if record.is_billable() {
        Ok(Some(record))
    } else {
        Ok(None)
    }
}

/// Read the six tier quantities starting at `offset`.
///
/// A field that is missing, non-numeric, non-finite, or not strictly
/// positive contributes no entry — a zero-usage tier is absent from the
/// map, never a zero-valued key.
fn collect_tier_usage(fields: &[String], offset: usize) -> BTreeMap<PlanTier, f64> {
    let mut usage = BTreeMap::new();

    for (index, tier) in PlanTier::ALL.iter().enumerate() {
        let value = fields
            .get(offset + index)
            .and_then(|field| field.parse::<f64>().ok())
            .unwrap_or(0.0);
        if value.is_finite() && value > 0.0 {
            usage.insert(*tier, value);
        }
    }

    usage
}

/// Split one row into trimmed fields, honoring double-quote enclosure.
///
/// A quote toggles the in-quotes state and a comma inside quotes is data,
/// not a separator. Malformed quoting cannot fail: an unclosed quote
/// simply runs to the end of the line.
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());

    fields
}
