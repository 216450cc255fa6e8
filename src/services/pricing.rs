//! Invoice amount calculation
//!
//! Prices one parsed usage record against one representative price table.
//! Limited tiers bill per gigabyte at a tier-specific rate; unlimited
//! tiers bill per month at the single flat rate.

use crate::types::{
    InvoiceCalculation, PlanTier, PriceTable, TierLine, UsageBreakdown, UsageRecord,
};
use std::collections::BTreeMap;

/// Price a usage record against a price table.
///
/// Total over its input domain: there is no missing-price case (a tier the
/// table doesn't price bills at zero) and no error path. Every breakdown
/// line satisfies `line_cost = quantity * unit_price` exactly.
pub fn calculate_invoice_amount(usage: &UsageRecord, pricing: &PriceTable) -> InvoiceCalculation {
    let mut limited = BTreeMap::new();
    let mut limited_total = 0.0;

    for tier in PlanTier::ALL {
        if let Some(&quantity) = usage.limited_usage.get(&tier) {
            let unit_price = pricing.limited_rate(tier);
            let line_cost = quantity * unit_price;
            limited_total += line_cost;
            limited.insert(
                tier,
                TierLine {
                    quantity,
                    unit_price,
                    line_cost,
                },
            );
        }
    }

    let mut unlimited = BTreeMap::new();
    let mut unlimited_total = 0.0;

    for tier in PlanTier::ALL {
        if let Some(&quantity) = usage.unlimited_usage.get(&tier) {
            let unit_price = pricing.unlimited_monthly;
            let line_cost = quantity * unit_price;
            unlimited_total += line_cost;
            unlimited.insert(
                tier,
                TierLine {
                    quantity,
                    unit_price,
                    line_cost,
                },
            );
        }
    }

    InvoiceCalculation {
        limited_total,
        unlimited_total,
        total: limited_total + unlimited_total,
        breakdown: UsageBreakdown { limited, unlimited },
    }
}
