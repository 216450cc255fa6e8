//! Invoice assembly
//!
//! Joins parser output with the representative directory: each billable
//! usage record becomes one invoice draft priced by the matched
//! representative's table. Unmatched accounts are reported, never fatal.

use crate::services::pricing::calculate_invoice_amount;
use crate::services::store::BillingBook;
use crate::types::{FileParseResult, InvoiceData, NewInvoice};
use chrono::{DateTime, Duration, Utc};

/// Result of assembling one parse pass.
#[derive(Debug, Default)]
pub struct AssemblyOutcome {
    /// One draft per matched usage record, in parse order.
    pub drafts: Vec<NewInvoice>,
    /// One diagnostic per usage record with no matching representative.
    pub unmatched: Vec<String>,
}

/// Assemble invoice drafts from a parse result.
///
/// Matching is by `admin_username`, case-sensitive. Every draft embeds the
/// source usage maps and the full calculation for audit/display, with
/// `due_date = issued_at + due_days`. Pure: nothing is persisted here.
pub fn assemble_invoices(
    parse: &FileParseResult,
    book: &BillingBook,
    issued_at: DateTime<Utc>,
    due_days: i64,
) -> AssemblyOutcome {
    let due_date = issued_at + Duration::days(due_days);
    let mut outcome = AssemblyOutcome::default();

    for record in &parse.records {
        match book.find_representative_by_account(&record.account_id) {
            Some(rep) => {
                let calculation = calculate_invoice_amount(record, &rep.pricing);
                outcome.drafts.push(NewInvoice {
                    representative_id: rep.id,
                    amount: calculation.total,
                    due_date,
                    data: InvoiceData {
                        limited_usage: record.limited_usage.clone(),
                        unlimited_usage: record.unlimited_usage.clone(),
                        calculation,
                    },
                });
            }
            None => outcome.unmatched.push(format!(
                "no representative with account '{}'",
                record.account_id
            )),
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_usage_csv;
    use crate::types::{NewRepresentative, PlanTier, PriceTable};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn book_with(accounts: &[&str]) -> BillingBook {
        let mut book = BillingBook::default();
        for account in accounts {
            book.add_representative(
                NewRepresentative {
                    full_name: format!("{} owner", account),
                    admin_username: account.to_string(),
                    telegram_id: None,
                    phone_number: None,
                    store_name: None,
                    status: Default::default(),
                    pricing: PriceTable {
                        limited_1_month: 5000.0,
                        limited_2_month: 4500.0,
                        unlimited_monthly: 25000.0,
                        ..PriceTable::default()
                    },
                },
                now(),
            )
            .unwrap();
        }
        book
    }

    #[test]
    fn test_matched_record_becomes_one_draft() {
        let parse = parse_usage_csv("ali_vpn,10,0,0,0,0,0,2,0,0,0,0,0");
        let book = book_with(&["ali_vpn"]);

        let outcome = assemble_invoices(&parse, &book, now(), 7);

        assert_eq!(outcome.drafts.len(), 1);
        assert!(outcome.unmatched.is_empty());

        let draft = &outcome.drafts[0];
        // 10 GB * 5000 + 2 months * 25000
        assert_eq!(draft.amount, 100000.0);
        assert_eq!(draft.data.calculation.total, 100000.0);
        assert_eq!(draft.data.limited_usage[&PlanTier::OneMonth], 10.0);
    }

    #[test]
    fn test_unmatched_account_is_reported_not_fatal() {
        let parse = parse_usage_csv(
            "ali_vpn,10,0,0,0,0,0,0,0,0,0,0,0\nghost_vpn,5,0,0,0,0,0,0,0,0,0,0,0",
        );
        let book = book_with(&["ali_vpn"]);

        let outcome = assemble_invoices(&parse, &book, now(), 7);

        assert_eq!(outcome.drafts.len(), 1);
        assert_eq!(outcome.unmatched.len(), 1);
        assert!(outcome.unmatched[0].contains("ghost_vpn"));
    }

    #[test]
    fn test_due_date_is_issue_date_plus_due_days() {
        let parse = parse_usage_csv("ali_vpn,10,0,0,0,0,0,0,0,0,0,0,0");
        let book = book_with(&["ali_vpn"]);

        let outcome = assemble_invoices(&parse, &book, now(), 14);

        assert_eq!(outcome.drafts[0].due_date, now() + Duration::days(14));
    }

    #[test]
    fn test_drafts_preserve_parse_order() {
        let parse = parse_usage_csv(
            "sara_network,1,0,0,0,0,0,0,0,0,0,0,0\nali_vpn,2,0,0,0,0,0,0,0,0,0,0,0",
        );
        let book = book_with(&["ali_vpn", "sara_network"]);

        let outcome = assemble_invoices(&parse, &book, now(), 7);

        let sara = book.find_representative_by_account("sara_network").unwrap();
        let ali = book.find_representative_by_account("ali_vpn").unwrap();
        assert_eq!(outcome.drafts[0].representative_id, sara.id);
        assert_eq!(outcome.drafts[1].representative_id, ali.id);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let parse = parse_usage_csv("ALI_VPN,10,0,0,0,0,0,0,0,0,0,0,0");
        let book = book_with(&["ali_vpn"]);

        let outcome = assemble_invoices(&parse, &book, now(), 7);

        assert!(outcome.drafts.is_empty());
        assert_eq!(outcome.unmatched.len(), 1);
    }

    #[test]
    fn test_empty_parse_result_yields_nothing() {
        let parse = FileParseResult::default();
        let book = book_with(&["ali_vpn"]);

        let outcome = assemble_invoices(&parse, &book, now(), 7);

        assert!(outcome.drafts.is_empty());
        assert!(outcome.unmatched.is_empty());
    }
}
