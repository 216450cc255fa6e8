//! Dashboard and weekly analytics computed over the billing book

use crate::services::store::BillingBook;
use crate::types::{InvoiceStatus, RepStatus};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

/// Headline figures for the dashboard.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardStats {
    pub total_representatives: u64,
    pub active_representatives: u64,
    pub total_invoices: u64,
    pub today_invoices: u64,
    /// Paid invoice volume issued in `today`'s calendar month, in tomans.
    pub monthly_revenue: f64,
    /// Pending invoices whose due date has passed.
    pub overdue_invoices: u64,
}

impl DashboardStats {
    pub fn compute(book: &BillingBook, today: NaiveDate) -> Self {
        let total_representatives = book.representatives.len() as u64;
        let active_representatives = book
            .representatives
            .iter()
            .filter(|r| r.status == RepStatus::Active)
            .count() as u64;

        let total_invoices = book.invoices.len() as u64;
        let today_invoices = book
            .invoices
            .iter()
            .filter(|i| i.created_at.date_naive() == today)
            .count() as u64;

        let monthly_revenue = book
            .invoices
            .iter()
            .filter(|i| {
                let created = i.created_at.date_naive();
                i.status == InvoiceStatus::Paid
                    && created.year() == today.year()
                    && created.month() == today.month()
            })
            .map(|i| i.amount)
            .sum();

        let overdue_invoices = book
            .invoices
            .iter()
            .filter(|i| i.status == InvoiceStatus::Pending && i.due_date.date_naive() < today)
            .count() as u64;

        Self {
            total_representatives,
            active_representatives,
            total_invoices,
            today_invoices,
            monthly_revenue,
            overdue_invoices,
        }
    }
}

/// Trailing seven-day activity.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeeklyAnalytics {
    pub weekly_invoices: u64,
    pub weekly_payments: u64,
    pub active_reps: u64,
}

impl WeeklyAnalytics {
    pub fn compute(book: &BillingBook, now: DateTime<Utc>) -> Self {
        let week_ago = now - Duration::days(7);

        let weekly_invoices = book
            .invoices
            .iter()
            .filter(|i| i.created_at >= week_ago)
            .count() as u64;
        let weekly_payments = book
            .payments
            .iter()
            .filter(|p| p.created_at >= week_ago)
            .count() as u64;
        let active_reps = book
            .representatives
            .iter()
            .filter(|r| r.status == RepStatus::Active)
            .count() as u64;

        Self {
            weekly_invoices,
            weekly_payments,
            active_reps,
        }
    }
}
