//! Billing domain entities: representatives, invoices, payments, imports

use crate::types::PlanTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Representative lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepStatus {
    Active,
    Inactive,
    Pending,
}

impl Default for RepStatus {
    fn default() -> Self {
        RepStatus::Active
    }
}

/// Per-representative price table: six limited per-gigabyte unit prices
/// plus one flat unlimited monthly price, in tomans.
///
/// Field names on the wire match the upstream panel export
/// (`limited1Month` … `unlimitedMonthly`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTable {
    pub limited_1_month: f64,
    pub limited_2_month: f64,
    pub limited_3_month: f64,
    pub limited_4_month: f64,
    pub limited_5_month: f64,
    pub limited_6_month: f64,
    pub unlimited_monthly: f64,
}

impl PriceTable {
    /// Per-gigabyte unit price for a limited tier.
    ///
    /// The single lookup path used by the calculator; there is no
    /// "missing tier" case by construction.
    pub fn limited_rate(&self, tier: PlanTier) -> f64 {
        match tier {
            PlanTier::OneMonth => self.limited_1_month,
            PlanTier::TwoMonth => self.limited_2_month,
            PlanTier::ThreeMonth => self.limited_3_month,
            PlanTier::FourMonth => self.limited_4_month,
            PlanTier::FiveMonth => self.limited_5_month,
            PlanTier::SixMonth => self.limited_6_month,
        }
    }
}

/// Insert shape for a representative (id and timestamps assigned by the book).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRepresentative {
    pub full_name: String,
    pub admin_username: String,
    #[serde(default)]
    pub telegram_id: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub status: RepStatus,
    pub pricing: PriceTable,
}

/// A reseller tracked by the back office.
///
/// `admin_username` is the unique key matched against the account
/// identifier column of usage exports. `balance` is the running credit in
/// tomans; payments increase it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Representative {
    pub id: u64,
    pub full_name: String,
    pub admin_username: String,
    pub telegram_id: Option<String>,
    pub phone_number: Option<String>,
    pub store_name: Option<String>,
    pub status: RepStatus,
    pub balance: f64,
    pub pricing: PriceTable,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One priced line of an invoice breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierLine {
    pub quantity: f64,
    pub unit_price: f64,
    pub line_cost: f64,
}

/// Per-tier audit detail for both usage categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageBreakdown {
    pub limited: BTreeMap<PlanTier, TierLine>,
    pub unlimited: BTreeMap<PlanTier, TierLine>,
}

/// Priced outcome of one usage record against one price table.
///
/// Ephemeral: computed per record, embedded into exactly one invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceCalculation {
    pub limited_total: f64,
    pub unlimited_total: f64,
    pub total: f64,
    pub breakdown: UsageBreakdown,
}

/// Usage and pricing detail embedded in an invoice for audit/display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceData {
    pub limited_usage: BTreeMap<PlanTier, f64>,
    pub unlimited_usage: BTreeMap<PlanTier, f64>,
    pub calculation: InvoiceCalculation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
}

/// Invoice draft produced by the assembler, not yet assigned an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoice {
    pub representative_id: u64,
    pub amount: f64,
    pub due_date: DateTime<Utc>,
    pub data: InvoiceData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: u64,
    pub representative_id: u64,
    pub amount: f64,
    pub status: InvoiceStatus,
    pub due_date: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub data: InvoiceData,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Full,
    Partial,
    Manual,
}

/// Insert shape for a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    pub representative_id: u64,
    pub invoice_id: Option<u64>,
    pub amount: f64,
    pub kind: PaymentKind,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: u64,
    pub representative_id: u64,
    pub invoice_id: Option<u64>,
    pub amount: f64,
    pub kind: PaymentKind,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Processing,
    Completed,
    Failed,
}

/// Audit record for one ingestion pass over one uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileImport {
    pub id: u64,
    pub filename: String,
    pub status: ImportStatus,
    pub processed_rows: u64,
    pub generated_invoices: u64,
    pub errors: Vec<String>,
    pub created_at: DateTime<Utc>,
}
