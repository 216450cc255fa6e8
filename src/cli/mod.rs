use crate::services::ingest::DEFAULT_DUE_DAYS;
use crate::services::{BillingStore, DashboardStats, ImportReport, IngestService, WeeklyAnalytics};
use crate::types::{NewPayment, NewRepresentative, PaymentKind};
use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Usage-file ingestion and invoice engine for VPN reseller back offices
#[derive(Parser)]
#[command(name = "repbill")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Billing book path (defaults to ~/.repbill/billing.json)
    #[arg(long, global = true)]
    store: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a usage export file, or a directory of CSV exports
    Ingest {
        path: PathBuf,

        /// Payment window for issued invoices, in days
        #[arg(long, default_value_t = DEFAULT_DUE_DAYS)]
        due_days: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse and price a usage export without persisting anything
    Preview {
        path: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List representatives
    Reps {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Bulk-add representatives from a JSON array
    RepsImport { path: PathBuf },

    /// List invoices
    Invoices {
        /// Only invoices for this account
        #[arg(long)]
        rep: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a payment and credit the representative's balance
    Pay {
        account: String,
        amount: f64,

        /// Invoice settled by this payment (marks it paid)
        #[arg(long)]
        invoice: Option<u64>,

        /// Free-form payment note
        #[arg(long)]
        note: Option<String>,
    },

    /// Dashboard and weekly statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let store = match &self.store {
            Some(path) => BillingStore::with_path(path.clone()),
            None => BillingStore::new()?,
        };

        match self.command {
            Commands::Ingest {
                path,
                due_days,
                json,
            } => run_ingest(store, &path, due_days, json),
            Commands::Preview { path, json } => run_preview(store, &path, json),
            Commands::Reps { json } => run_reps(store, json),
            Commands::RepsImport { path } => run_reps_import(store, &path),
            Commands::Invoices { rep, json } => run_invoices(store, rep.as_deref(), json),
            Commands::Pay {
                account,
                amount,
                invoice,
                note,
            } => run_pay(store, &account, amount, invoice, note),
            Commands::Stats { json } => run_stats(store, json),
        }
    }
}

fn run_ingest(store: BillingStore, path: &Path, due_days: i64, json: bool) -> anyhow::Result<()> {
    let service = IngestService::new(store).with_due_days(due_days);

    let reports: Vec<ImportReport> = if path.is_dir() {
        service.ingest_dir(path)?
    } else {
        vec![service.ingest_file(path)?]
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!(
            "{}: {} rows, {} invoices issued ({:?})",
            report.import.filename,
            report.import.processed_rows,
            report.import.generated_invoices,
            report.import.status
        );
        for error in &report.import.errors {
            println!("  ! {}", error);
        }
    }
    Ok(())
}

fn run_preview(store: BillingStore, path: &Path, json: bool) -> anyhow::Result<()> {
    let service = IngestService::new(store);
    let preview = service.preview_file(path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    let book = service.store().load()?;
    println!(
        "{} rows, {} skipped, {} billable",
        preview.parse.total_rows,
        preview.parse.skipped_rows,
        preview.drafts.len()
    );
    for draft in &preview.drafts {
        let account = book
            .find_representative(draft.representative_id)
            .map(|r| r.admin_username.as_str())
            .unwrap_or("?");
        println!("  {}  {} tomans", account, draft.amount);
    }
    for unmatched in &preview.unmatched {
        println!("  ! {}", unmatched);
    }
    Ok(())
}

fn run_reps(store: BillingStore, json: bool) -> anyhow::Result<()> {
    let book = store.load()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&book.representatives)?);
        return Ok(());
    }

    for rep in &book.representatives {
        println!(
            "#{}  {}  {}  {:?}  balance {} tomans",
            rep.id, rep.admin_username, rep.full_name, rep.status, rep.balance
        );
    }
    Ok(())
}

fn run_reps_import(store: BillingStore, path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let new_reps: Vec<NewRepresentative> =
        serde_json::from_str(&content).with_context(|| format!("decoding {}", path.display()))?;

    let mut book = store.load()?;
    let now = Utc::now();
    let mut added = 0usize;

    for rep in new_reps {
        let account = rep.admin_username.clone();
        match book.add_representative(rep, now) {
            Ok(_) => added += 1,
            Err(e) => eprintln!("[repbill] Warning: skipping '{}': {}", account, e),
        }
    }

    store.save(&mut book)?;
    println!("{} representatives added", added);
    Ok(())
}

fn run_invoices(store: BillingStore, rep: Option<&str>, json: bool) -> anyhow::Result<()> {
    let book = store.load()?;

    let rep_id = match rep {
        Some(account) => match book.find_representative_by_account(account) {
            Some(rep) => Some(rep.id),
            None => bail!("no representative with account '{}'", account),
        },
        None => None,
    };

    let invoices: Vec<_> = book
        .invoices
        .iter()
        .filter(|i| rep_id.is_none_or(|id| i.representative_id == id))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&invoices)?);
        return Ok(());
    }

    for invoice in invoices {
        let account = book
            .find_representative(invoice.representative_id)
            .map(|r| r.admin_username.as_str())
            .unwrap_or("?");
        println!(
            "#{}  {}  {} tomans  {:?}  due {}",
            invoice.id,
            account,
            invoice.amount,
            invoice.status,
            invoice.due_date.date_naive()
        );
    }
    Ok(())
}

fn run_pay(
    store: BillingStore,
    account: &str,
    amount: f64,
    invoice: Option<u64>,
    note: Option<String>,
) -> anyhow::Result<()> {
    let mut book = store.load()?;
    let now = Utc::now();

    let rep_id = match book.find_representative_by_account(account) {
        Some(rep) => rep.id,
        None => bail!("no representative with account '{}'", account),
    };

    let kind = if invoice.is_some() {
        PaymentKind::Full
    } else {
        PaymentKind::Manual
    };

    book.record_payment(
        NewPayment {
            representative_id: rep_id,
            invoice_id: invoice,
            amount,
            kind,
            description: note,
        },
        now,
    )?;

    if let Some(invoice_id) = invoice {
        book.mark_invoice_paid(invoice_id, now)?;
    }

    store.save(&mut book)?;

    let balance = book
        .find_representative(rep_id)
        .map(|r| r.balance)
        .unwrap_or_default();
    println!("payment recorded; {} balance is now {} tomans", account, balance);
    Ok(())
}

#[derive(Serialize)]
struct StatsReport {
    dashboard: DashboardStats,
    weekly: WeeklyAnalytics,
}

fn run_stats(store: BillingStore, json: bool) -> anyhow::Result<()> {
    let book = store.load()?;
    let now = Utc::now();

    let report = StatsReport {
        dashboard: DashboardStats::compute(&book, now.date_naive()),
        weekly: WeeklyAnalytics::compute(&book, now),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let d = &report.dashboard;
    println!(
        "representatives: {} ({} active)",
        d.total_representatives, d.active_representatives
    );
    println!(
        "invoices: {} total, {} today, {} overdue",
        d.total_invoices, d.today_invoices, d.overdue_invoices
    );
    println!("monthly revenue: {} tomans", d.monthly_revenue);
    let w = &report.weekly;
    println!(
        "last 7 days: {} invoices, {} payments",
        w.weekly_invoices, w.weekly_payments
    );
    Ok(())
}
