//! Billing book persistence
//!
//! The book is a single JSON document holding representatives, invoices,
//! payments, and file-import audit records. Reads take a shared lock;
//! writes go through a temp file, fsync, and an exclusive-locked atomic
//! rename, so concurrent invocations never observe a torn document.

use crate::types::{
    FileImport, ImportStatus, Invoice, InvoiceStatus, NewInvoice, NewPayment, NewRepresentative,
    Payment, RepbillError, Representative, Result,
};
use chrono::{DateTime, Utc};
use directories::BaseDirs;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// In-memory billing state, the system of record once persisted.
///
/// Ids are allocated here, monotonically per collection; they are never
/// reused even after deletions upstream of a save.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BillingBook {
    pub updated_at: i64,
    pub representatives: Vec<Representative>,
    pub invoices: Vec<Invoice>,
    pub payments: Vec<Payment>,
    pub file_imports: Vec<FileImport>,
    #[serde(default)]
    last_representative_id: u64,
    #[serde(default)]
    last_invoice_id: u64,
    #[serde(default)]
    last_payment_id: u64,
    #[serde(default)]
    last_file_import_id: u64,
}

impl BillingBook {
    /// Register a representative. `admin_username` must be unique — it is
    /// the key usage exports are matched against.
    pub fn add_representative(
        &mut self,
        new: NewRepresentative,
        now: DateTime<Utc>,
    ) -> Result<&Representative> {
        if self
            .representatives
            .iter()
            .any(|r| r.admin_username == new.admin_username)
        {
            return Err(RepbillError::Store(format!(
                "representative '{}' already exists",
                new.admin_username
            )));
        }

        self.last_representative_id += 1;
        self.representatives.push(Representative {
            id: self.last_representative_id,
            full_name: new.full_name,
            admin_username: new.admin_username,
            telegram_id: new.telegram_id,
            phone_number: new.phone_number,
            store_name: new.store_name,
            status: new.status,
            balance: 0.0,
            pricing: new.pricing,
            created_at: now,
            updated_at: now,
        });
        Ok(self.representatives.last().expect("just pushed"))
    }

    /// Look up a representative by the account identifier column of usage
    /// exports. Case-sensitive, like the identifier itself.
    pub fn find_representative_by_account(&self, account_id: &str) -> Option<&Representative> {
        self.representatives
            .iter()
            .find(|r| r.admin_username == account_id)
    }

    pub fn find_representative(&self, id: u64) -> Option<&Representative> {
        self.representatives.iter().find(|r| r.id == id)
    }

    /// Issue an invoice from an assembler draft.
    pub fn issue_invoice(&mut self, draft: NewInvoice, now: DateTime<Utc>) -> &Invoice {
        self.last_invoice_id += 1;
        self.invoices.push(Invoice {
            id: self.last_invoice_id,
            representative_id: draft.representative_id,
            amount: draft.amount,
            status: InvoiceStatus::Pending,
            due_date: draft.due_date,
            paid_at: None,
            data: draft.data,
            created_at: now,
        });
        self.invoices.last().expect("just pushed")
    }

    /// Record a payment and credit the representative's balance.
    pub fn record_payment(&mut self, new: NewPayment, now: DateTime<Utc>) -> Result<&Payment> {
        let rep = self
            .representatives
            .iter_mut()
            .find(|r| r.id == new.representative_id)
            .ok_or_else(|| {
                RepbillError::Store(format!(
                    "no representative with id {}",
                    new.representative_id
                ))
            })?;
        rep.balance += new.amount;
        rep.updated_at = now;

        self.last_payment_id += 1;
        self.payments.push(Payment {
            id: self.last_payment_id,
            representative_id: new.representative_id,
            invoice_id: new.invoice_id,
            amount: new.amount,
            kind: new.kind,
            description: new.description,
            created_at: now,
        });
        Ok(self.payments.last().expect("just pushed"))
    }

    /// Mark an invoice paid, stamping `paid_at`.
    pub fn mark_invoice_paid(&mut self, invoice_id: u64, now: DateTime<Utc>) -> Result<&Invoice> {
        let invoice = self
            .invoices
            .iter_mut()
            .find(|i| i.id == invoice_id)
            .ok_or_else(|| RepbillError::Store(format!("no invoice with id {}", invoice_id)))?;
        invoice.status = InvoiceStatus::Paid;
        invoice.paid_at = Some(now);
        Ok(invoice)
    }

    /// Open an import audit record in `processing` state; returns its id.
    pub fn open_file_import(&mut self, filename: impl Into<String>, now: DateTime<Utc>) -> u64 {
        self.last_file_import_id += 1;
        self.file_imports.push(FileImport {
            id: self.last_file_import_id,
            filename: filename.into(),
            status: ImportStatus::Processing,
            processed_rows: 0,
            generated_invoices: 0,
            errors: Vec::new(),
            created_at: now,
        });
        self.last_file_import_id
    }

    /// Close out an import audit record with its final status and counts.
    pub fn finalize_file_import(
        &mut self,
        import_id: u64,
        status: ImportStatus,
        processed_rows: u64,
        generated_invoices: u64,
        errors: Vec<String>,
    ) -> Result<&FileImport> {
        let import = self
            .file_imports
            .iter_mut()
            .find(|i| i.id == import_id)
            .ok_or_else(|| RepbillError::Store(format!("no file import with id {}", import_id)))?;
        import.status = status;
        import.processed_rows = processed_rows;
        import.generated_invoices = generated_invoices;
        import.errors = errors;
        Ok(import)
    }
}

/// File-backed persistence for a [`BillingBook`].
pub struct BillingStore {
    path: PathBuf,
}

impl BillingStore {
    /// Store at the default location (`~/.repbill/billing.json`).
    pub fn new() -> Result<Self> {
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| RepbillError::Store("Cannot determine home directory".into()))?;
        let path = base_dirs
            .home_dir()
            .join(".repbill")
            .join("billing.json");
        Ok(Self { path })
    }

    /// Store at a custom path (tests, alternate books).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the book. A missing file is an empty book; a document that
    /// exists but fails to decode is an error — the book is the system of
    /// record and must not be silently rebuilt from nothing.
    pub fn load(&self) -> Result<BillingBook> {
        if !self.path.exists() {
            return Ok(BillingBook::default());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()
            .map_err(|e| RepbillError::Store(format!("Failed to acquire read lock: {}", e)))?;

        let mut content = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read = reader.read_to_string(&mut content);
        let _ = file.unlock();
        read?;

        serde_json::from_str(&content)
            .map_err(|e| RepbillError::Store(format!("Corrupted billing book: {}", e)))
    }

    /// Save using atomic write (temp file + rename) with exclusive lock.
    pub fn save(&self, book: &mut BillingBook) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        book.updated_at = Utc::now().timestamp();
        let content = serde_json::to_string_pretty(book)
            .map_err(|e| RepbillError::Store(format!("Serialization failed: {}", e)))?;

        let temp_path = self.path.with_extension("json.tmp");
        {
            let mut file = File::create(&temp_path)
                .map_err(|e| RepbillError::Store(format!("Failed to create temp file: {}", e)))?;
            file.write_all(content.as_bytes())
                .map_err(|e| RepbillError::Store(format!("Failed to write temp file: {}", e)))?;
            file.sync_all()
                .map_err(|e| RepbillError::Store(format!("Failed to sync temp file: {}", e)))?;
        }

        let target = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        target
            .lock_exclusive()
            .map_err(|e| RepbillError::Store(format!("Failed to acquire write lock: {}", e)))?;

        fs::rename(&temp_path, &self.path)
            .map_err(|e| RepbillError::Store(format!("Failed to rename temp file: {}", e)))?;

        let _ = target.unlock();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InvoiceCalculation, InvoiceData, PaymentKind, PriceTable};
    use chrono::TimeZone;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn make_rep(account: &str) -> NewRepresentative {
        NewRepresentative {
            full_name: format!("{} owner", account),
            admin_username: account.to_string(),
            telegram_id: None,
            phone_number: None,
            store_name: None,
            status: Default::default(),
            pricing: PriceTable {
                limited_1_month: 5000.0,
                unlimited_monthly: 25000.0,
                ..PriceTable::default()
            },
        }
    }

    fn make_draft(rep_id: u64, amount: f64) -> NewInvoice {
        NewInvoice {
            representative_id: rep_id,
            amount,
            due_date: now() + chrono::Duration::days(7),
            data: InvoiceData {
                limited_usage: BTreeMap::new(),
                unlimited_usage: BTreeMap::new(),
                calculation: InvoiceCalculation::default(),
            },
        }
    }

    fn create_test_store() -> (BillingStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = BillingStore::with_path(temp_dir.path().join("billing.json"));
        (store, temp_dir)
    }

    // ========== book mutations ==========

    #[test]
    fn test_add_representative_allocates_sequential_ids() {
        let mut book = BillingBook::default();
        let first = book.add_representative(make_rep("ali_vpn"), now()).unwrap().id;
        let second = book
            .add_representative(make_rep("sara_network"), now())
            .unwrap()
            .id;

        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[test]
    fn test_add_representative_rejects_duplicate_account() {
        let mut book = BillingBook::default();
        book.add_representative(make_rep("ali_vpn"), now()).unwrap();

        let err = book
            .add_representative(make_rep("ali_vpn"), now())
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(book.representatives.len(), 1);
    }

    #[test]
    fn test_find_representative_by_account_is_case_sensitive() {
        let mut book = BillingBook::default();
        book.add_representative(make_rep("ali_vpn"), now()).unwrap();

        assert!(book.find_representative_by_account("ali_vpn").is_some());
        assert!(book.find_representative_by_account("ALI_VPN").is_none());
    }

    #[test]
    fn test_issue_invoice_starts_pending() {
        let mut book = BillingBook::default();
        let rep_id = book.add_representative(make_rep("ali_vpn"), now()).unwrap().id;

        let invoice = book.issue_invoice(make_draft(rep_id, 100000.0), now());

        assert_eq!(invoice.id, 1);
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert!(invoice.paid_at.is_none());
        assert_eq!(invoice.amount, 100000.0);
    }

    #[test]
    fn test_record_payment_credits_balance() {
        let mut book = BillingBook::default();
        let rep_id = book.add_representative(make_rep("ali_vpn"), now()).unwrap().id;

        book.record_payment(
            NewPayment {
                representative_id: rep_id,
                invoice_id: None,
                amount: 75000.0,
                kind: PaymentKind::Manual,
                description: Some("cash".into()),
            },
            now(),
        )
        .unwrap();

        assert_eq!(book.find_representative(rep_id).unwrap().balance, 75000.0);
        assert_eq!(book.payments.len(), 1);
    }

    #[test]
    fn test_record_payment_unknown_representative_fails() {
        let mut book = BillingBook::default();
        let err = book
            .record_payment(
                NewPayment {
                    representative_id: 99,
                    invoice_id: None,
                    amount: 1000.0,
                    kind: PaymentKind::Manual,
                    description: None,
                },
                now(),
            )
            .unwrap_err();

        assert!(err.to_string().contains("no representative"));
        assert!(book.payments.is_empty());
    }

    #[test]
    fn test_mark_invoice_paid_stamps_paid_at() {
        let mut book = BillingBook::default();
        let rep_id = book.add_representative(make_rep("ali_vpn"), now()).unwrap().id;
        let invoice_id = book.issue_invoice(make_draft(rep_id, 50000.0), now()).id;

        let paid_time = now() + chrono::Duration::days(2);
        let invoice = book.mark_invoice_paid(invoice_id, paid_time).unwrap();

        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.paid_at, Some(paid_time));
    }

    #[test]
    fn test_file_import_lifecycle() {
        let mut book = BillingBook::default();
        let import_id = book.open_file_import("march.csv", now());

        assert_eq!(book.file_imports[0].status, ImportStatus::Processing);

        let import = book
            .finalize_file_import(
                import_id,
                ImportStatus::Completed,
                24,
                18,
                vec!["no representative with account 'ghost'".into()],
            )
            .unwrap();

        assert_eq!(import.status, ImportStatus::Completed);
        assert_eq!(import.processed_rows, 24);
        assert_eq!(import.generated_invoices, 18);
        assert_eq!(import.errors.len(), 1);
    }

    // ========== persistence ==========

    #[test]
    fn test_missing_file_loads_empty_book() {
        let (store, _temp) = create_test_store();
        let book = store.load().unwrap();

        assert!(book.representatives.is_empty());
        assert!(book.invoices.is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let (store, _temp) = create_test_store();

        let mut book = BillingBook::default();
        let rep_id = book.add_representative(make_rep("ali_vpn"), now()).unwrap().id;
        book.issue_invoice(make_draft(rep_id, 100000.0), now());
        store.save(&mut book).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.representatives.len(), 1);
        assert_eq!(loaded.representatives[0].admin_username, "ali_vpn");
        assert_eq!(loaded.invoices.len(), 1);
        assert_eq!(loaded.invoices[0].amount, 100000.0);
    }

    #[test]
    fn test_id_allocation_survives_reload() {
        let (store, _temp) = create_test_store();

        let mut book = BillingBook::default();
        book.add_representative(make_rep("ali_vpn"), now()).unwrap();
        store.save(&mut book).unwrap();

        let mut reloaded = store.load().unwrap();
        let id = reloaded
            .add_representative(make_rep("sara_network"), now())
            .unwrap()
            .id;
        assert_eq!(id, 2);
    }

    #[test]
    fn test_corrupted_book_is_an_error() {
        let (store, _temp) = create_test_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "not valid json {{{").unwrap();

        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("Corrupted billing book"));
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let (store, _temp) = create_test_store();
        let mut book = BillingBook::default();
        store.save(&mut book).unwrap();

        assert!(store.path().exists());
        assert!(!store.path().with_extension("json.tmp").exists());
    }
}
