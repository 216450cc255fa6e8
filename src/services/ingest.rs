//! Ingestion pipeline: validate, parse, assemble, persist
//!
//! One pass per uploaded file. The parse and assembly stages are pure;
//! only the final book save mutates anything, so a failed file never
//! leaves half an import behind.

use crate::parser::{classify_import_file, parse_usage_csv, ImportKind, SheetConverter};
use crate::services::assembler::assemble_invoices;
use crate::services::store::{BillingBook, BillingStore};
use crate::types::{
    FileImport, FileParseResult, ImportStatus, Invoice, NewInvoice, RepbillError, Result,
};
use chrono::Utc;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Default payment window for newly issued invoices, in days.
pub const DEFAULT_DUE_DAYS: i64 = 7;

/// Outcome of ingesting one file: the audit record plus the invoices it
/// generated.
#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub import: FileImport,
    pub invoices: Vec<Invoice>,
}

/// Parse + pricing pass with nothing persisted.
#[derive(Debug, Serialize)]
pub struct PreviewReport {
    pub parse: FileParseResult,
    pub drafts: Vec<NewInvoice>,
    pub unmatched: Vec<String>,
}

/// Orchestrates file ingestion against a billing store.
pub struct IngestService {
    store: BillingStore,
    converter: Option<Box<dyn SheetConverter>>,
    due_days: i64,
}

impl IngestService {
    pub fn new(store: BillingStore) -> Self {
        Self {
            store,
            converter: None,
            due_days: DEFAULT_DUE_DAYS,
        }
    }

    pub fn with_due_days(mut self, due_days: i64) -> Self {
        self.due_days = due_days;
        self
    }

    /// Attach a spreadsheet converter so `.ods`/`.xls`/`.xlsx` uploads can
    /// be ingested.
    pub fn with_converter(mut self, converter: Box<dyn SheetConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn store(&self) -> &BillingStore {
        &self.store
    }

    /// Ingest one usage-export file: invoices are issued for every matched
    /// representative and a completed [`FileImport`] records the pass.
    /// Unmatched accounts and row faults land in the import's `errors`.
    pub fn ingest_file(&self, path: &Path) -> Result<ImportReport> {
        let parse = self.read_and_parse(path)?;
        let mut book = self.store.load()?;
        let report = ingest_into(&mut book, &file_name_of(path), parse, self.due_days);
        self.store.save(&mut book)?;
        Ok(report)
    }

    /// Parse and price a file without touching the book.
    pub fn preview_file(&self, path: &Path) -> Result<PreviewReport> {
        let parse = self.read_and_parse(path)?;
        let book = self.store.load()?;
        let outcome = assemble_invoices(&parse, &book, Utc::now(), self.due_days);
        Ok(PreviewReport {
            parse,
            drafts: outcome.drafts,
            unmatched: outcome.unmatched,
        })
    }

    /// Ingest every `*.csv` under a directory.
    ///
    /// The pure read+parse stage runs in parallel; book mutation stays
    /// sequential and everything lands in one save. A file that cannot be
    /// read produces a failed import record, not a failed batch.
    pub fn ingest_dir(&self, dir: &Path) -> Result<Vec<ImportReport>> {
        let pattern = dir.join("*.csv");
        let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
            .map_err(|e| RepbillError::Config(format!("bad glob pattern: {}", e)))?
            .filter_map(|entry| entry.ok())
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(RepbillError::Parse(format!(
                "no CSV exports under {}",
                dir.display()
            )));
        }

        let parsed: Vec<(PathBuf, Result<FileParseResult>)> = files
            .par_iter()
            .map(|file| (file.clone(), self.read_and_parse(file)))
            .collect();

        let mut book = self.store.load()?;
        let mut reports = Vec::with_capacity(parsed.len());

        for (path, outcome) in parsed {
            let filename = file_name_of(&path);
            match outcome {
                Ok(parse) => reports.push(ingest_into(&mut book, &filename, parse, self.due_days)),
                Err(e) => {
                    eprintln!("[repbill] Warning: failed to read {:?}: {}", path, e);
                    reports.push(failed_import(&mut book, &filename, e.to_string()));
                }
            }
        }

        self.store.save(&mut book)?;
        Ok(reports)
    }

    fn read_and_parse(&self, path: &Path) -> Result<FileParseResult> {
        let content = match classify_import_file(path)? {
            ImportKind::Csv => std::fs::read_to_string(path)?,
            ImportKind::Spreadsheet => match &self.converter {
                Some(converter) => converter.convert_to_csv(path)?,
                None => {
                    return Err(RepbillError::UnsupportedFormat(format!(
                        "{}: spreadsheet uploads need a converter; export the sheet as CSV",
                        path.display()
                    )))
                }
            },
        };
        Ok(parse_usage_csv(&content))
    }
}

/// Run one parse result through assembly and the book, producing the
/// completed import record.
fn ingest_into(
    book: &mut BillingBook,
    filename: &str,
    parse: FileParseResult,
    due_days: i64,
) -> ImportReport {
    let now = Utc::now();
    let import_id = book.open_file_import(filename, now);

    let outcome = assemble_invoices(&parse, book, now, due_days);
    let invoices: Vec<Invoice> = outcome
        .drafts
        .into_iter()
        .map(|draft| book.issue_invoice(draft, now).clone())
        .collect();

    let mut errors = parse.errors;
    errors.extend(outcome.unmatched);

    let import = book
        .finalize_file_import(
            import_id,
            ImportStatus::Completed,
            parse.total_rows,
            invoices.len() as u64,
            errors,
        )
        .expect("import record just opened")
        .clone();

    ImportReport { import, invoices }
}

/// Record a file that never made it to parsing.
fn failed_import(book: &mut BillingBook, filename: &str, error: String) -> ImportReport {
    let now = Utc::now();
    let import_id = book.open_file_import(filename, now);
    let import = book
        .finalize_file_import(import_id, ImportStatus::Failed, 0, 0, vec![error])
        .expect("import record just opened")
        .clone();

    ImportReport {
        import,
        invoices: Vec::new(),
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
