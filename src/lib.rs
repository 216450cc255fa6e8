//! Invoice engine for VPN reseller back offices.
//!
//! Parses usage-export files, prices them against per-representative
//! price tables, and persists the resulting invoices, payments, and
//! import audit records in a local billing book.

pub mod cli;
pub mod parser;
pub mod services;
pub mod types;
