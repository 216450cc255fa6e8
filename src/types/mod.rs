//! Type definitions for repbill

mod billing;
mod error;
mod tier;
mod usage;

pub use billing::*;
pub use error::*;
pub use tier::*;
pub use usage::*;
