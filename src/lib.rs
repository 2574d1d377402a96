//! # Transaction Batch Files
//!
//! Reads, validates and rewrites fixed-width transaction batch files: one
//! header line, any number of transaction lines and one footer line, each
//! exactly 120 columns wide.
//!
//! ## Design Principles
//!
//! - **Fixed-point amounts**: 2 decimal places via `rust_decimal`, stored on
//!   disk as integer minor units
//! - **Named fields**: records are addressed by field name, never by column
//!   position
//! - **Strict invariants**: footer aggregates always match the table after a
//!   successful write
//! - **Whole-file rewrites**: every committed change rewrites the file
//!
//! ## Example
//!
//! ```no_run
//! use txn_batch::{Store, Target};
//!
//! let mut store = Store::load("task_data.txt").unwrap();
//! store.change_field(Target::Transaction(10), "Amount", "4123.223").unwrap();
//! store
//!     .append_transaction(&[("Amount", "23412.12"), ("Currency", "PLN"), ("Reserved", "")])
//!     .unwrap();
//! ```

pub mod amount;
pub mod codec;
pub mod config;
pub mod error;
pub mod layout;
pub mod record;
pub mod report;
pub mod store;
pub mod validate;

pub use amount::Amount;
pub use codec::Batch;
pub use config::Config;
pub use error::{BatchError, Result, ValidationError};
pub use layout::{Layout, RecordKind};
pub use record::{Record, Value};
pub use report::{LogReporter, Reporter};
pub use store::{Discrepancy, Outcome, Store, Target};
