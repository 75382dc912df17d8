//! Tally - terminal ledger with bank-statement reconciliation
//!
//! Keeps accounts and their transactions in JSON files and reconciles them
//! against bank statements. A reconciliation session marks which
//! transactions cleared, compares the running balance with the statement,
//! and on completion locks those transactions and records the session in an
//! append-only history.
//!
//! # Architecture
//!
//! - `config`: Paths and user settings
//! - `error`: Error type shared by every layer
//! - `models`: Accounts, transactions, statements and sessions
//! - `reconcile`: Difference resolver and staleness summaries
//! - `storage`: JSON file storage, session store and history index
//! - `audit`: Append-only audit log
//! - `services`: Business logic, including the reconciliation workflow
//! - `display`: Plain-text formatting for the CLI
//! - `cli`: Command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use tally::config::{paths::TallyPaths, settings::Settings};
//! use tally::storage::Storage;
//!
//! let paths = TallyPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::new(paths)?;
//! storage.load_all()?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod services;
pub mod storage;

pub use error::{TallyError, TallyResult};
