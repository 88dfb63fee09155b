#![warn(clippy::all, missing_docs)]

//! Core domain logic for Factory Ledger.
//!
//! This crate hosts the game models, the shopping-list calculator, the
//! key-value store backends and the tab ledger used by the terminal UI.

pub mod command;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod parse;
pub mod registry;
pub mod shopping;
pub mod store;

pub use command::{Command, Outcome, ShoppingTarget};
pub use config::AppConfig;
pub use error::LedgerError;
pub use ledger::{Ledger, Persistence};
pub use models::{GameRecord, InputLine, Job, Resource, ResourceKind};
pub use shopping::{ShoppingList, TotalsView};
pub use store::{JsonFileStore, MemoryStore, Store, StoreError};
