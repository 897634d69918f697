//! Sidechain Coordination Database: the three mutable stores built on
//! `scdb-core`'s data model (C3, C4, C5).
//!
//! # API Surface
//!
//! - [`deposit_ledger::DepositLedger`] -- cache of accepted deposits.
//! - [`wtjoin_store::WtjoinStore`] -- cache of full WT^ transactions.
//! - [`scorebook::ScoreBook`] -- per-sidechain voting log.
//!
//! Each store is independent and carries no lock of its own; `scdb-engine`
//! is what wraps the three of them behind a single exclusive/shared lock
//! and sequences updates across them (§5).

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod deposit_ledger;
pub mod scorebook;
pub mod wtjoin_store;

pub use deposit_ledger::{DepositError, DepositLedger};
pub use scorebook::{ScoreBook, ScoreBookError};
pub use wtjoin_store::{WtjoinError, WtjoinStore};
