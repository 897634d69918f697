//! Sidechain Coordination Database: the state engine (C6) tying the
//! registry and stores together behind a single lock.
//!
//! # API Surface
//!
//! - [`engine::SidechainDb`] -- the public handle: block ingestion,
//!   two-phase update, state-script production, work-score queries.
//! - [`client::MainchainClient`] -- the collaborator contract for the two
//!   blocking operations the engine needs from the mainchain daemon.
//! - [`error::ScdbError`] -- the unified error taxonomy (§7).

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod engine;
pub mod error;

pub use client::MainchainClient;
pub use engine::SidechainDb;
pub use error::ScdbError;
