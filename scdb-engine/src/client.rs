//! Mainchain client: the collaborator contract (§4.7).
//!
//! Transport and serialization belong to the implementor; the engine only
//! consumes the two logical operations below, and only ever outside its
//! lock (§5 suspension points).

use scdb_core::primitives::Wtxid;
use scdb_core::types::{SidechainDeposit, SidechainId};

/// Blocking I/O surface the engine needs from the mainchain daemon.
///
/// Implementors typically wrap a JSON-RPC client. Failures are reported to
/// the caller and never mutate SCDB (§7: `UpstreamUnavailable` is never
/// fatal and never touches engine state).
pub trait MainchainClient {
    /// The collaborator's own failure type.
    type Error: std::fmt::Display;

    /// Fetch deposits for `sid` from the mainchain daemon, to be folded into
    /// the deposit cache via `add_deposit` (deduplication happens there, not
    /// here).
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` on any transport/RPC failure.
    fn fetch_deposits(&self, sid: SidechainId) -> Result<Vec<SidechainDeposit>, Self::Error>;

    /// Broadcast a locally assembled WT^ upstream.
    ///
    /// `tx_hex` is the collaborator's own serialization of the full
    /// transaction; the engine does not construct it (block/transaction
    /// primitives are out of scope, §1).
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` on any transport/RPC failure.
    fn submit_wtjoin(&self, wtxid: Wtxid, tx_hex: &str) -> Result<(), Self::Error>;
}
