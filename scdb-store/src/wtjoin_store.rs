//! `WTJoinStore`: cache of full withdrawal-bundle transactions (C4).
//!
//! Ported from `vWTJoinCache` / `HaveWTJoinCached` / `GetWTJoinTx` in
//! `sidechaindb.cpp`.

use scdb_core::primitives::{ChainTransaction, Wtxid};
use scdb_core::types::SIDECHAIN_MAX_WT;

/// Cache of full WT^ transactions, keyed by `wtxid`, capacity-bounded by
/// `SIDECHAIN_MAX_WT * registry_len` (§3 invariant 5).
#[derive(Debug, Clone)]
pub struct WtjoinStore<T> {
    capacity: usize,
    entries: Vec<T>,
}

/// Failure adding a WT^ to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WtjoinError {
    /// The store is already at `SIDECHAIN_MAX_WT * registry_len` entries.
    CapacityExceeded { capacity: usize },
    /// A transaction with this `wtxid` is already cached.
    DuplicateEntry,
}

impl std::fmt::Display for WtjoinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CapacityExceeded { capacity } => {
                write!(f, "WT^ store at capacity ({capacity})")
            }
            Self::DuplicateEntry => write!(f, "WT^ with this wtxid is already cached"),
        }
    }
}

impl std::error::Error for WtjoinError {}

impl<T: ChainTransaction> WtjoinStore<T> {
    /// Build a store bounded to `SIDECHAIN_MAX_WT * registry_len` entries.
    #[must_use]
    pub fn new(registry_len: usize) -> Self {
        Self {
            capacity: SIDECHAIN_MAX_WT * registry_len,
            entries: Vec::new(),
        }
    }

    /// Cache a WT^ transaction.
    ///
    /// # Errors
    ///
    /// Returns [`WtjoinError::CapacityExceeded`] if the store is full, or
    /// [`WtjoinError::DuplicateEntry`] if `tx.txid()` is already cached.
    pub fn add(&mut self, tx: T) -> Result<(), WtjoinError> {
        if self.entries.len() >= self.capacity {
            return Err(WtjoinError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        if self.has(tx.txid()) {
            return Err(WtjoinError::DuplicateEntry);
        }
        self.entries.push(tx);
        Ok(())
    }

    /// Look up the full transaction by `wtxid`.
    #[must_use]
    pub fn get(&self, wtxid: Wtxid) -> Option<&T> {
        self.entries.iter().find(|tx| tx.txid() == wtxid)
    }

    /// True if `wtxid` is cached.
    #[must_use]
    pub fn has(&self, wtxid: Wtxid) -> bool {
        self.entries.iter().any(|tx| tx.txid() == wtxid)
    }

    /// Number of cached transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The configured capacity (`SIDECHAIN_MAX_WT * registry_len`).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
