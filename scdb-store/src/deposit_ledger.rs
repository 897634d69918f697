//! `DepositLedger`: cache of accepted deposits, deduplicated (C3).
//!
//! Ported from `SidechainDB::AddDeposit` / `vDepositCache` in
//! `sidechaindb.cpp`.

use scdb_core::primitives::{parse_deposit_script, ChainTransaction};
use scdb_core::registry::Registry;
use scdb_core::types::SidechainDeposit;

/// Cache of accepted deposits, indexed by sidechain and deduplicated by
/// structural equality.
#[derive(Debug, Clone, Default)]
pub struct DepositLedger {
    deposits: Vec<SidechainDeposit>,
}

/// Failure adding a transaction to the deposit ledger.
///
/// `add` is atomic: on any of these, nothing is mutated (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositError {
    /// A deposit-shaped output named a sidechain id outside the registry.
    InvalidSidechain { sidechain_id: u8 },
    /// A deposit-shaped output had an all-zero `key_id`.
    NullKeyId,
    /// The transaction itself is null.
    NullTransaction,
    /// The transaction does not satisfy the external `is_sidechain_deposit`
    /// predicate.
    NotRecognizedAsDeposit,
}

impl std::fmt::Display for DepositError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSidechain { sidechain_id } => {
                write!(f, "deposit output names unregistered sidechain {sidechain_id}")
            }
            Self::NullKeyId => write!(f, "deposit output has a null key_id"),
            Self::NullTransaction => write!(f, "deposit transaction is null"),
            Self::NotRecognizedAsDeposit => {
                write!(f, "transaction does not satisfy is_sidechain_deposit")
            }
        }
    }
}

impl std::error::Error for DepositError {}

impl DepositLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every output of `tx` for a deposit script (§6) and cache any
    /// new, valid deposits.
    ///
    /// `tx.is_null()`/`tx.is_sidechain_deposit()` are only checked once a
    /// deposit-shaped output has actually been found (§4.3: these checks
    /// apply "for each match", mirroring the `for (const SidechainDeposit&
    /// d : vDepositAdd)` loop in `SidechainDB::AddDeposit`) -- an ordinary
    /// transaction with no deposit-shaped outputs is a silent no-op, not a
    /// rejection, since this is called on every connected transaction
    /// (§2), not just pre-filtered deposit transactions.
    ///
    /// Atomic: candidates are collected first; if *any* candidate output
    /// fails validation the whole transaction is rejected and the ledger
    /// is left unchanged (§4.3, §8 scenario 6).
    ///
    /// # Errors
    ///
    /// Returns the first [`DepositError`] encountered. The ledger is
    /// unmodified in that case.
    pub fn add<T: ChainTransaction>(
        &mut self,
        tx: &T,
        registry: &Registry,
    ) -> Result<(), DepositError> {
        let parsed_outputs: Vec<_> = tx
            .outputs()
            .iter()
            .filter_map(|output| parse_deposit_script(&output.script_pubkey))
            .collect();

        if parsed_outputs.is_empty() {
            return Ok(());
        }

        if tx.is_null() {
            return Err(DepositError::NullTransaction);
        }
        if !tx.is_sidechain_deposit() {
            return Err(DepositError::NotRecognizedAsDeposit);
        }

        let mut candidates = Vec::with_capacity(parsed_outputs.len());
        for parsed in parsed_outputs {
            if !registry.is_valid(parsed.sidechain_id) {
                return Err(DepositError::InvalidSidechain {
                    sidechain_id: parsed.sidechain_id,
                });
            }
            if parsed.key_id.is_null() {
                return Err(DepositError::NullKeyId);
            }
            candidates.push(SidechainDeposit::new(
                parsed.sidechain_id,
                parsed.key_id,
                tx.txid(),
            ));
        }

        for deposit in candidates {
            if !self.has(&deposit) {
                self.deposits.push(deposit);
            }
        }
        Ok(())
    }

    /// Insert an already-validated deposit directly, bypassing output
    /// scanning.
    ///
    /// For folding in results fetched from the mainchain collaborator's
    /// `fetch_deposits` (§4.7), which hands back `SidechainDeposit` values
    /// it has already validated -- there is no transaction to re-scan.
    /// Deduplicates the same as [`Self::add`] (structural equality, §3
    /// invariant 6).
    pub fn adopt(&mut self, deposit: SidechainDeposit) {
        if !self.has(&deposit) {
            self.deposits.push(deposit);
        }
    }

    /// All cached deposits for `sid`, in insertion order.
    #[must_use]
    pub fn get(&self, sid: u8) -> Vec<SidechainDeposit> {
        self.deposits
            .iter()
            .copied()
            .filter(|d| d.sidechain_id == sid)
            .collect()
    }

    /// True if `deposit` is already cached (structural equality, §3 invariant 6).
    #[must_use]
    pub fn has(&self, deposit: &SidechainDeposit) -> bool {
        self.deposits.contains(deposit)
    }

    /// Total number of cached deposits across all sidechains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deposits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deposits.is_empty()
    }
}
