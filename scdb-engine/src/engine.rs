//! `SidechainDb`: the C6 StateEngine, the public handle over C1–C5.
//!
//! Ties the registry and the three stores together behind a single
//! `RwLock` (§5): mutating operations take the writer side, queries take
//! the reader side, and nothing inside the lock ever performs I/O.
//!
//! Ported from `SidechainDB::Update` / `ApplyStateScript` /
//! `CreateStateScript` in `sidechaindb.cpp`.

use std::fmt::Write as _;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, warn};

use scdb_core::codec::{self, Vote};
use scdb_core::primitives::{ChainTransaction, Wtxid};
use scdb_core::registry::Registry;
use scdb_core::types::{SidechainDeposit, SidechainId, Verification, SIDECHAIN_MAX_WT};
use scdb_store::{DepositLedger, ScoreBook, WtjoinStore};

use crate::client::MainchainClient;
use crate::error::ScdbError;

struct Inner<T: ChainTransaction> {
    registry: Registry,
    score_book: ScoreBook,
    wtjoin_store: WtjoinStore<T>,
    deposit_ledger: DepositLedger,
}

/// The process-wide SCDB instance, passed around as an explicit handle
/// rather than an ambient singleton (§9 Design Notes) so tests can build
/// as many independent instances as they like.
pub struct SidechainDb<T: ChainTransaction> {
    inner: RwLock<Inner<T>>,
}

impl<T: ChainTransaction> SidechainDb<T> {
    /// Build a fresh, empty SCDB over `registry`.
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        let score_book = ScoreBook::new(registry.len());
        let wtjoin_store = WtjoinStore::new(registry.len());
        Self {
            inner: RwLock::new(Inner {
                registry,
                score_book,
                wtjoin_store,
                deposit_ledger: DepositLedger::new(),
            }),
        }
    }

    /// Build a fresh SCDB over the built-in §6 registry.
    #[must_use]
    pub fn mainnet() -> Self {
        Self::new(Registry::mainnet())
    }

    /// Acquire the shared (reader) lock.
    ///
    /// A poisoned lock is recovered rather than propagated: every mutation
    /// in this module builds its would-be result in a local buffer before
    /// touching `Inner`, so a panic mid-mutation (a bug, not a reachable
    /// consensus condition) never leaves `Inner` half-written -- the stale
    /// guard is safe to read.
    fn read(&self) -> RwLockReadGuard<'_, Inner<T>> {
        self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner<T>> {
        self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register a new WT^ candidate (§4.6 `add_wtjoin`).
    ///
    /// Checks `WTJoinStore` capacity, hash uniqueness, sidechain validity,
    /// and that `sid` does not already have `SIDECHAIN_MAX_WT` distinct
    /// live candidates (§3 invariant 4); appends a starting
    /// `Verification{sid, tau, 0, tx.txid()}`. If the append path fails,
    /// nothing is inserted into `WTJoinStore` (rollback).
    ///
    /// # Errors
    ///
    /// Returns [`ScdbError::InvalidSidechain`], [`ScdbError::CapacityExceeded`],
    /// or [`ScdbError::DuplicateEntry`] per [`scdb_store::WtjoinError`], or
    /// [`ScdbError::CapacityExceeded`] if `sid` is already at
    /// `SIDECHAIN_MAX_WT` live candidates.
    pub fn add_wtjoin(&self, sid: SidechainId, tx: T) -> Result<(), ScdbError> {
        let mut inner = self.write();
        if !inner.registry.is_valid(sid) {
            return Err(ScdbError::InvalidSidechain { sidechain_id: sid });
        }
        if inner.score_book.latest(sid).len() >= SIDECHAIN_MAX_WT {
            return Err(ScdbError::CapacityExceeded { capacity: SIDECHAIN_MAX_WT });
        }
        let tau = inner.registry.get(sid).tau();
        let wtxid = tx.txid();

        // WTJoinStore has no way to undo an insert, and ScoreBook is
        // append-only and so can't undo one either -- so the only way to
        // honor "if either half fails, neither happens" is to attempt the
        // half that can still fail (capacity/duplicate) before the half
        // that, with `sid` already validated, cannot.
        inner.wtjoin_store.add(tx)?;
        inner
            .score_book
            .update(&inner.registry, sid, tau, 0, wtxid, false)
            .expect("sid already validated above");
        Ok(())
    }

    /// Ingest a deposit transaction (§4.6 `add_deposit`). Delegates to
    /// [`scdb_store::DepositLedger::add`].
    ///
    /// # Errors
    ///
    /// See [`scdb_store::DepositError`].
    pub fn add_deposit(&self, tx: &T) -> Result<(), ScdbError> {
        let mut inner = self.write();
        let registry = inner.registry.clone();
        inner.deposit_ledger.add(tx, &registry)?;
        Ok(())
    }

    /// True if any sidechain has at least one recorded verification
    /// (generalized `HasState`, SPEC_FULL §3).
    #[must_use]
    pub fn has_state(&self) -> bool {
        self.read().score_book.has_state()
    }

    /// The latest-per-candidate view for `sid` (§4.5).
    #[must_use]
    pub fn latest(&self, sid: SidechainId) -> Vec<Verification> {
        self.read().score_book.latest(sid)
    }

    /// Whether `sid`'s `wtxid` has reached its registered `min_work_score`
    /// (§4.5 `check_work_score`).
    #[must_use]
    pub fn check_work_score(&self, sid: SidechainId, wtxid: Wtxid) -> bool {
        let inner = self.read();
        inner.score_book.check_work_score(&inner.registry, sid, wtxid)
    }

    /// The current best WT^ candidate for `sid`, if any clears
    /// `min_work_score` (§4.5 `best`).
    #[must_use]
    pub fn best(&self, sid: SidechainId) -> Option<Wtxid> {
        let inner = self.read();
        inner.score_book.best(&inner.registry, sid)
    }

    /// All cached deposits for `sid`, in insertion order.
    #[must_use]
    pub fn deposits(&self, sid: SidechainId) -> Vec<SidechainDeposit> {
        self.read().deposit_ledger.get(sid)
    }

    /// Look up a cached WT^ transaction by `wtxid`.
    #[must_use]
    pub fn wtjoin(&self, wtxid: Wtxid) -> Option<T> {
        self.read().wtjoin_store.get(wtxid).cloned()
    }

    /// The greatest tau boundary `h <= height` for `sid` (`h mod tau == 0`),
    /// assuming boundaries are counted from height 0 (§9 Open Question (b)).
    ///
    /// # Panics
    ///
    /// Panics if `sid` is not registered.
    #[must_use]
    pub fn last_tau_boundary(&self, sid: SidechainId, height: u32) -> u32 {
        let inner = self.read();
        let tau = inner.registry.get(sid).tau();
        height - height % tau
    }

    /// The verified WT^ for `sid` at `height`, but only at an exact tau
    /// boundary -- `height % tau == 0` -- matching the source's
    /// `GetWTJoinTx(sid, height)` (SPEC_FULL §3). Returns `None` off-boundary
    /// or if there is no candidate clearing `min_work_score`.
    ///
    /// The engine does not own the mainchain broadcast step; callers fetch
    /// the full transaction via [`Self::wtjoin`].
    #[must_use]
    pub fn verified_wtjoin(&self, sid: SidechainId, height: u32) -> Option<Wtxid> {
        let inner = self.read();
        let tau = inner.registry.try_get(sid)?.tau();
        if height % tau != 0 {
            return None;
        }
        inner.score_book.best(&inner.registry, sid)
    }

    /// Produce this block's proposed state script (§4.6 `create_state_script`).
    #[must_use]
    pub fn create_state_script(&self, height: u32) -> Vec<u8> {
        let inner = self.read();
        let mut scores_by_sid = Vec::with_capacity(inner.registry.len());
        for sidechain in inner.registry.iter() {
            let snapshot = inner.score_book.latest(sidechain.id);
            let last_boundary = height - height % sidechain.tau();
            let in_verification = height - last_boundary >= sidechain.wait_period;

            let mut best_index = None;
            for (idx, v) in snapshot.iter().enumerate() {
                let is_better = match best_index {
                    None => true,
                    Some(b) => v.work_score > snapshot[b].work_score,
                };
                if is_better {
                    best_index = Some(idx);
                }
            }

            let votes = snapshot
                .iter()
                .enumerate()
                .map(|(idx, _)| {
                    if !in_verification {
                        Vote::Ignore
                    } else if Some(idx) == best_index {
                        Vote::Verify
                    } else {
                        Vote::Reject
                    }
                })
                .collect();
            scores_by_sid.push(votes);
        }
        codec::encode(&scores_by_sid)
    }

    /// The per-block entry point (§4.6 `apply_block_coinbase`).
    ///
    /// Returns `Ok(true)` if the block's vote was applied, `Ok(false)` if
    /// there was nothing to update (no live WT^ anywhere), and `Err` if the
    /// would-be update was rejected -- in which case SCDB is unchanged.
    ///
    /// # Errors
    ///
    /// [`ScdbError::MalformedScript`] or [`ScdbError::ArithmeticAbort`] if
    /// neither the single valid state script nor the all-ignore fallback
    /// could be applied cleanly.
    pub fn apply_block_coinbase(&self, coinbase: &T) -> Result<bool, ScdbError> {
        let mut inner = self.write();
        if !inner.score_book.has_state() {
            return Ok(false);
        }

        let candidate_scripts: Vec<&[u8]> = coinbase
            .outputs()
            .iter()
            .map(|o| o.script_pubkey.as_slice())
            .filter(|s| codec::has_state_script_header(s))
            .collect();

        if candidate_scripts.len() == 1 {
            match Self::try_apply_single_script(&inner, candidate_scripts[0]) {
                Ok(updates) => {
                    Self::commit_updates(&mut inner, &updates);
                    return Ok(true);
                }
                Err(err) => {
                    warn!("state script dry run failed, leaving SCDB unchanged: {err}");
                    return Err(err);
                }
            }
        }

        debug!(
            "{} candidate state scripts in coinbase, falling back to all-ignore ballot",
            candidate_scripts.len()
        );
        match Self::all_ignore_ballot(&inner) {
            Ok(updates) => {
                Self::commit_updates(&mut inner, &updates);
                Ok(true)
            }
            Err(err) => {
                warn!("all-ignore fallback failed, leaving SCDB unchanged: {err}");
                Err(err)
            }
        }
    }

    /// Dry-run the exactly-one-script case: parse, then walk the vote
    /// stream against the latest-per-candidate snapshot (§4.6
    /// `apply_state_script`). Pure function over `&Inner` -- nothing is
    /// mutated here.
    fn try_apply_single_script(
        inner: &Inner<T>,
        script: &[u8],
    ) -> Result<Vec<Verification>, ScdbError> {
        let votes = codec::parse(script)?;
        let snapshot: Vec<Vec<Verification>> = inner
            .registry
            .iter()
            .map(|s| inner.score_book.latest(s.id))
            .collect();

        let mut updates = Vec::with_capacity(votes.len());
        for (sid_cursor, wt_cursor, vote) in votes.iter() {
            if sid_cursor >= snapshot.len() {
                return Err(ScdbError::MalformedScript {
                    detail: format!("sid_cursor {sid_cursor} out of range"),
                });
            }
            let row = &snapshot[sid_cursor];
            if wt_cursor >= row.len() {
                return Err(ScdbError::MalformedScript {
                    detail: format!("wt_cursor {wt_cursor} out of range for sidechain {sid_cursor}"),
                });
            }
            let old = row[wt_cursor];
            updates.push(Self::step_vote(old, vote)?);
        }
        Ok(updates)
    }

    /// The implicit all-ignore ballot (§4.6 step 3): decrement `blocks_left`
    /// by 1 for every live WT^ across every sidechain, leaving `work_score`
    /// unchanged.
    fn all_ignore_ballot(inner: &Inner<T>) -> Result<Vec<Verification>, ScdbError> {
        let mut updates = Vec::new();
        for sidechain in inner.registry.iter() {
            for old in inner.score_book.latest(sidechain.id) {
                updates.push(Self::step_vote(old, Vote::Ignore)?);
            }
        }
        Ok(updates)
    }

    /// Apply one vote's arithmetic to `old`, saturating never -- any
    /// under/overflow fails deterministically instead (§4.6, §9 Design
    /// Notes: "the `REJECT` branch must abort, not wrap, when
    /// `work_score == 0`").
    fn step_vote(old: Verification, vote: Vote) -> Result<Verification, ScdbError> {
        let new_blocks = old.blocks_left.checked_sub(1).ok_or_else(|| {
            ScdbError::ArithmeticAbort {
                detail: format!("blocks_left underflow for wtxid {}", old.wtxid),
            }
        })?;
        let new_score = match vote {
            Vote::Reject => old.work_score.checked_sub(1).ok_or_else(|| {
                ScdbError::ArithmeticAbort {
                    detail: format!("work_score underflow for wtxid {}", old.wtxid),
                }
            })?,
            Vote::Verify => old.work_score.checked_add(1).ok_or_else(|| {
                ScdbError::ArithmeticAbort {
                    detail: format!("work_score overflow for wtxid {}", old.wtxid),
                }
            })?,
            Vote::Ignore => old.work_score,
        };
        Ok(Verification::new(
            old.sidechain_id,
            new_blocks,
            new_score,
            old.wtxid,
        ))
    }

    /// Commit a pre-validated batch of updates in one pass. Called only
    /// after the corresponding dry run succeeded -- every `sidechain_id` in
    /// `updates` is already known-valid.
    fn commit_updates(inner: &mut Inner<T>, updates: &[Verification]) {
        for v in updates {
            inner
                .score_book
                .update(&inner.registry, v.sidechain_id, v.blocks_left, v.work_score, v.wtxid, false)
                .expect("sidechain_id in a committed update is always valid (checked in dry run)");
        }
    }

    /// Refresh the deposit cache for `sid` from `client`, outside the lock
    /// for the blocking fetch and folded in afterward via `add_deposit`-style
    /// deduplication (§5 suspension points).
    ///
    /// # Errors
    ///
    /// [`ScdbError::UpstreamUnavailable`] if the client call fails. SCDB is
    /// never mutated in that case.
    pub fn refresh_deposits<C: MainchainClient>(
        &self,
        client: &C,
        sid: SidechainId,
    ) -> Result<usize, ScdbError> {
        let fetched = client.fetch_deposits(sid).map_err(|err| ScdbError::UpstreamUnavailable {
            detail: err.to_string(),
        })?;

        let mut inner = self.write();
        let mut added = 0usize;
        for deposit in fetched {
            if !inner.deposit_ledger.has(&deposit) {
                inner.deposit_ledger.adopt(deposit);
                added += 1;
            }
        }
        Ok(added)
    }

    /// Broadcast `sid`'s cached WT^ via `client`, outside the lock.
    ///
    /// # Errors
    ///
    /// [`ScdbError::UpstreamUnavailable`] if the client call fails, or
    /// [`ScdbError::InvalidSidechain`] if `wtxid` is not cached.
    pub fn submit_wtjoin<C: MainchainClient>(
        &self,
        client: &C,
        wtxid: Wtxid,
        tx_hex: &str,
    ) -> Result<(), ScdbError> {
        if self.read().wtjoin_store.get(wtxid).is_none() {
            return Err(ScdbError::InvariantViolation {
                detail: format!("wtxid {wtxid} is not cached, nothing to submit"),
            });
        }
        client
            .submit_wtjoin(wtxid, tx_hex)
            .map_err(|err| ScdbError::UpstreamUnavailable {
                detail: err.to_string(),
            })
    }

    /// A multi-line diagnostic dump of every sidechain's latest-verification
    /// view (ported from `SidechainDB::ToString`, SPEC_FULL §3).
    #[must_use]
    pub fn render(&self) -> String {
        let inner = self.read();
        let mut out = String::new();
        for sidechain in inner.registry.iter() {
            let _ = writeln!(out, "{sidechain}");
            for v in inner.score_book.latest(sidechain.id) {
                let _ = writeln!(out, "  {v}");
            }
        }
        out
    }
}
