//! The append-only data model: `Sidechain`, `Verification`, `SidechainDeposit`.
//!
//! Ported in spirit from `Sidechain` / `SidechainVerification` /
//! `SidechainDeposit` in `sidechaindb.h`.

use std::fmt;

use crate::primitives::{KeyId, Txid, Wtxid};

/// Small unsigned identifier for a registered sidechain. `u8` matches the
/// wire format's `sid_cursor` byte-width (§4.2).
pub type SidechainId = u8;

/// Max number of distinct live WT^ candidates per sidechain during one tau.
///
/// Consensus-critical: never runtime-configurable.
pub const SIDECHAIN_MAX_WT: usize = 3;

/// A registered sidechain and its windowing parameters.
///
/// Immutable once constructed. `tau` is derived, not stored independently,
/// so it can never drift from `wait_period + verification_period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sidechain {
    pub id: SidechainId,
    name: &'static str,
    pub wait_period: u32,
    pub verification_period: u32,
    pub min_work_score: u32,
}

impl Sidechain {
    /// Construct a sidechain entry.
    ///
    /// # Panics
    ///
    /// Panics if `wait_period` or `verification_period` is zero -- both
    /// must be `>= 1` per `spec.md` §3. This is a programming error in the
    /// fixed, startup-time registry table, not a runtime condition.
    #[must_use]
    pub fn new(
        id: SidechainId,
        name: &'static str,
        wait_period: u32,
        verification_period: u32,
        min_work_score: u32,
    ) -> Self {
        assert!(wait_period >= 1, "wait_period must be >= 1");
        assert!(verification_period >= 1, "verification_period must be >= 1");
        Self {
            id,
            name,
            wait_period,
            verification_period,
            min_work_score,
        }
    }

    /// Human label, e.g. `"SIDECHAIN_TEST"`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// `tau = wait_period + verification_period`: the length of one voting
    /// epoch, in blocks.
    #[must_use]
    pub const fn tau(&self) -> u32 {
        self.wait_period + self.verification_period
    }
}

impl fmt::Display for Sidechain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (id={}, wait={}, verify={}, min_work_score={}, tau={})",
            self.name,
            self.id,
            self.wait_period,
            self.verification_period,
            self.min_work_score,
            self.tau()
        )
    }
}

/// An entry in the scoring log: one block's recorded state for one WT^
/// candidate on one sidechain.
///
/// Immutable once appended; a new `Verification` for the same `wtxid`
/// supersedes earlier ones (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    pub sidechain_id: SidechainId,
    pub blocks_left: u32,
    pub work_score: u32,
    pub wtxid: Wtxid,
}

impl Verification {
    #[must_use]
    pub const fn new(
        sidechain_id: SidechainId,
        blocks_left: u32,
        work_score: u32,
        wtxid: Wtxid,
    ) -> Self {
        Self {
            sidechain_id,
            blocks_left,
            work_score,
            wtxid,
        }
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sidechain_id={} blocks_left={} work_score={} wtxid={}",
            self.sidechain_id, self.blocks_left, self.work_score, self.wtxid
        )
    }
}

/// A cached parent-chain deposit destined for a sidechain recipient.
///
/// Equality is structural on all three fields (§3), which is exactly
/// `#[derive(PartialEq)]` over `(sidechain_id, key_id, txid)` -- the core
/// never needs the full transaction body to decide cache membership, only
/// its hash, so that's what is stored rather than the whole `Tx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidechainDeposit {
    pub sidechain_id: SidechainId,
    pub key_id: KeyId,
    pub dtx_id: Txid,
}

impl SidechainDeposit {
    #[must_use]
    pub const fn new(sidechain_id: SidechainId, key_id: KeyId, dtx_id: Txid) -> Self {
        Self {
            sidechain_id,
            key_id,
            dtx_id,
        }
    }
}

impl fmt::Display for SidechainDeposit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sidechain_id={} key_id={:?} dtx={}",
            self.sidechain_id, self.key_id, self.dtx_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tau_is_sum_of_periods() {
        let s = Sidechain::new(0, "SIDECHAIN_TEST", 100, 200, 100);
        assert_eq!(s.tau(), 300);
    }

    #[test]
    #[should_panic(expected = "wait_period")]
    fn zero_wait_period_panics() {
        Sidechain::new(0, "X", 0, 1, 1);
    }

    #[test]
    fn deposit_equality_is_structural() {
        let txid = Txid::from_bytes([1u8; 32]);
        let key = KeyId::from_bytes([2u8; 20]);
        let a = SidechainDeposit::new(0, key, txid);
        let b = SidechainDeposit::new(0, key, txid);
        assert_eq!(a, b);

        let c = SidechainDeposit::new(1, key, txid);
        assert_ne!(a, c);
    }
}
