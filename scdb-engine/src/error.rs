//! Unified error taxonomy for the engine (§7).
//!
//! Every lower-layer error (`codec::ParseError`, `DepositError`,
//! `WtjoinError`, `ScoreBookError`) folds into one of these seven kinds so
//! callers at the public API boundary have a single type to match on.

use scdb_core::codec::ParseError;
use scdb_core::types::SidechainId;
use scdb_store::{DepositError, ScoreBookError, WtjoinError};

/// A failure from any mutating or querying operation on [`crate::engine::SidechainDb`].
///
/// Per §7: no variant here is fatal to the process. On any `Err`, the
/// observable SCDB state is unchanged from just before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScdbError {
    /// An operation named a sidechain id outside the registry.
    InvalidSidechain { sidechain_id: SidechainId },
    /// A bounded store (`WTJoinStore`, or a single sidechain's live-`wtxid`
    /// count) is already at capacity.
    CapacityExceeded { capacity: usize },
    /// An entry keyed by hash is already present.
    DuplicateEntry,
    /// A state script failed to parse, or named an out-of-range
    /// `(sid_cursor, wt_cursor)`.
    MalformedScript { detail: String },
    /// A vote-arithmetic step would under/overflow (§4.6: `work_score == 0`
    /// with `REJECT`, or `blocks_left == 0`).
    ArithmeticAbort { detail: String },
    /// A committed state would have violated one of the §3 invariants.
    InvariantViolation { detail: String },
    /// The mainchain collaborator (`MainchainClient`) failed. Never affects
    /// SCDB state; surfaced to the caller as-is.
    UpstreamUnavailable { detail: String },
}

impl std::fmt::Display for ScdbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSidechain { sidechain_id } => {
                write!(f, "sidechain {sidechain_id} is not registered")
            }
            Self::CapacityExceeded { capacity } => write!(f, "store at capacity ({capacity})"),
            Self::DuplicateEntry => write!(f, "entry already present"),
            Self::MalformedScript { detail } => write!(f, "malformed state script: {detail}"),
            Self::ArithmeticAbort { detail } => write!(f, "vote arithmetic aborted: {detail}"),
            Self::InvariantViolation { detail } => write!(f, "invariant violated: {detail}"),
            Self::UpstreamUnavailable { detail } => {
                write!(f, "mainchain collaborator unavailable: {detail}")
            }
        }
    }
}

impl std::error::Error for ScdbError {}

impl From<DepositError> for ScdbError {
    fn from(err: DepositError) -> Self {
        match err {
            DepositError::InvalidSidechain { sidechain_id } => {
                Self::InvalidSidechain { sidechain_id }
            }
            DepositError::NullKeyId | DepositError::NullTransaction => {
                Self::InvariantViolation {
                    detail: err.to_string(),
                }
            }
            DepositError::NotRecognizedAsDeposit => Self::InvariantViolation {
                detail: err.to_string(),
            },
        }
    }
}

impl From<WtjoinError> for ScdbError {
    fn from(err: WtjoinError) -> Self {
        match err {
            WtjoinError::CapacityExceeded { capacity } => Self::CapacityExceeded { capacity },
            WtjoinError::DuplicateEntry => Self::DuplicateEntry,
        }
    }
}

impl From<ScoreBookError> for ScdbError {
    fn from(err: ScoreBookError) -> Self {
        match err {
            ScoreBookError::InvalidSidechain { sidechain_id } => {
                Self::InvalidSidechain { sidechain_id }
            }
        }
    }
}

impl From<ParseError> for ScdbError {
    fn from(err: ParseError) -> Self {
        Self::MalformedScript {
            detail: err.to_string(),
        }
    }
}
