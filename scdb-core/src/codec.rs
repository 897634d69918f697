//! `WireCodec`: bit-exact parse/encode of the state script (C2, §4.2).
//!
//! Ported from the `CScript <<`/byte-walk logic in `SidechainDB::Update`,
//! `SidechainDB::ApplyStateScript`, and `SidechainDB::CreateStateScript`.
//!
//! ```text
//! OP_RETURN  SCOP_VERSION  SCOP_VERSION_DELIM
//!   vote[0,0] [SCOP_WT_DELIM vote[0,1] ...]
//!   SCOP_SC_DELIM
//!   vote[1,0] [SCOP_WT_DELIM vote[1,1] ...]
//!   ...
//! ```
//!
//! All symbol values are `const`: this is consensus wire format, never
//! runtime-configurable, and must never change without a version bump
//! (§4.2).

use std::collections::BTreeMap;
use std::fmt;

/// The parent chain's unspendable-output opcode.
pub const OP_RETURN: u8 = 0x6a;
/// Current state-script version.
pub const SCOP_VERSION: u8 = 0x00;
/// Separator following the version byte.
pub const SCOP_VERSION_DELIM: u8 = b':';
/// Separator between sidechains.
pub const SCOP_SC_DELIM: u8 = b'|';
/// Separator between WT^ within a sidechain.
pub const SCOP_WT_DELIM: u8 = b',';
/// Downvote.
pub const SCOP_REJECT: u8 = b'-';
/// Upvote.
pub const SCOP_VERIFY: u8 = b'+';
/// Abstain.
pub const SCOP_IGNORE: u8 = b'o';

/// The minimum valid state script length: `OP_RETURN SCOP_VERSION SCOP_VERSION_DELIM`
/// plus at least one more byte.
const MIN_SCRIPT_LEN: usize = 4;

/// A single miner vote on a WT^ candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    /// Downvote: `work_score -= 1`.
    Reject,
    /// Upvote: `work_score += 1`.
    Verify,
    /// Abstain: `work_score` unchanged.
    Ignore,
}

impl Vote {
    /// Wire byte for this vote.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Reject => SCOP_REJECT,
            Self::Verify => SCOP_VERIFY,
            Self::Ignore => SCOP_IGNORE,
        }
    }

    /// Decode a wire byte into a vote. Returns `None` for anything that is
    /// not one of the three known vote bytes (forward-compat: unknown
    /// bytes are skipped by the parser, not rejected).
    #[must_use]
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            SCOP_REJECT => Some(Self::Reject),
            SCOP_VERIFY => Some(Self::Verify),
            SCOP_IGNORE => Some(Self::Ignore),
            _ => None,
        }
    }
}

/// A parsed vote matrix, indexed by `(sid_cursor, wt_cursor)`.
///
/// Sparse by construction: a well-formed script only ever sets cursors
/// that are in range for the sidechain/WT^ being voted on, but the parser
/// itself does not know the registry or snapshot shape, so it happily
/// records whatever cursor pairs the byte stream walks through. Bounds
/// checking against a snapshot is the caller's job (`apply_state_script`
/// in `scdb-engine`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Votes2D {
    votes: BTreeMap<(usize, usize), Vote>,
}

impl Votes2D {
    /// The vote recorded at `(sid_cursor, wt_cursor)`, if any.
    #[must_use]
    pub fn get(&self, sid_cursor: usize, wt_cursor: usize) -> Option<Vote> {
        self.votes.get(&(sid_cursor, wt_cursor)).copied()
    }

    /// Iterate all recorded votes in `(sid_cursor, wt_cursor)` order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Vote)> + '_ {
        self.votes.iter().map(|(&(s, w), &v)| (s, w, v))
    }

    /// Number of recorded votes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.votes.len()
    }

    /// True if no votes were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }
}

/// Failure parsing a state script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Script shorter than the minimum header + one content byte.
    TooShort,
    /// Leading byte is not `OP_RETURN`.
    MissingOpReturn,
    /// Bytes 1..2 are not `(SCOP_VERSION, SCOP_VERSION_DELIM)`.
    BadVersionHeader,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(f, "state script shorter than {MIN_SCRIPT_LEN} bytes"),
            Self::MissingOpReturn => write!(f, "state script does not begin with OP_RETURN"),
            Self::BadVersionHeader => write!(f, "state script has an unrecognized version header"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a state script into a vote matrix (§4.2 parse contract).
///
/// # Errors
///
/// Returns [`ParseError`] if the script is too short, does not begin with
/// `OP_RETURN`, or has an unrecognized version header. Past the header,
/// unrecognized bytes are silently skipped (forward-compat), never an
/// error.
pub fn parse(script: &[u8]) -> Result<Votes2D, ParseError> {
    if script.len() < MIN_SCRIPT_LEN {
        return Err(ParseError::TooShort);
    }
    if script[0] != OP_RETURN {
        return Err(ParseError::MissingOpReturn);
    }
    if script[1] != SCOP_VERSION || script[2] != SCOP_VERSION_DELIM {
        return Err(ParseError::BadVersionHeader);
    }

    let mut votes = BTreeMap::new();
    let mut sid_cursor = 0usize;
    let mut wt_cursor = 0usize;
    for &byte in &script[3..] {
        match byte {
            SCOP_WT_DELIM => wt_cursor += 1,
            SCOP_SC_DELIM => {
                wt_cursor = 0;
                sid_cursor += 1;
            }
            other => {
                if let Some(vote) = Vote::from_byte(other) {
                    votes.insert((sid_cursor, wt_cursor), vote);
                }
                // Any other byte: skipped (forward-compat, §4.2).
            }
        }
    }
    Ok(Votes2D { votes })
}

/// Check whether a script begins with the state-script header
/// (`OP_RETURN SCOP_VERSION SCOP_VERSION_DELIM`), without fully parsing it.
///
/// Used by `apply_block_coinbase` to collect candidate state-script
/// outputs before attempting a full parse (§4.6 step 2).
#[must_use]
pub fn has_state_script_header(script: &[u8]) -> bool {
    script.len() >= 3
        && script[0] == OP_RETURN
        && script[1] == SCOP_VERSION
        && script[2] == SCOP_VERSION_DELIM
}

/// Encode a vote matrix into a state script (§4.2 encode contract).
///
/// `scores_by_sid[x]` is the ordered list of votes for registry-order
/// sidechain `x`; `scores_by_sid[x][y]` is the vote for that sidechain's
/// `y`-th WT^ in ScoreBook insertion order.
///
/// An empty SCDB (every sidechain has zero votes) produces an empty
/// script, not just an empty header -- there is nothing to vote on, so
/// there is nothing to say.
#[must_use]
pub fn encode(scores_by_sid: &[Vec<Vote>]) -> Vec<u8> {
    if scores_by_sid.iter().all(Vec::is_empty) {
        return Vec::new();
    }

    let mut script = vec![OP_RETURN, SCOP_VERSION, SCOP_VERSION_DELIM];
    let last_sid = scores_by_sid.len().saturating_sub(1);
    for (x, votes) in scores_by_sid.iter().enumerate() {
        let last_wt = votes.len().saturating_sub(1);
        for (y, vote) in votes.iter().enumerate() {
            if y != 0 {
                script.push(SCOP_WT_DELIM);
            }
            script.push(vote.to_byte());
            debug_assert!(y <= last_wt);
        }
        if x != last_sid {
            script.push(SCOP_SC_DELIM);
        }
    }
    script
}
