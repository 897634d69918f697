//! Minimal interface stand-ins for the mainchain's transaction/script
//! primitives.
//!
//! `spec.md` explicitly places `Tx`, `Script`, opcodes, `KeyID`, and the
//! parent-chain `uint256` hash out of scope: "Block/transaction primitives
//! ... out of scope (external collaborators, interfaces only)". This
//! module is that interface, not an implementation of a transaction
//! engine. Real deployments plug in their own chain library's transaction
//! type via [`ChainTransaction`].

use std::fmt;

/// A 32-byte parent-chain transaction identifier.
///
/// Stand-in for the mainchain's `uint256`. Used both as a plain `Txid` and,
/// aliased, as a `Wtxid` (the hash of a WT^ candidate) -- the source uses
/// the same `uint256` type for both.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Txid([u8; 32]);

/// Hash of a WT^ (withdrawal-bundle) candidate transaction.
pub type Wtxid = Txid;

impl Txid {
    /// The null/zero hash, used as a sentinel by the "no best candidate" case.
    pub const NULL: Self = Self([0u8; 32]);

    /// Construct from raw bytes (already in the chain's native byte order).
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// True if this is the null sentinel.
    #[must_use]
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl fmt::Debug for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txid(")?;
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// A 20-byte sidechain recipient identifier (stand-in for `CKeyID`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyId([u8; 20]);

impl KeyId {
    /// The null key, used to flag malformed/placeholder deposit outputs.
    pub const NULL: Self = Self([0u8; 20]);

    /// Construct from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Return the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// True if this is the null key (all-zero).
    #[must_use]
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId(")?;
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

/// Reserved opcode repurposed from the parent chain's NOP pool, marking a
/// deposit output (§6).
pub const OP_CHECKWORKSCORE: u8 = 0xb8;

/// An output of a parent-chain transaction: just the `scriptPubKey` bytes.
///
/// The core never interprets opcodes beyond the deposit-script and
/// state-script shapes it is specified to recognize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    pub script_pubkey: Vec<u8>,
}

impl TxOut {
    #[must_use]
    pub fn new(script_pubkey: Vec<u8>) -> Self {
        Self { script_pubkey }
    }
}

/// Parsed deposit output: `(sidechain_id, key_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositScript {
    pub sidechain_id: u8,
    pub key_id: KeyId,
}

/// Parse a deposit output script per §6:
/// `<sidechain_id: 1 byte> <push 20 bytes: key_id> OP_CHECKWORKSCORE`.
///
/// A "push 20 bytes" is encoded here as a single length-prefix byte (`0x14`)
/// followed by the 20 key bytes -- the minimal push encoding, matching how
/// the source's `CScript::GetOp2` reads a direct-push opcode.
///
/// Returns `None` if the script does not match this exact shape. This
/// function does not validate that `sidechain_id` is a *registered*
/// sidechain -- that is the caller's job (`Registry::is_valid`), consistent
/// with keeping parsing and registry validation separate.
#[must_use]
pub fn parse_deposit_script(script: &[u8]) -> Option<DepositScript> {
    const KEY_PUSH_LEN: u8 = 20;
    if script.len() != 1 + 1 + 20 + 1 {
        return None;
    }
    let sidechain_id = script[0];
    if script[1] != KEY_PUSH_LEN {
        return None;
    }
    if script[script.len() - 1] != OP_CHECKWORKSCORE {
        return None;
    }
    let mut key_bytes = [0u8; 20];
    key_bytes.copy_from_slice(&script[2..22]);
    Some(DepositScript {
        sidechain_id,
        key_id: KeyId::from_bytes(key_bytes),
    })
}

/// True iff `script` is a well-formed deposit output script (§6).
#[must_use]
pub fn is_work_score_script(script: &[u8]) -> bool {
    parse_deposit_script(script).is_some()
}

/// The narrow surface SCDB needs from a mainchain transaction.
///
/// Implementors wrap the real chain library's transaction type. The core
/// never constructs one of these on its own -- they always arrive from the
/// collaborator that connected the block.
pub trait ChainTransaction: Clone {
    /// The transaction's hash (used as `Txid` for deposits, `Wtxid` for
    /// WT^ candidates).
    fn txid(&self) -> Txid;

    /// True if this is a null/placeholder transaction (never a valid
    /// deposit or WT^ source).
    fn is_null(&self) -> bool;

    /// This transaction's outputs, in order.
    fn outputs(&self) -> &[TxOut];

    /// External predicate: does this transaction satisfy the mainchain's
    /// rules for being a recognized sidechain deposit (beyond just having a
    /// deposit-shaped output)? `spec.md` §4.3 calls this out explicitly as
    /// an external collaborator check the core does not implement.
    fn is_sidechain_deposit(&self) -> bool;
}

/// A minimal [`ChainTransaction`] fixture for tests.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestTx {
    pub txid: Txid,
    pub outputs: Vec<TxOut>,
    pub null: bool,
    pub recognized_deposit: bool,
}

#[cfg(any(test, feature = "test-util"))]
impl TestTx {
    #[must_use]
    pub fn new(txid: Txid) -> Self {
        Self {
            txid,
            outputs: Vec::new(),
            null: false,
            recognized_deposit: true,
        }
    }

    #[must_use]
    pub fn with_outputs(mut self, outputs: Vec<TxOut>) -> Self {
        self.outputs = outputs;
        self
    }

    #[must_use]
    pub fn not_recognized_deposit(mut self) -> Self {
        self.recognized_deposit = false;
        self
    }

    #[must_use]
    pub fn null() -> Self {
        Self {
            txid: Txid::NULL,
            outputs: Vec::new(),
            null: true,
            recognized_deposit: false,
        }
    }

    /// Build a txid fixture from a short label, for readable test data.
    #[must_use]
    pub fn txid_from_label(label: &str) -> Txid {
        let mut bytes = [0u8; 32];
        for (i, b) in label.as_bytes().iter().take(32).enumerate() {
            bytes[i] = *b;
        }
        Txid::from_bytes(bytes)
    }
}

#[cfg(any(test, feature = "test-util"))]
impl ChainTransaction for TestTx {
    fn txid(&self) -> Txid {
        self.txid
    }

    fn is_null(&self) -> bool {
        self.null
    }

    fn outputs(&self) -> &[TxOut] {
        &self.outputs
    }

    fn is_sidechain_deposit(&self) -> bool {
        self.recognized_deposit
    }
}

/// Build a well-formed deposit output script for `(sidechain_id, key_id)`.
///
/// Inverse of [`parse_deposit_script`]; mainly useful for building test
/// fixtures and for any caller constructing deposit outputs.
#[must_use]
pub fn build_deposit_script(sidechain_id: u8, key_id: KeyId) -> Vec<u8> {
    let mut script = Vec::with_capacity(23);
    script.push(sidechain_id);
    script.push(20);
    script.extend_from_slice(key_id.as_bytes());
    script.push(OP_CHECKWORKSCORE);
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_script_round_trips() {
        let key = KeyId::from_bytes([7u8; 20]);
        let script = build_deposit_script(1, key);
        let parsed = parse_deposit_script(&script).unwrap();
        assert_eq!(parsed.sidechain_id, 1);
        assert_eq!(parsed.key_id, key);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(parse_deposit_script(&[0u8; 10]).is_none());
    }

    #[test]
    fn rejects_wrong_push_length() {
        let mut script = build_deposit_script(0, KeyId::from_bytes([1u8; 20]));
        script[1] = 19;
        assert!(parse_deposit_script(&script).is_none());
    }

    #[test]
    fn rejects_wrong_trailing_opcode() {
        let mut script = build_deposit_script(0, KeyId::from_bytes([1u8; 20]));
        *script.last_mut().unwrap() = 0x00;
        assert!(parse_deposit_script(&script).is_none());
    }

    #[test]
    fn null_key_is_detected() {
        assert!(KeyId::NULL.is_null());
        assert!(!KeyId::from_bytes([1u8; 20]).is_null());
    }

    #[test]
    fn null_txid_is_detected() {
        assert!(Txid::NULL.is_null());
        assert!(!Txid::from_bytes([1u8; 32]).is_null());
    }
}
