//! `Registry`: the fixed, ordered table of known sidechains (C1).
//!
//! Ported from `ValidSidechains[]` / `SidechainNumberValid` in
//! `sidechaindb.h`. The array is replaced with an owned `Vec` so tests can
//! build alternate registries, but the ordering and validity contract is
//! unchanged: `is_valid(sid)` is `sid < registry.len()`, full stop (§9 Open
//! Question (a): treat any index `>= len()` as invalid, never `>`).

use crate::types::{Sidechain, SidechainId};

/// The fixed, ordered sequence of registered sidechains.
///
/// Stable ordering is load-bearing: the state-script codec encodes and
/// decodes sidechains in registry order (§4.1).
#[derive(Debug, Clone)]
pub struct Registry {
    sidechains: Vec<Sidechain>,
}

impl Registry {
    /// Build a registry from an explicit, ordered list of sidechains.
    ///
    /// `entries[i].id` is expected to equal `i`, matching the source's
    /// array-indexed-by-`nSidechain` layout, but this is not enforced here:
    /// callers that violate it will simply find `get(sid)` returns a
    /// different sidechain than `sid`, which is a bug at the call site, not
    /// a condition the registry needs to guard against.
    #[must_use]
    pub fn new(entries: Vec<Sidechain>) -> Self {
        Self {
            sidechains: entries,
        }
    }

    /// The built-in registry used by tests and the reference deployment
    /// (§6): `SIDECHAIN_TEST`, `SIDECHAIN_HIVEMIND`, `SIDECHAIN_WIMBLE`.
    #[must_use]
    pub fn mainnet() -> Self {
        Self::new(vec![
            Sidechain::new(0, "SIDECHAIN_TEST", 100, 200, 100),
            Sidechain::new(1, "SIDECHAIN_HIVEMIND", 200, 400, 200),
            Sidechain::new(2, "SIDECHAIN_WIMBLE", 200, 400, 200),
        ])
    }

    /// Number of registered sidechains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sidechains.len()
    }

    /// True if there are no registered sidechains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sidechains.is_empty()
    }

    /// True iff `sid` refers to a registered sidechain.
    ///
    /// `sid < len()`. Any index `>= len()` -- including exactly `len()` --
    /// is invalid (§9 Open Question (a)).
    #[must_use]
    pub fn is_valid(&self, sid: SidechainId) -> bool {
        (sid as usize) < self.sidechains.len()
    }

    /// Look up a sidechain by id.
    ///
    /// # Panics
    ///
    /// Panics if `sid` is not valid. Callers must check [`is_valid`](Self::is_valid)
    /// first; every entry point in `scdb-engine` does so before calling
    /// this, so a panic here signals a bug upstream, not a reachable
    /// runtime condition.
    #[must_use]
    pub fn get(&self, sid: SidechainId) -> &Sidechain {
        &self.sidechains[sid as usize]
    }

    /// Look up a sidechain by id without panicking.
    #[must_use]
    pub fn try_get(&self, sid: SidechainId) -> Option<&Sidechain> {
        self.sidechains.get(sid as usize)
    }

    /// Iterate sidechains in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &Sidechain> {
        self.sidechains.iter()
    }

    /// Human name for diagnostics, falling back to `"SIDECHAIN_UNKNOWN"` for
    /// an invalid id -- never panics (ported from `Sidechain::GetSidechainName`).
    #[must_use]
    pub fn name_of(&self, sid: SidechainId) -> &str {
        self.try_get(sid).map_or("SIDECHAIN_UNKNOWN", Sidechain::name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_registry_matches_spec_table() {
        let reg = Registry::mainnet();
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.get(0).tau(), 300);
        assert_eq!(reg.get(1).tau(), 600);
        assert_eq!(reg.get(2).tau(), 600);
    }

    #[test]
    fn is_valid_boundary() {
        let reg = Registry::mainnet();
        assert!(reg.is_valid(2));
        assert!(!reg.is_valid(3));
        assert!(!reg.is_valid(255));
    }

    #[test]
    fn name_of_unknown_is_fail_soft() {
        let reg = Registry::mainnet();
        assert_eq!(reg.name_of(0), "SIDECHAIN_TEST");
        assert_eq!(reg.name_of(99), "SIDECHAIN_UNKNOWN");
    }

    #[test]
    fn registry_order_is_stable() {
        let reg = Registry::mainnet();
        let names: Vec<&str> = reg.iter().map(Sidechain::name).collect();
        assert_eq!(
            names,
            vec!["SIDECHAIN_TEST", "SIDECHAIN_HIVEMIND", "SIDECHAIN_WIMBLE"]
        );
    }
}
