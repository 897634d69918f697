//! End-to-end coverage of the `spec.md` §8 scenarios against the public
//! `scdb-engine` API only -- no access to crate internals, the way the
//! teacher's top-level integration crate exercises kernel/search/harness
//! end to end.

use scdb_core::codec::{
    OP_RETURN, SCOP_IGNORE, SCOP_SC_DELIM, SCOP_VERIFY, SCOP_VERSION, SCOP_VERSION_DELIM,
    SCOP_WT_DELIM,
};
use scdb_core::primitives::{TestTx, TxOut};
use scdb_core::registry::Registry;
use scdb_engine::{MainchainClient, SidechainDb};
use scdb_store::ScoreBookError;

fn state_script(votes: &[u8]) -> Vec<u8> {
    let mut script = vec![OP_RETURN, SCOP_VERSION, SCOP_VERSION_DELIM];
    script.extend_from_slice(votes);
    script
}

fn coinbase_with(scripts: Vec<Vec<u8>>) -> TestTx {
    let outputs = scripts.into_iter().map(TxOut::new).collect();
    TestTx::new(TestTx::txid_from_label("coinbase")).with_outputs(outputs)
}

#[test]
fn scenario_1_threshold_reached_at_100_and_300() {
    // Work score is unsigned and non-wrapping (§9 arithmetic safety): once
    // the candidate clears its minimum at block 100, the remaining blocks
    // of the tau window hold it there with IGNORE votes rather than
    // continuing to downvote it below zero. It is still payable at the
    // tau boundary, exactly as at the moment it first cleared.
    let db: SidechainDb<TestTx> = SidechainDb::mainnet();
    let h = TestTx::txid_from_label("H");
    db.add_wtjoin(0, TestTx::new(h)).unwrap();

    for block in 1..=300u32 {
        let vote = if block <= 100 { SCOP_VERIFY } else { SCOP_IGNORE };
        let coinbase = coinbase_with(vec![state_script(&[vote])]);
        db.apply_block_coinbase(&coinbase).unwrap();
        if block == 100 || block == 300 {
            assert!(
                db.check_work_score(0, h),
                "expected threshold reached at block {block}"
            );
        }
    }
}

#[test]
fn scenario_2_threshold_missed() {
    let db: SidechainDb<TestTx> = SidechainDb::mainnet();
    let h = TestTx::txid_from_label("H");
    db.add_wtjoin(1, TestTx::new(h)).unwrap();

    for block in 1..=200u32 {
        let vote = if block % 2 == 1 { SCOP_VERIFY } else { SCOP_IGNORE };
        // sidechain 1 is at index 1: emit an IGNORE vote for sidechain 0
        // (which has no live WT^, so it gets no vote bytes at all) then a
        // delimiter then sidechain 1's vote.
        let script = state_script(&[SCOP_SC_DELIM, vote]);
        let coinbase = coinbase_with(vec![script]);
        db.apply_block_coinbase(&coinbase).unwrap();
    }

    assert!(!db.check_work_score(1, h));
}

#[test]
fn scenario_3_encode_empty() {
    let db: SidechainDb<TestTx> = SidechainDb::mainnet();
    assert!(db.create_state_script(999).is_empty());
}

#[test]
fn scenario_4_encode_populated() {
    let db: SidechainDb<TestTx> = SidechainDb::mainnet();
    for (sid, label) in [(0u8, "a"), (1, "b"), (2, "c")] {
        db.add_wtjoin(sid, TestTx::new(TestTx::txid_from_label(label)))
            .unwrap();
    }
    let script = db.create_state_script(250);
    assert_eq!(
        script,
        vec![
            OP_RETURN,
            SCOP_VERSION,
            SCOP_VERSION_DELIM,
            SCOP_VERIFY,
            SCOP_SC_DELIM,
            SCOP_VERIFY,
            SCOP_SC_DELIM,
            SCOP_VERIFY,
        ]
    );
}

#[test]
fn scenario_5_invariant_preserving_abort() {
    let db: SidechainDb<TestTx> = SidechainDb::mainnet();
    let h = TestTx::txid_from_label("H");
    db.add_wtjoin(0, TestTx::new(h)).unwrap();

    let one_script = state_script(&[SCOP_VERIFY]);
    let two_scripts = coinbase_with(vec![one_script.clone(), one_script]);

    let applied = db.apply_block_coinbase(&two_scripts).unwrap();
    assert!(applied);

    let latest = db.latest(0);
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].blocks_left, 299); // decremented once
    assert_eq!(latest[0].work_score, 0); // all-ignore: unchanged
}

#[test]
fn scenario_6_atomic_deposit_rejection() {
    use scdb_core::primitives::{build_deposit_script, KeyId};

    let db: SidechainDb<TestTx> = SidechainDb::mainnet();
    let good_key = KeyId::from_bytes([7u8; 20]);
    let tx = TestTx::new(TestTx::txid_from_label("d1")).with_outputs(vec![
        TxOut::new(build_deposit_script(0, good_key)),
        TxOut::new(build_deposit_script(0, KeyId::NULL)),
    ]);

    let err = db.add_deposit(&tx).unwrap_err();
    assert!(format!("{err}").contains("null"));
    assert!(db.deposits(0).is_empty());
}

struct RecordingClient {
    deposits: Vec<scdb_core::types::SidechainDeposit>,
    submit_calls: std::cell::RefCell<Vec<(scdb_core::primitives::Wtxid, String)>>,
}

impl MainchainClient for RecordingClient {
    type Error = std::convert::Infallible;

    fn fetch_deposits(
        &self,
        _sid: scdb_core::types::SidechainId,
    ) -> Result<Vec<scdb_core::types::SidechainDeposit>, Self::Error> {
        Ok(self.deposits.clone())
    }

    fn submit_wtjoin(
        &self,
        wtxid: scdb_core::primitives::Wtxid,
        tx_hex: &str,
    ) -> Result<(), Self::Error> {
        self.submit_calls
            .borrow_mut()
            .push((wtxid, tx_hex.to_string()));
        Ok(())
    }
}

#[test]
fn refresh_deposits_deduplicates_against_existing_cache() {
    use scdb_core::primitives::KeyId;
    use scdb_core::types::SidechainDeposit;

    let db: SidechainDb<TestTx> = SidechainDb::mainnet();
    let dtx_id = TestTx::txid_from_label("fetched");
    let key = KeyId::from_bytes([3u8; 20]);
    let client = RecordingClient {
        deposits: vec![SidechainDeposit::new(0, key, dtx_id)],
        submit_calls: std::cell::RefCell::new(Vec::new()),
    };

    let added_first = db.refresh_deposits(&client, 0).unwrap();
    assert_eq!(added_first, 1);
    let added_second = db.refresh_deposits(&client, 0).unwrap();
    assert_eq!(added_second, 0);
    assert_eq!(db.deposits(0).len(), 1);
}

#[test]
fn submit_wtjoin_round_trips_through_client() {
    let db: SidechainDb<TestTx> = SidechainDb::mainnet();
    let wtxid = TestTx::txid_from_label("w1");
    db.add_wtjoin(0, TestTx::new(wtxid)).unwrap();

    let client = RecordingClient {
        deposits: Vec::new(),
        submit_calls: std::cell::RefCell::new(Vec::new()),
    };
    db.submit_wtjoin(&client, wtxid, "deadbeef").unwrap();
    assert_eq!(client.submit_calls.borrow().len(), 1);
}

#[test]
fn custom_registry_drives_engine_through_registry_alone() {
    let registry = Registry::new(vec![scdb_core::types::Sidechain::new(
        0, "SOLO", 1, 1, 1,
    )]);
    let db: SidechainDb<TestTx> = SidechainDb::new(registry);
    let wtxid = TestTx::txid_from_label("solo");
    db.add_wtjoin(0, TestTx::new(wtxid)).unwrap();
    assert_eq!(db.latest(0)[0].blocks_left, 2);

    let err = db.add_wtjoin(7, TestTx::new(wtxid)).unwrap_err();
    assert!(format!("{err}").contains('7'));
}

#[test]
fn render_reports_every_sidechain() {
    let db: SidechainDb<TestTx> = SidechainDb::mainnet();
    db.add_wtjoin(0, TestTx::new(TestTx::txid_from_label("w")))
        .unwrap();
    let report = db.render();
    assert!(report.contains("SIDECHAIN_TEST"));
    assert!(report.contains("SIDECHAIN_HIVEMIND"));
    assert!(report.contains("SIDECHAIN_WIMBLE"));
}

#[test]
fn scorebook_error_display_is_informative() {
    let err = ScoreBookError::InvalidSidechain { sidechain_id: 9 };
    assert!(format!("{err}").contains('9'));
}
