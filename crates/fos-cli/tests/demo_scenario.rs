//! Replays the scenario shipped in `demos/` and checks the final state.

use std::path::PathBuf;

use fos_cli::scenario::replay_file;
use fos_core::{SettlementAmount, UnitAmount};

fn repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.pop(); // repo root
    dir
}

#[test]
fn demo_scenario_replays_cleanly() {
    let report = replay_file(&repo_root().join("demos/scenario.yaml")).unwrap();
    assert!(report.violations.is_empty(), "{:?}", report.violations);

    let snapshot = &report.snapshot;
    assert_eq!(snapshot.total_supply, UnitAmount::ZERO);
    assert!(!snapshot.offering.active);
    assert!(snapshot.distribution.proceeds_deposited);
    assert_eq!(
        snapshot.distribution.final_price_per_unit.raw(),
        3_000 * 10u128.pow(6)
    );
    assert_eq!(snapshot.distribution.remaining_proceeds, SettlementAmount::ZERO);
    assert_eq!(snapshot.proposal_count, 1);
}

#[test]
fn demo_scenario_records_expected_rejections() {
    let report = replay_file(&repo_root().join("demos/scenario.yaml")).unwrap();
    let rejected: Vec<&str> = report
        .outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().err().map(String::as_str))
        .collect();
    assert_eq!(
        rejected,
        [
            "PERMISSION_DENIED",
            "NOT_VERIFIED",
            "TRANSFERS_RESTRICTED",
            "ALREADY_VOTED",
            "VOTING_STILL_OPEN",
            "ALREADY_DEPOSITED",
            "INSUFFICIENT_BALANCE",
        ]
    );
}
