//! The six concrete end-to-end scenarios seeded by `spec.md` §8.

use sfpm_harness::{
    critical_situation_ai, hook_chain_with_abort, interpreter_equivalence, specificity_over_insertion_order,
    tiered_hot_swap,
};
use sfpm_snapshot::SnapshotDescriptor;

#[test]
fn scenario_1_critical_situation_ai() {
    assert_eq!(critical_situation_ai(30), Some("critical".to_owned()));
    assert_eq!(critical_situation_ai(80), Some("combat".to_owned()));
}

#[test]
fn scenario_2_specificity_over_insertion_order() {
    assert_eq!(specificity_over_insertion_order(), Some("r2".to_owned()));
}

#[test]
fn scenario_3_hook_chain_with_abort() {
    let outcome = hook_chain_with_abort();
    assert_eq!(outcome.payloads_run, 3);
}

#[test]
fn scenario_4_tiered_hot_swap() {
    let (before_fix, after_fix, cache_invalidations) = tiered_hot_swap();
    assert_eq!(before_fix, 1015);
    assert_eq!(after_fix, 15);
    assert!(cache_invalidations >= 1);
}

#[test]
fn scenario_5_interpreter_equivalence() {
    let (cached, uncached) = interpreter_equivalence();
    assert_eq!(cached, 300);
    assert_eq!(uncached, 300);
}

#[test]
fn scenario_6_snapshot_round_trip_and_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snap.img");

    let mut original = [0u8; 256];
    for (i, byte) in original.iter_mut().enumerate() {
        *byte = (i % 256) as u8;
    }

    let mut descriptor = SnapshotDescriptor::new();
    descriptor.add_region("region", &mut original, false);
    descriptor.save(&path).unwrap();

    let mut restored = [0u8; 256];
    let mut restore_descriptor = SnapshotDescriptor::new();
    restore_descriptor.add_region("region", &mut restored, false);
    restore_descriptor.restore(&path).unwrap();
    assert_eq!(restored, original);

    // Corrupt the magic bytes and confirm restore is rejected, leaving a
    // zeroed target buffer untouched.
    let mut bytes = std::fs::read(&path).unwrap();
    bytes[0] = !bytes[0];
    std::fs::write(&path, bytes).unwrap();

    let mut target = [0u8; 256];
    let mut corrupt_restore = SnapshotDescriptor::new();
    corrupt_restore.add_region("region", &mut target, false);
    let result = corrupt_restore.restore(&path);
    assert!(result.is_err());
    assert_eq!(target, [0u8; 256]);
}
