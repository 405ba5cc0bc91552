mod common;

use nalgebra::Vector3;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::ScriptedSource;
use refit::conditions::source::{ConditionsKind, ConditionsSource};
use refit::conditions::ConditionsManager;
use refit::refit_errors::RefitError;

fn manager(source: &Arc<ScriptedSource>) -> ConditionsManager {
    ConditionsManager::new(
        Arc::clone(source) as Arc<dyn ConditionsSource>,
        "WithTrackAngle",
        "MuonRecHitBuilder",
    )
}

#[test]
fn unchanged_version_returns_the_identical_snapshot() {
    let source = Arc::new(ScriptedSource::new(8));
    let manager = manager(&source);

    let first = manager.refresh().unwrap();
    let second = manager.refresh().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(source.counts.tracking_components.load(Ordering::SeqCst), 1);
    assert_eq!(source.counts.geometry.load(Ordering::SeqCst), 1);
    assert_eq!(source.counts.field.load(Ordering::SeqCst), 1);
    assert_eq!(source.counts.rechit_builders.load(Ordering::SeqCst), 1);
}

#[test]
fn ensure_up_to_date_with_the_held_version_is_a_no_op() {
    let source = Arc::new(ScriptedSource::new(8));
    let manager = manager(&source);

    let first = manager.refresh().unwrap();
    let again = manager.ensure_up_to_date(first.version()).unwrap();
    assert!(Arc::ptr_eq(&first, &again));
}

#[test]
fn only_the_changed_record_group_is_refetched() {
    let source = Arc::new(ScriptedSource::new(8));
    let manager = manager(&source);

    let before = manager.refresh().unwrap();
    source.bump(ConditionsKind::Field);
    let after = manager.refresh().unwrap();

    // New snapshot, new field handle, everything else shared by reference.
    assert!(!Arc::ptr_eq(&before, &after));
    assert!(!Arc::ptr_eq(before.field(), after.field()));
    assert!(Arc::ptr_eq(before.geometry(), after.geometry()));
    assert!(Arc::ptr_eq(before.topology(), after.topology()));

    assert_eq!(source.counts.field.load(Ordering::SeqCst), 2);
    assert_eq!(source.counts.tracking_components.load(Ordering::SeqCst), 1);
    assert_eq!(source.counts.geometry.load(Ordering::SeqCst), 1);
    assert_eq!(source.counts.rechit_builders.load(Ordering::SeqCst), 1);

    assert_eq!(after.version(), &source.version());
}

#[test]
fn failed_fetch_is_fatal_and_keeps_the_old_snapshot_exposed() {
    let source = Arc::new(ScriptedSource::new(8));
    let manager = manager(&source);

    let good = manager.refresh().unwrap();

    source.bump(ConditionsKind::Field);
    source.fail_field_fetches();
    let result = manager.refresh();
    assert!(matches!(
        result,
        Err(RefitError::ConditionsFetch {
            kind: ConditionsKind::Field,
            ..
        })
    ));

    // No partial snapshot: the previously held bundle is still current.
    let held = manager.current().unwrap();
    assert!(Arc::ptr_eq(&good, &held));
}

#[test]
fn snapshot_exposes_field_and_geometry_handles() {
    let source = Arc::new(ScriptedSource::new(8));
    let manager = manager(&source);
    let snapshot = manager.refresh().unwrap();

    assert_eq!(
        snapshot.field().in_tesla(&Vector3::new(1.0, 0.0, 0.0)),
        Vector3::zeros()
    );
    assert_eq!(
        snapshot.geometry().surface_position(3),
        Some(Vector3::new(3.0, 0.0, 0.0))
    );
    assert_eq!(snapshot.geometry().surface_position(99), None);
}
