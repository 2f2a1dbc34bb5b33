//! Property-based tests for the alignment engine.

use proptest::prelude::*;
use stacker_align::{stack, stack_with, FailurePolicy};
use stacker_core::StackError;
use stacker_scene::SceneHost;
use stacker_testkit::{obj, scene_with_boxes, Fault, RecordingHost};

const TOLERANCE: f64 = 1e-6;

fn arb_bounds() -> impl Strategy<Value = [f64; 6]> {
    (
        -500.0f64..500.0,
        -500.0f64..500.0,
        -500.0f64..500.0,
        0.01f64..20.0,
        0.01f64..20.0,
        0.01f64..20.0,
    )
        .prop_map(|(x, y, z, w, h, d)| [x, y, z, x + w, y + h, z + d])
}

fn named(boxes: &[[f64; 6]]) -> Vec<(String, [f64; 6])> {
    boxes
        .iter()
        .enumerate()
        .map(|(i, bounds)| (format!("obj{i}"), *bounds))
        .collect()
}

proptest! {
    /// Property: after stacking, every object rests on the previous one with
    /// matching x/z centers.
    #[test]
    fn adjacent_objects_touch_and_share_axis(boxes in prop::collection::vec(arb_bounds(), 2..8)) {
        let entries = named(&boxes);
        let refs: Vec<(&str, [f64; 6])> = entries.iter().map(|(n, b)| (n.as_str(), *b)).collect();
        let mut scene = scene_with_boxes(&refs);
        let names: Vec<_> = entries.iter().map(|(n, _)| obj(n)).collect();

        stack(&mut scene, &names).unwrap();

        for pair in names.windows(2) {
            let below = scene.bounding_box(&pair[0]).unwrap();
            let above = scene.bounding_box(&pair[1]).unwrap();
            prop_assert!((above.min.y - below.max.y).abs() < TOLERANCE);
            prop_assert!((above.center().x - below.center().x).abs() < TOLERANCE);
            prop_assert!((above.center().z - below.center().z).abs() < TOLERANCE);
        }
    }

    /// Property: the first object never moves and sizes are preserved.
    #[test]
    fn base_stays_put_and_sizes_survive(boxes in prop::collection::vec(arb_bounds(), 1..6)) {
        let entries = named(&boxes);
        let refs: Vec<(&str, [f64; 6])> = entries.iter().map(|(n, b)| (n.as_str(), *b)).collect();
        let mut scene = scene_with_boxes(&refs);
        let names: Vec<_> = entries.iter().map(|(n, _)| obj(n)).collect();
        let before: Vec<_> = names.iter().map(|n| scene.bounding_box(n).unwrap()).collect();

        stack(&mut scene, &names).unwrap();

        prop_assert_eq!(scene.bounding_box(&names[0]).unwrap(), before[0]);
        for (name, original) in names.iter().zip(&before) {
            let size = scene.bounding_box(name).unwrap().size();
            prop_assert!((size - original.size()).abs().max_element() < TOLERANCE);
        }
    }

    /// Property: an unknown reference anywhere in the list prevents every move.
    #[test]
    fn unknown_reference_prevents_all_moves(
        boxes in prop::collection::vec(arb_bounds(), 1..6),
        slot in 0usize..6,
    ) {
        let entries = named(&boxes);
        let refs: Vec<(&str, [f64; 6])> = entries.iter().map(|(n, b)| (n.as_str(), *b)).collect();
        let mut names: Vec<_> = entries.iter().map(|(n, _)| obj(n)).collect();
        let slot = slot.min(names.len());
        names.insert(slot, obj("missing"));

        let mut host = RecordingHost::new(scene_with_boxes(&refs));
        let err = stack(&mut host, &names).unwrap_err();
        prop_assert_eq!(err, StackError::InvalidReference(obj("missing")));
        prop_assert!(host.moves().is_empty());
    }

    /// Property: with rollback, a failing move leaves the scene as it was.
    #[test]
    fn rollback_is_all_or_nothing(
        boxes in prop::collection::vec(arb_bounds(), 2..8),
        fail_at in 1usize..8,
    ) {
        let entries = named(&boxes);
        let refs: Vec<(&str, [f64; 6])> = entries.iter().map(|(n, b)| (n.as_str(), *b)).collect();
        let names: Vec<_> = entries.iter().map(|(n, _)| obj(n)).collect();
        let fail_at = fail_at.min(names.len() - 1);
        let scene = scene_with_boxes(&refs);
        let before: Vec<_> = names.iter().map(|n| scene.bounding_box(n).unwrap()).collect();

        let mut host = RecordingHost::new(scene).with_fault(Fault::FailMove { nth: fail_at });
        let result = stack_with(&mut host, &names, FailurePolicy::Rollback);
        prop_assert!(
            matches!(result, Err(StackError::HostOperationFailed { .. })),
            "unexpected result: {:?}",
            result
        );

        let scene = host.into_inner();
        for (name, original) in names.iter().zip(&before) {
            let now = scene.bounding_box(name).unwrap();
            prop_assert!((now.min - original.min).abs().max_element() < TOLERANCE);
        }
    }
}
