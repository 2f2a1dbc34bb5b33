use glam::DVec3;
use proptest::prelude::*;
use stacker_geometry::{stacking_offset, Aabb};

fn arb_aabb() -> impl Strategy<Value = Aabb> {
    (
        -1000.0f64..1000.0,
        -1000.0f64..1000.0,
        -1000.0f64..1000.0,
        0.0f64..50.0,
        0.0f64..50.0,
        0.0f64..50.0,
    )
        .prop_map(|(x, y, z, w, h, d)| {
            let min = DVec3::new(x, y, z);
            Aabb::new(min, min + DVec3::new(w, h, d))
        })
}

proptest! {
    /// Property: applying the stacking offset always lands the moving box's
    /// bottom-center on the base box's top-center.
    #[test]
    fn offset_aligns_anchor_points(base in arb_aabb(), moving in arb_aabb()) {
        let moved = moving.translated(stacking_offset(&base, &moving));
        let landed = moved.bottom_center();
        let target = base.top_center();
        prop_assert!((landed - target).abs().max_element() < 1e-6, "{landed} vs {target}");
    }

    /// Property: translation preserves size.
    #[test]
    fn translation_preserves_size(aabb in arb_aabb(), dx in -10.0f64..10.0, dy in -10.0f64..10.0) {
        let moved = aabb.translated(DVec3::new(dx, dy, 0.0));
        prop_assert!((moved.size() - aabb.size()).abs().max_element() < 1e-6);
    }
}
