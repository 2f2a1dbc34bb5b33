#![warn(missing_docs)]
//! Geometry primitives (AABB, anchor points, etc.).

use glam::DVec3;

/// Tolerance used when comparing derived coordinates.
pub const EPSILON: f64 = 1e-9;

/// Which horizontal face of a box a center point sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Center of the top face (`y = maxY`).
    Top,
    /// Center of the bottom face (`y = minY`).
    Bottom,
}

/// Axis-aligned bounding box as reported by a scene host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner (x, y, z).
    pub min: DVec3,
    /// Maximum corner (x, y, z).
    pub max: DVec3,
}

impl Aabb {
    /// Create a new AABB ensuring min <= max per axis.
    pub fn new(min: DVec3, max: DVec3) -> Self {
        debug_assert!(min.cmple(max).all(), "inverted aabb {min} > {max}");
        Self { min, max }
    }

    /// Build from host-style bounds `(minX, minY, minZ, maxX, maxY, maxZ)`.
    pub fn from_bounds(bounds: [f64; 6]) -> Self {
        Self::new(
            DVec3::new(bounds[0], bounds[1], bounds[2]),
            DVec3::new(bounds[3], bounds[4], bounds[5]),
        )
    }

    /// Host-style bounds `(minX, minY, minZ, maxX, maxY, maxZ)`.
    pub fn bounds(&self) -> [f64; 6] {
        [
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z,
        ]
    }

    /// Box of the given `size` whose bottom-center sits on `base`.
    pub fn from_base(base: DVec3, size: DVec3) -> Self {
        let half = DVec3::new(size.x * 0.5, 0.0, size.z * 0.5);
        Self::new(base - half, base + half + DVec3::new(0.0, size.y, 0.0))
    }

    /// Extent along each axis.
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Half of the extent along x.
    pub fn half_width(&self) -> f64 {
        (self.max.x - self.min.x) / 2.0
    }

    /// Geometric center.
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Midpoint of the x/z extents at the requested face height.
    pub fn anchor(&self, anchor: Anchor) -> DVec3 {
        let y = match anchor {
            Anchor::Top => self.max.y,
            Anchor::Bottom => self.min.y,
        };
        DVec3::new(
            (self.min.x + self.max.x) / 2.0,
            y,
            (self.min.z + self.max.z) / 2.0,
        )
    }

    /// Center of the top face.
    pub fn top_center(&self) -> DVec3 {
        self.anchor(Anchor::Top)
    }

    /// Center of the bottom face.
    pub fn bottom_center(&self) -> DVec3 {
        self.anchor(Anchor::Bottom)
    }

    /// The same box shifted by `delta`.
    pub fn translated(&self, delta: DVec3) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Smallest box enclosing both.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Relative offset that puts `moving`'s bottom-center on `base`'s top-center.
pub fn stacking_offset(base: &Aabb, moving: &Aabb) -> DVec3 {
    base.top_center() - moving.bottom_center()
}

/// Whether two points agree on every axis within [`EPSILON`].
pub fn approx_eq(a: DVec3, b: DVec3) -> bool {
    a.abs_diff_eq(b, EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(min: [f64; 3], max: [f64; 3]) -> Aabb {
        Aabb::new(DVec3::from(min), DVec3::from(max))
    }

    #[test]
    fn bounds_use_host_ordering() {
        let aabb = Aabb::from_bounds([-1.0, 0.0, -2.0, 3.0, 4.0, 2.0]);
        assert_eq!(aabb.min, DVec3::new(-1.0, 0.0, -2.0));
        assert_eq!(aabb.max, DVec3::new(3.0, 4.0, 2.0));
        assert_eq!(aabb.bounds(), [-1.0, 0.0, -2.0, 3.0, 4.0, 2.0]);
    }

    #[test]
    fn top_and_bottom_centers() {
        let aabb = Aabb::from_bounds([-1.0, 0.0, -2.0, 3.0, 4.0, 2.0]);
        assert_eq!(aabb.top_center(), DVec3::new(1.0, 4.0, 0.0));
        assert_eq!(aabb.bottom_center(), DVec3::new(1.0, 0.0, 0.0));
        assert_eq!(aabb.half_width(), 2.0);
    }

    #[test]
    fn stacking_offset_lifts_onto_top_face() {
        let a = cube([0.0, 0.0, 0.0], [1.0, 2.0, 1.0]);
        let b = cube([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        assert_eq!(stacking_offset(&a, &b), DVec3::new(0.0, 2.0, 0.0));

        let moved = b.translated(stacking_offset(&a, &b));
        assert_eq!(moved.min.y, 2.0);
        assert_eq!(moved.max.y, 3.0);
    }

    #[test]
    fn stacking_offset_recenters_horizontally() {
        let base = cube([4.0, 1.0, -6.0], [6.0, 3.0, -4.0]);
        let moving = cube([-1.0, -5.0, 0.0], [0.0, -4.0, 3.0]);
        let moved = moving.translated(stacking_offset(&base, &moving));
        assert!(approx_eq(moved.bottom_center(), base.top_center()));
    }

    #[test]
    fn from_base_sits_on_point() {
        let aabb = Aabb::from_base(DVec3::new(1.0, 2.0, 3.0), DVec3::new(2.0, 1.0, 4.0));
        assert_eq!(aabb.bottom_center(), DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.size(), DVec3::new(2.0, 1.0, 4.0));
    }

    #[test]
    fn union_encloses_both() {
        let a = cube([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = cube([2.0, -1.0, 0.5], [3.0, 0.5, 2.0]);
        let u = a.union(&b);
        assert_eq!(u.min, DVec3::new(0.0, -1.0, 0.0));
        assert_eq!(u.max, DVec3::new(3.0, 1.0, 2.0));
        assert_eq!(a.union(&a), a);
    }
}
