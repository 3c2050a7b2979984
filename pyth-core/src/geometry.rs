//! Child-triangle metrics for one Pythagoras-tree step.
//!
//! Every node is the base of a right triangle whose apex sits at
//! `height_factor * width` above the base, shifted sideways by `lean`.
//! The two legs of that triangle become the bases of the left and right
//! children.

use std::collections::HashMap;

/// Derived metrics of a node: child widths and rotation angles.
///
/// Angles are in degrees. Degenerate inputs (for example `lean = ±0.5`
/// with `height_factor = 0`) yield non-finite values which are passed
/// through untouched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    /// Hypotenuse of the right-hand triangle, i.e. the right child's width.
    pub next_right: f64,
    /// Hypotenuse of the left-hand triangle, i.e. the left child's width.
    pub next_left: f64,
    /// Base angle used to rotate a left child.
    pub angle_a: f64,
    /// Base angle used to rotate a right child.
    pub angle_b: f64,
}

impl Geometry {
    /// Computes the metrics directly, bypassing any cache.
    pub fn compute(width: f64, height_factor: f64, lean: f64) -> Self {
        let trig_height = height_factor * width;
        let right_run = width * (0.5 + lean);
        let left_run = width * (0.5 - lean);

        Self {
            next_right: (trig_height * trig_height + right_run * right_run).sqrt(),
            next_left: (trig_height * trig_height + left_run * left_run).sqrt(),
            angle_a: (trig_height / ((0.5 - lean) * width)).atan().to_degrees(),
            angle_b: (trig_height / ((0.5 + lean) * width)).atan().to_degrees(),
        }
    }

    /// Returns `true` when all four metrics are finite.
    pub fn is_finite(&self) -> bool {
        self.next_right.is_finite()
            && self.next_left.is_finite()
            && self.angle_a.is_finite()
            && self.angle_b.is_finite()
    }
}

/// Exact cache key: the raw bit patterns of the input triple.
type Key = (u64, u64, u64);

fn key(width: f64, height_factor: f64, lean: f64) -> Key {
    (width.to_bits(), height_factor.to_bits(), lean.to_bits())
}

/// Memo cache over [`Geometry::compute`].
///
/// Entries are keyed by the exact `(width, height_factor, lean)` triple
/// and are never evicted. The key space stays small in practice: one
/// generation pass only ever sees a handful of distinct widths per level.
#[derive(Debug, Default)]
pub struct GeometryCache {
    memo: HashMap<Key, Geometry>,
    hits: u64,
    misses: u64,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the metrics for the triple, computing them on first use.
    pub fn get(&mut self, width: f64, height_factor: f64, lean: f64) -> Geometry {
        let k = key(width, height_factor, lean);
        if let Some(geom) = self.memo.get(&k) {
            self.hits += 1;
            return *geom;
        }

        self.misses += 1;
        let geom = Geometry::compute(width, height_factor, lean);
        log::trace!(
            "geometry miss: width={width} height_factor={height_factor} lean={lean} -> {geom:?}"
        );
        self.memo.insert(k, geom);
        geom
    }

    /// Number of distinct triples stored.
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    /// Lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that had to run [`Geometry::compute`].
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Drops every entry and resets the counters.
    pub fn clear(&mut self) {
        self.memo.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    const EPS: f64 = 1e-9;

    #[test]
    fn symmetric_trunk_gives_45_degree_children() {
        let g = Geometry::compute(80.0, 0.5, 0.0);

        let expected = (40.0f64 * 40.0 + 40.0 * 40.0).sqrt();
        assert!((g.next_left - expected).abs() < EPS);
        assert!((g.next_right - expected).abs() < EPS);
        assert!((g.next_left - 56.5685).abs() < 1e-3);
        assert!((g.angle_a - 45.0).abs() < EPS);
        assert!((g.angle_b - 45.0).abs() < EPS);
    }

    #[test]
    fn pythagorean_identity_holds_for_random_inputs() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let w = rng.random_range(0.5..500.0);
            let hf = rng.random_range(0.0..0.8);
            let lean = rng.random_range(-0.49..0.49);
            let g = Geometry::compute(w, hf, lean);

            let h = hf * w;
            let left = h * h + (w * (0.5 - lean)).powi(2);
            let right = h * h + (w * (0.5 + lean)).powi(2);

            let tol = 1e-9 * left.max(right).max(1.0);
            assert!(
                (g.next_left * g.next_left - left).abs() < tol,
                "left identity failed for w={w} hf={hf} lean={lean}"
            );
            assert!(
                (g.next_right * g.next_right - right).abs() < tol,
                "right identity failed for w={w} hf={hf} lean={lean}"
            );
        }
    }

    #[test]
    fn positive_lean_widens_right_child() {
        let g = Geometry::compute(100.0, 0.3, 0.2);
        assert!(g.next_right > g.next_left);
        assert!(g.angle_a > g.angle_b);
    }

    #[test]
    fn zero_height_collapses_to_base_segments() {
        let g = Geometry::compute(80.0, 0.0, 0.1);
        assert!((g.next_left - 80.0 * 0.4).abs() < EPS);
        assert!((g.next_right - 80.0 * 0.6).abs() < EPS);
        assert_eq!(g.angle_a, 0.0);
        assert_eq!(g.angle_b, 0.0);
    }

    #[test]
    fn lean_at_edge_does_not_panic() {
        let g = Geometry::compute(80.0, 0.0, 0.5);
        // 0 / 0 on the left side.
        assert!(g.angle_a.is_nan());
        assert!(!g.is_finite());

        let g = Geometry::compute(80.0, 0.4, -0.5);
        // h / 0 on the right side saturates to a right angle.
        assert!((g.angle_b - 90.0).abs() < EPS);
    }

    #[test]
    fn cache_reuses_identical_triples() {
        let mut cache = GeometryCache::new();

        let first = cache.get(80.0, 0.5, 0.0);
        let second = cache.get(80.0, 0.5, 0.0);

        assert_eq!(first, second);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_keys_on_exact_bits() {
        let mut cache = GeometryCache::new();

        cache.get(80.0, 0.5, 0.0);
        cache.get(f64::from_bits(80.0f64.to_bits() + 1), 0.5, 0.0);
        cache.get(80.0, 0.5, -0.0);

        assert_eq!(cache.misses(), 3);
        assert_eq!(cache.hits(), 0);
    }

    #[test]
    fn clear_resets_entries_and_counters() {
        let mut cache = GeometryCache::new();
        cache.get(10.0, 0.1, 0.1);
        cache.get(10.0, 0.1, 0.1);

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 0);
    }
}
