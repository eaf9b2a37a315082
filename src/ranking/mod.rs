//! Camera-distance ranking
//!
//! Two mirrored total orders over positioned entities: near-to-far for
//! opaque submission and level-of-detail, far-to-near for back-to-front
//! blending. Both order by `(distance, input index)`, so ties keep their
//! input order under near-first and the far-first order is its exact reverse.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Anything with a position in the working frame
pub trait Positioned {
    fn position(&self) -> Vector3<f64>;

    fn distance_to(&self, camera: &Vector3<f64>) -> f64 {
        (self.position() - camera).norm()
    }
}

impl Positioned for Vector3<f64> {
    fn position(&self) -> Vector3<f64> {
        *self
    }
}

/// Non-owning view of an entity with its distance for one ranking pass
#[derive(Debug)]
pub struct Ranked<'a, T> {
    pub entity: &'a T,
    pub distance: f64,
    /// Position in the input slice, the secondary sort key
    pub index: usize,
}

impl<T> Clone for Ranked<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Ranked<'_, T> {}

/// Every NaN, whatever its sign or payload, becomes the same positive NaN
fn sort_key(distance: f64) -> f64 {
    if distance.is_nan() {
        f64::NAN.abs()
    } else {
        distance
    }
}

/// Ascending distance, ties in input order; NaN sorts after every number
pub fn near_first<T>(a: &Ranked<'_, T>, b: &Ranked<'_, T>) -> Ordering {
    sort_key(a.distance)
        .total_cmp(&sort_key(b.distance))
        .then_with(|| a.index.cmp(&b.index))
}

/// Exact mirror of [`near_first`]
pub fn far_first<T>(a: &Ranked<'_, T>, b: &Ranked<'_, T>) -> Ordering {
    near_first(b, a)
}

/// Ordering strategy of a ranking pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RankOrder {
    #[default]
    NearFirst,
    FarFirst,
}

impl RankOrder {
    pub fn compare<T>(&self, a: &Ranked<'_, T>, b: &Ranked<'_, T>) -> Ordering {
        match self {
            RankOrder::NearFirst => near_first(a, b),
            RankOrder::FarFirst => far_first(a, b),
        }
    }
}

/// Distances of a set of entities to one camera position
///
/// Distances are computed once when the pass is built and never carried over
/// to another pass.
#[derive(Debug)]
pub struct RankingPass<'a, T> {
    ranked: Vec<Ranked<'a, T>>,
}

impl<'a, T> RankingPass<'a, T> {
    /// Compute every entity's distance to `camera`
    pub fn new(items: &'a [T], camera: &Vector3<f64>) -> Self
    where
        T: Positioned,
    {
        Self::from_keys(items, |item| item.distance_to(camera))
    }

    /// Use precomputed rank keys, e.g. those emitted by the resolver
    pub fn from_keys(items: &'a [T], key: impl Fn(&T) -> f64) -> Self {
        let ranked = items
            .iter()
            .enumerate()
            .map(|(index, entity)| Ranked {
                entity,
                distance: key(entity),
                index,
            })
            .collect();
        RankingPass { ranked }
    }

    /// Entries in input order
    pub fn entries(&self) -> &[Ranked<'a, T>] {
        &self.ranked
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Entries sorted by `order`
    pub fn sorted(&self, order: RankOrder) -> Vec<Ranked<'a, T>> {
        let mut sorted = self.ranked.clone();
        sorted.sort_by(|a, b| order.compare(a, b));
        sorted
    }

    /// Entities nearest first
    pub fn near_first(&self) -> Vec<&'a T> {
        self.sorted(RankOrder::NearFirst)
            .into_iter()
            .map(|r| r.entity)
            .collect()
    }

    /// Entities farthest first
    pub fn far_first(&self) -> Vec<&'a T> {
        self.sorted(RankOrder::FarFirst)
            .into_iter()
            .map(|r| r.entity)
            .collect()
    }

    /// The `n` nearest entries, nearest first
    pub fn closest(&self, n: usize) -> Vec<Ranked<'a, T>> {
        let mut sorted = self.sorted(RankOrder::NearFirst);
        sorted.truncate(n);
        sorted
    }

    /// Entries no farther than `radius`, nearest first
    pub fn within(&self, radius: f64) -> Vec<Ranked<'a, T>> {
        self.sorted(RankOrder::NearFirst)
            .into_iter()
            .take_while(|r| r.distance <= radius)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn points() -> Vec<Vector3<f64>> {
        vec![
            Vector3::new(3.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, -3.0),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 0.0),
        ]
    }

    fn indices<T>(sorted: &[Ranked<'_, T>]) -> Vec<usize> {
        sorted.iter().map(|r| r.index).collect()
    }

    #[test]
    fn test_near_first_keeps_ties_in_input_order() {
        let items = points();
        let pass = RankingPass::new(&items, &Vector3::zeros());
        assert_eq!(indices(&pass.sorted(RankOrder::NearFirst)), vec![3, 5, 1, 4, 0, 2]);
    }

    #[test]
    fn test_far_first_is_exact_reverse() {
        let items = points();
        let pass = RankingPass::new(&items, &Vector3::zeros());

        let mut near = indices(&pass.sorted(RankOrder::NearFirst));
        near.reverse();
        assert_eq!(indices(&pass.sorted(RankOrder::FarFirst)), near);
    }

    #[test]
    fn test_far_first_reverse_random_sets() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            // Coarse grid so that ties are common
            let items: Vec<Vector3<f64>> = (0..50)
                .map(|_| {
                    Vector3::new(
                        rng.gen_range(-3..=3) as f64,
                        rng.gen_range(-3..=3) as f64,
                        rng.gen_range(-3..=3) as f64,
                    )
                })
                .collect();
            let camera = Vector3::new(0.5, -1.0, 2.0);
            let pass = RankingPass::new(&items, &camera);

            let mut near: Vec<*const Vector3<f64>> =
                pass.near_first().into_iter().map(|p| p as *const _).collect();
            let far: Vec<*const Vector3<f64>> =
                pass.far_first().into_iter().map(|p| p as *const _).collect();
            near.reverse();
            assert_eq!(near, far);
        }
    }

    #[test]
    fn test_comparators_are_mirrored() {
        let items = points();
        let pass = RankingPass::new(&items, &Vector3::new(1.0, 1.0, 1.0));
        for a in pass.entries() {
            for b in pass.entries() {
                assert_eq!(far_first(a, b), near_first(a, b).reverse());
                assert_eq!(near_first(a, b) == Ordering::Equal, a.index == b.index);
            }
        }
    }

    #[test]
    fn test_distances_follow_camera() {
        let items = points();
        let first = RankingPass::new(&items, &Vector3::zeros());
        let moved = RankingPass::new(&items, &Vector3::new(0.0, 0.0, -3.0));

        assert_eq!(first.near_first()[0], &items[3]);
        assert_eq!(moved.near_first()[0], &items[2]);
        assert_eq!(moved.entries()[2].distance, 0.0);
    }

    #[test]
    fn test_closest_and_within() {
        let items = points();
        let pass = RankingPass::new(&items, &Vector3::zeros());

        assert_eq!(indices(&pass.closest(3)), vec![3, 5, 1]);
        assert_eq!(pass.closest(100).len(), items.len());
        assert_eq!(indices(&pass.within(1.0)), vec![3, 5, 1, 4]);
        assert!(pass.within(-1.0).is_empty());
    }

    #[test]
    fn test_precomputed_keys() {
        let names = ["far", "near", "mid"];
        let keys = [10.0, 0.5, 2.0];
        let pass = RankingPass::from_keys(&names, |name| {
            keys[names.iter().position(|n| n == name).unwrap_or(0)]
        });
        assert_eq!(pass.near_first(), vec![&"near", &"mid", &"far"]);
        assert_eq!(pass.far_first(), vec![&"far", &"mid", &"near"]);
    }

    #[test]
    fn test_nan_keys_rank_farthest_whatever_their_sign() {
        let keys = [1.0, -f64::NAN, 2.0, f64::NAN, f64::INFINITY];
        assert!(keys[1].is_sign_negative());

        let pass = RankingPass::from_keys(&keys, |k| *k);
        assert_eq!(indices(&pass.sorted(RankOrder::NearFirst)), vec![0, 2, 4, 1, 3]);
        assert_eq!(indices(&pass.sorted(RankOrder::FarFirst)), vec![3, 1, 4, 2, 0]);
    }
}
