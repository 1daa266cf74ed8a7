//! Weighted random selection with an amortized build cost.
//!
//! Items are added with positive weights, the cumulative index is built
//! once, and each draw is then O(log n) via binary search.

use rand::Rng;
use tracing::warn;

/// Cumulative-weight index over a set of items.
///
/// Weight policy: non-positive or non-finite weights are rejected at `add`
/// time (the item is dropped with a warning). Calling [`select`] before
/// [`build`], or on an empty selector, returns `None`.
///
/// [`build`]: WeightedSelector::build
/// [`select`]: WeightedSelector::select
#[derive(Debug, Clone)]
pub struct WeightedSelector<T> {
    items: Vec<T>,
    weights: Vec<f64>,
    cumulative: Vec<f64>,
    total: f64,
}

impl<T> WeightedSelector<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            weights: Vec::new(),
            cumulative: Vec::new(),
            total: 0.0,
        }
    }

    /// Add an item with the given weight. Rejects weights that are not
    /// positive finite numbers.
    pub fn add(&mut self, item: T, weight: f64) {
        if !weight.is_finite() || weight <= 0.0 {
            warn!(weight, "rejecting item with non-positive selector weight");
            return;
        }
        self.items.push(item);
        self.weights.push(weight);
        // Index is stale until the next build.
        self.cumulative.clear();
        self.total = 0.0;
    }

    /// Build the cumulative prefix index in O(n). Safe to call again after
    /// further `add`s.
    pub fn build(&mut self) {
        self.cumulative.clear();
        self.cumulative.reserve(self.weights.len());
        let mut total = 0.0;
        for weight in &self.weights {
            total += weight;
            self.cumulative.push(total);
        }
        self.total = total;
    }

    /// Draw one item with probability proportional to its weight.
    ///
    /// Returns `None` when empty or not yet built.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&T> {
        if self.cumulative.len() != self.items.len() || self.items.is_empty() {
            return None;
        }
        let draw = rng.gen_range(0.0..self.total);
        let idx = self.cumulative.partition_point(|&cum| cum <= draw);
        // draw < total guarantees idx < len; clamp anyway for float edge cases.
        self.items.get(idx.min(self.items.len() - 1))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for WeightedSelector<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn select_on_empty_is_none() {
        let selector: WeightedSelector<&str> = WeightedSelector::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(selector.select(&mut rng), None);
    }

    #[test]
    fn select_before_build_is_none() {
        let mut selector = WeightedSelector::new();
        selector.add("a", 1.0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(selector.select(&mut rng), None);
        selector.build();
        assert_eq!(selector.select(&mut rng), Some(&"a"));
    }

    #[test]
    fn rejects_non_positive_weights() {
        let mut selector = WeightedSelector::new();
        selector.add("zero", 0.0);
        selector.add("negative", -2.0);
        selector.add("nan", f64::NAN);
        selector.add("inf", f64::INFINITY);
        assert!(selector.is_empty());
    }

    #[test]
    fn add_after_build_requires_rebuild() {
        let mut selector = WeightedSelector::new();
        selector.add("a", 1.0);
        selector.build();
        selector.add("b", 1.0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(selector.select(&mut rng), None);
        selector.build();
        assert!(selector.select(&mut rng).is_some());
    }

    #[test]
    fn distribution_matches_weights() {
        let mut selector = WeightedSelector::new();
        selector.add("a", 1.0);
        selector.add("b", 3.0);
        selector.build();

        let mut rng = StdRng::seed_from_u64(42);
        let draws = 10_000;
        let mut b_count = 0usize;
        for _ in 0..draws {
            if selector.select(&mut rng) == Some(&"b") {
                b_count += 1;
            }
        }
        let b_ratio = b_count as f64 / draws as f64;
        assert!(
            (b_ratio - 0.75).abs() < 0.02,
            "expected b ratio near 0.75, got {}",
            b_ratio
        );
    }

    #[test]
    fn uneven_weights_cover_all_items() {
        let mut selector = WeightedSelector::new();
        for (name, weight) in [("x", 0.5), ("y", 1.5), ("z", 8.0)] {
            selector.add(name, weight);
        }
        selector.build();
        assert_eq!(selector.len(), 3);

        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1_000 {
            seen.insert(*selector.select(&mut rng).unwrap());
        }
        assert_eq!(seen.len(), 3);
    }
}
