//! Random sampling over slices.

use std::collections::HashSet;
use std::hash::Hash;

use rand::Rng;

/// Uniform random integer in the inclusive range `[min, max]`.
///
/// Returns `min` when the range is empty (`max < min`).
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, min: usize, max: usize) -> usize {
    if max <= min {
        return min;
    }
    rng.gen_range(min..=max)
}

/// In-place Fisher-Yates shuffle.
pub fn shuffle<R: Rng + ?Sized, T>(rng: &mut R, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = random_int(rng, 0, i);
        items.swap(i, j);
    }
}

/// Pick `count` distinct elements from `items` without replacement.
///
/// Uses a partial Fisher-Yates shuffle over a scratch copy, so only the
/// first `count` positions are randomised. Asking for more elements than
/// exist returns all of them in random order.
pub fn sample<R: Rng + ?Sized, T: Clone>(rng: &mut R, items: &[T], count: usize) -> Vec<T> {
    let count = count.min(items.len());
    if count == 0 {
        return Vec::new();
    }

    let mut pool = items.to_vec();
    let last = pool.len() - 1;
    for i in 0..count {
        let j = random_int(rng, i, last);
        pool.swap(i, j);
    }
    pool.truncate(count);
    pool
}

/// Remove duplicates while keeping the first occurrence of each element.
pub fn dedup<T: Eq + Hash + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn random_int_degenerate_range() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(random_int(&mut rng, 4, 4), 4);
        assert_eq!(random_int(&mut rng, 9, 3), 9);
    }

    #[test]
    fn shuffle_keeps_elements() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut items: Vec<u32> = (0..20).collect();
        shuffle(&mut rng, &mut items);

        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn sample_empty_and_zero() {
        let mut rng = StdRng::seed_from_u64(5);
        let empty: [u8; 0] = [];
        assert!(sample(&mut rng, &empty, 3).is_empty());
        assert!(sample(&mut rng, &[1, 2, 3], 0).is_empty());
    }

    #[test]
    fn sample_more_than_available_returns_all() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut picked = sample(&mut rng, &[1, 2, 3], 10);
        picked.sort_unstable();
        assert_eq!(picked, vec![1, 2, 3]);
    }

    #[test]
    fn sample_reaches_every_element() {
        // Over many draws each element of a small pool must show up.
        let mut rng = StdRng::seed_from_u64(99);
        let items = [0usize, 1, 2, 3, 4];
        let mut hits = [0usize; 5];
        for _ in 0..500 {
            for v in sample(&mut rng, &items, 1) {
                hits[v] += 1;
            }
        }
        assert!(hits.iter().all(|&h| h > 0), "hits: {:?}", hits);
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        assert_eq!(dedup(vec![3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(dedup(Vec::<u8>::new()).is_empty());
    }

    proptest! {
        #[test]
        fn sample_is_distinct_subset(
            len in 0usize..60,
            count in 0usize..80,
            seed in any::<u64>(),
        ) {
            let items: Vec<usize> = (0..len).collect();
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = sample(&mut rng, &items, count);

            prop_assert_eq!(picked.len(), count.min(len));
            prop_assert_eq!(dedup(picked.clone()).len(), picked.len());
            prop_assert!(picked.iter().all(|v| *v < len));
        }

        #[test]
        fn random_int_in_bounds(min in 0usize..100, span in 0usize..100, seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let v = random_int(&mut rng, min, min + span);
            prop_assert!(v >= min && v <= min + span);
        }
    }
}
