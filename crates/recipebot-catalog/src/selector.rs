//! Selector — picks which active item to draw, honoring the feedback bias.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use recipebot_core::types::Item;

/// Uniform random choice over the eligible subset of the active pool.
///
/// With a category bias the eligible subset is the items in that category,
/// unless none are left, in which case the whole pool is eligible again.
pub struct Selector {
    rng: StdRng,
}

impl Selector {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic selector for reproducible runs and tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Indices into `active` that a draw may choose from.
    pub fn eligible(active: &[Item], category: Option<&str>) -> Vec<usize> {
        if let Some(category) = category {
            let matching: Vec<usize> = active
                .iter()
                .enumerate()
                .filter(|(_, item)| item.in_category(category))
                .map(|(i, _)| i)
                .collect();
            if !matching.is_empty() {
                return matching;
            }
            tracing::debug!("No active recipe in category '{category}', ignoring bias");
        }
        (0..active.len()).collect()
    }

    /// Choose an index into `active`. `None` only when `active` is empty.
    pub fn choose(&mut self, active: &[Item], category: Option<&str>) -> Option<usize> {
        let eligible = Self::eligible(active, category);
        if eligible.is_empty() {
            return None;
        }
        Some(eligible[self.rng.gen_range(0..eligible.len())])
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Vec<Item> {
        vec![
            Item::titled("Borscht").with_category("Soup"),
            Item::titled("Pancakes").with_category("Breakfast"),
            Item::titled("Solyanka").with_category("soup"),
            Item::titled("Mystery"),
        ]
    }

    #[test]
    fn test_eligible_with_matching_bias() {
        assert_eq!(Selector::eligible(&pool(), Some("SOUP")), vec![0, 2]);
    }

    #[test]
    fn test_eligible_falls_back_when_unmatched() {
        assert_eq!(Selector::eligible(&pool(), Some("Dessert")), vec![0, 1, 2, 3]);
        assert_eq!(Selector::eligible(&pool(), None), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_choose_respects_bias() {
        let mut selector = Selector::seeded(7);
        let items = pool();
        for _ in 0..50 {
            let idx = selector.choose(&items, Some("soup")).unwrap();
            assert!(items[idx].in_category("soup"));
        }
    }

    #[test]
    fn test_choose_empty_pool() {
        let mut selector = Selector::seeded(1);
        assert!(selector.choose(&[], Some("soup")).is_none());
    }
}
