//! Catalog — the active pool of undelivered items plus its refill rule.

use recipebot_core::error::{RecipeBotError, Result};
use recipebot_core::traits::CatalogSource;
use recipebot_core::types::{Bias, Item};
use std::time::Duration;

use crate::selector::Selector;

/// Exclusively owned by the scheduler loop; there is a single writer and
/// no concurrent reader, so no locking.
pub struct Catalog {
    source: Box<dyn CatalogSource>,
    /// Full collection from the most recent load.
    pool: Vec<Item>,
    /// Items not yet drawn since the last refill.
    active: Vec<Item>,
    selector: Selector,
    load_timeout: Option<Duration>,
    refills: u64,
}

impl Catalog {
    /// Perform the initial load. Failure here is fatal to the caller.
    pub async fn load(source: Box<dyn CatalogSource>) -> Result<Self> {
        Self::load_with(source, Selector::new(), None).await
    }

    /// Initial load with an explicit selector and a bound on every load.
    pub async fn load_with(
        source: Box<dyn CatalogSource>,
        selector: Selector,
        load_timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut catalog = Self {
            source,
            pool: Vec::new(),
            active: Vec::new(),
            selector,
            load_timeout,
            refills: 0,
        };
        catalog.reload().await?;
        Ok(catalog)
    }

    /// Draw one item and remove it from the active pool.
    ///
    /// Refills first when the pool is exhausted. A refill failure leaves the
    /// pool empty so the next draw tries again.
    pub async fn draw(&mut self, bias: Option<&str>) -> Result<Item> {
        if self.active.is_empty() {
            tracing::info!(
                "🔄 Catalog exhausted, reloading from {}",
                self.source.describe()
            );
            self.reload().await?;
            self.refills += 1;
        }

        let idx = self.selector.choose(&self.active, bias).ok_or_else(|| {
            RecipeBotError::CatalogMalformed("catalog reloaded with no recipes".into())
        })?;
        let item = self.active.swap_remove(idx);
        tracing::debug!(
            "🎲 Drew '{}' ({} left in pool)",
            item.title,
            self.active.len()
        );
        Ok(item)
    }

    /// Draw using the feedback bias.
    pub async fn pick(&mut self, bias: &Bias) -> Result<Item> {
        self.draw(bias.as_deref()).await
    }

    /// Replace both the full collection and the active pool with a fresh load.
    async fn reload(&mut self) -> Result<()> {
        let loaded = match self.load_timeout {
            Some(limit) => tokio::time::timeout(limit, self.source.load())
                .await
                .map_err(|_| RecipeBotError::Timeout {
                    operation: format!("catalog load from {}", self.source.describe()),
                    secs: limit.as_secs(),
                })??,
            None => self.source.load().await?,
        };
        if loaded.is_empty() {
            return Err(RecipeBotError::CatalogMalformed(format!(
                "{} returned no recipes",
                self.source.describe()
            )));
        }
        self.active = loaded.clone();
        self.pool = loaded;
        Ok(())
    }

    /// Items still available before the next refill.
    pub fn active(&self) -> &[Item] {
        &self.active
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Size of the most recently loaded collection.
    pub fn source_len(&self) -> usize {
        self.pool.len()
    }

    /// Refills performed since the initial load.
    pub fn refills(&self) -> u64 {
        self.refills
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FakeSource {
        items: Vec<Item>,
        loads: Arc<AtomicUsize>,
        broken: Arc<AtomicBool>,
    }

    impl FakeSource {
        fn new(items: Vec<Item>) -> (Self, Arc<AtomicUsize>, Arc<AtomicBool>) {
            let loads = Arc::new(AtomicUsize::new(0));
            let broken = Arc::new(AtomicBool::new(false));
            (
                Self {
                    items,
                    loads: loads.clone(),
                    broken: broken.clone(),
                },
                loads,
                broken,
            )
        }
    }

    #[async_trait]
    impl CatalogSource for FakeSource {
        fn describe(&self) -> String {
            "fake".into()
        }

        async fn load(&self) -> Result<Vec<Item>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.broken.load(Ordering::SeqCst) {
                return Err(RecipeBotError::CatalogUnavailable("fake outage".into()));
            }
            Ok(self.items.clone())
        }
    }

    fn abc() -> Vec<Item> {
        vec![Item::titled("A"), Item::titled("B"), Item::titled("C")]
    }

    async fn catalog_of(items: Vec<Item>) -> (Catalog, Arc<AtomicUsize>, Arc<AtomicBool>) {
        let (source, loads, broken) = FakeSource::new(items);
        let catalog = Catalog::load_with(Box::new(source), Selector::seeded(42), None)
            .await
            .unwrap();
        (catalog, loads, broken)
    }

    #[tokio::test]
    async fn test_no_repeat_until_refill() {
        let (mut catalog, loads, _) = catalog_of(abc()).await;
        let mut seen = HashSet::new();
        for _ in 0..3 {
            let item = catalog.draw(None).await.unwrap();
            assert!(seen.insert(item.title), "item repeated before refill");
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(catalog.active_len(), 0);
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        // Fourth draw reloads
        let item = catalog.draw(None).await.unwrap();
        assert!(["A", "B", "C"].contains(&item.title.as_str()));
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(catalog.refills(), 1);
    }

    #[tokio::test]
    async fn test_refill_restores_full_pool() {
        let (mut catalog, _, _) = catalog_of(abc()).await;
        for _ in 0..3 {
            catalog.draw(None).await.unwrap();
        }
        catalog.draw(None).await.unwrap();
        // One drawn from the refreshed pool, the rest are the loaded set minus it
        assert_eq!(catalog.active_len(), 2);
        assert_eq!(catalog.source_len(), 3);
        let expected: HashSet<_> = abc().into_iter().collect();
        assert!(catalog.active().iter().all(|i| expected.contains(i)));
    }

    #[tokio::test]
    async fn test_every_item_once_per_pool_lifetime() {
        let items: Vec<Item> = (0..25).map(|i| Item::titled(format!("R{i}"))).collect();
        let (mut catalog, _, _) = catalog_of(items.clone()).await;
        for _round in 0..3 {
            let mut drawn = HashSet::new();
            for _ in 0..items.len() {
                drawn.insert(catalog.draw(None).await.unwrap());
            }
            assert_eq!(drawn.len(), items.len());
        }
        assert_eq!(catalog.refills(), 2);
    }

    #[tokio::test]
    async fn test_bias_restricts_then_falls_back() {
        let items = vec![
            Item::titled("Borscht").with_category("Soup"),
            Item::titled("Shchi").with_category("Soup"),
            Item::titled("Pancakes").with_category("Breakfast"),
        ];
        let (mut catalog, _, _) = catalog_of(items).await;
        let bias = Bias::category("soup");

        let first = catalog.pick(&bias).await.unwrap();
        let second = catalog.pick(&bias).await.unwrap();
        assert!(first.in_category("soup"));
        assert!(second.in_category("soup"));

        // No soups left: bias falls back to the remaining pool instead of failing
        let third = catalog.pick(&bias).await.unwrap();
        assert_eq!(third.title, "Pancakes");
    }

    #[tokio::test]
    async fn test_initial_load_failure_is_error() {
        let (source, _, broken) = FakeSource::new(abc());
        broken.store(true, Ordering::SeqCst);
        let result = Catalog::load(Box::new(source)).await;
        assert!(matches!(result, Err(RecipeBotError::CatalogUnavailable(_))));
    }

    #[tokio::test]
    async fn test_refill_failure_is_transient_and_retried() {
        let (mut catalog, loads, broken) = catalog_of(vec![Item::titled("Only")]).await;
        catalog.draw(None).await.unwrap();

        broken.store(true, Ordering::SeqCst);
        let err = catalog.draw(None).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(catalog.refills(), 0);

        broken.store(false, Ordering::SeqCst);
        let item = catalog.draw(None).await.unwrap();
        assert_eq!(item.title, "Only");
        assert_eq!(loads.load(Ordering::SeqCst), 3);
        assert_eq!(catalog.refills(), 1);
    }

    struct StuckSource;

    #[async_trait]
    impl CatalogSource for StuckSource {
        fn describe(&self) -> String {
            "stuck".into()
        }

        async fn load(&self) -> Result<Vec<Item>> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_timeout() {
        let result = Catalog::load_with(
            Box::new(StuckSource),
            Selector::seeded(1),
            Some(Duration::from_secs(5)),
        )
        .await;
        assert!(matches!(result, Err(RecipeBotError::Timeout { secs: 5, .. })));
    }
}
