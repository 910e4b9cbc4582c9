//! services/api/src/planner/backfill.rs
//!
//! Fetches one image per not-yet-cached place name in the background after
//! an itinerary is shown, in small throttled batches.

use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use travel_planner_core::domain::TravelPlan;
use travel_planner_core::ports::ImageGenerationService;

use crate::planner::retry::{retry_with_backoff, RetryPolicy};

//=========================================================================================
// Shared Image Cache
//=========================================================================================

/// Place name to inline-encoded image. Entries are only ever added.
#[derive(Clone, Default)]
pub struct ImageCache {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl ImageCache {
    pub async fn contains(&self, place_name: &str) -> bool {
        self.inner.read().await.contains_key(place_name)
    }

    pub async fn get(&self, place_name: &str) -> Option<String> {
        self.inner.read().await.get(place_name).cloned()
    }

    /// Adds new entries without disturbing existing ones.
    pub async fn merge(&self, images: HashMap<String, String>) {
        if images.is_empty() {
            return;
        }
        self.inner.write().await.extend(images);
    }

    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.inner.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

//=========================================================================================
// Backfill
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillSettings {
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for BackfillSettings {
    fn default() -> Self {
        Self {
            batch_size: 2,
            batch_delay: Duration::from_millis(2000),
            retry: RetryPolicy::default(),
        }
    }
}

/// What a backfill run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub requested: usize,
    pub fetched: usize,
    pub missing: usize,
    pub cancelled: bool,
}

struct PendingImage {
    place_name: String,
    image_query: String,
}

/// Unique place names across plans, days and activities in first-seen order,
/// minus those already cached.
async fn pending_images(plans: &[TravelPlan], cache: &ImageCache) -> Vec<PendingImage> {
    let cached = cache.snapshot().await;
    let mut seen = HashSet::new();
    plans
        .iter()
        .flat_map(|plan| plan.activities())
        .filter(|activity| !cached.contains_key(&activity.place_name))
        .filter(|activity| seen.insert(activity.place_name.clone()))
        .map(|activity| PendingImage {
            place_name: activity.place_name.clone(),
            image_query: activity.image_query.clone(),
        })
        .collect()
}

/// Fetches one image, retrying failures. Every failure degrades to `None`.
pub async fn fetch_image(
    service: &dyn ImageGenerationService,
    query: &str,
    policy: RetryPolicy,
) -> Option<String> {
    match retry_with_backoff(policy, "Image generation", || service.generate_image(query)).await {
        Ok(image) => image,
        Err(e) => {
            warn!("All retries failed for image generation: {}", e);
            None
        }
    }
}

/// Runs one backfill pass over `plans`.
///
/// Batches run one after another; the fetches inside a batch run concurrently
/// and each batch's results are merged into the cache as soon as it settles.
/// Cancellation is checked before every batch and leaves the cache holding
/// whatever the completed batches produced.
pub async fn backfill_images(
    service: Arc<dyn ImageGenerationService>,
    plans: Vec<TravelPlan>,
    cache: ImageCache,
    token: CancellationToken,
    settings: BackfillSettings,
) -> BackfillReport {
    let pending = pending_images(&plans, &cache).await;
    let mut report = BackfillReport {
        requested: pending.len(),
        ..Default::default()
    };
    if pending.is_empty() {
        return report;
    }
    info!("Backfilling images for {} places.", pending.len());

    let batch_size = settings.batch_size.max(1);
    let batch_count = pending.len().div_ceil(batch_size);
    let retry = settings.retry;

    for (index, batch) in pending.chunks(batch_size).enumerate() {
        if token.is_cancelled() {
            info!("Image backfill cancelled before batch {}/{}.", index + 1, batch_count);
            report.cancelled = true;
            break;
        }

        let fetches = batch.iter().map(|item| {
            let service = service.clone();
            async move {
                let image = fetch_image(service.as_ref(), &item.image_query, retry).await;
                (item.place_name.clone(), image)
            }
        });
        let results = join_all(fetches).await;

        let mut images = HashMap::new();
        for (place_name, image) in results {
            match image {
                Some(data) => {
                    images.insert(place_name, data);
                }
                None => report.missing += 1,
            }
        }
        report.fetched += images.len();
        cache.merge(images).await;
        debug!("Image batch {}/{} settled.", index + 1, batch_count);

        if index + 1 < batch_count {
            tokio::time::sleep(settings.batch_delay).await;
        }
    }

    info!(
        "Image backfill finished: {} fetched, {} missing.",
        report.fetched, report.missing
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::testing::{plan_with_places, MockImages};

    #[tokio::test(start_paused = true)]
    async fn fills_every_unique_place() {
        let images = Arc::new(MockImages::default());
        let cache = ImageCache::default();
        let plans = vec![
            plan_with_places("Train", &[&["A", "B", "C"], &["D", "A"]]),
            plan_with_places("Plane", &[&["E", "B"]]),
        ];

        let report = backfill_images(
            images.clone(),
            plans,
            cache.clone(),
            CancellationToken::new(),
            BackfillSettings::default(),
        )
        .await;

        assert_eq!(report.requested, 5);
        assert_eq!(report.fetched, 5);
        assert_eq!(cache.len().await, 5);
        for place in ["A", "B", "C", "D", "E"] {
            assert_eq!(cache.get(place).await, Some(format!("image:{place}-query")));
        }
        assert_eq!(images.queries(), vec!["A-query", "B-query", "C-query", "D-query", "E-query"]);
    }

    #[tokio::test(start_paused = true)]
    async fn skips_cached_places() {
        let images = Arc::new(MockImages::default());
        let cache = ImageCache::default();
        cache
            .merge(HashMap::from([("A".to_string(), "old".to_string())]))
            .await;

        let report = backfill_images(
            images.clone(),
            vec![plan_with_places("Train", &[&["A", "B"]])],
            cache.clone(),
            CancellationToken::new(),
            BackfillSettings::default(),
        )
        .await;

        assert_eq!(report.requested, 1);
        assert_eq!(cache.get("A").await.as_deref(), Some("old"));
        assert_eq!(images.queries(), vec!["B-query"]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_after_first_batch_keeps_partial_cache() {
        let token = CancellationToken::new();
        let images = Arc::new(MockImages::default().cancel_on("B-query", token.clone()));
        let cache = ImageCache::default();

        let report = backfill_images(
            images.clone(),
            vec![plan_with_places("Train", &[&["A", "B", "C", "D", "E", "F"]])],
            cache.clone(),
            token,
            BackfillSettings::default(),
        )
        .await;

        assert!(report.cancelled);
        assert_eq!(cache.len().await, 2);
        assert!(cache.contains("A").await && cache.contains("B").await);
        assert_eq!(images.queries().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_fetch_does_not_abort_its_batch() {
        let images = Arc::new(MockImages::default().failing("A-query"));
        let cache = ImageCache::default();

        let report = backfill_images(
            images.clone(),
            vec![plan_with_places("Train", &[&["A", "B", "C"]])],
            cache.clone(),
            CancellationToken::new(),
            BackfillSettings::default(),
        )
        .await;

        assert_eq!(report.fetched, 2);
        assert_eq!(report.missing, 1);
        assert!(!cache.contains("A").await);
        assert!(cache.contains("B").await && cache.contains("C").await);
        // one initial attempt plus two retries for the failing place
        assert_eq!(images.queries().iter().filter(|q| *q == "A-query").count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_between_batches_but_not_after_the_last() {
        let started = tokio::time::Instant::now();

        backfill_images(
            Arc::new(MockImages::default()),
            vec![plan_with_places("Train", &[&["A", "B", "C", "D", "E"]])],
            ImageCache::default(),
            CancellationToken::new(),
            BackfillSettings::default(),
        )
        .await;

        assert_eq!(started.elapsed(), Duration::from_millis(4000));
    }
}
