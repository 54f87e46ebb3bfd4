use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::LibraryStat,
};

use super::providers::MetadataProvider;

/// One unit of enrichment work: a game missing from the catalog.
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentJob {
    pub app_id: i64,
}

/// Progress notifications from the worker.
///
/// `BatchIdle` fires when the queue drains after at least one job; the owner
/// reacts to it (typically by rebuilding the index). The worker itself never
/// touches the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentEvent {
    Enriched { app_id: i64 },
    Skipped { app_id: i64 },
    BatchIdle { enriched: usize, skipped: usize },
}

/// Cheap cloneable handle for enqueueing work from anywhere.
#[derive(Clone)]
pub struct EnrichmentQueue {
    tx: mpsc::UnboundedSender<EnrichmentJob>,
}

impl EnrichmentQueue {
    pub fn enqueue(&self, app_id: i64) -> AppResult<()> {
        self.tx
            .send(EnrichmentJob { app_id })
            .map_err(|_| AppError::Internal("enrichment worker is not running".to_string()))
    }

    pub fn enqueue_all(&self, app_ids: &[i64]) -> AppResult<usize> {
        for app_id in app_ids {
            self.enqueue(*app_id)?;
        }
        Ok(app_ids.len())
    }
}

/// Background catalog enrichment worker.
///
/// Processes one job at a time, throttled between fetches for the upstream
/// rate limit. Per-item failures are logged and skipped; they never abort the
/// batch and never propagate to a request path.
pub struct EnrichmentWorker {
    provider: Arc<dyn MetadataProvider>,
    catalog: Arc<dyn CatalogStore>,
    throttle: Duration,
    max_attempts: u32,
}

impl EnrichmentWorker {
    /// Spawns the worker task, returning the job queue, the event stream,
    /// and the task handle.
    pub fn spawn(
        provider: Arc<dyn MetadataProvider>,
        catalog: Arc<dyn CatalogStore>,
        throttle: Duration,
        max_attempts: u32,
    ) -> (
        EnrichmentQueue,
        mpsc::UnboundedReceiver<EnrichmentEvent>,
        JoinHandle<()>,
    ) {
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let worker = Self {
            provider,
            catalog,
            throttle,
            max_attempts: max_attempts.max(1),
        };
        let handle = tokio::spawn(worker.run(job_rx, event_tx));

        (EnrichmentQueue { tx: job_tx }, event_rx, handle)
    }

    async fn run(
        self,
        mut jobs: mpsc::UnboundedReceiver<EnrichmentJob>,
        events: mpsc::UnboundedSender<EnrichmentEvent>,
    ) {
        tracing::info!(provider = self.provider.name(), "Enrichment worker started");

        let mut enriched = 0usize;
        let mut skipped = 0usize;

        while let Some(job) = jobs.recv().await {
            match self.enrich_one(job.app_id).await {
                Ok(()) => {
                    enriched += 1;
                    let _ = events.send(EnrichmentEvent::Enriched { app_id: job.app_id });
                }
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(
                        app_id = job.app_id,
                        error = %e,
                        "Enrichment failed, skipping item"
                    );
                    let _ = events.send(EnrichmentEvent::Skipped { app_id: job.app_id });
                }
            }

            // Upstream rate limit
            tokio::time::sleep(self.throttle).await;

            if jobs.is_empty() && (enriched > 0 || skipped > 0) {
                tracing::info!(enriched, skipped, "Enrichment batch drained");
                let _ = events.send(EnrichmentEvent::BatchIdle { enriched, skipped });
                enriched = 0;
                skipped = 0;
            }
        }

        tracing::info!("Enrichment worker stopped");
    }

    async fn enrich_one(&self, app_id: i64) -> AppResult<()> {
        let mut attempt = 0u32;
        let metadata = loop {
            attempt += 1;
            match self.provider.fetch(app_id).await {
                Ok(metadata) => break metadata,
                // The upstream definitively has nothing for this id
                Err(AppError::NotFound(msg)) => return Err(AppError::NotFound(msg)),
                Err(e) if attempt < self.max_attempts => {
                    let backoff = self.throttle * 2u32.saturating_pow(attempt - 1);
                    tracing::warn!(
                        app_id,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Metadata fetch failed, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        };

        self.catalog
            .upsert(metadata.into_catalog_entry(app_id))
            .await
    }
}

/// App ids present in the user's library but absent from the catalog,
/// deduplicated and in ascending order.
pub async fn find_missing(
    catalog: &dyn CatalogStore,
    stats: &[LibraryStat],
) -> AppResult<Vec<i64>> {
    let known = catalog.all_app_ids().await?;
    let mut missing: Vec<i64> = stats
        .iter()
        .map(|s| s.app_id)
        .filter(|id| !known.contains(id))
        .collect();
    missing.sort_unstable();
    missing.dedup();
    Ok(missing)
}

/// Enqueues up to `limit` catalog-missing library games for enrichment,
/// returning how many were queued. The limit keeps one sync from hogging the
/// rate-limited upstream; the remainder is picked up by the next sweep.
pub async fn enqueue_missing(
    queue: &EnrichmentQueue,
    catalog: &dyn CatalogStore,
    stats: &[LibraryStat],
    limit: usize,
) -> AppResult<usize> {
    let missing = find_missing(catalog, stats).await?;
    let batch: Vec<i64> = missing.into_iter().take(limit).collect();
    if !batch.is_empty() {
        tracing::info!(queued = batch.len(), "Queueing catalog enrichment");
    }
    queue.enqueue_all(&batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryCatalogStore;
    use crate::services::providers::{AppMetadata, MockMetadataProvider};
    use std::collections::HashMap;
    use tokio::time::timeout;

    const EVENT_WAIT: Duration = Duration::from_secs(5);

    fn sample_metadata(app_id: i64) -> AppMetadata {
        AppMetadata {
            name: format!("Game {}", app_id),
            developers: None,
            publishers: None,
            genres: "Action".into(),
            tags: HashMap::new(),
            positive: 10,
            negative: 1,
            avg_session_minutes: 30,
        }
    }

    async fn next_event(
        rx: &mut mpsc::UnboundedReceiver<EnrichmentEvent>,
    ) -> EnrichmentEvent {
        timeout(EVENT_WAIT, rx.recv())
            .await
            .expect("timed out waiting for enrichment event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn test_batch_skips_failures_and_reports_idle() {
        let mut provider = MockMetadataProvider::new();
        provider.expect_name().return_const("mock");
        provider.expect_fetch().returning(|app_id| {
            if app_id == 666 {
                Err(AppError::NotFound(format!("no metadata for app {}", app_id)))
            } else {
                Ok(sample_metadata(app_id))
            }
        });

        let catalog = Arc::new(MemoryCatalogStore::new());
        let (queue, mut events, handle) = EnrichmentWorker::spawn(
            Arc::new(provider),
            catalog.clone(),
            Duration::from_millis(1),
            1,
        );

        queue.enqueue_all(&[10, 666, 20]).unwrap();

        // The worker may drain in one batch or several depending on timing;
        // accumulate until all three jobs are accounted for.
        let mut enriched_ids = Vec::new();
        let mut skipped_ids = Vec::new();
        let (mut batch_enriched, mut batch_skipped) = (0usize, 0usize);
        while batch_enriched + batch_skipped < 3 {
            match next_event(&mut events).await {
                EnrichmentEvent::Enriched { app_id } => enriched_ids.push(app_id),
                EnrichmentEvent::Skipped { app_id } => skipped_ids.push(app_id),
                EnrichmentEvent::BatchIdle { enriched, skipped } => {
                    batch_enriched += enriched;
                    batch_skipped += skipped;
                }
            }
        }
        assert_eq!(enriched_ids, vec![10, 20]);
        assert_eq!(skipped_ids, vec![666]);
        assert_eq!((batch_enriched, batch_skipped), (2, 1));

        let ids = catalog.all_app_ids().await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&10) && ids.contains(&20));
        assert!(catalog.get(666).await.unwrap().is_none());

        drop(queue);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let mut provider = MockMetadataProvider::new();
        provider.expect_name().return_const("mock");
        let mut seq = mockall::Sequence::new();
        provider
            .expect_fetch()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::Upstream("flaky upstream".to_string())));
        provider
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|app_id| Ok(sample_metadata(app_id)));

        let catalog = Arc::new(MemoryCatalogStore::new());
        let (queue, mut events, handle) = EnrichmentWorker::spawn(
            Arc::new(provider),
            catalog.clone(),
            Duration::from_millis(1),
            3,
        );

        queue.enqueue(42).unwrap();

        assert_eq!(next_event(&mut events).await, EnrichmentEvent::Enriched { app_id: 42 });
        assert!(catalog.get(42).await.unwrap().is_some());

        drop(queue);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_exhausted_retries_skip_the_item() {
        let mut provider = MockMetadataProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_fetch()
            .times(2)
            .returning(|_| Err(AppError::Upstream("still down".to_string())));

        let catalog = Arc::new(MemoryCatalogStore::new());
        let (queue, mut events, handle) = EnrichmentWorker::spawn(
            Arc::new(provider),
            catalog.clone(),
            Duration::from_millis(1),
            2,
        );

        queue.enqueue(7).unwrap();

        assert_eq!(next_event(&mut events).await, EnrichmentEvent::Skipped { app_id: 7 });
        assert!(catalog.get(7).await.unwrap().is_none());

        drop(queue);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_upstream_is_not_retried() {
        let mut provider = MockMetadataProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_fetch()
            .times(1)
            .returning(|app_id| Err(AppError::NotFound(format!("no app {}", app_id))));

        let catalog = Arc::new(MemoryCatalogStore::new());
        let (queue, mut events, handle) = EnrichmentWorker::spawn(
            Arc::new(provider),
            catalog,
            Duration::from_millis(1),
            5,
        );

        queue.enqueue(9).unwrap();
        assert_eq!(next_event(&mut events).await, EnrichmentEvent::Skipped { app_id: 9 });

        drop(queue);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_enqueue_after_worker_stops_errors() {
        let mut provider = MockMetadataProvider::new();
        provider.expect_name().return_const("mock");
        let catalog = Arc::new(MemoryCatalogStore::new());
        let (queue, events, handle) = EnrichmentWorker::spawn(
            Arc::new(provider),
            catalog,
            Duration::from_millis(1),
            1,
        );

        drop(events);
        handle.abort();
        let _ = handle.await;

        let err = queue.enqueue(1).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_find_missing() {
        use crate::models::{Difficulty, MultiplayerMode};

        let catalog = MemoryCatalogStore::seeded(vec![crate::models::CatalogEntry {
            app_id: 10,
            name: "Known".into(),
            developers: None,
            publishers: None,
            genres: String::new(),
            tags: String::new(),
            header_image: None,
            price: None,
            positive: 0,
            negative: 0,
            avg_session_minutes: None,
            difficulty: Difficulty::Medium,
            multiplayer_mode: MultiplayerMode::Solo,
            windows: true,
            mac: false,
            linux: false,
            document: None,
        }]);

        let stat = |app_id| LibraryStat {
            profile_id: "p1".into(),
            app_id,
            playtime_forever_min: 0,
            playtime_2weeks_min: 0,
            last_played: None,
        };

        let missing = find_missing(&catalog, &[stat(30), stat(10), stat(20), stat(30)])
            .await
            .unwrap();
        assert_eq!(missing, vec![20, 30]);
    }

    #[tokio::test]
    async fn test_enqueue_missing_honors_limit() {
        let mut provider = MockMetadataProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_fetch()
            .returning(|app_id| Ok(sample_metadata(app_id)));

        let catalog = Arc::new(MemoryCatalogStore::new());
        let (queue, mut events, handle) = EnrichmentWorker::spawn(
            Arc::new(provider),
            catalog.clone(),
            Duration::from_millis(1),
            1,
        );

        let stat = |app_id| LibraryStat {
            profile_id: "p1".into(),
            app_id,
            playtime_forever_min: 0,
            playtime_2weeks_min: 0,
            last_played: None,
        };

        let queued = enqueue_missing(
            &queue,
            catalog.as_ref(),
            &[stat(1), stat(2), stat(3), stat(4)],
            2,
        )
        .await
        .unwrap();
        assert_eq!(queued, 2);

        let mut enriched = 0usize;
        while enriched < 2 {
            if let EnrichmentEvent::BatchIdle { enriched: e, .. } = next_event(&mut events).await {
                enriched += e;
            }
        }
        assert_eq!(catalog.all_app_ids().await.unwrap().len(), 2);

        drop(queue);
        handle.await.unwrap();
    }
}
