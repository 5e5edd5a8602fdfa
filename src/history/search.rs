use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

use super::record::{placeholder_record, AnalysisRecord};
use super::store::StorageTier;
use crate::error::SyncError;

/// Delay after the last keystroke before a fetch is issued.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// One tier-scoped history fetch, as the coordinator sees it.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub tier: StorageTier,
    pub records: Vec<AnalysisRecord>,
}

#[async_trait]
pub trait HistoryReader: Send + Sync {
    async fn search(&self, owner: Option<Uuid>, query: &str) -> Result<SearchPage, SyncError>;
}

/// What subscribers render: the query a result set belongs to, the records,
/// and a non-blocking error notice when the fetch failed.
#[derive(Debug, Clone, Default)]
pub struct SearchSnapshot {
    pub query: String,
    pub records: Vec<AnalysisRecord>,
    pub error: Option<String>,
}

struct SearchContext {
    owner: Option<Uuid>,
    query: String,
    pending: Option<JoinHandle<()>>,
}

/// Debounced search over the active history tier.
///
/// Each change cancels the previously scheduled fetch; a generation counter
/// additionally guarantees that only the latest request's result is published,
/// so an early slow fetch can never overwrite a later one. Must be used from
/// within a tokio runtime.
pub struct SearchCoordinator {
    reader: Arc<dyn HistoryReader>,
    debounce: Duration,
    seq: Arc<AtomicU64>,
    ctx: Mutex<SearchContext>,
    tx: Arc<watch::Sender<SearchSnapshot>>,
}

impl SearchCoordinator {
    pub fn new(reader: Arc<dyn HistoryReader>) -> Self {
        Self::with_debounce(reader, SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(reader: Arc<dyn HistoryReader>, debounce: Duration) -> Self {
        let (tx, _rx) = watch::channel(SearchSnapshot::default());
        Self {
            reader,
            debounce,
            seq: Arc::new(AtomicU64::new(0)),
            ctx: Mutex::new(SearchContext {
                owner: None,
                query: String::new(),
                pending: None,
            }),
            tx: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.tx.subscribe()
    }

    fn lock_ctx(&self) -> MutexGuard<'_, SearchContext> {
        self.ctx.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Debounced: no matter how many keystrokes arrive inside the window,
    /// exactly one fetch runs, scoped to the latest text.
    pub fn on_query_change(&self, text: &str) {
        let mut ctx = self.lock_ctx();
        ctx.query = text.to_string();
        self.schedule(&mut ctx, self.debounce);
    }

    /// Identity changed (login/logout): refetch the current text immediately.
    pub fn set_owner(&self, owner: Option<Uuid>) {
        let mut ctx = self.lock_ctx();
        if ctx.owner == owner {
            return;
        }
        ctx.owner = owner;
        self.schedule(&mut ctx, Duration::ZERO);
    }

    /// Entitlement (and with it the active tier) may have changed: refetch
    /// the current text with no debounce delay.
    pub fn refresh(&self) {
        let mut ctx = self.lock_ctx();
        self.schedule(&mut ctx, Duration::ZERO);
    }

    fn schedule(&self, ctx: &mut SearchContext, delay: Duration) {
        if let Some(pending) = ctx.pending.take() {
            pending.abort();
        }
        let generation = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let seq = Arc::clone(&self.seq);
        let reader = Arc::clone(&self.reader);
        let tx = Arc::clone(&self.tx);
        let owner = ctx.owner;
        let query = ctx.query.clone();

        ctx.pending = Some(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if seq.load(Ordering::SeqCst) != generation {
                return;
            }
            let snapshot = match reader.search(owner, &query).await {
                Ok(page) => SearchSnapshot {
                    records: apply_empty_state(page, &query),
                    query: query.clone(),
                    error: None,
                },
                Err(e) => {
                    warn!(error = %e, "history fetch failed");
                    SearchSnapshot {
                        query: query.clone(),
                        records: Vec::new(),
                        error: Some(e.to_string()),
                    }
                }
            };
            // A newer request may have started while we were fetching.
            if seq.load(Ordering::SeqCst) != generation {
                return;
            }
            let _ = tx.send(snapshot);
        }));
    }
}

impl Drop for SearchCoordinator {
    fn drop(&mut self) {
        if let Some(pending) = self.lock_ctx().pending.take() {
            pending.abort();
        }
    }
}

/// An empty, unfiltered local tier shows one illustrative placeholder entry
/// instead of a blank page. Cosmetic only.
fn apply_empty_state(page: SearchPage, query: &str) -> Vec<AnalysisRecord> {
    if page.tier == StorageTier::Local && page.records.is_empty() && query.is_empty() {
        vec![placeholder_record()]
    } else {
        page.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::record::NewAnalysis;
    use std::sync::atomic::AtomicUsize;

    const WAIT: Duration = Duration::from_secs(30);

    struct CountingReader {
        tier: StorageTier,
        calls: AtomicUsize,
        queries: Mutex<Vec<String>>,
        records: Vec<AnalysisRecord>,
    }

    impl CountingReader {
        fn new(tier: StorageTier) -> Self {
            Self {
                tier,
                calls: AtomicUsize::new(0),
                queries: Mutex::new(Vec::new()),
                records: Vec::new(),
            }
        }

        fn with_records(mut self, records: Vec<AnalysisRecord>) -> Self {
            self.records = records;
            self
        }
    }

    #[async_trait]
    impl HistoryReader for CountingReader {
        async fn search(&self, _owner: Option<Uuid>, query: &str) -> Result<SearchPage, SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.to_string());
            Ok(SearchPage {
                tier: self.tier,
                records: self.records.clone(),
            })
        }
    }

    /// Stalls on one marker query, returns instantly otherwise.
    struct SlowOnFirst;

    #[async_trait]
    impl HistoryReader for SlowOnFirst {
        async fn search(&self, _owner: Option<Uuid>, query: &str) -> Result<SearchPage, SyncError> {
            if query == "slow" {
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
            Ok(SearchPage {
                tier: StorageTier::Remote,
                records: Vec::new(),
            })
        }
    }

    struct FailingReader;

    #[async_trait]
    impl HistoryReader for FailingReader {
        async fn search(&self, _owner: Option<Uuid>, _query: &str) -> Result<SearchPage, SyncError> {
            Err(SyncError::Persistence(sqlx::Error::PoolClosed))
        }
    }

    fn record(name: &str) -> AnalysisRecord {
        NewAnalysis {
            name: name.into(),
            ..Default::default()
        }
        .into_local_record(None)
    }

    async fn next_snapshot(rx: &mut watch::Receiver<SearchSnapshot>) -> SearchSnapshot {
        tokio::time::timeout(WAIT, rx.changed())
            .await
            .expect("snapshot within the window")
            .expect("sender alive");
        rx.borrow().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_keystrokes_collapse_into_one_fetch() {
        let reader = Arc::new(CountingReader::new(StorageTier::Remote));
        let coordinator = SearchCoordinator::new(reader.clone());
        let mut rx = coordinator.subscribe();

        coordinator.on_query_change("a");
        coordinator.on_query_change("ap");
        coordinator.on_query_change("app");

        let snapshot = next_snapshot(&mut rx).await;
        assert_eq!(snapshot.query, "app");
        assert_eq!(reader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(reader.queries.lock().unwrap().as_slice(), ["app"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_fetch_never_overwrites_a_newer_result() {
        let coordinator = SearchCoordinator::new(Arc::new(SlowOnFirst));
        let mut rx = coordinator.subscribe();

        coordinator.on_query_change("slow");
        // Let the debounce elapse so the slow fetch is actually in flight.
        tokio::time::sleep(Duration::from_millis(350)).await;
        coordinator.on_query_change("fast");

        let snapshot = next_snapshot(&mut rx).await;
        assert_eq!(snapshot.query, "fast");

        // Give the aborted fetch every chance to land; it must not.
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(!rx.has_changed().expect("sender alive"));
        assert_eq!(rx.borrow().query, "fast");
    }

    #[tokio::test(start_paused = true)]
    async fn owner_change_refetches_immediately_with_current_text() {
        let reader = Arc::new(CountingReader::new(StorageTier::Remote));
        let coordinator = SearchCoordinator::new(reader.clone());
        let mut rx = coordinator.subscribe();

        coordinator.on_query_change("toast");
        let _ = next_snapshot(&mut rx).await;

        coordinator.set_owner(Some(Uuid::new_v4()));
        let snapshot = next_snapshot(&mut rx).await;
        assert_eq!(snapshot.query, "toast");
        assert_eq!(reader.calls.load(Ordering::SeqCst), 2);

        // Setting the same owner twice only refetches once.
        coordinator.set_owner(None);
        coordinator.set_owner(None);
        let _ = next_snapshot(&mut rx).await;
        assert_eq!(reader.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_local_tier_without_query_shows_placeholder() {
        let reader = Arc::new(CountingReader::new(StorageTier::Local));
        let coordinator = SearchCoordinator::new(reader);
        let mut rx = coordinator.subscribe();

        coordinator.refresh();
        let snapshot = next_snapshot(&mut rx).await;
        assert_eq!(snapshot.records.len(), 1);
        assert!(snapshot.records[0].name.contains("Example"));
    }

    #[tokio::test(start_paused = true)]
    async fn placeholder_is_suppressed_when_searching_or_remote() {
        let local = Arc::new(CountingReader::new(StorageTier::Local));
        let coordinator = SearchCoordinator::new(local);
        let mut rx = coordinator.subscribe();
        coordinator.on_query_change("nothing matches");
        assert!(next_snapshot(&mut rx).await.records.is_empty());

        let remote = Arc::new(CountingReader::new(StorageTier::Remote));
        let coordinator = SearchCoordinator::new(remote);
        let mut rx = coordinator.subscribe();
        coordinator.refresh();
        assert!(next_snapshot(&mut rx).await.records.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn real_records_pass_through_unchanged() {
        let reader = Arc::new(
            CountingReader::new(StorageTier::Local).with_records(vec![record("Apple")]),
        );
        let coordinator = SearchCoordinator::new(reader);
        let mut rx = coordinator.subscribe();
        coordinator.refresh();
        let snapshot = next_snapshot(&mut rx).await;
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.records[0].name, "Apple");
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_surfaces_a_notice_not_a_panic() {
        let coordinator = SearchCoordinator::new(Arc::new(FailingReader));
        let mut rx = coordinator.subscribe();
        coordinator.on_query_change("apple");
        let snapshot = next_snapshot(&mut rx).await;
        assert!(snapshot.records.is_empty());
        assert!(snapshot.error.is_some());
    }
}
