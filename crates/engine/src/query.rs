use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use caixa_client::{ApiError, LedgerApi};
use caixa_core::{EntryFilter, LedgerEntry, Summary};

/// How an engine instance reacts to filter changes.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    /// Quiescence window before a changed filter triggers a fetch.
    pub debounce: Duration,
    /// Pair every list fetch with a daily-summary fetch for the filter's
    /// selected date, applying both as one atomic state update.
    pub with_daily_summary: bool,
}

impl QueryOptions {
    /// Live-ledger view: immediate re-fetch, list and summary together.
    pub fn dashboard() -> Self {
        QueryOptions { debounce: Duration::ZERO, with_daily_summary: true }
    }

    /// Report view: rapid filter edits collapse into a single trailing fetch.
    pub fn report() -> Self {
        QueryOptions { debounce: Duration::from_millis(250), with_daily_summary: false }
    }
}

/// Published result of the latest settled fetch.
///
/// The result set is replaced wholesale on success and preserved on failure;
/// `generation` identifies which filter submission produced it.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub entries: Vec<LedgerEntry>,
    pub summary: Option<Summary>,
    pub loading: bool,
    pub error: Option<String>,
    pub generation: u64,
}

/// Watches a filter value, debounces, fetches, and republishes a
/// [`ViewState`]. Completions are applied latest-wins: each fetch carries a
/// generation number and a completion whose generation is no longer current
/// is discarded silently.
pub struct QueryEngine {
    filter_tx: watch::Sender<EntryFilter>,
    state_rx: watch::Receiver<ViewState>,
    task: JoinHandle<()>,
}

impl QueryEngine {
    /// Starts the engine with an immediate fetch for `initial`.
    pub fn spawn(client: Arc<dyn LedgerApi>, initial: EntryFilter, options: QueryOptions) -> Self {
        let (filter_tx, filter_rx) = watch::channel(initial);
        let (state_tx, state_rx) = watch::channel(ViewState::default());
        let task = tokio::spawn(run(client, filter_rx, state_tx, options));
        QueryEngine { filter_tx, state_rx, task }
    }

    pub fn set_filter(&self, filter: EntryFilter) {
        self.filter_tx.send_replace(filter);
    }

    pub fn update_filter(&self, update: impl FnOnce(&mut EntryFilter)) {
        self.filter_tx.send_modify(update);
    }

    pub fn filter(&self) -> EntryFilter {
        self.filter_tx.borrow().clone()
    }

    pub fn state(&self) -> watch::Receiver<ViewState> {
        self.state_rx.clone()
    }

    /// Waits until at least one fetch has completed and none is pending.
    pub async fn settled(&self) -> ViewState {
        let mut rx = self.state_rx.clone();
        let settled = rx
            .wait_for(|s| s.generation > 0 && !s.loading)
            .await
            .map(|state| ViewState::clone(&state));
        match settled {
            Ok(state) => state,
            Err(_) => ViewState::clone(&rx.borrow()),
        }
    }
}

impl Drop for QueryEngine {
    // Tear-down must also cancel a pending debounce timer so no fetch fires
    // for a view that is gone.
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    client: Arc<dyn LedgerApi>,
    mut filter_rx: watch::Receiver<EntryFilter>,
    state_tx: watch::Sender<ViewState>,
    options: QueryOptions,
) {
    let latest = Arc::new(AtomicU64::new(0));
    let mut generation: u64 = 0;

    loop {
        generation += 1;
        let filter = filter_rx.borrow_and_update().clone();
        dispatch(&client, filter, generation, &latest, &state_tx, options.with_daily_summary);

        if filter_rx.changed().await.is_err() {
            return;
        }
        // Debounce: the window restarts on every further change, so only the
        // trailing edit of a rapid sequence reaches the service.
        loop {
            tokio::select! {
                _ = tokio::time::sleep(options.debounce) => break,
                changed = filter_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

fn dispatch(
    client: &Arc<dyn LedgerApi>,
    filter: EntryFilter,
    generation: u64,
    latest: &Arc<AtomicU64>,
    state_tx: &watch::Sender<ViewState>,
    with_daily_summary: bool,
) {
    latest.store(generation, Ordering::SeqCst);
    state_tx.send_modify(|state| state.loading = true);

    let client = Arc::clone(client);
    let latest = Arc::clone(latest);
    let state_tx = state_tx.clone();

    tokio::spawn(async move {
        let summary_date = if with_daily_summary { filter.date } else { None };
        let outcome = match summary_date {
            // Both fetches must succeed before either result is applied, so
            // the list and the summary always describe the same moment.
            Some(date) => {
                tokio::try_join!(client.list_entries(&filter), client.daily_summary(date))
                    .map(|(entries, summary)| (entries, Some(summary)))
            }
            None => client.list_entries(&filter).await.map(|entries| (entries, None)),
        };

        if latest.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "discarding stale fetch completion");
            return;
        }

        state_tx.send_modify(|state| {
            state.loading = false;
            state.generation = generation;
            match outcome {
                Ok((entries, summary)) => {
                    state.entries = entries;
                    if summary.is_some() {
                        state.summary = summary;
                    }
                    state.error = None;
                }
                Err(ApiError::Unauthorized) => {
                    // The client already ended the session; keep the result
                    // set and let session subscribers handle the redirect.
                }
                Err(e) => {
                    tracing::warn!(generation, "fetch failed: {e}");
                    state.error = Some(e.to_string());
                }
            }
        });
    });
}
