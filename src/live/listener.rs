//! Telemetry polling listener.
//!
//! [`LiveListener`] polls a [`SnapshotSource`] on an interval and turns the
//! growing event log into one notification per new record.
//!
//! # Poll Loop
//!
//! ```text
//! loop:
//!   sleep(interval)              (zero interval: yield)
//!   snapshot()
//!     Ok(Some(data))  → data_updated, then game_event × appended records
//!     Ok(None)        → connection_lost; exit if stop_on_connection_lost
//!     Err(e)          → fatal: UnexpectedPollFailure
//! ```
//!
//! Cancellation through [`LiveListener::stop`] is observed at the next sleep
//! or fetch and ends the task silently.

// ============================================================================
// Imports
// ============================================================================

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::error::{Error, Result};
use crate::observer::{Observers, panic_message};

use super::api::LiveClientApi;
use super::cursor::EventCursor;
use super::events::GameEvent;
use super::model::AllGameData;

// ============================================================================
// Constants
// ============================================================================

/// Delay between polls when none is given.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

// ============================================================================
// SnapshotSource
// ============================================================================

/// Produces telemetry snapshots for the listener.
///
/// `Ok(None)` means the game is not reachable right now (expected between
/// matches). `Err` means the data could not be understood and is fatal.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetches one snapshot.
    async fn snapshot(&self) -> Result<Option<AllGameData>>;
}

// ============================================================================
// ListenerInner
// ============================================================================

/// State shared between the handle and the polling task.
struct ListenerInner {
    source: Arc<dyn SnapshotSource>,
    poll_interval: Duration,
    stop_on_connection_lost: bool,

    running: AtomicBool,
    cancel: Mutex<CancellationToken>,
    task: Mutex<Option<JoinHandle<Result<()>>>>,

    snapshot: RwLock<Option<Arc<AllGameData>>>,
    cursor: Mutex<EventCursor>,

    on_data_updated: Observers<AllGameData>,
    on_game_event: Observers<GameEvent>,
    on_connection_lost: Observers<()>,
}

impl ListenerInner {
    /// Drops the cached snapshot and rewinds the cursor.
    fn clear(&self) {
        self.snapshot.write().take();
        self.cursor.lock().reset();
    }

    /// Caches `data` and raises `data_updated` then one `game_event` per
    /// appended record.
    fn publish(&self, data: AllGameData) {
        let data = Arc::new(data);
        *self.snapshot.write() = Some(Arc::clone(&data));

        self.on_data_updated.notify(&data);

        let appended = self.cursor.lock().advance(&data.events.events);
        if !appended.is_empty() {
            trace!(count = appended.len(), "New game events");
        }
        for event in appended {
            self.on_game_event.notify(event);
        }
    }
}

// ============================================================================
// LiveListener
// ============================================================================

/// Polls match telemetry and reports changes.
///
/// Cheap to clone; clones share one polling task.
///
/// # Example
///
/// ```no_run
/// use lcu_bridge::{Callback, GameEvent, LiveListener};
///
/// # async fn example() -> lcu_bridge::Result<()> {
/// let listener = LiveListener::new()?;
/// listener
///     .on_game_event()
///     .add(Callback::new(|event: &GameEvent| println!("{} at {:.1}s", event.name, event.time)));
///
/// listener.start(None)?;
/// listener.wait().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LiveListener {
    inner: Arc<ListenerInner>,
}

impl std::fmt::Debug for LiveListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveListener")
            .field("poll_interval", &self.inner.poll_interval)
            .field("stop_on_connection_lost", &self.inner.stop_on_connection_lost)
            .field("running", &self.is_running())
            .field("cursor", &self.cursor())
            .finish_non_exhaustive()
    }
}

impl LiveListener {
    /// Creates a listener over the default telemetry address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the shared HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ListenerBuilder {
        ListenerBuilder::new()
    }

    /// Starts polling.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `poll_interval` - Delay between polls, `None` for the configured one
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRunning`] if polling is active.
    pub fn start(&self, poll_interval: Option<Duration>) -> Result<()> {
        self.inner
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::AlreadyRunning)?;

        let interval = poll_interval.unwrap_or(self.inner.poll_interval);
        self.inner.clear();

        let cancel = CancellationToken::new();
        *self.inner.cancel.lock() = cancel.clone();

        let handle = tokio::spawn(poll_task(Arc::clone(&self.inner), interval, cancel));
        *self.inner.task.lock() = Some(handle);

        info!(interval_ms = interval.as_millis() as u64, "Live listener started");
        Ok(())
    }

    /// Stops polling and clears the cached snapshot and cursor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] if polling is not active.
    pub fn stop(&self) -> Result<()> {
        self.inner
            .running
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::NotRunning)?;

        self.inner.cancel.lock().cancel();
        self.inner.clear();

        info!("Live listener stopped");
        Ok(())
    }

    /// Stops polling if no observer is registered on any channel.
    ///
    /// Returns `true` if it stopped.
    pub fn stop_if_idle(&self) -> bool {
        let idle = self.inner.on_data_updated.is_empty()
            && self.inner.on_game_event.is_empty()
            && self.inner.on_connection_lost.is_empty();

        idle && self.is_running() && self.stop().is_ok()
    }

    /// Waits for the polling task to end.
    ///
    /// # Errors
    ///
    /// - [`Error::NotRunning`] if no task was started since the last wait
    /// - [`Error::UnexpectedPollFailure`] if the task failed
    pub async fn wait(&self) -> Result<()> {
        let handle = self.inner.task.lock().take().ok_or(Error::NotRunning)?;

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(Error::unexpected_poll_failure(e.to_string())),
        }
    }

    /// Returns `true` while polling.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Returns the last snapshot received since start.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<AllGameData>> {
        self.inner.snapshot.read().clone()
    }

    /// Returns the number of event records already delivered.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.inner.cursor.lock().position()
    }

    /// Observers of every successful snapshot.
    #[inline]
    #[must_use]
    pub fn on_data_updated(&self) -> &Observers<AllGameData> {
        &self.inner.on_data_updated
    }

    /// Observers of each newly appended event record.
    #[inline]
    #[must_use]
    pub fn on_game_event(&self) -> &Observers<GameEvent> {
        &self.inner.on_game_event
    }

    /// Observers of failed fetches.
    #[inline]
    #[must_use]
    pub fn on_connection_lost(&self) -> &Observers<()> {
        &self.inner.on_connection_lost
    }
}

// ============================================================================
// Polling Task
// ============================================================================

/// Runs the poll loop, converting panics into fatal errors.
async fn poll_task(
    inner: Arc<ListenerInner>,
    interval: Duration,
    cancel: CancellationToken,
) -> Result<()> {
    let outcome = AssertUnwindSafe(poll_loop(&inner, interval, &cancel))
        .catch_unwind()
        .await;

    let result = match outcome {
        Ok(result) => result,
        Err(payload) => Err(Error::unexpected_poll_failure(format!(
            "polling task panicked: {}",
            panic_message(&payload)
        ))),
    };

    if let Err(e) = &result {
        error!(error = %e, "Live listener failed");
    }

    if !cancel.is_cancelled() {
        inner.running.store(false, Ordering::Release);
    }

    result
}

/// Polls until cancelled, stopped by policy, or failed.
async fn poll_loop(
    inner: &ListenerInner,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<()> {
    loop {
        if interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(()),
                () = sleep(interval) => {}
            }
        }

        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            fetched = inner.source.snapshot() => fetched,
        };

        if cancel.is_cancelled() {
            return Ok(());
        }

        match fetched {
            Ok(Some(data)) => inner.publish(data),

            Ok(None) => {
                debug!("Telemetry snapshot unavailable");
                inner.on_connection_lost.notify(&());

                if inner.stop_on_connection_lost {
                    info!("Live listener stopping after connection loss");
                    inner.clear();
                    return Ok(());
                }
            }

            Err(e) => return Err(Error::unexpected_poll_failure(e.to_string())),
        }
    }
}

// ============================================================================
// ListenerBuilder
// ============================================================================

/// Builder for [`LiveListener`].
#[derive(Clone)]
pub struct ListenerBuilder {
    poll_interval: Duration,
    stop_on_connection_lost: bool,
    source: Option<Arc<dyn SnapshotSource>>,
}

impl Default for ListenerBuilder {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            stop_on_connection_lost: false,
            source: None,
        }
    }
}

impl std::fmt::Debug for ListenerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerBuilder")
            .field("poll_interval", &self.poll_interval)
            .field("stop_on_connection_lost", &self.stop_on_connection_lost)
            .field("custom_source", &self.source.is_some())
            .finish()
    }
}

impl ListenerBuilder {
    /// Creates a builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default delay between polls. Zero polls back to back.
    #[inline]
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Ends polling on the first failed fetch.
    #[inline]
    #[must_use]
    pub fn stop_on_connection_lost(mut self, stop: bool) -> Self {
        self.stop_on_connection_lost = stop;
        self
    }

    /// Polls through a configured [`LiveClientApi`].
    #[inline]
    #[must_use]
    pub fn api(mut self, api: LiveClientApi) -> Self {
        self.source = Some(Arc::new(api));
        self
    }

    /// Polls through any snapshot source.
    #[inline]
    #[must_use]
    pub fn source(mut self, source: Arc<dyn SnapshotSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Builds the listener.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if no source was set and the default
    /// [`LiveClientApi`] cannot be built.
    pub fn build(self) -> Result<LiveListener> {
        let source = match self.source {
            Some(source) => source,
            None => Arc::new(LiveClientApi::new()?),
        };

        Ok(LiveListener {
            inner: Arc::new(ListenerInner {
                source,
                poll_interval: self.poll_interval,
                stop_on_connection_lost: self.stop_on_connection_lost,
                running: AtomicBool::new(false),
                cancel: Mutex::new(CancellationToken::new()),
                task: Mutex::new(None),
                snapshot: RwLock::new(None),
                cursor: Mutex::new(EventCursor::new()),
                on_data_updated: Observers::new(),
                on_game_event: Observers::new(),
                on_connection_lost: Observers::new(),
            }),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
