//! Control-API client.
//!
//! [`LcuClient`] discovers the running client, authenticates, keeps the
//! event socket open, and routes endpoint events to subscribers.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected ──try_connect──► Connecting ──► Connected
//!      ▲                                          │
//!      └──────────── Disconnecting ◄──────────────┘
//!         (disconnect, socket loss, process exit)
//! ```
//!
//! `Connecting` and `Disconnecting` are single-flight guards; only
//! [`LcuClient::is_connected`] is observable.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{Sink, Stream, StreamExt};
use parking_lot::{Mutex, RwLock};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::observer::Observers;
use crate::process::ProcessLocator;
use crate::protocol::{
    AVAILABILITY_ENDPOINT, CURRENT_SUMMONER_ENDPOINT, ControlMessage, Endpoint,
    GAMEFLOW_PHASE_ENDPOINT, PROCESS_EXIT_ENDPOINT, normalize,
};
use crate::transport::socket;

use super::builder::{ClientBuilder, ClientConfig};
use super::event_loop::{self, Dispatcher, LoopCommand};
use super::registry::{ControlAction, Handler, SubscriptionRegistry};
use super::session::Session;
use super::state::{DerivedState, GameflowPhase, Summoner};

// ============================================================================
// Constants
// ============================================================================

/// How long `disconnect` waits for the event loop before aborting it.
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Types
// ============================================================================

/// Handles for the running event loop.
#[derive(Debug)]
struct ActiveConnection {
    generation: u64,
    commands: mpsc::UnboundedSender<LoopCommand>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Clears a single-flight flag on drop.
struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FlightGuard<'a> {
    /// Claims the flag.
    fn acquire(flag: &'a AtomicBool, operation: &'static str) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self { flag })
            .map_err(|_| Error::already_in_progress(operation))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Availability check body.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Availability {
    #[serde(default)]
    is_available: bool,
    #[serde(default)]
    state: String,
}

// ============================================================================
// ClientInner
// ============================================================================

/// State shared by every clone of a client.
struct ClientInner {
    config: ClientConfig,
    locator: Arc<dyn ProcessLocator>,
    http: reqwest::Client,
    registry: Arc<SubscriptionRegistry>,
    state: Arc<DerivedState>,

    connected: AtomicBool,
    connecting: AtomicBool,
    disconnecting: AtomicBool,
    generation: AtomicU64,

    session: RwLock<Option<Session>>,
    connection: Mutex<Option<ActiveConnection>>,

    on_connected: Observers<Session>,
    on_disconnected: Observers<()>,
}

// ============================================================================
// LcuClient
// ============================================================================

/// Client for the local control API and its event socket.
///
/// Cheap to clone; clones share one connection.
///
/// # Example
///
/// ```no_run
/// use lcu_bridge::{Callback, LcuClient, SubscriptionMessage};
///
/// # async fn example() -> lcu_bridge::Result<()> {
/// let client = LcuClient::new()?;
///
/// client.subscribe(
///     "/lol-gameflow/v1/gameflow-phase",
///     Callback::new(|event: &SubscriptionMessage| println!("{} {}", event.event_type, event.data)),
/// )?;
///
/// client.force_connect(None).await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LcuClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for LcuClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LcuClient")
            .field("process_name", &self.inner.config.process_name)
            .field("connected", &self.is_connected())
            .field("endpoints", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// LcuClient - Construction
// ============================================================================

impl LcuClient {
    /// Creates a client with default settings.
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
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Assembles a client from validated parts.
    pub(crate) fn from_parts(
        config: ClientConfig,
        locator: Arc<dyn ProcessLocator>,
        http: reqwest::Client,
    ) -> Self {
        let registry = Arc::new(SubscriptionRegistry::new());
        if config.track_state {
            registry.pin(Endpoint::new(GAMEFLOW_PHASE_ENDPOINT));
            registry.pin(Endpoint::new(CURRENT_SUMMONER_ENDPOINT));
        }

        Self {
            inner: Arc::new(ClientInner {
                config,
                locator,
                http,
                registry,
                state: Arc::new(DerivedState::new()),
                connected: AtomicBool::new(false),
                connecting: AtomicBool::new(false),
                disconnecting: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                session: RwLock::new(None),
                connection: Mutex::new(None),
                on_connected: Observers::new(),
                on_disconnected: Observers::new(),
            }),
        }
    }
}

// ============================================================================
// LcuClient - Connection
// ============================================================================

impl LcuClient {
    /// Makes one connection attempt.
    ///
    /// Returns immediately with the current state if already connected or
    /// if another attempt is running. Gate failures are logged at `debug`
    /// and never returned.
    ///
    /// Returns `true` if the client is connected after the call.
    pub async fn try_connect(&self) -> bool {
        if self.is_connected() {
            return true;
        }

        let _guard = match FlightGuard::acquire(&self.inner.connecting, "connect") {
            Ok(guard) => guard,
            Err(e) => {
                trace!(error = %e, "Skipping connection attempt");
                return self.is_connected();
            }
        };

        match self.handshake().await {
            Ok(session) => {
                info!(
                    port = session.port(),
                    region = session.region(),
                    locale = session.locale(),
                    "Connected to client"
                );
                if self.inner.config.track_state {
                    self.refresh_state().await;
                }
                self.is_connected()
            }
            Err(e) => {
                debug!(error = %e, "Connection attempt failed");
                false
            }
        }
    }

    /// Retries [`try_connect`](Self::try_connect) until connected.
    ///
    /// Awaiting this parks the calling task; spawn it to keep working
    /// meanwhile.
    ///
    /// # Arguments
    ///
    /// * `retry_interval` - Delay between attempts, `None` for the configured one
    pub async fn force_connect(&self, retry_interval: Option<Duration>) {
        let interval = retry_interval.unwrap_or(self.inner.config.retry_interval);
        let mut attempts: u64 = 0;

        while !self.try_connect().await {
            attempts += 1;
            trace!(attempts, "Client not reachable, retrying");
            sleep(interval).await;
        }
    }

    /// Closes the connection.
    ///
    /// Idempotent; a no-op when not connected, and returns immediately if
    /// another disconnect is running.
    pub async fn disconnect(&self) {
        let _guard = match FlightGuard::acquire(&self.inner.disconnecting, "disconnect") {
            Ok(guard) => guard,
            Err(e) => {
                trace!(error = %e, "Skipping disconnect");
                return;
            }
        };

        let connection = self.inner.connection.lock().take();
        let Some(connection) = connection else {
            trace!("Not connected, nothing to disconnect");
            return;
        };

        let _ = connection.commands.send(LoopCommand::Shutdown);
        connection.cancel.cancel();

        let mut task = connection.task;
        if timeout(DISCONNECT_TIMEOUT, &mut task).await.is_err() {
            warn!("Event loop did not stop in time, aborting");
            task.abort();
        }

        self.teardown();
    }

    /// Runs the connection gates and attaches the socket.
    async fn handshake(&self) -> Result<Session> {
        let name = &self.inner.config.process_name;

        if !self.inner.locator.is_running(name).await {
            return Err(Error::handshake_failed(format!("{name} is not running")));
        }

        let args = self
            .inner
            .locator
            .command_line(name)
            .await
            .ok_or_else(|| Error::handshake_failed(format!("command line of {name} unavailable")))?;
        let session = Session::from_command_line(&args)?;

        self.check_availability(&session).await?;

        let socket = socket::connect(
            session.port(),
            &session.authorization(),
            self.inner.config.connect_timeout,
        )
        .await?;
        let (write, read) = socket.split();

        self.attach(session.clone(), read, write);
        Ok(session)
    }

    /// Requires the availability check to answer 200 with `isAvailable`.
    async fn check_availability(&self, session: &Session) -> Result<()> {
        let response = self
            .execute(session, Method::GET, AVAILABILITY_ENDPOINT, None)
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::handshake_failed(format!(
                "availability check returned {status}"
            )));
        }

        let availability: Availability = response
            .json()
            .await
            .map_err(|e| Error::handshake_failed(format!("availability body: {e}")))?;

        if !availability.is_available {
            return Err(Error::handshake_failed(format!(
                "client not available (state: {})",
                availability.state
            )));
        }

        Ok(())
    }

    /// Starts the event loop over an open socket and marks the client
    /// connected.
    ///
    /// Subscribes the process-exit event first, then every other pinned
    /// endpoint, then every endpoint already in the registry. Registrations
    /// wait until the new connection is in place, so none is missed.
    pub(crate) fn attach<R, W>(&self, session: Session, read: R, write: W)
    where
        R: Stream<Item = std::result::Result<Message, WsError>> + Unpin + Send + 'static,
        W: Sink<Message, Error = WsError> + Unpin + Send + 'static,
    {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let dispatcher = Dispatcher::new(
            Arc::clone(&self.inner.registry),
            self.inner
                .config
                .track_state
                .then(|| Arc::clone(&self.inner.state)),
        );

        self.inner.registry.with_endpoints(|known| {
            let mut slot = self.inner.connection.lock();

            let mut endpoints = vec![Endpoint::new(PROCESS_EXIT_ENDPOINT)];
            for endpoint in known {
                if !endpoints.contains(&endpoint) {
                    endpoints.push(endpoint);
                }
            }
            for endpoint in &endpoints {
                let _ = commands.send(LoopCommand::Send(ControlMessage::subscribe(endpoint)));
            }
            debug!(count = endpoints.len(), "Queued subscriptions");

            *self.inner.session.write() = Some(session.clone());
            self.inner.connected.store(true, Ordering::Release);

            let weak = Arc::downgrade(&self.inner);
            let task = tokio::spawn(event_loop_task(
                weak,
                generation,
                event_loop::run(read, write, command_rx, cancel.clone(), dispatcher),
            ));

            *slot = Some(ActiveConnection {
                generation,
                commands,
                cancel,
                task,
            });
        });

        self.inner.on_connected.notify(&session);
    }

    /// Tears down after the event loop ended on its own.
    fn on_socket_closed(&self, generation: u64) {
        let Ok(_guard) = FlightGuard::acquire(&self.inner.disconnecting, "disconnect") else {
            return;
        };

        {
            let mut slot = self.inner.connection.lock();
            if slot.as_ref().map(|c| c.generation) != Some(generation) {
                return;
            }
            slot.take();
        }

        self.teardown();
    }

    /// Clears session state and raises `disconnected` once.
    fn teardown(&self) {
        let was_connected = self.inner.connected.swap(false, Ordering::AcqRel);
        self.inner.session.write().take();

        if !self.inner.config.preserve_subscriptions {
            self.inner.registry.clear();
        }
        self.inner.state.reset();

        if was_connected {
            info!("Disconnected from client");
            self.inner.on_disconnected.notify(&());
        }
    }

    /// Loads the tracked values once after connecting.
    async fn refresh_state(&self) {
        match self.get_json::<GameflowPhase>(GAMEFLOW_PHASE_ENDPOINT).await {
            Ok(phase) => self.inner.state.set_phase(phase),
            Err(e) => debug!(error = %e, "Could not load gameflow phase"),
        }

        match self.get_json::<Summoner>(CURRENT_SUMMONER_ENDPOINT).await {
            Ok(summoner) => self.inner.state.set_summoner(Some(summoner)),
            Err(e) => debug!(error = %e, "Could not load current summoner"),
        }
    }
}

/// Runs the loop, then tears the client down if the socket ended by itself.
async fn event_loop_task<F>(client: std::sync::Weak<ClientInner>, generation: u64, run: F)
where
    F: Future<Output = event_loop::LoopExit>,
{
    let exit = run.await;

    if exit.is_unsolicited()
        && let Some(inner) = client.upgrade()
    {
        LcuClient { inner }.on_socket_closed(generation);
    }
}

// ============================================================================
// LcuClient - Subscriptions
// ============================================================================

impl LcuClient {
    /// Registers `callback` for events on `path`.
    ///
    /// The first callback for an endpoint subscribes it on the socket if
    /// connected; otherwise it is subscribed on the next connect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateCallback`] if this handle is already
    /// registered for the endpoint.
    pub fn subscribe(&self, path: &str, callback: Handler) -> Result<()> {
        let endpoint = Endpoint::new(path);
        let registry = &self.inner.registry;
        registry.add_with(&endpoint, callback, |action| {
            if action == ControlAction::Subscribe && !registry.is_pinned(&endpoint) {
                self.send_control(ControlMessage::subscribe(&endpoint));
            }
        })?;

        debug!(%endpoint, "Subscribed");
        Ok(())
    }

    /// Removes `callback` from `path`, or every callback when `None`.
    ///
    /// The endpoint is unsubscribed on the socket once no callback remains,
    /// unless it is pinned.
    ///
    /// Returns `true` if anything was removed.
    pub fn unsubscribe(&self, path: &str, callback: Option<&Handler>) -> bool {
        let endpoint = Endpoint::new(path);
        let (removed, _) = self.inner.registry.remove_with(&endpoint, callback, |action| {
            if action == ControlAction::Unsubscribe {
                self.send_control(ControlMessage::unsubscribe(&endpoint));
            }
        });

        if removed {
            debug!(%endpoint, "Unsubscribed");
        }
        removed
    }

    /// Queues a control message if a connection is active.
    ///
    /// Called with the registry write lock held; lock order is registry,
    /// then connection slot.
    fn send_control(&self, message: ControlMessage) {
        if let Some(connection) = self.inner.connection.lock().as_ref() {
            let _ = connection.commands.send(LoopCommand::Send(message));
        }
    }
}

// ============================================================================
// LcuClient - Requests
// ============================================================================

impl LcuClient {
    /// Sends an authenticated request to the control API.
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method
    /// * `path` - Endpoint path, normalized before use
    /// * `body` - Optional JSON body
    /// * `ignore_ready_gate` - Send even while not marked connected
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if there is no session (no I/O happens)
    /// - [`Error::RequestFailed`] on transport failure
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        ignore_ready_gate: bool,
    ) -> Result<Response> {
        if !ignore_ready_gate && !self.is_connected() {
            return Err(Error::NotConnected);
        }
        let session = self.session().ok_or(Error::NotConnected)?;

        self.execute(&session, method, &normalize(path), body).await
    }

    /// GETs `path` and decodes the JSON body.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if disconnected
    /// - [`Error::RequestFailed`] on transport failure
    /// - [`Error::UnexpectedStatus`] on a non-success status
    /// - [`Error::Json`] if the body does not match `T`
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let endpoint = normalize(path);
        let response = self.request(Method::GET, &endpoint, None, false).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::unexpected_status(endpoint, status));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::request_failed(&endpoint, e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Performs one request with the session's credentials.
    async fn execute(
        &self,
        session: &Session,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Response> {
        let url = format!("{}{endpoint}", session.base_url());
        trace!(%method, endpoint, "Control API request");

        let mut request = self
            .inner
            .http
            .request(method, url)
            .header(AUTHORIZATION, session.authorization())
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        request
            .send()
            .await
            .map_err(|e| Error::request_failed(endpoint, e))
    }
}

// ============================================================================
// LcuClient - Accessors
// ============================================================================

impl LcuClient {
    /// Returns `true` while a session is live.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Returns a copy of the current session.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.inner.session.read().clone()
    }

    /// Returns the configured process name.
    #[inline]
    #[must_use]
    pub fn process_name(&self) -> &str {
        &self.inner.config.process_name
    }

    /// Returns every endpoint with at least one callback, sorted.
    #[must_use]
    pub fn subscribed_endpoints(&self) -> Vec<Endpoint> {
        self.inner.registry.endpoints()
    }

    /// Returns the last known gameflow phase.
    #[must_use]
    pub fn gameflow_phase(&self) -> GameflowPhase {
        self.inner.state.phase()
    }

    /// Returns the last known current summoner.
    #[must_use]
    pub fn current_summoner(&self) -> Option<Summoner> {
        self.inner.state.summoner()
    }

    /// Observers raised after a connection is established.
    #[inline]
    #[must_use]
    pub fn on_connected(&self) -> &Observers<Session> {
        &self.inner.on_connected
    }

    /// Observers raised after the connection is gone.
    #[inline]
    #[must_use]
    pub fn on_disconnected(&self) -> &Observers<()> {
        &self.inner.on_disconnected
    }

    /// Observers of gameflow phase changes.
    #[inline]
    #[must_use]
    pub fn on_phase_changed(&self) -> &Observers<GameflowPhase> {
        self.inner.state.on_phase_changed()
    }

    /// Observers of current summoner changes.
    #[inline]
    #[must_use]
    pub fn on_summoner_changed(&self) -> &Observers<Option<Summoner>> {
        self.inner.state.on_summoner_changed()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use rustc_hash::FxHashMap;
    use serde_json::json;

    use crate::client::event_loop::tests::{RecordingSink, event_frame, open_stream};
    use crate::observer::Callback;
    use crate::process::CommandLineArgs;
    use crate::protocol::{Opcode, SubscriptionMessage};

    /// Locator that reports a missing process after a delay.
    #[derive(Default)]
    struct SlowLocator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProcessLocator for SlowLocator {
        async fn is_running(&self, _name: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(100)).await;
            false
        }

        async fn command_line(&self, _name: &str) -> Option<CommandLineArgs> {
            None
        }
    }

    /// Locator that finds a process without credentials.
    struct BareLocator;

    #[async_trait]
    impl ProcessLocator for BareLocator {
        async fn is_running(&self, _name: &str) -> bool {
            true
        }

        async fn command_line(&self, _name: &str) -> Option<CommandLineArgs> {
            Some(CommandLineArgs::parse("LeagueClientUx --region=EUW"))
        }
    }

    fn client_with(locator: Arc<dyn ProcessLocator>, preserve: bool) -> LcuClient {
        LcuClient::builder()
            .locator(locator)
            .preserve_subscriptions(preserve)
            .build()
            .unwrap()
    }

    fn test_session() -> Session {
        Session::new(51234, "EUW", "en_GB", "secret").unwrap()
    }

    async fn eventually(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_concurrent_try_connect_is_single_flight() {
        let locator = Arc::new(SlowLocator::default());
        let client = client_with(locator.clone(), true);

        let (a, b) = tokio::join!(client.try_connect(), client.try_connect());

        assert!(!a && !b);
        assert_eq!(locator.calls.load(Ordering::SeqCst), 1);
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_silently() {
        let client = client_with(Arc::new(BareLocator), true);
        assert!(!client.try_connect().await);
        assert!(client.session().is_none());
    }

    #[tokio::test]
    async fn test_request_without_session_does_no_io() {
        let client = client_with(Arc::new(SlowLocator::default()), true);

        let err = client
            .request(Method::GET, "/lol-summoner/v1/current-summoner", None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotConnected));

        let err = client
            .request(Method::GET, "/x", Some(json!({})), true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn test_attach_subscribes_process_exit_then_registry() {
        let client = client_with(Arc::new(SlowLocator::default()), true);
        client
            .subscribe("lol-lobby/v2/lobby/", Callback::new(|_| {}))
            .unwrap();

        let connected = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&connected);
        client.on_connected().add(Callback::new(move |_: &Session| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let sink = RecordingSink::default();
        client.attach(test_session(), open_stream(Vec::new()), sink.clone());

        assert!(client.is_connected());
        assert_eq!(connected.load(Ordering::SeqCst), 1);
        assert_eq!(client.session().unwrap().port(), 51234);

        eventually(|| sink.texts().len() == 4).await;
        let texts = sink.texts();
        assert_eq!(texts[0], r#"[5,"OnJsonApiEvent_process-control_v1_process"]"#);
        assert!(texts.contains(&r#"[5,"OnJsonApiEvent_lol-lobby_v2_lobby"]"#.to_string()));
        assert!(texts.contains(&r#"[5,"OnJsonApiEvent_lol-gameflow_v1_gameflow-phase"]"#.to_string()));

        client.disconnect().await;
    }

    #[tokio::test]
    async fn test_subscribe_and_unsubscribe_while_connected() {
        let client = client_with(Arc::new(SlowLocator::default()), true);
        let sink = RecordingSink::default();
        client.attach(test_session(), open_stream(Vec::new()), sink.clone());
        eventually(|| sink.texts().len() == 3).await;

        let a = Callback::new(|_: &SubscriptionMessage| {});
        let b = Callback::new(|_: &SubscriptionMessage| {});
        client.subscribe("/lol-chat/v1/me", a.clone()).unwrap();
        client.subscribe("/lol-chat/v1/me", b.clone()).unwrap();
        assert!(matches!(
            client.subscribe("/lol-chat/v1/me", a.clone()),
            Err(Error::DuplicateCallback { .. })
        ));

        assert!(client.unsubscribe("/lol-chat/v1/me", Some(&a)));
        assert!(client.unsubscribe("/lol-chat/v1/me", Some(&b)));
        assert!(!client.unsubscribe("/lol-chat/v1/me", Some(&b)));

        eventually(|| sink.texts().len() == 5).await;
        let texts = sink.texts();
        assert_eq!(texts[3], r#"[5,"OnJsonApiEvent_lol-chat_v1_me"]"#);
        assert_eq!(texts[4], r#"[6,"OnJsonApiEvent_lol-chat_v1_me"]"#);

        client.disconnect().await;
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent_and_preserves_subscriptions() {
        let client = client_with(Arc::new(SlowLocator::default()), true);
        client.subscribe("/lol-lobby/v2/lobby", Callback::new(|_| {})).unwrap();

        let disconnected = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&disconnected);
        client.on_disconnected().add(Callback::new(move |_: &()| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let sink = RecordingSink::default();
        client.attach(test_session(), open_stream(Vec::new()), sink.clone());

        client.disconnect().await;
        client.disconnect().await;

        assert!(!client.is_connected());
        assert!(client.session().is_none());
        assert!(sink.closed());
        assert_eq!(disconnected.load(Ordering::SeqCst), 1);
        assert_eq!(
            client.subscribed_endpoints(),
            vec![Endpoint::new("/lol-lobby/v2/lobby")]
        );
    }

    #[tokio::test]
    async fn test_disconnect_clears_subscriptions_when_not_preserved() {
        let client = client_with(Arc::new(SlowLocator::default()), false);
        client.subscribe("/lol-lobby/v2/lobby", Callback::new(|_| {})).unwrap();

        client.attach(test_session(), open_stream(Vec::new()), RecordingSink::default());
        client.disconnect().await;

        assert!(client.subscribed_endpoints().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_while_idle_is_a_no_op() {
        let client = client_with(Arc::new(SlowLocator::default()), false);
        client.subscribe("/lol-lobby/v2/lobby", Callback::new(|_| {})).unwrap();

        let disconnected = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&disconnected);
        client.on_disconnected().add(Callback::new(move |_: &()| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        client.disconnect().await;

        assert_eq!(
            client.subscribed_endpoints(),
            vec![Endpoint::new("/lol-lobby/v2/lobby")]
        );
        assert_eq!(disconnected.load(Ordering::SeqCst), 0);
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_racing_subscribe_and_unsubscribe_keep_wire_in_step() {
        let client = client_with(Arc::new(SlowLocator::default()), true);
        let sink = RecordingSink::default();
        client.attach(test_session(), open_stream(Vec::new()), sink.clone());
        eventually(|| sink.texts().len() == 3).await;

        let paths: Vec<String> = (0..1000).map(|i| format!("/race/{i}")).collect();
        std::thread::scope(|scope| {
            scope.spawn(|| {
                for path in &paths {
                    let _ = client.subscribe(path, Callback::new(|_| {}));
                }
            });
            scope.spawn(|| {
                for path in &paths {
                    let _ = client.unsubscribe(path, None);
                }
            });
        });

        let marker = ControlMessage::subscribe(&Endpoint::new("/race/done")).to_json();
        client.subscribe("/race/done", Callback::new(|_| {})).unwrap();
        eventually(|| sink.texts().contains(&marker)).await;

        let mut last_sent: FxHashMap<String, u8> = FxHashMap::default();
        for text in sink.texts() {
            let frame: (u8, String) = serde_json::from_str(&text).unwrap();
            last_sent.insert(frame.1, frame.0);
        }

        for path in &paths {
            let endpoint = Endpoint::new(path);
            let sent = last_sent
                .get(&ControlMessage::subscribe(&endpoint).event_name)
                .copied();
            if client.subscribed_endpoints().contains(&endpoint) {
                assert_eq!(sent, Some(Opcode::Subscribe.code()), "{path}");
            } else {
                assert_ne!(sent, Some(Opcode::Subscribe.code()), "{path}");
            }
        }

        client.disconnect().await;
    }

    #[tokio::test]
    async fn test_process_stopping_disconnects() {
        let client = client_with(Arc::new(SlowLocator::default()), true);

        let disconnected = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&disconnected);
        client.on_disconnected().add(Callback::new(move |_: &()| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let frames = vec![event_frame(
            PROCESS_EXIT_ENDPOINT,
            "Update",
            json!({"status": "Stopping"}),
        )];
        let sink = RecordingSink::default();
        client.attach(test_session(), open_stream(frames), sink.clone());

        eventually(|| !client.is_connected()).await;
        eventually(|| disconnected.load(Ordering::SeqCst) == 1).await;
        assert!(sink.closed());
        assert!(client.session().is_none());
    }

    #[tokio::test]
    async fn test_events_reach_subscribers_and_state() {
        let client = client_with(Arc::new(SlowLocator::default()), true);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        client
            .subscribe(
                "/lol-lobby/v2/lobby",
                Callback::new(move |m: &SubscriptionMessage| log.lock().push(m.data.clone())),
            )
            .unwrap();

        let frames = vec![
            event_frame(GAMEFLOW_PHASE_ENDPOINT, "Update", json!("Lobby")),
            event_frame("/lol-lobby/v2/lobby", "Update", json!({"gameConfig": {}})),
        ];
        client.attach(test_session(), open_stream(frames), RecordingSink::default());

        eventually(|| seen.lock().len() == 1).await;
        assert_eq!(client.gameflow_phase(), GameflowPhase::Lobby);

        client.disconnect().await;
        assert_eq!(client.gameflow_phase(), GameflowPhase::None);
    }
}
