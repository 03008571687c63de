//! Real-time issue tracker
//!
//! Listens on `/api/sse/stream` while a view is mounted:
//!
//! 1. Each message is parsed as an [`IssueUpdate`] and prepended to the log
//! 2. The `["issues"]` query prefix is invalidated once per message
//! 3. A [`Notification`] is broadcast for the toast layer
//!
//! Unparseable messages are logged and skipped. When the stream fails the
//! connection is closed and [`ReconnectPolicy`] decides what happens next.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use eventsource_stream::Eventsource;
use futures::StreamExt;
use parking_lot::RwLock;
use reqwest::Client;
use shared::event::IssueUpdate;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cache::{ISSUES_KEY, QueryCache};
use crate::notification::Notification;
use crate::{ClientConfig, ClientResult};

/// Newest entries kept in the in-memory log
pub const MAX_LOG_ENTRIES: usize = 100;

const STREAM_PATH: &str = "/api/sse/stream";

/// What to do after the stream drops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Stay closed until the next `start()`
    Never,
    /// Retry after `initial`, doubling up to `max`; reset after a connect
    Backoff { initial: Duration, max: Duration },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy::Backoff {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

struct TrackerShared {
    cache: Arc<QueryCache>,
    log: RwLock<VecDeque<IssueUpdate>>,
    notifications: broadcast::Sender<Notification>,
    state: watch::Sender<ConnectionState>,
    /// Bumped by every `start()` and `stop()`; tasks from an older run may not
    /// touch `state`
    generation: AtomicU64,
}

impl TrackerShared {
    fn set_state(&self, generation: u64, next: ConnectionState) {
        self.state.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation || *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    fn handle_message(&self, data: &str) -> Option<Notification> {
        let update: IssueUpdate = match serde_json::from_str(data) {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!(error = %e, data, "Skipping unparseable push message");
                return None;
            }
        };
        tracing::debug!(event = %update.kind, "Push update received");

        let notification = Notification::from_update(&update);
        {
            let mut log = self.log.write();
            log.push_front(update);
            log.truncate(MAX_LOG_ENTRIES);
        }
        self.cache.invalidate(&[ISSUES_KEY]);
        // no toast layer attached is fine
        let _ = self.notifications.send(notification.clone());
        Some(notification)
    }
}

/// Page-scoped push listener
///
/// `start()` on mount, `stop()` (or drop) on unmount.
pub struct IssueTracker {
    config: ClientConfig,
    policy: ReconnectPolicy,
    shared: Arc<TrackerShared>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl IssueTracker {
    pub fn new(config: ClientConfig, cache: Arc<QueryCache>) -> Self {
        let (notifications, _) = broadcast::channel(64);
        let (state, _) = watch::channel(ConnectionState::Closed);
        Self {
            config,
            policy: ReconnectPolicy::default(),
            shared: Arc::new(TrackerShared {
                cache,
                log: RwLock::new(VecDeque::new()),
                notifications,
                state,
                generation: AtomicU64::new(0),
            }),
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Open the stream in a background task; no-op while already running
    pub fn start(&mut self) -> ClientResult<()> {
        if self.is_running() {
            return Ok(());
        }

        // no total timeout: the body never ends on its own
        let client = Client::builder()
            .connect_timeout(self.config.timeout)
            .user_agent(self.config.user_agent.clone())
            .build()?;

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancel = CancellationToken::new();
        self.shared.state.send_replace(ConnectionState::Connecting);
        self.task = Some(tokio::spawn(run(
            client,
            self.config.url(STREAM_PATH),
            self.policy,
            Arc::clone(&self.shared),
            self.cancel.clone(),
            generation,
        )));
        Ok(())
    }

    /// Close the stream; the log and notifications stay readable
    pub fn stop(&mut self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.cancel.cancel();
        self.task = None;
        self.shared.state.send_replace(ConnectionState::Closed);
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Received updates, newest first
    pub fn updates(&self) -> Vec<IssueUpdate> {
        self.shared.log.read().iter().cloned().collect()
    }

    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Notification> {
        self.shared.notifications.subscribe()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Feed one raw `data:` payload through the same path as the stream
    pub fn ingest(&self, data: &str) -> Option<Notification> {
        self.shared.handle_message(data)
    }
}

impl Drop for IssueTracker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    client: Client,
    url: String,
    policy: ReconnectPolicy,
    shared: Arc<TrackerShared>,
    cancel: CancellationToken,
    generation: u64,
) {
    let mut reconnect_delay = match policy {
        ReconnectPolicy::Backoff { initial, .. } => initial,
        ReconnectPolicy::Never => Duration::ZERO,
    };

    loop {
        if cancel.is_cancelled() {
            break;
        }
        shared.set_state(generation, ConnectionState::Connecting);

        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            result = connect(&client, &url) => result,
        };

        match connected {
            Ok(response) => {
                tracing::info!(url = %url, "Push stream connected");
                shared.set_state(generation, ConnectionState::Open);
                if let ReconnectPolicy::Backoff { initial, .. } = policy {
                    reconnect_delay = initial;
                }
                read_stream(response, &shared, &cancel).await;
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Push stream connection failed");
            }
        }

        shared.set_state(generation, ConnectionState::Closed);

        match policy {
            ReconnectPolicy::Never => break,
            ReconnectPolicy::Backoff { max, .. } => {
                tracing::debug!(delay_ms = reconnect_delay.as_millis() as u64, "Reconnecting push stream");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(reconnect_delay) => {},
                }
                reconnect_delay = (reconnect_delay * 2).min(max);
            }
        }
    }

    shared.set_state(generation, ConnectionState::Closed);
    tracing::debug!("Push stream task stopped");
}

async fn connect(client: &Client, url: &str) -> ClientResult<reqwest::Response> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await?
        .error_for_status()?;
    Ok(response)
}

async fn read_stream(
    response: reqwest::Response,
    shared: &TrackerShared,
    cancel: &CancellationToken,
) {
    let mut events = response.bytes_stream().eventsource();
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return,
            next = events.next() => next,
        };
        match next {
            Some(Ok(event)) => {
                if !event.data.is_empty() {
                    shared.handle_message(&event.data);
                }
            }
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Push stream error, closing");
                return;
            }
            None => {
                tracing::info!("Push stream closed by server");
                return;
            }
        }
    }
}
