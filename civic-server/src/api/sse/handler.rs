use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::StreamExt;
use futures::stream::{self, Stream};
use shared::event::IssueUpdate;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::core::ServerState;

/// GET /api/sse/stream
pub async fn stream(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.live.subscribe();
    let keepalive = Duration::from_secs(state.config.sse_keepalive_secs.max(1));
    tracing::debug!(
        subscribers = state.live.subscriber_count(),
        "Push stream opened"
    );

    Sse::new(update_stream(receiver, state.shutdown_token())).keep_alive(KeepAlive::new().interval(keepalive))
}

fn to_event(update: &IssueUpdate) -> Option<Event> {
    match serde_json::to_string(update) {
        Ok(json) => Some(Event::default().data(json)),
        Err(e) => {
            tracing::error!(event = %update.kind, error = %e, "Failed to encode push event");
            None
        }
    }
}

/// Ends when the hub is dropped or on shutdown; a lagging subscriber skips
/// what it missed
fn update_stream(
    receiver: broadcast::Receiver<IssueUpdate>,
    shutdown: CancellationToken,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(receiver, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(update) => {
                    if let Some(event) = to_event(&update) {
                        return Some((Ok(event), rx));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Push subscriber lagged, dropping missed events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .take_until(shutdown.cancelled_owned())
}
