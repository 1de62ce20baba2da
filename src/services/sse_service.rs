use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use serde::Serialize;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::sse::{Handshake, ServerEvent},
    error::ServiceError,
    services::household_service::require_member,
    state::{SharedState, session::SessionContext},
};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Subscribe a household member to the household's activity stream.
pub async fn subscribe_household(
    state: &SharedState,
    ctx: &SessionContext,
    household_id: Uuid,
) -> Result<(broadcast::Receiver<ServerEvent>, ServerEvent), ServiceError> {
    let store = state.require_store().await?;
    require_member(&store, ctx, household_id).await?;

    let receiver = state.household_sse().subscribe(household_id);
    let handshake = ServerEvent::json(
        Some("handshake".to_string()),
        &Handshake {
            household_id,
            degraded: state.is_degraded(),
        },
    )
    .map_err(|err| ServiceError::Internal(format!("failed to encode handshake: {err}")))?;
    Ok((receiver, handshake))
}

/// Serialise `payload` and fan it out to the household's listeners.
pub fn publish<T: Serialize>(state: &SharedState, household_id: Uuid, event: &str, payload: &T) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(message) => state.household_sse().broadcast(household_id, message),
        Err(err) => warn!(%household_id, event, error = %err, "failed to encode SSE payload"),
    }
}

pub(crate) fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}

/// Convert a broadcast receiver into an SSE response, forwarding events until the client leaves.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    handshake: ServerEvent,
    household_id: Uuid,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if tx.send(Ok(to_event(handshake))).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(%household_id, skipped, "household SSE subscriber lagged");
                        }
                    }
                }
            }
        }

        info!(%household_id, "household SSE stream disconnected");
    });

    Sse::new(ReceiverStream::new(rx)).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}
