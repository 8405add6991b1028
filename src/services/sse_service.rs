use std::{convert::Infallible, time::Duration};

use async_stream::stream;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::{
    dto::sse::ServerEvent,
    error::ServiceError,
    services::sse_events,
    state::{SharedState, state_machine::Cue},
};

/// Public stream: the shared document on connect and after every write.
pub fn public_events(state: &SharedState) -> impl Stream<Item = ServerEvent> + Send + 'static + use<> {
    let mut subscription = state.store().subscribe();
    stream! {
        loop {
            let document = subscription.borrow_and_update().clone();
            if let Some(event) = sse_events::game_event(document.as_ref()) {
                yield event;
            }
            if subscription.changed().await.is_err() {
                break;
            }
        }
    }
}

/// Player stream: the player's own view on connect and after every write.
pub fn player_events(
    state: &SharedState,
    name: String,
) -> impl Stream<Item = ServerEvent> + Send + 'static + use<> {
    let state = state.clone();
    let mut subscription = state.store().subscribe();
    stream! {
        loop {
            let document = subscription.borrow_and_update().clone();
            if let Some(event) = sse_events::player_event(&state, &name, document.as_ref()) {
                yield event;
            }
            if subscription.changed().await.is_err() {
                break;
            }
        }
    }
}

enum AdminUpdate {
    Document(bool),
    Cue(Result<Cue, RecvError>),
}

/// Admin stream: the token handshake, then console snapshots and cues.
pub async fn admin_events(
    state: &SharedState,
) -> Result<impl Stream<Item = ServerEvent> + Send + 'static + use<>, ServiceError> {
    let token = claim_admin_token(state).await?;
    let state = state.clone();
    let mut subscription = state.store().subscribe();
    let mut cues = state.admin().subscribe_cues();

    Ok(stream! {
        if let Some(event) = sse_events::admin_token_event(&token) {
            yield event;
        }
        let document = subscription.borrow_and_update().clone();
        if let Some(event) = sse_events::admin_game_event(&state, document) {
            yield event;
        }

        loop {
            let update = tokio::select! {
                changed = subscription.changed() => AdminUpdate::Document(changed.is_ok()),
                cue = cues.recv() => AdminUpdate::Cue(cue),
            };

            match update {
                AdminUpdate::Document(true) => {
                    let document = subscription.borrow_and_update().clone();
                    if let Some(event) = sse_events::admin_game_event(&state, document) {
                        yield event;
                    }
                }
                AdminUpdate::Document(false) | AdminUpdate::Cue(Err(RecvError::Closed)) => break,
                AdminUpdate::Cue(Ok(cue)) => {
                    if let Some(event) = sse_events::cue_event(&cue) {
                        yield event;
                    }
                }
                // Cues are momentary; skipping missed ones is fine.
                AdminUpdate::Cue(Err(RecvError::Lagged(_))) => continue,
            }
        }
    })
}

/// Identifies the target SSE stream so we can perform stream-specific
/// bookkeeping when the connection is torn down.
#[derive(Clone)]
pub enum StreamKind {
    Public,
    Player(String),
    /// Carries the shared state so teardown can release the admin token.
    Admin(SharedState),
}

/// Convert an event stream into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream<S>(
    events: S,
    kind: StreamKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = ServerEvent> + Send + 'static,
{
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from the source stream and pushes into mpsc
    tokio::spawn(async move {
        let mut events = Box::pin(events);
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                next = events.next() => {
                    let Some(payload) = next else {
                        break;
                    };
                    let mut event = Event::default().data(payload.data);
                    if let Some(name) = payload.event {
                        event = event.event(name);
                    }

                    if tx.send(Ok(event)).await.is_err() {
                        break;
                    }
                }
            }
        }

        match kind {
            StreamKind::Public => tracing::info!("Public SSE stream disconnected"),
            StreamKind::Player(name) => {
                tracing::info!(player = %name, "Player SSE stream disconnected")
            }
            StreamKind::Admin(state) => {
                reset_admin_token(state).await;
                tracing::info!("Admin SSE stream disconnected")
            }
        }
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Reserve the admin token for a new stream, generating one when none exists
/// and failing if another connection already holds it.
async fn claim_admin_token(state: &SharedState) -> Result<String, ServiceError> {
    let mut guard = state.admin_token().lock().await;
    match &mut *guard {
        slot @ None => {
            let token = Uuid::new_v4().simple().to_string();
            slot.replace(token.clone());
            Ok(token)
        }
        Some(_) => Err(ServiceError::Unauthorized(
            "Another admin SSE stream is already active".into(),
        )),
    }
}

/// Clear any stored admin token so the next admin connection negotiates a
/// fresh credential.
async fn reset_admin_token(state: SharedState) {
    let mut guard = state.admin_token().lock().await;
    guard.take();
}
