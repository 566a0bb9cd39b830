/**
 * Realtime Subscription Stream
 *
 * Turns a router `Subscription` into a Server-Sent Events stream. The first
 * event tells the subscriber whether the peer is online; after that every
 * envelope from the session's document topic and the subscriber's own queue
 * is sent as one SSE event named after its category:
 *
 * ```text
 * event: document_update
 * data: {"kind":"document_update","session_id":"abc123",...}
 * ```
 *
 * A lagged receiver has lost envelopes, so the peer's presence is sent
 * again and the subscriber resynchronizes its document. The stream ends when the
 * session's channels close. Dropping the stream drops the subscription,
 * which marks the user offline.
 */
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{self, Stream, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use crate::backend::realtime::router::Subscription;
use crate::shared::Envelope;

struct StreamState {
    subscription: Subscription,
    greeting: Option<Envelope>,
}

fn to_event(envelope: &Envelope) -> Option<Event> {
    match serde_json::to_string(envelope) {
        Ok(data) => Some(Event::default().event(envelope.category().as_str()).data(data)),
        Err(e) => {
            tracing::error!("[Realtime] Failed to serialize envelope: {:?}", e);
            None
        }
    }
}

/// Envelopes addressed to the subscriber, starting with the peer's presence
pub fn envelopes(subscription: Subscription) -> impl Stream<Item = Envelope> + Send {
    let greeting = Envelope::presence(
        &subscription.session_id,
        &subscription.peer_id,
        subscription.peer_online,
    );
    let state = StreamState {
        subscription,
        greeting: Some(greeting),
    };

    stream::unfold(state, |mut state| async move {
        if let Some(greeting) = state.greeting.take() {
            return Some((greeting, state));
        }

        loop {
            let received = tokio::select! {
                received = state.subscription.document.recv() => received,
                received = state.subscription.direct.recv() => received,
            };

            match received {
                Ok(envelope) => return Some((envelope, state)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        "[Realtime] {} lagged in {}, skipped {} envelopes",
                        state.subscription.user_id,
                        state.subscription.session_id,
                        skipped
                    );
                    let presence = Envelope::presence(
                        &state.subscription.session_id,
                        &state.subscription.peer_id,
                        state.subscription.peer_is_online(),
                    );
                    return Some((presence, state));
                }
                Err(RecvError::Closed) => {
                    tracing::warn!("[Realtime] Session channels closed, ending stream");
                    return None;
                }
            }
        }
    })
}

/// SSE stream of the subscriber's envelopes
pub fn envelope_stream(subscription: Subscription) -> impl Stream<Item = Result<Event, axum::Error>> {
    envelopes(subscription).filter_map(|envelope| async move { to_event(&envelope).map(Ok) })
}

/// Wrap the envelope stream in an SSE response with keep-alive
pub fn sse_response(
    subscription: Subscription,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    Sse::new(envelope_stream(subscription)).keep_alive(KeepAlive::default())
}
