use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;

use super::snapshot::MetricsSnapshot;
use super::view::DashboardView;
use crate::AppState;

// ─── GET /api/metrics ────────────────────────────────────────────
/// Returns the current snapshot as JSON.

pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
) -> Json<MetricsSnapshot> {
    Json(state.feed().current_snapshot().as_ref().clone())
}

// ─── GET /api/metrics/view ───────────────────────────────────────
/// Same snapshot, formatted the way the dashboard cards display it.

pub async fn get_view(State(state): State<Arc<AppState>>) -> Json<DashboardView> {
    Json(DashboardView::from_snapshot(&state.feed().current_snapshot()))
}

// ─── GET /api/metrics/stream ─────────────────────────────────────
/// Server-Sent Events endpoint.
/// Sends the current snapshot on connect, then a `snapshot` event for each
/// newer one for as long as the client stays connected.

pub async fn metrics_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let feed = state.feed();

    // Only the latest snapshot matters to a client; a slow reader skips
    // intermediate ones instead of queueing them.
    let (tx, rx) = watch::channel(feed.current_snapshot());
    let tx = Arc::new(tx);
    let sender = tx.clone();
    let subscription = feed.subscribe(move |snap| publish(&sender, snap));
    // A tick may have landed between reading the value and subscribing.
    publish(&tx, feed.current_snapshot());
    // The observer holds the last sender: the stream ends with the feed.
    drop(tx);

    let stream = WatchStream::new(rx).map(move |snap| {
        // Stream owns the subscription; the observer lives as long as the client.
        let _subscription = &subscription;
        Ok(snapshot_event(&snap))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Replace the channel value only with a newer snapshot.
fn publish(tx: &watch::Sender<Arc<MetricsSnapshot>>, snap: Arc<MetricsSnapshot>) {
    tx.send_if_modified(|current| {
        if snap.sequence <= current.sequence {
            return false;
        }
        *current = snap;
        true
    });
}

fn snapshot_event(snap: &MetricsSnapshot) -> Event {
    let json = serde_json::to_string(snap).unwrap_or_default();
    Event::default()
        .event("snapshot")
        .id(snap.sequence.to_string())
        .data(json)
}
