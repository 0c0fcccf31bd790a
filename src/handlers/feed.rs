use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::config::FeedConfig;
use crate::metrics::LiveMetricsFeed;
use crate::AppState;

use super::AppError;

// ─── Response types ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct FeedStatus {
    pub running: bool,
    pub cadence_ms: u64,
    pub observers: usize,
    pub sequence: u64,
    pub message: String,
}

impl FeedStatus {
    fn of(feed: &LiveMetricsFeed, message: impl Into<String>) -> Self {
        Self {
            running: feed.is_running(),
            cadence_ms: feed.cadence().as_millis() as u64,
            observers: feed.observer_count(),
            sequence: feed.current_snapshot().sequence,
            message: message.into(),
        }
    }
}

// ─── POST /api/feed/start ────────────────────────────────────────
/// The dashboard became visible.
///
/// A stopped feed is never resumed: a fresh one (initial values) is
/// built from the body's `FeedConfig`, or from the last config when the
/// body is empty. An already running feed is left alone.

pub async fn start_feed(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<FeedStatus>, AppError> {
    let requested = parse_config(&body)?;

    let mut config = state.lifecycle();
    let current = state.feed();
    if current.is_running() {
        // Guard: reconfigure only a stopped feed
        if requested.is_some() {
            return Err(AppError::AlreadyRunning);
        }
        return Ok(Json(FeedStatus::of(&current, "Feed running")));
    }

    let next = requested.unwrap_or_else(|| config.clone());
    let fresh = LiveMetricsFeed::new(&next)?;
    fresh.start();
    // Open streams on the old feed end once it is dropped; clients reconnect.
    state.replace_feed(fresh).stop();

    info!(
        cadence_ms = next.cadence_ms,
        seed = ?next.seed,
        "dashboard feed created"
    );
    let message = format!("Started: one snapshot every {} ms", next.cadence_ms);
    *config = next;
    drop(config);

    Ok(Json(FeedStatus::of(&state.feed(), message)))
}

/// Empty (or blank) body means "reuse the last config".
fn parse_config(body: &Bytes) -> Result<Option<FeedConfig>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let Json(config) = Json::<FeedConfig>::from_bytes(body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    Ok(Some(config))
}

// ─── POST /api/feed/stop ─────────────────────────────────────────
/// The dashboard was dismissed. The last snapshot stays readable.

pub async fn stop_feed(State(state): State<Arc<AppState>>) -> Json<FeedStatus> {
    let _lifecycle = state.lifecycle();
    let feed = state.feed();
    if !feed.is_running() {
        return Json(FeedStatus::of(&feed, "Feed is not running"));
    }

    feed.stop();
    Json(FeedStatus::of(&feed, "Feed stopped"))
}

// ─── GET /api/feed/status ────────────────────────────────────────

pub async fn feed_status(State(state): State<Arc<AppState>>) -> Json<FeedStatus> {
    let feed = state.feed();
    let message = if feed.is_running() { "Feed running" } else { "Idle" };
    Json(FeedStatus::of(&feed, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn app_state() -> Arc<AppState> {
        Arc::new(
            AppState::new(FeedConfig {
                cadence_ms: 2_000,
                seed: Some(11),
            })
            .unwrap(),
        )
    }

    fn config_body(cadence_ms: u64, seed: Option<u64>) -> Bytes {
        Bytes::from(
            serde_json::to_vec(&serde_json::json!({ "cadence_ms": cadence_ms, "seed": seed }))
                .unwrap(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn start_then_stop_round_trip() {
        let state = app_state();

        let Json(status) = start_feed(State(state.clone()), Bytes::new()).await.unwrap();
        assert!(status.running);
        assert_eq!(status.cadence_ms, 2_000);

        tokio::time::sleep(Duration::from_millis(4_100)).await;
        let Json(status) = feed_status(State(state.clone())).await;
        assert_eq!(status.sequence, 2);

        let Json(status) = stop_feed(State(state.clone())).await;
        assert!(!status.running);
        assert_eq!(status.message, "Feed stopped");

        let Json(status) = stop_feed(State(state)).await;
        assert_eq!(status.message, "Feed is not running");
    }

    #[tokio::test(start_paused = true)]
    async fn reopening_the_view_starts_from_initial_values() {
        let state = app_state();
        start_feed(State(state.clone()), Bytes::new()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(6_100)).await;
        stop_feed(State(state.clone())).await;
        let closed = state.feed().current_snapshot();
        assert_eq!(closed.sequence, 3);

        let Json(status) = start_feed(State(state.clone()), Bytes::new()).await.unwrap();
        assert!(status.running);
        assert_eq!(status.sequence, 0);
        assert_eq!(status.cadence_ms, 2_000);
        assert_eq!(
            *state.feed().current_snapshot(),
            crate::MetricsSnapshot::initial()
        );
    }

    #[tokio::test]
    async fn start_while_running_keeps_the_feed() {
        let state = app_state();
        start_feed(State(state.clone()), Bytes::new()).await.unwrap();
        let running = state.feed();

        let Json(status) = start_feed(State(state.clone()), Bytes::from_static(b"  \n"))
            .await
            .unwrap();
        assert!(status.running);
        assert!(Arc::ptr_eq(&running, &state.feed()));
        state.feed().stop();
    }

    #[tokio::test]
    async fn reconfigure_while_running_conflicts() {
        let state = app_state();
        state.feed().start();

        let err = start_feed(State(state), config_body(500, None)).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyRunning));
    }

    #[tokio::test]
    async fn reconfigure_rejects_zero_cadence() {
        let state = app_state();
        let err = start_feed(State(state.clone()), config_body(0, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(state.feed().cadence().as_millis(), 2_000);
        assert_eq!(state.config().cadence_ms, 2_000);
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let state = app_state();
        state.feed().start();

        let bodies: [&[u8]; 3] = [
            br#"{"cadence_ms": "oops""#,
            b"not json",
            br#"{"cadence_ms": "2000"}"#,
        ];
        for body in bodies {
            let err = start_feed(State(state.clone()), Bytes::copy_from_slice(body))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
        }
        assert!(state.feed().is_running());
        state.feed().stop();
    }

    #[tokio::test]
    async fn reconfigure_installs_fresh_feed_and_remembers_config() {
        let state = app_state();
        let Json(status) = start_feed(State(state.clone()), config_body(500, Some(1)))
            .await
            .unwrap();
        assert!(status.running);
        assert_eq!(status.cadence_ms, 500);
        assert_eq!(status.sequence, 0);
        assert_eq!(
            state.config(),
            FeedConfig {
                cadence_ms: 500,
                seed: Some(1),
            }
        );

        stop_feed(State(state.clone())).await;
        let Json(status) = start_feed(State(state.clone()), Bytes::new()).await.unwrap();
        assert_eq!(status.cadence_ms, 500);
        state.feed().stop();
    }
}
