//! MJPEG stream endpoint.
//!
//! DESIGN
//! ======
//! Each viewer gets its own subscription to the frame broadcaster. The
//! response body is an unfold over that subscription: wait for a frame
//! this viewer has not seen, emit it as one multipart part, repeat. A
//! viewer that falls behind skips straight to the newest frame, and
//! dropping the response tears the subscription down with it.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use futures::stream::unfold;
use tracing::debug;

use crate::frame::MULTIPART_CONTENT_TYPE;
use crate::state::AppState;

/// `GET /stream` delivers JPEG frames until the viewer hangs up.
pub async fn video_feed(State(state): State<AppState>) -> Response {
    let subscription = state.broadcaster.subscribe();
    debug!(viewers = state.broadcaster.subscriber_count(), "viewer connected");

    let parts = unfold(subscription, |mut subscription| async move {
        let frame = subscription.next_frame().await?;
        Some((Ok::<_, Infallible>(frame.multipart_part()), subscription))
    });

    ([(CONTENT_TYPE, MULTIPART_CONTENT_TYPE)], Body::from_stream(parts)).into_response()
}

#[cfg(test)]
#[path = "stream_test.rs"]
mod tests;
