//! Background render loop: snapshot, compose, encode, publish.
//!
//! DESIGN
//! ======
//! One task owns rendering for the whole process. It wakes on whichever
//! comes first, the frame-interval tick or the dirty signal, snapshots the
//! world under a short read lock, fetches decoded assets, then runs the
//! pure compose-and-encode step inside a panic guard. A failing or
//! panicking frame is logged and skipped; the loop outlives any single bad
//! frame.
//!
//! Frames go out through the watch-based broadcaster, so a slow viewer can
//! never back-pressure rendering. The loop publishes on every wake, which
//! keeps the stream flowing at the target rate even when the world is
//! static.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

use crate::frame::Frame;
use crate::services::compositor;
use crate::state::AppState;

/// Spawn the render loop for the lifetime of the process.
pub fn spawn_render_task(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(state.config.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                () = state.dirty.notified() => {}
            }
            render_cycle(&state).await;
        }
    })
}

/// One pass of the loop: snapshot, gather, compose, encode, publish.
pub(crate) async fn render_cycle(state: &AppState) {
    let snapshot = { state.world.read().await.snapshot() };
    let assets = compositor::gather_assets(state, &snapshot).await;
    let quality = state.config.jpeg_quality;

    let encoded = catch_unwind(AssertUnwindSafe(|| {
        let canvas = compositor::compose(&snapshot, &assets);
        compositor::encode_jpeg(&canvas, quality)
    }));
    match encoded {
        Ok(Ok(jpeg)) => {
            let frame = Frame::new(snapshot.canvas_width, snapshot.canvas_height, jpeg);
            let seq = state.broadcaster.publish(frame);
            debug!(seq, "frame published");
        }
        Ok(Err(e)) => error!(error = %e, "frame encode failed, skipping frame"),
        Err(_) => error!("render cycle panicked, skipping frame"),
    }
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
