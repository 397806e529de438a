// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule pump: the collaborator that makes cron semantics take effect
//! over time. Polls for due enabled schedules each tick and triggers them;
//! everything else (next-fire computation, one-shot disabling) lives in the
//! schedule service.

use chrono::Utc;
use sentinel_engine::ScheduleService;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Run the pump until the run context is cancelled.
pub async fn run(schedules: ScheduleService, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let fired = schedules.fire_due(Utc::now());
                if fired > 0 {
                    debug!(fired, "schedule pump fired due schedules");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "pulse_tests.rs"]
mod tests;
