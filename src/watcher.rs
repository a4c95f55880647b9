//! Periodic re-resolution of one user's schedule.
//!
//! [`ScheduleWatcher`] resolves on every poll tick and on every completion or
//! routine change broadcast by [`AppState`], publishing the latest
//! [`ResolvedSchedule`] on a watch channel. The background task stops when the
//! watcher is cancelled or dropped.

use crate::models::{ResolvedSchedule, UserContext};
use crate::state::AppState;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct ScheduleWatcher {
    receiver: watch::Receiver<Option<ResolvedSchedule>>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ScheduleWatcher {
    pub fn spawn(state: AppState, ctx: UserContext, poll_interval: Duration) -> Self {
        let (sender, receiver) = watch::channel(None);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(state, ctx, poll_interval, sender, cancel.clone()));
        Self {
            receiver,
            cancel,
            handle,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ResolvedSchedule>> {
        self.receiver.clone()
    }

    pub fn latest(&self) -> Option<ResolvedSchedule> {
        self.receiver.borrow().clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ScheduleWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

async fn run(
    state: AppState,
    ctx: UserContext,
    poll_interval: Duration,
    sender: watch::Sender<Option<ResolvedSchedule>>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    let mut changes = state.subscribe_changes();
    info!(user_id = ctx.user_id, ?poll_interval, "schedule watcher started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
            change = changes.recv() => {
                if let Err(broadcast::error::RecvError::Closed) = change {
                    break;
                }
            }
        }

        let schedule = state.resolve_for(ctx).await;
        debug!(
            user_id = ctx.user_id,
            current = ?schedule.current.as_ref().map(|t| t.task.id),
            next = ?schedule.next.as_ref().map(|t| t.task.id),
            "schedule resolved"
        );
        sender.send_replace(Some(schedule));
    }

    info!(user_id = ctx.user_id, "schedule watcher stopped");
}

/// Logs whenever the current task of the watched schedule changes.
pub async fn log_transitions(mut receiver: watch::Receiver<Option<ResolvedSchedule>>) {
    let mut last: Option<u64> = None;
    while receiver.changed().await.is_ok() {
        let current = receiver
            .borrow_and_update()
            .as_ref()
            .and_then(|schedule| schedule.current.clone());
        let current_id = current.as_ref().map(|task| task.task.id);
        if current_id == last {
            continue;
        }
        match current {
            Some(task) => info!(
                task_id = task.task.id,
                time = %task.task.time,
                routine = %task.routine_name,
                state = ?task.state,
                "current task: {}",
                task.task.name
            ),
            None => info!("all tasks for today are done"),
        }
        last = current_id;
    }
}
