use crate::clock::{Clock, SystemClock};
use crate::models::{AppData, ResolvedSchedule, UserContext};
use crate::routines::{list_completions_for_date, list_routines};
use crate::schedule::resolve;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::{Mutex, broadcast};

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
    pub clock: Arc<dyn Clock>,
    pub default_user_id: u64,
    changes: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: AppData) -> Self {
        Self::with_clock(data_path, data, Arc::new(SystemClock))
    }

    pub fn with_clock(data_path: PathBuf, data: AppData, clock: Arc<dyn Clock>) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            clock,
            default_user_id: 1,
            changes,
        }
    }

    pub fn with_default_user(mut self, user_id: u64) -> Self {
        self.default_user_id = user_id;
        self
    }

    /// Resolves against a snapshot; the data lock is released before resolving.
    pub async fn resolve_for(&self, ctx: UserContext) -> ResolvedSchedule {
        let now = self.clock.now();
        let (routines, logs) = {
            let data = self.data.lock().await;
            (
                list_routines(&data, ctx),
                list_completions_for_date(&data, ctx, now.date()),
            )
        };
        resolve(&routines, &logs, now)
    }

    pub fn subscribe_changes(&self) -> broadcast::Receiver<()> {
        self.changes.subscribe()
    }

    pub fn notify_changed(&self) {
        // No subscribers is fine.
        let _ = self.changes.send(());
    }
}
