//! Change-driven view refresh: recompute the tournament view whenever the
//! store reports a new revision, instead of polling on a timer.

use crate::logic::{build_view, TournamentView};
use crate::store::{Revision, Store};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Latest computed view, shared by all readers.
pub struct ViewFeed {
    latest: watch::Receiver<Option<Arc<TournamentView>>>,
    task: JoinHandle<()>,
}

/// Start the refresh task. Bursts of writes coalesce into one recompute, and
/// a view is only published if it is not older than the one already out, so
/// a superseded computation never overwrites newer data.
pub fn spawn_view_feed<S>(store: Arc<S>) -> ViewFeed
where
    S: Store + Send + Sync + 'static,
{
    let (tx, latest) = watch::channel(None);
    let task = tokio::spawn(async move {
        let mut changes = store.subscribe();
        loop {
            changes.borrow_and_update();
            match build_view(&*store) {
                Ok(view) => publish(&tx, view),
                Err(e) => log::warn!("View refresh failed, keeping previous view: {}", e),
            }
            if changes.changed().await.is_err() {
                log::debug!("Store change channel closed, stopping view feed");
                break;
            }
        }
    });
    ViewFeed { latest, task }
}

fn publish(tx: &watch::Sender<Option<Arc<TournamentView>>>, view: TournamentView) {
    tx.send_if_modified(|current| match current {
        Some(existing) if existing.revision > view.revision => {
            log::debug!(
                "Dropping stale view r{} (r{} already published)",
                view.revision,
                existing.revision
            );
            false
        }
        _ => {
            *current = Some(Arc::new(view));
            true
        }
    });
}

impl ViewFeed {
    pub fn latest(&self) -> Option<Arc<TournamentView>> {
        self.latest.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<TournamentView>>> {
        self.latest.clone()
    }

    /// Wait until a view newer than `since` is published, or `timeout`
    /// passes. Returns the latest view either way.
    pub async fn wait_newer(&self, since: Revision, timeout: Duration) -> Option<Arc<TournamentView>> {
        let mut rx = self.latest.clone();
        let newer = rx.wait_for(|v| v.as_ref().map_or(false, |v| v.revision > since));
        if let Ok(Ok(view)) = tokio::time::timeout(timeout, newer).await {
            return view.clone();
        }
        self.latest()
    }
}

impl Drop for ViewFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}
