// Last valid snapshot captured by the refresher

use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::models::StatusSnapshot;

struct Captured {
    snapshot: StatusSnapshot,
    captured_at: Instant,
}

/// Written by the refresher only; request handlers read it.
#[derive(Default)]
pub struct LastKnownGood {
    inner: RwLock<Option<Captured>>,
}

impl LastKnownGood {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn store(&self, snapshot: StatusSnapshot) {
        self.store_captured_at(snapshot, Instant::now()).await;
    }

    pub async fn store_captured_at(&self, snapshot: StatusSnapshot, captured_at: Instant) {
        *self.inner.write().await = Some(Captured {
            snapshot,
            captured_at,
        });
    }

    /// Snapshot and its age, if one was ever captured.
    pub async fn latest(&self) -> Option<(StatusSnapshot, Duration)> {
        self.inner
            .read()
            .await
            .as_ref()
            .map(|c| (c.snapshot.clone(), c.captured_at.elapsed()))
    }

    /// Latest snapshot if it is no older than `max_age`.
    pub async fn fresh(&self, max_age: Duration) -> Option<(StatusSnapshot, Duration)> {
        self.latest().await.filter(|(_, age)| *age <= max_age)
    }
}
