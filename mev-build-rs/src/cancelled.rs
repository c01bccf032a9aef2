use std::sync::Arc;
use tokio::sync::watch;

/// Cancellation flag shared by a group of background tasks.
///
/// Clones observe the same flag; once cancelled it stays cancelled.
#[derive(Clone, Debug)]
pub struct Cancelled(Arc<watch::Sender<bool>>);

impl Default for Cancelled {
    fn default() -> Self {
        let (tx, _) = watch::channel(false);
        Self(Arc::new(tx))
    }
}

impl Cancelled {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }

    /// Returns true if the tasks were cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once `cancel` has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.0.subscribe();
        // the sender lives as long as `self`, so this only returns on cancellation
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}
