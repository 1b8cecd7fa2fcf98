//! Online/offline signal.

use std::sync::Arc;
use tokio::sync::watch;

/// A shared online/offline flag that can be observed for transitions.
///
/// Clones share the same flag.
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    /// A signal that starts online.
    pub fn online() -> Self {
        Self::new(true)
    }

    /// Updates the flag. Returns `true` if it changed; subscribers are only
    /// notified on change.
    pub fn set_online(&self, online: bool) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        })
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Receiver notified on every transition.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::online()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_online_reports_changes() {
        let signal = Connectivity::online();
        assert!(!signal.set_online(true));
        assert!(signal.set_online(false));
        assert!(!signal.is_online());
    }

    #[test]
    fn clones_share_state() {
        let signal = Connectivity::new(false);
        let clone = signal.clone();
        clone.set_online(true);
        assert!(signal.is_online());
    }

    #[tokio::test]
    async fn subscribers_see_transitions() {
        let signal = Connectivity::new(false);
        let mut rx = signal.subscribe();
        signal.set_online(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
    }
}
