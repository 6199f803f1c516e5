//! Injected connectivity notification.
//!
//! The orchestrator never listens to a global "online" event; it subscribes
//! to whatever notifier the host wires in, which keeps auto-sync testable
//! without simulating real network transitions.

use tokio::sync::watch;

/// Source of online/offline state changes
pub trait ConnectivityNotifier: Send + Sync {
    /// Subscribe to connectivity state. `true` means online; the receiver's
    /// current value reflects the state at subscription time.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Notifier driven by explicit calls, used by hosts that already know when
/// connectivity changes (and by tests).
pub struct ManualConnectivity {
    tx: watch::Sender<bool>,
}

impl ManualConnectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Self { tx }
    }

    pub fn set_online(&self, online: bool) {
        // send_replace records the state even with no receivers, so a
        // transition fired before anyone subscribes is not lost
        self.tx.send_replace(online);
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }
}

impl ConnectivityNotifier for ManualConnectivity {
    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_recorded_without_subscribers() {
        let notifier = ManualConnectivity::new(false);
        notifier.set_online(true);
        assert!(notifier.is_online());

        // a late subscriber sees the current state
        let rx = notifier.subscribe();
        assert!(*rx.borrow());

        notifier.set_online(false);
        assert!(!notifier.is_online());
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let notifier = ManualConnectivity::new(false);
        let mut rx = notifier.subscribe();
        assert!(!*rx.borrow());

        notifier.set_online(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
        assert!(notifier.is_online());
    }
}
