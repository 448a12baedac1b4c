//! Change notification for renderers.
//!
//! Every state change bumps a version counter. Receivers wake once per
//! observed change; several changes between two polls collapse into a
//! single wakeup, so a renderer redraws at most once per batch.

use tokio::sync::watch;

/// Sender half, owned by the controller.
#[derive(Debug)]
pub(crate) struct ChangeNotifier {
    tx: watch::Sender<u64>,
}

impl ChangeNotifier {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx }
    }

    /// Signal a state change. Never blocks; works with no receivers.
    pub(crate) fn notify(&self) {
        self.tx.send_modify(|version| *version = version.wrapping_add(1));
    }

    pub(crate) fn subscribe(&self) -> ChangeReceiver {
        ChangeReceiver {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiver half handed to renderers by `TableController::subscribe`.
#[derive(Debug, Clone)]
pub struct ChangeReceiver {
    rx: watch::Receiver<u64>,
}

impl ChangeReceiver {
    /// Wait for the next state change.
    ///
    /// Returns the change version, or `None` once the table is gone.
    pub async fn recv(&mut self) -> Option<u64> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// Mark every pending change as seen.
    pub fn drain(&mut self) {
        self.rx.borrow_and_update();
    }

    /// Returns `true` if a change happened since the last `recv`/`drain`.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }
}
