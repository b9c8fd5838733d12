use tokio::sync::watch;

/// Sender side, held by `app::run_consumer`. Trigger it (or drop it) to
/// broadcast shutdown to every listener.
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

/// Receiver side, handed to the consumer runtime. Clone freely — each clone
/// independently observes the signal.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

/// Construct a linked handle/signal pair.
pub fn new_pair() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, ShutdownSignal { rx })
}

impl ShutdownHandle {
    /// Broadcast shutdown to all outstanding [`ShutdownSignal`] receivers.
    pub fn trigger(self) {
        // Errors only if all receivers are gone already — harmless.
        let _ = self.tx.send(true);
    }
}

impl ShutdownSignal {
    /// Wait until shutdown has been triggered. Resolves immediately if the
    /// signal fired before this call.
    pub async fn wait(&mut self) {
        let _ = self.rx.wait_for(|&v| v).await;
    }
}

/// Wait for `SIGINT` (Ctrl-C) or `SIGTERM` (container stop / kill).
///
/// A consumer process runs indefinitely; this is the only thing that ends it.
pub async fn wait_for_os_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt()).expect("failed to register SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");

    tokio::select! {
        _ = sigint.recv()  => tracing::info!("🔔 SIGINT received"),
        _ = sigterm.recv() => tracing::info!("🔔 SIGTERM received"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_resolves_after_trigger() {
        let (handle, mut signal) = new_pair();
        handle.trigger();
        signal.wait().await;
    }

    #[tokio::test]
    async fn clones_observe_the_same_trigger() {
        let (handle, signal) = new_pair();
        let mut a = signal.clone();
        let mut b = signal;
        handle.trigger();
        a.wait().await;
        b.wait().await;
    }
}
