// Graceful shutdown signal shared by the schedule loops

use tokio::sync::watch;

/// Owner side of the shutdown signal, held by the daemon.
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Hand out a token for one schedule loop.
    pub fn token(&self) -> ShutdownToken {
        ShutdownToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Flip the signal. Every outstanding token wakes and observes it.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver side, cloned into each loop.
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the signal flips.
    pub async fn wait(&mut self) {
        let _ = self.rx.changed().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_wakes_every_token() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.token();
        let mut b = shutdown.token();
        assert!(!a.is_triggered());

        shutdown.trigger();
        a.wait().await;
        b.wait().await;
        assert!(a.is_triggered());
        assert!(b.is_triggered());
    }
}
