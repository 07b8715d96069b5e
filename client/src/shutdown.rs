//! Cooperative stop signal.
//!
//! One [`StopSignal`] is shared between the Ctrl-C handler, independent work
//! loops that check it between iterations, and the client's close path.

use std::io;
use std::thread::{self, JoinHandle};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Process-wide cooperative stop signal.
///
/// Clones share the same underlying token. Triggering is idempotent.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    token: CancellationToken,
}

impl StopSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests every holder to stop.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Returns true once the signal has been triggered.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the signal is triggered.
    pub async fn triggered(&self) {
        self.token.cancelled().await;
    }

    /// Returns the underlying cancellation token.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Spawns a thread that waits for Ctrl-C (or for the signal to be
    /// triggered elsewhere), triggers the signal and then runs `on_stop`.
    ///
    /// For synchronous programs that do not run their own tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher thread cannot be spawned.
    pub fn watch_ctrl_c<F>(&self, on_stop: F) -> io::Result<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        let signal = self.clone();

        thread::Builder::new()
            .name("ctrl-c-watcher".to_string())
            .spawn(move || {
                match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime.block_on(async {
                        tokio::select! {
                            result = tokio::signal::ctrl_c() => match result {
                                Ok(()) => info!("Ctrl-C received, stopping"),
                                Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
                            },
                            () = signal.triggered() => {}
                        }
                    }),
                    Err(e) => {
                        warn!("Failed to start Ctrl-C watcher: {}", e);
                        return;
                    }
                }

                signal.trigger();
                on_stop();
            })
    }
}
