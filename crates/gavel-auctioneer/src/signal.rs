//! Process signals recognised by the auctioneer.

/// Signals delivered to [`Auctioneer::run`].
///
/// `Interrupt` and `Terminate` trigger a graceful shutdown; anything
/// else is ignored.
///
/// [`Auctioneer::run`]: crate::Auctioneer::run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
    Hangup,
}

impl Signal {
    /// Whether this signal shuts the auctioneer down.
    pub fn should_stop(self) -> bool {
        matches!(self, Signal::Interrupt | Signal::Terminate)
    }
}

/// Bridge OS signals into the stream [`Auctioneer::run`] consumes.
///
/// Spawns listeners for `SIGINT`, `SIGTERM`, and `SIGHUP`; must be
/// called from within a tokio runtime.
///
/// [`Auctioneer::run`]: crate::Auctioneer::run
#[cfg(unix)]
pub fn os_signals() -> std::io::Result<tokio::sync::mpsc::Receiver<Signal>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    let (tx, rx) = tokio::sync::mpsc::channel(4);
    tokio::spawn(async move {
        loop {
            let sig = tokio::select! {
                _ = interrupt.recv() => Signal::Interrupt,
                _ = terminate.recv() => Signal::Terminate,
                _ = hangup.recv() => Signal::Hangup,
            };
            if tx.send(sig).await.is_err() {
                break;
            }
        }
    });
    Ok(rx)
}
