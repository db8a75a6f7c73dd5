//! Event delivery to the session task.
//!
//! The session task owns the mirror and the HTTP client; everything else
//! talks to it through a bounded event queue. The connection-request
//! listener and the download-completion path feed the same queue. Backoff
//! after transport failures is exponential with jitter.

use std::time::Duration;

use cwmp_soap::request::TransferComplete;
use rand::Rng;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Events the session task reacts to. A tick that arrives while a session
/// is running is simply not observed until the session is over — concurrent
/// sessions cannot happen.
#[derive(Debug)]
pub enum Event {
    /// Process start: `"1 BOOT"` (plus `"0 BOOTSTRAP"` on first contact).
    Boot,
    /// Local configuration changed: `"4 VALUE CHANGE"`.
    ValueChange,
    /// The ACS knocked on the connection-request port: `"6 CONNECTION REQUEST"`.
    ConnectionRequest,
    /// One-shot inform with an explicit event code from the CLI.
    CliInform(String),
    /// A scheduled file transfer finished; report it to the ACS.
    TransferComplete(TransferComplete),
}

pub const EVENT_QUEUE_DEPTH: usize = 16;

pub fn event_queue() -> (mpsc::Sender<Event>, mpsc::Receiver<Event>) {
    mpsc::channel(EVENT_QUEUE_DEPTH)
}

/// Exponential backoff with ±20% jitter, entered after transport failures.
#[derive(Debug)]
pub struct Backoff {
    attempt: u32,
    base: Duration,
    cap: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            attempt: 0,
            base: Duration::from_secs(5),
            cap: Duration::from_secs(600),
        }
    }
}

impl Backoff {
    pub fn next_delay(&mut self) -> Duration {
        let exponent = self.attempt.min(10);
        self.attempt = self.attempt.saturating_add(1);
        let raw = self.base.as_secs_f64() * f64::from(1 << exponent);
        let jitter = rand::thread_rng().gen_range(0.8..1.2);
        Duration::from_secs_f64((raw * jitter).min(self.cap.as_secs_f64()))
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}

/// Watches the configuration file and announces `"4 VALUE CHANGE"` when its
/// modification time moves. Polling keeps it portable across the odd
/// filesystems CPE devices run on.
pub async fn watch_config(path: std::path::PathBuf, events: mpsc::Sender<Event>) {
    let mut last_modified = modification_time(&path).await;
    let mut ticker = tokio::time::interval(Duration::from_secs(30));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let modified = modification_time(&path).await;
        if modified != last_modified {
            info!(path = %path.display(), "configuration changed");
            last_modified = modified;
            if events.send(Event::ValueChange).await.is_err() {
                return;
            }
        }
    }
}

async fn modification_time(path: &std::path::Path) -> Option<std::time::SystemTime> {
    tokio::fs::metadata(path)
        .await
        .and_then(|meta| meta.modified())
        .ok()
}

/// Minimal TR-069 connection-request listener: any HTTP request on the port
/// acknowledges with 200 and enqueues a session trigger. The ACS only needs
/// the knock.
pub async fn connection_request_listener(
    port: u16,
    events: mpsc::Sender<Event>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "connection-request listener up");
    loop {
        let (mut socket, peer) = listener.accept().await?;
        debug!(%peer, "connection request");
        let events = events.clone();
        tokio::spawn(async move {
            let mut buffer = [0u8; 1024];
            let _ = socket.read(&mut buffer).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await;
            let _ = socket.shutdown().await;
            if events.try_send(Event::ConnectionRequest).is_err() {
                // Queue full: a session is already pending; the knock is
                // coalesced into it.
                warn!("connection request dropped, queue full");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_resets() {
        let mut backoff = Backoff::default();
        let first = backoff.next_delay();
        let second = backoff.next_delay();
        let third = backoff.next_delay();
        // jitter is ±20%, growth is 2x: ordering survives the jitter
        assert!(second > first);
        assert!(third > second);
        backoff.reset();
        assert_eq!(backoff.attempts(), 0);
    }

    #[test]
    fn backoff_respects_the_cap() {
        let mut backoff = Backoff::default();
        let mut last = Duration::ZERO;
        for _ in 0..20 {
            last = backoff.next_delay();
        }
        assert!(last <= Duration::from_secs(600));
    }
}
