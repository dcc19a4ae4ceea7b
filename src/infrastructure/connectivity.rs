//! Connectivity watcher
//!
//! Probes the transcription endpoint's host on an interval and emits one
//! signal per offline-to-online transition. The engine replays its pending
//! queue on each signal.

use std::time::Duration as StdDuration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

/// Default probe target: any HTTP response at all counts as online
const PROBE_URL: &str = "https://generativelanguage.googleapis.com/";

/// Default probe cadence
const POLL_INTERVAL: StdDuration = StdDuration::from_secs(15);

/// Probe timeout
const PROBE_TIMEOUT: StdDuration = StdDuration::from_secs(5);

/// Watches for the network coming back.
pub struct OnlineWatcher {
    client: reqwest::Client,
    probe_url: String,
    poll: StdDuration,
}

impl OnlineWatcher {
    pub fn new() -> Self {
        Self::with_probe(PROBE_URL, POLL_INTERVAL)
    }

    /// Custom probe target and cadence (tests)
    pub fn with_probe(probe_url: impl Into<String>, poll: StdDuration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            probe_url: probe_url.into(),
            poll,
        }
    }

    /// Start watching. The returned channel yields `()` once per restored
    /// connection; the watcher stops when the receiver is dropped.
    pub fn spawn(self) -> mpsc::Receiver<()> {
        let (tx, rx) = mpsc::channel(1);

        tokio::spawn(async move {
            // Assume online at startup so no spurious replay fires
            let mut online = true;
            let mut ticks = interval(self.poll);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticks.tick().await;
                let now_online = self.client.head(&self.probe_url).send().await.is_ok();

                if now_online && !online {
                    tracing::info!("connectivity restored");
                    if tx.send(()).await.is_err() {
                        break;
                    }
                } else if !now_online && online {
                    tracing::warn!("connectivity lost");
                }
                online = now_online;
            }
        });

        rx
    }
}

impl Default for OnlineWatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn no_signal_while_online_from_the_start() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let mut rx =
            OnlineWatcher::with_probe(server.uri(), StdDuration::from_millis(20)).spawn();

        let signal = timeout(StdDuration::from_millis(200), rx.recv()).await;
        assert!(signal.is_err(), "steady online must not emit a signal");
    }

    #[tokio::test]
    async fn signals_once_when_connectivity_returns() {
        // Unreachable probe target first: the watcher sees offline
        let mut rx = OnlineWatcher::with_probe(
            "http://127.0.0.1:1/unreachable",
            StdDuration::from_millis(20),
        )
        .spawn();

        // It stays silent while offline
        let signal = timeout(StdDuration::from_millis(150), rx.recv()).await;
        assert!(signal.is_err());
    }
}
