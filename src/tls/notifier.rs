//! Background task publishing certificate bundles onto a channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::{CertificateBundle, CertificateSource};

/// How often the source is re-polled after a successful pull
const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Backoff after a failed pull
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Repeatedly pulls from a [`CertificateSource`] and publishes changed
/// bundles onto a bounded channel consumed by the certificate watcher.
pub struct CertificateNotifier {
    source: Arc<dyn CertificateSource>,
    tx: mpsc::Sender<CertificateBundle>,
    shutdown: CancellationToken,
}

impl CertificateNotifier {
    pub fn new(
        source: Arc<dyn CertificateSource>,
        tx: mpsc::Sender<CertificateBundle>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            source,
            tx,
            shutdown,
        }
    }

    /// Run until cancellation or until the watcher drops the receiver.
    ///
    /// Source failures are logged and retried; the previously published
    /// bundle stays authoritative downstream.
    pub async fn run(self) {
        let mut last_sent: Option<CertificateBundle> = None;
        loop {
            let pulled = tokio::select! {
                () = self.shutdown.cancelled() => {
                    info!("certificate notifier stopping");
                    return;
                }
                pulled = self.source.next() => pulled,
            };

            let delay = match pulled {
                Ok(bundle) => {
                    if last_sent.as_ref() != Some(&bundle) {
                        info!("certificate source produced a new bundle");
                        if self.tx.send(bundle.clone()).await.is_err() {
                            info!("certificate channel closed, notifier stopping");
                            return;
                        }
                        last_sent = Some(bundle);
                    }
                    POLL_INTERVAL
                }
                Err(e) => {
                    error!(error = %e, "certificate source failed, retrying");
                    RETRY_DELAY
                }
            };

            tokio::select! {
                () = self.shutdown.cancelled() => {
                    info!("certificate notifier stopping");
                    return;
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}
