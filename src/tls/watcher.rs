//! Certificate rotation loop.
//!
//! Consumes bundles from the notifier channel, installs them into the
//! active-certificate store, and keeps the cluster's webhook registration
//! trust anchor in sync with the current CA certificate.

use std::sync::Arc;
use std::time::Duration;

use base64::prelude::{Engine, BASE64_STANDARD};
use k8s_openapi::api::admissionregistration::v1::MutatingWebhookConfiguration;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::Result;

use super::{parse_bundle, CertificateBundle, CertificateStore};

/// Loop cadence when no bundle arrives
const IDLE_TICK: Duration = Duration::from_secs(1);

/// JSON-pointer path of the trust-anchor field in the registration object
const CA_BUNDLE_PATH: &str = "/webhooks/0/clientConfig/caBundle";

/// Consumes certificate bundles, swaps the active certificate, and patches
/// the webhook registration's CA bundle.
pub struct CertificateWatcher {
    rx: mpsc::Receiver<CertificateBundle>,
    store: Arc<CertificateStore>,
    client: Client,
    webhook_name: Option<String>,
    shutdown: CancellationToken,
}

impl CertificateWatcher {
    pub fn new(
        rx: mpsc::Receiver<CertificateBundle>,
        store: Arc<CertificateStore>,
        client: Client,
        webhook_name: Option<String>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            rx,
            store,
            client,
            webhook_name,
            shutdown,
        }
    }

    /// Run until cancellation or until the notifier drops the sender.
    ///
    /// Each iteration waits for one of: a new bundle (apply it), the idle
    /// tick (retry an unpublished trust anchor), or cancellation. A bundle
    /// that fails to parse leaves the previous active certificate in place;
    /// a failed registration patch is retried on the next bundle or tick and
    /// never rolls back an already-published certificate.
    pub async fn run(mut self) {
        let mut pending_ca: Option<Vec<u8>> = None;
        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    info!("certificate watcher stopping");
                    return;
                }
                received = self.rx.recv() => {
                    let Some(bundle) = received else {
                        info!("certificate channel closed, watcher stopping");
                        return;
                    };
                    info!("updated certificate bundle received, updating certs");
                    match apply_bundle(&self.store, &bundle) {
                        Ok(()) => {
                            info!("active certificate updated");
                            if !bundle.ca_cert.is_empty() {
                                pending_ca = Some(bundle.ca_cert);
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "error loading TLS keypair, keeping previous certificate");
                            continue;
                        }
                    }
                    self.sync_trust_anchor(&mut pending_ca).await;
                }
                () = tokio::time::sleep(IDLE_TICK) => {
                    self.sync_trust_anchor(&mut pending_ca).await;
                }
            }
        }
    }

    /// Publish a pending CA certificate to the registered webhook, if any.
    ///
    /// Cleared on success so the idle tick becomes a no-op until the next
    /// rotation produces a new trust anchor.
    async fn sync_trust_anchor(&self, pending: &mut Option<Vec<u8>>) {
        let Some(name) = self.webhook_name.as_deref() else {
            return;
        };
        let Some(ca_cert) = pending.as_deref() else {
            return;
        };
        match patch_ca_bundle(&self.client, name, ca_cert).await {
            Ok(()) => {
                info!(webhook = name, "webhook registration CA bundle updated");
                *pending = None;
            }
            Err(e) => {
                error!(error = %e, webhook = name, "error updating webhook CA bundle, will retry");
            }
        }
    }
}

/// Parse a bundle and atomically install it as the active certificate
fn apply_bundle(store: &CertificateStore, bundle: &CertificateBundle) -> Result<()> {
    let key = parse_bundle(bundle)?;
    store.publish(key);
    Ok(())
}

/// Idempotently patch the registration object's trust-anchor field
async fn patch_ca_bundle(client: &Client, name: &str, ca_cert: &[u8]) -> Result<()> {
    let api: Api<MutatingWebhookConfiguration> = Api::all(client.clone());
    let patch: json_patch::Patch = serde_json::from_value(serde_json::json!([
        {
            "op": "add",
            "path": CA_BUNDLE_PATH,
            "value": BASE64_STANDARD.encode(ca_cert),
        }
    ]))?;
    api.patch(name, &PatchParams::default(), &Patch::Json::<()>(patch))
        .await?;
    Ok(())
}
