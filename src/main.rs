//! admission-warden - a validating admission webhook for Kubernetes.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Creates the Kubernetes client
//! - Starts the certificate notifier and watcher
//! - Serves the admission endpoint over TLS until a shutdown signal

use std::sync::Arc;
use std::time::Duration;

use kube::Client;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use admission_warden::config::Settings;
use admission_warden::inspect::HttpInspector;
use admission_warden::tls::{
    CertificateNotifier, CertificateSource, CertificateStore, CertificateWatcher, DiskSource,
    GeneratedSource,
};
use admission_warden::{run_webhook_server, WebhookState};

/// Common name placed in generated certificates
const CERTIFICATE_NAME: &str = "Admission Warden";

/// Grace period for in-flight admission calls to complete during shutdown
const SHUTDOWN_GRACE_PERIOD_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("admission_warden=info".parse()?)
                .add_directive("kube=info".parse()?),
        )
        .json()
        .init();

    info!("Starting admission-warden");

    // The cert resolver needs a process-wide crypto provider
    let _ = rustls::crypto::ring::default_provider().install_default();

    let settings = Settings::from_env();

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let shutdown = CancellationToken::new();
    let store = Arc::new(CertificateStore::new());
    let (tx, rx) = mpsc::channel(1);

    let source: Arc<dyn CertificateSource> = match settings.tls_paths() {
        Some((cert_path, key_path)) => {
            info!(?cert_path, ?key_path, "Sourcing TLS certificates from disk");
            Arc::new(DiskSource::new(cert_path, key_path))
        }
        None => {
            if settings.tls_cert_file.is_some() || settings.tls_key_file.is_some() {
                warn!(
                    "Only one of WARDEN_TLS_CERT_FILE and WARDEN_TLS_KEY_FILE is set, \
                     falling back to self-signed generation"
                );
            }
            info!(hosts = ?settings.tls_hosts, "Generating self-signed TLS certificates");
            Arc::new(GeneratedSource::new(
                CERTIFICATE_NAME,
                settings.tls_hosts.clone(),
            ))
        }
    };

    let notifier_handle = tokio::spawn(
        CertificateNotifier::new(source, tx, shutdown.clone()).run(),
    );
    let watcher_handle = tokio::spawn(
        CertificateWatcher::new(
            rx,
            store.clone(),
            client.clone(),
            settings.webhook_name.clone(),
            shutdown.clone(),
        )
        .run(),
    );

    let inspector = Arc::new(HttpInspector::new(&settings.inspector_url)?);
    let state = WebhookState {
        settings,
        inspector,
    };

    // Drain the server when the shutdown token fires
    let server_handle = axum_server::Handle::new();
    {
        let server_handle = server_handle.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown.cancelled().await;
            server_handle
                .graceful_shutdown(Some(Duration::from_secs(SHUTDOWN_GRACE_PERIOD_SECS)));
        });
    }

    let mut webhook_handle = {
        let store = store.clone();
        let server_handle = server_handle.clone();
        tokio::spawn(async move {
            if let Err(e) = run_webhook_server(state, store, server_handle).await {
                error!("Webhook server error: {}", e);
            }
        })
    };

    // Wait for the server to stop on its own, or for a shutdown signal
    tokio::select! {
        result = &mut webhook_handle => {
            if let Err(e) = result {
                error!("Webhook server task panicked: {}", e);
            }
            shutdown.cancel();
        }
        _ = shutdown_signal() => {
            info!("Received shutdown signal, initiating graceful shutdown...");
            shutdown_and_drain(&shutdown, &mut webhook_handle).await;
        }
    }

    if let Err(e) = notifier_handle.await {
        error!("Certificate notifier task panicked: {}", e);
    }
    if let Err(e) = watcher_handle.await {
        error!("Certificate watcher task panicked: {}", e);
    }

    info!("Webhook stopped");
    Ok(())
}

/// Cancel background work and wait for the webhook server task to finish.
///
/// The server task only completes once its handle has drained in-flight
/// requests (bounded by the grace period), so the runtime must stay alive
/// until this returns or those requests are cut off mid-flight.
async fn shutdown_and_drain(
    shutdown: &CancellationToken,
    webhook_handle: &mut tokio::task::JoinHandle<()>,
) {
    shutdown.cancel();
    if let Err(e) = webhook_handle.await {
        error!("Webhook server task panicked: {}", e);
    }
}


/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Note: Signal handler setup failures are fatal - the service cannot shut
/// down gracefully without them. Using expect() here is intentional.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
