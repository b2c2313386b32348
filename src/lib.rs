//! Validating admission webhook for Kubernetes workloads.
//!
//! Serves admission verdicts for pods, deployments, and config maps over a
//! self-managed TLS endpoint. Certificates rotate at runtime through a
//! source/notifier/watcher pipeline that also keeps the cluster's webhook
//! registration pointed at the current CA.

pub mod config;
pub mod error;
pub mod inspect;
pub mod tls;
pub mod webhooks;

pub use config::Settings;
pub use error::{Error, Result};
pub use webhooks::{run_webhook_server, WebhookState, WEBHOOK_PORT};
