//! Certificate lifecycle management.
//!
//! The TLS identity used to serve the webhook flows through four pieces:
//! a [`CertificateSource`] produces PEM bundles, the [`CertificateNotifier`]
//! pulls from it in the background and publishes bundles onto a channel, the
//! [`CertificateWatcher`] parses and atomically installs them into the
//! [`CertificateStore`], and every TLS handshake reads the store through its
//! `ResolvesServerCert` implementation. Rotation never interrupts serving:
//! a bad bundle leaves the previously installed certificate authoritative.

mod notifier;
mod source;
mod store;
mod watcher;

pub use notifier::CertificateNotifier;
pub use source::{CertificateBundle, CertificateSource, DiskSource, GeneratedSource};
pub use store::{parse_bundle, CertificateStore};
pub use watcher::CertificateWatcher;
