//! Active-certificate slot read on every TLS handshake.

use std::io::BufReader;
use std::sync::{Arc, PoisonError, RwLock};

use rustls::pki_types::CertificateDer;
use rustls::server::{ClientHello, ResolvesServerCert};
use rustls::sign::CertifiedKey;
use tracing::debug;

use crate::error::{Error, Result};

use super::CertificateBundle;

/// Shared slot holding the most recently validated TLS keypair.
///
/// Single writer (the certificate watcher), many concurrent readers (TLS
/// handshake callbacks). Once non-empty it is never observed empty or
/// partially written: publication replaces the whole `Arc` under the write
/// lock, and a failed bundle parse never reaches [`CertificateStore::publish`].
pub struct CertificateStore {
    active: RwLock<Option<Arc<CertifiedKey>>>,
}

impl CertificateStore {
    /// Create an empty store; handshakes fail until the first publish
    pub fn new() -> Self {
        Self {
            active: RwLock::new(None),
        }
    }

    /// Atomically install a new active certificate
    pub fn publish(&self, key: CertifiedKey) {
        let mut active = self
            .active
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *active = Some(Arc::new(key));
    }

    /// Read the active certificate without blocking on rotation
    pub fn current(&self) -> Option<Arc<CertifiedKey>> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for CertificateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CertificateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateStore")
            .field("ready", &self.current().is_some())
            .finish()
    }
}

impl ResolvesServerCert for CertificateStore {
    fn resolve(&self, _client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        let cert = self.current();
        if cert.is_none() {
            debug!("no certificate available, failing TLS handshake");
        }
        cert
    }
}

/// Parse a PEM bundle into a usable TLS keypair.
///
/// This is the validation gate in front of [`CertificateStore::publish`]:
/// any error here leaves the previously active certificate untouched.
pub fn parse_bundle(bundle: &CertificateBundle) -> Result<CertifiedKey> {
    let mut cert_reader = BufReader::new(bundle.cert.as_slice());
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut cert_reader)
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| Error::InvalidBundle(format!("bad certificate PEM: {e}")))?;
    if certs.is_empty() {
        return Err(Error::InvalidBundle(
            "no certificate found in bundle".to_string(),
        ));
    }

    let mut key_reader = BufReader::new(bundle.key.as_slice());
    let key = rustls_pemfile::private_key(&mut key_reader)
        .map_err(|e| Error::InvalidBundle(format!("bad private key PEM: {e}")))?
        .ok_or_else(|| Error::InvalidBundle("no private key found in bundle".to_string()))?;

    let signing_key = rustls::crypto::ring::sign::any_supported_type(&key)
        .map_err(|e| Error::InvalidBundle(format!("unsupported private key: {e}")))?;

    Ok(CertifiedKey::new(certs, signing_key))
}
