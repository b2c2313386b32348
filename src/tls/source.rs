//! Certificate bundle sourcing.
//!
//! Two interchangeable sources sit behind the [`CertificateSource`] trait:
//! self-signed generation from a name and host list, or loading from fixed
//! disk paths. The choice is made once at startup from configuration.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rcgen::{CertificateParams, DistinguishedName, DnType, DnValue, KeyPair};
use time::OffsetDateTime;

use crate::error::Result;

/// Validity period for generated certificates
const CERT_VALIDITY: time::Duration = time::Duration::days(365);

/// Regenerate when this close to expiry
const RENEWAL_WINDOW: time::Duration = time::Duration::days(30);

/// A (certificate, private key, CA certificate) triple in PEM form.
///
/// Immutable after construction; ownership moves source → notifier → watcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateBundle {
    /// PEM-encoded leaf certificate chain
    pub cert: Vec<u8>,
    /// PEM-encoded private key
    pub key: Vec<u8>,
    /// PEM-encoded CA certificate; empty when no trust anchor is available
    pub ca_cert: Vec<u8>,
}

/// Produces the next certificate bundle for the server to use
#[async_trait]
pub trait CertificateSource: Send + Sync {
    /// Produce the next bundle. May fail (I/O error, generation failure);
    /// failures are logged by the caller and the previous active
    /// certificate is retained.
    async fn next(&self) -> Result<CertificateBundle>;
}

/// Self-signed certificate generation for a configured name and host list.
///
/// The generated certificate doubles as its own CA, so the bundle carries a
/// trust anchor suitable for publishing to the webhook registration. The
/// bundle is cached until it enters the renewal window, at which point the
/// next pull issues a fresh keypair and the rotation pipeline takes over.
pub struct GeneratedSource {
    name: String,
    hosts: Vec<String>,
    cached: Mutex<Option<CachedBundle>>,
}

struct CachedBundle {
    bundle: CertificateBundle,
    not_after: OffsetDateTime,
}

impl GeneratedSource {
    pub fn new(name: impl Into<String>, hosts: Vec<String>) -> Self {
        Self {
            name: name.into(),
            hosts,
            cached: Mutex::new(None),
        }
    }

    fn generate(&self, now: OffsetDateTime) -> Result<CachedBundle> {
        let key_pair = KeyPair::generate()?;

        let mut params = CertificateParams::new(self.hosts.clone())?;
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, DnValue::Utf8String(self.name.clone()));
        params.distinguished_name = dn;
        let not_after = now + CERT_VALIDITY;
        params.not_before = now;
        params.not_after = not_after;

        let cert = params.self_signed(&key_pair)?;
        let cert_pem = cert.pem().into_bytes();

        Ok(CachedBundle {
            bundle: CertificateBundle {
                cert: cert_pem.clone(),
                key: key_pair.serialize_pem().into_bytes(),
                ca_cert: cert_pem,
            },
            not_after,
        })
    }

    /// Return the cached bundle, regenerating inside the renewal window
    fn bundle_at(&self, now: OffsetDateTime) -> Result<CertificateBundle> {
        let mut cached = self
            .cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = cached.as_ref() {
            if now < entry.not_after - RENEWAL_WINDOW {
                return Ok(entry.bundle.clone());
            }
        }
        let fresh = self.generate(now)?;
        let bundle = fresh.bundle.clone();
        *cached = Some(fresh);
        Ok(bundle)
    }
}

#[async_trait]
impl CertificateSource for GeneratedSource {
    async fn next(&self) -> Result<CertificateBundle> {
        self.bundle_at(OffsetDateTime::now_utc())
    }
}

/// Certificate material re-read from two fixed disk paths.
///
/// Produces no CA certificate; trust-anchor propagation is the concern of
/// whoever placed the files on disk.
pub struct DiskSource {
    cert_path: PathBuf,
    key_path: PathBuf,
}

impl DiskSource {
    pub fn new(cert_path: PathBuf, key_path: PathBuf) -> Self {
        Self {
            cert_path,
            key_path,
        }
    }
}

#[async_trait]
impl CertificateSource for DiskSource {
    async fn next(&self) -> Result<CertificateBundle> {
        let cert = tokio::fs::read(&self.cert_path).await?;
        let key = tokio::fs::read(&self.key_path).await?;
        Ok(CertificateBundle {
            cert,
            key,
            ca_cert: Vec::new(),
        })
    }
}
