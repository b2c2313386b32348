//! Environment-sourced configuration.
//!
//! All settings are read once at startup. Absent values take defaults; an
//! empty `WARDEN_WEBHOOK_NAME` disables trust-anchor propagation, and absent
//! TLS file paths select self-signed certificate generation.

use std::path::PathBuf;

/// Default registry prefixes accepted by the image registry check
const DEFAULT_ALLOWED_REGISTRIES: &[&str] = &["gcr.io/", "docker.io/"];

/// Default endpoint for the external secret-inspection service
const DEFAULT_INSPECTOR_URL: &str = "http://127.0.0.1:9090";

/// Runtime settings for the webhook service
#[derive(Clone, Debug)]
pub struct Settings {
    /// Name of the MutatingWebhookConfiguration that receives the CA bundle.
    /// `None` disables the trust-anchor patch.
    pub webhook_name: Option<String>,
    /// Host names placed in the self-signed certificate SANs
    pub tls_hosts: Vec<String>,
    /// Path to a PEM certificate on disk; presence selects disk sourcing
    pub tls_cert_file: Option<PathBuf>,
    /// Path to the matching PEM private key
    pub tls_key_file: Option<PathBuf>,
    /// Registry prefixes accepted by the pod and deployment registry check
    pub allowed_registries: Vec<String>,
    /// Base URL of the external secret-inspection service
    pub inspector_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            webhook_name: None,
            tls_hosts: Vec::new(),
            tls_cert_file: None,
            tls_key_file: None,
            allowed_registries: DEFAULT_ALLOWED_REGISTRIES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            inspector_url: DEFAULT_INSPECTOR_URL.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the environment
    pub fn from_env() -> Self {
        let defaults = Settings::default();
        Self {
            webhook_name: non_empty_var("WARDEN_WEBHOOK_NAME"),
            tls_hosts: list_var("WARDEN_TLS_HOSTS").unwrap_or_default(),
            tls_cert_file: non_empty_var("WARDEN_TLS_CERT_FILE").map(PathBuf::from),
            tls_key_file: non_empty_var("WARDEN_TLS_KEY_FILE").map(PathBuf::from),
            allowed_registries: list_var("WARDEN_ALLOWED_REGISTRIES")
                .unwrap_or(defaults.allowed_registries),
            inspector_url: non_empty_var("WARDEN_INSPECTOR_URL")
                .unwrap_or(defaults.inspector_url),
        }
    }

    /// Both TLS file paths, when disk sourcing is fully configured.
    ///
    /// A half-set pair counts as unconfigured; the caller decides whether
    /// that deserves a warning before falling back to generation.
    pub fn tls_paths(&self) -> Option<(PathBuf, PathBuf)> {
        match (self.tls_cert_file.as_ref(), self.tls_key_file.as_ref()) {
            (Some(cert), Some(key)) => Some((cert.clone(), key.clone())),
            _ => None,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn list_var(key: &str) -> Option<Vec<String>> {
    non_empty_var(key).map(|raw| parse_list(&raw))
}

/// Split a comma-separated value into trimmed, non-empty entries
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
