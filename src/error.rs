//! Error types for the webhook service.
//!
//! One error enum covers both subsystems: certificate lifecycle failures
//! (logged and retried, never fatal to serving traffic) and admission
//! pipeline failures (surfaced inside a denial-shaped response).

use thiserror::Error;

/// Error type for webhook operations
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// I/O error reading certificate material from disk
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Self-signed certificate generation failed
    #[error("certificate generation error: {0}")]
    CertificateGeneration(#[from] rcgen::Error),

    /// Certificate bundle could not be parsed into a TLS keypair
    #[error("invalid certificate bundle: {0}")]
    InvalidBundle(String),

    /// Admission request carried no object to validate
    #[error("missing object in admission request")]
    MissingObject,

    /// Opt annotation present but not a boolean
    #[error("annotation {key} has non-boolean value {value:?}")]
    Annotation { key: String, value: String },

    /// External secret inspection call failed or timed out
    #[error("secret inspection failed: {0}")]
    Inspection(#[from] reqwest::Error),

    /// Webhook server error
    #[error("webhook server error: {0}")]
    Server(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for webhook operations
pub type Result<T> = std::result::Result<T, Error>;
