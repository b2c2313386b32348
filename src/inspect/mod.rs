//! Secret inspection types and quote censoring.
//!
//! The config-map policy sends the concatenated key/value text of a
//! ConfigMap to an external content-inspection service which classifies
//! substrings into sensitive-information categories with a likelihood
//! grade. The service itself is an external collaborator; this module
//! defines the trait boundary, the fixed category catalogue, and the
//! censoring applied to quotes before they are echoed back to callers.

mod http;

pub use http::HttpInspector;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Sensitive-information categories the inspector is asked to detect.
///
/// The wire names match the inspection service's catalogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InfoType {
    AuthToken,
    AwsCredentials,
    BasicAuthHeader,
    GcpCredentials,
    GcpApiKey,
    JsonWebToken,
    Password,
    WeakPasswordHash,
    EncryptionKey,
}

/// Every category requested on each inspection call
pub const INFO_TYPE_CATALOGUE: [InfoType; 9] = [
    InfoType::AuthToken,
    InfoType::AwsCredentials,
    InfoType::BasicAuthHeader,
    InfoType::GcpCredentials,
    InfoType::GcpApiKey,
    InfoType::JsonWebToken,
    InfoType::Password,
    InfoType::WeakPasswordHash,
    InfoType::EncryptionKey,
];

impl std::fmt::Display for InfoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InfoType::AuthToken => "AUTH_TOKEN",
            InfoType::AwsCredentials => "AWS_CREDENTIALS",
            InfoType::BasicAuthHeader => "BASIC_AUTH_HEADER",
            InfoType::GcpCredentials => "GCP_CREDENTIALS",
            InfoType::GcpApiKey => "GCP_API_KEY",
            InfoType::JsonWebToken => "JSON_WEB_TOKEN",
            InfoType::Password => "PASSWORD",
            InfoType::WeakPasswordHash => "WEAK_PASSWORD_HASH",
            InfoType::EncryptionKey => "ENCRYPTION_KEY",
        };
        f.write_str(name)
    }
}

/// Likelihood grade attached to each finding, ordered weakest to strongest
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Likelihood {
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    VeryLikely,
}

impl std::fmt::Display for Likelihood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Likelihood::VeryUnlikely => "VERY_UNLIKELY",
            Likelihood::Unlikely => "UNLIKELY",
            Likelihood::Possible => "POSSIBLE",
            Likelihood::Likely => "LIKELY",
            Likelihood::VeryLikely => "VERY_LIKELY",
        };
        f.write_str(name)
    }
}

/// One classified substring from an inspection call
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Finding {
    /// The matched text, echoed back censored in denial messages
    pub quote: String,
    /// Category the text was classified as
    pub info_type: InfoType,
    /// Confidence of the classification
    pub likelihood: Likelihood,
}

/// External service classifying free text for sensitive information
#[async_trait]
pub trait SecretInspector: Send + Sync {
    /// Inspect a text blob and return all findings, unfiltered
    async fn inspect(&self, text: &str) -> Result<Vec<Finding>>;
}

/// Mask a detected quote before echoing it back in a denial message.
///
/// Up to three characters pass through unchanged; 4-5 characters keep the
/// first and last with the interior collapsed to `*`; longer quotes keep the
/// first two and last two with the interior collapsed to `**`.
pub fn censor(quote: &str) -> String {
    let chars: Vec<char> = quote.chars().collect();
    match chars.len() {
        0..=3 => quote.to_string(),
        4..=5 => {
            let first = chars.first().copied().unwrap_or_default();
            let last = chars.last().copied().unwrap_or_default();
            format!("{first}*{last}")
        }
        len => {
            let head: String = chars.iter().take(2).collect();
            let tail: String = chars.iter().skip(len - 2).collect();
            format!("{head}**{tail}")
        }
    }
}
