//! ConfigMap admission policy: sensitive-content detection.
//!
//! Opt-in via annotation: config maps are skipped unless they carry
//! `warden.io/check-secrets: "true"`. When checked, all key/value pairs are
//! concatenated into one text blob and sent to the external secret
//! inspector; every finding at likelihood `POSSIBLE` or stronger appends a
//! censored line to the denial message.

use k8s_openapi::api::core::v1::ConfigMap;
use kube::core::admission::{AdmissionRequest, AdmissionResponse};
use kube::core::DynamicObject;
use tracing::{debug, error};

use crate::inspect::{censor, Finding, Likelihood, SecretInspector};

use super::{decode_object, in_reserved_namespace, opt_flag, OptFlag, CHECK_SECRETS_ANNOTATION};

/// Validate a config-map admission request
pub async fn check(
    request: &AdmissionRequest<DynamicObject>,
    inspector: &dyn SecretInspector,
) -> AdmissionResponse {
    let response = AdmissionResponse::from(request);

    let configmap: ConfigMap = match decode_object(request) {
        Ok(configmap) => configmap,
        Err(e) => {
            error!(error = %e, "could not decode admission object as a configmap");
            return response.deny(e.to_string());
        }
    };

    debug!("checking if this configmap should be inspected");
    match opt_flag(&configmap.metadata, CHECK_SECRETS_ANNOTATION) {
        // default is to skip: config maps opt in to inspection
        Ok(OptFlag::Set(true)) => {}
        Ok(_) => return response,
        Err(e) => {
            return response.deny(format!(
                "error checking if configmap should be inspected: {e}"
            ));
        }
    }

    if in_reserved_namespace(request) {
        return response;
    }

    let text = render_data(&configmap);
    debug!(bytes = text.len(), "text to inspect is constructed");

    let findings = match inspector.inspect(&text).await {
        Ok(findings) => findings,
        Err(e) => {
            error!(error = %e, "secret inspection failed");
            return response.deny(e.to_string());
        }
    };

    let message = denial_message(&findings);
    if message.is_empty() {
        response
    } else {
        response.deny(message)
    }
}

/// Concatenate all data entries into the text blob sent for inspection
fn render_data(configmap: &ConfigMap) -> String {
    let mut text = String::new();
    if let Some(data) = configmap.data.as_ref() {
        for (key, value) in data {
            text.push_str(&format!("{key}: {value}\n"));
        }
    }
    text
}

/// One censored line per qualifying finding; empty means allow
fn denial_message(findings: &[Finding]) -> String {
    let mut message = String::new();
    for finding in findings {
        if finding.likelihood >= Likelihood::Possible {
            message.push_str(&format!(
                "\n{} -> detected as {} ({})",
                censor(&finding.quote),
                finding.info_type,
                finding.likelihood
            ));
        }
    }
    message
}
