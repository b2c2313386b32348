//! Admission policies for pods, deployments, and config maps.
//!
//! Each policy is a decision function over the decoded resource: decode the
//! typed object from the admission request (decode failure denies), consult
//! the kind's opt annotation, exempt the reserved system namespaces, then
//! run the kind's checks. Denials are expressed inside a 200 response body;
//! internal failures (decode errors, malformed annotations, inspector
//! errors) take the same denial shape with the error text as the message.

pub mod configmap;
pub mod deployment;
pub mod pod;

use k8s_openapi::api::core::v1::PodSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::admission::AdmissionRequest;
use kube::core::DynamicObject;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Opt-out annotation honored on pods and deployments ("ignore this check")
pub const IGNORE_CHECK_ANNOTATION: &str = "warden.io/ignore-check";

/// Opt-in annotation honored on config maps ("run this check")
pub const CHECK_SECRETS_ANNOTATION: &str = "warden.io/check-secrets";

/// Namespaces whose resources are always allowed
pub const RESERVED_NAMESPACES: [&str; 2] = ["kube-system", "kube-public"];

/// Three-way result of reading a boolean opt annotation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptFlag {
    /// Annotation not present; the kind's default behavior applies
    Absent,
    /// Annotation present with an explicit boolean value
    Set(bool),
}

/// Read a boolean opt annotation from resource metadata.
///
/// A present but unparsable value is an error, never treated as absent.
pub fn opt_flag(metadata: &ObjectMeta, key: &str) -> Result<OptFlag> {
    match metadata.annotations.as_ref().and_then(|a| a.get(key)) {
        None => Ok(OptFlag::Absent),
        Some(raw) => raw
            .parse::<bool>()
            .map(OptFlag::Set)
            .map_err(|_| Error::Annotation {
                key: key.to_string(),
                value: raw.clone(),
            }),
    }
}

/// Whether the request targets one of the reserved system namespaces
pub fn in_reserved_namespace(request: &AdmissionRequest<DynamicObject>) -> bool {
    request
        .namespace
        .as_deref()
        .is_some_and(|ns| RESERVED_NAMESPACES.contains(&ns))
}

/// Decode the typed resource carried inside the admission request
pub(crate) fn decode_object<T: DeserializeOwned>(
    request: &AdmissionRequest<DynamicObject>,
) -> Result<T> {
    let object = request.object.as_ref().ok_or(Error::MissingObject)?;
    let value = serde_json::to_value(object)?;
    Ok(serde_json::from_value(value)?)
}

/// Check that every container image matches at least one allow-listed
/// registry prefix. Returns the first violation as a denial message.
pub(crate) fn check_registries(
    spec: &PodSpec,
    registries: &[String],
) -> std::result::Result<(), String> {
    for container in &spec.containers {
        let image = container.image.as_deref().unwrap_or_default();
        let identified = registries
            .iter()
            .any(|registry| image.contains(registry.as_str()));
        if !identified {
            return Err(format!(
                "container {} used unidentified registry {}",
                container.name, image
            ));
        }
    }
    Ok(())
}
