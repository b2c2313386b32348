//! Deployment admission policy: trusted registries and health probes.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::PodSpec;
use kube::core::admission::{AdmissionRequest, AdmissionResponse};
use kube::core::DynamicObject;
use tracing::{debug, error, warn};

use crate::config::Settings;

use super::{
    check_registries, decode_object, in_reserved_namespace, opt_flag, OptFlag,
    IGNORE_CHECK_ANNOTATION,
};

/// Validate a deployment admission request.
///
/// Runs the registry check and the probe check in sequence; when both fail,
/// the later check's message replaces the earlier one in the response.
pub fn check(request: &AdmissionRequest<DynamicObject>, settings: &Settings) -> AdmissionResponse {
    let mut response = AdmissionResponse::from(request);

    let deployment: Deployment = match decode_object(request) {
        Ok(deployment) => deployment,
        Err(e) => {
            error!(error = %e, "could not decode admission object as a deployment");
            return response.deny(e.to_string());
        }
    };

    debug!("checking if this deployment should be ignored");
    match opt_flag(&deployment.metadata, IGNORE_CHECK_ANNOTATION) {
        Ok(OptFlag::Set(true)) => return response,
        Ok(_) => {}
        Err(e) => {
            return response.deny(format!(
                "error checking if deployment should be ignored: {e}"
            ));
        }
    }

    if in_reserved_namespace(request) {
        return response;
    }

    let Some(spec) = deployment
        .spec
        .as_ref()
        .and_then(|s| s.template.spec.as_ref())
    else {
        return response.deny("deployment has no pod template spec");
    };

    if let Err(msg) = check_registries(spec, &settings.allowed_registries) {
        warn!(message = %msg, "deployment contains unidentified registry");
        response = response.deny(msg);
    }

    if let Err(msg) = check_probes(spec) {
        warn!(message = %msg, "deployment has no valid probe");
        response = response.deny(msg);
    }

    response
}

/// Every container must declare a liveness and a readiness probe, each
/// specifying at least one of TCP socket, exec, or HTTP GET.
fn check_probes(spec: &PodSpec) -> Result<(), String> {
    for container in &spec.containers {
        let Some(liveness) = container.liveness_probe.as_ref() else {
            return Err(format!(
                "container {} has no liveness probe configured",
                container.name
            ));
        };
        if liveness.tcp_socket.is_none() && liveness.exec.is_none() && liveness.http_get.is_none() {
            return Err(format!(
                "none of tcp socket, exec, and httpGet is configured for liveness probe in container {}",
                container.name
            ));
        }

        let Some(readiness) = container.readiness_probe.as_ref() else {
            return Err(format!(
                "container {} has no readiness probe configured",
                container.name
            ));
        };
        if readiness.tcp_socket.is_none()
            && readiness.exec.is_none()
            && readiness.http_get.is_none()
        {
            return Err(format!(
                "none of tcp socket, exec, and httpGet is configured for readiness probe in container {}",
                container.name
            ));
        }
    }
    Ok(())
}
