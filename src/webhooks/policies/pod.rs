//! Pod admission policy: trusted image registries.

use k8s_openapi::api::core::v1::Pod;
use kube::core::admission::{AdmissionRequest, AdmissionResponse};
use kube::core::DynamicObject;
use tracing::{debug, error, warn};

use crate::config::Settings;

use super::{
    check_registries, decode_object, in_reserved_namespace, opt_flag, OptFlag,
    IGNORE_CHECK_ANNOTATION,
};

/// Validate a pod admission request
pub fn check(request: &AdmissionRequest<DynamicObject>, settings: &Settings) -> AdmissionResponse {
    let response = AdmissionResponse::from(request);

    let pod: Pod = match decode_object(request) {
        Ok(pod) => pod,
        Err(e) => {
            error!(error = %e, "could not decode admission object as a pod");
            return response.deny(e.to_string());
        }
    };

    debug!("checking if this pod should be ignored");
    match opt_flag(&pod.metadata, IGNORE_CHECK_ANNOTATION) {
        Ok(OptFlag::Set(true)) => return response,
        Ok(_) => {}
        Err(e) => {
            return response.deny(format!("error checking if pod should be ignored: {e}"));
        }
    }

    if in_reserved_namespace(request) {
        return response;
    }

    let Some(spec) = pod.spec.as_ref() else {
        return response.deny("pod has no spec");
    };

    if let Err(msg) = check_registries(spec, &settings.allowed_registries) {
        warn!(message = %msg, "pod contains unidentified registry");
        return response.deny(msg);
    }

    response
}
