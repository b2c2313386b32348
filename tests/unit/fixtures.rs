//! Shared builders for admission reviews and webhook state.

use std::sync::Arc;

use admission_warden::config::Settings;
use admission_warden::inspect::{Finding, SecretInspector};
use admission_warden::webhooks::{create_router, WebhookState};
use admission_warden::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;

/// Inspector double returning a fixed set of findings
pub struct StaticInspector {
    findings: Vec<Finding>,
}

impl StaticInspector {
    pub fn with(findings: Vec<Finding>) -> Self {
        Self { findings }
    }

    pub fn none() -> Self {
        Self::with(Vec::new())
    }
}

#[async_trait]
impl SecretInspector for StaticInspector {
    async fn inspect(&self, _text: &str) -> Result<Vec<Finding>> {
        Ok(self.findings.clone())
    }
}

pub fn test_settings() -> Settings {
    Settings {
        allowed_registries: vec!["gcr.io/trusted".to_string()],
        ..Default::default()
    }
}

pub fn test_router(inspector: StaticInspector) -> Router {
    create_router(WebhookState {
        settings: test_settings(),
        inspector: Arc::new(inspector),
    })
}

/// An AdmissionReview envelope the way the API server would post it
pub fn review(
    group: &str,
    kind: &str,
    plural: &str,
    namespace: &str,
    object: serde_json::Value,
) -> serde_json::Value {
    serde_json::json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": "e2e-uid",
            "kind": {"group": group, "version": "v1", "kind": kind},
            "resource": {"group": group, "version": "v1", "resource": plural},
            "requestKind": {"group": group, "version": "v1", "kind": kind},
            "requestResource": {"group": group, "version": "v1", "resource": plural},
            "operation": "CREATE",
            "userInfo": {},
            "namespace": namespace,
            "object": object,
        }
    })
}

pub fn pod_review(namespace: &str, image: &str) -> serde_json::Value {
    review(
        "",
        "Pod",
        "pods",
        namespace,
        serde_json::json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": "test-pod", "namespace": namespace},
            "spec": {"containers": [{"name": "app", "image": image}]},
        }),
    )
}

pub fn json_post(path: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}
