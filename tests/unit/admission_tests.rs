//! Admission endpoint tests: routing, the validation ladder, and verdicts.

use admission_warden::inspect::{Finding, InfoType, Likelihood};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::fixtures::{json_post, pod_review, review, test_router, StaticInspector};

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_route_answers_in_plaintext() {
    let router = test_router(StaticInspector::none());
    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"healthy");
}

#[tokio::test]
async fn test_compliant_pod_gets_allow_verdict() {
    let router = test_router(StaticInspector::none());
    let request = json_post("/pods/check", &pod_review("default", "gcr.io/trusted/app:1.0"));

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["apiVersion"], "admission.k8s.io/v1");
    assert_eq!(body["response"]["uid"], "e2e-uid");
    assert_eq!(body["response"]["allowed"], true);
}

#[tokio::test]
async fn test_violating_pod_gets_deny_verdict_in_a_200() {
    let router = test_router(StaticInspector::none());
    let request = json_post("/pods/check", &pod_review("default", "evil.io/bad:1.0"));

    let response = router.oneshot(request).await.unwrap();
    // denials ride inside a successful HTTP exchange
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["response"]["allowed"], false);
    let message = body["response"]["status"]["message"].as_str().unwrap();
    assert!(message.contains("evil.io/bad:1.0"));
}

#[tokio::test]
async fn test_wrong_content_type_is_rejected_before_decoding() {
    let router = test_router(StaticInspector::none());
    let request = Request::post("/pods/check")
        .header("content-type", "text/plain")
        .body(Body::from(
            serde_json::to_vec(&pod_review("default", "gcr.io/trusted/app:1.0")).unwrap(),
        ))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_body_is_rejected() {
    let router = test_router(StaticInspector::none());
    let request = Request::post("/pods/check")
        .header("content-type", "application/json")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_undecodable_envelope_is_a_server_error() {
    let router = test_router(StaticInspector::none());
    let request = Request::post("/pods/check")
        .header("content-type", "application/json")
        .body(Body::from("this is not an admission review"))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_deployment_without_probes_is_denied() {
    let router = test_router(StaticInspector::none());
    let body = review(
        "apps",
        "Deployment",
        "deployments",
        "default",
        serde_json::json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "test-deployment", "namespace": "default"},
            "spec": {
                "selector": {"matchLabels": {"app": "test"}},
                "template": {
                    "metadata": {"labels": {"app": "test"}},
                    "spec": {
                        "containers": [
                            {"name": "app", "image": "gcr.io/trusted/app:1.0"},
                        ],
                    },
                },
            },
        }),
    );

    let response = router
        .oneshot(json_post("/deployments/check", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["response"]["allowed"], false);
    let message = body["response"]["status"]["message"].as_str().unwrap();
    assert!(message.contains("liveness probe"));
}

fn configmap_review(namespace: &str, annotations: serde_json::Value) -> serde_json::Value {
    review(
        "",
        "ConfigMap",
        "configmaps",
        namespace,
        serde_json::json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {
                "name": "test-config",
                "namespace": namespace,
                "annotations": annotations,
            },
            "data": {"password": "supersecret"},
        }),
    )
}

#[tokio::test]
async fn test_configmap_without_opt_in_is_allowed() {
    let router = test_router(StaticInspector::with(vec![Finding {
        quote: "supersecret".to_string(),
        info_type: InfoType::Password,
        likelihood: Likelihood::VeryLikely,
    }]));
    let body = configmap_review("default", serde_json::json!({}));

    let response = router
        .oneshot(json_post("/configmaps/check", &body))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["response"]["allowed"], true);
}

#[tokio::test]
async fn test_opted_in_configmap_with_findings_is_denied_censored() {
    let router = test_router(StaticInspector::with(vec![Finding {
        quote: "supersecret".to_string(),
        info_type: InfoType::Password,
        likelihood: Likelihood::Likely,
    }]));
    let body = configmap_review(
        "default",
        serde_json::json!({"warden.io/check-secrets": "true"}),
    );

    let response = router
        .oneshot(json_post("/configmaps/check", &body))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["response"]["allowed"], false);

    let message = body["response"]["status"]["message"].as_str().unwrap();
    assert!(message.contains("su**et -> detected as PASSWORD (LIKELY)"));
    // the raw secret never leaves the service
    assert!(!message.contains("supersecret"));
}

#[tokio::test]
async fn test_reserved_namespace_pod_is_exempt_end_to_end() {
    let router = test_router(StaticInspector::none());
    let request = json_post("/pods/check", &pod_review("kube-system", "evil.io/bad:1.0"));

    let response = router.oneshot(request).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["response"]["allowed"], true);
}
