//! Admission webhook endpoint and per-kind policies.

pub mod policies;
mod server;

pub use server::{create_router, run_webhook_server, WebhookState, WEBHOOK_PORT};
