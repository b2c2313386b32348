// Test code is allowed to panic on failure
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! End-to-end tests for the admission endpoint and certificate rotation.
//!
//! These tests drive the real router and the real rotation pipeline WITHOUT
//! a live Kubernetes cluster: admission reviews are posted straight into the
//! router, and certificate bundles flow source to store in-process.
//!
//! ```bash
//! # Run all unit tests
//! cargo test --test unit
//!
//! # Run with verbose output
//! cargo test --test unit -- --nocapture
//! ```

mod fixtures;

mod admission_tests;
mod rotation_tests;
