//! Common test utilities for registration integration tests

#![allow(dead_code)]

use service_registration::{FixedHostname, MemoryAgent, RegistrationClient};
use std::sync::Arc;

/// Host name every test client resolves to
pub const TEST_HOST: &str = "worker-7.prod.internal";

/// Instance ID of the `billing` service on [`TEST_HOST`]
pub const BILLING_ID: &str = "billing:worker-7";

/// Install a subscriber so `RUST_LOG`-style output shows up with `--nocapture`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Client over `agent` pinned to [`TEST_HOST`]
pub fn test_client(agent: Arc<MemoryAgent>) -> RegistrationClient {
    test_client_on(agent, TEST_HOST)
}

/// Client over `agent` pinned to `host`
pub fn test_client_on(agent: Arc<MemoryAgent>, host: &str) -> RegistrationClient {
    init_tracing();
    RegistrationClient::with_agent(agent, "10s", "1s")
        .expect("Failed to create client")
        .with_hostname_provider(Arc::new(FixedHostname::new(host)))
}
