pub mod metrics;
pub mod security_headers;
pub mod tracing;
pub mod trusted_host;
