pub mod api;
pub mod config;
pub mod handlers;
pub mod router;
pub mod server;

// Shared with the integration tests under tests/, so not gated on cfg(test).
pub mod test_utils;
