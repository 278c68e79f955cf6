pub mod event;
pub mod forwarder;
pub mod gitea;
pub mod github;
pub mod metrics;
pub mod normalized;
pub mod payload;
pub mod routing;
