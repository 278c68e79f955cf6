mod app;
mod isalive;
mod service;

pub use app::{add_routes, AppState};
