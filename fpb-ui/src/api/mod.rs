//! HTTP API handlers for fpb-ui

pub mod health;
pub mod session;
pub mod sources;

pub use health::health_routes;
pub use session::{
    close_session, create_session, current_photo, list_results, reset, run_filter, set_mode, step,
};
pub use sources::list_sources;
