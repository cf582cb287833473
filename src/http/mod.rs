//! HTTP API server for the recordings registry
//!
//! This module provides the registry endpoint:
//! - GET /api/recordings - List saved recordings
//! - POST /api/recordings - Append a recording name
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
