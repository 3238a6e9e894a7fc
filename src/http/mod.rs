//! REST delivery layer, compiled with the `http-server` feature.
//!
//! A thin axum surface over the service layer: `dto` shapes the request and
//! response bodies, `handlers` binds them to service calls, `router` wires
//! routes and middleware, and `error` translates failures into status codes.
//! No schedule behavior lives here.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
