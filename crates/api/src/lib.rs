//! HTTP API: server wiring, authentication middleware and route handlers.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
