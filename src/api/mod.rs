//! HTTP API
//!
//! Axum router, extractors and the JSON envelope. Handlers live in
//! [`handlers`], one module per resource.

pub mod extract;
pub mod handlers;
pub mod response;
pub mod server;

pub use response::{ApiResponse, ErrorResponse};
pub use server::{create_router, start_server};
