//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, tracing)
//!     → request.rs (ApiRequest: query, body, headers)
//!     → routing::RouteTable::dispatch
//!     → response.rs (ApiResponse → axum Response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{ApiRequest, HttpMethod, RequestUuid, X_REQUEST_ID};
pub use response::ApiResponse;
pub use server::HttpServer;
