//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, fallback handler)
//!     → request.rs (request context: id, headers, body, captured params)
//!     → [dispatch pipeline runs filters and the route]
//!     → response.rs (status, headers, body; converted back to Axum)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{Request, X_REQUEST_ID};
pub use response::{Body, Response, DEFAULT_CONTENT_TYPE};
pub use server::{HttpServer, ServerError};
