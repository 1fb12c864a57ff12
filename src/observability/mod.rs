//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! router, pipeline, server
//!     → tracing events with structured fields (request_id, method, path)
//!     → logging.rs subscriber (env filter + fmt)
//!     → stdout
//! ```
//!
//! # Design Decisions
//! - Request ID flows through all subsystems via the request span
//! - Unmapped handler failures are logged at error level

pub mod logging;
