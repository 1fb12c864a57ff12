//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Request context
//!     → pipeline.rs (before filters, route, after filters)
//!     → routing::registry (route and filter lookup)
//!     → signal.rs (Continue / Halt / Fail after every stage)
//!     → exception mapper on Fail
//!     → finalized Response context
//! ```
//!
//! # Design Decisions
//! - Synchronous: one worker runs one request start to finish
//! - Control flow is returned, never unwound
//! - Failures always become a response; nothing escapes to the transport

pub mod pipeline;
pub mod signal;

pub use pipeline::{Dispatched, Outcome, Pipeline, Stage, INTERNAL_ERROR_BODY, NOT_FOUND_BODY};
pub use signal::{halt, Halt, Interrupt, Signal};
