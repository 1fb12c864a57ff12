//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → broadcast to every running server
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM or broadcast → graceful shutdown
//!     → stop accepting → drain in-flight requests → run() returns
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
