//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     template string
//!     → pattern.rs (compile to literal / :param / * segments)
//!     → registry.rs (append route or filter entry)
//!
//! Lookup (per request):
//!     method, path, Accept header
//!     → accept.rs (parse media ranges)
//!     → registry.rs (scan entries, pattern.rs match, accept fitness)
//!     → matched entry plus captures, or nothing
//! ```
//!
//! # Design Decisions
//! - Entries compiled at registration, immutable at runtime
//! - No regex in the hot path
//! - Deterministic: same input always selects the same entry

pub mod accept;
pub mod pattern;
pub mod registry;

pub use accept::{AcceptHeader, ANY};
pub use pattern::{PathMatch, PathPattern, PatternError};
pub use registry::{FilterHandler, FilterPhase, Registry, RouteHandler};
