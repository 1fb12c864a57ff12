//! Exception-to-response mapping.
//!
//! # Responsibilities
//! - Describe handler failures with an explicit type lineage
//! - Register one handler per exception kind
//! - Resolve the handler for a thrown value, most derived kind first
//!
//! # Design Decisions
//! - Lineage is data, not language dispatch: an exception reports its own
//!   kind plus its supertypes (nearest first)
//! - Registering a kind twice replaces the earlier handler
//! - Resolution is read-only, so the mapper is shared freely across workers

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::http::{Request, Response};

/// Identifier of an exception type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExceptionKind(&'static str);

impl ExceptionKind {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A failure raised by a filter or route.
///
/// Implementors name their own kind and list their supertypes from nearest to
/// most general. A handler registered for any kind in that lineage catches it.
///
/// ```
/// use waypoint::exception::{Exception, ExceptionKind};
///
/// const BASE: ExceptionKind = ExceptionKind::new("BaseException");
/// const SUB: ExceptionKind = ExceptionKind::new("SubclassOfBaseException");
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("subclass of base")]
/// struct SubclassOfBase;
///
/// impl Exception for SubclassOfBase {
///     fn kind(&self) -> ExceptionKind {
///         SUB
///     }
///     fn supertypes(&self) -> &'static [ExceptionKind] {
///         &[BASE]
///     }
/// }
/// ```
pub trait Exception: std::error::Error + Send + Sync + 'static {
    /// The most derived kind of this value.
    fn kind(&self) -> ExceptionKind;

    /// Supertypes, nearest first.
    fn supertypes(&self) -> &'static [ExceptionKind] {
        &[]
    }
}

/// Kind of [`Failure`] when no other kind is given.
pub const ERROR: ExceptionKind = ExceptionKind::new("Error");

/// Wraps an arbitrary error so it can travel through the pipeline.
#[derive(Debug)]
pub struct Failure {
    kind: ExceptionKind,
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl Failure {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::with_kind(ERROR, source)
    }

    pub fn with_kind(
        kind: ExceptionKind,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl Exception for Failure {
    fn kind(&self) -> ExceptionKind {
        self.kind
    }

    fn supertypes(&self) -> &'static [ExceptionKind] {
        if self.kind == ERROR {
            &[]
        } else {
            &[ERROR]
        }
    }
}

/// Every kind an exception answers to, most derived first.
pub fn lineage(exception: &dyn Exception) -> impl Iterator<Item = ExceptionKind> + '_ {
    std::iter::once(exception.kind()).chain(exception.supertypes().iter().copied())
}

/// Handler invoked with the thrown value and both halves of the context.
pub type ExceptionHandler = Arc<dyn Fn(&dyn Exception, &Request, &mut Response) + Send + Sync>;

/// Kind → handler table.
#[derive(Default, Clone)]
pub struct ExceptionMapper {
    handlers: HashMap<ExceptionKind, ExceptionHandler>,
}

impl ExceptionMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for `kind`.
    pub fn register(&mut self, kind: ExceptionKind, handler: ExceptionHandler) {
        if self.handlers.insert(kind, handler).is_some() {
            tracing::debug!(kind = %kind, "Replaced exception handler");
        }
    }

    /// Find the handler for the nearest registered kind in the lineage.
    pub fn resolve(&self, exception: &dyn Exception) -> Option<&ExceptionHandler> {
        lineage(exception).find_map(|kind| self.handlers.get(&kind))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for ExceptionMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionMapper")
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
