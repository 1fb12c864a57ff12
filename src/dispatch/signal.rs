//! Control-flow values returned by pipeline stages.
//!
//! Filters and routes never unwind to stop the pipeline. They return
//! `Err(Interrupt)`, and the pipeline turns every stage outcome into a
//! [`Signal`] it inspects before moving on.

use std::fmt;

use axum::http::StatusCode;

use crate::exception::{Exception, Failure};

/// Stop the pipeline and reply with this status and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Halt {
    status: StatusCode,
    body: Option<String>,
}

impl Halt {
    pub fn new(status: StatusCode) -> Self {
        Self { status, body: None }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

impl Default for Halt {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

/// Shorthand for `return Err(halt(401, "Go Away!"))` style early returns.
/// Out-of-range codes fall back to 500.
pub fn halt(status: u16, body: impl Into<String>) -> Interrupt {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Interrupt::Halt(Halt::new(status).with_body(body))
}

/// Why a filter or route stopped early.
pub enum Interrupt {
    Halt(Halt),
    Fail(Box<dyn Exception>),
}

impl Interrupt {
    /// Fail with an arbitrary error that has no exception kind of its own.
    pub fn fail(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Interrupt::Fail(Box::new(Failure::new(error)))
    }
}

impl fmt::Debug for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupt::Halt(halt) => f.debug_tuple("Halt").field(halt).finish(),
            Interrupt::Fail(e) => f
                .debug_struct("Fail")
                .field("kind", &e.kind())
                .field("message", &e.to_string())
                .finish(),
        }
    }
}

impl From<Halt> for Interrupt {
    fn from(halt: Halt) -> Self {
        Interrupt::Halt(halt)
    }
}

impl<E: Exception> From<E> for Interrupt {
    fn from(e: E) -> Self {
        Interrupt::Fail(Box::new(e))
    }
}

/// Outcome of one pipeline stage.
#[derive(Debug)]
pub enum Signal {
    Continue,
    Halt(Halt),
    Fail(Box<dyn Exception>),
}

impl From<Result<(), Interrupt>> for Signal {
    fn from(result: Result<(), Interrupt>) -> Self {
        match result {
            Ok(()) => Signal::Continue,
            Err(Interrupt::Halt(halt)) => Signal::Halt(halt),
            Err(Interrupt::Fail(e)) => Signal::Fail(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::ERROR;

    #[test]
    fn test_halt_helper() {
        match halt(401, "Go Away!") {
            Interrupt::Halt(h) => {
                assert_eq!(h.status(), StatusCode::UNAUTHORIZED);
                assert_eq!(h.body(), Some("Go Away!"));
            }
            other => panic!("expected halt, got {:?}", other),
        }
        match halt(1000, "") {
            Interrupt::Halt(h) => assert_eq!(h.status(), StatusCode::INTERNAL_SERVER_ERROR),
            other => panic!("expected halt, got {:?}", other),
        }
    }

    #[test]
    fn test_default_halt_has_no_body() {
        let h = Halt::default();
        assert_eq!(h.status(), StatusCode::OK);
        assert_eq!(h.body(), None);
    }

    #[test]
    fn test_signal_from_result() {
        assert!(matches!(Signal::from(Ok(())), Signal::Continue));
        assert!(matches!(
            Signal::from(Err(Halt::new(StatusCode::FORBIDDEN).into())),
            Signal::Halt(_)
        ));
        match Signal::from(Err(Interrupt::fail("boom"))) {
            Signal::Fail(e) => {
                assert_eq!(e.kind(), ERROR);
                assert_eq!(e.to_string(), "boom");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
