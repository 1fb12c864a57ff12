//! Waypoint: a micro web-routing framework.
//!
//! Register routes, before/after filters and exception handlers on a
//! [`Router`], then serve it with [`HttpServer`]. Each request runs through
//! the dispatch pipeline: before filters, route match, handler, after
//! filters, finalize. Filters and handlers may [`halt`] the request or fail
//! with an [`Exception`], which is mapped to a response by kind.

// Core
pub mod dispatch;
pub mod exception;
pub mod router;
pub mod routing;

// Collaborators
pub mod statics;
pub mod template;

// HTTP surface
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use dispatch::{halt, Halt, Interrupt};
pub use exception::{Exception, ExceptionKind};
pub use http::{Body, HttpServer, Request, Response};
pub use lifecycle::Shutdown;
pub use router::Router;
pub use statics::{StaticDirectory, StaticFiles};
pub use template::{ModelAndView, TemplateEngine};
