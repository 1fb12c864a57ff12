//! Per-request state machine.
//!
//! ```text
//! Start → BeforeFilters → RouteMatch → Execute → AfterFilters → Finalize
//!              │               │           │           │
//!              └── Halt/Fail ──┴───────────┴───────────┴──▶ Finalize
//!                              │
//!                              └── no route, no static file ──▶ Finalize (404)
//! ```
//!
//! Every stage produces a [`Signal`]. `Halt` applies its status and body and
//! jumps to `Finalize`. `Fail` goes through the exception mapper and then to
//! `Finalize`; after-filters never run for a halted or failed request.

use std::sync::Arc;

use axum::http::{Method, StatusCode};

use crate::dispatch::signal::{Halt, Interrupt, Signal};
use crate::exception::{Exception, ExceptionMapper};
use crate::http::{Request, Response};
use crate::routing::accept::AcceptHeader;
use crate::routing::registry::{FilterMatch, FilterPhase, Registry, RouteMatch};
use crate::statics::StaticFiles;

/// Body sent when nothing matched.
pub const NOT_FOUND_BODY: &str = "<html><body><h2>404 Not found</h2></body></html>";

/// Body sent when a failure has no mapped handler.
pub const INTERNAL_ERROR_BODY: &str = "<html><body><h2>500 Internal Error</h2></body></html>";

/// Pipeline stages, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    BeforeFilters,
    RouteMatch,
    Execute,
    AfterFilters,
    Finalize,
}

/// How a request was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A route ran to completion.
    Routed,
    /// A static file collaborator produced the body.
    Static,
    /// Nothing matched.
    NotFound,
    /// A filter or the route halted.
    Halted,
    /// A failure was handled by a registered exception handler.
    MappedException,
    /// A failure had no handler.
    UnhandledException,
}

/// A finalized response and how it came about.
#[derive(Debug)]
pub struct Dispatched {
    pub response: Response,
    pub outcome: Outcome,
}

/// Borrowed view over a router's registrations that runs requests.
#[derive(Clone, Copy)]
pub struct Pipeline<'a> {
    registry: &'a Registry,
    exceptions: &'a ExceptionMapper,
    statics: &'a [Arc<dyn StaticFiles>],
}

impl<'a> Pipeline<'a> {
    pub fn new(
        registry: &'a Registry,
        exceptions: &'a ExceptionMapper,
        statics: &'a [Arc<dyn StaticFiles>],
    ) -> Self {
        Self {
            registry,
            exceptions,
            statics,
        }
    }

    /// Run a request from `Start` to `Finalize`.
    pub fn run(&self, mut request: Request) -> Dispatched {
        let accept = AcceptHeader::parse(request.accept());
        let mut response = Response::new();

        let outcome = self.execute(&mut request, &mut response, &accept);
        self.finalize(&request, &mut response, outcome);

        Dispatched { response, outcome }
    }

    fn execute(&self, request: &mut Request, response: &mut Response, accept: &AcceptHeader) -> Outcome {
        let path = request.path().to_string();

        let signal = self.run_filters(FilterPhase::Before, &path, accept, request, response);
        if let Some(outcome) = self.settle(Stage::BeforeFilters, signal, request, response) {
            return outcome;
        }

        let outcome = match self.find_route(request.method(), &path, accept) {
            Some(RouteMatch { entry, captures }) => {
                request.bind(captures);
                let signal = match (entry.handler())(&*request, response) {
                    Ok(body) => {
                        if !body.is_empty() {
                            response.set_body(body);
                        }
                        Signal::Continue
                    }
                    Err(Interrupt::Halt(halt)) => Signal::Halt(halt),
                    Err(Interrupt::Fail(exception)) => Signal::Fail(exception),
                };
                if let Some(outcome) = self.settle(Stage::Execute, signal, request, response) {
                    return outcome;
                }
                Outcome::Routed
            }
            None => {
                if !self.serve_static(request, response) {
                    tracing::debug!(
                        request_id = %request.id(),
                        method = %request.method(),
                        path = %path,
                        stage = ?Stage::RouteMatch,
                        "No route matched"
                    );
                    return Outcome::NotFound;
                }
                Outcome::Static
            }
        };

        let signal = self.run_filters(FilterPhase::After, &path, accept, request, response);
        self.settle(Stage::AfterFilters, signal, request, response)
            .unwrap_or(outcome)
    }

    /// HEAD falls back to the GET route when no HEAD route exists.
    fn find_route(&self, method: &Method, path: &str, accept: &AcceptHeader) -> Option<RouteMatch<'a>> {
        let registry = self.registry;
        match registry.find_route(method, path, accept) {
            None if *method == Method::HEAD => registry.find_route(&Method::GET, path, accept),
            found => found,
        }
    }

    fn run_filters(
        &self,
        phase: FilterPhase,
        path: &str,
        accept: &AcceptHeader,
        request: &mut Request,
        response: &mut Response,
    ) -> Signal {
        for FilterMatch { entry, captures } in self.registry.find_filters(phase, path, accept) {
            request.bind(captures);
            match Signal::from((entry.handler())(&*request, response)) {
                Signal::Continue => continue,
                signal => return signal,
            }
        }
        Signal::Continue
    }

    fn serve_static(&self, request: &Request, response: &mut Response) -> bool {
        if *request.method() != Method::GET && *request.method() != Method::HEAD {
            return false;
        }
        for source in self.statics {
            if let Some(file) = source.lookup(request.path()) {
                response.set_type(file.content_type);
                response.set_body(file.content);
                return true;
            }
        }
        false
    }

    /// `None` to keep going, or the outcome once a halt or failure is applied.
    fn settle(&self, stage: Stage, signal: Signal, request: &Request, response: &mut Response) -> Option<Outcome> {
        match signal {
            Signal::Continue => None,
            Signal::Halt(halt) => Some(self.apply_halt(stage, halt, request, response)),
            Signal::Fail(exception) => Some(self.apply_failure(stage, exception.as_ref(), request, response)),
        }
    }

    fn apply_halt(&self, stage: Stage, halt: Halt, request: &Request, response: &mut Response) -> Outcome {
        tracing::debug!(
            request_id = %request.id(),
            stage = ?stage,
            status = halt.status().as_u16(),
            "Request halted"
        );
        response.set_status(halt.status());
        if let Some(body) = halt.body() {
            response.set_body(body);
        }
        Outcome::Halted
    }

    fn apply_failure(
        &self,
        stage: Stage,
        exception: &dyn Exception,
        request: &Request,
        response: &mut Response,
    ) -> Outcome {
        match self.exceptions.resolve(exception) {
            Some(handler) => {
                tracing::debug!(
                    request_id = %request.id(),
                    stage = ?stage,
                    kind = %exception.kind(),
                    "Exception mapped"
                );
                handler(exception, request, response);
                Outcome::MappedException
            }
            None => {
                tracing::error!(
                    request_id = %request.id(),
                    stage = ?stage,
                    kind = %exception.kind(),
                    error = %exception,
                    "Unhandled exception"
                );
                response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
                response.set_body(INTERNAL_ERROR_BODY);
                Outcome::UnhandledException
            }
        }
    }

    fn finalize(&self, request: &Request, response: &mut Response, outcome: Outcome) {
        if outcome == Outcome::NotFound {
            response.set_status(StatusCode::NOT_FOUND);
            response.set_body(NOT_FOUND_BODY);
        }
        if *request.method() == Method::HEAD {
            response.clear_body();
        }

        tracing::debug!(
            request_id = %request.id(),
            stage = ?Stage::Finalize,
            outcome = ?outcome,
            status = response.status().as_u16(),
            "Request finalized"
        );
    }
}
