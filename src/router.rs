//! Application-facing registration API.
//!
//! A [`Router`] is built once at startup, then frozen behind an `Arc` and
//! handed to the HTTP server. All registration methods take `&mut self`, so
//! nothing can be added once traffic is flowing.
//!
//! ```
//! use waypoint::{halt, Router};
//! use axum::http::{Method, StatusCode};
//!
//! let mut router = Router::new();
//! router
//!     .before("/secretcontent/*", |_, _| Err(halt(401, "Go Away!")))
//!     .get("/hi", |_, _| Ok("Hello World!".into()))
//!     .get("/param/:param", |req, _| {
//!         Ok(format!("echo: {}", req.params(":param").unwrap_or_default()).into())
//!     })
//!     .post("/poster", |req, res| {
//!         res.set_status(StatusCode::CREATED);
//!         Ok(format!("Body was: {}", req.body()).into())
//!     });
//!
//! let res = router.dispatch(waypoint::Request::new(Method::GET, "/param/shizzy"));
//! assert_eq!(res.body().to_text(), "echo: shizzy");
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::Method;

use crate::dispatch::{Interrupt, Pipeline};
use crate::exception::{Exception, ExceptionKind, ExceptionMapper};
use crate::http::{Body, Request, Response};
use crate::routing::accept::ANY;
use crate::routing::pattern::{PathPattern, PatternError};
use crate::routing::registry::{FilterPhase, Registry};
use crate::statics::{StaticDirectory, StaticFiles};
use crate::template::{ModelAndView, TemplateEngine};

/// Route, filter, exception and static-file registrations for one application.
#[derive(Default)]
pub struct Router {
    registry: Registry,
    exceptions: ExceptionMapper,
    statics: Vec<Arc<dyn StaticFiles>>,
}

macro_rules! verb {
    ($name:ident, $with_accept:ident, $method:expr) => {
        #[doc = concat!("Register a `", stringify!($method), "` route.")]
        pub fn $name<F>(&mut self, path: &str, handler: F) -> &mut Self
        where
            F: Fn(&Request, &mut Response) -> Result<Body, Interrupt> + Send + Sync + 'static,
        {
            self.route(Some($method), path, ANY, handler)
        }

        #[doc = concat!("Register a `", stringify!($method), "` route producing `accept_type`.")]
        pub fn $with_accept<F>(&mut self, path: &str, accept_type: &str, handler: F) -> &mut Self
        where
            F: Fn(&Request, &mut Response) -> Result<Body, Interrupt> + Send + Sync + 'static,
        {
            self.route(Some($method), path, accept_type, handler)
        }
    };
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    verb!(get, get_with_accept, Method::GET);
    verb!(post, post_with_accept, Method::POST);
    verb!(put, put_with_accept, Method::PUT);
    verb!(patch, patch_with_accept, Method::PATCH);
    verb!(delete, delete_with_accept, Method::DELETE);
    verb!(head, head_with_accept, Method::HEAD);
    verb!(options, options_with_accept, Method::OPTIONS);
    verb!(trace, trace_with_accept, Method::TRACE);
    verb!(connect, connect_with_accept, Method::CONNECT);

    /// Register a route answering every method.
    pub fn any<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) -> Result<Body, Interrupt> + Send + Sync + 'static,
    {
        self.route(None, path, ANY, handler)
    }

    /// Register a route. `None` as method matches every method.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid template. Use [`Router::try_route`]
    /// to handle the error instead.
    pub fn route<F>(&mut self, method: Option<Method>, path: &str, accept_type: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) -> Result<Body, Interrupt> + Send + Sync + 'static,
    {
        let pattern = compile(path);
        self.registry.add_route(method, pattern, accept_type, Arc::new(handler));
        self
    }

    /// Register a route, returning an error for an invalid template.
    pub fn try_route<F>(
        &mut self,
        method: Option<Method>,
        path: &str,
        accept_type: &str,
        handler: F,
    ) -> Result<&mut Self, PatternError>
    where
        F: Fn(&Request, &mut Response) -> Result<Body, Interrupt> + Send + Sync + 'static,
    {
        let pattern = PathPattern::parse(path)?;
        self.registry.add_route(method, pattern, accept_type, Arc::new(handler));
        Ok(self)
    }

    /// Register a `GET` route whose model and view are rendered by `engine`.
    pub fn get_template<F, E>(&mut self, path: &str, handler: F, engine: E) -> &mut Self
    where
        F: Fn(&Request, &mut Response) -> Result<ModelAndView, Interrupt> + Send + Sync + 'static,
        E: TemplateEngine + 'static,
    {
        self.template(Some(Method::GET), path, ANY, handler, engine)
    }

    /// Register a template route for any method and produced type.
    pub fn template<F, E>(
        &mut self,
        method: Option<Method>,
        path: &str,
        accept_type: &str,
        handler: F,
        engine: E,
    ) -> &mut Self
    where
        F: Fn(&Request, &mut Response) -> Result<ModelAndView, Interrupt> + Send + Sync + 'static,
        E: TemplateEngine + 'static,
    {
        self.route(method, path, accept_type, move |req, res| {
            let model_and_view = handler(req, res)?;
            Ok(Body::Text(engine.render(&model_and_view)))
        })
    }

    /// Register a before-filter for `path`.
    pub fn before<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) -> Result<(), Interrupt> + Send + Sync + 'static,
    {
        self.filter(FilterPhase::Before, path, ANY, handler)
    }

    /// Register a before-filter that only applies when `accept_type` is acceptable.
    pub fn before_with_accept<F>(&mut self, path: &str, accept_type: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) -> Result<(), Interrupt> + Send + Sync + 'static,
    {
        self.filter(FilterPhase::Before, path, accept_type, handler)
    }

    /// Register a before-filter for every path.
    pub fn before_all<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) -> Result<(), Interrupt> + Send + Sync + 'static,
    {
        self.filter(FilterPhase::Before, "*", ANY, handler)
    }

    /// Register an after-filter for `path`.
    pub fn after<F>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) -> Result<(), Interrupt> + Send + Sync + 'static,
    {
        self.filter(FilterPhase::After, path, ANY, handler)
    }

    /// Register an after-filter that only applies when `accept_type` is acceptable.
    pub fn after_with_accept<F>(&mut self, path: &str, accept_type: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) -> Result<(), Interrupt> + Send + Sync + 'static,
    {
        self.filter(FilterPhase::After, path, accept_type, handler)
    }

    /// Register an after-filter for every path.
    pub fn after_all<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) -> Result<(), Interrupt> + Send + Sync + 'static,
    {
        self.filter(FilterPhase::After, "*", ANY, handler)
    }

    /// Register a filter.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid template.
    pub fn filter<F>(&mut self, phase: FilterPhase, path: &str, accept_type: &str, handler: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response) -> Result<(), Interrupt> + Send + Sync + 'static,
    {
        let pattern = compile(path);
        self.registry.add_filter(phase, pattern, accept_type, Arc::new(handler));
        self
    }

    /// Map an exception kind (and everything deriving from it) to a handler.
    pub fn exception<F>(&mut self, kind: ExceptionKind, handler: F) -> &mut Self
    where
        F: Fn(&dyn Exception, &Request, &mut Response) + Send + Sync + 'static,
    {
        self.exceptions.register(kind, Arc::new(handler));
        self
    }

    /// Serve files under `location` for paths no route matches.
    pub fn static_files(&mut self, location: impl Into<PathBuf>) -> &mut Self {
        let directory = StaticDirectory::new(location);
        tracing::debug!(root = %directory.root().display(), "Static file location registered");
        self.static_source(directory)
    }

    /// Add a custom static file collaborator. Sources are queried in order.
    pub fn static_source(&mut self, source: impl StaticFiles + 'static) -> &mut Self {
        self.statics.push(Arc::new(source));
        self
    }

    /// Run one request through the pipeline.
    pub fn dispatch(&self, request: Request) -> Response {
        self.pipeline().run(request).response
    }

    /// The dispatch pipeline over this router's registrations.
    pub fn pipeline(&self) -> Pipeline<'_> {
        Pipeline::new(&self.registry, &self.exceptions, &self.statics)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn exceptions(&self) -> &ExceptionMapper {
        &self.exceptions
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.registry.routes().len())
            .field("before", &self.registry.filters(FilterPhase::Before).len())
            .field("after", &self.registry.filters(FilterPhase::After).len())
            .field("exceptions", &self.exceptions)
            .field("statics", &self.statics)
            .finish()
    }
}

fn compile(path: &str) -> PathPattern {
    PathPattern::parse(path).unwrap_or_else(|e| panic!("Invalid route template: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::halt;

    #[test]
    fn test_chained_registration() {
        let mut router = Router::new();
        router
            .get("/", |_, _| Ok("Hello Root!".into()))
            .patch("/patcher", |req, _| Ok(format!("Body was: {}", req.body()).into()))
            .before_all(|_, _| Ok(()))
            .after("/hi", |_, res| {
                res.header("after", "foobar");
                Ok(())
            });

        assert_eq!(router.registry().routes().len(), 2);
        assert_eq!(router.registry().filters(FilterPhase::Before).len(), 1);
        assert_eq!(router.registry().filters(FilterPhase::After).len(), 1);
    }

    #[test]
    fn test_try_route_reports_bad_template() {
        let mut router = Router::new();
        let err = router
            .try_route(Some(Method::GET), "/a/*/b", ANY, |_, _| Ok(Body::Empty))
            .unwrap_err();
        assert!(matches!(err, PatternError::WildcardNotLast(_)));
        assert!(router.registry().routes().is_empty());
    }

    #[test]
    #[should_panic(expected = "Invalid route template")]
    fn test_route_panics_on_bad_template() {
        Router::new().get("/:", |_, _| Ok(Body::Empty));
    }

    #[test]
    fn test_template_route_renders() {
        struct Echo;
        impl TemplateEngine for Echo {
            fn render(&self, mv: &ModelAndView) -> String {
                format!("{}:{}", mv.view_name(), mv.model())
            }
        }

        let mut router = Router::new();
        router.get_template("/view", |_, _| Ok(ModelAndView::new(1, "count")), Echo);

        let res = router.dispatch(Request::new(Method::GET, "/view"));
        assert_eq!(res.body().to_text(), "count:1");
    }

    #[test]
    fn test_template_route_can_halt() {
        struct Never;
        impl TemplateEngine for Never {
            fn render(&self, _: &ModelAndView) -> String {
                unreachable!("halted routes are never rendered")
            }
        }

        let mut router = Router::new();
        router.get_template("/view", |_, _| Err(halt(403, "nope")), Never);

        let res = router.dispatch(Request::new(Method::GET, "/view"));
        assert_eq!(res.status().as_u16(), 403);
        assert_eq!(res.body().to_text(), "nope");
    }
}
