//! [`Router`](crate::Router) resolves a request method and path to a registered
//! route plus the parameters extracted from the path.
//!
//! Routes live in a segment tree. Static segments match case-insensitively,
//! placeholders bind path parameters:
//! ```ignore
//!  Syntax            Type
//!  {name}            required parameter
//!  [name]            optional parameter
//!  [name=default]    optional parameter with a default value
//! ```
//!
//! Required parameters match exactly one segment:
//! ```ignore
//!  Path: /blog/{category}/{post}
//!
//!  Requests:
//!   /blog/rust/request-routers            match: category="rust", post="request-routers"
//!   /blog/rust/request-routers/           match: category="rust", post="request-routers"
//!   /blog/rust/                           no match
//!   /blog/rust/request-routers/comments   no match
//! ```
//!
//! Optional parameters may be left out, in which case their default (if any)
//! is bound:
//! ```ignore
//!  Path: /[lang=cs]/articles
//!
//!  Requests:
//!   /articles                             match: lang="cs"
//!   /en/articles                          match: lang="en"
//! ```
//!
//! Unlike strict radix routers, several placeholders can share a depth.
//! They are tried in registration order, and a branch whose validators reject
//! the segment, or whose remaining path does not match, is abandoned for the
//! next one:
//! ```rust
//! use segrouter::{Callback, Params, Router, validator::Numeric};
//! use hyper::{Body, Method, Request, Response};
//!
//! async fn by_id(_: Request<Body>) -> hyper::Result<Response<Body>> {
//!     Ok(Response::new(Body::empty()))
//! }
//!
//! async fn by_slug(_: Request<Body>) -> hyper::Result<Response<Body>> {
//!     Ok(Response::new(Body::empty()))
//! }
//!
//! # fn main() -> Result<(), segrouter::Error> {
//! let mut router = Router::default();
//! router.get("/posts/{id}", Callback::function(by_id))?.param("id", [Numeric]);
//! router.get("/posts/{slug}", Callback::function(by_slug))?;
//!
//! let mut params = Params::new();
//! router.get_route(&Method::GET, &["posts", "42"], &mut params)?;
//! assert_eq!(params.get("id"), Some("42"));
//!
//! let mut params = Params::new();
//! router.get_route(&Method::GET, &["posts", "hello-world"], &mut params)?;
//! assert_eq!(params.get("slug"), Some("hello-world"));
//! # Ok(())
//! # }
//! ```
//!
//! The parameters of a dispatched request are stored in its extensions:
//! `req.extensions().get::<Params>()`.
use crate::error::Error;
use crate::group::RouteGroup;
use crate::handler::{Callback, Handler};
use crate::params::Params;
use crate::path;
use crate::redirect::Locale;
use crate::route::{Route, RouteId, RouteMut};
use crate::tree::{Node, Outcome};
use crate::validator::Validator;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::{future, ready};
use hyper::service::Service;
use hyper::{header, Body, Method, Request, Response, StatusCode};
use tracing::{debug, trace, warn};

/// Router dispatches requests to different handlers via configurable routes.
pub struct Router {
    tree: Node,
    routes: Vec<Route>,
    named: HashMap<String, RouteId>,
    methods: Vec<Method>,
    handle_method_not_allowed: bool,
    handle_options: bool,
    global_options: Option<Box<dyn Handler>>,
    not_found: Option<Box<dyn Handler>>,
    method_not_allowed: Option<Box<dyn Handler>>,
}

impl Router {
    /// Insert a route into the tree.
    ///
    /// Registering a route structurally equal to the one already bound to
    /// the same method and path is a no-op that returns the existing id.
    /// Any other route in that place is rejected with
    /// [`Error::DuplicateRoute`].
    pub fn register(&mut self, route: Route) -> Result<RouteId, Error> {
        let Self {
            tree,
            routes,
            methods,
            ..
        } = self;

        let leaves = tree.leaves_mut(&route);
        if let Some(&existing) = leaves.get(route.method()) {
            let current = &routes[existing.0];
            if current.same_route(&route) {
                debug!(method = %route.method(), path = route.readable_path(), "route already registered");
                return Ok(existing);
            }
            warn!(
                method = %route.method(),
                path = route.readable_path(),
                existing = current.readable_path(),
                "rejecting duplicate route"
            );
            return Err(Error::DuplicateRoute {
                existing: Box::new(current.clone()),
                new: Box::new(route),
            });
        }

        let id = RouteId(routes.len());
        leaves.insert(route.method().clone(), id);
        if !methods.contains(route.method()) {
            methods.push(route.method().clone());
        }
        debug!(method = %route.method(), path = route.readable_path(), callback = %route.callback(), "route registered");
        routes.push(route);
        Ok(id)
    }

    /// Create and register a route for `method` and `path`.
    /// ```rust
    /// use segrouter::{Callback, Router};
    /// use hyper::{Body, Method, Request, Response};
    ///
    /// async fn teapot(_: Request<Body>) -> hyper::Result<Response<Body>> {
    ///     Ok(Response::new(Body::from("I am a teapot!")))
    /// }
    ///
    /// # fn main() -> Result<(), segrouter::Error> {
    /// let mut router = Router::default();
    /// router.route(Method::GET, "/teapot", Callback::function(teapot))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn route(
        &mut self,
        method: Method,
        path: &str,
        callback: Callback,
    ) -> Result<RouteMut<'_>, Error> {
        if let Callback::Alias { target } | Callback::Localized { parent: target, .. } = &callback {
            if self.route_by_id(*target).is_none() {
                return Err(Error::configuration(format!(
                    "redirect route {} {} points to an unknown route",
                    method, path
                )));
            }
        }
        let id = self.register(Route::new(method, path, callback)?)?;
        Ok(RouteMut::new(self, id))
    }

    /// Register a handler for `GET` requests
    pub fn get(&mut self, path: &str, callback: Callback) -> Result<RouteMut<'_>, Error> {
        self.route(Method::GET, path, callback)
    }

    /// Register a handler for `HEAD` requests
    pub fn head(&mut self, path: &str, callback: Callback) -> Result<RouteMut<'_>, Error> {
        self.route(Method::HEAD, path, callback)
    }

    /// Register a handler for `OPTIONS` requests
    pub fn options(&mut self, path: &str, callback: Callback) -> Result<RouteMut<'_>, Error> {
        self.route(Method::OPTIONS, path, callback)
    }

    /// Register a handler for `POST` requests
    pub fn post(&mut self, path: &str, callback: Callback) -> Result<RouteMut<'_>, Error> {
        self.route(Method::POST, path, callback)
    }

    /// Register a handler for `PUT` requests
    pub fn put(&mut self, path: &str, callback: Callback) -> Result<RouteMut<'_>, Error> {
        self.route(Method::PUT, path, callback)
    }

    /// Register a handler for `PATCH` requests
    pub fn patch(&mut self, path: &str, callback: Callback) -> Result<RouteMut<'_>, Error> {
        self.route(Method::PATCH, path, callback)
    }

    /// Register a handler for `DELETE` requests
    pub fn delete(&mut self, path: &str, callback: Callback) -> Result<RouteMut<'_>, Error> {
        self.route(Method::DELETE, path, callback)
    }

    /// Register `path` as a permanent redirect to the route `target`.
    pub fn alias(
        &mut self,
        method: Method,
        path: &str,
        target: RouteId,
    ) -> Result<RouteMut<'_>, Error> {
        self.route(method, path, Callback::Alias { target })
    }

    /// Start a group of routes sharing the path prefix `prefix`.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        RouteGroup::new(self, prefix)
    }

    /// Find the route for `method` along the request path `segments`.
    ///
    /// Parameters bound on the way are appended to `params`. Returns
    /// `Ok(None)` when no route matches and [`Error::MethodNotAllowed`] when
    /// the path exists for other methods only.
    /// ```rust
    /// use segrouter::{Callback, Error, Params, Router};
    /// use hyper::{Body, Method, Request, Response};
    ///
    /// async fn variations(_: Request<Body>) -> hyper::Result<Response<Body>> {
    ///     Ok(Response::new(Body::empty()))
    /// }
    ///
    /// let mut router = Router::default();
    /// router.get("/settings/modes/{id}/variations", Callback::function(variations)).unwrap();
    ///
    /// let path = ["settings", "modes", "1", "variations"];
    /// let mut params = Params::new();
    /// assert!(router.get_route(&Method::GET, &path, &mut params).unwrap().is_some());
    /// assert_eq!(params.get("id"), Some("1"));
    ///
    /// let result = router.get_route(&Method::POST, &path, &mut Params::new());
    /// assert!(matches!(result, Err(Error::MethodNotAllowed { .. })));
    /// ```
    pub fn get_route<S: AsRef<str>>(
        &self,
        method: &Method,
        segments: &[S],
        params: &mut Params,
    ) -> Result<Option<&Route>, Error> {
        Ok(self
            .find(method, segments, params)?
            .map(|id| &self.routes[id.0]))
    }

    /// Lookup allows the manual lookup of a route for a specific method and
    /// path string.
    pub fn lookup(
        &self,
        method: &Method,
        path: impl AsRef<str>,
    ) -> Result<Option<(&Route, Params)>, Error> {
        let mut params = Params::new();
        let route = self.get_route(method, &path::split(path.as_ref()), &mut params)?;
        Ok(route.map(|route| (route, params)))
    }

    fn find<S: AsRef<str>>(
        &self,
        method: &Method,
        segments: &[S],
        params: &mut Params,
    ) -> Result<Option<RouteId>, Error> {
        match self.tree.find(method, segments, params) {
            Outcome::Found(id) => {
                trace!(%method, route = self.routes[id.0].readable_path(), "route matched");
                Ok(Some(id))
            }
            Outcome::NotFound => {
                trace!(%method, "no route matched");
                Ok(None)
            }
            Outcome::MethodNotAllowed => Err(Error::MethodNotAllowed {
                method: method.clone(),
                path: segments
                    .iter()
                    .map(AsRef::as_ref)
                    .collect::<Vec<_>>()
                    .join("/"),
            }),
        }
    }

    pub fn route_by_id(&self, id: RouteId) -> Option<&Route> {
        self.routes.get(id.0)
    }

    pub(crate) fn route_at(&self, id: RouteId) -> &Route {
        &self.routes[id.0]
    }

    pub(crate) fn route_at_mut(&mut self, id: RouteId) -> &mut Route {
        &mut self.routes[id.0]
    }

    /// All registered routes, in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (RouteId, &Route)> {
        self.routes
            .iter()
            .enumerate()
            .map(|(i, route)| (RouteId(i), route))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.tree.is_empty()
    }

    /// Get named route if it exists.
    pub fn get_route_by_name(&self, name: &str) -> Option<&Route> {
        self.named.get(name).map(|id| &self.routes[id.0])
    }

    /// Add the route `id` to the name index under its current name.
    ///
    /// Fails like [`name_route`](Router::name_route) when the name is taken
    /// by a structurally different route.
    pub fn register_named(&mut self, id: RouteId) -> Result<(), Error> {
        let name = self.route_at(id).name().to_owned();
        self.name_route(id, &name)
    }

    /// Give the route `id` a name.
    ///
    /// The empty name means "unnamed" and never conflicts. Naming a route
    /// with a name already bound to a structurally equal route is a no-op;
    /// a structurally different one fails with
    /// [`Error::DuplicateNamedRoute`].
    pub fn name_route(&mut self, id: RouteId, name: &str) -> Result<(), Error> {
        if name.is_empty() {
            self.routes[id.0].set_name(String::new());
            return Ok(());
        }

        match self.named.entry(name.to_owned()) {
            Entry::Occupied(entry) => {
                let existing = *entry.get();
                if existing != id && !self.routes[existing.0].same_route(&self.routes[id.0]) {
                    warn!(route_name = name, "rejecting duplicate route name");
                    return Err(Error::DuplicateNamedRoute {
                        name: name.to_owned(),
                        existing: Box::new(self.routes[existing.0].clone()),
                        new: Box::new(self.routes[id.0].clone()),
                    });
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(id);
            }
        }

        self.routes[id.0].set_name(name.to_owned());
        Ok(())
    }

    /// Attach validators to parameter `name` of the route `id` and merge them
    /// into the tree nodes the route goes through.
    pub(crate) fn add_param_validators(&mut self, id: RouteId, name: &str, validators: &[Validator]) {
        let route = &mut self.routes[id.0];
        route.add_param_validators(name.to_owned(), validators);
        if !self.tree.merge_validators(route.segments(), name, validators) {
            warn!(route = route.readable_path(), "route branch missing from the tree");
        }
    }

    /// Register a locale variant of the route `id` at `path`.
    ///
    /// The variant redirects to the variant matching the request [`Locale`],
    /// or to the route `id` itself when there is none.
    pub fn localize(&mut self, id: RouteId, locale: &str, path: &str) -> Result<RouteId, Error> {
        let method = self.route_at(id).method().clone();
        let callback = Callback::Localized {
            parent: id,
            locale: locale.to_owned(),
        };
        let localized = self.register(Route::new(method, path, callback)?)?;
        self.routes[id.0].add_localized(locale.to_owned(), localized);
        Ok(localized)
    }

    /// Remove every route and name.
    pub fn unregister_all(&mut self) {
        self.tree = Node::default();
        self.routes.clear();
        self.named.clear();
        self.methods.clear();
    }

    /// Case-insensitive comparison of two literal paths.
    pub fn compare_paths<S: AsRef<str>, T: AsRef<str>>(a: &[S], b: &[T]) -> bool {
        path::compare_paths(a, b)
    }

    /// Compare the shape of two route paths, ignoring parameter names.
    pub fn compare_route_paths<S: AsRef<str>>(a: &[S], b: &[S]) -> bool {
        path::compare_route_paths(a, b)
    }

    /// If enabled, the router checks if another method is allowed for the
    /// current route, if the current request can not be routed.
    /// If this is the case, the request is answered with `MethodNotAllowed`
    /// and HTTP status code 405.
    /// If no other Method is allowed, the request is delegated to the `NotFound`
    /// handler.
    pub fn handle_method_not_allowed(&mut self, enabled: bool) -> &mut Self {
        self.handle_method_not_allowed = enabled;
        self
    }

    /// If enabled, the router automatically replies to `OPTIONS` requests.
    /// Custom `OPTIONS` handlers take priority over automatic replies.
    pub fn handle_options(&mut self, enabled: bool) -> &mut Self {
        self.handle_options = enabled;
        self
    }

    /// An optional handler that is called on automatic `OPTIONS` requests.
    /// The handler is only called if `handle_options` is true and no `OPTIONS`
    /// handler for the specific path was set.
    pub fn global_options(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.global_options = Some(Box::new(handler));
        self
    }

    /// Configurable handler which is called when no matching route is
    /// found.
    pub fn not_found(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.not_found = Some(Box::new(handler));
        self
    }

    /// A configurable handler which is called when a request
    /// cannot be routed and `handle_method_not_allowed` is true.
    pub fn method_not_allowed(&mut self, handler: impl Handler + 'static) -> &mut Self {
        self.method_not_allowed = Some(Box::new(handler));
        self
    }

    /// Returns a list of the allowed methods for a specific path
    /// ```rust
    /// use segrouter::{Callback, Router};
    /// use hyper::{Body, Request, Response};
    ///
    /// async fn home(_: Request<Body>) -> hyper::Result<Response<Body>> {
    ///     Ok(Response::new(Body::from("Welcome!")))
    /// }
    ///
    /// let mut router = Router::default();
    /// let home = Callback::function(home);
    /// router.get("/home", home.clone()).unwrap();
    /// router.post("/home", home).unwrap();
    ///
    /// let allowed = router.allowed("/home");
    /// assert!(allowed.contains(&"GET"));
    /// assert!(allowed.contains(&"POST"));
    /// assert!(allowed.contains(&"OPTIONS"));
    /// # assert_eq!(allowed.len(), 3);
    /// ```
    pub fn allowed(&self, path: &str) -> Vec<&str> {
        let segments = path::split(path);
        let mut allowed = self
            .methods
            .iter()
            .filter(|&method| method != Method::OPTIONS)
            .filter(|&method| {
                path == "*"
                    || matches!(
                        self.tree.find(method, &segments, &mut Params::new()),
                        Outcome::Found(_)
                    )
            })
            .map(Method::as_str)
            .collect::<Vec<_>>();

        if !allowed.is_empty() {
            allowed.push("OPTIONS");
        }

        allowed
    }
}

/// The default configuration: automatic `OPTIONS` replies and 405 responses
/// are enabled, unmatched requests get a plain 404.
impl Default for Router {
    fn default() -> Self {
        Self {
            tree: Node::default(),
            routes: Vec::new(),
            named: HashMap::new(),
            methods: Vec::new(),
            handle_method_not_allowed: true,
            handle_options: true,
            global_options: None,
            method_not_allowed: None,
            not_found: None,
        }
    }
}

#[doc(hidden)]
pub struct MakeRouterService(RouterService);

impl<T> Service<T> for MakeRouterService {
    type Response = RouterService;
    type Error = hyper::Error;
    type Future = future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _: T) -> Self::Future {
        let service = self.0.clone();
        future::ok(service)
    }
}

#[doc(hidden)]
#[derive(Clone)]
pub struct RouterService(Arc<Router>);

impl RouterService {
    fn new(router: Router) -> Self {
        RouterService(Arc::new(router))
    }
}

impl Service<Request<Body>> for RouterService {
    type Response = Response<Body>;
    type Error = hyper::Error;
    type Future = ResponseFut;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        self.0.serve(req)
    }
}

impl Router {
    /// Converts the `Router` into a `Service` which you can serve directly with `Hyper`.
    /// If you have an existing `Service` that you want to incorporate a `Router` into, see
    /// [`Router::serve`](crate::Router::serve).
    /// ```rust,no_run
    /// # use segrouter::Router;
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// // Our router...
    /// let router = Router::default();
    ///
    /// // Convert it into a service...
    /// let service = router.into_service();
    ///
    /// // Serve with hyper
    /// hyper::Server::bind(&([127, 0, 0, 1], 3030).into())
    ///     .serve(service)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn into_service(self) -> MakeRouterService {
        MakeRouterService(RouterService::new(self))
    }

    /// An asynchronous function from a `Request` to a `Response`.
    ///
    /// The matched route's middleware runs first, in order, then its
    /// handler. The request extensions carry the bound [`Params`] and the
    /// [`RouteId`]. Localized and alias routes answer with a redirect.
    pub fn serve(&self, mut req: Request<Body>) -> ResponseFut {
        let path = req.uri().path().to_owned();
        let segments = path::split(&path);
        let mut params = Params::new();

        let mut not_allowed = false;
        match self.find(req.method(), &segments, &mut params) {
            Ok(Some(id)) => {
                req.extensions_mut().insert(params);
                req.extensions_mut().insert(id);
                return self.dispatch(id, req);
            }
            Ok(None) => {}
            Err(err) => {
                debug!(%err, "request not routed");
                not_allowed = true;
            }
        }

        if req.method() == Method::OPTIONS && self.handle_options {
            let allow = self.allowed(&path);

            if !allow.is_empty() {
                return match self.global_options {
                    Some(ref handler) => ResponseFutKind::Boxed(handler.handle(req)).into(),
                    None => ResponseFutKind::Options(allow.join(", ")).into(),
                };
            }
        } else if self.handle_method_not_allowed && not_allowed {
            let allow = self.allowed(&path);

            if !allow.is_empty() {
                return match self.method_not_allowed {
                    Some(ref handler) => ResponseFutKind::Boxed(handler.handle(req)).into(),
                    None => ResponseFutKind::MethodNotAllowed(allow.join(", ")).into(),
                };
            }
        }

        match self.not_found {
            Some(ref handler) => ResponseFutKind::Boxed(handler.handle(req)).into(),
            None => ResponseFutKind::NotFound.into(),
        }
    }

    fn dispatch(&self, id: RouteId, mut req: Request<Body>) -> ResponseFut {
        let route = self.route_at(id);

        for middleware in route.middleware() {
            if let Err(response) = middleware.handle(&mut req) {
                return ResponseFutKind::Boxed(Box::pin(future::ok::<_, hyper::Error>(response))).into();
            }
        }

        if let Some(handler) = route.callback().handler() {
            return ResponseFutKind::Boxed(handler.handle(req)).into();
        }

        let locale = req.extensions().get::<Locale>().map(|locale| locale.0.as_str());
        let params = req.extensions().get::<Params>();
        let empty = Params::new();
        match self.redirect_location(route, params.unwrap_or(&empty), locale) {
            Some((location, code)) => ResponseFutKind::Redirect(location, code).into(),
            None => ResponseFutKind::NotFound.into(),
        }
    }
}

pub struct ResponseFut {
    kind: ResponseFutKind,
}

impl From<ResponseFutKind> for ResponseFut {
    fn from(kind: ResponseFutKind) -> Self {
        Self { kind }
    }
}

enum ResponseFutKind {
    Boxed(Pin<Box<dyn Future<Output = hyper::Result<Response<Body>>> + Send + Sync>>),
    Redirect(String, StatusCode),
    MethodNotAllowed(String),
    Options(String),
    NotFound,
}

impl Future for ResponseFut {
    type Output = hyper::Result<Response<Body>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let ready = match self.kind {
            ResponseFutKind::Boxed(ref mut fut) => ready!(fut.as_mut().poll(cx)),
            ResponseFutKind::Redirect(ref path, code) => Ok(Response::builder()
                .header(header::LOCATION, path.as_str())
                .status(code)
                .body(Body::empty())
                .unwrap_or_else(|_| status(StatusCode::INTERNAL_SERVER_ERROR))),
            ResponseFutKind::NotFound => Ok(status(StatusCode::NOT_FOUND)),
            ResponseFutKind::Options(ref allowed) => Ok(Response::builder()
                .header(header::ALLOW, allowed)
                .body(Body::empty())
                .unwrap()),
            ResponseFutKind::MethodNotAllowed(ref allowed) => Ok(Response::builder()
                .header(header::ALLOW, allowed)
                .status(StatusCode::METHOD_NOT_ALLOWED)
                .body(Body::empty())
                .unwrap()),
        };

        Poll::Ready(ready)
    }
}

fn status(code: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = code;
    response
}
