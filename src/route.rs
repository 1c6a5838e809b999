//! Routes and the builder returned by registration.

use crate::error::Error;
use crate::handler::{Callback, Middleware};
use crate::path::{self, Segment};
use crate::router::Router;
use crate::validator::{self, ParamValidator, Validator};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use hyper::Method;

/// Index of a route inside the [`Router`] that registered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub(crate) usize);

impl RouteId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A method and path bound to a callback.
#[derive(Clone)]
pub struct Route {
    method: Method,
    segments: Vec<Segment>,
    readable: String,
    name: String,
    callback: Callback,
    middleware: Vec<Arc<dyn Middleware>>,
    param_validators: HashMap<String, Vec<Validator>>,
    localized: HashMap<String, RouteId>,
}

impl Route {
    /// Compile `path` and build an unregistered route.
    pub fn new(method: Method, path: &str, callback: Callback) -> Result<Self, Error> {
        Ok(Self {
            method,
            segments: path::compile(path)?,
            readable: path.to_owned(),
            name: String::new(),
            callback,
            middleware: Vec::new(),
            param_validators: HashMap::new(),
            localized: HashMap::new(),
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The raw path segments, placeholders included.
    pub fn path(&self) -> Vec<&str> {
        self.segments.iter().map(Segment::raw).collect()
    }

    /// The path as it was passed at registration.
    pub fn readable_path(&self) -> &str {
        &self.readable
    }

    /// The route's name, empty when unnamed.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }

    pub fn param_validators(&self, name: &str) -> &[Validator] {
        self.param_validators
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Locale variants registered with [`RouteMut::localize`].
    pub fn localized(&self) -> &HashMap<String, RouteId> {
        &self.localized
    }

    /// Structural equality: same method, same path shape ignoring
    /// parameter names, and the same handler target.
    pub fn same_route(&self, other: &Route) -> bool {
        self.method == other.method
            && path::same_shape(&self.segments, &other.segments)
            && self.callback.same_target(&other.callback)
    }

    /// Attach validators for the parameter `name`. Only effective when done
    /// before registration; use [`RouteMut::param`] afterwards.
    pub fn with_param(mut self, name: impl Into<String>, validators: &[Validator]) -> Self {
        self.add_param_validators(name.into(), validators);
        self
    }

    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub(crate) fn add_param_validators(&mut self, name: String, validators: &[Validator]) {
        validator::merge(self.param_validators.entry(name).or_default(), validators);
    }

    pub(crate) fn add_middleware(&mut self, middleware: &[Arc<dyn Middleware>]) {
        self.middleware.extend(middleware.iter().cloned());
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn add_localized(&mut self, locale: String, id: RouteId) {
        self.localized.insert(locale, id);
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.readable)
            .field("name", &self.name)
            .field("callback", &self.callback)
            .field("middleware", &self.middleware.len())
            .field("localized", &self.localized)
            .finish()
    }
}

/// A registered route, still open for configuration.
///
/// Returned by [`Router::route`] and the per-method shorthands. Borrows the
/// router mutably until dropped.
/// ```rust
/// use segrouter::{Callback, Router, validator::Numeric};
/// use hyper::{Body, Request, Response};
///
/// async fn show(_: Request<Body>) -> hyper::Result<Response<Body>> {
///     Ok(Response::new(Body::empty()))
/// }
///
/// # fn main() -> Result<(), segrouter::Error> {
/// let mut router = Router::default();
/// router
///     .get("/users/{id}", Callback::function(show))?
///     .param("id", [Numeric])
///     .name("user-detail")?;
///
/// assert!(router.get_route_by_name("user-detail").is_some());
/// # Ok(())
/// # }
/// ```
pub struct RouteMut<'r> {
    router: &'r mut Router,
    id: RouteId,
}

impl<'r> RouteMut<'r> {
    pub(crate) fn new(router: &'r mut Router, id: RouteId) -> Self {
        Self { router, id }
    }

    pub fn id(&self) -> RouteId {
        self.id
    }

    pub fn route(&self) -> &Route {
        self.router.route_at(self.id)
    }

    /// Name the route. See [`Router::name_route`].
    pub fn name(mut self, name: &str) -> Result<Self, Error> {
        self.router.name_route(self.id, name)?;
        Ok(self)
    }

    /// Append middleware to the route.
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.router
            .route_at_mut(self.id)
            .add_middleware(&[Arc::new(middleware)]);
        self
    }

    /// Attach validators to the parameter `name`. The validators are also
    /// merged into the tree node backing the parameter.
    pub fn param<V, I>(self, name: &str, validators: I) -> Self
    where
        V: ParamValidator + 'static,
        I: IntoIterator<Item = V>,
    {
        let validators: Vec<Validator> = validators.into_iter().map(Validator::new).collect();
        self.validators(name, &validators)
    }

    /// Like [`param`](RouteMut::param), for validators already shared
    /// between routes.
    pub fn validators(mut self, name: &str, validators: &[Validator]) -> Self {
        self.router.add_param_validators(self.id, name, validators);
        self
    }

    /// Register a locale variant of this route under `path`.
    pub fn localize(mut self, locale: &str, path: &str) -> Result<Self, Error> {
        self.router.localize(self.id, locale, path)?;
        Ok(self)
    }
}
