//! Route groups: a shared path prefix plus middleware and parameter
//! validators applied to every route registered through the group.

use crate::error::Error;
use crate::handler::{Callback, Middleware};
use crate::path;
use crate::route::RouteId;
use crate::router::Router;
use crate::validator::{self, ParamValidator, Validator};

use std::collections::HashMap;
use std::sync::Arc;

use hyper::Method;

/// Registers routes under a common prefix.
///
/// Builder calls apply to the route registered last (the active route).
/// Before the first route is registered, [`middleware`](RouteGroup::middleware)
/// and [`param`](RouteGroup::param) apply to the whole group instead.
/// ```rust
/// use segrouter::{Callback, Router};
/// use hyper::{Body, Request, Response};
///
/// async fn list(_: Request<Body>) -> hyper::Result<Response<Body>> {
///     Ok(Response::new(Body::empty()))
/// }
///
/// # fn main() -> Result<(), segrouter::Error> {
/// let mut router = Router::default();
/// router
///     .group("/admin")
///     .get("/", Callback::function(list))?
///     .name("admin")?
///     .group("users")
///     .get("{id}", Callback::function(list))?
///     .end_group()?
///     .post("/", Callback::function(list))?;
///
/// assert!(router.lookup(&hyper::Method::GET, "/admin/users/1")?.is_some());
/// assert!(router.lookup(&hyper::Method::POST, "/admin")?.is_some());
/// # Ok(())
/// # }
/// ```
pub struct RouteGroup<'r> {
    router: &'r mut Router,
    frames: Vec<Frame>,
    current: usize,
}

#[derive(Default)]
struct Frame {
    path: String,
    parent: Option<usize>,
    middleware: Vec<Arc<dyn Middleware>>,
    validators: HashMap<String, Vec<Validator>>,
    groups: Vec<usize>,
    routes: Vec<RouteId>,
    active: Option<RouteId>,
}

impl<'r> RouteGroup<'r> {
    pub(crate) fn new(router: &'r mut Router, prefix: &str) -> Self {
        Self {
            router,
            frames: vec![Frame {
                path: prefix.to_owned(),
                ..Frame::default()
            }],
            current: 0,
        }
    }

    fn frame(&self) -> &Frame {
        &self.frames[self.current]
    }

    /// The prefix of the current group, including the prefixes of its
    /// parents.
    pub fn path(&self) -> &str {
        &self.frame().path
    }

    /// The route registered last in the current group.
    pub fn active(&self) -> Option<RouteId> {
        self.frame().active
    }

    /// Register a route at `path` relative to the group prefix.
    pub fn route(mut self, method: Method, path: &str, callback: Callback) -> Result<Self, Error> {
        let full = path::join(&self.frame().path, path);
        let id = self.router.route(method, &full, callback)?.id();

        let frame = &mut self.frames[self.current];
        self.router.route_at_mut(id).add_middleware(&frame.middleware);
        for (name, validators) in &frame.validators {
            self.router.add_param_validators(id, name, validators);
        }
        frame.routes.push(id);
        frame.active = Some(id);
        Ok(self)
    }

    pub fn get(self, path: &str, callback: Callback) -> Result<Self, Error> {
        self.route(Method::GET, path, callback)
    }

    pub fn head(self, path: &str, callback: Callback) -> Result<Self, Error> {
        self.route(Method::HEAD, path, callback)
    }

    pub fn options(self, path: &str, callback: Callback) -> Result<Self, Error> {
        self.route(Method::OPTIONS, path, callback)
    }

    pub fn post(self, path: &str, callback: Callback) -> Result<Self, Error> {
        self.route(Method::POST, path, callback)
    }

    pub fn put(self, path: &str, callback: Callback) -> Result<Self, Error> {
        self.route(Method::PUT, path, callback)
    }

    pub fn patch(self, path: &str, callback: Callback) -> Result<Self, Error> {
        self.route(Method::PATCH, path, callback)
    }

    pub fn delete(self, path: &str, callback: Callback) -> Result<Self, Error> {
        self.route(Method::DELETE, path, callback)
    }

    fn require_active(&self, operation: &str) -> Result<RouteId, Error> {
        self.frame().active.ok_or_else(|| {
            Error::configuration(format!(
                "cannot call RouteGroup::{}() without first creating a route in the group",
                operation
            ))
        })
    }

    /// Name the active route.
    pub fn name(mut self, name: &str) -> Result<Self, Error> {
        let id = self.require_active("name")?;
        self.router.name_route(id, name)?;
        Ok(self)
    }

    /// Register a locale variant of the active route.
    pub fn localize(mut self, locale: &str, path: &str) -> Result<Self, Error> {
        let id = self.require_active("localize")?;
        self.router.localize(id, locale, path)?;
        Ok(self)
    }

    /// Add middleware to the active route, or to the whole group when no
    /// route was registered yet.
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        let middleware: Arc<dyn Middleware> = Arc::new(middleware);
        let active = self.frame().active;
        match active {
            Some(id) => {
                self.router.route_at_mut(id).add_middleware(&[middleware]);
                self
            }
            None => self.shared_middleware(middleware),
        }
    }

    /// Add middleware to every route of the group, existing or future, and
    /// to all nested groups.
    pub fn middleware_all(self, middleware: impl Middleware + 'static) -> Self {
        self.shared_middleware(Arc::new(middleware))
    }

    fn shared_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        let shared = [middleware];
        let mut pending = vec![self.current];
        while let Some(index) = pending.pop() {
            let frame = &mut self.frames[index];
            for &id in &frame.routes {
                self.router.route_at_mut(id).add_middleware(&shared);
            }
            frame.middleware.extend(shared.iter().cloned());
            pending.extend(frame.groups.iter().copied());
        }
        self
    }

    /// Validate parameter `name` on the active route, or on every route of
    /// the group when no route was registered yet.
    pub fn param<V, I>(mut self, name: &str, validators: I) -> Self
    where
        V: ParamValidator + 'static,
        I: IntoIterator<Item = V>,
    {
        let validators: Vec<Validator> = validators.into_iter().map(Validator::new).collect();
        let active = self.frame().active;
        match active {
            Some(id) => {
                self.router.add_param_validators(id, name, &validators);
                self
            }
            None => self.shared_validators(name, validators),
        }
    }

    /// Validate parameter `name` on every route of the group, existing or
    /// future, and on all nested groups.
    pub fn param_all<V, I>(self, name: &str, validators: I) -> Self
    where
        V: ParamValidator + 'static,
        I: IntoIterator<Item = V>,
    {
        let validators = validators.into_iter().map(Validator::new).collect();
        self.shared_validators(name, validators)
    }

    fn shared_validators(mut self, name: &str, validators: Vec<Validator>) -> Self {
        let mut pending = vec![self.current];
        while let Some(index) = pending.pop() {
            let frame = &mut self.frames[index];
            for &id in &frame.routes {
                self.router.add_param_validators(id, name, &validators);
            }
            validator::merge(frame.validators.entry(name.to_owned()).or_default(), &validators);
            pending.extend(frame.groups.iter().copied());
        }
        self
    }

    /// Open a nested group under `path`. The nested group starts with the
    /// middleware of the current one.
    pub fn group(mut self, path: &str) -> Self {
        let parent = self.frame();
        let frame = Frame {
            path: path::join(&parent.path, path),
            parent: Some(self.current),
            middleware: parent.middleware.clone(),
            ..Frame::default()
        };

        let index = self.frames.len();
        self.frames.push(frame);
        self.frames[self.current].groups.push(index);
        self.current = index;
        self
    }

    /// Close the current group and continue with its parent.
    pub fn end_group(mut self) -> Result<Self, Error> {
        let parent = self.frame().parent;
        match parent {
            Some(parent) => {
                self.current = parent;
                Ok(self)
            }
            None => Err(Error::configuration(
                "cannot end group, because it has no parent",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Numeric;
    use hyper::{Body, Request, Response};

    async fn action(_: Request<Body>) -> hyper::Result<Response<Body>> {
        Ok(Response::new(Body::empty()))
    }

    struct Dummy;

    fn dummy(name: &'static str) -> Callback {
        Callback::method::<Dummy>(name, action)
    }

    fn pass(_: &mut Request<Body>) -> Result<(), Response<Body>> {
        Ok(())
    }

    #[test]
    fn path() {
        let mut router = Router::default();
        let group = router.group("path");
        assert_eq!(group.path(), "path");
        assert_eq!(group.group("nested").path(), "path/nested");
    }

    #[test]
    fn group_routes_and_names() {
        let mut router = Router::default();
        router
            .group("/grouped")
            .get("/", dummy("action"))
            .unwrap()
            .name("grouped-get")
            .unwrap()
            .post("/", dummy("action"))
            .unwrap()
            .get("hello", dummy("action"))
            .unwrap()
            .name("grouped-get-hello")
            .unwrap()
            .get("{id}", dummy("actionWithParams"))
            .unwrap()
            .name("grouped-get-id")
            .unwrap()
            .delete("{id}", dummy("actionWithParams"))
            .unwrap()
            .put("{id}/aaa", dummy("actionWithParams"))
            .unwrap();

        let cases = [
            (Method::GET, "/grouped", "grouped-get"),
            (Method::POST, "/grouped", ""),
            (Method::GET, "/grouped/hello", "grouped-get-hello"),
            (Method::GET, "/grouped/1", "grouped-get-id"),
            (Method::DELETE, "/grouped/99", ""),
            (Method::PUT, "/grouped/1/aaa", ""),
        ];
        for (method, path, name) in cases {
            let (route, _) = router.lookup(&method, path).unwrap().unwrap();
            assert_eq!(route.name(), name, "{} {}", method, path);
        }
    }

    #[test]
    fn name_without_route() {
        let mut router = Router::default();
        let err = router.group("").name("asda").err().unwrap();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("RouteGroup::name()"));

        let err = router.group("").localize("en", "/x").err().unwrap();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn nested_groups() {
        let mut router = Router::default();
        router
            .group("parent")
            .get("/", dummy("action"))
            .unwrap()
            .group("nested1")
            .get("/", dummy("action"))
            .unwrap()
            .end_group()
            .unwrap()
            .group("nested2")
            .post("/", dummy("action"))
            .unwrap()
            .group("more")
            .get("/", dummy("action"))
            .unwrap()
            .get("{id}", dummy("actionWithParams"))
            .unwrap();

        let cases = [
            (Method::GET, "/parent"),
            (Method::GET, "/parent/nested1"),
            (Method::POST, "/parent/nested2"),
            (Method::GET, "/parent/nested2/more"),
            (Method::GET, "/parent/nested2/more/1"),
        ];
        for (method, path) in cases {
            assert!(router.lookup(&method, path).unwrap().is_some(), "{}", path);
        }
    }

    #[test]
    fn end_root_group() {
        let mut router = Router::default();
        let err = router.group("parent").end_group().err().unwrap();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn middleware_scopes() {
        let mut router = Router::default();
        router
            .group("/api")
            .middleware(pass)
            .get("/a", dummy("a"))
            .unwrap()
            .middleware(pass)
            .group("v1")
            .get("/b", dummy("b"))
            .unwrap()
            .end_group()
            .unwrap()
            .middleware_all(pass);

        let (a, _) = router.lookup(&Method::GET, "/api/a").unwrap().unwrap();
        // group-wide, active route, then group-wide again
        assert_eq!(a.middleware().len(), 3);
        let (b, _) = router.lookup(&Method::GET, "/api/v1/b").unwrap().unwrap();
        // inherited snapshot, then propagated
        assert_eq!(b.middleware().len(), 2);
    }

    #[test]
    fn group_validators() {
        let mut router = Router::default();
        router
            .group("/items")
            .param("id", [Numeric])
            .get("{id}", dummy("show"))
            .unwrap()
            .get("{id}/edit", dummy("edit"))
            .unwrap();

        assert!(router.lookup(&Method::GET, "/items/12").unwrap().is_some());
        assert!(router.lookup(&Method::GET, "/items/abc").unwrap().is_none());
        assert!(router.lookup(&Method::GET, "/items/abc/edit").unwrap().is_none());

        let (route, _) = router.lookup(&Method::GET, "/items/1/edit").unwrap().unwrap();
        assert_eq!(route.param_validators("id").len(), 1);
    }

    #[test]
    fn param_all_reaches_nested_groups() {
        let mut router = Router::default();
        router
            .group("/shop")
            .group("orders")
            .get("{id}", dummy("order"))
            .unwrap()
            .end_group()
            .unwrap()
            .param_all("id", [Numeric]);

        assert!(router.lookup(&Method::GET, "/shop/orders/x").unwrap().is_none());
        assert!(router.lookup(&Method::GET, "/shop/orders/9").unwrap().is_some());
    }

    #[test]
    fn param_all_reaches_existing_routes() {
        let mut router = Router::default();
        router
            .group("/posts")
            .get("{id}", dummy("show"))
            .unwrap()
            .param_all("id", [Numeric]);

        assert!(router.lookup(&Method::GET, "/posts/abc").unwrap().is_none());
        assert!(router.lookup(&Method::GET, "/posts/3").unwrap().is_some());
    }
}
