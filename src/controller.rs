//! Explicit route tables.
//!
//! A [`Controller`] lists the routes its methods serve as [`Action`]s;
//! [`Router::controller`] registers them all, with handler identity taken
//! from the controller type and method name. Free-standing route
//! definitions implement [`Routes`] and are registered with
//! [`Router::load`].

use crate::error::Error;
use crate::handler::{Callback, Handler};
use crate::route::RouteId;
use crate::router::Router;

use std::any::{type_name, TypeId};
use std::sync::Arc;

use hyper::Method;
use tracing::debug;

/// One route served by a controller method.
pub struct Action {
    method: Method,
    path: String,
    method_name: &'static str,
    name: Option<String>,
    handler: Arc<dyn Handler>,
}

impl Action {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        method_name: &'static str,
        handler: impl Handler + 'static,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            method_name,
            name: None,
            handler: Arc::new(handler),
        }
    }

    pub fn get(path: impl Into<String>, method_name: &'static str, handler: impl Handler + 'static) -> Self {
        Self::new(Method::GET, path, method_name, handler)
    }

    pub fn post(path: impl Into<String>, method_name: &'static str, handler: impl Handler + 'static) -> Self {
        Self::new(Method::POST, path, method_name, handler)
    }

    pub fn put(path: impl Into<String>, method_name: &'static str, handler: impl Handler + 'static) -> Self {
        Self::new(Method::PUT, path, method_name, handler)
    }

    pub fn delete(path: impl Into<String>, method_name: &'static str, handler: impl Handler + 'static) -> Self {
        Self::new(Method::DELETE, path, method_name, handler)
    }

    /// Register the route under `name` as well.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A type whose methods handle requests.
/// ```rust
/// use segrouter::{Action, Controller, Router};
/// use hyper::{Body, Method, Request, Response};
/// use std::sync::Arc;
///
/// struct Users {
///     greeting: String,
/// }
///
/// impl Users {
///     async fn show(&self, _: Request<Body>) -> hyper::Result<Response<Body>> {
///         Ok(Response::new(Body::from(self.greeting.clone())))
///     }
/// }
///
/// impl Controller for Users {
///     fn actions(self: Arc<Self>) -> Vec<Action> {
///         vec![Action::get("/users/{id}", "show", move |req: Request<Body>| {
///             let users = self.clone();
///             async move { users.show(req).await }
///         })
///         .name("user-detail")]
///     }
/// }
///
/// # fn main() -> Result<(), segrouter::Error> {
/// let mut router = Router::default();
/// router.controller(Arc::new(Users { greeting: "hi".into() }))?;
/// assert!(router.get_route_by_name("user-detail").is_some());
/// assert!(router.lookup(&Method::GET, "/users/1")?.is_some());
/// # Ok(())
/// # }
/// ```
pub trait Controller: Send + Sync + 'static {
    fn actions(self: Arc<Self>) -> Vec<Action>;
}

/// A set of route definitions that can be loaded into a router.
///
/// Implemented for functions taking the router:
/// ```rust
/// use segrouter::{Callback, Error, Router};
/// use hyper::{Body, Request, Response};
///
/// async fn health(_: Request<Body>) -> hyper::Result<Response<Body>> {
///     Ok(Response::new(Body::empty()))
/// }
///
/// fn api(router: &mut Router) -> Result<(), Error> {
///     router.get("/health", Callback::function(health))?;
///     Ok(())
/// }
///
/// # fn main() -> Result<(), Error> {
/// let mut router = Router::default();
/// router.load(api)?;
/// # Ok(())
/// # }
/// ```
pub trait Routes {
    fn register(&self, router: &mut Router) -> Result<(), Error>;
}

impl<F> Routes for F
where
    F: Fn(&mut Router) -> Result<(), Error>,
{
    fn register(&self, router: &mut Router) -> Result<(), Error> {
        self(router)
    }
}

impl Router {
    /// Register every action of `controller`.
    pub fn controller<C: Controller>(&mut self, controller: Arc<C>) -> Result<Vec<RouteId>, Error> {
        let mut ids = Vec::new();
        for action in controller.actions() {
            let callback = Callback::Method {
                controller: TypeId::of::<C>(),
                controller_name: type_name::<C>(),
                method: action.method_name,
                handler: action.handler,
            };
            let mut route = self.route(action.method, &action.path, callback)?;
            if let Some(name) = action.name {
                route = route.name(&name)?;
            }
            ids.push(route.id());
        }

        debug!(controller = type_name::<C>(), routes = ids.len(), "controller loaded");
        Ok(ids)
    }

    /// Register the routes defined by `source`.
    pub fn load(&mut self, source: impl Routes) -> Result<&mut Self, Error> {
        let before = self.len();
        source.register(self)?;
        debug!(routes = self.len() - before, "routes loaded");
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Numeric;
    use hyper::{Body, Request, Response};

    struct Articles;

    impl Articles {
        async fn list(&self, _: Request<Body>) -> hyper::Result<Response<Body>> {
            Ok(Response::new(Body::from("list")))
        }
    }

    impl Controller for Articles {
        fn actions(self: Arc<Self>) -> Vec<Action> {
            let list = move |req: Request<Body>| {
                let articles = self.clone();
                async move { articles.list(req).await }
            };
            vec![
                Action::get("/articles", "list", list.clone()).name("articles"),
                Action::get("/articles/{id}", "show", list.clone()),
                Action::post("/articles", "create", list),
            ]
        }
    }

    #[test]
    fn controller_actions_are_registered() {
        let mut router = Router::default();
        let ids = router.controller(Arc::new(Articles)).unwrap();
        assert_eq!(ids.len(), 3);

        let named = router.get_route_by_name("articles").unwrap();
        assert_eq!(named.method(), Method::GET);
        assert!(named.callback().to_string().ends_with("Articles::list()"));
    }

    #[test]
    fn reloading_a_controller_is_idempotent() {
        let mut router = Router::default();
        let first = router.controller(Arc::new(Articles)).unwrap();
        let second = router.controller(Arc::new(Articles)).unwrap();
        assert_eq!(first, second);
        assert_eq!(router.len(), 3);
    }

    async fn other(_: Request<Body>) -> hyper::Result<Response<Body>> {
        Ok(Response::new(Body::empty()))
    }

    fn conflicting(router: &mut Router) -> Result<(), Error> {
        router.get("/articles", Callback::function(other))?;
        Ok(())
    }

    fn numeric_ids(router: &mut Router) -> Result<(), Error> {
        router
            .get("/articles/{id}/comments", Callback::function(other))?
            .param("id", [Numeric]);
        Ok(())
    }

    #[test]
    fn load_route_sources() {
        let mut router = Router::default();
        router.controller(Arc::new(Articles)).unwrap();
        router.load(numeric_ids).unwrap();
        assert!(router
            .lookup(&Method::GET, "/articles/1/comments")
            .unwrap()
            .is_some());

        let err = router.load(conflicting).err().unwrap();
        assert!(matches!(err, Error::DuplicateRoute { .. }));
    }
}
