//! Request handlers, handler identity and middleware.

use crate::route::RouteId;

use std::any::{type_name, TypeId};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use hyper::{Body, Request, Response};

/// Represents a HTTP handler function.
/// This trait is implemented for asynchronous functions that take a `Request` and return a
/// `Result<Response<Body>, hyper::Error>`
/// ```rust
/// # use segrouter::Handler;
/// # use hyper::{Request, Response, Body};
/// async fn hello(_: Request<Body>) -> Result<Response<Body>, hyper::Error> {
///     Ok(Response::new(Body::empty()))
/// }
///
/// let handler: Box<dyn Handler> = Box::new(hello);
/// ```
pub trait Handler: Send + Sync {
    fn handle(
        &self,
        req: Request<Body>,
    ) -> Pin<Box<dyn Future<Output = hyper::Result<Response<Body>>> + Send + Sync>>;
}

impl<F, R> Handler for F
where
    F: Fn(Request<Body>) -> R + Send + Sync,
    R: Future<Output = Result<Response<Body>, hyper::Error>> + Send + Sync + 'static,
{
    fn handle(
        &self,
        req: Request<Body>,
    ) -> Pin<Box<dyn Future<Output = hyper::Result<Response<Body>>> + Send + Sync>> {
        Box::pin(self(req))
    }
}

/// What a route does when it matches.
///
/// Two callbacks are the same target when:
/// - `Function`: they share the same allocation (clones of one `Callback`),
/// - `Method`: they name the same method on the same controller type,
/// - `Localized`: they redirect for the same parent route and locale,
/// - `Alias`: they redirect to the same route.
#[derive(Clone)]
pub enum Callback {
    /// A free-standing handler, compared by identity.
    Function(Arc<dyn Handler>),
    /// A handler bound to a controller method.
    Method {
        controller: TypeId,
        controller_name: &'static str,
        method: &'static str,
        handler: Arc<dyn Handler>,
    },
    /// Redirect to the locale variant of `parent` chosen by the request.
    Localized { parent: RouteId, locale: String },
    /// Permanent redirect to another route.
    Alias { target: RouteId },
}

impl Callback {
    /// Wrap a handler. Clone the returned value to register the same
    /// handler more than once.
    pub fn function(handler: impl Handler + 'static) -> Self {
        Callback::Function(Arc::new(handler))
    }

    /// Bind a handler to `C::method`.
    pub fn method<C: 'static>(method: &'static str, handler: impl Handler + 'static) -> Self {
        Callback::Method {
            controller: TypeId::of::<C>(),
            controller_name: type_name::<C>(),
            method,
            handler: Arc::new(handler),
        }
    }

    /// Handler identity comparison.
    pub fn same_target(&self, other: &Callback) -> bool {
        match (self, other) {
            (Callback::Function(a), Callback::Function(b)) => {
                // compare data pointers only, vtables may be duplicated across codegen units
                std::ptr::eq(
                    Arc::as_ptr(a) as *const u8,
                    Arc::as_ptr(b) as *const u8,
                )
            }
            (
                Callback::Method {
                    controller: a,
                    method: am,
                    ..
                },
                Callback::Method {
                    controller: b,
                    method: bm,
                    ..
                },
            ) => a == b && am == bm,
            (
                Callback::Localized {
                    parent: a,
                    locale: al,
                },
                Callback::Localized {
                    parent: b,
                    locale: bl,
                },
            ) => a == b && al == bl,
            (Callback::Alias { target: a }, Callback::Alias { target: b }) => a == b,
            _ => false,
        }
    }

    /// The handler to invoke, for callbacks that are not redirects.
    pub fn handler(&self) -> Option<&Arc<dyn Handler>> {
        match self {
            Callback::Function(handler) | Callback::Method { handler, .. } => Some(handler),
            Callback::Localized { .. } | Callback::Alias { .. } => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        self.handler().is_none()
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Function(_) => f.write_str("Closure()"),
            Callback::Method {
                controller_name,
                method,
                ..
            } => write!(f, "{}::{}()", controller_name, method),
            Callback::Localized { parent, locale } => {
                write!(f, "redirect to #{} [{}]", parent.index(), locale)
            }
            Callback::Alias { target } => write!(f, "redirect to #{}", target.index()),
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({})", self)
    }
}

/// Runs before the route handler.
///
/// Middleware on a route runs in the order it was attached. Returning
/// `Err(response)` stops the chain and sends `response` instead of calling
/// the handler.
/// ```rust
/// use segrouter::Middleware;
/// use hyper::{Body, Request, Response, StatusCode};
///
/// struct RequireToken;
///
/// impl Middleware for RequireToken {
///     fn handle(&self, req: &mut Request<Body>) -> Result<(), Response<Body>> {
///         if req.headers().contains_key("x-token") {
///             return Ok(());
///         }
///         let mut denied = Response::new(Body::empty());
///         *denied.status_mut() = StatusCode::FORBIDDEN;
///         Err(denied)
///     }
/// }
/// ```
pub trait Middleware: Send + Sync {
    fn handle(&self, req: &mut Request<Body>) -> Result<(), Response<Body>>;
}

impl<F> Middleware for F
where
    F: Fn(&mut Request<Body>) -> Result<(), Response<Body>> + Send + Sync,
{
    fn handle(&self, req: &mut Request<Body>) -> Result<(), Response<Body>> {
        self(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn index(_: Request<Body>) -> hyper::Result<Response<Body>> {
        Ok(Response::new(Body::empty()))
    }

    struct Users;
    struct Posts;

    #[test]
    fn functions_compare_by_identity() {
        let a = Callback::function(index);
        let b = Callback::function(index);
        assert!(a.same_target(&a.clone()));
        assert!(!a.same_target(&b));
    }

    #[test]
    fn methods_compare_by_controller_and_name() {
        let show = Callback::method::<Users>("show", index);
        assert!(show.same_target(&Callback::method::<Users>("show", index)));
        assert!(!show.same_target(&Callback::method::<Users>("list", index)));
        assert!(!show.same_target(&Callback::method::<Posts>("show", index)));
        assert!(!show.same_target(&Callback::function(index)));
    }

    #[test]
    fn display() {
        let show = Callback::method::<Users>("show", index);
        assert!(show.to_string().ends_with("Users::show()"));
        assert_eq!(Callback::function(index).to_string(), "Closure()");
    }
}
