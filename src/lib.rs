//! # SegRouter
//!
//! SegRouter is an HTTP request router built on a segment tree.
//!
//! Routes are split into `/`-delimited segments. Each segment is either a
//! literal, matched case-insensitively, or a placeholder that binds a path
//! parameter. Unlike radix routers with only explicit matches, several
//! placeholders may share a depth; the router disambiguates them at match
//! time with parameter validators and backtracks out of branches that do
//! not lead to a route.
//!
//! ## Features
//!
//! **Parameters and optional parameters:** `{id}` binds exactly one segment,
//! `[page]` and `[lang=cs]` may be left out of the request path, in which
//! case the default (if any) is bound.
//!
//! **Validators:** attach a [`ParamValidator`] to a parameter name to restrict
//! what it accepts. A branch whose validator rejects the segment is skipped
//! in favor of its siblings.
//!
//! **Duplicate detection:** registering a different handler for the same
//! method and path shape, or reusing a route name, fails at startup with an
//! [`Error`]. Registering the very same route twice is harmless.
//!
//! **Groups, names and redirects:** register routes under a shared prefix
//! with [`RouteGroup`], look them up by name, add localized variants that
//! redirect by request [`Locale`], or aliases that redirect permanently.
//!
//! **Dispatch:** [`Router::serve`] runs the matched route's [`Middleware`] and
//! handler, answers `OPTIONS` requests and sends `405 Method Not Allowed` with
//! an `Allow` header when the path exists for other methods only.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use segrouter::{Callback, Params, Router};
//! use hyper::{Body, Request, Response};
//!
//! async fn index(_: Request<Body>) -> hyper::Result<Response<Body>> {
//!     Ok(Response::new("Hello, World!".into()))
//! }
//!
//! async fn hello(req: Request<Body>) -> hyper::Result<Response<Body>> {
//!     let params = req.extensions().get::<Params>().unwrap();
//!     Ok(Response::new(format!("Hello, {}", params.get("user").unwrap()).into()))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut router = Router::default();
//!     router.get("/", Callback::function(index))?;
//!     router.get("/hello/{user}", Callback::function(hello))?;
//!
//!     hyper::Server::bind(&([127, 0, 0, 1], 3000).into())
//!         .serve(router.into_service())
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ### Optional parameters
//!
//! ```ignore
//! Pattern: /[lang=cs]/articles/[page]
//!
//!  /articles                 match: lang="cs"
//!  /en/articles              match: lang="en"
//!  /en/articles/2            match: lang="en", page="2"
//!  /articles/2               match: lang="cs", page="2"
//! ```
//!
//! Optional parameters are tried as left out first. Restrict them with a
//! validator when the following segment could be taken for their value.
//!
//! ### Not Found and Method Not Allowed handlers
//!
//! ```rust
//! use segrouter::Router;
//! use hyper::{Body, Request, Response};
//!
//! let mut router = Router::default();
//! router
//!     .handle_method_not_allowed(true)
//!     .not_found(|_: Request<Body>| async {
//!         Ok::<_, hyper::Error>(Response::builder()
//!             .status(404)
//!             .body(Body::from("nothing here"))
//!             .unwrap())
//!     });
//! ```

#![forbid(unsafe_code)]

pub mod controller;
pub mod error;
pub mod group;
pub mod handler;
pub mod params;
pub mod path;
pub mod redirect;
pub mod route;
pub mod validator;

#[doc(hidden)]
pub mod router;

mod tree;

#[doc(inline)]
pub use controller::{Action, Controller, Routes};
#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use group::RouteGroup;
#[doc(inline)]
pub use handler::{Callback, Handler, Middleware};
#[doc(inline)]
pub use params::{Param, Params};
#[doc(inline)]
pub use redirect::Locale;
#[doc(inline)]
pub use route::{Route, RouteId, RouteMut};
#[doc(inline)]
pub use router::Router;
#[doc(inline)]
pub use validator::{ParamValidator, Validator};

// test the code examples in README.md
#[cfg(doctest)]
mod test_readme {
    macro_rules! doc_comment {
        ($x:expr) => {
            #[doc = $x]
            extern "C" {}
        };
    }

    doc_comment!(include_str!("../README.md"));
}
