//! Errors raised while registering and matching routes.
//!
//! Registration errors (`Configuration`, `DuplicateRoute`,
//! `DuplicateNamedRoute`) are fatal and meant to abort startup.
//! `MethodNotAllowed` is the only error produced at match time; a path that
//! simply does not exist is reported as `Ok(None)`, not as an error.

use crate::route::Route;

use hyper::Method;
use thiserror::Error;

/// Errors produced by the router.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed path syntax, a missing redirect target, or builder
    /// operations called out of order.
    #[error("invalid route configuration: {0}")]
    Configuration(String),

    /// The same method and path shape is already bound to a structurally
    /// different route.
    #[error("duplicate route \"{} {}\"", .existing.method(), .existing.readable_path())]
    DuplicateRoute {
        /// The route already stored in the tree.
        existing: Box<Route>,
        /// The route whose registration was rejected.
        new: Box<Route>,
    },

    /// The name is already bound to a structurally different route.
    #[error("duplicate named route \"{name}: {} {}\"", .existing.method(), .existing.readable_path())]
    DuplicateNamedRoute {
        name: String,
        existing: Box<Route>,
        new: Box<Route>,
    },

    /// The path exists, but not for the requested method.
    #[error("method {method} is not allowed for path /{path}")]
    MethodNotAllowed { method: Method, path: String },
}

impl Error {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Both routes involved in a duplicate registration, existing first.
    pub fn routes(&self) -> Option<(&Route, &Route)> {
        match self {
            Error::DuplicateRoute { existing, new }
            | Error::DuplicateNamedRoute { existing, new, .. } => Some((&**existing, &**new)),
            _ => None,
        }
    }

    /// One line per conflicting route: method, path and handler.
    pub fn routes_printed(&self) -> Option<String> {
        self.routes().map(|(existing, new)| {
            format!(
                "{} {} {}\n{} {} {}\n",
                existing.method(),
                existing.readable_path(),
                existing.callback(),
                new.method(),
                new.readable_path(),
                new.callback(),
            )
        })
    }
}
