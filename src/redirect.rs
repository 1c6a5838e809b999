//! Redirect targets for localized and alias routes.
//!
//! A localized route answers `300 Multiple Choices` pointing at the variant
//! of its parent route for the request [`Locale`], falling back to the parent
//! itself. An alias answers `308 Permanent Redirect` pointing at its target.
//! The `Location` is built from the target's path with the request
//! parameters substituted for its placeholders.

use crate::handler::Callback;
use crate::params::Params;
use crate::path::Segment;
use crate::route::Route;
use crate::router::Router;

use hyper::StatusCode;

/// The locale of a request. Insert it into the request extensions before
/// [`Router::serve`] to pick the variant localized routes redirect to.
/// ```rust
/// use segrouter::Locale;
/// use hyper::{Body, Request};
///
/// let mut req = Request::new(Body::empty());
/// req.extensions_mut().insert(Locale("en".to_owned()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale(pub String);

impl Router {
    /// Location and status code for a redirect route, `None` for routes
    /// with a handler.
    pub fn redirect_location(
        &self,
        route: &Route,
        params: &Params,
        locale: Option<&str>,
    ) -> Option<(String, StatusCode)> {
        match route.callback() {
            Callback::Localized { parent, .. } => {
                let parent = self.route_by_id(*parent)?;
                let target = locale
                    .and_then(|locale| parent.localized().get(locale))
                    .and_then(|&id| self.route_by_id(id))
                    .unwrap_or(parent);
                Some((fill(target, params), StatusCode::MULTIPLE_CHOICES))
            }
            Callback::Alias { target } => {
                let target = self.route_by_id(*target)?;
                Some((fill(target, params), StatusCode::PERMANENT_REDIRECT))
            }
            Callback::Function(_) | Callback::Method { .. } => None,
        }
    }
}

/// Render the path of `route` with `params` substituted.
///
/// Required placeholders without a value are left as written. Optional ones
/// fall back to their default and are dropped when there is none.
pub fn fill(route: &Route, params: &Params) -> String {
    let mut location = String::new();
    for segment in route.segments() {
        let value = match segment {
            Segment::Static(raw) => Some(raw.as_str()),
            Segment::Param { raw, name } => Some(params.get(name).unwrap_or(raw)),
            Segment::Optional { name, default, .. } => params
                .get(name)
                .or(default.as_deref())
                .filter(|value| !value.is_empty()),
        };
        if let Some(value) = value {
            location.push('/');
            location.push_str(value);
        }
    }

    if location.is_empty() {
        location.push('/');
    }
    location
}
