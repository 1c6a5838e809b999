//! The segment tree backing a [`Router`](crate::Router).
//!
//! Every node holds three kinds of children:
//! ```ignore
//!  statics   lowercased literal segment -> node
//!  params    placeholder nodes, in declaration order
//!  methods   HTTP method -> route (the leaves)
//! ```
//! Placeholders are keyed by their lowercased raw text, so `{id}` and
//! `{objId}` at the same depth are two sibling parameter nodes while two
//! routes both using `{id}` share one.
//!
//! Matching is a depth-first search. A static child always wins over the
//! parameter siblings at the same depth. Parameter siblings are tried in
//! order and every failed branch rolls its bindings back. Optional
//! parameters are first tried as skipped (with their default bound) and
//! only then as consuming the current segment.

use crate::params::Params;
use crate::path::Segment;
use crate::route::{Route, RouteId};
use crate::validator::{self, Validator};

use std::borrow::Cow;
use std::collections::HashMap;

use hyper::Method;

#[derive(Debug, Default)]
pub(crate) struct Node {
    statics: HashMap<String, Node>,
    params: Vec<ParamNode>,
    methods: HashMap<Method, RouteId>,
}

#[derive(Debug)]
pub(crate) struct ParamNode {
    key: String,
    name: String,
    optional: bool,
    default: Option<String>,
    validators: Vec<Validator>,
    children: Node,
}

/// Result of walking a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Found(RouteId),
    /// A node was reached that serves other methods only.
    MethodNotAllowed,
    NotFound,
}

impl Outcome {
    /// Keep the more specific of two outcomes.
    fn or(self, other: Outcome) -> Outcome {
        match (self, other) {
            (found @ Outcome::Found(_), _) | (_, found @ Outcome::Found(_)) => found,
            (Outcome::MethodNotAllowed, _) | (_, Outcome::MethodNotAllowed) => {
                Outcome::MethodNotAllowed
            }
            _ => Outcome::NotFound,
        }
    }

    fn is_found(self) -> bool {
        matches!(self, Outcome::Found(_))
    }
}

impl Node {
    pub(crate) fn is_empty(&self) -> bool {
        self.statics.is_empty() && self.params.is_empty() && self.methods.is_empty()
    }

    /// Create the branch for `route`, merging the route's parameter
    /// validators into the placeholder nodes along the way, and return the
    /// method leaves at its end.
    pub(crate) fn leaves_mut(&mut self, route: &Route) -> &mut HashMap<Method, RouteId> {
        let mut node = self;
        for segment in route.segments() {
            node = match segment {
                Segment::Static(_) => node.statics.entry(segment.key()).or_default(),
                Segment::Param { name, .. } | Segment::Optional { name, .. } => {
                    let param = node.param_entry(segment);
                    validator::merge(&mut param.validators, route.param_validators(name));
                    &mut param.children
                }
            };
        }
        &mut node.methods
    }

    fn param_entry(&mut self, segment: &Segment) -> &mut ParamNode {
        let key = segment.key();
        let index = match self.params.iter().position(|param| param.key == key) {
            Some(index) => index,
            None => {
                let (name, optional, default) = match segment {
                    Segment::Optional { name, default, .. } => (name, true, default.clone()),
                    Segment::Param { name, .. } => (name, false, None),
                    Segment::Static(raw) => (raw, false, None),
                };
                self.params.push(ParamNode {
                    key,
                    name: name.clone(),
                    optional,
                    default,
                    validators: Vec::new(),
                    children: Node::default(),
                });
                self.params.len() - 1
            }
        };
        &mut self.params[index]
    }

    /// Merge `validators` into every placeholder named `name` along an
    /// already registered branch. Returns false if the branch does not exist.
    pub(crate) fn merge_validators(
        &mut self,
        segments: &[Segment],
        name: &str,
        validators: &[Validator],
    ) -> bool {
        let mut node = self;
        for segment in segments {
            let key = segment.key();
            node = match segment {
                Segment::Static(_) => match node.statics.get_mut(&key) {
                    Some(child) => child,
                    None => return false,
                },
                _ => match node.params.iter_mut().find(|param| param.key == key) {
                    Some(param) => {
                        if param.name == name {
                            validator::merge(&mut param.validators, validators);
                        }
                        &mut param.children
                    }
                    None => return false,
                },
            };
        }
        true
    }

    /// Find the route for `method` along `segments`.
    ///
    /// Bindings are appended to `params`; unless a route is found, `params`
    /// is left as it was on entry.
    pub(crate) fn find<S: AsRef<str>>(
        &self,
        method: &Method,
        segments: &[S],
        params: &mut Params,
    ) -> Outcome {
        let entry = params.len();
        let outcome = self.walk(method, segments, params);
        if !outcome.is_found() {
            params.truncate(entry);
        }
        outcome
    }

    fn walk<S: AsRef<str>>(&self, method: &Method, segments: &[S], params: &mut Params) -> Outcome {
        let (value, rest) = match segments.split_first() {
            Some((value, rest)) => (value.as_ref(), rest),
            None => return self.terminal(method, segments, params),
        };

        if let Some(child) = self.statics.get(&*lowercase(value)) {
            return child.walk(method, rest, params);
        }

        let mut outcome = Outcome::NotFound;
        for param in &self.params {
            let attempt = if param.optional {
                param.resolve_optional(method, segments, params)
            } else {
                param.bind(method, value, rest, params)
            };
            outcome = outcome.or(attempt);
            if outcome.is_found() {
                break;
            }
        }
        outcome
    }

    /// All segments are consumed: optional children may still match with
    /// their defaults, otherwise the method leaf at this node decides.
    fn terminal<S: AsRef<str>>(
        &self,
        method: &Method,
        segments: &[S],
        params: &mut Params,
    ) -> Outcome {
        let mut outcome = Outcome::NotFound;
        for param in self.params.iter().filter(|param| param.optional) {
            outcome = outcome.or(param.resolve_optional(method, segments, params));
            if outcome.is_found() {
                return outcome;
            }
        }

        if let Some(&id) = self.methods.get(method) {
            return Outcome::Found(id);
        }
        if !self.methods.is_empty() {
            return outcome.or(Outcome::MethodNotAllowed);
        }
        outcome
    }
}

impl ParamNode {
    fn validate(&self, value: &str) -> bool {
        self.validators.iter().all(|validator| validator.validate(value))
    }

    fn bind<S: AsRef<str>>(
        &self,
        method: &Method,
        value: &str,
        rest: &[S],
        params: &mut Params,
    ) -> Outcome {
        if !self.validate(value) {
            return Outcome::NotFound;
        }

        let mark = params.len();
        params.insert(self.name.as_str(), value);
        let outcome = self.children.walk(method, rest, params);
        if !outcome.is_found() {
            params.truncate(mark);
        }
        outcome
    }

    /// Try the optional parameter as skipped first, then as consuming the
    /// next segment.
    fn resolve_optional<S: AsRef<str>>(
        &self,
        method: &Method,
        segments: &[S],
        params: &mut Params,
    ) -> Outcome {
        let mark = params.len();

        if let Some(default) = self.default.as_deref().filter(|d| !d.is_empty()) {
            params.insert(self.name.as_str(), default);
        }
        let skipped = self.children.walk(method, segments, params);
        if skipped.is_found() {
            return skipped;
        }
        params.truncate(mark);

        match segments.split_first() {
            Some((value, rest)) => skipped.or(self.bind(method, value.as_ref(), rest, params)),
            None => skipped,
        }
    }
}

fn lowercase(value: &str) -> Cow<'_, str> {
    if value.chars().any(char::is_uppercase) {
        Cow::Owned(value.to_lowercase())
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Callback;
    use crate::validator::{Numeric, OneOf};

    use hyper::{Body, Request, Response};

    async fn noop(_: Request<Body>) -> hyper::Result<Response<Body>> {
        Ok(Response::new(Body::empty()))
    }

    fn insert(tree: &mut Node, method: Method, path: &str, id: usize) {
        let route = Route::new(method.clone(), path, Callback::function(noop)).unwrap();
        tree.leaves_mut(&route).insert(method, RouteId(id));
    }

    fn find(tree: &Node, method: Method, path: &str) -> (Outcome, Params) {
        let mut params = Params::new();
        let segments = crate::path::split(path);
        (tree.find(&method, &segments, &mut params), params)
    }

    #[test]
    fn static_segments_ignore_case() {
        let mut tree = Node::default();
        insert(&mut tree, Method::GET, "/Users/List", 0);

        assert_eq!(find(&tree, Method::GET, "/users/list").0, Outcome::Found(RouteId(0)));
        assert_eq!(find(&tree, Method::GET, "/USERS/LIST").0, Outcome::Found(RouteId(0)));
    }

    #[test]
    fn static_beats_parameter() {
        let mut tree = Node::default();
        insert(&mut tree, Method::GET, "/users/{id}", 0);
        insert(&mut tree, Method::GET, "/users/new", 1);

        let (outcome, params) = find(&tree, Method::GET, "/users/new");
        assert_eq!(outcome, Outcome::Found(RouteId(1)));
        assert!(params.is_empty());

        let (outcome, params) = find(&tree, Method::GET, "/users/7");
        assert_eq!(outcome, Outcome::Found(RouteId(0)));
        assert_eq!(params.get("id"), Some("7"));
    }

    #[test]
    fn method_not_allowed_only_on_nodes_with_leaves() {
        let mut tree = Node::default();
        insert(&mut tree, Method::GET, "/settings/modes", 0);

        assert_eq!(find(&tree, Method::POST, "/settings/modes").0, Outcome::MethodNotAllowed);
        assert_eq!(find(&tree, Method::GET, "/settings").0, Outcome::NotFound);
        assert_eq!(find(&tree, Method::GET, "/missing").0, Outcome::NotFound);
    }

    #[test]
    fn siblings_backtrack_and_roll_back_params() {
        let mut tree = Node::default();
        insert(&mut tree, Method::GET, "/a/{x}/b", 0);
        insert(&mut tree, Method::GET, "/a/{y}/c", 1);

        let (outcome, params) = find(&tree, Method::GET, "/a/1/c");
        assert_eq!(outcome, Outcome::Found(RouteId(1)));
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("y"), Some("1"));
        assert_eq!(params.get("x"), None);
    }

    #[test]
    fn method_not_allowed_does_not_stop_sibling_search() {
        let mut tree = Node::default();
        insert(&mut tree, Method::GET, "/a/{x}", 0);
        insert(&mut tree, Method::POST, "/a/{y}", 1);

        let (outcome, params) = find(&tree, Method::POST, "/a/1");
        assert_eq!(outcome, Outcome::Found(RouteId(1)));
        assert_eq!(params.get("y"), Some("1"));
    }

    #[test]
    fn failed_match_restores_params() {
        let mut tree = Node::default();
        insert(&mut tree, Method::GET, "/a/{x}/b", 0);

        let mut params = Params::new();
        params.insert("existing", "1");
        let outcome = tree.find(&Method::GET, &["a", "2", "c"], &mut params);
        assert_eq!(outcome, Outcome::NotFound);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn validators_merge_into_shared_node() {
        let mut tree = Node::default();
        let numeric = Validator::new(Numeric);

        let first = Route::new(Method::GET, "/items/{id}", Callback::function(noop)).unwrap();
        tree.leaves_mut(&first).insert(Method::GET, RouteId(0));
        let second = Route::new(Method::POST, "/items/{id}", Callback::function(noop))
            .unwrap()
            .with_param("id", &[numeric.clone()]);
        tree.leaves_mut(&second).insert(Method::POST, RouteId(1));

        assert_eq!(find(&tree, Method::GET, "/items/abc").0, Outcome::NotFound);
        assert_eq!(find(&tree, Method::GET, "/items/12").0, Outcome::Found(RouteId(0)));

        // merging the same validator again is a no-op
        assert!(tree.merge_validators(second.segments(), "id", &[numeric]));
        assert_eq!(tree.statics["items"].params[0].validators.len(), 1);
    }

    #[test]
    fn merge_validators_on_unknown_branch() {
        let mut tree = Node::default();
        let segments = crate::path::compile("/nowhere/{id}").unwrap();
        assert!(!tree.merge_validators(&segments, "id", &[Validator::new(Numeric)]));
    }

    #[test]
    fn optional_prefers_skipping() {
        let mut tree = Node::default();
        insert(&mut tree, Method::GET, "[lang=cs]/optional", 0);

        let (outcome, params) = find(&tree, Method::GET, "/optional");
        assert_eq!(outcome, Outcome::Found(RouteId(0)));
        assert_eq!(params.get("lang"), Some("cs"));
        assert_eq!(params.len(), 1);

        let (outcome, params) = find(&tree, Method::GET, "/en/optional");
        assert_eq!(outcome, Outcome::Found(RouteId(0)));
        assert_eq!(params.get("lang"), Some("en"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn optional_trailing_uses_default() {
        let mut tree = Node::default();
        insert(&mut tree, Method::GET, "/list/[page=1]", 0);
        insert(&mut tree, Method::GET, "/feed/[cursor]", 1);

        let (outcome, params) = find(&tree, Method::GET, "/list");
        assert_eq!(outcome, Outcome::Found(RouteId(0)));
        assert_eq!(params.get("page"), Some("1"));

        let (outcome, params) = find(&tree, Method::GET, "/list/3");
        assert_eq!(outcome, Outcome::Found(RouteId(0)));
        assert_eq!(params.get("page"), Some("3"));

        let (outcome, params) = find(&tree, Method::GET, "/feed");
        assert_eq!(outcome, Outcome::Found(RouteId(1)));
        assert!(params.is_empty());
    }

    #[test]
    fn optional_value_must_validate() {
        let mut tree = Node::default();
        let route = Route::new(Method::GET, "[lang=cs]/optional", Callback::function(noop))
            .unwrap()
            .with_param("lang", &[Validator::new(OneOf::new(["cs", "en", "de"]))]);
        tree.leaves_mut(&route).insert(Method::GET, RouteId(0));

        let (outcome, params) = find(&tree, Method::GET, "/xx/optional");
        assert_eq!(outcome, Outcome::NotFound);
        assert!(params.is_empty());
        assert_eq!(find(&tree, Method::GET, "/de/optional").0, Outcome::Found(RouteId(0)));
        assert_eq!(find(&tree, Method::GET, "/optional").0, Outcome::Found(RouteId(0)));
    }
}
