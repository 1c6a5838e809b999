//! Matching behavior through the public API.

use hyper::{Body, Method, Request, Response};
use segrouter::validator::{Numeric, OneOf, Pattern};
use segrouter::{Callback, Error, Params, Route, Router};

async fn action(_: Request<Body>) -> hyper::Result<Response<Body>> {
    Ok(Response::new(Body::empty()))
}

struct Dummy;

fn dummy(name: &'static str) -> Callback {
    Callback::method::<Dummy>(name, action)
}

fn lookup<'r>(router: &'r Router, method: Method, path: &str) -> Option<(&'r Route, Params)> {
    router.lookup(&method, path).unwrap()
}

#[test]
fn structural_equality_ignores_parameter_names() {
    let a = Route::new(Method::GET, "/test/{id}", dummy("action")).unwrap();
    let b = Route::new(Method::GET, "/TEST/{objId}", dummy("action")).unwrap();
    let c = Route::new(Method::POST, "/test/{id}", dummy("action")).unwrap();
    let d = Route::new(Method::GET, "/test/id", dummy("action")).unwrap();
    let e = Route::new(Method::GET, "/test/{id}", dummy("other")).unwrap();

    assert!(a.same_route(&a));
    assert!(a.same_route(&b) && b.same_route(&a));
    assert!(!a.same_route(&c));
    assert!(!a.same_route(&d));
    assert!(!a.same_route(&e));
}

#[test]
fn differently_named_parameters_are_siblings() {
    let mut router = Router::default();
    router
        .get("/objects/{id}", dummy("byId"))
        .unwrap()
        .param("id", [Numeric]);
    router
        .get("/objects/{objId}", dummy("byObjId"))
        .unwrap()
        .param("objId", [Pattern::new("[a-f0-9]{8}").unwrap()]);

    let (_, params) = lookup(&router, Method::GET, "/objects/12").unwrap();
    assert_eq!(params.get("id"), Some("12"));

    let (_, params) = lookup(&router, Method::GET, "/objects/deadbeef").unwrap();
    assert_eq!(params.get("objId"), Some("deadbeef"));

    assert!(lookup(&router, Method::GET, "/objects/nothing").is_none());
}

#[test]
fn backtracking_rolls_back_bindings() {
    let mut router = Router::default();
    router.get("/{category}/archive", dummy("archive")).unwrap();
    router.get("/{user}/{post}", dummy("post")).unwrap();

    let (route, params) = lookup(&router, Method::GET, "/rust/routers").unwrap();
    assert_eq!(route.readable_path(), "/{user}/{post}");
    assert_eq!(params.len(), 2);
    assert_eq!(params.get("category"), None);
    assert_eq!(params.get("user"), Some("rust"));
    assert_eq!(params.get("post"), Some("routers"));
}

#[test]
fn method_not_allowed_does_not_stop_sibling_search() {
    let mut router = Router::default();
    router.post("/{a}/edit", dummy("editPost")).unwrap();
    router.get("/{b}/edit", dummy("editGet")).unwrap();

    let (route, params) = lookup(&router, Method::GET, "/x/edit").unwrap();
    assert_eq!(route.method(), Method::GET);
    assert_eq!(params.get("b"), Some("x"));

    match router.lookup(&Method::PUT, "/x/edit") {
        Err(Error::MethodNotAllowed { method, path }) => {
            assert_eq!(method, Method::PUT);
            assert_eq!(path, "x/edit");
        }
        _ => panic!("expected method not allowed"),
    }
}

#[test]
fn optional_segments() {
    let mut router = Router::default();
    router
        .get("/[lang=cs]/articles/[page]", dummy("list"))
        .unwrap()
        .param("lang", [OneOf::new(["cs", "en"])])
        .param("page", [Numeric]);

    let cases = [
        ("/articles", Some("cs"), None),
        ("/en/articles", Some("en"), None),
        ("/en/articles/2", Some("en"), Some("2")),
        ("/articles/3", Some("cs"), Some("3")),
    ];
    for (path, lang, page) in cases {
        let (_, params) = lookup(&router, Method::GET, path).unwrap();
        assert_eq!(params.get("lang"), lang, "{}", path);
        assert_eq!(params.get("page"), page, "{}", path);
    }

    assert!(lookup(&router, Method::GET, "/fr/articles").is_none());
    assert!(lookup(&router, Method::GET, "/articles/next").is_none());
}

#[test]
fn trailing_slash_and_case_are_ignored() {
    let mut router = Router::default();
    router.get("/Settings/Modes/", dummy("modes")).unwrap();

    assert!(lookup(&router, Method::GET, "/settings/modes").is_some());
    assert!(lookup(&router, Method::GET, "//SETTINGS//MODES/").is_some());
}

#[test]
fn shared_validators_restrict_all_routes_on_a_node() {
    let mut router = Router::default();
    router.get("/users/{id}", dummy("show")).unwrap();
    router.put("/users/{id}", dummy("update")).unwrap().param("id", [Numeric]);

    assert!(lookup(&router, Method::GET, "/users/7").is_some());
    assert!(lookup(&router, Method::GET, "/users/me").is_none());
}

#[test]
fn get_route_appends_to_caller_params() {
    let mut router = Router::default();
    router.get("/posts/{id}", dummy("show")).unwrap();

    let mut params: Params = [("tenant", "acme")].into_iter().collect();
    router
        .get_route(&Method::GET, &["posts", "9"], &mut params)
        .unwrap()
        .unwrap();
    assert_eq!(params.len(), 2);
    assert_eq!(params.get("tenant"), Some("acme"));
    assert_eq!(params.get("id"), Some("9"));

    let mut params: Params = [("tenant", "acme")].into_iter().collect();
    assert!(router
        .get_route(&Method::GET, &["posts"], &mut params)
        .unwrap()
        .is_none());
    assert_eq!(params.len(), 1);
}
