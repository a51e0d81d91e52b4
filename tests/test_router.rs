mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use waystone::http::request::Params;
use waystone::routing::{ErrorKind, HandlerKind, ResponsePacket, RouteHandler, Router};
use waystone::session::Session;

fn anonymous<F>(callback: F) -> RouteHandler
where
    F: Fn(&mut Session, &Params) -> ResponsePacket + Send + Sync + 'static,
{
    RouteHandler::new(HandlerKind::Anonymous, Duration::from_secs(60), callback)
}

fn route(router: &Router, verb: &str, path: &str) -> ResponsePacket {
    router
        .route(&mut Session::new(), verb, path, &Params::new())
        .unwrap()
}

fn text(packet: &ResponsePacket) -> &str {
    std::str::from_utf8(packet.data.as_ref().unwrap()).unwrap()
}

#[test]
fn test_extensionless_path_loads_html_page() {
    let site = common::website();
    let router = Router::new(site.path());

    let packet = route(&router, "get", "/about");

    assert_eq!(text(&packet), "<p>About</p>");
    assert_eq!(packet.content_type.as_deref(), Some("text/html"));
    assert_eq!(packet.encoding, Some("utf-8"));
}

#[test]
fn test_root_loads_index_page() {
    let site = common::website();
    let router = Router::new(site.path());

    assert_eq!(text(&route(&router, "get", "/")), "<h1>Home</h1>");
    assert_eq!(text(&route(&router, "get", "/index.html")), "<h1>Home</h1>");
}

#[test]
fn test_missing_page_and_file_errors() {
    let site = common::website();
    let router = Router::new(site.path());

    assert_eq!(route(&router, "get", "/nowhere").error, Some(ErrorKind::PageNotFound));
    assert_eq!(route(&router, "get", "/css/none.css").error, Some(ErrorKind::FileNotFound));
    assert_eq!(route(&router, "get", "/img/none.png").error, Some(ErrorKind::FileNotFound));
}

#[test]
fn test_unregistered_extension_is_unknown_type() {
    let site = common::website();
    let router = Router::new(site.path());

    assert_eq!(route(&router, "get", "/setup.exe").error, Some(ErrorKind::UnknownType));
    // extensions match case-sensitively
    assert_eq!(route(&router, "get", "/img/logo.PNG").error, Some(ErrorKind::UnknownType));
}

#[test]
fn test_static_css_and_image() {
    let site = common::website();
    let router = Router::new(site.path());

    let css = route(&router, "get", "/css/site.css");
    assert_eq!(text(&css), "body { margin: 0 }");
    assert_eq!(css.content_type.as_deref(), Some("text/css"));

    let png = route(&router, "get", "/img/logo.png");
    assert_eq!(png.data.as_deref(), Some(common::PNG_BYTES));
    assert_eq!(png.content_type.as_deref(), Some("image/png"));
    assert_eq!(png.encoding, None);
}

#[test]
fn test_repeated_static_requests_are_identical() {
    let site = common::website();
    let router = Router::new(site.path());

    let first = route(&router, "get", "/img/logo.png");
    let second = route(&router, "get", "/img/logo.png");

    assert_eq!(first, second);
}

#[test]
fn test_registered_route_overrides_loader() {
    let site = common::website();
    let mut router = Router::new(site.path());
    router
        .add_route("post", "/about", anonymous(|_, _| ResponsePacket::redirect("/thanks")))
        .unwrap();

    assert_eq!(route(&router, "post", "/about").redirect.as_deref(), Some("/thanks"));
    // other verbs still reach the page
    assert_eq!(text(&route(&router, "get", "/about")), "<p>About</p>");
}

#[test]
fn test_empty_handler_response_falls_back_to_loader() {
    let site = common::website();
    let mut router = Router::new(site.path());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    router
        .add_route(
            "get",
            "/about",
            anonymous(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                ResponsePacket::empty()
            }),
        )
        .unwrap();

    let packet = route(&router, "get", "/about");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(text(&packet), "<p>About</p>");
}

#[test]
fn test_handler_can_return_literal_content() {
    let site = common::website();
    let mut router = Router::new(site.path());
    router
        .add_route(
            "get",
            "/status",
            anonymous(|_, _| ResponsePacket::text("ok", "text/plain")),
        )
        .unwrap();

    assert_eq!(text(&route(&router, "get", "/status")), "ok");
}

#[test]
fn test_handler_error_is_returned_as_is() {
    let site = common::website();
    let mut router = Router::new(site.path());
    router
        .add_route(
            "post",
            "/admin",
            RouteHandler::new(HandlerKind::Authenticated, Duration::from_secs(60), |_, _| {
                ResponsePacket::redirect("/admin/done")
            }),
        )
        .unwrap();

    assert_eq!(route(&router, "post", "/admin").error, Some(ErrorKind::NotAuthorized));
}

#[test]
fn test_verb_matches_ignoring_case_but_path_is_exact() {
    let site = common::website();
    let mut router = Router::new(site.path());
    router
        .add_route("POST", "/Login", anonymous(|_, _| ResponsePacket::redirect("/home")))
        .unwrap();

    assert_eq!(route(&router, "post", "/Login").redirect.as_deref(), Some("/home"));
    assert_eq!(route(&router, "Post", "/Login").redirect.as_deref(), Some("/home"));
    assert_eq!(route(&router, "post", "/login").error, Some(ErrorKind::PageNotFound));
}

#[test]
fn test_duplicate_route_is_rejected() {
    let site = common::website();
    let mut router = Router::new(site.path());
    router
        .add_route("post", "/login", anonymous(|_, _| ResponsePacket::empty()))
        .unwrap();

    let err = router
        .add_route("POST", "/login", anonymous(|_, _| ResponsePacket::empty()))
        .unwrap_err();

    assert!(err.to_string().contains("/login"));
    assert_eq!(router.routes().len(), 1);
    assert_eq!(router.routes()[0].verb, "post");
}

#[test]
fn test_post_processor_rewrites_text_only() {
    let site = common::website();
    let mut router = Router::new(site.path());
    router.set_post_processor(Arc::new(|_: &Session, text: &str| text.to_uppercase()));

    assert_eq!(text(&route(&router, "get", "/about")), "<P>ABOUT</P>");
    assert_eq!(
        route(&router, "get", "/img/logo.png").data.as_deref(),
        Some(common::PNG_BYTES)
    );
}

#[test]
fn test_parent_segments_stay_inside_website() {
    let outer = tempfile::tempdir().unwrap();
    let root = outer.path().join("site");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(outer.path().join("secret.css"), "secret").unwrap();
    let router = Router::new(&root);

    assert_eq!(route(&router, "get", "/../secret.css").error, Some(ErrorKind::FileNotFound));
}
