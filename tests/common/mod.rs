#![allow(dead_code)]

// Shared helpers for integration tests.
//
// Cookies are read from `Set-Cookie` without percent-decoding and echoed back as the literal
// `name=value` pair, the way browsers treat them.
use std::sync::Arc;

use axum::{Router, body::Body, routing::get};
use http::{HeaderMap, Request, Response, header};
use http_body_util::BodyExt as _;
use tower::ServiceExt as _;
use tower_cookie_session::{
    CookieSessionConfig, CookieSessionManagerLayer, FlashHandle, ManualClock, SessionContext,
    SessionHandle,
};
use tower_cookies::Cookie;

pub const SECRET: &str = "abc";
pub const PREFIX: &str = "APP";
pub const SESSION_COOKIE: &str = "APP_SESSION";
pub const FLASH_COOKIE: &str = "APP_FLASH";
pub const T0: i64 = 1_700_000_000_000;

pub fn config() -> CookieSessionConfig {
    CookieSessionConfig::new(SECRET, PREFIX)
}

pub fn make_layer(config: CookieSessionConfig) -> CookieSessionManagerLayer {
    CookieSessionManagerLayer::new(config).expect("config is valid")
}

pub fn make_layer_with_clock(
    config: CookieSessionConfig,
) -> (Arc<ManualClock>, CookieSessionManagerLayer) {
    // Expiry tests drive time by hand instead of sleeping.
    let clock = Arc::new(ManualClock::new(T0));
    let context = SessionContext::new(config)
        .expect("config is valid")
        .with_clock(clock.clone());
    (clock, CookieSessionManagerLayer::from_context(context))
}

pub fn routes() -> Router {
    // Routes covering the session and flash operations used by the tests.
    Router::new()
        .route("/", get(|_: SessionHandle| async move { "Hello, world!" }))
        .route(
            "/set-user",
            get(|session: SessionHandle| async move {
                session.lock().put("user", "alice");
            }),
        )
        .route(
            "/get-user",
            get(|session: SessionHandle| async move {
                let user = session.lock().get("user").unwrap_or("none").to_owned();
                user
            }),
        )
        .route(
            "/remove-user",
            get(|session: SessionHandle| async move {
                session.lock().remove("user");
            }),
        )
        .route(
            "/clear",
            get(|session: SessionHandle| async move {
                session.lock().clear();
            }),
        )
        .route(
            "/id",
            get(|session: SessionHandle| async move {
                let mut session = session.lock();
                let (id, generated) = session.ensure_id();
                format!("{id}:{generated}")
            }),
        )
        .route(
            "/set-hello",
            get(|session: SessionHandle| async move {
                session.lock().put("hello", "session!");
            }),
        )
        .route(
            "/get-hello",
            get(|session: SessionHandle| async move {
                let hello = session.lock().get("hello").unwrap_or("none").to_owned();
                hello
            }),
        )
        .route(
            "/flash-hello",
            get(|flash: FlashHandle| async move {
                flash.lock().put("hello", "session!");
            }),
        )
        .route(
            "/flash-get-hello",
            get(|flash: FlashHandle| async move {
                let hello = flash.lock().get("hello").unwrap_or("none").to_owned();
                hello
            }),
        )
        .route(
            "/flash-success",
            get(|flash: FlashHandle| async move {
                flash.lock().success("saved");
            }),
        )
        .route(
            "/flash-read",
            get(|flash: FlashHandle| async move {
                let message = flash.lock().get("success").unwrap_or("none").to_owned();
                message
            }),
        )
}

pub async fn call(app: &Router, uri: &str, cookies: &[&Cookie<'_>]) -> Response<Body> {
    // Issue a GET request, sending the given cookies back like a browser would.
    let mut req = Request::builder().uri(uri);
    if !cookies.is_empty() {
        let header_value = cookies
            .iter()
            .map(|cookie| cookie_header_value(cookie))
            .collect::<Vec<_>>()
            .join("; ");
        req = req.header(header::COOKIE, header_value);
    }
    let req = req.body(Body::empty()).expect("request builds successfully");
    app.clone().oneshot(req).await.expect("service call succeeds")
}

pub async fn body_string(body: Body) -> String {
    // Collect an Axum body into a UTF-8 string for assertions.
    let bytes = body
        .collect()
        .await
        .expect("body collects successfully")
        .to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub fn set_cookies(headers: &HeaderMap) -> Vec<Cookie<'static>> {
    // Parse every `Set-Cookie` header of a response, keeping the value exactly as sent.
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| {
            let value = value.to_str().expect("set-cookie header is valid utf-8");
            Cookie::parse(value.to_owned()).expect("set-cookie parses successfully")
        })
        .collect()
}

pub fn find_cookie(headers: &HeaderMap, name: &str) -> Option<Cookie<'static>> {
    set_cookies(headers)
        .into_iter()
        .find(|cookie| cookie.name() == name)
}

pub fn get_session_cookie(headers: &HeaderMap) -> Cookie<'static> {
    find_cookie(headers, SESSION_COOKIE).expect("response sets the session cookie")
}

pub fn raw_set_cookie_pair(headers: &HeaderMap, name: &str) -> Option<String> {
    // The leading `name=value` of a `Set-Cookie` header, untouched.
    headers.get_all(header::SET_COOKIE).iter().find_map(|value| {
        let value = value.to_str().expect("set-cookie header is valid utf-8");
        let pair = value.split(';').next().unwrap_or_default().trim();
        pair.split_once('=')
            .filter(|(cookie_name, _)| *cookie_name == name)
            .map(|_| pair.to_owned())
    })
}

pub fn cookie_header_value(cookie: &Cookie<'_>) -> String {
    // Only `name=value`, echoed back verbatim as browsers do.
    format!("{}={}", cookie.name(), cookie.value())
}

pub async fn call_raw(app: &Router, uri: &str, cookie_header: &str) -> Response<Body> {
    // Issue a GET request with a literal `Cookie` header.
    let req = Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie_header)
        .body(Body::empty())
        .expect("request builds successfully");
    app.clone().oneshot(req).await.expect("service call succeeds")
}
