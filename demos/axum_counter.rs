use std::net::SocketAddr;

use axum::{Router, routing::get};
use time::Duration;
use tower_cookie_session::{
    CookieSessionConfig, CookieSessionManagerLayer, FlashHandle, SameSite, SessionHandle,
};

async fn index(session: SessionHandle, flash: FlashHandle) -> String {
    let mut session = session.lock();
    let n: usize = session
        .get("n")
        .and_then(|n| n.parse().ok())
        .unwrap_or(0);
    session.put("n", (n + 1).to_string());

    let notice = flash.lock().get("success").map(str::to_owned);
    match notice {
        Some(notice) => format!("n={n} ({notice})"),
        None => format!("n={n}"),
    }
}

async fn reset(session: SessionHandle, flash: FlashHandle) -> &'static str {
    session.lock().clear();
    flash.lock().success("counter reset");
    "reset"
}

#[tokio::main]
async fn main() {
    let secret = std::env::var("APPLICATION_SECRET").unwrap_or_else(|_| "change-me".to_owned());
    let session_config = CookieSessionConfig::new(secret, "DEMO")
        // Default: None (browser-session cookie)
        .with_expiry(Some(Duration::hours(1)))
        // Default: true (set to false for local HTTP development)
        .with_secure(false)
        // Default: true
        .with_http_only(true)
        // Default: None
        .with_same_site(SameSite::Lax)
        // Default: false
        .with_encrypted(true)
        // Default: 4096
        .with_max_cookie_bytes(4096);
    let session_layer =
        CookieSessionManagerLayer::new(session_config).expect("session config is valid");

    let app = Router::new()
        .route("/", get(index))
        .route("/reset", get(reset))
        .layer(session_layer);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("tcp listener binds successfully");
    let local_addr = listener.local_addr().expect("local address is available");
    println!("listening at http://{local_addr}");

    axum::serve(listener, app)
        .await
        .expect("server runs successfully");
}
