// Tests for the HMAC algorithm selection.
mod common;

use tower_cookie_session::SignatureAlgorithm;

#[tokio::test]
async fn sha1_is_the_default() {
    let app = common::routes().layer(common::make_layer(common::config()));

    let res = common::call(&app, "/set-user", &[]).await;
    let session_cookie = common::get_session_cookie(res.headers());
    let (signature, _) = session_cookie
        .value()
        .split_once('-')
        .expect("value has a signature separator");

    assert_eq!(signature.len(), 40);
}

#[tokio::test]
async fn sha256_roundtrips() {
    let config = common::config().with_signature_algorithm(SignatureAlgorithm::HmacSha256);
    let app = common::routes().layer(common::make_layer(config));

    let res = common::call(&app, "/set-user", &[]).await;
    let session_cookie = common::get_session_cookie(res.headers());
    let (signature, _) = session_cookie
        .value()
        .split_once('-')
        .expect("value has a signature separator");
    assert_eq!(signature.len(), 64);

    let res = common::call(&app, "/get-user", &[&session_cookie]).await;

    assert_eq!(common::body_string(res.into_body()).await, "alice");
}

#[tokio::test]
async fn algorithms_do_not_mix() {
    let sha1_app = common::routes().layer(common::make_layer(common::config()));
    let sha256_app = common::routes().layer(common::make_layer(
        common::config().with_signature_algorithm(SignatureAlgorithm::HmacSha256),
    ));

    let res = common::call(&sha1_app, "/set-user", &[]).await;
    let session_cookie = common::get_session_cookie(res.headers());

    let res = common::call(&sha256_app, "/get-user", &[&session_cookie]).await;

    assert_eq!(common::body_string(res.into_body()).await, "none");
}
