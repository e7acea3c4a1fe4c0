use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard},
    task::{Context, Poll},
};

use http::{Request, Response, StatusCode};
use tower_cookies::{CookieManager, Cookies};
use tower_layer::Layer;
use tower_service::Service;

use crate::{
    config::CookieSessionConfig,
    context::SessionContext,
    error::{ConfigError, CookieError},
};

/// Request-scoped handle to a [`Session`](crate::Session) or
/// [`Flash`](crate::Flash), stored in request extensions by
/// [`CookieSessionManager`].
#[derive(Debug)]
pub struct Scoped<T>(Arc<Mutex<T>>);

impl<T> Clone for Scoped<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Scoped<T> {
    fn new(value: T) -> Self {
        Self(Arc::new(Mutex::new(value)))
    }

    /// Lock the value. Do not hold the guard across an `.await`.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Clone> Scoped<T> {
    fn snapshot(&self) -> T {
        self.lock().clone()
    }
}

#[cfg(feature = "axum")]
impl<T, S> axum_core::extract::FromRequestParts<S> for Scoped<T>
where
    T: Send + 'static,
    S: Sync + Send,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Scoped<T>>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Can't extract cookie session. Is `CookieSessionManagerLayer` enabled?",
        ))
    }
}

#[derive(Debug, Clone)]
pub struct CookieSessionManagerLayer {
    context: Arc<SessionContext>,
}

impl CookieSessionManagerLayer {
    /// Validates `config` and derives the signing/encryption keys.
    pub fn new(config: CookieSessionConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_context(SessionContext::new(config)?))
    }

    pub fn from_context(context: SessionContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }
}

#[derive(Debug, Clone)]
pub struct CookieSessionManager<S> {
    inner: S,
    context: Arc<SessionContext>,
}

impl<S> Layer<S> for CookieSessionManagerLayer {
    type Service = CookieManager<CookieSessionManager<S>>;

    fn layer(&self, inner: S) -> Self::Service {
        CookieManager::new(CookieSessionManager {
            inner,
            context: Arc::clone(&self.context),
        })
    }
}

fn write_cookie(
    cookies: &Cookies,
    outcome: Result<Option<tower_cookies::Cookie<'static>>, CookieError>,
) -> Result<(), CookieError> {
    if let Some(cookie) = outcome? {
        cookies.add(cookie);
    }
    Ok(())
}

impl<ReqBody, ResBody, S> Service<Request<ReqBody>> for CookieSessionManager<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Default + Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let context = Arc::clone(&self.context);

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let cookies = match req.extensions().get::<Cookies>().cloned() {
                Some(cookies) => cookies,
                None => {
                    let mut res = Response::default();
                    *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                    return Ok(res);
                }
            };

            let config = context.config();
            let session_cookie = cookies.get(&config.session_cookie_name());
            let flash_cookie = cookies.get(&config.flash_cookie_name());

            let session = Scoped::new(context.session(session_cookie.as_ref().map(|c| c.value())));
            let flash = Scoped::new(context.flash(flash_cookie.as_ref().map(|c| c.value())));
            req.extensions_mut().insert(session.clone());
            req.extensions_mut().insert(flash.clone());

            let res = inner.call(req).await?;

            if res.status().is_server_error() {
                return Ok(res);
            }

            let saved = write_cookie(&cookies, session.snapshot().save())
                .and_then(|()| write_cookie(&cookies, flash.snapshot().save()));
            if let Err(err) = saved {
                tracing::error!(err = %err, "cookie session save failed");
                let mut res = Response::default();
                *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                return Ok(res);
            }

            Ok(res)
        })
    }
}
