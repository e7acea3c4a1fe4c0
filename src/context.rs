use std::sync::Arc;

use crate::{
    clock::{Clock, SystemClock},
    codec::CookieCodec,
    config::{APPLICATION_COOKIE_PREFIX, APPLICATION_SECRET, CookieSessionConfig},
    encryptor::Encryptor,
    error::ConfigError,
    flash::Flash,
    session::Session,
    signer::Signer,
};

/// Validated configuration plus the key material derived from it.
///
/// Built once at startup and shared read-only (behind an `Arc`) by every
/// request-scoped [`Session`] and [`Flash`].
#[derive(Debug)]
pub struct SessionContext {
    config: CookieSessionConfig,
    codec: CookieCodec,
    clock: Arc<dyn Clock>,
}

impl SessionContext {
    pub fn new(config: CookieSessionConfig) -> Result<Self, ConfigError> {
        if config.secret.is_empty() {
            return Err(ConfigError::Missing(APPLICATION_SECRET));
        }
        if config.cookie_prefix.is_empty() {
            return Err(ConfigError::Missing(APPLICATION_COOKIE_PREFIX));
        }

        let secret = config.secret.expose_secret();
        let signer = Signer::new(secret, config.signature_algorithm)?;
        let codec = if config.encrypted {
            CookieCodec::private(signer, Encryptor::new(secret)?)
        } else {
            CookieCodec::signed(signer)
        };

        Ok(Self {
            config,
            codec,
            clock: Arc::new(SystemClock),
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CookieSessionConfig {
        &self.config
    }

    pub fn codec(&self) -> &CookieCodec {
        &self.codec
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Session for one request, from the raw `<prefix>_SESSION` cookie value.
    pub fn session(self: &Arc<Self>, raw_cookie: Option<&str>) -> Session {
        Session::init(Arc::clone(self), raw_cookie)
    }

    /// Flash scope for one request, from the raw `<prefix>_FLASH` cookie value.
    pub fn flash(self: &Arc<Self>, raw_cookie: Option<&str>) -> Flash {
        Flash::init(Arc::clone(self), raw_cookie)
    }
}
