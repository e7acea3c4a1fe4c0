use std::{borrow::Cow, collections::HashMap, str::FromStr};

use time::Duration;

use crate::{SameSite, error::ConfigError, secret::SecretBytes, signer::SignatureAlgorithm};

pub const SESSION_EXPIRE_TIME_SECONDS: &str = "session.expire.time.seconds";
pub const SESSION_SEND_ONLY_IF_CHANGED: &str = "session.send.only.if.changed";
pub const SESSION_TRANSFERRED_OVER_HTTPS_ONLY: &str = "session.transferred.over.https.only";
pub const SESSION_HTTP_ONLY: &str = "session.http.only";
pub const APPLICATION_COOKIE_ENCRYPTED: &str = "application.cookie.encrypted";
pub const APPLICATION_SECRET: &str = "application.secret";
pub const APPLICATION_COOKIE_PREFIX: &str = "application.cookie.prefix";
pub const APPLICATION_COOKIE_DOMAIN: &str = "application.cookie.domain";
pub const APPLICATION_CONTEXT_PATH: &str = "application.context.path";

const ALL_KEYS: [&str; 9] = [
    SESSION_EXPIRE_TIME_SECONDS,
    SESSION_SEND_ONLY_IF_CHANGED,
    SESSION_TRANSFERRED_OVER_HTTPS_ONLY,
    SESSION_HTTP_ONLY,
    APPLICATION_COOKIE_ENCRYPTED,
    APPLICATION_SECRET,
    APPLICATION_COOKIE_PREFIX,
    APPLICATION_COOKIE_DOMAIN,
    APPLICATION_CONTEXT_PATH,
];

const SESSION_SUFFIX: &str = "_SESSION";
const FLASH_SUFFIX: &str = "_FLASH";

/// Process-wide cookie session settings. Built once at startup.
#[derive(Debug, Clone)]
pub struct CookieSessionConfig {
    pub(crate) secret: SecretBytes,
    pub(crate) cookie_prefix: Cow<'static, str>,
    pub(crate) expiry: Option<Duration>,
    pub(crate) send_only_if_changed: bool,
    pub(crate) secure: bool,
    pub(crate) http_only: bool,
    pub(crate) encrypted: bool,
    pub(crate) same_site: Option<SameSite>,
    pub(crate) domain: Option<Cow<'static, str>>,
    pub(crate) context_path: Cow<'static, str>,
    pub(crate) max_cookie_bytes: usize,
    pub(crate) clear_on_decode_error: bool,
    pub(crate) signature_algorithm: SignatureAlgorithm,
}

impl CookieSessionConfig {
    pub fn new<S, P>(secret: S, cookie_prefix: P) -> Self
    where
        S: Into<SecretBytes>,
        P: Into<Cow<'static, str>>,
    {
        Self {
            secret: secret.into(),
            cookie_prefix: cookie_prefix.into(),
            expiry: None,
            send_only_if_changed: true,
            secure: true,
            http_only: true,
            encrypted: false,
            same_site: None,
            domain: None,
            context_path: "".into(),
            max_cookie_bytes: 4096,
            clear_on_decode_error: false,
            signature_algorithm: SignatureAlgorithm::default(),
        }
    }

    /// Reads the settings from `application.*` / `session.*` properties.
    ///
    /// `application.secret` and `application.cookie.prefix` are required.
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let lookup = |key: &'static str| {
            properties
                .get(key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
        };

        let secret = lookup(APPLICATION_SECRET).ok_or(ConfigError::Missing(APPLICATION_SECRET))?;
        let prefix = lookup(APPLICATION_COOKIE_PREFIX)
            .ok_or(ConfigError::Missing(APPLICATION_COOKIE_PREFIX))?;

        let mut config = Self::new(secret.to_owned(), prefix.to_owned());

        if let Some(seconds) = lookup(SESSION_EXPIRE_TIME_SECONDS) {
            let seconds: i64 = parse(SESSION_EXPIRE_TIME_SECONDS, seconds)?;
            config = config.with_expiry(Some(Duration::seconds(seconds)));
        }
        if let Some(value) = lookup(SESSION_SEND_ONLY_IF_CHANGED) {
            config = config.with_send_only_if_changed(parse(SESSION_SEND_ONLY_IF_CHANGED, value)?);
        }
        if let Some(value) = lookup(SESSION_TRANSFERRED_OVER_HTTPS_ONLY) {
            config = config.with_secure(parse(SESSION_TRANSFERRED_OVER_HTTPS_ONLY, value)?);
        }
        if let Some(value) = lookup(SESSION_HTTP_ONLY) {
            config = config.with_http_only(parse(SESSION_HTTP_ONLY, value)?);
        }
        if let Some(value) = lookup(APPLICATION_COOKIE_ENCRYPTED) {
            config = config.with_encrypted(parse(APPLICATION_COOKIE_ENCRYPTED, value)?);
        }
        if let Some(domain) = lookup(APPLICATION_COOKIE_DOMAIN) {
            config = config.with_domain(domain.to_owned());
        }
        if let Some(path) = lookup(APPLICATION_CONTEXT_PATH) {
            config = config.with_context_path(path.to_owned());
        }

        Ok(config)
    }

    /// Same as [`Self::from_properties`], reading `APPLICATION_SECRET`,
    /// `SESSION_EXPIRE_TIME_SECONDS`, ... from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let properties = ALL_KEYS
            .iter()
            .filter_map(|key| {
                let var = key.to_ascii_uppercase().replace('.', "_");
                std::env::var(var).ok().map(|value| ((*key).to_owned(), value))
            })
            .collect();
        Self::from_properties(&properties)
    }

    /// `None` disables expiry.
    #[must_use]
    pub fn with_expiry(mut self, expiry: Option<Duration>) -> Self {
        self.expiry = expiry;
        self
    }

    #[must_use]
    pub fn with_send_only_if_changed(mut self, send_only_if_changed: bool) -> Self {
        self.send_only_if_changed = send_only_if_changed;
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub fn with_encrypted(mut self, encrypted: bool) -> Self {
        self.encrypted = encrypted;
        self
    }

    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    #[must_use]
    pub fn with_domain<D: Into<Cow<'static, str>>>(mut self, domain: D) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn without_domain(mut self) -> Self {
        self.domain = None;
        self
    }

    /// The application's context path; cookies are scoped to it.
    #[must_use]
    pub fn with_context_path<P: Into<Cow<'static, str>>>(mut self, context_path: P) -> Self {
        self.context_path = context_path.into();
        self
    }

    #[must_use]
    pub fn with_max_cookie_bytes(mut self, max_cookie_bytes: usize) -> Self {
        self.max_cookie_bytes = max_cookie_bytes;
        self
    }

    /// Answer an inbound cookie that fails to open with a removal cookie.
    #[must_use]
    pub fn with_clear_on_decode_error(mut self, clear_on_decode_error: bool) -> Self {
        self.clear_on_decode_error = clear_on_decode_error;
        self
    }

    #[must_use]
    pub fn with_signature_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.signature_algorithm = algorithm;
        self
    }

    pub fn session_cookie_name(&self) -> String {
        format!("{}{SESSION_SUFFIX}", self.cookie_prefix)
    }

    pub fn flash_cookie_name(&self) -> String {
        format!("{}{FLASH_SUFFIX}", self.cookie_prefix)
    }

    pub fn expiry(&self) -> Option<Duration> {
        self.expiry
    }

    pub fn send_only_if_changed(&self) -> bool {
        self.send_only_if_changed
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Context path with a trailing slash.
    pub fn cookie_path(&self) -> String {
        if self.context_path.ends_with('/') {
            self.context_path.to_string()
        } else {
            format!("{}/", self.context_path)
        }
    }
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_owned(),
    })
}
