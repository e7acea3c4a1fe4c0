//! The request-scoped session map.
//!
//! A [`Session`] is rebuilt from the `<prefix>_SESSION` cookie on every
//! request, mutated by the handler and turned back into a cookie by
//! [`Session::save`]. A cookie that fails to verify, decrypt or that has
//! expired produces an empty session, indistinguishable from a new one.

use std::{collections::BTreeMap, sync::Arc};

use rand::distributions::{Alphanumeric, DistString};
use time::Duration;
use tower_cookies::Cookie;

use crate::{context::SessionContext, error::CookieError, projector};

/// Last save time, milliseconds since the epoch.
pub const TIMESTAMP_KEY: &str = "__TS";
/// Random session identifier.
pub const ID_KEY: &str = "____ID";
/// Random authenticity token.
pub const AUTHENTICITY_KEY: &str = "___AT";
/// Per-session expiry override, milliseconds relative to `__TS`.
pub const EXPIRY_TIME_KEY: &str = "___EXP";

const TOKEN_LENGTH: usize = 32;

#[derive(Debug, Clone)]
pub struct Session {
    context: Arc<SessionContext>,
    entries: BTreeMap<String, String>,
    dirty: bool,
    restored: bool,
    discarded: bool,
}

impl Session {
    pub fn init(context: Arc<SessionContext>, raw_cookie: Option<&str>) -> Self {
        let mut session = Self {
            context,
            entries: BTreeMap::new(),
            dirty: false,
            restored: false,
            discarded: false,
        };

        let Some(raw_cookie) = raw_cookie else {
            return session;
        };

        let name = session.context.config().session_cookie_name();
        match session.context.codec().open(raw_cookie) {
            Ok(entries) => {
                let now = session.context.now_millis();
                if session.is_expired(&entries, now) {
                    tracing::debug!(cookie = %name, "discarding expired session cookie");
                    session.discarded = true;
                } else {
                    session.entries = entries;
                    session.restored = true;
                }
            }
            Err(err) => {
                tracing::debug!(cookie = %name, err = %err, "discarding invalid session cookie");
                session.discarded = true;
            }
        }

        session
    }

    fn configured_expiry_millis(&self) -> Option<i64> {
        self.context
            .config()
            .expiry()
            .map(|expiry| i64::try_from(expiry.whole_milliseconds()).unwrap_or(i64::MAX))
    }

    fn is_expired(&self, entries: &BTreeMap<String, String>, now: i64) -> bool {
        let expiry = match entries.get(EXPIRY_TIME_KEY) {
            Some(raw) => match raw.parse::<i64>() {
                Ok(millis) => Some(millis),
                Err(_) => return true,
            },
            None => self.configured_expiry_millis(),
        };
        let Some(expiry) = expiry else {
            return false;
        };

        match entries
            .get(TIMESTAMP_KEY)
            .and_then(|timestamp| timestamp.parse::<i64>().ok())
        {
            Some(timestamp) => now.saturating_sub(timestamp) > expiry,
            None => true,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Insert or replace `key`, returning the previous value.
    ///
    /// Keys starting with `__` are reserved for bookkeeping.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.dirty = true;
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.dirty = true;
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.dirty = true;
        self.entries.clear();
    }

    /// No entries besides the timestamp and expiry bookkeeping.
    pub fn is_empty(&self) -> bool {
        self.entries
            .keys()
            .all(|key| key == TIMESTAMP_KEY || key == EXPIRY_TIME_KEY)
    }

    pub fn data(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether a valid cookie was decoded on [`Session::init`].
    pub fn is_restored(&self) -> bool {
        self.restored
    }

    pub fn id(&self) -> Option<&str> {
        self.get(ID_KEY)
    }

    /// The session id, generating one first if absent.
    ///
    /// The flag is `true` when the id was generated by this call, which
    /// also marks the session dirty.
    pub fn ensure_id(&mut self) -> (&str, bool) {
        self.ensure_token(ID_KEY)
    }

    pub fn authenticity_token(&self) -> Option<&str> {
        self.get(AUTHENTICITY_KEY)
    }

    /// Like [`Session::ensure_id`], for the authenticity token.
    pub fn ensure_authenticity_token(&mut self) -> (&str, bool) {
        self.ensure_token(AUTHENTICITY_KEY)
    }

    fn ensure_token(&mut self, key: &'static str) -> (&str, bool) {
        let mut generated = false;
        let value = self.entries.entry(key.to_owned()).or_insert_with(|| {
            generated = true;
            Alphanumeric.sample_string(&mut rand::thread_rng(), TOKEN_LENGTH)
        });
        if generated {
            self.dirty = true;
        }
        (value.as_str(), generated)
    }

    /// Override the configured expiry for this session; `None` restores it.
    pub fn set_expiry_time(&mut self, expiry: Option<Duration>) {
        self.dirty = true;
        match expiry {
            Some(expiry) => {
                let millis = i64::try_from(expiry.whole_milliseconds()).unwrap_or(i64::MAX);
                self.entries
                    .insert(EXPIRY_TIME_KEY.to_owned(), millis.to_string());
            }
            None => {
                self.entries.remove(EXPIRY_TIME_KEY);
            }
        }
    }

    /// Effective expiry: the per-session override, else the configured one.
    pub fn expiry(&self) -> Option<Duration> {
        self.get(EXPIRY_TIME_KEY)
            .and_then(|raw| raw.parse::<i64>().ok())
            .or_else(|| self.configured_expiry_millis())
            .map(Duration::milliseconds)
    }

    /// Produce the cookie to send back, if any.
    ///
    /// - unchanged and "send only if changed": nothing
    /// - empty: a removal cookie (`Max-Age=0`) when a session cookie came in,
    ///   otherwise nothing
    /// - otherwise: `__TS` is refreshed and the sealed map is returned
    pub fn save(mut self) -> Result<Option<Cookie<'static>>, CookieError> {
        let config = self.context.config();
        let name = config.session_cookie_name();

        if !self.dirty && config.send_only_if_changed() {
            if self.discarded && config.clear_on_decode_error {
                tracing::warn!(cookie = %name, "removing undecodable session cookie");
                return Ok(Some(projector::removal_cookie(config, name)));
            }
            return Ok(None);
        }

        if self.is_empty() {
            if self.restored || self.discarded {
                return Ok(Some(projector::removal_cookie(config, name)));
            }
            return Ok(None);
        }

        let now = self.context.now_millis();
        self.entries
            .insert(TIMESTAMP_KEY.to_owned(), now.to_string());

        let value = self.context.codec().seal(&self.entries)?;
        if value.len() > config.max_cookie_bytes {
            return Err(CookieError::TooLarge {
                size: value.len(),
                max: config.max_cookie_bytes,
            });
        }

        Ok(Some(projector::build_cookie(
            config,
            name,
            value,
            self.expiry(),
        )))
    }
}
