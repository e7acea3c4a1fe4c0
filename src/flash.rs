//! Flash scope: values that live until the next request.
//!
//! Data put into the flash is sent back in the `<prefix>_FLASH` cookie and
//! is readable during the following request only, unless kept again.

use std::{collections::BTreeMap, sync::Arc};

use tower_cookies::Cookie;

use crate::{context::SessionContext, error::CookieError, projector};

const ERROR_KEY: &str = "error";
const SUCCESS_KEY: &str = "success";

#[derive(Debug, Clone)]
pub struct Flash {
    context: Arc<SessionContext>,
    current: BTreeMap<String, String>,
    outgoing: BTreeMap<String, String>,
    restored: bool,
    discarded: bool,
}

impl Flash {
    pub fn init(context: Arc<SessionContext>, raw_cookie: Option<&str>) -> Self {
        let mut flash = Self {
            context,
            current: BTreeMap::new(),
            outgoing: BTreeMap::new(),
            restored: false,
            discarded: false,
        };

        if let Some(raw_cookie) = raw_cookie {
            match flash.context.codec().open(raw_cookie) {
                Ok(current) => {
                    flash.current = current;
                    flash.restored = true;
                }
                Err(err) => {
                    tracing::debug!(
                        cookie = %flash.context.config().flash_cookie_name(),
                        err = %err,
                        "discarding invalid flash cookie"
                    );
                    flash.discarded = true;
                }
            }
        }

        flash
    }

    /// Value visible during this request.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.current.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.current.contains_key(key)
    }

    /// Visible now and in the next request.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        self.current.insert(key.clone(), value.clone());
        self.outgoing.insert(key, value);
    }

    /// Visible during this request only.
    pub fn now(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.current.insert(key.into(), value.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.put(ERROR_KEY, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.put(SUCCESS_KEY, message);
    }

    /// Drop `key` from the next request.
    pub fn discard(&mut self, key: &str) {
        self.outgoing.remove(key);
    }

    pub fn discard_all(&mut self) {
        self.outgoing.clear();
    }

    /// Carry `key` over to the next request.
    pub fn keep(&mut self, key: &str) {
        if let Some(value) = self.current.get(key) {
            self.outgoing.insert(key.to_owned(), value.clone());
        }
    }

    pub fn keep_all(&mut self) {
        self.outgoing
            .extend(self.current.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    pub fn clear_current(&mut self) {
        self.current.clear();
    }

    pub fn current_data(&self) -> &BTreeMap<String, String> {
        &self.current
    }

    pub fn outgoing_data(&self) -> &BTreeMap<String, String> {
        &self.outgoing
    }

    /// Cookie carrying the outgoing data, a removal cookie when nothing is
    /// carried over but a flash cookie came in, otherwise nothing.
    pub fn save(self) -> Result<Option<Cookie<'static>>, CookieError> {
        let config = self.context.config();
        let name = config.flash_cookie_name();

        if self.outgoing.is_empty() {
            if self.restored || (self.discarded && config.clear_on_decode_error) {
                return Ok(Some(projector::removal_cookie(config, name)));
            }
            return Ok(None);
        }

        let value = self.context.codec().seal(&self.outgoing)?;
        if value.len() > config.max_cookie_bytes {
            return Err(CookieError::TooLarge {
                size: value.len(),
                max: config.max_cookie_bytes,
            });
        }

        Ok(Some(projector::build_cookie(config, name, value, None)))
    }
}
