//! Maps a sealed cookie value and the configuration onto a `Set-Cookie` cookie.

use time::Duration;
use tower_cookies::Cookie;

use crate::{SameSite, config::CookieSessionConfig};

/// Attributes of an emitted session or flash cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    pub domain: Option<String>,
    pub path: String,
    pub max_age: Option<Duration>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl CookieAttributes {
    pub fn from_config(config: &CookieSessionConfig, max_age: Option<Duration>) -> Self {
        Self {
            domain: config.domain.as_deref().map(str::to_owned),
            path: config.cookie_path(),
            max_age: max_age.map(|max_age| std::cmp::max(max_age, Duration::ZERO)),
            secure: config.secure,
            http_only: config.http_only,
            same_site: config.same_site,
        }
    }

    pub fn build(self, name: String, value: String) -> Cookie<'static> {
        let mut cookie_builder = Cookie::build((name, value))
            .http_only(self.http_only)
            .secure(self.secure)
            .path(self.path);

        if let Some(same_site) = self.same_site {
            cookie_builder = cookie_builder.same_site(same_site);
        }
        if let Some(max_age) = self.max_age {
            cookie_builder = cookie_builder.max_age(max_age);
        }
        if let Some(domain) = self.domain {
            cookie_builder = cookie_builder.domain(domain);
        }

        cookie_builder.build()
    }
}

/// Cookie carrying `value`, expiring after `max_age` (browser session when `None`).
pub(crate) fn build_cookie(
    config: &CookieSessionConfig,
    name: String,
    value: String,
    max_age: Option<Duration>,
) -> Cookie<'static> {
    CookieAttributes::from_config(config, max_age).build(name, value)
}

/// Cookie instructing the client to drop `name`: empty value, `Max-Age=0`, same path and domain.
pub(crate) fn removal_cookie(config: &CookieSessionConfig, name: String) -> Cookie<'static> {
    let mut cookie = build_cookie(config, name, String::new(), None);
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CookieSessionConfig {
        CookieSessionConfig::new("abc", "APP")
            .with_domain("example.com")
            .with_context_path("/my_context")
    }

    #[test]
    fn attributes_follow_config() {
        let attributes = CookieAttributes::from_config(&config(), Some(Duration::seconds(10)));

        assert_eq!(
            attributes,
            CookieAttributes {
                domain: Some("example.com".to_owned()),
                path: "/my_context/".to_owned(),
                max_age: Some(Duration::seconds(10)),
                secure: true,
                http_only: true,
                same_site: None,
            }
        );
    }

    #[test]
    fn negative_max_age_is_clamped() {
        let attributes = CookieAttributes::from_config(&config(), Some(Duration::seconds(-5)));
        assert_eq!(attributes.max_age, Some(Duration::ZERO));
    }

    #[test]
    fn built_cookie_carries_attributes() {
        let config = config()
            .with_secure(false)
            .with_same_site(SameSite::Lax);
        let cookie = build_cookie(&config, "APP_SESSION".into(), "sig-payload".into(), None);

        assert_eq!(cookie.name(), "APP_SESSION");
        assert_eq!(cookie.value(), "sig-payload");
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.path(), Some("/my_context/"));
        assert_ne!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert!(cookie.max_age().is_none());
    }

    #[test]
    fn removal_cookie_keeps_domain_and_path() {
        let cookie = removal_cookie(&config(), "APP_SESSION".into());

        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.path(), Some("/my_context/"));
    }
}
