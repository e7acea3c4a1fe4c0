//! Stateless session and flash cookies for `tower`.
//!
//! All session state lives in the client: a string map is encoded, signed
//! with HMAC (and optionally encrypted with AES-GCM) and written to the
//! `<prefix>_SESSION` cookie. Nothing is stored on the server.
//!
//! The layer inserts [`SessionHandle`] and [`FlashHandle`] into request
//! extensions and writes the cookies back after the inner service returns.
//! The request-scoped [`Session`] and [`Flash`] can also be driven directly
//! through a [`SessionContext`], without the layer.
//!
//! # Security
//! Cookies are always signed. A cookie that fails verification, decryption
//! or has expired is treated exactly like an absent cookie: the handler sees
//! an empty session and no error. Rotating the secret therefore logs every
//! client out. Signing does not hide the payload; enable
//! [`CookieSessionConfig::with_encrypted`] to keep the content private.

pub mod clock;
mod codec;
pub mod config;
mod context;
mod encryptor;
pub mod error;
mod flash;
pub mod format;
pub mod layer;
mod projector;
mod secret;
pub mod session;
mod signer;

pub use tower_cookies::cookie::SameSite;

pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::codec::CookieCodec;
pub use crate::config::CookieSessionConfig;
pub use crate::context::SessionContext;
pub use crate::encryptor::Encryptor;
pub use crate::error::{ConfigError, CookieError, DecryptionError};
pub use crate::flash::Flash;
pub use crate::layer::{CookieSessionManager, CookieSessionManagerLayer, Scoped};
pub use crate::projector::CookieAttributes;
pub use crate::secret::SecretBytes;
pub use crate::session::Session;
pub use crate::signer::{SignatureAlgorithm, Signer};

/// Extension/extractor handle to the request's [`Session`].
pub type SessionHandle = Scoped<Session>;

/// Extension/extractor handle to the request's [`Flash`].
pub type FlashHandle = Scoped<Flash>;
