use thiserror::Error;

/// Startup failure: the layer refuses to run without a usable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration key `{0}`")]
    Missing(&'static str),

    #[error("invalid value for configuration key `{key}`: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("failed to derive cookie key material from the application secret")]
    KeyDerivation,
}

/// Ciphertext could not be decrypted: wrong key, truncated or corrupted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cookie payload decryption failed")]
pub struct DecryptionError;

/// Failures of the cookie sealing/opening pipeline.
///
/// The opening variants never reach request handlers: a session or flash
/// scope built from a cookie that fails to open is simply empty.
#[derive(Debug, Error)]
pub enum CookieError {
    #[error("cookie value is not of the form `signature-payload`")]
    Malformed,

    #[error("cookie signature does not match its payload")]
    BadSignature,

    #[error(transparent)]
    Decryption(#[from] DecryptionError),

    #[error("cookie payload encryption failed")]
    Encryption,

    #[error("cookie value exceeds max_cookie_bytes ({size} > {max})")]
    TooLarge { size: usize, max: usize },
}
