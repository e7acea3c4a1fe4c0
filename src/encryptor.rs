//! Optional payload encryption.
//!
//! AES-256-GCM with a key expanded from the server secret via HKDF-SHA256, so
//! the secret may have any length. Ciphertexts are `nonce || ciphertext+tag`.

use std::fmt;

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::{ConfigError, CookieError, DecryptionError};

const KEY_INFO: &[u8] = b"tower-cookie-session/encryption/v1";
const NONCE_LEN: usize = 12;

#[derive(Clone)]
pub struct Encryptor {
    cipher: Aes256Gcm,
}

impl Encryptor {
    pub fn new(secret: &[u8]) -> Result<Self, ConfigError> {
        let mut key = [0u8; 32];
        Hkdf::<Sha256>::new(None, secret)
            .expand(KEY_INFO, &mut key)
            .map_err(|_| ConfigError::KeyDerivation)?;

        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| ConfigError::KeyDerivation)?;
        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CookieError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CookieError::Encryption)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, DecryptionError> {
        if data.len() < NONCE_LEN {
            return Err(DecryptionError);
        }
        let (nonce, ciphertext) = data.split_at(NONCE_LEN);

        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| DecryptionError)
    }
}

impl fmt::Debug for Encryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encryptor")
            .field("cipher", &"AES-256-GCM")
            .finish_non_exhaustive()
    }
}
