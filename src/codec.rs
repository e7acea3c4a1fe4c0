use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::{
    encryptor::Encryptor,
    error::{CookieError, DecryptionError},
    format,
    signer::Signer,
};

const SIGNATURE_SEPARATOR: char = '-';

/// Turns a map into a signed (and optionally encrypted) cookie value and back.
///
/// Cookie values have the form `signature-payload`, where `payload` is the
/// base64url (unpadded) [`format`] encoding of the map, or of its AES-GCM
/// ciphertext when encryption is enabled. The signature always covers the
/// payload exactly as it appears in the cookie.
///
/// The payload never contains `%`, so cookie layers that percent-decode
/// inbound values hand it back unchanged.
#[derive(Debug, Clone)]
pub struct CookieCodec {
    signer: Signer,
    encryptor: Option<Encryptor>,
}

impl CookieCodec {
    pub fn signed(signer: Signer) -> Self {
        Self {
            signer,
            encryptor: None,
        }
    }

    pub fn private(signer: Signer, encryptor: Encryptor) -> Self {
        Self {
            signer,
            encryptor: Some(encryptor),
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryptor.is_some()
    }

    pub fn seal(&self, entries: &BTreeMap<String, String>) -> Result<String, CookieError> {
        let plaintext = format::encode_map(entries);
        let payload = match &self.encryptor {
            Some(encryptor) => URL_SAFE_NO_PAD.encode(encryptor.encrypt(plaintext.as_bytes())?),
            None => URL_SAFE_NO_PAD.encode(plaintext),
        };

        let signature = self.signer.sign(payload.as_bytes());
        Ok(format!("{signature}{SIGNATURE_SEPARATOR}{payload}"))
    }

    pub fn open(&self, value: &str) -> Result<BTreeMap<String, String>, CookieError> {
        let (signature, payload) = value
            .split_once(SIGNATURE_SEPARATOR)
            .ok_or(CookieError::Malformed)?;

        if !self.signer.verify(payload.as_bytes(), signature) {
            return Err(CookieError::BadSignature);
        }

        let plaintext = match &self.encryptor {
            Some(encryptor) => {
                let ciphertext = URL_SAFE_NO_PAD
                    .decode(payload)
                    .map_err(|_| DecryptionError)?;
                let plaintext = encryptor.decrypt(&ciphertext)?;
                String::from_utf8(plaintext).map_err(|_| DecryptionError)?
            }
            None => {
                let plaintext = URL_SAFE_NO_PAD
                    .decode(payload)
                    .map_err(|_| CookieError::Malformed)?;
                String::from_utf8(plaintext).map_err(|_| CookieError::Malformed)?
            }
        };

        Ok(format::decode_map(&plaintext))
    }
}
