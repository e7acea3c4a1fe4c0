//! HMAC signing of cookie payloads.

use std::fmt;

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

use crate::error::ConfigError;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// MAC used to sign cookie payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// 40 hex characters.
    #[default]
    HmacSha1,
    /// 64 hex characters.
    HmacSha256,
}

#[derive(Clone)]
enum KeyedMac {
    Sha1(HmacSha1),
    Sha256(HmacSha256),
}

/// Signs and verifies payloads with the server secret.
///
/// The keyed MAC state is computed once; every signature starts from a
/// clone of it, so a `Signer` can be shared freely between requests.
#[derive(Clone)]
pub struct Signer {
    mac: KeyedMac,
}

impl Signer {
    pub fn new(secret: &[u8], algorithm: SignatureAlgorithm) -> Result<Self, ConfigError> {
        let mac = match algorithm {
            SignatureAlgorithm::HmacSha1 => KeyedMac::Sha1(
                HmacSha1::new_from_slice(secret).map_err(|_| ConfigError::KeyDerivation)?,
            ),
            SignatureAlgorithm::HmacSha256 => KeyedMac::Sha256(
                HmacSha256::new_from_slice(secret).map_err(|_| ConfigError::KeyDerivation)?,
            ),
        };
        Ok(Self { mac })
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        match self.mac {
            KeyedMac::Sha1(_) => SignatureAlgorithm::HmacSha1,
            KeyedMac::Sha256(_) => SignatureAlgorithm::HmacSha256,
        }
    }

    /// Lowercase hex HMAC of `payload`.
    pub fn sign(&self, payload: &[u8]) -> String {
        match &self.mac {
            KeyedMac::Sha1(mac) => {
                let mut mac = mac.clone();
                mac.update(payload);
                hex::encode(mac.finalize().into_bytes())
            }
            KeyedMac::Sha256(mac) => {
                let mut mac = mac.clone();
                mac.update(payload);
                hex::encode(mac.finalize().into_bytes())
            }
        }
    }

    /// Constant-time check of a hex signature against `payload`.
    pub fn verify(&self, payload: &[u8], signature: &str) -> bool {
        let Ok(signature) = hex::decode(signature) else {
            return false;
        };

        match &self.mac {
            KeyedMac::Sha1(mac) => {
                let mut mac = mac.clone();
                mac.update(payload);
                mac.verify_slice(&signature).is_ok()
            }
            KeyedMac::Sha256(mac) => {
                let mut mac = mac.clone();
                mac.update(payload);
                mac.verify_slice(&signature).is_ok()
            }
        }
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}
