//! Signing of the owner identity carried in the `user_data` cookie.
//!
//! The cookie value is `<user-id>.<hex HMAC-SHA256(user-id)>`. The secret never
//! leaves the server, so a client cannot forge another user's identity.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("signing secret rejected: {0}")]
    InvalidKey(String),
}

/// Signs and verifies identity cookie values.
#[derive(Clone)]
pub struct IdentitySigner {
    mac: HmacSha256,
}

impl IdentitySigner {
    /// Keys a signer with `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::EmptySecret`] for an empty secret.
    pub fn new(secret: &str) -> Result<Self, SignerError> {
        if secret.is_empty() {
            return Err(SignerError::EmptySecret);
        }

        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| SignerError::InvalidKey(e.to_string()))?;

        Ok(Self { mac })
    }

    fn mac(&self) -> HmacSha256 {
        self.mac.clone()
    }

    /// Produces the cookie value for `user_id`.
    pub fn sign(&self, user_id: &str) -> String {
        let mut mac = self.mac();
        mac.update(user_id.as_bytes());
        format!("{}.{}", user_id, hex::encode(mac.finalize().into_bytes()))
    }

    /// Returns the user id if the cookie value carries a valid signature.
    pub fn verify(&self, value: &str) -> Option<String> {
        let (user_id, signature) = value.rsplit_once('.')?;
        let signature = hex::decode(signature).ok()?;

        let mut mac = self.mac();
        mac.update(user_id.as_bytes());
        mac.verify_slice(&signature).ok()?;

        Some(user_id.to_string())
    }

    /// Creates a fresh user id together with its signed cookie value.
    pub fn issue(&self) -> (String, String) {
        let user_id = uuid::Uuid::new_v4().to_string();
        let value = self.sign(&user_id);
        (user_id, value)
    }
}
