//! Payload signing
//!
//! HMAC-SHA256 over the exact serialized payload bytes, carried in the
//! `X-Hub-Signature-256` header as `sha256=<hex>`.

use crate::{Result, WebhookError};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Signs outbound payloads with a shared secret.
#[derive(Clone)]
pub struct WebhookSigner {
    secret: Vec<u8>,
}

impl WebhookSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Hex HMAC-SHA256 of the payload bytes.
    pub fn sign(&self, payload: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can accept any key length");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    /// The full `sha256=<hex>` header value for a payload.
    pub fn header_value(&self, payload: &[u8]) -> String {
        format!("sha256={}", self.sign(payload))
    }

    /// Verify a received `sha256=<hex>` header value against a payload.
    ///
    /// Provided for subscribers implemented on the same crate; delivery
    /// itself only signs.
    pub fn verify(&self, payload: &[u8], header_value: &str) -> Result<()> {
        let received = header_value.strip_prefix("sha256=").ok_or_else(|| {
            WebhookError::Serialization("signature header missing sha256 prefix".to_string())
        })?;

        let expected = self.sign(payload);
        if constant_time_compare(received, &expected) {
            Ok(())
        } else {
            Err(WebhookError::Serialization(
                "signature mismatch".to_string(),
            ))
        }
    }
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_is_deterministic() {
        let signer = WebhookSigner::new("secret");
        let payload = br#"{"Type":"text_message"}"#;
        assert_eq!(signer.sign(payload), signer.sign(payload));
    }

    #[test]
    fn test_header_value_format() {
        let signer = WebhookSigner::new("secret");
        let header = signer.header_value(b"body");
        assert!(header.starts_with("sha256="));
        // hex digest of SHA-256 is 64 chars
        assert_eq!(header.len(), "sha256=".len() + 64);
    }

    #[test]
    fn test_verify_roundtrip() {
        let signer = WebhookSigner::new("secret");
        let payload = b"payload bytes";
        let header = signer.header_value(payload);
        assert!(signer.verify(payload, &header).is_ok());
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let signer = WebhookSigner::new("secret-a");
        let other = WebhookSigner::new("secret-b");
        let payload = b"payload bytes";
        let header = signer.header_value(payload);
        assert!(other.verify(payload, &header).is_err());
    }

    #[test]
    fn test_verify_rejects_modified_payload() {
        let signer = WebhookSigner::new("secret");
        let header = signer.header_value(b"original");
        assert!(signer.verify(b"tampered", &header).is_err());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "ab"));
    }
}
