use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Check a delivery against the `X-Hub-Signature-256` header (`sha256=<hex>`).
pub fn verify_signature(secret: &str, payload: &[u8], header: Option<&str>) -> Result<()> {
    let header = header
        .ok_or_else(|| AppError::WebhookVerification(format!("Missing {SIGNATURE_HEADER}")))?;

    let expected = header
        .strip_prefix("sha256=")
        .and_then(|hex_digest| hex::decode(hex_digest).ok())
        .ok_or_else(|| AppError::WebhookVerification("Malformed signature header".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::WebhookVerification(format!("Invalid HMAC key: {e}")))?;
    mac.update(payload);

    // verify_slice compares in constant time
    mac.verify_slice(&expected)
        .map_err(|_| AppError::WebhookVerification("Signature mismatch".to_string()))
}
