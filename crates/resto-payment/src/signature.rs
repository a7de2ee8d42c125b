//! # Notification Signature
//!
//! The gateway signs every notification with
//! `hex(SHA512(order_id + status_code + gross_amount + server_key))`.
//! `gross_amount` is the exact string the gateway sent (e.g. `"24200.00"`).

use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use crate::error::{GatewayError, GatewayResult};

fn digest(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str) -> Vec<u8> {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hasher.finalize().to_vec()
}

/// Computes the expected `signature_key`.
pub fn sign(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str) -> String {
    hex::encode(digest(order_id, status_code, gross_amount, server_key))
}

/// Checks a notification's `signature_key`.
///
/// A missing or non-hex signature is treated as a mismatch. The decoded
/// digests are compared in constant time, so hex case does not matter.
pub fn verify(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
    signature_key: Option<&str>,
) -> GatewayResult<()> {
    let Some(given) = signature_key else {
        return Err(GatewayError::InvalidSignature);
    };

    let given = hex::decode(given.trim()).map_err(|_| GatewayError::InvalidSignature)?;
    let expected = digest(order_id, status_code, gross_amount, server_key);
    if bool::from(expected.as_slice().ct_eq(given.as_slice())) {
        Ok(())
    } else {
        Err(GatewayError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_is_sha512_hex() {
        let sig = sign("order-1", "200", "24200.00", "SB-Mid-server-xyz");
        assert_eq!(sig.len(), 128);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(sig, sign("order-1", "200", "24200.00", "other-key"));
    }

    #[test]
    fn test_verify() {
        let sig = sign("order-1", "200", "24200.00", "key");
        assert!(verify("order-1", "200", "24200.00", "key", Some(&sig)).is_ok());
        assert!(verify("order-1", "200", "24200.00", "key", Some(&sig.to_uppercase())).is_ok());
        // Amount tampered.
        assert!(matches!(
            verify("order-1", "200", "1.00", "key", Some(&sig)),
            Err(GatewayError::InvalidSignature)
        ));
        assert!(verify("order-1", "200", "24200.00", "key", None).is_err());
    }

    #[test]
    fn test_verify_rejects_malformed_signatures() {
        let sig = sign("order-1", "200", "24200.00", "key");
        for bad in [&sig[..126], "zz", "", &sig[2..]] {
            assert!(verify("order-1", "200", "24200.00", "key", Some(bad)).is_err(), "{bad}");
        }
        let mut flipped = sig.clone().into_bytes();
        flipped[127] = if flipped[127] == b'0' { b'1' } else { b'0' };
        let flipped = String::from_utf8(flipped).unwrap();
        assert!(verify("order-1", "200", "24200.00", "key", Some(&flipped)).is_err());
    }
}
