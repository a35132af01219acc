//! Paystack webhook signatures: hex HMAC-SHA512 of the raw request body.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use subtle::ConstantTimeEq;

type HmacSha512 = Hmac<Sha512>;

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Computes the hex signature of `body` under `secret`.
pub fn sign(secret: &[u8], body: &[u8]) -> String {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha512::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Checks a hex signature in constant time.
pub fn verify(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let Ok(provided) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    let expected = mac.finalize().into_bytes();
    expected.as_slice().ct_eq(&provided).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"sk_test_secret";
    const BODY: &[u8] = br#"{"event":"charge.success","data":{"reference":"DEP_1"}}"#;

    #[test]
    fn test_signature_round_trip() {
        let sig = sign(SECRET, BODY);
        assert_eq!(sig.len(), 128);
        assert!(verify(SECRET, BODY, &sig));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let sig = sign(SECRET, BODY);
        assert!(!verify(SECRET, b"{}", &sig));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let sig = sign(b"other", BODY);
        assert!(!verify(SECRET, BODY, &sig));
    }

    #[test]
    fn test_garbage_signature_rejected() {
        assert!(!verify(SECRET, BODY, ""));
        assert!(!verify(SECRET, BODY, "not-hex"));
        assert!(!verify(SECRET, BODY, "abcd"));
    }
}
