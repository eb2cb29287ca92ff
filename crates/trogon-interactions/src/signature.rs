use ed25519_dalek::{PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH, Signature, VerifyingKey};
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

#[derive(Debug, Error)]
pub enum PublicKeyError {
    #[error("public key is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("public key must be {PUBLIC_KEY_LENGTH} bytes, got {0}")]
    Length(usize),

    #[error("public key is not a valid Ed25519 point")]
    Invalid,
}

/// Verifies Discord's `X-Signature-Ed25519` header.
///
/// Discord signs `timestamp ‖ body` with the application's private key; the
/// signature is sent hex-encoded alongside `X-Signature-Timestamp`.
#[derive(Debug, Clone)]
pub struct InteractionVerifier {
    key: VerifyingKey,
}

impl InteractionVerifier {
    /// Parse the application's hex-encoded public key.
    pub fn from_hex(public_key: &str) -> Result<Self, PublicKeyError> {
        let bytes = hex::decode(public_key.trim())?;
        let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| PublicKeyError::Length(bytes.len()))?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|_| PublicKeyError::Invalid)?;
        Ok(Self { key })
    }

    pub fn verify(&self, timestamp: &str, body: &[u8], signature_hex: &str) -> bool {
        let Ok(sig_bytes) = hex::decode(signature_hex.trim()) else {
            return false;
        };
        let Ok(sig_bytes) = <[u8; SIGNATURE_LENGTH]>::try_from(sig_bytes.as_slice()) else {
            return false;
        };
        let signature = Signature::from_bytes(&sig_bytes);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key.verify_strict(&message, &signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn keypair(seed: u8) -> (SigningKey, InteractionVerifier) {
        let signing = SigningKey::from_bytes(&[seed; 32]);
        let verifier =
            InteractionVerifier::from_hex(&hex::encode(signing.verifying_key().to_bytes()))
                .unwrap();
        (signing, verifier)
    }

    fn sign(key: &SigningKey, timestamp: &str, body: &[u8]) -> String {
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        hex::encode(key.sign(&message).to_bytes())
    }

    #[test]
    fn valid_signature_passes() {
        let (signing, verifier) = keypair(7);
        let sig = sign(&signing, "1700000000", br#"{"type":1}"#);
        assert!(verifier.verify("1700000000", br#"{"type":1}"#, &sig));
    }

    #[test]
    fn wrong_key_fails() {
        let (signing, _) = keypair(7);
        let (_, other) = keypair(8);
        let sig = sign(&signing, "1700000000", b"body");
        assert!(!other.verify("1700000000", b"body", &sig));
    }

    #[test]
    fn tampered_body_fails() {
        let (signing, verifier) = keypair(1);
        let sig = sign(&signing, "1700000000", b"signed body");
        assert!(!verifier.verify("1700000000", b"tampered", &sig));
    }

    #[test]
    fn tampered_timestamp_fails() {
        let (signing, verifier) = keypair(1);
        let sig = sign(&signing, "1700000000", b"body");
        assert!(!verifier.verify("1700000001", b"body", &sig));
    }

    #[test]
    fn invalid_hex_fails() {
        let (_, verifier) = keypair(2);
        assert!(!verifier.verify("1", b"body", "not-valid-hex!"));
    }

    #[test]
    fn short_signature_fails() {
        let (_, verifier) = keypair(2);
        assert!(!verifier.verify("1", b"body", "abcd"));
        assert!(!verifier.verify("1", b"body", ""));
    }

    #[test]
    fn empty_body_with_valid_sig_passes() {
        let (signing, verifier) = keypair(3);
        let sig = sign(&signing, "ts", b"");
        assert!(verifier.verify("ts", b"", &sig));
    }

    #[test]
    fn public_key_errors() {
        assert!(matches!(
            InteractionVerifier::from_hex("zz"),
            Err(PublicKeyError::Hex(_))
        ));
        assert!(matches!(
            InteractionVerifier::from_hex("abcd"),
            Err(PublicKeyError::Length(2))
        ));
    }

    #[test]
    fn public_key_whitespace_is_trimmed() {
        let (signing, _) = keypair(4);
        let hex_key = format!("  {}\n", hex::encode(signing.verifying_key().to_bytes()));
        assert!(InteractionVerifier::from_hex(&hex_key).is_ok());
    }
}
