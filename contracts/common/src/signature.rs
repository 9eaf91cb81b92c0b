//! Signature Scheme
//!
//! `verify(public_key, message, signature)` over an ordered sequence of
//! field elements. The bundled scheme is Ed25519; the attestor is generic
//! over [`SignatureScheme`] so another curve can be swapped in.

use core::fmt;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::constants::{domain, keys};
use crate::errors::{AttestorError, AttestorResult};
use crate::types::{FieldElement, PublicKey, Signature};
use crate::Vec;

/// Signature verification primitive
pub trait SignatureScheme {
    /// Check that `key` is usable for verification
    fn validate_key(&self, key: &PublicKey) -> AttestorResult<()>;

    /// Verify `signature` over `message` under `key`
    ///
    /// Returns `Ok(false)` for a well-formed signature that does not verify.
    ///
    /// # Errors
    /// - `MalformedSignature` before any curve arithmetic if the signature is structurally invalid
    /// - `InvalidPublicKey` if `key` is not a valid point
    fn verify(
        &self,
        key: &PublicKey,
        message: &[FieldElement],
        signature: &Signature,
    ) -> AttestorResult<bool>;
}

/// Byte encoding of a field-element message, shared by signing and verifying
pub fn encode_message(message: &[FieldElement]) -> Vec<u8> {
    let mut out = Vec::with_capacity(domain::SIGNED_MESSAGE.len() + 8 + message.len() * 32);
    out.extend_from_slice(domain::SIGNED_MESSAGE);
    out.extend_from_slice(&(message.len() as u64).to_le_bytes());
    for element in message {
        out.extend_from_slice(element.as_bytes());
    }
    out
}

/// Ed25519 over [`encode_message`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ed25519Scheme;

impl Ed25519Scheme {
    fn verifying_key(key: &PublicKey) -> AttestorResult<VerifyingKey> {
        VerifyingKey::from_bytes(key.as_bytes()).map_err(|_| AttestorError::InvalidPublicKey)
    }
}

impl SignatureScheme for Ed25519Scheme {
    fn validate_key(&self, key: &PublicKey) -> AttestorResult<()> {
        let vk = Self::verifying_key(key)?;
        if vk.is_weak() {
            return Err(AttestorError::InvalidPublicKey);
        }
        Ok(())
    }

    fn verify(
        &self,
        key: &PublicKey,
        message: &[FieldElement],
        signature: &Signature,
    ) -> AttestorResult<bool> {
        signature.check_well_formed()?;
        let vk = Self::verifying_key(key)?;
        let sig = ed25519_dalek::Signature::from_components(signature.r, signature.s);
        Ok(vk.verify_strict(&encode_message(message), &sig).is_ok())
    }
}

// ============ Private Keys ============

/// Ed25519 private key seed
///
/// Only ever used to derive the authority key and to sign. Debug output is
/// redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateKey([u8; keys::PRIVATE_KEY_LEN]);

impl PrivateKey {
    pub const fn from_seed(seed: [u8; keys::PRIVATE_KEY_LEN]) -> Self {
        Self(seed)
    }

    fn signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(&self.0)
    }

    /// Derive the matching public key
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key().verifying_key().to_bytes())
    }

    /// Sign a field-element message
    pub fn sign(&self, message: &[FieldElement]) -> Signature {
        let sig = self.signing_key().sign(&encode_message(message));
        Signature::from_components(*sig.r_bytes(), *sig.s_bytes())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(seed: u8) -> PrivateKey {
        PrivateKey::from_seed([seed; 32])
    }

    #[test]
    fn test_sign_verify() {
        let sk = key(7);
        let msg = [FieldElement::from_u64(42)];
        let sig = sk.sign(&msg);

        assert_eq!(Ed25519Scheme.verify(&sk.public_key(), &msg, &sig), Ok(true));
    }

    #[test]
    fn test_wrong_message_fails() {
        let sk = key(7);
        let sig = sk.sign(&[FieldElement::from_u64(42)]);

        assert_eq!(
            Ed25519Scheme.verify(&sk.public_key(), &[FieldElement::from_u64(43)], &sig),
            Ok(false)
        );
    }

    #[test]
    fn test_wrong_key_fails() {
        let msg = [FieldElement::from_u64(42)];
        let sig = key(7).sign(&msg);

        assert_eq!(Ed25519Scheme.verify(&key(8).public_key(), &msg, &sig), Ok(false));
    }

    #[test]
    fn test_malformed_rejected_before_key_decoding() {
        let mut sig = key(7).sign(&[FieldElement::ZERO]);
        sig.s[31] |= 0x80;

        // all-0xFF is not a valid point either, but the signature check comes first
        let result = Ed25519Scheme.verify(&PublicKey([0xFF; 32]), &[FieldElement::ZERO], &sig);
        assert!(matches!(result, Err(AttestorError::MalformedSignature { .. })));
    }

    #[test]
    fn test_message_length_is_bound() {
        let sk = key(7);
        let sig = sk.sign(&[FieldElement::ZERO]);

        assert_eq!(
            Ed25519Scheme.verify(&sk.public_key(), &[FieldElement::ZERO, FieldElement::ZERO], &sig),
            Ok(false)
        );
    }

    #[test]
    fn test_validate_key() {
        assert!(Ed25519Scheme.validate_key(&key(1).public_key()).is_ok());
        // identity point is a small-order (weak) key
        let mut identity = [0u8; 32];
        identity[0] = 1;
        assert_eq!(
            Ed25519Scheme.validate_key(&PublicKey(identity)),
            Err(AttestorError::InvalidPublicKey)
        );
    }

    #[test]
    fn test_private_key_debug_is_redacted() {
        let text = format!("{:?}", key(9));
        assert!(!text.contains('9'));
    }
}
