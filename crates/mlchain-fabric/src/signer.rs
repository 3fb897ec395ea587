//! # Identity Keys and Request Signing
//!
//! Enrollment generates an Ed25519 key pair locally; only the public half is
//! sent to the CA. The private half is stored in the wallet as a hex-encoded
//! 32-byte seed and later signs CA registration tokens and gateway requests.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use ed25519_dalek::{Signer as _, SigningKey};
use mlchain_core::Credential;
use rand_core::OsRng;
use zeroize::Zeroizing;

/// Errors loading a private key from a credential.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// The stored key is not valid hex.
    #[error("private key is not hex: {0}")]
    Hex(#[from] hex::FromHexError),
    /// The stored key has the wrong length.
    #[error("private key must be 32 bytes, got {0}")]
    Length(usize),
}

/// An Ed25519 identity key.
pub struct IdentityKey {
    signing: SigningKey,
}

impl IdentityKey {
    /// Generate a fresh key from the OS random source.
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Load the key stored in a wallet credential.
    pub fn from_credential(credential: &Credential) -> Result<Self, KeyError> {
        Self::from_hex(credential.private_key())
    }

    /// Parse a hex-encoded 32-byte seed.
    pub fn from_hex(encoded: &str) -> Result<Self, KeyError> {
        let bytes = Zeroizing::new(hex::decode(encoded.trim())?);
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::Length(bytes.len()))?;
        Ok(Self {
            signing: SigningKey::from_bytes(&seed),
        })
    }

    /// Hex-encoded seed, as stored in the wallet.
    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.signing.to_bytes()))
    }

    /// Base64-encoded public key, as sent to the CA.
    pub fn public_key_b64(&self) -> String {
        B64.encode(self.signing.verifying_key().as_bytes())
    }

    /// Sign `message`; returns the base64-encoded 64-byte signature.
    pub fn sign_b64(&self, message: &[u8]) -> String {
        B64.encode(self.signing.sign(message).to_bytes())
    }

    /// Build a CA registration token: `<b64 cert>.<b64 sig>`, where the
    /// signature covers `<b64 body>.<b64 cert>`.
    pub fn authorization_token(&self, certificate: &str, body: &[u8]) -> String {
        let cert_b64 = B64.encode(certificate.as_bytes());
        let signed = format!("{}.{}", B64.encode(body), cert_b64);
        format!("{}.{}", cert_b64, self.sign_b64(signed.as_bytes()))
    }
}

impl std::fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityKey")
            .field("public_key", &self.public_key_b64())
            .finish_non_exhaustive()
    }
}
