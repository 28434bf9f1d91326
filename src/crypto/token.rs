use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use aes_gcm::aead::rand_core::RngCore;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use zeroize::{Zeroize, ZeroizeOnDrop};
use crate::error::{AppError, Result};

/// The size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// The size of the AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// The size of the AES-GCM authentication tag in bytes.
const TAG_SIZE: usize = 16;

/// A secure key wrapper that ensures the key is zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecureKey([u8; KEY_SIZE]);

impl SecureKey {
    /// Returns a reference to the key as a byte slice.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

/// Derives the fixed-length AES-256 key from the configured secret string.
///
/// The secret's UTF-8 bytes are padded with ASCII `'0'` up to 32 bytes and
/// truncated to 32 bytes. This is deliberately compatible with tokens
/// written by the predecessor system; it is not a KDF and must not be
/// presented as one.
pub fn derive_key(secret: &str) -> SecureKey {
    let mut key = [b'0'; KEY_SIZE];
    let bytes = secret.as_bytes();
    let len = bytes.len().min(KEY_SIZE);
    key[..len].copy_from_slice(&bytes[..len]);
    SecureKey(key)
}

/// Encrypts a plaintext into a transport-safe token.
///
/// Draws a fresh random 96-bit nonce per call, encrypts with AES-256-GCM
/// and base64-encodes `nonce || ciphertext || tag`.
pub fn encrypt(plaintext: &str, secret: &str) -> Result<String> {
    let key = derive_key(secret);
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from(nonce_bytes);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| AppError::Encryption(format!("Encryption failed: {}", e)))?;

    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(combined))
}

/// Decrypts a token produced by [`encrypt`].
///
/// Fails with `AppError::Decryption` on a malformed token, tampering, or a
/// secret mismatch. Never returns partial plaintext.
pub fn decrypt(token: &str, secret: &str) -> Result<String> {
    let combined = BASE64
        .decode(token)
        .map_err(|e| AppError::Decryption(format!("Invalid token encoding: {}", e)))?;

    if combined.len() < NONCE_SIZE + TAG_SIZE {
        return Err(AppError::Decryption("Token too short".to_string()));
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let key = derive_key(secret);
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| AppError::Decryption("Authentication failed".to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|_| AppError::Decryption("Plaintext is not valid UTF-8".to_string()))
}
