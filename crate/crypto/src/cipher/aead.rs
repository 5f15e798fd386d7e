use base64::{Engine, engine::general_purpose::STANDARD};
use openssl::symm::{Cipher, decrypt_aead as openssl_decrypt_aead, encrypt_aead as openssl_encrypt_aead};
use serde::{Deserialize, Serialize};
use wxpay_logger::trace;

use crate::{CryptoError, CryptoResultHelper, crypto_ensure, error::result::CryptoResult};

/// AES 256 GCM key length in bytes.
pub const AES_256_GCM_KEY_LENGTH: usize = 32;
/// AES 256 GCM tag/mac length in bytes.
pub const AES_256_GCM_TAG_LENGTH: usize = 16;

/// An encrypted resource as delivered by the gateway (`encrypt_certificate`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    /// base64 of `ciphertext || tag`
    pub ciphertext: String,
    pub nonce: String,
    #[serde(default)]
    pub associated_data: String,
}

/// Open an envelope with the API v3 key.
///
/// The last [`AES_256_GCM_TAG_LENGTH`] bytes of the decoded ciphertext are the tag. A tag,
/// nonce or associated data mismatch fails with [`CryptoError::Decrypt`] and no plaintext
/// is released.
pub fn decrypt_aead(envelope: &CipherEnvelope, key: &[u8]) -> CryptoResult<String> {
    check_key(key)?;
    let sealed = STANDARD
        .decode(envelope.ciphertext.as_bytes())
        .decrypt_context("ciphertext is not valid base64")?;
    crypto_ensure!(
        sealed.len() >= AES_256_GCM_TAG_LENGTH,
        CryptoError::Decrypt(format!(
            "ciphertext of {} bytes cannot hold a {AES_256_GCM_TAG_LENGTH} bytes tag",
            sealed.len()
        ))
    );
    let (ciphertext, tag) = sealed.split_at(sealed.len() - AES_256_GCM_TAG_LENGTH);
    trace!("decrypting {} bytes with AES-256-GCM", ciphertext.len());
    let plaintext = openssl_decrypt_aead(
        Cipher::aes_256_gcm(),
        key,
        Some(envelope.nonce.as_bytes()),
        envelope.associated_data.as_bytes(),
        ciphertext,
        tag,
    )
    .decrypt_context("AES-256-GCM authentication failed")?;
    String::from_utf8(plaintext).decrypt_context("plaintext is not UTF-8")
}

/// Seal `plaintext` the way the gateway does.
pub fn encrypt_aead(
    plaintext: &str,
    key: &[u8],
    nonce: &str,
    associated_data: &str,
) -> CryptoResult<CipherEnvelope> {
    check_key(key)?;
    let mut tag = vec![0; AES_256_GCM_TAG_LENGTH];
    let mut sealed = openssl_encrypt_aead(
        Cipher::aes_256_gcm(),
        key,
        Some(nonce.as_bytes()),
        associated_data.as_bytes(),
        plaintext.as_bytes(),
        &mut tag,
    )?;
    sealed.extend_from_slice(&tag);
    Ok(CipherEnvelope {
        algorithm: Some("AEAD_AES_256_GCM".to_owned()),
        ciphertext: STANDARD.encode(sealed),
        nonce: nonce.to_owned(),
        associated_data: associated_data.to_owned(),
    })
}

fn check_key(key: &[u8]) -> CryptoResult<()> {
    crypto_ensure!(
        key.len() == AES_256_GCM_KEY_LENGTH,
        CryptoError::InvalidSize(format!(
            "API v3 key must be {AES_256_GCM_KEY_LENGTH} bytes long. Found {} bytes",
            key.len()
        ))
    );
    Ok(())
}
