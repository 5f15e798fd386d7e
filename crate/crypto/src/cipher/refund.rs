use base64::{Engine, engine::general_purpose::STANDARD};
use openssl::symm::{Cipher, decrypt, encrypt};
use wxpay_logger::trace;

use crate::{CryptoError, CryptoResultHelper, crypto_ensure, error::result::CryptoResult};

/// The refund key is the 32 character hex MD5 of the partner key.
pub const REFUND_KEY_LENGTH: usize = 32;

/// Decrypt the `req_info` field of a refund notification.
///
/// `encrypted` is base64 text; the AES-256-ECB plaintext, PKCS#7 padding removed, must be
/// UTF-8 (it is itself an XML document). Any base64, padding or UTF-8 failure is a
/// [`CryptoError::Decrypt`].
pub fn decrypt_refund_info(encrypted: &str, refund_key: &[u8]) -> CryptoResult<String> {
    check_key(refund_key)?;
    let compact: String = encrypted
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let ciphertext = STANDARD
        .decode(compact.as_bytes())
        .decrypt_context("req_info is not valid base64")?;
    trace!("decrypting {} bytes of refund info", ciphertext.len());
    let plaintext = decrypt(Cipher::aes_256_ecb(), refund_key, None, &ciphertext)
        .decrypt_context("AES-256-ECB decryption")?;
    String::from_utf8(plaintext).decrypt_context("refund info is not UTF-8")
}

/// Inverse of [`decrypt_refund_info`]: what the gateway does before sending the payload.
pub fn encrypt_refund_info(plaintext: &str, refund_key: &[u8]) -> CryptoResult<String> {
    check_key(refund_key)?;
    let ciphertext = encrypt(Cipher::aes_256_ecb(), refund_key, None, plaintext.as_bytes())?;
    Ok(STANDARD.encode(ciphertext))
}

fn check_key(key: &[u8]) -> CryptoResult<()> {
    crypto_ensure!(
        key.len() == REFUND_KEY_LENGTH,
        CryptoError::InvalidSize(format!(
            "refund key must be {REFUND_KEY_LENGTH} bytes long. Found {} bytes",
            key.len()
        ))
    );
    Ok(())
}
