//! Public-key encryption of sensitive request fields (bank account number and holder name
//! of the pay-to-bank endpoint) with the key returned by the `getPublicKey` endpoint.

use base64::{Engine, engine::general_purpose::STANDARD};
use openssl::rsa::{Padding, Rsa};

use crate::{CryptoError, error::result::CryptoResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RsaPadding {
    #[default]
    Oaep,
    Pkcs1,
}

impl From<RsaPadding> for Padding {
    fn from(padding: RsaPadding) -> Self {
        match padding {
            RsaPadding::Oaep => Self::PKCS1_OAEP,
            RsaPadding::Pkcs1 => Self::PKCS1,
        }
    }
}

/// Encrypt `plaintext` with a PEM public key (PKCS#1 `RSA PUBLIC KEY` or SPKI
/// `PUBLIC KEY`) and return the base64 ciphertext.
pub fn encrypt_rsa(
    plaintext: &[u8],
    public_key_pem: &[u8],
    padding: RsaPadding,
) -> CryptoResult<String> {
    let rsa = Rsa::public_key_from_pem_pkcs1(public_key_pem)
        .or_else(|_| Rsa::public_key_from_pem(public_key_pem))
        .map_err(|e| CryptoError::ConversionError(format!("invalid RSA public key: {e}")))?;
    let mut ciphertext = vec![0; usize::try_from(rsa.size()).map_err(|e| {
        CryptoError::ConversionError(format!("RSA key size: {e}"))
    })?];
    let len = rsa.public_encrypt(plaintext, &mut ciphertext, padding.into())?;
    ciphertext.truncate(len);
    Ok(STANDARD.encode(ciphertext))
}
