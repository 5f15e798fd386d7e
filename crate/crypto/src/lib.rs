pub use cipher::{
    AES_256_GCM_KEY_LENGTH, AES_256_GCM_TAG_LENGTH, CipherEnvelope, REFUND_KEY_LENGTH,
    decrypt_aead, decrypt_refund_info, encrypt_aead, encrypt_refund_info,
};
pub use error::{CryptoError, result::CryptoResultHelper};
pub use rsa::{RsaPadding, encrypt_rsa};
pub use sign::{
    SignType, derive_refund_key, hmac_sha256_hex, md5_hex, sign, signing_string, verify,
    verify_fields,
};

mod cipher;
mod error;
mod rsa;
mod sign;
