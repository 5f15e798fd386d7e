//! The two payload ciphers of the gateway.
//!
//! They share nothing but AES-256: the refund notification cipher is ECB with PKCS#7
//! padding keyed by the derived refund key, the certificate cipher is GCM keyed by the
//! API v3 key with an explicit nonce, associated data and a trailing 16-byte tag.

pub use aead::{
    AES_256_GCM_KEY_LENGTH, AES_256_GCM_TAG_LENGTH, CipherEnvelope, decrypt_aead, encrypt_aead,
};
pub use refund::{REFUND_KEY_LENGTH, decrypt_refund_info, encrypt_refund_info};

mod aead;
mod refund;
