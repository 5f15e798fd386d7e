use std::{str::Utf8Error, string::FromUtf8Error};

use thiserror::Error;

pub(crate) mod result;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Conversion Error: {0}")]
    ConversionError(String),

    #[error("Decryption failed: {0}")]
    Decrypt(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("OpenSSL Error: {0}")]
    OpenSSL(String),

    #[error("signType Error: unsupported signature algorithm '{0}'")]
    SignType(String),
}

impl From<openssl::error::ErrorStack> for CryptoError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::OpenSSL(format!("Error: {e}. Details: {e:?}"))
    }
}

impl From<base64::DecodeError> for CryptoError {
    fn from(e: base64::DecodeError) -> Self {
        Self::ConversionError(format!("invalid base64: {e}"))
    }
}

impl From<FromUtf8Error> for CryptoError {
    fn from(e: FromUtf8Error) -> Self {
        Self::ConversionError(e.to_string())
    }
}

impl From<Utf8Error> for CryptoError {
    fn from(e: Utf8Error) -> Self {
        Self::ConversionError(e.to_string())
    }
}

/// Return `$err` early unless `$cond` holds.
#[macro_export]
macro_rules! crypto_ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return ::core::result::Result::Err($err);
        }
    };
}
