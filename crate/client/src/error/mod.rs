use std::io;

use thiserror::Error;
use wxpay_crypto::CryptoError;
use wxpay_protocol::ProtocolError;

pub(crate) mod result;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Decryption failed: {0}")]
    Decrypt(String),

    #[error("{0}")]
    Default(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Gateway rejected the request: {0}")]
    RemoteStatus(String),

    #[error("REQUEST_FAIL: {0}")]
    RequestFailed(String),

    #[error("signType Error: {0}")]
    SignType(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("XMLDataError: {0}")]
    XmlDecode(String),
}

impl From<ProtocolError> for ClientError {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::XmlDecode(s) => Self::XmlDecode(s),
            ProtocolError::XmlEncode(s) => Self::InvalidRequest(s),
        }
    }
}

impl From<CryptoError> for ClientError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::SignType(s) => Self::SignType(s),
            CryptoError::Decrypt(s) => Self::Decrypt(s),
            CryptoError::InvalidSize(s) => Self::Config(s),
            CryptoError::ConversionError(s) | CryptoError::OpenSSL(s) => Self::Default(s),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(format!("{e}: Details: {e:?}"))
    }
}

#[expect(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use wxpay_crypto::CryptoError;
    use wxpay_protocol::ProtocolError;

    use super::{ClientError, result::ClientResultHelper};

    #[test]
    fn test_lower_layer_errors_keep_their_kind() {
        assert!(matches!(
            ClientError::from(ProtocolError::XmlDecode("eof".to_owned())),
            ClientError::XmlDecode(_)
        ));
        assert!(matches!(
            ClientError::from(CryptoError::SignType("SHA1".to_owned())),
            ClientError::SignType(_)
        ));
        assert!(matches!(
            ClientError::from(CryptoError::InvalidSize("key is 31 bytes".to_owned())),
            ClientError::Config(_)
        ));
        assert!(matches!(
            ClientError::from(CryptoError::Decrypt("tag mismatch".to_owned())),
            ClientError::Decrypt(_)
        ));
    }

    #[test]
    fn test_context() {
        let err = None::<u8>.context("the certificate list is empty").unwrap_err();
        assert_eq!(err.to_string(), "the certificate list is empty");

        let err = "x".parse::<u8>().with_context(|| "amount").unwrap_err();
        assert!(err.to_string().starts_with("amount: "));
    }
}
