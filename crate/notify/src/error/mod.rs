use thiserror::Error;
use wxpay_client::ClientError;
use wxpay_crypto::CryptoError;
use wxpay_protocol::ProtocolError;

use crate::pipeline::Stage;

pub(crate) mod result;

/// Failure to build a verifier or a reply. Rejected notifications are reported as
/// [`VerificationFailure`] instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Default(String),

    #[error("Reply encoding error: {0}")]
    Reply(String),

    #[error("signType Error: {0}")]
    SignType(String),
}

impl From<ProtocolError> for NotifyError {
    fn from(e: ProtocolError) -> Self {
        Self::Reply(e.to_string())
    }
}

impl From<CryptoError> for NotifyError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::SignType(s) => Self::SignType(s),
            other => Self::Default(other.to_string()),
        }
    }
}

impl From<ClientError> for NotifyError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Config(s) => Self::Config(s),
            other => Self::Default(other.to_string()),
        }
    }
}

/// Why an inbound notification was rejected, with the pipeline stage that could not be
/// reached.
///
/// The variant and its details are for local diagnostics only; the peer gets the short
/// [`Self::reply_message`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    #[error("XMLDataError ({stage}): {message}")]
    Decode { stage: Stage, message: String },

    #[error("remote status failure ({stage}): {message}")]
    RemoteStatus { stage: Stage, message: String },

    #[error("invalid signature ({stage}): {message}")]
    InvalidSignature { stage: Stage, message: String },

    #[error("DecryptError ({stage}): {message}")]
    Decrypt { stage: Stage, message: String },
}

impl VerificationFailure {
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Decode { stage, .. }
            | Self::RemoteStatus { stage, .. }
            | Self::InvalidSignature { stage, .. }
            | Self::Decrypt { stage, .. } => *stage,
        }
    }

    /// Short name of the failure kind, as logged.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode",
            Self::RemoteStatus { .. } => "remote_status",
            Self::InvalidSignature { .. } => "invalid_signature",
            Self::Decrypt { .. } => "decrypt",
        }
    }

    /// `return_msg` of the failure reply.
    ///
    /// A remote status failure echoes the gateway's own message; the other kinds map to a
    /// fixed token so nothing about the local cause leaks to the peer.
    #[must_use]
    pub fn reply_message(&self) -> &str {
        match self {
            Self::RemoteStatus { message, .. } if !message.is_empty() => message,
            Self::RemoteStatus { .. } => "Error",
            Self::Decode { .. } => "XMLDataError",
            Self::InvalidSignature { .. } => "INVALID_SIGN",
            Self::Decrypt { .. } => "DECRYPT_ERROR",
        }
    }
}

/// Construct a notify error from a string.
#[macro_export]
macro_rules! notify_error {
    ($msg:literal) => {
        $crate::NotifyError::Default(::core::format_args!($msg).to_string())
    };
    ($err:expr $(,)?) => ({
        $crate::NotifyError::Default($err.to_string())
    });
    ($fmt:expr, $($arg:tt)*) => {
        $crate::NotifyError::Default(::core::format_args!($fmt, $($arg)*).to_string())
    };
}

/// Return early with an error.
#[macro_export]
macro_rules! notify_bail {
    ($msg:literal) => {
        return ::core::result::Result::Err($crate::notify_error!($msg))
    };
    ($err:expr $(,)?) => {
        return ::core::result::Result::Err($err)
    };
    ($fmt:expr, $($arg:tt)*) => {
        return ::core::result::Result::Err($crate::notify_error!($fmt, $($arg)*))
    };
}
