//! Outbound side of the WeChat Pay v2 gateway: merchant identity, endpoint table, signed
//! request dispatch and the helpers composed on top of it.

pub use certificates::PlatformCertificate;
pub use client::{GatewayResponse, PaymentClient, SignedRequest, check_return_code};
pub use config::{DEFAULT_CLIENT_IP, DEFAULT_TIMEOUT_SECS, GatewayConf, WXPAY_CONF_ENV};
pub use endpoints::{DefaultValue, ENDPOINTS, Endpoint, EndpointDescriptor};
pub use error::{
    ClientError,
    result::{ClientResult, ClientResultHelper},
};
pub use identity::{ClientIdentity, GatewayIdentity};
pub use media::DEFAULT_MEDIA_FILENAME;
pub use transport::{FormPart, MultipartForm, ReqwestTransport, Transport, TransportResponse};
pub use wxpay_crypto::{RsaPadding, SignType, encrypt_rsa};
pub use wxpay_protocol::{self, FieldMapping, FieldValue, fields};

mod certificates;
mod client;
mod config;
mod endpoints;
mod error;
mod identity;
mod media;
mod operations;
mod pay_params;
mod transport;

#[cfg(test)]
mod tests;
