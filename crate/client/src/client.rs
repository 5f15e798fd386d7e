use std::sync::Arc;

use wxpay_crypto::{SignType, sign};
use wxpay_logger::{debug, trace};
use wxpay_protocol::{FAIL, FieldMapping, SIGN, SUCCESS, merge, xml};

use crate::{
    ClientError,
    config::GatewayConf,
    endpoints::{Endpoint, EndpointDescriptor},
    error::result::ClientResult,
    identity::{ClientIdentity, GatewayIdentity},
    transport::{ReqwestTransport, Transport, TransportResponse},
};

/// A field mapping together with its signature.
///
/// There is no way to change a field of a signed request: build a new one instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    fields: FieldMapping,
    sign_type: SignType,
}

impl SignedRequest {
    /// Sign `fields` with the algorithm named by their own `sign_type` field (MD5 when
    /// absent). A `sign` already present is replaced.
    pub fn new(mut fields: FieldMapping, partner_key: &str) -> ClientResult<Self> {
        let sign_type = SignType::from_fields(&fields)?;
        let signature = sign(&fields, sign_type, partner_key)?;
        fields.insert(SIGN, signature);
        Ok(Self { fields, sign_type })
    }

    /// The signed fields, `sign` included.
    #[must_use]
    pub const fn fields(&self) -> &FieldMapping {
        &self.fields
    }

    #[must_use]
    pub fn sign(&self) -> &str {
        self.fields.get_str(SIGN).unwrap_or_default()
    }

    #[must_use]
    pub const fn sign_type(&self) -> SignType {
        self.sign_type
    }

    pub fn to_xml(&self) -> ClientResult<Vec<u8>> {
        Ok(xml::to_xml(&self.fields)?)
    }

    #[must_use]
    pub fn into_fields(self) -> FieldMapping {
        self.fields
    }
}

/// Answer of a dispatched call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayResponse {
    /// Decoded XML answer.
    Fields(FieldMapping),
    /// Undecoded body of a report-style endpoint.
    Raw(Vec<u8>),
}

impl GatewayResponse {
    /// The decoded mapping; a raw body is an error.
    pub fn into_fields(self) -> ClientResult<FieldMapping> {
        match self {
            Self::Fields(fields) => Ok(fields),
            Self::Raw(_) => Err(ClientError::Default(
                "expected an XML answer, got a raw report".to_owned(),
            )),
        }
    }

    pub fn into_raw(self) -> ClientResult<Vec<u8>> {
        match self {
            Self::Raw(body) => Ok(body),
            Self::Fields(_) => Err(ClientError::Default(
                "expected a raw report, got an XML answer".to_owned(),
            )),
        }
    }
}

/// Reject a gateway answer whose `return_code` or `result_code` is not `SUCCESS`.
///
/// A missing `result_code` is accepted: several answers only carry the outer status.
pub fn check_return_code(fields: &FieldMapping) -> ClientResult<()> {
    if fields.get_str("return_code") != Some(SUCCESS) {
        return Err(ClientError::RemoteStatus(
            fields
                .get_str("return_msg")
                .filter(|m| !m.is_empty())
                .unwrap_or(FAIL)
                .to_owned(),
        ))
    }
    match fields.get_str("result_code") {
        Some(code) if code != SUCCESS => Err(ClientError::RemoteStatus(
            fields
                .get_str("err_code_des")
                .or_else(|| fields.get_str("err_code"))
                .filter(|m| !m.is_empty())
                .unwrap_or(code)
                .to_owned(),
        )),
        _ => Ok(()),
    }
}

/// Client of the payment gateway.
///
/// Cheap to clone; every clone shares the same identity and transport.
#[derive(Clone)]
pub struct PaymentClient {
    identity: Arc<GatewayIdentity>,
    transport: Arc<dyn Transport>,
}

impl PaymentClient {
    pub fn new(identity: GatewayIdentity, transport: Arc<dyn Transport>) -> Self {
        Self {
            identity: Arc::new(identity),
            transport,
        }
    }

    /// Build the identity from `conf` and talk to the gateway over `reqwest`.
    pub fn from_conf(conf: &GatewayConf) -> ClientResult<Self> {
        let identity = GatewayIdentity::from_conf(conf)?;
        let transport = ReqwestTransport::new(conf.timeout())?;
        Ok(Self::new(identity, Arc::new(transport)))
    }

    #[must_use]
    pub fn identity(&self) -> &GatewayIdentity {
        &self.identity
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Merge the endpoint defaults with `params` (caller wins), strip the endpoint
    /// exclusions, then sign.
    pub fn prepare(&self, endpoint: Endpoint, params: FieldMapping) -> ClientResult<SignedRequest> {
        let descriptor = endpoint.descriptor();
        let mut fields = merge(descriptor.default_fields(&self.identity), params);
        for key in descriptor.strip {
            fields.remove(key);
        }
        SignedRequest::new(fields, self.identity.partner_key())
    }

    /// Sign and send `params` to `endpoint`.
    ///
    /// The answer is decoded unless the endpoint is report-style. The remote status fields
    /// are not inspected: see [`check_return_code`].
    pub async fn dispatch(
        &self,
        endpoint: Endpoint,
        params: FieldMapping,
    ) -> ClientResult<GatewayResponse> {
        let descriptor = endpoint.descriptor();
        let certificate = self.certificate_for(descriptor)?;
        let request = self.prepare(endpoint, params)?;
        let body = request.to_xml()?;
        debug!(
            "dispatching {endpoint} to {} (mutual TLS: {})",
            descriptor.url,
            certificate.is_some()
        );
        trace!("==> {}", String::from_utf8_lossy(&body));

        let response = self
            .transport
            .send(descriptor.url, body, certificate)
            .await?;
        let body = ensure_ok(endpoint.name(), response)?;
        if descriptor.raw_response {
            return Ok(GatewayResponse::Raw(body))
        }
        trace!("<== {}", String::from_utf8_lossy(&body));
        Ok(GatewayResponse::Fields(xml::from_xml(&body)?))
    }

    /// [`Self::dispatch`] with the endpoint given by name.
    pub async fn dispatch_by_name(
        &self,
        endpoint: &str,
        params: FieldMapping,
    ) -> ClientResult<GatewayResponse> {
        self.dispatch(endpoint.parse()?, params).await
    }

    /// Dispatch to an endpoint answering XML and return the decoded mapping.
    pub(crate) async fn call(
        &self,
        endpoint: Endpoint,
        params: FieldMapping,
    ) -> ClientResult<FieldMapping> {
        self.dispatch(endpoint, params).await?.into_fields()
    }

    /// Client certificate of the call. An endpoint requiring one fails before anything is
    /// sent when none is configured.
    pub(crate) fn certificate_for(
        &self,
        descriptor: &EndpointDescriptor,
    ) -> ClientResult<Option<&ClientIdentity>> {
        if !descriptor.client_certificate {
            return Ok(None)
        }
        self.identity.client_identity().map(Some).ok_or_else(|| {
            ClientError::Config(format!(
                "{} requires a client certificate and none is configured",
                descriptor.endpoint
            ))
        })
    }
}

/// Body of a 200 answer, [`ClientError::RequestFailed`] otherwise.
pub(crate) fn ensure_ok(endpoint: &str, response: TransportResponse) -> ClientResult<Vec<u8>> {
    if response.status == 200 {
        return Ok(response.body)
    }
    trace!(
        "error response received on {endpoint}: {}",
        String::from_utf8_lossy(&response.body)
    );
    Err(ClientError::RequestFailed(format!(
        "{endpoint}: HTTP status {}",
        response.status
    )))
}
