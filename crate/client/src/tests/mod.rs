#![allow(clippy::unwrap_used)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use wxpay_protocol::{FieldMapping, xml};

use crate::{
    ClientIdentity, GatewayIdentity, PaymentClient,
    error::result::ClientResult,
    transport::{MultipartForm, Transport, TransportResponse},
};


pub(crate) const APPID: &str = "wxd930ea5d5a258f4f";
pub(crate) const MCH_ID: &str = "10000100";
pub(crate) const PARTNER_KEY: &str = "192006250b4c09247ec02edce69f6a2d";
pub(crate) const API_V3_KEY: &str = "0123456789abcdefABCDEF0123456789";

/// What the transport was asked to send.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub url: String,
    pub body: Vec<u8>,
    pub form: Option<MultipartForm>,
    pub mutual_tls: bool,
}

impl RecordedCall {
    /// The XML body, decoded.
    pub(crate) fn fields(&self) -> FieldMapping {
        xml::from_xml(&self.body).unwrap()
    }
}

/// In-memory transport answering from a queue and recording every call.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    responses: Mutex<VecDeque<TransportResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingTransport {
    pub(crate) fn answering(responses: Vec<TransportResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::default(),
        })
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, call: RecordedCall) -> TransportResponse {
        self.calls.lock().unwrap().push(call);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ok_xml(&wxpay_protocol::fields! { "return_code" => "SUCCESS" }))
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(
        &self,
        url: &str,
        body: Vec<u8>,
        identity: Option<&ClientIdentity>,
    ) -> ClientResult<TransportResponse> {
        Ok(self.answer(RecordedCall {
            url: url.to_owned(),
            body,
            form: None,
            mutual_tls: identity.is_some(),
        }))
    }

    async fn send_form(
        &self,
        url: &str,
        form: MultipartForm,
        identity: Option<&ClientIdentity>,
    ) -> ClientResult<TransportResponse> {
        Ok(self.answer(RecordedCall {
            url: url.to_owned(),
            body: Vec::new(),
            form: Some(form),
            mutual_tls: identity.is_some(),
        }))
    }
}

/// A 200 answer carrying `fields` as XML.
pub(crate) fn ok_xml(fields: &FieldMapping) -> TransportResponse {
    TransportResponse {
        status: 200,
        body: xml::to_xml(fields).unwrap(),
    }
}

pub(crate) fn identity() -> GatewayIdentity {
    GatewayIdentity::new(APPID, MCH_ID, PARTNER_KEY)
        .unwrap()
        .with_api_v3_key(API_V3_KEY)
        .with_notify_url("https://merchant.example.com/wxpay/notify")
}

/// Same as [`identity`] with a (dummy) client certificate.
pub(crate) fn identity_with_certificate() -> GatewayIdentity {
    identity().with_client_identity(ClientIdentity::new(vec![0x30, 0x82], MCH_ID))
}

pub(crate) fn test_client(
    identity: GatewayIdentity,
    responses: Vec<TransportResponse>,
) -> (PaymentClient, Arc<RecordingTransport>) {
    let transport = RecordingTransport::answering(responses);
    (PaymentClient::new(identity, transport.clone()), transport)
}
