use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Identity, header::CONTENT_TYPE, multipart};
use wxpay_logger::{debug, trace};

use crate::{
    error::result::{ClientResult, ClientResultHelper},
    identity::ClientIdentity,
};

/// Status and body of a gateway answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// One part of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        content: Vec<u8>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub parts: Vec<FormPart>,
}

impl MultipartForm {
    #[must_use]
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts.push(FormPart::Text {
            name: name.to_owned(),
            value: value.to_owned(),
        });
        self
    }

    #[must_use]
    pub fn file(mut self, name: &str, filename: &str, content: Vec<u8>) -> Self {
        self.parts.push(FormPart::File {
            name: name.to_owned(),
            filename: filename.to_owned(),
            content,
        });
        self
    }

    /// Value of the text part `name`.
    #[must_use]
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|p| match p {
            FormPart::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }
}

/// Sends request bodies to the gateway.
///
/// Implementations report whatever status the gateway answered; deciding that a non-200
/// status is a failure is left to the caller. No retry happens at this level.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST an XML body, presenting `identity` for mutual TLS when given.
    async fn send(
        &self,
        url: &str,
        body: Vec<u8>,
        identity: Option<&ClientIdentity>,
    ) -> ClientResult<TransportResponse>;

    /// POST a multipart form.
    async fn send_form(
        &self,
        url: &str,
        form: MultipartForm,
        identity: Option<&ClientIdentity>,
    ) -> ClientResult<TransportResponse>;
}

/// [`Transport`] over `reqwest`.
///
/// Plain calls share one client. Mutual TLS calls build a client carrying the PKCS#12
/// identity of the call.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> ClientResult<Self> {
        Ok(Self {
            client: builder(timeout).build().context("Reqwest client builder")?,
            timeout,
        })
    }

    fn client_for(&self, identity: Option<&ClientIdentity>) -> ClientResult<Client> {
        match identity {
            None => Ok(self.client.clone()),
            Some(identity) => {
                let pkcs12 = Identity::from_pkcs12_der(identity.pkcs12(), identity.passphrase())?;
                Ok(builder(self.timeout)
                    .identity(pkcs12)
                    .build()
                    .context("Reqwest client builder with client certificate")?)
            }
        }
    }
}

fn builder(timeout: Duration) -> ClientBuilder {
    ClientBuilder::new()
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(timeout)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        url: &str,
        body: Vec<u8>,
        identity: Option<&ClientIdentity>,
    ) -> ClientResult<TransportResponse> {
        let client = self.client_for(identity)?;
        let response = client
            .post(url)
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!("{url} answered {status} with {} bytes", body.len());
        Ok(TransportResponse { status, body })
    }

    async fn send_form(
        &self,
        url: &str,
        form: MultipartForm,
        identity: Option<&ClientIdentity>,
    ) -> ClientResult<TransportResponse> {
        let client = self.client_for(identity)?;
        let mut payload = multipart::Form::new();
        for part in form.parts {
            payload = match part {
                FormPart::Text { name, value } => payload.text(name, value),
                FormPart::File {
                    name,
                    filename,
                    content,
                } => payload.part(name, multipart::Part::bytes(content).file_name(filename)),
            };
        }
        trace!("sending multipart form to {url}");
        let response = client.post(url).multipart(payload).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!("{url} answered {status} with {} bytes", body.len());
        Ok(TransportResponse { status, body })
    }
}

