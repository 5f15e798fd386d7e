use std::fmt;

use wxpay_crypto::derive_refund_key;
use zeroize::Zeroizing;

use crate::{
    ClientError,
    config::{DEFAULT_CLIENT_IP, GatewayConf},
    error::result::ClientResult,
};

/// Client certificate material handed untouched to the transport for mutual TLS.
#[derive(Clone)]
pub struct ClientIdentity {
    pkcs12: Vec<u8>,
    passphrase: Zeroizing<String>,
}

impl ClientIdentity {
    #[must_use]
    pub fn new(pkcs12: Vec<u8>, passphrase: &str) -> Self {
        Self {
            pkcs12,
            passphrase: Zeroizing::new(passphrase.to_owned()),
        }
    }

    #[must_use]
    pub fn pkcs12(&self) -> &[u8] {
        &self.pkcs12
    }

    #[must_use]
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("pkcs12", &format!("<{} bytes>", self.pkcs12.len()))
            .field("passphrase", &"****")
            .finish()
    }
}

/// The merchant account the client acts for.
///
/// Built once and never mutated afterwards: a client shares it read-only between all
/// concurrent dispatches and verifications.
#[derive(Clone)]
pub struct GatewayIdentity {
    appid: String,
    mch_id: String,
    partner_key: Zeroizing<String>,
    refund_key: Zeroizing<String>,
    client_identity: Option<ClientIdentity>,
    api_v3_key: Option<Zeroizing<String>>,
    spbill_create_ip: String,
    notify_url: Option<String>,
    refund_url: Option<String>,
}

impl GatewayIdentity {
    /// Fails with [`ClientError::Config`] when one of the three values is empty.
    pub fn new(appid: &str, mch_id: &str, partner_key: &str) -> ClientResult<Self> {
        for (name, value) in [
            ("appid", appid),
            ("mch_id", mch_id),
            ("partner_key", partner_key),
        ] {
            if value.trim().is_empty() {
                return Err(ClientError::Config(format!("{name} is missing")))
            }
        }
        Ok(Self {
            appid: appid.to_owned(),
            mch_id: mch_id.to_owned(),
            partner_key: Zeroizing::new(partner_key.to_owned()),
            refund_key: derive_refund_key(partner_key)?,
            client_identity: None,
            api_v3_key: None,
            spbill_create_ip: DEFAULT_CLIENT_IP.to_owned(),
            notify_url: None,
            refund_url: None,
        })
    }

    #[must_use]
    pub fn with_client_identity(mut self, client_identity: ClientIdentity) -> Self {
        self.client_identity = Some(client_identity);
        self
    }

    #[must_use]
    pub fn with_api_v3_key(mut self, api_v3_key: &str) -> Self {
        self.api_v3_key = Some(Zeroizing::new(api_v3_key.to_owned()));
        self
    }

    #[must_use]
    pub fn with_spbill_create_ip(mut self, ip: &str) -> Self {
        ip.clone_into(&mut self.spbill_create_ip);
        self
    }

    #[must_use]
    pub fn with_notify_url(mut self, url: &str) -> Self {
        self.notify_url = Some(url.to_owned());
        self
    }

    #[must_use]
    pub fn with_refund_url(mut self, url: &str) -> Self {
        self.refund_url = Some(url.to_owned());
        self
    }

    /// Build the identity from a configuration document, reading the PKCS#12 bundle.
    pub fn from_conf(conf: &GatewayConf) -> ClientResult<Self> {
        let mut identity = Self::new(&conf.appid, &conf.mch_id, &conf.partner_key)?;
        if let Some(pkcs12) = conf.read_pkcs12()? {
            let passphrase = conf.pkcs12_password.as_deref().unwrap_or(&conf.mch_id);
            identity = identity.with_client_identity(ClientIdentity::new(pkcs12, passphrase));
        }
        if let Some(key) = conf.api_v3_key.as_deref() {
            identity = identity.with_api_v3_key(key);
        }
        if let Some(ip) = conf.spbill_create_ip.as_deref().filter(|ip| !ip.is_empty()) {
            identity = identity.with_spbill_create_ip(ip);
        }
        if let Some(url) = conf.notify_url.as_deref() {
            identity = identity.with_notify_url(url);
        }
        if let Some(url) = conf.refund_url.as_deref() {
            identity = identity.with_refund_url(url);
        }
        Ok(identity)
    }

    #[must_use]
    pub fn appid(&self) -> &str {
        &self.appid
    }

    #[must_use]
    pub fn mch_id(&self) -> &str {
        &self.mch_id
    }

    #[must_use]
    pub fn partner_key(&self) -> &str {
        &self.partner_key
    }

    /// Lower-case hex MD5 of the partner key, the raw key of the refund notification cipher.
    #[must_use]
    pub fn refund_key(&self) -> &str {
        &self.refund_key
    }

    #[must_use]
    pub const fn client_identity(&self) -> Option<&ClientIdentity> {
        self.client_identity.as_ref()
    }

    #[must_use]
    pub fn api_v3_key(&self) -> Option<&str> {
        self.api_v3_key.as_ref().map(|k| k.as_str())
    }

    #[must_use]
    pub fn spbill_create_ip(&self) -> &str {
        &self.spbill_create_ip
    }

    #[must_use]
    pub fn notify_url(&self) -> Option<&str> {
        self.notify_url.as_deref()
    }

    #[must_use]
    pub fn refund_url(&self) -> Option<&str> {
        self.refund_url.as_deref()
    }
}

impl TryFrom<&GatewayConf> for GatewayIdentity {
    type Error = ClientError;

    fn try_from(conf: &GatewayConf) -> Result<Self, Self::Error> {
        Self::from_conf(conf)
    }
}

impl fmt::Debug for GatewayIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayIdentity")
            .field("appid", &self.appid)
            .field("mch_id", &self.mch_id)
            .field("client_identity", &self.client_identity)
            .field("api_v3_key", &self.api_v3_key.as_ref().map(|_| "****"))
            .field("spbill_create_ip", &self.spbill_create_ip)
            .field("notify_url", &self.notify_url)
            .field("refund_url", &self.refund_url)
            .finish_non_exhaustive()
    }
}
