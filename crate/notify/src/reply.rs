use std::sync::Arc;

use wxpay_client::GatewayIdentity;
use wxpay_crypto::{SignType, sign};
use wxpay_protocol::{FAIL, FieldMapping, SIGN, SUCCESS, fields, nonce_str, xml};

use crate::{error::result::NotifyResult, notify_bail};

/// `Content-Type` of every reply.
pub const CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Synchronous answer to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    body: Vec<u8>,
}

impl Reply {
    fn from_fields(fields: &FieldMapping) -> NotifyResult<Self> {
        Ok(Self {
            body: xml::to_xml(fields)?,
        })
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }
}

/// Builds the replies of one notification.
#[derive(Debug, Clone)]
pub struct ReplyBuilder {
    identity: Arc<GatewayIdentity>,
}

impl ReplyBuilder {
    pub(crate) const fn new(identity: Arc<GatewayIdentity>) -> Self {
        Self { identity }
    }

    /// `<xml><return_code>SUCCESS</return_code></xml>`
    pub fn success(&self) -> NotifyResult<Reply> {
        Reply::from_fields(&fields! { "return_code" => SUCCESS })
    }

    /// `FAIL` reply carrying `return_msg`.
    pub fn fail(&self, return_msg: &str) -> NotifyResult<Reply> {
        Reply::from_fields(&fields! { "return_code" => FAIL, "return_msg" => return_msg })
    }

    /// Signed answer to a native order push: the `prepay_id` of the order placed for the
    /// pushed product, or, with `err_code_des`, a business failure.
    pub fn native(&self, prepay_id: &str, err_code_des: Option<&str>) -> NotifyResult<Reply> {
        let err_code_des = err_code_des.filter(|d| !d.is_empty());
        if prepay_id.is_empty() && err_code_des.is_none() {
            notify_bail!("a native reply needs a prepay_id or an error description");
        }
        let mut reply = fields! {
            "return_code" => SUCCESS,
            "appid" => self.identity.appid(),
            "mch_id" => self.identity.mch_id(),
            "nonce_str" => nonce_str(),
            "result_code" => SUCCESS,
            "prepay_id" => prepay_id,
        };
        if let Some(description) = err_code_des {
            reply.insert("result_code", FAIL);
            reply.insert("err_code_des", description);
        }
        let signature = sign(&reply, SignType::Md5, self.identity.partner_key())?;
        reply.insert(SIGN, signature);
        Reply::from_fields(&reply)
    }
}
