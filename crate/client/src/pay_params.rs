//! Client-side payment parameters.
//!
//! Once an order is placed, the gateway's `prepay_id` is exchanged for a second, independently
//! signed set of fields that the JSAPI page or the mobile app hands to the wallet.

use wxpay_crypto::{SignType, sign};
use wxpay_protocol::{FieldMapping, SIGN, fields, nonce_str, unix_timestamp};

use crate::{
    ClientError,
    client::{PaymentClient, check_return_code},
    error::result::ClientResult,
};

const NATIVE_URL: &str = "weixin://wxpay/bizpayurl";

impl PaymentClient {
    /// JSAPI parameters for an order answer carrying `prepay_id`.
    ///
    /// `paySign` is computed over `appId`, `timeStamp`, `nonceStr`, `package` and `signType`;
    /// the `timestamp` alias is added after signing.
    pub fn pay_params_by_prepay(
        &self,
        order: &FieldMapping,
        sign_type: SignType,
    ) -> ClientResult<FieldMapping> {
        let appid = order
            .get_str("sub_appid")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.identity().appid());
        let mut params = fields! {
            "appId" => appid,
            "timeStamp" => unix_timestamp(),
            "nonceStr" => nonce_str(),
            "package" => format!("prepay_id={}", prepay_id(order)?),
            "signType" => sign_type.as_str(),
        };
        let pay_sign = sign(&params, sign_type, self.identity().partner_key())?;
        params.insert("paySign", pay_sign);
        if let Some(timestamp) = params.get("timeStamp").cloned() {
            params.insert("timestamp", timestamp);
        }
        Ok(params)
    }

    /// Place a JSAPI order and derive the page parameters from its `prepay_id`.
    pub async fn pay_params(&self, mut params: FieldMapping) -> ClientResult<FieldMapping> {
        params.insert("trade_type", "JSAPI");
        let sign_type = requested_sign_type(&params)?;
        let order = self.unified_order(params).await?;
        self.pay_params_by_prepay(&order, sign_type)
    }

    /// APP parameters for an order answer carrying `prepay_id`.
    pub fn app_params_by_prepay(
        &self,
        order: &FieldMapping,
        sign_type: SignType,
    ) -> ClientResult<FieldMapping> {
        let appid = order
            .get_str("sub_appid")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.identity().appid());
        let partnerid = order
            .get_str("sub_mch_id")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.identity().mch_id());
        let mut params = fields! {
            "appid" => appid,
            "partnerid" => partnerid,
            "prepayid" => prepay_id(order)?,
            "package" => "Sign=WXPay",
            "noncestr" => nonce_str(),
            "timestamp" => unix_timestamp(),
        };
        let signature = sign(&params, sign_type, self.identity().partner_key())?;
        params.insert(SIGN, signature);
        Ok(params)
    }

    /// Place an APP order and derive the app parameters from its `prepay_id`.
    pub async fn app_params(&self, mut params: FieldMapping) -> ClientResult<FieldMapping> {
        params.insert("trade_type", "APP");
        let sign_type = requested_sign_type(&params)?;
        let order = self.unified_order(params).await?;
        self.app_params_by_prepay(&order, sign_type)
    }

    /// QR code URL of the "mode one" native payment, signed with MD5.
    ///
    /// `params` must carry `product_id`; it may override any of the generated fields.
    pub fn native_url(&self, params: FieldMapping) -> ClientResult<String> {
        let mut fields = fields! {
            "appid" => self.identity().appid(),
            "mch_id" => self.identity().mch_id(),
            "time_stamp" => unix_timestamp(),
            "nonce_str" => nonce_str(),
        };
        fields.extend(params);
        let product_id = fields
            .get_string("product_id")
            .ok_or_else(|| ClientError::InvalidRequest("product_id is missing".to_owned()))?;
        let signature = sign(&fields, SignType::Md5, self.identity().partner_key())?;

        let value = |key: &str| fields.get_string(key).unwrap_or_default();
        Ok(format!(
            "{NATIVE_URL}?sign={signature}&appid={}&mch_id={}&product_id={}&time_stamp={}&\
             nonce_str={}",
            value("appid"),
            value("mch_id"),
            encode_component(&product_id),
            value("time_stamp"),
            value("nonce_str"),
        ))
    }
}

/// Algorithm asked for by the caller's `sign_type`, MD5 when absent.
fn requested_sign_type(params: &FieldMapping) -> ClientResult<SignType> {
    Ok(SignType::from_fields(params)?)
}

/// `prepay_id` of a unified order answer. A rejected order surfaces its remote status.
fn prepay_id(order: &FieldMapping) -> ClientResult<String> {
    match order.get_string("prepay_id").filter(|id| !id.is_empty()) {
        Some(id) => Ok(id),
        None => {
            check_return_code(order)?;
            Err(ClientError::RemoteStatus(
                "order answer carries no prepay_id".to_owned(),
            ))
        }
    }
}

/// Percent-encode a URL query component; spaces become `%20`.
fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
