//! Static table of the gateway endpoints.
//!
//! Each entry names the target URL, the default fields merged under the caller parameters,
//! whether mutual TLS is required and whether the response is returned undecoded.

use std::{fmt, str::FromStr};

use wxpay_protocol::{FieldMapping, FieldValue, nonce_str};

use crate::{ClientError, identity::GatewayIdentity};

/// Source of a default field value, resolved against the identity at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    AppId,
    MchId,
    /// A fresh random nonce.
    Nonce,
    NotifyUrl,
    RefundUrl,
    ClientIp,
    Text(&'static str),
    Integer(i64),
}

impl DefaultValue {
    /// `None` when the identity has no value for it: the field is then omitted.
    #[must_use]
    pub fn resolve(&self, identity: &GatewayIdentity) -> Option<FieldValue> {
        match self {
            Self::AppId => Some(identity.appid().into()),
            Self::MchId => Some(identity.mch_id().into()),
            Self::Nonce => Some(nonce_str().into()),
            Self::NotifyUrl => identity.notify_url().map(FieldValue::from),
            Self::RefundUrl => identity.refund_url().map(FieldValue::from),
            Self::ClientIp => Some(identity.spbill_create_ip().into()),
            Self::Text(s) => Some((*s).into()),
            Self::Integer(i) => Some((*i).into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Micropay,
    Reverse,
    UnifiedOrder,
    OrderQuery,
    CloseOrder,
    Refund,
    RefundQuery,
    DownloadBill,
    DownloadFundflow,
    SendCoupon,
    QueryCouponStock,
    QueryCouponInfo,
    Transfers,
    TransfersQuery,
    GetPublicKey,
    PayBank,
    QueryBank,
    SendRedpack,
    SendGroupRedpack,
    RedpackQuery,
    GetCert,
    UploadMedia,
    MicroSubmit,
    MicroUpdateContact,
    MicroUpdateArchive,
    MicroGetState,
    MicroFollow,
    MicroBind,
    MicroQueryConfig,
}

impl Endpoint {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Micropay => "micropay",
            Self::Reverse => "reverse",
            Self::UnifiedOrder => "unifiedOrder",
            Self::OrderQuery => "orderQuery",
            Self::CloseOrder => "closeOrder",
            Self::Refund => "refund",
            Self::RefundQuery => "refundQuery",
            Self::DownloadBill => "downloadBill",
            Self::DownloadFundflow => "downloadFundflow",
            Self::SendCoupon => "sendCoupon",
            Self::QueryCouponStock => "queryCouponStock",
            Self::QueryCouponInfo => "queryCouponInfo",
            Self::Transfers => "transfers",
            Self::TransfersQuery => "transfersQuery",
            Self::GetPublicKey => "getPublicKey",
            Self::PayBank => "payBank",
            Self::QueryBank => "queryBank",
            Self::SendRedpack => "sendRedpack",
            Self::SendGroupRedpack => "sendGroupRedpack",
            Self::RedpackQuery => "redpackQuery",
            Self::GetCert => "getCert",
            Self::UploadMedia => "uploadMedia",
            Self::MicroSubmit => "microSubmit",
            Self::MicroUpdateContact => "microUpdateContact",
            Self::MicroUpdateArchive => "microUpdateArchive",
            Self::MicroGetState => "microGetState",
            Self::MicroFollow => "microFollow",
            Self::MicroBind => "microBind",
            Self::MicroQueryConfig => "microQueryConfig",
        }
    }

    /// The table entry of this endpoint.
    #[must_use]
    pub fn descriptor(&self) -> &'static EndpointDescriptor {
        // the table holds exactly one entry per variant, in declaration order
        &ENDPOINTS[*self as usize]
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endpoint {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ENDPOINTS
            .iter()
            .map(|d| d.endpoint)
            .find(|e| e.name() == s)
            .ok_or_else(|| ClientError::UnknownEndpoint(s.to_owned()))
    }
}

#[derive(Debug)]
pub struct EndpointDescriptor {
    pub endpoint: Endpoint,
    pub url: &'static str,
    pub defaults: &'static [(&'static str, DefaultValue)],
    /// Mutual TLS with the merchant certificate.
    pub client_certificate: bool,
    /// Report-style endpoint: the body is returned as bytes, not decoded.
    pub raw_response: bool,
    /// Keys removed after merging, whatever the caller passed.
    pub strip: &'static [&'static str],
}

impl EndpointDescriptor {
    /// Resolve the defaults of this endpoint for `identity`, in table order.
    #[must_use]
    pub fn default_fields(&self, identity: &GatewayIdentity) -> FieldMapping {
        self.defaults
            .iter()
            .filter_map(|(key, value)| value.resolve(identity).map(|v| (*key, v)))
            .collect()
    }
}

macro_rules! endpoint {
    ($endpoint:ident, $path:literal, cert = $cert:literal, raw = $raw:literal, [$($key:literal => $value:expr),* $(,)?] $(, strip = [$($strip:literal),*])?) => {
        EndpointDescriptor {
            endpoint: Endpoint::$endpoint,
            url: $path,
            defaults: &[$(($key, $value)),*],
            client_certificate: $cert,
            raw_response: $raw,
            strip: &[$($($strip),*)?],
        }
    };
}

use DefaultValue::{AppId, ClientIp, Integer, MchId, Nonce, NotifyUrl, RefundUrl, Text};

/// One entry per [`Endpoint`] variant, in declaration order.
pub static ENDPOINTS: [EndpointDescriptor; 29] = [
    endpoint!(Micropay, "https://api.mch.weixin.qq.com/pay/micropay", cert = false, raw = false, [
        "appid" => AppId, "mch_id" => MchId, "nonce_str" => Nonce, "sign_type" => Text("MD5"),
        "spbill_create_ip" => ClientIp,
    ]),
    endpoint!(Reverse, "https://api.mch.weixin.qq.com/secapi/pay/reverse", cert = true, raw = false, [
        "appid" => AppId, "mch_id" => MchId, "nonce_str" => Nonce, "sign_type" => Text("MD5"),
    ]),
    endpoint!(UnifiedOrder, "https://api.mch.weixin.qq.com/pay/unifiedorder", cert = false, raw = false, [
        "appid" => AppId, "mch_id" => MchId, "nonce_str" => Nonce, "sign_type" => Text("MD5"),
        "notify_url" => NotifyUrl, "spbill_create_ip" => ClientIp, "trade_type" => Text("JSAPI"),
    ]),
    endpoint!(OrderQuery, "https://api.mch.weixin.qq.com/pay/orderquery", cert = false, raw = false, [
        "appid" => AppId, "mch_id" => MchId, "nonce_str" => Nonce, "sign_type" => Text("MD5"),
    ]),
    endpoint!(CloseOrder, "https://api.mch.weixin.qq.com/pay/closeorder", cert = false, raw = false, [
        "appid" => AppId, "mch_id" => MchId, "nonce_str" => Nonce, "sign_type" => Text("MD5"),
    ]),
    endpoint!(Refund, "https://api.mch.weixin.qq.com/secapi/pay/refund", cert = true, raw = false, [
        "appid" => AppId, "mch_id" => MchId, "nonce_str" => Nonce, "sign_type" => Text("MD5"),
        "op_user_id" => MchId, "notify_url" => RefundUrl,
    ]),
    endpoint!(RefundQuery, "https://api.mch.weixin.qq.com/pay/refundquery", cert = false, raw = false, [
        "appid" => AppId, "mch_id" => MchId, "nonce_str" => Nonce, "sign_type" => Text("MD5"),
    ]),
    endpoint!(DownloadBill, "https://api.mch.weixin.qq.com/pay/downloadbill", cert = false, raw = true, [
        "appid" => AppId, "mch_id" => MchId, "nonce_str" => Nonce, "sign_type" => Text("MD5"),
        "bill_type" => Text("ALL"),
    ]),
    endpoint!(DownloadFundflow, "https://api.mch.weixin.qq.com/pay/downloadfundflow", cert = true, raw = true, [
        "appid" => AppId, "mch_id" => MchId, "nonce_str" => Nonce,
        "sign_type" => Text("HMAC-SHA256"), "account_type" => Text("Basic"),
    ]),
    endpoint!(SendCoupon, "https://api.mch.weixin.qq.com/mmpaymkttransfers/send_coupon", cert = true, raw = false, [
        "appid" => AppId, "mch_id" => MchId, "nonce_str" => Nonce, "openid_count" => Integer(1),
    ]),
    endpoint!(QueryCouponStock, "https://api.mch.weixin.qq.com/mmpaymkttransfers/query_coupon_stock", cert = false, raw = false, [
        "appid" => AppId, "mch_id" => MchId, "nonce_str" => Nonce,
    ]),
    endpoint!(QueryCouponInfo, "https://api.mch.weixin.qq.com/mmpaymkttransfers/querycouponsinfo", cert = false, raw = false, [
        "appid" => AppId, "mch_id" => MchId, "nonce_str" => Nonce,
    ]),
    endpoint!(Transfers, "https://api.mch.weixin.qq.com/mmpaymkttransfers/promotion/transfers", cert = true, raw = false, [
        "mch_appid" => AppId, "mchid" => MchId, "nonce_str" => Nonce,
        "check_name" => Text("FORCE_CHECK"), "spbill_create_ip" => ClientIp,
    ]),
    endpoint!(TransfersQuery, "https://api.mch.weixin.qq.com/mmpaymkttransfers/gettransferinfo", cert = true, raw = false, [
        "appid" => AppId, "mch_id" => MchId, "nonce_str" => Nonce,
    ]),
    endpoint!(GetPublicKey, "https://fraud.mch.weixin.qq.com/risk/getpublickey", cert = true, raw = false, [
        "mch_id" => MchId, "nonce_str" => Nonce, "sign_type" => Text("MD5"),
    ]),
    endpoint!(PayBank, "https://api.mch.weixin.qq.com/mmpaysptrans/pay_bank", cert = true, raw = false, [
        "mch_id" => MchId, "nonce_str" => Nonce,
    ]),
    endpoint!(QueryBank, "https://api.mch.weixin.qq.com/mmpaysptrans/query_bank", cert = true, raw = false, [
        "mch_id" => MchId, "nonce_str" => Nonce,
    ]),
    endpoint!(SendRedpack, "https://api.mch.weixin.qq.com/mmpaymkttransfers/sendredpack", cert = true, raw = false, [
        "wxappid" => AppId, "mch_id" => MchId, "nonce_str" => Nonce, "client_ip" => ClientIp,
        "total_num" => Integer(1),
    ], strip = ["mch_autono"]),
    endpoint!(SendGroupRedpack, "https://api.mch.weixin.qq.com/mmpaymkttransfers/sendgroupredpack", cert = true, raw = false, [
        "wxappid" => AppId, "mch_id" => MchId, "nonce_str" => Nonce, "total_num" => Integer(3),
        "amt_type" => Text("ALL_RAND"),
    ]),
    endpoint!(RedpackQuery, "https://api.mch.weixin.qq.com/mmpaymkttransfers/gethbinfo", cert = true, raw = false, [
        "appid" => AppId, "mch_id" => MchId, "nonce_str" => Nonce, "bill_type" => Text("MCHT"),
    ]),
    endpoint!(GetCert, "https://api.mch.weixin.qq.com/risk/getcertficates", cert = false, raw = false, [
        "mch_id" => MchId, "nonce_str" => Nonce, "sign_type" => Text("HMAC-SHA256"),
    ]),
    endpoint!(UploadMedia, "https://api.mch.weixin.qq.com/secapi/mch/uploadmedia", cert = true, raw = false, [
        "mch_id" => MchId, "sign_type" => Text("HMAC-SHA256"),
    ]),
    endpoint!(MicroSubmit, "https://api.mch.weixin.qq.com/applyment/micro/submit", cert = true, raw = false, [
        "version" => Text("3.0"), "nonce_str" => Nonce, "mch_id" => MchId,
        "sign_type" => Text("HMAC-SHA256"),
    ]),
    endpoint!(MicroUpdateContact, "https://api.mch.weixin.qq.com/applyment/micro/modifycontactinfo", cert = true, raw = false, [
        "version" => Text("1.0"), "nonce_str" => Nonce, "mch_id" => MchId,
        "sign_type" => Text("HMAC-SHA256"),
    ]),
    endpoint!(MicroUpdateArchive, "https://api.mch.weixin.qq.com/applyment/micro/modifyarchives", cert = true, raw = false, [
        "version" => Text("1.0"), "mch_id" => MchId, "nonce_str" => Nonce,
        "sign_type" => Text("HMAC-SHA256"),
    ]),
    endpoint!(MicroGetState, "https://api.mch.weixin.qq.com/applyment/micro/getstate", cert = true, raw = false, [
        "version" => Text("1.0"), "mch_id" => MchId, "nonce_str" => Nonce,
        "sign_type" => Text("HMAC-SHA256"),
    ]),
    endpoint!(MicroFollow, "https://api.mch.weixin.qq.com/secapi/mkt/addrecommendconf", cert = true, raw = false, [
        "mch_id" => MchId, "nonce_str" => Nonce, "sign_type" => Text("HMAC-SHA256"),
    ]),
    endpoint!(MicroBind, "https://api.mch.weixin.qq.com/secapi/mch/addsubdevconfig", cert = true, raw = false, [
        "appid" => AppId, "mch_id" => MchId,
    ]),
    endpoint!(MicroQueryConfig, "https://api.mch.weixin.qq.com/secapi/mch/querysubdevconfig", cert = true, raw = false, [
        "appid" => AppId, "mch_id" => MchId,
    ]),
];
