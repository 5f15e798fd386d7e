//! Wire-level building blocks of the WeChat Pay v2 (XML) gateway protocol.
//!
//! A [`FieldMapping`] is the unit exchanged with the gateway. It is rendered to its
//! canonical signing string by [`canonical::encode`] and to the gateway XML dialect by
//! [`xml::to_xml`]; inbound bodies come back through [`xml::from_xml`].

pub use error::ProtocolError;
pub use fields::{FieldMapping, FieldValue, merge};
pub use nonce::{nonce_str, random_string, unix_timestamp};

pub mod canonical;
mod error;
mod fields;
mod nonce;
pub mod xml;

/// Name of the signature field. It is never part of its own signing input.
pub const SIGN: &str = "sign";
/// Name of the field selecting the signature algorithm.
pub const SIGN_TYPE: &str = "sign_type";
/// Value of `return_code` / `result_code` meaning success.
pub const SUCCESS: &str = "SUCCESS";
/// Value of `return_code` / `result_code` meaning failure.
pub const FAIL: &str = "FAIL";
