use rand::{Rng, distr::Alphanumeric};
use time::OffsetDateTime;

/// Length of the `nonce_str` fields generated by this crate.
pub const NONCE_LENGTH: usize = 16;

/// Random string over `[A-Za-z0-9]`.
#[must_use]
pub fn random_string(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// A fresh `nonce_str`.
#[must_use]
pub fn nonce_str() -> String {
    random_string(NONCE_LENGTH)
}

/// Current Unix time in whole seconds, as the gateway expects it in `timeStamp` fields.
#[must_use]
pub fn unix_timestamp() -> String {
    OffsetDateTime::now_utc().unix_timestamp().to_string()
}
