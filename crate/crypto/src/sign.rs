//! Request and notification signatures.
//!
//! The digest input is `canonical(fields) + "&key=" + partner_key`. `MD5` is the plain
//! digest, `HMAC-SHA256` is keyed with the partner key; both are rendered as upper-case hex.

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use openssl::{hash::MessageDigest, memcmp, pkey::PKey, sign::Signer};
use wxpay_logger::trace;
use wxpay_protocol::{FieldMapping, SIGN, SIGN_TYPE, canonical};
use zeroize::Zeroizing;

use crate::{CryptoError, error::result::CryptoResult};

/// Signature algorithm, as named in the `sign_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignType {
    #[default]
    Md5,
    HmacSha256,
}

impl SignType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::HmacSha256 => "HMAC-SHA256",
        }
    }

    /// Algorithm named by the `sign_type` field of `fields`, `MD5` when absent.
    pub fn from_fields(fields: &FieldMapping) -> CryptoResult<Self> {
        match fields.get(SIGN_TYPE) {
            None => Ok(Self::default()),
            Some(value) => value.to_string().parse(),
        }
    }
}

impl Display for SignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignType {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MD5" => Ok(Self::Md5),
            "HMAC-SHA256" => Ok(Self::HmacSha256),
            other => Err(CryptoError::SignType(other.to_owned())),
        }
    }
}

/// The exact string that gets digested. It embeds the partner key.
#[must_use]
pub fn signing_string(fields: &FieldMapping, partner_key: &str) -> Zeroizing<String> {
    let mut s = canonical::encode(fields);
    s.push_str("&key=");
    s.push_str(partner_key);
    Zeroizing::new(s)
}

/// Compute the `sign` value of `fields`. An existing `sign` field is ignored.
pub fn sign(fields: &FieldMapping, sign_type: SignType, partner_key: &str) -> CryptoResult<String> {
    let input = signing_string(fields, partner_key);
    let digest = match sign_type {
        SignType::Md5 => md5_hex(input.as_bytes())?,
        SignType::HmacSha256 => hmac_sha256_hex(partner_key.as_bytes(), input.as_bytes())?,
    };
    Ok(digest.to_uppercase())
}

/// Recompute the signature and compare it with `claimed`, byte for byte.
pub fn verify(
    fields: &FieldMapping,
    claimed: &str,
    sign_type: SignType,
    partner_key: &str,
) -> CryptoResult<bool> {
    let expected = sign(fields, sign_type, partner_key)?;
    Ok(expected.len() == claimed.len() && memcmp::eq(expected.as_bytes(), claimed.as_bytes()))
}

/// Verify the `sign` field of an inbound mapping with the algorithm named by its own
/// `sign_type` field. A mapping without `sign` does not verify.
pub fn verify_fields(fields: &FieldMapping, partner_key: &str) -> CryptoResult<bool> {
    let Some(claimed) = fields.get(SIGN).map(ToString::to_string) else {
        trace!("no sign field to verify");
        return Ok(false)
    };
    let sign_type = SignType::from_fields(fields)?;
    verify(fields, &claimed, sign_type, partner_key)
}

/// Lower-case hex MD5 digest.
pub fn md5_hex(data: &[u8]) -> CryptoResult<String> {
    let digest = openssl::hash::hash(MessageDigest::md5(), data)?;
    Ok(hex::encode(&*digest))
}

/// Lower-case hex HMAC-SHA256.
pub fn hmac_sha256_hex(key: &[u8], data: &[u8]) -> CryptoResult<String> {
    let pkey = PKey::hmac(key)?;
    let mut signer = Signer::new(MessageDigest::sha256(), &pkey)?;
    signer.update(data)?;
    Ok(hex::encode(signer.sign_to_vec()?))
}

/// Key of the refund notification cipher: the lower-case hex MD5 of the partner key,
/// whose 32 ASCII characters are used as raw AES-256 key bytes.
pub fn derive_refund_key(partner_key: &str) -> CryptoResult<Zeroizing<String>> {
    Ok(Zeroizing::new(md5_hex(partner_key.as_bytes())?))
}

#[expect(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use wxpay_protocol::{FieldMapping, fields};

    use super::{
        SignType, derive_refund_key, hmac_sha256_hex, md5_hex, sign, signing_string, verify,
        verify_fields,
    };
    use crate::CryptoError;

    const PARTNER_KEY: &str = "192006250b4c09247ec02edce69f6a2d";

    // Example published in the gateway documentation
    fn documented_fields() -> FieldMapping {
        fields! {
            "appid" => "wxd930ea5d5a258f4f",
            "mch_id" => "10000100",
            "device_info" => "1000",
            "body" => "test",
            "nonce_str" => "ibuaiVcKdpRxkhJA",
        }
    }

    #[test]
    fn test_signing_string() {
        let s = signing_string(&documented_fields(), PARTNER_KEY);
        assert_eq!(
            s.as_str(),
            "appid=wxd930ea5d5a258f4f&body=test&device_info=1000&mch_id=10000100&nonce_str=\
             ibuaiVcKdpRxkhJA&key=192006250b4c09247ec02edce69f6a2d"
        );
    }

    #[test]
    fn test_sign_documented_vectors() {
        let fields = documented_fields();
        assert_eq!(
            sign(&fields, SignType::Md5, PARTNER_KEY).unwrap(),
            "9A0A8659F005D6984697E2CA0A9CF3B7"
        );
        assert_eq!(
            sign(&fields, SignType::HmacSha256, PARTNER_KEY).unwrap(),
            "6A9AE1657590FD6257D693A078E1C3E4BB6BA4DC30B23E0EE2496E54170DACD6"
        );
    }

    #[test]
    fn test_digest_helpers() {
        assert_eq!(md5_hex(b"").unwrap(), "d41d8cd98f00b204e9800998ecf8427e");
        // RFC 4231 test case 2
        assert_eq!(
            hmac_sha256_hex(b"Jefe", b"what do ya want for nothing?").unwrap(),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
        let refund_key = derive_refund_key(PARTNER_KEY).unwrap();
        assert_eq!(refund_key.len(), 32);
        assert_eq!(refund_key.as_str(), refund_key.to_lowercase());
    }

    #[test]
    fn test_sign_verify_round_trip() {
        for sign_type in [SignType::Md5, SignType::HmacSha256] {
            let mut fields = documented_fields().with("sign_type", sign_type.as_str());
            let signature = sign(&fields, sign_type, PARTNER_KEY).unwrap();
            assert!(verify(&fields, &signature, sign_type, PARTNER_KEY).unwrap());

            fields.insert("sign", signature.clone());
            assert!(verify_fields(&fields, PARTNER_KEY).unwrap());
            // the sign field does not take part in its own signature
            assert_eq!(sign(&fields, sign_type, PARTNER_KEY).unwrap(), signature);
        }
    }

    #[test]
    fn test_tamper_detection() {
        let mut fields = documented_fields();
        let signature = sign(&fields, SignType::Md5, PARTNER_KEY).unwrap();
        fields.insert("sign", signature);
        let keys: Vec<String> = fields
            .keys()
            .filter(|k| *k != "sign")
            .map(ToOwned::to_owned)
            .collect();
        for key in keys {
            let mut tampered = fields.clone();
            let mut value = tampered.get_string(&key).unwrap();
            value.push('x');
            tampered.insert(key.as_str(), value);
            assert!(!verify_fields(&tampered, PARTNER_KEY).unwrap(), "{key}");
        }
        // wrong key
        assert!(!verify_fields(&fields, "another key").unwrap());
        // lower-case signature does not match byte for byte
        let lower = fields.get_string("sign").unwrap().to_lowercase();
        fields.insert("sign", lower);
        assert!(!verify_fields(&fields, PARTNER_KEY).unwrap());
    }

    #[test]
    fn test_sign_type_selection() {
        assert_eq!(
            SignType::from_fields(&documented_fields()).unwrap(),
            SignType::Md5
        );
        let f = documented_fields().with("sign_type", "HMAC-SHA256");
        assert_eq!(SignType::from_fields(&f).unwrap(), SignType::HmacSha256);
        let f = documented_fields().with("sign_type", "SHA1");
        assert_eq!(
            SignType::from_fields(&f).unwrap_err(),
            CryptoError::SignType("SHA1".to_owned())
        );
        assert!("hmac-sha256".parse::<SignType>().is_err());
        // no sign field
        assert!(!verify_fields(&documented_fields(), PARTNER_KEY).unwrap());
    }
}
