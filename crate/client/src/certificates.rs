use serde::Deserialize;
use wxpay_crypto::{CipherEnvelope, decrypt_aead};
use wxpay_logger::debug;
use wxpay_protocol::{FieldMapping, fields};

use crate::{
    ClientError,
    client::{PaymentClient, check_return_code},
    endpoints::Endpoint,
    error::result::{ClientResult, ClientResultHelper},
};

/// A decrypted platform certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCertificate {
    pub serial_no: String,
    /// PEM certificate.
    pub certificate: String,
}

#[derive(Deserialize)]
struct CertificateList {
    data: Vec<CertificateEntry>,
}

#[derive(Deserialize)]
struct CertificateEntry {
    serial_no: String,
    encrypt_certificate: CipherEnvelope,
}

impl PaymentClient {
    /// Answer of the `getCert` endpoint, untouched.
    pub async fn get_cert_raw(&self) -> ClientResult<FieldMapping> {
        self.call(Endpoint::GetCert, fields! {}).await
    }

    /// Download the platform certificates and decrypt the last one with the API v3 key.
    pub async fn get_cert(&self) -> ClientResult<PlatformCertificate> {
        let api_v3_key = self.identity().api_v3_key().ok_or_else(|| {
            ClientError::Config("the API v3 key is required to decrypt certificates".to_owned())
        })?;
        let answer = self.get_cert_raw().await?;
        check_return_code(&answer)?;
        decrypt_certificate(&answer, api_v3_key)
    }
}

fn decrypt_certificate(
    answer: &FieldMapping,
    api_v3_key: &str,
) -> ClientResult<PlatformCertificate> {
    let certificates = answer
        .get_str("certificates")
        .context("the answer carries no certificates")?;
    let list: CertificateList = serde_json::from_str(certificates)?;
    let entry = list
        .data
        .into_iter()
        .last()
        .context("the certificate list is empty")?;
    debug!("decrypting platform certificate {}", entry.serial_no);
    let certificate = decrypt_aead(&entry.encrypt_certificate, api_v3_key.as_bytes())?;
    Ok(PlatformCertificate {
        serial_no: entry.serial_no,
        certificate,
    })
}
