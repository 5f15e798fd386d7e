use wxpay_crypto::md5_hex;
use wxpay_logger::{debug, trace};
use wxpay_protocol::{FieldMapping, SIGN, SIGN_TYPE, xml};

use crate::{
    client::{PaymentClient, SignedRequest, ensure_ok},
    endpoints::Endpoint,
    error::result::ClientResult,
    transport::MultipartForm,
};

/// File name used when the caller gives none.
pub const DEFAULT_MEDIA_FILENAME: &str = "image.jpg";

impl PaymentClient {
    /// Upload an image for a merchant application and return the decoded answer
    /// (carrying `media_id`).
    ///
    /// The signature covers the endpoint defaults (`mch_id`, `sign_type`) and `media_hash`
    /// (MD5 of the file); the file itself travels as the `media` part of a multipart form,
    /// over mutual TLS.
    pub async fn upload_media(
        &self,
        media: Vec<u8>,
        filename: Option<&str>,
    ) -> ClientResult<FieldMapping> {
        let descriptor = Endpoint::UploadMedia.descriptor();
        let certificate = self.certificate_for(descriptor)?;

        // mch_id and sign_type come from the endpoint defaults
        let mut fields = descriptor.default_fields(self.identity());
        fields.insert("media_hash", md5_hex(&media)?);
        let request = SignedRequest::new(fields, self.identity().partner_key())?;
        let size = media.len();
        let value = |key: &str| request.fields().get_string(key).unwrap_or_default();
        let form = MultipartForm::default()
            .file("media", filename.unwrap_or(DEFAULT_MEDIA_FILENAME), media)
            .text("mch_id", &value("mch_id"))
            .text("media_hash", &value("media_hash"))
            .text(SIGN, request.sign())
            .text(SIGN_TYPE, &value(SIGN_TYPE));

        debug!("uploading {size} bytes to {}", descriptor.url);
        let response = self
            .transport()
            .send_form(descriptor.url, form, certificate)
            .await?;
        let body = ensure_ok(descriptor.endpoint.name(), response)?;
        trace!("<== {}", String::from_utf8_lossy(&body));
        Ok(xml::from_xml(&body)?)
    }
}
