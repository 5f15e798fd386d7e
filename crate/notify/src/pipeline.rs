//! Inbound verification pipeline.
//!
//! Every notification goes through `Received -> Parsed -> (StatusChecked) ->
//! (SignatureVerified) -> (Decrypted) -> Ready`; which of the optional stages run is set by a
//! [`PipelineConfig`]. The first failing stage stops the pipeline.

use std::{fmt, sync::Arc};

use wxpay_client::{GatewayConf, GatewayIdentity};
use wxpay_crypto::{decrypt_refund_info, verify_fields};
use wxpay_logger::{debug, warn};
use wxpay_protocol::{FieldMapping, SUCCESS, xml};

use crate::{
    error::{VerificationFailure, result::NotifyResult},
    reply::{Reply, ReplyBuilder},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Parsed,
    StatusChecked,
    SignatureVerified,
    Decrypted,
    Ready,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Received => "Received",
            Self::Parsed => "Parsed",
            Self::StatusChecked => "StatusChecked",
            Self::SignatureVerified => "SignatureVerified",
            Self::Decrypted => "Decrypted",
            Self::Ready => "Ready",
        })
    }
}

/// Optional stages run by a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub name: &'static str,
    /// Reject a `return_code` other than `SUCCESS`.
    pub check_return_code: bool,
    /// Also reject a `result_code` other than `SUCCESS`.
    pub check_result_code: bool,
    pub verify_signature: bool,
    /// Field holding an encrypted XML document, replaced in place by its decoded content.
    pub encrypted_field: Option<&'static str>,
}

impl PipelineConfig {
    /// Payment result notification.
    pub const PAYMENT: Self = Self {
        name: "payment",
        check_return_code: true,
        check_result_code: true,
        verify_signature: true,
        encrypted_field: None,
    };
    /// Refund result notification. There is no outer signature: `req_info` is encrypted
    /// with the refund key instead.
    pub const REFUND: Self = Self {
        name: "refund",
        check_return_code: true,
        check_result_code: false,
        verify_signature: false,
        encrypted_field: Some("req_info"),
    };
    /// Native (QR code mode one) order push; it carries no status envelope.
    pub const NATIVE: Self = Self {
        name: "native",
        check_return_code: false,
        check_result_code: false,
        verify_signature: true,
        encrypted_field: None,
    };
}

/// A notification that went through every stage of its pipeline.
#[derive(Debug, Clone)]
pub struct VerifiedNotification {
    fields: FieldMapping,
    stages: Vec<Stage>,
    replier: ReplyBuilder,
}

impl VerifiedNotification {
    #[must_use]
    pub const fn fields(&self) -> &FieldMapping {
        &self.fields
    }

    #[must_use]
    pub fn into_fields(self) -> FieldMapping {
        self.fields
    }

    /// Stages reached, in order, from `Received` to `Ready`.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    #[must_use]
    pub const fn replier(&self) -> &ReplyBuilder {
        &self.replier
    }
}

/// A rejected notification.
#[derive(Debug, Clone)]
pub struct FailedNotification {
    failure: VerificationFailure,
    replier: ReplyBuilder,
}

impl FailedNotification {
    #[must_use]
    pub const fn failure(&self) -> &VerificationFailure {
        &self.failure
    }

    /// The `FAIL` reply to send back.
    pub fn reply(&self) -> NotifyResult<Reply> {
        self.replier.fail(self.failure.reply_message())
    }
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Ready(VerifiedNotification),
    Failed(FailedNotification),
}

impl Outcome {
    pub fn into_result(self) -> Result<VerifiedNotification, VerificationFailure> {
        match self {
            Self::Ready(notification) => Ok(notification),
            Self::Failed(failed) => Err(failed.failure),
        }
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    #[must_use]
    pub const fn replier(&self) -> &ReplyBuilder {
        match self {
            Self::Ready(notification) => &notification.replier,
            Self::Failed(failed) => &failed.replier,
        }
    }
}

/// Runs the verification pipelines for one merchant.
///
/// It only reads the identity, so one verifier serves any number of concurrent
/// notifications.
#[derive(Debug, Clone)]
pub struct NotifyVerifier {
    identity: Arc<GatewayIdentity>,
}

impl NotifyVerifier {
    #[must_use]
    pub fn new(identity: GatewayIdentity) -> Self {
        Self {
            identity: Arc::new(identity),
        }
    }

    pub fn from_conf(conf: &GatewayConf) -> NotifyResult<Self> {
        Ok(Self::new(GatewayIdentity::from_conf(conf)?))
    }

    #[must_use]
    pub fn identity(&self) -> &GatewayIdentity {
        &self.identity
    }

    /// Verify a payment result notification.
    #[must_use]
    pub fn payment(&self, body: &[u8]) -> Outcome {
        self.verify(&PipelineConfig::PAYMENT, body)
    }

    /// Verify a refund result notification and decrypt its `req_info`.
    #[must_use]
    pub fn refund(&self, body: &[u8]) -> Outcome {
        self.verify(&PipelineConfig::REFUND, body)
    }

    /// Verify a native order push.
    #[must_use]
    pub fn native(&self, body: &[u8]) -> Outcome {
        self.verify(&PipelineConfig::NATIVE, body)
    }

    #[must_use]
    pub fn verify(&self, config: &PipelineConfig, body: &[u8]) -> Outcome {
        let replier = ReplyBuilder::new(Arc::clone(&self.identity));
        match self.run(config, body) {
            Ok((fields, stages)) => {
                debug!(
                    "{} notification verified through {} stages",
                    config.name,
                    stages.len()
                );
                Outcome::Ready(VerifiedNotification {
                    fields,
                    stages,
                    replier,
                })
            }
            Err(failure) => {
                warn!(
                    pipeline = config.name,
                    kind = failure.kind(),
                    stage = %failure.stage(),
                    "inbound notification rejected: {failure}"
                );
                Outcome::Failed(FailedNotification { failure, replier })
            }
        }
    }

    fn run(
        &self,
        config: &PipelineConfig,
        body: &[u8],
    ) -> Result<(FieldMapping, Vec<Stage>), VerificationFailure> {
        let mut stages = vec![Stage::Received];

        let mut fields = xml::from_xml(body).map_err(|e| VerificationFailure::Decode {
            stage: Stage::Parsed,
            message: e.to_string(),
        })?;
        stages.push(Stage::Parsed);

        if config.check_return_code {
            check_status(&fields, config.check_result_code)?;
            stages.push(Stage::StatusChecked);
        }

        if config.verify_signature {
            self.check_signature(&fields)?;
            stages.push(Stage::SignatureVerified);
        }

        if let Some(field) = config.encrypted_field {
            let decrypted = self.decrypt_field(&fields, field)?;
            fields.insert(field, decrypted);
            stages.push(Stage::Decrypted);
        }

        stages.push(Stage::Ready);
        Ok((fields, stages))
    }

    fn check_signature(&self, fields: &FieldMapping) -> Result<(), VerificationFailure> {
        let invalid = |message: String| VerificationFailure::InvalidSignature {
            stage: Stage::SignatureVerified,
            message,
        };
        match verify_fields(fields, self.identity.partner_key()) {
            Ok(true) => Ok(()),
            Ok(false) if fields.contains_key("sign") => {
                Err(invalid("signature mismatch".to_owned()))
            }
            Ok(false) => Err(invalid("no sign field".to_owned())),
            // an unknown sign_type cannot be checked
            Err(e) => Err(invalid(e.to_string())),
        }
    }

    fn decrypt_field(
        &self,
        fields: &FieldMapping,
        field: &str,
    ) -> Result<FieldMapping, VerificationFailure> {
        let decrypt_error = |message: String| VerificationFailure::Decrypt {
            stage: Stage::Decrypted,
            message,
        };
        let encrypted = fields
            .get_str(field)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| decrypt_error(format!("no {field} field")))?;
        let plaintext = decrypt_refund_info(encrypted, self.identity.refund_key().as_bytes())
            .map_err(|e| decrypt_error(e.to_string()))?;
        // a tampered payload that still unpads must not get any further
        xml::from_xml(plaintext.as_bytes())
            .map_err(|e| decrypt_error(format!("decrypted {field} is not a document: {e}")))
    }
}

fn check_status(
    fields: &FieldMapping,
    check_result_code: bool,
) -> Result<(), VerificationFailure> {
    let rejected = |message: Option<&str>| VerificationFailure::RemoteStatus {
        stage: Stage::StatusChecked,
        message: message.unwrap_or_default().to_owned(),
    };
    if fields.get_str("return_code") != Some(SUCCESS) {
        return Err(rejected(fields.get_str("return_msg")))
    }
    if check_result_code && fields.get_str("result_code") != Some(SUCCESS) {
        return Err(rejected(fields.get_str("err_code")))
    }
    Ok(())
}
