#![allow(clippy::unwrap_used)]

use wxpay_client::GatewayIdentity;
use wxpay_crypto::{SignType, encrypt_refund_info, sign, verify_fields};
use wxpay_logger::log_init;
use wxpay_protocol::{FieldMapping, FieldValue, fields, xml};

use crate::{CONTENT_TYPE, NotifyError, NotifyVerifier, Outcome, Stage, VerificationFailure};

const APPID: &str = "wxd930ea5d5a258f4f";
const MCH_ID: &str = "10000100";
const PARTNER_KEY: &str = "192006250b4c09247ec02edce69f6a2d";

fn verifier() -> NotifyVerifier {
    NotifyVerifier::new(GatewayIdentity::new(APPID, MCH_ID, PARTNER_KEY).unwrap())
}

fn signed(mut fields: FieldMapping, sign_type: SignType) -> FieldMapping {
    let signature = sign(&fields, sign_type, PARTNER_KEY).unwrap();
    fields.insert("sign", signature);
    fields
}

fn payment_fields() -> FieldMapping {
    fields! {
        "appid" => APPID,
        "mch_id" => MCH_ID,
        "nonce_str" => "5K8264ILTKCH16CQ2502SI8ZNMTM67VS",
        "result_code" => "SUCCESS",
        "return_code" => "SUCCESS",
        "openid" => "oUpF8uMuAJO_M2pxb1Q9zNjWeS6o",
        "out_trade_no" => "1409811653",
        "total_fee" => "1",
        "transaction_id" => "1004400740201409030005092168",
    }
}

fn body(fields: &FieldMapping) -> Vec<u8> {
    xml::to_xml(fields).unwrap()
}

fn rejection(outcome: Outcome) -> VerificationFailure {
    outcome.into_result().unwrap_err()
}

#[test]
fn test_payment_notification() {
    log_init(option_env!("RUST_LOG"));
    let notification = signed(payment_fields(), SignType::Md5);

    let outcome = verifier().payment(&body(&notification));
    assert!(outcome.is_ready());
    let verified = outcome.into_result().unwrap();
    assert_eq!(
        verified.stages(),
        [
            Stage::Received,
            Stage::Parsed,
            Stage::StatusChecked,
            Stage::SignatureVerified,
            Stage::Ready
        ]
    );
    assert_eq!(verified.fields(), &notification);

    let reply = verified.replier().success().unwrap();
    assert_eq!(
        reply.body(),
        b"<xml><return_code><![CDATA[SUCCESS]]></return_code></xml>"
    );
    assert_eq!(reply.content_type(), CONTENT_TYPE);
}

#[test]
fn test_payment_notification_hmac() {
    let notification = signed(
        payment_fields().with("sign_type", "HMAC-SHA256"),
        SignType::HmacSha256,
    );
    assert!(verifier().payment(&body(&notification)).is_ready());
}

#[test]
fn test_payment_remote_failures() {
    // a failed return_code stops the pipeline before the signature check
    let notification = fields! { "return_code" => "FAIL", "return_msg" => "SYSTEMERROR" };
    let Outcome::Failed(failed) = verifier().payment(&body(&notification)) else {
        panic!("a FAIL notification must be rejected");
    };
    assert_eq!(
        failed.failure(),
        &VerificationFailure::RemoteStatus {
            stage: Stage::StatusChecked,
            message: "SYSTEMERROR".to_owned(),
        }
    );
    let reply = xml::from_xml(failed.reply().unwrap().body()).unwrap();
    assert_eq!(
        reply,
        fields! { "return_code" => "FAIL", "return_msg" => "SYSTEMERROR" }
    );

    let notification = signed(
        payment_fields()
            .with("result_code", "FAIL")
            .with("err_code", "ORDERPAID"),
        SignType::Md5,
    );
    let failure = rejection(verifier().payment(&body(&notification)));
    assert_eq!(failure.reply_message(), "ORDERPAID");
    assert_eq!(failure.stage(), Stage::StatusChecked);

    // an empty body decodes to no fields, which has no return_code
    let failure = rejection(verifier().payment(b""));
    assert!(matches!(failure, VerificationFailure::RemoteStatus { .. }));
    assert_eq!(failure.reply_message(), "Error");
}

#[test]
fn test_payment_invalid_signature() {
    let mut notification = signed(payment_fields(), SignType::Md5);
    notification.insert("total_fee", "100");

    let failure = rejection(verifier().payment(&body(&notification)));
    assert_eq!(failure.stage(), Stage::SignatureVerified);
    assert_eq!(failure.kind(), "invalid_signature");
    assert_eq!(failure.reply_message(), "INVALID_SIGN");

    // unsigned
    let failure = rejection(verifier().payment(&body(&payment_fields())));
    assert!(matches!(failure, VerificationFailure::InvalidSignature { .. }));

    // an algorithm that cannot be checked
    let notification = signed(payment_fields(), SignType::Md5).with("sign_type", "SHA1");
    let failure = rejection(verifier().payment(&body(&notification)));
    assert!(matches!(failure, VerificationFailure::InvalidSignature { .. }));
}

#[test]
fn test_payment_malformed_body() {
    let failure = rejection(verifier().payment(b"<xml><return_code>SUCCESS</xml>"));
    assert_eq!(failure.stage(), Stage::Parsed);
    assert_eq!(failure.kind(), "decode");
    assert_eq!(failure.reply_message(), "XMLDataError");
}

fn refund_key() -> String {
    GatewayIdentity::new(APPID, MCH_ID, PARTNER_KEY)
        .unwrap()
        .refund_key()
        .to_owned()
}

#[test]
fn test_refund_notification() {
    let req_info = "<root><out_refund_no><![CDATA[R1]]></out_refund_no>\
                    <refund_status><![CDATA[SUCCESS]]></refund_status>\
                    <refund_fee><![CDATA[1]]></refund_fee></root>";
    let encrypted = encrypt_refund_info(req_info, refund_key().as_bytes()).unwrap();
    let notification = fields! {
        "return_code" => "SUCCESS",
        "appid" => APPID,
        "mch_id" => MCH_ID,
        "nonce_str" => "TeqClE3i0mvn3DrK",
        "req_info" => encrypted,
    };

    let verified = verifier()
        .refund(&body(&notification))
        .into_result()
        .unwrap();
    assert_eq!(
        verified.stages(),
        [
            Stage::Received,
            Stage::Parsed,
            Stage::StatusChecked,
            Stage::Decrypted,
            Stage::Ready
        ]
    );
    let Some(FieldValue::Nested(info)) = verified.fields().get("req_info") else {
        panic!("req_info must be replaced by its decoded content");
    };
    assert_eq!(info.get_str("out_refund_no"), Some("R1"));
    assert_eq!(info.get_str("refund_status"), Some("SUCCESS"));
    assert_eq!(verified.fields().get_str("appid"), Some(APPID));
}

#[test]
fn test_refund_decrypt_failures() {
    let encrypted =
        encrypt_refund_info("<root><a>1</a></root>", refund_key().as_bytes()).unwrap();
    // drop the last base64 quantum: the ciphertext is no longer whole blocks
    let tampered = &encrypted[..encrypted.len() - 4];

    let notification = fields! { "return_code" => "SUCCESS", "req_info" => tampered };
    let outcome = verifier().refund(&body(&notification));
    let Outcome::Failed(failed) = outcome else {
        panic!("a tampered req_info must be rejected");
    };
    assert!(matches!(
        failed.failure(),
        VerificationFailure::Decrypt {
            stage: Stage::Decrypted,
            ..
        }
    ));
    let reply = xml::from_xml(failed.reply().unwrap().body()).unwrap();
    assert_eq!(reply.get_str("return_msg"), Some("DECRYPT_ERROR"));

    // missing req_info
    let notification = fields! { "return_code" => "SUCCESS" };
    let failure = rejection(verifier().refund(&body(&notification)));
    assert!(matches!(failure, VerificationFailure::Decrypt { .. }));

    // the status check comes first
    let notification = fields! { "return_code" => "FAIL", "return_msg" => "NOAUTH" };
    let failure = rejection(verifier().refund(&body(&notification)));
    assert_eq!(failure.reply_message(), "NOAUTH");
}

fn assert_decrypt_rejected(req_info: &str) {
    let notification = fields! { "return_code" => "SUCCESS", "req_info" => req_info };
    let Outcome::Failed(failed) = verifier().refund(&body(&notification)) else {
        panic!("req_info {req_info} must be rejected");
    };
    assert!(
        matches!(
            failed.failure(),
            VerificationFailure::Decrypt {
                stage: Stage::Decrypted,
                ..
            }
        ),
        "{:?}",
        failed.failure()
    );
    let reply = xml::from_xml(failed.reply().unwrap().body()).unwrap();
    assert_eq!(reply.get_str("return_msg"), Some("DECRYPT_ERROR"));
}

#[test]
fn test_refund_decrypted_payload_must_be_a_document() {
    let refund_key = refund_key();
    for plaintext in ["refund_status=SUCCESS", "<root><a>1</a>"] {
        let encrypted = encrypt_refund_info(plaintext, refund_key.as_bytes()).unwrap();
        assert_decrypt_rejected(&encrypted);
    }
}

#[test]
fn test_refund_flipped_ciphertext() {
    let encrypted = encrypt_refund_info(
        "<root><out_refund_no><![CDATA[R1]]></out_refund_no></root>",
        refund_key().as_bytes(),
    )
    .unwrap();
    // the first base64 character only feeds the first byte of the first block
    let first = if encrypted.starts_with('A') { "B" } else { "A" };
    let flipped = format!("{first}{}", &encrypted[1..]);
    assert_ne!(flipped, encrypted);
    assert_decrypt_rejected(&flipped);
}

#[test]
fn test_native_notification() {
    let push = signed(
        fields! {
            "appid" => APPID,
            "openid" => "o8GeHuLAsgefS_80exEr1cTqekUs",
            "mch_id" => MCH_ID,
            "is_subscribe" => "N",
            "nonce_str" => "5K8264ILTKCH16CQ2502SI8ZNMTM67VS",
            "product_id" => "88888",
        },
        SignType::Md5,
    );
    let verified = verifier().native(&body(&push)).into_result().unwrap();
    assert_eq!(
        verified.stages(),
        [
            Stage::Received,
            Stage::Parsed,
            Stage::SignatureVerified,
            Stage::Ready
        ]
    );
    assert_eq!(verified.fields().get_str("product_id"), Some("88888"));

    let mut forged = push;
    forged.insert("product_id", "99999");
    assert!(matches!(
        rejection(verifier().native(&body(&forged))),
        VerificationFailure::InvalidSignature { .. }
    ));
}

#[test]
fn test_native_reply() {
    let push = signed(fields! { "product_id" => "88888" }, SignType::Md5);
    let outcome = verifier().native(&body(&push));
    let replier = outcome.replier();

    let reply = replier
        .native("wx201410272009395522657a690389285100", None)
        .unwrap();
    let reply = xml::from_xml(reply.body()).unwrap();
    assert_eq!(reply.get_str("return_code"), Some("SUCCESS"));
    assert_eq!(reply.get_str("result_code"), Some("SUCCESS"));
    assert_eq!(reply.get_str("appid"), Some(APPID));
    assert_eq!(reply.get_str("mch_id"), Some(MCH_ID));
    assert_eq!(
        reply.get_str("prepay_id"),
        Some("wx201410272009395522657a690389285100")
    );
    assert_eq!(reply.get_str("nonce_str").map(str::len), Some(16));
    assert!(verify_fields(&reply, PARTNER_KEY).unwrap());

    let reply = replier.native("", Some("product sold out")).unwrap();
    let reply = xml::from_xml(reply.body()).unwrap();
    assert_eq!(reply.get_str("result_code"), Some("FAIL"));
    assert_eq!(reply.get_str("err_code_des"), Some("product sold out"));
    assert!(verify_fields(&reply, PARTNER_KEY).unwrap());

    assert!(matches!(
        replier.native("", None),
        Err(NotifyError::Default(_))
    ));
}

#[test]
fn test_verifier_is_shared() {
    let verifier = &verifier();
    let notification = &body(&signed(payment_fields(), SignType::Md5));
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(move || verifier.payment(notification).is_ready()))
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    });
}
