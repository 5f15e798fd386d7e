//! Inbound side of the WeChat Pay v2 gateway.
//!
//! The gateway calls the merchant back with XML notifications: payment results, refund
//! results (with an encrypted `req_info`) and native order pushes. [`NotifyVerifier`] runs
//! each body through its pipeline and hands back either the validated fields or a failure,
//! together with a [`ReplyBuilder`] for the synchronous answer.

pub use error::{NotifyError, VerificationFailure, result::NotifyResult};
pub use pipeline::{
    FailedNotification, NotifyVerifier, Outcome, PipelineConfig, Stage, VerifiedNotification,
};
pub use reply::{CONTENT_TYPE, Reply, ReplyBuilder};

mod error;
mod pipeline;
mod reply;

#[cfg(test)]
mod tests;
