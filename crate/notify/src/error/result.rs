use crate::error::NotifyError;

pub type NotifyResult<R> = Result<R, NotifyError>;
