use crate::error::ProtocolError;

pub type ProtocolResult<R> = Result<R, ProtocolError>;
