use std::fmt::Display;

use crate::error::ClientError;

pub type ClientResult<R> = Result<R, ClientError>;

pub trait ClientResultHelper<T> {
    fn context(self, context: &str) -> ClientResult<T>;
    fn with_context<D, O>(self, op: O) -> ClientResult<T>
    where
        D: Display + Send + Sync + 'static,
        O: FnOnce() -> D;
}

impl<T, E> ClientResultHelper<T> for Result<T, E>
where
    E: std::error::Error,
{
    fn context(self, context: &str) -> ClientResult<T> {
        self.map_err(|e| ClientError::Default(format!("{context}: {e}")))
    }

    fn with_context<D, O>(self, op: O) -> ClientResult<T>
    where
        D: Display + Send + Sync + 'static,
        O: FnOnce() -> D,
    {
        self.map_err(|e| ClientError::Default(format!("{}: {e}", op())))
    }
}

impl<T> ClientResultHelper<T> for Option<T> {
    fn context(self, context: &str) -> ClientResult<T> {
        self.ok_or_else(|| ClientError::Default(context.to_owned()))
    }

    fn with_context<D, O>(self, op: O) -> ClientResult<T>
    where
        D: Display + Send + Sync + 'static,
        O: FnOnce() -> D,
    {
        self.ok_or_else(|| ClientError::Default(format!("{}", op())))
    }
}
