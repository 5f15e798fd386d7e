use crate::error::CryptoError;

pub(crate) type CryptoResult<R> = Result<R, CryptoError>;

pub trait CryptoResultHelper<T> {
    /// Turn any failure into a [`CryptoError::Decrypt`] so that callers fail closed.
    fn decrypt_context(self, context: &str) -> CryptoResult<T>;
}

impl<T, E> CryptoResultHelper<T> for Result<T, E>
where
    E: std::error::Error,
{
    fn decrypt_context(self, context: &str) -> CryptoResult<T> {
        self.map_err(|e| CryptoError::Decrypt(format!("{context}: {e}")))
    }
}

