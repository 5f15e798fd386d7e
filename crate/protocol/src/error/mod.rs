use thiserror::Error;

pub(crate) mod result;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("XMLDataError: {0}")]
    XmlDecode(String),

    #[error("XML encoding error: {0}")]
    XmlEncode(String),
}

impl From<quick_xml::Error> for ProtocolError {
    fn from(e: quick_xml::Error) -> Self {
        Self::XmlDecode(e.to_string())
    }
}

impl From<std::string::FromUtf8Error> for ProtocolError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::XmlDecode(format!("invalid UTF-8: {e}"))
    }
}
