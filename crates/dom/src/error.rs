use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomError {
    #[error("XML parse error: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("Failed to read XML file: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML serialization error: {0}")]
    Serialize(String),

    #[error("Serialized XML is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Node key {0:?} does not belong to this document")]
    UnknownNode(crate::NodeKey),
}
