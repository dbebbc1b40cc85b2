use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiaglotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("XML encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed page payload: {0}")]
    MalformedPayload(String),

    #[error("Node has no id, cannot wrap without breaking references")]
    MissingIdentity,

    #[error("Language detection failed: {0}")]
    Detection(String),

    #[error("Translation backend error: {0}")]
    Backend(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, DiaglotError>;
