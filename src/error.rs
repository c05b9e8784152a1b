use std::fmt;

#[derive(Debug)]
pub enum DeckError {
    InvalidConfiguration(String),
    Asset { key: String, message: String },
    Decode(String),
    Pdf(String),
    Io(std::io::Error),
}

impl DeckError {
    pub(crate) fn asset(key: &str, message: impl Into<String>) -> Self {
        DeckError::Asset {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DeckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            DeckError::Asset { key, message } => write!(f, "asset '{}': {}", key, message),
            DeckError::Decode(message) => write!(f, "malformed analysis bundle: {}", message),
            DeckError::Pdf(message) => write!(f, "pdf output error: {}", message),
            DeckError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for DeckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DeckError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DeckError {
    fn from(value: std::io::Error) -> Self {
        DeckError::Io(value)
    }
}

impl From<serde_json::Error> for DeckError {
    fn from(value: serde_json::Error) -> Self {
        DeckError::Decode(value.to_string())
    }
}
