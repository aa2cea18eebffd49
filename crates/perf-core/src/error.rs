use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PerfError {
    #[error("Capability not available: {0}")]
    Unavailable(&'static str),

    #[error("Failed to read {source_name}: {message}")]
    Read {
        source_name: &'static str,
        message: String,
    },

    #[error("Failed to subscribe to {source_name}: {message}")]
    Subscribe {
        source_name: &'static str,
        message: String,
    },

    #[error("Vitals library error: {0}")]
    VitalsLibrary(String),

    #[error("Failed to release subscription: {0}")]
    Release(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PerfError {
    pub fn read(source_name: &'static str, message: impl Into<String>) -> Self {
        PerfError::Read {
            source_name,
            message: message.into(),
        }
    }

    pub fn subscribe(source_name: &'static str, message: impl Into<String>) -> Self {
        PerfError::Subscribe {
            source_name,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PerfError>;
