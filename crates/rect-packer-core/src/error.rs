use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("Invalid dimensions: {width}x{height} (both sides must be positive)")]
    InvalidDimensions { width: String, height: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
    #[error("Rectangle {index} ({rect}) lies outside its {width}x{height} bin")]
    OutsideBin {
        index: usize,
        rect: String,
        width: String,
        height: String,
    },
    #[error("Rectangles {first} and {second} overlap")]
    Collision { first: usize, second: usize },
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PackError {
    pub(crate) fn invalid_dimensions<N: std::fmt::Debug>(width: N, height: N) -> Self {
        Self::InvalidDimensions {
            width: format!("{width:?}"),
            height: format!("{height:?}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, PackError>;
