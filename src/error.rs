use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    /// The palette resource is missing or malformed. No partial palette is kept.
    #[error("Palette data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Palette is empty")]
    PaletteEmpty,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        let err = ChartError::InvalidParameter("color count 1 is below 2".to_string());
        assert_eq!(err.to_string(), "Invalid parameter: color count 1 is below 2");
        assert_eq!(ChartError::PaletteEmpty.to_string(), "Palette is empty");
    }
}
