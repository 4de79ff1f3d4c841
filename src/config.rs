use crate::chart::{ChartTexts, LayoutConfig, PageSize};
use crate::error::{ChartError, Result};
use serde::Deserialize;
use std::path::Path;

/// Everything one chart request needs besides the image itself.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatternConfig {
    /// Longest side of the stitch grid.
    pub grid_size: u32,
    pub color_count: u32,
    pub monochrome: bool,
    pub page_size: PageSize,
    pub texts: ChartTexts,
    pub preview_width: u32,
    pub dense_cell_size: f32,
    pub dense_legend_space: f32,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            grid_size: 100,
            color_count: 15,
            monochrome: false,
            page_size: PageSize::A4,
            texts: ChartTexts::default(),
            preview_width: 600,
            dense_cell_size: 15.0,
            dense_legend_space: 100.0,
        }
    }
}

impl PatternConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            ChartError::InvalidParameter(format!(
                "Failed to read config {}: {}",
                path.display(),
                err
            ))
        })?;
        let config: PatternConfig = serde_json::from_str(&text)?;
        log::debug!("Loaded pattern config from {}", path.display());
        Ok(config)
    }

    /// Page layout for the multi-page and dense charts.
    pub fn layout(&self) -> LayoutConfig {
        LayoutConfig {
            page_size: self.page_size,
            monochrome: self.monochrome,
            dense_cell_size: self.dense_cell_size,
            dense_legend_space: self.dense_legend_space,
            ..LayoutConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = PatternConfig::default();
        assert_eq!(config.grid_size, 100);
        assert_eq!(config.color_count, 15);
        assert!(!config.monochrome);
        assert_eq!(config.page_size, PageSize::A4);
        assert_eq!(config.texts.main_title, "My Beautiful Flower");
    }

    #[test]
    fn loads_partial_json_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"grid_size": 60, "monochrome": true, "texts": {{"main_title": "Roses"}}}}"#
        )
        .expect("write config");

        let config = PatternConfig::from_json_file(file.path()).expect("config should load");
        assert_eq!(config.grid_size, 60);
        assert_eq!(config.color_count, 15);
        assert!(config.monochrome);
        assert_eq!(config.texts.main_title, "Roses");
        assert_eq!(config.texts.sub_title, "Cross stitch chart");

        let layout = config.layout();
        assert!(layout.monochrome);
        assert_eq!(layout.margin, 50.0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{{ grid_size: ").expect("write config");
        assert!(matches!(
            PatternConfig::from_json_file(file.path()),
            Err(ChartError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(PatternConfig::from_json_file("/definitely/not/here.json").is_err());
    }
}
