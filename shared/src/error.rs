use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChoroplethError {
    #[error("invalid GeoJSON: {0}")]
    InvalidGeoJson(#[from] geojson::Error),
    #[error("position needs at least 2 ordinates, got {0}")]
    ShortPosition(usize),
    #[error("invalid options JSON: {0}")]
    InvalidConfig(#[source] serde_json::Error),
    #[error("duplicate data point id: {0}")]
    DuplicateDataId(String),
    #[error("invalid option: {0}")]
    InvalidOption(String),
}
