use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading the marker layer's features
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed KML: {0}")]
    Kml(#[from] quick_xml::Error),
    #[error("malformed GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
}

/// Failures while fetching or decoding a base layer tile
#[derive(Debug, Error)]
pub enum TileError {
    #[error("tile request failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("tile server answered {0}")]
    Status(reqwest::StatusCode),
    #[error("tile image could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
}

/// Failures while writing the exported route
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
