use std::path::PathBuf;
use thiserror::Error;

/// Why an image could not be turned into a data-URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("could not encode {url}: {reason}")]
    Encode { url: String, reason: String },

    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("image directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("did not find any jpeg images in {0}")]
    NoImages(PathBuf),
}

#[derive(Debug, Error, PartialEq)]
pub enum RideError {
    #[error("did not find any GPX files in {0}")]
    NoRides(PathBuf),

    #[error("could not extract GPS track points from {0}")]
    NoTrackPoints(PathBuf),

    #[error("ride_text must contain the same number of entries as rides loaded ({expected}), got {got}")]
    TextCount { expected: usize, got: usize },
}

#[derive(Debug, Error, PartialEq)]
#[error("invalid data-URL: {0}")]
pub struct DataUrlError(pub String);
