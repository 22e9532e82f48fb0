use clusterkit::core::utils::elements::ElementLoadError;
use clusterkit::workflows::collection::StatisticsError;
use clusterkit::workflows::convert::ConversionError;
use clusterkit::workflows::surface::SurfaceEnergyError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    SurfaceEnergy(#[from] SurfaceEnergyError),

    #[error(transparent)]
    Statistics(#[from] StatisticsError),

    #[error("Element data error: {0}")]
    Elements(#[from] ElementLoadError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("{failed} of {total} file(s) failed to convert")]
    BatchFailed { failed: usize, total: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
