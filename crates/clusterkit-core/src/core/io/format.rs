use super::car::{CarError, CarFile};
use super::gin::{GinError, GinFile};
use super::traits::{ClusterFile, WriteOptions};
use super::xyz::{XyzError, XyzFile};
use crate::core::models::cluster::Cluster;
use phf::{Map, phf_map};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Structure file formats understood by the readers and writers in this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Xyz,
    Car,
    Gin,
}

static EXTENSIONS: Map<&'static str, Format> = phf_map! {
    "xyz" => Format::Xyz,
    "car" => Format::Car,
    "gin" => Format::Gin,
};

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Xyz => write!(f, "XYZ"),
            Format::Car => write!(f, "CAR"),
            Format::Gin => write!(f, "GIN"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Xyz(#[from] XyzError),
    #[error(transparent)]
    Car(#[from] CarError),
    #[error(transparent)]
    Gin(#[from] GinError),
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Xyz, Format::Car, Format::Gin];

    /// Looks up a format by extension, case-insensitively and with or without the
    /// leading dot (`"xyz"`, `".XYZ"`).
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim().trim_start_matches('.').to_ascii_lowercase();
        EXTENSIONS.get(extension.as_str()).copied()
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_extension(path.extension()?.to_str()?)
    }

    /// Canonical lowercase extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Xyz => "xyz",
            Format::Car => "car",
            Format::Gin => "gin",
        }
    }

    pub fn read_path(self, path: &Path) -> Result<Cluster, FormatError> {
        Ok(match self {
            Format::Xyz => XyzFile::read_from_path(path)?,
            Format::Car => CarFile::read_from_path(path)?,
            Format::Gin => GinFile::read_from_path(path)?,
        })
    }

    pub fn write_path(
        self,
        cluster: &Cluster,
        options: &WriteOptions,
        path: &Path,
    ) -> Result<(), FormatError> {
        match self {
            Format::Xyz => XyzFile::write_to_path(cluster, options, path)?,
            Format::Car => CarFile::write_to_path(cluster, options, path)?,
            Format::Gin => GinFile::write_to_path(cluster, options, path)?,
        }
        Ok(())
    }
}
