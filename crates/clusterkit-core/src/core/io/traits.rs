use crate::core::models::cluster::Cluster;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Format-independent knobs for writers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// File whose content is emitted ahead of the structure, for formats that accept
    /// leading directives (GIN). Ignored by the other writers.
    pub control_file: Option<PathBuf>,
}

impl WriteOptions {
    pub fn with_control_file(path: impl Into<PathBuf>) -> Self {
        Self {
            control_file: Some(path.into()),
        }
    }
}

/// Defines the interface for reading and writing a cluster structure format.
///
/// Implementors only provide the stream-based `read_from`/`write_to`; the path-based
/// helpers open and buffer the file.
pub trait ClusterFile {
    /// The error type for I/O and parse failures.
    type Error: Error + From<io::Error>;

    /// Reads a cluster from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the reader fails.
    fn read_from(reader: &mut impl BufRead) -> Result<Cluster, Self::Error>;

    /// Writes a cluster to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails or a referenced control file cannot be read.
    fn write_to(
        cluster: &Cluster,
        options: &WriteOptions,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Reads a cluster from a file path.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Cluster, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a cluster to a file path, creating or truncating the file.
    fn write_to_path<P: AsRef<Path>>(
        cluster: &Cluster,
        options: &WriteOptions,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(cluster, options, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
