use crate::core::models::system::{Energetic, System};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// File name used when statistics are written into a directory.
pub const STATS_FILE_NAME: &str = "Stats.csv";

#[derive(Debug, Error)]
pub enum StatisticsError {
    #[error("File I/O error for '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV error for '{path}': {source}", path = path.display())]
    Csv { path: PathBuf, source: csv::Error },
}

/// Sorts by ascending total energy.
///
/// The sort is stable, so systems of equal energy keep their relative order. NaN
/// energies sort after every finite value.
pub fn sort_by_energy<T: Energetic>(systems: &mut [T]) {
    systems.sort_by(|a, b| a.total_energy().total_cmp(&b.total_energy()));
    debug!("Sorted {} systems by energy", systems.len());
}

#[derive(Debug, Serialize)]
struct StatisticsRow<'a> {
    #[serde(rename = "System")]
    system: &'a str,
    #[serde(rename = "Energy")]
    energy: Fixed,
    #[serde(rename = "Hashkey")]
    hashkey: &'a str,
    #[serde(rename = "Cores")]
    cores: u32,
    #[serde(rename = "Time")]
    time: Fixed,
    #[serde(rename = "Tot.Time")]
    total_time: Fixed,
    #[serde(rename = "H-L")]
    homo_lumo_gap: Fixed,
    #[serde(rename = "VBM")]
    vbm: Fixed,
    #[serde(rename = "VBMOcc")]
    vbm_occupation: Fixed,
    #[serde(rename = "VBMSpinChannel")]
    vbm_spin_channel: Fixed,
    #[serde(rename = "CBM")]
    cbm: Fixed,
    #[serde(rename = "CBMOcc")]
    cbm_occupation: Fixed,
    #[serde(rename = "CBMSpinChannel")]
    cbm_spin_channel: Fixed,
    #[serde(rename = "SpinN")]
    spin_n: Fixed,
    #[serde(rename = "SpinS")]
    spin_s: Fixed,
    #[serde(rename = "SpinJ")]
    spin_j: Fixed,
    #[serde(rename = "Size")]
    size: Fixed,
}

/// A float rendered with six decimals.
#[derive(Debug, Clone, Copy)]
struct Fixed(f64);

impl Serialize for Fixed {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{:.6}", self.0))
    }
}

impl<'a> From<&'a System> for StatisticsRow<'a> {
    fn from(system: &'a System) -> Self {
        let run = &system.run;
        Self {
            system: &system.name,
            energy: Fixed(system.total_energy()),
            hashkey: &system.hashkey,
            cores: run.cores,
            time: Fixed(run.run_time),
            total_time: Fixed(run.total_time()),
            homo_lumo_gap: Fixed(run.homo_lumo_gap),
            vbm: Fixed(run.vbm),
            vbm_occupation: Fixed(run.vbm_occupation),
            vbm_spin_channel: Fixed(run.vbm_spin_channel),
            cbm: Fixed(run.cbm),
            cbm_occupation: Fixed(run.cbm_occupation),
            cbm_spin_channel: Fixed(run.cbm_spin_channel),
            spin_n: Fixed(run.spin_n),
            spin_s: Fixed(run.spin_s),
            spin_j: Fixed(run.spin_j),
            size: Fixed(system.atom_count() as f64),
        }
    }
}

/// Writes the statistics table, header included, to any writer.
pub fn write_statistics_to<W: Write>(systems: &[System], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for system in systems {
        csv_writer.serialize(StatisticsRow::from(system))?;
    }
    if systems.is_empty() {
        csv_writer.write_record(HEADERS)?;
    }
    csv_writer.flush()?;
    Ok(())
}

const HEADERS: [&str; 17] = [
    "System",
    "Energy",
    "Hashkey",
    "Cores",
    "Time",
    "Tot.Time",
    "H-L",
    "VBM",
    "VBMOcc",
    "VBMSpinChannel",
    "CBM",
    "CBMOcc",
    "CBMSpinChannel",
    "SpinN",
    "SpinS",
    "SpinJ",
    "Size",
];

/// Writes the statistics table to `path`, or to `path/Stats.csv` when `path` is an
/// existing directory.
///
/// # Return
///
/// The path of the file written.
pub fn write_statistics(systems: &[System], path: &Path) -> Result<PathBuf, StatisticsError> {
    let target = if path.is_dir() {
        path.join(STATS_FILE_NAME)
    } else {
        path.to_path_buf()
    };

    let file = std::fs::File::create(&target).map_err(|source| StatisticsError::Io {
        path: target.clone(),
        source,
    })?;
    write_statistics_to(systems, std::io::BufWriter::new(file)).map_err(|source| {
        StatisticsError::Csv {
            path: target.clone(),
            source,
        }
    })?;

    info!(
        "Wrote statistics for {} systems to '{}'",
        systems.len(),
        target.display()
    );
    Ok(target)
}
