use crate::analysis::surface::{GeometricEstimator, GeometricMeasures, SurfaceError, surface_energy};
use crate::core::io::format::{Format, FormatError};
use crate::core::models::system::{Energetic, System, system_name};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum SurfaceEnergyError {
    #[error("Unrecognised input file format: '{path}'", path = path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("Failed to read '{path}': {source}", path = path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
    #[error("Geometric estimation failed: {0}")]
    Estimate(#[from] SurfaceError),
}

/// Outcome of the surface-energy workflow.
#[derive(Debug, Clone)]
pub struct SurfaceEnergyReport {
    pub path: PathBuf,
    /// The structure read from `path`, with its estimated geometry attached.
    pub system: System,
    /// Energy per unit area; `0.0` when the area is degenerate.
    pub surface_energy: f64,
}

impl SurfaceEnergyReport {
    pub fn measures(&self) -> GeometricMeasures {
        self.system.geometry.unwrap_or_default()
    }
}

/// Reads a structure, measures its envelope for `probe_radius` and derives its surface
/// energy relative to `bulk_energy_per_atom`.
#[instrument(skip_all, name = "surface_energy_workflow", fields(path = %path.display()))]
pub fn run<E: GeometricEstimator>(
    path: &Path,
    probe_radius: f64,
    bulk_energy_per_atom: f64,
    estimator: &E,
) -> Result<SurfaceEnergyReport, SurfaceEnergyError> {
    let format = Format::from_path(path).ok_or_else(|| SurfaceEnergyError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    let cluster = format
        .read_path(path)
        .map_err(|source| SurfaceEnergyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    info!(
        "Read {} atoms from '{}' (total energy {:.6})",
        cluster.atom_count(),
        path.display(),
        cluster.total_energy
    );

    let measures = estimator.estimate(&cluster, probe_radius)?;
    info!(
        "Volume {:.6}, area {:.6}, spheres {}",
        measures.volume, measures.area, measures.sphere_count
    );

    let energy = surface_energy(
        cluster.total_energy,
        cluster.atom_count(),
        bulk_energy_per_atom,
        measures.area,
    );
    info!("Surface energy per unit area: {:.6}", energy);

    let mut system = System::new(system_name(path), cluster);
    system.geometry = Some(measures);

    Ok(SurfaceEnergyReport {
        path: path.to_path_buf(),
        system,
        surface_energy: energy,
    })
}
