use crate::core::models::cluster::Cluster;
use crate::core::utils::elements::{PeriodicTable, RadiusLookup};
use nalgebra::Point3;
use rayon::prelude::*;
use std::f64::consts::PI;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("No van der Waals radius known for element '{0}'")]
    UnknownElement(String),
    #[error("Invalid estimator parameter: {0}")]
    InvalidParameter(String),
}

/// Volume, area and sphere count of a cluster's solvent-accessible envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeometricMeasures {
    /// Enclosed volume in cubic Angstroms.
    pub volume: f64,
    /// Exposed surface area in square Angstroms.
    pub area: f64,
    /// Number of spheres that make up the envelope.
    pub sphere_count: usize,
}

/// Estimates the geometric measures of a cluster for a given probe radius.
pub trait GeometricEstimator {
    fn estimate(&self, cluster: &Cluster, probe_radius: f64)
    -> Result<GeometricMeasures, SurfaceError>;
}

/// Treats each atom as a sphere of radius `vdw + probe` and measures the union.
///
/// The area is obtained by Shrake–Rupley sampling: `samples` points are spread over every
/// sphere and those not buried inside a neighbouring sphere are counted as exposed. The
/// volume is obtained by counting the cubic voxels of edge `grid_spacing` whose centers
/// fall inside at least one sphere. Atoms whose total radius is not positive (dummy
/// sites with a zero probe) contribute no sphere.
#[derive(Debug, Clone)]
pub struct SphereUnionEstimator<R = PeriodicTable> {
    radii: R,
    pub samples: usize,
    pub grid_spacing: f64,
}

impl Default for SphereUnionEstimator<PeriodicTable> {
    fn default() -> Self {
        Self::new(PeriodicTable)
    }
}

impl<R: RadiusLookup> SphereUnionEstimator<R> {
    pub const DEFAULT_SAMPLES: usize = 480;
    pub const DEFAULT_GRID_SPACING: f64 = 0.2;

    pub fn new(radii: R) -> Self {
        Self {
            radii,
            samples: Self::DEFAULT_SAMPLES,
            grid_spacing: Self::DEFAULT_GRID_SPACING,
        }
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_grid_spacing(mut self, grid_spacing: f64) -> Self {
        self.grid_spacing = grid_spacing;
        self
    }

    fn spheres(
        &self,
        cluster: &Cluster,
        probe_radius: f64,
    ) -> Result<Vec<(Point3<f64>, f64)>, SurfaceError> {
        let mut spheres = Vec::with_capacity(cluster.atom_count());
        for atom in cluster.atoms() {
            let vdw = self
                .radii
                .vdw_radius_of(atom.symbol)
                .ok_or_else(|| SurfaceError::UnknownElement(atom.symbol.to_string()))?;
            let radius = vdw + probe_radius;
            if radius > 0.0 {
                spheres.push((*atom.position, radius));
            }
        }
        Ok(spheres)
    }
}

impl<R: RadiusLookup + Sync> GeometricEstimator for SphereUnionEstimator<R> {
    fn estimate(
        &self,
        cluster: &Cluster,
        probe_radius: f64,
    ) -> Result<GeometricMeasures, SurfaceError> {
        if self.samples == 0 {
            return Err(SurfaceError::InvalidParameter(
                "samples must be at least 1".into(),
            ));
        }
        if !(self.grid_spacing.is_finite() && self.grid_spacing > 0.0) {
            return Err(SurfaceError::InvalidParameter(format!(
                "grid spacing must be positive (got {})",
                self.grid_spacing
            )));
        }
        if !probe_radius.is_finite() {
            return Err(SurfaceError::InvalidParameter(format!(
                "probe radius must be finite (got {})",
                probe_radius
            )));
        }

        let spheres = self.spheres(cluster, probe_radius)?;
        let area = exposed_area(&spheres, self.samples);
        let volume = union_volume(&spheres, self.grid_spacing);
        debug!(
            "Estimated {} spheres: area {:.4}, volume {:.4}",
            spheres.len(),
            area,
            volume
        );

        Ok(GeometricMeasures {
            volume,
            area,
            sphere_count: spheres.len(),
        })
    }
}

fn fibonacci_sphere(samples: usize) -> Vec<[f64; 3]> {
    let samples = samples.max(1);
    let golden_angle = PI * (3.0 - 5.0_f64.sqrt());

    (0..samples)
        .map(|i| {
            let y = 1.0 - (2.0 * i as f64) / (samples.saturating_sub(1).max(1)) as f64;
            let radius = (1.0 - y * y).max(0.0).sqrt();
            let theta = golden_angle * i as f64;
            [theta.cos() * radius, y, theta.sin() * radius]
        })
        .collect()
}

fn exposed_area(spheres: &[(Point3<f64>, f64)], samples: usize) -> f64 {
    let points = fibonacci_sphere(samples);

    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); spheres.len()];
    for i in 0..spheres.len() {
        for j in (i + 1)..spheres.len() {
            let cutoff = spheres[i].1 + spheres[j].1;
            if (spheres[i].0 - spheres[j].0).norm_squared() < cutoff * cutoff {
                neighbors[i].push(j);
                neighbors[j].push(i);
            }
        }
    }

    spheres
        .par_iter()
        .enumerate()
        .map(|(i, &(center, radius))| {
            let exposed = points
                .iter()
                .filter(|p| {
                    let sample = Point3::new(
                        center.x + p[0] * radius,
                        center.y + p[1] * radius,
                        center.z + p[2] * radius,
                    );
                    !neighbors[i].iter().any(|&n| {
                        let (other, other_radius) = spheres[n];
                        (sample - other).norm_squared() < other_radius * other_radius
                    })
                })
                .count();
            4.0 * PI * radius * radius * exposed as f64 / points.len() as f64
        })
        .sum()
}

fn union_volume(spheres: &[(Point3<f64>, f64)], spacing: f64) -> f64 {
    if spheres.is_empty() {
        return 0.0;
    }

    let mut lo = [f64::INFINITY; 3];
    let mut hi = [f64::NEG_INFINITY; 3];
    for (center, radius) in spheres {
        for axis in 0..3 {
            lo[axis] = lo[axis].min(center[axis] - radius);
            hi[axis] = hi[axis].max(center[axis] + radius);
        }
    }
    let steps: [usize; 3] =
        std::array::from_fn(|axis| ((hi[axis] - lo[axis]) / spacing).ceil().max(1.0) as usize);
    let coordinate = |axis: usize, i: usize| lo[axis] + (i as f64 + 0.5) * spacing;

    let filled: usize = (0..steps[0])
        .into_par_iter()
        .map(|ix| {
            let x = coordinate(0, ix);
            // Spheres that reach this x slab, with the squared radius left in the yz plane.
            let slab: Vec<(f64, f64, f64)> = spheres
                .iter()
                .filter_map(|(c, r)| {
                    let left = r * r - (x - c.x) * (x - c.x);
                    (left > 0.0).then_some((c.y, c.z, left))
                })
                .collect();
            if slab.is_empty() {
                return 0;
            }

            let mut count = 0;
            for iy in 0..steps[1] {
                let y = coordinate(1, iy);
                for iz in 0..steps[2] {
                    let z = coordinate(2, iz);
                    if slab
                        .iter()
                        .any(|&(cy, cz, left)| (y - cy) * (y - cy) + (z - cz) * (z - cz) < left)
                    {
                        count += 1;
                    }
                }
            }
            count
        })
        .sum();

    filled as f64 * spacing.powi(3)
}

/// Surface energy per unit area, `(E_total - N * e_bulk) / area`.
///
/// A zero, negative or non-finite area has no meaningful surface energy; in that case
/// a warning is logged and `0.0` is returned.
pub fn surface_energy(
    total_energy: f64,
    atom_count: usize,
    bulk_energy_per_atom: f64,
    area: f64,
) -> f64 {
    if !area.is_finite() || area <= 0.0 {
        warn!("Surface area is {}; reporting a surface energy of 0.0", area);
        return 0.0;
    }
    (total_energy - atom_count as f64 * bulk_energy_per_atom) / area
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::utils::elements::{ElementOverride, ElementTable};

    fn single(symbol: &str) -> Cluster {
        let mut cluster = Cluster::new();
        cluster.add_atom(symbol, Point3::new(1.0, -2.0, 3.0), 0.0).unwrap();
        cluster
    }

    fn estimator() -> SphereUnionEstimator {
        SphereUnionEstimator::default()
    }

    fn relative_error(actual: f64, expected: f64) -> f64 {
        ((actual - expected) / expected).abs()
    }

    #[test]
    fn surface_energy_matches_formula() {
        assert_eq!(surface_energy(100.0, 10, 9.0, 2.0), 5.0);
        assert_eq!(surface_energy(-50.0, 4, -10.0, 5.0), -2.0);
    }

    #[test]
    fn surface_energy_is_zero_for_degenerate_area() {
        assert_eq!(surface_energy(100.0, 10, 9.0, 0.0), 0.0);
        assert_eq!(surface_energy(100.0, 10, 9.0, -1.0), 0.0);
        assert_eq!(surface_energy(100.0, 10, 9.0, f64::NAN), 0.0);
        assert_eq!(surface_energy(100.0, 10, 9.0, f64::INFINITY), 0.0);
    }

    #[test]
    fn fibonacci_points_lie_on_unit_sphere() {
        for p in fibonacci_sphere(100) {
            let norm = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
        assert_eq!(fibonacci_sphere(0).len(), 1);
    }

    #[test]
    fn isolated_sphere_has_full_area_and_volume() {
        let measures = estimator().estimate(&single("O"), 1.4).unwrap();

        let r: f64 = 1.52 + 1.4;
        assert_eq!(measures.sphere_count, 1);
        assert!(relative_error(measures.area, 4.0 * PI * r * r) < 1e-12);
        assert!(relative_error(measures.volume, 4.0 / 3.0 * PI * r.powi(3)) < 0.02);
    }

    #[test]
    fn overlapping_spheres_bury_part_of_the_surface() {
        let mut cluster = Cluster::new();
        cluster.add_atom("C", Point3::new(0.0, 0.0, 0.0), 0.0).unwrap();
        cluster.add_atom("C", Point3::new(1.5, 0.0, 0.0), 0.0).unwrap();

        let measures = estimator().estimate(&cluster, 0.0).unwrap();

        let r: f64 = 1.70;
        let isolated_area = 2.0 * 4.0 * PI * r * r;
        let isolated_volume = 2.0 * 4.0 / 3.0 * PI * r.powi(3);
        assert!(measures.area < isolated_area);
        assert!(measures.volume < isolated_volume);
        assert!(measures.volume > isolated_volume / 2.0);
    }

    #[test]
    fn empty_cluster_measures_nothing() {
        let measures = estimator()
            .estimate(&Cluster::new(), 1.4)
            .unwrap();
        assert_eq!(measures, GeometricMeasures::default());
    }

    #[test]
    fn dummy_sites_without_probe_are_skipped() {
        let measures = estimator()
            .estimate(&single("X"), 0.0)
            .unwrap();
        assert_eq!(measures.sphere_count, 0);
        assert_eq!(measures.area, 0.0);
    }

    #[test]
    fn radius_overrides_are_honoured() {
        let mut table = ElementTable::new();
        table.insert("O", ElementOverride { mass: None, vdw_radius: Some(1.0) });

        let measures = SphereUnionEstimator::new(table)
            .with_samples(64)
            .estimate(&single("O"), 0.0)
            .unwrap();
        assert!(relative_error(measures.area, 4.0 * PI) < 1e-12);
    }

    #[test]
    fn unknown_element_is_reported() {
        let result = estimator().estimate(&single("Qq"), 1.0);
        assert_eq!(result, Err(SurfaceError::UnknownElement("Qq".to_string())));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let cluster = single("H");
        assert!(matches!(
            estimator()
                .with_samples(0)
                .estimate(&cluster, 1.0),
            Err(SurfaceError::InvalidParameter(_))
        ));
        assert!(matches!(
            estimator()
                .with_grid_spacing(0.0)
                .estimate(&cluster, 1.0),
            Err(SurfaceError::InvalidParameter(_))
        ));
    }
}
