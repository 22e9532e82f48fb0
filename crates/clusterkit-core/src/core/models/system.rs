use super::cluster::Cluster;
use crate::analysis::surface::GeometricMeasures;
use std::collections::BTreeMap;
use std::path::Path;

/// Anything that carries a total energy and can therefore be ranked.
pub trait Energetic {
    fn total_energy(&self) -> f64;
}

impl Energetic for Cluster {
    fn total_energy(&self) -> f64 {
        self.total_energy
    }
}

/// Descriptors reported by the electronic-structure run that produced a system.
///
/// Every field defaults to zero when the run did not report it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStatistics {
    pub cores: u32,
    /// Wall time per core, in seconds.
    pub run_time: f64,
    pub homo_lumo_gap: f64,
    pub vbm: f64,
    pub vbm_occupation: f64,
    pub vbm_spin_channel: f64,
    pub cbm: f64,
    pub cbm_occupation: f64,
    pub cbm_spin_channel: f64,
    pub spin_n: f64,
    pub spin_s: f64,
    pub spin_j: f64,
}

impl RunStatistics {
    /// Wall time summed over all cores.
    pub fn total_time(&self) -> f64 {
        f64::from(self.cores) * self.run_time
    }
}

/// A named cluster plus the bookkeeping used by the surface-energy and statistics
/// workflows.
#[derive(Debug, Clone)]
pub struct System {
    pub name: String,
    pub hashkey: String,
    pub cluster: Cluster,
    pub geometry: Option<GeometricMeasures>,
    pub run: RunStatistics,
}

impl System {
    /// Wraps `cluster`, deriving the hash key from its composition.
    pub fn new(name: impl Into<String>, cluster: Cluster) -> Self {
        Self {
            name: name.into(),
            hashkey: composition_hash(&cluster),
            cluster,
            geometry: None,
            run: RunStatistics::default(),
        }
    }

    pub fn atom_count(&self) -> usize {
        self.cluster.atom_count()
    }
}

impl Energetic for System {
    fn total_energy(&self) -> f64 {
        self.cluster.total_energy
    }
}

/// The name a system read from `path` is known by: the file stem.
pub fn system_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Chemical formula with symbols in alphabetical order, e.g. `"O2Si1"`.
pub fn formula(cluster: &Cluster) -> String {
    let counts: BTreeMap<&str, usize> = cluster
        .species()
        .iter()
        .filter(|&(_, count)| count > 0)
        .collect();
    counts
        .iter()
        .map(|(symbol, count)| format!("{}{}", symbol, count))
        .collect()
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a of the formula, as 16 hex digits. Stable across platforms and runs.
pub fn composition_hash(cluster: &Cluster) -> String {
    let hash = formula(cluster)
        .bytes()
        .fold(FNV_OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(FNV_PRIME));
    format!("{:016x}", hash)
}
