//! # Core Models Module
//!
//! Data structures describing an atomic cluster.
//!
//! - [`species`] - The ordered species registry with live per-species atom counts
//! - [`cluster`] - The cluster entity: per-atom arrays, cell geometry, cached descriptors
//! - [`system`] - A cluster enriched with identity, run descriptors, and geometric measures
//!
//! ## Usage
//!
//! ```ignore
//! use clusterkit::core::models::cluster::Cluster;
//! use nalgebra::Point3;
//!
//! let mut cluster = Cluster::new();
//! cluster.add_atom("Si", Point3::new(0.0, 0.0, 0.0), 0.0)?;
//! cluster.add_atom("O", Point3::new(1.6, 0.0, 0.0), 0.0)?;
//! cluster.remove_atom(1)?;
//! ```

pub mod cluster;
pub mod species;
pub mod system;
