//! # Analysis Module
//!
//! Numerical descriptors computed from a [`Cluster`](crate::core::models::cluster::Cluster).
//!
//! - [`inertia`] - Center of mass, inertia tensor, basis rotation and principal-axis alignment,
//!   implemented as methods on `Cluster` that refresh its cached descriptors
//! - [`surface`] - Volume/area estimation over a union of atomic spheres, and the surface
//!   energy derived from it

use thiserror::Error;

pub mod inertia;
pub mod surface;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Total mass is {total}; the center of mass is undefined")]
    DegenerateMass { total: f64 },
    #[error("No atomic mass known for element '{0}'")]
    UnknownElement(String),
}
