//! # clusterkit Core Library
//!
//! Modelling, analysis, and format conversion for finite atomic clusters.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout so that each concern can be tested in isolation.
//!
//! - **[`core`]: The Foundation.** The `Cluster` data model with its species registry,
//!   the element tables, periodic-boundary helpers, and the per-format readers/writers.
//!
//! - **[`analysis`]: The Numerical Layer.** Center of mass, inertia tensor, principal-axis
//!   alignment, and the union-of-spheres volume/area estimator used for surface energies.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built from the two layers below:
//!   single-file and batch format conversion, surface-energy evaluation, and the
//!   collection utilities that sort systems and export their statistics.

pub mod analysis;
pub mod core;
pub mod workflows;
