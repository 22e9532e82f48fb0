//! # Core Module
//!
//! Fundamental building blocks shared by every other layer of the library.
//!
//! - **Structural Representation** ([`models`]) - The `Cluster` entity, its species registry,
//!   and the `System` record used by the collection utilities
//! - **File I/O** ([`io`]) - Readers and writers for the XYZ, CAR, and GIN formats and the
//!   extension-based format dispatch
//! - **Utilities** ([`utils`]) - Element data tables and periodic-boundary geometry

pub mod io;
pub mod models;
pub mod utils;
