//! # Workflows Module
//!
//! High-level procedures that combine the I/O layer and the analysis layer into complete
//! tasks. These are the entry points the command-line tool calls.
//!
//! - **Format conversion** ([`convert`]) - Single-file and batch conversion between XYZ,
//!   CAR and GIN, with up-front validation and per-file outcomes
//! - **Surface energy** ([`surface`]) - Reads a structure, estimates its envelope and
//!   derives the surface energy per unit area
//! - **Collections** ([`collection`]) - Energy ordering of systems and the statistics table
//! - **Progress** ([`progress`]) - Callback-based progress events for long-running workflows

pub mod collection;
pub mod convert;
pub mod progress;
pub mod surface;
