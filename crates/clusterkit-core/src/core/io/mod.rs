//! Provides input/output functionality for cluster structure files.
//!
//! Each supported format implements the [`traits::ClusterFile`] interface, and
//! [`format::Format`] maps file extensions onto those implementations so that callers
//! can read or write a file without knowing its format up front.

pub mod car;
pub mod format;
pub mod gin;
mod parse;
pub mod traits;
pub mod xyz;

pub use parse::ParseErrorKind;
