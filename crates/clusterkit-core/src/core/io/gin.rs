use super::parse::{ParseErrorKind, element_prefix, parse_f64};
use super::traits::{ClusterFile, WriteOptions};
use crate::core::models::cluster::{Cell, Cluster, ClusterError};
use crate::core::utils::geometry;
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum GinError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: ParseErrorKind },
    #[error("Invalid atom on line {line}: {source}")]
    Atom {
        line: usize,
        #[source]
        source: ClusterError,
    },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Failed to read control file '{path}': {source}", path = path.display())]
    ControlFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The GULP input (`.gin`) format.
///
/// Only the structural part of a GULP input is interpreted:
///
/// - `cell` followed by `a b c alpha beta gamma` (makes every axis periodic),
/// - `cartesian`/`cart` or `fractional`/`frac` coordinate blocks of
///   `Sym [core|shel] x y z [charge]` lines, where shell sites are skipped,
/// - a `species` block of `Sym core charge` lines providing charges for atoms that
///   omit them.
///
/// Keyword and option lines are passed over. When writing, the contents of the control
/// file from [`WriteOptions`] (if any) lead the output in place of the default `single`
/// keyword line.
pub struct GinFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    None,
    Title,
    Cell,
    Coordinates { fractional: bool },
    Species,
}

#[derive(Debug)]
struct PendingAtom {
    line: usize,
    symbol: String,
    coords: Vector3<f64>,
    fractional: bool,
    charge: Option<f64>,
}

/// A `Sym [type] x y z [charge]` site line.
struct SiteLine<'a> {
    label: &'a str,
    is_shell: bool,
    coords: Vector3<f64>,
    charge: Option<f64>,
}

fn site_type(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "core" | "c" | "cor" | "bcor" => Some(false),
        "shel" | "s" | "she" | "bshe" => Some(true),
        _ => None,
    }
}

fn parse_site(line: &str) -> Option<SiteLine<'_>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let label = *tokens.first()?;
    if !label.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let (is_shell, start) = match tokens.get(1).and_then(|t| site_type(t)) {
        Some(shell) => (shell, 2),
        None => (false, 1),
    };
    let coord = |i: usize| tokens.get(start + i)?.parse::<f64>().ok();
    let coords = Vector3::new(coord(0)?, coord(1)?, coord(2)?);
    Some(SiteLine {
        label,
        is_shell,
        coords,
        charge: coord(3),
    })
}

fn block_keyword(line: &str) -> Option<Block> {
    let keyword = line.split_whitespace().next()?.to_ascii_lowercase();
    match keyword.as_str() {
        "title" => Some(Block::Title),
        "cell" => Some(Block::Cell),
        "cart" | "cartesian" => Some(Block::Coordinates { fractional: false }),
        "frac" | "fractional" => Some(Block::Coordinates { fractional: true }),
        "species" | "spec" => Some(Block::Species),
        _ => None,
    }
}

impl ClusterFile for GinFile {
    type Error = GinError;

    fn read_from(reader: &mut impl BufRead) -> Result<Cluster, Self::Error> {
        let mut block = Block::None;
        let mut cell: Option<Cell> = None;
        let mut pending: Vec<PendingAtom> = Vec::new();
        let mut species_charges: HashMap<String, f64> = HashMap::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            match block {
                Block::Title => {
                    if trimmed.eq_ignore_ascii_case("end") {
                        block = Block::None;
                    }
                    continue;
                }
                Block::Cell => {
                    let mut tokens = trimmed.split_whitespace();
                    let mut next = |field| {
                        parse_f64(tokens.next(), field).map_err(|kind| GinError::Parse {
                            line: line_num,
                            kind,
                        })
                    };
                    let dimensions = [next("a")?, next("b")?, next("c")?];
                    let angles = [next("alpha")?, next("beta")?, next("gamma")?];
                    cell = Some(Cell::periodic(dimensions, angles));
                    block = Block::None;
                    continue;
                }
                Block::Coordinates { fractional } => {
                    if let Some(site) = parse_site(trimmed) {
                        if site.is_shell {
                            trace!("Skipping shell site on line {}", line_num);
                        } else {
                            pending.push(PendingAtom {
                                line: line_num,
                                symbol: element_prefix(site.label).to_string(),
                                coords: site.coords,
                                fractional,
                                charge: site.charge,
                            });
                        }
                        continue;
                    }
                    block = Block::None;
                }
                Block::Species => {
                    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
                    let charge = match tokens.as_slice() {
                        [label, kind, charge, ..] if site_type(kind).is_some() => {
                            charge.parse::<f64>().ok().map(|q| (label, site_type(kind), q))
                        }
                        [label, charge] => charge.parse::<f64>().ok().map(|q| (label, Some(false), q)),
                        _ => None,
                    };
                    if let Some((label, shell, q)) = charge {
                        if shell == Some(false) {
                            species_charges.insert(element_prefix(label).to_string(), q);
                        }
                        continue;
                    }
                    block = Block::None;
                }
                Block::None => {}
            }

            match block_keyword(trimmed) {
                Some(next) => block = next,
                None => trace!("Ignoring GULP option line {}: {}", line_num, trimmed),
            }
        }

        let lattice = cell.map(|c| c.lattice());
        let mut cluster = Cluster::with_capacity(pending.len());
        if let Some(cell) = cell {
            cluster.cell = cell;
        }

        for atom in pending {
            let position = if atom.fractional {
                let lattice = lattice.as_ref().ok_or_else(|| {
                    GinError::Inconsistency(format!(
                        "fractional coordinates on line {} without a cell",
                        atom.line
                    ))
                })?;
                geometry::fractional_to_cartesian(&atom.coords, lattice)
            } else {
                Point3::from(atom.coords)
            };
            let charge = atom
                .charge
                .or_else(|| species_charges.get(&atom.symbol).copied())
                .unwrap_or(0.0);

            cluster
                .add_atom(&atom.symbol, position, charge)
                .map_err(|source| GinError::Atom {
                    line: atom.line,
                    source,
                })?;
        }

        Ok(cluster)
    }

    fn write_to(
        cluster: &Cluster,
        options: &WriteOptions,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        match &options.control_file {
            Some(path) => {
                let control =
                    std::fs::read_to_string(path).map_err(|source| GinError::ControlFile {
                        path: path.clone(),
                        source,
                    })?;
                write!(writer, "{}", control)?;
                if !control.ends_with('\n') {
                    writeln!(writer)?;
                }
            }
            None => writeln!(writer, "single")?,
        }
        writeln!(writer)?;

        if cluster.cell.is_periodic() {
            let [a, b, c] = cluster.cell.dimensions;
            let [alpha, beta, gamma] = cluster.cell.angles;
            writeln!(writer, "cell")?;
            writeln!(
                writer,
                "{:.6} {:.6} {:.6} {:.6} {:.6} {:.6}",
                a, b, c, alpha, beta, gamma
            )?;
        }

        writeln!(writer, "cartesian")?;
        for atom in cluster.atoms() {
            let p = atom.position;
            writeln!(
                writer,
                "{:<3} core {:>16.8} {:>16.8} {:>16.8} {:>12.6}",
                atom.symbol, p.x, p.y, p.z, atom.charge
            )?;
        }

        if !cluster.species().is_empty() {
            writeln!(writer, "species")?;
            for (index, symbol) in cluster.species().symbols().iter().enumerate() {
                let charge = cluster
                    .species_indices()
                    .iter()
                    .position(|&s| s == index)
                    .map_or(0.0, |atom| cluster.charges()[atom]);
                writeln!(writer, "{:<3} core {:>12.6}", symbol, charge)?;
            }
        }
        Ok(())
    }
}
