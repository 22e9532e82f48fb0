use super::parse::{ParseErrorKind, element_prefix, parse_f64};
use super::traits::{ClusterFile, WriteOptions};
use crate::core::models::cluster::{Cell, Cluster, ClusterError};
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CarError {
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
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

const ARCHIVE_HEADER: &str = "!BIOSYM archive 3";

/// The Materials Studio / Insight II `.car` archive (version 3).
///
/// ```text
/// !BIOSYM archive 3
/// PBC=ON
/// Materials Studio Generated CAR File
/// !DATE
/// PBC   10.0000   10.0000   10.0000   90.0000   90.0000   90.0000 (P1)
/// Si1       0.000000000    0.000000000    0.000000000 XXXX 1      xx      Si  0.000
/// end
/// end
/// ```
///
/// `PBC=ON` makes all three axes periodic and requires the `PBC` cell line.
pub struct CarFile;

fn atom_name(symbol: &str, serial: usize) -> String {
    let mut name = format!("{}{}", symbol, serial);
    name.truncate(5);
    name
}

impl ClusterFile for CarFile {
    type Error = CarError;

    fn read_from(reader: &mut impl BufRead) -> Result<Cluster, Self::Error> {
        let mut cluster = Cluster::new();
        let mut pbc_on = false;
        let mut date_seen = false;
        let mut cell_seen = false;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with("!BIOSYM") {
                continue;
            }
            if let Some(flag) = trimmed.strip_prefix("PBC=") {
                pbc_on = flag.trim().eq_ignore_ascii_case("ON");
                continue;
            }
            if trimmed.starts_with("!DATE") {
                date_seen = true;
                continue;
            }
            if !date_seen {
                // Title line.
                continue;
            }
            if trimmed == "end" {
                break;
            }

            let mut tokens = trimmed.split_whitespace();
            let parse = |token: Option<&str>, field| {
                parse_f64(token, field).map_err(|kind| CarError::Parse {
                    line: line_num,
                    kind,
                })
            };

            if pbc_on && !cell_seen && trimmed.starts_with("PBC") {
                tokens.next();
                let dimensions = [
                    parse(tokens.next(), "a")?,
                    parse(tokens.next(), "b")?,
                    parse(tokens.next(), "c")?,
                ];
                let angles = [
                    parse(tokens.next(), "alpha")?,
                    parse(tokens.next(), "beta")?,
                    parse(tokens.next(), "gamma")?,
                ];
                cluster.cell = Cell::periodic(dimensions, angles);
                cell_seen = true;
                continue;
            }

            let name = tokens.next().unwrap_or_default();
            let x = parse(tokens.next(), "x")?;
            let y = parse(tokens.next(), "y")?;
            let z = parse(tokens.next(), "z")?;
            let rest: Vec<&str> = tokens.collect();

            let symbol = match rest.get(3) {
                Some(element) if element.chars().all(|c| c.is_ascii_alphabetic()) => *element,
                _ => element_prefix(name),
            };
            let charge = match rest.get(4).copied() {
                Some(token) => parse(Some(token), "charge")?,
                None => 0.0,
            };

            cluster
                .add_atom(symbol, Point3::new(x, y, z), charge)
                .map_err(|source| CarError::Atom {
                    line: line_num,
                    source,
                })?;
        }

        if !date_seen {
            return Err(CarError::MissingRecord("!DATE header".into()));
        }
        if pbc_on && !cell_seen {
            return Err(CarError::MissingRecord("PBC cell line".into()));
        }
        Ok(cluster)
    }

    fn write_to(
        cluster: &Cluster,
        _options: &WriteOptions,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let periodic = cluster.cell.is_periodic();

        writeln!(writer, "{}", ARCHIVE_HEADER)?;
        writeln!(writer, "PBC={}", if periodic { "ON" } else { "OFF" })?;
        writeln!(writer, "Materials Studio Generated CAR File")?;
        writeln!(writer, "!DATE")?;

        if periodic {
            let [a, b, c] = cluster.cell.dimensions;
            let [alpha, beta, gamma] = cluster.cell.angles;
            writeln!(
                writer,
                "PBC {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>9.4} (P1)",
                a, b, c, alpha, beta, gamma
            )?;
        }

        let mut serials: HashMap<&str, usize> = HashMap::new();
        for atom in cluster.atoms() {
            let serial = serials.entry(atom.symbol).or_insert(0);
            *serial += 1;
            let p = atom.position;
            writeln!(
                writer,
                "{:<5} {:>14.9} {:>14.9} {:>14.9} XXXX 1      xx      {:<2} {:>6.3}",
                atom_name(atom.symbol, *serial),
                p.x,
                p.y,
                p.z,
                atom.symbol,
                atom.charge
            )?;
        }

        writeln!(writer, "end")?;
        writeln!(writer, "end")?;
        Ok(())
    }
}
