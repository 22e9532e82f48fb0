use super::parse::{ParseErrorKind, parse_f64, parse_usize};
use super::traits::{ClusterFile, WriteOptions};
use crate::core::models::cluster::{Cluster, ClusterError};
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
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

/// The plain XYZ format.
///
/// ```text
/// 3
/// -1234.5678 optional comment
/// Si   0.0 0.0 0.0  [charge]
/// O    1.6 0.0 0.0
/// O   -1.6 0.0 0.0
/// ```
///
/// A comment line that starts with a number supplies the total energy. XYZ carries no
/// cell information, so clusters read from it are never periodic.
pub struct XyzFile;

/// Upper bound on the storage reserved from the header before any atom line is read.
const MAX_PREALLOCATED_ATOMS: usize = 4096;

impl ClusterFile for XyzFile {
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<Cluster, Self::Error> {
        let mut lines = reader.lines();

        let count_line = lines
            .next()
            .ok_or_else(|| XyzError::MissingRecord("atom count line".into()))??;
        let atom_count = parse_usize(count_line.split_whitespace().next(), "atom count")
            .map_err(|kind| XyzError::Parse { line: 1, kind })?;

        let comment = lines.next().transpose()?.unwrap_or_default();

        let mut cluster = Cluster::with_capacity(atom_count.min(MAX_PREALLOCATED_ATOMS));
        cluster.total_energy = comment
            .split_whitespace()
            .next()
            .and_then(|t| t.parse::<f64>().ok())
            .unwrap_or(0.0);

        for i in 0..atom_count {
            let line_num = i + 3;
            let line = lines.next().transpose()?.ok_or_else(|| {
                XyzError::MissingRecord(format!(
                    "expected {} atom lines, found {}",
                    atom_count, i
                ))
            })?;

            let mut tokens = line.split_whitespace();
            let symbol = tokens.next().ok_or(XyzError::Parse {
                line: line_num,
                kind: ParseErrorKind::MissingField { field: "symbol" },
            })?;
            let parse = |token: Option<&str>, field| {
                parse_f64(token, field).map_err(|kind| XyzError::Parse {
                    line: line_num,
                    kind,
                })
            };
            let x = parse(tokens.next(), "x")?;
            let y = parse(tokens.next(), "y")?;
            let z = parse(tokens.next(), "z")?;
            let charge = match tokens.next() {
                Some(token) => parse(Some(token), "charge")?,
                None => 0.0,
            };

            cluster
                .add_atom(symbol, Point3::new(x, y, z), charge)
                .map_err(|source| XyzError::Atom {
                    line: line_num,
                    source,
                })?;
        }

        Ok(cluster)
    }

    fn write_to(
        cluster: &Cluster,
        _options: &WriteOptions,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        writeln!(writer, "{}", cluster.atom_count())?;
        writeln!(writer, "{:.10}", cluster.total_energy)?;

        for atom in cluster.atoms() {
            let p = atom.position;
            writeln!(
                writer,
                "{:<2} {:>16.10} {:>16.10} {:>16.10} {:>12.6}",
                atom.symbol, p.x, p.y, p.z, atom.charge
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(text: &str) -> Result<Cluster, XyzError> {
        XyzFile::read_from(&mut Cursor::new(text))
    }

    #[test]
    fn reads_atoms_energy_and_optional_charges() {
        let cluster = read("3\n-42.5 relaxed\nSi 0 0 0 2.4\nO 1.6 0 0\nO -1.6 0 0 -1.2\n").unwrap();

        assert_eq!(cluster.atom_count(), 3);
        assert_eq!(cluster.total_energy, -42.5);
        assert_eq!(cluster.species().counts(), &[1, 2]);
        assert_eq!(cluster.charges(), &[2.4, 0.0, -1.2]);
        assert_eq!(cluster.positions()[1], Point3::new(1.6, 0.0, 0.0));
        assert!(!cluster.cell.is_periodic());
    }

    #[test]
    fn non_numeric_comment_leaves_energy_at_zero() {
        let cluster = read("1\ngenerated by hand\nH 0 0 0\n").unwrap();
        assert_eq!(cluster.total_energy, 0.0);
    }

    #[test]
    fn truncated_file_is_missing_record() {
        let result = read("2\n\nH 0 0 0\n");
        assert!(matches!(result, Err(XyzError::MissingRecord(_))));
    }

    #[test]
    fn oversized_count_is_missing_record_not_allocation() {
        let result = read("10000000000000000000\n\nH 0 0 0\n");
        assert!(matches!(result, Err(XyzError::MissingRecord(_))));
    }

    #[test]
    fn bad_coordinate_reports_line() {
        let result = read("1\n\nH 0 zero 0\n");
        match result {
            Err(XyzError::Parse { line, kind }) => {
                assert_eq!(line, 3);
                assert!(matches!(kind, ParseErrorKind::InvalidFloat { field: "y", .. }));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn bad_count_line_is_parse_error() {
        assert!(matches!(
            read("three\n\n"),
            Err(XyzError::Parse { line: 1, .. })
        ));
        assert!(matches!(read(""), Err(XyzError::MissingRecord(_))));
    }

    #[test]
    fn overlong_symbol_is_rejected() {
        assert!(matches!(
            read("1\n\nAbc 0 0 0\n"),
            Err(XyzError::Atom { line: 3, .. })
        ));
    }

    #[test]
    fn written_file_reads_back() {
        let original = read("2\n-7.25\nNa 0.5 0 0 1.0\nCl -0.5 0 0 -1.0\n").unwrap();
        let mut buffer = Vec::new();
        XyzFile::write_to(&original, &WriteOptions::default(), &mut buffer).unwrap();

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("2\n-7.2500000000\n"));

        let restored = XyzFile::read_from(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(restored.total_energy, -7.25);
        assert_eq!(restored.positions(), original.positions());
        assert_eq!(restored.charges(), original.charges());
    }

    #[test]
    fn charge_column_is_written_even_when_zero() {
        let cluster = read("1\n\nH 1 2 3\n").unwrap();
        let mut buffer = Vec::new();
        XyzFile::write_to(&cluster, &WriteOptions::default(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let fields: Vec<&str> = text.lines().nth(2).unwrap().split_whitespace().collect();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[4], "0.000000");
    }
}
