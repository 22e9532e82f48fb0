use super::progress::{Progress, ProgressReporter};
use crate::core::io::format::{Format, FormatError};
use crate::core::io::traits::WriteOptions;
use crate::core::models::cluster::Cluster;
use rayon::prelude::*;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Input,
    Output,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Input => write!(f, "input"),
            Role::Output => write!(f, "output"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Formats must differ: input and output are both '.{extension}'")]
    FormatMismatch { extension: String },
    #[error("Unrecognised {role} file format: '{path}'", path = path.display())]
    UnsupportedFormat { role: Role, path: PathBuf },
    #[error("Failed to read '{path}': {source}", path = path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
    #[error("Failed to write '{path}': {source}", path = path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
    #[error("Failed to list directory '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What a pair of command-line arguments asks for, validated before any file is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionPlan {
    Single {
        input: PathBuf,
        output: PathBuf,
        from: Format,
        to: Format,
    },
    /// Convert every `*.from` file of the working directory.
    Batch { from: Format, to: Format },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    pub write: WriteOptions,
    /// Directory scanned in batch mode.
    pub directory: PathBuf,
    /// Convert batch files on the rayon pool.
    pub parallel: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            write: WriteOptions::default(),
            directory: PathBuf::from("."),
            parallel: false,
        }
    }
}

#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub result: Result<(), ConversionError>,
}

/// Per-file results of a conversion run, in lexicographic input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn succeeded(&self) -> usize {
        self.total() - self.failed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Recognises the batch token `.ext` or `*.ext` and returns `ext`.
pub fn batch_extension(argument: &Path) -> Option<&str> {
    let text = argument.to_str()?;
    let extension = text.strip_prefix('*').unwrap_or(text).strip_prefix('.')?;
    let plain = !extension.is_empty()
        && !extension.contains(['.', '/', '\\', '*'])
        && !extension.chars().any(char::is_whitespace);
    plain.then_some(extension)
}

/// The extension an argument designates, whether it is a file name or a batch token.
fn argument_extension(argument: &Path) -> Option<&str> {
    batch_extension(argument).or_else(|| argument.extension()?.to_str())
}

fn resolve(argument: &Path, role: Role) -> Result<Format, ConversionError> {
    argument_extension(argument)
        .and_then(Format::from_extension)
        .ok_or_else(|| ConversionError::UnsupportedFormat {
            role,
            path: argument.to_path_buf(),
        })
}

/// Validates a conversion request.
///
/// Checks run in a fixed order: identical extensions are rejected first
/// ([`ConversionError::FormatMismatch`]), then an unknown input format, then an unknown
/// output format ([`ConversionError::UnsupportedFormat`]).
pub fn plan(input: &Path, output: &Path) -> Result<ConversionPlan, ConversionError> {
    if let (Some(a), Some(b)) = (argument_extension(input), argument_extension(output)) {
        if a.eq_ignore_ascii_case(b) {
            return Err(ConversionError::FormatMismatch {
                extension: a.to_ascii_lowercase(),
            });
        }
    }

    let from = resolve(input, Role::Input)?;
    let to = resolve(output, Role::Output)?;

    Ok(if batch_extension(input).is_some() {
        ConversionPlan::Batch { from, to }
    } else {
        ConversionPlan::Single {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            from,
            to,
        }
    })
}

/// Writes `cluster` in the format selected by the extension of `output`.
pub fn convert_cluster(
    cluster: &Cluster,
    output: &Path,
    options: &WriteOptions,
) -> Result<(), ConversionError> {
    let to = resolve(output, Role::Output)?;
    to.write_path(cluster, options, output)
        .map_err(|source| ConversionError::Write {
            path: output.to_path_buf(),
            source,
        })
}

fn convert_with(
    input: &Path,
    from: Format,
    output: &Path,
    options: &WriteOptions,
) -> Result<(), ConversionError> {
    let cluster = from
        .read_path(input)
        .map_err(|source| ConversionError::Read {
            path: input.to_path_buf(),
            source,
        })?;
    debug!(
        "Read {} atoms ({} species) from '{}'",
        cluster.atom_count(),
        cluster.species().len(),
        input.display()
    );
    convert_cluster(&cluster, output, options)
}

/// Converts one file, choosing reader and writer from the two extensions.
pub fn convert_file(
    input: &Path,
    output: &Path,
    options: &WriteOptions,
) -> Result<(), ConversionError> {
    match plan(input, output)? {
        ConversionPlan::Single {
            input,
            output,
            from,
            ..
        } => convert_with(&input, from, &output, options),
        ConversionPlan::Batch { .. } => Err(ConversionError::UnsupportedFormat {
            role: Role::Input,
            path: input.to_path_buf(),
        }),
    }
}

/// Regular files of `directory` with extension `format`, sorted by path.
pub fn list_inputs(directory: &Path, format: Format) -> Result<Vec<PathBuf>, ConversionError> {
    let io_error = |source| ConversionError::Io {
        path: directory.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(format.extension()));
        if matches && entry.file_type().map_err(io_error)?.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Converts every `from` file in `options.directory` to a sibling `to` file with the
/// same stem.
///
/// A failure on one file is recorded in its [`FileOutcome`] and does not stop the others.
/// Only an unreadable directory aborts the batch.
#[instrument(skip_all, name = "batch_conversion", fields(from = %from, to = %to))]
pub fn convert_batch(
    from: Format,
    to: Format,
    options: &ConvertOptions,
    reporter: &ProgressReporter,
) -> Result<BatchReport, ConversionError> {
    reporter.report(Progress::PhaseStart { name: "Scanning" });
    let inputs = list_inputs(&options.directory, from);
    reporter.report(Progress::PhaseFinish);
    let inputs = inputs?;
    info!(
        "Converting {} {} file(s) in '{}' to {}",
        inputs.len(),
        from,
        options.directory.display(),
        to
    );

    reporter.report(Progress::TaskStart {
        total_steps: inputs.len() as u64,
    });
    let convert_one = |input: &PathBuf| {
        let output = input.with_extension(to.extension());
        let result = convert_with(input, from, &output, &options.write);
        match &result {
            Ok(()) => debug!("Wrote '{}'", output.display()),
            Err(e) => {
                warn!("{}", e);
                reporter.report(Progress::Message(format!(
                    "Skipped '{}'",
                    input.display()
                )));
            }
        }
        reporter.report(Progress::TaskIncrement);
        FileOutcome {
            input: input.clone(),
            output,
            result,
        }
    };
    let outcomes: Vec<FileOutcome> = if options.parallel {
        inputs.par_iter().map(convert_one).collect()
    } else {
        inputs.iter().map(convert_one).collect()
    };
    reporter.report(Progress::TaskFinish);

    let report = BatchReport { outcomes };
    info!(
        "Batch finished: {} converted, {} failed",
        report.succeeded(),
        report.failed()
    );
    Ok(report)
}

/// Runs a conversion request end to end.
///
/// In single-file mode a conversion failure is returned as the error; in batch mode
/// per-file failures are collected in the returned report.
pub fn run(
    input: &Path,
    output: &Path,
    options: &ConvertOptions,
    reporter: &ProgressReporter,
) -> Result<BatchReport, ConversionError> {
    match plan(input, output)? {
        ConversionPlan::Batch { from, to } => convert_batch(from, to, options, reporter),
        ConversionPlan::Single {
            input,
            output,
            from,
            to,
        } => {
            info!(
                "Converting '{}' ({}) to '{}' ({})",
                input.display(),
                from,
                output.display(),
                to
            );
            convert_with(&input, from, &output, &options.write)?;
            Ok(BatchReport {
                outcomes: vec![FileOutcome {
                    input,
                    output,
                    result: Ok(()),
                }],
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    const WATER_XYZ: &str = "3\n-76.4\nO 0 0 0.1173\nH 0 0.7572 -0.4692\nH 0 -0.7572 -0.4692\n";

    fn batch_options(directory: &Path, parallel: bool) -> ConvertOptions {
        ConvertOptions {
            directory: directory.to_path_buf(),
            parallel,
            ..ConvertOptions::default()
        }
    }

    #[test]
    fn batch_token_is_recognised() {
        assert_eq!(batch_extension(Path::new(".xyz")), Some("xyz"));
        assert_eq!(batch_extension(Path::new("*.car")), Some("car"));
        assert_eq!(batch_extension(Path::new("a.xyz")), None);
        assert_eq!(batch_extension(Path::new(".")), None);
        assert_eq!(batch_extension(Path::new("./a.xyz")), None);
    }

    #[test]
    fn identical_extensions_fail_before_any_read() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("a.xyz");
        let result = plan(&input, &dir.path().join("b.XYZ"));
        assert!(matches!(
            result,
            Err(ConversionError::FormatMismatch { ref extension }) if extension == "xyz"
        ));

        let result = convert_file(&input, &dir.path().join("a.xyz"), &WriteOptions::default());
        assert!(matches!(result, Err(ConversionError::FormatMismatch { .. })));
    }

    #[test]
    fn mismatch_is_checked_before_format_support() {
        assert!(matches!(
            plan(Path::new("a.pdb"), Path::new("b.pdb")),
            Err(ConversionError::FormatMismatch { .. })
        ));
    }

    #[test]
    fn unknown_input_is_reported_before_unknown_output() {
        assert!(matches!(
            plan(Path::new("a.pdb"), Path::new("b.mol2")),
            Err(ConversionError::UnsupportedFormat {
                role: Role::Input,
                ..
            })
        ));
        assert!(matches!(
            plan(Path::new("a.xyz"), Path::new("b.mol2")),
            Err(ConversionError::UnsupportedFormat {
                role: Role::Output,
                ..
            })
        ));
        assert!(matches!(
            plan(Path::new("noext"), Path::new("b.car")),
            Err(ConversionError::UnsupportedFormat {
                role: Role::Input,
                ..
            })
        ));
    }

    #[test]
    fn plan_distinguishes_single_and_batch() {
        assert_eq!(
            plan(Path::new("*.xyz"), Path::new(".gin")).unwrap(),
            ConversionPlan::Batch {
                from: Format::Xyz,
                to: Format::Gin
            }
        );
        assert!(matches!(
            plan(Path::new("in.car"), Path::new("out.xyz")).unwrap(),
            ConversionPlan::Single {
                from: Format::Car,
                to: Format::Xyz,
                ..
            }
        ));
    }

    #[test]
    fn single_file_conversion_writes_target() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("water.xyz");
        let output = dir.path().join("water.car");
        fs::write(&input, WATER_XYZ).unwrap();

        convert_file(&input, &output, &WriteOptions::default()).unwrap();

        let text = fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("!BIOSYM archive 3"));
        assert_eq!(Format::Car.read_path(&output).unwrap().atom_count(), 3);
    }

    #[test]
    fn missing_input_is_a_read_error() {
        let dir = tempdir().unwrap();
        let result = convert_file(
            &dir.path().join("absent.xyz"),
            &dir.path().join("absent.gin"),
            &WriteOptions::default(),
        );
        assert!(matches!(result, Err(ConversionError::Read { .. })));
    }

    #[test]
    fn control_file_reaches_gin_writer() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("water.xyz");
        let control = dir.path().join("header.txt");
        let output = dir.path().join("water.gin");
        fs::write(&input, WATER_XYZ).unwrap();
        fs::write(&control, "opti conp\n").unwrap();

        convert_file(&input, &output, &WriteOptions::with_control_file(&control)).unwrap();
        assert!(fs::read_to_string(&output).unwrap().starts_with("opti conp\n"));
    }

    #[test]
    fn batch_continues_after_a_failed_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.xyz"), "not a count\n").unwrap();
        fs::write(dir.path().join("b.xyz"), WATER_XYZ).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("sub.xyz")).unwrap();

        let report = convert_batch(
            Format::Xyz,
            Format::Car,
            &batch_options(dir.path(), false),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(report.total(), 2);
        assert_eq!(report.outcomes[0].input, dir.path().join("a.xyz"));
        assert!(matches!(
            report.outcomes[0].result,
            Err(ConversionError::Read { .. })
        ));
        assert!(report.outcomes[1].result.is_ok());
        assert_eq!(report.outcomes[1].output, dir.path().join("b.car"));
        assert!(dir.path().join("b.car").is_file());
        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 1);
    }

    #[test]
    fn batch_survives_an_absurd_atom_count() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.xyz"), "10000000000000000000\n\nH 0 0 0\n").unwrap();
        fs::write(dir.path().join("b.xyz"), WATER_XYZ).unwrap();

        for parallel in [false, true] {
            let report = convert_batch(
                Format::Xyz,
                Format::Car,
                &batch_options(dir.path(), parallel),
                &ProgressReporter::new(),
            )
            .unwrap();

            assert_eq!(report.total(), 2);
            assert!(matches!(
                report.outcomes[0].result,
                Err(ConversionError::Read { .. })
            ));
            assert!(report.outcomes[1].result.is_ok());
        }
    }

    #[test]
    fn batch_reports_scanning_phase_and_skipped_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bad.xyz"), "not a count\n").unwrap();
        fs::write(dir.path().join("good.xyz"), WATER_XYZ).unwrap();

        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            events.lock().unwrap().push(event);
        }));
        convert_batch(
            Format::Xyz,
            Format::Gin,
            &batch_options(dir.path(), false),
            &reporter,
        )
        .unwrap();
        drop(reporter);

        let events = events.into_inner().unwrap();
        assert!(matches!(
            events[0],
            Progress::PhaseStart { name: "Scanning" }
        ));
        assert!(matches!(events[1], Progress::PhaseFinish));
        assert!(matches!(events[2], Progress::TaskStart { total_steps: 2 }));
        let messages: Vec<&String> = events
            .iter()
            .filter_map(|e| match e {
                Progress::Message(text) => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("bad.xyz"));
        assert!(matches!(events.last(), Some(Progress::TaskFinish)));
    }

    #[test]
    fn convert_cluster_picks_writer_from_extension() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("water.xyz");
        fs::write(&input, WATER_XYZ).unwrap();
        let cluster = Format::Xyz.read_path(&input).unwrap();

        for (name, format) in [
            ("copy.xyz", Format::Xyz),
            ("copy.car", Format::Car),
            ("copy.GIN", Format::Gin),
        ] {
            let output = dir.path().join(name);
            convert_cluster(&cluster, &output, &WriteOptions::default()).unwrap();
            let restored = format.read_path(&output).unwrap();
            assert_eq!(restored.atom_count(), 3, "{}", name);
        }
        assert!(
            fs::read_to_string(dir.path().join("copy.car"))
                .unwrap()
                .starts_with("!BIOSYM archive 3")
        );
    }

    #[test]
    fn convert_cluster_rejects_unknown_output_extension() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("water.pdb");
        let result = convert_cluster(&Cluster::new(), &output, &WriteOptions::default());

        assert!(matches!(
            result,
            Err(ConversionError::UnsupportedFormat {
                role: Role::Output,
                ..
            })
        ));
        assert!(!output.exists());
    }

    #[test]
    fn parallel_batch_keeps_lexicographic_order_and_reports_progress() {
        let dir = tempdir().unwrap();
        let names = ["d", "a", "c", "b", "e"];
        for name in names {
            fs::write(dir.path().join(format!("{}.xyz", name)), WATER_XYZ).unwrap();
        }

        let increments = AtomicUsize::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::TaskIncrement = event {
                increments.fetch_add(1, Ordering::SeqCst);
            }
        }));
        let report = convert_batch(
            Format::Xyz,
            Format::Gin,
            &batch_options(dir.path(), true),
            &reporter,
        )
        .unwrap();
        drop(reporter);

        let stems: Vec<_> = report
            .outcomes
            .iter()
            .map(|o| o.input.file_stem().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(stems, vec!["a", "b", "c", "d", "e"]);
        assert!(report.is_success());
        assert_eq!(increments.load(Ordering::SeqCst), names.len());
    }

    #[test]
    fn run_dispatches_batch_tokens_to_the_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("one.xyz"), WATER_XYZ).unwrap();

        let report = run(
            Path::new(".xyz"),
            Path::new(".car"),
            &batch_options(dir.path(), false),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(report.total(), 1);
        assert!(dir.path().join("one.car").is_file());
    }

    #[test]
    fn run_propagates_single_file_errors() {
        let dir = tempdir().unwrap();
        let result = run(
            &dir.path().join("missing.car"),
            &dir.path().join("missing.xyz"),
            &ConvertOptions::default(),
            &ProgressReporter::new(),
        );
        assert!(matches!(result, Err(ConversionError::Read { .. })));
    }

    #[test]
    fn unreadable_directory_aborts_batch() {
        let dir = tempdir().unwrap();
        let result = convert_batch(
            Format::Xyz,
            Format::Car,
            &batch_options(&dir.path().join("missing"), false),
            &ProgressReporter::new(),
        );
        assert!(matches!(result, Err(ConversionError::Io { .. })));
    }
}
