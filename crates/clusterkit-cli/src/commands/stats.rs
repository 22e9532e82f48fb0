use crate::cli::StatsArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use clusterkit::core::io::format::Format;
use clusterkit::core::models::system::{System, system_name};
use clusterkit::workflows::collection::{sort_by_energy, write_statistics};
use std::path::Path;
use tracing::{debug, info};

pub fn run(args: StatsArgs, config: &PartialConfig) -> Result<()> {
    let output = config.stats_output(args.output.as_deref());

    let mut systems = args
        .files
        .iter()
        .map(|path| load_system(path.as_path()))
        .collect::<Result<Vec<_>>>()?;
    sort_by_energy(&mut systems);

    let written = write_statistics(&systems, &output)?;
    info!(
        "Lowest energy system: {}",
        systems.first().map_or("-", |s| s.name.as_str())
    );
    println!(
        "Wrote statistics for {} system(s) to '{}'",
        systems.len(),
        written.display()
    );
    Ok(())
}

fn load_system(path: &Path) -> Result<System> {
    let format = Format::from_path(path).ok_or_else(|| {
        CliError::Argument(format!(
            "Unrecognised structure file format: '{}'",
            path.display()
        ))
    })?;
    let cluster = format
        .read_path(path)
        .map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;

    let name = system_name(path);
    debug!(
        "Loaded system '{}' ({} atoms, energy {:.6})",
        name,
        cluster.atom_count(),
        cluster.total_energy
    );
    Ok(System::new(name, cluster))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write_xyz(dir: &Path, name: &str, energy: f64) -> PathBuf {
        let path = dir.join(name);
        fs::write(
            &path,
            format!("2\n{}\nZn 0.0 0.0 0.0\nO 1.8 0.0 0.0\n", energy),
        )
        .unwrap();
        path
    }

    #[test]
    fn rows_are_sorted_by_energy() {
        let dir = tempdir().unwrap();
        let files = vec![
            write_xyz(dir.path(), "high.xyz", -1.0),
            write_xyz(dir.path(), "low.xyz", -5.0),
            write_xyz(dir.path(), "mid.xyz", -3.0),
        ];
        let output = dir.path().join("summary.csv");

        run(
            StatsArgs {
                files,
                output: Some(output.clone()),
            },
            &PartialConfig::default(),
        )
        .unwrap();

        let text = fs::read_to_string(&output).unwrap();
        let names: Vec<&str> = text
            .lines()
            .skip(1)
            .map(|line| line.split(',').next().unwrap())
            .collect();
        assert_eq!(names, vec!["low", "mid", "high"]);
    }

    #[test]
    fn directory_output_receives_stats_csv() {
        let dir = tempdir().unwrap();
        let files = vec![write_xyz(dir.path(), "only.xyz", -2.0)];

        run(
            StatsArgs {
                files,
                output: Some(dir.path().to_path_buf()),
            },
            &PartialConfig::default(),
        )
        .unwrap();

        assert!(dir.path().join("Stats.csv").is_file());
    }

    #[test]
    fn unknown_extension_is_an_argument_error() {
        let result = load_system(Path::new("structure.pdb"));
        assert!(matches!(result, Err(CliError::Argument(_))));
    }

    #[test]
    fn unreadable_file_is_a_parsing_error() {
        let dir = tempdir().unwrap();
        let result = load_system(&dir.path().join("missing.car"));
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
