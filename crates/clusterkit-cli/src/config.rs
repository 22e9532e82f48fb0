use crate::cli::{ConvertArgs, SurfaceEnergyArgs};
use crate::error::{CliError, Result};
use clusterkit::analysis::surface::SphereUnionEstimator;
use clusterkit::core::io::traits::WriteOptions;
use clusterkit::core::utils::elements::PeriodicTable;
use clusterkit::workflows::collection::STATS_FILE_NAME;
use clusterkit::workflows::convert::ConvertOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Values used when neither the command line nor the configuration file sets them.
pub struct DefaultsConfig {
    pub color: bool,
    pub parallel: bool,
    pub samples: usize,
    pub grid_spacing: f64,
    pub stats_output: PathBuf,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            color: true,
            parallel: false,
            samples: SphereUnionEstimator::<PeriodicTable>::DEFAULT_SAMPLES,
            grid_spacing: SphereUnionEstimator::<PeriodicTable>::DEFAULT_GRID_SPACING,
            stats_output: PathBuf::from(STATS_FILE_NAME),
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PartialLoggingConfig {
    pub color: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PartialConvertConfig {
    #[serde(rename = "control-file")]
    pub control_file: Option<PathBuf>,
    pub parallel: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PartialSurfaceConfig {
    pub samples: Option<usize>,
    #[serde(rename = "grid-spacing")]
    pub grid_spacing: Option<f64>,
    pub elements: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PartialStatsConfig {
    pub output: Option<PathBuf>,
}

/// Contents of a `clusterkit.toml`. Every key is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    pub logging: Option<PartialLoggingConfig>,
    pub convert: Option<PartialConvertConfig>,
    pub surface: Option<PartialSurfaceConfig>,
    pub stats: Option<PartialStatsConfig>,
}

/// Fully resolved settings for the `surface-energy` command.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSettings {
    pub samples: usize,
    pub grid_spacing: f64,
    pub elements: Option<PathBuf>,
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from '{}'", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads `path` if given, then applies `--set` overrides on top.
    pub fn load(path: Option<&Path>, set_values: &[String]) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        apply_set_values(config, set_values)
    }

    pub fn color(&self, no_color: bool) -> bool {
        if no_color {
            return false;
        }
        self.logging
            .as_ref()
            .and_then(|l| l.color)
            .unwrap_or(DefaultsConfig::default().color)
    }

    pub fn merge_convert(&self, args: &ConvertArgs) -> ConvertOptions {
        let defaults = DefaultsConfig::default();
        let file = self.convert.clone().unwrap_or_default();

        let parallel = if args.parallelism.parallel {
            true
        } else if args.parallelism.sequential {
            false
        } else {
            file.parallel.unwrap_or(defaults.parallel)
        };

        ConvertOptions {
            write: WriteOptions {
                control_file: args.control_file.clone().or(file.control_file),
            },
            directory: args
                .directory
                .clone()
                .unwrap_or_else(|| ConvertOptions::default().directory),
            parallel,
        }
    }

    pub fn merge_surface(&self, args: &SurfaceEnergyArgs) -> SurfaceSettings {
        let defaults = DefaultsConfig::default();
        let file = self.surface.clone().unwrap_or_default();

        SurfaceSettings {
            samples: args
                .samples
                .or(file.samples)
                .unwrap_or(defaults.samples),
            grid_spacing: args
                .grid_spacing
                .or(file.grid_spacing)
                .unwrap_or(defaults.grid_spacing),
            elements: args.elements.clone().or(file.elements),
        }
    }

    pub fn stats_output(&self, cli_output: Option<&Path>) -> PathBuf {
        cli_output
            .map(Path::to_path_buf)
            .or_else(|| self.stats.as_ref().and_then(|s| s.output.clone()))
            .unwrap_or(DefaultsConfig::default().stats_output)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: PartialConfig, set_values: &[String]) -> Result<PartialConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "logging.color" => {
                config.logging.get_or_insert_with(Default::default).color =
                    Some(parse_value(key, value_str, "boolean")?);
            }
            "convert.control-file" => {
                config
                    .convert
                    .get_or_insert_with(Default::default)
                    .control_file = Some(PathBuf::from(value_str));
            }
            "convert.parallel" => {
                config.convert.get_or_insert_with(Default::default).parallel =
                    Some(parse_value(key, value_str, "boolean")?);
            }
            "surface.samples" => {
                config.surface.get_or_insert_with(Default::default).samples =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "surface.grid-spacing" => {
                config
                    .surface
                    .get_or_insert_with(Default::default)
                    .grid_spacing = Some(parse_value(key, value_str, "float")?);
            }
            "surface.elements" => {
                config.surface.get_or_insert_with(Default::default).elements =
                    Some(PathBuf::from(value_str));
            }
            "stats.output" => {
                config.stats.get_or_insert_with(Default::default).output =
                    Some(PathBuf::from(value_str));
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    fn convert_args(extra: &[&str]) -> ConvertArgs {
        let mut argv = vec!["clusterkit", "convert", ".xyz", ".gin"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Convert(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    fn surface_args(extra: &[&str]) -> SurfaceEnergyArgs {
        let mut argv = vec!["clusterkit", "surface-energy", "c.xyz", "1.4", "-4.0"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::SurfaceEnergy(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let config = PartialConfig::default();

        let convert = config.merge_convert(&convert_args(&[]));
        assert_eq!(convert, ConvertOptions::default());

        let surface = config.merge_surface(&surface_args(&[]));
        assert_eq!(surface.samples, 480);
        assert_eq!(surface.grid_spacing, 0.2);
        assert!(surface.elements.is_none());

        assert!(config.color(false));
        assert_eq!(config.stats_output(None), PathBuf::from("Stats.csv"));
    }

    #[test]
    fn file_values_are_read_and_merged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clusterkit.toml");
        fs::write(
            &path,
            r#"
[logging]
color = false

[convert]
control-file = "gulp.ctl"
parallel = true

[surface]
samples = 960
grid-spacing = 0.1
elements = "elements.toml"

[stats]
output = "results"
"#,
        )
        .unwrap();

        let config = PartialConfig::from_file(&path).unwrap();
        assert!(!config.color(false));

        let convert = config.merge_convert(&convert_args(&[]));
        assert_eq!(convert.write.control_file, Some(PathBuf::from("gulp.ctl")));
        assert!(convert.parallel);

        let surface = config.merge_surface(&surface_args(&[]));
        assert_eq!(surface.samples, 960);
        assert_eq!(surface.grid_spacing, 0.1);
        assert_eq!(surface.elements, Some(PathBuf::from("elements.toml")));

        assert_eq!(config.stats_output(None), PathBuf::from("results"));
    }

    #[test]
    fn cli_overrides_file_values() {
        let config = PartialConfig {
            convert: Some(PartialConvertConfig {
                control_file: Some(PathBuf::from("file.ctl")),
                parallel: Some(true),
            }),
            surface: Some(PartialSurfaceConfig {
                samples: Some(960),
                grid_spacing: None,
                elements: None,
            }),
            ..PartialConfig::default()
        };

        let convert = config.merge_convert(&convert_args(&["cli.ctl", "--sequential", "-d", "data"]));
        assert_eq!(convert.write.control_file, Some(PathBuf::from("cli.ctl")));
        assert!(!convert.parallel);
        assert_eq!(convert.directory, PathBuf::from("data"));

        let surface = config.merge_surface(&surface_args(&["--samples", "120"]));
        assert_eq!(surface.samples, 120);

        assert!(!config.color(true));
        assert_eq!(
            config.stats_output(Some(Path::new("out.csv"))),
            PathBuf::from("out.csv")
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[convert]\nthreads = 4\n").unwrap();

        let result = PartialConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn missing_file_is_a_parsing_error() {
        let dir = tempdir().unwrap();
        let result = PartialConfig::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn set_values_override() {
        let config = PartialConfig::load(
            None,
            &[
                "surface.samples=240".to_string(),
                "surface.grid-spacing=0.5".to_string(),
                "convert.parallel=true".to_string(),
                "logging.color=false".to_string(),
            ],
        )
        .unwrap();

        let surface = config.merge_surface(&surface_args(&[]));
        assert_eq!(surface.samples, 240);
        assert_eq!(surface.grid_spacing, 0.5);
        assert!(config.merge_convert(&convert_args(&[])).parallel);
        assert!(!config.color(false));
    }

    #[test]
    fn malformed_set_values_are_config_errors() {
        for bad in ["surface.samples", "surface.samples=many", "unknown.key=1"] {
            let result = PartialConfig::load(None, &[bad.to_string()]);
            assert!(matches!(result, Err(CliError::Config(_))), "{}", bad);
        }
    }
}
