use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tomas Lazauskas",
    version,
    about = "clusterkit - Convert atomic cluster structures between XYZ, CAR and GIN, and analyse their geometry and surface energy.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Disable colored console output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Read default settings from a TOML configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override a configuration value (e.g. -S surface.samples=960)
    #[arg(short = 'S', long = "set", global = true, value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a structure file, or every file of one format in a directory.
    Convert(ConvertArgs),
    /// Compute the surface energy of a cluster from its total energy.
    SurfaceEnergy(SurfaceEnergyArgs),
    /// Sort structures by energy and write their statistics table.
    Stats(StatsArgs),
}

/// Arguments for the `convert` subcommand.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input file, or a bare extension such as `.xyz` (or `*.xyz`) to convert every file
    /// with that extension.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file; in batch mode only its extension is used (e.g. `.car`).
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// GULP control file copied to the top of GIN outputs.
    #[arg(value_name = "CONTROL_FILE")]
    pub control_file: Option<PathBuf>,

    /// Directory scanned in batch mode (defaults to the current directory).
    #[arg(short = 'd', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    #[command(flatten)]
    pub parallelism: Parallelism,
}

/// Mutually exclusive switches for batch parallelism, overriding `convert.parallel`.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = false, multiple = false)]
pub struct Parallelism {
    /// Convert batch files in parallel.
    #[arg(long)]
    pub parallel: bool,

    /// Convert batch files one at a time.
    #[arg(long)]
    pub sequential: bool,
}

/// Arguments for the `surface-energy` subcommand.
#[derive(Args, Debug)]
pub struct SurfaceEnergyArgs {
    /// Structure file (XYZ, CAR or GIN) carrying the total energy.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Probe radius added to every van der Waals radius, in Angstroms.
    #[arg(value_name = "RADIUS", allow_negative_numbers = true)]
    pub radius: f64,

    /// Bulk energy per atom, in the same units as the total energy.
    #[arg(value_name = "BULK_ENERGY_PER_ATOM", allow_negative_numbers = true)]
    pub bulk_energy_per_atom: f64,

    /// TOML file overriding element masses and radii.
    #[arg(long, value_name = "PATH")]
    pub elements: Option<PathBuf>,

    /// Override the number of surface sample points per atom.
    #[arg(long, value_name = "INT")]
    pub samples: Option<usize>,

    /// Override the voxel edge used for the volume estimate, in Angstroms.
    #[arg(long, value_name = "FLOAT")]
    pub grid_spacing: Option<f64>,
}

/// Arguments for the `stats` subcommand.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Structure files to include.
    #[arg(required = true, num_args = 1.., value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Output CSV file, or a directory to receive `Stats.csv`.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}
