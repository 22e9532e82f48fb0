use crate::cli::SurfaceEnergyArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use clusterkit::analysis::surface::SphereUnionEstimator;
use clusterkit::core::models::system::Energetic;
use clusterkit::core::utils::elements::ElementTable;
use clusterkit::workflows::surface::{self, SurfaceEnergyReport};
use tracing::{debug, info};

pub fn run(args: SurfaceEnergyArgs, config: &PartialConfig) -> Result<()> {
    let settings = config.merge_surface(&args);
    debug!("Resolved surface settings: {:?}", settings);

    let elements = match &settings.elements {
        Some(path) => {
            info!("Loading element overrides from '{}'", path.display());
            ElementTable::load(path)?
        }
        None => ElementTable::new(),
    };

    let estimator = SphereUnionEstimator::new(elements)
        .with_samples(settings.samples)
        .with_grid_spacing(settings.grid_spacing);

    let report = surface::run(
        &args.input,
        args.radius,
        args.bulk_energy_per_atom,
        &estimator,
    )?;
    println!("{}", render(&report));
    Ok(())
}

fn render(report: &SurfaceEnergyReport) -> String {
    let measures = report.measures();
    format!(
        "File:           {}\n\
         System:         {} ({})\n\
         Atoms:          {}\n\
         Total energy:   {:.6}\n\
         Volume:         {:.6}\n\
         Area:           {:.6}\n\
         Spheres:        {}\n\
         Surface energy: {:.6}",
        report.path.display(),
        report.system.name,
        report.system.hashkey,
        report.system.atom_count(),
        report.system.total_energy(),
        measures.volume,
        measures.area,
        measures.sphere_count,
        report.surface_energy
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::error::CliError;
    use clap::Parser;
    use clusterkit::analysis::surface::GeometricMeasures;
    use clusterkit::core::models::cluster::Cluster;
    use clusterkit::core::models::system::System;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn surface_args(argv: &[&str]) -> SurfaceEnergyArgs {
        let mut full = vec!["clusterkit", "surface-energy"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::SurfaceEnergy(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn render_lists_every_measure() {
        let mut cluster = Cluster::new();
        cluster.total_energy = -10.0;
        let mut system = System::new("zno", cluster);
        system.geometry = Some(GeometricMeasures {
            volume: 12.5,
            area: 40.0,
            sphere_count: 2,
        });
        let report = SurfaceEnergyReport {
            path: PathBuf::from("zno.xyz"),
            system,
            surface_energy: 0.05,
        };
        let text = render(&report);
        assert!(text.contains("zno.xyz"));
        assert!(text.contains("System:         zno (cbf29ce484222325)"));
        assert!(text.contains("Total energy:   -10.000000"));
        assert!(text.contains("Volume:         12.500000"));
        assert!(text.contains("Area:           40.000000"));
        assert!(text.contains("Surface energy: 0.050000"));
    }

    #[test]
    fn runs_on_a_single_atom() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("ar.xyz");
        fs::write(&input, "1\n-1.5\nAr 0.0 0.0 0.0\n").unwrap();

        let args = surface_args(&[input.to_str().unwrap(), "0.0", "-1.0", "--samples", "200"]);
        run(args, &PartialConfig::default()).unwrap();
    }

    #[test]
    fn missing_elements_file_is_reported() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("ar.xyz");
        fs::write(&input, "1\n-1.5\nAr 0.0 0.0 0.0\n").unwrap();
        let elements = dir.path().join("absent.toml");

        let args = surface_args(&[
            input.to_str().unwrap(),
            "1.4",
            "-1.0",
            "--elements",
            elements.to_str().unwrap(),
        ]);
        let result = run(args, &PartialConfig::default());
        assert!(matches!(result, Err(CliError::Elements(_))));
    }

    #[test]
    fn unsupported_input_is_reported() {
        let args = surface_args(&["cluster.pdb", "1.4", "-1.0"]);
        let result = run(args, &PartialConfig::default());
        assert!(matches!(result, Err(CliError::SurfaceEnergy(_))));
    }
}
