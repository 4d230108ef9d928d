mod geometry;
mod report;
mod runner;

pub use geometry::build_molecule;
pub use runner::{build_functional, run_deepscf, run_hartree_fock, RunSummary};

use self::report::report_summary;
use crate::config::{Args, Config, ModelKind};
use crate::io::{load_basis_sets, setup_output, write_descriptors, DescriptorRecord};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use std::fs;
use tracing::info;

pub struct DeepScfApplication {
    args: Args,
    config: Config,
}

impl DeepScfApplication {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        let config = apply_overrides(load_config(&args)?, &args);
        Ok(Self { args, config })
    }

    pub fn run(self) -> Result<()> {
        setup_output(self.args.output.as_ref());
        info!("Configuration loaded from {}", self.args.config_file);
        self.config.validate()?;

        let basis_sets = load_basis_sets(&self.config)?;
        let mol = build_molecule(&self.config, &basis_sets)?;
        let settings = self.config.scf_params.settings();

        let summary = if self.args.hf_only {
            info!("Correction disabled, running plain Hartree-Fock");
            run_hartree_fock(&mol, &self.config, settings)?
        } else {
            run_deepscf(&mol, &self.config, settings)?
        };
        report_summary(&summary);

        if let (Some(path), Some(values)) = (&self.config.descriptors_output, &summary.descriptors) {
            let symbols = mol.atoms.iter().map(|a| a.symbol.clone()).collect();
            let record = DescriptorRecord::new(
                symbols,
                summary.outcome.e_tot,
                summary.outcome.energies.correction,
                values,
            );
            write_descriptors(path, &record)?;
            info!("Descriptors written to {}", path);
        }

        Ok(())
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let config_content = fs::read_to_string(&args.config_file)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", args.config_file))?;

    let config = serde_yml::from_str::<Config>(&config_content)
        .wrap_err("Failed to parse configuration file")?
        .with_defaults();

    Ok(config)
}

/// Command-line values win over the file.
fn apply_overrides(mut config: Config, args: &Args) -> Config {
    if let Some(device) = &args.device {
        config.device = Some(device.clone());
    }
    if let Some(max_cycle) = args.max_cycle {
        config.scf_params.max_cycle = Some(max_cycle);
    }
    if let Some(size) = args.diis_subspace_size {
        config.scf_params.diis_subspace_size = Some(size);
    }
    if let Some(threshold) = args.convergence_threshold {
        config.scf_params.convergence_threshold = Some(threshold);
    }
    if let Some(model) = &args.model {
        config.model.kind = Some(ModelKind::File);
        config.model.path = Some(model.clone());
    }
    if let Some(path) = &args.dump_descriptors {
        config.descriptors_output = Some(path.clone());
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let config = serde_yml::from_str::<Config>(
            "geometry:\n  - element: He\n    coords: [0.0, 0.0, 0.0]\nscf_params:\n  max_cycle: 10\n",
        )
        .unwrap()
        .with_defaults();
        let args = Args {
            max_cycle: Some(25),
            model: Some("model.json".to_string()),
            device: Some("parallel".to_string()),
            ..Args::default()
        };

        let config = apply_overrides(config, &args);
        assert_eq!(config.scf_params.max_cycle, Some(25));
        assert_eq!(config.model.kind, Some(ModelKind::File));
        assert_eq!(config.model.path.as_deref(), Some("model.json"));
        assert_eq!(config.device.as_deref(), Some("parallel"));
        assert_eq!(config.scf_params.diis_subspace_size, Some(8));
    }
}
